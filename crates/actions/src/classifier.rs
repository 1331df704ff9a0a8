//! Free-text triage classification.
//!
//! Used by incident-triage workflows to derive condition and dispatch
//! parameters from the incident title/description. The classifier is an
//! opaque synchronous decision with bounded latency: the remote backend is
//! called with a timeout and any failure falls back to the deterministic
//! keyword heuristics.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Classification decision for a piece of free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Main category, e.g. "Network", "Security", "Hardware", "Software".
    pub category: String,
    /// Priority: "Critical", "High", "Medium", or "Low".
    pub priority: String,
    /// Team the item should be routed to.
    pub team: String,
    /// Confidence in the decision, 0.0..=1.0.
    pub confidence: f64,
    /// Tags derived from the text.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Classification {
    /// Fold the classification into a flat context mapping.
    pub fn to_record(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert("category".into(), serde_json::json!(self.category));
        map.insert("priority".into(), serde_json::json!(self.priority));
        map.insert("team".into(), serde_json::json!(self.team));
        map.insert("confidence".into(), serde_json::json!(self.confidence));
        map.insert("tags".into(), serde_json::json!(self.tags));
        map
    }
}

/// Text classification contract.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Classification;
}

const SECURITY_KEYWORDS: &[&str] = &[
    "password",
    "login",
    "access",
    "unauthorized",
    "breach",
    "virus",
    "hack",
];
const NETWORK_KEYWORDS: &[&str] = &[
    "connection",
    "internet",
    "wifi",
    "vpn",
    "network",
    "ping",
    "timeout",
];
const HARDWARE_KEYWORDS: &[&str] = &[
    "laptop", "computer", "printer", "mouse", "keyboard", "screen", "hardware",
];
const CRITICAL_KEYWORDS: &[&str] = &[
    "down", "outage", "critical", "urgent", "emergency", "broken", "failure",
];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Deterministic keyword-matching classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    fn classify_sync(&self, text: &str) -> Classification {
        let text = text.to_lowercase();

        let has_security = contains_any(&text, SECURITY_KEYWORDS);
        let has_network = contains_any(&text, NETWORK_KEYWORDS);
        let has_hardware = contains_any(&text, HARDWARE_KEYWORDS);
        let has_critical = contains_any(&text, CRITICAL_KEYWORDS);

        let (category, team) = if has_security {
            ("Security", "Security Team")
        } else if has_network {
            ("Network", "Network Operations")
        } else if has_hardware {
            ("Hardware", "IT Support")
        } else {
            ("Software", "Application Support")
        };

        let priority = if has_critical || has_security {
            "Critical"
        } else if text.contains("high") || text.contains("urgent") {
            "High"
        } else if text.contains("low") {
            "Low"
        } else {
            "Medium"
        };

        let mut tags = Vec::new();
        if has_security {
            tags.extend(["security".to_string(), "authentication".to_string()]);
        }
        if has_network {
            tags.extend(["network".to_string(), "connectivity".to_string()]);
        }
        if has_hardware {
            tags.extend(["hardware".to_string(), "equipment".to_string()]);
        }

        let matched = [has_security, has_network, has_hardware]
            .iter()
            .filter(|m| **m)
            .count();

        Classification {
            category: category.to_string(),
            priority: priority.to_string(),
            team: team.to_string(),
            confidence: if matched > 0 { 0.7 } else { 0.4 },
            tags,
        }
    }
}

#[async_trait]
impl TextClassifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Classification {
        self.classify_sync(text)
    }
}

/// Classifier backed by an external AI endpoint.
///
/// Posts the text to the configured URL and expects a `Classification` JSON
/// body back. Any transport failure, timeout, or malformed answer falls back
/// to the keyword classifier.
pub struct RemoteClassifier {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    fallback: KeywordClassifier,
}

impl RemoteClassifier {
    pub fn new(url: &str, timeout_seconds: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            timeout: Duration::from_secs(timeout_seconds),
            fallback: KeywordClassifier::new(),
        }
    }

    async fn try_remote(&self, text: &str) -> Result<Classification, reqwest::Error> {
        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?
            .error_for_status()?;

        response.json::<Classification>().await
    }
}

#[async_trait]
impl TextClassifier for RemoteClassifier {
    async fn classify(&self, text: &str) -> Classification {
        match self.try_remote(text).await {
            Ok(classification) => classification,
            Err(e) => {
                tracing::warn!(error = %e, "Remote classifier unavailable, using keyword fallback");
                self.fallback.classify_sync(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_network_incident() {
        let classifier = KeywordClassifier::new();
        let c = classifier
            .classify("VPN connection timeout for remote users")
            .await;
        assert_eq!(c.category, "Network");
        assert_eq!(c.team, "Network Operations");
        assert!(c.tags.contains(&"connectivity".to_string()));
    }

    #[tokio::test]
    async fn test_security_incident_is_critical() {
        let classifier = KeywordClassifier::new();
        let c = classifier.classify("Unauthorized login attempts detected").await;
        assert_eq!(c.category, "Security");
        assert_eq!(c.priority, "Critical");
        assert_eq!(c.team, "Security Team");
    }

    #[tokio::test]
    async fn test_outage_raises_priority() {
        let classifier = KeywordClassifier::new();
        let c = classifier.classify("Printer outage on floor 3").await;
        assert_eq!(c.category, "Hardware");
        assert_eq!(c.priority, "Critical");
    }

    #[tokio::test]
    async fn test_default_bucket() {
        let classifier = KeywordClassifier::new();
        let c = classifier.classify("Report export shows wrong totals").await;
        assert_eq!(c.category, "Software");
        assert_eq!(c.priority, "Medium");
        assert!(c.confidence < 0.5);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let classifier = KeywordClassifier::new();
        let a = classifier.classify("wifi down in the office").await;
        let b = classifier.classify("wifi down in the office").await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_remote_falls_back_when_unreachable() {
        // Reserved TEST-NET address, nothing listens there.
        let classifier = RemoteClassifier::new("http://192.0.2.1:1/classify", 1);
        let c = classifier.classify("vpn timeout").await;
        assert_eq!(c.category, "Network");
    }
}
