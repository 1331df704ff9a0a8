//! Jinja2-style expression rendering using minijinja.
//!
//! Workflow steps may reference run context values with `{{ variable }}`
//! placeholders in parameters and with bare expressions in conditions.
//! Unknown variables never abort a run: they render as the empty string
//! (or make a condition false) and are surfaced as warnings.

use std::collections::{BTreeSet, HashMap};

use minijinja::{value::ValueKind, Environment, Error, ErrorKind, UndefinedBehavior, Value};
use opsflow_actions::Record;

use crate::error::{EngineError, EngineResult};

/// Result of rendering a single template string.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub value: String,
    /// Names of referenced variables that were absent from the context.
    pub warnings: Vec<String>,
}

/// Expression resolver with custom filters, shared across all runs.
pub struct ExprResolver {
    env: Environment<'static>,
}

impl Default for ExprResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprResolver {
    /// Create a new resolver with custom filters and tests.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Lenient);

        // Add custom filters
        env.add_filter("tojson", filter_tojson);
        env.add_filter("fromjson", filter_fromjson);
        env.add_filter("default", filter_default);

        // Add custom tests
        env.add_test("defined", test_defined);
        env.add_test("undefined", test_undefined);

        Self { env }
    }

    /// Render a template string with the given context.
    ///
    /// Strings without template syntax pass through untouched. References
    /// to variables missing from the context render as the empty string
    /// and are reported in [`Resolution::warnings`].
    pub fn render(&self, template: &str, context: &Record) -> EngineResult<Resolution> {
        // Quick check for non-template strings
        if !contains_template_syntax(template) {
            return Ok(Resolution {
                value: template.to_string(),
                warnings: Vec::new(),
            });
        }

        let tmpl = self
            .env
            .template_from_str(template)
            .map_err(|e| EngineError::Template(format!("Template parse error: {}", e)))?;

        let warnings = unresolved_names(&tmpl, context);
        let ctx = record_to_value(context);
        let value = tmpl
            .render(ctx)
            .map_err(|e| EngineError::Template(format!("Template render error: {}", e)))?;

        Ok(Resolution { value, warnings })
    }

    /// Render a template and return the result as a JSON value.
    /// Attempts to parse the rendered string as JSON if it looks like JSON.
    pub fn render_to_value(
        &self,
        template: &str,
        context: &Record,
        warnings: &mut Vec<String>,
    ) -> EngineResult<serde_json::Value> {
        let resolved = self.render(template, context)?;
        warnings.extend(resolved.warnings);
        let rendered = resolved.value;

        // Only fully-templated strings are candidates for re-typing;
        // mixed text like "value: {{ x }}" stays a string.
        if !is_single_expression(template) {
            return Ok(serde_json::Value::String(rendered));
        }

        // Try to parse as JSON if it looks like JSON
        let trimmed = rendered.trim();
        if (trimmed.starts_with('{') && trimmed.ends_with('}'))
            || (trimmed.starts_with('[') && trimmed.ends_with(']'))
        {
            if let Ok(value) = serde_json::from_str(&rendered) {
                return Ok(value);
            }
        }

        // Try to parse as primitive values
        if let Ok(b) = trimmed.parse::<bool>() {
            return Ok(serde_json::Value::Bool(b));
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Ok(serde_json::Value::Number(i.into()));
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if let Some(n) = serde_json::Number::from_f64(f) {
                return Ok(serde_json::Value::Number(n));
            }
        }

        Ok(serde_json::Value::String(rendered))
    }

    /// Render a nested structure (dict or list) recursively, collecting
    /// warnings for every unresolved variable reference along the way.
    pub fn render_record(
        &self,
        params: &Record,
        context: &Record,
    ) -> EngineResult<(Record, Vec<String>)> {
        let mut warnings = Vec::new();
        let mut result = Record::new();
        for (k, v) in params {
            result.insert(k.clone(), self.render_json(v, context, &mut warnings)?);
        }
        Ok((result, warnings))
    }

    fn render_json(
        &self,
        value: &serde_json::Value,
        context: &Record,
        warnings: &mut Vec<String>,
    ) -> EngineResult<serde_json::Value> {
        match value {
            serde_json::Value::String(s) => self.render_to_value(s, context, warnings),
            serde_json::Value::Object(map) => {
                let mut result = serde_json::Map::new();
                for (k, v) in map {
                    result.insert(k.clone(), self.render_json(v, context, warnings)?);
                }
                Ok(serde_json::Value::Object(result))
            }
            serde_json::Value::Array(arr) => {
                let result: Result<Vec<_>, _> = arr
                    .iter()
                    .map(|v| self.render_json(v, context, warnings))
                    .collect();
                Ok(serde_json::Value::Array(result?))
            }
            _ => Ok(value.clone()),
        }
    }

    /// Evaluate a condition expression to a boolean.
    ///
    /// Bare expressions are wrapped in `{{ }}` before rendering. An
    /// expression that references an unknown variable evaluates to false
    /// with a warning rather than failing the step.
    pub fn evaluate_condition(
        &self,
        condition: &str,
        context: &Record,
    ) -> EngineResult<(bool, Vec<String>)> {
        // Wrap condition in {{ }} if not already
        let template = if contains_template_syntax(condition) {
            condition.to_string()
        } else {
            format!("{{{{ {} }}}}", condition)
        };

        let tmpl = self
            .env
            .template_from_str(&template)
            .map_err(|e| EngineError::Template(format!("Condition parse error: {}", e)))?;

        let warnings = unresolved_names(&tmpl, context);
        if !warnings.is_empty() {
            return Ok((false, warnings));
        }

        let ctx = record_to_value(context);
        let rendered = match tmpl.render(ctx) {
            Ok(s) => s,
            Err(e) => {
                return Ok((
                    false,
                    vec![format!("condition `{}` failed to evaluate: {}", condition, e)],
                ));
            }
        };
        let trimmed = rendered.trim().to_lowercase();

        // Evaluate as boolean
        Ok((matches!(trimmed.as_str(), "true" | "1" | "yes"), warnings))
    }

    /// Check that a template string parses, without rendering it.
    pub fn check(&self, template: &str) -> EngineResult<()> {
        if !contains_template_syntax(template) {
            return Ok(());
        }
        self.env
            .template_from_str(template)
            .map(|_| ())
            .map_err(|e| EngineError::Template(format!("Template parse error: {}", e)))
    }

    /// Check that a condition expression parses, without evaluating it.
    pub fn check_condition(&self, condition: &str) -> EngineResult<()> {
        let template = if contains_template_syntax(condition) {
            condition.to_string()
        } else {
            format!("{{{{ {} }}}}", condition)
        };
        self.env
            .template_from_str(&template)
            .map(|_| ())
            .map_err(|e| EngineError::Template(format!("Condition parse error: {}", e)))
    }
}

/// Whether the whole string is a single `{{ ... }}` expression.
fn is_single_expression(s: &str) -> bool {
    let t = s.trim();
    t.starts_with("{{") && t.ends_with("}}") && t.matches("{{").count() == 1
}

/// Check if a string contains Jinja2 template syntax.
fn contains_template_syntax(s: &str) -> bool {
    (s.contains("{{") && s.contains("}}")) || (s.contains("{%") && s.contains("%}"))
}

/// Variable references in the template that the context cannot satisfy.
///
/// Dotted references are walked into the context, so `{{ open.missing }}`
/// warns even when `open` itself is present.
fn unresolved_names(tmpl: &minijinja::Template<'_, '_>, context: &Record) -> Vec<String> {
    let referenced: BTreeSet<String> = tmpl.undeclared_variables(true).into_iter().collect();
    referenced
        .into_iter()
        .filter(|path| !path_resolves(context, path))
        .map(|path| format!("unresolved variable `{}`", path))
        .collect()
}

/// Walk a dotted reference path through the context.
fn path_resolves(context: &Record, path: &str) -> bool {
    let mut parts = path.split('.');
    let first = match parts.next() {
        Some(p) => p,
        None => return true,
    };
    let mut current = match context.get(first) {
        Some(v) => v,
        None => return false,
    };
    for part in parts {
        let next = match current {
            serde_json::Value::Object(map) => map.get(part),
            serde_json::Value::Array(arr) => {
                part.parse::<usize>().ok().and_then(|i| arr.get(i))
            }
            _ => None,
        };
        match next {
            Some(v) => current = v,
            None => return false,
        }
    }
    true
}

/// Convert a JSON record to a minijinja Value.
fn record_to_value(record: &Record) -> Value {
    let converted: HashMap<String, Value> = record
        .iter()
        .map(|(k, v)| (k.clone(), json_value_to_minijinja(v)))
        .collect();
    Value::from_object(converted)
}

/// Convert a serde_json::Value to a minijinja Value.
fn json_value_to_minijinja(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::from(()),
        serde_json::Value::Bool(b) => Value::from(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(f) = n.as_f64() {
                Value::from(f)
            } else {
                Value::from(())
            }
        }
        serde_json::Value::String(s) => Value::from(s.as_str()),
        serde_json::Value::Array(arr) => {
            let items: Vec<Value> = arr.iter().map(json_value_to_minijinja).collect();
            Value::from(items)
        }
        serde_json::Value::Object(map) => {
            let items: HashMap<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), json_value_to_minijinja(v)))
                .collect();
            Value::from_object(items)
        }
    }
}

/// Convert a minijinja Value back to JSON.
fn minijinja_to_json(value: &Value) -> serde_json::Value {
    if value.is_undefined() || value.is_none() {
        return serde_json::Value::Null;
    }
    if value.kind() == ValueKind::Bool {
        return serde_json::Value::Bool(value.is_true());
    }
    if let Some(i) = value.as_i64() {
        return serde_json::Value::Number(i.into());
    }
    if let Some(s) = value.as_str() {
        return serde_json::Value::String(s.to_string());
    }
    if value.kind() == ValueKind::Seq {
        if let Ok(iter) = value.try_iter() {
            let arr: Vec<serde_json::Value> = iter.map(|v| minijinja_to_json(&v)).collect();
            return serde_json::Value::Array(arr);
        }
    }
    if value.kind() == ValueKind::Map {
        let mut map = serde_json::Map::new();
        if let Ok(iter) = value.try_iter() {
            for key in iter {
                if let Ok(val) = value.get_item(&key) {
                    map.insert(key.to_string(), minijinja_to_json(&val));
                }
            }
        }
        return serde_json::Value::Object(map);
    }
    serde_json::Value::String(value.to_string())
}

// ============================================================================
// Custom Filters
// ============================================================================

/// JSON encode filter.
fn filter_tojson(value: &Value) -> Result<String, Error> {
    let json_val = minijinja_to_json(value);
    serde_json::to_string(&json_val)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("tojson error: {}", e)))
}

/// JSON decode filter.
fn filter_fromjson(value: &Value) -> Result<Value, Error> {
    let s = value.to_string();
    let json_val: serde_json::Value = serde_json::from_str(&s).map_err(|e| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("fromjson error: {}", e),
        )
    })?;
    Ok(json_value_to_minijinja(&json_val))
}

/// Default value filter.
fn filter_default(value: &Value, default: Option<&Value>) -> Value {
    if value.is_undefined() || value.is_none() {
        default.cloned().unwrap_or(Value::from(""))
    } else {
        value.clone()
    }
}

// ============================================================================
// Custom Tests
// ============================================================================

fn test_defined(value: &Value) -> bool {
    !value.is_undefined()
}

fn test_undefined(value: &Value) -> bool {
    value.is_undefined()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_plain_string_passthrough() {
        let resolver = ExprResolver::new();
        let resolved = resolver.render("no templates here", &Record::new()).unwrap();
        assert_eq!(resolved.value, "no templates here");
        assert!(resolved.warnings.is_empty());
    }

    #[test]
    fn test_variable_substitution() {
        let resolver = ExprResolver::new();
        let ctx = record(json!({"customer": "Acme", "severity": "High"}));
        let resolved = resolver
            .render("Ticket for {{ customer }} ({{ severity }})", &ctx)
            .unwrap();
        assert_eq!(resolved.value, "Ticket for Acme (High)");
        assert!(resolved.warnings.is_empty());
    }

    #[test]
    fn test_unresolved_variable_renders_empty_with_warning() {
        let resolver = ExprResolver::new();
        let ctx = record(json!({"customer": "Acme"}));
        let resolved = resolver.render("{{ customer }}:{{ region }}", &ctx).unwrap();
        assert_eq!(resolved.value, "Acme:");
        assert_eq!(resolved.warnings, vec!["unresolved variable `region`"]);
    }

    #[test]
    fn test_nested_lookup() {
        let resolver = ExprResolver::new();
        let ctx = record(json!({"triage": {"ticket_id": "TKT202601019ACF"}}));
        let resolved = resolver.render("{{ triage.ticket_id }}", &ctx).unwrap();
        assert_eq!(resolved.value, "TKT202601019ACF");
    }

    #[test]
    fn test_render_record_recurses() {
        let resolver = ExprResolver::new();
        let ctx = record(json!({"user": "dana"}));
        let params = record(json!({
            "to": "{{ user }}@corp.example",
            "meta": {"labels": ["{{ user }}", "static"]}
        }));
        let (rendered, warnings) = resolver.render_record(&params, &ctx).unwrap();
        assert_eq!(rendered["to"], json!("dana@corp.example"));
        assert_eq!(rendered["meta"]["labels"], json!(["dana", "static"]));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unresolved_field_on_known_variable_warns() {
        let resolver = ExprResolver::new();
        let ctx = record(json!({"open": {"ticket_id": "TKT202601019ACF"}}));
        let resolved = resolver.render("{{ open.missing_field }}", &ctx).unwrap();
        assert_eq!(resolved.value, "");
        assert_eq!(
            resolved.warnings,
            vec!["unresolved variable `open.missing_field`"]
        );
    }

    #[test]
    fn test_present_field_does_not_warn() {
        let resolver = ExprResolver::new();
        let ctx = record(json!({"open": {"ticket_id": "TKT202601019ACF"}}));
        let resolved = resolver.render("{{ open.ticket_id }}", &ctx).unwrap();
        assert!(resolved.warnings.is_empty());
    }

    #[test]
    fn test_condition_on_missing_field_is_false_with_warning() {
        let resolver = ExprResolver::new();
        let ctx = record(json!({"classification": {"category": "network"}}));
        let (result, warnings) = resolver
            .evaluate_condition("classification.priority == 'High'", &ctx)
            .unwrap();
        assert!(!result);
        assert_eq!(
            warnings,
            vec!["unresolved variable `classification.priority`"]
        );
    }

    #[test]
    fn test_condition_true_and_false() {
        let resolver = ExprResolver::new();
        let ctx = record(json!({"priority": "High"}));
        let (hit, _) = resolver
            .evaluate_condition("priority == 'High'", &ctx)
            .unwrap();
        assert!(hit);
        let (miss, _) = resolver
            .evaluate_condition("priority == 'Low'", &ctx)
            .unwrap();
        assert!(!miss);
    }

    #[test]
    fn test_condition_with_unknown_variable_is_false() {
        let resolver = ExprResolver::new();
        let ctx = record(json!({"priority": "High"}));
        let (result, warnings) = resolver
            .evaluate_condition("severity == 'Critical'", &ctx)
            .unwrap();
        assert!(!result);
        assert_eq!(warnings, vec!["unresolved variable `severity`"]);
    }

    #[test]
    fn test_condition_numeric_comparison() {
        let resolver = ExprResolver::new();
        let ctx = record(json!({"amount": 1500}));
        let (result, _) = resolver.evaluate_condition("amount > 1000", &ctx).unwrap();
        assert!(result);
    }

    #[test]
    fn test_condition_malformed_expression_is_parse_error() {
        let resolver = ExprResolver::new();
        let err = resolver
            .evaluate_condition("priority ==", &Record::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::Template(_)));
    }

    #[test]
    fn test_tojson_filter() {
        let resolver = ExprResolver::new();
        let ctx = record(json!({"tags": ["network", "vpn"]}));
        let resolved = resolver.render("{{ tags | tojson }}", &ctx).unwrap();
        assert_eq!(resolved.value, r#"["network","vpn"]"#);
    }

    #[test]
    fn test_default_filter() {
        let resolver = ExprResolver::new();
        let resolved = resolver
            .render("{{ missing | default('fallback') }}", &Record::new())
            .unwrap();
        assert_eq!(resolved.value, "fallback");
    }

    #[test]
    fn test_render_to_value_keeps_primitive_types() {
        let resolver = ExprResolver::new();
        let ctx = record(json!({"count": 7, "enabled": true}));
        let mut warnings = Vec::new();
        assert_eq!(
            resolver
                .render_to_value("{{ count }}", &ctx, &mut warnings)
                .unwrap(),
            json!(7)
        );
        assert_eq!(
            resolver
                .render_to_value("{{ enabled }}", &ctx, &mut warnings)
                .unwrap(),
            json!(true)
        );
        // Mixed text stays a string even when it renders to digits.
        assert_eq!(
            resolver
                .render_to_value("item {{ count }}", &ctx, &mut warnings)
                .unwrap(),
            json!("item 7")
        );
    }

    #[test]
    fn test_render_to_value_parses_json_shapes() {
        let resolver = ExprResolver::new();
        let ctx = record(json!({"tags": ["a", "b"]}));
        let mut warnings = Vec::new();
        let value = resolver
            .render_to_value("{{ tags | tojson }}", &ctx, &mut warnings)
            .unwrap();
        assert_eq!(value, json!(["a", "b"]));
    }
}
