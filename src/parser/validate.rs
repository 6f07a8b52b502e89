//! Request object validation.
//!
//! Two steps: a literal-only conversion from an object-literal expression
//! into a plain JSON value, and a schema check of that value against the
//! required request shape. The schema check collects every problem it
//! finds so the author can fix them all in one pass.

use crate::models::HttpMethod;
use crate::parser::error::ParseError;
use crate::script::ast::{Expr, Property};
use crate::script::printer::print_expression;
use serde_json::{Map, Value};

/// Converts a literal-only expression into a plain JSON value.
///
/// Only object literals, array literals, and scalar literals are
/// accepted; identifiers, calls, computed keys, and any other expression
/// fail with [`ParseError::UnhandledValue`]. This is the literal-only
/// policy: no variable resolution or fixture substitution is attempted.
pub fn object_to_value(expr: &Expr) -> Result<Value, ParseError> {
    match expr {
        Expr::Object { properties } => {
            let mut map = Map::new();
            for property in properties {
                map.insert(property_key(property)?, object_to_value(&property.value)?);
            }
            Ok(Value::Object(map))
        }
        Expr::Array { elements } => elements
            .iter()
            .map(object_to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Str { value } => Ok(Value::String(value.clone())),
        Expr::Num { raw } => number_value(raw).ok_or_else(|| unhandled(expr)),
        Expr::Bool { value } => Ok(Value::Bool(*value)),
        Expr::Null => Ok(Value::Null),
        other => Err(unhandled(other)),
    }
}

fn property_key(property: &Property) -> Result<String, ParseError> {
    if property.computed {
        return Err(unhandled(&property.key));
    }
    match &property.key {
        // `{ some: 1 }` and `{ 'some': 1 }` name the same key
        Expr::Ident { name } => Ok(name.clone()),
        Expr::Str { value } => Ok(value.clone()),
        Expr::Num { raw } => Ok(raw.clone()),
        other => Err(unhandled(other)),
    }
}

fn number_value(raw: &str) -> Option<Value> {
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

fn unhandled(expr: &Expr) -> ParseError {
    ParseError::UnhandledValue {
        summary: print_expression(expr),
    }
}

/// Required top-level request fields, in schema order.
const REQUIRED_FIELDS: &[&str] = &[
    "operationPath",
    "method",
    "headers",
    "params",
    "apiVersion",
    "url",
];

/// Required `apiVersion` fields, in schema order.
const REQUIRED_VERSION_FIELDS: &[&str] = &["minorVersion", "majorVersion", "type", "asynchronous"];

/// Validates a request value against the request schema.
///
/// Returns every violation found, phrased against the `Request object`
/// data path, or `Ok(())` when the value conforms.
pub fn validate_request(value: &Value) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let Some(object) = value.as_object() else {
        return Err(vec!["Request object should be an object".to_string()]);
    };

    for field in REQUIRED_FIELDS {
        if !object.contains_key(*field) {
            errors.push(format!(
                "Request object should have required property '{field}'"
            ));
        }
    }

    if let Some(path) = object.get("operationPath") {
        if !path.is_string() {
            errors.push("Request object/operationPath should be string".to_string());
        }
    }

    if let Some(method) = object.get("method") {
        let valid = method
            .as_str()
            .is_some_and(|m| HttpMethod::from_str(m).is_some());
        if !valid {
            errors.push(format!(
                "Request object/method should be equal to one of the allowed values: {}",
                HttpMethod::all().join(", ")
            ));
        }
    }

    for field in ["headers", "params"] {
        if let Some(value) = object.get(field) {
            if !value.is_object() {
                errors.push(format!("Request object/{field} should be object"));
            }
        }
    }

    if let Some(version) = object.get("apiVersion") {
        match version.as_object() {
            Some(version) => {
                for field in REQUIRED_VERSION_FIELDS {
                    if !version.contains_key(*field) {
                        errors.push(format!(
                            "Request object/apiVersion should have required property '{field}'"
                        ));
                    }
                }
                for field in ["minorVersion", "majorVersion"] {
                    if let Some(value) = version.get(field) {
                        match value.as_i64() {
                            Some(n) if n >= 0 => {}
                            Some(_) => errors.push(format!(
                                "Request object/apiVersion/{field} should be >= 0"
                            )),
                            None => errors.push(format!(
                                "Request object/apiVersion/{field} should be integer"
                            )),
                        }
                    }
                }
                if let Some(api_type) = version.get("type") {
                    if !api_type.is_string() {
                        errors.push("Request object/apiVersion/type should be string".to_string());
                    }
                }
                if let Some(asynchronous) = version.get("asynchronous") {
                    if !asynchronous.is_boolean() {
                        errors.push(
                            "Request object/apiVersion/asynchronous should be boolean".to_string(),
                        );
                    }
                }
            }
            None => errors.push("Request object/apiVersion should be object".to_string()),
        }
    }

    if let Some(url) = object.get("url") {
        if !url.is_string() {
            errors.push("Request object/url should be string".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parser::parse_expression_source;
    use serde_json::json;

    fn convert(source: &str) -> Result<Value, ParseError> {
        let expr = parse_expression_source(source).unwrap();
        let Expr::Paren { expr } = expr else {
            panic!("wrap test sources in parentheses");
        };
        object_to_value(&expr)
    }

    #[test]
    fn test_object_to_value_literals() {
        let value = convert(
            "({ method: 'get', count: 3, ratio: 1.5, flag: true, nothing: null, \
             'x-y': 'z', nested: { a: [1, 2] } })",
        )
        .unwrap();
        assert_eq!(
            value,
            json!({
                "method": "get",
                "count": 3,
                "ratio": 1.5,
                "flag": true,
                "nothing": null,
                "x-y": "z",
                "nested": { "a": [1, 2] }
            })
        );
    }

    #[test]
    fn test_object_to_value_rejects_identifier() {
        let err = convert("({ url: baseUrl })").unwrap_err();
        match err {
            ParseError::UnhandledValue { summary } => assert_eq!(summary, "baseUrl"),
            other => panic!("expected UnhandledValue, got {other:?}"),
        }
    }

    #[test]
    fn test_object_to_value_rejects_call() {
        let err = convert("({ url: makeUrl() })").unwrap_err();
        assert!(matches!(err, ParseError::UnhandledValue { .. }));
    }

    #[test]
    fn test_object_to_value_rejects_computed_key() {
        let err = convert("({ [key]: 1 })").unwrap_err();
        assert!(matches!(err, ParseError::UnhandledValue { .. }));
    }

    #[test]
    fn test_validate_empty_object_lists_all_required_fields() {
        let errors = validate_request(&json!({})).unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Request object should have required property 'operationPath'",
                "Request object should have required property 'method'",
                "Request object should have required property 'headers'",
                "Request object should have required property 'params'",
                "Request object should have required property 'apiVersion'",
                "Request object should have required property 'url'",
            ]
        );
    }

    fn valid_request() -> Value {
        json!({
            "operationPath": "whatever",
            "method": "get",
            "headers": {},
            "params": {},
            "apiVersion": {
                "minorVersion": 1,
                "majorVersion": 0,
                "type": "fspiop",
                "asynchronous": false
            },
            "url": "whatever"
        })
    }

    #[test]
    fn test_validate_accepts_conforming_request() {
        assert!(validate_request(&valid_request()).is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_method() {
        let mut request = valid_request();
        request["method"] = json!("brew");
        let errors = validate_request(&request).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("method should be equal to one of the allowed values"));
    }

    #[test]
    fn test_validate_collects_multiple_errors() {
        let mut request = valid_request();
        request["method"] = json!(7);
        request["apiVersion"]["minorVersion"] = json!("one");
        request.as_object_mut().unwrap().remove("url");
        let errors = validate_request(&request).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_validate_rejects_negative_version() {
        let mut request = valid_request();
        request["apiVersion"]["majorVersion"] = json!(-1);
        let errors = validate_request(&request).unwrap_err();
        assert_eq!(
            errors,
            vec!["Request object/apiVersion/majorVersion should be >= 0"]
        );
    }
}
