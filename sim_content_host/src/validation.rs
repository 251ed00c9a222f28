//! Payload validation run before any change is applied

use ipc::{LoadConfiguration, PageDescriptor, SettingsPatch};
use serde_json::Value;

/// Validation failures, one message each
pub type Violations = Vec<String>;

pub fn validate_load(body: &Value) -> Result<LoadConfiguration, Violations> {
    let load: LoadConfiguration = serde_json::from_value(body.clone())
        .map_err(|err| vec![format!("invalid load configuration: {err}")])?;

    let mut violations = Vec::new();
    if load.id.is_empty() {
        violations.push("id is required".to_string());
    }
    if load.access_token.is_empty() {
        violations.push("accessToken is required".to_string());
    }
    finish(load, violations)
}

/// Filters must be an array of objects, each with a `$schema` and a `target`
pub fn validate_filters(body: &Value) -> Result<Vec<Value>, Violations> {
    let Some(filters) = body.as_array() else {
        return Err(vec!["filters must be an array".to_string()]);
    };

    let mut violations = Vec::new();
    for (index, filter) in filters.iter().enumerate() {
        if !filter.is_object() {
            violations.push(format!("filter {index} must be an object"));
            continue;
        }
        if !filter.get("$schema").is_some_and(Value::is_string) {
            violations.push(format!("filter {index} is missing $schema"));
        }
        if !filter.get("target").is_some_and(Value::is_object) {
            violations.push(format!("filter {index} is missing target"));
        }
    }
    finish(filters.clone(), violations)
}

pub fn validate_page(body: &Value, known_pages: &[String]) -> Result<String, Violations> {
    let page: PageDescriptor = serde_json::from_value(body.clone())
        .map_err(|err| vec![format!("invalid page: {err}")])?;
    if !known_pages.contains(&page.name) {
        return Err(vec![format!("page '{}' does not exist", page.name)]);
    }
    Ok(page.name)
}

/// Settings must be an object of known boolean fields
pub fn validate_settings(body: &Value) -> Result<SettingsPatch, Violations> {
    let Some(fields) = body.as_object() else {
        return Err(vec!["settings must be an object".to_string()]);
    };

    let mut violations = Vec::new();
    for (name, value) in fields {
        match name.as_str() {
            "filterPaneEnabled" | "navContentPaneEnabled" if value.is_boolean() => {}
            "filterPaneEnabled" | "navContentPaneEnabled" => {
                violations.push(format!("{name} must be a boolean"));
            }
            _ => violations.push(format!("unknown setting '{name}'")),
        }
    }
    if !violations.is_empty() {
        return Err(violations);
    }

    serde_json::from_value(body.clone()).map_err(|err| vec![err.to_string()])
}

fn finish<T>(value: T, violations: Violations) -> Result<T, Violations> {
    if violations.is_empty() {
        Ok(value)
    } else {
        Err(violations)
    }
}
