#![forbid(unsafe_code)]

use std::path::Path;

use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};

use crate::TemplateError;

/// A node of a loaded template document.
pub type CfnValue = Value;

const GET_ATT: &str = "Fn::GetAtt";

pub fn load_file(path: &Path) -> Result<CfnValue, TemplateError> {
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|e| TemplateError::Unparseable {
        path: display.clone(),
        message: e.to_string(),
    })?;
    load_str(&text, &display)
}

/// Loads YAML, falling back to JSON, and expands short-form intrinsic tags.
pub fn load_str(text: &str, path: &str) -> Result<CfnValue, TemplateError> {
    let yaml_err = match serde_yaml::from_str::<Value>(text) {
        Ok(v) => {
            tracing::info!("Loaded {path} as CloudFormation template in YAML format");
            return Ok(normalize(v));
        }
        Err(e) => e,
    };

    let json = serde_json::from_str::<serde_json::Value>(text).map_err(|_| {
        TemplateError::Unparseable {
            path: path.to_string(),
            message: yaml_err.to_string(),
        }
    })?;
    let v = serde_yaml::to_value(json).map_err(|e| TemplateError::Unparseable {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    tracing::info!("Loaded {path} as a CloudFormation template in JSON format");
    Ok(normalize(v))
}

/// Rewrites `!Ref x` to `{Ref: x}`, `!Name v` to `{Fn::Name: v}`, and the string form of
/// `Fn::GetAtt` to its two-element list form.
fn normalize(value: Value) -> Value {
    match value {
        Value::Tagged(tagged) => {
            let TaggedValue { tag, value } = *tagged;
            let tag = tag.to_string();
            let name = tag.trim_start_matches('!');
            let key = if name == "Ref" {
                "Ref".to_string()
            } else {
                format!("Fn::{name}")
            };
            let mut inner = normalize(value);
            if key == GET_ATT {
                inner = split_get_att(inner);
            }
            let mut m = Mapping::new();
            m.insert(Value::String(key), inner);
            Value::Mapping(m)
        }
        Value::Mapping(m) => {
            let mut out = Mapping::new();
            for (k, v) in m {
                let mut v = normalize(v);
                if k.as_str() == Some(GET_ATT) {
                    v = split_get_att(v);
                }
                out.insert(k, v);
            }
            Value::Mapping(out)
        }
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(normalize).collect()),
        scalar => scalar,
    }
}

fn split_get_att(v: Value) -> Value {
    if let Value::String(s) = &v {
        if let Some((logical_id, attribute)) = s.split_once('.') {
            return Value::Sequence(vec![
                Value::String(logical_id.to_string()),
                Value::String(attribute.to_string()),
            ]);
        }
    }
    v
}

/// Deep scan for a string scalar equal to `target`, through mapping values and sequence
/// elements. Mapping keys are not scanned.
pub fn contains_scalar(value: &CfnValue, target: &str) -> bool {
    match value {
        Value::String(s) => s == target,
        Value::Mapping(m) => m.iter().any(|(_, v)| contains_scalar(v, target)),
        Value::Sequence(items) => items.iter().any(|v| contains_scalar(v, target)),
        Value::Tagged(t) => contains_scalar(&t.value, target),
        _ => false,
    }
}
