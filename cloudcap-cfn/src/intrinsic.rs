#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};

use crate::{CfnValue, TemplateError};

const REF: &str = "Ref";
const GET_ATT: &str = "Fn::GetAtt";

/// Values that `Ref` and `Fn::GetAtt` resolve to, filled in as declarations are compiled.
#[derive(Clone, Debug, Default)]
pub struct SymbolTables {
    refs: BTreeMap<String, CfnValue>,
    atts: BTreeMap<String, BTreeMap<String, CfnValue>>,
}

impl SymbolTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ref(&mut self, logical_id: impl Into<String>, value: impl Into<CfnValue>) {
        self.refs.insert(logical_id.into(), value.into());
    }

    pub fn set_att(
        &mut self,
        logical_id: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<CfnValue>,
    ) {
        self.atts
            .entry(logical_id.into())
            .or_default()
            .insert(attribute.into(), value.into());
    }

    pub fn get_ref(&self, logical_id: &str) -> Option<&CfnValue> {
        self.refs.get(logical_id)
    }

    pub fn get_att(&self, logical_id: &str, attribute: &str) -> Option<&CfnValue> {
        self.atts.get(logical_id).and_then(|a| a.get(attribute))
    }
}

/// Rewrites every `Ref` / `Fn::GetAtt` in `body` with its value from `symbols`.
///
/// A directive replaces the whole single-key mapping it lives in. Other mappings and sequences
/// are rebuilt with resolved children; scalars are returned unchanged. `logical_id` names the
/// declaration being compiled, for error reporting.
pub fn resolve_intrinsics(
    body: &CfnValue,
    symbols: &SymbolTables,
    logical_id: &str,
) -> Result<CfnValue, TemplateError> {
    match body {
        Value::Mapping(m) => {
            if let Some(directive) = [REF, GET_ATT].into_iter().find(|d| m.contains_key(*d)) {
                if m.len() != 1 {
                    return Err(malformed(
                        logical_id,
                        directive,
                        "must be the only key of its mapping",
                    ));
                }
                let operand = &m[directive];
                return if directive == REF {
                    resolve_ref(operand, symbols, logical_id)
                } else {
                    resolve_get_att(operand, symbols, logical_id)
                };
            }

            let mut out = Mapping::with_capacity(m.len());
            for (k, v) in m {
                out.insert(k.clone(), resolve_intrinsics(v, symbols, logical_id)?);
            }
            Ok(Value::Mapping(out))
        }
        Value::Sequence(items) => items
            .iter()
            .map(|v| resolve_intrinsics(v, symbols, logical_id))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence),
        scalar => Ok(scalar.clone()),
    }
}

fn resolve_ref(
    operand: &CfnValue,
    symbols: &SymbolTables,
    logical_id: &str,
) -> Result<CfnValue, TemplateError> {
    let target = operand
        .as_str()
        .ok_or_else(|| malformed(logical_id, REF, "operand must be a logical id"))?;
    symbols
        .get_ref(target)
        .cloned()
        .ok_or_else(|| TemplateError::DanglingRef {
            logical_id: logical_id.to_string(),
            target: target.to_string(),
        })
}

fn resolve_get_att(
    operand: &CfnValue,
    symbols: &SymbolTables,
    logical_id: &str,
) -> Result<CfnValue, TemplateError> {
    let parts = operand
        .as_sequence()
        .filter(|p| p.len() == 2)
        .ok_or_else(|| {
            malformed(
                logical_id,
                GET_ATT,
                "operand must be a [logical id, attribute name] pair",
            )
        })?;
    let (Some(target), Some(attribute)) = (parts[0].as_str(), parts[1].as_str()) else {
        return Err(malformed(
            logical_id,
            GET_ATT,
            "logical id and attribute name must be strings",
        ));
    };
    symbols
        .get_att(target, attribute)
        .cloned()
        .ok_or_else(|| TemplateError::DanglingAttribute {
            logical_id: logical_id.to_string(),
            target: target.to_string(),
            attribute: attribute.to_string(),
        })
}

fn malformed(logical_id: &str, directive: &str, message: &str) -> TemplateError {
    TemplateError::MalformedDirective {
        logical_id: logical_id.to_string(),
        directive: directive.to_string(),
        message: message.to_string(),
    }
}
