#![forbid(unsafe_code)]

//! Type-specific constructors for the declarations the compiler understands.

use std::collections::BTreeMap;

use cloudcap_aws::{AwsError, EnvValue, EventSourceMapping, Resource};
use serde_yaml::Value;

use crate::stack::CompileContext;
use crate::{CfnValue, TemplateError};

pub const AWS_LAMBDA_FUNCTION: &str = "AWS::Lambda::Function";
pub const AWS_SQS_QUEUE: &str = "AWS::SQS::Queue";
pub const AWS_LAMBDA_EVENT_SOURCE_MAPPING: &str = "AWS::Lambda::EventSourceMapping";

/// Materializes one declaration whose intrinsics are already resolved.
pub(crate) fn compile_declaration(
    cx: &mut CompileContext<'_>,
    logical_id: &str,
    type_name: &str,
    properties: &CfnValue,
) -> Result<(), TemplateError> {
    match type_name {
        AWS_LAMBDA_FUNCTION => lambda_function(cx, logical_id, properties),
        AWS_SQS_QUEUE => sqs_queue(cx, logical_id, properties),
        AWS_LAMBDA_EVENT_SOURCE_MAPPING => event_source_mapping(cx, logical_id, properties),
        other => Err(TemplateError::UnknownResourceType {
            logical_id: logical_id.to_string(),
            type_name: other.to_string(),
        }),
    }
}

fn lambda_function(
    cx: &mut CompileContext<'_>,
    logical_id: &str,
    properties: &CfnValue,
) -> Result<(), TemplateError> {
    let function_name = optional_string(properties, logical_id, "FunctionName")?
        .unwrap_or_else(|| cx.physical_name(logical_id));
    let environment = environment(properties);

    let resource = Resource::lambda_function(
        cx.region.clone(),
        cx.account.clone(),
        function_name.clone(),
        environment,
    )
    .with_logical_id(logical_id);
    let arn = resource.arn();
    cx.register(logical_id, resource)?;

    cx.symbols.set_ref(logical_id, function_name);
    cx.symbols.set_att(logical_id, "Arn", arn.to_string());
    Ok(())
}

fn sqs_queue(
    cx: &mut CompileContext<'_>,
    logical_id: &str,
    properties: &CfnValue,
) -> Result<(), TemplateError> {
    let queue_name = optional_string(properties, logical_id, "QueueName")?
        .unwrap_or_else(|| cx.physical_name(logical_id));

    let resource = Resource::sqs_queue(cx.region.clone(), cx.account.clone(), queue_name.clone())
        .with_logical_id(logical_id);
    let arn = resource.arn();
    let queue_url = resource.secondary_id().unwrap_or_default().to_string();
    cx.register(logical_id, resource)?;

    cx.symbols.set_ref(logical_id, queue_url.clone());
    cx.symbols.set_att(logical_id, "Arn", arn.to_string());
    cx.symbols.set_att(logical_id, "QueueName", queue_name);
    cx.symbols.set_att(logical_id, "QueueUrl", queue_url);
    Ok(())
}

/// Relation-only: attaches a mapping to an already registered event source.
fn event_source_mapping(
    cx: &mut CompileContext<'_>,
    logical_id: &str,
    properties: &CfnValue,
) -> Result<(), TemplateError> {
    let function_name = required_string(properties, logical_id, "FunctionName")?;
    let source = required_string(properties, logical_id, "EventSourceArn")?;

    let source_arn = cx
        .world
        .lookup(&source)
        .map(|r| r.arn())
        .map_err(|_| TemplateError::UnknownEventSource {
            logical_id: logical_id.to_string(),
            identifier: source.clone(),
        })?;

    cx.world
        .add_event_source_mapping(&source, EventSourceMapping::new(function_name, source_arn))
        .map_err(|e| match e {
            AwsError::UnknownIdentifier { identifier } => TemplateError::UnknownEventSource {
                logical_id: logical_id.to_string(),
                identifier,
            },
            other => TemplateError::Registry {
                logical_id: logical_id.to_string(),
                source: other,
            },
        })?;

    let physical_id = cx.physical_name(logical_id);
    cx.symbols.set_ref(logical_id, physical_id);
    Ok(())
}

/// `Environment.Variables`, or a flat `Environment` mapping.
fn environment(properties: &CfnValue) -> BTreeMap<String, EnvValue> {
    let Some(env) = properties.get("Environment") else {
        return BTreeMap::new();
    };
    let vars = env.get("Variables").unwrap_or(env);
    let Some(vars) = vars.as_mapping() else {
        tracing::warn!("ignoring non-mapping function environment: {}", render(vars));
        return BTreeMap::new();
    };

    vars.iter()
        .filter_map(|(k, v)| {
            let key = scalar_text(k)?;
            let value = match scalar_text(v) {
                Some(s) => EnvValue::Plain(s),
                None => EnvValue::Structured(render(v)),
            };
            Some((key, value))
        })
        .collect()
}

fn scalar_text(v: &CfnValue) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn render(v: &CfnValue) -> String {
    serde_yaml::to_string(v)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_else(|_| format!("{v:?}"))
}

fn optional_string(
    properties: &CfnValue,
    logical_id: &str,
    property: &str,
) -> Result<Option<String>, TemplateError> {
    match properties.get(property) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => scalar_text(v)
            .map(Some)
            .ok_or_else(|| TemplateError::InvalidProperty {
                logical_id: logical_id.to_string(),
                property: property.to_string(),
                message: format!("expected a string, found {}", render(v)),
            }),
    }
}

fn required_string(
    properties: &CfnValue,
    logical_id: &str,
    property: &str,
) -> Result<String, TemplateError> {
    optional_string(properties, logical_id, property)?.ok_or_else(|| {
        TemplateError::MissingProperty {
            logical_id: logical_id.to_string(),
            property: property.to_string(),
        }
    })
}
