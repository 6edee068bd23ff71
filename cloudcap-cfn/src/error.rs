#![forbid(unsafe_code)]

use cloudcap_aws::AwsError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum TemplateError {
    #[error("unable to load {path} as a CloudFormation template: {message}")]
    #[diagnostic(code(cloudcap::template::unparseable))]
    Unparseable { path: String, message: String },

    #[error("CloudFormation template {path} has no `Resources` mapping")]
    #[diagnostic(code(cloudcap::template::missing_resources))]
    MissingResources { path: String },

    #[error("{path}: resource `{logical_id}` is malformed: {message}")]
    #[diagnostic(code(cloudcap::template::malformed_declaration))]
    MalformedDeclaration {
        path: String,
        logical_id: String,
        message: String,
    },

    #[error("CloudFormation template is cyclic: {path} (cycle through `{logical_id}`)")]
    #[diagnostic(
        code(cloudcap::template::cyclic),
        help("resources must not reference each other in a loop")
    )]
    Cyclic { path: String, logical_id: String },

    #[error("unknown resource type `{type_name}` for `{logical_id}`")]
    #[diagnostic(code(cloudcap::template::unknown_resource_type))]
    UnknownResourceType {
        logical_id: String,
        type_name: String,
    },

    #[error("`{logical_id}` is missing required property `{property}`")]
    #[diagnostic(code(cloudcap::template::missing_property))]
    MissingProperty { logical_id: String, property: String },

    #[error("`{logical_id}` has an invalid `{property}`: {message}")]
    #[diagnostic(code(cloudcap::template::invalid_property))]
    InvalidProperty {
        logical_id: String,
        property: String,
        message: String,
    },

    #[error("{path}: deployment is not part of this world")]
    #[diagnostic(code(cloudcap::template::unknown_deployment))]
    UnknownDeployment { path: String },

    #[error("{path}: parameter `{name}` has no `Default` and no override was supplied")]
    #[diagnostic(code(cloudcap::template::missing_parameter))]
    MissingParameter { path: String, name: String },

    #[error("`{logical_id}` references `{target}`, which is not defined before it")]
    #[diagnostic(code(cloudcap::template::dangling_ref))]
    DanglingRef { logical_id: String, target: String },

    #[error("`{logical_id}` reads attribute `{attribute}` of `{target}`, which is not available")]
    #[diagnostic(code(cloudcap::template::dangling_attribute))]
    DanglingAttribute {
        logical_id: String,
        target: String,
        attribute: String,
    },

    #[error("`{logical_id}` contains a malformed `{directive}`: {message}")]
    #[diagnostic(code(cloudcap::template::malformed_directive))]
    MalformedDirective {
        logical_id: String,
        directive: String,
        message: String,
    },

    #[error("`{logical_id}` maps events from `{identifier}`, which is not a registered resource")]
    #[diagnostic(code(cloudcap::template::unknown_event_source))]
    UnknownEventSource {
        logical_id: String,
        identifier: String,
    },

    #[error("`{logical_id}`: {source}")]
    #[diagnostic(code(cloudcap::template::registry))]
    Registry {
        logical_id: String,
        #[source]
        source: AwsError,
    },
}
