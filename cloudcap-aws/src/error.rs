#![forbid(unsafe_code)]

use miette::Diagnostic;
use thiserror::Error;

use crate::Arn;

#[derive(Debug, Error, Diagnostic)]
pub enum AwsError {
    #[error("unknown resource identifier '{identifier}'")]
    #[diagnostic(code(cloudcap::aws::unknown_identifier))]
    UnknownIdentifier { identifier: String },

    #[error("{arn} is already a registered resource")]
    #[diagnostic(
        code(cloudcap::aws::duplicate_arn),
        help("duplicate identifiers are rejected because the registry runs with the `deny` policy")
    )]
    DuplicateArn { arn: Arn },

    #[error("{arn} cannot be the event source of a Lambda event source mapping")]
    #[diagnostic(code(cloudcap::aws::not_an_event_source))]
    NotAnEventSource { arn: Arn },

    #[error("invalid region name '{name}'")]
    #[diagnostic(code(cloudcap::aws::invalid_region))]
    InvalidRegion { name: String },
}
