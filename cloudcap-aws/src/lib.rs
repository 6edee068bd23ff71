#![forbid(unsafe_code)]

//! Identity and resource model for cloudcap.
//!
//! A [`World`] owns every resource created during one analysis run and indexes them by their
//! ARN and, for resources that have one, by a secondary identifier such as a queue URL.

mod arn;
mod error;
mod region;
mod resource;
mod world;

pub use arn::{sqs_queue_url, Arn};
pub use error::AwsError;
pub use region::{Account, Partition, Region};
pub use resource::{
    EnvValue, EventSourceMapping, LambdaFunction, Resource, ResourceKind, ResourceType, SqsQueue,
};
pub use world::{Deployment, DeploymentId, DuplicatePolicy, ResourceId, World};
