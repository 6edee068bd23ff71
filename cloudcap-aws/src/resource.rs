#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;

use crate::{sqs_queue_url, Account, Arn, Region};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    LambdaFunction,
    SqsQueue,
}

impl ResourceType {
    /// CloudFormation type discriminator for this resource type.
    pub fn cfn_type(&self) -> &'static str {
        match self {
            ResourceType::LambdaFunction => "AWS::Lambda::Function",
            ResourceType::SqsQueue => "AWS::SQS::Queue",
        }
    }

    pub fn arn(&self, region: &Region, account: &Account, name: &str) -> Arn {
        match self {
            ResourceType::LambdaFunction => Arn::lambda_function(region, account, name),
            ResourceType::SqsQueue => Arn::sqs_queue(region, account, name),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cfn_type())
    }
}

/// A function environment value after template compilation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnvValue {
    /// A scalar, possibly the resolved value of a `Ref`/`Fn::GetAtt`.
    Plain(String),
    /// A structured value that did not reduce to a scalar (e.g. an unsupported intrinsic).
    /// Carries a rendering for diagnostics.
    Structured(String),
}

impl EnvValue {
    pub fn as_plain(&self) -> Option<&str> {
        match self {
            EnvValue::Plain(s) => Some(s),
            EnvValue::Structured(_) => None,
        }
    }
}

/// A Lambda event source mapping: the event source hosting it delivers to `function_name`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventSourceMapping {
    /// Function name or ARN, exactly as declared.
    pub function_name: String,
    pub event_source_arn: Arn,
}

impl EventSourceMapping {
    pub fn new(function_name: impl Into<String>, event_source_arn: Arn) -> Self {
        Self {
            function_name: function_name.into(),
            event_source_arn,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LambdaFunction {
    pub function_name: String,
    pub environment: BTreeMap<String, EnvValue>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SqsQueue {
    pub queue_name: String,
    pub queue_url: String,
    pub(crate) event_source_mappings: Vec<EventSourceMapping>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    LambdaFunction(LambdaFunction),
    SqsQueue(SqsQueue),
}

/// A concrete resource. Identity fields are fixed at construction; only the event source
/// mapping list of an event source grows afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resource {
    region: Region,
    account: Account,
    logical_id: Option<String>,
    kind: ResourceKind,
}

impl Resource {
    pub fn lambda_function(
        region: Region,
        account: Account,
        function_name: impl Into<String>,
        environment: BTreeMap<String, EnvValue>,
    ) -> Self {
        let function_name = function_name.into();
        Self {
            region,
            account,
            logical_id: None,
            kind: ResourceKind::LambdaFunction(LambdaFunction {
                function_name,
                environment,
            }),
        }
    }

    pub fn sqs_queue(region: Region, account: Account, queue_name: impl Into<String>) -> Self {
        let queue_name = queue_name.into();
        let queue_url = sqs_queue_url(&region, &account, &queue_name);
        Self {
            region,
            account,
            logical_id: None,
            kind: ResourceKind::SqsQueue(SqsQueue {
                queue_name,
                queue_url,
                event_source_mappings: Vec::new(),
            }),
        }
    }

    /// Marks the resource as declared under `logical_id` in a template.
    pub fn with_logical_id(mut self, logical_id: impl Into<String>) -> Self {
        self.logical_id = Some(logical_id.into());
        self
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn logical_id(&self) -> Option<&str> {
        self.logical_id.as_deref()
    }

    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    pub fn resource_type(&self) -> ResourceType {
        match &self.kind {
            ResourceKind::LambdaFunction(_) => ResourceType::LambdaFunction,
            ResourceKind::SqsQueue(_) => ResourceType::SqsQueue,
        }
    }

    /// Physical name the ARN is derived from.
    pub fn name(&self) -> &str {
        match &self.kind {
            ResourceKind::LambdaFunction(f) => &f.function_name,
            ResourceKind::SqsQueue(q) => &q.queue_name,
        }
    }

    /// Computed on every call from immutable fields.
    pub fn arn(&self) -> Arn {
        self.resource_type()
            .arn(&self.region, &self.account, self.name())
    }

    /// Secondary identifier (queue URL), if this kind has one.
    pub fn secondary_id(&self) -> Option<&str> {
        match &self.kind {
            ResourceKind::SqsQueue(q) => Some(&q.queue_url),
            ResourceKind::LambdaFunction(_) => None,
        }
    }

    pub fn as_function(&self) -> Option<&LambdaFunction> {
        match &self.kind {
            ResourceKind::LambdaFunction(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_queue(&self) -> Option<&SqsQueue> {
        match &self.kind {
            ResourceKind::SqsQueue(q) => Some(q),
            _ => None,
        }
    }

    pub fn is_event_source(&self) -> bool {
        self.event_source_mappings().is_some()
    }

    /// `None` for kinds that cannot host event source mappings.
    pub fn event_source_mappings(&self) -> Option<&[EventSourceMapping]> {
        match &self.kind {
            ResourceKind::SqsQueue(q) => Some(&q.event_source_mappings),
            ResourceKind::LambdaFunction(_) => None,
        }
    }

    pub(crate) fn event_source_mappings_mut(&mut self) -> Option<&mut Vec<EventSourceMapping>> {
        match &mut self.kind {
            ResourceKind::SqsQueue(q) => Some(&mut q.event_source_mappings),
            ResourceKind::LambdaFunction(_) => None,
        }
    }
}
