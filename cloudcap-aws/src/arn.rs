#![forbid(unsafe_code)]

use std::borrow::Borrow;
use std::fmt;

use serde::Serialize;

use crate::{Account, Region};

/// Amazon Resource Name. Built deterministically from a resource's naming inputs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Arn(String);

impl Arn {
    /// `arn:{partition}:lambda:{region}:{account}:function:{name}`
    pub fn lambda_function(region: &Region, account: &Account, function_name: &str) -> Self {
        Self(format!(
            "arn:{}:lambda:{}:{}:function:{}",
            region.partition(),
            region,
            account,
            function_name
        ))
    }

    /// `arn:{partition}:sqs:{region}:{account}:{name}`
    pub fn sqs_queue(region: &Region, account: &Account, queue_name: &str) -> Self {
        Self(format!(
            "arn:{}:sqs:{}:{}:{}",
            region.partition(),
            region,
            account,
            queue_name
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Arn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets registries keyed by `Arn` be queried with a plain `&str`.
impl Borrow<str> for Arn {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<Arn> for String {
    fn from(arn: Arn) -> Self {
        arn.0
    }
}

/// `https://sqs.{region}.amazonaws.com/{account}/{name}`
pub fn sqs_queue_url(region: &Region, account: &Account, queue_name: &str) -> String {
    format!("https://sqs.{region}.amazonaws.com/{account}/{queue_name}")
}
