#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::AwsError;

/// An AWS account id. Opaque: only compared and formatted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Account(String);

impl Account {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Partition(String);

impl Partition {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn aws() -> Self {
        Self::new("aws")
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Domain suffix used by `AWS::URLSuffix`.
    pub fn url_suffix(&self) -> &'static str {
        match self.0.as_str() {
            "aws-cn" => "amazonaws.com.cn",
            _ => "amazonaws.com",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A region, always scoped to exactly one partition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Region {
    partition: Partition,
    name: String,
}

impl Region {
    pub fn new(partition: Partition, name: impl Into<String>) -> Self {
        Self {
            partition,
            name: name.into(),
        }
    }

    pub fn us_east_1() -> Self {
        Self::new(Partition::aws(), "us-east-1")
    }

    pub fn us_east_2() -> Self {
        Self::new(Partition::aws(), "us-east-2")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// Serialized as its name; the partition follows from it.
impl Serialize for Region {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

/// Parses a region name, inferring the partition from its prefix.
impl FromStr for Region {
    type Err = AwsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let well_formed = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !well_formed {
            return Err(AwsError::InvalidRegion {
                name: s.to_string(),
            });
        }

        let partition = if name.starts_with("cn-") {
            Partition::new("aws-cn")
        } else if name.starts_with("us-gov-") {
            Partition::new("aws-us-gov")
        } else {
            Partition::aws()
        };
        Ok(Self::new(partition, name))
    }
}
