#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

/// A quantity tracked per resource (node) and per connection (edge).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    /// Number of requests.
    Requests,
}

impl Metric {
    pub const ALL: &'static [Metric] = &[Metric::Requests];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Requests => "nrequests",
        }
    }

    /// Count-like metrics can never be negative.
    pub fn is_count_like(self) -> bool {
        match self {
            Metric::Requests => true,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .ok_or_else(|| format!("unknown metric `{s}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        assert_eq!("nrequests".parse::<Metric>(), Ok(Metric::Requests));
        assert!("latency".parse::<Metric>().is_err());
        assert_eq!(Metric::Requests.to_string(), "nrequests");
    }
}
