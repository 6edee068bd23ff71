#![forbid(unsafe_code)]

//! Estimates files: a YAML mapping of resource identifier to `{metric: integer}`.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::path::Path;

use cloudcap_analyzer::{Estimates, Metric};
use cloudcap_aws::World;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum EstimatesError {
    #[error("failed to read estimates from {origin}")]
    #[diagnostic(code(cloudcap::estimates::io))]
    Io {
        origin: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid estimates in {origin}: {message}")]
    #[diagnostic(
        code(cloudcap::estimates::invalid),
        help("expected a mapping like `<arn>: {{nrequests: 10}}`")
    )]
    Invalid { origin: String, message: String },
}

/// Reads an estimates file; `-` reads standard input.
pub fn load(path: &Path) -> Result<Estimates, EstimatesError> {
    let origin = path.display().to_string();
    let io_err = |source| EstimatesError::Io {
        origin: origin.clone(),
        source,
    };
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map_err(io_err)?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(io_err)?
    };
    parse(&text, &origin)
}

pub fn parse(text: &str, origin: &str) -> Result<Estimates, EstimatesError> {
    let invalid = |e: serde_yaml::Error| EstimatesError::Invalid {
        origin: origin.to_string(),
        message: e.to_string(),
    };
    let value: serde_yaml::Value = serde_yaml::from_str(text).map_err(invalid)?;
    if value.is_null() {
        return Ok(Estimates::new());
    }
    let estimates: Estimates = serde_yaml::from_value(value).map_err(invalid)?;
    tracing::debug!(entries = estimates.len(), "loaded estimates from {origin}");
    Ok(estimates)
}

/// Writes a skeleton estimates file with every metric of every live resource set to zero.
///
/// Resources declared in a template are preceded by a `# <logical id>` comment.
pub fn write_skeleton(world: &World, out: &mut impl Write) -> io::Result<()> {
    for resource in world.resources() {
        if let Some(logical_id) = resource.logical_id() {
            writeln!(out, "# {logical_id}")?;
        }
        let metrics: BTreeMap<&str, i64> = Metric::ALL.iter().map(|m| (m.name(), 0)).collect();
        let entry = BTreeMap::from([(resource.arn().to_string(), metrics)]);
        let yaml = serde_yaml::to_string(&entry).map_err(io::Error::other)?;
        writeln!(out, "{yaml}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudcap_aws::{Account, Region};

    #[test]
    fn empty_documents_have_no_estimates() {
        assert!(parse("", "inline").expect("empty").is_empty());
        assert!(parse("# nothing yet\n", "inline").expect("comments").is_empty());
    }

    #[test]
    fn parses_identifiers_and_metrics() {
        let e = parse(
            "\"arn:aws:sqs:us-east-1:123:q\":\n  nrequests: 10\nConsumer: {nrequests: 5}\n",
            "inline",
        )
        .expect("estimates");
        assert_eq!(e["arn:aws:sqs:us-east-1:123:q"]["nrequests"], 10);
        assert_eq!(e["Consumer"]["nrequests"], 5);
    }

    #[test]
    fn non_integer_values_are_invalid() {
        let err = parse("Consumer: {nrequests: lots}\n", "e.yaml").expect_err("invalid");
        assert!(matches!(err, EstimatesError::Invalid { origin, .. } if origin == "e.yaml"));
    }

    #[test]
    fn skeleton_parses_back() {
        let mut world = World::new();
        world
            .register(
                cloudcap_aws::Resource::sqs_queue(Region::us_east_1(), Account::new("123"), "q")
                    .with_logical_id("Jobs"),
            )
            .expect("queue");

        let mut buf = Vec::new();
        write_skeleton(&world, &mut buf).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("# Jobs\n"));

        let parsed = parse(&text, "skeleton").expect("parse back");
        assert_eq!(parsed["arn:aws:sqs:us-east-1:123:q"]["nrequests"], 0);
    }
}
