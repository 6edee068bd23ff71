#![forbid(unsafe_code)]

use std::path::Path;

use cloudcap_aws::{Account, Arn, Region, World};
use miette::IntoDiagnostic;
use serde::Serialize;

pub const SCHEMA: &str = "cloudcap.check.v1";

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub schema: &'static str,
    pub template: String,
    pub deployment: DeploymentReport,
    pub verdict: &'static str,
    pub exit_code: u8,
    pub oracle: String,
    pub resources: Vec<ResourceReport>,
    pub variables: usize,
    pub constraints: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentReport {
    pub region: Region,
    pub account: Account,
    pub stack: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceReport {
    pub arn: Arn,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_id: Option<String>,
    pub kind: &'static str,
}

impl ResourceReport {
    pub fn collect(world: &World) -> Vec<Self> {
        world
            .resources()
            .map(|r| ResourceReport {
                arn: r.arn(),
                logical_id: r.logical_id().map(str::to_string),
                kind: r.resource_type().cfn_type(),
            })
            .collect()
    }
}

pub fn write_json(path: &Path, report: &CheckReport) -> miette::Result<()> {
    let json = serde_json::to_string_pretty(report).into_diagnostic()?;
    std::fs::write(path, json + "\n").into_diagnostic()?;
    tracing::info!("wrote report {}", path.display());
    Ok(())
}
