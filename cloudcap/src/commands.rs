#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use cloudcap_analyzer::{default_oracle, Analyzer, EstimatePolicy, Verdict};
use cloudcap_aws::{Account, DeploymentId, DuplicatePolicy, Region, World};
use cloudcap_cfn::{Stack, StackOptions};
use cloudcap_plugin_builtin::builtin_plugins;
use miette::IntoDiagnostic;

use crate::config::{self, Config};
use crate::estimates;
use crate::report::{self, CheckReport, DeploymentReport, ResourceReport};

/// Where and how a template is deployed.
#[derive(Args, Clone, Debug, Default)]
pub struct TargetArgs {
    /// CloudFormation template (YAML or JSON)
    pub template: PathBuf,

    /// Deployment region (overrides `cloudcap.toml`)
    #[arg(long)]
    pub region: Option<String>,

    /// Deployment account id (overrides `cloudcap.toml`)
    #[arg(long)]
    pub account: Option<String>,

    /// Stack name (defaults to the template's file stem)
    #[arg(long)]
    pub stack_name: Option<String>,

    /// Template parameter override, `Name=value` (repeatable)
    #[arg(long = "parameter", value_name = "NAME=VALUE", value_parser = parse_parameter)]
    pub parameters: Vec<(String, String)>,

    /// Explicit configuration file instead of the nearest `cloudcap.toml`
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Fail on duplicate resource identifiers instead of warning
    #[arg(long)]
    pub strict_duplicates: bool,
}

/// Which estimates to apply and how.
#[derive(Args, Clone, Debug, Default)]
pub struct EstimateArgs {
    /// Estimates file (`-` for stdin)
    #[arg(long, short)]
    pub estimates: Option<PathBuf>,

    /// Treat estimates as lower bounds instead of exact values
    #[arg(long)]
    pub at_least: bool,
}

#[derive(Args, Clone, Debug, Default)]
pub struct CheckArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub estimates: EstimateArgs,

    /// Solver timeout in milliseconds; a timeout is reported as UNKNOWN
    #[arg(long)]
    pub timeout_ms: Option<u32>,

    /// Write a JSON report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct SmtArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub estimates: EstimateArgs,
}

#[derive(Args, Clone, Debug, Default)]
pub struct EstimatesArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Output file (defaults to stdout)
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

fn parse_parameter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got `{raw}`"))
}

/// A template compiled into its own world.
pub struct Compiled {
    pub config: Config,
    pub world: World,
    pub deployment: DeploymentId,
    pub region: Region,
    pub account: Account,
    pub stack: Stack,
}

/// Resolves configuration, then compiles the template. Flags override the configuration file.
pub fn compile(target: &TargetArgs) -> miette::Result<Compiled> {
    let config = config::resolve(target.config.as_deref(), &target.template)?;

    let region = match &target.region {
        Some(name) => name.parse::<Region>()?,
        None => config.region()?,
    };
    let account = target
        .account
        .as_deref()
        .map(Account::new)
        .unwrap_or_else(|| config.account());
    let duplicates = if target.strict_duplicates {
        DuplicatePolicy::Deny
    } else {
        config.registry.duplicates
    };

    let mut parameters: BTreeMap<String, String> = config.parameters.clone();
    parameters.extend(target.parameters.iter().cloned());
    let options = StackOptions {
        stack_name: target
            .stack_name
            .clone()
            .or_else(|| config.deployment.stack_name.clone()),
        parameters,
    };

    let mut world = World::with_duplicate_policy(duplicates);
    let deployment = world.add_deployment(region.clone(), account.clone());
    let mut stack = Stack::from_file(&target.template)?;
    stack.deploy(&mut world, deployment, &options)?;

    Ok(Compiled {
        config,
        world,
        deployment,
        region,
        account,
        stack,
    })
}

fn estimate_policy(args: &EstimateArgs, config: &Config) -> EstimatePolicy {
    if args.at_least {
        EstimatePolicy::AtLeast
    } else {
        config.estimates.policy.into()
    }
}

/// Builtin plugins, constraints, then estimates.
fn analyzer<'w>(
    world: &'w World,
    args: &EstimateArgs,
    config: &Config,
) -> miette::Result<Analyzer<'w>> {
    let mut analyzer = Analyzer::with_plugins(world, builtin_plugins());
    analyzer.constrain()?;
    if let Some(path) = &args.estimates {
        let estimates = estimates::load(path)?;
        let added = analyzer.add_estimates(&estimates, estimate_policy(args, config))?;
        tracing::info!(added, "applied estimates from {}", path.display());
    }
    Ok(analyzer)
}

pub struct CheckOutcome {
    pub verdict: Verdict,
    pub report: CheckReport,
}

pub fn check(args: &CheckArgs) -> miette::Result<CheckOutcome> {
    let compiled = compile(&args.target)?;
    let analyzer = analyzer(&compiled.world, &args.estimates, &compiled.config)?;

    let timeout_ms = args.timeout_ms.unwrap_or(compiled.config.solver.timeout_ms);
    let mut oracle = default_oracle(timeout_ms);
    let verdict = analyzer.solve(oracle.as_mut())?;

    let program = analyzer.program();
    let report = CheckReport {
        schema: report::SCHEMA,
        template: args.target.template.display().to_string(),
        deployment: DeploymentReport {
            region: compiled.region.clone(),
            account: compiled.account.clone(),
            stack: compiled.stack.name().to_string(),
        },
        verdict: verdict.as_str(),
        exit_code: verdict.exit_code(),
        oracle: oracle.name().to_string(),
        resources: ResourceReport::collect(&compiled.world),
        variables: program.variable_count(),
        constraints: program.constraints().len(),
    };
    if let Some(path) = &args.report {
        report::write_json(path, &report)?;
    }
    Ok(CheckOutcome { verdict, report })
}

/// The constraint program as SMT-LIB text, without solving.
pub fn smt(args: &SmtArgs) -> miette::Result<String> {
    let compiled = compile(&args.target)?;
    let analyzer = analyzer(&compiled.world, &args.estimates, &compiled.config)?;
    Ok(analyzer.to_text())
}

/// Writes the skeleton estimates file for the template.
pub fn estimates(args: &EstimatesArgs) -> miette::Result<()> {
    let compiled = compile(&args.target)?;
    match &args.out {
        Some(path) => write_skeleton_file(&compiled.world, path),
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            estimates::write_skeleton(&compiled.world, &mut out).into_diagnostic()?;
            out.flush().into_diagnostic()
        }
    }
}

fn write_skeleton_file(world: &World, path: &Path) -> miette::Result<()> {
    let mut file = std::fs::File::create(path).into_diagnostic()?;
    estimates::write_skeleton(world, &mut file).into_diagnostic()?;
    tracing::info!("wrote estimates skeleton {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_split_on_the_first_equals() {
        assert_eq!(
            parse_parameter("Url=a=b"),
            Ok(("Url".to_string(), "a=b".to_string()))
        );
        assert!(parse_parameter("novalue").is_err());
        assert!(parse_parameter("=x").is_err());
    }
}
