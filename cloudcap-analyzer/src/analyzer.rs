#![forbid(unsafe_code)]

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use cloudcap_aws::{Arn, Resource, World};

use crate::{
    AnalyzerError, AnalyzerPlugin, Constraint, ConstraintProgram, ConstraintStore, Metric, Oracle,
    SatAnswer, Term, Variable,
};

/// User estimates: resource identifier (ARN, queue URL or logical id) → metric name → value.
pub type Estimates = BTreeMap<String, BTreeMap<String, i64>>;

/// How an estimate constrains its node variable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EstimatePolicy {
    /// `node == value`
    #[default]
    Exact,
    /// `node >= value`
    AtLeast,
}

/// Outcome of an analysis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The estimates fit the infrastructure.
    Pass,
    /// The constraints are provably unsatisfiable.
    Reject,
    /// The oracle could not decide.
    Unknown,
}

impl Verdict {
    pub fn exit_code(self) -> u8 {
        match self {
            Verdict::Pass => 0,
            Verdict::Reject => 2,
            Verdict::Unknown => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Reject => "REJECT",
            Verdict::Unknown => "UNKNOWN",
        }
    }
}

impl From<SatAnswer> for Verdict {
    fn from(answer: SatAnswer) -> Self {
        match answer {
            SatAnswer::Sat => Verdict::Pass,
            SatAnswer::Unsat => Verdict::Reject,
            SatAnswer::Unknown => Verdict::Unknown,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds and solves the constraint program for one [`World`].
pub struct Analyzer<'w> {
    world: &'w World,
    plugins: Vec<Box<dyn AnalyzerPlugin>>,
    store: ConstraintStore,
    constrained: bool,
}

impl<'w> Analyzer<'w> {
    pub fn new(world: &'w World) -> Self {
        Self {
            world,
            plugins: Vec::new(),
            store: ConstraintStore::new(),
            constrained: false,
        }
    }

    pub fn with_plugins(
        world: &'w World,
        plugins: impl IntoIterator<Item = Box<dyn AnalyzerPlugin>>,
    ) -> Self {
        let mut analyzer = Self::new(world);
        for p in plugins {
            analyzer.add_boxed_plugin(p);
        }
        analyzer
    }

    pub fn world(&self) -> &'w World {
        self.world
    }

    pub fn add_plugin(&mut self, plugin: impl AnalyzerPlugin + 'static) {
        self.add_boxed_plugin(Box::new(plugin));
    }

    pub fn add_boxed_plugin(&mut self, plugin: Box<dyn AnalyzerPlugin>) {
        if self.constrained {
            tracing::warn!(
                plugin = plugin.name(),
                "plugin registered after constraints were generated; it will not run"
            );
        }
        self.plugins.push(plugin);
    }

    pub fn plugin_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.iter().map(|p| p.name())
    }

    pub fn node(&mut self, resource: &Resource, metric: Metric) -> Variable {
        self.store.node(&resource.arn(), metric)
    }

    pub fn edge(&mut self, source: &Resource, destination: &Resource, metric: Metric) -> Variable {
        self.store.edge(&source.arn(), &destination.arn(), metric)
    }

    pub fn assert(&mut self, constraint: Constraint) {
        self.store.assert(constraint);
    }

    pub fn store(&self) -> &ConstraintStore {
        &self.store
    }

    pub fn program(&self) -> &ConstraintProgram {
        self.store.program()
    }

    /// Runs every plugin in registration order, then adds flow conservation and non-negativity.
    ///
    /// Only the first call has an effect.
    pub fn constrain(&mut self) -> Result<(), AnalyzerError> {
        if self.constrained {
            tracing::debug!("constraints already generated");
            return Ok(());
        }
        self.constrained = true;

        for plugin in &self.plugins {
            tracing::debug!(plugin = plugin.name(), "running plugin");
            plugin.constrain(self.world, &mut self.store)?;
        }

        self.add_conservation();
        self.add_non_negativity();
        Ok(())
    }

    /// `node(dst, m) == sum(edge(*, dst, m))` for every destination with an inbound edge.
    fn add_conservation(&mut self) {
        let mut order: Vec<(Arn, Metric)> = Vec::new();
        let mut incoming: HashMap<(Arn, Metric), Vec<Variable>> = HashMap::new();
        for (key, var) in self.store.edges() {
            let group = (key.destination.clone(), key.metric);
            let vars = incoming.entry(group.clone()).or_default();
            if vars.is_empty() {
                order.push(group);
            }
            vars.push(var);
        }

        for (destination, metric) in order {
            let edges = incoming.remove(&(destination.clone(), metric)).unwrap_or_default();
            let node = self.store.node(&destination, metric);
            self.store.assert(Constraint::eq(node, Term::sum(edges)));
        }
    }

    fn add_non_negativity(&mut self) {
        let vars: Vec<Variable> = self
            .store
            .nodes()
            .filter(|(k, _)| k.metric.is_count_like())
            .map(|(_, v)| v)
            .chain(
                self.store
                    .edges()
                    .filter(|(k, _)| k.metric.is_count_like())
                    .map(|(_, v)| v),
            )
            .collect();
        for v in vars {
            self.store.assert(Constraint::ge(v, 0i64));
        }
    }

    /// Constrains node variables with user estimates under `policy`.
    ///
    /// Unknown identifiers and metric names are skipped with a warning. Returns the number of
    /// constraints added.
    pub fn add_estimates(
        &mut self,
        estimates: &Estimates,
        policy: EstimatePolicy,
    ) -> Result<usize, AnalyzerError> {
        let mut added = 0;
        for (identifier, metrics) in estimates {
            let Some(resource) = self.resolve(identifier) else {
                tracing::warn!("estimate for unknown resource '{identifier}' is ignored");
                continue;
            };
            let arn = resource.arn();
            for (metric_name, &value) in metrics {
                let metric = match metric_name.parse::<Metric>() {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::warn!("estimate for '{identifier}': {e}; ignored");
                        continue;
                    }
                };
                if value < 0 && metric.is_count_like() {
                    return Err(AnalyzerError::NegativeEstimate {
                        identifier: identifier.clone(),
                        metric: metric_name.clone(),
                        value,
                    });
                }
                let node = self.store.node(&arn, metric);
                let constraint = match policy {
                    EstimatePolicy::Exact => Constraint::eq(node, value),
                    EstimatePolicy::AtLeast => Constraint::ge(node, value),
                };
                tracing::debug!(%arn, %metric, value, ?policy, "estimate");
                self.store.assert(constraint);
                added += 1;
            }
        }
        Ok(added)
    }

    fn resolve(&self, identifier: &str) -> Option<&'w Resource> {
        self.world
            .lookup(identifier)
            .ok()
            .or_else(|| self.world.find_by_logical_id(identifier))
    }

    /// Asks `oracle` about the program built so far.
    pub fn solve(&self, oracle: &mut dyn Oracle) -> Result<Verdict, AnalyzerError> {
        if !self.constrained {
            tracing::warn!("solving before constraints were generated");
        }
        let answer = oracle.check(self.store.program())?;
        let verdict = Verdict::from(answer);
        tracing::info!(oracle = oracle.name(), %verdict, "analysis finished");
        Ok(verdict)
    }

    /// The program in SMT-LIB 2 syntax. Does not require a solve.
    pub fn to_text(&self) -> String {
        self.store.program().to_smtlib()
    }
}
