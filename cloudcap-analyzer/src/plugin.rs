#![forbid(unsafe_code)]

use cloudcap_aws::World;

use crate::{ConstraintStore, PluginError};

/// Contributes constraints given the compiled resource world.
///
/// Plugins only see the registry and the store; they hold no other shared state and may run in
/// any order relative to each other.
pub trait AnalyzerPlugin {
    fn name(&self) -> &'static str;

    fn constrain(&self, world: &World, store: &mut ConstraintStore) -> Result<(), PluginError>;
}
