#![forbid(unsafe_code)]

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::{Account, Arn, AwsError, EnvValue, EventSourceMapping, Region, Resource, ResourceType};

/// Handle to a resource owned by a [`World`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeploymentId(usize);

/// What to do when a resource is registered under an ARN that is already taken.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Log a warning; the newer resource wins lookups.
    #[default]
    Warn,
    /// Refuse the registration.
    Deny,
}

/// A (region, account) context that templates are deployed into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deployment {
    pub region: Region,
    pub account: Account,
    stacks: Vec<String>,
}

impl Deployment {
    /// Names of the stacks deployed so far, in deployment order.
    pub fn stacks(&self) -> &[String] {
        &self.stacks
    }
}

/// Registry of every resource created during one analysis run.
///
/// Resources are appended and never removed. Each ARN (and secondary identifier) maps to the
/// most recent registration; an earlier resource with the same ARN stays allocated but is
/// shadowed.
#[derive(Debug, Default)]
pub struct World {
    resources: Vec<Resource>,
    arns: HashMap<Arn, ResourceId>,
    secondary: HashMap<String, ResourceId>,
    deployments: Vec<Deployment>,
    duplicates: DuplicatePolicy,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duplicate_policy(duplicates: DuplicatePolicy) -> Self {
        Self {
            duplicates,
            ..Self::default()
        }
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicates
    }

    pub fn add_deployment(&mut self, region: Region, account: Account) -> DeploymentId {
        tracing::debug!(region = %region, account = %account, "new deployment");
        self.deployments.push(Deployment {
            region,
            account,
            stacks: Vec::new(),
        });
        DeploymentId(self.deployments.len() - 1)
    }

    pub fn deployment(&self, id: DeploymentId) -> Option<&Deployment> {
        self.deployments.get(id.0)
    }

    pub fn deployments(&self) -> &[Deployment] {
        &self.deployments
    }

    /// Records that `stack` was deployed into `id`. Unknown ids are ignored.
    pub fn record_stack(&mut self, id: DeploymentId, stack: impl Into<String>) {
        if let Some(d) = self.deployments.get_mut(id.0) {
            d.stacks.push(stack.into());
        }
    }

    pub fn new_function(
        &mut self,
        region: Region,
        account: Account,
        function_name: impl Into<String>,
        environment: BTreeMap<String, EnvValue>,
    ) -> Result<ResourceId, AwsError> {
        self.register(Resource::lambda_function(
            region,
            account,
            function_name,
            environment,
        ))
    }

    pub fn new_queue(
        &mut self,
        region: Region,
        account: Account,
        queue_name: impl Into<String>,
    ) -> Result<ResourceId, AwsError> {
        self.register(Resource::sqs_queue(region, account, queue_name))
    }

    pub fn register(&mut self, resource: Resource) -> Result<ResourceId, AwsError> {
        let arn = resource.arn();
        if self.arns.contains_key(&arn) {
            match self.duplicates {
                DuplicatePolicy::Warn => {
                    tracing::warn!(%arn, "{arn} is already a registered resource");
                }
                DuplicatePolicy::Deny => return Err(AwsError::DuplicateArn { arn }),
            }
        }

        let id = ResourceId(self.resources.len());
        if let Some(secondary) = resource.secondary_id() {
            self.secondary.insert(secondary.to_string(), id);
        }
        tracing::info!(%arn, logical_id = resource.logical_id(), "registered resource");
        self.arns.insert(arn, id);
        self.resources.push(resource);
        Ok(id)
    }

    pub fn get(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(id.0)
    }

    /// Resolves an ARN or a secondary identifier to the most recent registration.
    pub fn lookup(&self, identifier: &str) -> Result<&Resource, AwsError> {
        self.lookup_id(identifier)
            .and_then(|id| self.get(id))
            .ok_or_else(|| AwsError::UnknownIdentifier {
                identifier: identifier.to_string(),
            })
    }

    pub fn lookup_id(&self, identifier: &str) -> Option<ResourceId> {
        self.arns
            .get(identifier)
            .or_else(|| self.secondary.get(identifier))
            .copied()
    }

    /// Finds the resource of type `ty` whose computed ARN matches `name` in the given
    /// region/account. Never creates anything.
    pub fn find_by_name(
        &self,
        ty: ResourceType,
        region: &Region,
        account: &Account,
        name: &str,
    ) -> Option<&Resource> {
        let arn = ty.arn(region, account, name);
        self.arns.get(&arn).and_then(|id| self.get(*id))
    }

    /// Most recent live resource declared under `logical_id`.
    pub fn find_by_logical_id(&self, logical_id: &str) -> Option<&Resource> {
        self.resources()
            .filter(|r| r.logical_id() == Some(logical_id))
            .last()
    }

    /// Live resources (the current registration of each ARN), in registration order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> + '_ {
        self.resources
            .iter()
            .enumerate()
            .filter(|(i, r)| self.arns.get(&r.arn()) == Some(&ResourceId(*i)))
            .map(|(_, r)| r)
    }

    /// Number of live resources.
    pub fn len(&self) -> usize {
        self.arns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arns.is_empty()
    }

    /// Attaches `mapping` to the event source identified by `source` (ARN or URL).
    pub fn add_event_source_mapping(
        &mut self,
        source: &str,
        mapping: EventSourceMapping,
    ) -> Result<(), AwsError> {
        let id = self
            .lookup_id(source)
            .ok_or_else(|| AwsError::UnknownIdentifier {
                identifier: source.to_string(),
            })?;
        let resource = &mut self.resources[id.0];
        let arn = resource.arn();
        let Some(mappings) = resource.event_source_mappings_mut() else {
            return Err(AwsError::NotAnEventSource { arn });
        };
        tracing::debug!(source = %arn, function = %mapping.function_name, "event source mapping");
        mappings.push(mapping);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> Region {
        Region::us_east_1()
    }

    fn account() -> Account {
        Account::new("123")
    }

    #[test]
    fn lookup_by_arn_and_url() {
        let mut world = World::new();
        let id = world.new_queue(region(), account(), "queue1").expect("queue");
        let by_arn = world.lookup("arn:aws:sqs:us-east-1:123:queue1").expect("arn");
        let by_url = world
            .lookup("https://sqs.us-east-1.amazonaws.com/123/queue1")
            .expect("url");
        assert_eq!(by_arn, by_url);
        assert_eq!(world.get(id), Some(by_arn));
        assert!(matches!(
            world.lookup("arn:aws:sqs:us-east-1:123:nope"),
            Err(AwsError::UnknownIdentifier { .. })
        ));
    }

    #[test]
    fn duplicate_registration_warns_and_latest_wins() {
        let mut world = World::new();
        let first = world
            .register(Resource::sqs_queue(region(), account(), "q").with_logical_id("A"))
            .expect("first");
        let second = world
            .register(Resource::sqs_queue(region(), account(), "q").with_logical_id("B"))
            .expect("duplicate is only a warning");
        assert_ne!(first, second);
        assert_eq!(world.lookup_id("arn:aws:sqs:us-east-1:123:q"), Some(second));
        assert_eq!(world.len(), 1);
        let live: Vec<_> = world.resources().filter_map(|r| r.logical_id()).collect();
        assert_eq!(live, vec!["B"]);
        assert!(world.find_by_logical_id("A").is_none());
    }

    #[test]
    fn duplicate_registration_denied_in_strict_mode() {
        let mut world = World::with_duplicate_policy(DuplicatePolicy::Deny);
        world.new_queue(region(), account(), "q").expect("first");
        let err = world
            .new_queue(region(), account(), "q")
            .expect_err("strict mode rejects duplicates");
        assert!(matches!(err, AwsError::DuplicateArn { .. }));
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn find_by_name_never_creates() {
        let mut world = World::new();
        world
            .new_function(region(), account(), "lambda1", BTreeMap::new())
            .expect("function");
        let found = world
            .find_by_name(ResourceType::LambdaFunction, &region(), &account(), "lambda1")
            .expect("found");
        assert_eq!(found.name(), "lambda1");
        assert!(world
            .find_by_name(ResourceType::LambdaFunction, &region(), &account(), "other")
            .is_none());
        assert!(world
            .find_by_name(ResourceType::SqsQueue, &region(), &account(), "lambda1")
            .is_none());
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn event_source_mappings_attach_to_queues_only() {
        let mut world = World::new();
        world.new_queue(region(), account(), "q").expect("queue");
        world
            .new_function(region(), account(), "f", BTreeMap::new())
            .expect("function");

        let queue_arn = Arn::sqs_queue(&region(), &account(), "q");
        world
            .add_event_source_mapping(
                "https://sqs.us-east-1.amazonaws.com/123/q",
                EventSourceMapping::new("f", queue_arn.clone()),
            )
            .expect("attach");
        let q = world.lookup(queue_arn.as_str()).expect("queue");
        assert_eq!(q.event_source_mappings().map(|m| m.len()), Some(1));

        let err = world
            .add_event_source_mapping(
                "arn:aws:lambda:us-east-1:123:function:f",
                EventSourceMapping::new("f", queue_arn),
            )
            .expect_err("functions do not host mappings");
        assert!(matches!(err, AwsError::NotAnEventSource { .. }));
    }

    #[test]
    fn deployments_record_their_stacks() {
        let mut world = World::new();
        let d = world.add_deployment(region(), account());
        world.record_stack(d, "app");
        assert_eq!(world.deployments().len(), 1);
        assert_eq!(world.deployment(d).map(|d| d.stacks().to_vec()), Some(vec!["app".to_string()]));
    }
}
