#![forbid(unsafe_code)]

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use cloudcap_aws::{Account, DeploymentId, Region, Resource, ResourceId, World};
use serde_yaml::{Mapping, Value};

use crate::resource_types::compile_declaration;
use crate::{load_file, resolve_intrinsics, CfnValue, DependencyGraph, SymbolTables, TemplateError};

const RESOURCES: &str = "Resources";
const PARAMETERS: &str = "Parameters";

/// Caller-supplied knobs for one deployment of a stack.
#[derive(Clone, Debug, Default)]
pub struct StackOptions {
    /// Overrides the name derived from the template's file stem.
    pub stack_name: Option<String>,
    /// Parameter overrides, by logical parameter name.
    pub parameters: BTreeMap<String, String>,
}

/// One entry of the template's `Resources` mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub logical_id: String,
    pub body: CfnValue,
}

/// A parsed and ordered template, ready to be deployed into a [`World`].
#[derive(Debug)]
pub struct Stack {
    path: String,
    name: String,
    parameters: Mapping,
    declarations: Vec<Declaration>,
    index: HashMap<String, usize>,
    graph: DependencyGraph,
    order: Vec<String>,
    symbols: SymbolTables,
    resources: Vec<ResourceId>,
}

impl Stack {
    /// Splits `template` into declarations and computes their creation order.
    ///
    /// `path` is only used to name the stack and in error messages.
    pub fn new(template: CfnValue, path: impl Into<String>) -> Result<Self, TemplateError> {
        let path = path.into();
        let resources = template
            .get(RESOURCES)
            .and_then(Value::as_mapping)
            .ok_or_else(|| TemplateError::MissingResources { path: path.clone() })?;

        let mut declarations = Vec::with_capacity(resources.len());
        for (key, body) in resources {
            let Some(logical_id) = key.as_str() else {
                return Err(TemplateError::MalformedDeclaration {
                    path,
                    logical_id: format!("{key:?}"),
                    message: "logical ids must be strings".into(),
                });
            };
            if !body.is_mapping() {
                return Err(TemplateError::MalformedDeclaration {
                    path,
                    logical_id: logical_id.to_string(),
                    message: "a resource declaration must be a mapping".into(),
                });
            }
            declarations.push(Declaration {
                logical_id: logical_id.to_string(),
                body: body.clone(),
            });
        }

        let graph = DependencyGraph::build(
            declarations
                .iter()
                .map(|d| (d.logical_id.as_str(), &d.body)),
        );
        let order = graph
            .creation_order()
            .map_err(|logical_id| TemplateError::Cyclic {
                path: path.clone(),
                logical_id,
            })?;
        tracing::debug!(?order, "creation order for {path}");

        let index = declarations
            .iter()
            .enumerate()
            .map(|(i, d)| (d.logical_id.clone(), i))
            .collect();
        let parameters = template
            .get(PARAMETERS)
            .and_then(Value::as_mapping)
            .cloned()
            .unwrap_or_default();
        let name = Path::new(&path)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("stack")
            .to_string();

        Ok(Self {
            path,
            name,
            parameters,
            declarations,
            index,
            graph,
            order,
            symbols: SymbolTables::new(),
            resources: Vec::new(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let template = load_file(path)?;
        Self::new(template, path.display().to_string())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The stack name; set from [`StackOptions::stack_name`] once deployed.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declarations in document order.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn creation_order(&self) -> &[String] {
        &self.order
    }

    pub fn symbols(&self) -> &SymbolTables {
        &self.symbols
    }

    /// Resources created by the last deployment, in creation order.
    pub fn resources(&self) -> &[ResourceId] {
        &self.resources
    }

    /// Compiles every declaration, in creation order, into `world` under `deployment`.
    ///
    /// Symbol tables are rebuilt from scratch, so a stack can be deployed more than once.
    pub fn deploy(
        &mut self,
        world: &mut World,
        deployment: DeploymentId,
        options: &StackOptions,
    ) -> Result<(), TemplateError> {
        let (region, account) = world
            .deployment(deployment)
            .map(|d| (d.region.clone(), d.account.clone()))
            .ok_or_else(|| TemplateError::UnknownDeployment {
                path: self.path.clone(),
            })?;
        if let Some(name) = &options.stack_name {
            self.name = name.clone();
        }
        tracing::info!(stack = %self.name, %region, %account, "deploying {}", self.path);

        self.symbols = SymbolTables::new();
        self.resources.clear();
        self.seed_pseudo_parameters(&region, &account);
        self.seed_parameters(options)?;

        let mut cx = CompileContext {
            world: &mut *world,
            region,
            account,
            stack_name: &self.name,
            symbols: &mut self.symbols,
            created: &mut self.resources,
        };
        for logical_id in &self.order {
            let declaration = &self.declarations[self.index[logical_id]];
            compile(&mut cx, &self.path, declaration)?;
        }

        world.record_stack(deployment, self.name.clone());
        Ok(())
    }

    fn seed_pseudo_parameters(&mut self, region: &Region, account: &Account) {
        let partition = region.partition();
        self.symbols.set_ref("AWS::Region", region.name());
        self.symbols.set_ref("AWS::AccountId", account.id());
        self.symbols.set_ref("AWS::Partition", partition.name());
        self.symbols.set_ref("AWS::StackName", self.name.as_str());
        self.symbols.set_ref("AWS::URLSuffix", partition.url_suffix());
    }

    fn seed_parameters(&mut self, options: &StackOptions) -> Result<(), TemplateError> {
        for (key, declaration) in &self.parameters {
            let Some(name) = key.as_str() else { continue };
            let value = match options.parameters.get(name) {
                Some(v) => Value::String(v.clone()),
                None => declaration.get("Default").cloned().ok_or_else(|| {
                    TemplateError::MissingParameter {
                        path: self.path.clone(),
                        name: name.to_string(),
                    }
                })?,
            };
            self.symbols.set_ref(name, value);
        }
        for name in options.parameters.keys() {
            if !self.parameters.contains_key(name.as_str()) {
                tracing::warn!("{}: ignoring override for undeclared parameter `{name}`", self.path);
            }
        }
        Ok(())
    }
}

fn compile(
    cx: &mut CompileContext<'_>,
    path: &str,
    declaration: &Declaration,
) -> Result<(), TemplateError> {
    let logical_id = declaration.logical_id.as_str();
    let malformed = |message: &str| TemplateError::MalformedDeclaration {
        path: path.to_string(),
        logical_id: logical_id.to_string(),
        message: message.to_string(),
    };

    let type_name = declaration
        .body
        .get("Type")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing string `Type`"))?;
    let properties = match declaration.body.get("Properties") {
        None | Some(Value::Null) => Value::Mapping(Mapping::new()),
        Some(p) if p.is_mapping() => resolve_intrinsics(p, cx.symbols, logical_id)?,
        Some(_) => return Err(malformed("`Properties` must be a mapping")),
    };

    tracing::debug!(%logical_id, %type_name, "compiling");
    compile_declaration(cx, logical_id, type_name, &properties)
}

/// Mutable state threaded through the per-type constructors of one deployment.
pub(crate) struct CompileContext<'a> {
    pub(crate) world: &'a mut World,
    pub(crate) region: Region,
    pub(crate) account: Account,
    pub(crate) stack_name: &'a str,
    pub(crate) symbols: &'a mut SymbolTables,
    created: &'a mut Vec<ResourceId>,
}

impl CompileContext<'_> {
    /// Physical name for a declaration that does not name itself.
    pub(crate) fn physical_name(&self, logical_id: &str) -> String {
        format!("{}-{logical_id}", self.stack_name)
    }

    pub(crate) fn register(
        &mut self,
        logical_id: &str,
        resource: Resource,
    ) -> Result<ResourceId, TemplateError> {
        let id = self
            .world
            .register(resource)
            .map_err(|source| TemplateError::Registry {
                logical_id: logical_id.to_string(),
                source,
            })?;
        self.created.push(id);
        Ok(id)
    }
}

/// Loads the template at `path` and deploys it into `world`.
pub fn deploy_template(
    world: &mut World,
    deployment: DeploymentId,
    path: &Path,
    options: &StackOptions,
) -> Result<Stack, TemplateError> {
    let mut stack = Stack::from_file(path)?;
    stack.deploy(world, deployment, options)?;
    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_str;

    fn stack(yaml: &str) -> Stack {
        Stack::new(load_str(yaml, "unit.yaml").expect("load"), "unit.yaml").expect("stack")
    }

    fn world() -> (World, DeploymentId) {
        let mut world = World::new();
        let d = world.add_deployment(Region::us_east_1(), Account::new("123"));
        (world, d)
    }

    #[test]
    fn name_defaults_to_file_stem() {
        let s = stack("Resources: {}\n");
        assert_eq!(s.name(), "unit");
        assert!(s.declarations().is_empty());
    }

    #[test]
    fn missing_resources_is_reported() {
        let err = Stack::new(load_str("Foo: 1\n", "x.yaml").expect("load"), "x.yaml")
            .expect_err("no resources");
        assert!(matches!(err, TemplateError::MissingResources { .. }));
    }

    #[test]
    fn pseudo_parameters_and_defaults_resolve() {
        let mut s = stack(
            r#"
Parameters:
  Suffix:
    Type: String
    Default: dev
Resources:
  Queue:
    Type: AWS::SQS::Queue
    Properties:
      QueueName: !Ref Suffix
  Fn:
    Type: AWS::Lambda::Function
    Properties:
      FunctionName: !Ref AWS::StackName
"#,
        );
        let (mut world, d) = world();
        s.deploy(&mut world, d, &StackOptions::default()).expect("deploy");

        assert!(world.lookup("arn:aws:sqs:us-east-1:123:dev").is_ok());
        assert!(world
            .lookup("arn:aws:lambda:us-east-1:123:function:unit")
            .is_ok());
        assert_eq!(world.deployments()[0].stacks(), ["unit".to_string()]);
    }

    #[test]
    fn overrides_win_over_defaults() {
        let mut s = stack(
            "Parameters:\n  Name:\n    Default: a\nResources:\n  Q:\n    Type: AWS::SQS::Queue\n    Properties:\n      QueueName: !Ref Name\n",
        );
        let (mut world, d) = world();
        let options = StackOptions {
            stack_name: Some("prod".into()),
            parameters: BTreeMap::from([("Name".to_string(), "b".to_string())]),
        };
        s.deploy(&mut world, d, &options).expect("deploy");
        assert_eq!(s.name(), "prod");
        assert!(world.lookup("arn:aws:sqs:us-east-1:123:b").is_ok());
    }

    #[test]
    fn parameter_without_default_fails() {
        let mut s = stack("Parameters:\n  Name: {Type: String}\nResources: {}\n");
        let (mut world, d) = world();
        let err = s
            .deploy(&mut world, d, &StackOptions::default())
            .expect_err("no default");
        assert!(matches!(err, TemplateError::MissingParameter { .. }));
    }

    #[test]
    fn default_physical_names_use_the_stack_name() {
        let mut s = stack("Resources:\n  Work:\n    Type: AWS::SQS::Queue\n");
        let (mut world, d) = world();
        s.deploy(&mut world, d, &StackOptions::default()).expect("deploy");
        let queue = world.find_by_logical_id("Work").expect("queue");
        assert_eq!(queue.name(), "unit-Work");
        assert_eq!(s.resources().len(), 1);
    }

    #[test]
    fn missing_type_is_malformed() {
        let mut s = stack("Resources:\n  Work:\n    Properties: {}\n");
        let (mut world, d) = world();
        let err = s
            .deploy(&mut world, d, &StackOptions::default())
            .expect_err("no type");
        assert!(matches!(err, TemplateError::MalformedDeclaration { .. }));
    }
}
