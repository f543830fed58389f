//! The compiled plan set handed to emitters and to [`crate::Codec`].

use indexmap::IndexMap;
use layer_tl_parser::Schema;
use layer_tl_parser::tl::{Category, Declaration, TypeExpr};
use serde::Serialize;

use crate::config::{CapabilityTable, Config};
use crate::dispatch::{DispatchTable, build_dispatch};
use crate::errors::PlanError;
use crate::layout::{WirePlan, plan};
use crate::metadata::Metadata;
use crate::names;
use crate::resolve::{ResolvedType, resolve};
use crate::tree::{TypeKey, TypeTree, build_type_tree};

/// One input schema as seen by the plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SchemaSummary {
    /// Diagnostic label.
    pub name: String,
    /// Prefix of every type key from this schema.
    pub namespace_prefix: String,
    /// Supertype tag of every type from this schema.
    pub default_supertype: String,
    /// Detected layer, if announced.
    pub layer: Option<u32>,
    /// Constructor count.
    pub constructors: usize,
    /// Method count.
    pub methods: usize,
}

/// How a declaration takes part in its result type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Role {
    /// The only constructor of its result type.
    Singleton,
    /// One value of an enum-resolved type.
    EnumMember {
        /// Label after common-prefix stripping.
        label: String,
        /// `UPPER_SNAKE_CASE` label.
        constant: String,
    },
    /// One implementation of an interface-resolved type.
    InterfaceMember,
    /// An RPC method.
    Method,
    /// A constructor of a built-in pseudo-type (`Bool`, `Vector t`, `True`, JSON, …).
    Builtin,
}

/// A resolved result type.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TypePlan {
    /// Grouping key.
    pub key: TypeKey,
    /// Owning schema name.
    pub schema: String,
    /// PascalCase type name.
    pub display_name: String,
    /// Chosen representation.
    pub resolved: ResolvedType,
    /// The schema's default supertype followed by configured capability tags.
    pub supertypes: Vec<String>,
}

/// Everything a codec or emitter needs about one declaration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeclarationPlan {
    /// Wire identifier.
    pub id: u32,
    /// Full schema name, e.g. `auth.sentCode`.
    pub name: String,
    /// Namespace segments.
    pub namespace_path: Vec<String>,
    /// Constructor or method.
    pub category: Category,
    /// Owning schema name.
    pub schema: String,
    /// Owning schema's namespace prefix.
    pub schema_prefix: String,
    /// Display name after the naming rules.
    pub display_name: String,
    /// Declared result type.
    pub result: TypeExpr,
    /// Result type key for constructors of user types.
    pub type_key: Option<TypeKey>,
    /// Part played in the result type.
    pub role: Role,
    /// Configured capability tags of the display name.
    pub capabilities: Vec<String>,
    /// Contains its own result type, directly or transitively.
    pub recursive: bool,
    /// Wire layout.
    pub wire: WirePlan,
}

/// The full output of [`compile`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlanSet {
    /// Input schemas in merge order.
    pub schemas: Vec<SchemaSummary>,
    /// Every resolved result type, in first-seen order.
    pub types: Vec<TypePlan>,
    /// Every declaration: per schema, constructors then methods.
    pub declarations: Vec<DeclarationPlan>,
    /// Identifier dispatch.
    pub dispatch: DispatchTable,
}

impl PlanSet {
    /// The declaration registered for `id`, built-ins included.
    pub fn declaration(&self, id: u32) -> Option<&DeclarationPlan> {
        self.declarations.iter().find(|d| d.id == id)
    }

    /// The declaration called `name`, searched in schema order.
    pub fn declaration_by_name(&self, name: &str) -> Option<&DeclarationPlan> {
        self.declarations.iter().find(|d| d.name == name)
    }

    /// The resolved type for `key`.
    pub fn type_plan(&self, key: &TypeKey) -> Option<&TypePlan> {
        self.types.iter().find(|t| &t.key == key)
    }
}

/// Runs the whole pipeline over `schemas`: type trees, resolution, layout,
/// and dispatch.
///
/// ```
/// use layer_tl_parser::{Schema, SchemaConfig};
/// use layer_tl_plan::{Config, compile};
///
/// let schema = Schema::from_tl_str("pair#1 a:int b:long = Pair;", SchemaConfig::default()).unwrap();
/// let plans = compile(&[schema], &Config::default()).unwrap();
/// assert_eq!(plans.declarations[0].wire.size.constant(), Some(16));
/// ```
pub fn compile(schemas: &[Schema], config: &Config) -> Result<PlanSet, PlanError> {
    let capabilities = CapabilityTable::compile(&config.capabilities)?;

    let mut tree = TypeTree::default();
    let mut owners: IndexMap<&str, &Schema> = IndexMap::new();
    for schema in schemas {
        owners.entry(schema.config.namespace_prefix.as_str()).or_insert(schema);
        tree.extend(build_type_tree(schema));
    }

    let resolved = resolve(&tree)?;
    let metadata = Metadata::build(&tree);

    let types = resolved
        .iter()
        .map(|(key, resolved)| {
            let owner = owners.get(key.prefix.as_str());
            let mut supertypes: Vec<String> =
                owner.map(|s| s.config.default_supertype.clone()).into_iter().collect();
            for tag in capabilities.tags_for(&key.qualified_name()) {
                if !supertypes.contains(&tag) {
                    supertypes.push(tag);
                }
            }
            TypePlan {
                key: key.clone(),
                schema: owner.map(|s| s.config.name.clone()).unwrap_or_default(),
                display_name: key.name.clone(),
                resolved: resolved.clone(),
                supertypes,
            }
        })
        .collect::<Vec<_>>();

    let mut declarations = Vec::new();
    for schema in schemas {
        for decl in schema.declarations() {
            let (type_key, role, display_name) = classify(schema, decl, &tree, &resolved);
            declarations.push(DeclarationPlan {
                id: decl.id,
                name: decl.full_name(),
                namespace_path: decl.name.namespace.clone(),
                category: decl.category,
                schema: schema.config.name.clone(),
                schema_prefix: schema.config.namespace_prefix.clone(),
                capabilities: capabilities.tags_for(&display_name),
                display_name,
                result: decl.result.clone(),
                type_key,
                role,
                recursive: metadata.is_recursive(decl),
                wire: plan(decl)?,
            });
        }
    }

    let dispatch = build_dispatch(&declarations)?;

    log::info!(
        "[tl-plan] {} schemas: {} declarations, {} types, {} dispatch entries",
        schemas.len(),
        declarations.len(),
        types.len(),
        dispatch.len()
    );

    Ok(PlanSet {
        schemas: schemas.iter().map(summarize).collect(),
        types,
        declarations,
        dispatch,
    })
}

fn classify(
    schema: &Schema,
    decl: &Declaration,
    tree: &TypeTree<'_>,
    resolved: &IndexMap<TypeKey, ResolvedType>,
) -> (Option<TypeKey>, Role, String) {
    if decl.category == Category::Method {
        return (None, Role::Method, names::method_display_name(decl));
    }

    let key = TypeKey::for_result(&schema.config.namespace_prefix, &decl.result);
    let Some((key, resolved)) = key.and_then(|k| resolved.get_key_value(&k)) else {
        return (None, Role::Builtin, decl.name.display_name());
    };

    let singleton = tree.is_singleton(key);
    let role = match resolved {
        ResolvedType::Singleton { .. } => Role::Singleton,
        ResolvedType::Enum { .. } => match resolved.enum_member(decl.id) {
            Some(m) => Role::EnumMember { label: m.label.clone(), constant: m.constant.clone() },
            None => Role::InterfaceMember,
        },
        ResolvedType::Interface { .. } => Role::InterfaceMember,
    };
    let display_name = names::constructor_display_name(decl, key, singleton);
    (Some(key.clone()), role, display_name)
}

fn summarize(schema: &Schema) -> SchemaSummary {
    SchemaSummary {
        name: schema.config.name.clone(),
        namespace_prefix: schema.config.namespace_prefix.clone(),
        default_supertype: schema.config.default_supertype.clone(),
        layer: schema.layer,
        constructors: schema.constructors.len(),
        methods: schema.methods.len(),
    }
}
