//! Identifier → plan lookup across every merged schema.

use std::collections::BTreeMap;

use layer_tl_types::ids::{BOOL_FALSE_ID, BOOL_TRUE_ID, VECTOR_ID};
use serde::Serialize;

use crate::errors::PlanError;
use crate::plan::{DeclarationPlan, Role};

/// What a leading identifier on the wire stands for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchEntry {
    /// `boolTrue`
    BoolTrue,
    /// `boolFalse`
    BoolFalse,
    /// A boxed vector whose element type is not known statically.
    UnknownVector,
    /// A schema declaration.
    Declaration {
        /// Owning schema name.
        schema: String,
        /// Full declaration name.
        name: String,
        /// Index into [`crate::PlanSet::declarations`].
        index: usize,
    },
}

impl DispatchEntry {
    fn reserved_name(&self) -> Option<&'static str> {
        match self {
            Self::BoolTrue => Some("boolTrue"),
            Self::BoolFalse => Some("boolFalse"),
            Self::UnknownVector => Some("vector"),
            Self::Declaration { .. } => None,
        }
    }
}

/// Every identifier a decoder may meet, built once per compilation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DispatchTable {
    /// Identifier → entry.
    pub entries: BTreeMap<u32, DispatchEntry>,
    /// Constant encoded size → identifiers of that size, for size probing.
    pub size_groups: BTreeMap<u32, Vec<u32>>,
    /// Pseudo-type constructors found in the schemas (`boolTrue`, `vector`, …), name → identifier.
    pub primitives: BTreeMap<String, u32>,
}

impl DispatchTable {
    /// The entry for `id`.
    pub fn get(&self, id: u32) -> Option<&DispatchEntry> {
        self.entries.get(&id)
    }

    /// Number of identifiers a decoder can dispatch on.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds the table from every planned declaration.
///
/// Any identifier claimed twice, including by a declaration colliding with
/// a reserved built-in, fails the build.
pub fn build_dispatch(declarations: &[DeclarationPlan]) -> Result<DispatchTable, PlanError> {
    let mut table = DispatchTable::default();
    for (id, entry) in [
        (BOOL_TRUE_ID, DispatchEntry::BoolTrue),
        (BOOL_FALSE_ID, DispatchEntry::BoolFalse),
        (VECTOR_ID, DispatchEntry::UnknownVector),
    ] {
        table.entries.insert(id, entry);
    }

    let mut seen: BTreeMap<u32, &str> = BTreeMap::new();
    for (index, decl) in declarations.iter().enumerate() {
        if let Some(first) = seen.insert(decl.id, &decl.name) {
            return Err(duplicate(decl, first));
        }

        if decl.role == Role::Builtin {
            table.primitives.insert(decl.name.clone(), decl.id);
            continue;
        }

        if let Some(reserved) = table.entries.get(&decl.id).and_then(DispatchEntry::reserved_name) {
            return Err(duplicate(decl, reserved));
        }
        table.entries.insert(
            decl.id,
            DispatchEntry::Declaration {
                schema: decl.schema.clone(),
                name: decl.name.clone(),
                index,
            },
        );

        if let Some(size) = decl.wire.size.constant() {
            table.size_groups.entry(size).or_default().push(decl.id);
        }
    }

    log::debug!(
        "[tl-dispatch] {} entries, {} size groups, {} primitives",
        table.entries.len(),
        table.size_groups.len(),
        table.primitives.len()
    );
    Ok(table)
}

fn duplicate(decl: &DeclarationPlan, first: &str) -> PlanError {
    PlanError::DuplicateIdentifier {
        id: decl.id,
        first: first.to_owned(),
        second: decl.name.clone(),
    }
}
