//! Decides how each result type is represented: a singleton, a closed enum
//! of identifiers, or an interface with common fields.

use indexmap::IndexMap;
use layer_tl_parser::tl::{Declaration, TypeExpr};
use serde::Serialize;

use crate::errors::PlanError;
use crate::names;
use crate::tree::{TypeKey, TypeTree};

/// The representation chosen for one result type.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedType {
    /// Exactly one constructor; no dispatch indirection needed.
    Singleton {
        /// Its identifier.
        id: u32,
    },
    /// Several constructors without parameters: the identifier is the value.
    Enum {
        /// One entry per constructor, in schema order.
        members: Vec<EnumMember>,
    },
    /// Several constructors, at least one with parameters.
    Interface {
        /// Fields every member declares, in first-member order.
        common_fields: Vec<CommonField>,
        /// Every member, in schema order.
        members: Vec<Member>,
    },
}

/// One value of an enum-resolved type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnumMember {
    /// The member name with the common prefix removed (`Empty` for `inputPeerEmpty`).
    pub label: String,
    /// `UPPER_SNAKE_CASE` form of the label.
    pub constant: String,
    /// Constructor identifier.
    pub id: u32,
    /// Full constructor name.
    pub name: String,
}

/// A field shared by every member of an interface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommonField {
    /// Schema field name.
    pub name: String,
    /// The field type with any flag wrapper removed.
    pub ty: TypeExpr,
    /// `true` when some member declares the field behind a flag.
    pub optional: bool,
}

/// One constructor of an interface-resolved type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Member {
    /// Constructor identifier.
    pub id: u32,
    /// Full constructor name.
    pub name: String,
    /// Display name after the `Base` rule.
    pub display_name: String,
}

impl ResolvedType {
    /// Identifiers of every constructor producing this type.
    pub fn ids(&self) -> Vec<u32> {
        match self {
            Self::Singleton { id } => vec![*id],
            Self::Enum { members } => members.iter().map(|m| m.id).collect(),
            Self::Interface { members, .. } => members.iter().map(|m| m.id).collect(),
        }
    }

    /// The enum member for `id`, if this is an enum.
    pub fn enum_member(&self, id: u32) -> Option<&EnumMember> {
        match self {
            Self::Enum { members } => members.iter().find(|m| m.id == id),
            _ => None,
        }
    }
}

/// Resolves every group of `tree`, preserving its order.
pub fn resolve(tree: &TypeTree<'_>) -> Result<IndexMap<TypeKey, ResolvedType>, PlanError> {
    let mut out = IndexMap::with_capacity(tree.len());
    let (mut enums, mut interfaces) = (0usize, 0usize);
    for (key, decls) in tree.iter() {
        let resolved = resolve_group(key, decls)?;
        match resolved {
            ResolvedType::Enum { .. } => enums += 1,
            ResolvedType::Interface { .. } => interfaces += 1,
            ResolvedType::Singleton { .. } => {}
        }
        out.insert(key.clone(), resolved);
    }
    log::debug!(
        "[tl-resolve] {} types: {} enums, {} interfaces, {} singletons",
        out.len(),
        enums,
        interfaces,
        out.len() - enums - interfaces
    );
    Ok(out)
}

/// Resolves the constructors of a single result type.
pub fn resolve_group(key: &TypeKey, decls: &[&Declaration]) -> Result<ResolvedType, PlanError> {
    match decls {
        [] => Err(PlanError::EmptyTypeGroup(key.to_string())),
        [only] => Ok(ResolvedType::Singleton { id: only.id }),
        _ if decls.iter().all(|d| d.params.is_empty()) => resolve_enum(key, decls),
        _ => Ok(resolve_interface(key, decls)),
    }
}

fn resolve_enum(key: &TypeKey, decls: &[&Declaration]) -> Result<ResolvedType, PlanError> {
    let full_names: Vec<String> = decls.iter().map(|d| d.full_name()).collect();
    let refs: Vec<&str> = full_names.iter().map(String::as_str).collect();
    let prefix_len = names::common_prefix(&refs).len();

    let mut members: Vec<EnumMember> = Vec::with_capacity(decls.len());
    for (decl, full) in decls.iter().zip(&full_names) {
        let label = &full[prefix_len..];
        if label.is_empty() || members.iter().any(|m| m.label == label) {
            return Err(PlanError::AmbiguousEnumLabel {
                type_name: key.to_string(),
                siblings: full_names.clone(),
            });
        }
        members.push(EnumMember {
            label: label.to_owned(),
            constant: names::screamilize(label),
            id: decl.id,
            name: full.clone(),
        });
    }
    Ok(ResolvedType::Enum { members })
}

fn resolve_interface(key: &TypeKey, decls: &[&Declaration]) -> ResolvedType {
    let (first, rest) = (decls[0], &decls[1..]);

    let common_fields = first
        .params
        .iter()
        .filter(|p| !p.is_flags_word())
        .filter_map(|param| {
            let mut optional = param.flag().is_some();
            for sibling in rest {
                let other = sibling.params.iter().find(|o| o.same_field(param))?;
                optional |= other.flag().is_some();
            }
            Some(CommonField {
                name: param.name.clone(),
                ty: param.ty.erased().clone(),
                optional: optional && !param.ty.is_true_literal(),
            })
        })
        .collect();

    let members = decls
        .iter()
        .map(|d| Member {
            id: d.id,
            name: d.full_name(),
            display_name: names::constructor_display_name(d, key, false),
        })
        .collect();

    ResolvedType::Interface { common_fields, members }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_tl_parser::tl::QualifiedName;

    fn decls(src: &[&str]) -> Vec<Declaration> {
        src.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn key(name: &str) -> TypeKey {
        TypeKey::new("", &QualifiedName::parse(name).unwrap())
    }

    #[test]
    fn zero_param_siblings_collapse() {
        let ds = decls(&[
            "inputPeerEmpty#7f3b18ea = InputPeer",
            "inputPeerSelf#7da07ec9 = InputPeer",
        ]);
        let refs: Vec<_> = ds.iter().collect();
        let ResolvedType::Enum { members } = resolve_group(&key("InputPeer"), &refs).unwrap() else {
            panic!("expected enum");
        };
        let labels: Vec<_> = members.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, ["Empty", "Self"]);
        assert_eq!(members[1].constant, "SELF");
    }

    #[test]
    fn prefix_swallowing_a_name_is_ambiguous() {
        let ds = decls(&["foo#1 = Foo", "fooBar#2 = Foo"]);
        let refs: Vec<_> = ds.iter().collect();
        let err = resolve_group(&key("Foo"), &refs).unwrap_err();
        assert!(matches!(err, PlanError::AmbiguousEnumLabel { siblings, .. } if siblings.len() == 2));
    }

    #[test]
    fn optional_if_any_sibling_gates() {
        let ds = decls(&[
            "a#1 flags:# x:flags.0?int y:long = Thing",
            "b#2 x:int y:long z:string = Thing",
        ]);
        let refs: Vec<_> = ds.iter().collect();
        let ResolvedType::Interface { common_fields, .. } = resolve_group(&key("Thing"), &refs).unwrap()
        else {
            panic!("expected interface");
        };
        let fields: Vec<_> = common_fields.iter().map(|f| (f.name.as_str(), f.optional)).collect();
        assert_eq!(fields, [("x", true), ("y", false)]);
    }

    #[test]
    fn empty_group_is_an_invariant_violation() {
        assert!(matches!(resolve_group(&key("Thing"), &[]), Err(PlanError::EmptyTypeGroup(_))));
    }
}
