//! Per-declaration wire layout: field order, flag presence bits and size.

use indexmap::IndexMap;
use layer_tl_parser::tl::{Declaration, Flag, Primitive, TypeExpr};
use serde::Serialize;

use crate::errors::PlanError;
use crate::names;

/// Bytes taken by the leading constructor identifier.
pub const ID_SIZE: u32 = 4;

/// Encoded size of a declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SizeFormula {
    /// Every field is fixed-width and unconditional.
    Constant {
        /// Total bytes, identifier included.
        size: u32,
    },
    /// `base + Σ probes`, evaluated against a value at encode time.
    Dynamic {
        /// Identifier plus every unconditional fixed-width field.
        base: u32,
        /// Fields whose size depends on the value.
        probes: Vec<Probe>,
    },
}

impl SizeFormula {
    /// The size known without looking at a value.
    pub fn base(&self) -> u32 {
        match self {
            Self::Constant { size } => *size,
            Self::Dynamic { base, .. } => *base,
        }
    }

    /// The size, if it never depends on the value.
    pub fn constant(&self) -> Option<u32> {
        match self {
            Self::Constant { size } => Some(*size),
            Self::Dynamic { .. } => None,
        }
    }
}

/// A field whose contribution to the size is measured at encode time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Probe {
    /// Index into [`WirePlan::fields`].
    pub field_index: usize,
    /// Field name.
    pub field: String,
    /// How to measure it.
    pub kind: ProbeKind,
    /// Set when the field only counts while its presence bit is set.
    pub condition: Option<Flag>,
}

/// What a [`Probe`] measures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeKind {
    /// A fixed width behind a flag.
    Fixed {
        /// Bytes when present.
        size: u32,
    },
    /// Length-prefixed padded `bytes`.
    Bytes,
    /// Length-prefixed padded UTF-8.
    String,
    /// A vector; elements are measured one by one.
    Vector {
        /// Whether the vector header identifier is written.
        boxed: bool,
    },
    /// A nested object.
    Object {
        /// `true` for bare objects written without their identifier.
        bare: bool,
    },
    /// A TL JSON value.
    Json,
    /// A type variable or `Object`: measured from the value itself.
    Generic,
}

/// How a field is written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// A `#` flags word, synthesized from presence bits.
    FlagsWord {
        /// No field refers to this word; it is always written as `0`.
        unused: bool,
    },
    /// A `true` field: no bytes, only a presence bit.
    TrueBit,
    /// A fixed-width value.
    Fixed {
        /// Bytes when written.
        size: u32,
    },
    /// A value whose width depends on its content.
    Dynamic,
}

/// One field of a [`WirePlan`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldPlan {
    /// Schema field name.
    pub name: String,
    /// lowerCamelCase display name.
    pub display_name: String,
    /// Identifier safe for Rust emitters.
    pub rust_name: String,
    /// Declared type, flag wrapper included.
    pub ty: TypeExpr,
    /// How it is written.
    pub kind: FieldKind,
    /// The governing presence bit, if any.
    pub flag: Option<Flag>,
}

impl FieldPlan {
    /// The field type with any flag wrapper removed.
    pub fn value_type(&self) -> &TypeExpr {
        self.ty.erased()
    }
}

/// A field controlled by one bit of a flags word.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PresenceBit {
    /// Bit index, `0..=31`.
    pub bit: u8,
    /// Name of the governed field.
    pub field: String,
}

/// How one declaration is laid out on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WirePlan {
    /// Encoded size, identifier included.
    pub size: SizeFormula,
    /// Flags word name → the bits it carries, in field order.
    pub presence: IndexMap<String, Vec<PresenceBit>>,
    /// Fields in declaration order, which is also wire order.
    pub fields: Vec<FieldPlan>,
}

impl WirePlan {
    /// The field called `name`.
    pub fn field(&self, name: &str) -> Option<&FieldPlan> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Plans the layout of `decl`.
///
/// Fails when a flag-gated field names a flags word that is not declared
/// earlier in the same declaration.
pub fn plan(decl: &Declaration) -> Result<WirePlan, PlanError> {
    let mut presence: IndexMap<String, Vec<PresenceBit>> = IndexMap::new();
    let mut fields = Vec::with_capacity(decl.params.len());
    let mut probes = Vec::new();
    let mut base = ID_SIZE;

    for (index, param) in decl.params.iter().enumerate() {
        let flag = param.flag().cloned();
        if let Some(flag) = &flag {
            let bits = presence.get_mut(&flag.word).ok_or_else(|| PlanError::FlagWordMissing {
                declaration: decl.full_name(),
                word: flag.word.clone(),
            })?;
            bits.push(PresenceBit { bit: flag.bit, field: param.name.clone() });
        }

        let value_ty = param.ty.erased();
        let kind = match value_ty {
            TypeExpr::Primitive(Primitive::Flags) => {
                presence.insert(param.name.clone(), Vec::new());
                base += 4;
                FieldKind::FlagsWord { unused: true }
            }
            TypeExpr::Primitive(Primitive::True) => FieldKind::TrueBit,
            _ => match fixed_size(value_ty) {
                Some(size) => {
                    match &flag {
                        None => base += size,
                        Some(_) => probes.push(Probe {
                            field_index: index,
                            field: param.name.clone(),
                            kind: ProbeKind::Fixed { size },
                            condition: flag.clone(),
                        }),
                    }
                    FieldKind::Fixed { size }
                }
                None => {
                    probes.push(Probe {
                        field_index: index,
                        field: param.name.clone(),
                        kind: probe_kind(value_ty),
                        condition: flag.clone(),
                    });
                    FieldKind::Dynamic
                }
            },
        };

        fields.push(FieldPlan {
            name: param.name.clone(),
            display_name: names::field_display_name(&param.name),
            rust_name: names::rust_field_name(&param.name),
            ty: param.ty.clone(),
            kind,
            flag,
        });
    }

    for field in &mut fields {
        if let FieldKind::FlagsWord { unused } = &mut field.kind {
            *unused = presence.get(&field.name).is_none_or(Vec::is_empty);
        }
    }

    let size = if probes.is_empty() {
        SizeFormula::Constant { size: base }
    } else {
        SizeFormula::Dynamic { base, probes }
    };
    Ok(WirePlan { size, presence, fields })
}

/// Width of a fixed-size, unconditional value of type `ty`.
pub fn fixed_size(ty: &TypeExpr) -> Option<u32> {
    match ty {
        TypeExpr::Primitive(p) => match p {
            Primitive::True => None,
            other => other.fixed_size(),
        },
        _ => None,
    }
}

fn probe_kind(ty: &TypeExpr) -> ProbeKind {
    match ty {
        TypeExpr::Primitive(Primitive::Bytes) => ProbeKind::Bytes,
        TypeExpr::Primitive(Primitive::String) => ProbeKind::String,
        TypeExpr::Primitive(Primitive::Json) => ProbeKind::Json,
        TypeExpr::Vector { boxed, .. } => ProbeKind::Vector { boxed: *boxed },
        TypeExpr::Named { bare, .. } => ProbeKind::Object { bare: *bare },
        _ => ProbeKind::Generic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_of(src: &str) -> WirePlan {
        plan(&src.parse().unwrap()).unwrap()
    }

    #[test]
    fn all_fixed_is_constant() {
        let wire = plan_of("pair#1 a:int b:long = Pair");
        assert_eq!(wire.size, SizeFormula::Constant { size: 16 });
    }

    #[test]
    fn gated_fixed_field_becomes_a_conditional_probe() {
        let wire = plan_of("x#1 flags:# a:flags.0?int b:flags.1?true = Thing");
        let SizeFormula::Dynamic { base, probes } = &wire.size else {
            panic!("expected dynamic size");
        };
        assert_eq!(*base, 8);
        assert_eq!(probes.len(), 1);
        assert_eq!(probes[0].kind, ProbeKind::Fixed { size: 4 });
        assert_eq!(probes[0].condition.as_ref().map(|f| f.bit), Some(0));
        assert_eq!(wire.fields[2].kind, FieldKind::TrueBit);
        assert_eq!(
            wire.presence["flags"].iter().map(|p| p.bit).collect::<Vec<_>>(),
            [0, 1]
        );
    }

    #[test]
    fn unused_flags_word() {
        let wire = plan_of("x#1 flags:# id:long = Thing");
        assert_eq!(wire.fields[0].kind, FieldKind::FlagsWord { unused: true });
        assert_eq!(wire.size, SizeFormula::Constant { size: 16 });
    }

    #[test]
    fn flag_before_its_word_is_rejected() {
        let decl = "x#1 a:flags.0?int flags:# = Thing".parse().unwrap();
        assert!(matches!(plan(&decl), Err(PlanError::FlagWordMissing { word, .. }) if word == "flags"));
    }

    #[test]
    fn order_is_declaration_order() {
        let wire = plan_of("x#1 z:string a:int m:Vector<long> = Thing");
        let names: Vec<_> = wire.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["z", "a", "m"]);
        assert_eq!(wire.size.base(), 8);
    }
}
