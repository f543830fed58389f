//! Encodes and decodes [`Value`]s by interpreting a compiled [`PlanSet`].
//!
//! ```
//! use layer_tl_parser::{Schema, SchemaConfig};
//! use layer_tl_plan::codec::{Codec, Object, Value};
//! use layer_tl_plan::{Config, compile};
//!
//! let schema = Schema::from_tl_str(
//!     "point#1 x:int y:int = Point;",
//!     SchemaConfig::default(),
//! ).unwrap();
//! let plans = compile(&[schema], &Config::default()).unwrap();
//! let codec = Codec::new(&plans);
//!
//! let point = Value::from(Object::new(1).with("x", 3).with("y", -1));
//! let bytes = codec.encode(&point).unwrap();
//! assert_eq!(bytes.len(), 12);
//! assert_eq!(codec.decode(&bytes).unwrap(), point);
//! ```

mod value;

use std::collections::{HashMap, HashSet};

use layer_tl_parser::tl::{Category, Primitive, QualifiedName, TypeExpr};
use layer_tl_types::deserialize::{read_len, read_vector_id};
use layer_tl_types::ids::*;
use layer_tl_types::serialize::{MAX_BYTES_LEN, bytes_len, write_len, write_vector_header};
use layer_tl_types::{Cursor, Deserializable, JsonValue, Serializable};

pub use value::{Object, Value};

use crate::dispatch::DispatchEntry;
use crate::errors::CodecError;
use crate::layout::{FieldKind, ID_SIZE, SizeFormula};
use crate::plan::{DeclarationPlan, PlanSet};
use crate::resolve::ResolvedType;
use crate::tree::TypeKey;

/// Where a value sits, for bare-type lookup and diagnostics.
#[derive(Clone, Copy)]
struct Scope<'s> {
    /// Namespace prefix of the enclosing declaration's schema.
    prefix: &'s str,
    /// Field being processed.
    field: &'s str,
}

const TOP: Scope<'static> = Scope { prefix: "", field: "value" };

/// A run-time codec over a [`PlanSet`].
///
/// Leading identifiers are resolved through the plan set's
/// [`DispatchTable`](crate::DispatchTable), so built-in pseudo-constructors
/// never decode as objects.
pub struct Codec<'a> {
    plans: &'a PlanSet,
    /// prefix → constructor name → plan, for bare lowercase references.
    by_name: HashMap<&'a str, HashMap<&'a str, &'a DeclarationPlan>>,
    /// Result types with at least one constructor.
    types: HashSet<&'a TypeKey>,
}

impl<'a> Codec<'a> {
    /// Indexes `plans` for lookup by name and by result type.
    pub fn new(plans: &'a PlanSet) -> Self {
        let mut by_name: HashMap<&str, HashMap<&str, &DeclarationPlan>> = HashMap::new();
        for decl in plans.declarations.iter().filter(|d| d.category == Category::Constructor) {
            by_name
                .entry(decl.schema_prefix.as_str())
                .or_default()
                .insert(decl.name.as_str(), decl);
        }
        let types = plans.types.iter().map(|t| &t.key).collect();
        Self { plans, by_name, types }
    }

    /// The plan set this codec interprets.
    pub fn plans(&self) -> &'a PlanSet {
        self.plans
    }

    // ─── public API ──────────────────────────────────────────────────────────

    /// Encodes a self-describing value: an object with its identifier, a
    /// `Bool`, a boxed vector, or a JSON value.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::new();
        self.encode_into(value, &mut buf)?;
        Ok(buf)
    }

    /// Like [`Codec::encode`], appending to `buf`.
    pub fn encode_into(&self, value: &Value, buf: &mut Vec<u8>) -> Result<(), CodecError> {
        self.write_generic(value, TOP, buf)
    }

    /// Decodes one self-describing value from the start of `bytes`.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        self.decode_from(&mut Cursor::from_slice(bytes))
    }

    /// Decodes one self-describing value, advancing `cur`.
    pub fn decode_from(&self, cur: &mut Cursor<'_>) -> Result<Value, CodecError> {
        self.read_generic(cur, TOP)
    }

    /// Decodes the result of the method `method_id` using its declared result type.
    pub fn decode_result(&self, method_id: u32, bytes: &[u8]) -> Result<Value, CodecError> {
        let method = self
            .plan(method_id)
            .ok()
            .filter(|d| d.category == Category::Method)
            .ok_or(CodecError::UnknownIdentifier(method_id))?;
        let scope = Scope { prefix: &method.schema_prefix, field: "result" };
        self.read_typed(&method.result, &mut Cursor::from_slice(bytes), scope)
    }

    /// Evaluates the size formula of `value`; always equal to the length
    /// [`Codec::encode`] produces.
    pub fn size_of(&self, value: &Value) -> Result<usize, CodecError> {
        self.size_generic(value, TOP)
    }

    // ─── lookup ──────────────────────────────────────────────────────────────

    fn plan(&self, id: u32) -> Result<&'a DeclarationPlan, CodecError> {
        match self.plans.dispatch.get(id) {
            Some(DispatchEntry::Declaration { index, .. }) => {
                self.plans.declarations.get(*index).ok_or(CodecError::UnknownIdentifier(id))
            }
            _ => Err(CodecError::UnknownIdentifier(id)),
        }
    }

    /// The plan for `id`, which must construct the declared type `name`.
    ///
    /// A type no constructor produces (one owned by another schema, or a
    /// built-in) accepts any identifier.
    fn typed_plan(
        &self,
        id: u32,
        name: &QualifiedName,
        scope: Scope<'_>,
    ) -> Result<&'a DeclarationPlan, CodecError> {
        let plan = self.plan(id)?;
        let expected = TypeKey::new(scope.prefix, name);
        if !self.types.contains(&expected) || plan.type_key.as_ref() == Some(&expected) {
            return Ok(plan);
        }
        Err(CodecError::WrongType {
            field: scope.field.to_owned(),
            expected: expected.to_string(),
            found: plan.name.clone(),
        })
    }

    /// The constructor a bare reference stands for: a lowercase constructor
    /// name, or a `%Type` with exactly one constructor.
    fn bare_plan(&self, name: &QualifiedName, prefix: &str) -> Result<&'a DeclarationPlan, CodecError> {
        let full = name.full_name();
        let found = if name.is_bare() {
            self.by_name.get(prefix).and_then(|m| m.get(full.as_str())).copied()
        } else {
            let key = TypeKey::new(prefix, name);
            match self.plans.type_plan(&key).map(|t| &t.resolved) {
                Some(ResolvedType::Singleton { id }) => self.plan(*id).ok(),
                _ => None,
            }
        };
        found.ok_or(CodecError::UnknownType(full))
    }

    // ─── encode ──────────────────────────────────────────────────────────────

    fn write_object(&self, obj: &Object, buf: &mut Vec<u8>) -> Result<(), CodecError> {
        let plan = self.plan(obj.id)?;
        obj.id.serialize(buf);
        self.write_body(plan, obj, buf)
    }

    fn write_body(&self, plan: &DeclarationPlan, obj: &Object, buf: &mut Vec<u8>) -> Result<(), CodecError> {
        for field in &plan.wire.fields {
            match field.kind {
                FieldKind::FlagsWord { .. } => {
                    self.flags_value(plan, obj, &field.name).serialize(buf);
                    continue;
                }
                FieldKind::TrueBit => continue,
                FieldKind::Fixed { .. } | FieldKind::Dynamic => {}
            }
            let value = match obj.get(&field.name) {
                Some(v) => v,
                None if field.flag.is_some() => continue,
                None => return Err(missing(plan, &field.name)),
            };
            let scope = Scope { prefix: &plan.schema_prefix, field: &field.name };
            self.write_typed(field.value_type(), value, scope, buf)?;
        }
        Ok(())
    }

    /// The synthesized value of the flags word `word`.
    fn flags_value(&self, plan: &DeclarationPlan, obj: &Object, word: &str) -> u32 {
        plan.wire.presence.get(word).map_or(0, |bits| {
            bits.iter()
                .filter(|b| is_present(plan, obj, &b.field))
                .fold(0, |acc, b| acc | (1 << b.bit))
        })
    }

    fn write_typed(
        &self,
        ty: &TypeExpr,
        value: &Value,
        scope: Scope<'_>,
        buf: &mut Vec<u8>,
    ) -> Result<(), CodecError> {
        match (ty, value) {
            (TypeExpr::Primitive(p), v) => self.write_primitive(*p, v, scope, buf)?,
            (TypeExpr::Vector { inner, boxed }, Value::Vector(items)) => {
                if *boxed {
                    write_vector_header(items.len(), buf);
                } else {
                    write_len(items.len(), buf);
                }
                for item in items {
                    self.write_typed(inner, item, scope, buf)?;
                }
            }
            (TypeExpr::Var(name), v) => {
                if !is_self_describing(v) {
                    return Err(CodecError::UnresolvedTypeVariable(name.clone()));
                }
                self.write_generic(v, scope, buf)?;
            }
            (TypeExpr::Named { name, bare: true }, Value::Object(obj)) => {
                let plan = self.bare_plan(name, scope.prefix)?;
                self.write_body(plan, obj, buf)?;
            }
            (TypeExpr::Named { name, bare: false }, Value::Object(obj)) => {
                let plan = self.typed_plan(obj.id, name, scope)?;
                obj.id.serialize(buf);
                self.write_body(plan, obj, buf)?;
            }
            (TypeExpr::Flag { inner, .. }, v) => self.write_typed(inner, v, scope, buf)?,
            (ty, _) => return Err(mismatch(scope, ty)),
        }
        Ok(())
    }

    fn write_primitive(
        &self,
        p: Primitive,
        value: &Value,
        scope: Scope<'_>,
        buf: &mut Vec<u8>,
    ) -> Result<(), CodecError> {
        match (p, value) {
            (Primitive::Int, Value::Int(v)) => v.serialize(buf),
            (Primitive::Long, Value::Long(v)) => v.serialize(buf),
            (Primitive::Double, Value::Double(v)) => v.serialize(buf),
            (Primitive::Bool, Value::Bool(v)) => v.serialize(buf),
            (Primitive::Bytes, Value::Bytes(v)) => {
                check_len(scope, v.len())?;
                v.serialize(buf);
            }
            (Primitive::String, Value::String(v)) => {
                check_len(scope, v.len())?;
                v.serialize(buf);
            }
            (Primitive::Int128, Value::Int128(v)) => v.serialize(buf),
            (Primitive::Int256, Value::Int256(v)) => v.serialize(buf),
            (Primitive::Json, Value::Json(v)) => v.serialize(buf),
            (Primitive::True, _) => {}
            (Primitive::Object, v) => self.write_generic(v, scope, buf)?,
            (p, _) => return Err(mismatch(scope, &TypeExpr::Primitive(p))),
        }
        Ok(())
    }

    fn write_generic(&self, value: &Value, scope: Scope<'_>, buf: &mut Vec<u8>) -> Result<(), CodecError> {
        match value {
            Value::Object(obj) => self.write_object(obj, buf),
            Value::Bool(b) => {
                b.serialize(buf);
                Ok(())
            }
            Value::Json(j) => {
                j.serialize(buf);
                Ok(())
            }
            Value::Vector(items) => {
                write_vector_header(items.len(), buf);
                for item in items {
                    match item {
                        Value::Int(v) => v.serialize(buf),
                        Value::Long(v) => v.serialize(buf),
                        other => self.write_generic(other, scope, buf)?,
                    }
                }
                Ok(())
            }
            other => Err(CodecError::TypeMismatch {
                field: scope.field.to_owned(),
                expected: format!("a self-describing value, not {}", other.kind()),
            }),
        }
    }

    // ─── decode ──────────────────────────────────────────────────────────────

    fn read_object(&self, cur: &mut Cursor<'_>) -> Result<Object, CodecError> {
        let id = u32::deserialize(cur)?;
        self.read_body(self.plan(id)?, cur)
    }

    fn read_body(&self, plan: &DeclarationPlan, cur: &mut Cursor<'_>) -> Result<Object, CodecError> {
        log::trace!("[tl-codec] decoding {} ({:#010x})", plan.name, plan.id);
        let mut obj = Object::new(plan.id);
        let mut words: HashMap<&str, u32> = HashMap::new();

        for field in &plan.wire.fields {
            if let FieldKind::FlagsWord { .. } = field.kind {
                words.insert(&field.name, u32::deserialize(cur)?);
                continue;
            }
            let is_true = field.kind == FieldKind::TrueBit;
            if let Some(flag) = &field.flag {
                let set = words.get(flag.word.as_str()).is_some_and(|w| w & flag.mask() != 0);
                if !set {
                    if is_true {
                        obj.fields.insert(field.name.clone(), Value::Bool(false));
                    }
                    continue;
                }
            }
            let value = if is_true {
                Value::Bool(true)
            } else {
                let scope = Scope { prefix: &plan.schema_prefix, field: &field.name };
                self.read_typed(field.value_type(), cur, scope)?
            };
            obj.fields.insert(field.name.clone(), value);
        }
        Ok(obj)
    }

    fn read_typed(&self, ty: &TypeExpr, cur: &mut Cursor<'_>, scope: Scope<'_>) -> Result<Value, CodecError> {
        Ok(match ty {
            TypeExpr::Primitive(p) => match p {
                Primitive::Int => Value::Int(i32::deserialize(cur)?),
                Primitive::Long => Value::Long(i64::deserialize(cur)?),
                Primitive::Double => Value::Double(f64::deserialize(cur)?),
                Primitive::Bool => Value::Bool(bool::deserialize(cur)?),
                Primitive::True => Value::Bool(true),
                Primitive::Bytes => Value::Bytes(Vec::<u8>::deserialize(cur)?),
                Primitive::String => Value::String(String::deserialize(cur)?),
                Primitive::Int128 => Value::Int128(<[u8; 16]>::deserialize(cur)?),
                Primitive::Int256 => Value::Int256(<[u8; 32]>::deserialize(cur)?),
                Primitive::Json => Value::Json(JsonValue::deserialize(cur)?),
                Primitive::Flags => Value::Int(i32::deserialize(cur)?),
                Primitive::Object => self.read_generic(cur, scope)?,
            },
            TypeExpr::Vector { inner, boxed } => {
                if *boxed {
                    read_vector_id(cur)?;
                }
                let len = read_len(cur)?;
                let mut items = Vec::with_capacity(len.min(cur.remaining() / 4));
                for _ in 0..len {
                    items.push(self.read_typed(inner, cur, scope)?);
                }
                Value::Vector(items)
            }
            TypeExpr::Var(_) => self.read_generic(cur, scope)?,
            TypeExpr::Named { name, bare: true } => {
                let plan = self.bare_plan(name, scope.prefix)?;
                Value::Object(self.read_body(plan, cur)?)
            }
            TypeExpr::Named { name, bare: false } => {
                let id = u32::deserialize(cur)?;
                Value::Object(self.read_body(self.typed_plan(id, name, scope)?, cur)?)
            }
            TypeExpr::Flag { inner, .. } => self.read_typed(inner, cur, scope)?,
        })
    }

    /// Decodes a value whose type is only known from its leading identifier.
    ///
    /// A boxed vector of unknown elements is guessed from the bytes left in
    /// the buffer: `count * 8` means longs, then `count * 4` means ints,
    /// anything else is a vector of objects.
    fn read_generic(&self, cur: &mut Cursor<'_>, scope: Scope<'_>) -> Result<Value, CodecError> {
        Ok(match cur.peek_u32()? {
            BOOL_TRUE_ID | BOOL_FALSE_ID => Value::Bool(bool::deserialize(cur)?),
            VECTOR_ID => {
                cur.skip(4)?;
                let len = read_len(cur)?;
                let remaining = cur.remaining();
                if len.checked_mul(8) == Some(remaining) {
                    Value::Vector((0..len).map(|_| i64::deserialize(cur).map(Value::Long)).collect::<Result<_, _>>()?)
                } else if len.checked_mul(4) == Some(remaining) {
                    Value::Vector((0..len).map(|_| i32::deserialize(cur).map(Value::Int)).collect::<Result<_, _>>()?)
                } else {
                    let mut items = Vec::with_capacity(len.min(remaining / 4));
                    for _ in 0..len {
                        items.push(self.read_generic(cur, scope)?);
                    }
                    Value::Vector(items)
                }
            }
            JSON_NULL_ID | JSON_BOOL_ID | JSON_NUMBER_ID | JSON_STRING_ID | JSON_ARRAY_ID
            | JSON_OBJECT_ID => Value::Json(JsonValue::deserialize(cur)?),
            _ => Value::Object(self.read_object(cur)?),
        })
    }

    // ─── size ────────────────────────────────────────────────────────────────

    fn size_object(&self, plan: &DeclarationPlan, obj: &Object) -> Result<usize, CodecError> {
        let (base, probes) = match &plan.wire.size {
            SizeFormula::Constant { size } => return Ok(*size as usize),
            SizeFormula::Dynamic { base, probes } => (*base as usize, probes),
        };
        let mut total = base;
        for probe in probes {
            let field = &plan.wire.fields[probe.field_index];
            let Some(value) = obj.get(&field.name) else {
                if probe.condition.is_some() {
                    continue;
                }
                return Err(missing(plan, &field.name));
            };
            let scope = Scope { prefix: &plan.schema_prefix, field: &field.name };
            total += match field.kind {
                FieldKind::Fixed { size } => size as usize,
                _ => self.size_typed(field.value_type(), value, scope)?,
            };
        }
        Ok(total)
    }

    fn size_typed(&self, ty: &TypeExpr, value: &Value, scope: Scope<'_>) -> Result<usize, CodecError> {
        Ok(match (ty, value) {
            (TypeExpr::Primitive(Primitive::Object) | TypeExpr::Var(_), v) => self.size_generic(v, scope)?,
            (TypeExpr::Primitive(Primitive::True), _) => 0,
            (TypeExpr::Primitive(Primitive::Bytes), Value::Bytes(b)) => bytes_len(check_len(scope, b.len())?),
            (TypeExpr::Primitive(Primitive::String), Value::String(s)) => {
                bytes_len(check_len(scope, s.len())?)
            }
            (TypeExpr::Primitive(Primitive::Json), Value::Json(j)) => j.encoded_len(),
            (TypeExpr::Primitive(p), v) if primitive_fits(*p, v) => {
                p.fixed_size().map_or(0, |n| n as usize)
            }
            (TypeExpr::Vector { inner, boxed }, Value::Vector(items)) => {
                let header = if *boxed { 8 } else { 4 };
                let mut total = header;
                for item in items {
                    total += self.size_typed(inner, item, scope)?;
                }
                total
            }
            (TypeExpr::Named { name, bare: true }, Value::Object(obj)) => {
                let plan = self.bare_plan(name, scope.prefix)?;
                self.size_object(plan, obj)? - ID_SIZE as usize
            }
            (TypeExpr::Named { name, bare: false }, Value::Object(obj)) => {
                self.size_object(self.typed_plan(obj.id, name, scope)?, obj)?
            }
            (TypeExpr::Flag { inner, .. }, v) => self.size_typed(inner, v, scope)?,
            (ty, _) => return Err(mismatch(scope, ty)),
        })
    }

    fn size_generic(&self, value: &Value, scope: Scope<'_>) -> Result<usize, CodecError> {
        Ok(match value {
            Value::Object(obj) => self.size_object(self.plan(obj.id)?, obj)?,
            Value::Bool(_) => 4,
            Value::Json(j) => j.encoded_len(),
            Value::Vector(items) => {
                let mut total = 8;
                for item in items {
                    total += match item {
                        Value::Int(_) => 4,
                        Value::Long(_) => 8,
                        other => self.size_generic(other, scope)?,
                    };
                }
                total
            }
            other => {
                return Err(CodecError::TypeMismatch {
                    field: scope.field.to_owned(),
                    expected: format!("a self-describing value, not {}", other.kind()),
                });
            }
        })
    }
}

fn is_present(plan: &DeclarationPlan, obj: &Object, field: &str) -> bool {
    match plan.wire.field(field).map(|f| &f.kind) {
        Some(FieldKind::TrueBit) => matches!(obj.get(field), Some(Value::Bool(true))),
        _ => obj.fields.contains_key(field),
    }
}

fn is_self_describing(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Bool(_) | Value::Json(_) | Value::Vector(_))
}

fn primitive_fits(p: Primitive, value: &Value) -> bool {
    matches!(
        (p, value),
        (Primitive::Int, Value::Int(_))
            | (Primitive::Long, Value::Long(_))
            | (Primitive::Double, Value::Double(_))
            | (Primitive::Bool, Value::Bool(_))
            | (Primitive::Int128, Value::Int128(_))
            | (Primitive::Int256, Value::Int256(_))
    )
}

fn check_len(scope: Scope<'_>, len: usize) -> Result<usize, CodecError> {
    if len > MAX_BYTES_LEN {
        return Err(CodecError::PayloadTooLong { field: scope.field.to_owned(), len });
    }
    Ok(len)
}

fn missing(plan: &DeclarationPlan, field: &str) -> CodecError {
    CodecError::MissingField { declaration: plan.name.clone(), field: field.to_owned() }
}

fn mismatch(scope: Scope<'_>, ty: &TypeExpr) -> CodecError {
    CodecError::TypeMismatch { field: scope.field.to_owned(), expected: ty.to_string() }
}
