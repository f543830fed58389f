use indexmap::IndexMap;
use layer_tl_types::JsonValue;

/// A dynamically typed TL value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `double`
    Double(f64),
    /// `Bool`, or the presence of a `true` bit.
    Bool(bool),
    /// `bytes`
    Bytes(Vec<u8>),
    /// `string`
    String(String),
    /// `int128`
    Int128([u8; 16]),
    /// `int256`
    Int256([u8; 32]),
    /// `Vector<T>` or `vector<T>`.
    Vector(Vec<Value>),
    /// Any constructor or method call.
    Object(Object),
    /// `JSONValue`
    Json(JsonValue),
}

impl Value {
    /// The object inside, if any.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::Bool(_) => "Bool",
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
            Self::Int128(_) => "int128",
            Self::Int256(_) => "int256",
            Self::Vector(_) => "vector",
            Self::Object(_) => "object",
            Self::Json(_) => "JSONValue",
        }
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Self::Object(o)
    }
}

/// A constructor or method call with its field values.
///
/// Flags words are never stored: the encoder derives them from which
/// optional fields are present. A `true` field is present when it holds
/// `Value::Bool(true)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    /// Wire identifier.
    pub id: u32,
    /// Field name → value; absent optional fields are simply missing.
    pub fields: IndexMap<String, Value>,
}

impl Object {
    /// An object with no fields set.
    pub fn new(id: u32) -> Self {
        Self { id, fields: IndexMap::new() }
    }

    /// Builder-style field setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// The value of `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Self::$variant(v)
            }
        }
    )*};
}

value_from!(
    i32 => Int,
    i64 => Long,
    f64 => Double,
    bool => Bool,
    Vec<u8> => Bytes,
    String => String,
    [u8; 16] => Int128,
    [u8; 32] => Int256,
    Vec<Value> => Vector,
    JsonValue => Json,
);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}
