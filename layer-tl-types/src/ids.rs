//! Identifiers of the built-in constructors every codec must know.

/// `boolTrue#997275b5 = Bool`
pub const BOOL_TRUE_ID: u32 = 0x997275b5;
/// `boolFalse#bc799737 = Bool`
pub const BOOL_FALSE_ID: u32 = 0xbc799737;
/// `vector#1cb5c415 {t:Type} # [ t ] = Vector t`
pub const VECTOR_ID: u32 = 0x1cb5c415;

/// `jsonNull#3f6d7b68 = JSONValue`
pub const JSON_NULL_ID: u32 = 0x3f6d7b68;
/// `jsonBool#c7345e6a value:Bool = JSONValue`
pub const JSON_BOOL_ID: u32 = 0xc7345e6a;
/// `jsonNumber#2be0dfa4 value:double = JSONValue`
pub const JSON_NUMBER_ID: u32 = 0x2be0dfa4;
/// `jsonString#b71e767a value:string = JSONValue`
pub const JSON_STRING_ID: u32 = 0xb71e767a;
/// `jsonArray#f7444763 value:Vector<JSONValue> = JSONValue`
pub const JSON_ARRAY_ID: u32 = 0xf7444763;
/// `jsonObject#99c1d49d value:Vector<JSONObjectValue> = JSONValue`
pub const JSON_OBJECT_ID: u32 = 0x99c1d49d;
/// `jsonObjectValue#c0de1bd9 key:string value:JSONValue = JSONObjectValue`
pub const JSON_OBJECT_VALUE_ID: u32 = 0xc0de1bd9;
