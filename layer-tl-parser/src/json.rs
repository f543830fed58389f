//! JSON schema front-end.
//!
//! Accepts the `{ "constructors": [...], "methods": [...] }` layout, where
//! constructors name themselves with `predicate` and methods with `method`.
//! Identifiers may be decimal (as the official JSON dumps ship them, often
//! negative) or hexadecimal; both normalize to the unsigned 32-bit id.

use serde::Deserialize;

use crate::errors::ParseError;
use crate::iterator::parse_result_type;
use crate::schema::{IdFormat, Schema, SchemaConfig};
use crate::tl::{Category, Declaration, Parameter, QualifiedName, parse_type_with};

#[derive(Deserialize)]
struct RawSchema {
    #[serde(default)]
    version: Option<RawLayer>,
    #[serde(default)]
    constructors: Vec<RawEntry>,
    #[serde(default)]
    methods: Vec<RawEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLayer {
    Number(u32),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

#[derive(Deserialize)]
struct RawEntry {
    id: RawId,
    #[serde(alias = "method")]
    predicate: Option<String>,
    #[serde(default)]
    params: Vec<RawParam>,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Deserialize)]
struct RawParam {
    name: String,
    #[serde(rename = "type")]
    ty: String,
}

pub(crate) fn parse_json_schema(src: &str, config: SchemaConfig) -> Result<Schema, ParseError> {
    let raw: RawSchema = serde_json::from_str(src)?;
    let format = config.id_format;

    let mut schema = Schema::new(config);
    schema.layer = raw.version.and_then(|v| match v {
        RawLayer::Number(n) => Some(n),
        RawLayer::Text(s) => s.trim().parse().ok(),
    });

    for entry in raw.constructors {
        schema.constructors.push(convert(entry, Category::Constructor, format)?);
    }
    for entry in raw.methods {
        schema.methods.push(convert(entry, Category::Method, format)?);
    }
    Ok(schema)
}

fn convert(entry: RawEntry, category: Category, format: IdFormat) -> Result<Declaration, ParseError> {
    let id = match &entry.id {
        RawId::Number(n) => decimal_id(&n.to_string()),
        RawId::Text(s) => normalize_id(s, format),
    };
    let raw_id = match entry.id {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    };
    let id = id.ok_or_else(|| ParseError::InvalidJsonId(raw_id.clone()))?;

    let name_raw = entry.predicate.ok_or(ParseError::MissingJsonName(raw_id))?;
    let type_error = |parameter: Option<String>| {
        let declaration = name_raw.clone();
        move |source| ParseError::Type { declaration, parameter, source }
    };

    let name = QualifiedName::parse(&name_raw).map_err(type_error(None))?;
    // JSON has no `{t:Type}` blocks; every `!t` parameter declares `t`.
    let type_params: Vec<String> = entry
        .params
        .iter()
        .filter_map(|p| p.ty.trim().strip_prefix('!').map(str::to_owned))
        .collect();
    let params = entry
        .params
        .into_iter()
        .map(|p| {
            let ty = parse_type_with(&p.ty, category, &type_params)
                .map_err(type_error(Some(p.name.clone())))?;
            Ok(Parameter { name: p.name, ty })
        })
        .collect::<Result<Vec<_>, ParseError>>()?;
    let result = parse_result_type(&entry.ty, category, &type_params).map_err(type_error(None))?;

    Ok(Declaration { category, id, name, params, result })
}

/// Normalizes a JSON identifier string to its unsigned 32-bit value.
pub fn normalize_id(raw: &str, format: IdFormat) -> Option<u32> {
    let raw = raw.trim();
    let hex = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"));
    match format {
        IdFormat::Hex => u32::from_str_radix(hex.unwrap_or(raw), 16).ok(),
        IdFormat::Decimal => decimal_id(raw),
        IdFormat::Auto => match hex {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None if raw.bytes().any(|b| b.is_ascii_hexdigit() && !b.is_ascii_digit()) => {
                u32::from_str_radix(raw, 16).ok()
            }
            None => decimal_id(raw),
        },
    }
}

/// Signed ids wrap to their two's complement bit pattern.
fn decimal_id(raw: &str) -> Option<u32> {
    let value: i64 = raw.parse().ok()?;
    if (i64::from(i32::MIN)..=i64::from(u32::MAX)).contains(&value) {
        Some(value as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_ids_normalize_to_hex_value() {
        assert_eq!(normalize_id("-1132882121", IdFormat::Auto), Some(0xbc799737));
        assert_eq!(normalize_id("481674261", IdFormat::Auto), Some(0x1cb5c415));
        assert_eq!(normalize_id("1cb5c415", IdFormat::Auto), Some(0x1cb5c415));
        assert_eq!(normalize_id("0x1cb5c415", IdFormat::Auto), Some(0x1cb5c415));
        assert_eq!(normalize_id("12345678", IdFormat::Hex), Some(0x12345678));
        assert_eq!(normalize_id("4294967296", IdFormat::Decimal), None);
    }

    #[test]
    fn entries_convert() {
        let src = r#"{
            "version": "181",
            "constructors": [
                {"id": "-1132882121", "predicate": "boolFalse", "params": [], "type": "Bool"},
                {"id": "481674261", "predicate": "vector", "params": [], "type": "Vector t"}
            ],
            "methods": [
                {"id": "-627372787", "method": "invokeWithLayer",
                 "params": [{"name": "layer", "type": "int"}, {"name": "query", "type": "!X"}],
                 "type": "X"}
            ]
        }"#;
        let schema = parse_json_schema(src, SchemaConfig::default()).unwrap();
        assert_eq!(schema.layer, Some(181));
        assert_eq!(schema.constructors[0].id, 0xbc799737);
        assert_eq!(schema.constructors[1].full_name(), "vector");
        assert_eq!(schema.methods[0].id, 0xda9b0d0d);
        assert_eq!(schema.methods[0].category, Category::Method);
    }

    #[test]
    fn missing_name_is_reported() {
        let src = r#"{"constructors": [{"id": "1", "params": [], "type": "A"}]}"#;
        assert!(matches!(
            parse_json_schema(src, SchemaConfig::default()),
            Err(ParseError::MissingJsonName(id)) if id == "1"
        ));
    }
}
