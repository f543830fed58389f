//! Display names for declarations, fields and enum labels.

use layer_tl_parser::tl::{Declaration, to_camel, to_pascal};

use crate::tree::TypeKey;

// ─── Declaration names ───────────────────────────────────────────────────────

/// Prefix given to an interface member that would otherwise share the
/// interface's own name.
pub const BASE_PREFIX: &str = "Base";

/// Result type whose singleton constructor keeps its own name.
const GENERIC_OBJECT: &str = "Object";

/// Display name of a constructor producing `key`.
///
/// * A singleton takes the result-type name (`Config` for `config#…`).
/// * A member of a polymorphic type whose name equals the type's gets
///   [`BASE_PREFIX`] (`BaseMessage` for `message#… = Message`).
/// * Anything else keeps its own PascalCase name.
pub fn constructor_display_name(decl: &Declaration, key: &TypeKey, singleton: bool) -> String {
    let own = decl.name.display_name();
    if singleton {
        if key.name == GENERIC_OBJECT { own } else { key.name.clone() }
    } else if own == key.name {
        format!("{BASE_PREFIX}{own}")
    } else {
        own
    }
}

/// Display name of an RPC method.
pub fn method_display_name(decl: &Declaration) -> String {
    decl.name.display_name()
}

// ─── Field names ─────────────────────────────────────────────────────────────

/// lowerCamelCase display name of a field.
pub fn field_display_name(raw: &str) -> String {
    to_camel(raw)
}

/// The identifier a Rust emitter should use for a field.
pub fn rust_field_name(raw: &str) -> String {
    match raw {
        "final" => "r#final".into(),
        "loop" => "r#loop".into(),
        "self" => "is_self".into(),
        "static" => "r#static".into(),
        "type" => "r#type".into(),
        other => other.to_ascii_lowercase(),
    }
}

// ─── Enum labels ─────────────────────────────────────────────────────────────

/// Longest common character-wise prefix of `names`.
pub fn common_prefix<'a>(names: &[&'a str]) -> &'a str {
    let Some((first, rest)) = names.split_first() else {
        return "";
    };
    let mut end = first.len();
    for name in rest {
        end = first
            .char_indices()
            .zip(name.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((i, a), _)| i + a.len_utf8())
            .min(end);
    }
    &first[..end]
}

/// `UPPER_SNAKE_CASE` form of a label: `photoSizeEmpty` → `PHOTO_SIZE_EMPTY`.
pub fn screamilize(label: &str) -> String {
    let mut out = String::with_capacity(label.len() + 4);
    let mut prev_lower = false;
    for ch in label.chars() {
        if ch == '.' || ch == '_' {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
            continue;
        }
        if ch.is_ascii_uppercase() && prev_lower {
            out.push('_');
        }
        out.push(ch.to_ascii_uppercase());
        prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
    }
    out
}

/// PascalCase form of an enum label.
pub fn label_display_name(label: &str) -> String {
    to_pascal(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_tl_parser::tl::QualifiedName;

    fn key(name: &str) -> TypeKey {
        TypeKey::new("", &QualifiedName::parse(name).unwrap())
    }

    #[test]
    fn base_prefix_only_for_polymorphic_clash() {
        let decl: Declaration = "message#1 id:int = Message".parse().unwrap();
        assert_eq!(constructor_display_name(&decl, &key("Message"), false), "BaseMessage");
        assert_eq!(constructor_display_name(&decl, &key("Message"), true), "Message");
    }

    #[test]
    fn singleton_takes_type_name_unless_object() {
        let decl: Declaration = "config#2 date:int = Config".parse().unwrap();
        assert_eq!(constructor_display_name(&decl, &key("Config"), true), "Config");

        let decl: Declaration = "gzip_packed#3 packed_data:bytes = Object".parse().unwrap();
        assert_eq!(constructor_display_name(&decl, &key("Object"), true), "GzipPacked");
    }

    #[test]
    fn prefix_is_character_wise() {
        assert_eq!(common_prefix(&["typeX.foo", "typeX.bar", "typeX.baz"]), "typeX.");
        assert_eq!(common_prefix(&["inputPeerEmpty", "inputPeerSelf"]), "inputPeer");
        assert_eq!(common_prefix(&["abc"]), "abc");
        assert_eq!(common_prefix(&[]), "");
    }

    #[test]
    fn screaming_labels() {
        assert_eq!(screamilize("Empty"), "EMPTY");
        assert_eq!(screamilize("photoSizeEmpty"), "PHOTO_SIZE_EMPTY");
        assert_eq!(screamilize("ns.fooBar"), "NS_FOO_BAR");
        assert_eq!(screamilize("size2x"), "SIZE2X");
    }

    #[test]
    fn keyword_fields() {
        assert_eq!(rust_field_name("type"), "r#type");
        assert_eq!(rust_field_name("self"), "is_self");
        assert_eq!(field_display_name("first_name"), "firstName");
    }
}
