//! Groups constructors by the result type they produce.

use std::fmt;

use indexmap::IndexMap;
use layer_tl_parser::Schema;
use layer_tl_parser::tl::{Declaration, Primitive, QualifiedName, TypeExpr, to_pascal};
use serde::Serialize;

/// Result types that are built into every codec and never become user types.
const BUILTIN_RESULT_TYPES: &[&str] = &["True", "Null", "HttpWait", "JSONObjectValue"];

/// Identifies one result type across merged schemas.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeKey {
    /// The owning schema's namespace prefix; empty for the primary schema.
    pub prefix: String,
    /// Namespace of the type.
    pub namespace: Vec<String>,
    /// Normalized (PascalCase) type name.
    pub name: String,
}

impl TypeKey {
    /// The key of `name` inside a schema with the given prefix.
    pub fn new(prefix: &str, name: &QualifiedName) -> Self {
        Self {
            prefix: prefix.to_owned(),
            namespace: name.namespace.clone(),
            name: to_pascal(&name.name),
        }
    }

    /// The key a constructor is grouped under, or `None` for built-in results.
    ///
    /// Constructors of the generic `Object` (such as `gzip_packed`) are
    /// grouped under `Object`.
    pub fn for_result(prefix: &str, result: &TypeExpr) -> Option<Self> {
        match result {
            TypeExpr::Named { name, .. } if !BUILTIN_RESULT_TYPES.contains(&name.name.as_str()) => {
                Some(Self::new(prefix, name))
            }
            TypeExpr::Primitive(Primitive::Object) => Some(Self {
                prefix: prefix.to_owned(),
                namespace: Vec::new(),
                name: "Object".into(),
            }),
            _ => None,
        }
    }

    /// `ns.Name`, without the schema prefix.
    pub fn qualified_name(&self) -> String {
        let mut s = String::new();
        for ns in &self.namespace {
            s.push_str(ns);
            s.push('.');
        }
        s.push_str(&self.name);
        s
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.prefix.is_empty() {
            write!(f, "{}:", self.prefix)?;
        }
        f.write_str(&self.qualified_name())
    }
}

/// Constructors grouped by result type, in first-seen order.
#[derive(Debug, Default)]
pub struct TypeTree<'a> {
    groups: IndexMap<TypeKey, Vec<&'a Declaration>>,
}

impl<'a> TypeTree<'a> {
    /// The constructors producing `key`, in input order.
    pub fn get(&self, key: &TypeKey) -> Option<&[&'a Declaration]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Iterates groups in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&TypeKey, &[&'a Declaration])> {
        self.groups.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Number of distinct result types.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// `true` when no constructor produced a user type.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// `true` when `key` has exactly one constructor.
    pub fn is_singleton(&self, key: &TypeKey) -> bool {
        self.groups.get(key).is_some_and(|g| g.len() == 1)
    }

    /// Appends the groups of `other`, keeping order.
    pub(crate) fn extend(&mut self, other: TypeTree<'a>) {
        for (key, decls) in other.groups {
            self.groups.entry(key).or_default().extend(decls);
        }
    }
}

/// Groups the constructors of `schema` (never its methods) by result type.
pub fn build_type_tree(schema: &Schema) -> TypeTree<'_> {
    let prefix = &schema.config.namespace_prefix;
    let mut groups: IndexMap<TypeKey, Vec<&Declaration>> = IndexMap::new();
    let mut skipped = 0usize;

    for decl in &schema.constructors {
        match TypeKey::for_result(prefix, &decl.result) {
            Some(key) => groups.entry(key).or_default().push(decl),
            None => skipped += 1,
        }
    }

    log::debug!(
        "[tl-tree] schema `{}`: {} result types, {} built-in constructors skipped",
        schema.config.name,
        groups.len(),
        skipped
    );
    TypeTree { groups }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_tl_parser::SchemaConfig;

    #[test]
    fn groups_in_first_seen_order_and_skips_builtins() {
        let src = "\
boolFalse#bc799737 = Bool;
true#3fedd339 = True;
vector#1cb5c415 {t:Type} # [ t ] = Vector t;
null#56730bcc = Null;
inputPeerEmpty#7f3b18ea = InputPeer;
userEmpty#d3bc4b7a id:long = User;
inputPeerSelf#7da07ec9 = InputPeer;
---functions---
users.getUsers#d91a548 id:Vector<InputUser> = Vector<User>;
";
        let schema = Schema::from_tl_str(src, SchemaConfig::default()).unwrap();
        let tree = build_type_tree(&schema);
        let keys: Vec<_> = tree.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, ["InputPeer", "User"]);

        let peer = TypeKey::new("", &QualifiedName::parse("InputPeer").unwrap());
        let names: Vec<_> = tree.get(&peer).unwrap().iter().map(|d| d.full_name()).collect();
        assert_eq!(names, ["inputPeerEmpty", "inputPeerSelf"]);
        assert!(!tree.is_singleton(&peer));
    }

    #[test]
    fn prefix_separates_schemas() {
        let src = "pong#347773c5 msg_id:long ping_id:long = Pong;";
        let schema = Schema::from_tl_str(src, SchemaConfig::mtproto()).unwrap();
        let tree = build_type_tree(&schema);
        let (key, _) = tree.iter().next().unwrap();
        assert_eq!(key.to_string(), "mtproto:Pong");
    }
}
