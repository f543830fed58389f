//! Cross-declaration facts computed once per build.

use std::collections::{HashMap, HashSet};

use layer_tl_parser::tl::{Declaration, TypeExpr};

use crate::tree::{TypeKey, TypeTree};

pub(crate) struct Metadata {
    /// Constructors that contain their own result type, directly or transitively.
    recursive_ids: HashSet<u32>,
}

impl Metadata {
    pub(crate) fn build(tree: &TypeTree<'_>) -> Self {
        // Bare lowercase references (`vector<future_salt>`) name a constructor.
        let mut by_constructor: HashMap<(String, String), &TypeKey> = HashMap::new();
        for (key, decls) in tree.iter() {
            for decl in decls {
                by_constructor.insert((key.prefix.clone(), decl.full_name()), key);
            }
        }

        let graph = RefGraph { tree, by_constructor };
        let mut recursive_ids = HashSet::new();
        for (key, decls) in tree.iter() {
            for decl in decls {
                if graph.self_refs(key, decl, &mut HashSet::new()) {
                    recursive_ids.insert(decl.id);
                }
            }
        }

        log::debug!("[tl-plan] {} self-recursive constructors", recursive_ids.len());
        Self { recursive_ids }
    }

    pub(crate) fn is_recursive(&self, decl: &Declaration) -> bool {
        self.recursive_ids.contains(&decl.id)
    }
}

struct RefGraph<'t, 'a> {
    tree: &'t TypeTree<'a>,
    by_constructor: HashMap<(String, String), &'t TypeKey>,
}

impl RefGraph<'_, '_> {
    fn referenced_keys(&self, prefix: &str, ty: &TypeExpr) -> Vec<TypeKey> {
        let mut out = Vec::new();
        ty.visit_named(&mut |name| {
            if name.is_bare() {
                if let Some(key) = self.by_constructor.get(&(prefix.to_owned(), name.full_name())) {
                    out.push((*key).clone());
                }
            } else {
                out.push(TypeKey::new(prefix, name));
            }
        });
        out
    }

    fn self_refs(&self, root: &TypeKey, current: &Declaration, visited: &mut HashSet<u32>) -> bool {
        visited.insert(current.id);
        for param in &current.params {
            for key in self.referenced_keys(&root.prefix, &param.ty) {
                if &key == root {
                    return true;
                }
                let Some(subs) = self.tree.get(&key) else {
                    continue;
                };
                for sub in subs {
                    if !visited.contains(&sub.id) && self.self_refs(root, sub, visited) {
                        return true;
                    }
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build_type_tree;
    use layer_tl_parser::{Schema, SchemaConfig};

    #[test]
    fn direct_and_transitive_recursion() {
        let src = "\
pageBlockList#1 items:Vector<PageListItem> = PageBlock;
pageBlockTitle#2 text:string = PageBlock;
pageListItemBlocks#3 blocks:Vector<PageBlock> = PageListItem;
user#4 id:long = User;
";
        let schema = Schema::from_tl_str(src, SchemaConfig::default()).unwrap();
        let tree = build_type_tree(&schema);
        let meta = Metadata::build(&tree);
        let recursive = |i: usize| meta.is_recursive(&schema.constructors[i]);
        assert!(recursive(0));
        assert!(!recursive(1));
        assert!(recursive(2));
        assert!(!recursive(3));
    }
}
