use std::fmt;

use serde::Serialize;

use crate::errors::TypeGrammarError;

/// A dotted, namespace-qualified TL name such as `upload.fileCdnRedirect`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QualifiedName {
    /// Namespace parts.  Empty when the name is in the global namespace.
    pub namespace: Vec<String>,
    /// The last segment.
    pub name: String,
}

impl QualifiedName {
    /// Splits `raw` on the last `.`; every namespace component must be non-empty.
    pub fn parse(raw: &str) -> Result<Self, TypeGrammarError> {
        let (namespace, name) = match raw.rsplit_once('.') {
            Some((ns, n)) => (ns.split('.').map(String::from).collect::<Vec<_>>(), n),
            None => (Vec::new(), raw),
        };

        let valid = |s: &str| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        };
        if !valid(name) || !namespace.iter().all(|p| valid(p)) {
            return Err(TypeGrammarError::InvalidName(raw.to_owned()));
        }

        Ok(Self { namespace, name: name.to_owned() })
    }

    /// Returns `namespace.name` joined with dots.
    pub fn full_name(&self) -> String {
        let cap = self.namespace.iter().map(|ns| ns.len() + 1).sum::<usize>() + self.name.len();
        let mut s = String::with_capacity(cap);
        for ns in &self.namespace {
            s.push_str(ns);
            s.push('.');
        }
        s.push_str(&self.name);
        s
    }

    /// The canonical PascalCase display name of the last segment.
    pub fn display_name(&self) -> String {
        to_pascal(&self.name)
    }

    /// `true` when the last segment starts with a lowercase letter.
    pub fn is_bare(&self) -> bool {
        self.name.starts_with(|c: char| c.is_ascii_lowercase())
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ns in &self.namespace {
            write!(f, "{ns}.")?;
        }
        f.write_str(&self.name)
    }
}

/// Converts `some_ok_name` or `SomeOKName` into `SomeOkName` (PascalCase).
///
/// Any namespace prefix is dropped first.
pub fn to_pascal(name: &str) -> String {
    let name = match name.rfind('.') {
        Some(pos) => &name[pos + 1..],
        None => name,
    };

    let mut out = String::with_capacity(name.len());
    let mut next_upper = true;
    let mut prev_upper = false;

    for ch in name.chars() {
        if ch == '_' {
            next_upper = true;
            prev_upper = false;
            continue;
        }
        if next_upper {
            out.push(ch.to_ascii_uppercase());
            next_upper = false;
            // An uppercase source char opens a cap-run (the 'O' in `some_OK_name`).
            prev_upper = ch.is_ascii_uppercase();
        } else if ch.is_ascii_uppercase() {
            if prev_upper {
                // "someOKName" → "SomeOkName", not "SomeOKName".
                out.push(ch.to_ascii_lowercase());
            } else {
                out.push(ch);
            }
            prev_upper = true;
        } else {
            out.push(ch);
            prev_upper = false;
        }
    }
    out
}

/// Converts `first_name` into `firstName` (lowerCamelCase).
pub fn to_camel(name: &str) -> String {
    let pascal = to_pascal(name);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => pascal,
    }
}
