//! Import table and alias disambiguation.
//!
//! PHP class names are case-insensitive, so both the FQN and alias indexes
//! are keyed by lower-cased names while the stored entries keep the casing
//! they were written with.

use crate::error::{AstError, AstResult};
use crate::names::{class_name, class_parts, is_identifier, is_reserved};
use crate::syntax::{SourceFile, Stmt, UseDecl, UseKind};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

/// Default bound on alias candidates tried by [`ImportTable::ensure`]
pub const MAX_ALIAS_ATTEMPTS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Import {
    pub fqn: String,
    pub alias: String,
    /// Resolved without a `use` statement (same namespace or global scope)
    pub local: bool,
}

impl Import {
    /// Whether the `use` statement needs an `as` clause
    pub fn has_explicit_alias(&self) -> bool {
        self.alias != class_name(&self.fqn)
    }
}

/// Alias chosen for a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ensured {
    pub alias: String,
    /// A `use` statement must be added for it
    pub added: bool,
}

#[derive(Debug, Clone)]
pub struct ImportTable {
    namespace: Option<String>,
    /// lower FQN -> import
    by_fqn: IndexMap<String, Import>,
    /// lower alias -> lower FQN
    by_alias: IndexMap<String, String>,
    /// lower short name -> lower FQN of classes declared in the scope
    declared: IndexMap<String, String>,
    max_attempts: usize,
}

impl ImportTable {
    pub fn new(namespace: Option<&str>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            by_fqn: IndexMap::new(),
            by_alias: IndexMap::new(),
            declared: IndexMap::new(),
            max_attempts: MAX_ALIAS_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Table for the import scope of `file`: its class imports plus the
    /// classes it declares.
    pub fn from_file(file: &SourceFile) -> Self {
        let mut table = Self::new(file.namespace());
        for stmt in file.scope_stmts() {
            match stmt {
                Stmt::Use(decl) => {
                    for (kind, fqn, alias) in decl.resolved() {
                        if kind == UseKind::Class {
                            let alias = alias.unwrap_or_else(|| class_name(&fqn)).to_string();
                            table.register(fqn, alias, false);
                        }
                    }
                }
                Stmt::Class(class) => {
                    let fqn = table.qualify(&class.name);
                    table.declare(&fqn);
                }
                _ => {}
            }
        }
        table
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Mark a class as declared in this scope; its short name is never used
    /// as an alias for anything else.
    pub fn declare(&mut self, fqn: &str) {
        let fqn = fqn.trim_start_matches('\\');
        self.declared
            .insert(class_name(fqn).to_ascii_lowercase(), fqn.to_ascii_lowercase());
    }

    /// Alias the class is currently imported under
    pub fn alias_of(&self, fqn: &str) -> Option<&str> {
        self.by_fqn
            .get(&fqn.trim_start_matches('\\').to_ascii_lowercase())
            .map(|import| import.alias.as_str())
    }

    /// Class an alias stands for
    pub fn resolve_alias(&self, alias: &str) -> Option<&str> {
        self.by_alias
            .get(&alias.to_ascii_lowercase())
            .and_then(|key| self.by_fqn.get(key))
            .map(|import| import.fqn.as_str())
    }

    /// Imports that need a `use` statement, in registration order
    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        self.by_fqn.values().filter(|import| !import.local)
    }

    /// Alias to reference `fqn` by, registering it when needed.
    ///
    /// Existing imports are never renamed. A free `preferred` alias (or the
    /// short name) is used as is; otherwise namespace segments are prefixed
    /// from the right (`craft\base\Plugin` becomes `BasePlugin`, then
    /// `CraftBasePlugin`) and finally numeric suffixes are tried.
    pub fn ensure(&mut self, fqn: &str, preferred: Option<&str>) -> AstResult<Ensured> {
        let fqn = fqn.trim_start_matches('\\');
        if let Some(alias) = self.alias_of(fqn) {
            return Ok(Ensured {
                alias: alias.to_string(),
                added: false,
            });
        }

        let (namespace, short) = class_parts(fqn);
        let key = fqn.to_ascii_lowercase();
        let declared_here = self.declared.get(&short.to_ascii_lowercase()) == Some(&key);
        let same_scope = namespace.map(str::to_ascii_lowercase)
            == self.namespace.as_deref().map(str::to_ascii_lowercase);
        if declared_here || (same_scope && preferred.is_none() && !self.is_taken(short)) {
            self.register(fqn.to_string(), short.to_string(), true);
            return Ok(Ensured {
                alias: short.to_string(),
                added: false,
            });
        }

        let mut attempts = 0;
        for candidate in self.candidates(fqn, preferred) {
            attempts += 1;
            if attempts > self.max_attempts {
                break;
            }
            if !self.is_taken(&candidate) {
                debug!(fqn = %fqn, alias = %candidate, attempts, "Registered import");
                self.register(fqn.to_string(), candidate.clone(), false);
                return Ok(Ensured {
                    alias: candidate,
                    added: true,
                });
            }
        }
        Err(AstError::alias_exhausted(fqn, self.max_attempts))
    }

    /// Reserve a name that no alias may take, e.g. the class being generated
    pub fn reserve(&mut self, name: &str) {
        let key = name.to_ascii_lowercase();
        self.declared.entry(key.clone()).or_insert(key);
    }

    pub fn is_taken(&self, alias: &str) -> bool {
        let key = alias.to_ascii_lowercase();
        !is_identifier(alias)
            || is_reserved(alias)
            || self.by_alias.contains_key(&key)
            || self.declared.contains_key(&key)
    }

    fn candidates(&self, fqn: &str, preferred: Option<&str>) -> Vec<String> {
        let (namespace, short) = class_parts(fqn);
        let base = preferred.unwrap_or(short);
        let mut candidates = vec![base.to_string()];

        let mut prefixed = short.to_string();
        for segment in namespace.unwrap_or_default().rsplit('\\').filter(|s| !s.is_empty()) {
            prefixed = format!("{}{}", capitalize(segment), prefixed);
            candidates.push(prefixed.clone());
        }

        let numbered = self.max_attempts.saturating_sub(candidates.len());
        candidates.extend((2..numbered + 2).map(|n| format!("{}{}", base, n)));
        candidates
    }

    fn register(&mut self, fqn: String, alias: String, local: bool) {
        let key = fqn.to_ascii_lowercase();
        self.by_alias.insert(alias.to_ascii_lowercase(), key.clone());
        self.by_fqn.insert(key, Import { fqn, alias, local });
    }

    fn qualify(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{}\\{}", ns, name),
            None => name.to_string(),
        }
    }
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Add a `use` statement to the import scope of `file`: after the last
/// existing import, else after leading `declare` statements.
pub(crate) fn insert_use(file: &mut SourceFile, fqn: &str, alias: &str) {
    let alias = (alias != class_name(fqn)).then(|| alias.to_string());
    let stmts = file.scope_stmts_mut();
    let index = match stmts.iter().rposition(|s| matches!(s, Stmt::Use(_))) {
        Some(last) => last + 1,
        None => stmts
            .iter()
            .take_while(|s| match s {
                Stmt::Raw(raw) => raw.code.trim_start().to_ascii_lowercase().starts_with("declare"),
                _ => false,
            })
            .count(),
    };
    stmts.insert(index, Stmt::Use(UseDecl::class(fqn, alias)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_existing_import_is_reused() {
        let file = parse("<?php\nnamespace acme;\nuse craft\\base\\Plugin as BasePlugin;\n").unwrap();
        let mut table = ImportTable::from_file(&file);
        let ensured = table.ensure("\\CRAFT\\base\\plugin", Some("Plugin")).unwrap();
        assert_eq!(ensured.alias, "BasePlugin");
        assert!(!ensured.added);
    }

    #[test]
    fn test_collision_uses_namespace_prefix() {
        let file = parse("<?php\nnamespace acme;\nclass Plugin {}\n").unwrap();
        let mut table = ImportTable::from_file(&file);
        let ensured = table.ensure("craft\\base\\Plugin", None).unwrap();
        assert_eq!(ensured.alias, "BasePlugin");
        assert!(ensured.added);

        let other = table.ensure("other\\base\\Plugin", None).unwrap();
        assert_eq!(other.alias, "OtherBasePlugin");
    }

    #[test]
    fn test_numeric_suffix_after_prefixes() {
        let mut table = ImportTable::new(Some("acme"));
        table.reserve("Model");
        table.ensure("x\\Model", Some("XModel")).unwrap();
        let ensured = table.ensure("base\\Model", Some("XModel")).unwrap();
        assert_eq!(ensured.alias, "BaseModel");
        let third = table.ensure("y\\base\\Model", Some("XModel")).unwrap();
        assert_eq!(third.alias, "YBaseModel");
        let fourth = table.ensure("z\\base\\Model", Some("XModel")).unwrap();
        assert_eq!(fourth.alias, "ZBaseModel");
        let fifth = table.ensure("base\\q\\Model", Some("XModel")).unwrap();
        assert_eq!(fifth.alias, "QModel");
        let sixth = table.ensure("q\\Model", Some("XModel")).unwrap();
        assert_eq!(sixth.alias, "XModel2");
    }

    #[test]
    fn test_alias_exhaustion() {
        let mut table = ImportTable::new(None).with_max_attempts(2);
        table.reserve("Foo");
        table.reserve("BFoo");
        let err = table.ensure("b\\Foo", None).unwrap_err();
        assert!(matches!(err, AstError::AliasExhausted { attempts: 2, .. }));
    }

    #[test]
    fn test_same_namespace_needs_no_use() {
        let mut table = ImportTable::new(Some("acme\\plugin"));
        let ensured = table.ensure("acme\\plugin\\Settings", None).unwrap();
        assert_eq!(ensured.alias, "Settings");
        assert!(!ensured.added);
        assert_eq!(table.imports().count(), 0);
    }

    #[test]
    fn test_insert_use_after_last_import() {
        let mut file = parse("<?php\n\nnamespace acme;\n\nuse a\\B;\n\nclass C {}\n").unwrap();
        insert_use(&mut file, "yii\\base\\Event", "Event");
        assert_eq!(
            file.render(),
            "<?php\n\nnamespace acme;\n\nuse a\\B;\nuse yii\\base\\Event;\n\nclass C {}\n"
        );
    }

    #[test]
    fn test_insert_first_use_in_namespace() {
        let mut file = parse("<?php\n\nnamespace acme;\n\nclass C {}\n").unwrap();
        insert_use(&mut file, "craft\\base\\Plugin", "BasePlugin");
        assert_eq!(
            file.render(),
            "<?php\n\nnamespace acme;\n\nuse craft\\base\\Plugin as BasePlugin;\n\nclass C {}\n"
        );
    }
}
