use super::{normalized, EditOutcome};
use crate::printer::expr_to_code;
use crate::syntax::{ArrayItem, ArrayLiteral, Expr};
use std::fmt;
use tracing::{debug, trace};

/// Key of an array entry, compared the way PHP compares array keys
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MergeKey {
    Str(String),
    Int(i64),
    /// Constant or class constant key such as `Foo::BAR`, compared by name
    Symbol(String),
}

impl MergeKey {
    /// Canonical key for a string: decimal integer strings become integers
    pub fn from_string(value: &str) -> Self {
        match canonical_int(value) {
            Some(n) => MergeKey::Int(n),
            None => MergeKey::Str(value.to_string()),
        }
    }

    fn to_expr(&self) -> Expr {
        match self {
            MergeKey::Str(s) => Expr::string(s),
            MergeKey::Int(n) => Expr::int(*n),
            MergeKey::Symbol(s) => Expr::name(s.clone()),
        }
    }
}

impl fmt::Display for MergeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeKey::Str(s) => write!(f, "'{}'", s),
            MergeKey::Int(n) => write!(f, "{}", n),
            MergeKey::Symbol(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MergeKey {
    fn from(value: &str) -> Self {
        MergeKey::from_string(value)
    }
}

impl From<String> for MergeKey {
    fn from(value: String) -> Self {
        MergeKey::from_string(&value)
    }
}

impl From<i64> for MergeKey {
    fn from(value: i64) -> Self {
        MergeKey::Int(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeValue {
    Expr(Expr),
    /// Merged recursively into an existing literal array under the same key
    Nested(MergeEntries),
}

impl MergeValue {
    fn to_expr(&self) -> Expr {
        match self {
            MergeValue::Expr(expr) => expr.clone(),
            MergeValue::Nested(entries) => Expr::Array(entries.to_array()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeEntry {
    /// `None` for list-style entries
    pub key: Option<MergeKey>,
    pub value: MergeValue,
}

/// Ordered entries to merge into an array literal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeEntries {
    entries: Vec<MergeEntry>,
}

impl MergeEntries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, key: impl Into<MergeKey>, value: Expr) -> Self {
        self.entries.push(MergeEntry {
            key: Some(key.into()),
            value: MergeValue::Expr(value),
        });
        self
    }

    pub fn nested(mut self, key: impl Into<MergeKey>, entries: MergeEntries) -> Self {
        self.entries.push(MergeEntry {
            key: Some(key.into()),
            value: MergeValue::Nested(entries),
        });
        self
    }

    /// List-style entry, added unless an equal value is already listed
    pub fn push(mut self, value: Expr) -> Self {
        self.entries.push(MergeEntry {
            key: None,
            value: MergeValue::Expr(value),
        });
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &MergeEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn to_array(&self) -> ArrayLiteral {
        let items = self
            .entries
            .iter()
            .map(|entry| match &entry.key {
                Some(key) => ArrayItem::keyed(key.to_expr(), entry.value.to_expr()),
                None => ArrayItem::value(entry.value.to_expr()),
            })
            .collect();
        ArrayLiteral::new(items)
    }
}

/// Merge `entries` into the array literal `target`.
///
/// Existing keys are never overwritten; nested entries recurse into the
/// existing literal array under that key. Nothing is modified unless the
/// whole merge succeeds, so a `NotApplicable` outcome leaves `target` as it
/// was.
pub fn merge_into_array_literal(target: &mut Expr, entries: &MergeEntries) -> EditOutcome {
    let Some(array) = target.as_array() else {
        return EditOutcome::not_applicable(format!(
            "expected an array literal, found `{}`",
            expr_to_code(target)
        ));
    };

    let mut staged = array.clone();
    match merge_items(&mut staged, entries) {
        Ok(changed) => {
            if changed {
                *target = Expr::Array(staged);
            } else {
                debug!("All entries already present");
            }
            EditOutcome::Applied
        }
        Err(reason) => EditOutcome::NotApplicable(reason),
    }
}

fn merge_items(array: &mut ArrayLiteral, entries: &MergeEntries) -> Result<bool, String> {
    check_mergeable(array)?;

    let mut changed = false;
    for entry in entries.iter() {
        match &entry.key {
            Some(key) => {
                let keys = effective_keys(array);
                if matches!(key, MergeKey::Int(_)) && keys.iter().any(Option::is_none) {
                    return Err(format!(
                        "cannot tell whether {} is taken: an implicit index follows a constant key",
                        key
                    ));
                }
                let existing = keys
                    .iter()
                    .position(|existing| existing.as_ref() == Some(key));
                match (existing, &entry.value) {
                    (Some(_), MergeValue::Expr(_)) => {
                        trace!(key = %key, "Key already present, left untouched");
                    }
                    (Some(index), MergeValue::Nested(nested)) => {
                        let Some(inner) = array.items[index].value.as_array_mut() else {
                            return Err(format!("value under {} is not an array literal", key));
                        };
                        changed |= merge_items(inner, nested)?;
                    }
                    (None, value) => {
                        array
                            .items
                            .push(ArrayItem::keyed(key.to_expr(), value.to_expr()));
                        changed = true;
                    }
                }
            }
            None => {
                let wanted = entry.value.to_expr();
                let code = normalized(&expr_to_code(&wanted));
                let present = array
                    .items
                    .iter()
                    .any(|item| item.key.is_none() && normalized(&expr_to_code(&item.value)) == code);
                if !present {
                    array.items.push(ArrayItem::value(wanted));
                    changed = true;
                }
            }
        }
    }
    Ok(changed)
}

/// Key of every item as PHP assigns it. Key-less items take the next integer
/// index after the largest integer key so far; `None` when a constant key
/// hides that index.
fn effective_keys(array: &ArrayLiteral) -> Vec<Option<MergeKey>> {
    let mut next = Some(0i64);
    array
        .items
        .iter()
        .map(|item| match item.key.as_ref().and_then(key_of) {
            Some(MergeKey::Int(n)) => {
                next = next.map(|index| index.max(n.saturating_add(1)));
                Some(MergeKey::Int(n))
            }
            Some(MergeKey::Symbol(name)) => {
                next = None;
                Some(MergeKey::Symbol(name))
            }
            Some(key) => Some(key),
            None => {
                let index = next?;
                next = Some(index.saturating_add(1));
                Some(MergeKey::Int(index))
            }
        })
        .collect()
}

/// Arrays with spreads, references, or computed keys have no static key set
fn check_mergeable(array: &ArrayLiteral) -> Result<(), String> {
    for item in &array.items {
        if item.spread {
            return Err("array contains a spread entry".to_string());
        }
        if item.by_ref {
            return Err("array contains a by-reference entry".to_string());
        }
        if let Some(key) = &item.key {
            if key_of(key).is_none() {
                return Err(format!("array has a computed key `{}`", expr_to_code(key)));
            }
        }
    }
    Ok(())
}

/// Static key of a key expression, `None` when it is only known at runtime
fn key_of(expr: &Expr) -> Option<MergeKey> {
    match expr {
        Expr::Literal(leaf) => literal_key(&leaf.text),
        Expr::Name(leaf) => Some(match leaf.text.to_ascii_lowercase().as_str() {
            "true" => MergeKey::Int(1),
            "false" => MergeKey::Int(0),
            "null" => MergeKey::Str(String::new()),
            _ => MergeKey::Symbol(leaf.text.trim_start_matches('\\').to_string()),
        }),
        Expr::ClassConst(fetch) => Some(MergeKey::Symbol(format!(
            "{}::{}",
            fetch.class.trim_start_matches('\\'),
            fetch.constant
        ))),
        _ => None,
    }
}

fn literal_key(text: &str) -> Option<MergeKey> {
    if let Some(inner) = text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        return Some(MergeKey::from_string(&unescape_single(inner)));
    }
    if let Some(inner) = text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        return unescape_double(inner).map(|s| MergeKey::from_string(&s));
    }
    int_literal(text).map(MergeKey::Int)
}

fn unescape_single(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next @ ('\\' | '\'')) => out.push(next),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Double-quoted contents; `None` when the string interpolates
fn unescape_double(inner: &str) -> Option<String> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '$' => return None,
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(next @ ('\\' | '"' | '$')) => out.push(next),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            },
            _ => out.push(c),
        }
    }
    Some(out)
}

fn int_literal(text: &str) -> Option<i64> {
    let digits = text.replace('_', "");
    let lower = digits.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else if lower.len() > 1 && lower.starts_with('0') {
        i64::from_str_radix(&lower[1..], 8).ok()
    } else {
        lower.parse().ok()
    }
}

/// PHP casts "12" to the integer key 12 but leaves "012" and "1.0" as strings
fn canonical_int(value: &str) -> Option<i64> {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let canonical = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'))
        && value != "-0";
    if canonical {
        value.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::syntax::SourceFile;
    use crate::edits::find_returned_array;
    use pretty_assertions::assert_eq;

    fn returned(file: &mut SourceFile) -> &mut Expr {
        crate::edits::first_return_value(&mut file.stmts).unwrap()
    }

    #[test]
    fn test_merge_adds_nested_entry() {
        let source = "<?php\nreturn [\n    'id' => 'app',\n    'components' => [\n        'cache' => 'x',\n    ],\n];\n";
        let mut file = parse(source).unwrap();
        let entries = MergeEntries::new().nested(
            "components",
            MergeEntries::new().entry("log", Expr::class_ref("Log")),
        );
        let outcome = merge_into_array_literal(returned(&mut file), &entries);
        assert_eq!(outcome, EditOutcome::Applied);
        assert_eq!(
            file.render(),
            "<?php\nreturn [\n    'id' => 'app',\n    'components' => [\n        'cache' => 'x',\n        'log' => Log::class,\n    ],\n];\n"
        );
    }

    #[test]
    fn test_merge_creates_missing_nested_key() {
        let mut file = parse("<?php\nreturn ['id' => 'app'];\n").unwrap();
        let entries = MergeEntries::new().nested(
            "modules",
            MergeEntries::new().entry("shop", Expr::class_ref("Shop")),
        );
        assert!(merge_into_array_literal(returned(&mut file), &entries).is_applied());
        assert_eq!(
            file.render(),
            "<?php\nreturn ['id' => 'app', 'modules' => ['shop' => Shop::class]];\n"
        );
    }

    #[test]
    fn test_existing_key_is_not_overwritten() {
        let source = "<?php\nreturn ['log' => Old::class];\n";
        let mut file = parse(source).unwrap();
        let entries = MergeEntries::new().entry("log", Expr::class_ref("New"));
        assert!(merge_into_array_literal(returned(&mut file), &entries).is_applied());
        assert_eq!(file.render(), source);
    }

    #[test]
    fn test_numeric_string_keys_match_integer_keys() {
        let source = "<?php\nreturn [5 => 'a', \"x\" => 'b'];\n";
        let mut file = parse(source).unwrap();
        let entries = MergeEntries::new()
            .entry("5", Expr::string("c"))
            .entry("x", Expr::string("d"));
        assert!(merge_into_array_literal(returned(&mut file), &entries).is_applied());
        assert_eq!(file.render(), source);
    }

    #[test]
    fn test_non_literal_target_is_not_applicable() {
        let source = "<?php\nreturn $this->buildConfig();\n";
        let mut file = parse(source).unwrap();
        let entries = MergeEntries::new().entry("log", Expr::class_ref("Log"));
        let outcome = merge_into_array_literal(returned(&mut file), &entries);
        assert!(!outcome.is_applied());
        assert_eq!(file.render(), source);
    }

    #[test]
    fn test_computed_key_is_not_applicable() {
        let source = "<?php\nreturn [$key => 1, 'a' => ['b' => 2]];\n";
        let mut file = parse(source).unwrap();
        let entries = MergeEntries::new().entry("c", Expr::int(3));
        assert!(!merge_into_array_literal(returned(&mut file), &entries).is_applied());
        assert_eq!(file.render(), source);
    }

    #[test]
    fn test_nested_failure_leaves_outer_untouched() {
        let source = "<?php\nreturn ['components' => $components];\n";
        let mut file = parse(source).unwrap();
        let entries = MergeEntries::new()
            .entry("id", Expr::string("app"))
            .nested("components", MergeEntries::new().entry("log", Expr::int(1)));
        let outcome = merge_into_array_literal(returned(&mut file), &entries);
        assert!(!outcome.is_applied());
        assert_eq!(file.render(), source);
    }

    #[test]
    fn test_implicit_index_is_an_existing_key() {
        let source = "<?php\nreturn ['first', 'second'];\n";
        let mut file = parse(source).unwrap();
        let entries = MergeEntries::new()
            .entry(0i64, Expr::string("new"))
            .entry("1", Expr::string("newer"));
        assert!(merge_into_array_literal(returned(&mut file), &entries).is_applied());
        assert_eq!(file.render(), source);
    }

    #[test]
    fn test_implicit_index_follows_largest_integer_key() {
        let source = "<?php\nreturn [5 => 'a', 'b', 'x' => 'c'];\n";
        let mut file = parse(source).unwrap();
        let entries = MergeEntries::new()
            .entry(6i64, Expr::string("taken"))
            .entry(7i64, Expr::string("free"));
        assert!(merge_into_array_literal(returned(&mut file), &entries).is_applied());
        assert_eq!(
            file.render(),
            "<?php\nreturn [5 => 'a', 'b', 'x' => 'c', 7 => 'free'];\n"
        );
    }

    #[test]
    fn test_implicit_index_after_constant_key_is_not_applicable() {
        let source = "<?php\nreturn [Foo::BAR => 'a', 'b'];\n";
        let mut file = parse(source).unwrap();
        let entries = MergeEntries::new().entry(0i64, Expr::string("c"));
        assert!(!merge_into_array_literal(returned(&mut file), &entries).is_applied());
        assert_eq!(file.render(), source);
    }

    #[test]
    fn test_list_entries_are_deduplicated() {
        let source = "<?php\nreturn [Foo::class, 'bar'];\n";
        let mut file = parse(source).unwrap();
        let entries = MergeEntries::new()
            .push(Expr::class_ref("Foo"))
            .push(Expr::string("baz"));
        assert!(merge_into_array_literal(returned(&mut file), &entries).is_applied());
        assert_eq!(file.render(), "<?php\nreturn [Foo::class, 'bar', 'baz'];\n");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let source = "<?php\nreturn [\n    'components' => [],\n];\n";
        let mut file = parse(source).unwrap();
        let entries = MergeEntries::new().nested(
            "components",
            MergeEntries::new().entry("log", Expr::class_ref("Log")),
        );
        merge_into_array_literal(returned(&mut file), &entries);
        let once = file.render();
        let mut again = parse(&once).unwrap();
        merge_into_array_literal(returned(&mut again), &entries);
        assert_eq!(again.render(), once);
        assert_eq!(find_returned_array(&mut again.stmts).unwrap().items.len(), 1);
    }

    #[test]
    fn test_key_forms() {
        assert_eq!(literal_key("'12'"), Some(MergeKey::Int(12)));
        assert_eq!(literal_key("'012'"), Some(MergeKey::Str("012".into())));
        assert_eq!(literal_key("0x1A"), Some(MergeKey::Int(26)));
        assert_eq!(literal_key("\"a$b\""), None);
        assert_eq!(literal_key("'it\\'s'"), Some(MergeKey::Str("it's".into())));
        assert_eq!(MergeKey::from("-3"), MergeKey::Int(-3));
        assert_eq!(MergeKey::from("-0"), MergeKey::Str("-0".into()));
    }
}
