//! Class-name helpers

use crate::error::{AstError, AstResult};

/// Reserved words that can never be class names or aliases
const RESERVED_CLASS_NAMES: &[&str] = &[
    "array", "bool", "callable", "false", "float", "int", "iterable", "mixed", "never", "null",
    "numeric", "object", "parent", "resource", "self", "static", "string", "true", "void",
    "abstract", "and", "as", "break", "case", "catch", "class", "clone", "const", "continue",
    "declare", "default", "do", "echo", "else", "elseif", "empty", "enum", "extends", "final",
    "finally", "fn", "for", "foreach", "function", "global", "goto", "if", "implements",
    "include", "instanceof", "insteadof", "interface", "isset", "list", "match", "namespace",
    "new", "or", "print", "private", "protected", "public", "readonly", "require", "return",
    "switch", "throw", "trait", "try", "unset", "use", "var", "while", "xor", "yield",
];

/// Split a fully qualified class name into namespace and short name
pub fn class_parts(class: &str) -> (Option<&str>, &str) {
    let class = class.trim_start_matches('\\');
    match class.rfind('\\') {
        Some(idx) => (Some(&class[..idx]).filter(|ns| !ns.is_empty()), &class[idx + 1..]),
        None => (None, class),
    }
}

/// Namespace of a fully qualified class name, `None` at the root
pub fn namespace_of(class: &str) -> Option<&str> {
    class_parts(class).0
}

/// Short name of a class
pub fn class_name(class: &str) -> &str {
    class_parts(class).1
}

/// Normalize user input into a class or namespace name: slashes become
/// backslashes, repeated backslashes collapse, outer backslashes go.
pub fn normalize_class(class: &str) -> AstResult<String> {
    let mut normalized = String::with_capacity(class.len());
    for ch in class.trim().chars() {
        let ch = if ch == '/' { '\\' } else { ch };
        if ch == '\\' && normalized.ends_with('\\') {
            continue;
        }
        normalized.push(ch);
    }
    let normalized = normalized.trim_matches('\\').to_string();
    if !validate_class(&normalized) {
        return Err(AstError::invalid_name(normalized));
    }
    Ok(normalized)
}

/// Segments must be identifiers that do not start with a digit
pub fn validate_class(class: &str) -> bool {
    !class.is_empty() && class.split('\\').all(is_identifier)
}

pub fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED_CLASS_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}

/// Fully qualify `name` as written inside `namespace`; `lookup_alias` maps
/// an imported alias to the class it stands for.
pub fn resolve_class_name<F>(name: &str, namespace: Option<&str>, lookup_alias: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(fqn) = name.strip_prefix('\\') {
        return fqn.to_string();
    }
    if is_builtin_type(name) {
        return name.to_string();
    }
    let lower = name.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix("namespace\\") {
        let rest = &name[name.len() - rest.len()..];
        return qualify(namespace, rest);
    }
    let (first, rest) = match name.find('\\') {
        Some(idx) => (&name[..idx], Some(&name[idx..])),
        None => (name, None),
    };
    match lookup_alias(first) {
        Some(fqn) => format!("{}{}", fqn, rest.unwrap_or_default()),
        None => qualify(namespace, name),
    }
}

fn qualify(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}\\{}", ns, name),
        _ => name.to_string(),
    }
}

/// Scalar and pseudo types that never name a class
pub fn is_builtin_type(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "array"
            | "bool"
            | "callable"
            | "false"
            | "float"
            | "int"
            | "iterable"
            | "mixed"
            | "never"
            | "null"
            | "object"
            | "string"
            | "true"
            | "void"
            | "self"
            | "static"
            | "parent"
    )
}

/// Class names referenced by a type declaration such as `?Foo|Bar\Baz&Qux`
pub fn type_class_names(type_hint: &str) -> Vec<&str> {
    type_hint
        .split(['|', '&', '(', ')', '?'])
        .map(str::trim)
        .filter(|part| !part.is_empty() && !is_builtin_type(part))
        .collect()
}

/// Rewrite each named part of a type declaration (`?Foo|Bar` calls `f` with
/// `Foo` and `Bar`), keeping the type operators in place
pub fn map_type_parts<F>(type_hint: &str, mut f: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(type_hint.len());
    let mut start = 0;
    for (idx, ch) in type_hint.char_indices() {
        if matches!(ch, '|' | '&' | '(' | ')' | '?') {
            push_part(&mut out, &type_hint[start..idx], &mut f);
            out.push(ch);
            start = idx + ch.len_utf8();
        }
    }
    push_part(&mut out, &type_hint[start..], &mut f);
    out
}

fn push_part<F: FnMut(&str) -> String>(out: &mut String, part: &str, f: &mut F) {
    let part = part.trim();
    if !part.is_empty() {
        out.push_str(&f(part));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_parts() {
        assert_eq!(
            class_parts("craft\\base\\Plugin"),
            (Some("craft\\base"), "Plugin")
        );
        assert_eq!(class_parts("Plugin"), (None, "Plugin"));
        assert_eq!(namespace_of("\\Foo"), None);
        assert_eq!(class_name("a\\b\\C"), "C");
    }

    #[test]
    fn test_normalize_class() {
        assert_eq!(
            normalize_class("/acme//plugin\\\\services/").unwrap(),
            "acme\\plugin\\services"
        );
        assert!(normalize_class("acme\\1plugin").is_err());
        assert!(normalize_class("").is_err());
    }

    #[test]
    fn test_resolve_class_name() {
        let lookup = |alias: &str| {
            (alias.eq_ignore_ascii_case("BasePlugin")).then(|| "craft\\base\\Plugin".to_string())
        };
        assert_eq!(
            resolve_class_name("BasePlugin", Some("acme"), lookup),
            "craft\\base\\Plugin"
        );
        assert_eq!(resolve_class_name("Settings", Some("acme"), lookup), "acme\\Settings");
        assert_eq!(resolve_class_name("\\DateTime", Some("acme"), lookup), "DateTime");
        assert_eq!(resolve_class_name("string", Some("acme"), lookup), "string");
        assert_eq!(
            resolve_class_name("models\\Settings", Some("acme"), lookup),
            "acme\\models\\Settings"
        );
    }

    #[test]
    fn test_type_class_names() {
        assert_eq!(type_class_names("?Model|string|null"), vec!["Model"]);
        assert_eq!(type_class_names("(A&B)|C"), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_map_type_parts() {
        let mapped = map_type_parts("?Model", |part| format!("\\app\\{}", part));
        assert_eq!(mapped, "?\\app\\Model");
        let mapped = map_type_parts("(A&B)|null", |part| part.to_uppercase());
        assert_eq!(mapped, "(A&B)|NULL");
    }
}
