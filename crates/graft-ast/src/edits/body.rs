use super::{normalized, EditOutcome};
use crate::printer::layout::dedent;
use crate::printer::stmt_to_code;
use crate::syntax::{MethodDecl, Stmt};

/// Append `code` (one or more statements) at the end of the method body.
///
/// The snippet is stored as written and re-indented to the body's depth
/// when printed.
pub fn append_statement_to_method(method: &mut MethodDecl, code: &str) -> EditOutcome {
    let Some(body) = method.body.as_mut() else {
        return EditOutcome::not_applicable(format!(
            "method `{}()` has no body",
            method.name
        ));
    };
    let code = code.trim_matches('\n').trim_end();
    let snippet = code.trim_start();
    if snippet.is_empty() {
        return EditOutcome::not_applicable("no statement to append");
    }
    let indent = &code[..code.len() - snippet.len()];
    body.stmts.push(Stmt::raw(dedent(snippet, indent)));
    EditOutcome::Applied
}

/// Whether the body already contains `code`, ignoring whitespace
pub fn body_contains(method: &MethodDecl, code: &str) -> bool {
    let needle = normalized(code);
    method.body.as_ref().is_some_and(|body| {
        !needle.is_empty()
            && body
                .stmts
                .iter()
                .any(|stmt| normalized(&stmt_to_code(stmt)).contains(&needle))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    const PLUGIN: &str = "<?php\nclass Plugin\n{\n    public function init(): void\n    {\n        parent::init();\n    }\n\n    abstract protected function later();\n}\n";

    #[test]
    fn test_append_statement() {
        let mut file = parse(PLUGIN).unwrap();
        let class = file.primary_class_mut().unwrap();
        let method = class.method_mut("init").unwrap();
        let outcome = append_statement_to_method(
            method,
            "Event::on(A::class, A::EVENT_X, function(Event $event) {\n    // ...\n});",
        );
        assert!(outcome.is_applied());
        assert_eq!(
            file.render(),
            "<?php\nclass Plugin\n{\n    public function init(): void\n    {\n        parent::init();\n        Event::on(A::class, A::EVENT_X, function(Event $event) {\n            // ...\n        });\n    }\n\n    abstract protected function later();\n}\n"
        );
    }

    #[test]
    fn test_abstract_method_is_not_applicable() {
        let mut file = parse(PLUGIN).unwrap();
        let method = file.primary_class_mut().unwrap().method_mut("later").unwrap();
        assert!(!append_statement_to_method(method, "return;").is_applied());
    }

    #[test]
    fn test_body_contains() {
        let mut file = parse(PLUGIN).unwrap();
        let method = file.primary_class_mut().unwrap().method_mut("init").unwrap();
        assert!(body_contains(method, "parent::init( );"));
        assert!(!body_contains(method, "Event::on("));
    }
}
