use super::EditOutcome;
use crate::syntax::{ArrayLiteral, Expr, Member, MethodDecl, Stmt};
use crate::visit::{Action, NodeMut, Visitor};
use tracing::debug;

/// Whether `node` is a method declaration named exactly `name`
pub fn is_named_method(node: &NodeMut<'_>, name: &str) -> bool {
    matches!(node, NodeMut::Member(Member::Method(method)) if method.name == name)
}

/// Visitor applying `edit` to the first method named `name`, then stopping.
///
/// Statement and expression subtrees are skipped: methods only live in
/// class bodies.
pub struct MethodFinder<F> {
    name: String,
    edit: F,
    outcome: Option<EditOutcome>,
}

impl<F> MethodFinder<F>
where
    F: FnMut(&mut MethodDecl) -> EditOutcome,
{
    pub fn new(name: impl Into<String>, edit: F) -> Self {
        Self {
            name: name.into(),
            edit,
            outcome: None,
        }
    }

    pub fn found(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> EditOutcome {
        self.outcome.clone().unwrap_or_else(|| {
            EditOutcome::not_applicable(format!("method `{}()` not found", self.name))
        })
    }
}

impl<F> Visitor for MethodFinder<F>
where
    F: FnMut(&mut MethodDecl) -> EditOutcome,
{
    fn enter(&mut self, node: NodeMut<'_>) -> Action {
        if is_named_method(&node, &self.name) {
            if let NodeMut::Member(Member::Method(method)) = node {
                debug!(method = %self.name, "Found target method");
                self.outcome = Some((self.edit)(method));
            }
            return Action::Stop;
        }
        match node {
            NodeMut::Stmt(Stmt::Namespace(_)) | NodeMut::Stmt(Stmt::Class(_)) => Action::Continue,
            _ => Action::SkipChildren,
        }
    }
}

/// Value of the first `return` statement directly in `stmts`
pub fn first_return_value(stmts: &mut [Stmt]) -> Option<&mut Expr> {
    stmts
        .iter_mut()
        .find_map(|stmt| match stmt {
            Stmt::Return(ret) => Some(ret.value.as_mut()),
            _ => None,
        })
        .flatten()
}

/// Array literal returned by the first `return` statement in `stmts`
pub fn find_returned_array(stmts: &mut [Stmt]) -> Result<&mut ArrayLiteral, String> {
    match first_return_value(stmts) {
        Some(Expr::Array(array)) => Ok(array),
        Some(_) => Err("the first return statement does not return an array literal".to_string()),
        None => Err("no return statement found".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::syntax::{Leaf, Origin};
    use crate::visit::traverse;

    #[test]
    fn test_is_named_method_is_case_sensitive() {
        let mut file = parse("<?php\nclass A { function config() {} }\n").unwrap();
        let class = file.primary_class_mut().unwrap();
        let member = &mut class.members[0];
        assert!(is_named_method(&NodeMut::Member(&mut *member), "config"));
        assert!(!is_named_method(&NodeMut::Member(&mut *member), "Config"));

        let mut expr = Expr::Name(Leaf {
            text: "config".into(),
            origin: Origin::generated(),
        });
        assert!(!is_named_method(&NodeMut::Expr(&mut expr), "config"));
    }

    #[test]
    fn test_method_finder_stops_at_first_match() {
        let source = "<?php\nclass A {\n    function run() { return 1; }\n    function runOther() { return 2; }\n    function run2() {}\n}\n";
        let mut file = parse(source).unwrap();
        let mut seen = Vec::new();
        let mut finder = MethodFinder::new("run", |method: &mut MethodDecl| {
            seen.push(method.name.clone());
            EditOutcome::Applied
        });
        let report = traverse(&mut file, &mut finder).unwrap();
        assert!(report.stopped);
        assert!(finder.outcome().is_applied());
        drop(finder);
        assert_eq!(seen, vec!["run"]);
    }

    #[test]
    fn test_method_finder_reports_missing_method() {
        let mut file = parse("<?php\nclass A { function runOther() {} }\n").unwrap();
        let mut finder = MethodFinder::new("run", |_: &mut MethodDecl| EditOutcome::Applied);
        let report = traverse(&mut file, &mut finder).unwrap();
        assert!(!report.stopped);
        assert!(!finder.found());
        assert!(!finder.outcome().is_applied());
    }

    #[test]
    fn test_find_returned_array() {
        let mut file = parse("<?php\n$a = 1;\nreturn ['x' => 1];\n").unwrap();
        assert_eq!(find_returned_array(&mut file.stmts).unwrap().items.len(), 1);

        let mut file = parse("<?php\nreturn $this->buildConfig();\n").unwrap();
        assert!(find_returned_array(&mut file.stmts).is_err());
    }
}
