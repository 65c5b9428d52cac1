use super::EditOutcome;
use crate::syntax::{ClassDecl, ConstantDecl, DocComment, MethodDecl, PropertyDecl};

/// Declarations that can carry a `/** ... */` block
pub trait Documented {
    fn doc(&self) -> Option<&DocComment>;
    fn doc_mut(&mut self) -> &mut Option<DocComment>;
}

macro_rules! documented {
    ($($ty:ty),*) => {
        $(impl Documented for $ty {
            fn doc(&self) -> Option<&DocComment> {
                self.doc.as_ref()
            }

            fn doc_mut(&mut self) -> &mut Option<DocComment> {
                &mut self.doc
            }
        })*
    };
}

documented!(ClassDecl, MethodDecl, PropertyDecl, ConstantDecl);

/// Whether the doc block already has exactly this content line
pub fn has_doc_line<D: Documented + ?Sized>(decl: &D, line: &str) -> bool {
    decl.doc()
        .is_some_and(|doc| doc.lines().iter().any(|existing| existing == line.trim()))
}

/// Append `line` as the last content line of the doc block, creating the
/// block when there is none. Lines are not deduplicated.
pub fn append_doc_line<D: Documented + ?Sized>(decl: &mut D, line: &str) -> EditOutcome {
    let line = line.trim_end();
    match decl.doc_mut() {
        Some(doc) => {
            let text = match insert_before_close(doc.text(), line) {
                Some(text) => text,
                None => {
                    let mut lines = doc.lines();
                    lines.push(line.to_string());
                    DocComment::from_lines(lines).text().to_string()
                }
            };
            doc.set_text(text);
        }
        slot @ None => *slot = Some(DocComment::from_lines([line])),
    }
    EditOutcome::Applied
}

/// Multi-line blocks keep their text; the line goes just above ` */`
fn insert_before_close(text: &str, line: &str) -> Option<String> {
    let newline = text.rfind('\n')?;
    let (head, closing) = text.split_at(newline);
    if closing.trim() != "*/" {
        return None;
    }
    let prefix = closing[1..].split('*').next().unwrap_or("");
    let content = if line.is_empty() {
        format!("\n{}*", prefix)
    } else {
        format!("\n{}* {}", prefix, line)
    };
    Some(format!("{}{}{}", head, content, closing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::syntax::{ClassKind, Stmt};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_append_to_multiline_doc() {
        let source = "<?php\n/**\n * Plugin class\n *\n * @author Acme\n */\nclass Plugin extends BasePlugin\n{\n}\n";
        let mut file = parse(source).unwrap();
        let class = file.primary_class_mut().unwrap();
        assert!(append_doc_line(class, "@property-read Log $log").is_applied());
        assert_eq!(
            file.render(),
            "<?php\n/**\n * Plugin class\n *\n * @author Acme\n * @property-read Log $log\n */\nclass Plugin extends BasePlugin\n{\n}\n"
        );
    }

    #[test]
    fn test_append_creates_doc_block() {
        let source = "<?php\nnamespace a;\n\nclass Plugin\n{\n}\n";
        let mut file = parse(source).unwrap();
        let class = file.primary_class_mut().unwrap();
        append_doc_line(class, "@property-read Log $log");
        assert_eq!(
            file.render(),
            "<?php\nnamespace a;\n\n/**\n * @property-read Log $log\n */\nclass Plugin\n{\n}\n"
        );
    }

    #[test]
    fn test_append_to_single_line_doc() {
        let mut class = ClassDecl::new(ClassKind::Class, "A");
        class.doc = Some(DocComment::from_lines(["First"]));
        append_doc_line(&mut class, "Second");
        let file = crate::syntax::SourceFile::generated(vec![Stmt::Class(class.clone())]);
        assert!(file.render().contains("/**\n * First\n * Second\n */\nclass A"));

        let mut one_liner = parse("<?php\n/** @var int */\nconst X = 1;\nclass B {}\n").unwrap();
        let class = one_liner.primary_class_mut().unwrap();
        assert!(!has_doc_line(class, "@internal"));
        append_doc_line(class, "@internal");
        assert!(has_doc_line(class, "@internal"));
    }

    #[test]
    fn test_lines_are_not_deduplicated() {
        let mut class = ClassDecl::new(ClassKind::Class, "A");
        append_doc_line(&mut class, "@x");
        append_doc_line(&mut class, "@x");
        assert_eq!(class.doc.unwrap().lines(), vec!["@x", "@x"]);
    }

    #[test]
    fn test_insert_before_close_keeps_tab_indent() {
        assert_eq!(
            insert_before_close("/**\n\t * a\n\t */", "b").unwrap(),
            "/**\n\t * a\n\t * b\n\t */"
        );
        assert_eq!(insert_before_close("/** a */", "b"), None);
    }
}
