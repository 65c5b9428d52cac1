use crate::error::SynthResult;
use graft_ast::edits::append_doc_line;
use graft_ast::names::namespace_of;
use graft_ast::syntax::{DocComment, Member, MethodDecl, NamespaceDecl, UseDecl};
use graft_ast::{ClassDecl, Import, ImportTable, SourceFile, Stmt};

/// A synthesized class ready to be rendered as a new file
#[derive(Debug, Clone)]
pub struct GeneratedType {
    fqn: String,
    class: ClassDecl,
    imports: ImportTable,
    base_alias: String,
}

impl GeneratedType {
    pub(crate) fn new(
        fqn: String,
        class: ClassDecl,
        imports: ImportTable,
        base_alias: String,
    ) -> Self {
        Self {
            fqn,
            class,
            imports,
            base_alias,
        }
    }

    /// Fully qualified class name
    pub fn name(&self) -> &str {
        &self.fqn
    }

    pub fn namespace(&self) -> Option<&str> {
        namespace_of(&self.fqn)
    }

    /// How the generated code refers to the base type, e.g. `BasePlugin`
    pub fn base_reference(&self) -> &str {
        &self.base_alias
    }

    pub fn class(&self) -> &ClassDecl {
        &self.class
    }

    pub fn class_mut(&mut self) -> &mut ClassDecl {
        &mut self.class
    }

    /// Imports needing a `use` statement, in the order they were added
    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        self.imports.imports()
    }

    /// Replace the class doc block; `text` holds the lines without markers
    pub fn set_doc(&mut self, text: &str) -> &mut Self {
        self.class.doc = Some(DocComment::from_lines(text.lines().map(str::trim_end)));
        self
    }

    pub fn add_doc_line(&mut self, line: &str) -> &mut Self {
        append_doc_line(&mut self.class, line);
        self
    }

    /// Import `fqn` and return the alias to write in code
    pub fn import(&mut self, fqn: &str, preferred: Option<&str>) -> SynthResult<String> {
        Ok(self.imports.ensure(fqn, preferred)?.alias)
    }

    /// Add a member after the existing members of its kind
    pub fn add_member(&mut self, member: Member) -> &mut Self {
        let rank = member_rank(&member);
        let index = self
            .class
            .members
            .iter()
            .rposition(|existing| member_rank(existing) <= rank)
            .map_or(0, |i| i + 1);
        self.class.members.insert(index, member);
        self
    }

    pub fn add_method(&mut self, method: MethodDecl) -> &mut Self {
        self.add_member(Member::Method(method))
    }

    /// The complete file: `<?php`, namespace, imports and the class
    pub fn to_file(&self) -> SourceFile {
        let mut stmts: Vec<Stmt> = self
            .imports
            .imports()
            .map(|import| {
                let alias = import.has_explicit_alias().then(|| import.alias.clone());
                Stmt::Use(UseDecl::class(import.fqn.clone(), alias))
            })
            .collect();
        stmts.push(Stmt::Class(self.class.clone()));
        match self.namespace() {
            Some(namespace) => SourceFile::generated(vec![Stmt::Namespace(NamespaceDecl::new(
                namespace, stmts,
            ))]),
            None => SourceFile::generated(stmts),
        }
    }

    pub fn render(&self) -> String {
        self.to_file().render()
    }
}

fn member_rank(member: &Member) -> u8 {
    match member {
        Member::Raw(_) => 0,
        Member::Constant(_) => 1,
        Member::Property(_) => 2,
        Member::Method(_) => 3,
    }
}

#[cfg(test)]
mod tests {
    use crate::selection::MemberSelection;
    use crate::{synthesize, TypeDescriptor};
    use graft_ast::syntax::{ConstantDecl, Modifiers, Visibility};
    use graft_ast::{Expr, Member, MethodDecl};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_service_class() {
        let base = TypeDescriptor::new("yii\\base\\Component");
        let mut generated = synthesize("acme\\services\\Log", &base, MemberSelection::new()).unwrap();
        generated.set_doc("Log service");
        generated.import("Craft", None).unwrap();

        assert_eq!(
            generated.render(),
            "<?php\n\nnamespace acme\\services;\n\nuse yii\\base\\Component;\nuse Craft;\n\n/**\n * Log service\n */\nclass Log extends Component\n{\n}\n"
        );
    }

    #[test]
    fn test_add_member_groups_by_kind() {
        let base = TypeDescriptor::new("yii\\base\\Module");
        let mut generated = synthesize("Module", &base, MemberSelection::new()).unwrap();
        let mut attach = MethodDecl::new(Modifiers::with_visibility(Visibility::Private), "attachEventHandlers");
        attach.return_type = Some("void".into());
        generated.add_method(attach);
        generated.add_member(Member::Constant(ConstantDecl::new(
            Modifiers::public(),
            "ID",
            Expr::string("shop"),
        )));
        let names: Vec<_> = generated.class().members.iter().filter_map(|m| m.name()).collect();
        assert_eq!(names, vec!["ID", "attachEventHandlers"]);
        assert_eq!(generated.base_reference(), "BaseModule");
        assert!(generated.render().starts_with("<?php\n\nuse yii\\base\\Module as BaseModule;\n"));
    }

    #[test]
    fn test_doc_lines() {
        let base = TypeDescriptor::new("craft\\base\\Plugin");
        let mut generated = synthesize("acme\\Plugin", &base, MemberSelection::new()).unwrap();
        generated
            .set_doc("Acme plugin\n\n@method static Plugin getInstance()")
            .add_doc_line("@author Acme");
        let doc = generated.class().doc.as_ref().unwrap();
        assert_eq!(
            doc.text(),
            "/**\n * Acme plugin\n *\n * @method static Plugin getInstance()\n * @author Acme\n */"
        );
    }
}
