//! Syntax tree of a PHP file.
//!
//! Every parsed node records where it came from through an [`Origin`]. The
//! printer reproduces pristine nodes from the original text and only runs the
//! generic printer over nodes that were generated, replaced, or touched.
//! Code that mutates a parsed node's own fields (rather than its children)
//! must call [`Origin::touch`] on it.

use serde::{Deserialize, Serialize};

/// Half-open byte range into the original source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Origin {
    span: Option<Span>,
    dirty: bool,
}

impl Origin {
    pub fn parsed(span: Span) -> Self {
        Self {
            span: Some(span),
            dirty: false,
        }
    }

    pub fn generated() -> Self {
        Self::default()
    }

    /// Where the node sits in the original text, if it was parsed
    pub fn span(&self) -> Option<Span> {
        self.span
    }

    /// Parsed and untouched: printed verbatim from the source
    pub fn is_pristine(&self) -> bool {
        self.span.is_some() && !self.dirty
    }

    pub fn touch(&mut self) {
        self.dirty = true;
    }

    /// Take over the slot of a replaced node
    pub(crate) fn replacing(old: Origin) -> Self {
        Self {
            span: old.span,
            dirty: true,
        }
    }
}

/// Container-level layout recorded by the parser: the region between the
/// opening and closing delimiters where children live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Body {
    pub inner: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    source: String,
    pub(crate) body: Body,
    pub stmts: Vec<Stmt>,
}

impl SourceFile {
    pub(crate) fn new(source: String, body: Body, stmts: Vec<Stmt>) -> Self {
        Self {
            source,
            body,
            stmts,
        }
    }

    /// A file with no backing text; everything in it prints generically
    pub fn generated(stmts: Vec<Stmt>) -> Self {
        Self {
            source: String::new(),
            body: Body {
                inner: Span::new(0, 0),
            },
            stmts,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_generated(&self) -> bool {
        self.source.is_empty()
    }

    /// Name of the first namespace declared in the file
    pub fn namespace(&self) -> Option<&str> {
        self.stmts.iter().find_map(|stmt| match stmt {
            Stmt::Namespace(ns) => ns.name.as_deref(),
            _ => None,
        })
    }

    /// Statements of the scope imports belong to: the first namespace body,
    /// or the top level when the file has no namespace.
    pub fn scope_stmts(&self) -> &[Stmt] {
        match self.stmts.iter().position(|s| matches!(s, Stmt::Namespace(_))) {
            Some(idx) => match &self.stmts[idx] {
                Stmt::Namespace(ns) => &ns.body,
                _ => &self.stmts,
            },
            None => &self.stmts,
        }
    }

    pub fn scope_stmts_mut(&mut self) -> &mut Vec<Stmt> {
        match self.stmts.iter().position(|s| matches!(s, Stmt::Namespace(_))) {
            Some(idx) => match &mut self.stmts[idx] {
                Stmt::Namespace(ns) => &mut ns.body,
                _ => unreachable!("position matched a namespace"),
            },
            None => &mut self.stmts,
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.scope_stmts().iter().filter_map(|stmt| match stmt {
            Stmt::Class(class) => Some(class),
            _ => None,
        })
    }

    pub fn find_class(&self, name: &str) -> Option<&ClassDecl> {
        self.classes().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// First class-like declaration of the file
    pub fn primary_class_mut(&mut self) -> Option<&mut ClassDecl> {
        self.scope_stmts_mut().iter_mut().find_map(|stmt| match stmt {
            Stmt::Class(class) => Some(class),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Namespace(NamespaceDecl),
    Use(UseDecl),
    Class(ClassDecl),
    Return(ReturnStmt),
    Expr(ExprStmt),
    /// Anything else, kept as source text
    Raw(RawCode),
}

impl Stmt {
    pub fn origin(&self) -> Origin {
        match self {
            Stmt::Namespace(n) => n.origin,
            Stmt::Use(n) => n.origin,
            Stmt::Class(n) => n.origin,
            Stmt::Return(n) => n.origin,
            Stmt::Expr(n) => n.origin,
            Stmt::Raw(n) => n.origin,
        }
    }

    pub fn origin_mut(&mut self) -> &mut Origin {
        match self {
            Stmt::Namespace(n) => &mut n.origin,
            Stmt::Use(n) => &mut n.origin,
            Stmt::Class(n) => &mut n.origin,
            Stmt::Return(n) => &mut n.origin,
            Stmt::Expr(n) => &mut n.origin,
            Stmt::Raw(n) => &mut n.origin,
        }
    }

    /// Statement given as code text, re-indented when printed
    pub fn raw(code: impl Into<String>) -> Self {
        Stmt::Raw(RawCode::new(code))
    }

    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr(ExprStmt {
            expr,
            origin: Origin::generated(),
        })
    }

    pub fn returning(expr: Expr) -> Self {
        Stmt::Return(ReturnStmt {
            value: Some(expr),
            origin: Origin::generated(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    pub name: Option<String>,
    pub braced: bool,
    pub body: Vec<Stmt>,
    pub(crate) inner: Option<Body>,
    pub origin: Origin,
}

impl NamespaceDecl {
    pub fn new(name: impl Into<String>, body: Vec<Stmt>) -> Self {
        Self {
            name: Some(name.into()),
            braced: false,
            body,
            inner: None,
            origin: Origin::generated(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UseKind {
    Class,
    Function,
    Const,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UseDecl {
    pub kind: UseKind,
    /// Prefix of a group use (`use A\{B, C}`)
    pub group_prefix: Option<String>,
    pub items: Vec<UseItem>,
    pub origin: Origin,
}

impl UseDecl {
    pub fn class(name: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            kind: UseKind::Class,
            group_prefix: None,
            items: vec![UseItem {
                kind: None,
                name: name.into(),
                alias,
            }],
            origin: Origin::generated(),
        }
    }

    /// Items with the group prefix applied and the leading `\` removed
    pub fn resolved(&self) -> impl Iterator<Item = (UseKind, String, Option<&str>)> + '_ {
        self.items.iter().map(move |item| {
            let name = match &self.group_prefix {
                Some(prefix) => format!("{}\\{}", prefix.trim_end_matches('\\'), item.name),
                None => item.name.clone(),
            };
            (
                item.kind.unwrap_or(self.kind),
                name.trim_start_matches('\\').to_string(),
                item.alias.as_deref(),
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UseItem {
    /// Per-item kind inside a mixed group use
    pub kind: Option<UseKind>,
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClassKind {
    Class,
    Interface,
    Trait,
    Enum,
}

impl ClassKind {
    pub fn keyword(self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Trait => "trait",
            ClassKind::Enum => "enum",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocComment {
    text: String,
    pub origin: Origin,
}

impl DocComment {
    pub(crate) fn parsed(text: String, origin: Origin) -> Self {
        Self { text, origin }
    }

    /// Doc block holding the given lines (without ` * ` prefixes)
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::from("/**");
        for line in lines {
            text.push_str("\n * ");
            text.push_str(line.as_ref());
        }
        text.push_str("\n */");
        Self {
            text: trim_line_ends(&text),
            origin: Origin::generated(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Content lines with comment markers stripped
    pub fn lines(&self) -> Vec<String> {
        let inner = self
            .text
            .strip_prefix("/**")
            .unwrap_or(&self.text)
            .strip_suffix("*/")
            .unwrap_or(&self.text);
        let lines: Vec<String> = inner
            .lines()
            .map(|line| {
                let line = line.trim();
                let line = line.strip_prefix('*').unwrap_or(line);
                line.strip_prefix(' ').unwrap_or(line).trim_end().to_string()
            })
            .collect();
        let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
        let end = lines
            .iter()
            .rposition(|l| !l.is_empty())
            .map_or(start, |i| i + 1);
        lines[start..end].to_vec()
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
        self.origin.touch();
    }
}

fn trim_line_ends(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub doc: Option<DocComment>,
    pub attributes: Vec<String>,
    /// `abstract`, `final`, `readonly`
    pub modifiers: Vec<String>,
    pub kind: ClassKind,
    pub name: String,
    /// Backed-enum scalar type
    pub backing_type: Option<String>,
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    pub members: Vec<Member>,
    pub(crate) inner: Option<Body>,
    pub origin: Origin,
}

impl ClassDecl {
    pub fn new(kind: ClassKind, name: impl Into<String>) -> Self {
        Self {
            doc: None,
            attributes: Vec::new(),
            modifiers: Vec::new(),
            kind,
            name: name.into(),
            backing_type: None,
            extends: Vec::new(),
            implements: Vec::new(),
            members: Vec::new(),
            inner: None,
            origin: Origin::generated(),
        }
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(method) => Some(method),
            _ => None,
        })
    }

    pub fn method_mut(&mut self, name: &str) -> Option<&mut MethodDecl> {
        self.members.iter_mut().find_map(|m| match m {
            Member::Method(method) if method.name == name => Some(method),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub visibility: Option<Visibility>,
    /// Asymmetric write visibility, e.g. `private(set)`
    pub set_visibility: Option<Visibility>,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_readonly: bool,
    /// Legacy `var` property
    pub is_var: bool,
}

impl Modifiers {
    pub fn public() -> Self {
        Self {
            visibility: Some(Visibility::Public),
            ..Self::default()
        }
    }

    pub fn with_visibility(visibility: Visibility) -> Self {
        Self {
            visibility: Some(visibility),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Constant(ConstantDecl),
    Property(PropertyDecl),
    Method(MethodDecl),
    /// Trait use, enum case, or anything else kept as text
    Raw(RawCode),
}

impl Member {
    pub fn origin(&self) -> Origin {
        match self {
            Member::Constant(m) => m.origin,
            Member::Property(m) => m.origin,
            Member::Method(m) => m.origin,
            Member::Raw(m) => m.origin,
        }
    }

    pub fn origin_mut(&mut self) -> &mut Origin {
        match self {
            Member::Constant(m) => &mut m.origin,
            Member::Property(m) => &mut m.origin,
            Member::Method(m) => &mut m.origin,
            Member::Raw(m) => &mut m.origin,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Member::Constant(m) => m.entries.first().map(|e| e.name.as_str()),
            Member::Property(m) => m.entries.first().map(|e| e.name.as_str()),
            Member::Method(m) => Some(&m.name),
            Member::Raw(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantDecl {
    pub doc: Option<DocComment>,
    pub attributes: Vec<String>,
    pub modifiers: Modifiers,
    pub type_hint: Option<String>,
    pub entries: Vec<ConstEntry>,
    pub origin: Origin,
}

impl ConstantDecl {
    pub fn new(modifiers: Modifiers, name: impl Into<String>, value: Expr) -> Self {
        Self {
            doc: None,
            attributes: Vec::new(),
            modifiers,
            type_hint: None,
            entries: vec![ConstEntry {
                name: name.into(),
                value,
            }],
            origin: Origin::generated(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstEntry {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub doc: Option<DocComment>,
    pub attributes: Vec<String>,
    pub modifiers: Modifiers,
    pub type_hint: Option<String>,
    pub entries: Vec<PropertyEntry>,
    pub origin: Origin,
}

impl PropertyDecl {
    pub fn new(
        modifiers: Modifiers,
        type_hint: Option<String>,
        name: impl Into<String>,
        default: Option<Expr>,
    ) -> Self {
        Self {
            doc: None,
            attributes: Vec::new(),
            modifiers,
            type_hint,
            entries: vec![PropertyEntry {
                name: name.into(),
                default,
            }],
            origin: Origin::generated(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyEntry {
    /// Without the leading `$`
    pub name: String,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub doc: Option<DocComment>,
    pub attributes: Vec<String>,
    pub modifiers: Modifiers,
    pub by_ref: bool,
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
    /// `None` for abstract and interface methods
    pub body: Option<Block>,
    pub origin: Origin,
}

impl MethodDecl {
    pub fn new(modifiers: Modifiers, name: impl Into<String>) -> Self {
        Self {
            doc: None,
            attributes: Vec::new(),
            modifiers,
            by_ref: false,
            name: name.into(),
            params: Vec::new(),
            return_type: None,
            body: Some(Block::default()),
            origin: Origin::generated(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub attributes: Vec<String>,
    /// Constructor promotion modifiers
    pub modifiers: Vec<String>,
    pub type_hint: Option<String>,
    pub by_ref: bool,
    pub variadic: bool,
    /// Without the leading `$`
    pub name: String,
    pub default: Option<Expr>,
}

impl Param {
    pub fn new(type_hint: Option<String>, name: impl Into<String>) -> Self {
        Self {
            attributes: Vec::new(),
            modifiers: Vec::new(),
            type_hint,
            by_ref: false,
            variadic: false,
            name: name.into(),
            default: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub(crate) inner: Option<Body>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts, inner: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expr,
    pub origin: Origin,
}

/// Verbatim code: opaque statements, members and expressions
#[derive(Debug, Clone, PartialEq)]
pub struct RawCode {
    pub code: String,
    pub origin: Origin,
}

impl RawCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            origin: Origin::generated(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// String, number, or heredoc literal as written
    Literal(Leaf),
    Variable(Leaf),
    /// Constant or bare name (`true`, `null`, `PHP_EOL`, `Foo\BAR`)
    Name(Leaf),
    Array(ArrayLiteral),
    ClassConst(ClassConstFetch),
    Call(Call),
    StaticCall(StaticCall),
    MethodCall(MethodCall),
    PropertyFetch(PropertyFetch),
    New(New),
    Raw(RawCode),
}

impl Expr {
    pub fn origin(&self) -> Origin {
        match self {
            Expr::Literal(e) | Expr::Variable(e) | Expr::Name(e) => e.origin,
            Expr::Array(e) => e.origin,
            Expr::ClassConst(e) => e.origin,
            Expr::Call(e) => e.origin,
            Expr::StaticCall(e) => e.origin,
            Expr::MethodCall(e) => e.origin,
            Expr::PropertyFetch(e) => e.origin,
            Expr::New(e) => e.origin,
            Expr::Raw(e) => e.origin,
        }
    }

    pub fn origin_mut(&mut self) -> &mut Origin {
        match self {
            Expr::Literal(e) | Expr::Variable(e) | Expr::Name(e) => &mut e.origin,
            Expr::Array(e) => &mut e.origin,
            Expr::ClassConst(e) => &mut e.origin,
            Expr::Call(e) => &mut e.origin,
            Expr::StaticCall(e) => &mut e.origin,
            Expr::MethodCall(e) => &mut e.origin,
            Expr::PropertyFetch(e) => &mut e.origin,
            Expr::New(e) => &mut e.origin,
            Expr::Raw(e) => &mut e.origin,
        }
    }

    /// Single-quoted string literal
    pub fn string(value: &str) -> Self {
        let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
        Expr::Literal(Leaf::new(format!("'{}'", escaped)))
    }

    pub fn int(value: i64) -> Self {
        Expr::Literal(Leaf::new(value.to_string()))
    }

    pub fn name(name: impl Into<String>) -> Self {
        Expr::Name(Leaf::new(name))
    }

    pub fn bool(value: bool) -> Self {
        Expr::name(if value { "true" } else { "false" })
    }

    pub fn null() -> Self {
        Expr::name("null")
    }

    /// `Class::class`
    pub fn class_ref(class: impl Into<String>) -> Self {
        Expr::ClassConst(ClassConstFetch {
            class: class.into(),
            constant: "class".to_string(),
            origin: Origin::generated(),
        })
    }

    pub fn raw(code: impl Into<String>) -> Self {
        Expr::Raw(RawCode::new(code))
    }

    pub fn as_array(&self) -> Option<&ArrayLiteral> {
        match self {
            Expr::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut ArrayLiteral> {
        match self {
            Expr::Array(array) => Some(array),
            _ => None,
        }
    }
}

/// Expression stored as its source text
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub text: String,
    pub origin: Origin,
}

impl Leaf {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: Origin::generated(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArraySyntax {
    /// `[ ... ]`
    Short,
    /// `array( ... )`
    Long,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLiteral {
    pub syntax: ArraySyntax,
    pub items: Vec<ArrayItem>,
    pub(crate) inner: Option<Body>,
    pub origin: Origin,
}

impl ArrayLiteral {
    pub fn new(items: Vec<ArrayItem>) -> Self {
        Self {
            syntax: ArraySyntax::Short,
            items,
            inner: None,
            origin: Origin::generated(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayItem {
    pub key: Option<Expr>,
    pub value: Expr,
    pub by_ref: bool,
    pub spread: bool,
    pub origin: Origin,
}

impl ArrayItem {
    pub fn keyed(key: Expr, value: Expr) -> Self {
        Self {
            key: Some(key),
            value,
            by_ref: false,
            spread: false,
            origin: Origin::generated(),
        }
    }

    pub fn value(value: Expr) -> Self {
        Self {
            key: None,
            value,
            by_ref: false,
            spread: false,
            origin: Origin::generated(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassConstFetch {
    pub class: String,
    pub constant: String,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub spread: bool,
    /// Named argument label
    pub name: Option<String>,
    pub value: Expr,
    pub origin: Origin,
}

impl Arg {
    pub fn new(value: Expr) -> Self {
        Self {
            spread: false,
            name: None,
            value,
            origin: Origin::generated(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: Box<Expr>,
    pub args: Vec<Arg>,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticCall {
    pub class: String,
    pub method: String,
    pub args: Vec<Arg>,
    pub origin: Origin,
}

impl StaticCall {
    pub fn new(class: impl Into<String>, method: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            class: class.into(),
            method: method.into(),
            args,
            origin: Origin::generated(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub object: Box<Expr>,
    pub nullsafe: bool,
    pub method: String,
    pub args: Vec<Arg>,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFetch {
    pub object: Box<Expr>,
    pub nullsafe: bool,
    /// `Class::$prop` when `is_static`
    pub is_static: bool,
    pub property: String,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct New {
    pub class: String,
    pub args: Vec<Arg>,
    pub has_parens: bool,
    pub origin: Origin,
}
