//! Recursive-descent parser over the token stream.
//!
//! Declarations (namespaces, imports, class-likes and their members) are
//! parsed precisely. Statements and expressions the edits never look inside
//! are captured as [`RawCode`] spans: the parser only has to find where they
//! end, which it does by tracking bracket depth.

mod decl;
mod expr;

use crate::error::{AstError, AstResult};
use crate::lexer::{tokenize, Token, TokenKind};
use crate::printer::layout::{dedent, line_indent};
use crate::syntax::{
    Body, ExprStmt, NamespaceDecl, Origin, RawCode, ReturnStmt, SourceFile, Span, Stmt, UseDecl,
    UseItem, UseKind,
};
use tracing::debug;

/// Parse a PHP file
pub fn parse(source: &str) -> AstResult<SourceFile> {
    let mut parser = Parser::new(source)?;
    let file = parser.parse_file()?;
    debug!(
        bytes = source.len(),
        statements = file.stmts.len(),
        "Parsed source file"
    );
    Ok(file)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    TopLevel,
    Namespace,
    Body,
}

pub(crate) struct Parser<'s> {
    src: &'s str,
    /// Significant tokens only
    tokens: Vec<Token>,
    /// Doc comment in the trivia before each significant token
    docs: Vec<Option<Span>>,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn new(src: &'s str) -> AstResult<Self> {
        let mut tokens = Vec::new();
        let mut docs = Vec::new();
        let mut pending_doc = None;
        for token in tokenize(src)? {
            if token.kind.is_trivia() {
                if token.is_doc_comment(src) {
                    pending_doc = Some(token.span);
                }
            } else {
                tokens.push(token);
                docs.push(pending_doc.take());
            }
        }
        Ok(Self {
            src,
            tokens,
            docs,
            pos: 0,
        })
    }

    fn parse_file(&mut self) -> AstResult<SourceFile> {
        self.eat(TokenKind::InlineHtml);
        let body_start = if self.eat(TokenKind::OpenTag) {
            self.prev_end()
        } else if self.peek().is_none() {
            self.src.len()
        } else {
            return Err(self.error("expected `<?php` open tag"));
        };
        let stmts = self.parse_stmt_list(Scope::TopLevel, false)?;
        Ok(SourceFile::new(
            self.src.to_string(),
            Body {
                inner: Span::new(body_start, self.src.len()),
            },
            stmts,
        ))
    }

    // Cursor

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn nth_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.nth_is_keyword(0, keyword)
    }

    fn nth_is_keyword(&self, n: usize, keyword: &str) -> bool {
        self.tokens
            .get(self.pos + n)
            .is_some_and(|t| t.is_keyword(self.src, keyword))
    }

    fn text(&self, token: Token) -> &'s str {
        token.text(self.src)
    }

    fn bump(&mut self) -> AstResult<Token> {
        let token = self
            .peek()
            .ok_or_else(|| self.error("unexpected end of file"))?;
        self.pos += 1;
        Ok(token)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> AstResult<Token> {
        if self.at(kind) {
            self.bump()
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    fn expect_name(&mut self, what: &str) -> AstResult<String> {
        let token = self.expect(TokenKind::Name, what)?;
        Ok(self.text(token).to_string())
    }

    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |t| t.span.end)
    }

    fn start_of(&self, index: usize) -> usize {
        self.tokens
            .get(index)
            .map_or(self.src.len(), |t| t.span.start)
    }

    /// Span from the token at `index` (or its doc comment) to the last consumed token
    fn span_from(&self, index: usize, doc: Option<Span>) -> Span {
        let start = doc.map_or_else(|| self.start_of(index), |d| d.start);
        Span::new(start, self.prev_end())
    }

    fn slice(&self, span: Span) -> &'s str {
        &self.src[span.start..span.end]
    }

    /// Source text of `span` with its first line's indentation removed from
    /// the following lines
    fn code_at(&self, span: Span) -> String {
        dedent(self.slice(span), line_indent(self.src, span.start))
    }

    fn error(&self, message: impl Into<String>) -> AstError {
        let offset = self.peek().map_or(self.src.len(), |t| t.span.start);
        let mut message = message.into();
        if let Some(token) = self.peek() {
            message.push_str(&format!(", found `{}`", self.text(token)));
        }
        AstError::parse(self.src, offset, message)
    }

    // Statements

    fn parse_stmt_list(&mut self, scope: Scope, braced: bool) -> AstResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            match self.peek_kind() {
                None if braced => return Err(self.error("expected `}`")),
                None => break,
                Some(TokenKind::RBrace) if braced => break,
                Some(TokenKind::RBrace) => return Err(self.error("unmatched `}`")),
                Some(_) if scope == Scope::Namespace && !braced && self.at_namespace_decl() => {
                    break
                }
                Some(_) => stmts.push(self.parse_stmt(scope)?),
            }
        }
        Ok(stmts)
    }

    fn at_namespace_decl(&self) -> bool {
        self.at_keyword("namespace")
            && matches!(
                self.nth_kind(1),
                Some(TokenKind::Name) | Some(TokenKind::LBrace)
            )
    }

    fn parse_stmt(&mut self, scope: Scope) -> AstResult<Stmt> {
        if scope == Scope::TopLevel && self.at_namespace_decl() {
            return self.parse_namespace().map(Stmt::Namespace);
        }
        if scope != Scope::Body && self.at_keyword("use") {
            return self.parse_use().map(Stmt::Use);
        }
        if self.at_class_decl() {
            return self.parse_class().map(Stmt::Class);
        }
        if self.at_keyword("return") {
            return self.parse_return().map(Stmt::Return);
        }
        if matches!(
            self.peek_kind(),
            Some(TokenKind::CloseTag) | Some(TokenKind::OpenTag) | Some(TokenKind::OpenTagEcho)
        ) {
            let start = self.pos;
            self.bump()?;
            return Ok(Stmt::Raw(self.raw_from(start)));
        }

        let start = self.pos;
        if let Some(expr) = self.try_simple_expr() {
            if self.eat(TokenKind::Semicolon) {
                return Ok(Stmt::Expr(ExprStmt {
                    expr,
                    origin: Origin::parsed(self.span_from(start, None)),
                }));
            }
        }
        self.pos = start;
        self.scan_raw_stmt().map(Stmt::Raw)
    }

    fn parse_namespace(&mut self) -> AstResult<NamespaceDecl> {
        let start = self.pos;
        self.bump()?;
        let name = if self.at(TokenKind::Name) {
            Some(self.expect_name("namespace name")?)
        } else {
            None
        };

        if self.at(TokenKind::LBrace) {
            let open = self.bump()?;
            let body = self.parse_stmt_list(Scope::Namespace, true)?;
            let close = self.expect(TokenKind::RBrace, "`}` closing the namespace")?;
            return Ok(NamespaceDecl {
                name,
                braced: true,
                body,
                inner: Some(Body {
                    inner: Span::new(open.span.end, close.span.start),
                }),
                origin: Origin::parsed(self.span_from(start, None)),
            });
        }

        let semi = self.expect(TokenKind::Semicolon, "`;` or `{` after namespace name")?;
        let body = self.parse_stmt_list(Scope::Namespace, false)?;
        let span = self.span_from(start, None);
        Ok(NamespaceDecl {
            name,
            braced: false,
            body,
            inner: Some(Body {
                inner: Span::new(semi.span.end, span.end),
            }),
            origin: Origin::parsed(span),
        })
    }

    fn parse_use(&mut self) -> AstResult<UseDecl> {
        let start = self.pos;
        self.bump()?;
        let kind = self.parse_use_kind().unwrap_or(UseKind::Class);

        let mut group_prefix = None;
        let mut items = Vec::new();
        let first = self.expect_name("imported name")?;
        if self.eat(TokenKind::Backslash) {
            self.expect(TokenKind::LBrace, "`{` of a group use")?;
            group_prefix = Some(first);
            loop {
                let item_kind = self.parse_use_kind();
                items.push(self.parse_use_item(item_kind, None)?);
                if !self.eat(TokenKind::Comma) || self.at(TokenKind::RBrace) {
                    break;
                }
            }
            self.expect(TokenKind::RBrace, "`}` closing the group use")?;
        } else {
            items.push(self.parse_use_item(None, Some(first))?);
            while self.eat(TokenKind::Comma) {
                items.push(self.parse_use_item(None, None)?);
            }
        }
        self.expect(TokenKind::Semicolon, "`;` after use statement")?;

        Ok(UseDecl {
            kind,
            group_prefix,
            items,
            origin: Origin::parsed(self.span_from(start, None)),
        })
    }

    fn parse_use_kind(&mut self) -> Option<UseKind> {
        if self.nth_kind(1) != Some(TokenKind::Name) {
            return None;
        }
        if self.eat_keyword("function") {
            Some(UseKind::Function)
        } else if self.eat_keyword("const") {
            Some(UseKind::Const)
        } else {
            None
        }
    }

    fn parse_use_item(&mut self, kind: Option<UseKind>, name: Option<String>) -> AstResult<UseItem> {
        let name = match name {
            Some(name) => name,
            None => self.expect_name("imported name")?,
        };
        let alias = if self.eat_keyword("as") {
            Some(self.expect_name("alias after `as`")?)
        } else {
            None
        };
        Ok(UseItem { kind, name, alias })
    }

    fn parse_return(&mut self) -> AstResult<ReturnStmt> {
        let start = self.pos;
        self.bump()?;
        let value = if self.at(TokenKind::Semicolon) || self.at(TokenKind::CloseTag) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        if !self.eat(TokenKind::Semicolon) && !self.at(TokenKind::CloseTag) {
            return Err(self.error("expected `;` after return"));
        }
        Ok(ReturnStmt {
            value,
            origin: Origin::parsed(self.span_from(start, None)),
        })
    }

    fn raw_from(&self, start: usize) -> RawCode {
        let span = self.span_from(start, None);
        RawCode {
            code: self.code_at(span),
            origin: Origin::parsed(span),
        }
    }

    /// Index of the first token after any `#[...]` attribute groups
    fn skip_attributes_from(&self, mut index: usize) -> usize {
        while self.tokens.get(index).map(|t| t.kind) == Some(TokenKind::AttributeOpen) {
            index = self.attribute_group_end(index);
        }
        index
    }

    /// Index just past the `#[...]` group opening at `index`
    fn attribute_group_end(&self, mut index: usize) -> usize {
        let mut depth = 0usize;
        while let Some(token) = self.tokens.get(index) {
            index += 1;
            match token.kind {
                TokenKind::AttributeOpen | TokenKind::LBracket | TokenKind::LParen => depth += 1,
                TokenKind::RBracket | TokenKind::RParen => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        index
    }

    /// Statements that end with their closing brace rather than a `;`
    fn is_block_statement(&self, index: usize) -> bool {
        let Some(token) = self.tokens.get(index) else {
            return false;
        };
        match token.kind {
            TokenKind::LBrace => true,
            TokenKind::Name => match self.text(*token).to_ascii_lowercase().as_str() {
                "if" | "while" | "for" | "foreach" | "switch" | "try" | "declare" => true,
                "function" => {
                    let mut next = index + 1;
                    if self.tokens.get(next).map(|t| t.kind) == Some(TokenKind::Ampersand) {
                        next += 1;
                    }
                    self.tokens.get(next).map(|t| t.kind) == Some(TokenKind::Name)
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Opaque statement: up to `;` at depth zero, or the closing brace of a
    /// block statement (continuing through `else`, `catch` and friends).
    fn scan_raw_stmt(&mut self) -> AstResult<RawCode> {
        let start = self.pos;
        let lead = self.skip_attributes_from(self.pos);
        let block_like = self.is_block_statement(lead);

        let mut depth = 0usize;
        loop {
            let Some(token) = self.peek() else {
                if depth > 0 {
                    return Err(self.error("unexpected end of file inside statement"));
                }
                break;
            };
            match token.kind {
                TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::AttributeOpen => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace if depth == 0 => {
                    if self.pos == start {
                        return Err(self.error("unexpected closing delimiter"));
                    }
                    break;
                }
                TokenKind::RParen | TokenKind::RBracket => depth -= 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 && block_like {
                        self.pos += 1;
                        let continues = ["else", "elseif", "catch", "finally"]
                            .iter()
                            .any(|kw| self.at_keyword(kw));
                        if continues {
                            continue;
                        }
                        break;
                    }
                }
                TokenKind::Semicolon if depth == 0 => {
                    self.pos += 1;
                    break;
                }
                TokenKind::CloseTag if depth == 0 => break,
                _ => {}
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected statement"));
        }
        Ok(self.raw_from(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{ClassKind, Expr, Member};

    #[test]
    fn test_parse_namespace_uses_and_class() {
        let source = "<?php\n\nnamespace acme\\plugin;\n\nuse craft\\base\\Plugin as BasePlugin;\nuse yii\\base\\{Event, Module as M};\n\nclass Plugin extends BasePlugin\n{\n}\n";
        let file = parse(source).unwrap();
        assert_eq!(file.namespace(), Some("acme\\plugin"));
        let scope = file.scope_stmts();
        assert_eq!(scope.len(), 3);
        match &scope[1] {
            Stmt::Use(decl) => {
                let items: Vec<_> = decl.resolved().map(|(_, n, a)| (n, a.map(String::from))).collect();
                assert_eq!(
                    items,
                    vec![
                        ("yii\\base\\Event".to_string(), None),
                        ("yii\\base\\Module".to_string(), Some("M".to_string())),
                    ]
                );
            }
            other => panic!("expected use, got {other:?}"),
        }
        let class = file.find_class("plugin").unwrap();
        assert_eq!(class.kind, ClassKind::Class);
        assert_eq!(class.extends, vec!["BasePlugin".to_string()]);
    }

    #[test]
    fn test_parse_control_flow_as_raw_statements() {
        let source = "<?php\nif ($a) {\n  foo();\n} else {\n  bar();\n}\n$x = function () { return 1; };\ntry { a(); } catch (E $e) {} finally {}\n";
        let file = parse(source).unwrap();
        assert_eq!(file.stmts.len(), 3);
        assert!(file.stmts.iter().all(|s| matches!(s, Stmt::Raw(_))));
    }

    #[test]
    fn test_parse_expression_statement() {
        let file = parse("<?php\nEvent::on(A::class, A::EVENT, function () {});\n").unwrap();
        match &file.stmts[0] {
            Stmt::Expr(stmt) => assert!(matches!(stmt.expr, Expr::StaticCall(_))),
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_method_members() {
        let source = "<?php\nclass A {\n    /** doc */\n    public static function config(): array\n    {\n        return ['a' => 1];\n    }\n    abstract protected function x(?int $a = null, string ...$rest);\n}\n";
        let file = parse(source).unwrap();
        let class = file.find_class("A").unwrap();
        match &class.members[0] {
            Member::Method(m) => {
                assert_eq!(m.name, "config");
                assert!(m.modifiers.is_static);
                assert_eq!(m.return_type.as_deref(), Some("array"));
                assert_eq!(m.doc.as_ref().map(|d| d.text()), Some("/** doc */"));
            }
            other => panic!("expected method, got {other:?}"),
        }
        match &class.members[1] {
            Member::Method(m) => {
                assert!(m.body.is_none());
                assert_eq!(m.params.len(), 2);
                assert_eq!(m.params[0].type_hint.as_deref(), Some("?int"));
                assert!(m.params[1].variadic);
            }
            other => panic!("expected method, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_reports_location() {
        let err = parse("<?php\nclass {\n").unwrap_err();
        assert!(matches!(err, AstError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_unbalanced_braces_fail() {
        assert!(parse("<?php\nfunction a() {\n").is_err());
        assert!(parse("<?php\n}\n").is_err());
    }
}
