//! Class-like declarations and their members

use super::{Parser, Scope};
use crate::error::AstResult;
use crate::lexer::TokenKind;
use crate::syntax::{
    Block, Body, ClassDecl, ClassKind, ConstEntry, ConstantDecl, DocComment, Member, MethodDecl,
    Modifiers, Origin, Param, PropertyDecl, PropertyEntry, RawCode, Span, Visibility,
};

impl<'s> Parser<'s> {
    pub(super) fn at_class_decl(&self) -> bool {
        let mut index = self.skip_attributes_from(self.pos);
        while self.tokens.get(index).is_some_and(|t| {
            ["abstract", "final", "readonly"]
                .iter()
                .any(|kw| t.is_keyword(self.src, kw))
        }) {
            index += 1;
        }
        let Some(keyword) = self.tokens.get(index) else {
            return false;
        };
        let name_follows = self.tokens.get(index + 1).map(|t| t.kind) == Some(TokenKind::Name);
        if keyword.is_keyword(self.src, "enum") {
            name_follows
                && matches!(
                    self.tokens.get(index + 2).map(|t| t.kind),
                    Some(TokenKind::LBrace) | Some(TokenKind::Colon) | Some(TokenKind::Name)
                )
        } else {
            ["class", "interface", "trait"]
                .iter()
                .any(|kw| keyword.is_keyword(self.src, kw))
        }
    }

    fn doc_at(&self, index: usize) -> Option<DocComment> {
        self.docs.get(index).copied().flatten().map(|span| {
            DocComment::parsed(self.code_at(span), Origin::parsed(span))
        })
    }

    fn parse_attributes(&mut self) -> Vec<String> {
        let mut attributes = Vec::new();
        while self.at(TokenKind::AttributeOpen) {
            let start = self.pos;
            self.pos = self.attribute_group_end(start);
            attributes.push(self.slice(self.span_from(start, None)).to_string());
        }
        attributes
    }

    pub(super) fn parse_class(&mut self) -> AstResult<ClassDecl> {
        let start = self.pos;
        let doc = self.doc_at(start);
        let attributes = self.parse_attributes();

        let mut modifiers = Vec::new();
        while ["abstract", "final", "readonly"]
            .iter()
            .any(|kw| self.at_keyword(kw))
        {
            let token = self.bump()?;
            modifiers.push(self.text(token).to_ascii_lowercase());
        }

        let keyword = self.bump()?;
        let kind = match self.text(keyword).to_ascii_lowercase().as_str() {
            "interface" => ClassKind::Interface,
            "trait" => ClassKind::Trait,
            "enum" => ClassKind::Enum,
            _ => ClassKind::Class,
        };
        let name = self.expect_name("class name")?;

        let backing_type = if kind == ClassKind::Enum && self.eat(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let extends = if self.eat_keyword("extends") {
            self.parse_name_list()?
        } else {
            Vec::new()
        };
        let implements = if self.eat_keyword("implements") {
            self.parse_name_list()?
        } else {
            Vec::new()
        };

        let open = self.expect(TokenKind::LBrace, "`{` opening the class body")?;
        let mut members = Vec::new();
        while !self.at(TokenKind::RBrace) {
            if self.peek().is_none() {
                return Err(self.error("expected `}` closing the class body"));
            }
            members.push(self.parse_member()?);
        }
        let close = self.bump()?;

        Ok(ClassDecl {
            doc,
            attributes,
            modifiers,
            kind,
            name,
            backing_type,
            extends,
            implements,
            members,
            inner: Some(Body {
                inner: Span::new(open.span.end, close.span.start),
            }),
            origin: Origin::parsed(self.span_from(start, self.docs[start])),
        })
    }

    fn parse_name_list(&mut self) -> AstResult<Vec<String>> {
        let mut names = vec![self.expect_name("class name")?];
        while self.eat(TokenKind::Comma) {
            names.push(self.expect_name("class name")?);
        }
        Ok(names)
    }

    fn parse_modifiers(&mut self) -> AstResult<Modifiers> {
        let mut modifiers = Modifiers::default();
        loop {
            let Some(token) = self.peek() else { break };
            if token.kind != TokenKind::Name {
                break;
            }
            let word = self.text(token).to_ascii_lowercase();
            if let Some(visibility) = Visibility::from_keyword(&word) {
                self.bump()?;
                if self.at(TokenKind::LParen) && self.nth_is_keyword(1, "set") {
                    self.bump()?;
                    self.bump()?;
                    self.expect(TokenKind::RParen, "`)` after `set`")?;
                    modifiers.set_visibility = Some(visibility);
                } else {
                    modifiers.visibility = Some(visibility);
                }
                continue;
            }
            match word.as_str() {
                "static" => modifiers.is_static = true,
                "abstract" => modifiers.is_abstract = true,
                "final" => modifiers.is_final = true,
                "readonly" => modifiers.is_readonly = true,
                "var" => modifiers.is_var = true,
                _ => break,
            }
            self.bump()?;
        }
        Ok(modifiers)
    }

    fn parse_member(&mut self) -> AstResult<Member> {
        let start = self.pos;
        let doc = self.doc_at(start);

        if self.at_keyword("use") || self.at_keyword("case") {
            return self.scan_raw_member(start);
        }

        let attributes = self.parse_attributes();
        let modifiers = self.parse_modifiers()?;

        if self.eat_keyword("const") {
            let type_hint = if self.at(TokenKind::Name) && self.nth_kind(1) == Some(TokenKind::Assign)
            {
                None
            } else {
                Some(self.parse_type()?)
            };
            let mut entries = Vec::new();
            loop {
                let name = self.expect_name("constant name")?;
                self.expect(TokenKind::Assign, "`=` after constant name")?;
                let value = self.parse_expr()?;
                entries.push(ConstEntry { name, value });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Semicolon, "`;` after constant")?;
            return Ok(Member::Constant(ConstantDecl {
                doc,
                attributes,
                modifiers,
                type_hint,
                entries,
                origin: Origin::parsed(self.span_from(start, self.docs[start])),
            }));
        }

        if self.eat_keyword("function") {
            return self.parse_method(start, doc, attributes, modifiers);
        }

        self.parse_property(start, doc, attributes, modifiers)
    }

    fn parse_property(
        &mut self,
        start: usize,
        doc: Option<DocComment>,
        attributes: Vec<String>,
        modifiers: Modifiers,
    ) -> AstResult<Member> {
        let type_hint = if self.at(TokenKind::Variable) {
            None
        } else {
            Some(self.parse_type()?)
        };
        let mut entries = Vec::new();
        loop {
            let variable = self.expect(TokenKind::Variable, "property name")?;
            let name = self.text(variable)[1..].to_string();
            let default = if self.eat(TokenKind::Assign) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            entries.push(PropertyEntry { name, default });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        if self.at(TokenKind::LBrace) {
            // Property hooks
            self.pos = start;
            return self.scan_raw_member(start);
        }
        self.expect(TokenKind::Semicolon, "`;` after property")?;
        Ok(Member::Property(PropertyDecl {
            doc,
            attributes,
            modifiers,
            type_hint,
            entries,
            origin: Origin::parsed(self.span_from(start, self.docs[start])),
        }))
    }

    fn parse_method(
        &mut self,
        start: usize,
        doc: Option<DocComment>,
        attributes: Vec<String>,
        modifiers: Modifiers,
    ) -> AstResult<Member> {
        let by_ref = self.eat(TokenKind::Ampersand);
        let name = self.expect_name("method name")?;
        let params = self.parse_params()?;
        let return_type = if self.eat(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let body = if self.eat(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_block()?)
        };
        Ok(Member::Method(MethodDecl {
            doc,
            attributes,
            modifiers,
            by_ref,
            name,
            params,
            return_type,
            body,
            origin: Origin::parsed(self.span_from(start, self.docs[start])),
        }))
    }

    pub(super) fn parse_block(&mut self) -> AstResult<Block> {
        let open = self.expect(TokenKind::LBrace, "`{` opening the body")?;
        let stmts = self.parse_stmt_list(Scope::Body, true)?;
        let close = self.expect(TokenKind::RBrace, "`}` closing the body")?;
        Ok(Block {
            stmts,
            inner: Some(Body {
                inner: Span::new(open.span.end, close.span.start),
            }),
        })
    }

    fn parse_params(&mut self) -> AstResult<Vec<Param>> {
        self.expect(TokenKind::LParen, "`(` opening the parameter list")?;
        let mut params = Vec::new();
        while !self.at(TokenKind::RParen) {
            let attributes = self.parse_attributes();
            let mut modifiers = Vec::new();
            while ["public", "protected", "private", "readonly"]
                .iter()
                .any(|kw| self.at_keyword(kw))
            {
                let token = self.bump()?;
                modifiers.push(self.text(token).to_ascii_lowercase());
            }
            let type_hint = if matches!(
                self.peek_kind(),
                Some(TokenKind::Variable) | Some(TokenKind::Ampersand) | Some(TokenKind::Ellipsis)
            ) {
                None
            } else {
                Some(self.parse_type()?)
            };
            let by_ref = self.eat(TokenKind::Ampersand);
            let variadic = self.eat(TokenKind::Ellipsis);
            let variable = self.expect(TokenKind::Variable, "parameter name")?;
            let name = self.text(variable)[1..].to_string();
            let default = if self.eat(TokenKind::Assign) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            params.push(Param {
                attributes,
                modifiers,
                type_hint,
                by_ref,
                variadic,
                name,
                default,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "`)` closing the parameter list")?;
        Ok(params)
    }

    /// Type declaration, normalized to its tokens without whitespace
    pub(super) fn parse_type(&mut self) -> AstResult<String> {
        let mut text = String::new();
        let mut saw_name = false;
        // a name or `)` ends the type unless `|` or `&` joins another part
        let mut after_name = false;
        loop {
            let kind = self.peek_kind();
            if after_name
                && !matches!(
                    kind,
                    Some(TokenKind::Pipe) | Some(TokenKind::Ampersand) | Some(TokenKind::RParen)
                )
            {
                break;
            }
            match kind {
                Some(TokenKind::Question) | Some(TokenKind::Pipe) => {}
                Some(TokenKind::LParen) | Some(TokenKind::RParen) => {}
                Some(TokenKind::Name) => saw_name = true,
                Some(TokenKind::Ampersand)
                    if matches!(
                        self.nth_kind(1),
                        Some(TokenKind::Name) | Some(TokenKind::LParen)
                    ) => {}
                _ => break,
            }
            after_name = matches!(kind, Some(TokenKind::Name) | Some(TokenKind::RParen));
            let token = self.bump()?;
            text.push_str(self.text(token));
        }
        if !saw_name {
            return Err(self.error("expected type"));
        }
        Ok(text)
    }

    /// Member kept as text: trait uses, enum cases, hooked properties
    fn scan_raw_member(&mut self, start: usize) -> AstResult<Member> {
        let mut depth = 0usize;
        loop {
            let token = self.bump()?;
            match token.kind {
                TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::AttributeOpen => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
                TokenKind::Semicolon if depth == 0 => break,
                _ => {}
            }
        }
        let span = self.span_from(start, self.docs[start]);
        Ok(Member::Raw(RawCode {
            code: self.code_at(span),
            origin: Origin::parsed(span),
        }))
    }
}
