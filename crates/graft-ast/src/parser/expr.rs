//! Expressions.
//!
//! Only the shapes edits need to see into are modelled: literals, names,
//! arrays, class constants, calls and fetches. Anything else (operators,
//! closures, casts, `match`) becomes [`Expr::Raw`].

use super::Parser;
use crate::error::AstResult;
use crate::lexer::TokenKind;
use crate::syntax::{
    Arg, ArrayItem, ArrayLiteral, ArraySyntax, Body, Call, ClassConstFetch, Expr, Leaf,
    MethodCall, New, Origin, PropertyFetch, RawCode, Span, StaticCall,
};

impl<'s> Parser<'s> {
    pub(super) fn parse_expr(&mut self) -> AstResult<Expr> {
        let start = self.pos;
        if let Some(expr) = self.try_simple_expr() {
            if self.at_expr_end() {
                return Ok(expr);
            }
        }
        self.pos = start;
        self.scan_raw_expr()
    }

    fn at_expr_end(&self) -> bool {
        matches!(
            self.peek_kind(),
            None | Some(TokenKind::Comma)
                | Some(TokenKind::Semicolon)
                | Some(TokenKind::RParen)
                | Some(TokenKind::RBracket)
                | Some(TokenKind::RBrace)
                | Some(TokenKind::FatArrow)
                | Some(TokenKind::CloseTag)
        )
    }

    fn leaf(&self, start: usize) -> Leaf {
        let span = self.span_from(start, None);
        Leaf {
            text: self.slice(span).to_string(),
            origin: Origin::parsed(span),
        }
    }

    /// Structured expression, or `None` (with the cursor anywhere) when the
    /// tokens do not form one of the modelled shapes.
    pub(super) fn try_simple_expr(&mut self) -> Option<Expr> {
        let start = self.pos;
        let mut expr = self.try_primary()?;
        loop {
            match self.peek_kind() {
                Some(TokenKind::DoubleColon) => {
                    let class = match &expr {
                        Expr::Name(leaf) => leaf.text.clone(),
                        _ => return None,
                    };
                    self.pos += 1;
                    let member = self.peek()?;
                    self.pos += 1;
                    expr = match member.kind {
                        TokenKind::Name if self.at(TokenKind::LParen) => {
                            let args = self.try_args()?;
                            Expr::StaticCall(StaticCall {
                                class,
                                method: self.text(member).to_string(),
                                args,
                                origin: Origin::parsed(self.span_from(start, None)),
                            })
                        }
                        TokenKind::Name => Expr::ClassConst(ClassConstFetch {
                            class,
                            constant: self.text(member).to_string(),
                            origin: Origin::parsed(self.span_from(start, None)),
                        }),
                        TokenKind::Variable if !self.at(TokenKind::LParen) => {
                            Expr::PropertyFetch(PropertyFetch {
                                object: Box::new(expr),
                                nullsafe: false,
                                is_static: true,
                                property: self.text(member)[1..].to_string(),
                                origin: Origin::parsed(self.span_from(start, None)),
                            })
                        }
                        _ => return None,
                    };
                }
                Some(kind @ (TokenKind::Arrow | TokenKind::NullsafeArrow)) => {
                    self.pos += 1;
                    let member = self.peek()?;
                    if member.kind != TokenKind::Name {
                        return None;
                    }
                    self.pos += 1;
                    let nullsafe = kind == TokenKind::NullsafeArrow;
                    expr = if self.at(TokenKind::LParen) {
                        let args = self.try_args()?;
                        Expr::MethodCall(MethodCall {
                            object: Box::new(expr),
                            nullsafe,
                            method: self.text(member).to_string(),
                            args,
                            origin: Origin::parsed(self.span_from(start, None)),
                        })
                    } else {
                        Expr::PropertyFetch(PropertyFetch {
                            object: Box::new(expr),
                            nullsafe,
                            is_static: false,
                            property: self.text(member).to_string(),
                            origin: Origin::parsed(self.span_from(start, None)),
                        })
                    };
                }
                Some(TokenKind::LParen) => {
                    let args = self.try_args()?;
                    expr = Expr::Call(Call {
                        callee: Box::new(expr),
                        args,
                        origin: Origin::parsed(self.span_from(start, None)),
                    });
                }
                _ => break,
            }
        }
        Some(expr)
    }

    fn try_primary(&mut self) -> Option<Expr> {
        let start = self.pos;
        let token = self.peek()?;
        match token.kind {
            TokenKind::LBracket => self.try_array(ArraySyntax::Short),
            TokenKind::Name
                if token.is_keyword(self.src, "array")
                    && self.nth_kind(1) == Some(TokenKind::LParen) =>
            {
                self.try_array(ArraySyntax::Long)
            }
            TokenKind::Name if token.is_keyword(self.src, "new") => {
                self.pos += 1;
                let class = self.peek()?;
                if class.kind != TokenKind::Name || class.is_keyword(self.src, "class") {
                    return None;
                }
                self.pos += 1;
                let has_parens = self.at(TokenKind::LParen);
                let args = if has_parens { self.try_args()? } else { Vec::new() };
                Some(Expr::New(New {
                    class: self.text(class).to_string(),
                    args,
                    has_parens,
                    origin: Origin::parsed(self.span_from(start, None)),
                }))
            }
            TokenKind::Name
                if ["fn", "function", "static", "match", "include", "require", "print"]
                    .iter()
                    .any(|kw| token.is_keyword(self.src, kw))
                    && self.nth_kind(1) != Some(TokenKind::DoubleColon) =>
            {
                None
            }
            TokenKind::String | TokenKind::Number | TokenKind::Heredoc => {
                self.pos += 1;
                Some(Expr::Literal(self.leaf(start)))
            }
            TokenKind::Variable => {
                self.pos += 1;
                Some(Expr::Variable(self.leaf(start)))
            }
            TokenKind::Name => {
                self.pos += 1;
                Some(Expr::Name(self.leaf(start)))
            }
            _ => None,
        }
    }

    fn try_array(&mut self, syntax: ArraySyntax) -> Option<Expr> {
        let start = self.pos;
        if syntax == ArraySyntax::Long {
            self.pos += 1;
        }
        let open = self.peek()?;
        self.pos += 1;
        let close_kind = match syntax {
            ArraySyntax::Short => TokenKind::RBracket,
            ArraySyntax::Long => TokenKind::RParen,
        };

        let mut items = Vec::new();
        while !self.at(close_kind) {
            let item_start = self.pos;
            let spread = self.eat(TokenKind::Ellipsis);
            let mut by_ref = self.eat(TokenKind::Ampersand);
            if self.at(TokenKind::Comma) {
                return None;
            }
            let first = self.parse_expr().ok()?;
            let (key, value) = if !spread && !by_ref && self.eat(TokenKind::FatArrow) {
                by_ref = self.eat(TokenKind::Ampersand);
                (Some(first), self.parse_expr().ok()?)
            } else {
                (None, first)
            };
            items.push(ArrayItem {
                key,
                value,
                by_ref,
                spread,
                origin: Origin::parsed(self.span_from(item_start, None)),
            });
            if !self.eat(TokenKind::Comma) && !self.at(close_kind) {
                return None;
            }
        }
        let close = self.peek()?;
        self.pos += 1;

        Some(Expr::Array(ArrayLiteral {
            syntax,
            items,
            inner: Some(Body {
                inner: Span::new(open.span.end, close.span.start),
            }),
            origin: Origin::parsed(self.span_from(start, None)),
        }))
    }

    fn try_args(&mut self) -> Option<Vec<Arg>> {
        self.pos += 1;
        let mut args = Vec::new();
        while !self.at(TokenKind::RParen) {
            let arg_start = self.pos;
            let spread = self.eat(TokenKind::Ellipsis);
            if spread && self.at(TokenKind::RParen) {
                // First-class callable syntax `foo(...)`
                return None;
            }
            let name = if self.at(TokenKind::Name) && self.nth_kind(1) == Some(TokenKind::Colon) {
                let label = self.peek()?;
                self.pos += 2;
                Some(self.text(label).to_string())
            } else {
                None
            };
            let value = self.parse_expr().ok()?;
            args.push(Arg {
                spread,
                name,
                value,
                origin: Origin::parsed(self.span_from(arg_start, None)),
            });
            if !self.eat(TokenKind::Comma) && !self.at(TokenKind::RParen) {
                return None;
            }
        }
        self.pos += 1;
        Some(args)
    }

    /// Opaque expression up to the next terminator at depth zero
    fn scan_raw_expr(&mut self) -> AstResult<Expr> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut pending_arrow_fns = 0usize;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::AttributeOpen => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                TokenKind::Comma | TokenKind::Semicolon | TokenKind::CloseTag if depth == 0 => {
                    break
                }
                TokenKind::FatArrow if depth == 0 => {
                    if pending_arrow_fns == 0 {
                        break;
                    }
                    pending_arrow_fns -= 1;
                }
                TokenKind::Name if depth == 0 && token.is_keyword(self.src, "fn") => {
                    pending_arrow_fns += 1;
                }
                _ => {}
            }
            self.pos += 1;
        }
        if depth > 0 {
            return Err(self.error("unexpected end of file inside expression"));
        }
        if self.pos == start {
            return Err(self.error("expected expression"));
        }
        let span = self.span_from(start, None);
        Ok(Expr::Raw(RawCode {
            code: self.code_at(span),
            origin: Origin::parsed(span),
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse;
    use crate::syntax::{ArraySyntax, Expr, Stmt};

    fn returned(source: &str) -> Expr {
        let file = parse(source).unwrap();
        match file.stmts.into_iter().next() {
            Some(Stmt::Return(ret)) => ret.value.unwrap(),
            other => panic!("expected return, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_array_literal() {
        let expr = returned("<?php return ['components' => ['cache' => Cache::class], 'x' => [1, 2]];");
        let array = expr.as_array().unwrap();
        assert_eq!(array.items.len(), 2);
        let inner = array.items[0].value.as_array().unwrap();
        match &inner.items[0].value {
            Expr::ClassConst(fetch) => {
                assert_eq!(fetch.class, "Cache");
                assert_eq!(fetch.constant, "class");
            }
            other => panic!("expected class constant, got {other:?}"),
        }
    }

    #[test]
    fn test_long_array_syntax() {
        let expr = returned("<?php return array('a' => 1,);");
        let array = expr.as_array().unwrap();
        assert_eq!(array.syntax, ArraySyntax::Long);
        assert_eq!(array.items.len(), 1);
    }

    #[test]
    fn test_method_call_is_not_an_array() {
        let expr = returned("<?php return $this->buildConfig();");
        assert!(matches!(expr, Expr::MethodCall(_)));
    }

    #[test]
    fn test_operators_become_raw() {
        let expr = returned("<?php return $a + foo(1, [2]) ?: 'x';");
        match expr {
            Expr::Raw(raw) => assert_eq!(raw.code, "$a + foo(1, [2]) ?: 'x'"),
            other => panic!("expected raw, got {other:?}"),
        }
    }

    #[test]
    fn test_arrow_function_item_value() {
        let expr = returned("<?php return ['cb' => fn($x) => $x * 2, 'y' => 1];");
        let array = expr.as_array().unwrap();
        assert_eq!(array.items.len(), 2);
        assert!(matches!(array.items[0].value, Expr::Raw(_)));
    }

    #[test]
    fn test_static_property_chain() {
        let expr = returned("<?php return Craft::$app->getConfig();");
        match expr {
            Expr::MethodCall(call) => {
                assert_eq!(call.method, "getConfig");
                assert!(matches!(*call.object, Expr::PropertyFetch(ref p) if p.is_static));
            }
            other => panic!("expected method call, got {other:?}"),
        }
    }
}
