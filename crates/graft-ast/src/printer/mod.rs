//! Serialization of syntax trees.
//!
//! A pristine node is reproduced from the original text, with its children
//! spliced in between the original gaps; any node that is generated or was
//! touched goes through the generic printer. The result for an unmodified
//! tree is the original file, byte for byte.

pub mod layout;

use crate::syntax::{
    Arg, ArrayItem, ArrayLiteral, ArraySyntax, ClassDecl, DocComment, Expr, Member, Modifiers,
    Origin, Param, SourceFile, Span, Stmt, UseDecl, UseKind,
};
use layout::{
    content_end, leading_comma, line_indent, reindent, trailing_comment_end, IndentStyle,
};

/// Indent width for files whose style cannot be detected
pub const DEFAULT_INDENT_WIDTH: usize = 4;

/// Arrays rendered on one line up to this width
const SINGLE_LINE_ARRAY_WIDTH: usize = 100;

/// Print `file`, preserving every untouched byte of its source
pub fn print(file: &SourceFile, default_indent: usize) -> String {
    let mut printer = Printer {
        src: file.source(),
        style: IndentStyle::detect(file.source(), default_indent),
        out: String::with_capacity(file.source().len() + 256),
    };
    printer.file(file);
    printer.out
}

/// Generic rendering of an expression, ignoring any original formatting
pub fn expr_to_code(expr: &Expr) -> String {
    let mut printer = Printer::detached();
    printer.generic_expr(expr, "");
    printer.out
}

pub fn stmt_to_code(stmt: &Stmt) -> String {
    let mut printer = Printer::detached();
    printer.generic_stmt(stmt, "");
    printer.out
}

impl SourceFile {
    pub fn render(&self) -> String {
        print(self, DEFAULT_INDENT_WIDTH)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    TopLevel,
    Members,
    Body,
}

impl ListKind {
    /// Line breaks before a node inserted after `prev`
    fn breaks(self, prev: Option<bool>, next_is_use: bool) -> usize {
        match self {
            ListKind::Body => 1,
            ListKind::Members => {
                if prev.is_none() {
                    1
                } else {
                    2
                }
            }
            ListKind::TopLevel => match prev {
                Some(true) if next_is_use => 1,
                _ => 2,
            },
        }
    }
}

trait ListNode {
    fn origin(&self) -> Origin;
    fn is_use(&self) -> bool;
    fn print(&self, printer: &mut Printer<'_>, indent: &str);
}

impl ListNode for Stmt {
    fn origin(&self) -> Origin {
        Stmt::origin(self)
    }

    fn is_use(&self) -> bool {
        matches!(self, Stmt::Use(_))
    }

    fn print(&self, printer: &mut Printer<'_>, indent: &str) {
        printer.stmt(self, indent);
    }
}

impl ListNode for Member {
    fn origin(&self) -> Origin {
        Member::origin(self)
    }

    fn is_use(&self) -> bool {
        false
    }

    fn print(&self, printer: &mut Printer<'_>, indent: &str) {
        printer.member(self, indent);
    }
}

struct Printer<'s> {
    src: &'s str,
    style: IndentStyle,
    out: String,
}

impl<'s> Printer<'s> {
    fn detached() -> Self {
        Self {
            src: "",
            style: IndentStyle::spaces(DEFAULT_INDENT_WIDTH),
            out: String::new(),
        }
    }

    fn preserved_span(&self, origin: Origin) -> Option<Span> {
        origin
            .span()
            .filter(|span| origin.is_pristine() && span.end <= self.src.len())
    }

    fn copy(&mut self, cursor: &mut usize, to: usize) {
        if to > *cursor {
            self.out.push_str(&self.src[*cursor..to]);
            *cursor = to;
        }
    }

    fn indent_at(&self, offset: usize) -> String {
        line_indent(self.src, offset).to_string()
    }

    /// Text kept as written, moved to `indent` with the file's line ending
    fn raw(&mut self, code: &str, indent: &str) {
        let text = reindent(code, indent, self.style.newline());
        self.out.push_str(&text);
    }

    fn newlines(&mut self, count: usize, indent: &str) {
        for _ in 0..count {
            self.out.push_str(self.style.newline());
        }
        self.out.push_str(indent);
    }

    fn file(&mut self, file: &SourceFile) {
        if file.is_generated() {
            self.out.push_str("<?php");
            let mut prev = None;
            for stmt in &file.stmts {
                self.newlines(ListKind::TopLevel.breaks(prev, stmt.is_use()), "");
                self.generic_stmt(stmt, "");
                prev = Some(stmt.is_use());
            }
            self.out.push_str(self.style.newline());
            return;
        }
        let mut cursor = 0;
        self.splice_list(&mut cursor, file.body.inner, &file.stmts, ListKind::TopLevel, false);
        self.copy(&mut cursor, self.src.len());
    }

    /// Statements or members between the delimiters of `inner`, with
    /// generated entries placed next to their original neighbours.
    fn splice_list<T: ListNode>(
        &mut self,
        cursor: &mut usize,
        inner: Span,
        items: &[T],
        kind: ListKind,
        nested: bool,
    ) {
        let child_indent = match items.iter().find_map(|item| item.origin().span()) {
            Some(span) => self.indent_at(span.start),
            None if nested => self.style.nested(line_indent(self.src, inner.start)),
            None => String::new(),
        };

        let mut prev: Option<bool> = None;
        let mut pending: Vec<&T> = Vec::new();
        let mut seen_original = false;
        for item in items {
            let Some(span) = item.origin().span() else {
                pending.push(item);
                continue;
            };
            if !pending.is_empty() {
                if !seen_original {
                    self.copy(cursor, inner.start);
                }
                for new in pending.drain(..) {
                    self.newlines(kind.breaks(prev, new.is_use()), &child_indent);
                    new.print(self, &child_indent);
                    prev = Some(new.is_use());
                }
            }
            self.copy(cursor, span.start);
            let indent = self.indent_at(span.start);
            item.print(self, &indent);
            *cursor = span.end;
            prev = Some(item.is_use());
            seen_original = true;
        }

        if !pending.is_empty() {
            let insert_at = content_end(self.src, inner).max(*cursor);
            self.copy(cursor, insert_at);
            for new in pending {
                self.newlines(kind.breaks(prev, new.is_use()), &child_indent);
                new.print(self, &child_indent);
                prev = Some(new.is_use());
            }
            if nested && !self.src[*cursor..inner.end].contains('\n') {
                let closing_indent = self.indent_at(inner.start);
                self.newlines(1, &closing_indent);
                *cursor = inner.end;
            }
        }
    }

    fn slot_expr(&mut self, cursor: &mut usize, expr: &Expr) {
        match expr.origin().span() {
            Some(span) => {
                self.copy(cursor, span.start);
                let indent = self.indent_at(span.start);
                self.expr(expr, &indent);
                *cursor = span.end;
            }
            None => {
                let indent = self.indent_at(*cursor);
                self.expr(expr, &indent);
            }
        }
    }

    fn doc(&mut self, doc: &DocComment, indent: &str) {
        match self.preserved_span(doc.origin) {
            Some(span) => self.out.push_str(&self.src[span.start..span.end]),
            None => self.raw(doc.text(), indent),
        }
    }

    /// Doc comment of a preserved declaration; a new one goes in front of it
    fn doc_slot(&mut self, cursor: &mut usize, doc: Option<&DocComment>, indent: &str) {
        let Some(doc) = doc else { return };
        match doc.origin.span() {
            Some(span) => {
                self.copy(cursor, span.start);
                self.doc(doc, indent);
                *cursor = span.end;
            }
            None => {
                self.doc(doc, indent);
                self.newlines(1, indent);
            }
        }
    }

    // Statements

    fn stmt(&mut self, stmt: &Stmt, indent: &str) {
        let Some(span) = self.preserved_span(stmt.origin()) else {
            self.generic_stmt(stmt, indent);
            return;
        };
        let mut cursor = span.start;
        match stmt {
            Stmt::Namespace(ns) => {
                if let Some(body) = ns.inner {
                    self.splice_list(&mut cursor, body.inner, &ns.body, ListKind::TopLevel, ns.braced);
                }
            }
            Stmt::Class(class) => self.preserved_class(&mut cursor, class, span),
            Stmt::Return(ret) => {
                if let Some(value) = &ret.value {
                    self.slot_expr(&mut cursor, value);
                }
            }
            Stmt::Expr(stmt) => self.slot_expr(&mut cursor, &stmt.expr),
            Stmt::Use(_) | Stmt::Raw(_) => {}
        }
        self.copy(&mut cursor, span.end);
    }

    fn preserved_class(&mut self, cursor: &mut usize, class: &ClassDecl, span: Span) {
        let indent = self.indent_at(span.start);
        self.doc_slot(cursor, class.doc.as_ref(), &indent);
        if let Some(body) = class.inner {
            self.splice_list(cursor, body.inner, &class.members, ListKind::Members, true);
        }
    }

    fn generic_stmt(&mut self, stmt: &Stmt, indent: &str) {
        match stmt {
            Stmt::Namespace(ns) => {
                self.out.push_str("namespace");
                if let Some(name) = &ns.name {
                    self.out.push(' ');
                    self.out.push_str(name);
                }
                let body_indent = if ns.braced {
                    self.out.push_str(" {");
                    self.style.nested(indent)
                } else {
                    self.out.push(';');
                    indent.to_string()
                };
                let mut prev = None;
                for stmt in &ns.body {
                    let breaks = if ns.braced && prev.is_none() {
                        1
                    } else {
                        ListKind::TopLevel.breaks(prev, stmt.is_use())
                    };
                    self.newlines(breaks, &body_indent);
                    self.stmt(stmt, &body_indent);
                    prev = Some(stmt.is_use());
                }
                if ns.braced {
                    self.newlines(1, indent);
                    self.out.push('}');
                }
            }
            Stmt::Use(decl) => self.generic_use(decl),
            Stmt::Class(class) => self.generic_class(class, indent),
            Stmt::Return(ret) => {
                self.out.push_str("return");
                if let Some(value) = &ret.value {
                    self.out.push(' ');
                    self.expr(value, indent);
                }
                self.out.push(';');
            }
            Stmt::Expr(stmt) => {
                self.expr(&stmt.expr, indent);
                self.out.push(';');
            }
            Stmt::Raw(raw) => self.raw(&raw.code, indent),
        }
    }

    fn generic_use(&mut self, decl: &UseDecl) {
        fn kind_prefix(kind: UseKind) -> &'static str {
            match kind {
                UseKind::Class => "",
                UseKind::Function => "function ",
                UseKind::Const => "const ",
            }
        }

        let items: Vec<String> = decl
            .items
            .iter()
            .map(|item| {
                let mut text = item.kind.map(kind_prefix).unwrap_or_default().to_string();
                text.push_str(&item.name);
                if let Some(alias) = &item.alias {
                    text.push_str(" as ");
                    text.push_str(alias);
                }
                text
            })
            .collect();

        self.out.push_str("use ");
        self.out.push_str(kind_prefix(decl.kind));
        match &decl.group_prefix {
            Some(prefix) => {
                self.out.push_str(prefix);
                self.out.push_str("\\{");
                self.out.push_str(&items.join(", "));
                self.out.push('}');
            }
            None => self.out.push_str(&items.join(", ")),
        }
        self.out.push(';');
    }

    fn generic_class(&mut self, class: &ClassDecl, indent: &str) {
        if let Some(doc) = &class.doc {
            self.doc(doc, indent);
            self.newlines(1, indent);
        }
        for attribute in &class.attributes {
            self.out.push_str(attribute);
            self.newlines(1, indent);
        }
        for modifier in &class.modifiers {
            self.out.push_str(modifier);
            self.out.push(' ');
        }
        self.out.push_str(class.kind.keyword());
        self.out.push(' ');
        self.out.push_str(&class.name);
        if let Some(backing) = &class.backing_type {
            self.out.push_str(": ");
            self.out.push_str(backing);
        }
        if !class.extends.is_empty() {
            self.out.push_str(" extends ");
            self.out.push_str(&class.extends.join(", "));
        }
        if !class.implements.is_empty() {
            self.out.push_str(" implements ");
            self.out.push_str(&class.implements.join(", "));
        }
        self.newlines(1, indent);
        self.out.push('{');

        let member_indent = self.style.nested(indent);
        for (index, member) in class.members.iter().enumerate() {
            self.newlines(if index == 0 { 1 } else { 2 }, &member_indent);
            self.member(member, &member_indent);
        }
        self.newlines(1, indent);
        self.out.push('}');
    }

    // Members

    fn member(&mut self, member: &Member, indent: &str) {
        let Some(span) = self.preserved_span(member.origin()) else {
            self.generic_member(member, indent);
            return;
        };
        let mut cursor = span.start;
        let decl_indent = self.indent_at(span.start);
        match member {
            Member::Constant(constant) => {
                self.doc_slot(&mut cursor, constant.doc.as_ref(), &decl_indent);
                for entry in &constant.entries {
                    self.slot_expr(&mut cursor, &entry.value);
                }
            }
            Member::Property(property) => {
                self.doc_slot(&mut cursor, property.doc.as_ref(), &decl_indent);
                for default in property.entries.iter().filter_map(|e| e.default.as_ref()) {
                    self.slot_expr(&mut cursor, default);
                }
            }
            Member::Method(method) => {
                self.doc_slot(&mut cursor, method.doc.as_ref(), &decl_indent);
                if let Some(inner) = method.body.as_ref().and_then(|b| b.inner.map(|i| (b, i))) {
                    let (block, body) = inner;
                    self.splice_list(&mut cursor, body.inner, &block.stmts, ListKind::Body, true);
                }
            }
            Member::Raw(_) => {}
        }
        self.copy(&mut cursor, span.end);
    }

    fn decl_prelude(&mut self, doc: Option<&DocComment>, attributes: &[String], indent: &str) {
        if let Some(doc) = doc {
            self.doc(doc, indent);
            self.newlines(1, indent);
        }
        for attribute in attributes {
            self.out.push_str(attribute);
            self.newlines(1, indent);
        }
    }

    fn modifiers(&mut self, modifiers: &Modifiers) {
        if modifiers.is_abstract {
            self.out.push_str("abstract ");
        }
        if modifiers.is_final {
            self.out.push_str("final ");
        }
        match modifiers.visibility {
            Some(visibility) => {
                self.out.push_str(visibility.keyword());
                self.out.push(' ');
            }
            None if modifiers.is_var => self.out.push_str("var "),
            None => {}
        }
        if let Some(visibility) = modifiers.set_visibility {
            self.out.push_str(visibility.keyword());
            self.out.push_str("(set) ");
        }
        if modifiers.is_static {
            self.out.push_str("static ");
        }
        if modifiers.is_readonly {
            self.out.push_str("readonly ");
        }
    }

    fn generic_member(&mut self, member: &Member, indent: &str) {
        match member {
            Member::Constant(constant) => {
                self.decl_prelude(constant.doc.as_ref(), &constant.attributes, indent);
                self.modifiers(&constant.modifiers);
                self.out.push_str("const ");
                if let Some(type_hint) = &constant.type_hint {
                    self.out.push_str(type_hint);
                    self.out.push(' ');
                }
                for (index, entry) in constant.entries.iter().enumerate() {
                    if index > 0 {
                        self.out.push_str(", ");
                    }
                    self.out.push_str(&entry.name);
                    self.out.push_str(" = ");
                    self.expr(&entry.value, indent);
                }
                self.out.push(';');
            }
            Member::Property(property) => {
                self.decl_prelude(property.doc.as_ref(), &property.attributes, indent);
                self.modifiers(&property.modifiers);
                if let Some(type_hint) = &property.type_hint {
                    self.out.push_str(type_hint);
                    self.out.push(' ');
                }
                for (index, entry) in property.entries.iter().enumerate() {
                    if index > 0 {
                        self.out.push_str(", ");
                    }
                    self.out.push('$');
                    self.out.push_str(&entry.name);
                    if let Some(default) = &entry.default {
                        self.out.push_str(" = ");
                        self.expr(default, indent);
                    }
                }
                self.out.push(';');
            }
            Member::Method(method) => {
                self.decl_prelude(method.doc.as_ref(), &method.attributes, indent);
                self.modifiers(&method.modifiers);
                self.out.push_str("function ");
                if method.by_ref {
                    self.out.push('&');
                }
                self.out.push_str(&method.name);
                self.out.push('(');
                for (index, param) in method.params.iter().enumerate() {
                    if index > 0 {
                        self.out.push_str(", ");
                    }
                    self.param(param, indent);
                }
                self.out.push(')');
                if let Some(return_type) = &method.return_type {
                    self.out.push_str(": ");
                    self.out.push_str(return_type);
                }
                match &method.body {
                    None => self.out.push(';'),
                    Some(block) => {
                        self.newlines(1, indent);
                        self.out.push('{');
                        let body_indent = self.style.nested(indent);
                        for stmt in &block.stmts {
                            self.newlines(1, &body_indent);
                            self.stmt(stmt, &body_indent);
                        }
                        self.newlines(1, indent);
                        self.out.push('}');
                    }
                }
            }
            Member::Raw(raw) => self.raw(&raw.code, indent),
        }
    }

    fn param(&mut self, param: &Param, indent: &str) {
        for attribute in &param.attributes {
            self.out.push_str(attribute);
            self.out.push(' ');
        }
        for modifier in &param.modifiers {
            self.out.push_str(modifier);
            self.out.push(' ');
        }
        if let Some(type_hint) = &param.type_hint {
            self.out.push_str(type_hint);
            self.out.push(' ');
        }
        if param.by_ref {
            self.out.push('&');
        }
        if param.variadic {
            self.out.push_str("...");
        }
        self.out.push('$');
        self.out.push_str(&param.name);
        if let Some(default) = &param.default {
            self.out.push_str(" = ");
            self.expr(default, indent);
        }
    }

    // Expressions

    fn expr(&mut self, expr: &Expr, indent: &str) {
        let Some(span) = self.preserved_span(expr.origin()) else {
            self.generic_expr(expr, indent);
            return;
        };
        let mut cursor = span.start;
        match expr {
            Expr::Array(array) => {
                if let Some(body) = array.inner {
                    self.splice_array(&mut cursor, array, body.inner);
                }
            }
            Expr::Call(call) => {
                self.slot_expr(&mut cursor, &call.callee);
                self.arg_slots(&mut cursor, &call.args);
            }
            Expr::StaticCall(call) => self.arg_slots(&mut cursor, &call.args),
            Expr::MethodCall(call) => {
                self.slot_expr(&mut cursor, &call.object);
                self.arg_slots(&mut cursor, &call.args);
            }
            Expr::PropertyFetch(fetch) => self.slot_expr(&mut cursor, &fetch.object),
            Expr::New(new) => self.arg_slots(&mut cursor, &new.args),
            Expr::Literal(_)
            | Expr::Variable(_)
            | Expr::Name(_)
            | Expr::ClassConst(_)
            | Expr::Raw(_) => {}
        }
        self.copy(&mut cursor, span.end);
    }

    fn arg_slots(&mut self, cursor: &mut usize, args: &[Arg]) {
        for arg in args {
            self.slot_expr(cursor, &arg.value);
        }
    }

    /// Array items with appended entries laid out like their neighbours:
    /// one per line in multi-line arrays, mirroring the trailing comma.
    fn splice_array(&mut self, cursor: &mut usize, array: &ArrayLiteral, inner: Span) {
        let multiline = self.src[inner.start..inner.end].contains('\n');
        let item_indent = match array.items.iter().find_map(|item| item.origin.span()) {
            Some(span) => self.indent_at(span.start),
            None => self.style.nested(line_indent(self.src, inner.start)),
        };
        let trailing_comma = array
            .items
            .iter()
            .filter_map(|item| item.origin.span())
            .last()
            .and_then(|last| leading_comma(self.src, Span::new(last.end, inner.end)));

        let mut pending: Vec<&ArrayItem> = Vec::new();
        let mut seen_original = false;
        for item in &array.items {
            let Some(span) = item.origin.span() else {
                pending.push(item);
                continue;
            };
            if !pending.is_empty() {
                if !seen_original {
                    self.copy(cursor, inner.start);
                }
                for new in pending.drain(..) {
                    if seen_original {
                        self.out.push(',');
                        self.item_break(multiline, &item_indent);
                        self.array_item(new, &item_indent);
                    } else {
                        if multiline {
                            self.newlines(1, &item_indent);
                        }
                        self.array_item(new, &item_indent);
                        self.out.push(',');
                        if !multiline {
                            self.out.push(' ');
                        }
                    }
                }
            }
            self.copy(cursor, span.start);
            let indent = self.indent_at(span.start);
            self.array_item(item, &indent);
            *cursor = span.end;
            seen_original = true;
        }

        if pending.is_empty() {
            return;
        }
        if seen_original {
            match trailing_comma {
                Some(comma) => self.copy(cursor, comma + 1),
                None => self.out.push(','),
            }
            if multiline {
                let comment_end = trailing_comment_end(self.src, *cursor, inner.end);
                self.copy(cursor, comment_end);
            }
            for (index, new) in pending.into_iter().enumerate() {
                if index > 0 {
                    self.out.push(',');
                }
                self.item_break(multiline, &item_indent);
                self.array_item(new, &item_indent);
            }
            if trailing_comma.is_some() {
                self.out.push(',');
            }
        } else if multiline {
            let insert_at = content_end(self.src, inner);
            self.copy(cursor, insert_at);
            for new in pending {
                self.newlines(1, &item_indent);
                self.array_item(new, &item_indent);
                self.out.push(',');
            }
        } else {
            if self.src[inner.start..inner.end].trim().is_empty() {
                self.copy(cursor, inner.start);
                *cursor = inner.end;
            } else {
                let insert_at = content_end(self.src, inner);
                self.copy(cursor, insert_at);
                self.out.push(' ');
            }
            for (index, new) in pending.into_iter().enumerate() {
                if index > 0 {
                    self.out.push_str(", ");
                }
                self.array_item(new, &item_indent);
            }
        }
    }

    fn item_break(&mut self, multiline: bool, indent: &str) {
        if multiline {
            self.newlines(1, indent);
        } else {
            self.out.push(' ');
        }
    }

    fn array_item(&mut self, item: &ArrayItem, indent: &str) {
        if let Some(span) = self.preserved_span(item.origin) {
            let mut cursor = span.start;
            if let Some(key) = &item.key {
                self.slot_expr(&mut cursor, key);
            }
            self.slot_expr(&mut cursor, &item.value);
            self.copy(&mut cursor, span.end);
            return;
        }
        if item.spread {
            self.out.push_str("...");
        }
        if let Some(key) = &item.key {
            self.expr(key, indent);
            self.out.push_str(" => ");
        }
        if item.by_ref {
            self.out.push('&');
        }
        self.expr(&item.value, indent);
    }

    fn generic_args(&mut self, args: &[Arg], indent: &str) {
        self.out.push('(');
        for (index, arg) in args.iter().enumerate() {
            if index > 0 {
                self.out.push_str(", ");
            }
            if let Some(name) = &arg.name {
                self.out.push_str(name);
                self.out.push_str(": ");
            }
            if arg.spread {
                self.out.push_str("...");
            }
            self.expr(&arg.value, indent);
        }
        self.out.push(')');
    }

    fn generic_expr(&mut self, expr: &Expr, indent: &str) {
        match expr {
            Expr::Literal(leaf) | Expr::Variable(leaf) | Expr::Name(leaf) => {
                self.out.push_str(&leaf.text)
            }
            Expr::Array(array) => self.generic_array(array, indent),
            Expr::ClassConst(fetch) => {
                self.out.push_str(&fetch.class);
                self.out.push_str("::");
                self.out.push_str(&fetch.constant);
            }
            Expr::Call(call) => {
                self.expr(&call.callee, indent);
                self.generic_args(&call.args, indent);
            }
            Expr::StaticCall(call) => {
                self.out.push_str(&call.class);
                self.out.push_str("::");
                self.out.push_str(&call.method);
                self.generic_args(&call.args, indent);
            }
            Expr::MethodCall(call) => {
                self.expr(&call.object, indent);
                self.out.push_str(if call.nullsafe { "?->" } else { "->" });
                self.out.push_str(&call.method);
                self.generic_args(&call.args, indent);
            }
            Expr::PropertyFetch(fetch) => {
                self.expr(&fetch.object, indent);
                self.out.push_str(if fetch.is_static {
                    "::$"
                } else if fetch.nullsafe {
                    "?->"
                } else {
                    "->"
                });
                self.out.push_str(&fetch.property);
            }
            Expr::New(new) => {
                self.out.push_str("new ");
                self.out.push_str(&new.class);
                if new.has_parens || !new.args.is_empty() {
                    self.generic_args(&new.args, indent);
                }
            }
            Expr::Raw(raw) => self.raw(&raw.code, indent),
        }
    }

    fn generic_array(&mut self, array: &ArrayLiteral, indent: &str) {
        let (open, close) = match array.syntax {
            ArraySyntax::Short => ("[", "]"),
            ArraySyntax::Long => ("array(", ")"),
        };
        if array.items.is_empty() {
            self.out.push_str(open);
            self.out.push_str(close);
            return;
        }

        let item_indent = self.style.nested(indent);
        let saved = std::mem::take(&mut self.out);
        let pieces: Vec<String> = array
            .items
            .iter()
            .map(|item| {
                self.array_item(item, &item_indent);
                std::mem::take(&mut self.out)
            })
            .collect();
        self.out = saved;

        let has_keyed_nested = array.items.iter().any(|item| {
            item.value
                .as_array()
                .is_some_and(|nested| nested.items.iter().any(|i| i.key.is_some()))
        });
        let width: usize = pieces.iter().map(|p| p.len() + 2).sum::<usize>() + indent.len();
        let multiline = has_keyed_nested
            || width > SINGLE_LINE_ARRAY_WIDTH
            || pieces.iter().any(|p| p.contains('\n'));

        self.out.push_str(open);
        if multiline {
            for piece in &pieces {
                self.newlines(1, &item_indent);
                self.out.push_str(piece);
                self.out.push(',');
            }
            self.newlines(1, indent);
        } else {
            self.out.push_str(&pieces.join(", "));
        }
        self.out.push_str(close);
    }
}
