//! Depth-first traversal with early stop.
//!
//! - `enter` runs pre-order and `leave` post-order, children in source order
//! - [`Action::SkipChildren`] from `enter` skips the subtree; `leave` still runs
//! - [`Action::Stop`] ends the traversal; nothing after that point is visited
//! - [`Action::Replace`] swaps the node in its parent's slot; the replacement
//!   is not visited

use crate::error::{AstError, AstResult};
use crate::syntax::{Expr, Member, Origin, SourceFile, Stmt};
use tracing::trace;

/// Mutable view of a visited node
#[derive(Debug)]
pub enum NodeMut<'a> {
    Stmt(&'a mut Stmt),
    Member(&'a mut Member),
    Expr(&'a mut Expr),
}

/// Owned node used as a replacement
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Stmt(Stmt),
    Member(Member),
    Expr(Expr),
}

impl Node {
    fn kind(&self) -> &'static str {
        match self {
            Node::Stmt(_) => "statement",
            Node::Member(_) => "member",
            Node::Expr(_) => "expression",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Continue,
    Replace(Node),
    SkipChildren,
    Stop,
}

pub trait Visitor {
    fn enter(&mut self, node: NodeMut<'_>) -> Action;

    fn leave(&mut self, _node: NodeMut<'_>) -> Action {
        Action::Continue
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalReport {
    /// Whether a visitor returned [`Action::Stop`]
    pub stopped: bool,
    /// Nodes passed to `enter`
    pub entered: usize,
    pub replaced: usize,
}

/// Walk every statement, member and expression of `file`
pub fn traverse<V: Visitor + ?Sized>(
    file: &mut SourceFile,
    visitor: &mut V,
) -> AstResult<TraversalReport> {
    traverse_stmts(&mut file.stmts, visitor)
}

/// Walk a statement list, e.g. a method body
pub fn traverse_stmts<V: Visitor + ?Sized>(
    stmts: &mut [Stmt],
    visitor: &mut V,
) -> AstResult<TraversalReport> {
    let mut walker = Walker {
        visitor,
        report: TraversalReport::default(),
    };
    let flow = walker.stmts(stmts)?;
    walker.report.stopped = flow == Flow::Stop;
    trace!(
        entered = walker.report.entered,
        replaced = walker.report.replaced,
        stopped = walker.report.stopped,
        "Traversal finished"
    );
    Ok(walker.report)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

struct Walker<'v, V: ?Sized> {
    visitor: &'v mut V,
    report: TraversalReport,
}

/// Slot replacement keeping the original position of the node
trait Slot: Sized {
    fn origin(&self) -> Origin;
    fn origin_mut(&mut self) -> &mut Origin;
    fn from_node(node: Node) -> Result<Self, Node>;
}

impl Slot for Stmt {
    fn origin(&self) -> Origin {
        Stmt::origin(self)
    }
    fn origin_mut(&mut self) -> &mut Origin {
        Stmt::origin_mut(self)
    }
    fn from_node(node: Node) -> Result<Self, Node> {
        match node {
            Node::Stmt(stmt) => Ok(stmt),
            other => Err(other),
        }
    }
}

impl Slot for Member {
    fn origin(&self) -> Origin {
        Member::origin(self)
    }
    fn origin_mut(&mut self) -> &mut Origin {
        Member::origin_mut(self)
    }
    fn from_node(node: Node) -> Result<Self, Node> {
        match node {
            Node::Member(member) => Ok(member),
            other => Err(other),
        }
    }
}

impl Slot for Expr {
    fn origin(&self) -> Origin {
        Expr::origin(self)
    }
    fn origin_mut(&mut self) -> &mut Origin {
        Expr::origin_mut(self)
    }
    fn from_node(node: Node) -> Result<Self, Node> {
        match node {
            Node::Expr(expr) => Ok(expr),
            other => Err(other),
        }
    }
}

fn replace<T: Slot>(slot: &mut T, node: Node, expected: &'static str) -> AstResult<()> {
    let mut replacement = T::from_node(node).map_err(|node| {
        AstError::transformation(format!(
            "cannot replace a {} with a {}",
            expected,
            node.kind()
        ))
    })?;
    *replacement.origin_mut() = Origin::replacing(slot.origin());
    *slot = replacement;
    Ok(())
}

impl<V: Visitor + ?Sized> Walker<'_, V> {
    fn stmts(&mut self, stmts: &mut [Stmt]) -> AstResult<Flow> {
        for stmt in stmts {
            if self.stmt(stmt)? == Flow::Stop {
                return Ok(Flow::Stop);
            }
        }
        Ok(Flow::Continue)
    }

    fn stmt(&mut self, stmt: &mut Stmt) -> AstResult<Flow> {
        self.report.entered += 1;
        match self.visitor.enter(NodeMut::Stmt(stmt)) {
            Action::Continue => {
                if self.stmt_children(stmt)? == Flow::Stop {
                    return Ok(Flow::Stop);
                }
            }
            Action::SkipChildren => {}
            Action::Stop => return Ok(Flow::Stop),
            Action::Replace(node) => {
                replace(stmt, node, "statement")?;
                self.report.replaced += 1;
                return Ok(Flow::Continue);
            }
        }
        match self.visitor.leave(NodeMut::Stmt(stmt)) {
            Action::Stop => Ok(Flow::Stop),
            Action::Replace(node) => {
                replace(stmt, node, "statement")?;
                self.report.replaced += 1;
                Ok(Flow::Continue)
            }
            Action::Continue | Action::SkipChildren => Ok(Flow::Continue),
        }
    }

    fn stmt_children(&mut self, stmt: &mut Stmt) -> AstResult<Flow> {
        match stmt {
            Stmt::Namespace(ns) => self.stmts(&mut ns.body),
            Stmt::Class(class) => {
                for member in &mut class.members {
                    if self.member(member)? == Flow::Stop {
                        return Ok(Flow::Stop);
                    }
                }
                Ok(Flow::Continue)
            }
            Stmt::Return(ret) => match &mut ret.value {
                Some(value) => self.expr(value),
                None => Ok(Flow::Continue),
            },
            Stmt::Expr(stmt) => self.expr(&mut stmt.expr),
            Stmt::Use(_) | Stmt::Raw(_) => Ok(Flow::Continue),
        }
    }

    fn member(&mut self, member: &mut Member) -> AstResult<Flow> {
        self.report.entered += 1;
        match self.visitor.enter(NodeMut::Member(member)) {
            Action::Continue => {
                if self.member_children(member)? == Flow::Stop {
                    return Ok(Flow::Stop);
                }
            }
            Action::SkipChildren => {}
            Action::Stop => return Ok(Flow::Stop),
            Action::Replace(node) => {
                replace(member, node, "member")?;
                self.report.replaced += 1;
                return Ok(Flow::Continue);
            }
        }
        match self.visitor.leave(NodeMut::Member(member)) {
            Action::Stop => Ok(Flow::Stop),
            Action::Replace(node) => {
                replace(member, node, "member")?;
                self.report.replaced += 1;
                Ok(Flow::Continue)
            }
            Action::Continue | Action::SkipChildren => Ok(Flow::Continue),
        }
    }

    fn member_children(&mut self, member: &mut Member) -> AstResult<Flow> {
        match member {
            Member::Constant(constant) => {
                for entry in &mut constant.entries {
                    if self.expr(&mut entry.value)? == Flow::Stop {
                        return Ok(Flow::Stop);
                    }
                }
                Ok(Flow::Continue)
            }
            Member::Property(property) => {
                for default in property.entries.iter_mut().filter_map(|e| e.default.as_mut()) {
                    if self.expr(default)? == Flow::Stop {
                        return Ok(Flow::Stop);
                    }
                }
                Ok(Flow::Continue)
            }
            Member::Method(method) => match &mut method.body {
                Some(body) => self.stmts(&mut body.stmts),
                None => Ok(Flow::Continue),
            },
            Member::Raw(_) => Ok(Flow::Continue),
        }
    }

    fn expr(&mut self, expr: &mut Expr) -> AstResult<Flow> {
        self.report.entered += 1;
        match self.visitor.enter(NodeMut::Expr(expr)) {
            Action::Continue => {
                if self.expr_children(expr)? == Flow::Stop {
                    return Ok(Flow::Stop);
                }
            }
            Action::SkipChildren => {}
            Action::Stop => return Ok(Flow::Stop),
            Action::Replace(node) => {
                replace(expr, node, "expression")?;
                self.report.replaced += 1;
                return Ok(Flow::Continue);
            }
        }
        match self.visitor.leave(NodeMut::Expr(expr)) {
            Action::Stop => Ok(Flow::Stop),
            Action::Replace(node) => {
                replace(expr, node, "expression")?;
                self.report.replaced += 1;
                Ok(Flow::Continue)
            }
            Action::Continue | Action::SkipChildren => Ok(Flow::Continue),
        }
    }

    fn expr_children(&mut self, expr: &mut Expr) -> AstResult<Flow> {
        let mut children: Vec<&mut Expr> = Vec::new();
        match expr {
            Expr::Array(array) => {
                for item in &mut array.items {
                    if let Some(key) = &mut item.key {
                        children.push(key);
                    }
                    children.push(&mut item.value);
                }
            }
            Expr::Call(call) => {
                children.push(&mut *call.callee);
                children.extend(call.args.iter_mut().map(|a| &mut a.value));
            }
            Expr::StaticCall(call) => children.extend(call.args.iter_mut().map(|a| &mut a.value)),
            Expr::MethodCall(call) => {
                children.push(&mut *call.object);
                children.extend(call.args.iter_mut().map(|a| &mut a.value));
            }
            Expr::PropertyFetch(fetch) => children.push(&mut *fetch.object),
            Expr::New(new) => children.extend(new.args.iter_mut().map(|a| &mut a.value)),
            Expr::Literal(_)
            | Expr::Variable(_)
            | Expr::Name(_)
            | Expr::ClassConst(_)
            | Expr::Raw(_) => {}
        }
        for child in children {
            if self.expr(child)? == Flow::Stop {
                return Ok(Flow::Stop);
            }
        }
        Ok(Flow::Continue)
    }
}
