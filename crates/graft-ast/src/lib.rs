//! graft-ast: PHP syntax tree, visitor and span-preserving patch engine
//!
//! Parses PHP source into a tree that remembers where every node came from,
//! lets semantic edits run against a staged copy of that tree, and prints
//! it back so that everything an edit did not touch stays byte-identical.

pub mod edits;
pub mod error;
pub mod imports;
pub mod lexer;
pub mod names;
pub mod parser;
pub mod printer;
pub mod syntax;
pub mod visit;
pub mod workspace;

// Error types
pub use error::{AstError, AstResult};

// Parsing and printing
pub use parser::parse;
pub use printer::{expr_to_code, print, stmt_to_code};

// Tree
pub use syntax::{
    ArrayItem, ArrayLiteral, ClassDecl, ClassKind, DocComment, Expr, Member, MethodDecl,
    Modifiers, Param, SourceFile, Stmt, UseDecl, Visibility,
};

// Traversal
pub use visit::{traverse, traverse_stmts, Action, Node, NodeMut, TraversalReport, Visitor};

// Imports
pub use imports::{Import, ImportTable, MAX_ALIAS_ATTEMPTS};

// Transactions
pub use workspace::{Draft, Edit, PatchOptions, PatchVisitor, Workspace, WorkspaceState};

pub use graft_foundation::{EditOutcome, PatchResult};
