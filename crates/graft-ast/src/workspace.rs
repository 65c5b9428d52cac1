//! Patch transactions over a single source file.
//!
//! A [`Workspace`] owns the parsed tree of one file. Each [`Workspace::apply`]
//! runs an edit against a staged copy of the tree; the copy replaces the
//! committed tree only when the edit reports [`EditOutcome::Applied`]. The
//! file on disk changes only through [`Workspace::write`].
//!
//! ```text
//! Loaded --apply(applied)--> Modified --write--> Written
//!    \                          |
//!     `--------abort----------> Aborted
//! ```

use crate::edits::MethodFinder;
use crate::error::{AstError, AstResult};
use crate::imports::{insert_use, ImportTable, MAX_ALIAS_ATTEMPTS};
use crate::parser::parse;
use crate::printer::{print, DEFAULT_INDENT_WIDTH};
use crate::syntax::{ClassDecl, MethodDecl, SourceFile};
use crate::visit::{traverse, TraversalReport, Visitor};
use graft_foundation::{EditOutcome, PatchResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceState {
    Loaded,
    Modified,
    Written,
    Aborted,
}

impl WorkspaceState {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkspaceState::Loaded => "loaded",
            WorkspaceState::Modified => "modified",
            WorkspaceState::Written => "written",
            WorkspaceState::Aborted => "aborted",
        }
    }
}

/// Knobs shared by every edit run in a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchOptions {
    pub max_alias_attempts: usize,
    /// Indent width for files whose own indentation cannot be detected
    pub indent_width: usize,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            max_alias_attempts: MAX_ALIAS_ATTEMPTS,
            indent_width: DEFAULT_INDENT_WIDTH,
        }
    }
}

/// Staged copy of a workspace tree handed to an edit
pub struct Draft {
    file: SourceFile,
    imports: ImportTable,
}

impl Draft {
    fn new(file: SourceFile, options: &PatchOptions) -> Self {
        let imports = ImportTable::from_file(&file).with_max_attempts(options.max_alias_attempts);
        Self { file, imports }
    }

    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    pub fn file_mut(&mut self) -> &mut SourceFile {
        &mut self.file
    }

    pub fn imports(&self) -> &ImportTable {
        &self.imports
    }

    pub fn primary_class_mut(&mut self) -> Option<&mut ClassDecl> {
        self.file.primary_class_mut()
    }

    pub fn traverse<V: Visitor + ?Sized>(&mut self, visitor: &mut V) -> AstResult<TraversalReport> {
        traverse(&mut self.file, visitor)
    }

    /// Alias under which `fqn` can be referenced, adding a `use` statement
    /// when the class is not imported yet
    pub fn ensure_import(&mut self, fqn: &str, preferred: Option<&str>) -> AstResult<String> {
        let ensured = self.imports.ensure(fqn, preferred)?;
        if ensured.added {
            insert_use(&mut self.file, fqn.trim_start_matches('\\'), &ensured.alias);
        }
        Ok(ensured.alias)
    }

    /// Run `edit` on the first method named `name` anywhere in the file
    pub fn edit_method<F>(&mut self, name: &str, edit: F) -> AstResult<EditOutcome>
    where
        F: FnMut(&mut MethodDecl) -> EditOutcome,
    {
        let mut finder = MethodFinder::new(name, edit);
        self.traverse(&mut finder)?;
        Ok(finder.outcome())
    }
}

/// One transactional change to a workspace, for edits that carry state
pub trait Edit {
    fn apply(&mut self, draft: &mut Draft) -> AstResult<EditOutcome>;
}

/// Visitor that knows, after a traversal, whether its edit happened
pub trait PatchVisitor: Visitor {
    fn outcome(&self) -> EditOutcome;
}

impl<F> PatchVisitor for MethodFinder<F>
where
    F: FnMut(&mut MethodDecl) -> EditOutcome,
{
    fn outcome(&self) -> EditOutcome {
        MethodFinder::outcome(self)
    }
}

pub struct Workspace {
    path: Option<PathBuf>,
    original: String,
    baseline: SourceFile,
    file: SourceFile,
    options: PatchOptions,
    state: WorkspaceState,
}

impl Workspace {
    pub fn load(path: impl AsRef<Path>) -> AstResult<Self> {
        Self::load_with(path, PatchOptions::default())
    }

    pub fn load_with(path: impl AsRef<Path>, options: PatchOptions) -> AstResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| AstError::io(path, e))?;
        let mut workspace = Self::from_source_with(source, options)?;
        debug!(path = %path.display(), "Loaded source file");
        workspace.path = Some(path.to_path_buf());
        Ok(workspace)
    }

    /// In-memory workspace; [`Workspace::write`] needs a path and will fail
    pub fn from_source(source: impl Into<String>) -> AstResult<Self> {
        Self::from_source_with(source, PatchOptions::default())
    }

    pub fn from_source_with(source: impl Into<String>, options: PatchOptions) -> AstResult<Self> {
        let original = source.into();
        let file = parse(&original)?;
        Ok(Self {
            path: None,
            original,
            baseline: file.clone(),
            file,
            options,
            state: WorkspaceState::Loaded,
        })
    }

    pub fn state(&self) -> WorkspaceState {
        self.state
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Text the workspace was loaded from
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    pub fn options(&self) -> &PatchOptions {
        &self.options
    }

    /// Run `edit` against a staged copy, committing it only when it applies.
    ///
    /// Errors and `NotApplicable` outcomes leave the committed tree exactly
    /// as it was.
    pub fn apply<F>(&mut self, edit: F) -> AstResult<PatchResult>
    where
        F: FnOnce(&mut Draft) -> AstResult<EditOutcome>,
    {
        self.ensure_open("apply an edit")?;
        let mut draft = Draft::new(self.file.clone(), &self.options);
        match edit(&mut draft) {
            Ok(EditOutcome::Applied) => {
                let rendered = print(&draft.file, self.options.indent_width);
                self.file = draft.file;
                self.state = WorkspaceState::Modified;
                info!(path = ?self.path, "Patch applied");
                Ok(PatchResult::Applied(rendered))
            }
            Ok(EditOutcome::NotApplicable(reason)) => {
                info!(path = ?self.path, reason = %reason, "Patch not applicable");
                Ok(PatchResult::NotApplicable(reason))
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Patch failed, changes discarded");
                Err(e)
            }
        }
    }

    pub fn apply_edit<E: Edit + ?Sized>(&mut self, edit: &mut E) -> AstResult<PatchResult> {
        self.apply(|draft| edit.apply(draft))
    }

    /// Traverse a staged copy with `visitor` and commit if it reports success
    pub fn apply_visitor<V: PatchVisitor + ?Sized>(
        &mut self,
        visitor: &mut V,
    ) -> AstResult<PatchResult> {
        self.apply(|draft| {
            draft.traverse(visitor)?;
            Ok(visitor.outcome())
        })
    }

    /// Committed tree as source text
    pub fn render(&self) -> String {
        print(&self.file, self.options.indent_width)
    }

    pub fn is_changed(&self) -> bool {
        self.render() != self.original
    }

    /// Write the committed tree back to the file it was loaded from
    pub fn write(&mut self) -> AstResult<()> {
        self.ensure_open("write")?;
        let path = self.path.clone().ok_or(AstError::InvalidState {
            state: "in-memory",
            operation: "write",
        })?;
        self.write_to(&path)
    }

    pub fn write_to(&mut self, path: &Path) -> AstResult<()> {
        self.ensure_open("write")?;
        // only an apply since the last write moves the state to Modified
        if self.state != WorkspaceState::Modified {
            debug!(path = %path.display(), state = self.state.as_str(), "No changes to write");
            return Ok(());
        }
        let rendered = self.render();
        fs::write(path, &rendered).map_err(|e| AstError::io(path, e))?;
        self.original = rendered;
        self.baseline = self.file.clone();
        self.state = WorkspaceState::Written;
        info!(path = %path.display(), "Wrote patched file");
        Ok(())
    }

    /// Drop every change not yet written
    pub fn abort(&mut self) {
        self.file = self.baseline.clone();
        self.state = WorkspaceState::Aborted;
        debug!(path = ?self.path, "Workspace aborted");
    }

    fn ensure_open(&self, operation: &'static str) -> AstResult<()> {
        if self.state == WorkspaceState::Aborted {
            return Err(AstError::InvalidState {
                state: self.state.as_str(),
                operation,
            });
        }
        Ok(())
    }
}
