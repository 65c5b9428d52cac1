//! graft-recipes: registering newly generated classes in existing files
//!
//! Each recipe patches one file through a [`Workspace`]. When the file does
//! not have the shape a recipe expects, nothing is written and the outcome
//! carries a [`FollowUp`] with the code to add by hand.

pub mod error;
pub mod event_handler;
pub mod module;
pub mod service;

use graft_ast::names::{is_identifier, normalize_class};
use graft_ast::{AstError, AstResult, Draft, PatchOptions, PatchResult, Workspace};
use graft_foundation::{EditOutcome, FollowUp};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

pub use error::{RecipeError, RecipeResult};
pub use event_handler::EventHandlerRegistration;
pub use module::ModuleRegistration;
pub use service::ServiceComponent;

/// One registration that can be patched into a file
pub trait Recipe {
    /// Short identifier used in logs, e.g. `service-component`
    fn id(&self) -> &'static str;

    /// Patch the staged tree
    fn apply(&self, draft: &mut Draft) -> AstResult<EditOutcome>;

    /// Manual instructions for `target` when [`Recipe::apply`] could not run
    fn follow_up(&self, target: &str, reason: &str) -> FollowUp;
}

/// Result of running a recipe against one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeOutcome {
    /// Whether the registration is now present in the file
    pub patched: bool,
    /// Instructions for the human, set whenever `patched` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<FollowUp>,
    /// Patched source text
    #[serde(skip)]
    pub preview: Option<String>,
}

impl RecipeOutcome {
    fn patched(preview: String) -> Self {
        Self {
            patched: true,
            follow_up: None,
            preview: Some(preview),
        }
    }

    fn manual(follow_up: FollowUp) -> Self {
        Self {
            patched: false,
            follow_up: Some(follow_up),
            preview: None,
        }
    }
}

/// Run `recipe` against an open workspace without writing.
///
/// Failures while patching leave the workspace untouched and turn into
/// follow-up instructions; only a closed workspace is an error.
pub fn run<R: Recipe + ?Sized>(
    recipe: &R,
    workspace: &mut Workspace,
    target: &str,
) -> RecipeResult<RecipeOutcome> {
    match workspace.apply(|draft| recipe.apply(draft)) {
        Ok(PatchResult::Applied(rendered)) => {
            info!(recipe = recipe.id(), target, "Registration patched");
            Ok(RecipeOutcome::patched(rendered))
        }
        Ok(PatchResult::NotApplicable(reason)) => {
            info!(recipe = recipe.id(), target, reason = %reason, "Registration needs manual steps");
            Ok(RecipeOutcome::manual(recipe.follow_up(target, &reason)))
        }
        Err(e @ AstError::InvalidState { .. }) => Err(e.into()),
        Err(e) => {
            warn!(recipe = recipe.id(), target, error = %e, "Registration failed");
            Ok(RecipeOutcome::manual(recipe.follow_up(target, &e.to_string())))
        }
    }
}

/// Load `path`, run `recipe`, and write the result unless `dry_run`.
///
/// A file that cannot be read or parsed gets follow-up instructions rather
/// than an error; write failures are returned.
pub fn run_on_file<R: Recipe + ?Sized>(
    recipe: &R,
    path: &Path,
    options: &PatchOptions,
    dry_run: bool,
) -> RecipeResult<RecipeOutcome> {
    let target = path.display().to_string();
    let mut workspace = match Workspace::load_with(path, *options) {
        Ok(workspace) => workspace,
        Err(e) => {
            warn!(recipe = recipe.id(), target = %target, error = %e, "Could not load target file");
            return Ok(RecipeOutcome::manual(recipe.follow_up(&target, &e.to_string())));
        }
    };

    let outcome = run(recipe, &mut workspace, &target)?;
    if outcome.patched && !dry_run && workspace.is_changed() {
        workspace.write()?;
    }
    Ok(outcome)
}

pub(crate) fn validate_class(field: &'static str, class: &str) -> RecipeResult<String> {
    normalize_class(class).map_err(|e| RecipeError::invalid_input(field, e.to_string()))
}

pub(crate) fn validate_identifier(field: &'static str, name: &str) -> RecipeResult<String> {
    if is_identifier(name) {
        Ok(name.to_string())
    } else {
        Err(RecipeError::invalid_input(
            field,
            format!("`{}` is not a valid identifier", name),
        ))
    }
}
