//! Console output. Generated source and reports go to stdout, errors to stderr.

use super::Context;
use graft_foundation::error::ErrorReport;
use graft_foundation::GraftError;
use graft_recipes::RecipeOutcome;
use serde_json::json;
use std::path::Path;

pub fn error(json: bool, err: &anyhow::Error) {
    let report = match err.downcast_ref::<GraftError>() {
        Some(graft) => ErrorReport::from(graft),
        None => ErrorReport::from(&GraftError::internal(format!("{:#}", err))),
    };
    if json {
        eprintln!("{}", json!({ "error": report }));
    } else {
        eprintln!("Error [{}]: {}", report.code, report.message);
    }
}

pub fn written(ctx: &Context, path: &Path) {
    if ctx.json {
        println!("{}", json!({ "written": path.display().to_string() }));
    } else {
        println!("Wrote {}", path.display());
    }
}

pub fn recipe(ctx: &Context, path: &Path, outcome: &RecipeOutcome, dry_run: bool) {
    if ctx.json {
        let mut value = json!({
            "path": path.display().to_string(),
            "dryRun": dry_run,
            "outcome": outcome,
        });
        if dry_run {
            value["preview"] = json!(outcome.preview);
        }
        println!("{}", value);
        return;
    }

    match (&outcome.follow_up, &outcome.preview) {
        (Some(follow_up), _) => print!("{}", follow_up.to_markdown()),
        (None, Some(preview)) if dry_run => print!("{}", preview),
        (None, _) => println!("Patched {}", path.display()),
    }
}
