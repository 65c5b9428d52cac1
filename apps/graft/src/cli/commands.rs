//! Command handlers

use super::output;
use super::Context;
use anyhow::Result;
use graft_config::logging::file_span;
use graft_foundation::GraftError;
use graft_recipes::{
    run_on_file, EventHandlerRegistration, ModuleRegistration, Recipe, ServiceComponent,
};
use graft_synth::{describe as describe_class, MemberSelection, Synthesizer, TypeDescriptor};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where the base type of a synthesized class comes from
pub enum BaseSource {
    Descriptor(PathBuf),
    Source { file: PathBuf, class: String },
}

pub struct SynthRequest {
    pub name: String,
    pub base: BaseSource,
    pub select: Option<PathBuf>,
    pub doc: Option<String>,
    pub imports: Vec<String>,
    pub out: Option<PathBuf>,
    pub force: bool,
    pub dry_run: bool,
}

pub struct TypeRegistration {
    pub owner: String,
    pub event: String,
    pub event_class: String,
    pub type_class: String,
    pub collection: String,
}

fn io_error(path: &Path, err: io::Error) -> GraftError {
    GraftError::Io(io::Error::new(
        err.kind(),
        format!("{}: {}", path.display(), err),
    ))
}

fn describe_file(file: &Path, class: &str) -> Result<TypeDescriptor, GraftError> {
    let source = fs::read_to_string(file).map_err(|e| io_error(file, e))?;
    let parsed = graft_ast::parse(&source)?;
    Ok(describe_class(&parsed, class)?)
}

pub fn describe(ctx: &Context, file: &Path, class: &str, out: Option<&Path>) -> Result<()> {
    let _span = file_span(file, "describe").entered();
    let descriptor = describe_file(file, class)?;
    let json = descriptor.to_json().map_err(GraftError::from)?;
    match out {
        Some(path) => {
            fs::write(path, format!("{}\n", json)).map_err(|e| io_error(path, e))?;
            output::written(ctx, path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub fn synth(ctx: &Context, request: SynthRequest) -> Result<()> {
    let base = match &request.base {
        BaseSource::Descriptor(path) => TypeDescriptor::load(path).map_err(GraftError::from)?,
        BaseSource::Source { file, class } => describe_file(file, class)?,
    };
    let selection = match &request.select {
        Some(path) => MemberSelection::load(path).map_err(GraftError::from)?,
        None => MemberSelection::new(),
    };

    let mut generated = Synthesizer::new(ctx.synth.clone())
        .synthesize(&request.name, &base, selection)
        .map_err(GraftError::from)?;
    for import in &request.imports {
        generated.import(import, None).map_err(GraftError::from)?;
    }
    if let Some(doc) = &request.doc {
        generated.set_doc(doc);
    }
    let rendered = graft_ast::print(&generated.to_file(), ctx.patch.indent_width);

    if request.dry_run {
        print!("{}", rendered);
        return Ok(());
    }
    let Some(out) = request.out.as_deref() else {
        return Err(GraftError::invalid_data("--out is required unless --dry-run is set").into());
    };
    if out.exists() && !request.force {
        return Err(GraftError::invalid_data(format!(
            "{} already exists (use --force to overwrite)",
            out.display()
        ))
        .into());
    }
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    fs::write(out, &rendered).map_err(|e| io_error(out, e))?;
    info!(class = %generated.name(), path = %out.display(), "Generated class");
    output::written(ctx, out);
    Ok(())
}

fn patch<R: Recipe>(ctx: &Context, recipe: &R, file: &Path, dry_run: bool) -> Result<()> {
    let _span = file_span(file, recipe.id()).entered();
    let outcome = run_on_file(recipe, file, &ctx.patch, dry_run).map_err(GraftError::from)?;
    output::recipe(ctx, file, &outcome, dry_run);
    Ok(())
}

pub fn register_service(
    ctx: &Context,
    file: &Path,
    class: &str,
    id: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let recipe = match id {
        Some(id) => ServiceComponent::new(class, id),
        None => ServiceComponent::for_class(class),
    }
    .map_err(GraftError::from)?;
    patch(ctx, &recipe, file, dry_run)
}

pub fn register_module(
    ctx: &Context,
    config: &Path,
    id: &str,
    class: &str,
    bootstrap: bool,
    dry_run: bool,
) -> Result<()> {
    let recipe = ModuleRegistration::new(id, class)
        .map_err(GraftError::from)?
        .with_bootstrap(bootstrap);
    patch(ctx, &recipe, config, dry_run)
}

pub fn register_type(
    ctx: &Context,
    file: &Path,
    registration: TypeRegistration,
    dry_run: bool,
) -> Result<()> {
    let recipe = EventHandlerRegistration::new(
        &registration.owner,
        &registration.event,
        &registration.event_class,
        &registration.type_class,
    )
    .and_then(|recipe| recipe.with_collection(&registration.collection))
    .map_err(GraftError::from)?;
    patch(ctx, &recipe, file, dry_run)
}
