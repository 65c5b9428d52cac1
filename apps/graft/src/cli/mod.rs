//! CLI command handling for graft

mod commands;
mod output;

use clap::{Args, Parser, Subcommand};
use graft_ast::PatchOptions;
use graft_config::AppConfig;
use graft_foundation::GraftError;
use graft_synth::SynthOptions;
use std::path::PathBuf;
use tracing::debug;

/// The main CLI struct.
#[derive(Parser)]
#[command(name = "graft")]
#[command(about = "Structural patching and class synthesis for PHP plugin scaffolding")]
#[command(version)]
pub struct Cli {
    /// Print results and errors as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// The command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every command that writes a file
#[derive(Args, Debug, Clone, Copy)]
pub struct WriteFlags {
    /// Print the resulting source instead of writing it
    #[arg(long)]
    pub dry_run: bool,
}

/// The available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Describe a PHP class as a JSON type descriptor
    ///
    /// Examples:
    ///   graft describe vendor/craftcms/cms/src/base/Plugin.php 'craft\base\Plugin'
    Describe {
        /// PHP file declaring the class
        file: PathBuf,

        /// Class to describe (short or fully qualified name)
        class: String,

        /// Write the descriptor here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a new class extending a described base type
    ///
    /// Examples:
    ///   graft synth 'acme\shop\Plugin' --base plugin.json --select plugin.toml --out src/Plugin.php
    Synth {
        /// Fully qualified name of the class to generate
        name: String,

        /// JSON descriptor of the base type
        #[arg(long, conflicts_with = "base_file", required_unless_present = "base_file")]
        base: Option<PathBuf>,

        /// PHP file declaring the base type, described on the fly
        #[arg(long, requires = "base_class")]
        base_file: Option<PathBuf>,

        /// Base class name inside --base-file
        #[arg(long)]
        base_class: Option<String>,

        /// TOML member selection
        #[arg(long)]
        select: Option<PathBuf>,

        /// Class doc comment text; may contain newlines
        #[arg(long)]
        doc: Option<String>,

        /// Extra classes to import (repeatable)
        #[arg(long = "import")]
        imports: Vec<String>,

        /// Path of the new file; optional with --dry-run
        #[arg(long)]
        out: Option<PathBuf>,

        /// Overwrite --out when it already exists
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        write: WriteFlags,
    },
    /// Register a service as a component of a plugin or module
    ///
    /// Examples:
    ///   graft register-service src/Plugin.php 'acme\shop\services\Cart'
    RegisterService {
        /// Plugin or module class file
        file: PathBuf,

        /// Fully qualified service class
        class: String,

        /// Component ID (defaults to the class name with a lowercase first letter)
        #[arg(long)]
        id: Option<String>,

        #[command(flatten)]
        write: WriteFlags,
    },
    /// Install a module in config/app.php
    ///
    /// Examples:
    ///   graft register-module config/app.php shop 'modules\shop\Module' --bootstrap
    RegisterModule {
        /// Application config file
        config: PathBuf,

        /// Module ID
        id: String,

        /// Fully qualified module class
        class: String,

        /// Load the module on every request
        #[arg(long)]
        bootstrap: bool,

        #[command(flatten)]
        write: WriteFlags,
    },
    /// Register a component type through an event handler
    ///
    /// Examples:
    ///   graft register-type src/Plugin.php \
    ///     --owner 'craft\services\Fields' --event EVENT_REGISTER_FIELD_TYPES \
    ///     --event-class 'craft\events\RegisterComponentTypesEvent' \
    ///     --type 'acme\shop\fields\Price'
    RegisterType {
        /// Plugin or module class file
        file: PathBuf,

        /// Class raising the event
        #[arg(long)]
        owner: String,

        /// Event constant on the owner class
        #[arg(long)]
        event: String,

        /// Class of the event object
        #[arg(long)]
        event_class: String,

        /// Class being registered
        #[arg(long = "type")]
        type_class: String,

        /// Event property receiving the class
        #[arg(long, default_value = "types")]
        collection: String,

        #[command(flatten)]
        write: WriteFlags,
    },
}

/// Settings resolved from configuration for one run
pub(crate) struct Context {
    pub json: bool,
    pub dry_run: bool,
    pub patch: PatchOptions,
    pub synth: SynthOptions,
}

impl Context {
    fn new(config: &AppConfig, json: bool) -> Self {
        Self {
            json,
            dry_run: config.patching.dry_run,
            patch: PatchOptions {
                max_alias_attempts: config.patching.max_alias_attempts,
                indent_width: config.patching.indent_width,
            },
            synth: SynthOptions {
                base_alias_prefix: config.synthesis.base_alias_prefix.clone(),
                max_alias_attempts: config.patching.max_alias_attempts,
            },
        }
    }

    /// `--dry-run` on the command line or `patching.dryRun` in config
    pub fn dry_run(&self, flags: WriteFlags) -> bool {
        flags.dry_run || self.dry_run
    }
}

/// Parse arguments, run the command and return the process exit code
pub fn run() -> i32 {
    let cli = Cli::parse();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            output::error(cli.json, &e.into());
            return 1;
        }
    };
    graft_config::logging::initialize(&config);
    debug!(json = cli.json, "Starting graft");

    let ctx = Context::new(&config, cli.json);
    match dispatch(cli.command, &ctx) {
        Ok(()) => 0,
        Err(e) => {
            output::error(ctx.json, &e);
            1
        }
    }
}

fn dispatch(command: Commands, ctx: &Context) -> anyhow::Result<()> {
    match command {
        Commands::Describe { file, class, out } => commands::describe(ctx, &file, &class, out.as_deref()),
        Commands::Synth {
            name,
            base,
            base_file,
            base_class,
            select,
            doc,
            imports,
            out,
            force,
            write,
        } => {
            let base = match (base, base_file, base_class) {
                (Some(path), _, _) => commands::BaseSource::Descriptor(path),
                (None, Some(file), Some(class)) => commands::BaseSource::Source { file, class },
                _ => {
                    return Err(GraftError::invalid_data(
                        "either --base or --base-file with --base-class is required",
                    )
                    .into())
                }
            };
            commands::synth(
                ctx,
                commands::SynthRequest {
                    name,
                    base,
                    select,
                    doc,
                    imports,
                    out,
                    force,
                    dry_run: ctx.dry_run(write),
                },
            )
        }
        Commands::RegisterService {
            file,
            class,
            id,
            write,
        } => commands::register_service(ctx, &file, &class, id.as_deref(), ctx.dry_run(write)),
        Commands::RegisterModule {
            config,
            id,
            class,
            bootstrap,
            write,
        } => commands::register_module(ctx, &config, &id, &class, bootstrap, ctx.dry_run(write)),
        Commands::RegisterType {
            file,
            owner,
            event,
            event_class,
            type_class,
            collection,
            write,
        } => commands::register_type(
            ctx,
            &file,
            commands::TypeRegistration {
                owner,
                event,
                event_class,
                type_class,
                collection,
            },
            ctx.dry_run(write),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_register_module_flags() {
        let cli = Cli::try_parse_from([
            "graft",
            "register-module",
            "config/app.php",
            "shop",
            "modules\\shop\\Module",
            "--bootstrap",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Commands::RegisterModule {
                id,
                bootstrap,
                write,
                ..
            } => {
                assert_eq!(id, "shop");
                assert!(bootstrap);
                assert!(write.dry_run);
            }
            _ => panic!("expected register-module"),
        }
    }

    #[test]
    fn test_synth_requires_a_base() {
        assert!(Cli::try_parse_from(["graft", "synth", "acme\\Plugin", "--out", "Plugin.php"]).is_err());
    }
}
