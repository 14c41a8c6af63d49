use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tgwwlang_parsers_xml::Indentation;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::Layer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod render;
mod ui;

#[derive(Parser)]
#[command(name = "tgwwlang", version, about = "Check and update XML langfiles against a model langfile")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Only log warnings and errors to the console
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Also write a daily-rotated debug log into this directory
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct ModelArgs {
    /// The reference langfile [default: English.xml]
    #[arg(long, value_name = "LANGFILE")]
    pub model: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a langfile against the model
    Check {
        #[command(flatten)]
        model: ModelArgs,

        langfile: PathBuf,
    },

    /// Validate a langfile, then rewrite it
    Update {
        #[command(flatten)]
        model: ModelArgs,

        /// Indentation: digits for the width, `t` for tabs, leading `-` to
        /// leave the root's children unindented [default: 2]
        #[arg(short = 'i', long = "indent", value_name = "SPEC", allow_hyphen_values = true, value_parser = parse_indent)]
        indent: Option<Indentation>,

        /// Move comments into the `<string>` that follows them
        #[arg(long)]
        move_comments: bool,

        /// Copy `deprecated`/`isgif` from the model
        #[arg(long)]
        assign_attributes: bool,

        /// A langfile additional strings are taken from
        #[arg(long, value_name = "LANGFILE")]
        base: Option<PathBuf>,

        /// Reorder strings to match the base
        #[arg(long, requires = "base")]
        reorder: bool,

        /// Copy missing strings from the base
        #[arg(long, requires = "base")]
        copy_missing: bool,

        /// Only copy these keys (implies --copy-missing)
        #[arg(long, requires = "base", value_delimiter = ',', value_name = "KEY")]
        only: Vec<String>,

        /// Copy the langfile to `<langfile>.bak` before writing
        #[arg(long)]
        backup: bool,

        /// Print the result instead of writing it
        #[arg(long)]
        dry_run: bool,

        langfile: PathBuf,
    },

    /// Dump JSON schemas of the report types
    Schema {
        #[arg(long, default_value = "")]
        out_dir: PathBuf,
    },
}

fn parse_indent(spec: &str) -> Result<Indentation, String> {
    spec.parse::<Indentation>().map_err(|e| e.to_string())
}

/// How a command ended, mapped onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
    Usage,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Failed => ExitCode::from(1),
            Outcome::Usage => ExitCode::from(2),
        }
    }
}

trait Runnable {
    fn run(self, use_color: bool) -> Result<Outcome>;
}

impl Runnable for Commands {
    fn run(self, use_color: bool) -> Result<Outcome> {
        let cmd_name = match &self {
            Commands::Check { .. } => "check",
            Commands::Update { .. } => "update",
            Commands::Schema { .. } => "schema",
        };
        info!(event = "command_started", command = cmd_name);

        let result = match self {
            Commands::Check { model, langfile } => commands::check::run_check(langfile, model, use_color),
            Commands::Update {
                model,
                indent,
                move_comments,
                assign_attributes,
                base,
                reorder,
                copy_missing,
                only,
                backup,
                dry_run,
                langfile,
            } => commands::update::run_update(
                commands::update::UpdateArgs {
                    langfile,
                    model,
                    indent,
                    move_comments,
                    assign_attributes,
                    base,
                    reorder,
                    copy_missing,
                    only,
                    backup,
                    dry_run,
                },
                use_color,
            ),
            Commands::Schema { out_dir } => commands::schema::run_schema(out_dir).map(|()| Outcome::Success),
        };

        match &result {
            Ok(outcome) => info!(event = "command_finished", command = cmd_name, outcome = ?outcome),
            Err(e) => error!(event = "command_failed", command = cmd_name, error = ?e),
        }

        result
    }
}

fn init_tracing(log_dir: Option<&Path>, quiet: bool, use_color: bool) -> Option<WorkerGuard> {
    let default_level = if quiet { "warn" } else { "info" };
    let console_filter = if quiet {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };
    let console_layer = fmt::layer()
        .with_target(false)
        .with_ansi(use_color)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let file_appender = rolling::daily(dir, "tgwwlang.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(file_writer)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let use_color = !cli.no_color
        && std::io::stderr().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();
    let _guard = init_tracing(cli.log_dir.as_deref(), cli.quiet, use_color);

    let outcome = match cli.cmd.run(use_color) {
        Ok(outcome) => outcome,
        Err(e) => match e.downcast_ref::<commands::UsageError>() {
            Some(usage) => {
                crate::ui_err!("{usage}");
                Outcome::Usage
            }
            None => return Err(e),
        },
    };
    Ok(outcome.into())
}
