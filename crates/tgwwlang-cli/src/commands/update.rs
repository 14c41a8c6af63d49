use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;
use tgwwlang_parsers_xml::Indentation;
use tgwwlang_services::{run, MergeOptions, RunRequest};

use super::{outcome_of, read_source, resolve_format, resolve_model, UsageError};
use crate::{render, ModelArgs, OutputFormat, Outcome};

#[derive(Debug)]
pub struct UpdateArgs {
    pub langfile: PathBuf,
    pub model: ModelArgs,
    pub indent: Option<Indentation>,
    pub move_comments: bool,
    pub assign_attributes: bool,
    pub base: Option<PathBuf>,
    pub reorder: bool,
    pub copy_missing: bool,
    pub only: Vec<String>,
    pub backup: bool,
    pub dry_run: bool,
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

pub fn run_update(args: UpdateArgs, use_color: bool) -> color_eyre::Result<Outcome> {
    tracing::debug!(event = "update_args", args = ?args);
    let cfg = tgwwlang_config::load_config()?;
    let format = resolve_format(args.model.format, &cfg)?;
    let indentation = match (args.indent, cfg.indent.as_deref()) {
        (Some(indent), _) => indent,
        (None, Some(raw)) => raw
            .parse::<Indentation>()
            .map_err(|e| UsageError(format!("invalid `indent` in config: {e}")))?,
        (None, None) => Indentation::default(),
    };

    let model = resolve_model(args.model.model.as_deref(), &cfg)?;
    let base = args.base.as_deref().map(read_source).transpose()?;
    let target = read_source(&args.langfile)?;

    let only = (!args.only.is_empty()).then(|| args.only.iter().cloned().collect());
    let mut request = RunRequest::update(target, model);
    request.base = base;
    request.merge = MergeOptions {
        reorder: args.reorder,
        add_missing: args.copy_missing || only.is_some(),
        only,
    };
    request.move_comments = args.move_comments || cfg.move_comments();
    request.assign_attributes = args.assign_attributes;
    request.indentation = indentation;

    let report = run(&request)?;
    render::print_report(&report, format, use_color)?;

    let Some(bytes) = report.output.as_deref().filter(|_| report.success) else {
        return Ok(outcome_of(&report));
    };
    if args.dry_run {
        // JSON mode keeps stdout for the report alone.
        if format == OutputFormat::Text {
            std::io::stdout().lock().write_all(bytes)?;
        }
        return Ok(Outcome::Success);
    }

    let path = &args.langfile;
    if args.backup || cfg.backup() {
        let bak = backup_path(path);
        std::fs::copy(path, &bak).wrap_err_with(|| format!("failed to back up {}", path.display()))?;
        tracing::info!(event = "backup_written", from = %path.display(), to = %bak.display());
    }
    std::fs::write(path, bytes).wrap_err_with(|| format!("failed to write {}", path.display()))?;
    if format == OutputFormat::Text {
        crate::ui_ok!("{} updated", path.display());
    }
    Ok(Outcome::Success)
}
