pub mod check;
pub mod schema;
pub mod update;

use std::path::Path;

use clap::ValueEnum;
use color_eyre::eyre::{Result, WrapErr};
use tgwwlang_config::TgwwConfig;
use tgwwlang_domain::RunReport;
use tgwwlang_services::{ModelInput, Source};

use crate::{OutputFormat, Outcome};

/// Bad invocation that clap cannot catch: missing files, bad config values.
/// Exits with status 2.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct UsageError(pub String);

pub fn read_source(path: &Path) -> Result<Source> {
    if !path.is_file() {
        return Err(UsageError(format!("{} is not a file", path.display())).into());
    }
    let text = std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))?;
    Ok(Source::new(path.display().to_string(), text))
}

/// An explicit `--model` must exist; the configured or default one may be
/// missing, in which case model checks are skipped.
pub fn resolve_model(explicit: Option<&Path>, cfg: &TgwwConfig) -> Result<ModelInput> {
    if let Some(path) = explicit {
        return read_source(path).map(ModelInput::Provided);
    }
    let path = Path::new(cfg.model_path());
    if path.is_file() {
        read_source(path).map(ModelInput::Provided)
    } else {
        tracing::debug!(event = "default_model_missing", path = %path.display());
        Ok(ModelInput::NotFound(path.display().to_string()))
    }
}

pub fn resolve_format(cli: Option<OutputFormat>, cfg: &TgwwConfig) -> Result<OutputFormat> {
    if let Some(format) = cli {
        return Ok(format);
    }
    match cfg.format.as_deref() {
        None => Ok(OutputFormat::Text),
        Some(raw) => OutputFormat::from_str(raw, true)
            .map_err(|_| UsageError(format!("invalid `format` in config: `{raw}`")).into()),
    }
}

pub fn outcome_of(report: &RunReport) -> Outcome {
    if report.success {
        Outcome::Success
    } else {
        Outcome::Failed
    }
}
