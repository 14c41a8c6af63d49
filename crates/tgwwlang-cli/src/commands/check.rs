use std::path::PathBuf;

use tgwwlang_services::{run, RunRequest};

use super::{outcome_of, read_source, resolve_format, resolve_model};
use crate::{render, ModelArgs, Outcome};

pub fn run_check(langfile: PathBuf, args: ModelArgs, use_color: bool) -> color_eyre::Result<Outcome> {
    tracing::debug!(event = "check_args", langfile = ?langfile, model = ?args.model, format = ?args.format);
    let cfg = tgwwlang_config::load_config()?;
    let format = resolve_format(args.format, &cfg)?;
    let model = resolve_model(args.model.as_deref(), &cfg)?;
    let target = read_source(&langfile)?;

    let report = run(&RunRequest::check(target, model))?;
    render::print_report(&report, format, use_color)?;
    Ok(outcome_of(&report))
}
