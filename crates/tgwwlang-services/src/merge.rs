use indexmap::IndexSet;
use tgwwlang_core::{Deprecation, Result, TgwwError};
use tgwwlang_domain::{DiagnosticCode, Diagnostics};
use tgwwlang_parsers_xml::{LanguageDocument, NodeId};

/// Switches for [`merge_strings`].
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Move matched strings so they follow the base's order.
    pub reorder: bool,
    /// Copy strings that only the base has.
    pub add_missing: bool,
    /// Restrict additions to these keys, in the given order.
    pub only: Option<IndexSet<String>>,
}

/// Reconcile `lang` with `base`. `model` decides which base strings are
/// still alive; pass the base itself when there is no separate model.
pub fn merge_strings(
    lang: &mut LanguageDocument,
    base: &LanguageDocument,
    model: &LanguageDocument,
    opts: &MergeOptions,
    diags: &mut Diagnostics,
) -> Result<()> {
    if !opts.reorder && !opts.add_missing {
        return Ok(());
    }
    match &opts.only {
        Some(only) if !opts.reorder => add_only(lang, base, only, diags),
        _ => {
            merge_in_base_order(lang, base, model, opts, diags);
            Ok(())
        }
    }
}

fn add_string(lang: &mut LanguageDocument, base: &LanguageDocument, key: &str, deprecated: bool, diags: &mut Diagnostics) {
    let Some(entry) = base.get(key, deprecated) else {
        return;
    };
    lang.adopt(base, entry, key, deprecated);
    diags.push(lang.diag(DiagnosticCode::AddedString, 0).param(key));
    tracing::debug!(event = "string_added", file = %lang.filename, key = key, deprecated = deprecated);
}

/// Add exactly the requested keys, appending in request order.
fn add_only(
    lang: &mut LanguageDocument,
    base: &LanguageDocument,
    only: &IndexSet<String>,
    diags: &mut Diagnostics,
) -> Result<()> {
    for key in only {
        if base.status(key).is_none() {
            diags.push(base.diag(DiagnosticCode::MissingString, 0).param(key.as_str()));
            continue;
        }
        for deprecated in [false, true] {
            if base.contains(key, deprecated) && lang.resolve(key, deprecated).is_none() {
                add_string(lang, base, key, deprecated, diags);
            }
        }
        let status = Deprecation::from_presence(lang.contains(key, false), lang.contains(key, true))
            .ok_or_else(|| TgwwError::Invariant(format!("no definition of \"{key}\" after adding it")))?;
        lang.statuses.insert(key.clone(), status);
    }
    Ok(())
}

/// Walk the base in document order, moving matches to the end (reorder) and
/// copying admitted strings that `lang` lacks (add-missing).
fn merge_in_base_order(
    lang: &mut LanguageDocument,
    base: &LanguageDocument,
    model: &LanguageDocument,
    opts: &MergeOptions,
    diags: &mut Diagnostics,
) {
    let root = lang.tree.root();
    let mut moved = 0usize;
    let mut added = 0usize;
    for (key, deprecated) in base.strings.keys() {
        let (key, deprecated) = (key.as_str(), *deprecated);
        // Unknown to the model means dead for merge purposes.
        let model_status = model.status(key).unwrap_or(Deprecation::Deprecated);

        // When the model carries both definitions each one maps onto its own
        // flag only.
        let slot: Option<NodeId> = match lang.get(key, deprecated) {
            Some(s) => Some(s.node),
            None if model_status != Deprecation::Both => lang.get(key, !deprecated).map(|s| s.node),
            None => None,
        };

        match slot {
            Some(node) => {
                if opts.reorder {
                    lang.tree.append(root, node);
                    moved += 1;
                }
            }
            None if opts.add_missing => {
                let admitted = match &opts.only {
                    Some(only) => only.contains(key),
                    None => !deprecated && model_status != Deprecation::Deprecated,
                };
                if admitted {
                    add_string(lang, base, key, deprecated, diags);
                    lang.sync_status(key);
                    added += 1;
                }
            }
            None => {}
        }
    }
    tracing::debug!(event = "merge_done", file = %lang.filename, moved = moved, added = added);
}
