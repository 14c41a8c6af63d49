//! Cross-file checks between a langfile and its model/base.
//!
//! Every check only appends to the run's `Diagnostics`; none of them fail.

use tgwwlang_core::Deprecation;
use tgwwlang_domain::{DiagnosticCode, Diagnostics};
use tgwwlang_parsers_xml::LanguageDocument;

/// Flag two langfiles that claim the same identity.
pub fn check_summary(lang: &LanguageDocument, other: &LanguageDocument, diags: &mut Diagnostics) {
    let a = &lang.summary;
    let b = &other.summary;
    if a.name == b.name {
        diags.push(
            lang.diag(DiagnosticCode::SameLanguageName, 0)
                .param(other.filename.as_str())
                .param(a.name.as_str()),
        );
    }
    if (&a.base, &a.variant) == (&b.base, &b.variant) {
        diags.push(
            lang.diag(DiagnosticCode::SameLanguageBaseVariant, 0)
                .param(other.filename.as_str())
                .param(a.base.as_str())
                .param(a.variant.as_str()),
        );
    }
}

/// Every `<value>` of a string must use the same placeholders.
pub fn check_placeholder_sanity(doc: &LanguageDocument, diags: &mut Diagnostics) {
    for ((key, _), string) in &doc.strings {
        let Some((first, rest)) = string.values.split_first() else {
            continue;
        };
        if rest.iter().any(|v| v.placeholders != first.placeholders) {
            diags.push(
                doc.diag(DiagnosticCode::InconsistentPlaceholders, doc.line_of(string.node))
                    .param(key.as_str()),
            );
        }
    }
}

/// Compare every stored string of `lang` with its counterpart in `model`.
pub fn check_available_strings(lang: &LanguageDocument, model: &LanguageDocument, diags: &mut Diagnostics) {
    for ((key, deprecated), string) in &lang.strings {
        let line = lang.line_of(string.node);
        let Some((_, model_string)) = model.resolve(key, *deprecated) else {
            diags.push(
                lang.diag(DiagnosticCode::UnknownKey, line)
                    .param(key.as_str())
                    .param(model.filename.as_str()),
            );
            continue;
        };

        if *deprecated && model.status(key) == Some(Deprecation::Active) {
            diags.push(
                lang.diag(DiagnosticCode::InvalidAttribute, line)
                    .param(key.as_str())
                    .param("deprecated")
                    .param(model.filename.as_str()),
            );
        }
        if string.gif && !model_string.gif {
            diags.push(
                lang.diag(DiagnosticCode::InvalidAttribute, line)
                    .param(key.as_str())
                    .param("isgif")
                    .param(model.filename.as_str()),
            );
        }

        let Some(reference) = model_string.values.first() else {
            continue;
        };
        for value in &string.values {
            let value_line = lang.line_of(value.node);
            for missing in reference.placeholders.difference(&value.placeholders) {
                diags.push(
                    lang.diag(DiagnosticCode::MissingPlaceholder, value_line)
                        .param(missing.as_str())
                        .param(key.as_str()),
                );
            }
            for extra in value.placeholders.difference(&reference.placeholders) {
                diags.push(
                    lang.diag(DiagnosticCode::ExtraPlaceholder, value_line)
                        .param(extra.as_str())
                        .param(key.as_str()),
                );
            }
        }
    }
}

/// Report model keys that `lang` lacks. Purely deprecated keys are exempt.
/// Returns how many were missing.
pub fn check_missing_strings(lang: &LanguageDocument, model: &LanguageDocument, diags: &mut Diagnostics) -> usize {
    let mut total = 0usize;
    for (key, status) in &model.statuses {
        if *status != Deprecation::Deprecated && !lang.statuses.contains_key(key) {
            diags.push(lang.diag(DiagnosticCode::MissingString, 0).param(key.as_str()));
            total += 1;
        }
    }
    if total != 0 {
        diags.push(lang.diag(DiagnosticCode::MissingStringsTotal, 0).param(total.to_string()));
    }
    total
}

/// Checks that only make sense for a langfile loaded as the model.
pub fn check_model_role(model: &LanguageDocument, diags: &mut Diagnostics) {
    if !model.summary.is_default {
        diags.push(model.diag(DiagnosticCode::NotDefaultLanguage, 0));
    }
}

/// Checks that only make sense for the langfile being checked or updated.
pub fn check_target_role(lang: &LanguageDocument, diags: &mut Diagnostics) {
    if lang.summary.is_default {
        diags.push(lang.diag(DiagnosticCode::IsDefaultLanguage, 0));
    }
    if lang.summary.is_closed() {
        diags.push(
            lang.diag(DiagnosticCode::ClosedLangfile, 0)
                .param(lang.summary.owner.as_str()),
        );
    }
}
