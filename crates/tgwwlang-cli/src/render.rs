use std::io::Write;

use owo_colors::OwoColorize;
use tgwwlang_domain::{Diagnostic, DiagnosticCode, RunReport, Severity};

use crate::OutputFormat;

/// Human text per code. `{0}`, `{1}`... are the record's params and `{file}`
/// its file. Entries marked `true` are prefixed with `file:line: `.
const MESSAGES: &[(DiagnosticCode, bool, &str)] = &[
    (DiagnosticCode::ParseError, true, "{0}"),
    (DiagnosticCode::ModelRequired, false, "`{0}` requires a model langfile."),
    (DiagnosticCode::ModelNotFound, false, "{0} is not found. Some checks will be skipped."),
    (DiagnosticCode::EmptyLanguageAttribute, true, "Language attribute '{0}' is not set."),
    (DiagnosticCode::MultipleDefinitions, true, "Multiple definitions of \"{0}\"."),
    (DiagnosticCode::EmptyValue, true, "\"{0}\" has an empty '<value>'."),
    (DiagnosticCode::NoValues, true, "\"{0}\" should have at least one '<value>'."),
    (DiagnosticCode::NotDefaultLanguage, false, "{file} is NOT the default language."),
    (DiagnosticCode::IsDefaultLanguage, false, "{file} is the default language."),
    (DiagnosticCode::ClosedLangfile, false, "{file} is a closed langfile. Its owner is {0}."),
    (DiagnosticCode::SameLanguageName, false, "{file} and {0} have the same name: \"{1}\"."),
    (DiagnosticCode::SameLanguageBaseVariant, false, "{file} and {0} have the same base/variant: \"{1}\"/\"{2}\"."),
    (DiagnosticCode::InconsistentPlaceholders, true, "Inconsistent placeholders in \"{0}\"."),
    (DiagnosticCode::UnknownKey, true, "\"{0}\" is not declared in {1}."),
    (DiagnosticCode::InvalidAttribute, true, "\"{0}\" must not be marked '{1}', it is not in {2}."),
    (DiagnosticCode::MissingPlaceholder, true, "Missing '{0}' in \"{1}\"."),
    (DiagnosticCode::ExtraPlaceholder, true, "Extra '{0}' in \"{1}\"."),
    (DiagnosticCode::MissingString, false, "{file}: Missing \"{0}\"."),
    (DiagnosticCode::MissingStringsTotal, false, "{0} missing string(s)."),
    (DiagnosticCode::AddedString, false, "{file}: Adding \"{0}\"."),
];

fn template(code: DiagnosticCode) -> (bool, &'static str) {
    MESSAGES
        .iter()
        .find(|(c, _, _)| *c == code)
        .map(|(_, located, text)| (*located, *text))
        .unwrap_or((true, "{0}"))
}

/// Expand a template in one pass, so params that look like `{0}` themselves
/// (placeholder tokens) are never expanded again.
fn expand(template: &str, diag: &Diagnostic) -> String {
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &after[..close];
        match name {
            "file" => out.push_str(&diag.file),
            _ => match name.parse::<usize>().ok().and_then(|i| diag.params.get(i)) {
                Some(param) => out.push_str(param),
                None => out.push_str(&rest[open..open + close + 2]),
            },
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

pub fn message(diag: &Diagnostic) -> String {
    let (located, template) = template(diag.code);
    let text = expand(template, diag);
    if !located {
        return text;
    }
    format!("{}:{}: {}", diag.file, diag.line, text)
}

fn severity_tag(severity: Severity, use_color: bool) -> String {
    let label = match severity {
        Severity::Info => "INFO",
        Severity::Warning => "WARNING",
        Severity::Error => "ERROR",
    };
    if !use_color {
        return label.to_string();
    }
    match severity {
        Severity::Info => label.bold().blue().to_string(),
        Severity::Warning => label.bold().yellow().to_string(),
        Severity::Error => label.bold().red().to_string(),
    }
}

/// Text goes to stderr one line per record; JSON goes to stdout.
pub fn print_report(report: &RunReport, format: OutputFormat, use_color: bool) -> color_eyre::Result<()> {
    match format {
        OutputFormat::Json => {
            let mut out = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut out, report)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            let mut err = std::io::stderr().lock();
            for diag in &report.diagnostics {
                writeln!(err, "{}: {}", severity_tag(diag.severity, use_color), message(diag))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tgwwlang_core::FileRole;

    #[test]
    fn every_code_has_a_message() {
        for code in [
            DiagnosticCode::ParseError,
            DiagnosticCode::ModelRequired,
            DiagnosticCode::ModelNotFound,
            DiagnosticCode::EmptyLanguageAttribute,
            DiagnosticCode::MultipleDefinitions,
            DiagnosticCode::EmptyValue,
            DiagnosticCode::NoValues,
            DiagnosticCode::NotDefaultLanguage,
            DiagnosticCode::IsDefaultLanguage,
            DiagnosticCode::ClosedLangfile,
            DiagnosticCode::SameLanguageName,
            DiagnosticCode::SameLanguageBaseVariant,
            DiagnosticCode::InconsistentPlaceholders,
            DiagnosticCode::UnknownKey,
            DiagnosticCode::InvalidAttribute,
            DiagnosticCode::MissingPlaceholder,
            DiagnosticCode::ExtraPlaceholder,
            DiagnosticCode::MissingString,
            DiagnosticCode::MissingStringsTotal,
            DiagnosticCode::AddedString,
        ] {
            assert!(MESSAGES.iter().any(|(c, _, _)| *c == code), "{code:?}");
        }
    }

    #[test]
    fn params_are_not_expanded_twice() {
        let diag = Diagnostic::new(DiagnosticCode::MissingPlaceholder, "de.xml", Some(FileRole::Target), 7)
            .param("{1}")
            .param("key");
        assert_eq!(message(&diag), "de.xml:7: Missing '{1}' in \"key\".");
    }

    #[test]
    fn unlocated_messages_use_the_file() {
        let diag = Diagnostic::new(DiagnosticCode::SameLanguageName, "de.xml", Some(FileRole::Target), 0)
            .param("English.xml")
            .param("Deutsch");
        assert_eq!(message(&diag), "de.xml and English.xml have the same name: \"Deutsch\".");
        assert_eq!(severity_tag(diag.severity, false), "WARNING");
    }
}
