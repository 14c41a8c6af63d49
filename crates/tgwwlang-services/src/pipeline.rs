//! One check/update run over in-memory sources.

use tgwwlang_core::{FileRole, Result};
use tgwwlang_domain::{Diagnostic, DiagnosticCode, Diagnostics, RunReport};
use tgwwlang_parsers_xml::{
    read_language, reformat, to_bytes, Indentation, LangFileSchema, LanguageDocument, SchemaValidator,
};
use tgwwlang_validate as validate;

use crate::attributes::assign_attributes;
use crate::comments::reattach_comments;
use crate::merge::{merge_strings, MergeOptions};

/// A named langfile already read into memory.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub text: String,
}

impl Source {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Check,
    Update,
}

#[derive(Debug, Clone)]
pub enum ModelInput {
    Provided(Source),
    /// The default model was looked up at this path and is not there.
    NotFound(String),
}

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub mode: Mode,
    pub target: Source,
    pub model: ModelInput,
    pub base: Option<Source>,
    pub merge: MergeOptions,
    pub move_comments: bool,
    pub assign_attributes: bool,
    pub indentation: Indentation,
}

impl RunRequest {
    pub fn check(target: Source, model: ModelInput) -> Self {
        Self {
            mode: Mode::Check,
            target,
            model,
            base: None,
            merge: MergeOptions::default(),
            move_comments: false,
            assign_attributes: false,
            indentation: Indentation::default(),
        }
    }

    pub fn update(target: Source, model: ModelInput) -> Self {
        Self {
            mode: Mode::Update,
            ..Self::check(target, model)
        }
    }
}

fn load(
    source: &Source,
    role: FileRole,
    schema: &dyn SchemaValidator,
    diags: &mut Diagnostics,
) -> Option<LanguageDocument> {
    let doc = read_language(&source.name, role, &source.text, schema, diags);
    if doc.is_none() {
        tracing::info!(event = "run_aborted", file = %source.name, role = %role, reason = "parse_error");
    }
    doc
}

/// Run with the built-in langfile grammar.
pub fn run(request: &RunRequest) -> Result<RunReport> {
    run_with_schema(request, &LangFileSchema)
}

/// Load, validate and (in update mode) rewrite the target. Hard errors end
/// the run early with `success == false`; everything else is a diagnostic.
pub fn run_with_schema(request: &RunRequest, schema: &dyn SchemaValidator) -> Result<RunReport> {
    let mut diags = Diagnostics::new();
    tracing::debug!(event = "run_started", target = %request.target.name, mode = ?request.mode);

    // Models.
    let model = match &request.model {
        ModelInput::Provided(source) => {
            let Some(model) = load(source, FileRole::Model, schema, &mut diags) else {
                return Ok(diags.into_report(None));
            };
            validate::check_model_role(&model, &mut diags);
            validate::check_placeholder_sanity(&model, &mut diags);
            Some(model)
        }
        ModelInput::NotFound(path) => {
            diags.push(Diagnostic::new(DiagnosticCode::ModelNotFound, path.as_str(), Some(FileRole::Model), 0).param(path.as_str()));
            None
        }
    };
    if request.assign_attributes && model.is_none() {
        tracing::info!(event = "run_aborted", reason = "model_required", option = "--assign-attributes");
        diags.push(
            Diagnostic::new(DiagnosticCode::ModelRequired, request.target.name.as_str(), None, 0)
                .param("--assign-attributes"),
        );
        return Ok(diags.into_report(None));
    }

    let base = match &request.base {
        Some(source) => match &model {
            Some(m) if m.filename == source.name => Some(m.clone()),
            _ => match load(source, FileRole::Base, schema, &mut diags) {
                Some(base) => Some(base),
                None => return Ok(diags.into_report(None)),
            },
        },
        None => None,
    };
    let Some(mut lang) = load(&request.target, FileRole::Target, schema, &mut diags) else {
        return Ok(diags.into_report(None));
    };
    validate::check_target_role(&lang, &mut diags);

    // Validation.
    if let Some(model) = &model {
        validate::check_summary(&lang, model, &mut diags);
    }
    let base_is_distinct = match (&base, &model) {
        (Some(b), Some(m)) => !b.is_same_file(m),
        (Some(_), None) => true,
        _ => false,
    };
    if let (Some(base), true) = (&base, base_is_distinct) {
        validate::check_summary(&lang, base, &mut diags);
        if model.is_none() {
            validate::check_placeholder_sanity(base, &mut diags);
        }
    }
    if let Some(model) = &model {
        if let (Some(base), true) = (&base, base_is_distinct) {
            validate::check_available_strings(base, model, &mut diags);
        }
        validate::check_available_strings(&lang, model, &mut diags);
        let missing_in = match &base {
            Some(base) if request.merge.add_missing => base,
            _ => &lang,
        };
        validate::check_missing_strings(missing_in, model, &mut diags);
    }

    if request.mode == Mode::Check {
        return Ok(diags.into_report(None));
    }

    // Mutation.
    if request.move_comments {
        reattach_comments(&mut lang.tree);
    }
    if let Some(base) = &base {
        let effective_model = model.as_ref().unwrap_or(base);
        merge_strings(&mut lang, base, effective_model, &request.merge, &mut diags)?;
    }
    if request.assign_attributes {
        if let Some(model) = &model {
            assign_attributes(&mut lang, model, &mut diags);
        }
    }
    reformat(&mut lang.tree, &request.indentation);
    let bytes = to_bytes(&lang.tree)?;
    tracing::debug!(event = "run_finished", target = %lang.filename, bytes = bytes.len(), diagnostics = diags.len());
    Ok(diags.into_report(Some(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexSet;
    use tgwwlang_core::Deprecation;
    use tgwwlang_domain::Severity;

    const ENGLISH: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<strings>
  <language name="English" base="English" variant="Standard" isDefault="true"/>
  <string key="A">
    <value>Hello {name}</value>
  </string>
  <string key="B" deprecated="true">
    <value>Old</value>
  </string>
  <string key="C">
    <value>See</value>
  </string>
</strings>
"#;

    const BASE: &str = r#"<strings>
  <language name="Deutsch" base="German" variant="Standard"/>
  <string key="C"><value>Sieh</value></string>
  <string key="A"><value>Hallo {name}</value></string>
  <string key="B"><value>Alt</value></string>
</strings>"#;

    const TARGET: &str = r#"<strings>
  <language name="Bairisch" base="German" variant="Bavarian"/>
  <!-- greeting -->
  <string key="A"><value>Servus {nam}</value></string>
</strings>"#;

    fn model() -> ModelInput {
        ModelInput::Provided(Source::new("English.xml", ENGLISH))
    }

    fn output(report: &RunReport) -> String {
        String::from_utf8(report.output.clone().expect("update output")).unwrap()
    }

    #[test]
    fn check_reports_without_output() {
        let report = run(&RunRequest::check(Source::new("Bavarian.xml", TARGET), model())).unwrap();
        assert!(report.success);
        assert!(report.output.is_none());
        assert_eq!(report.count(DiagnosticCode::MissingPlaceholder), 1);
        assert_eq!(report.count(DiagnosticCode::ExtraPlaceholder), 1);
        let missing: Vec<&str> = report
            .with_code(DiagnosticCode::MissingString)
            .map(|d| d.params[0].as_str())
            .collect();
        assert_eq!(missing, vec!["C"]);
        assert_eq!(report.count(DiagnosticCode::MissingStringsTotal), 1);
    }

    const SLOPPY_BASE: &str = r#"<strings>
  <language name="Deutsch" base="German" variant="Standard"/>
  <string key="A"><value>Hallo {name}</value><value>Hallo {nom}</value></string>
</strings>"#;

    #[test]
    fn base_placeholders_are_only_checked_without_a_model() {
        let mut request = RunRequest::check(Source::new("Bavarian.xml", TARGET), model());
        request.base = Some(Source::new("German.xml", SLOPPY_BASE));
        let report = run(&request).unwrap();
        assert_eq!(report.count(DiagnosticCode::InconsistentPlaceholders), 0);

        request.model = ModelInput::NotFound("English.xml".into());
        let report = run(&request).unwrap();
        let files: Vec<&str> = report
            .with_code(DiagnosticCode::InconsistentPlaceholders)
            .map(|d| d.file.as_str())
            .collect();
        assert_eq!(files, vec!["German.xml"]);
    }

    #[test]
    fn missing_default_model_skips_model_checks() {
        let report = run(&RunRequest::check(
            Source::new("Bavarian.xml", TARGET),
            ModelInput::NotFound("English.xml".into()),
        ))
        .unwrap();
        assert!(report.success);
        assert_eq!(report.count(DiagnosticCode::ModelNotFound), 1);
        assert_eq!(report.diagnostics.len(), 1);
    }

    #[test]
    fn parse_errors_abort_the_run() {
        let mut request = RunRequest::update(Source::new("Broken.xml", "<strings><string></strings>"), model());
        request.move_comments = true;
        let report = run(&request).unwrap();
        assert!(!report.success);
        assert!(report.output.is_none());
        let errors: Vec<_> = report.diagnostics.iter().filter(|d| d.severity == Severity::Error).collect();
        assert!(!errors.is_empty());
        assert!(errors.iter().all(|d| d.code == DiagnosticCode::ParseError && d.file == "Broken.xml"));
    }

    #[test]
    fn schema_violations_become_parse_errors_per_violation() {
        let bad = "<strings>\n<language/>\n<string key=\"a\" isgif=\"maybe\"><value>x</value></string>\n<bogus/>\n</strings>";
        let report = run(&RunRequest::check(Source::new("Bad.xml", bad), model())).unwrap();
        assert!(!report.success);
        let lines: Vec<usize> = report.with_code(DiagnosticCode::ParseError).map(|d| d.line).collect();
        assert_eq!(lines, vec![4, 3]);
    }

    #[test]
    fn assign_attributes_needs_a_model() {
        let mut request = RunRequest::update(Source::new("Bavarian.xml", TARGET), ModelInput::NotFound("English.xml".into()));
        request.assign_attributes = true;
        let report = run(&request).unwrap();
        assert!(!report.success);
        assert_eq!(report.count(DiagnosticCode::ModelRequired), 1);
        assert!(report.output.is_none());
    }

    #[test]
    fn update_merges_reorders_and_formats() {
        let mut request = RunRequest::update(Source::new("Bavarian.xml", TARGET), model());
        request.base = Some(Source::new("German.xml", BASE));
        request.merge = MergeOptions {
            reorder: true,
            add_missing: true,
            only: None,
        };
        request.move_comments = true;
        let report = run(&request).unwrap();
        assert!(report.success);
        let added: Vec<&str> = report.with_code(DiagnosticCode::AddedString).map(|d| d.params[0].as_str()).collect();
        // B is deprecated in the model and stays out.
        assert_eq!(added, vec!["C"]);
        let out = output(&report);
        let c = out.find("key=\"C\"").unwrap();
        let a = out.find("key=\"A\"").unwrap();
        assert!(c < a, "{out}");
        assert!(!out.contains("key=\"B\""));
        assert!(out.contains("<string key=\"A\">\n    <!-- greeting -->\n    <value>"), "{out}");
    }

    #[test]
    fn missing_strings_are_checked_against_the_base_when_copying() {
        let mut request = RunRequest::check(Source::new("Bavarian.xml", TARGET), model());
        request.base = Some(Source::new("German.xml", BASE));
        request.merge.add_missing = true;
        let report = run(&request).unwrap();
        assert!(report.success);
        assert_eq!(report.count(DiagnosticCode::MissingString), 0);

        request.merge.add_missing = false;
        let report = run(&request).unwrap();
        assert_eq!(report.count(DiagnosticCode::MissingString), 1);
    }

    #[test]
    fn only_adds_requested_keys_even_when_deprecated() {
        let mut request = RunRequest::update(Source::new("Bavarian.xml", TARGET), model());
        request.base = Some(Source::new("German.xml", BASE));
        request.merge = MergeOptions {
            reorder: false,
            add_missing: true,
            only: Some(IndexSet::from(["B".to_string()])),
        };
        let report = run(&request).unwrap();
        assert_eq!(report.count(DiagnosticCode::AddedString), 1);
        let out = output(&report);
        assert!(out.contains("<string key=\"B\">"), "{out}");
        assert!(!out.contains("key=\"C\""));
    }

    #[test]
    fn assign_attributes_marks_deprecated_strings() {
        let target = r#"<strings><language name="x" base="y" variant="z"/><string key="B"><value>b</value></string></strings>"#;
        let mut request = RunRequest::update(Source::new("X.xml", target), model());
        request.assign_attributes = true;
        request.indentation = "-t".parse().unwrap();
        let report = run(&request).unwrap();
        assert!(report.success);
        let out = output(&report);
        assert!(out.contains("<string key=\"B\" deprecated=\"true\">\n\t<value>b</value>\n</string>"), "{out}");
    }

    #[test]
    fn base_equal_to_model_is_loaded_once() {
        let mut request = RunRequest::check(Source::new("Bavarian.xml", TARGET), model());
        request.base = Some(Source::new("English.xml", ENGLISH));
        let report = run(&request).unwrap();
        assert_eq!(report.count(DiagnosticCode::SameLanguageName), 0);
        assert!(report.diagnostics.iter().all(|d| d.role != Some(FileRole::Base)));
    }

    #[test]
    fn update_output_is_stable_when_rerun() {
        let mut request = RunRequest::update(Source::new("Bavarian.xml", TARGET), model());
        request.base = Some(Source::new("German.xml", BASE));
        request.merge.add_missing = true;
        request.move_comments = true;
        let first = output(&run(&request).unwrap());
        request.target = Source::new("Bavarian.xml", first.clone());
        let second = run(&request).unwrap();
        assert_eq!(second.count(DiagnosticCode::AddedString), 0);
        assert_eq!(output(&second), first);
    }

    #[test]
    fn deprecation_lattice_survives_a_run() {
        let target = r#"<strings><language name="x" base="y" variant="z"/><string key="C"><value>c</value></string><string key="C" deprecated="true"><value>old c</value></string></strings>"#;
        let mut diags = Diagnostics::new();
        let doc = read_language("X.xml", FileRole::Target, target, &LangFileSchema, &mut diags).unwrap();
        assert_eq!(doc.status("C"), Some(Deprecation::Both));
        let report = run(&RunRequest::check(Source::new("X.xml", target), model())).unwrap();
        assert_eq!(report.count(DiagnosticCode::MultipleDefinitions), 0);
    }
}
