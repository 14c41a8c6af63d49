use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tgwwlang_core::FileRole;

pub const SCHEMA_VERSION: u32 = 1;

/// Stable diagnostic codes. The numbers are part of the output contract:
/// never renumber or reuse one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    ParseError = 1,
    ModelRequired = 2,
    ModelNotFound = 3,
    EmptyLanguageAttribute = 10,
    MultipleDefinitions = 11,
    EmptyValue = 12,
    NoValues = 13,
    NotDefaultLanguage = 14,
    IsDefaultLanguage = 15,
    ClosedLangfile = 16,
    SameLanguageName = 20,
    SameLanguageBaseVariant = 21,
    InconsistentPlaceholders = 22,
    UnknownKey = 23,
    InvalidAttribute = 24,
    MissingPlaceholder = 25,
    ExtraPlaceholder = 26,
    MissingString = 27,
    MissingStringsTotal = 28,
    AddedString = 30,
}

impl DiagnosticCode {
    pub fn number(self) -> u16 {
        self as u16
    }

    pub fn severity(self) -> Severity {
        use DiagnosticCode::*;
        match self {
            ParseError | ModelRequired => Severity::Error,
            ClosedLangfile | MissingStringsTotal | AddedString => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One structured diagnostic record. Rendering is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    /// Numeric form of `code`, stable across releases.
    pub code_number: u16,
    pub severity: Severity,
    /// File identifier as given by the caller (usually a path).
    pub file: String,
    /// `model`, `base` or `target`; absent for run-level records.
    #[schemars(with = "Option<String>")]
    pub role: Option<FileRole>,
    /// 1-based line, 0 when unknown or not applicable.
    pub line: usize,
    pub params: Vec<String>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, file: impl Into<String>, role: Option<FileRole>, line: usize) -> Self {
        Self {
            code,
            code_number: code.number(),
            severity: code.severity(),
            file: file.into(),
            role,
            line,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, value: impl Into<String>) -> Self {
        self.params.push(value.into());
        self
    }
}

/// Run-scoped accumulator. Create one per run; never share between runs.
#[derive(Debug, Default)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.records.push(diag);
    }

    pub fn has_errors(&self) -> bool {
        self.records.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.records.iter().filter(|d| d.code == code).count()
    }

    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_report(self, output: Option<Vec<u8>>) -> RunReport {
        RunReport {
            schema_version: SCHEMA_VERSION,
            success: !self.has_errors(),
            diagnostics: self.records,
            output,
        }
    }
}

/// Everything a run hands back to its caller.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunReport {
    pub schema_version: u32,
    /// False iff a hard error was recorded.
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
    /// Serialized langfile (update mode only).
    #[serde(skip)]
    pub output: Option<Vec<u8>>,
}

impl RunReport {
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }

    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_reflects_only_errors() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::new(DiagnosticCode::UnknownKey, "a.xml", Some(FileRole::Target), 3).param("k"));
        diags.push(Diagnostic::new(DiagnosticCode::AddedString, "a.xml", Some(FileRole::Target), 0).param("k"));
        assert!(!diags.has_errors());
        diags.push(Diagnostic::new(DiagnosticCode::ParseError, "b.xml", Some(FileRole::Model), 1));
        let report = diags.into_report(None);
        assert!(!report.success);
        assert_eq!(report.count(DiagnosticCode::ParseError), 1);
    }

    #[test]
    fn codes_serialize_as_stable_tokens() {
        let d = Diagnostic::new(DiagnosticCode::MissingPlaceholder, "x.xml", Some(FileRole::Base), 7)
            .param("{0}")
            .param("Key");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["code"], "MISSING_PLACEHOLDER");
        assert_eq!(json["code_number"], 25);
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["role"], "base");
        assert_eq!(
            Diagnostic::new(DiagnosticCode::AddedString, "x.xml", None, 0).code_number,
            30
        );
    }
}
