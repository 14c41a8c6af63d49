use indexmap::IndexMap;
use tgwwlang_core::{scan_placeholders, Deprecation, FileRole, LanguageSummary};
use tgwwlang_domain::{Diagnostic, DiagnosticCode, Diagnostics};

use crate::document::{LanguageDocument, StringEntry, ValueEntry};
use crate::dom::XmlTree;
use crate::schema::{parse_bool, SchemaValidator};
use crate::XmlError;

fn flag(tree: &XmlTree, node: crate::NodeId, name: &str) -> bool {
    tree.attr(node, name).and_then(parse_bool).unwrap_or(false)
}

/// Parse and schema-check `text`, then build the document. Returns `None`
/// after recording `PARSE_ERROR`s when the input is not a valid langfile.
pub fn read_language(
    filename: &str,
    role: FileRole,
    text: &str,
    schema: &dyn SchemaValidator,
    diags: &mut Diagnostics,
) -> Option<LanguageDocument> {
    let parse_error = |line: usize, message: String| {
        Diagnostic::new(DiagnosticCode::ParseError, filename, Some(role), line).param(message)
    };

    let tree = match XmlTree::parse(text) {
        Ok(tree) => tree,
        Err(XmlError::Syntax { line, message }) => {
            diags.push(parse_error(line, message));
            return None;
        }
        Err(other) => {
            diags.push(parse_error(0, other.to_string()));
            return None;
        }
    };

    let violations = schema.validate(&tree);
    if !violations.is_empty() {
        tracing::debug!(event = "schema_rejected", file = filename, violations = violations.len());
        for v in violations {
            diags.push(parse_error(v.line, v.message));
        }
        return None;
    }

    Some(load_language(filename, role, tree, diags))
}

/// Build a `LanguageDocument` from a schema-valid tree. Data anomalies are
/// recorded in `diags`; nothing here fails.
pub fn load_language(
    filename: &str,
    role: FileRole,
    tree: XmlTree,
    diags: &mut Diagnostics,
) -> LanguageDocument {
    let root = tree.root();
    let diag = |code: DiagnosticCode, line: usize| {
        Diagnostic::new(code, filename, Some(role), line)
    };

    let mut summary = LanguageSummary::default();
    if let Some(lang) = tree.elements_named(root, "language").next() {
        let get = |name: &str| tree.attr(lang, name).unwrap_or_default().to_string();
        summary = LanguageSummary {
            name: get("name"),
            base: get("base"),
            variant: get("variant"),
            owner: get("owner"),
            is_default: flag(&tree, lang, "isDefault"),
        };
        let line = tree.node(lang).line;
        for (attr, value) in [
            ("name", &summary.name),
            ("base", &summary.base),
            ("variant", &summary.variant),
        ] {
            if value.is_empty() {
                diags.push(diag(DiagnosticCode::EmptyLanguageAttribute, line).param(attr));
            }
        }
    }

    let mut strings = IndexMap::new();
    let mut statuses: IndexMap<String, Deprecation> = IndexMap::new();
    for string in tree.elements_named(root, "string") {
        let key = tree.attr(string, "key").unwrap_or_default().to_string();
        let deprecated = flag(&tree, string, "deprecated");
        let line = tree.node(string).line;

        let current = Deprecation::of_flag(deprecated);
        let status = match statuses.get(&key).copied() {
            Some(previous) => {
                // Active followed by deprecated is a legal transition; anything
                // else redefines the key.
                if current.rank() <= previous.rank() {
                    diags.push(diag(DiagnosticCode::MultipleDefinitions, line).param(key.as_str()));
                }
                previous.union(current)
            }
            None => current,
        };
        statuses.insert(key.clone(), status);

        let mut values = Vec::new();
        for value in tree.elements_named(string, "value") {
            let text = tree.text(value).unwrap_or_default().to_string();
            if text.is_empty() {
                diags.push(diag(DiagnosticCode::EmptyValue, tree.node(value).line).param(key.as_str()));
            }
            values.push(ValueEntry {
                node: value,
                placeholders: scan_placeholders(&text),
                text,
            });
        }
        if values.is_empty() {
            diags.push(diag(DiagnosticCode::NoValues, line).param(key.as_str()));
        }

        strings.entry((key, deprecated)).or_insert_with(|| StringEntry {
            node: string,
            gif: flag(&tree, string, "isgif"),
            values,
        });
    }

    tracing::debug!(
        event = "language_loaded",
        file = filename,
        role = %role,
        strings = strings.len(),
        keys = statuses.len()
    );
    LanguageDocument {
        filename: filename.to_string(),
        role,
        summary,
        strings,
        statuses,
        tree,
    }
}
