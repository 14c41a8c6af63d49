//! Structural conformance check run before loading.

use crate::dom::{NodeId, NodeKind, XmlTree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub line: usize,
    pub message: String,
}

/// Validates a parsed tree against the langfile grammar. Returning any
/// violation makes the document unusable for the rest of the run.
pub trait SchemaValidator {
    fn validate(&self, tree: &XmlTree) -> Vec<SchemaViolation>;
}

/// Parse an `xs:boolean` literal.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// The built-in langfile grammar:
///
/// ```text
/// <strings>
///   <language name base variant [owner] [isDefault]/>
///   <string key [deprecated] [isgif]> <value>text</value>+ </string>*
/// </strings>
/// ```
///
/// Comments are allowed anywhere. Missing `name`/`base`/`variant` and
/// `<string>`s without values are left to the loader, which reports them as
/// diagnostics instead of rejecting the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct LangFileSchema;

struct Checker<'a> {
    tree: &'a XmlTree,
    out: Vec<SchemaViolation>,
}

impl Checker<'_> {
    fn fail(&mut self, id: NodeId, message: String) {
        self.out.push(SchemaViolation {
            line: self.tree.node(id).line,
            message,
        });
    }

    fn check_attrs(&mut self, id: NodeId, allowed: &[&str], booleans: &[&str]) {
        let tree = self.tree;
        let tag = tree.name(id).unwrap_or_default().to_string();
        for (key, value) in tree.attrs(id) {
            if !allowed.contains(&key.as_str()) {
                self.fail(id, format!("attribute '{key}' is not allowed on <{tag}>"));
            } else if booleans.contains(&key.as_str()) && parse_bool(value).is_none() {
                self.fail(id, format!("'{value}' is not a valid boolean for '{key}' on <{tag}>"));
            }
        }
    }

    /// Reject non-whitespace character data directly inside `id`, including
    /// the tails of its children.
    fn check_no_mixed_text(&mut self, id: NodeId) {
        let tree = self.tree;
        let mut stray = tree.text(id).is_some_and(|t| !t.trim().is_empty());
        stray |= tree
            .children(id)
            .iter()
            .any(|c| tree.node(*c).tail.as_deref().is_some_and(|t| !t.trim().is_empty()));
        if stray {
            let tag = tree.name(id).unwrap_or_default().to_string();
            self.fail(id, format!("<{tag}> must not contain text"));
        }
    }

    fn only_children(&mut self, id: NodeId, allowed: &[&str]) {
        let tree = self.tree;
        let tag = tree.name(id).unwrap_or_default().to_string();
        for child in tree.children(id).iter().copied() {
            if let NodeKind::Element { name, .. } = &tree.node(child).kind {
                if !allowed.contains(&name.as_str()) {
                    self.fail(child, format!("element <{name}> is not allowed in <{tag}>"));
                }
            }
        }
    }

    fn check_root(&mut self) {
        let tree = self.tree;
        let root = tree.root();
        if !tree.is_element_named(root, "strings") {
            let name = tree.name(root).unwrap_or_default().to_string();
            self.fail(root, format!("root element must be <strings>, found <{name}>"));
            return;
        }
        self.check_attrs(root, &[], &[]);
        self.check_no_mixed_text(root);
        self.only_children(root, &["language", "string"]);

        let languages: Vec<NodeId> = tree.elements_named(root, "language").collect();
        match languages.as_slice() {
            [] => self.fail(root, "missing <language> element".into()),
            [lang] => self.check_language(*lang),
            [_, extra, ..] => self.fail(*extra, "duplicate <language> element".into()),
        }
        for string in tree.elements_named(root, "string") {
            self.check_string(string);
        }
    }

    fn check_language(&mut self, id: NodeId) {
        self.check_attrs(
            id,
            &["name", "base", "variant", "owner", "isDefault"],
            &["isDefault"],
        );
        if !self.tree.children(id).is_empty()
            || self.tree.text(id).is_some_and(|t| !t.trim().is_empty())
        {
            self.fail(id, "<language> must be empty".into());
        }
    }

    fn check_string(&mut self, id: NodeId) {
        self.check_attrs(id, &["key", "deprecated", "isgif"], &["deprecated", "isgif"]);
        if self.tree.attr(id, "key").map_or(true, str::is_empty) {
            self.fail(id, "<string> requires a non-empty 'key'".into());
        }
        self.only_children(id, &["value"]);
        self.check_no_mixed_text(id);
        let tree = self.tree;
        for value in tree.elements_named(id, "value") {
            self.check_attrs(value, &[], &[]);
            if tree
                .children(value)
                .iter()
                .any(|c| tree.name(*c).is_some())
            {
                self.fail(value, "<value> must contain text only".into());
            }
        }
    }
}

impl SchemaValidator for LangFileSchema {
    fn validate(&self, tree: &XmlTree) -> Vec<SchemaViolation> {
        let mut checker = Checker {
            tree,
            out: Vec::new(),
        };
        checker.check_root();
        checker.out
    }
}
