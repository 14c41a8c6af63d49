use indexmap::IndexMap;
use tgwwlang_core::{Deprecation, FileRole, LanguageSummary, PlaceholderSet};
use tgwwlang_domain::{Diagnostic, DiagnosticCode};

use crate::dom::{NodeId, XmlTree};

/// `(key, deprecated)`.
pub type EntryKey = (String, bool);

#[derive(Debug, Clone)]
pub struct ValueEntry {
    pub node: NodeId,
    pub text: String,
    pub placeholders: PlaceholderSet,
}

/// First definition of a `(key, deprecated)` pair. `node` points into the
/// owning document's tree.
#[derive(Debug, Clone)]
pub struct StringEntry {
    pub node: NodeId,
    pub gif: bool,
    pub values: Vec<ValueEntry>,
}

#[derive(Debug, Clone)]
pub struct LanguageDocument {
    pub filename: String,
    pub role: FileRole,
    pub summary: LanguageSummary,
    /// Index over the tree, in order of first definition.
    pub strings: IndexMap<EntryKey, StringEntry>,
    /// Per-key status, derivable from which pairs `strings` holds.
    pub statuses: IndexMap<String, Deprecation>,
    /// Authoritative serialization order.
    pub tree: XmlTree,
}

impl LanguageDocument {
    pub fn get(&self, key: &str, deprecated: bool) -> Option<&StringEntry> {
        self.strings.get(&(key.to_string(), deprecated))
    }

    pub fn contains(&self, key: &str, deprecated: bool) -> bool {
        self.get(key, deprecated).is_some()
    }

    /// Same-flag lookup first, then the opposite flag. Returns the flag the
    /// entry was found under.
    pub fn resolve(&self, key: &str, deprecated: bool) -> Option<(bool, &StringEntry)> {
        self.get(key, deprecated)
            .map(|s| (deprecated, s))
            .or_else(|| self.get(key, !deprecated).map(|s| (!deprecated, s)))
    }

    pub fn status(&self, key: &str) -> Option<Deprecation> {
        self.statuses.get(key).copied()
    }

    pub fn is_same_file(&self, other: &LanguageDocument) -> bool {
        self.filename == other.filename
    }

    pub fn line_of(&self, node: NodeId) -> usize {
        self.tree.node(node).line
    }

    /// A diagnostic located in this document.
    pub fn diag(&self, code: DiagnosticCode, line: usize) -> Diagnostic {
        Diagnostic::new(code, self.filename.clone(), Some(self.role), line)
    }

    /// Re-derive the status of `key` from the keyed mapping.
    pub fn sync_status(&mut self, key: &str) {
        let active = self.contains(key, false);
        let deprecated = self.contains(key, true);
        match Deprecation::from_presence(active, deprecated) {
            Some(status) => {
                self.statuses.insert(key.to_string(), status);
            }
            None => {
                self.statuses.shift_remove(key);
            }
        }
    }

    /// Deep-copy `entry` (owned by `src`) into this document: the node is
    /// appended to the root and indexed under `(key, deprecated)`.
    pub fn adopt(&mut self, src: &LanguageDocument, entry: &StringEntry, key: &str, deprecated: bool) {
        let node = self.tree.import(&src.tree, entry.node);
        let root = self.tree.root();
        self.tree.append(root, node);
        let value_nodes: Vec<NodeId> = self.tree.elements_named(node, "value").collect();
        let values = entry
            .values
            .iter()
            .zip(value_nodes)
            .map(|(v, node)| ValueEntry {
                node,
                text: v.text.clone(),
                placeholders: v.placeholders.clone(),
            })
            .collect();
        self.strings.insert(
            (key.to_string(), deprecated),
            StringEntry {
                node,
                gif: entry.gif,
                values,
            },
        );
    }

    /// Keys of stored entries in index order. Collected so callers may
    /// mutate the document while walking them.
    pub fn entry_keys(&self) -> Vec<EntryKey> {
        self.strings.keys().cloned().collect()
    }
}
