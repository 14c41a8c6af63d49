use std::str::FromStr;

use crate::dom::{NodeId, NodeKind, XmlTree};
use crate::XmlError;

/// Indentation parameters for [`reformat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indentation {
    /// One level: repeated spaces or tabs.
    pub unit: String,
    /// Do not indent the root's direct children.
    pub flat: bool,
}

impl Default for Indentation {
    fn default() -> Self {
        Self {
            unit: "  ".to_string(),
            flat: false,
        }
    }
}

impl FromStr for Indentation {
    type Err = XmlError;

    /// `-?(\d*)(t?)`: leading `-` means flat, digits are the repeat count
    /// (1 when omitted), trailing `t` selects tabs.
    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = || XmlError::IndentSpec(spec.to_string());
        let (flat, rest) = match spec.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, spec),
        };
        let (digits, tabs) = match rest.strip_suffix('t') {
            Some(digits) => (digits, true),
            None => (rest, false),
        };
        if !digits.bytes().all(|b| b.is_ascii_digit()) || (digits.is_empty() && !tabs) {
            return Err(invalid());
        }
        let count: usize = if digits.is_empty() {
            1
        } else {
            digits.parse().map_err(|_| invalid())?
        };
        let unit = if tabs { "\t" } else { " " }.repeat(count);
        Ok(Self { unit, flat })
    }
}

fn blank(s: Option<&str>) -> bool {
    s.map_or(true, |t| t.trim().is_empty())
}

/// Rewrite whitespace-only text and tails so that nesting depth alone decides
/// indentation. Character data with any non-whitespace is kept as is.
pub fn reformat(tree: &mut XmlTree, indentation: &Indentation) {
    let separator = |level: usize| format!("\n{}", indentation.unit.repeat(level.saturating_sub(2)));

    // Levels start at 2 for the root's parent so that `separator(level)` of a
    // non-flat root's children is one unit deep.
    fn walk(tree: &mut XmlTree, id: NodeId, level: usize, is_last: bool, sep: &dyn Fn(usize) -> String) {
        let level = level + 1;
        let children = tree.children(id).to_vec();
        let is_element = matches!(tree.node(id).kind, NodeKind::Element { .. });
        if is_element && !children.is_empty() {
            if blank(tree.text(id)) {
                tree.node_mut(id).text = Some(sep(level));
            }
            let last = children.len() - 1;
            for (i, child) in children.into_iter().enumerate() {
                walk(tree, child, level, i == last, sep);
            }
        }
        let node = tree.node_mut(id);
        if blank(node.tail.as_deref()) {
            node.tail = Some(sep(level - if is_last { 2 } else { 1 }));
        }
    }

    let root = tree.root();
    let start = if indentation.flat { 1 } else { 2 };
    walk(tree, root, start, true, &separator);
}
