//! Mutable XML tree kept in a single arena.
//!
//! Whitespace is stored the lxml way: an element's `text` is the character
//! data before its first child, and every node's `tail` is the character data
//! that follows it inside its parent. Moving a node moves its tail with it.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::XmlError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    /// Content is kept in `text`.
    Comment,
    /// Content is kept in `text`.
    ProcessingInstruction,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub text: Option<String>,
    pub tail: Option<String>,
    /// 1-based source line, 0 for nodes that never came from a source.
    pub line: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind, line: usize) -> Self {
        Self {
            kind,
            text: None,
            tail: None,
            line,
            parent: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<Node>,
    root: NodeId,
    /// Comments and processing instructions before the root element.
    prolog: Vec<NodeId>,
    /// Comments and processing instructions after the root element.
    epilog: Vec<NodeId>,
}

/// Byte offsets of line starts.
fn line_starts_of(text: &str) -> Vec<usize> {
    let mut starts = Vec::with_capacity(256);
    starts.push(0);
    for (i, b) in text.as_bytes().iter().enumerate() {
        if *b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

/// Byte position to 1-based line number.
fn byte_pos_to_line(pos: usize, starts: &[usize]) -> usize {
    starts.partition_point(|&s| s <= pos).max(1)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn push_opt(slot: &mut Option<String>, s: &str) {
    match slot {
        Some(existing) => existing.push_str(s),
        None => *slot = Some(s.to_string()),
    }
}

impl XmlTree {
    /// Parse a whole document. Only well-formedness is checked here.
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);
        let starts = line_starts_of(xml);
        let syntax = |pos: usize, message: String| XmlError::Syntax {
            line: byte_pos_to_line(pos, &starts),
            message,
        };

        let mut nodes: Vec<Node> = Vec::new();
        let mut root: Option<NodeId> = None;
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();

        loop {
            let pos = reader.buffer_position() as usize;
            let line = byte_pos_to_line(pos, &starts);
            let event = reader
                .read_event()
                .map_err(|e| syntax(reader.error_position() as usize, e.to_string()))?;

            // Character data and new nodes both need to know where they land.
            let mut new_node: Option<(Node, bool)> = None;
            let mut chars: Option<String> = None;

            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let mut attrs = Vec::new();
                    for attr in e.attributes() {
                        let attr = attr.map_err(|err| syntax(pos, err.to_string()))?;
                        let value = attr
                            .unescape_value()
                            .map_err(|err| syntax(pos, err.to_string()))?;
                        attrs.push((lossy(attr.key.as_ref()), value.into_owned()));
                    }
                    let kind = NodeKind::Element {
                        name: lossy(e.name().as_ref()),
                        attrs,
                    };
                    let is_start = matches!(event, Event::Start(_));
                    new_node = Some((Node::new(kind, line), is_start));
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(t) => {
                    let s = t.unescape().map_err(|err| syntax(pos, err.to_string()))?;
                    chars = Some(s.into_owned());
                }
                Event::CData(c) => {
                    chars = Some(lossy(&c.into_inner()));
                }
                Event::Comment(c) => {
                    let mut node = Node::new(NodeKind::Comment, line);
                    node.text = Some(lossy(&c));
                    new_node = Some((node, false));
                }
                Event::PI(p) => {
                    let mut node = Node::new(NodeKind::ProcessingInstruction, line);
                    node.text = Some(lossy(&p));
                    new_node = Some((node, false));
                }
                Event::Decl(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }

            if let Some(s) = chars {
                match stack.last().copied() {
                    Some(parent) => {
                        let target = match nodes[parent.0].children.last().copied() {
                            Some(prev) => &mut nodes[prev.0].tail,
                            None => &mut nodes[parent.0].text,
                        };
                        push_opt(target, &s);
                    }
                    None if s.trim().is_empty() => {}
                    None => return Err(syntax(pos, "text outside of the root element".into())),
                }
            }

            if let Some((mut node, opens)) = new_node {
                let id = NodeId(nodes.len());
                let is_element = matches!(node.kind, NodeKind::Element { .. });
                match stack.last().copied() {
                    Some(parent) => {
                        node.parent = Some(parent);
                        nodes.push(node);
                        nodes[parent.0].children.push(id);
                    }
                    None if is_element => {
                        if root.is_some() {
                            return Err(syntax(pos, "multiple root elements".into()));
                        }
                        nodes.push(node);
                        root = Some(id);
                    }
                    None => {
                        nodes.push(node);
                        if root.is_some() {
                            epilog.push(id);
                        } else {
                            prolog.push(id);
                        }
                    }
                }
                if opens {
                    stack.push(id);
                }
            }
        }

        if !stack.is_empty() {
            return Err(syntax(xml.len(), "unexpected end of document".into()));
        }
        let root = root.ok_or_else(|| syntax(0, "no root element".into()))?;
        Ok(Self {
            nodes,
            root,
            prolog,
            epilog,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn prolog(&self) -> &[NodeId] {
        &self.prolog
    }

    pub fn epilog(&self) -> &[NodeId] {
        &self.epilog
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_element_named(&self, id: NodeId, name: &str) -> bool {
        self.name(id) == Some(name)
    }

    pub fn is_comment(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Comment)
    }

    /// Element children with the given tag, in document order.
    pub fn elements_named<'a>(&'a self, id: NodeId, name: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |c| self.is_element_named(*c, name))
    }

    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => attrs,
            _ => &[],
        }
    }

    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set or replace an attribute. No-op on non-elements.
    pub fn set_attr(&mut self, id: NodeId, key: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id.0].kind {
            match attrs.iter_mut().find(|(k, _)| k == key) {
                Some((_, v)) => *v = value.to_string(),
                None => attrs.push((key.to_string(), value.to_string())),
            }
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].text.as_deref()
    }

    /// Unlink a node from its parent. The node stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let siblings = &mut self.nodes[parent.0].children;
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Place `node` right after `anchor` under the same parent.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) {
        self.detach(node);
        if let Some(parent) = self.parent(anchor) {
            let idx = self
                .children(parent)
                .iter()
                .position(|c| *c == anchor)
                .map_or(0, |i| i + 1);
            self.insert(parent, idx, node);
        }
    }

    /// Deep-copy a subtree of `src` into this arena. The copy is unattached
    /// and shares nothing with `src`.
    pub fn import(&mut self, src: &XmlTree, id: NodeId) -> NodeId {
        let source = src.node(id);
        let new_id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind: source.kind.clone(),
            text: source.text.clone(),
            tail: source.tail.clone(),
            line: source.line,
            parent: None,
            children: Vec::new(),
        });
        for child in src.children(id).to_vec() {
            let copied = self.import(src, child);
            self.append(new_id, copied);
        }
        new_id
    }
}
