use std::io::Write;

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::dom::{NodeId, NodeKind, XmlTree};
use crate::XmlError;

pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";

fn write_chars<W: Write>(w: &mut Writer<W>, s: Option<&str>) -> Result<(), XmlError> {
    if let Some(s) = s.filter(|s| !s.is_empty()) {
        // Quotes stay literal in character data.
        w.write_event(Event::Text(BytesText::from_escaped(partial_escape(s))))?;
    }
    Ok(())
}

fn write_node<W: Write>(w: &mut Writer<W>, tree: &XmlTree, id: NodeId, with_tail: bool) -> Result<(), XmlError> {
    let node = tree.node(id);
    match &node.kind {
        NodeKind::Element { name, attrs } => {
            let mut start = BytesStart::new(name.as_str());
            for (k, v) in attrs {
                start.push_attribute((k.as_str(), v.as_str()));
            }
            let children = tree.children(id);
            let text = node.text.as_deref().filter(|t| !t.is_empty());
            if children.is_empty() && text.is_none() {
                w.write_event(Event::Empty(start))?;
            } else {
                w.write_event(Event::Start(start))?;
                write_chars(w, text)?;
                for child in children {
                    write_node(w, tree, *child, true)?;
                }
                w.write_event(Event::End(BytesEnd::new(name.as_str())))?;
            }
        }
        NodeKind::Comment => {
            let body = node.text.as_deref().unwrap_or_default();
            w.write_event(Event::Comment(BytesText::from_escaped(body)))?;
        }
        NodeKind::ProcessingInstruction => {
            let body = node.text.as_deref().unwrap_or_default();
            w.write_event(Event::PI(BytesPI::new(body)))?;
        }
    }
    if with_tail {
        write_chars(w, node.tail.as_deref())?;
    }
    Ok(())
}

/// Render the tree to UTF-8 bytes behind the fixed XML declaration.
/// Top-level comments and processing instructions go on their own lines.
pub fn to_bytes(tree: &XmlTree) -> Result<Vec<u8>, XmlError> {
    let mut out = XML_DECLARATION.as_bytes().to_vec();
    let mut w = Writer::new(&mut out);
    for id in tree.prolog() {
        write_node(&mut w, tree, *id, false)?;
        w.get_mut().write_all(b"\n")?;
    }
    write_node(&mut w, tree, tree.root(), false)?;
    let root_tail = tree.node(tree.root()).tail.as_deref();
    if let Some(tail) = root_tail.filter(|t| t.trim().is_empty()) {
        w.get_mut().write_all(tail.as_bytes())?;
    }
    for id in tree.epilog() {
        write_node(&mut w, tree, *id, false)?;
        w.get_mut().write_all(b"\n")?;
    }
    Ok(out)
}
