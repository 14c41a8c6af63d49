use tgwwlang_parsers_xml::{NodeId, XmlTree};

/// Move runs of top-level comments into the `<string>` that follows them,
/// as its leading children. Scanning stops at the first run that does not
/// end in a `<string>`.
pub fn reattach_comments(tree: &mut XmlTree) -> usize {
    let root = tree.root();
    let mut moved = 0usize;
    let mut pos = 0usize;
    loop {
        let children = tree.children(root).to_vec();
        let Some(start) = (pos..children.len()).find(|&i| tree.is_comment(children[i])) else {
            break;
        };
        let end = (start..children.len())
            .find(|&i| !tree.is_comment(children[i]))
            .unwrap_or(children.len());
        let Some(&target) = children.get(end) else {
            break;
        };
        if !tree.is_element_named(target, "string") {
            break;
        }
        let run: Vec<NodeId> = children[start..end].to_vec();
        tree.insert(target, 0, run[0]);
        for pair in run.windows(2) {
            tree.insert_after(pair[0], pair[1]);
        }
        moved += run.len();
        // The run left the root, so the string now sits at `start`.
        pos = start + 1;
    }
    tracing::debug!(event = "comments_reattached", moved = moved);
    moved
}
