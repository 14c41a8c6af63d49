use tgwwlang_core::Deprecation;
use tgwwlang_domain::{DiagnosticCode, Diagnostics};
use tgwwlang_parsers_xml::LanguageDocument;

/// Copy `deprecated` and `isgif` from the model onto matching entries of
/// `lang`. Keys the model does not know are left alone.
pub fn assign_attributes(lang: &mut LanguageDocument, model: &LanguageDocument, diags: &mut Diagnostics) {
    let mut deprecated_count = 0usize;
    let mut gif_count = 0usize;
    for (key, deprecated) in lang.entry_keys() {
        let Some(model_status) = model.status(&key) else {
            continue;
        };
        let Some(node) = lang.get(&key, deprecated).map(|s| s.node) else {
            continue;
        };

        let rekey = !deprecated && model_status == Deprecation::Deprecated;
        if rekey {
            lang.tree.set_attr(node, "deprecated", "true");
            deprecated_count += 1;
            let old = (key.clone(), false);
            if lang.contains(&key, true) {
                // Two deprecated definitions now; the earlier one stays indexed.
                diags.push(lang.diag(DiagnosticCode::MultipleDefinitions, lang.line_of(node)).param(key.as_str()));
                lang.strings.shift_remove(&old);
            } else if let Some(index) = lang.strings.get_index_of(&old) {
                if let Some(entry) = lang.strings.shift_remove(&old) {
                    lang.strings.shift_insert(index, (key.clone(), true), entry);
                }
            }
            lang.sync_status(&key);
        }

        let model_gif = model.resolve(&key, deprecated).is_some_and(|(_, s)| s.gif);
        if model_gif {
            lang.tree.set_attr(node, "isgif", "true");
            // A dropped duplicate is no longer indexed; only its node changes.
            if let Some(entry) = lang.strings.get_mut(&(key.clone(), deprecated || rekey)) {
                if entry.node == node {
                    entry.gif = true;
                }
            }
            gif_count += 1;
        }
    }
    tracing::debug!(
        event = "attributes_assigned",
        file = %lang.filename,
        deprecated = deprecated_count,
        gif = gif_count
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{doc, doc_xml};
    use tgwwlang_core::FileRole;

    #[test]
    fn deprecates_and_rekeys_entries() {
        let model = doc("English", FileRole::Model, &[("A", true), ("B", false)]);
        let mut lang = doc("Lang", FileRole::Target, &[("A", false), ("B", false), ("Z", false)]);
        let mut diags = Diagnostics::new();
        assign_attributes(&mut lang, &model, &mut diags);
        assert!(diags.is_empty());
        assert!(lang.contains("A", true));
        assert!(!lang.contains("A", false));
        assert_eq!(lang.status("A"), Some(Deprecation::Deprecated));
        let keys: Vec<_> = lang.strings.keys().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["A", "B", "Z"]);
        let node = lang.get("A", true).unwrap().node;
        assert_eq!(lang.tree.attr(node, "deprecated"), Some("true"));
        let b = lang.get("B", false).unwrap().node;
        assert_eq!(lang.tree.attr(b, "deprecated"), None);
    }

    #[test]
    fn second_deprecated_definition_is_reported() {
        let model = doc("English", FileRole::Model, &[("A", true)]);
        let mut lang = doc("Lang", FileRole::Target, &[("A", true), ("A", false)]);
        let first = lang.get("A", true).unwrap().node;
        let mut diags = Diagnostics::new();
        assign_attributes(&mut lang, &model, &mut diags);
        assert_eq!(diags.count(DiagnosticCode::MultipleDefinitions), 1);
        assert_eq!(lang.strings.len(), 1);
        assert_eq!(lang.get("A", true).unwrap().node, first);
        assert_eq!(lang.status("A"), Some(Deprecation::Deprecated));
        assert_eq!(lang.tree.elements_named(lang.tree.root(), "string").count(), 2);
    }

    #[test]
    fn copies_gif_flag_from_either_definition() {
        let model = doc_xml(
            "English",
            FileRole::Model,
            "<string key=\"A\" deprecated=\"true\" isgif=\"true\"><value>x</value></string>\n<string key=\"B\" isgif=\"1\"><value>x</value></string>",
        );
        let mut lang = doc("Lang", FileRole::Target, &[("A", false), ("B", false)]);
        let mut diags = Diagnostics::new();
        assign_attributes(&mut lang, &model, &mut diags);
        for (key, deprecated) in [("A", true), ("B", false)] {
            let entry = lang.get(key, deprecated).unwrap();
            assert!(entry.gif, "{key}");
            assert_eq!(lang.tree.attr(entry.node, "isgif"), Some("true"));
        }
    }
}
