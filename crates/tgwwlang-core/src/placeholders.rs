use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Distinct placeholder literals found in one `<value>`.
pub type PlaceholderSet = BTreeSet<String>;

/// Extract `{...}` placeholder tokens from a value's text.
///
/// `{{` is an escaped literal brace. A run of opening braces starts a token
/// only when its length is odd; the token is the last brace of the run plus
/// everything up to the next `}`. Braces never nest inside a token.
pub fn scan_placeholders(text: &str) -> PlaceholderSet {
    static RE_BRACE_RUN: OnceLock<Regex> = OnceLock::new();
    let re = RE_BRACE_RUN.get_or_init(|| Regex::new(r"(\{+)([^{}]*\})").unwrap());

    let mut set = PlaceholderSet::new();
    for caps in re.captures_iter(text) {
        if caps[1].len() % 2 == 1 {
            set.insert(format!("{{{}", &caps[2]));
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> PlaceholderSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn escaped_braces_are_not_tokens() {
        assert_eq!(scan_placeholders("{{literal}} {real}"), set(&["{real}"]));
        assert_eq!(scan_placeholders("{{}}"), set(&[]));
    }

    #[test]
    fn adjacent_tokens_and_odd_runs() {
        assert_eq!(scan_placeholders("{a}{b}"), set(&["{a}", "{b}"]));
        assert_eq!(scan_placeholders("{{{0}}}"), set(&["{0}"]));
        assert_eq!(scan_placeholders("{{{{x}"), set(&[]));
    }

    #[test]
    fn empty_and_plain_text() {
        assert!(scan_placeholders("").is_empty());
        assert!(scan_placeholders("no tokens } here {").is_empty());
        assert_eq!(scan_placeholders("{0} and {0} again"), set(&["{0}"]));
    }

    #[test]
    fn scanning_is_idempotent() {
        let text = "Hi {name}, you have {{escaped}} {count} votes";
        assert_eq!(scan_placeholders(text), scan_placeholders(text));
        assert_eq!(scan_placeholders(text), set(&["{count}", "{name}"]));
    }
}
