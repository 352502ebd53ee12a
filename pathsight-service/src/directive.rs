//! Parsing of function-call directives out of raw LLM replies.
//!
//! The directive grammar is deliberately strict: one leading identifier
//! token, a comma, and the remainder of the reply as a single argument,
//! anchored over the whole cleaned reply. A directive buried mid-paragraph is
//! not recognized. False-positive function triggering on ordinary prose costs
//! more than occasionally missing a real directive.

use regex::Regex;
use std::sync::LazyLock;

/// A parsed `(function_name, argument)` pair from exactly one LLM reply.
/// Created transiently per request and consumed immediately by the
/// dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub argument: String,
}

static DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*,\s*(.+)$").expect("hard-coded pattern"));
static USER_STYLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<userStyle>.*?</userStyle>").expect("hard-coded pattern"));

/// Extract a directive, if the whole reply is one.
///
/// The argument is everything after the first comma, verbatim: it is not
/// re-split, so arguments containing commas survive intact. Models sometimes
/// wrap the directive in quotes or echo `<userStyle>` markup around it; both
/// are stripped before matching.
pub fn parse(reply: &str) -> Option<Directive> {
    let cleaned = USER_STYLE_TAG.replace_all(reply.trim(), "");
    let cleaned = cleaned.replace('"', "");
    let cleaned = cleaned.trim();

    let captures = DIRECTIVE.captures(cleaned)?;
    Some(Directive {
        name: captures[1].to_string(),
        argument: captures[2].trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(reply: &str) -> Directive {
        parse(reply).expect("directive should parse")
    }

    #[test]
    fn test_simple_directive() {
        let directive = parsed("get_cancer_subtype, tcga_10.png");
        assert_eq!(directive.name, "get_cancer_subtype");
        assert_eq!(directive.argument, "tcga_10.png");
    }

    #[test]
    fn test_quotes_are_stripped() {
        let directive = parsed("\"weather, New York\"");
        assert_eq!(directive.name, "weather");
        assert_eq!(directive.argument, "New York");
    }

    #[test]
    fn test_argument_keeps_internal_commas() {
        let directive = parsed("math, 5 + 3, extra");
        assert_eq!(directive.name, "math");
        assert_eq!(directive.argument, "5 + 3, extra");
    }

    #[test]
    fn test_surrounding_whitespace_is_tolerated() {
        let directive = parsed("  get_segmentation_run ,   tcga_20.png  ");
        assert_eq!(directive.name, "get_segmentation_run");
        assert_eq!(directive.argument, "tcga_20.png");
    }

    #[test]
    fn test_user_style_markup_is_stripped() {
        let directive = parsed("<userStyle>Normal</userStyle>get_best_image, tcga_11.png");
        assert_eq!(directive.name, "get_best_image");
        assert_eq!(directive.argument, "tcga_11.png");
    }

    #[test]
    fn test_prose_is_not_a_directive() {
        assert_eq!(parse("That's an interesting question."), None);
        assert_eq!(parse("Hello! How can I help you today?"), None);
    }

    #[test]
    fn test_embedded_directive_is_not_recognized() {
        // Anchored start-to-end: a directive inside a longer answer must not
        // fire.
        assert_eq!(
            parse("Sure, I can help with that.\nget_cancer_subtype, tcga_10.png"),
            None
        );
        assert_eq!(
            parse("get_cancer_subtype, tcga_10.png\nLet me know if you need anything else."),
            None
        );
    }

    #[test]
    fn test_missing_argument_is_not_a_directive() {
        assert_eq!(parse("get_cancer_subtype,"), None);
        assert_eq!(parse("get_cancer_subtype, "), None);
        assert_eq!(parse("get_cancer_subtype"), None);
    }

    #[test]
    fn test_empty_reply_is_not_a_directive() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   \n  "), None);
    }
}
