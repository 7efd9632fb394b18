//! Minimal HTML-to-text reduction for phrase and price scanning.

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script>").ok());
static STYLE_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?is)<style\b.*?</style>").ok());
static TAG_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"<[^>]+>").ok());
static SPACE_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\s+").ok());

fn replace_all(re: &Lazy<Option<Regex>>, input: &str, with: &str) -> String {
    match re.as_ref() {
        Some(re) => re.replace_all(input, with).into_owned(),
        None => input.to_string(),
    }
}

/// Decode the handful of entities that show up in visible text.
#[must_use]
pub fn decode_basic_entities(input: &str) -> String {
    input
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&bull;", "•")
        .replace("&#8226;", "•")
        .replace("&amp;", "&")
}

/// Strip scripts, styles and tags, collapse whitespace and decode entities.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let without_scripts = replace_all(&SCRIPT_RE, html, " ");
    let without_styles = replace_all(&STYLE_RE, &without_scripts, " ");
    let without_tags = replace_all(&TAG_RE, &without_styles, " ");
    let decoded = decode_basic_entities(&without_tags).replace('\u{a0}', " ");
    replace_all(&SPACE_RE, &decoded, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_scripts_and_styles() {
        let html = r#"<html><head><style>.a { color: red }</style>
            <script type="text/javascript">var x = "account has been suspended";</script>
            </head><body><p>Hello&nbsp;<b>world</b></p></body></html>"#;
        assert_eq!(html_to_text(html), "Hello world");
    }

    #[test]
    fn test_decodes_entities() {
        assert_eq!(
            html_to_text("<span>BUMI &bull; IDX</span> &amp; more"),
            "BUMI • IDX & more"
        );
    }
}
