// src/tasks/svg.rs

//! Conservative SVG cleanup.
//!
//! Only the leading XML declaration, doctype, comments and whitespace between
//! tags are removed. Whitespace inside `<text>` is rendered and is kept, as
//! are processing instructions, attributes, ids, `viewBox` and element
//! structure.

use std::sync::LazyLock;

use regex::Regex;

static PROLOG: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)\A\u{FEFF}?\s*<\?xml\s.*?\?>").ok());
static DOCTYPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)<!DOCTYPE[^>\[]*(\[[^\]]*\])?\s*>").ok());
static COMMENT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").ok());
static BETWEEN_TAGS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r">\s+<").ok());
static TEXT_ELEMENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)<text\b.*?</text\s*>").ok());

fn strip(re: &LazyLock<Option<Regex>>, input: String, with: &str) -> String {
    match re.as_ref() {
        Some(re) => re.replace_all(&input, with).into_owned(),
        None => input,
    }
}

/// Collapse inter-tag whitespace everywhere except inside `<text>` elements.
fn collapse_outside_text(input: String) -> String {
    let Some(text) = TEXT_ELEMENT.as_ref() else {
        return strip(&BETWEEN_TAGS, input, "><");
    };

    let mut out = String::with_capacity(input.len());
    let mut cursor = 0;
    for m in text.find_iter(&input) {
        let gap = strip(&BETWEEN_TAGS, input[cursor..m.start()].to_string(), "><");
        let gap = if cursor > 0 { trim_start_before_tag(&gap) } else { &gap };
        out.push_str(trim_end_after_tag(gap));
        out.push_str(m.as_str());
        cursor = m.end();
    }
    let tail = strip(&BETWEEN_TAGS, input[cursor..].to_string(), "><");
    out.push_str(if cursor > 0 { trim_start_before_tag(&tail) } else { &tail });
    out
}

fn trim_end_after_tag(s: &str) -> &str {
    let trimmed = s.trim_end();
    if trimmed.is_empty() || trimmed.ends_with('>') { trimmed } else { s }
}

fn trim_start_before_tag(s: &str) -> &str {
    let trimmed = s.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('<') { trimmed } else { s }
}

pub fn clean(svg: &str) -> String {
    let out = strip(&PROLOG, svg.to_string(), "");
    let out = strip(&DOCTYPE, out, "");
    let out = strip(&COMMENT, out, "");
    let out = collapse_outside_text(out);
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prolog_comments_and_padding_go() {
        let svg = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                   <!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n\
                   <!-- Generator: tool -->\n\
                   <svg viewBox=\"0 0 10 10\">\n  <g id=\"layer\">\n    <rect fill=\"#FF0000\" width=\"10\" height=\"10\"/>\n  </g>\n</svg>\n";
        assert_eq!(
            clean(svg),
            "<svg viewBox=\"0 0 10 10\"><g id=\"layer\"><rect fill=\"#FF0000\" width=\"10\" height=\"10\"/></g></svg>"
        );
    }

    #[test]
    fn stylesheet_instruction_survives() {
        let svg = "<?xml version=\"1.0\"?>\n<?xml-stylesheet href=\"icons.css\" type=\"text/css\"?>\n<svg/>\n";
        assert_eq!(clean(svg), "<?xml-stylesheet href=\"icons.css\" type=\"text/css\"?><svg/>");
    }

    #[test]
    fn spaces_between_tspans_are_rendered_and_kept() {
        let svg = "<svg>\n  <text x=\"0\"><tspan>Hello</tspan> <tspan>world</tspan></text>\n  <g>\n    <text>a</text>\n  </g>\n</svg>";
        assert_eq!(
            clean(svg),
            "<svg><text x=\"0\"><tspan>Hello</tspan> <tspan>world</tspan></text><g><text>a</text></g></svg>"
        );
    }

    #[test]
    fn text_content_is_kept() {
        let svg = "<svg><text x=\"1\">Hello  world</text></svg>";
        assert_eq!(clean(svg), svg);
    }
}
