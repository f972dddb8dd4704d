// src/tasks/html.rs

//! Post-processing of rendered pages.
//!
//! Three passes, applied in order by [`finish_page`]:
//! 1. [`compact`]: collapse whitespace but keep line breaks.
//! 2. [`reindent`]: indent every line with tabs by tag depth.
//! 3. [`strip_preamble`]: drop anything before `<!DOCTYPE`.

use std::sync::LazyLock;

use regex::Regex;

/// Elements whose bodies are emitted verbatim.
const RAW_ELEMENTS: [&str; 4] = ["pre", "textarea", "script", "style"];

/// Elements that never take a closing tag.
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

static PREAMBLE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)\A.*?(<!doctype)").ok());

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    /// `<tag ...>` or `</tag>`.
    Tag {
        text: &'a str,
        name: String,
        closing: bool,
        self_closing: bool,
    },
    /// Comments, doctype and processing instructions.
    Markup(&'a str),
    /// A raw element from its opening to its closing tag.
    Raw(&'a str),
    Text(&'a str),
}

impl Token<'_> {
    fn is_tag_like(&self) -> bool {
        !matches!(self, Token::Text(_))
    }
}

/// Find the `>` ending a tag starting at `start`, skipping quoted values.
fn tag_end(html: &str, start: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (offset, b) in html.as_bytes()[start..].iter().enumerate() {
        match (quote, *b) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, b'"') | (None, b'\'') => quote = Some(*b),
            (None, b'>') => return Some(start + offset),
            _ => {}
        }
    }
    None
}

fn tag_name(tag: &str) -> (String, bool) {
    let inner = tag.trim_start_matches('<');
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let name: String = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == ':')
        .collect();
    (name.to_ascii_lowercase(), closing)
}

fn tokenize(html: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let lower = html.to_ascii_lowercase();
    let mut pos = 0;

    while pos < html.len() {
        let rest = &html[pos..];
        if !rest.starts_with('<') {
            let end = rest.find('<').map(|i| pos + i).unwrap_or(html.len());
            tokens.push(Token::Text(&html[pos..end]));
            pos = end;
            continue;
        }

        if rest.starts_with("<!--") {
            let end = rest.find("-->").map(|i| pos + i + 3).unwrap_or(html.len());
            tokens.push(Token::Markup(&html[pos..end]));
            pos = end;
            continue;
        }

        let Some(end) = tag_end(html, pos) else {
            tokens.push(Token::Text(rest));
            break;
        };
        let text = &html[pos..=end];

        if text.starts_with("<!") || text.starts_with("<?") {
            tokens.push(Token::Markup(text));
            pos = end + 1;
            continue;
        }

        let (name, closing) = tag_name(text);
        if name.is_empty() {
            tokens.push(Token::Text(text));
            pos = end + 1;
            continue;
        }
        let self_closing = text.ends_with("/>");

        if !closing && !self_closing && RAW_ELEMENTS.contains(&name.as_str()) {
            let close = format!("</{name}");
            if let Some(close_at) = lower[end + 1..].find(&close).map(|i| end + 1 + i) {
                let raw_end = tag_end(html, close_at).map(|e| e + 1).unwrap_or(html.len());
                tokens.push(Token::Raw(&html[pos..raw_end]));
                pos = raw_end;
                continue;
            }
        }

        tokens.push(Token::Tag {
            text,
            name,
            closing,
            self_closing,
        });
        pos = end + 1;
    }

    tokens
}

/// Collapse a whitespace run: a run containing a newline becomes one newline,
/// otherwise `edge` runs (touching a tag) vanish and interior runs become a
/// single space.
fn collapse_run(run: &str, edge: bool, out: &mut String) {
    if run.contains('\n') {
        out.push('\n');
    } else if !edge {
        out.push(' ');
    }
}

fn compact_text(text: &str, after_tag: bool, before_tag: bool, out: &mut String) {
    let mut chars = text.char_indices().peekable();
    let mut word_start: Option<usize> = None;

    while let Some((i, c)) = chars.next() {
        if !c.is_whitespace() {
            if word_start.is_none() {
                word_start = Some(i);
            }
            continue;
        }
        if let Some(start) = word_start.take() {
            out.push_str(&text[start..i]);
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, d)) = chars.peek() {
            if !d.is_whitespace() {
                break;
            }
            end = j + d.len_utf8();
            chars.next();
        }
        let leading = i == 0 && after_tag;
        let trailing = end == text.len() && before_tag;
        collapse_run(&text[i..end], leading || trailing, out);
    }
    if let Some(start) = word_start {
        out.push_str(&text[start..]);
    }
}

/// Collapse whitespace while preserving line breaks.
///
/// Bodies of `pre`, `textarea`, `script` and `style` and comments are kept
/// unchanged.
pub fn compact(html: &str) -> String {
    let tokens = tokenize(html);
    let mut out = String::with_capacity(html.len());

    for (idx, token) in tokens.iter().enumerate() {
        match token {
            Token::Text(text) => {
                let after_tag = idx > 0 && tokens[idx - 1].is_tag_like();
                let before_tag = tokens.get(idx + 1).is_some_and(Token::is_tag_like);
                compact_text(text, after_tag || idx == 0, before_tag || idx + 1 == tokens.len(), &mut out);
            }
            Token::Tag { text, .. } | Token::Markup(text) | Token::Raw(text) => out.push_str(text),
        }
    }

    out
}

/// Indent every line with tabs according to element depth.
///
/// Lines starting with a closing tag are indented one level less. Raw
/// element bodies are not touched.
pub fn reindent(html: &str) -> String {
    let tokens = tokenize(html);
    let mut out = String::with_capacity(html.len() + html.len() / 8);
    let mut depth: usize = 0;
    let mut at_line_start = true;

    for token in tokens.iter() {
        match token {
            Token::Text(text) => {
                for (n, line) in text.split('\n').enumerate() {
                    if n > 0 {
                        out.push('\n');
                        at_line_start = true;
                    }
                    let line = if at_line_start { line.trim_start() } else { line };
                    if line.is_empty() {
                        continue;
                    }
                    if at_line_start {
                        push_indent(&mut out, depth);
                        at_line_start = false;
                    }
                    out.push_str(line);
                }
            }
            Token::Tag {
                text,
                name,
                closing,
                self_closing,
            } => {
                if *closing {
                    depth = depth.saturating_sub(1);
                }
                if at_line_start {
                    push_indent(&mut out, depth);
                    at_line_start = false;
                }
                out.push_str(text);
                if !*closing && !*self_closing && !VOID_ELEMENTS.contains(&name.as_str()) {
                    depth += 1;
                }
            }
            Token::Markup(text) | Token::Raw(text) => {
                if at_line_start {
                    push_indent(&mut out, depth);
                    at_line_start = false;
                }
                out.push_str(text);
            }
        }
    }

    out
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

/// Remove everything before the first `<!DOCTYPE` (any case). Pages without
/// a doctype are returned unchanged.
pub fn strip_preamble(html: &str) -> String {
    match PREAMBLE.as_ref() {
        Some(re) => re.replace(html, "$1").into_owned(),
        None => html.to_string(),
    }
}

/// All post-processing passes in order.
pub fn finish_page(html: &str) -> String {
    strip_preamble(&reindent(&compact(html)))
}
