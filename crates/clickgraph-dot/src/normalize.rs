//! Source rewriting ahead of the DOT grammar.
//!
//! `graphviz-rust` only recognises subgraphs introduced by the `subgraph`
//! keyword, and cannot read a subgraph at the start of an edge statement.
//! Both forms are valid DOT, so the source is rewritten before parsing:
//!
//! - an anonymous `{ ... }` group gets the `subgraph` keyword
//! - a subgraph followed by an edge operator at the start of a statement is
//!   left in place as a plain subgraph statement, and a
//!   [`SUBGRAPH_ENDPOINT`] node id is inserted after it to start the edge
//!
//! Insertions never add line breaks, so line numbers in parse errors still
//! point into the caller's source.

use std::borrow::Cow;

use log::trace;

/// Node id standing for the members of the subgraph statement right before it.
pub const SUBGRAPH_ENDPOINT: &str = "\u{1}subgraph-endpoint";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Word,
    Quoted,
    Html,
    EdgeOp,
    Open,
    Close,
    Other,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    kind: Kind,
    start: usize,
    end: usize,
}

/// Rewrites subgraph forms the grammar does not accept into ones it does.
pub fn normalize_subgraphs(source: &str) -> Cow<'_, str> {
    let tokens = tokenize(source);
    let is_keyword = |index: usize| {
        let token = tokens[index];
        token.kind == Kind::Word && &source[token.start..token.end] == "subgraph"
    };

    let mut insertions: Vec<(usize, String)> = Vec::new();
    // The first brace opens the graph body.
    let opens = tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| token.kind == Kind::Open)
        .map(|(index, _)| index)
        .skip(1);

    for open in opens {
        let start = if open >= 1 && is_keyword(open - 1) {
            open - 1
        } else if open >= 2
            && is_keyword(open - 2)
            && matches!(tokens[open - 1].kind, Kind::Word | Kind::Quoted | Kind::Html)
        {
            open - 2
        } else {
            insertions.push((tokens[open].start, "subgraph ".to_string()));
            open
        };

        let Some(close) = matching_close(&tokens, open) else {
            continue;
        };
        let leads_edge = tokens
            .get(close + 1)
            .is_some_and(|token| token.kind == Kind::EdgeOp);
        let follows_edge = start > 0 && tokens[start - 1].kind == Kind::EdgeOp;
        if leads_edge && !follows_edge {
            insertions.push((tokens[close].end, format!(" \"{SUBGRAPH_ENDPOINT}\"")));
        }
    }

    if insertions.is_empty() {
        return Cow::Borrowed(source);
    }
    trace!(insertions = insertions.len(); "Rewrote subgraph forms");

    insertions.sort_by_key(|(offset, _)| *offset);
    let mut rewritten = String::with_capacity(source.len() + insertions.len() * 24);
    let mut copied = 0;
    for (offset, text) in insertions {
        rewritten.push_str(&source[copied..offset]);
        rewritten.push_str(&text);
        copied = offset;
    }
    rewritten.push_str(&source[copied..]);
    Cow::Owned(rewritten)
}

fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        match token.kind {
            Kind::Open => depth += 1,
            Kind::Close => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits `source` into significant tokens, skipping whitespace and comments.
fn tokenize(source: &str) -> Vec<Token> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let kind = match bytes[pos] {
            b' ' | b'\t' | b'\r' | b'\n' => {
                pos += 1;
                continue;
            }
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                pos = source[pos + 2..]
                    .find("*/")
                    .map_or(bytes.len(), |end| pos + 2 + end + 2);
                continue;
            }
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                pos = skip_line(source, pos);
                continue;
            }
            b'#' => {
                pos = skip_line(source, pos);
                continue;
            }
            b'"' => {
                pos += 1;
                while pos < bytes.len() && bytes[pos] != b'"' {
                    pos += if bytes[pos] == b'\\' { 2 } else { 1 };
                }
                pos = (pos + 1).min(bytes.len());
                Kind::Quoted
            }
            b'<' => {
                let mut depth = 0usize;
                while pos < bytes.len() {
                    match bytes[pos] {
                        b'<' => depth += 1,
                        b'>' => {
                            depth -= 1;
                            if depth == 0 {
                                pos += 1;
                                break;
                            }
                        }
                        _ => {}
                    }
                    pos += 1;
                }
                Kind::Html
            }
            b'-' if matches!(bytes.get(pos + 1), Some(b'>' | b'-')) => {
                pos += 2;
                Kind::EdgeOp
            }
            b'{' => {
                pos += 1;
                Kind::Open
            }
            b'}' => {
                pos += 1;
                Kind::Close
            }
            byte if is_word_byte(byte) || byte == b'-' => {
                pos += 1;
                while pos < bytes.len() && is_word_byte(bytes[pos]) {
                    pos += 1;
                }
                Kind::Word
            }
            _ => {
                pos += 1;
                Kind::Other
            }
        };
        tokens.push(Token {
            kind,
            start,
            end: pos,
        });
    }

    tokens
}

fn skip_line(source: &str, pos: usize) -> usize {
    source[pos..]
        .find('\n')
        .map_or(source.len(), |end| pos + end + 1)
}

/// Identifier bytes; every byte of a multi-byte character counts.
fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'.' || byte >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_source_is_borrowed() {
        let source = "digraph { a -> subgraph s { b c } }";
        assert!(matches!(normalize_subgraphs(source), Cow::Borrowed(_)));
    }

    #[test]
    fn test_anonymous_group_gets_keyword() {
        assert_eq!(
            normalize_subgraphs("digraph { a -> {b c} }"),
            "digraph { a -> subgraph {b c} }"
        );
    }

    #[test]
    fn test_leading_subgraph_gets_endpoint() {
        assert_eq!(
            normalize_subgraphs("digraph {\n  {a b} -> c\n}"),
            format!("digraph {{\n  subgraph {{a b}} \"{SUBGRAPH_ENDPOINT}\" -> c\n}}")
        );
        assert_eq!(
            normalize_subgraphs("digraph { subgraph s {a} -- c }"),
            format!("digraph {{ subgraph s {{a}} \"{SUBGRAPH_ENDPOINT}\" -- c }}")
        );
    }

    #[test]
    fn test_subgraph_inside_chain_is_untouched() {
        assert_eq!(
            normalize_subgraphs("digraph { a -> subgraph {b} -> c }"),
            "digraph { a -> subgraph {b} -> c }"
        );
    }

    #[test]
    fn test_braces_in_strings_and_comments_are_ignored() {
        let source = "digraph { a [label=\"{x}\"]; /* {y} */ b [label=<<b>{z}</b>>] // {w}\n }";
        assert!(matches!(normalize_subgraphs(source), Cow::Borrowed(_)));
    }
}
