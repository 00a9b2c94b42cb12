//! JavaScript syntax highlighting for the script editor
//!
//! The whole buffer is parsed with tree-sitter, so comments, string
//! literals, template strings and regular expressions are told apart the
//! way a JavaScript engine would. Each byte is given a [`TokenKind`] from
//! the syntax tree, then the buffer is cut back into styled lines.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use tree_sitter::{Node, Parser};

use heapscope_core::prelude::*;

/// Name the evaluated object is bound to inside a script.
pub const POINTER_BINDING: &str = "ptr";

/// tree-sitter-javascript node kinds
mod nodes {
    pub const COMMENT: &str = "comment";
    pub const STRING: &str = "string";
    pub const TEMPLATE_STRING: &str = "template_string";
    pub const TEMPLATE_SUBSTITUTION: &str = "template_substitution";
    pub const REGEX: &str = "regex";
    pub const NUMBER: &str = "number";
    pub const IDENTIFIER: &str = "identifier";
}

/// Keyword and literal leaves. `class`, `function` and friends are also
/// named nodes spanning a whole declaration, so only leaves are matched.
const KEYWORDS: &[&str] = &[
    "async",
    "await",
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "export",
    "extends",
    "false",
    "finally",
    "for",
    "function",
    "if",
    "import",
    "in",
    "instanceof",
    "let",
    "new",
    "null",
    "of",
    "return",
    "super",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "undefined",
    "var",
    "void",
    "while",
    "with",
    "yield",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Plain,
    Keyword,
    String,
    Number,
    Comment,
    Binding,
}

impl TokenKind {
    pub fn style(self) -> Style {
        match self {
            TokenKind::Plain => Style::default(),
            TokenKind::Keyword => Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            TokenKind::String => Style::default().fg(Color::Green),
            TokenKind::Number => Style::default().fg(Color::Yellow),
            TokenKind::Comment => Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            TokenKind::Binding => Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        }
    }
}

/// A JavaScript parser reused across scans.
pub struct Highlighter {
    parser: Parser,
}

impl Highlighter {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .map_err(|e| Error::syntax(format!("Failed to load JavaScript grammar: {e}")))?;
        Ok(Self { parser })
    }

    /// Split `source` into lines of classified segments.
    ///
    /// Concatenating the segment texts of a line gives back that line.
    pub fn scan(&mut self, source: &str) -> Result<Vec<Vec<(TokenKind, String)>>> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| Error::syntax("Failed to parse script"))?;

        let mut kinds = vec![TokenKind::Plain; source.len()];
        paint(tree.root_node(), source.as_bytes(), &mut kinds);

        let mut lines = Vec::new();
        let mut offset = 0;
        for line in source.split('\n') {
            lines.push(segments(line, &kinds[offset..offset + line.len()]));
            offset += line.len() + 1;
        }
        Ok(lines)
    }

    /// Styled lines for the editor.
    pub fn highlight(&mut self, lines: &[String]) -> Result<Vec<Line<'static>>> {
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .scan(&lines.join("\n"))?
            .into_iter()
            .map(|segments| {
                Line::from(
                    segments
                        .into_iter()
                        .map(|(kind, text)| Span::styled(text, kind.style()))
                        .collect::<Vec<_>>(),
                )
            })
            .collect())
    }
}

/// Highlight a whole buffer, falling back to unstyled text.
pub fn highlight_lines(lines: &[String]) -> Vec<Line<'static>> {
    match Highlighter::new().and_then(|mut highlighter| highlighter.highlight(lines)) {
        Ok(highlighted) => highlighted,
        Err(e) => {
            debug!("Highlighting skipped: {e}");
            lines.iter().map(|line| Line::raw(line.clone())).collect()
        }
    }
}

/// Classify the bytes under `node`; children paint over their parent.
fn paint(node: Node, source: &[u8], kinds: &mut [TokenKind]) {
    let kind = node.kind();
    let range = node.start_byte()..node.end_byte();

    match kind {
        nodes::COMMENT | nodes::STRING | nodes::REGEX => {
            let token = if kind == nodes::COMMENT {
                TokenKind::Comment
            } else {
                TokenKind::String
            };
            kinds[range].fill(token);
            return;
        }
        nodes::NUMBER => {
            kinds[range].fill(TokenKind::Number);
            return;
        }
        nodes::TEMPLATE_STRING => kinds[range].fill(TokenKind::String),
        nodes::TEMPLATE_SUBSTITUTION => kinds[range].fill(TokenKind::Plain),
        nodes::IDENTIFIER => {
            if node
                .utf8_text(source)
                .is_ok_and(|text| text == POINTER_BINDING)
            {
                kinds[range].fill(TokenKind::Binding);
            }
            return;
        }
        _ if node.child_count() == 0 && KEYWORDS.contains(&kind) => {
            kinds[range].fill(TokenKind::Keyword);
            return;
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        paint(child, source, kinds);
    }
}

/// Group a line's characters into runs of one kind.
fn segments(line: &str, kinds: &[TokenKind]) -> Vec<(TokenKind, String)> {
    let mut out: Vec<(TokenKind, String)> = Vec::new();
    for (index, c) in line.char_indices() {
        let kind = kinds[index];
        match out.last_mut() {
            Some((last_kind, text)) if *last_kind == kind => text.push(c),
            _ => out.push((kind, c.to_string())),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Vec<Vec<(TokenKind, String)>> {
        Highlighter::new().unwrap().scan(source).unwrap()
    }

    fn kinds(line: &str) -> Vec<(TokenKind, String)> {
        scan(line).remove(0)
    }

    fn kind_of(tokens: &[(TokenKind, String)], text: &str) -> TokenKind {
        tokens
            .iter()
            .find(|(_, t)| t == text)
            .map(|(k, _)| *k)
            .unwrap_or_else(|| panic!("{text:?} not a token in {tokens:?}"))
    }

    #[test]
    fn test_segments_reassemble_line() {
        let line = "const t = ptr.title(); // read \"title\" 42";
        let joined: String = kinds(line).into_iter().map(|(_, t)| t).collect();
        assert_eq!(joined, line);
    }

    #[test]
    fn test_classifies_tokens() {
        let tokens = kinds("let n = 0x1f + 2.5; if (ptr) { n = 'a\\'b'; }");
        assert_eq!(kind_of(&tokens, "let"), TokenKind::Keyword);
        assert_eq!(kind_of(&tokens, "0x1f"), TokenKind::Number);
        assert_eq!(kind_of(&tokens, "2.5"), TokenKind::Number);
        assert_eq!(kind_of(&tokens, "if"), TokenKind::Keyword);
        assert_eq!(kind_of(&tokens, "ptr"), TokenKind::Binding);
        assert_eq!(kind_of(&tokens, "'a\\'b'"), TokenKind::String);
    }

    #[test]
    fn test_identifiers_containing_keywords_are_plain() {
        let tokens = kinds("iffy + pointer + ptr2;");
        assert!(tokens.iter().all(|(kind, _)| *kind == TokenKind::Plain));
    }

    #[test]
    fn test_line_comment_runs_to_end() {
        let tokens = kinds("x; // ptr 'quoted'");
        assert_eq!(
            tokens.last().unwrap(),
            &(TokenKind::Comment, "// ptr 'quoted'".to_string())
        );
    }

    #[test]
    fn test_quote_inside_regex_does_not_open_string() {
        let tokens = kinds("var s = x.split(/'/); // note");
        assert_eq!(kind_of(&tokens, "var"), TokenKind::Keyword);
        assert_eq!(kind_of(&tokens, "/'/"), TokenKind::String);
        assert_eq!(
            tokens.last().unwrap(),
            &(TokenKind::Comment, "// note".to_string())
        );
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let lines = scan("a; /* start\nstill comment */ ptr;");

        assert_eq!(
            lines[0].last().unwrap(),
            &(TokenKind::Comment, "/* start".to_string())
        );
        assert_eq!(
            lines[1][0],
            (TokenKind::Comment, "still comment */".to_string())
        );
        assert_eq!(kind_of(&lines[1], "ptr"), TokenKind::Binding);
    }

    #[test]
    fn test_template_string_spans_lines_with_substitution() {
        let lines = scan("`a\n${ptr} b`;");

        assert_eq!(lines[0], vec![(TokenKind::String, "`a".to_string())]);
        assert_eq!(kind_of(&lines[1], "ptr"), TokenKind::Binding);
        assert_eq!(kind_of(&lines[1], " b`"), TokenKind::String);
    }

    #[test]
    fn test_highlight_keeps_line_count() {
        let lines = vec!["var x = 1;".to_string(), String::new(), "x".to_string()];
        let highlighted = highlight_lines(&lines);
        assert_eq!(highlighted.len(), 3);
        assert_eq!(highlighted[0].spans[0].style, TokenKind::Keyword.style());
        assert!(highlighted[1].spans.is_empty());
        assert!(highlight_lines(&[]).is_empty());
    }
}
