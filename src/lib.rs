//! `mdcore` parses CommonMark (plus GFM pipe tables and strikethrough) and
//! renders it to HTML.
//!
//! The pipeline is three stages, each a separate module: [`parser`] builds
//! a block-level tree and resolves link reference definitions,
//! `parser::inlines` then parses each leaf block's accumulated text into
//! inline nodes, and [`html`] walks the finished tree to produce output.
//!
//! ```rust
//! use mdcore::{markdown, Options};
//!
//! let html = markdown("# Hello\n\nSome *text*.\n", &Options::default()).unwrap();
//! assert_eq!(html, "<h1>Hello</h1>\n<p>Some <em>text</em>.</p>\n");
//! ```

mod arena_tree;
mod character_set;
mod ctype;
mod entity;
mod html;
pub mod nodes;
pub mod parser;
mod preprocess;
mod scanners;
mod strings;

use typed_arena::Arena;

pub use nodes::{AstNode, NodeValue};
pub use parser::Options;

/// The one error kind the parser can raise.
///
/// Every valid UTF-8 input parses: mis-structured constructs (unclosed
/// fences, unmatched brackets, unknown entities, dangling reference labels)
/// are recovered locally by falling back to paragraph/text, per
/// CommonMark's permissive grammar. `MalformedMarkdown` is reserved for the
/// block dispatcher exhausting every rule, including the paragraph
/// catch-all, without matching — an internal invariant violation rather
/// than a user error, and not something any known input triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkdownError {
    MalformedMarkdown { line: u32 },
}

impl std::fmt::Display for MarkdownError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkdownError::MalformedMarkdown { line } => {
                write!(f, "malformed markdown at line {line}")
            }
        }
    }
}

impl std::error::Error for MarkdownError {}

/// Parses `source` as Markdown and renders it to an HTML string.
pub fn markdown(source: &str, options: &Options) -> Result<String, MarkdownError> {
    let arena = Arena::new();
    let (root, refmap) = parser::parse_document(&arena, source);
    parser::inlines::process_inlines(&arena, root, &refmap);
    Ok(html::format_document(root, options))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emphasis_roundtrip() {
        let options = Options::default();
        assert_eq!(
            markdown("*hi*\n", &options).unwrap(),
            "<p><em>hi</em></p>\n"
        );
    }

    #[test]
    fn heading_and_paragraph() {
        let options = Options::default();
        assert_eq!(
            markdown("# Hello\n\nSome *text*.\n", &options).unwrap(),
            "<h1>Hello</h1>\n<p>Some <em>text</em>.</p>\n"
        );
    }

    #[test]
    fn table_with_alignment() {
        let options = Options::default();
        let input = "| a | b |\n|:--|--:|\n| 1 | 2 |\n";
        let output = markdown(input, &options).unwrap();
        assert!(output.contains("<table>"));
        assert!(output.contains("align=\"left\""));
        assert!(output.contains("align=\"right\""));
    }

    #[test]
    fn strikethrough_renders_del() {
        let options = Options::default();
        assert_eq!(
            markdown("~~gone~~\n", &options).unwrap(),
            "<p><del>gone</del></p>\n"
        );
    }

    #[test]
    fn loose_list_wraps_items_in_p() {
        let options = Options::default();
        let output = markdown("- a\n\n- b\n", &options).unwrap();
        assert_eq!(output, "<ul>\n<li>\n<p>a</p>\n</li>\n<li>\n<p>b</p>\n</li>\n</ul>\n");
    }

    #[test]
    fn tight_list_has_no_p() {
        let options = Options::default();
        let output = markdown("- a\n- b\n", &options).unwrap();
        assert_eq!(output, "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n");
    }
}
