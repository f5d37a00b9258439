//! HTML rendering: a depth-first tree walk that emits one `<tag>` per block
//! or inline node, per CommonMark/GFM's reference rendering rules.

use crate::character_set::character_set;
use crate::nodes::{AstNode, ListType, NodeValue, TableAlignment};
use crate::parser::Options;
use jetscii::bytes;
use std::fmt::Write as _;

/// HTML-escapes `<`, `>`, `&`, and `"` in `s`, appending the result to `output`.
pub fn escape(output: &mut String, s: &str) {
    let bytes_to_escape = bytes!(b'<', b'>', b'&', b'"');
    let src = s.as_bytes();
    let mut offset = 0;
    while let Some(pos) = bytes_to_escape.find(&src[offset..]) {
        output.push_str(&s[offset..offset + pos]);
        match src[offset + pos] {
            b'<' => output.push_str("&lt;"),
            b'>' => output.push_str("&gt;"),
            b'&' => output.push_str("&amp;"),
            b'"' => output.push_str("&quot;"),
            _ => unreachable!(),
        }
        offset += pos + 1;
    }
    output.push_str(&s[offset..]);
}

const HREF_SAFE: [bool; 256] = character_set!(
    b"-_.+!*'(),%#@?=;:/,+&$abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789"
);

/// Percent-encodes everything in `s` not already a `%XX` escape or one of
/// the characters CommonMark's reference implementation treats as safe in a
/// URL, then HTML-escapes the result.
pub fn escape_href(output: &mut String, s: &str) {
    let src = s.as_bytes();
    let size = src.len();
    let mut i = 0;
    while i < size {
        let b = src[i];
        if b == b'&' {
            output.push_str("&amp;");
            i += 1;
        } else if b == b'%' && i + 2 < size && src[i + 1].is_ascii_hexdigit() && src[i + 2].is_ascii_hexdigit() {
            output.push('%');
            output.push(src[i + 1] as char);
            output.push(src[i + 2] as char);
            i += 3;
        } else if (b as usize) < 128 && HREF_SAFE[b as usize] {
            output.push(b as char);
            i += 1;
        } else {
            let char_len = utf8_len(b);
            let end = (i + char_len).min(size);
            for &byte in &src[i..end] {
                let _ = write!(output, "%{byte:02X}");
            }
            i = end;
        }
    }
}

const TAGFILTER_BLACKLIST: [&str; 9] = [
    "title",
    "textarea",
    "style",
    "xmp",
    "iframe",
    "noembed",
    "noframes",
    "script",
    "plaintext",
];

/// Whether `literal` (starting at a `<`) opens or closes one of the raw-text
/// tags CommonMark singles out for escaping when emitted as inline HTML.
fn is_filtered_tag(literal: &str) -> bool {
    let bytes = literal.as_bytes();
    if bytes.len() < 3 || bytes[0] != b'<' {
        return false;
    }
    let mut i = 1;
    if bytes[i] == b'/' {
        i += 1;
    }
    let lower = literal[i..].to_lowercase();
    for tag in TAGFILTER_BLACKLIST {
        if lower.starts_with(tag) {
            let j = i + tag.len();
            return match bytes.get(j) {
                Some(&b) => {
                    b.is_ascii_whitespace()
                        || b == b'>'
                        || (b == b'/' && bytes.get(j + 1) == Some(&b'>'))
                }
                None => false,
            };
        }
    }
    false
}

/// Writes raw inline HTML verbatim, except that the opening `<` of a
/// `title`/`textarea`/`style`/`xmp`/`iframe`/`noembed`/`noframes`/`script`/
/// `plaintext` tag is escaped to `&lt;` so it can't silently take over the
/// surrounding document.
fn tagfilter_write(output: &mut String, literal: &str) {
    let bytes = literal.as_bytes();
    let matcher = bytes!(b'<');
    let mut offset = 0;
    while let Some(i) = matcher.find(&bytes[offset..]) {
        output.push_str(&literal[offset..offset + i]);
        if is_filtered_tag(&literal[offset + i..]) {
            output.push_str("&lt;");
        } else {
            output.push('<');
        }
        offset += i + 1;
    }
    output.push_str(&literal[offset..]);
}

fn utf8_len(first_byte: u8) -> usize {
    if first_byte < 0x80 {
        1
    } else if first_byte >> 5 == 0b110 {
        2
    } else if first_byte >> 4 == 0b1110 {
        3
    } else {
        4
    }
}

/// Renders `root` to HTML per `options`.
pub fn format_document<'a>(root: &'a AstNode<'a>, options: &Options) -> String {
    let mut output = String::new();
    render_node(&mut output, root, options);
    output
}

fn render_node<'a>(output: &mut String, node: &'a AstNode<'a>, options: &Options) {
    let value = node.data.borrow().value.clone();
    match value {
        NodeValue::Document => render_children(output, node, options),

        NodeValue::BlockQuote => {
            output.push_str("<blockquote>\n");
            render_children(output, node, options);
            output.push_str("</blockquote>\n");
        }

        NodeValue::List(nl) => {
            let tag = if nl.list_type == ListType::Bullet { "ul" } else { "ol" };
            if nl.list_type == ListType::Ordered && nl.start != 1 {
                let _ = writeln!(output, "<{tag} start=\"{}\">", nl.start);
            } else {
                let _ = writeln!(output, "<{tag}>");
            }
            render_children(output, node, options);
            let _ = writeln!(output, "</{tag}>");
        }

        NodeValue::Item(..) => {
            let tight = containing_list_tight(node);
            output.push_str("<li>");
            if tight {
                render_children_tight(output, node, options);
            } else {
                output.push('\n');
                render_children(output, node, options);
            }
            output.push_str("</li>\n");
        }

        NodeValue::CodeBlock(ref cb) => {
            output.push_str("<pre><code");
            let mut info = crate::entity::unescape_html(&cb.info);
            crate::strings::unescape(&mut info);
            if let Some(lang) = info.split_whitespace().next().filter(|s| !s.is_empty()) {
                output.push_str(" class=\"language-");
                escape(output, lang);
                output.push('"');
            }
            output.push('>');
            escape(output, &node.data.borrow().content);
            output.push_str("</code></pre>\n");
        }

        NodeValue::HtmlBlock(..) => {
            let content = node.data.borrow().content.clone();
            output.push_str(content.trim_matches('\n'));
            output.push('\n');
        }

        NodeValue::Paragraph => {
            let tight = is_inside_tight_item(node);
            if !tight {
                output.push_str("<p>");
            }
            render_inline_children(output, node, options);
            if !tight {
                output.push_str("</p>\n");
            }
        }

        NodeValue::Heading(h) => {
            let _ = write!(output, "<h{}>", h.level);
            render_inline_children(output, node, options);
            let _ = writeln!(output, "</h{}>", h.level);
        }

        NodeValue::ThematicBreak => output.push_str("<hr />\n"),

        NodeValue::BlankLine | NodeValue::LinkReferenceDefinition(..) => {}

        NodeValue::Table(ref aligns) => {
            output.push_str("<table>\n");
            let mut rows = node.children();
            if let Some(header) = rows.next() {
                output.push_str("<thead>\n");
                render_row(output, header, aligns, options);
                output.push_str("</thead>\n");
            }
            let body: Vec<_> = rows.collect();
            if !body.is_empty() {
                output.push_str("<tbody>\n");
                for row in body {
                    render_row(output, row, aligns, options);
                }
                output.push_str("</tbody>\n");
            }
            output.push_str("</table>\n");
        }

        NodeValue::TableRow(..) | NodeValue::TableCell => {
            // Rendered directly by `render_row`; reached only if a cell is
            // visited outside that path, which should not happen.
        }

        NodeValue::Text(ref t) => {
            if options.escape {
                escape(output, t);
            } else {
                output.push_str(t);
            }
        }

        NodeValue::SoftBreak => output.push('\n'),
        NodeValue::LineBreak => output.push_str("<br />\n"),

        NodeValue::Escape(c) => {
            if options.escape {
                let mut buf = [0u8; 4];
                escape(output, c.encode_utf8(&mut buf));
            } else {
                output.push(c);
            }
        }

        NodeValue::HtmlEntity(ref t) => output.push_str(t),

        NodeValue::HtmlInline(ref t) => tagfilter_write(output, t),

        NodeValue::Code(ref t) => {
            output.push_str("<code>");
            escape(output, t);
            output.push_str("</code>");
        }

        NodeValue::Link(ref link) => {
            output.push_str("<a href=\"");
            escape_href(output, &link.url);
            output.push('"');
            if !link.title.is_empty() {
                output.push_str(" title=\"");
                escape(output, &link.title);
                output.push('"');
            }
            output.push('>');
            render_inline_children(output, node, options);
            output.push_str("</a>");
        }

        NodeValue::Image(ref link) => {
            output.push_str("<img src=\"");
            escape_href(output, &link.url);
            output.push_str("\" alt=\"");
            escape(output, &plain_text(node));
            output.push('"');
            if !link.title.is_empty() {
                output.push_str(" title=\"");
                escape(output, &link.title);
                output.push('"');
            }
            output.push_str(" />");
        }

        NodeValue::AutoLink(ref auto) => {
            output.push_str("<a href=\"");
            escape_href(output, &auto.url);
            output.push_str("\">");
            render_inline_children(output, node, options);
            output.push_str("</a>");
        }

        NodeValue::Emph => {
            output.push_str("<em>");
            render_inline_children(output, node, options);
            output.push_str("</em>");
        }

        NodeValue::Strong => {
            output.push_str("<strong>");
            render_inline_children(output, node, options);
            output.push_str("</strong>");
        }

        NodeValue::Strikethrough => {
            output.push_str("<del>");
            render_inline_children(output, node, options);
            output.push_str("</del>");
        }
    }
}

fn render_row<'a>(output: &mut String, row: &'a AstNode<'a>, aligns: &[TableAlignment], options: &Options) {
    let is_header = matches!(row.data.borrow().value, NodeValue::TableRow(true));
    let cell_tag = if is_header { "th" } else { "td" };
    output.push_str("<tr>\n");
    for (i, cell) in row.children().enumerate() {
        let align = aligns.get(i).and_then(TableAlignment::attribute);
        output.push('<');
        output.push_str(cell_tag);
        if let Some(align) = align {
            let _ = write!(output, " align=\"{align}\"");
        }
        output.push('>');
        render_inline_children(output, cell, options);
        let _ = writeln!(output, "</{cell_tag}>");
    }
    output.push_str("</tr>\n");
}

fn render_children<'a>(output: &mut String, node: &'a AstNode<'a>, options: &Options) {
    for child in node.children() {
        render_node(output, child, options);
    }
}

fn render_children_tight<'a>(output: &mut String, node: &'a AstNode<'a>, options: &Options) {
    for child in node.children() {
        match child.data.borrow().value {
            NodeValue::Paragraph => render_inline_children(output, child, options),
            _ => render_node(output, child, options),
        }
    }
}

fn render_inline_children<'a>(output: &mut String, node: &'a AstNode<'a>, options: &Options) {
    for child in node.children() {
        render_node(output, child, options);
    }
}

fn plain_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut out = String::new();
    for child in node.children() {
        match &child.data.borrow().value {
            NodeValue::Text(t) => out.push_str(t),
            NodeValue::Code(t) => out.push_str(t),
            _ => out.push_str(&plain_text(child)),
        }
    }
    out
}

fn is_inside_tight_item<'a>(node: &'a AstNode<'a>) -> bool {
    match node.parent() {
        Some(item) if matches!(item.data.borrow().value, NodeValue::Item(..)) => {
            containing_list_tight(item)
        }
        _ => false,
    }
}

fn containing_list_tight<'a>(item: &'a AstNode<'a>) -> bool {
    match item.parent() {
        Some(list) => match list.data.borrow().value {
            NodeValue::List(nl) => nl.tight,
            _ => false,
        },
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_basic() {
        let mut out = String::new();
        escape(&mut out, "<a> & \"b\"");
        assert_eq!(out, "&lt;a&gt; &amp; &quot;b&quot;");
    }

    #[test]
    fn escape_href_percent_encodes_unsafe() {
        let mut out = String::new();
        escape_href(&mut out, "/a b");
        assert_eq!(out, "/a%20b");
    }

    #[test]
    fn escape_href_preserves_existing_percent_escape() {
        let mut out = String::new();
        escape_href(&mut out, "/a%20b");
        assert_eq!(out, "/a%20b");
    }

    #[test]
    fn tagfilter_escapes_blacklisted_tag() {
        let mut out = String::new();
        tagfilter_write(&mut out, "<title>hi</title>");
        assert_eq!(out, "&lt;title>hi&lt;/title>");
    }

    #[test]
    fn tagfilter_leaves_ordinary_tag_alone() {
        let mut out = String::new();
        tagfilter_write(&mut out, "<span>hi</span>");
        assert_eq!(out, "<span>hi</span>");
    }
}
