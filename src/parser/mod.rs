//! The block parser: a line-oriented state machine that builds the block
//! structure of the tree (document, block quotes, lists, code blocks, HTML
//! blocks, headings, tables, paragraphs), following the two-phase
//! container/leaf algorithm CommonMark describes. Inline content is parsed
//! afterwards by [`inlines`], once the block tree (and its reference-link
//! map) is complete.

pub mod autolink;
pub mod inlines;
pub mod options;
mod table;

pub use options::Options;

use crate::ctype::isspace;
use crate::nodes::{
    can_contain_type, ends_with_blank_line, make_block, AstNode, ListDelimType, ListType,
    NodeCodeBlock, NodeHeading, NodeHtmlBlock, NodeList, NodeReference, NodeValue,
};
use crate::scanners::{self, SetextChar};
use crate::strings;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use typed_arena::Arena;

const CODE_INDENT: usize = 4;

/// Drives the block parse. Lives only for the duration of `parse_document`;
/// all output lives in `arena`.
pub struct Parser<'a> {
    pub(crate) arena: &'a Arena<AstNode<'a>>,
    root: &'a AstNode<'a>,
    line_number: u32,
    /// Byte offset into the current line past any container markers already
    /// consumed (blockquote `>`, list marker + padding, code-fence indent).
    pub(crate) offset: usize,
    /// Byte offset of the first non-space/tab character at or after `offset`.
    pub(crate) first_nonspace: usize,
    /// Spaces of indentation between `offset` and `first_nonspace`.
    pub(crate) indent: usize,
    /// Whether the remainder of the line (from `first_nonspace`) is empty.
    pub(crate) blank: bool,
    /// Set when a dispatch rule in `open_new_blocks` has already consumed
    /// the entire current line (ATX heading, thematic break, setext
    /// conversion, table header creation, fence-open line): `feed_line`
    /// must not also call `add_line` for that line.
    line_fully_consumed: bool,
    refmap: FxHashMap<String, NodeReference>,
}

/// The result of trying to continue an open block onto the current line.
enum Continuation {
    /// The block continues; `offset`/`first_nonspace`/`indent` have been
    /// updated to reflect any container marker consumed.
    Continue,
    /// The block does not continue and should be closed (subject to the
    /// lazy-continuation-paragraph exception).
    Fail,
}

/// Parses `source` into a block tree rooted at a `Document` node, along with
/// the map of resolved link reference definitions. Every valid UTF-8 input
/// produces a tree: the paragraph rule is an unconditional fallback, so
/// there is no failure path once preprocessing has run (see
/// `crate::preprocess`).
pub fn parse_document<'a>(
    arena: &'a Arena<AstNode<'a>>,
    source: &str,
) -> (&'a AstNode<'a>, FxHashMap<String, NodeReference>) {
    let root = arena.alloc(AstNode::new(RefCell::new(make_block(
        NodeValue::Document,
        1,
    ))));
    let mut parser = Parser {
        arena,
        root,
        line_number: 0,
        offset: 0,
        first_nonspace: 0,
        indent: 0,
        blank: false,
        line_fully_consumed: false,
        refmap: FxHashMap::default(),
    };

    let normalized = crate::preprocess::normalize(source);
    for line in normalized.split_inclusive('\n') {
        parser.feed_line(line.strip_suffix('\n').unwrap_or(line));
    }

    parser.finish()
}

impl<'a> Parser<'a> {
    fn feed_line(&mut self, line: &str) {
        self.line_number += 1;
        self.offset = 0;
        self.find_first_nonspace(line);

        match self.check_open_blocks(line) {
            Ok(container) => {
                if matches!(container.data.borrow().value, NodeValue::Table(..)) {
                    if !table::try_opening_row(self, container, &line[self.first_nonspace..]) {
                        self.finalize(container);
                        let fallback = self.open_new_blocks(
                            container.parent().unwrap_or(self.root),
                            line,
                        );
                        self.add_line(fallback, line);
                    }
                } else {
                    let container = self.open_new_blocks(container, line);
                    if !self.line_fully_consumed {
                        self.add_line(container, line);
                    }
                }
            }
            Err(lazy_paragraph) => self.add_line(lazy_paragraph, line),
        }
    }

    /// Recomputes `first_nonspace`/`indent`/`blank` for `line` starting at
    /// `self.offset`.
    fn find_first_nonspace(&mut self, line: &str) {
        let bytes = line.as_bytes();
        let mut i = self.offset;
        let mut indent = 0;
        while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
            indent += 1;
            i += 1;
        }
        self.first_nonspace = i;
        self.indent = indent;
        self.blank = i >= bytes.len();
    }

    fn advance_offset(&mut self, line: &str, mut count: usize) {
        let bytes = line.as_bytes();
        while count > 0 && self.offset < bytes.len() {
            self.offset += 1;
            count -= 1;
        }
        self.find_first_nonspace(line);
    }

    /// Consumes up to `CODE_INDENT` spaces of indentation as container
    /// padding (used after a list marker, or a blockquote `>`).
    fn advance_offset_indent(&mut self, line: &str, max: usize) {
        let bytes = line.as_bytes();
        let mut consumed = 0;
        while consumed < max && self.offset < bytes.len() && bytes[self.offset] == b' ' {
            self.offset += 1;
            consumed += 1;
        }
        self.find_first_nonspace(line);
    }

    /// Walks the chain of currently-open blocks, trying to continue each
    /// one onto `line`. Returns `Ok(container)`, the deepest block that
    /// matched, or `Err(paragraph)` if a lazy continuation line extends an
    /// open paragraph past a container that would otherwise have closed.
    fn check_open_blocks(&mut self, line: &str) -> Result<&'a AstNode<'a>, &'a AstNode<'a>> {
        let mut container = self.root;
        loop {
            let next = match container.last_child() {
                Some(c) if c.data.borrow().open => c,
                _ => break,
            };
            match self.block_continues(next, line) {
                Continuation::Continue => container = next,
                Continuation::Fail => {
                    if !self.blank && self.paragraph_lazy_continuation(next, line) {
                        return Err(self.last_open_paragraph(next));
                    }
                    self.close_unmatched_children(next);
                    break;
                }
            }
        }
        Ok(container)
    }

    fn last_open_paragraph(&self, mut node: &'a AstNode<'a>) -> &'a AstNode<'a> {
        loop {
            if matches!(node.data.borrow().value, NodeValue::Paragraph) {
                return node;
            }
            match node.last_child() {
                Some(c) => node = c,
                None => return node,
            }
        }
    }

    /// Whether `node`'s chain down to the innermost open paragraph can be
    /// extended by `line` even though `node` itself failed to continue.
    /// CommonMark permits this only for block quotes and list items, and
    /// only while the innermost descendant is an open paragraph whose text
    /// `line` would not itself start a new block.
    fn paragraph_lazy_continuation(&self, node: &'a AstNode<'a>, line: &str) -> bool {
        if self.blank {
            return false;
        }
        let mut cur = node;
        loop {
            match cur.data.borrow().value {
                NodeValue::BlockQuote | NodeValue::Item(..) | NodeValue::List(..) => {}
                NodeValue::Paragraph => {
                    return !self.line_opens_new_block(line);
                }
                _ => return false,
            }
            match cur.last_child() {
                Some(c) if c.data.borrow().open => cur = c,
                _ => return false,
            }
        }
    }

    /// Whether `line` (independent of any current container state) would
    /// open a new block other than a paragraph, per the precedence order in
    /// `open_new_blocks`. Used only to decide lazy-continuation eligibility.
    fn line_opens_new_block(&self, line: &str) -> bool {
        let rest = &line[self.first_nonspace..];
        self.indent < CODE_INDENT
            && (scanners::thematic_break(rest)
                || rest.starts_with('>')
                || list_marker(rest).is_some()
                || scanners::atx_heading_start(rest).is_some()
                || scanners::open_code_fence(rest).is_some()
                || scanners::html_block_start(rest).is_some())
    }

    fn close_unmatched_children(&mut self, from: &'a AstNode<'a>) {
        let mut node = Some(from);
        while let Some(n) = node {
            if !n.data.borrow().open {
                break;
            }
            let next = n.last_child().filter(|c| c.data.borrow().open);
            self.finalize(n);
            node = next;
        }
    }

    /// Tries to continue `node`, an already-open block, onto the current
    /// line. May consume container markers via `advance_offset`.
    fn block_continues(&mut self, node: &'a AstNode<'a>, line: &str) -> Continuation {
        match node.data.borrow().value {
            NodeValue::Document => Continuation::Continue,

            NodeValue::BlockQuote => {
                if self.indent < CODE_INDENT && line.as_bytes().get(self.first_nonspace) == Some(&b'>')
                {
                    self.advance_offset(line, self.first_nonspace - self.offset + 1);
                    if line.as_bytes().get(self.offset) == Some(&b' ') {
                        self.advance_offset(line, 1);
                    }
                    Continuation::Continue
                } else {
                    Continuation::Fail
                }
            }

            NodeValue::List(nl) | NodeValue::Item(nl) => {
                if self.blank {
                    if node.first_child().is_some() {
                        Continuation::Continue
                    } else {
                        Continuation::Fail
                    }
                } else if self.indent >= nl.marker_offset + required_item_indent(&nl) {
                    self.advance_offset_indent(line, nl.marker_offset + required_item_indent(&nl));
                    Continuation::Continue
                } else {
                    Continuation::Fail
                }
            }

            NodeValue::CodeBlock(ref cb) if cb.fenced => {
                if let Some(close_indent) = fence_close_indent(line, cb) {
                    self.advance_offset(line, close_indent + cb.fence_length);
                    Continuation::Fail
                } else {
                    let to_consume = self.indent.min(cb.fence_offset);
                    self.advance_offset_indent(line, to_consume);
                    Continuation::Continue
                }
            }

            NodeValue::CodeBlock(..) => {
                if self.blank {
                    Continuation::Continue
                } else if self.indent >= CODE_INDENT {
                    self.advance_offset_indent(line, CODE_INDENT);
                    Continuation::Continue
                } else {
                    Continuation::Fail
                }
            }

            NodeValue::HtmlBlock(ref hb) => {
                if self.blank && matches!(hb.block_type, 6 | 7) {
                    Continuation::Fail
                } else {
                    Continuation::Continue
                }
            }

            NodeValue::Paragraph => {
                if self.blank {
                    Continuation::Fail
                } else {
                    Continuation::Continue
                }
            }

            NodeValue::Heading(..) | NodeValue::ThematicBreak | NodeValue::BlankLine => {
                Continuation::Fail
            }

            NodeValue::Table(..) => {
                if self.blank
                    || self.indent >= CODE_INDENT
                    || !table::looks_like_row(&line[self.first_nonspace..])
                {
                    Continuation::Fail
                } else {
                    Continuation::Continue
                }
            }

            _ => Continuation::Fail,
        }
    }

    /// After the deepest continuing container is found, tries in turn each
    /// rule that can open a new nested block on the remainder of the line,
    /// descending into freshly opened containers as it goes. Falls back to
    /// opening (or continuing) a paragraph if nothing else matches.
    fn open_new_blocks(&mut self, mut container: &'a AstNode<'a>, line: &str) -> &'a AstNode<'a> {
        self.line_fully_consumed = false;
        loop {
            if self.blank {
                return container;
            }

            // A setext underline converts the current open one-line
            // paragraph into a heading; this must be tried before the
            // generic thematic-break/list rules since `---` is otherwise
            // ambiguous between the three.
            if matches!(container.data.borrow().value, NodeValue::Paragraph)
                && self.indent < CODE_INDENT
            {
                if let Some(setext) = scanners::setext_heading_line(&line[self.first_nonspace..]) {
                    let level = match setext {
                        SetextChar::Equals => 1,
                        SetextChar::Hyphen => 2,
                    };
                    container.data.borrow_mut().value = NodeValue::Heading(NodeHeading {
                        level,
                        setext: true,
                    });
                    self.advance_offset(line, line.len() - self.offset);
                    self.finalize(container);
                    self.line_fully_consumed = true;
                    return container;
                }
            }

            // A delimiter row directly under a one-line open paragraph
            // turns it into a GFM table header.
            if self.indent < CODE_INDENT {
                if let Some(table) =
                    table::try_opening_header(self, container, &line[self.first_nonspace..])
                {
                    self.advance_offset(line, line.len() - self.offset);
                    self.line_fully_consumed = true;
                    return table;
                }
            }

            if self.indent >= CODE_INDENT {
                if !matches!(container.data.borrow().value, NodeValue::Paragraph) {
                    self.advance_offset_indent(line, CODE_INDENT);
                    return self.add_child(
                        container,
                        NodeValue::CodeBlock(NodeCodeBlock {
                            fenced: false,
                            ..Default::default()
                        }),
                    );
                }
                break;
            }

            let rest = &line[self.first_nonspace..];

            if scanners::thematic_break(rest) {
                self.advance_offset(line, line.len() - self.offset);
                container = self.add_child(container, NodeValue::ThematicBreak);
                self.finalize(container);
                self.line_fully_consumed = true;
                return container;
            }

            if rest.starts_with('>') {
                self.advance_offset(line, self.first_nonspace - self.offset + 1);
                if line.as_bytes().get(self.offset) == Some(&b' ') {
                    self.advance_offset(line, 1);
                }
                container = self.add_child(container, NodeValue::BlockQuote);
                continue;
            }

            if let Some((level, content_start)) = scanners::atx_heading_start(rest) {
                self.advance_offset(line, self.first_nonspace - self.offset + content_start);
                container = self.add_child(
                    container,
                    NodeValue::Heading(NodeHeading {
                        level,
                        setext: false,
                    }),
                );
                let heading_text = strip_atx_closing_sequence(&line[self.offset..]);
                container.data.borrow_mut().content = heading_text.to_string();
                self.advance_offset(line, line.len() - self.offset);
                self.finalize(container);
                self.line_fully_consumed = true;
                return container;
            }

            if let Some(meta) = list_marker(rest) {
                let marker_offset = self.indent;
                let marker_len = meta.marker_len;
                self.advance_offset(line, self.first_nonspace - self.offset + marker_len);

                let spaces_after = count_leading_spaces(&line[self.offset..], CODE_INDENT + 1);
                let blank_after_marker = self.offset + spaces_after >= line.len()
                    || strings::is_blank(&line[self.offset + spaces_after..]);
                let content_padding = if blank_after_marker {
                    1
                } else if spaces_after == 0 {
                    1
                } else {
                    spaces_after.min(CODE_INDENT)
                };
                self.advance_offset_indent(line, content_padding);

                let nl = NodeList {
                    list_type: meta.list_type,
                    marker_offset,
                    // Distance from the marker's own column to the column
                    // where child content starts: marker width plus the
                    // (possibly clamped) spaces following it.
                    padding: marker_len + content_padding,
                    start: meta.start,
                    delimiter: meta.delimiter,
                    bullet_char: meta.bullet_char,
                    tight: true,
                };

                let needs_new_list = match container.data.borrow().value {
                    NodeValue::List(existing) => !lists_compatible(&existing, &nl),
                    _ => true,
                };
                let list_container = if needs_new_list {
                    self.add_child(container, NodeValue::List(nl))
                } else {
                    container
                };
                container = self.add_child(list_container, NodeValue::Item(nl));
                continue;
            }

            if let Some((fence_char, fence_length, info_start)) = scanners::open_code_fence(rest) {
                let fence_offset = self.indent;
                self.advance_offset(line, line.len() - self.offset);
                container = self.add_child(
                    container,
                    NodeValue::CodeBlock(NodeCodeBlock {
                        fenced: true,
                        fence_char,
                        fence_length,
                        fence_offset,
                        info: strings::trim(&rest[info_start..]).to_string(),
                        literal: String::new(),
                    }),
                );
                self.line_fully_consumed = true;
                return container;
            }

            if let Some(block_type) = scanners::html_block_start(rest) {
                return self.add_child(
                    container,
                    NodeValue::HtmlBlock(NodeHtmlBlock {
                        block_type,
                        literal: String::new(),
                    }),
                );
            }
            if scanners::html_block_start_7(rest)
                && !matches!(container.data.borrow().value, NodeValue::Paragraph)
            {
                return self.add_child(
                    container,
                    NodeValue::HtmlBlock(NodeHtmlBlock {
                        block_type: 7,
                        literal: String::new(),
                    }),
                );
            }

            break;
        }

        match container.data.borrow().value {
            NodeValue::Paragraph | NodeValue::CodeBlock(..) | NodeValue::HtmlBlock(..) => container,
            _ => self.add_child(container, NodeValue::Paragraph),
        }
    }

    /// Appends a block of kind `value` to `parent`, first closing any open
    /// descendants of `parent` that cannot contain it (this only happens
    /// when `parent` is itself a leaf block left open due to the paragraph
    /// fallback never closing early, which should not arise given the
    /// dispatch order above, but is handled defensively).
    fn add_child(&mut self, mut parent: &'a AstNode<'a>, value: NodeValue) -> &'a AstNode<'a> {
        while !can_contain_type(parent, &value) {
            self.finalize(parent);
            parent = parent.parent().unwrap_or(self.root);
        }
        let ast = make_block(value, self.line_number);
        let node = self.arena.alloc(AstNode::new(RefCell::new(ast)));
        parent.append(node);
        node
    }

    fn add_line(&mut self, container: &'a AstNode<'a>, line: &str) {
        let is_code = matches!(container.data.borrow().value, NodeValue::CodeBlock(..));
        if self.blank && !is_code {
            container.data.borrow_mut().last_line_blank = true;
            return;
        }

        let is_paragraph_like =
            matches!(container.data.borrow().value, NodeValue::Paragraph | NodeValue::Heading(..));
        let is_html = matches!(container.data.borrow().value, NodeValue::HtmlBlock(..));

        if is_paragraph_like {
            let text = strings::rtrim(&line[self.first_nonspace.min(line.len())..]);
            let mut ast = container.data.borrow_mut();
            if !ast.content.is_empty() {
                ast.content.push('\n');
            }
            ast.content.push_str(text);
        } else if is_code {
            let text = if self.blank {
                ""
            } else {
                &line[self.offset.min(line.len())..]
            };
            let mut ast = container.data.borrow_mut();
            ast.content.push_str(text);
            ast.content.push('\n');
            ast.last_line_blank = self.blank;
        } else if is_html {
            {
                let text = &line[self.offset.min(line.len())..];
                let mut ast = container.data.borrow_mut();
                ast.content.push_str(text);
                ast.content.push('\n');
            }
            if self.html_block_should_close(container, line) {
                self.finalize(container);
            }
        } else {
            container.data.borrow_mut().last_line_blank = self.blank;
        }
    }

    fn html_block_should_close(&self, node: &'a AstNode<'a>, line: &str) -> bool {
        let block_type = match node.data.borrow().value {
            NodeValue::HtmlBlock(ref hb) => hb.block_type,
            _ => return false,
        };
        let lower = line.to_lowercase();
        match block_type {
            1 => {
                lower.contains("</script>")
                    || lower.contains("</pre>")
                    || lower.contains("</style>")
                    || lower.contains("</textarea>")
            }
            2 => line.contains("-->"),
            3 => line.contains("?>"),
            4 => line.contains('>'),
            5 => line.contains("]]>"),
            _ => false,
        }
    }

    fn finalize(&mut self, node: &'a AstNode<'a>) {
        node.data.borrow_mut().open = false;

        let is_paragraph = matches!(node.data.borrow().value, NodeValue::Paragraph);
        if is_paragraph {
            self.finalize_paragraph(node);
        }

        let is_code = matches!(node.data.borrow().value, NodeValue::CodeBlock(ref cb) if !cb.fenced);
        if is_code {
            let mut ast = node.data.borrow_mut();
            let trimmed = ast.content.trim_end_matches('\n');
            ast.content = format!("{trimmed}\n");
            if ast.content == "\n" {
                ast.content.clear();
            }
        }

        let is_list = matches!(node.data.borrow().value, NodeValue::List(..));
        if is_list {
            let loose = self.list_is_loose(node);
            if let NodeValue::List(ref mut nl) = node.data.borrow_mut().value {
                nl.tight = !loose;
            }
        }
    }

    fn list_is_loose(&self, list: &'a AstNode<'a>) -> bool {
        let mut item = list.first_child();
        while let Some(it) = item {
            if ends_with_blank_line(it) && it.next_sibling().is_some() {
                return true;
            }
            let mut child = it.first_child();
            while let Some(c) = child {
                if c.next_sibling().is_some() && c.data.borrow().last_line_blank {
                    return true;
                }
                child = c.next_sibling();
            }
            item = it.next_sibling();
        }
        false
    }

    /// Strips leading link reference definitions from a finalised
    /// paragraph's accumulated content, registering each in `self.refmap`
    /// and splicing a `LinkReferenceDefinition` node in before it. If the
    /// whole paragraph turns out to be reference definitions, it is
    /// detached entirely.
    fn finalize_paragraph(&mut self, node: &'a AstNode<'a>) {
        loop {
            let content = node.data.borrow().content.clone();
            let trimmed = strings::ltrim(&content);
            if !trimmed.starts_with('[') {
                break;
            }
            let (reference, consumed) = match parse_reference(trimmed) {
                Some(r) => r,
                None => break,
            };

            let start_line = node.data.borrow().start_line;
            let refnode = self.arena.alloc(AstNode::new(RefCell::new(make_block(
                NodeValue::LinkReferenceDefinition(reference.clone()),
                start_line,
            ))));
            refnode.data.borrow_mut().open = false;
            node.insert_before(refnode);

            let key = strings::normalize_label(&reference.label);
            self.refmap.entry(key).or_insert(reference);

            let remainder = trimmed[consumed..].trim_start_matches('\n').to_string();
            node.data.borrow_mut().content = remainder;
        }

        if node.data.borrow().content.trim().is_empty() {
            node.detach();
        }
    }

    fn finish(mut self) -> (&'a AstNode<'a>, FxHashMap<String, NodeReference>) {
        self.close_unmatched_children(self.root);
        (self.root, self.refmap)
    }
}

fn required_item_indent(nl: &NodeList) -> usize {
    nl.padding
}

fn fence_close_indent(line: &str, cb: &NodeCodeBlock) -> Option<usize> {
    let trimmed = line.trim_start_matches(|c| c == ' ' || c == '\t');
    let indent = line.len() - trimmed.len();
    if indent > 3 {
        return None;
    }
    if scanners::close_code_fence(trimmed, cb.fence_char, cb.fence_length) {
        Some(indent)
    } else {
        None
    }
}

fn strip_atx_closing_sequence(s: &str) -> &str {
    let trimmed = strings::rtrim(s);
    if trimmed.is_empty() {
        return trimmed;
    }
    let bytes = trimmed.as_bytes();
    let mut end = bytes.len();
    while end > 0 && bytes[end - 1] == b'#' {
        end -= 1;
    }
    if end == bytes.len() {
        return trimmed;
    }
    if end == 0 || bytes[end - 1] == b' ' || bytes[end - 1] == b'\t' {
        strings::rtrim(&trimmed[..end])
    } else {
        trimmed
    }
}

fn count_leading_spaces(s: &str, max: usize) -> usize {
    s.bytes().take(max).take_while(|&b| b == b' ' || b == b'\t').count()
}

#[derive(Clone, Copy)]
struct ListMarker {
    list_type: ListType,
    marker_len: usize,
    start: usize,
    delimiter: ListDelimType,
    bullet_char: u8,
}

/// Recognises a bullet or ordered list marker at the start of `rest`
/// (CommonMark §5.2), requiring it be followed by whitespace or the end of
/// the line so that e.g. `-5` is not mistaken for a bullet.
fn list_marker(rest: &str) -> Option<ListMarker> {
    let bytes = rest.as_bytes();
    let first = *bytes.first()?;

    if matches!(first, b'-' | b'+' | b'*') {
        if bytes.get(1).is_some_and(|b| !isspace(*b)) {
            return None;
        }
        return Some(ListMarker {
            list_type: ListType::Bullet,
            marker_len: 1,
            start: 1,
            delimiter: ListDelimType::Period,
            bullet_char: first,
        });
    }

    if first.is_ascii_digit() {
        let mut i = 0;
        while i < bytes.len() && bytes[i].is_ascii_digit() && i < 9 {
            i += 1;
        }
        if i == 0 || i > 9 {
            return None;
        }
        let delimiter = match bytes.get(i) {
            Some(b'.') => ListDelimType::Period,
            Some(b')') => ListDelimType::Paren,
            _ => return None,
        };
        if bytes.get(i + 1).is_some_and(|b| !isspace(*b)) {
            return None;
        }
        let start: usize = rest[..i].parse().ok()?;
        return Some(ListMarker {
            list_type: ListType::Ordered,
            marker_len: i + 1,
            start,
            delimiter,
            bullet_char: 0,
        });
    }

    None
}

fn lists_compatible(a: &NodeList, b: &NodeList) -> bool {
    if a.list_type != b.list_type {
        return false;
    }
    match a.list_type {
        ListType::Bullet => a.bullet_char == b.bullet_char,
        ListType::Ordered => a.delimiter == b.delimiter,
    }
}

/// Parses a link reference definition at the start of `s` (which must begin
/// with `[`), returning the resolved reference and the byte length of `s`
/// consumed. See CommonMark §4.7.
fn parse_reference(s: &str) -> Option<(NodeReference, usize)> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'[') {
        return None;
    }

    let mut i = 1;
    let mut label_end = None;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() => i += 2,
            b'[' => return None,
            b']' => {
                label_end = Some(i);
                break;
            }
            _ => i += 1,
        }
    }
    let label_end = label_end?;
    let label = &s[1..label_end];
    if strings::trim(label).is_empty() {
        return None;
    }

    let mut i = label_end + 1;
    if bytes.get(i) != Some(&b':') {
        return None;
    }
    i += 1;
    i = skip_spaces_and_one_newline(s, i);

    let (url_raw, consumed) = inlines::parse_link_destination(&s[i..])?;
    i += consumed;
    let url = strings::clean_url(url_raw);

    let after_destination = i;
    let after_ws = skip_spaces_and_one_newline(s, i);
    if after_ws > after_destination {
        if let Some((title_raw, tconsumed)) = inlines::parse_link_title(&s[after_ws..]) {
            let end = after_ws + tconsumed;
            let line_end = s[end..].find('\n').map(|p| end + p).unwrap_or(s.len());
            if strings::is_blank(&s[end..line_end]) {
                let title = strings::clean_title(title_raw);
                return Some((
                    NodeReference {
                        label: label.to_string(),
                        url,
                        title,
                    },
                    next_line_start(s, line_end),
                ));
            }
        }
    }

    let line_end = s[after_destination..]
        .find('\n')
        .map(|p| after_destination + p)
        .unwrap_or(s.len());
    if !strings::is_blank(&s[after_destination..line_end]) {
        return None;
    }
    Some((
        NodeReference {
            label: label.to_string(),
            url,
            title: String::new(),
        },
        next_line_start(s, line_end),
    ))
}

fn skip_spaces_and_one_newline(s: &str, mut i: usize) -> usize {
    let bytes = s.as_bytes();
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'\n' {
        i += 1;
        while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
            i += 1;
        }
    }
    i
}

fn next_line_start(s: &str, line_end: usize) -> usize {
    if s.as_bytes().get(line_end) == Some(&b'\n') {
        line_end + 1
    } else {
        line_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> String {
        let arena = Arena::new();
        let (root, _) = parse_document(&arena, src);
        let mut out = String::new();
        debug_tree(root, 0, &mut out);
        out
    }

    fn debug_tree<'a>(node: &'a AstNode<'a>, depth: usize, out: &mut String) {
        let ast = node.data.borrow();
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("{:?}\n", ast.value));
        drop(ast);
        for child in node.children() {
            debug_tree(child, depth + 1, out);
        }
    }

    #[test]
    fn paragraph_and_heading() {
        let out = parse("# Title\n\nHello *world*\n");
        assert!(out.contains("Heading"));
        assert!(out.contains("Paragraph"));
    }

    #[test]
    fn setext_heading_converts_paragraph() {
        let out = parse("Title\n=====\n");
        assert!(out.contains("setext: true"));
    }

    #[test]
    fn thematic_break_not_confused_with_setext() {
        let out = parse("---\n");
        assert!(out.contains("ThematicBreak"));
    }

    #[test]
    fn list_items_grouped_under_one_list() {
        let out = parse("- a\n- b\n- c\n");
        assert_eq!(out.matches("List(").count(), 1);
        assert_eq!(out.matches("Item(").count(), 3);
    }

    #[test]
    fn loose_list_from_blank_line() {
        let out = parse("- a\n\n- b\n");
        assert!(out.contains("tight: false"));
    }

    #[test]
    fn tight_list_without_blank_line() {
        let out = parse("- a\n- b\n");
        assert!(out.contains("tight: true"));
    }

    #[test]
    fn fenced_code_block_captures_info_string() {
        let out = parse("```rust\nfn x() {}\n```\n");
        assert!(out.contains("info: \"rust\""));
    }

    #[test]
    fn reference_definition_is_stripped_and_resolved() {
        let arena = Arena::new();
        let (root, refs) = parse_document(&arena, "[foo]: /url \"title\"\n\n[foo]\n");
        assert_eq!(refs.get("foo").unwrap().url, "/url");
        let mut out = String::new();
        debug_tree(root, 0, &mut out);
        assert!(out.contains("LinkReferenceDefinition"));
        // A second paragraph with the shortcut-link text remains.
        assert!(out.contains("Paragraph"));
    }

    #[test]
    fn blockquote_nests_paragraphs() {
        let out = parse("> a\n> b\n");
        assert!(out.contains("BlockQuote"));
    }

    #[test]
    fn table_header_and_row() {
        let out = parse("a | b\n--|--\n1 | 2\n");
        assert!(out.contains("Table("));
        assert_eq!(out.matches("TableRow(").count(), 2);
    }
}
