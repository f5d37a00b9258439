//! Inline parsing: a single left-to-right scan over a block's accumulated
//! text that emits `Text`/`Code`/`HtmlInline`/`AutoLink`/`Link`/`Image`
//! children directly, plus a delimiter stack used to resolve emphasis,
//! strong emphasis, and strikethrough runs after the fact (CommonMark §6,
//! GFM strikethrough).

use crate::ctype::{ispunct_char, isspace_char};
use crate::entity;
use crate::nodes::{make_block, AstNode, NodeAutoLink, NodeLink, NodeReference, NodeValue};
use crate::parser::autolink;
use crate::scanners;
use crate::strings;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use typed_arena::Arena;

/// Runs the inline parser over every block that accepts inline content
/// (paragraphs, headings, table cells), walking the whole tree.
pub fn process_inlines<'a>(
    arena: &'a Arena<AstNode<'a>>,
    root: &'a AstNode<'a>,
    refmap: &FxHashMap<String, NodeReference>,
) {
    for node in collect_inline_hosts(root) {
        let content = std::mem::take(&mut node.data.borrow_mut().content);
        let mut subject = Subject::new(arena, refmap, &content);
        subject.parse_into(node);
    }
}

fn collect_inline_hosts<'a>(root: &'a AstNode<'a>) -> Vec<&'a AstNode<'a>> {
    let mut hosts = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.data.borrow().value.contains_inlines() {
            hosts.push(node);
        }
        for child in node.reverse_children() {
            stack.push(child);
        }
    }
    hosts
}

struct Bracket<'a> {
    marker: &'a AstNode<'a>,
    is_image: bool,
    active: bool,
}

struct Delimiter<'a> {
    node: &'a AstNode<'a>,
    run_char: char,
    length: usize,
    original_length: usize,
    can_open: bool,
    can_close: bool,
}

struct Subject<'a, 'r> {
    arena: &'a Arena<AstNode<'a>>,
    refmap: &'r FxHashMap<String, NodeReference>,
    chars: Vec<char>,
    pos: usize,
    brackets: Vec<Bracket<'a>>,
    delimiters: Vec<Delimiter<'a>>,
}

impl<'a, 'r> Subject<'a, 'r> {
    fn new(arena: &'a Arena<AstNode<'a>>, refmap: &'r FxHashMap<String, NodeReference>, text: &str) -> Self {
        Subject {
            arena,
            refmap,
            chars: text.chars().collect(),
            pos: 0,
            brackets: Vec::new(),
            delimiters: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn rest_as_string(&self, from: usize) -> String {
        self.chars[from..].iter().collect()
    }

    fn append_text(&mut self, parent: &'a AstNode<'a>, text: String) -> &'a AstNode<'a> {
        if let Some(last) = parent.last_child() {
            let mut ast = last.data.borrow_mut();
            if let NodeValue::Text(t) = &mut ast.value {
                t.push_str(&text);
                drop(ast);
                return last;
            }
        }
        self.add_child(parent, NodeValue::Text(text))
    }

    fn add_child(&mut self, parent: &'a AstNode<'a>, value: NodeValue) -> &'a AstNode<'a> {
        let node = self.arena.alloc(AstNode::new(RefCell::new(make_block(value, 0))));
        parent.append(node);
        node
    }

    /// Parses the whole subject into children of `parent`.
    fn parse_into(&mut self, parent: &'a AstNode<'a>) {
        while self.pos < self.chars.len() {
            self.parse_inline(parent);
        }
        self.process_emphasis(parent, 0);
    }

    fn parse_inline(&mut self, parent: &'a AstNode<'a>) {
        let c = self.chars[self.pos];
        match c {
            '\\' => self.handle_backslash(parent),
            '`' => self.handle_code_span(parent),
            '\n' => self.handle_newline(parent),
            '*' | '_' => self.handle_delim_run(parent, c),
            '~' => self.handle_tilde(parent),
            '[' => self.handle_open_bracket(parent, false),
            '!' if self.peek_at(1) == Some('[') => {
                self.pos += 1;
                self.handle_open_bracket(parent, true);
            }
            ']' => self.handle_close_bracket(parent),
            '<' => self.handle_angle(parent),
            '&' => self.handle_entity(parent),
            _ => self.handle_text_run(parent),
        }
    }

    fn handle_text_run(&mut self, parent: &'a AstNode<'a>) {
        let start = self.pos;
        while self.pos < self.chars.len() && !is_special(self.chars[self.pos]) {
            self.pos += 1;
        }
        if self.pos == start {
            // A special character with no dedicated handler (shouldn't
            // happen given the match in `parse_inline`); consume it as text
            // so the parser always makes progress.
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        self.append_text(parent, text);
    }

    fn handle_backslash(&mut self, parent: &'a AstNode<'a>) {
        match self.peek_at(1) {
            Some('\n') => {
                self.pos += 2;
                self.add_child(parent, NodeValue::LineBreak);
            }
            Some(c) if is_ascii_punct(c) => {
                self.pos += 2;
                self.append_text(parent, c.to_string());
            }
            _ => {
                self.pos += 1;
                self.append_text(parent, "\\".to_string());
            }
        }
    }

    fn handle_newline(&mut self, parent: &'a AstNode<'a>) {
        // Trailing spaces before the line ending decide soft vs hard break:
        // two or more means a hard break (already trimmed to a single
        // trailing space is "soft"). We trim trailing spaces we already
        // appended to the previous Text node.
        let mut hard = false;
        if let Some(last) = parent.last_child() {
            let mut ast = last.data.borrow_mut();
            if let NodeValue::Text(t) = &mut ast.value {
                let trimmed = t.trim_end_matches(' ');
                let trailing = t.len() - trimmed.len();
                if trailing >= 2 {
                    hard = true;
                }
                let new_len = trimmed.len();
                t.truncate(new_len);
            }
        }
        self.pos += 1;
        while self.peek() == Some(' ') || self.peek() == Some('\t') {
            self.pos += 1;
        }
        if hard {
            self.add_child(parent, NodeValue::LineBreak);
        } else {
            self.add_child(parent, NodeValue::SoftBreak);
        }
    }

    fn handle_code_span(&mut self, parent: &'a AstNode<'a>) {
        let start = self.pos;
        let mut len = 0;
        while self.peek() == Some('`') {
            self.pos += 1;
            len += 1;
        }
        let content_start = self.pos;
        loop {
            match self.peek() {
                None => {
                    // No closer: the backticks are literal text.
                    self.pos = content_start;
                    let text: String = self.chars[start..content_start].iter().collect();
                    self.append_text(parent, text);
                    return;
                }
                Some('`') => {
                    let close_start = self.pos;
                    let mut close_len = 0;
                    while self.peek() == Some('`') {
                        self.pos += 1;
                        close_len += 1;
                    }
                    if close_len == len {
                        let raw: String = self.chars[content_start..close_start].iter().collect();
                        self.add_child(parent, NodeValue::Code(normalize_code_span(&raw)));
                        return;
                    }
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn handle_delim_run(&mut self, parent: &'a AstNode<'a>, run_char: char) {
        let start = self.pos;
        while self.peek() == Some(run_char) {
            self.pos += 1;
        }
        let length = self.pos - start;
        let text: String = std::iter::repeat(run_char).take(length).collect();

        let before = if start == 0 { None } else { Some(self.chars[start - 1]) };
        let after = self.peek();
        let (can_open, can_close) = flanking(before, after, run_char);

        let node = self.add_child(parent, NodeValue::Text(text));
        if can_open || can_close {
            self.delimiters.push(Delimiter {
                node,
                run_char,
                length,
                original_length: length,
                can_open,
                can_close,
            });
        }
    }

    fn handle_tilde(&mut self, parent: &'a AstNode<'a>) {
        let start = self.pos;
        while self.peek() == Some('~') {
            self.pos += 1;
        }
        let length = self.pos - start;
        let text: String = std::iter::repeat('~').take(length).collect();
        let node = self.add_child(parent, NodeValue::Text(text));
        if length == 2 {
            let before = if start == 0 { None } else { Some(self.chars[start - 1]) };
            let after = self.peek();
            let (can_open, can_close) = flanking(before, after, '~');
            if can_open || can_close {
                self.delimiters.push(Delimiter {
                    node,
                    run_char: '~',
                    length: 2,
                    original_length: 2,
                    can_open,
                    can_close,
                });
            }
        }
    }

    fn handle_open_bracket(&mut self, parent: &'a AstNode<'a>, is_image: bool) {
        self.pos += 1;
        let marker = self.add_child(parent, NodeValue::Text(String::new()));
        self.brackets.push(Bracket {
            marker,
            is_image,
            active: true,
        });
    }

    fn handle_close_bracket(&mut self, parent: &'a AstNode<'a>) {
        self.pos += 1;

        let bracket_index = match self.brackets.iter().rposition(|b| b.active) {
            Some(i) => i,
            None => {
                self.append_text(parent, "]".to_string());
                return;
            }
        };

        let after_bracket = self.pos;
        let parsed = self
            .try_inline_link(after_bracket)
            .or_else(|| self.try_reference_link(after_bracket, bracket_index));

        match parsed {
            Some((link, consumed)) => {
                self.pos = consumed;
                let is_image = self.brackets[bracket_index].is_image;
                let marker = self.brackets[bracket_index].marker;
                self.splice_link(parent, marker, link, is_image);
                if !is_image {
                    for b in &mut self.brackets[..bracket_index] {
                        b.active = false;
                    }
                }
                self.brackets.truncate(bracket_index);
            }
            None => {
                self.brackets.truncate(bracket_index);
                self.append_text(parent, "]".to_string());
            }
        }
    }

    /// Tries `(dest "title")` immediately following a `]`.
    fn try_inline_link(&self, pos: usize) -> Option<(NodeLink, usize)> {
        if self.chars.get(pos) != Some(&'(') {
            return None;
        }
        let rest = self.rest_as_string(pos + 1);
        let mut i = skip_spaces_and_newline(&rest, 0);

        let (url, title, consumed) = if rest.as_bytes().get(i) == Some(&b')') {
            (String::new(), String::new(), i + 1)
        } else {
            let (dest, dest_len) = parse_link_destination(&rest[i..])?;
            let url = strings::clean_url(dest);
            i += dest_len;
            let after_dest = i;
            let ws = skip_spaces_and_newline(&rest, i);
            let mut title = String::new();
            let mut end = after_dest;
            if ws > after_dest {
                if let Some((title_raw, tlen)) = parse_link_title(&rest[ws..]) {
                    title = strings::clean_title(title_raw);
                    end = ws + tlen;
                }
            }
            let close_ws = skip_spaces_and_newline(&rest, end);
            if rest.as_bytes().get(close_ws) != Some(&b')') {
                return None;
            }
            (url, title, close_ws + 1)
        };

        // `consumed` is a *byte* offset into `rest` (the destination/title
        // grammar is byte-oriented); convert back to a char count before
        // advancing `self.pos`, which indexes `self.chars`.
        let char_count = rest[..consumed].chars().count();
        Some((NodeLink { url, title }, pos + 1 + char_count))
    }

    /// Tries a reference-style link/image: `[label]`, `[]` (collapsed), or
    /// a bare shortcut using the bracketed text itself as the label.
    fn try_reference_link(&self, pos: usize, bracket_index: usize) -> Option<(NodeLink, usize)> {
        let text_label = self.text_between(self.brackets[bracket_index].marker, pos);

        if self.chars.get(pos) == Some(&'[') {
            if let Some(end) = self.find_unescaped(pos + 1, ']') {
                let explicit: String = self.chars[pos + 1..end].iter().collect();
                let label = if explicit.is_empty() { &text_label } else { &explicit };
                let key = strings::normalize_label(label);
                if let Some(r) = self.refmap.get(&key) {
                    return Some((
                        NodeLink {
                            url: r.url.clone(),
                            title: r.title.clone(),
                        },
                        end + 1,
                    ));
                }
                return None;
            }
        }

        let key = strings::normalize_label(&text_label);
        let r = self.refmap.get(&key)?;
        Some((
            NodeLink {
                url: r.url.clone(),
                title: r.title.clone(),
            },
            pos,
        ))
    }

    fn find_unescaped(&self, from: usize, target: char) -> Option<usize> {
        let mut i = from;
        while i < self.chars.len() {
            match self.chars[i] {
                '\\' if i + 1 < self.chars.len() => i += 2,
                c if c == target => return Some(i),
                '[' if target == ']' => return None,
                _ => i += 1,
            }
        }
        None
    }

    fn text_between(&self, marker: &'a AstNode<'a>, pos_end_exclusive: usize) -> String {
        // The bracket text is whatever plain characters were scanned
        // between the marker's position and `]`; easiest to recover it
        // from the already-built sibling Text nodes, since no other inline
        // construct can have been promoted to Link/Image inside it yet
        // (links don't nest) for the purpose of a *label* comparison.
        let mut out = String::new();
        let mut node = marker.next_sibling();
        while let Some(n) = node {
            if let NodeValue::Text(t) = &n.data.borrow().value {
                out.push_str(t);
            }
            node = n.next_sibling();
        }
        let _ = pos_end_exclusive;
        out
    }

    /// Replaces `marker` and everything after it (the bracketed content)
    /// with a single `Link`/`Image` node containing that content as
    /// children.
    fn splice_link(
        &mut self,
        parent: &'a AstNode<'a>,
        marker: &'a AstNode<'a>,
        link: NodeLink,
        is_image: bool,
    ) {
        let value = if is_image {
            NodeValue::Image(link)
        } else {
            NodeValue::Link(link)
        };
        let wrapper = self.arena.alloc(AstNode::new(RefCell::new(make_block(value, 0))));
        marker.insert_after(wrapper);

        let mut child = wrapper.next_sibling();
        while let Some(c) = child {
            let next = c.next_sibling();
            wrapper.append(c);
            child = next;
        }
        marker.detach();
        let _ = parent;
    }

    fn handle_angle(&mut self, parent: &'a AstNode<'a>) {
        // The scanners below work in bytes; every offset they return is
        // translated back to a char count (via `chars().count()` on the
        // consumed byte slice) before it advances `self.pos`, which indexes
        // `self.chars`.
        let rest = self.rest_as_string(self.pos + 1);
        if let Some(byte_len) = autolink::uri_autolink(&rest) {
            let raw = &rest[..byte_len];
            let char_len = raw.chars().count();
            let raw = raw.to_string();
            self.add_autolink(parent, &raw);
            self.pos += 1 + char_len + 1;
            return;
        }
        if let Some(byte_len) = autolink::email_autolink(&rest) {
            let raw = rest[..byte_len].to_string();
            let char_len = raw.chars().count();
            self.add_child(
                parent,
                NodeValue::AutoLink(NodeAutoLink {
                    url: format!("mailto:{raw}"),
                }),
            );
            let text_node = self.arena.alloc(AstNode::new(RefCell::new(make_block(
                NodeValue::Text(raw),
                0,
            ))));
            parent.last_child().unwrap().append(text_node);
            self.pos += 1 + char_len + 1;
            return;
        }
        let whole = self.rest_as_string(self.pos);
        if let Some(tag_byte_len) = scanners::html_tag(&whole) {
            let raw = whole[..tag_byte_len].to_string();
            self.pos += raw.chars().count();
            self.add_child(parent, NodeValue::HtmlInline(raw));
            return;
        }
        if whole.starts_with("<!--") {
            if let Some(end) = scanners::html_comment_close(&whole[4..]) {
                let raw = whole[..4 + end].to_string();
                self.pos += raw.chars().count();
                self.add_child(parent, NodeValue::HtmlInline(raw));
                return;
            }
        }
        if whole.starts_with("<?") {
            if let Some(end) = scanners::html_pi_close(&whole[2..]) {
                let raw = whole[..2 + end].to_string();
                self.pos += raw.chars().count();
                self.add_child(parent, NodeValue::HtmlInline(raw));
                return;
            }
        }
        if whole.starts_with("<![CDATA[") {
            if let Some(end) = scanners::html_cdata_close(&whole[9..]) {
                let raw = whole[..9 + end].to_string();
                self.pos += raw.chars().count();
                self.add_child(parent, NodeValue::HtmlInline(raw));
                return;
            }
        }
        if whole.as_bytes().get(1) == Some(&b'!')
            && whole.as_bytes().get(2).is_some_and(|b| b.is_ascii_alphabetic())
        {
            if let Some(end) = scanners::html_declaration_close(&whole[2..]) {
                let raw = whole[..2 + end].to_string();
                self.pos += raw.chars().count();
                self.add_child(parent, NodeValue::HtmlInline(raw));
                return;
            }
        }
        self.pos += 1;
        self.append_text(parent, "<".to_string());
    }

    fn add_autolink(&mut self, parent: &'a AstNode<'a>, raw: &str) {
        let node = self.add_child(
            parent,
            NodeValue::AutoLink(NodeAutoLink { url: raw.to_string() }),
        );
        let text_node = self.arena.alloc(AstNode::new(RefCell::new(make_block(
            NodeValue::Text(raw.to_string()),
            0,
        ))));
        node.append(text_node);
    }

    fn handle_entity(&mut self, parent: &'a AstNode<'a>) {
        let rest = self.rest_as_string(self.pos + 1);
        if let Some((decoded, len)) = entity::unescape(&rest) {
            self.append_text(parent, decoded);
            self.pos += 1 + len;
        } else {
            self.pos += 1;
            self.append_text(parent, "&".to_string());
        }
    }

    /// The two-pass emphasis algorithm (CommonMark §6.2): scans forward for
    /// closers, and for each, scans backward for the nearest compatible
    /// opener, wrapping the run between them.
    fn process_emphasis(&mut self, parent: &'a AstNode<'a>, stack_bottom: usize) {
        let mut closer_idx = stack_bottom;
        while closer_idx < self.delimiters.len() {
            if !self.delimiters[closer_idx].can_close || self.delimiters[closer_idx].length == 0 {
                closer_idx += 1;
                continue;
            }

            let run_char = self.delimiters[closer_idx].run_char;
            let mut opener_idx = closer_idx;
            let mut found = None;
            while opener_idx > stack_bottom {
                opener_idx -= 1;
                let opener = &self.delimiters[opener_idx];
                if opener.run_char != run_char || !opener.can_open || opener.length == 0 {
                    continue;
                }
                if run_char != '~' {
                    let closer = &self.delimiters[closer_idx];
                    let sums_to_multiple_of_3 =
                        (opener.original_length + closer.original_length) % 3 == 0;
                    if (opener.can_close || closer.can_open)
                        && sums_to_multiple_of_3
                        && (opener.original_length % 3 != 0 || closer.original_length % 3 != 0)
                    {
                        continue;
                    }
                }
                found = Some(opener_idx);
                break;
            }

            let opener_idx = match found {
                Some(i) => i,
                None => {
                    self.delimiters[closer_idx].can_close = false;
                    closer_idx += 1;
                    continue;
                }
            };

            let use_delims = if run_char == '~' {
                2
            } else if self.delimiters[opener_idx].length >= 2 && self.delimiters[closer_idx].length >= 2
            {
                2
            } else {
                1
            };

            self.wrap_delimited(parent, opener_idx, closer_idx, run_char, use_delims);

            self.delimiters[opener_idx].length -= use_delims;
            self.delimiters[closer_idx].length -= use_delims;

            // Drop any now-fully-spent delimiters strictly between the two
            // (they can no longer participate in any match).
            if opener_idx + 1 < closer_idx {
                self.delimiters.drain(opener_idx + 1..closer_idx);
                closer_idx = opener_idx + 1;
            }

            if self.delimiters[opener_idx].length == 0 {
                self.delimiters.remove(opener_idx);
                closer_idx -= 1;
            }
            if closer_idx < self.delimiters.len() && self.delimiters[closer_idx].length == 0 {
                self.delimiters.remove(closer_idx);
            }
        }
    }

    /// Trims `use_delims` characters from the end of the opener's literal
    /// text and the start of the closer's, wraps everything between them
    /// (now exclusive of the trimmed delimiter runs) in a new Emph/Strong/
    /// Strikethrough node.
    fn wrap_delimited(
        &mut self,
        parent: &'a AstNode<'a>,
        opener_idx: usize,
        closer_idx: usize,
        run_char: char,
        use_delims: usize,
    ) {
        let opener_node = self.delimiters[opener_idx].node;
        let closer_node = self.delimiters[closer_idx].node;

        trim_text_suffix(opener_node, use_delims);
        trim_text_prefix(closer_node, use_delims);

        let value = if run_char == '~' {
            NodeValue::Strikethrough
        } else if use_delims == 2 {
            NodeValue::Strong
        } else {
            NodeValue::Emph
        };
        let wrapper = self.arena.alloc(AstNode::new(RefCell::new(make_block(value, 0))));
        opener_node.insert_after(wrapper);

        let mut child = wrapper.next_sibling();
        while let Some(c) = child {
            if c.same_node(closer_node) {
                break;
            }
            let next = c.next_sibling();
            wrapper.append(c);
            child = next;
        }

        if text_is_empty(opener_node) {
            opener_node.detach();
        }
        if text_is_empty(closer_node) {
            closer_node.detach();
        }
        let _ = parent;
    }
}

fn text_is_empty<'a>(node: &'a AstNode<'a>) -> bool {
    matches!(&node.data.borrow().value, NodeValue::Text(t) if t.is_empty())
}

fn trim_text_suffix<'a>(node: &'a AstNode<'a>, n: usize) {
    if let NodeValue::Text(t) = &mut node.data.borrow_mut().value {
        let new_len = t.chars().count().saturating_sub(n);
        *t = t.chars().take(new_len).collect();
    }
}

fn trim_text_prefix<'a>(node: &'a AstNode<'a>, n: usize) {
    if let NodeValue::Text(t) = &mut node.data.borrow_mut().value {
        *t = t.chars().skip(n).collect();
    }
}

fn is_special(c: char) -> bool {
    matches!(c, '\\' | '`' | '\n' | '*' | '_' | '~' | '[' | ']' | '!' | '<' | '&')
}

fn is_ascii_punct(c: char) -> bool {
    c.is_ascii_punctuation()
}

fn normalize_code_span(raw: &str) -> String {
    let collapsed = strings::normalize_whitespace(raw);
    let trimmed = strings::trim(&collapsed);
    if !trimmed.is_empty() && trimmed != " " {
        trimmed.to_string()
    } else if collapsed == " " {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Left/right-flanking classification (CommonMark §6.2) and the resulting
/// can-open/can-close flags, including the extra underscore restriction
/// (rules 3 and 4) that keeps `a_b_c` from emphasising mid-word.
fn flanking(before: Option<char>, after: Option<char>, run_char: char) -> (bool, bool) {
    let before_ws = before.map(isspace_char).unwrap_or(true);
    let before_punct = before.map(ispunct_char).unwrap_or(false);
    let after_ws = after.map(isspace_char).unwrap_or(true);
    let after_punct = after.map(ispunct_char).unwrap_or(false);

    let left_flanking = !after_ws && !(after_punct && !before_ws && !before_punct);
    let right_flanking = !before_ws && !(before_punct && !after_ws && !after_punct);

    if run_char == '_' {
        let can_open = left_flanking && (!right_flanking || before_punct);
        let can_close = right_flanking && (!left_flanking || after_punct);
        (can_open, can_close)
    } else {
        (left_flanking, right_flanking)
    }
}

fn skip_spaces_and_newline(s: &str, mut i: usize) -> usize {
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

/// Parses a link destination: `<...>`-wrapped, or a bare run with balanced
/// parens and no unescaped whitespace/control characters. Shared by the
/// inline-link grammar and block-level reference-definition parsing.
pub(crate) fn parse_link_destination(s: &str) -> Option<(&str, usize)> {
    let bytes = s.as_bytes();
    if bytes.first() == Some(&b'<') {
        let mut i = 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' if i + 1 < bytes.len() => i += 2,
                b'>' => return Some((&s[1..i], i + 1)),
                b'<' | b'\n' => return None,
                _ => i += 1,
            }
        }
        None
    } else {
        let mut i = 0;
        let mut depth = 0i32;
        while i < bytes.len() {
            let b = bytes[i];
            if b == b'\\' && i + 1 < bytes.len() {
                i += 2;
                continue;
            }
            if b <= 0x1F || b == b' ' {
                break;
            }
            if b == b'(' {
                depth += 1;
            } else if b == b')' {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            i += 1;
        }
        if i == 0 {
            None
        } else {
            Some((&s[..i], i))
        }
    }
}

/// Parses a link title: a `"`, `'`, or `(...)`-delimited run that may not
/// contain a blank line. Shared the same way as [`parse_link_destination`].
pub(crate) fn parse_link_title(s: &str) -> Option<(&str, usize)> {
    let bytes = s.as_bytes();
    let close = match bytes.first() {
        Some(b'"') => b'"',
        Some(b'\'') => b'\'',
        Some(b'(') => b')',
        _ => return None,
    };
    let mut i = 1;
    let mut consecutive_newlines = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() => {
                i += 2;
                consecutive_newlines = 0;
            }
            b'\n' => {
                consecutive_newlines += 1;
                if consecutive_newlines >= 2 {
                    return None;
                }
                i += 1;
            }
            b if b == close => return Some((&s[1..i], i + 1)),
            _ => {
                consecutive_newlines = 0;
                i += 1;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::Ast;

    fn render_text<'a>(node: &'a AstNode<'a>) -> String {
        let mut out = String::new();
        for child in node.children() {
            match &child.data.borrow().value {
                NodeValue::Text(t) => out.push_str(t),
                _ => out.push_str(&render_text(child)),
            }
        }
        out
    }

    fn run<'a>(arena: &'a Arena<AstNode<'a>>, src: &str) -> &'a AstNode<'a> {
        let refmap = FxHashMap::default();
        let parent = arena.alloc(AstNode::new(RefCell::new(Ast {
            value: NodeValue::Paragraph,
            start_line: 1,
            content: String::new(),
            open: false,
            last_line_blank: false,
        })));
        let mut subject = Subject::new(arena, &refmap, src);
        subject.parse_into(parent);
        parent
    }

    #[test]
    fn plain_text() {
        let arena = Arena::new();
        let node = run(&arena, "hello world");
        assert_eq!(render_text(node), "hello world");
    }

    #[test]
    fn emphasis_and_strong() {
        let arena = Arena::new();
        let node = run(&arena, "*a* **b** ***c***");
        let kinds: Vec<_> = node
            .children()
            .map(|c| std::mem::discriminant(&c.data.borrow().value))
            .collect();
        assert!(kinds.contains(&std::mem::discriminant(&NodeValue::Emph)));
        assert!(kinds.contains(&std::mem::discriminant(&NodeValue::Strong)));
    }

    #[test]
    fn strikethrough() {
        let arena = Arena::new();
        let node = run(&arena, "~~gone~~");
        assert!(node
            .children()
            .any(|c| matches!(c.data.borrow().value, NodeValue::Strikethrough)));
    }

    #[test]
    fn inline_link() {
        let arena = Arena::new();
        let node = run(&arena, "[text](/url \"t\")");
        let link = node.first_child().unwrap();
        match &link.data.borrow().value {
            NodeValue::Link(l) => {
                assert_eq!(l.url, "/url");
                assert_eq!(l.title, "t");
            }
            other => panic!("expected Link, got {other:?}"),
        }
    }

    #[test]
    fn shortcut_reference_link() {
        let arena = Arena::new();
        let mut refmap = FxHashMap::default();
        refmap.insert(
            "foo".to_string(),
            NodeReference {
                label: "foo".to_string(),
                url: "/foo".to_string(),
                title: String::new(),
            },
        );
        let parent = arena.alloc(AstNode::new(RefCell::new(Ast {
            value: NodeValue::Paragraph,
            start_line: 1,
            content: String::new(),
            open: false,
            last_line_blank: false,
        })));
        let mut subject = Subject::new(&arena, &refmap, "[foo]");
        subject.parse_into(parent);
        let link = parent.first_child().unwrap();
        assert!(matches!(&link.data.borrow().value, NodeValue::Link(l) if l.url == "/foo"));
    }

    #[test]
    fn code_span_collapses_whitespace() {
        let arena = Arena::new();
        let node = run(&arena, "`` a  b ``");
        let code = node.first_child().unwrap();
        assert!(matches!(&code.data.borrow().value, NodeValue::Code(c) if c == "a b"));
    }

    #[test]
    fn hard_break_from_two_trailing_spaces() {
        let arena = Arena::new();
        let node = run(&arena, "a  \nb");
        assert!(node
            .children()
            .any(|c| matches!(c.data.borrow().value, NodeValue::LineBreak)));
    }
}
