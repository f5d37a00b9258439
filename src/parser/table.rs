//! GFM pipe-table parsing. A table is recognised retroactively: a
//! single-line open paragraph followed by a delimiter row of the form
//! `:?-+:?` per column, separated by `|`, is reinterpreted as a table
//! header plus alignment row; subsequent lines become body rows until a
//! blank line, an indented line, or a line that doesn't split into cells.

use crate::nodes::{make_block, AstNode, NodeValue, TableAlignment};
use crate::parser::Parser;
use crate::strings::trim;
use std::cell::RefCell;
use std::cmp::min;

/// If `container` is an open one-line paragraph and `line` is a valid
/// delimiter row matching its cell count, replaces the paragraph with a
/// `Table` + header `TableRow`, and returns the new table node. Otherwise
/// returns `None`.
pub fn try_opening_header<'a>(
    parser: &mut Parser<'a>,
    container: &'a AstNode<'a>,
    line: &str,
) -> Option<&'a AstNode<'a>> {
    if !matches!(container.data.borrow().value, NodeValue::Paragraph) {
        return None;
    }

    let header_row = row(&container.data.borrow().content)?;
    if header_row.is_empty() {
        return None;
    }

    let marker_row = delimiter_row(line)?;
    if header_row.len() != marker_row.len() {
        return None;
    }

    let start_line = container.data.borrow().start_line;
    let table_value = NodeValue::Table(marker_row);
    let table = parser.arena.alloc(AstNode::new(RefCell::new(make_block(
        table_value,
        start_line,
    ))));
    container.insert_after(table);
    container.detach();

    let header = parser.arena.alloc(AstNode::new(RefCell::new(make_block(
        NodeValue::TableRow(true),
        start_line,
    ))));
    table.append(header);
    for cell_text in header_row {
        let cell = parser.arena.alloc(AstNode::new(RefCell::new(make_block(
            NodeValue::TableCell,
            start_line,
        ))));
        cell.data.borrow_mut().content = cell_text;
        header.append(cell);
    }
    header.data.borrow_mut().open = false;

    Some(table)
}

/// If `container` is an open `Table`, tries to parse `line` as a body row.
/// Returns `true` if it did (consuming the whole line), `false` if the
/// table should instead be closed (blank line, indented line, or a line
/// that fails to split into pipe-separated cells).
pub fn try_opening_row<'a>(parser: &mut Parser<'a>, container: &'a AstNode<'a>, line: &str) -> bool {
    let aligns = match &container.data.borrow().value {
        NodeValue::Table(aligns) => aligns.clone(),
        _ => return false,
    };

    if parser.blank || parser.indent >= 4 {
        return false;
    }

    let cells = match row(line) {
        Some(c) => c,
        None => return false,
    };

    let start_line = container.data.borrow().start_line;
    let new_row = parser.arena.alloc(AstNode::new(RefCell::new(make_block(
        NodeValue::TableRow(false),
        start_line,
    ))));
    container.append(new_row);

    let mut i = 0;
    while i < min(aligns.len(), cells.len()) {
        let cell = parser.arena.alloc(AstNode::new(RefCell::new(make_block(
            NodeValue::TableCell,
            start_line,
        ))));
        cell.data.borrow_mut().content = cells[i].clone();
        new_row.append(cell);
        i += 1;
    }
    while i < aligns.len() {
        let cell = parser.arena.alloc(AstNode::new(RefCell::new(make_block(
            NodeValue::TableCell,
            start_line,
        ))));
        new_row.append(cell);
        i += 1;
    }
    new_row.data.borrow_mut().open = false;

    true
}

/// Whether `line` has the shape of a table row at all (used by the block
/// parser to decide whether an open table continues).
pub(crate) fn looks_like_row(line: &str) -> bool {
    row(line).is_some()
}

/// Parses a delimiter row: one `:?-+:?` cell per column, `|`-separated,
/// optionally bracketed by leading/trailing `|`.
fn delimiter_row(line: &str) -> Option<Vec<TableAlignment>> {
    let cells = row(line)?;
    if cells.is_empty() {
        return None;
    }
    let mut aligns = Vec::with_capacity(cells.len());
    for cell in &cells {
        let bytes = cell.as_bytes();
        if bytes.is_empty() || !bytes.iter().all(|&b| b == b'-' || b == b':') {
            return None;
        }
        if !bytes.contains(&b'-') {
            return None;
        }
        let left = bytes[0] == b':';
        let right = bytes[bytes.len() - 1] == b':';
        aligns.push(match (left, right) {
            (true, true) => TableAlignment::Center,
            (true, false) => TableAlignment::Left,
            (false, true) => TableAlignment::Right,
            (false, false) => TableAlignment::None,
        });
    }
    Some(aligns)
}

/// Splits a pipe-table row into unescaped, trimmed cell strings. A leading
/// and/or trailing unescaped `|` is optional and ignored. Returns `None` if
/// the line has no pipe-delimited structure at all.
fn row(line: &str) -> Option<Vec<String>> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return None;
    }

    let mut chars = line.chars().peekable();
    // Skip a single leading unescaped pipe.
    let mut any_pipe = false;
    if chars.peek() == Some(&'|') {
        chars.next();
        any_pipe = true;
    }

    let mut cells = Vec::new();
    let mut cur = String::new();
    let mut escaping = false;

    for c in chars {
        if escaping {
            cur.push(c);
            escaping = false;
        } else if c == '\\' {
            cur.push('\\');
            escaping = true;
        } else if c == '|' {
            any_pipe = true;
            cells.push(unescape_pipes(trim(&cur)));
            cur.clear();
        } else {
            cur.push(c);
        }
    }

    if !any_pipe {
        return None;
    }

    let tail = trim(&cur);
    if !tail.is_empty() {
        cells.push(unescape_pipes(tail));
    }

    if cells.is_empty() {
        None
    } else {
        Some(cells)
    }
}

fn unescape_pipes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaping = false;
    for c in s.chars() {
        if escaping {
            out.push(c);
            escaping = false;
        } else if c == '\\' {
            escaping = true;
        } else {
            out.push(c);
        }
    }
    if escaping {
        out.push('\\');
    }
    out
}
