//! Hand-rolled line scanners for the block rules that need to recognise a
//! fixed shape (thematic breaks, ATX/setext headings, code fences, HTML
//! block openers) without paying for a general regex engine.

use crate::ctype::isspace;

pub enum SetextChar {
    Equals,
    Hyphen,
}

/// A line is a thematic break if, after its leading indent, it consists of
/// three or more of the same marker (`-`, `*`, `_`), optionally interleaved
/// with spaces or tabs, and nothing else.
pub fn thematic_break(line: &str) -> bool {
    let bytes = line.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    let marker = bytes[0];
    if marker != b'-' && marker != b'*' && marker != b'_' {
        return false;
    }
    let mut count = 0;
    for &b in bytes {
        if b == marker {
            count += 1;
        } else if b == b' ' || b == b'\t' {
            continue;
        } else {
            return false;
        }
    }
    count >= 3
}

/// Recognises `#{1,6}` followed by a space/tab or end-of-line. Returns the
/// heading level and the byte offset where the heading content begins.
pub fn atx_heading_start(line: &str) -> Option<(u8, usize)> {
    let bytes = line.as_bytes();
    let mut level = 0usize;
    while level < bytes.len() && bytes[level] == b'#' {
        level += 1;
    }
    if level == 0 || level > 6 {
        return None;
    }
    if level == bytes.len() {
        return Some((level as u8, level));
    }
    if bytes[level] == b' ' || bytes[level] == b'\t' {
        Some((level as u8, level + 1))
    } else {
        None
    }
}

/// A setext underline is a run of `=` or a run of `-`, with only trailing
/// spaces/tabs permitted after it.
pub fn setext_heading_line(line: &str) -> Option<SetextChar> {
    let bytes = line.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    let marker = bytes[0];
    if marker != b'=' && marker != b'-' {
        return None;
    }
    let mut i = 0;
    while i < bytes.len() && bytes[i] == marker {
        i += 1;
    }
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    if i != bytes.len() {
        return None;
    }
    Some(if marker == b'=' {
        SetextChar::Equals
    } else {
        SetextChar::Hyphen
    })
}

/// Returns `(fence_char, fence_length, info_string_start)` for an opening
/// code fence: at least 3 backticks or tildes, with no backtick allowed
/// later on the same line if the fence character is a backtick.
pub fn open_code_fence(line: &str) -> Option<(u8, usize, usize)> {
    let bytes = line.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    let marker = bytes[0];
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let mut len = 0;
    while len < bytes.len() && bytes[len] == marker {
        len += 1;
    }
    if len < 3 {
        return None;
    }
    if marker == b'`' && bytes[len..].contains(&b'`') {
        return None;
    }
    let mut info_start = len;
    while info_start < bytes.len() && (bytes[info_start] == b' ' || bytes[info_start] == b'\t') {
        info_start += 1;
    }
    Some((marker, len, info_start))
}

/// A closing fence is the same character repeated at least `min_len` times,
/// at most three leading spaces, and nothing but trailing whitespace after.
pub fn close_code_fence(line: &str, marker: u8, min_len: usize) -> bool {
    let trimmed = line.trim_start_matches(|c| c == ' ' || c == '\t');
    if line.len() - trimmed.len() > 3 {
        return false;
    }
    let bytes = trimmed.as_bytes();
    let mut len = 0;
    while len < bytes.len() && bytes[len] == marker {
        len += 1;
    }
    if len < min_len || len < 3 {
        return false;
    }
    bytes[len..].iter().all(|&b| b == b' ' || b == b'\t')
}

/// Recognised HTML block start conditions 1-7 (CommonMark §4.6). Returns the
/// condition number.
pub fn html_block_start(line: &str) -> Option<u8> {
    let lower_start: String = line.chars().take(16).flat_map(|c| c.to_lowercase()).collect();
    if line.starts_with("<!--") {
        return Some(2);
    }
    if line.starts_with("<?") {
        return Some(3);
    }
    if line.starts_with("<![CDATA[") {
        return Some(5);
    }
    if lower_start.starts_with("<!") && line.as_bytes().get(2).is_some_and(u8::is_ascii_alphabetic)
    {
        return Some(4);
    }
    for tag in ["script", "pre", "style", "textarea"] {
        if tag_opens_with(&lower_start, tag) {
            return Some(1);
        }
    }
    for tag in HTML_BLOCK_TAGS_6 {
        if tag_opens_with(&lower_start, tag) {
            return Some(6);
        }
    }
    None
}

fn tag_opens_with(lower_start: &str, tag: &str) -> bool {
    if !lower_start.starts_with('<') {
        return false;
    }
    let rest = &lower_start[1..];
    let close = rest.starts_with('/');
    let rest = if close { &rest[1..] } else { rest };
    if !rest.starts_with(tag) {
        return false;
    }
    match rest.as_bytes().get(tag.len()) {
        None => true,
        Some(b) => !b.is_ascii_alphanumeric() && *b != b'-',
    }
}

const HTML_BLOCK_TAGS_6: &[&str] = &[
    "address", "article", "aside", "base", "basefont", "blockquote", "body", "caption", "center",
    "col", "colgroup", "dd", "details", "dialog", "dir", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hr", "html", "iframe", "legend", "li", "link", "main", "menu",
    "menuitem", "nav", "noframes", "ol", "optgroup", "option", "p", "param", "section", "summary",
    "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr", "track", "ul",
];

/// Condition 7: a generic open or close tag, on a line by itself, with
/// nothing but whitespace before or after.
pub fn html_block_start_7(line: &str) -> bool {
    html_tag(line)
        .map(|end| is_rest_blank(&line[end..]))
        .unwrap_or(false)
}

fn is_rest_blank(s: &str) -> bool {
    s.bytes().all(|b| isspace(b))
}

/// Recognises a single open or close HTML tag at the start of `s`, per
/// CommonMark's tag-name/attribute grammar, returning the byte length
/// consumed.
pub fn html_tag(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'<') {
        return None;
    }
    let mut i = 1;
    let closing = bytes.get(i) == Some(&b'/');
    if closing {
        i += 1;
    }
    let name_start = i;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-') {
        i += 1;
    }
    if i == name_start || !bytes[name_start].is_ascii_alphabetic() {
        return None;
    }

    if closing {
        while i < bytes.len() && isspace(bytes[i]) {
            i += 1;
        }
        return if bytes.get(i) == Some(&b'>') {
            Some(i + 1)
        } else {
            None
        };
    }

    loop {
        let before = i;
        while i < bytes.len() && isspace(bytes[i]) {
            i += 1;
        }
        if i == before && i < bytes.len() && bytes[i] != b'/' && bytes[i] != b'>' {
            return None;
        }
        if bytes.get(i) == Some(&b'/') {
            i += 1;
            return if bytes.get(i) == Some(&b'>') {
                Some(i + 1)
            } else {
                None
            };
        }
        if bytes.get(i) == Some(&b'>') {
            return Some(i + 1);
        }
        if i >= bytes.len() || !(bytes[i].is_ascii_alphabetic() || bytes[i] == b'_' || bytes[i] == b':') {
            return None;
        }
        let attr_start = i;
        while i < bytes.len()
            && (bytes[i].is_ascii_alphanumeric() || matches!(bytes[i], b'_' | b':' | b'.' | b'-'))
        {
            i += 1;
        }
        if i == attr_start {
            return None;
        }
        let after_name = i;
        while i < bytes.len() && isspace(bytes[i]) {
            i += 1;
        }
        if bytes.get(i) == Some(&b'=') {
            i += 1;
            while i < bytes.len() && isspace(bytes[i]) {
                i += 1;
            }
            match bytes.get(i) {
                Some(b'"') => {
                    i += 1;
                    let start = i;
                    while i < bytes.len() && bytes[i] != b'"' {
                        i += 1;
                    }
                    if i >= bytes.len() {
                        return None;
                    }
                    let _ = start;
                    i += 1;
                }
                Some(b'\'') => {
                    i += 1;
                    while i < bytes.len() && bytes[i] != b'\'' {
                        i += 1;
                    }
                    if i >= bytes.len() {
                        return None;
                    }
                    i += 1;
                }
                Some(_) => {
                    while i < bytes.len() && !isspace(bytes[i]) && bytes[i] != b'>' && bytes[i] != b'/' {
                        i += 1;
                    }
                }
                None => return None,
            }
        } else {
            i = after_name;
        }
    }
}

pub fn html_comment_close(s: &str) -> Option<usize> {
    s.find("-->").map(|p| p + 3)
}

pub fn html_pi_close(s: &str) -> Option<usize> {
    s.find("?>").map(|p| p + 2)
}

pub fn html_cdata_close(s: &str) -> Option<usize> {
    s.find("]]>").map(|p| p + 3)
}

pub fn html_declaration_close(s: &str) -> Option<usize> {
    s.find('>').map(|p| p + 1)
}
