//! Small text-utility functions shared by the block parser, inline parser,
//! and renderer: trimming, backslash-unescaping, label normalisation, and
//! the CommonMark notion of "blank".

use crate::ctype::{ispunct, isspace};
use crate::entity;

/// Removes backslash escapes from `s` in place, the same rule the inline
/// parser uses for `Escape` tokens: `\` followed by ASCII punctuation
/// becomes the literal punctuation character.
pub fn unescape(s: &mut String) {
    let mut out = String::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() && ispunct(bytes[i + 1]) {
            out.push(bytes[i + 1] as char);
            i += 2;
        } else {
            // Advance by one UTF-8 scalar, not one byte.
            let ch_len = utf8_char_len(bytes[i]);
            out.push_str(&s[i..i + ch_len]);
            i += ch_len;
        }
    }
    *s = out;
}

fn utf8_char_len(first_byte: u8) -> usize {
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

/// Collapses every run of ASCII whitespace in `s` to a single space, used
/// when assembling a link label's comparison key and a paragraph's
/// continuation-line joins.
pub fn normalize_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = false;
    for c in s.chars() {
        if c.is_ascii() && isspace(c as u8) {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out
}

pub fn is_blank(s: &str) -> bool {
    s.bytes().all(|b| b == b' ' || b == b'\t')
}

pub fn rtrim(s: &str) -> &str {
    s.trim_end_matches(|c: char| c.is_ascii() && isspace(c as u8))
}

pub fn ltrim(s: &str) -> &str {
    s.trim_start_matches(|c: char| c.is_ascii() && isspace(c as u8))
}

pub fn trim(s: &str) -> &str {
    ltrim(rtrim(s))
}

/// Cleans a link/image destination: strips the `<...>` wrapper if present,
/// decodes entities, then removes backslash escapes.
pub fn clean_url(url: &str) -> String {
    let url = trim(url);
    if url.is_empty() {
        return String::new();
    }

    let inner = if url.starts_with('<') && url.ends_with('>') && url.len() >= 2 {
        &url[1..url.len() - 1]
    } else {
        url
    };

    let mut decoded = entity::unescape_html(inner);
    unescape(&mut decoded);
    decoded
}

/// Cleans a link/image title: strips its surrounding quote/paren pair,
/// decodes entities, then removes backslash escapes.
pub fn clean_title(title: &str) -> String {
    if title.is_empty() {
        return String::new();
    }

    let bytes = title.as_bytes();
    let first = bytes[0];
    let last = bytes[bytes.len() - 1];
    let inner = if (first == b'\'' && last == b'\'')
        || (first == b'(' && last == b')')
        || (first == b'"' && last == b'"')
    {
        &title[1..title.len() - 1]
    } else {
        title
    };

    let mut decoded = entity::unescape_html(inner);
    unescape(&mut decoded);
    decoded
}

/// Normalises a link label per CommonMark §6.7: trims, casefolds (Unicode
/// case-insensitive, via `caseless`), and collapses internal whitespace.
pub fn normalize_label(label: &str) -> String {
    let label = trim(label);
    let mut out = String::with_capacity(label.len());
    let mut last_was_space = false;
    for c in label.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            last_was_space = false;
            for folded in caseless::default_case_fold_str(&c.to_string()).chars() {
                out.push(folded);
            }
        }
    }
    out
}
