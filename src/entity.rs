//! HTML5 entity decoding (CommonMark §6.2's "entity and numeric character
//! references"). Named entities are resolved against a perfect-hash map
//! generated at build time from the WHATWG entity table (see `build.rs`);
//! numeric references are decoded by hand.

use crate::ctype::{isdigit, isxdigit};
use std::cmp::min;

include!(concat!(env!("OUT_DIR"), "/entitydata.rs"));

pub const ENTITY_MIN_LENGTH: usize = 2;
pub const ENTITY_MAX_LENGTH: usize = 31;

/// Attempts to decode an entity reference starting just after the `&` at
/// the front of `text`. Returns the decoded text and the number of bytes
/// consumed (including the trailing `;`), or `None` if `text` does not
/// begin with a well-formed reference.
pub fn unescape(text: &str) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    if bytes.len() >= 3 && bytes[0] == b'#' {
        let mut codepoint: u32 = 0;
        let mut i;

        let num_digits = if bytes.len() > 1 && isdigit(bytes[1]) {
            i = 1;
            while i < bytes.len() && isdigit(bytes[i]) {
                codepoint = codepoint.saturating_mul(10).saturating_add((bytes[i] - b'0') as u32);
                codepoint = min(codepoint, 0x11_0000);
                i += 1;
            }
            i - 1
        } else if bytes.len() > 1 && (bytes[1] == b'x' || bytes[1] == b'X') {
            i = 2;
            while i < bytes.len() && isxdigit(bytes[i]) {
                codepoint = codepoint.saturating_mul(16).saturating_add(hex_value(bytes[i]));
                codepoint = min(codepoint, 0x11_0000);
                i += 1;
            }
            i - 2
        } else {
            0
        };

        if (1..=8).contains(&num_digits) && i < bytes.len() && bytes[i] == b';' {
            if codepoint == 0 || (0xD800..=0xE000).contains(&codepoint) || codepoint >= 0x110000 {
                codepoint = 0xFFFD;
            }
            let ch = char::from_u32(codepoint).unwrap_or('\u{FFFD}');
            return Some((ch.to_string(), i + 1));
        }
        return None;
    }

    let size = min(bytes.len(), ENTITY_MAX_LENGTH);
    for i in ENTITY_MIN_LENGTH..size {
        if bytes[i] == b' ' {
            return None;
        }
        if bytes[i] == b';' {
            return lookup(&text[..i]).map(|s| (s.to_string(), i + 1));
        }
    }

    None
}

fn hex_value(ch: u8) -> u32 {
    match ch {
        b'0'..=b'9' => (ch - b'0') as u32,
        b'a'..=b'f' => (ch - b'a' + 10) as u32,
        b'A'..=b'F' => (ch - b'A' + 10) as u32,
        _ => 0,
    }
}

fn lookup(name: &str) -> Option<&'static str> {
    TRANSLATED_ENTITIES.get(name).copied()
}

/// Decodes every entity and numeric reference in `src`, leaving any `&`
/// that does not begin a well-formed reference untouched.
pub fn unescape_html(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut rest = src;

    loop {
        match rest.find('&') {
            None => {
                out.push_str(rest);
                return out;
            }
            Some(pos) => {
                out.push_str(&rest[..pos]);
                rest = &rest[pos + 1..];
                match unescape(rest) {
                    Some((decoded, consumed)) => {
                        out.push_str(&decoded);
                        rest = &rest[consumed..];
                    }
                    None => out.push('&'),
                }
            }
        }
    }
}
