//! Source normalisation run once before the block parser sees any line:
//! `\r\n`/`\r` become `\n`, NUL bytes become U+FFFD (grounded on the
//! teacher's line-buffering loop in `parser/mod.rs`, which does the same
//! substitution as it scans for line ends), the line-separator symbol
//! U+2424 becomes a space, and leading tabs are expanded to spaces on the
//! four-column tab stop CommonMark uses for block indentation.
//!
//! The teacher performs this substitution incrementally as it buffers
//! arbitrarily-chunked input; since this crate always has the whole
//! document in memory already, it's done as a single upfront pass instead.

const TAB_STOP: usize = 4;

pub fn normalize(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    // `at_line_start` stays true through purely-leading spaces so a tab
    // preceded by 1-3 spaces (e.g. "  \ty") still expands on the four-column
    // stop; it only drops once a non-space/non-tab character is seen.
    let mut at_line_start = true;
    let mut column = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '\0' => {
                out.push('\u{fffd}');
                at_line_start = false;
                column += 1;
            }
            '\u{2424}' => {
                out.push(' ');
                at_line_start = false;
                column += 1;
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
                at_line_start = true;
                column = 0;
            }
            '\n' => {
                out.push('\n');
                at_line_start = true;
                column = 0;
            }
            '\t' if at_line_start => {
                let spaces = TAB_STOP - (column % TAB_STOP);
                for _ in 0..spaces {
                    out.push(' ');
                }
                column += spaces;
            }
            ' ' if at_line_start => {
                out.push(' ');
                column += 1;
            }
            c => {
                out.push(c);
                at_line_start = false;
                column += 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crlf_and_cr_become_lf() {
        assert_eq!(normalize("a\r\nb\rc\n"), "a\nb\nc\n");
    }

    #[test]
    fn nul_becomes_replacement_char() {
        assert_eq!(normalize("a\0b"), "a\u{fffd}b");
    }

    #[test]
    fn leading_tab_expands_to_next_stop() {
        assert_eq!(normalize("\tx"), "    x");
        assert_eq!(normalize("  \ty"), "    y");
    }

    #[test]
    fn tab_inside_content_is_untouched() {
        assert_eq!(normalize("a\tb"), "a\tb");
    }
}
