//! Configuration for rendering. The block/inline grammar (CommonMark + GFM
//! tables/strikethrough) is always on; `Options` only governs the
//! renderer's escaping behaviour (spec §6).

#[cfg(feature = "bon")]
use bon::Builder;

/// Render-time configuration.
///
/// ```rust
/// # use mdcore::{markdown, Options};
/// let options = Options::default();
/// assert_eq!(
///     markdown("*hi*\n", &options).unwrap(),
///     "<p><em>hi</em></p>\n"
/// );
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "bon", derive(Builder))]
pub struct Options {
    /// HTML-escape `<`, `>`, and `&` in raw text spans (paragraphs, code
    /// spans, code blocks). Defaults to `true`.
    #[cfg_attr(feature = "bon", builder(default = true))]
    pub escape: bool,

    /// Preserve raw HTML (inline and block) rather than escaping it.
    /// Defaults to `true`. Deprecated: when `escape` is `true`, raw HTML is
    /// still passed through verbatim regardless of this flag — CommonMark
    /// defines raw HTML as opaque to the renderer's text-escaping rules, so
    /// this flag has never actually disabled it in practice. It is kept for
    /// source compatibility with configurations that set it explicitly.
    #[cfg_attr(feature = "bon", builder(default = true))]
    #[deprecated(note = "raw HTML is always preserved verbatim; this flag has no effect")]
    pub keep_html: bool,
}

impl Default for Options {
    fn default() -> Options {
        #[allow(deprecated)]
        Options {
            escape: true,
            keep_html: true,
        }
    }
}
