//! `mdcore`: read Markdown from stdin, write HTML to stdout.

use clap::Parser as ClapParser;
use mdcore::{markdown, Options};
use std::io::{self, Read, Write};
use std::process::ExitCode;

#[derive(ClapParser, Debug)]
#[command(name = "mdcore", about = "A CommonMark-to-HTML engine with GFM tables and strikethrough")]
struct Cli {
    /// HTML-escape `<`, `>`, and `&` in raw text spans (default).
    #[arg(short = 'e', long = "escape", conflicts_with = "no_escape")]
    escape: bool,

    /// Disable HTML-escaping of `<`, `>`, and `&` in raw text spans.
    #[arg(long = "no-escape")]
    no_escape: bool,

    /// Deprecated, no effect: raw HTML is always preserved verbatim.
    #[arg(short = 'k', long = "keep-html", conflicts_with = "no_keep_html")]
    keep_html: bool,

    #[arg(long = "no-keep-html")]
    no_keep_html: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut input = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input) {
        eprintln!("mdcore: error reading stdin: {e}");
        return ExitCode::FAILURE;
    }

    #[allow(deprecated)]
    let options = Options {
        escape: !cli.no_escape,
        keep_html: !cli.no_keep_html,
    };

    match markdown(&input, &options) {
        Ok(output) => {
            if let Err(e) = io::stdout().write_all(output.as_bytes()) {
                eprintln!("mdcore: error writing stdout: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("mdcore: {e}");
            ExitCode::FAILURE
        }
    }
}
