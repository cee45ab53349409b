// src/script/preprocess.rs

//! Splits an operation script into the shell payload and its transfer
//! directives.
//!
//! Recognised lines start at column 0 with one of the keywords `upload`,
//! `download`, `upload-input` or `download-output`, followed by a space and
//! the keyword's arguments. Every other line, including indented ones or a
//! keyword followed by a tab, is shell and goes into the payload byte for
//! byte, line terminator included.

use crate::script::directive::{Directive, ParseWarning, Transfer};

/// Result of [`preprocess`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preprocessed {
    /// Non-directive lines exactly as written, in original order.
    pub payload: String,
    /// Directives in encounter order.
    pub directives: Vec<Directive>,
    /// Directive lines that were dropped because their arguments were wrong.
    pub warnings: Vec<ParseWarning>,
}

impl Preprocessed {
    /// Directives that run before the payload, in encounter order.
    pub fn immediate(&self) -> impl Iterator<Item = &Directive> {
        self.directives.iter().filter(|d| d.is_immediate())
    }

    /// Directives that run after the payload, in encounter order.
    pub fn deferred(&self) -> impl Iterator<Item = &Directive> {
        self.directives.iter().filter(|d| !d.is_immediate())
    }
}

enum Line {
    Shell,
    Directive(Transfer),
    Malformed(&'static str),
}

/// Parse `script` into payload, directives and warnings.
///
/// Pure and deterministic. Running it again on the returned payload yields
/// the same payload and no directives.
pub fn preprocess(script: &str) -> Preprocessed {
    let mut out = Preprocessed::default();

    for (idx, raw) in script.split_inclusive('\n').enumerate() {
        let line = strip_terminator(raw);
        match classify(line) {
            Line::Shell => out.payload.push_str(raw),
            Line::Directive(transfer) => out.directives.push(Directive::new(transfer)),
            Line::Malformed(reason) => out.warnings.push(ParseWarning {
                line_number: idx + 1,
                line: line.to_string(),
                reason: reason.to_string(),
            }),
        }
    }

    out
}

/// `raw` without its trailing `\n` or `\r\n`.
fn strip_terminator(raw: &str) -> &str {
    match raw.strip_suffix('\n') {
        Some(line) => line.strip_suffix('\r').unwrap_or(line),
        None => raw,
    }
}

fn classify(line: &str) -> Line {
    let keyword_end = line.find(' ').unwrap_or(line.len());
    if keyword_end == 0 {
        return Line::Shell;
    }
    let (keyword, rest) = line.split_at(keyword_end);
    let args: Vec<&str> = rest.split_whitespace().collect();

    match keyword {
        // `upload` / `download` only count when followed by a separator, so
        // a bare word on its own line stays shell.
        "upload" if !rest.is_empty() => match args.as_slice() {
            [local, remote] => Line::Directive(Transfer::Upload {
                local: local.to_string(),
                remote: remote.to_string(),
            }),
            _ => Line::Malformed("expected `upload <local> <remote>`"),
        },
        "download" if !rest.is_empty() => match args.as_slice() {
            [remote, local] => Line::Directive(Transfer::Download {
                remote: remote.to_string(),
                local: local.to_string(),
            }),
            _ => Line::Malformed("expected `download <remote> <local>`"),
        },
        "upload-input" => match args.as_slice() {
            [] => Line::Directive(Transfer::UploadInput { remote: None }),
            [remote] => Line::Directive(Transfer::UploadInput {
                remote: Some(remote.to_string()),
            }),
            _ => Line::Malformed("expected `upload-input [remote]`"),
        },
        "download-output" => match args.as_slice() {
            [] => Line::Directive(Transfer::DownloadOutput { remote: None }),
            [remote] => Line::Directive(Transfer::DownloadOutput {
                remote: Some(remote.to_string()),
            }),
            _ => Line::Malformed("expected `download-output [remote]`"),
        },
        _ => Line::Shell,
    }
}
