// src/script/directive.rs

//! Transfer directives recognised inside operation scripts.

use std::fmt;

use crate::types::ExecutionOrder;

/// The file transfer a directive line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    /// `upload <local> <remote>`
    Upload { local: String, remote: String },
    /// `download <remote> <local>`
    Download { remote: String, local: String },
    /// `upload-input [remote]`: the host's local `input/` directory to
    /// `remote`, or to the operation's remote input dir when omitted.
    UploadInput { remote: Option<String> },
    /// `download-output [remote]`: `remote` (or the operation's remote output
    /// dir) into the host's local `output/` directory.
    DownloadOutput { remote: Option<String> },
}

impl Transfer {
    /// Uploads run before the payload, downloads after it.
    pub fn execution_order(&self) -> ExecutionOrder {
        match self {
            Transfer::Upload { .. } | Transfer::UploadInput { .. } => ExecutionOrder::Immediate,
            Transfer::Download { .. } | Transfer::DownloadOutput { .. } => {
                ExecutionOrder::Deferred
            }
        }
    }
}

/// One parsed directive line together with when it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub transfer: Transfer,
    pub order: ExecutionOrder,
}

impl Directive {
    pub fn new(transfer: Transfer) -> Self {
        let order = transfer.execution_order();
        Self { transfer, order }
    }

    pub fn is_immediate(&self) -> bool {
        self.order == ExecutionOrder::Immediate
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.transfer {
            Transfer::Upload { local, remote } => write!(f, "upload {local} {remote}"),
            Transfer::Download { remote, local } => write!(f, "download {remote} {local}"),
            Transfer::UploadInput { remote: Some(r) } => write!(f, "upload-input {r}"),
            Transfer::UploadInput { remote: None } => f.write_str("upload-input"),
            Transfer::DownloadOutput { remote: Some(r) } => write!(f, "download-output {r}"),
            Transfer::DownloadOutput { remote: None } => f.write_str("download-output"),
        }
    }
}

/// A directive line that could not be parsed and was left out of both the
/// payload and the directive list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based line number in the original script.
    pub line_number: usize,
    pub line: String,
    pub reason: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} ({:?})", self.line_number, self.reason, self.line)
    }
}
