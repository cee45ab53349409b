// src/script/mod.rs

//! Operation scripts and the small transfer DSL embedded in them.
//!
//! - [`directive`] defines the parsed directive types.
//! - [`preprocess`] turns a script into a shell payload plus directives.
//! - [`source`] resolves what the operator asked to run into an [`Operation`].

pub mod directive;
pub mod preprocess;
pub mod source;

pub use directive::{Directive, ParseWarning, Transfer};
pub use preprocess::{preprocess, Preprocessed};
pub use source::ScriptSource;

/// A named script plus the remote directory defaults used by the
/// `upload-input` / `download-output` shorthands.
///
/// The script is not parsed until a session executes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    pub script: String,
    pub remote_input_dir: String,
    pub remote_output_dir: String,
}
