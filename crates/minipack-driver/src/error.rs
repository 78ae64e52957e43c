//! Error types for the bundler.

use std::path::PathBuf;

use minipack_ast::Span;
use minipack_parser::ParseError;
use thiserror::Error;

use crate::hooks::TapError;
use crate::loader::LoaderError;

/// Result type for bundler operations.
pub type Result<T> = std::result::Result<T, BundleError>;

/// Everything that can abort a compilation run.
#[derive(Debug, Error)]
pub enum BundleError {
    /// No candidate path for a specifier exists in the file store.
    #[error("cannot resolve '{specifier}'{}: tried {}", from_clause(importer), list_paths(tried))]
    Resolution {
        specifier: String,
        importer: Option<PathBuf>,
        tried: Vec<PathBuf>,
    },

    /// The post-loader text of a module is not valid parser input.
    #[error("failed to parse {}: {}", path.display(), list_errors(errors))]
    Parse {
        path: PathBuf,
        /// Post-loader text the spans point into.
        text: String,
        errors: Vec<ParseError>,
    },

    /// A `require` call whose argument is not a single string literal.
    #[error("unsupported import in {}: {reason}", path.display())]
    UnsupportedImport {
        path: PathBuf,
        span: Span,
        reason: String,
        text: String,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A loader rejected its input.
    #[error("loader '{loader}' failed on {}: {source}", path.display())]
    Loader {
        loader: String,
        path: PathBuf,
        #[source]
        source: LoaderError,
    },

    /// Writing an asset failed. The built compilation is kept for
    /// [`Compiler::retry_emit`](crate::Compiler::retry_emit).
    #[error("failed to write {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("plugin tap '{tap}' failed in '{hook}' hook: {source}")]
    Plugin {
        hook: &'static str,
        tap: String,
        #[source]
        source: TapError,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("a compilation is already running on this compiler")]
    AlreadyRunning,

    #[error("no built compilation is waiting to be written")]
    NothingToEmit,
}

impl BundleError {
    /// The module text and spans to point at, for errors that have them.
    pub fn source_spans(&self) -> Option<(&PathBuf, &str, Vec<(Span, String)>)> {
        match self {
            BundleError::Parse { path, text, errors } => Some((
                path,
                text.as_str(),
                errors.iter().map(|e| (e.span, e.message.clone())).collect(),
            )),
            BundleError::UnsupportedImport { path, span, reason, text } => {
                Some((path, text.as_str(), vec![(*span, reason.clone())]))
            }
            _ => None,
        }
    }
}

fn from_clause(importer: &Option<PathBuf>) -> String {
    match importer {
        Some(path) => format!(" from {}", path.display()),
        None => String::new(),
    }
}

fn list_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn list_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_message() {
        let err = BundleError::Resolution {
            specifier: "./missing".to_string(),
            importer: Some(PathBuf::from("/p/src/index.js")),
            tried: vec![PathBuf::from("/p/src/missing"), PathBuf::from("/p/src/missing.js")],
        };
        assert_eq!(
            err.to_string(),
            "cannot resolve './missing' from /p/src/index.js: tried /p/src/missing, /p/src/missing.js"
        );
    }

    #[test]
    fn test_parse_message_lists_every_error() {
        let err = BundleError::Parse {
            path: PathBuf::from("/p/a.js"),
            text: "(]".to_string(),
            errors: vec![
                ParseError::new("Mismatched ']'", Span::new(1, 2)),
                ParseError::new("Unclosed '('", Span::new(0, 1)),
            ],
        };
        let message = err.to_string();
        assert!(message.starts_with("failed to parse /p/a.js: "));
        assert!(message.contains("Mismatched ']' at 1..2; Unclosed '(' at 0..1"));
        assert_eq!(err.source_spans().unwrap().2.len(), 2);
    }
}
