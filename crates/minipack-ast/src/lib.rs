//! # minipack AST
//!
//! Lossless syntax tree for the JavaScript sources minipack bundles.
//!
//! The tree is deliberately shallow: tokens, bracket groups, and call
//! expressions whose callee is a plain identifier. Every token keeps the
//! whitespace and comments that precede it, so printing an untouched tree
//! reproduces the input byte-for-byte and printing a rewritten tree only
//! changes the rewritten literals.

// =============================================================================
// Core Types (kept in lib.rs - used by all modules)
// =============================================================================

/// Byte range into a module's (post-loader) source text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

// =============================================================================
// Module Declarations
// =============================================================================

pub mod token;
pub mod tree;
pub mod visit;
pub mod print;

// =============================================================================
// Re-exports
// =============================================================================

pub use token::{Token, TokenKind};
pub use tree::*;
pub use print::quote_string;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let a = Span::new(4, 10);
        let b = Span::new(2, 6);
        assert_eq!(a.merge(&b), Span::new(2, 10));
        assert_eq!(a.merge(&b).len(), 8);
        assert!(Span::new(3, 3).is_empty());
    }
}
