//! # minipack parser
//!
//! Builds the lossless token tree from lexer output: brackets are matched
//! into groups, and `identifier(...)` becomes a [`CallExpr`] unless the
//! identifier is a property name, a declared function name, or a method
//! being defined.

use minipack_ast::*;
use minipack_lexer::{Lexer, Token, TokenKind};

mod error;
mod parser;

pub use error::{ParseError, ParseResult};
pub use parser::Parser;

/// Tokenizes and parses a module source.
///
/// Every lexical and bracket error is collected; the tree is only returned
/// when there are none.
pub fn parse(source: &str) -> ParseResult<Program> {
    let tokens = Lexer::new(source).tokenize();
    Parser::new(tokens).parse_program()
}

// =============================================================================
// Tests
// =============================================================================
