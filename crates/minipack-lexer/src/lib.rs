//! Lossless JavaScript tokenizer.

pub mod lexer;

pub use minipack_ast::token;
pub use minipack_ast::token::{Token, TokenKind};
pub use lexer::Lexer;

/// Tokenizes `source`; the last token is always `Eof`.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}
