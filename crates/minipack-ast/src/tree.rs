use crate::{Span, Token, TokenKind};

/// A parsed module: a flat sequence of elements followed by end of input.
///
/// The end-of-file token is kept so trailing whitespace and comments
/// survive printing.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub elements: Vec<Element>,
    pub eof: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Token(Token),
    Group(Group),
    Call(CallExpr),
}

impl Element {
    pub fn span(&self) -> Span {
        match self {
            Element::Token(token) => token.span,
            Element::Group(group) => group.span(),
            Element::Call(call) => call.span(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Paren,
    Bracket,
    Brace,
    /// A template literal with substitutions, from its head to its tail.
    /// Middle parts appear among the elements as plain tokens.
    Template,
}

impl Delimiter {
    pub fn close_kind(&self) -> TokenKind {
        match self {
            Delimiter::Paren => TokenKind::RParen,
            Delimiter::Bracket => TokenKind::RBracket,
            Delimiter::Brace => TokenKind::RBrace,
            Delimiter::Template => TokenKind::TemplateTail,
        }
    }
}

/// A balanced bracket group that is not a call's argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub delimiter: Delimiter,
    pub open: Token,
    pub elements: Vec<Element>,
    pub close: Token,
}

impl Group {
    pub fn span(&self) -> Span {
        self.open.span.merge(&self.close.span)
    }
}

/// `callee(arg, ...)` where the callee is a bare identifier.
///
/// `separators` holds the top-level commas; a trailing comma leaves it the
/// same length as `arguments`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Token,
    pub open: Token,
    pub arguments: Vec<Argument>,
    pub separators: Vec<Token>,
    pub close: Token,
}

impl CallExpr {
    pub fn name(&self) -> &str {
        &self.callee.value
    }

    pub fn span(&self) -> Span {
        self.callee.span.merge(&self.close.span)
    }

    /// The argument at `index` if it is a single string literal and nothing else.
    pub fn literal_argument(&self, index: usize) -> Option<&Token> {
        match self.arguments.get(index)?.elements.as_slice() {
            [Element::Token(token)] if token.kind == TokenKind::StringLiteral => Some(token),
            _ => None,
        }
    }

    /// Replaces the string literal at `index` with a double-quoted literal
    /// holding `value`. Leading trivia and the span are kept.
    ///
    /// Returns `false` when that argument is not a plain string literal.
    pub fn rewrite_argument(&mut self, index: usize, value: &str) -> bool {
        let Some(argument) = self.arguments.get_mut(index) else {
            return false;
        };
        match argument.elements.as_mut_slice() {
            [Element::Token(token)] if token.kind == TokenKind::StringLiteral => {
                token.text = crate::quote_string(value);
                token.value = value.to_string();
                true
            }
            _ => false,
        }
    }
}

/// One comma-separated argument; empty for `f()`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Argument {
    pub elements: Vec<Element>,
}

impl Argument {
    pub fn span(&self) -> Option<Span> {
        let first = self.elements.first()?.span();
        let last = self.elements.last()?.span();
        Some(first.merge(&last))
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind, start: usize, text: &str) -> Token {
        let value = text.trim_matches('"').to_string();
        Token::new(kind, Span::new(start, start + text.len()), text.to_string(), value, String::new())
    }

    fn require_call(arguments: Vec<Argument>) -> CallExpr {
        CallExpr {
            callee: tok(TokenKind::Identifier, 0, "require"),
            open: tok(TokenKind::LParen, 7, "("),
            arguments,
            separators: Vec::new(),
            close: tok(TokenKind::RParen, 12, ")"),
        }
    }

    #[test]
    fn test_literal_argument() {
        let call = require_call(vec![Argument {
            elements: vec![Element::Token(tok(TokenKind::StringLiteral, 8, "\"a\""))],
        }]);
        assert_eq!(call.name(), "require");
        assert_eq!(call.literal_argument(0).map(|t| t.value.as_str()), Some("a"));
        assert!(call.literal_argument(1).is_none());
        assert_eq!(call.span(), Span::new(0, 13));
    }

    #[test]
    fn test_literal_argument_rejects_expressions() {
        let call = require_call(vec![Argument {
            elements: vec![
                Element::Token(tok(TokenKind::StringLiteral, 8, "\"a\"")),
                Element::Token(tok(TokenKind::Operator, 11, "+")),
            ],
        }]);
        assert!(call.literal_argument(0).is_none());
    }

    #[test]
    fn test_rewrite_argument() {
        let mut call = require_call(vec![Argument {
            elements: vec![Element::Token(tok(TokenKind::StringLiteral, 8, "'a'"))],
        }]);
        assert!(call.rewrite_argument(0, "./src/a.js"));
        let token = call.literal_argument(0).unwrap();
        assert_eq!(token.text, "\"./src/a.js\"");
        assert_eq!(token.value, "./src/a.js");
        assert_eq!(token.span, Span::new(8, 11));
        assert!(!call.rewrite_argument(3, "x"));
    }
}
