//! Core Parser struct and bracket matching

use super::*;

/// Bracket-matching parser over a complete token stream.
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) current: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    /// Creates a new parser from a token stream ending in `Eof`.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    /// Parses a complete program
    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let elements = self.parse_elements(None);
        let eof = self.eof_token();

        if self.errors.is_empty() {
            Ok(Program { elements, eof })
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }

    /// Parses elements until end of input or, inside a group, until the
    /// closer matching `open`. The closer itself is left for the caller.
    fn parse_elements(&mut self, open: Option<&Token>) -> Vec<Element> {
        let mut elements = Vec::new();

        loop {
            let kind = self.current_token().kind;
            match kind {
                TokenKind::Eof => {
                    if let Some(open) = open {
                        self.errors.push(ParseError::new(format!("Unclosed '{}'", open.text), open.span));
                    }
                    return elements;
                }
                _ if kind.is_close_delimiter() => {
                    if open.is_some_and(|open| open.kind.closing() == Some(kind)) {
                        return elements;
                    }
                    let stray = self.advance();
                    let message = match open {
                        Some(open) => format!("Mismatched '{}': expected closer for '{}'", stray.text, open.text),
                        None => format!("Unexpected '{}'", stray.text),
                    };
                    self.errors.push(ParseError::new(message, stray.span));
                    elements.push(Element::Token(stray));
                }
                TokenKind::LParen => {
                    let callee = take_callee(&mut elements);
                    let group = self.parse_group(Delimiter::Paren);
                    match callee {
                        // `name(params) { ... }` defines a method
                        Some(callee) if self.at_method_body() => {
                            elements.push(Element::Token(callee));
                            elements.push(Element::Group(group));
                        }
                        Some(callee) => elements.push(Element::Call(into_call(callee, group))),
                        None => elements.push(Element::Group(group)),
                    }
                }
                TokenKind::LBracket => elements.push(Element::Group(self.parse_group(Delimiter::Bracket))),
                TokenKind::LBrace => elements.push(Element::Group(self.parse_group(Delimiter::Brace))),
                TokenKind::TemplateHead => elements.push(Element::Group(self.parse_group(Delimiter::Template))),
                TokenKind::TemplateMiddle if !open.is_some_and(|open| open.kind == TokenKind::TemplateHead) => {
                    let stray = self.advance();
                    self.errors.push(ParseError::new(format!("Unexpected '{}'", stray.text), stray.span));
                    elements.push(Element::Token(stray));
                }
                TokenKind::Error => {
                    let token = self.advance();
                    self.errors.push(ParseError::new(token.value.clone(), token.span));
                    elements.push(Element::Token(token));
                }
                _ => {
                    let token = self.advance();
                    elements.push(Element::Token(token));
                }
            }
        }
    }

    /// A `{` on the same line as the preceding `)`. After a line break the
    /// call ends its statement and the braces are a block.
    fn at_method_body(&self) -> bool {
        let token = self.current_token();
        token.kind == TokenKind::LBrace && !token.leading_trivia.contains('\n')
    }

    fn parse_group(&mut self, delimiter: Delimiter) -> Group {
        let open = self.advance();
        let elements = self.parse_elements(Some(&open));
        let close = if self.check(delimiter.close_kind()) {
            self.advance()
        } else {
            // Unclosed at end of input; already reported.
            let at = self.current_token().span.start;
            Token::new(delimiter.close_kind(), Span::new(at, at), String::new(), String::new(), String::new())
        };
        Group {
            delimiter,
            open,
            elements,
            close,
        }
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    pub(crate) fn current_token(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current_token().kind == kind
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len() || self.current_token().kind == TokenKind::Eof
    }

    fn eof_token(&self) -> Token {
        match self.tokens.last() {
            Some(token) if token.kind == TokenKind::Eof => token.clone(),
            _ => {
                let end = self.tokens.last().map_or(0, |t| t.span.end);
                Token::new(TokenKind::Eof, Span::new(end, end), String::new(), String::new(), String::new())
            }
        }
    }
}

/// Whether the last element is an identifier that `(` would call: not a
/// property after `.`/`?.` and not the name in a `function` declaration.
fn is_callee(elements: &[Element]) -> bool {
    let [.., before, Element::Token(last)] = elements else {
        return matches!(elements, [Element::Token(last)] if last.kind == TokenKind::Identifier);
    };
    if last.kind != TokenKind::Identifier {
        return false;
    }
    !matches!(
        before,
        Element::Token(t) if matches!(t.kind, TokenKind::Dot | TokenKind::QuestionDot | TokenKind::Function)
    )
}

fn take_callee(elements: &mut Vec<Element>) -> Option<Token> {
    if !is_callee(elements) {
        return None;
    }
    match elements.pop() {
        Some(Element::Token(token)) => Some(token),
        other => {
            elements.extend(other);
            None
        }
    }
}

/// Splits a parenthesised group into call arguments on its top-level commas.
fn into_call(callee: Token, group: Group) -> CallExpr {
    let mut arguments = Vec::new();
    let mut separators = Vec::new();
    let mut current = Argument::default();

    for element in group.elements {
        match element {
            Element::Token(token) if token.kind == TokenKind::Comma => {
                arguments.push(std::mem::take(&mut current));
                separators.push(token);
            }
            other => current.elements.push(other),
        }
    }
    if !current.is_empty() {
        arguments.push(current);
    }

    CallExpr {
        callee,
        open: group.open,
        arguments,
        separators,
        close: group.close,
    }
}
