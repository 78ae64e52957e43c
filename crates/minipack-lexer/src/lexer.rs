use minipack_ast::Span;
use crate::token::{Token, TokenKind};

/// Multi-character punctuators, longest first so the first hit is the
/// longest match.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=",
    "=>", "==", "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=",
    "*=", "/=", "%=", "&=", "|=", "^=", "**", "<<", ">>",
    "+", "-", "*", "/", "%", "=", "<", ">", "!", "&", "|", "^", "~", "?", ":", "@",
];

/// The lexer for JavaScript module sources.
///
/// Every token carries the whitespace and comments in front of it, and the
/// end-of-file token carries whatever trails the last real token.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::str::CharIndices<'a>,
    current_pos: usize,
    current_char: Option<char>,
    last_kind: Option<TokenKind>,
    /// Open `{` and `${`, innermost last; `true` marks a substitution.
    braces: Vec<bool>,
    /// Open `(`, innermost last; `true` when it follows `if`, `while`,
    /// `for` or `with`.
    parens: Vec<bool>,
    /// Whether the last `)` closed a statement head.
    closed_statement_head: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer from source code.
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.char_indices();
        let current_char = chars.next().map(|(_, c)| c);
        Self {
            source,
            chars,
            current_pos: 0,
            current_char,
            last_kind: None,
            braces: Vec::new(),
            parens: Vec::new(),
            closed_statement_head: false,
        }
    }

    /// Tokenizes the entire source. The last token is always `Eof`.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Gets the next token from the source.
    pub fn next_token(&mut self) -> Token {
        let trivia_start = self.current_pos;
        if let Err(token) = self.skip_trivia() {
            return token;
        }
        let trivia = self.source[trivia_start..self.current_pos].to_string();
        let start = self.current_pos;

        let (kind, value) = match self.current_char {
            None => (TokenKind::Eof, String::new()),
            Some(ch) => match ch {
                '"' | '\'' => self.read_string_literal(ch),
                '`' => self.read_template_part(TokenKind::TemplateLiteral, TokenKind::TemplateHead),
                '}' if self.braces.last() == Some(&true) => {
                    self.braces.pop();
                    self.read_template_part(TokenKind::TemplateTail, TokenKind::TemplateMiddle)
                }
                '0'..='9' => self.read_number(),
                '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number(),
                '#' => self.read_private_name(),
                '/' if self.regex_allowed() => self.read_regex(),
                '(' | ')' | '{' | '}' | '[' | ']' | ',' | ';' => {
                    self.advance();
                    self.track_delimiter(ch);
                    let kind = match ch {
                        '(' => TokenKind::LParen,
                        ')' => TokenKind::RParen,
                        '{' => TokenKind::LBrace,
                        '}' => TokenKind::RBrace,
                        '[' => TokenKind::LBracket,
                        ']' => TokenKind::RBracket,
                        ',' => TokenKind::Comma,
                        _ => TokenKind::Semicolon,
                    };
                    (kind, ch.to_string())
                }
                _ if is_identifier_start(ch) => self.read_identifier_or_keyword(),
                _ => self.read_punctuator(ch),
            },
        };

        let text = self.source[start..self.current_pos].to_string();
        let value = match kind {
            TokenKind::StringLiteral | TokenKind::Error => value,
            _ => text.clone(),
        };
        if kind != TokenKind::Eof {
            self.last_kind = Some(kind);
        }
        Token::new(kind, Span::new(start, self.current_pos), text, value, trivia)
    }

    // Helper methods

    fn advance(&mut self) {
        if let Some((pos, ch)) = self.chars.next() {
            self.current_pos = pos;
            self.current_char = Some(ch);
        } else {
            self.current_pos = self.source.len();
            self.current_char = None;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next().map(|(_, c)| c)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.current_pos..]
    }

    fn regex_allowed(&self) -> bool {
        match self.last_kind {
            Some(TokenKind::RParen) => self.closed_statement_head,
            Some(kind) => kind.allows_regex_after(),
            None => true,
        }
    }

    fn track_delimiter(&mut self, ch: char) {
        match ch {
            '(' => {
                let head = self.last_kind.is_some_and(|kind| kind.is_statement_head());
                self.parens.push(head);
            }
            ')' => self.closed_statement_head = self.parens.pop().unwrap_or(false),
            '{' => self.braces.push(false),
            '}' => {
                self.braces.pop();
            }
            _ => {}
        }
    }

    fn error(&self, start: usize, message: &str) -> Token {
        Token::new(
            TokenKind::Error,
            Span::new(start, self.current_pos),
            self.source[start..self.current_pos].to_string(),
            message.to_string(),
            String::new(),
        )
    }

    /// Skips whitespace, comments, a leading byte order mark, and a hashbang
    /// line. An unterminated block comment becomes an error token.
    fn skip_trivia(&mut self) -> Result<(), Token> {
        if self.current_pos == 0 {
            if self.current_char == Some('\u{feff}') {
                self.advance();
            }
            if self.rest().starts_with("#!") {
                self.skip_line();
            }
        }
        loop {
            match self.current_char {
                Some(ch) if ch.is_whitespace() => self.advance(),
                Some('/') if self.peek() == Some('/') => self.skip_line(),
                Some('/') if self.peek() == Some('*') => {
                    let start = self.current_pos;
                    if !self.skip_block_comment() {
                        return Err(self.error(start, "Unterminated multi-line comment"));
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(ch) = self.current_char {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> bool {
        // Skip /*
        self.advance();
        self.advance();

        while let Some(ch) = self.current_char {
            if ch == '*' && self.peek() == Some('/') {
                self.advance();
                self.advance();
                return true;
            }
            self.advance();
        }
        false
    }

    fn read_string_literal(&mut self, quote: char) -> (TokenKind, String) {
        self.advance(); // opening quote

        let mut value = String::new();
        while let Some(ch) = self.current_char {
            if ch == quote {
                self.advance();
                return (TokenKind::StringLiteral, value);
            } else if ch == '\\' {
                self.advance();
                self.read_escape(&mut value);
            } else if ch == '\n' {
                break;
            } else {
                value.push(ch);
                self.advance();
            }
        }

        (TokenKind::Error, "Unterminated string literal".to_string())
    }

    /// Decodes one escape sequence; the backslash is already consumed.
    fn read_escape(&mut self, value: &mut String) {
        let Some(escaped) = self.current_char else {
            return;
        };
        self.advance();
        match escaped {
            'n' => value.push('\n'),
            'r' => value.push('\r'),
            't' => value.push('\t'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '0' if !self.current_char.is_some_and(|c| c.is_ascii_digit()) => value.push('\0'),
            'x' => value.push(self.read_hex_digits(2)),
            'u' if self.current_char == Some('{') => {
                self.advance();
                let mut code = 0u32;
                while let Some(digit) = self.current_char.and_then(|c| c.to_digit(16)) {
                    code = code.saturating_mul(16).saturating_add(digit);
                    self.advance();
                }
                if self.current_char == Some('}') {
                    self.advance();
                }
                value.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            'u' => value.push(self.read_hex_digits(4)),
            // line continuation
            '\n' => {}
            '\r' => {
                if self.current_char == Some('\n') {
                    self.advance();
                }
            }
            other => value.push(other),
        }
    }

    fn read_hex_digits(&mut self, count: usize) -> char {
        let mut code = 0u32;
        for _ in 0..count {
            match self.current_char.and_then(|c| c.to_digit(16)) {
                Some(digit) => {
                    code = code * 16 + digit;
                    self.advance();
                }
                None => break,
            }
        }
        char::from_u32(code).unwrap_or('\u{FFFD}')
    }

    /// Reads template text from the opening backtick, or from the `}` that
    /// ends a substitution, up to the closing backtick (`closed`) or the
    /// next `${` (`substitution`). The tokens of a substitution are lexed
    /// normally until its closing `}`.
    fn read_template_part(&mut self, closed: TokenKind, substitution: TokenKind) -> (TokenKind, String) {
        self.advance(); // ` or }
        while let Some(ch) = self.current_char {
            match ch {
                '`' => {
                    self.advance();
                    return (closed, String::new());
                }
                '\\' => {
                    self.advance();
                    self.advance();
                }
                '$' if self.peek() == Some('{') => {
                    self.advance();
                    self.advance();
                    self.braces.push(true);
                    return (substitution, String::new());
                }
                _ => self.advance(),
            }
        }
        (TokenKind::Error, "Unterminated template literal".to_string())
    }

    fn read_regex(&mut self) -> (TokenKind, String) {
        self.advance(); // opening slash
        let mut in_class = false;
        loop {
            match self.current_char {
                None | Some('\n') => {
                    return (TokenKind::Error, "Unterminated regular expression".to_string());
                }
                Some('\\') => {
                    self.advance();
                    if self.current_char.is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                Some('[') => {
                    in_class = true;
                    self.advance();
                }
                Some(']') => {
                    in_class = false;
                    self.advance();
                }
                Some('/') if !in_class => {
                    self.advance();
                    break;
                }
                Some(_) => self.advance(),
            }
        }
        // flags
        while self.current_char.is_some_and(is_identifier_part) {
            self.advance();
        }
        (TokenKind::RegexLiteral, String::new())
    }

    fn read_number(&mut self) -> (TokenKind, String) {
        if self.current_char == Some('0') && matches!(self.peek(), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B')) {
            self.advance();
            self.advance();
            while self.current_char.is_some_and(|c| c.is_ascii_hexdigit() || c == '_') {
                self.advance();
            }
        } else {
            self.read_digits();
            if self.current_char == Some('.') {
                self.advance();
                self.read_digits();
            }
            if matches!(self.current_char, Some('e' | 'E')) {
                self.advance();
                if matches!(self.current_char, Some('+' | '-')) {
                    self.advance();
                }
                self.read_digits();
            }
        }

        if self.current_char == Some('n') {
            self.advance();
            return (TokenKind::BigIntLiteral, String::new());
        }
        (TokenKind::NumberLiteral, String::new())
    }

    fn read_digits(&mut self) {
        while self.current_char.is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.advance();
        }
    }

    fn read_private_name(&mut self) -> (TokenKind, String) {
        self.advance(); // #
        if !self.current_char.is_some_and(is_identifier_start) {
            return (TokenKind::Error, "Unexpected character: #".to_string());
        }
        while self.current_char.is_some_and(is_identifier_part) {
            self.advance();
        }
        (TokenKind::PrivateName, String::new())
    }

    fn read_identifier_or_keyword(&mut self) -> (TokenKind, String) {
        let start = self.current_pos;
        while self.current_char.is_some_and(is_identifier_part) {
            self.advance();
        }
        let word = &self.source[start..self.current_pos];

        // A keyword after `.` or `?.` is a property name.
        let after_member_access = matches!(self.last_kind, Some(TokenKind::Dot | TokenKind::QuestionDot));
        let kind = match TokenKind::keyword(word) {
            Some(kind) if !after_member_access => kind,
            _ => TokenKind::Identifier,
        };
        (kind, String::new())
    }

    fn read_punctuator(&mut self, ch: char) -> (TokenKind, String) {
        let rest = self.rest();
        let matched = PUNCTUATORS.iter().copied().find(|p| {
            rest.starts_with(p)
                // `a ?.5 : b` is a conditional, not optional chaining
                && !(*p == "?." && rest[2..].starts_with(|c: char| c.is_ascii_digit()))
        });

        let Some(punct) = matched.or(if ch == '.' { Some(".") } else { None }) else {
            self.advance();
            return (TokenKind::Error, format!("Unexpected character: {}", ch));
        };

        for _ in punct.chars() {
            self.advance();
        }
        let kind = match punct {
            "." => TokenKind::Dot,
            "?." => TokenKind::QuestionDot,
            "=>" => TokenKind::Arrow,
            "++" => TokenKind::PlusPlus,
            "--" => TokenKind::MinusMinus,
            _ => TokenKind::Operator,
        };
        (kind, String::new())
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '\u{200c}' || ch == '\u{200d}'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords() {
        let source = "const var function return if else typeof";
        let tokens = Lexer::new(source).tokenize();

        assert_eq!(tokens[0].kind, TokenKind::Const);
        assert_eq!(tokens[1].kind, TokenKind::Var);
        assert_eq!(tokens[2].kind, TokenKind::Function);
        assert_eq!(tokens[3].kind, TokenKind::Return);
        assert_eq!(tokens[4].kind, TokenKind::If);
        assert_eq!(tokens[5].kind, TokenKind::Else);
        assert_eq!(tokens[6].kind, TokenKind::Typeof);
        assert_eq!(tokens[7].kind, TokenKind::Eof);
    }

    #[test]
    fn test_keyword_as_property() {
        let tokens = Lexer::new("obj.default a?.new").tokenize();
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
        assert_eq!(tokens[2].value, "default");
        assert_eq!(tokens[5].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::new("123 45.67 0x1A 1_000 .5 1e-3 42n").tokenize();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["123", "45.67", "0x1A", "1_000", ".5", "1e-3", "42n", ""]);
        assert_eq!(tokens[0].kind, TokenKind::NumberLiteral);
        assert_eq!(tokens[4].kind, TokenKind::NumberLiteral);
        assert_eq!(tokens[6].kind, TokenKind::BigIntLiteral);
    }

    #[test]
    fn test_strings() {
        let source = r#""hello" 'wo\'rld' "a\nb" "A\x42\u{43}""#;
        let tokens = Lexer::new(source).tokenize();

        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].value, "hello");
        assert_eq!(tokens[0].text, "\"hello\"");
        assert_eq!(tokens[1].value, "wo'rld");
        assert_eq!(tokens[1].text, r"'wo\'rld'");
        assert_eq!(tokens[2].value, "a\nb");
        assert_eq!(tokens[3].value, "ABC");
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = Lexer::new("'abc\nx").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].value, "Unterminated string literal");
        assert_eq!(tokens[0].span, Span::new(0, 4));
    }

    #[test]
    fn test_template_without_substitution() {
        let tokens = Lexer::new("`a \\` $ {b}` + 1").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::TemplateLiteral);
        assert_eq!(tokens[0].text, "`a \\` $ {b}`");
        assert_eq!(tokens[1].kind, TokenKind::Operator);
    }

    #[test]
    fn test_template_substitutions_are_tokens() {
        let tokens = Lexer::new("`a ${ {b: `c${d}`} } e ${f(1)} g` + 1").tokenize();
        let parts: Vec<(TokenKind, &str)> = tokens.iter().map(|t| (t.kind, t.text.as_str())).collect();
        assert_eq!(
            parts,
            vec![
                (TokenKind::TemplateHead, "`a ${"),
                (TokenKind::LBrace, "{"),
                (TokenKind::Identifier, "b"),
                (TokenKind::Operator, ":"),
                (TokenKind::TemplateHead, "`c${"),
                (TokenKind::Identifier, "d"),
                (TokenKind::TemplateTail, "}`"),
                (TokenKind::RBrace, "}"),
                (TokenKind::TemplateMiddle, "} e ${"),
                (TokenKind::Identifier, "f"),
                (TokenKind::LParen, "("),
                (TokenKind::NumberLiteral, "1"),
                (TokenKind::RParen, ")"),
                (TokenKind::TemplateTail, "} g`"),
                (TokenKind::Operator, "+"),
                (TokenKind::NumberLiteral, "1"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_substitution_comments_and_regexes() {
        let tokens = Lexer::new("`${ /* } */ x } and ${ /}/.test(y) }` / 2").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::TemplateHead);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].leading_trivia, " /* } */ ");
        assert_eq!(tokens[2].kind, TokenKind::TemplateMiddle);
        assert_eq!(tokens[3].kind, TokenKind::RegexLiteral);
        assert_eq!(tokens[3].text, "/}/");
        assert_eq!(tokens[9].kind, TokenKind::TemplateTail);
        assert_eq!(tokens[9].text, "}`");
        assert_eq!(tokens[10].kind, TokenKind::Operator);
    }

    #[test]
    fn test_unterminated_template() {
        let tokens = Lexer::new("`abc").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].value, "Unterminated template literal");

        let tokens = Lexer::new("`a ${x} b").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::TemplateHead);
        assert_eq!(tokens[2].kind, TokenKind::Error);
        assert_eq!(tokens[2].value, "Unterminated template literal");

        assert_eq!(kinds("`abc ${x"), vec![TokenKind::TemplateHead, TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn test_regex_after_statement_head() {
        let tokens = Lexer::new("if (s) /'/.test(s);").tokenize();
        assert_eq!(tokens[4].kind, TokenKind::RegexLiteral);
        assert_eq!(tokens[4].text, "/'/");

        let tokens = Lexer::new("while ((a)) /x/g.exec(b)").tokenize();
        assert_eq!(tokens[6].kind, TokenKind::RegexLiteral);

        let tokens = Lexer::new("if (f(a) / 2) {}").tokenize();
        assert_eq!(tokens[6].kind, TokenKind::Operator);
        assert_eq!(tokens[6].text, "/");

        let tokens = Lexer::new("(a) / b / c").tokenize();
        assert_eq!(tokens[3].kind, TokenKind::Operator);
        assert_eq!(tokens[5].kind, TokenKind::Operator);
    }

    #[test]
    fn test_regex_versus_division() {
        assert_eq!(
            kinds("x = a / b / c"),
            vec![
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
        let tokens = Lexer::new("x = /re(q)uire\\/[/]/gi.test(y)").tokenize();
        assert_eq!(tokens[2].kind, TokenKind::RegexLiteral);
        assert_eq!(tokens[2].text, "/re(q)uire\\/[/]/gi");
        assert_eq!(tokens[3].kind, TokenKind::Dot);
    }

    #[test]
    fn test_operators() {
        let tokens = Lexer::new("=> ++ -- ?. ... >>>= ?? a?.5:1").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Arrow);
        assert_eq!(tokens[1].kind, TokenKind::PlusPlus);
        assert_eq!(tokens[2].kind, TokenKind::MinusMinus);
        assert_eq!(tokens[3].kind, TokenKind::QuestionDot);
        assert_eq!(tokens[4].text, "...");
        assert_eq!(tokens[5].text, ">>>=");
        assert_eq!(tokens[6].text, "??");
        assert_eq!(tokens[8].text, "?");
        assert_eq!(tokens[9].text, ".5");
    }

    #[test]
    fn test_comments_become_trivia() {
        let source = "// head\nconst x = 1; /* tail */\n";
        let tokens = Lexer::new(source).tokenize();

        assert_eq!(tokens[0].kind, TokenKind::Const);
        assert_eq!(tokens[0].leading_trivia, "// head\n");
        assert_eq!(tokens[1].leading_trivia, " ");
        let eof = tokens.last().unwrap();
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!(eof.leading_trivia, " /* tail */\n");
    }

    #[test]
    fn test_unterminated_block_comment() {
        let tokens = Lexer::new("x /* open").tokenize();
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].value, "Unterminated multi-line comment");
    }

    #[test]
    fn test_hashbang_and_bom() {
        let source = "\u{feff}#!/usr/bin/env node\nrequire('x')";
        let tokens = Lexer::new(source).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].leading_trivia, "\u{feff}#!/usr/bin/env node\n");
    }

    #[test]
    fn test_lossless() {
        let source = "#!/bin/node\n// c\nconst a = require( \"./a\" ) ; `t${1}` /x/g\n  ";
        let printed: String = Lexer::new(source)
            .tokenize()
            .iter()
            .map(|t| format!("{}{}", t.leading_trivia, t.text))
            .collect();
        assert_eq!(printed, source);
    }

    #[test]
    fn test_identifiers() {
        let tokens = Lexer::new("foo bar_123 _private $jquery #secret").tokenize();

        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].value, "foo");
        assert_eq!(tokens[1].value, "bar_123");
        assert_eq!(tokens[2].value, "_private");
        assert_eq!(tokens[3].value, "$jquery");
        assert_eq!(tokens[4].kind, TokenKind::PrivateName);
    }
}
