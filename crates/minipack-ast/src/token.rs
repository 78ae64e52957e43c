use crate::Span;

/// Token kinds for the JavaScript subset minipack needs to see.
///
/// Punctuators that never influence tree shape are folded into
/// [`TokenKind::Operator`]; the raw text is still available on the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    Await,
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Export,
    Extends,
    False,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    New,
    Null,
    Return,
    Super,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
    Yield,

    // Literals
    NumberLiteral,
    BigIntLiteral,
    StringLiteral,
    TemplateLiteral,   // `text` with no substitutions
    TemplateHead,      // `text${
    TemplateMiddle,    // }text${
    TemplateTail,      // }text`
    RegexLiteral,

    // Names
    Identifier,
    PrivateName,       // #field

    // Delimiters
    LParen,            // (
    RParen,            // )
    LBrace,            // {
    RBrace,            // }
    LBracket,          // [
    RBracket,          // ]
    Comma,             // ,
    Semicolon,         // ;
    Dot,               // .
    QuestionDot,       // ?.

    // Operators
    Arrow,             // =>
    PlusPlus,          // ++
    MinusMinus,        // --
    Operator,

    // Special
    Eof,
    Error,
}

impl TokenKind {
    /// Looks up a reserved word.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "await" => TokenKind::Await,
            "break" => TokenKind::Break,
            "case" => TokenKind::Case,
            "catch" => TokenKind::Catch,
            "class" => TokenKind::Class,
            "const" => TokenKind::Const,
            "continue" => TokenKind::Continue,
            "debugger" => TokenKind::Debugger,
            "default" => TokenKind::Default,
            "delete" => TokenKind::Delete,
            "do" => TokenKind::Do,
            "else" => TokenKind::Else,
            "export" => TokenKind::Export,
            "extends" => TokenKind::Extends,
            "false" => TokenKind::False,
            "finally" => TokenKind::Finally,
            "for" => TokenKind::For,
            "function" => TokenKind::Function,
            "if" => TokenKind::If,
            "import" => TokenKind::Import,
            "in" => TokenKind::In,
            "instanceof" => TokenKind::Instanceof,
            "new" => TokenKind::New,
            "null" => TokenKind::Null,
            "return" => TokenKind::Return,
            "super" => TokenKind::Super,
            "switch" => TokenKind::Switch,
            "this" => TokenKind::This,
            "throw" => TokenKind::Throw,
            "true" => TokenKind::True,
            "try" => TokenKind::Try,
            "typeof" => TokenKind::Typeof,
            "var" => TokenKind::Var,
            "void" => TokenKind::Void,
            "while" => TokenKind::While,
            "with" => TokenKind::With,
            "yield" => TokenKind::Yield,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether a `/` following a token of this kind starts a regular
    /// expression literal rather than a division.
    pub fn allows_regex_after(&self) -> bool {
        !matches!(
            self,
            TokenKind::Identifier
                | TokenKind::PrivateName
                | TokenKind::NumberLiteral
                | TokenKind::BigIntLiteral
                | TokenKind::StringLiteral
                | TokenKind::TemplateLiteral
                | TokenKind::TemplateTail
                | TokenKind::RegexLiteral
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::This
                | TokenKind::Super
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }

    /// Whether a `(` after this keyword opens a statement head, so a `/`
    /// after the matching `)` starts a regular expression.
    pub fn is_statement_head(&self) -> bool {
        matches!(self, TokenKind::If | TokenKind::While | TokenKind::For | TokenKind::With)
    }

    pub fn is_open_delimiter(&self) -> bool {
        matches!(
            self,
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace | TokenKind::TemplateHead
        )
    }

    pub fn is_close_delimiter(&self) -> bool {
        matches!(
            self,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace | TokenKind::TemplateTail
        )
    }

    /// The closing delimiter matching an opening one.
    pub fn closing(&self) -> Option<TokenKind> {
        match self {
            TokenKind::LParen => Some(TokenKind::RParen),
            TokenKind::LBracket => Some(TokenKind::RBracket),
            TokenKind::LBrace => Some(TokenKind::RBrace),
            TokenKind::TemplateHead => Some(TokenKind::TemplateTail),
            _ => None,
        }
    }
}

/// A token together with the trivia (whitespace, comments) preceding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Exact source text of the token.
    pub text: String,
    /// Decoded value: string contents for string literals, the message for
    /// error tokens, otherwise the same as `text`.
    pub value: String,
    /// Whitespace and comments between the previous token and this one.
    pub leading_trivia: String,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, text: String, value: String, leading_trivia: String) -> Self {
        Self {
            kind,
            span,
            text,
            value,
            leading_trivia,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}
