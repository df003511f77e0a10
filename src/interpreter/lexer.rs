use logos::Logos;

use crate::error::LexError;

/// Represents a lexical token in the source input.
///
/// A token is a minimal but meaningful unit of text produced by the lexer.
/// This enum defines all recognized tokens in the language. Newlines, spaces,
/// and comments are consumed silently; the current line number is tracked in
/// [`LexerExtras`] so every emitted token can be paired with its line.
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(extras = LexerExtras)]
pub enum Token {
    /// Numeric literal tokens, such as `42` or `3.14`.
    #[regex(r"[0-9]+(\.[0-9]+)?", parse_number)]
    Number(f64),
    /// Double-quoted string literal tokens. No escape sequences; the value
    /// is stored without the surrounding quotes.
    #[regex(r#""[^"\n]*""#, strip_quotes)]
    Str(String),
    /// Boolean literal tokens, `true` or `false`.
    #[token("true", parse_bool)]
    #[token("false", parse_bool)]
    Bool(bool),
    /// `func`
    #[token("func")]
    Func,
    /// `if`
    #[token("if")]
    If,
    /// `else`
    #[token("else")]
    Else,
    /// `while`
    #[token("while")]
    While,
    /// `break`
    #[token("break")]
    Break,
    /// `continue`
    #[token("continue")]
    Continue,
    /// `return`
    #[token("return")]
    Return,
    /// `par`
    #[token("par")]
    Par,
    /// `seq`
    #[token("seq")]
    Seq,
    /// `c_channel`
    #[token("c_channel")]
    CChannel,
    /// `s_channel`
    #[token("s_channel")]
    SChannel,
    /// The type keyword `number`.
    #[token("number")]
    NumberType,
    /// The type keyword `string`.
    #[token("string")]
    StringType,
    /// The type keyword `bool`.
    #[token("bool")]
    BoolType,
    /// The type keyword `void`.
    #[token("void")]
    VoidType,
    /// Identifier tokens; variable or function names such as `x` or `count`.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),
    /// `==`
    #[token("==")]
    EqualEqual,
    /// `!=`
    #[token("!=")]
    BangEqual,
    /// `<=`
    #[token("<=")]
    LessEqual,
    /// `>=`
    #[token(">=")]
    GreaterEqual,
    /// `&&`
    #[token("&&")]
    AndAnd,
    /// `||`
    #[token("||")]
    OrOr,
    /// `->`
    #[token("->")]
    Arrow,
    /// `<`
    #[token("<")]
    Less,
    /// `>`
    #[token(">")]
    Greater,
    /// `=`
    #[token("=")]
    Equals,
    /// `!`
    #[token("!")]
    Bang,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `,`
    #[token(",")]
    Comma,
    /// `:`
    #[token(":")]
    Colon,
    /// `;`
    #[token(";")]
    Semicolon,

    /// `# Line comments.`
    #[regex(r"#[^\n]*", logos::skip)]
    Comment,
    /// ```text
    /// /* Block comments (non-nesting). */
    /// ```
    #[regex(r"/\*[^*]*\*+([^/*][^*]*\*+)*/", |lex| {
        let comment      = lex.slice();
        let newlines     = comment.chars().filter(|&c| c == '\n').count();
        lex.extras.line += newlines;
        logos::Skip
    })]
    BlockComment,
    /// A `/*` whose closing `*/` never arrives. Only matches when the full
    /// block-comment pattern cannot; the scanner turns it into a
    /// [`LexError::UnterminatedComment`].
    #[token("/*")]
    UnterminatedComment,
    /// A `"` that opens no complete string literal on this line. The scanner
    /// turns it into a [`LexError::UnterminatedString`].
    #[token("\"")]
    UnterminatedString,
    /// Newlines are not tokens, but they advance the line counter.
    #[token("\n", |lex| {
        lex.extras.line += 1;
        logos::Skip
    })]
    NewLine,
    /// Spaces, tabs and feeds.
    #[regex(r"[ \t\r\f]+", logos::skip)]
    Ignored,
}

/// Additional information carried by the lexer during tokenization.
///
/// Tracks the current line number for error reporting and diagnostics.
#[derive(Default)]
pub struct LexerExtras {
    /// The current line number in the source being tokenized.
    pub line: usize,
}

impl Token {
    /// The token's tag name as used in token dumps.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Number(_) => "NUMBER",
            Self::Str(_) => "STRING",
            Self::Bool(_) => "BOOL",
            Self::Func => "FUNC",
            Self::If => "IF",
            Self::Else => "ELSE",
            Self::While => "WHILE",
            Self::Break => "BREAK",
            Self::Continue => "CONTINUE",
            Self::Return => "RETURN",
            Self::Par => "PAR",
            Self::Seq => "SEQ",
            Self::CChannel => "C_CHANNEL",
            Self::SChannel => "S_CHANNEL",
            Self::NumberType => "NUMBER_TYPE",
            Self::StringType => "STRING_TYPE",
            Self::BoolType => "BOOL_TYPE",
            Self::VoidType => "VOID_TYPE",
            Self::Identifier(_) => "ID",
            Self::EqualEqual => "EQ",
            Self::BangEqual => "NEQ",
            Self::LessEqual => "LTE",
            Self::GreaterEqual => "GTE",
            Self::AndAnd => "AND",
            Self::OrOr => "OR",
            Self::Arrow => "ARROW",
            Self::Less => "LT",
            Self::Greater => "GT",
            Self::Equals => "ASSIGN",
            Self::Bang => "NOT",
            Self::Plus => "PLUS",
            Self::Minus => "MINUS",
            Self::Star => "MULT",
            Self::Slash => "DIV",
            Self::Percent => "MOD",
            Self::LParen => "LPAREN",
            Self::RParen => "RPAREN",
            Self::LBrace => "LBRACE",
            Self::RBrace => "RBRACE",
            Self::Comma => "COMMA",
            Self::Colon => "COLON",
            Self::Semicolon => "SEMICOLON",
            Self::Comment
            | Self::BlockComment
            | Self::UnterminatedComment
            | Self::UnterminatedString
            | Self::NewLine
            | Self::Ignored => "TRIVIA",
        }
    }
}

impl std::fmt::Display for Token {
    /// Writes the token's lexeme (string literals keep their quotes).
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", crate::util::format_number(*n)),
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Func => write!(f, "func"),
            Self::If => write!(f, "if"),
            Self::Else => write!(f, "else"),
            Self::While => write!(f, "while"),
            Self::Break => write!(f, "break"),
            Self::Continue => write!(f, "continue"),
            Self::Return => write!(f, "return"),
            Self::Par => write!(f, "par"),
            Self::Seq => write!(f, "seq"),
            Self::CChannel => write!(f, "c_channel"),
            Self::SChannel => write!(f, "s_channel"),
            Self::NumberType => write!(f, "number"),
            Self::StringType => write!(f, "string"),
            Self::BoolType => write!(f, "bool"),
            Self::VoidType => write!(f, "void"),
            Self::Identifier(name) => write!(f, "{name}"),
            Self::EqualEqual => write!(f, "=="),
            Self::BangEqual => write!(f, "!="),
            Self::LessEqual => write!(f, "<="),
            Self::GreaterEqual => write!(f, ">="),
            Self::AndAnd => write!(f, "&&"),
            Self::OrOr => write!(f, "||"),
            Self::Arrow => write!(f, "->"),
            Self::Less => write!(f, "<"),
            Self::Greater => write!(f, ">"),
            Self::Equals => write!(f, "="),
            Self::Bang => write!(f, "!"),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Star => write!(f, "*"),
            Self::Slash => write!(f, "/"),
            Self::Percent => write!(f, "%"),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::LBrace => write!(f, "{{"),
            Self::RBrace => write!(f, "}}"),
            Self::Comma => write!(f, ","),
            Self::Colon => write!(f, ":"),
            Self::Semicolon => write!(f, ";"),
            Self::Comment
            | Self::BlockComment
            | Self::UnterminatedComment
            | Self::UnterminatedString
            | Self::NewLine
            | Self::Ignored => Ok(()),
        }
    }
}

/// Tokenizes a complete source text into `(token, line)` pairs.
///
/// # Errors
/// Returns a [`LexError`] for unterminated strings or block comments and for
/// characters that belong to no token.
///
/// # Example
/// ```
/// use minipar::interpreter::lexer::{Token, scan};
///
/// let tokens = scan("x = 3").unwrap();
/// assert_eq!(tokens.len(), 3);
/// assert_eq!(tokens[1], (Token::Equals, 1));
/// ```
pub fn scan(source: &str) -> Result<Vec<(Token, usize)>, LexError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer_with_extras(source, LexerExtras { line: 1 });

    while let Some(item) = lexer.next() {
        match item {
            Ok(Token::UnterminatedString) => {
                return Err(LexError::UnterminatedString { line: lexer.extras.line, });
            },
            Ok(Token::UnterminatedComment) => {
                return Err(LexError::UnterminatedComment { line: lexer.extras.line, });
            },
            Ok(token) => tokens.push((token, lexer.extras.line)),
            Err(()) => {
                return Err(LexError::UnknownCharacter { found: lexer.slice().to_string(),
                                                        line:  lexer.extras.line, });
            },
        }
    }

    Ok(tokens)
}

/// Formats a token stream in the stable dump layout used by the `-tok`
/// front-end mode: one token per line, `({lexeme, TAG}, line) | line: N`.
#[must_use]
pub fn dump_tokens(tokens: &[(Token, usize)]) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    for (token, line) in tokens {
        let _ = writeln!(out, "({{{token}, {}}}, {line}) | line: {line}", token.tag());
    }
    out
}

/// Parses a numeric literal from the current token slice.
fn parse_number(lex: &logos::Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

/// Removes the surrounding quotes from a string literal slice.
fn strip_quotes(lex: &logos::Lexer<Token>) -> String {
    let slice = lex.slice();
    slice[1..slice.len() - 1].to_string()
}

/// Parses a boolean literal from the current token slice.
fn parse_bool(lex: &logos::Lexer<Token>) -> Option<bool> {
    match lex.slice() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
