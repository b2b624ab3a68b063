/// Classification of a [Token], derived from its literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Any word, number or quoted literal.
    Text,
    /// A single `=`, `<` or `>`.
    Operator,
    /// A single `,`.
    Comma,
    /// A single `*`.
    Asterisk,
    /// A single `(` or `)`.
    Parenthesis,
}

impl TokenKind {
    /// Returns the kind of an unquoted token from its text.
    pub fn of(text: &str) -> Self {
        match text {
            "*" => Self::Asterisk,
            "," => Self::Comma,
            "=" | "<" | ">" => Self::Operator,
            "(" | ")" => Self::Parenthesis,
            _ => Self::Text,
        }
    }
}

/// The smallest meaningful unit of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Whether the token was written as a `'...'` literal.
    pub quoted: bool,
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            kind: TokenKind::of(&text),
            text,
            quoted: false,
        }
    }

    /// A quoted literal is always [TokenKind::Text], whatever it contains.
    pub fn quoted(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Text,
            text: text.into(),
            quoted: true,
        }
    }

    /// Case-insensitive keyword check.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Text && self.text.eq_ignore_ascii_case(keyword)
    }
}

/// A lexical scanner that splits raw query bytes into [Token]s.
///
/// The scanner never fails: bytes that are not part of any token are
/// separators, and an unterminated quoted literal at the end of the input is
/// dropped.
pub struct Tokenizer<'a> {
    input: &'a [u8],
    /// Start offset of the pending (not yet flushed) token.
    start: usize,
    tokens: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            start: 0,
            tokens: Vec::new(),
        }
    }

    /// Processes the entire input and returns the tokens in order.
    ///
    /// # Example
    /// ```
    /// # use minisql::tokenizer::{Tokenizer, TokenKind};
    /// let tokens = Tokenizer::new(b"SELECT * FROM t").tokenize();
    /// assert_eq!(tokens.len(), 4);
    /// assert_eq!(tokens[1].kind, TokenKind::Asterisk);
    /// ```
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut position = 0;

        while position < self.input.len() {
            let byte = self.input[position];

            if byte == b'\'' {
                self.flush(position);
                match self.input[position + 1..].iter().position(|b| *b == b'\'') {
                    Some(len) => {
                        let end = position + 1 + len;
                        let literal = String::from_utf8_lossy(&self.input[position + 1..end]);
                        self.tokens.push(Token::quoted(literal));
                        position = end + 1;
                        self.start = position;
                        continue;
                    }
                    // unterminated literal, nothing left to scan
                    None => return self.tokens,
                }
            }

            if is_special(byte) {
                self.flush(position);
                self.tokens
                    .push(Token::new(char::from(byte).to_string()));
                self.start = position + 1;
            } else if !byte.is_ascii_alphanumeric() {
                self.flush(position);
                self.start = position + 1;
            }

            position += 1;
        }

        self.flush(self.input.len());
        self.tokens
    }

    /// Emits the pending run `start..end` as a token if it is not empty.
    fn flush(&mut self, end: usize) {
        if self.start < end {
            let text = String::from_utf8_lossy(&self.input[self.start..end]);
            self.tokens.push(Token::new(text));
        }
        self.start = end;
    }
}

/// Shortcut for `Tokenizer::new(input).tokenize()`.
pub fn tokenize(input: &[u8]) -> Vec<Token> {
    Tokenizer::new(input).tokenize()
}

/// Characters that always form a token on their own: `= < > ( ) * ,`
fn is_special(byte: u8) -> bool {
    matches!(byte, b'=' | b'<' | b'>' | b'(' | b')' | b'*' | b',')
}
