use logos::{skip, Lexer, Logos, Skip, Span};

use crate::grammar::{DOUBLE_QUOTE, SINGLE_QUOTE};

#[derive(Debug, Clone, Copy, PartialEq, Logos)]
#[logos(extras = TokenExtras)]
enum RawToken {
    #[regex(r#"[^ \t\r\n\x0b\x0c{}=;\[\],'"()/][^ \t\r\n\x0b\x0c{}=;\[\],'"()]*"#)]
    Word,
    #[regex(r#"[{}=;\[\],'"()]"#)]
    #[token("/")]
    Delimiter,
    #[regex(r"//[^\n]*", skip)]
    #[token("/*", block_comment)]
    #[token("\n", newline)]
    #[regex(r"[ \t\r\x0b\x0c]+", skip)]
    #[error]
    Error,
}

#[derive(Debug, Default)]
struct TokenExtras {
    newlines: usize,
    unterminated: Option<Unterminated>,
}

/// A string or block comment which was still open when the input ended.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Unterminated {
    String { span: Span },
    Comment { span: Span },
}

/// A slice of the source text, tagged with where it was found.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token<'a> {
    pub text: &'a str,
    pub line: usize,
    pub span: Span,
}

fn newline(lex: &mut Lexer<RawToken>) -> Skip {
    lex.extras.newlines += 1;
    Skip
}

fn block_comment(lex: &mut Lexer<RawToken>) -> Skip {
    let len = match lex.remainder().find("*/") {
        Some(end) => end + 2,
        None => {
            lex.extras.unterminated = Some(Unterminated::Comment { span: lex.span() });
            lex.remainder().len()
        }
    };

    lex.extras.newlines += count_newlines(&lex.remainder()[..len]);
    lex.bump(len);
    Skip
}

fn count_newlines(s: &str) -> usize {
    s.bytes().filter(|&ch| ch == b'\n').count()
}

/// Splits source text into tokens, with one token of lookahead.
///
/// Comments and whitespace are skipped. After a quote is returned, the following token is the
/// raw string body up to the matching quote, which is returned next.
pub(crate) struct Tokenizer<'a> {
    lexer: Lexer<'a, RawToken>,
    peeked: Option<Option<Token<'a>>>,
    string_close: Option<Token<'a>>,
    reading_string: bool,
    string_ends_with: &'static str,
    line: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Tokenizer {
            lexer: RawToken::lexer(source),
            peeked: None,
            string_close: None,
            reading_string: false,
            string_ends_with: DOUBLE_QUOTE,
            line: 1,
        }
    }

    /// Returns the next token without consuming it.
    pub fn peek(&mut self) -> Option<Token<'a>> {
        if self.peeked.is_none() {
            self.peeked = Some(self.read());
        }
        self.peeked.clone().flatten()
    }

    /// The line of the most recently returned token, or of the end of input once it is reached.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The quote expected to close the most recently opened string.
    pub fn string_ends_with(&self) -> &'static str {
        self.string_ends_with
    }

    /// If the input ended inside a string or block comment, returns where it started.
    pub fn unterminated(&self) -> Option<&Unterminated> {
        self.lexer.extras.unterminated.as_ref()
    }

    fn current_line(&self) -> usize {
        self.lexer.extras.newlines + 1
    }

    fn read(&mut self) -> Option<Token<'a>> {
        let token = if let Some(close) = self.string_close.take() {
            Some(close)
        } else if self.reading_string {
            self.reading_string = false;
            self.read_string()
        } else {
            self.read_token()
        };

        self.line = match &token {
            Some(token) => token.line,
            None => self.current_line(),
        };
        token
    }

    fn read_token(&mut self) -> Option<Token<'a>> {
        self.lexer.next()?;

        let text = self.lexer.slice();
        if text == DOUBLE_QUOTE || text == SINGLE_QUOTE {
            self.reading_string = true;
            self.string_ends_with = if text == DOUBLE_QUOTE {
                DOUBLE_QUOTE
            } else {
                SINGLE_QUOTE
            };
        }

        Some(Token {
            text,
            line: self.current_line(),
            span: self.lexer.span(),
        })
    }

    fn read_string(&mut self) -> Option<Token<'a>> {
        let remainder = self.lexer.remainder();
        let start = self.lexer.span().end;
        let quote = self.string_ends_with.as_bytes()[0];
        let line = self.current_line();

        let bytes = remainder.as_bytes();
        let mut end = 0;
        while end < bytes.len() && bytes[end] != quote {
            end += if bytes[end] == b'\\' { 2 } else { 1 };
        }

        if end >= bytes.len() {
            self.lexer.extras.newlines += count_newlines(remainder);
            self.lexer.extras.unterminated = Some(Unterminated::String {
                span: self.lexer.span(),
            });
            self.lexer.bump(remainder.len());
            return None;
        }

        let body = &remainder[..end];
        self.lexer.extras.newlines += count_newlines(body);
        self.lexer.bump(end + 1);

        self.string_close = Some(Token {
            text: &remainder[end..end + 1],
            line: self.current_line(),
            span: start + end..start + end + 1,
        });
        Some(Token {
            text: body,
            line,
            span: start..start + end,
        })
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.peeked.take() {
            Some(token) => token,
            None => self.read(),
        }
    }
}
