//! DFA-based lexer built on Logos.
//!
//! The token enum mirrors the lexical surface of the ledger language:
//! literals (dates, numbers, strings, accounts, currencies, tags, links,
//! metadata keys, booleans), directive keywords, punctuation, and the
//! structural tokens (newline, comment, indent). Logos skips horizontal
//! whitespace; a post-processing pass over the spans reinserts one
//! [`Token::Indent`] at the start of every indented non-blank line, which
//! is how the grammar recognizes posting and metadata continuation lines.
//!
//! Input the DFA cannot match comes out as [`Token::Error`] carrying the
//! bad lexeme; the grammar absorbs those, reports them through the builder,
//! and recovers at the next end of line.

use logos::Logos;
use std::fmt;

use crate::location::Span;

/// Scan a triple-quoted string: the opening `"""` already matched, bump to
/// just past the closing delimiter. `None` (no closing delimiter) becomes a
/// lexer error.
fn lex_triple_quoted<'src>(lex: &mut logos::Lexer<'src, Token<'src>>) -> Option<&'src str> {
    let rest = lex.remainder();
    let end = rest.find("\"\"\"")?;
    lex.bump(end + 3);
    Some(lex.slice())
}

/// Tokens of the ledger language.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t]+")]
pub enum Token<'src> {
    // ===== Literals =====
    /// `YYYY-MM-DD` or `YYYY/MM/DD`. Range validity is checked by the
    /// grammar, not the lexer.
    #[regex(r"[0-9]{4}[-/][0-9]{2}[-/][0-9]{2}")]
    Date(&'src str),

    /// Unsigned number with optional thousands commas and fraction.
    /// Signs are separate tokens handled by the expression evaluator.
    #[regex(r"([0-9]+(,[0-9]{3})*(\.[0-9]+)?)|(\.[0-9]+)")]
    Number(&'src str),

    /// Double-quoted string, quotes included in the slice. Triple-quoted
    /// strings span lines and also land here.
    #[token("\"\"\"", lex_triple_quoted)]
    #[regex(r#""([^"\\]|\\.)*""#)]
    Str(&'src str),

    /// Colon-separated account, e.g. `Assets:Bank:Checking`.
    #[regex(r"[A-Z][A-Za-z0-9\-]*(:[A-Z][A-Za-z0-9\-]*)+")]
    Account(&'src str),

    /// Currency or commodity code, including single uppercase letters.
    #[regex(r"[A-Z][A-Z0-9'._-]{0,22}[A-Z0-9]|[A-Z]")]
    Currency(&'src str),

    /// `#tag`, hash included in the slice.
    #[regex(r"#[A-Za-z0-9\-_/.]+")]
    Tag(&'src str),

    /// `^link`, caret included in the slice.
    #[regex(r"\^[A-Za-z0-9\-_/.]+")]
    Link(&'src str),

    /// Metadata key with its trailing colon, e.g. `invoice:`.
    #[regex(r"[a-z][a-zA-Z0-9\-_]*:")]
    Key(&'src str),

    /// `TRUE` boolean literal.
    #[token("TRUE")]
    True,
    /// `FALSE` boolean literal.
    #[token("FALSE")]
    False,

    // ===== Keywords =====
    /// `txn` transaction keyword.
    #[token("txn")]
    Txn,
    /// `balance` directive keyword.
    #[token("balance")]
    Balance,
    /// `open` directive keyword.
    #[token("open")]
    Open,
    /// `close` directive keyword.
    #[token("close")]
    Close,
    /// `commodity` directive keyword.
    #[token("commodity")]
    Commodity,
    /// `pad` directive keyword.
    #[token("pad")]
    Pad,
    /// `event` directive keyword.
    #[token("event")]
    Event,
    /// `price` directive keyword.
    #[token("price")]
    Price,
    /// `note` directive keyword.
    #[token("note")]
    Note,
    /// `document` directive keyword.
    #[token("document")]
    Document,
    /// `query` directive keyword.
    #[token("query")]
    Query,
    /// `custom` directive keyword.
    #[token("custom")]
    Custom,
    /// `pushtag` directive keyword.
    #[token("pushtag")]
    Pushtag,
    /// `poptag` directive keyword.
    #[token("poptag")]
    Poptag,
    /// `option` directive keyword.
    #[token("option")]
    Option_,
    /// `include` directive keyword.
    #[token("include")]
    Include,
    /// `plugin` directive keyword.
    #[token("plugin")]
    Plugin,

    // ===== Punctuation (longest first) =====
    /// `{{` opening a total cost annotation.
    #[token("{{")]
    LCurlCurl,
    /// `}}` closing a total cost annotation.
    #[token("}}")]
    RCurlCurl,
    /// `{` opening a per-unit cost annotation.
    #[token("{")]
    LCurl,
    /// `}` closing a per-unit cost annotation.
    #[token("}")]
    RCurl,
    /// `@@` total price annotation.
    #[token("@@")]
    AtAt,
    /// `@` per-unit price annotation.
    #[token("@")]
    At,
    /// `|` legacy payee/narration separator.
    #[token("|")]
    Pipe,
    /// `=`.
    #[token("=")]
    Equal,
    /// `,` list separator.
    #[token(",")]
    Comma,
    /// `~` tolerance marker.
    #[token("~")]
    Tilde,
    /// `#` bare hash: transaction flag or cost-spec separator.
    #[token("#")]
    Hash,
    /// `*`: cleared flag, multiplication, or a merge marker in cost specs.
    #[token("*")]
    Asterisk,
    /// `/` division.
    #[token("/")]
    Slash,
    /// `+` addition.
    #[token("+")]
    Plus,
    /// `-` subtraction or negation.
    #[token("-")]
    Minus,
    /// `(` grouping.
    #[token("(")]
    LParen,
    /// `)` grouping.
    #[token(")")]
    RParen,

    /// Punctuation-class transaction flags.
    #[regex(r"[!&?%]")]
    Flag(&'src str),

    // ===== Structural =====
    /// End of a logical line.
    #[regex(r"\r?\n")]
    Newline,

    /// `;` comment to end of line, slice included.
    #[regex(r";[^\n\r]*")]
    Comment(&'src str),

    /// Leading whitespace on a continuation line. Inserted by [`tokenize`],
    /// never produced by the DFA itself.
    Indent,

    /// Input the DFA rejected; carries the bad lexeme.
    Error(&'src str),
}

impl Token<'_> {
    /// Whether this token can open a transaction header after the date.
    #[must_use]
    pub fn is_txn_flag(&self) -> bool {
        match self {
            Self::Txn | Self::Asterisk | Self::Hash | Self::Flag(_) => true,
            // A lone uppercase letter in flag position is a letter flag.
            Self::Currency(c) => c.len() == 1,
            _ => false,
        }
    }

    /// Whether this token can start an arithmetic expression.
    #[must_use]
    pub const fn starts_expr(&self) -> bool {
        matches!(
            self,
            Self::Number(_) | Self::LParen | Self::Plus | Self::Minus
        )
    }

    /// A short name for error messages.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Date(s)
            | Self::Number(s)
            | Self::Str(s)
            | Self::Account(s)
            | Self::Currency(s)
            | Self::Tag(s)
            | Self::Link(s)
            | Self::Key(s)
            | Self::Flag(s)
            | Self::Error(s) => format!("'{s}'"),
            Self::Comment(_) => "comment".to_string(),
            Self::Newline => "end of line".to_string(),
            Self::Indent => "indent".to_string(),
            other => format!("'{other}'"),
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(s)
            | Self::Number(s)
            | Self::Str(s)
            | Self::Account(s)
            | Self::Currency(s)
            | Self::Tag(s)
            | Self::Link(s)
            | Self::Key(s)
            | Self::Flag(s)
            | Self::Comment(s)
            | Self::Error(s) => write!(f, "{s}"),
            Self::True => write!(f, "TRUE"),
            Self::False => write!(f, "FALSE"),
            Self::Txn => write!(f, "txn"),
            Self::Balance => write!(f, "balance"),
            Self::Open => write!(f, "open"),
            Self::Close => write!(f, "close"),
            Self::Commodity => write!(f, "commodity"),
            Self::Pad => write!(f, "pad"),
            Self::Event => write!(f, "event"),
            Self::Price => write!(f, "price"),
            Self::Note => write!(f, "note"),
            Self::Document => write!(f, "document"),
            Self::Query => write!(f, "query"),
            Self::Custom => write!(f, "custom"),
            Self::Pushtag => write!(f, "pushtag"),
            Self::Poptag => write!(f, "poptag"),
            Self::Option_ => write!(f, "option"),
            Self::Include => write!(f, "include"),
            Self::Plugin => write!(f, "plugin"),
            Self::LCurlCurl => write!(f, "{{{{"),
            Self::RCurlCurl => write!(f, "}}}}"),
            Self::LCurl => write!(f, "{{"),
            Self::RCurl => write!(f, "}}"),
            Self::AtAt => write!(f, "@@"),
            Self::At => write!(f, "@"),
            Self::Pipe => write!(f, "|"),
            Self::Equal => write!(f, "="),
            Self::Comma => write!(f, ","),
            Self::Tilde => write!(f, "~"),
            Self::Hash => write!(f, "#"),
            Self::Asterisk => write!(f, "*"),
            Self::Slash => write!(f, "/"),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::Newline => write!(f, "\\n"),
            Self::Indent => write!(f, "<indent>"),
        }
    }
}

/// Tokenize the whole source.
///
/// Runs the DFA, then inserts [`Token::Indent`] where a non-blank line
/// starts with leading whitespace. Rejected input comes out as
/// [`Token::Error`] spanning the bad lexeme.
#[must_use]
pub fn tokenize(source: &str) -> Vec<(Token<'_>, Span)> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);
    let mut at_line_start = true;
    let mut line_start_offset = 0usize;

    while let Some(result) = lexer.next() {
        let span: Span = lexer.span().into();
        match result {
            Ok(Token::Newline) => {
                tokens.push((Token::Newline, span));
                at_line_start = true;
                line_start_offset = span.end;
            }
            Ok(token) => {
                if at_line_start && span.start > line_start_offset {
                    let leading = &source[line_start_offset..span.start];
                    if leading.chars().all(|c| c == ' ' || c == '\t') {
                        tokens.push((Token::Indent, Span::new(line_start_offset, span.start)));
                    }
                }
                at_line_start = false;
                tokens.push((token, span));
            }
            Err(()) => {
                at_line_start = false;
                tokens.push((Token::Error(span.text(source)), span));
            }
        }
    }

    tokens
}

/// Strip the quotes from a string lexeme and resolve escapes.
///
/// Handles both `"..."` and `"""..."""` forms. Recognized escapes are
/// `\" \\ \n \t \r`; anything else is kept verbatim, backslash included.
#[must_use]
pub fn unquote(lexeme: &str) -> String {
    let inner = if lexeme.len() >= 6 && lexeme.starts_with("\"\"\"") && lexeme.ends_with("\"\"\"") {
        &lexeme[3..lexeme.len() - 3]
    } else {
        &lexeme[1..lexeme.len() - 1]
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// A peek/advance cursor over the token vector.
///
/// The grammar engine and the expression evaluator both consume tokens
/// through this; it remembers the span of the last consumed token so
/// callers can close out directive spans without re-scanning.
#[derive(Debug)]
pub struct TokenStream<'src> {
    tokens: Vec<(Token<'src>, Span)>,
    pos: usize,
    prev: Span,
    eof: Span,
}

impl<'src> TokenStream<'src> {
    /// Wrap a token vector.
    #[must_use]
    pub fn new(tokens: Vec<(Token<'src>, Span)>) -> Self {
        let eof_offset = tokens.last().map_or(0, |(_, s)| s.end);
        let eof = Span::new(eof_offset, eof_offset);
        Self {
            tokens,
            pos: 0,
            prev: Span::new(0, 0),
            eof,
        }
    }

    /// The current token, without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    /// The token `n` positions ahead of the current one.
    #[must_use]
    pub fn peek_nth(&self, n: usize) -> Option<&Token<'src>> {
        self.tokens.get(self.pos + n).map(|(t, _)| t)
    }

    /// The span of the current token, or an empty span at end of input.
    #[must_use]
    pub fn span(&self) -> Span {
        self.tokens.get(self.pos).map_or(self.eof, |(_, s)| *s)
    }

    /// The span of the last consumed token.
    #[must_use]
    pub fn prev_span(&self) -> Span {
        self.prev
    }

    /// Consume and return the current token.
    pub fn bump(&mut self) -> Option<(Token<'src>, Span)> {
        let entry = self.tokens.get(self.pos).cloned();
        if let Some((_, span)) = entry {
            self.prev = span;
            self.pos += 1;
        }
        entry
    }

    /// Whether all tokens have been consumed.
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token<'_>> {
        tokenize(source).into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn dates_and_numbers() {
        assert_eq!(kinds("2024-01-15"), vec![Token::Date("2024-01-15")]);
        assert_eq!(kinds("2024/01/15"), vec![Token::Date("2024/01/15")]);
        assert_eq!(kinds("1,234.56"), vec![Token::Number("1,234.56")]);
        assert_eq!(kinds(".50"), vec![Token::Number(".50")]);
        assert_eq!(
            kinds("-37.45"),
            vec![Token::Minus, Token::Number("37.45")]
        );
    }

    #[test]
    fn accounts_and_currencies() {
        assert_eq!(
            kinds("Assets:Bank:Checking"),
            vec![Token::Account("Assets:Bank:Checking")]
        );
        assert_eq!(kinds("USD"), vec![Token::Currency("USD")]);
        // Single uppercase letters are currencies at the lexical level.
        assert_eq!(kinds("V"), vec![Token::Currency("V")]);
    }

    #[test]
    fn strings() {
        assert_eq!(
            kinds(r#""Cafe Mogador""#),
            vec![Token::Str(r#""Cafe Mogador""#)]
        );
        assert_eq!(unquote(r#""a\"b\\c\nd""#), "a\"b\\c\nd");
        assert_eq!(unquote(r#""\q""#), "\\q");
    }

    #[test]
    fn triple_quoted_string_spans_lines() {
        let source = "\"\"\"line one\nline two\"\"\"";
        let toks = kinds(source);
        assert_eq!(toks.len(), 1);
        assert!(matches!(toks[0], Token::Str(_)));
        assert_eq!(unquote(source), "line one\nline two");
    }

    #[test]
    fn keywords_and_bools() {
        assert_eq!(
            kinds("txn balance open TRUE FALSE"),
            vec![
                Token::Txn,
                Token::Balance,
                Token::Open,
                Token::True,
                Token::False
            ]
        );
    }

    #[test]
    fn tags_links_keys() {
        assert_eq!(kinds("#berlin-trip"), vec![Token::Tag("#berlin-trip")]);
        assert_eq!(kinds("^invoice-1"), vec![Token::Link("^invoice-1")]);
        assert_eq!(kinds("invoice:"), vec![Token::Key("invoice:")]);
        assert_eq!(kinds("#"), vec![Token::Hash]);
    }

    #[test]
    fn punctuation_longest_match() {
        assert_eq!(
            kinds("{{ }} { } @@ @"),
            vec![
                Token::LCurlCurl,
                Token::RCurlCurl,
                Token::LCurl,
                Token::RCurl,
                Token::AtAt,
                Token::At
            ]
        );
    }

    #[test]
    fn indent_inserted_on_continuation_lines() {
        let toks = kinds("2024-01-15 txn\n  Assets:Cash 5 USD\n");
        assert!(toks.contains(&Token::Indent));
        // But not on blank lines.
        let toks = kinds("open\n   \nclose");
        assert_eq!(
            toks,
            vec![Token::Open, Token::Newline, Token::Newline, Token::Close]
        );
    }

    #[test]
    fn comments() {
        assert_eq!(
            kinds("; a comment"),
            vec![Token::Comment("; a comment")]
        );
    }

    #[test]
    fn bad_input_becomes_error_tokens() {
        let toks = kinds("2024-01-01 open `backtick");
        assert!(toks.iter().any(|t| matches!(t, Token::Error(_))));
    }

    #[test]
    fn crlf_newlines() {
        let toks = kinds("open\r\nclose");
        assert_eq!(toks, vec![Token::Open, Token::Newline, Token::Close]);
    }
}
