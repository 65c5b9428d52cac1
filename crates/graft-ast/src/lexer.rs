//! Tokenization of PHP source using logos.
//!
//! Unlike a compiler lexer, trivia (whitespace and comments) are kept as
//! tokens: the printer needs every byte of the original file, and the parser
//! needs doc comments to attach them to declarations. Keywords are lexed as
//! [`TokenKind::Name`] and matched case-insensitively by the parser, since
//! PHP keywords double as method and constant names.

use crate::error::{AstError, AstResult};
use crate::syntax::Span;
use logos::{Lexer, Logos};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    #[regex(r"<\?[pP][hH][pP]")]
    OpenTag,
    #[token("<?=")]
    OpenTagEcho,
    /// `?>` together with the inline HTML up to the next open tag
    #[token("?>", lex_inline_html)]
    CloseTag,
    /// Text before the first open tag; produced by [`tokenize`], never by logos
    InlineHtml,

    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,
    #[regex(r"//[^\n]*")]
    #[regex(r"#[^\[\n][^\n]*")]
    #[token("#")]
    LineComment,
    /// `/* */` and `/** */`; see [`Token::is_doc_comment`]
    #[token("/*", lex_block_comment)]
    BlockComment,

    #[token("'", lex_single_quoted)]
    #[token("\"", lex_double_quoted)]
    #[token("`", lex_backtick)]
    String,
    #[token("<<<", lex_heredoc)]
    Heredoc,
    #[regex(r"[0-9][0-9_]*(\.[0-9_]*)?([eE][+-]?[0-9_]+)?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?")]
    #[regex(r"0[xX][0-9a-fA-F_]+")]
    #[regex(r"0[bB][01_]+")]
    #[regex(r"0[oO][0-7_]+")]
    Number,
    #[regex(r"\$([A-Za-z_]|[^\x00-\x7F])([A-Za-z0-9_]|[^\x00-\x7F])*")]
    Variable,
    /// Identifier, keyword, or (fully) qualified name
    #[regex(r"\\?([A-Za-z_]|[^\x00-\x7F])([A-Za-z0-9_]|[^\x00-\x7F])*(\\([A-Za-z_]|[^\x00-\x7F])([A-Za-z0-9_]|[^\x00-\x7F])*)*")]
    Name,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("#[")]
    AttributeOpen,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("=>")]
    FatArrow,
    #[token("::")]
    DoubleColon,
    #[token("->")]
    Arrow,
    #[token("?->")]
    NullsafeArrow,
    #[token("=")]
    Assign,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("...")]
    Ellipsis,
    #[token("&")]
    Ampersand,
    #[token("|")]
    Pipe,
    #[token("\\")]
    Backslash,
    #[token("$")]
    Dollar,

    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("%")]
    #[token("**")]
    #[token(".")]
    #[token("!")]
    #[token("~")]
    #[token("^")]
    #[token("@")]
    #[token("<")]
    #[token(">")]
    #[token("<=")]
    #[token(">=")]
    #[token("==")]
    #[token("!=")]
    #[token("<>")]
    #[token("===")]
    #[token("!==")]
    #[token("<=>")]
    #[token("&&")]
    #[token("||")]
    #[token("??")]
    #[token("++")]
    #[token("--")]
    #[token("<<")]
    #[token(">>")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token(".=")]
    #[token("%=")]
    #[token("**=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    #[token("<<=")]
    #[token(">>=")]
    #[token("??=")]
    Operator,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.start..self.span.end]
    }

    pub fn is_doc_comment(&self, source: &str) -> bool {
        let text = self.text(source);
        self.kind == TokenKind::BlockComment && text.starts_with("/**") && text.len() > 4
    }

    /// Case-insensitive keyword test
    pub fn is_keyword(&self, source: &str, keyword: &str) -> bool {
        self.kind == TokenKind::Name && self.text(source).eq_ignore_ascii_case(keyword)
    }
}

/// Tokenize a whole file, trivia included.
///
/// The concatenated token texts always equal `source`.
pub fn tokenize(source: &str) -> AstResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let code_start = find_open_tag(source).unwrap_or(source.len());
    if code_start > 0 {
        tokens.push(Token {
            kind: TokenKind::InlineHtml,
            span: Span::new(0, code_start),
        });
    }

    let mut lexer = TokenKind::lexer(&source[code_start..]);
    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(range.start + code_start, range.end + code_start);
        match result {
            Ok(kind) => tokens.push(Token { kind, span }),
            Err(()) => {
                let message = match source[span.start..].chars().next() {
                    Some('\'') | Some('"') | Some('`') => "unterminated string literal".to_string(),
                    Some('/') => "unterminated comment".to_string(),
                    Some('<') => "unterminated heredoc".to_string(),
                    Some(ch) => format!("unexpected character `{}`", ch),
                    None => "unexpected end of input".to_string(),
                };
                return Err(AstError::parse(source, span.start, message));
            }
        }
    }
    Ok(tokens)
}

fn find_open_tag(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    (0..bytes.len()).find(|&i| {
        bytes[i..].starts_with(b"<?=")
            || (bytes.len() >= i + 5
                && bytes[i..i + 2] == *b"<?"
                && bytes[i + 2..i + 5].eq_ignore_ascii_case(b"php"))
    })
}

fn lex_inline_html(lex: &mut Lexer<TokenKind>) -> bool {
    let rest = lex.remainder();
    let len = find_open_tag(rest).unwrap_or(rest.len());
    lex.bump(len);
    true
}

fn lex_block_comment(lex: &mut Lexer<TokenKind>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => false,
    }
}

fn lex_single_quoted(lex: &mut Lexer<TokenKind>) -> bool {
    scan_quoted(lex, b'\'', false)
}

fn lex_double_quoted(lex: &mut Lexer<TokenKind>) -> bool {
    scan_quoted(lex, b'"', true)
}

fn lex_backtick(lex: &mut Lexer<TokenKind>) -> bool {
    scan_quoted(lex, b'`', true)
}

/// Scan to the closing quote, honouring backslash escapes. With
/// `interpolates`, quotes inside `{$ ... }` do not terminate the literal.
fn scan_quoted(lex: &mut Lexer<TokenKind>, quote: u8, interpolates: bool) -> bool {
    let bytes = lex.remainder().as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' if interpolates && bytes.get(i + 1) == Some(&b'$') => depth += 1,
            b'{' if depth > 0 => depth += 1,
            b'}' if depth > 0 => depth -= 1,
            b if b == quote && depth == 0 => {
                lex.bump(i + 1);
                return true;
            }
            _ => {}
        }
        i += 1;
    }
    false
}

fn lex_heredoc(lex: &mut Lexer<TokenKind>) -> bool {
    let rest = lex.remainder();
    let header_end = match rest.find('\n') {
        Some(nl) => nl,
        None => return false,
    };
    let label = rest[..header_end]
        .trim()
        .trim_matches(|c| c == '\'' || c == '"');
    if label.is_empty() || !label.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return false;
    }

    let mut offset = header_end + 1;
    for line in rest[header_end + 1..].split_inclusive('\n') {
        let trimmed = line.trim_start_matches([' ', '\t']);
        if let Some(after) = trimmed.strip_prefix(label) {
            let terminates = after
                .chars()
                .next()
                .map_or(true, |c| !(c.is_alphanumeric() || c == '_'));
            if terminates {
                let label_end = offset + (line.len() - trimmed.len()) + label.len();
                lex.bump(label_end);
                return true;
            }
        }
        offset += line.len();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .filter(|t| !t.kind.is_trivia())
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokens_cover_source() {
        let source = "<?php\n// note\nuse A\\B as C; /** doc */ $x = ['a' => 1.5];\n";
        let tokens = tokenize(source).unwrap();
        let joined: String = tokens.iter().map(|t| t.text(source)).collect();
        assert_eq!(joined, source);
    }

    #[test]
    fn test_qualified_names_and_operators() {
        assert_eq!(
            kinds("<?php \\craft\\base\\Plugin::class ?-> ?? =>"),
            vec![
                TokenKind::OpenTag,
                TokenKind::Name,
                TokenKind::DoubleColon,
                TokenKind::Name,
                TokenKind::NullsafeArrow,
                TokenKind::Operator,
                TokenKind::FatArrow,
            ]
        );
    }

    #[test]
    fn test_doc_comment_detection() {
        let source = "<?php /** doc */ /* plain */ /**/";
        let tokens = tokenize(source).unwrap();
        let docs: Vec<bool> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::BlockComment)
            .map(|t| t.is_doc_comment(source))
            .collect();
        assert_eq!(docs, vec![true, false, false]);
    }

    #[test]
    fn test_strings_with_escapes_and_interpolation() {
        let source = r#"<?php 'it\'s' "a {$b["c"]} d";"#;
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::OpenTag,
                TokenKind::String,
                TokenKind::String,
                TokenKind::Semicolon
            ]
        );
    }

    #[test]
    fn test_heredoc() {
        let source = "<?php $a = <<<EOT\nline {$x}\n  EOT;\n";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::OpenTag,
                TokenKind::Variable,
                TokenKind::Assign,
                TokenKind::Heredoc,
                TokenKind::Semicolon
            ]
        );
    }

    #[test]
    fn test_inline_html_and_close_tag() {
        let source = "<html>\n<?php echo 1; ?>\n<b>x</b>\n<?php echo 2;";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::InlineHtml);
        let close = tokens.iter().find(|t| t.kind == TokenKind::CloseTag).unwrap();
        assert_eq!(close.text(source), "?>\n<b>x</b>\n");
    }

    #[test]
    fn test_unterminated_comment_is_parse_error() {
        let err = tokenize("<?php\n/* open").unwrap_err();
        assert!(matches!(err, AstError::Parse { line: 2, .. }));
    }
}
