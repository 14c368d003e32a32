//! HLSL tokenizer.
//!
//! Runs one preprocessed line at a time so every token can be tagged with
//! its line and column without threading position state through nom.

use crate::preprocessor::SourceLine;
use crate::report::{ReportKind, Reporter, Span};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit0, digit1, hex_digit1, one_of},
    combinator::{map, opt, recognize},
    multi::many0,
    sequence::{pair, preceded, tuple},
    IResult,
};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    IntLiteral(String),
    /// Value text keeps its decimal point but not the `f`/`h` suffix;
    /// `is_half` records an `h` suffix.
    FloatLiteral {
        value: String,
        is_half: bool,
    },

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,
    Question,

    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqualEqual,
    NotEqual,
    LessEqual,
    GreaterEqual,
    Less,
    Greater,
    AndAnd,
    OrOr,
    Not,
    Amp,
    Pipe,
    Caret,
    Tilde,
    ShiftLeft,
    ShiftRight,
    Inc,
    Dec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

fn ident(input: &str) -> IResult<&str, TokenKind> {
    map(
        recognize(pair(
            alt((
                recognize(one_of(
                    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ",
                )),
                tag("_"),
            )),
            many0(alt((
                recognize(one_of(
                    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789",
                )),
                tag("_"),
            ))),
        )),
        |s: &str| TokenKind::Ident(s.to_string()),
    )(input)
}

fn exponent(input: &str) -> IResult<&str, &str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

fn float_literal(input: &str) -> IResult<&str, TokenKind> {
    // Forms: `1.0`, `1.`, `1.0e-3`, `1e5`, `1.5f`, `2h`; a trailing
    // f/F/h/H suffix is consumed but stripped from the value.
    let (rest, (body, suffix)) = alt((
        pair(
            recognize(tuple((digit1, char('.'), digit0, opt(exponent)))),
            opt(one_of("fFhH")),
        ),
        pair(recognize(tuple((digit1, exponent))), opt(one_of("fFhH"))),
        pair(recognize(digit1), map(one_of("fFhH"), Some)),
    ))(input)?;

    let mut value = body.to_string();
    if !value.contains('.') && !value.contains(['e', 'E']) {
        value.push_str(".0");
    }
    Ok((
        rest,
        TokenKind::FloatLiteral {
            value,
            is_half: matches!(suffix, Some('h') | Some('H')),
        },
    ))
}

fn int_literal(input: &str) -> IResult<&str, TokenKind> {
    map(
        alt((
            recognize(tuple((tag("0x"), hex_digit1, opt(one_of("uU"))))),
            recognize(tuple((tag("0X"), hex_digit1, opt(one_of("uU"))))),
            recognize(pair(digit1, opt(one_of("uU")))),
        )),
        |s: &str| TokenKind::IntLiteral(s.to_string()),
    )(input)
}

fn operator(input: &str) -> IResult<&str, TokenKind> {
    // Longest operators first.
    alt((
        alt((
            map(tag("<<"), |_| TokenKind::ShiftLeft),
            map(tag(">>"), |_| TokenKind::ShiftRight),
            map(tag("<="), |_| TokenKind::LessEqual),
            map(tag(">="), |_| TokenKind::GreaterEqual),
            map(tag("=="), |_| TokenKind::EqualEqual),
            map(tag("!="), |_| TokenKind::NotEqual),
            map(tag("&&"), |_| TokenKind::AndAnd),
            map(tag("||"), |_| TokenKind::OrOr),
            map(tag("++"), |_| TokenKind::Inc),
            map(tag("--"), |_| TokenKind::Dec),
            map(tag("+="), |_| TokenKind::PlusAssign),
            map(tag("-="), |_| TokenKind::MinusAssign),
            map(tag("*="), |_| TokenKind::StarAssign),
            map(tag("/="), |_| TokenKind::SlashAssign),
            map(tag("%="), |_| TokenKind::PercentAssign),
        )),
        alt((
            map(char('+'), |_| TokenKind::Plus),
            map(char('-'), |_| TokenKind::Minus),
            map(char('*'), |_| TokenKind::Star),
            map(char('/'), |_| TokenKind::Slash),
            map(char('%'), |_| TokenKind::Percent),
            map(char('='), |_| TokenKind::Assign),
            map(char('<'), |_| TokenKind::Less),
            map(char('>'), |_| TokenKind::Greater),
            map(char('!'), |_| TokenKind::Not),
            map(char('&'), |_| TokenKind::Amp),
            map(char('|'), |_| TokenKind::Pipe),
            map(char('^'), |_| TokenKind::Caret),
            map(char('~'), |_| TokenKind::Tilde),
        )),
    ))(input)
}

fn punctuation(input: &str) -> IResult<&str, TokenKind> {
    alt((
        map(char('('), |_| TokenKind::LParen),
        map(char(')'), |_| TokenKind::RParen),
        map(char('{'), |_| TokenKind::LBrace),
        map(char('}'), |_| TokenKind::RBrace),
        map(char('['), |_| TokenKind::LBracket),
        map(char(']'), |_| TokenKind::RBracket),
        map(char(','), |_| TokenKind::Comma),
        map(char(';'), |_| TokenKind::Semicolon),
        map(char(':'), |_| TokenKind::Colon),
        map(char('.'), |_| TokenKind::Dot),
        map(char('?'), |_| TokenKind::Question),
    ))(input)
}

fn token(input: &str) -> IResult<&str, TokenKind> {
    preceded(
        many0(one_of(" \t\r")),
        alt((float_literal, int_literal, ident, punctuation, operator)),
    )(input)
}

/// Tokenize preprocessed lines; unrecognized characters are reported and
/// skipped so tokenization can continue.
pub fn tokenize(lines: &[SourceLine], reporter: &mut Reporter) -> Vec<Token> {
    let mut tokens = Vec::new();
    for line in lines {
        let mut rest = line.text.as_str();
        loop {
            let trimmed = rest.trim_start_matches([' ', '\t', '\r']);
            if trimmed.is_empty() {
                break;
            }
            let col = (line.text.len() - trimmed.len() + 1) as u32;
            match token(rest) {
                Ok((remaining, kind)) => {
                    tokens.push(Token {
                        kind,
                        span: Span::new(line.line, col),
                    });
                    rest = remaining;
                }
                Err(_) => {
                    let bad = trimmed.chars().next().unwrap();
                    reporter.error(
                        ReportKind::LexicalError,
                        format!("unexpected character '{}'", bad),
                        Span::new(line.line, col),
                    );
                    rest = &trimmed[bad.len_utf8()..];
                }
            }
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(text: &str) -> Vec<TokenKind> {
        let mut reporter = Reporter::new(true);
        let lines: Vec<SourceLine> = text
            .lines()
            .enumerate()
            .map(|(i, l)| SourceLine {
                text: l.to_string(),
                line: i as u32 + 1,
            })
            .collect();
        let tokens = tokenize(&lines, &mut reporter);
        assert!(!reporter.has_errors(), "lex errors for {:?}", text);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_idents_and_literals() {
        assert_eq!(
            lex("float4 _x x2 12 0xFFu 1.5f 2h 1e3"),
            vec![
                TokenKind::Ident("float4".into()),
                TokenKind::Ident("_x".into()),
                TokenKind::Ident("x2".into()),
                TokenKind::IntLiteral("12".into()),
                TokenKind::IntLiteral("0xFFu".into()),
                TokenKind::FloatLiteral {
                    value: "1.5".into(),
                    is_half: false
                },
                TokenKind::FloatLiteral {
                    value: "2.0".into(),
                    is_half: true
                },
                TokenKind::FloatLiteral {
                    value: "1e3".into(),
                    is_half: false
                },
            ]
        );
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(
            lex("a<<=b"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::ShiftLeft,
                TokenKind::Assign,
                TokenKind::Ident("b".into()),
            ]
        );
        assert_eq!(
            lex("a<=b && c++"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::LessEqual,
                TokenKind::Ident("b".into()),
                TokenKind::AndAnd,
                TokenKind::Ident("c".into()),
                TokenKind::Inc,
            ]
        );
    }

    #[test]
    fn test_member_access_not_float() {
        assert_eq!(
            lex("v.xyz"),
            vec![
                TokenKind::Ident("v".into()),
                TokenKind::Dot,
                TokenKind::Ident("xyz".into()),
            ]
        );
    }

    #[test]
    fn test_spans() {
        let mut reporter = Reporter::new(true);
        let lines = vec![SourceLine {
            text: "  foo bar".to_string(),
            line: 7,
        }];
        let tokens = tokenize(&lines, &mut reporter);
        assert_eq!(tokens[0].span, Span::new(7, 3));
        assert_eq!(tokens[1].span, Span::new(7, 7));
    }

    #[test]
    fn test_lex_error_recovery() {
        let mut reporter = Reporter::new(true);
        let lines = vec![SourceLine {
            text: "int @ x;".to_string(),
            line: 1,
        }];
        let tokens = tokenize(&lines, &mut reporter);
        assert!(reporter.has_errors());
        assert_eq!(tokens.len(), 3);
    }
}
