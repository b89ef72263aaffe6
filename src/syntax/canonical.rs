use super::lexer::{Token, TokenKind};
use super::render::is_keyword;

/// Structural identity of a token sequence, independent of whitespace,
/// comments and line breaks.
///
/// Spellings that parse to the same tree compare equal: quote style and
/// prefix case of string literals, a trailing `;`, a trailing comma where it
/// does not make a tuple, and the parentheses of `from m import (a, b)`.
/// The result is only a comparison key and is never rendered.
pub fn canonical_form(tokens: &[Token]) -> String {
    serde_json::to_string(&normalize(tokens)).unwrap_or_else(|_| String::new())
}

#[derive(Clone, Copy, PartialEq)]
enum Bracket {
    Call,
    Subscript,
    Group,
    Display,
}

struct Frame {
    kind: Bracket,
    commas: usize,
}

fn normalize(tokens: &[Token]) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut frames: Vec<Frame> = Vec::new();

    for token in tokens {
        match (token.kind, token.text.as_str()) {
            (TokenKind::Str, text) => out.push(Token {
                kind: TokenKind::Str,
                text: normalize_string(text),
            }),
            (TokenKind::Op, "(" | "[" | "{") => {
                let after_operand = out.last().is_some_and(ends_operand);
                let kind = match (token.text.as_str(), after_operand) {
                    ("(", true) => Bracket::Call,
                    ("(", false) => Bracket::Group,
                    ("[", true) => Bracket::Subscript,
                    _ => Bracket::Display,
                };
                frames.push(Frame { kind, commas: 0 });
                out.push(token.clone());
            }
            (TokenKind::Op, ")" | "]" | "}") => {
                if let Some(frame) = frames.pop() {
                    let trailing = out.last().is_some_and(|t| t.is_op(","));
                    // `(a,)` and `x[a,]` are tuples; other trailing commas are noise.
                    let droppable = match frame.kind {
                        Bracket::Call | Bracket::Display => true,
                        Bracket::Group | Bracket::Subscript => frame.commas >= 2,
                    };
                    if trailing && droppable {
                        out.pop();
                    }
                }
                out.push(token.clone());
            }
            (TokenKind::Op, ",") => {
                if let Some(frame) = frames.last_mut() {
                    frame.commas += 1;
                }
                out.push(token.clone());
            }
            _ => out.push(token.clone()),
        }
    }

    if out.last().is_some_and(|t| t.is_op(";")) {
        out.pop();
    }
    unwrap_import_parens(&mut out);
    out
}

fn ends_operand(token: &Token) -> bool {
    match token.kind {
        TokenKind::Name => !is_keyword(&token.text) || matches!(token.text.as_str(), "None" | "True" | "False"),
        TokenKind::Str => true,
        TokenKind::Number => false,
        TokenKind::Op => matches!(token.text.as_str(), ")" | "]" | "}"),
    }
}

/// `from m import (a, b,)` becomes `from m import a, b`.
fn unwrap_import_parens(tokens: &mut Vec<Token>) {
    if !tokens.first().is_some_and(|t| t.is_name("from")) {
        return;
    }
    let Some(at) = tokens.iter().position(|t| t.is_name("import")) else {
        return;
    };
    let wrapped = tokens.get(at + 1).is_some_and(|t| t.is_op("(")) && tokens.last().is_some_and(|t| t.is_op(")"));
    if !wrapped {
        return;
    }
    tokens.pop();
    tokens.remove(at + 1);
    if tokens.last().is_some_and(|t| t.is_op(",")) {
        tokens.pop();
    }
}

/// Rewrites a string literal into double-quoted form with a lowercase
/// prefix and no `u`.
fn normalize_string(text: &str) -> String {
    let Some(quote_at) = text.find(|c: char| c == '\'' || c == '"') else {
        return text.to_string();
    };
    let prefix: String = text[..quote_at].to_ascii_lowercase().replace('u', "");
    let literal = &text[quote_at..];

    let q = &literal[..1];
    let triple = literal.len() >= 6 && literal.starts_with(&q.repeat(3)) && literal.ends_with(&q.repeat(3));
    let width = if triple { 3 } else { 1 };
    if literal.len() < 2 * width || q == "\"" {
        return format!("{}{}", prefix, literal);
    }
    let body = &literal[width..literal.len() - width];

    if triple || prefix.contains('r') {
        if body.contains('"') {
            return format!("{}{}", prefix, literal);
        }
        let quote = "\"".repeat(width);
        return format!("{}{}{}{}", prefix, quote, body, quote);
    }

    let mut converted = String::with_capacity(body.len() + 2);
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\'') => converted.push('\''),
                Some(next) => {
                    converted.push('\\');
                    converted.push(next);
                }
                None => converted.push('\\'),
            },
            '"' => converted.push_str("\\\""),
            _ => converted.push(c),
        }
    }
    format!("{}\"{}\"", prefix, converted)
}
