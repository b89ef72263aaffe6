use crate::error::{EcaError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Name,
    Number,
    Str,
    Op,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn name(text: impl Into<String>) -> Self {
        Self { kind: TokenKind::Name, text: text.into() }
    }

    pub fn op(text: impl Into<String>) -> Self {
        Self { kind: TokenKind::Op, text: text.into() }
    }

    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokenKind::Op && self.text == op
    }

    pub fn is_name(&self, name: &str) -> bool {
        self.kind == TokenKind::Name && self.text == name
    }
}

/// One logical line of source: a statement's tokens together with the
/// physical lines it was read from.
///
/// `raw` is empty for lines built by a rewrite; those are rendered from
/// their tokens instead.
#[derive(Debug, Clone)]
pub struct LogicalLine {
    pub line_no: usize,
    pub indent: String,
    pub tokens: Vec<Token>,
    pub raw: Vec<String>,
    /// Blank and comment-only lines directly above this one.
    pub trivia: Vec<String>,
}

impl LogicalLine {
    pub fn synthesized(indent: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            line_no: 0,
            indent: indent.into(),
            tokens,
            raw: Vec::new(),
            trivia: Vec::new(),
        }
    }

    pub fn is_synthesized(&self) -> bool {
        self.raw.is_empty()
    }

    /// Column width of the indentation, tabs advancing to the next multiple of 8.
    pub fn indent_width(&self) -> usize {
        indent_width(&self.indent)
    }

    pub fn first(&self) -> Option<&Token> {
        self.tokens.first()
    }
}

pub fn indent_width(indent: &str) -> usize {
    indent.chars().fold(0, |width, c| match c {
        '\t' => (width / 8 + 1) * 8,
        _ => width + 1,
    })
}

#[derive(Debug, Clone, Default)]
pub struct Lexed {
    pub lines: Vec<LogicalLine>,
    /// Blank and comment lines after the last statement.
    pub trailing: Vec<String>,
}

const THREE_CHAR_OPS: [&str; 5] = ["**=", "//=", ">>=", "<<=", "..."];
const TWO_CHAR_OPS: [&str; 19] = [
    "**", "//", "<<", ">>", "<=", ">=", "==", "!=", "->", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "@=", ":=",
];
const ONE_CHAR_OPS: &str = "+-*/%@&|^~<>()[]{},:.;=";
const STRING_PREFIXES: [&str; 8] = ["r", "u", "b", "f", "br", "rb", "fr", "rf"];

struct OpenString {
    quote: String,
    text: String,
    start_line: usize,
}

/// Splits Python source into logical lines of tokens.
pub fn tokenize(source: &str) -> Result<Lexed> {
    let mut lexed = Lexed::default();
    let mut trivia: Vec<String> = Vec::new();
    let mut current: Option<LogicalLine> = None;
    let mut brackets: Vec<(char, usize)> = Vec::new();
    let mut open_string: Option<OpenString> = None;
    let mut continued = false;

    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let mut logical = match current.take() {
            Some(logical) => logical,
            None => {
                let trimmed = line.trim_start();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    trivia.push(line.to_string());
                    continue;
                }
                LogicalLine {
                    line_no,
                    indent: line[..line.len() - trimmed.len()].to_string(),
                    tokens: Vec::new(),
                    raw: Vec::new(),
                    trivia: std::mem::take(&mut trivia),
                }
            }
        };
        logical.raw.push(line.to_string());
        continued = false;

        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;

        if let Some(mut pending) = open_string.take() {
            match find_string_end(&chars, 0, &pending.quote) {
                StringEnd::Closed(end) => {
                    pending.text.extend(&chars[..end]);
                    logical.tokens.push(Token { kind: TokenKind::Str, text: pending.text });
                    i = end;
                }
                StringEnd::Open => {
                    pending.text.push_str(line);
                    pending.text.push('\n');
                    open_string = Some(pending);
                    current = Some(logical);
                    continue;
                }
                StringEnd::Unterminated => {
                    return Err(EcaError::parse(pending.start_line, "unterminated string literal"));
                }
            }
        }

        while i < chars.len() {
            let c = chars[i];
            if c == ' ' || c == '\t' || c == '\x0c' {
                i += 1;
            } else if c == '#' {
                break;
            } else if c == '\\' {
                if i + 1 == chars.len() {
                    continued = true;
                    break;
                }
                return Err(EcaError::parse(line_no, "unexpected character after line continuation character"));
            } else if c.is_alphabetic() || c == '_' {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let is_prefix = STRING_PREFIXES.contains(&word.to_ascii_lowercase().as_str());
                if is_prefix && i < chars.len() && (chars[i] == '"' || chars[i] == '\'') {
                    i = lex_string(&chars, start, i, line_no, &mut logical, &mut open_string)?;
                } else {
                    logical.tokens.push(Token { kind: TokenKind::Name, text: word });
                }
            } else if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())) {
                let start = i;
                let hex = c == '0' && chars.get(i + 1).is_some_and(|n| matches!(n, 'x' | 'X'));
                while i < chars.len() {
                    let d = chars[i];
                    let exponent_sign = (d == '+' || d == '-')
                        && !hex
                        && matches!(chars[i - 1], 'e' | 'E');
                    if d.is_ascii_alphanumeric() || d == '_' || d == '.' || exponent_sign {
                        i += 1;
                    } else {
                        break;
                    }
                }
                logical.tokens.push(Token {
                    kind: TokenKind::Number,
                    text: chars[start..i].iter().collect(),
                });
            } else if c == '"' || c == '\'' {
                i = lex_string(&chars, i, i, line_no, &mut logical, &mut open_string)?;
            } else {
                let op = match_operator(&chars, i).ok_or_else(|| {
                    EcaError::parse(line_no, format!("invalid character '{}'", c))
                })?;
                match op {
                    "(" | "[" | "{" => brackets.push((c, line_no)),
                    ")" | "]" | "}" => {
                        let expected = match c {
                            ')' => '(',
                            ']' => '[',
                            _ => '{',
                        };
                        match brackets.pop() {
                            Some((open, _)) if open == expected => {}
                            Some((open, _)) => {
                                return Err(EcaError::parse(
                                    line_no,
                                    format!("closing '{}' does not match '{}'", c, open),
                                ))
                            }
                            None => {
                                return Err(EcaError::parse(line_no, format!("unmatched '{}'", c)))
                            }
                        }
                    }
                    _ => {}
                }
                i += op.chars().count();
                logical.tokens.push(Token::op(op));
            }
        }

        if open_string.is_some() || !brackets.is_empty() || continued {
            current = Some(logical);
        } else {
            lexed.lines.push(logical);
        }
    }

    if let Some(pending) = open_string {
        let message = if pending.quote.len() == 3 {
            "unterminated triple-quoted string literal"
        } else {
            "unterminated string literal"
        };
        return Err(EcaError::parse(pending.start_line, message));
    }
    if let Some((open, line)) = brackets.pop() {
        return Err(EcaError::parse(line, format!("'{}' was never closed", open)));
    }
    if continued {
        return Err(EcaError::parse(source.lines().count(), "unexpected EOF after line continuation"));
    }
    if let Some(logical) = current {
        lexed.lines.push(logical);
    }
    lexed.trailing = trivia;
    Ok(lexed)
}

fn match_operator(chars: &[char], i: usize) -> Option<&'static str> {
    let rest: String = chars[i..chars.len().min(i + 3)].iter().collect();
    THREE_CHAR_OPS
        .iter()
        .chain(TWO_CHAR_OPS.iter())
        .find(|op| rest.starts_with(*op))
        .copied()
        .or_else(|| {
            let idx = ONE_CHAR_OPS.find(chars[i])?;
            ONE_CHAR_OPS.get(idx..idx + 1)
        })
}

/// Lexes a string literal whose prefix starts at `start` and whose opening
/// quote is at `quote_at`. Returns the index just past the literal, or the
/// end of the line when the string continues on the next line.
fn lex_string(
    chars: &[char],
    start: usize,
    quote_at: usize,
    line_no: usize,
    logical: &mut LogicalLine,
    open_string: &mut Option<OpenString>,
) -> Result<usize> {
    let q = chars[quote_at];
    let triple = chars.len() >= quote_at + 3 && chars[quote_at + 1] == q && chars[quote_at + 2] == q;
    let quote: String = std::iter::repeat(q).take(if triple { 3 } else { 1 }).collect();

    match find_string_end(chars, quote_at + quote.len(), &quote) {
        StringEnd::Closed(end) => {
            logical.tokens.push(Token {
                kind: TokenKind::Str,
                text: chars[start..end].iter().collect(),
            });
            Ok(end)
        }
        StringEnd::Open => {
            let mut text: String = chars[start..].iter().collect();
            text.push('\n');
            *open_string = Some(OpenString { quote, text, start_line: line_no });
            Ok(chars.len())
        }
        StringEnd::Unterminated => Err(EcaError::parse(line_no, "unterminated string literal")),
    }
}

enum StringEnd {
    /// Index just past the closing quote.
    Closed(usize),
    /// Continues on the next line: any triple-quoted string, or a
    /// single-quoted one ending in a backslash.
    Open,
    Unterminated,
}

/// Scans for the closing `quote` (one or three characters) from `from`.
fn find_string_end(chars: &[char], from: usize, quote: &str) -> StringEnd {
    let q: Vec<char> = quote.chars().collect();
    let mut j = from;
    while j < chars.len() {
        if chars[j] == '\\' {
            if j + 1 == chars.len() {
                return StringEnd::Open;
            }
            j += 2;
            continue;
        }
        if j + q.len() <= chars.len() && chars[j..j + q.len()] == q[..] {
            return StringEnd::Closed(j + q.len());
        }
        j += 1;
    }
    if q.len() == 3 {
        StringEnd::Open
    } else {
        StringEnd::Unterminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &LogicalLine) -> Vec<&str> {
        line.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_simple_statement_tokens() {
        let lexed = tokenize("x = foo(a, b=2) ** 3  # note\n").unwrap();
        assert_eq!(lexed.lines.len(), 1);
        assert_eq!(
            texts(&lexed.lines[0]),
            vec!["x", "=", "foo", "(", "a", ",", "b", "=", "2", ")", "**", "3"]
        );
    }

    #[test]
    fn test_implicit_continuation_joins_lines() {
        let lexed = tokenize("total = f(1,\n          2)\ny = 3\n").unwrap();
        assert_eq!(lexed.lines.len(), 2);
        assert_eq!(lexed.lines[0].raw.len(), 2);
        assert_eq!(lexed.lines[1].line_no, 3);
    }

    #[test]
    fn test_triple_quoted_string_spans_lines() {
        let src = "def f():\n    \"\"\"Doc\n    more\n    \"\"\"\n    return 1\n";
        let lexed = tokenize(src).unwrap();
        assert_eq!(lexed.lines.len(), 3);
        assert_eq!(lexed.lines[1].tokens.len(), 1);
        assert_eq!(lexed.lines[1].tokens[0].kind, TokenKind::Str);
    }

    #[test]
    fn test_prefixed_strings_and_numbers() {
        let lexed = tokenize("a = rb'\\x00' + f\"{x}\" + 1e-5 + 0x1F\n").unwrap();
        let kinds: Vec<TokenKind> = lexed.lines[0].tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Name,
                TokenKind::Op,
                TokenKind::Str,
                TokenKind::Op,
                TokenKind::Str,
                TokenKind::Op,
                TokenKind::Number,
                TokenKind::Op,
                TokenKind::Number,
            ]
        );
    }

    #[test]
    fn test_comments_become_trivia() {
        let lexed = tokenize("# header\n\nx = 1\n# tail\n").unwrap();
        assert_eq!(lexed.lines[0].trivia, vec!["# header".to_string(), String::new()]);
        assert_eq!(lexed.trailing, vec!["# tail".to_string()]);
    }

    #[test]
    fn test_unbalanced_brackets_fail() {
        assert!(tokenize("x = (1, 2\n").is_err());
        assert!(tokenize("x = 1)\n").is_err());
        assert!(tokenize("x = [1, 2)\n").is_err());
    }

    #[test]
    fn test_unterminated_strings_fail() {
        assert!(tokenize("x = 'abc\n").is_err());
        assert!(tokenize("x = \"\"\"abc\n").is_err());
    }

    #[test]
    fn test_backslash_newline_inside_short_string() {
        let src = "def f(n):\n    s = 'abc\\\ndef'\n    return s\n";
        let lexed = tokenize(src).unwrap();
        assert_eq!(lexed.lines.len(), 3);
        let assign = &lexed.lines[1];
        assert_eq!(assign.raw.len(), 2);
        assert_eq!(assign.tokens.len(), 3);
        assert_eq!(assign.tokens[2].kind, TokenKind::Str);
        assert_eq!(assign.tokens[2].text, "'abc\\\ndef'");
        assert_eq!(texts(&lexed.lines[2]), vec!["return", "s"]);

        assert!(tokenize("x = 'abc\\\ndef\n").is_err());
    }
}
