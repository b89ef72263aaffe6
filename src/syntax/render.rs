use super::lexer::{LogicalLine, Token, TokenKind};
use super::parser::{Module, Stmt};

const KEYWORDS: [&str; 35] = [
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Renders a module back to source text. Untouched statements keep their
/// original physical lines.
pub fn render_module(module: &Module) -> String {
    let mut lines: Vec<String> = Vec::new();
    for stmt in &module.body {
        render_stmt(stmt, &mut lines);
    }
    lines.extend(module.trailing.iter().cloned());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn render_stmt(stmt: &Stmt, lines: &mut Vec<String>) {
    for decorator in &stmt.decorators {
        render_line(decorator, lines);
    }
    render_line(&stmt.line, lines);
    for child in &stmt.body {
        render_stmt(child, lines);
    }
}

fn render_line(line: &LogicalLine, lines: &mut Vec<String>) {
    lines.extend(line.trivia.iter().cloned());
    if line.is_synthesized() {
        lines.push(format!("{}{}", line.indent, render_tokens(&line.tokens)));
    } else {
        lines.extend(line.raw.iter().cloned());
    }
}

/// Joins tokens into a single line of code with conventional spacing.
pub fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut depth = 0usize;

    for (i, token) in tokens.iter().enumerate() {
        if i > 0 && needs_space(tokens, i, depth) {
            out.push(' ');
        }
        out.push_str(&token.text);
        if token.kind == TokenKind::Op {
            match token.text.as_str() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
    }
    out
}

fn is_word(token: &Token) -> bool {
    token.kind == TokenKind::Name && is_keyword(&token.text)
}

/// Whether the operator at `i` is used in prefix position.
fn is_prefix_op(tokens: &[Token], i: usize) -> bool {
    if !matches!(tokens[i].text.as_str(), "-" | "+" | "~" | "*" | "**") || tokens[i].kind != TokenKind::Op {
        return false;
    }
    match i.checked_sub(1).map(|p| &tokens[p]) {
        None => true,
        Some(prev) if prev.kind == TokenKind::Op => !matches!(prev.text.as_str(), ")" | "]" | "}"),
        Some(prev) => is_word(prev) && !matches!(prev.text.as_str(), "None" | "True" | "False"),
    }
}

fn needs_space(tokens: &[Token], i: usize, depth: usize) -> bool {
    let prev = &tokens[i - 1];
    let next = &tokens[i];

    if prev.kind == TokenKind::Op {
        match prev.text.as_str() {
            "(" | "[" | "{" | "." | "~" => return false,
            "@" if i == 1 => return false,
            "=" if depth > 0 => return false,
            _ if is_prefix_op(tokens, i - 1) => return false,
            _ => {}
        }
    }

    if next.kind == TokenKind::Op {
        match next.text.as_str() {
            ")" | "]" | "}" | "," | ":" | ";" => return false,
            "." => return prev.kind == TokenKind::Number || is_word(prev),
            "(" | "[" => return is_word(prev) || (prev.kind == TokenKind::Op && !closes(prev)),
            "=" if depth > 0 => return false,
            _ => {}
        }
    }

    true
}

fn closes(token: &Token) -> bool {
    token.kind == TokenKind::Op && matches!(token.text.as_str(), ")" | "]" | "}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::tokenize;

    fn round(src: &str) -> String {
        let lexed = tokenize(src).unwrap();
        render_tokens(&lexed.lines[0].tokens)
    }

    #[test]
    fn test_render_spacing() {
        assert_eq!(round("@lru_cache( maxsize = None )"), "@lru_cache(maxsize=None)");
        assert_eq!(round("from functools import lru_cache"), "from functools import lru_cache");
        assert_eq!(round("out=[f(x)for x in xs]"), "out = [f(x) for x in xs]");
        assert_eq!(round("y = -x ** 2"), "y = -x ** 2");
        assert_eq!(round("f(*args, **kw)"), "f(*args, **kw)");
        assert_eq!(round("a[i] . b"), "a[i].b");
        assert_eq!(round("x = 1 .real"), "x = 1 .real");
        assert_eq!(round("v = not (a)"), "v = not (a)");
    }
}
