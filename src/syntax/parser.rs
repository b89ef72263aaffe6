use super::lexer::{tokenize, LogicalLine, Token, TokenKind};
use crate::error::{EcaError, Result};

const BLOCK_KEYWORDS: [&str; 14] = [
    "if", "elif", "else", "for", "while", "try", "except", "finally", "with", "def", "class",
    "async", "match", "case",
];
const HARD_BLOCK_KEYWORDS: [&str; 11] = [
    "if", "elif", "else", "for", "while", "try", "except", "finally", "with", "def", "class",
];

/// A statement and the block it owns.
///
/// Clauses such as `else:` or `except:` are siblings of the statement they
/// continue, not children.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub decorators: Vec<LogicalLine>,
    pub line: LogicalLine,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Default)]
pub struct Module {
    pub body: Vec<Stmt>,
    pub trailing: Vec<String>,
}

impl Stmt {
    pub fn simple(line: LogicalLine) -> Self {
        Self { decorators: Vec::new(), line, body: Vec::new() }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.line.tokens
    }

    pub fn keyword(&self) -> Option<&str> {
        self.line
            .first()
            .filter(|t| t.kind == TokenKind::Name)
            .map(|t| t.text.as_str())
    }

    /// Name of a plain (non-async) `def`.
    pub fn function_name(&self) -> Option<&str> {
        match self.tokens() {
            [def, name, ..] if def.is_name("def") && name.kind == TokenKind::Name => {
                Some(name.text.as_str())
            }
            _ => None,
        }
    }

    pub fn is_import(&self) -> bool {
        matches!(self.keyword(), Some("import") | Some("from"))
    }

    pub fn is_future_import(&self) -> bool {
        matches!(self.tokens(), [from, module, ..] if from.is_name("from") && module.is_name("__future__"))
    }

    pub fn is_docstring(&self) -> bool {
        matches!(self.tokens(), [only] if only.kind == TokenKind::Str)
    }

    pub fn opens_block(&self) -> bool {
        self.tokens().last().is_some_and(|t| t.is_op(":"))
    }
}

/// Index of each token at bracket depth zero that satisfies `pred`.
pub fn top_level_positions(tokens: &[Token], pred: impl Fn(&Token) -> bool) -> Vec<usize> {
    let mut depth = 0usize;
    let mut found = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if token.kind == TokenKind::Op {
            match token.text.as_str() {
                "(" | "[" | "{" => {
                    depth += 1;
                    continue;
                }
                ")" | "]" | "}" => {
                    depth = depth.saturating_sub(1);
                    continue;
                }
                _ => {}
            }
        }
        if depth == 0 && pred(token) {
            found.push(i);
        }
    }
    found
}

pub fn parse_module(source: &str) -> Result<Module> {
    let lexed = tokenize(source)?;
    let lines = lexed.lines;
    let mut pos = 0;
    let body = parse_block(&lines, &mut pos, 0)?;
    if let Some(line) = lines.get(pos) {
        return Err(EcaError::parse(line.line_no, "unindent does not match any outer indentation level"));
    }
    Ok(Module { body, trailing: lexed.trailing })
}

fn parse_block(lines: &[LogicalLine], pos: &mut usize, indent: usize) -> Result<Vec<Stmt>> {
    let mut stmts = Vec::new();

    while let Some(line) = lines.get(*pos) {
        let width = line.indent_width();
        if width < indent {
            break;
        }
        if width > indent {
            return Err(EcaError::parse(line.line_no, "unexpected indent"));
        }

        let mut decorators = Vec::new();
        while lines.get(*pos).is_some_and(|l| l.first().is_some_and(|t| t.is_op("@"))) {
            decorators.push(lines[*pos].clone());
            *pos += 1;
            let follows = lines.get(*pos).filter(|l| l.indent_width() == indent);
            if follows.is_none() {
                return Err(EcaError::parse(line.line_no, "decorator is not followed by a definition"));
            }
        }

        let line = lines[*pos].clone();
        *pos += 1;
        if !decorators.is_empty() && !is_definition(&line) {
            return Err(EcaError::parse(line.line_no, "decorator is not followed by a definition"));
        }
        check_header(&line)?;

        let mut stmt = Stmt { decorators, line, body: Vec::new() };
        if stmt.opens_block() {
            let child_indent = match lines.get(*pos) {
                Some(next) if next.indent_width() > indent => next.indent_width(),
                _ => {
                    return Err(EcaError::parse(stmt.line.line_no, "expected an indented block"));
                }
            };
            stmt.body = parse_block(lines, pos, child_indent)?;
            if let Some(next) = lines.get(*pos) {
                if next.indent_width() > indent {
                    return Err(EcaError::parse(
                        next.line_no,
                        "unindent does not match any outer indentation level",
                    ));
                }
            }
        }
        stmts.push(stmt);
    }

    Ok(stmts)
}

fn is_definition(line: &LogicalLine) -> bool {
    match line.tokens.as_slice() {
        [first, ..] if first.is_name("def") || first.is_name("class") => true,
        [first, second, ..] => first.is_name("async") && second.is_name("def"),
        _ => false,
    }
}

/// Compound statement headers must carry a top-level colon; a trailing
/// colon is only legal on a compound statement.
fn check_header(line: &LogicalLine) -> Result<()> {
    let Some(first) = line.first() else {
        return Ok(());
    };
    let colons = top_level_positions(&line.tokens, |t| t.is_op(":"));
    let hard = first.kind == TokenKind::Name && HARD_BLOCK_KEYWORDS.contains(&first.text.as_str());
    if hard && colons.is_empty() {
        return Err(EcaError::parse(line.line_no, "expected ':'"));
    }
    let trailing_colon = line.tokens.last().is_some_and(|t| t.is_op(":"));
    let soft = first.kind == TokenKind::Name && BLOCK_KEYWORDS.contains(&first.text.as_str());
    if trailing_colon && !soft {
        return Err(EcaError::parse(line.line_no, "invalid syntax"));
    }
    if first.is_name("def") {
        let well_formed = matches!(
            line.tokens.as_slice(),
            [_, name, paren, ..] if name.kind == TokenKind::Name && paren.is_op("(")
        );
        if !well_formed {
            return Err(EcaError::parse(line.line_no, "malformed function definition"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_blocks() {
        let src = "import os\n\ndef f(xs):\n    out = []\n    for x in xs:\n        out.append(x)\n    return out\n";
        let module = parse_module(src).unwrap();
        assert_eq!(module.body.len(), 2);
        assert!(module.body[0].is_import());
        let def = &module.body[1];
        assert_eq!(def.function_name(), Some("f"));
        assert_eq!(def.body.len(), 3);
        assert_eq!(def.body[1].body.len(), 1);
    }

    #[test]
    fn test_decorators_attach_to_definition() {
        let src = "@a\n@b(1)\ndef g():\n    pass\n";
        let module = parse_module(src).unwrap();
        assert_eq!(module.body.len(), 1);
        assert_eq!(module.body[0].decorators.len(), 2);
    }

    #[test]
    fn test_else_clause_is_sibling() {
        let src = "def f(x):\n    if x:\n        return 1\n    else:\n        return 2\n";
        let module = parse_module(src).unwrap();
        let body = &module.body[0].body;
        assert_eq!(body.len(), 2);
        assert_eq!(body[1].keyword(), Some("else"));
    }

    #[test]
    fn test_inline_block_is_simple() {
        let module = parse_module("for x in y: print(x)\n").unwrap();
        assert!(!module.body[0].opens_block());
        assert!(module.body[0].body.is_empty());
    }

    #[test]
    fn test_indentation_errors() {
        assert!(parse_module("  x = 1\n").is_err());
        assert!(parse_module("def f():\nreturn 1\n").is_err());
        assert!(parse_module("def f():\n        x = 1\n    return x\n").is_err());
        assert!(parse_module("if x:\n    pass\n  y = 2\n").is_err());
    }

    #[test]
    fn test_header_errors() {
        assert!(parse_module("def f()\n    return 1\n").is_err());
        assert!(parse_module("x = 1:\n    pass\n").is_err());
        assert!(parse_module("@deco\nx = 1\n").is_err());
        assert!(parse_module("def (x):\n    pass\n").is_err());
    }

    #[test]
    fn test_top_level_positions_skip_brackets() {
        let module = parse_module("a = f(b, c), d\n").unwrap();
        let commas = top_level_positions(module.body[0].tokens(), |t| t.is_op(","));
        assert_eq!(commas, vec![8]);
    }
}
