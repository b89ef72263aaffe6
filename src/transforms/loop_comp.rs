use crate::error::Result;
use crate::syntax::parser::top_level_positions;
use crate::syntax::{LogicalLine, SourceProgram, Stmt, Token, TokenKind};

/// Rewrites every
///
/// ```text
/// out = []
/// for x in xs:
///     out.append(f(x))
/// ```
///
/// found directly in a function body into `out = [f(x) for x in xs]`.
/// Returns `Ok(None)` when nothing matched.
pub fn rewrite_accumulation_loops(program: &SourceProgram) -> Result<Option<SourceProgram>> {
    let mut module = program.module().clone();
    let mut changed = false;
    for stmt in module.body.iter_mut() {
        changed |= visit(stmt);
    }
    if !changed {
        return Ok(None);
    }
    let rewritten = SourceProgram::from_module(&module)?;
    if rewritten.text() == program.text() {
        return Ok(None);
    }
    Ok(Some(rewritten))
}

fn visit(stmt: &mut Stmt) -> bool {
    let mut changed = false;
    for child in stmt.body.iter_mut() {
        changed |= visit(child);
    }
    if stmt.function_name().is_some() && stmt.opens_block() {
        changed |= rewrite_body(&mut stmt.body);
    }
    changed
}

fn rewrite_body(body: &mut Vec<Stmt>) -> bool {
    let old = std::mem::take(body);
    let mut changed = false;
    let mut i = 0;

    while i < old.len() {
        let followed_by_else = old.get(i + 2).is_some_and(|s| s.keyword() == Some("else"));
        let comprehension = match (empty_list_target(&old[i]), old.get(i + 1)) {
            (Some(target), Some(next)) if !followed_by_else => build_comprehension(target, &old[i], next),
            _ => None,
        };
        match comprehension {
            Some(stmt) => {
                body.push(stmt);
                changed = true;
                i += 2;
            }
            None => {
                body.push(old[i].clone());
                i += 1;
            }
        }
    }
    changed
}

/// `N = []` yields `N`.
fn empty_list_target(stmt: &Stmt) -> Option<&str> {
    match stmt.tokens() {
        [name, eq, open, close]
            if name.kind == TokenKind::Name
                && eq.is_op("=")
                && open.is_op("[")
                && close.is_op("]") =>
        {
            Some(name.text.as_str())
        }
        _ => None,
    }
}

fn build_comprehension(target: &str, assign: &Stmt, loop_stmt: &Stmt) -> Option<Stmt> {
    let tokens = loop_stmt.tokens();
    if !tokens.first().is_some_and(|t| t.is_name("for")) {
        return None;
    }
    let in_at = *top_level_positions(tokens, |t| t.is_name("in")).first()?;
    let colon_at = top_level_positions(tokens, |t| t.is_op(":"))
        .into_iter()
        .find(|&c| c > in_at)?;

    let statement: &[Token] = if loop_stmt.opens_block() {
        match loop_stmt.body.as_slice() {
            [only] if only.body.is_empty() && only.decorators.is_empty() => only.tokens(),
            _ => return None,
        }
    } else {
        &tokens[colon_at + 1..]
    };

    let element = appended_element(target, statement)?;
    let loop_target = &tokens[1..in_at];
    let iterable = &tokens[in_at + 1..colon_at];
    if loop_target.is_empty() || iterable.is_empty() {
        return None;
    }
    if [element, iterable].iter().any(|part| part.iter().any(|t| t.is_name("yield") || t.is_op(":="))) {
        return None;
    }

    let mut comp = vec![Token::name(target), Token::op("="), Token::op("[")];
    let element_needs_parens = !top_level_positions(element, |t| t.is_name("for") || t.is_name("lambda")).is_empty();
    push_grouped(&mut comp, element, element_needs_parens);
    comp.push(Token::name("for"));
    comp.extend(loop_target.iter().cloned());
    comp.push(Token::name("in"));
    let iterable_needs_parens = !top_level_positions(iterable, |t| {
        t.is_op(",") || t.is_name("if") || t.is_name("lambda")
    })
    .is_empty();
    push_grouped(&mut comp, iterable, iterable_needs_parens);
    comp.push(Token::op("]"));

    let mut line = LogicalLine::synthesized(assign.line.indent.clone(), comp);
    line.trivia = assign.line.trivia.clone();
    line.trivia.extend(loop_stmt.line.trivia.iter().cloned());
    Some(Stmt::simple(line))
}

/// `N.append(E)` with exactly one positional argument yields `E`.
fn appended_element<'a>(target: &str, tokens: &'a [Token]) -> Option<&'a [Token]> {
    let [name, dot, method, open, rest @ ..] = tokens else {
        return None;
    };
    let matches_call = name.is_name(target) && dot.is_op(".") && method.is_name("append") && open.is_op("(");
    let (close, args) = rest.split_last()?;
    if !matches_call || !close.is_op(")") {
        return None;
    }
    // The opening paren must be the one closed by the final token.
    let mut depth = 0usize;
    for token in args {
        if token.is_op("(") || token.is_op("[") || token.is_op("{") {
            depth += 1;
        } else if token.is_op(")") || token.is_op("]") || token.is_op("}") {
            depth = depth.checked_sub(1)?;
        }
    }
    if depth != 0 {
        return None;
    }

    let args = match args.split_last() {
        Some((last, init)) if last.is_op(",") => init,
        _ => args,
    };
    let first = args.first()?;
    if first.is_op("*") || first.is_op("**") {
        return None;
    }
    let keyword = first.kind == TokenKind::Name && args.get(1).is_some_and(|t| t.is_op("="));
    if keyword || !top_level_positions(args, |t| t.is_op(",")).is_empty() {
        return None;
    }
    Some(args)
}

fn push_grouped(out: &mut Vec<Token>, part: &[Token], parens: bool) {
    if parens {
        out.push(Token::op("("));
    }
    out.extend(part.iter().cloned());
    if parens {
        out.push(Token::op(")"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(src: &str) -> Option<String> {
        let program = SourceProgram::parse(src).unwrap();
        rewrite_accumulation_loops(&program)
            .unwrap()
            .map(SourceProgram::into_text)
    }

    #[test]
    fn test_appended_element_forms() {
        let lexed = crate::syntax::lexer::tokenize("out.append(f(x, y))").unwrap();
        let element = appended_element("out", &lexed.lines[0].tokens).unwrap();
        assert_eq!(element.len(), 6);

        let lexed = crate::syntax::lexer::tokenize("out.append(a, b)").unwrap();
        assert!(appended_element("out", &lexed.lines[0].tokens).is_none());

        let lexed = crate::syntax::lexer::tokenize("out.append(key=1)").unwrap();
        assert!(appended_element("out", &lexed.lines[0].tokens).is_none());

        let lexed = crate::syntax::lexer::tokenize("out.append(a)(b)").unwrap();
        assert!(appended_element("out", &lexed.lines[0].tokens).is_none());

        let lexed = crate::syntax::lexer::tokenize("out.append(lambda y=x: y)").unwrap();
        assert_eq!(appended_element("out", &lexed.lines[0].tokens).map(|e| e.len()), Some(6));

        let lexed = crate::syntax::lexer::tokenize("out.append(g(k=x))").unwrap();
        assert!(appended_element("out", &lexed.lines[0].tokens).is_some());
    }

    #[test]
    fn test_lambda_with_default_is_rewritten() {
        let src = "def f(xs):\n    out = []\n    for x in xs:\n        out.append(lambda y=x: y)\n    return out\n";
        assert_eq!(
            rewrite(src).unwrap(),
            "def f(xs):\n    out = [(lambda y=x: y) for x in xs]\n    return out\n"
        );
    }

    #[test]
    fn test_inline_loop_body() {
        let src = "def f(xs):\n    out = []\n    for x in xs: out.append(x + 1)\n    return out\n";
        assert_eq!(
            rewrite(src).unwrap(),
            "def f(xs):\n    out = [x + 1 for x in xs]\n    return out\n"
        );
    }

    #[test]
    fn test_tuple_iterable_is_parenthesized() {
        let src = "def f(a, b):\n    out = []\n    for x in a, b:\n        out.append(x)\n    return out\n";
        assert!(rewrite(src).unwrap().contains("out = [x for x in (a, b)]"));
    }

    #[test]
    fn test_for_else_is_left_alone() {
        let src = "def f(xs):\n    out = []\n    for x in xs:\n        out.append(x)\n    else:\n        out = None\n    return out\n";
        assert!(rewrite(src).is_none());
    }

    #[test]
    fn test_module_level_loop_is_left_alone() {
        let src = "out = []\nfor x in range(3):\n    out.append(x)\n";
        assert!(rewrite(src).is_none());
    }

    #[test]
    fn test_method_bodies_are_rewritten() {
        let src = "class A:\n    def m(self, xs):\n        acc = []\n        for x in xs:\n            acc.append(x * 2)\n        return acc\n";
        assert!(rewrite(src).unwrap().contains("        acc = [x * 2 for x in xs]\n"));
    }
}
