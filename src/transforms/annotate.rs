use crate::error::{EcaError, Result};
use crate::syntax::lexer::tokenize;
use crate::syntax::{canonical_form, LogicalLine, Module, SourceProgram, Stmt, Token};
use std::collections::HashSet;

/// Prerequisite imports plus one decorator expression.
#[derive(Debug, Clone)]
pub struct AnnotationSpec {
    pub imports: Vec<Vec<Token>>,
    pub decorator: Vec<Token>,
}

impl AnnotationSpec {
    /// Reads a spec from text such as
    /// `"from functools import lru_cache\n@lru_cache(maxsize=None)"`.
    /// Lines starting with `import`/`from` are imports; the decorator may be
    /// written with or without its leading `@`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut imports = Vec::new();
        let mut decorator = None;

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let lexed = tokenize(line)?;
            let Some(logical) = lexed.lines.into_iter().next() else {
                continue;
            };
            let mut tokens = logical.tokens;
            let is_import = tokens
                .first()
                .is_some_and(|t| t.is_name("import") || t.is_name("from"));
            if is_import {
                imports.push(tokens);
            } else {
                if tokens.first().is_some_and(|t| t.is_op("@")) {
                    tokens.remove(0);
                }
                decorator = Some(tokens);
            }
        }

        match decorator {
            Some(decorator) if !decorator.is_empty() => Ok(Self { imports, decorator }),
            _ => Err(EcaError::Apply(format!("annotation spec has no decorator: {:?}", text))),
        }
    }

    pub fn lru_cache() -> Self {
        Self::builtin("from functools import lru_cache\n@lru_cache(maxsize=None)")
    }

    pub fn numba_njit() -> Self {
        Self::builtin("from numba import njit\n@njit")
    }

    fn builtin(text: &str) -> Self {
        Self::parse(text).unwrap_or_else(|_| Self { imports: Vec::new(), decorator: Vec::new() })
    }

    fn decorator_line(&self, indent: &str) -> LogicalLine {
        let mut tokens = vec![Token::op("@")];
        tokens.extend(self.decorator.iter().cloned());
        LogicalLine::synthesized(indent, tokens)
    }
}

fn decorator_key(line: &LogicalLine) -> String {
    canonical_form(line.tokens.get(1..).unwrap_or_default())
}

/// Attaches `spec` to every top-level `def fn_name`, inserting any missing
/// imports at the top of the module.
///
/// Returns `Ok(None)` when no such function exists. An identical decorator
/// already present counts as success and is not repeated.
pub fn add_annotation(program: &SourceProgram, fn_name: &str, spec: &AnnotationSpec) -> Result<Option<SourceProgram>> {
    if spec.decorator.is_empty() {
        return Ok(None);
    }
    let mut module = program.module().clone();

    let wanted = canonical_form(&spec.decorator);
    let mut matched = false;
    let mut changed = false;
    for stmt in module.body.iter_mut().filter(|s| s.function_name() == Some(fn_name)) {
        matched = true;
        if stmt.decorators.iter().any(|d| decorator_key(d) == wanted) {
            continue;
        }
        changed = true;
        let mut line = spec.decorator_line(&stmt.line.indent);
        // Keep comments and blank lines above the whole decorated block.
        match stmt.decorators.first_mut() {
            Some(first) => line.trivia = std::mem::take(&mut first.trivia),
            None => line.trivia = std::mem::take(&mut stmt.line.trivia),
        }
        stmt.decorators.insert(0, line);
    }
    if !matched {
        return Ok(None);
    }

    changed |= insert_imports(&mut module, &spec.imports);
    if !changed {
        return Ok(Some(program.clone()));
    }
    SourceProgram::from_module(&module).map(Some)
}

/// New imports go after a module docstring and any `__future__` imports.
/// Returns whether anything was inserted.
fn insert_imports(module: &mut Module, imports: &[Vec<Token>]) -> bool {
    let mut existing: HashSet<String> = module
        .body
        .iter()
        .filter(|s| s.is_import())
        .map(|s| canonical_form(s.tokens()))
        .collect();

    let missing: Vec<Stmt> = imports
        .iter()
        .filter(|tokens| existing.insert(canonical_form(tokens)))
        .map(|tokens| Stmt::simple(LogicalLine::synthesized("", tokens.clone())))
        .collect();
    if missing.is_empty() {
        return false;
    }

    let mut at = 0;
    if module.body.first().is_some_and(Stmt::is_docstring) {
        at = 1;
    }
    while module.body.get(at).is_some_and(Stmt::is_future_import) {
        at += 1;
    }

    let mut missing = missing;
    if let Some(next) = module.body.get_mut(at) {
        if at == 0 {
            if let Some(first) = missing.first_mut() {
                first.line.trivia = take_leading_trivia(next);
            }
        }
    }
    for (offset, stmt) in missing.into_iter().enumerate() {
        module.body.insert(at + offset, stmt);
    }
    true
}

/// Comments at the head of the first statement stay at the head of the file.
fn take_leading_trivia(stmt: &mut Stmt) -> Vec<String> {
    match stmt.decorators.first_mut() {
        Some(first) => std::mem::take(&mut first.trivia),
        None => std::mem::take(&mut stmt.line.trivia),
    }
}

/// Drops repeated top-level imports and repeated decorators on top-level
/// functions, keeping the first of each. Text that does not parse comes
/// back unchanged.
pub fn dedupe(source: &str) -> String {
    let Ok(program) = SourceProgram::parse(source) else {
        return source.to_string();
    };
    let mut module = program.module().clone();
    let mut changed = false;

    let mut seen_imports = HashSet::new();
    let mut kept = Vec::with_capacity(module.body.len());
    for mut stmt in std::mem::take(&mut module.body) {
        if stmt.is_import() && !seen_imports.insert(canonical_form(stmt.tokens())) {
            changed = true;
            continue;
        }
        if stmt.function_name().is_some() {
            let mut seen = HashSet::new();
            let before = stmt.decorators.len();
            stmt.decorators.retain(|d| seen.insert(decorator_key(d)));
            changed |= stmt.decorators.len() != before;
        }
        kept.push(stmt);
    }
    module.body = kept;

    if !changed {
        return source.to_string();
    }
    match SourceProgram::from_module(&module) {
        Ok(deduped) => deduped.into_text(),
        Err(e) => {
            log::warn!("dedupe produced unparsable output, keeping input: {}", e);
            source.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_parsing() {
        let spec = AnnotationSpec::lru_cache();
        assert_eq!(spec.imports.len(), 1);
        assert_eq!(spec.decorator[0].text, "lru_cache");

        let bare = AnnotationSpec::parse("lru_cache(maxsize=None)").unwrap();
        assert!(bare.imports.is_empty());
        assert_eq!(bare.decorator.len(), 6);

        assert!(AnnotationSpec::parse("import functools").is_err());
    }

    #[test]
    fn test_imports_go_after_docstring_and_future() {
        let src = "\"\"\"Module doc.\"\"\"\nfrom __future__ import annotations\n\ndef f(n):\n    return n\n";
        let program = SourceProgram::parse(src).unwrap();
        let out = add_annotation(&program, "f", &AnnotationSpec::lru_cache())
            .unwrap()
            .unwrap();
        let lines: Vec<&str> = out.text().lines().collect();
        assert_eq!(lines[0], "\"\"\"Module doc.\"\"\"");
        assert_eq!(lines[1], "from __future__ import annotations");
        assert_eq!(lines[2], "from functools import lru_cache");
        assert!(out.text().contains("@lru_cache(maxsize=None)\ndef f(n):"));
    }

    #[test]
    fn test_leading_comment_stays_on_top() {
        let src = "# top\ndef f(n):\n    return n\n";
        let program = SourceProgram::parse(src).unwrap();
        let out = add_annotation(&program, "f", &AnnotationSpec::lru_cache())
            .unwrap()
            .unwrap();
        assert!(out.text().starts_with("# top\nfrom functools import lru_cache\n"));
    }

    #[test]
    fn test_equivalent_spellings_are_not_duplicated() {
        let src = "from functools import (lru_cache)\n\n@lru_cache(maxsize = None, )\ndef f(n):\n    return n\n";
        let program = SourceProgram::parse(src).unwrap();
        let out = add_annotation(&program, "f", &AnnotationSpec::lru_cache())
            .unwrap()
            .unwrap();
        assert_eq!(out.text(), src);
    }

    #[test]
    fn test_dedupe_uses_structural_form() {
        let src = "import os\nimport os;\n\n@dec('a')\n@dec(\"a\")\ndef f():\n    return 1\n";
        let out = dedupe(src);
        assert_eq!(out, "import os\n\n@dec('a')\ndef f():\n    return 1\n");
    }
}
