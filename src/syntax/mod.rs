pub mod canonical;
pub mod lexer;
pub mod parser;
pub mod render;

pub use lexer::{LogicalLine, Token, TokenKind};
pub use parser::{Module, Stmt};
pub use canonical::canonical_form;
pub use render::render_tokens;

use crate::error::{EcaError, Result};

/// Source text together with its parsed statement tree.
///
/// A `SourceProgram` always parses: the only ways to build one are
/// [`SourceProgram::parse`] and [`SourceProgram::from_module`], and both
/// re-check the text. Rewrites never mutate a program in place; they
/// produce a new one.
#[derive(Debug, Clone)]
pub struct SourceProgram {
    text: String,
    module: Module,
}

impl SourceProgram {
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let module = parse(&text)?;
        Ok(Self { text, module })
    }

    /// Serializes a rewritten tree and re-parses the result.
    pub fn from_module(module: &Module) -> Result<Self> {
        Self::parse(serialize(module)?)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl PartialEq for SourceProgram {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

pub fn parse(source: &str) -> Result<Module> {
    parser::parse_module(source)
}

/// Renders a tree to text. Fails when the rendered text does not parse,
/// which only concerns the candidate being built.
pub fn serialize(module: &Module) -> Result<String> {
    let text = render::render_module(module);
    match parse(&text) {
        Ok(_) => Ok(text),
        Err(e) => Err(EcaError::Apply(format!("rendered source does not parse: {}", e))),
    }
}

/// Whether `name` can be used as a Python identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_');
    starts_well && chars.all(|c| c.is_alphanumeric() || c == '_') && !render::is_keyword(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_preserves_untouched_text() {
        let src = "# leading comment\nimport os\n\n\ndef f(x):\n    # inner\n    return   x  +  1\n\n# trailing\n";
        let program = SourceProgram::parse(src).unwrap();
        assert_eq!(serialize(program.module()).unwrap(), src);
    }

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("sum_squares"));
        assert!(is_identifier("_private2"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("lambda"));
        assert!(!is_identifier("f(x)"));
    }
}
