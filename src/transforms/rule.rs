use super::annotate::{add_annotation, AnnotationSpec};
use super::loop_comp::rewrite_accumulation_loops;
use crate::syntax::SourceProgram;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    NoOp,
    MemoizeFunction,
    NativeCompile,
    LoopToComprehension,
}

/// A named rewrite over a program.
pub trait TransformRule: Send + Sync {
    /// Short name used in variant reports
    fn name(&self) -> &'static str;

    fn kind(&self) -> RuleKind;

    /// Produces a new program, or `None` when the rule does not apply.
    /// Failures are absorbed here and reported as not applicable.
    fn apply(&self, program: &SourceProgram, fn_name: &str) -> Option<SourceProgram>;
}

pub struct NoOp;

impl TransformRule for NoOp {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::NoOp
    }

    fn apply(&self, program: &SourceProgram, _fn_name: &str) -> Option<SourceProgram> {
        Some(program.clone())
    }
}

/// Decorates the target function, pulling in the decorator's imports.
pub struct AnnotateFunction {
    name: &'static str,
    kind: RuleKind,
    spec: AnnotationSpec,
}

impl AnnotateFunction {
    pub fn memoize() -> Self {
        Self {
            name: "lru_cache",
            kind: RuleKind::MemoizeFunction,
            spec: AnnotationSpec::lru_cache(),
        }
    }

    pub fn native_compile() -> Self {
        Self {
            name: "numba_njit",
            kind: RuleKind::NativeCompile,
            spec: AnnotationSpec::numba_njit(),
        }
    }
}

impl TransformRule for AnnotateFunction {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> RuleKind {
        self.kind
    }

    fn apply(&self, program: &SourceProgram, fn_name: &str) -> Option<SourceProgram> {
        match add_annotation(program, fn_name, &self.spec) {
            Ok(result) => result,
            Err(e) => {
                log::debug!("{} not applicable to {}: {}", self.name, fn_name, e);
                None
            }
        }
    }
}

/// Accumulation loops become list comprehensions. Applies to every
/// function in the module, not only the target.
pub struct LoopToComprehension;

impl TransformRule for LoopToComprehension {
    fn name(&self) -> &'static str {
        "loop_to_comp"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::LoopToComprehension
    }

    fn apply(&self, program: &SourceProgram, _fn_name: &str) -> Option<SourceProgram> {
        match rewrite_accumulation_loops(program) {
            Ok(result) => result,
            Err(e) => {
                log::debug!("loop_to_comp not applicable: {}", e);
                None
            }
        }
    }
}
