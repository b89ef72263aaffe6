pub mod annotate;
pub mod capabilities;
pub mod loop_comp;
pub mod registry;
pub mod rule;

pub use annotate::{add_annotation, dedupe, AnnotationSpec};
pub use capabilities::Capabilities;
pub use loop_comp::rewrite_accumulation_loops;
pub use registry::TransformRegistry;
pub use rule::{AnnotateFunction, LoopToComprehension, NoOp, RuleKind, TransformRule};
