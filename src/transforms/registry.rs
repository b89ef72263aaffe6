use super::capabilities::Capabilities;
use super::rule::{AnnotateFunction, LoopToComprehension, NoOp, RuleKind, TransformRule};
use crate::syntax::SourceProgram;
use crate::types::HotspotSet;
use std::sync::Arc;

/// The active rule set, in the fixed order that genome indices refer to.
pub struct TransformRegistry {
    rules: Vec<Arc<dyn TransformRule>>,
}

impl TransformRegistry {
    pub fn new(capabilities: &Capabilities) -> Self {
        let mut registry = Self { rules: Vec::new() };
        registry.register(Arc::new(NoOp));
        registry.register(Arc::new(AnnotateFunction::memoize()));
        if capabilities.native_compile {
            registry.register(Arc::new(AnnotateFunction::native_compile()));
        }
        registry.register(Arc::new(LoopToComprehension));
        registry
    }

    fn register(&mut self, rule: Arc<dyn TransformRule>) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<dyn TransformRule>> {
        self.rules.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn TransformRule>> {
        self.rules.iter()
    }

    pub fn contains(&self, kind: RuleKind) -> bool {
        self.rules.iter().any(|r| r.kind() == kind)
    }

    /// Applies the rules named by `genome` in order.
    ///
    /// Out-of-range indices and inapplicable rules leave the program as it
    /// is. With a hotspot set, memoization only targets a listed entry
    /// function and loop rewriting is skipped entirely.
    pub fn materialize(
        &self,
        original: &SourceProgram,
        fn_name: &str,
        genome: &[usize],
        hotspots: Option<&HotspotSet>,
    ) -> SourceProgram {
        let mut current = original.clone();
        for &gene in genome {
            let Some(rule) = self.rules.get(gene) else {
                continue;
            };
            let allowed = match rule.kind() {
                RuleKind::NoOp => false,
                RuleKind::MemoizeFunction => hotspots.map_or(true, |h| h.contains(fn_name)),
                RuleKind::LoopToComprehension => hotspots.is_none(),
                RuleKind::NativeCompile => true,
            };
            if !allowed {
                continue;
            }
            if let Some(next) = rule.apply(&current, fn_name) {
                current = next;
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Hotspot;

    const SRC: &str = "def f(xs):\n    out = []\n    for x in xs:\n        out.append(x)\n    return out\n";

    #[test]
    fn test_native_compile_depends_on_capability() {
        let without = TransformRegistry::new(&Capabilities::none());
        assert_eq!(without.len(), 3);
        assert!(!without.contains(RuleKind::NativeCompile));

        let with = TransformRegistry::new(&Capabilities::all());
        assert_eq!(with.len(), 4);
        assert_eq!(with.get(2).unwrap().kind(), RuleKind::NativeCompile);
    }

    #[test]
    fn test_materialize_applies_in_order() {
        let registry = TransformRegistry::new(&Capabilities::none());
        let original = SourceProgram::parse(SRC).unwrap();
        let out = registry.materialize(&original, "f", &[1, 0, 2], None);
        assert!(out.text().contains("@lru_cache(maxsize=None)"));
        assert!(out.text().contains("out = [x for x in xs]"));
    }

    #[test]
    fn test_materialize_respects_hotspots() {
        let registry = TransformRegistry::new(&Capabilities::none());
        let original = SourceProgram::parse(SRC).unwrap();

        let elsewhere = HotspotSet::new(vec![Hotspot::named("helper")]);
        let out = registry.materialize(&original, "f", &[1, 2], Some(&elsewhere));
        assert_eq!(out, original);

        let listed = HotspotSet::new(vec![Hotspot::named("f")]);
        let out = registry.materialize(&original, "f", &[1, 2], Some(&listed));
        assert!(out.text().contains("@lru_cache"));
        assert!(!out.text().contains("out = [x for x in xs]"));
    }

    #[test]
    fn test_out_of_range_genes_are_ignored() {
        let registry = TransformRegistry::new(&Capabilities::none());
        let original = SourceProgram::parse(SRC).unwrap();
        assert_eq!(registry.materialize(&original, "f", &[7, 99], None), original);
    }
}
