/// Genome representation for transform search
///
/// A genome is a fixed-length sequence of indices into the
/// [`TransformRegistry`](crate::transforms::TransformRegistry). Materializing
/// a genome applies the named rules to the original program in order, so
/// `[1, 0, 3]` means "memoize, then nothing, then rewrite loops".
///
/// Any genome maps to a program: indices outside the registry and rules
/// that do not apply simply leave the program unchanged. That keeps
/// crossover and mutation free to splice and resample genes without
/// producing invalid individuals.
pub type Genome = Vec<usize>;
