pub mod oracles;
pub mod profiler;
pub mod sandbox;
pub mod search;
