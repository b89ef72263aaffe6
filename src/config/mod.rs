pub mod manager;
pub mod profiler;
pub mod sandbox;
pub mod search;
pub mod target;
pub mod traits;

pub use manager::{AppConfig, ConfigManager};
pub use profiler::ProfilerConfig;
pub use sandbox::SandboxConfig;
pub use search::{SearchConfig, SearchMode};
pub use target::TargetConfig;
pub use traits::ConfigSection;
