use crate::engines::sandbox::{Driver, Sandbox};
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Optional features of the host interpreter, detected once per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub native_compile: bool,
}

impl Capabilities {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self { native_compile: true }
    }

    pub fn detect(sandbox: &Sandbox) -> Self {
        let native_compile = module_importable(sandbox, "numba");
        log::info!("Interpreter capabilities: native_compile={}", native_compile);
        Self { native_compile }
    }
}

fn module_importable(sandbox: &Sandbox, module: &str) -> bool {
    match sandbox.execute("", &Driver::Import { module }, PROBE_TIMEOUT) {
        Ok(result) => result.succeeded(),
        Err(e) => {
            log::warn!("Could not check for module {}: {}", module, e);
            false
        }
    }
}
