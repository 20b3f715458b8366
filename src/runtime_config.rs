//! Environment-driven runtime configuration.
//!
//! `SWITCHYARD_STACK_SIZE` sets the coroutine stack size in bytes, decimal
//! or `0x` hex; default is 16 KB. Total memory is roughly
//! `stack_size × concurrent requests`, so tune it to the depth of your
//! guard chains and actions.

use std::env;

const DEFAULT_STACK_SIZE: usize = 0x4000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for request coroutines, in bytes.
    pub stack_size: usize,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let stack_size = match env::var("SWITCHYARD_STACK_SIZE") {
            Ok(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(DEFAULT_STACK_SIZE)
                } else {
                    val.parse().unwrap_or(DEFAULT_STACK_SIZE)
                }
            }
            Err(_) => DEFAULT_STACK_SIZE,
        };
        RuntimeConfig { stack_size }
    }

    /// Apply the configuration to the coroutine runtime; call once before
    /// the server starts.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        // other tests do not set the variable
        let cfg = RuntimeConfig::from_env();
        assert!(cfg.stack_size >= DEFAULT_STACK_SIZE);
    }
}
