//! # Render Thread Configuration
//!
//! Loaded once at startup, either built in code or parsed from TOML:
//!
//! ```toml
//! max_commands_per_frame = 4096
//! max_command_bytes_per_frame = 4194304
//! wait_on_submit = true
//! ```
//!
//! Missing keys take their defaults. A zero capacity also means "default".

use std::path::Path;

use serde::Deserialize;

use crate::error::{RenderQueueError, RenderQueueResult};

/// Commands a packet holds when the config leaves it at zero.
pub const DEFAULT_MAX_COMMANDS_PER_FRAME: u32 = 4096;

/// Payload bytes a packet holds when the config leaves it at zero.
pub const DEFAULT_MAX_COMMAND_BYTES_PER_FRAME: u32 = 4 * 1024 * 1024;

/// Configuration for the render thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderThreadConfig {
    /// Maximum commands recorded into one frame packet.
    pub max_commands_per_frame: u32,
    /// Maximum payload and blob bytes recorded into one frame packet.
    pub max_command_bytes_per_frame: u32,
    /// Block in `submit_frame` until the frame has been presented.
    pub wait_on_submit: bool,
}

impl Default for RenderThreadConfig {
    fn default() -> Self {
        Self {
            max_commands_per_frame: DEFAULT_MAX_COMMANDS_PER_FRAME,
            max_command_bytes_per_frame: DEFAULT_MAX_COMMAND_BYTES_PER_FRAME,
            wait_on_submit: true,
        }
    }
}

impl RenderThreadConfig {
    /// Pipelined pacing: submit returns as soon as the frame is queued.
    ///
    /// The game thread records frame N+1 while frame N presents.
    #[must_use]
    pub fn pipelined() -> Self {
        Self {
            wait_on_submit: false,
            ..Self::default()
        }
    }

    /// Sets both per-frame packet limits.
    #[must_use]
    pub fn with_capacity(mut self, max_commands: u32, max_bytes: u32) -> Self {
        self.max_commands_per_frame = max_commands;
        self.max_command_bytes_per_frame = max_bytes;
        self
    }

    /// Sets whether `submit_frame` waits for presentation.
    #[must_use]
    pub fn with_wait_on_submit(mut self, wait: bool) -> Self {
        self.wait_on_submit = wait;
        self
    }

    /// Replaces zero capacities with the defaults.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            max_commands_per_frame: if self.max_commands_per_frame == 0 {
                DEFAULT_MAX_COMMANDS_PER_FRAME
            } else {
                self.max_commands_per_frame
            },
            max_command_bytes_per_frame: if self.max_command_bytes_per_frame == 0 {
                DEFAULT_MAX_COMMAND_BYTES_PER_FRAME
            } else {
                self.max_command_bytes_per_frame
            },
            wait_on_submit: self.wait_on_submit,
        }
    }

    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`RenderQueueError::InvalidConfig`] on malformed input or
    /// unknown keys.
    pub fn from_toml_str(text: &str) -> RenderQueueResult<Self> {
        toml::from_str(text).map_err(|e| RenderQueueError::InvalidConfig(e.to_string()))
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`RenderQueueError::InvalidConfig`] if the file cannot be read
    /// or parsed.
    pub fn from_toml_file(path: impl AsRef<Path>) -> RenderQueueResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            RenderQueueError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RenderThreadConfig::default();
        assert_eq!(config.max_commands_per_frame, 4096);
        assert_eq!(config.max_command_bytes_per_frame, 4 * 1024 * 1024);
        assert!(config.wait_on_submit);
        assert!(!RenderThreadConfig::pipelined().wait_on_submit);
    }

    #[test]
    fn test_zero_means_default() {
        let config = RenderThreadConfig::default()
            .with_capacity(0, 128)
            .normalized();
        assert_eq!(config.max_commands_per_frame, DEFAULT_MAX_COMMANDS_PER_FRAME);
        assert_eq!(config.max_command_bytes_per_frame, 128);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = RenderThreadConfig::from_toml_str(
            "max_commands_per_frame = 2\nwait_on_submit = false\n",
        )
        .unwrap();
        assert_eq!(config.max_commands_per_frame, 2);
        assert_eq!(
            config.max_command_bytes_per_frame,
            DEFAULT_MAX_COMMAND_BYTES_PER_FRAME
        );
        assert!(!config.wait_on_submit);
    }

    #[test]
    fn test_from_toml_rejects_unknown_keys() {
        let err = RenderThreadConfig::from_toml_str("frames_in_flight = 3\n").unwrap_err();
        assert!(matches!(err, RenderQueueError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_missing_file() {
        let err = RenderThreadConfig::from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, RenderQueueError::InvalidConfig(msg) if msg.contains("failed to read")));
    }
}
