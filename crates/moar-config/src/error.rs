//! Error types for configuration store operations.

use thiserror::Error;

/// Errors that can occur while opening or loading the configuration store.
///
/// Invalid field values are not errors: setters report a rejected value by
/// returning `false` and leave the record unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Channel count outside `1..=max`
    #[error("channel count {count} out of range (1..={max})")]
    ChannelCount {
        /// Requested channel count.
        count: usize,
        /// Largest supported channel count.
        max: usize,
    },

    /// Storage cannot hold both regions
    #[error("storage too small: layout needs {needed} bytes, device has {capacity}")]
    StorageTooSmall {
        /// Bytes required by the primary and backup regions.
        needed: usize,
        /// Bytes available on the device.
        capacity: usize,
    },

    /// Neither region carries a valid magic number
    #[error("no healthy configuration region")]
    NoHealthyRegion,
}
