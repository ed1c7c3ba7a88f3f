//! Non-volatile configuration storage for the moar controller.
//!
//! Persists channel mappings, envelope assignments, LED settings and the
//! global envelope selection to a wear-limited byte device, with a primary
//! and a backup copy.
//!
//! # Features
//!
//! - **Redundancy**: Primary/backup regions with magic-number health checks
//! - **Verified saves**: Read-back verification with backup failover
//! - **Wear-aware writes**: Every byte goes through [`NvStorage::update`]
//! - **Schema versioning**: The magic low byte carries [`SCHEMA_VERSION`]
//! - **no_std**: Fixed-capacity record via `heapless`
//!
//! # Example
//!
//! ```rust
//! use moar_config::{ConfigError, ConfigStore, MemoryStorage};
//!
//! let mut store = ConfigStore::new(MemoryStorage::<512>::new(), 42).unwrap();
//! match store.load() {
//!     Ok(region) => println!("loaded from {}", region.name()),
//!     // Erased device: keep the defaults and write them out.
//!     Err(ConfigError::NoHealthyRegion) => {
//!         store.save();
//!     }
//!     Err(other) => panic!("{other}"),
//! }
//! assert_eq!(store.record().output_channel(0), Some(1));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

mod error;
mod record;
mod store;

/// Region geometry and magic numbers.
pub mod layout;

/// Byte storage trait and RAM implementation.
pub mod storage;

pub use error::ConfigError;
pub use layout::{
    BACKUP_MAGIC, ENVELOPE_COUNT, MAX_CHANNELS, PRIMARY_MAGIC, RegionLayout, RegionRole,
    SCHEMA_VERSION,
};
pub use record::{
    ConfigRecord, DEFAULT_ARG_PAIR, DEFAULT_BRIGHTNESS, DEFAULT_COLOR, MAX_CC, MIDI_CHANNELS,
    UNASSIGNED,
};
pub use storage::{ERASED, MemoryStorage, NvStorage};
pub use store::{ConfigStore, SaveState};
