//! Dual-region configuration store.
//!
//! The live [`ConfigRecord`] is persisted to a primary region and, when the
//! primary fails to verify, to a backup region. Loading prefers the primary
//! and silently fails over to the backup; if neither is healthy the live
//! record is left untouched so the caller keeps its compiled-in defaults.
//!
//! # Save state machine
//!
//! ```text
//!   Unverified --primary reads back equal--> Verified
//!        |
//!        +------primary mismatch--> write backup --> FailedOverToBackup
//! ```

use moar_core::{ArgMethod, EnvelopeMode, FilterCurve};

use crate::error::ConfigError;
use crate::layout::{ENVELOPE_COUNT, RegionLayout, RegionRole};
use crate::record::{ConfigRecord, DEFAULT_ARG_PAIR, UNASSIGNED};
use crate::storage::NvStorage;

/// Outcome of [`ConfigStore::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    /// Primary written but not yet read back.
    Unverified,
    /// Primary read back equal to the live record.
    Verified,
    /// Primary failed to verify; the record went to the backup region.
    FailedOverToBackup,
}

/// Configuration store over a byte storage device.
///
/// # Example
///
/// ```rust
/// use moar_config::{ConfigStore, MemoryStorage, RegionRole, SaveState};
///
/// let mut store = ConfigStore::new(MemoryStorage::<512>::new(), 42).unwrap();
/// store.record_mut().set_cc_number(0, 74);
/// assert_eq!(store.save(), SaveState::Verified);
///
/// let mut reopened = ConfigStore::new(store.into_storage(), 42).unwrap();
/// assert_eq!(reopened.load(), Ok(RegionRole::Primary));
/// assert_eq!(reopened.record().cc_number(0), Some(74));
/// ```
#[derive(Debug)]
pub struct ConfigStore<S> {
    storage: S,
    layout: RegionLayout,
    record: ConfigRecord,
    save_state: SaveState,
}

impl<S: NvStorage> ConfigStore<S> {
    /// Opens a store for `channels` channels with a default live record.
    ///
    /// Nothing is read until [`load`](Self::load) is called.
    pub fn new(storage: S, channels: usize) -> Result<Self, ConfigError> {
        let record = ConfigRecord::defaults(channels)?;
        let layout = RegionLayout::new(channels);
        if storage.capacity() < layout.total_size() {
            return Err(ConfigError::StorageTooSmall {
                needed: layout.total_size(),
                capacity: storage.capacity(),
            });
        }
        Ok(Self {
            storage,
            layout,
            record,
            save_state: SaveState::Unverified,
        })
    }

    /// Live record.
    pub fn record(&self) -> &ConfigRecord {
        &self.record
    }

    /// Live record, for typed edits. Edits persist on the next save.
    pub fn record_mut(&mut self) -> &mut ConfigRecord {
        &mut self.record
    }

    /// Region layout in use.
    pub fn layout(&self) -> &RegionLayout {
        &self.layout
    }

    /// Underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Underlying storage, mutably. Writes through this bypass the store.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Consumes the store, returning its storage.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// True if `role`'s magic number matches the expected constant.
    pub fn check_health(&self, role: RegionRole) -> bool {
        self.storage.read_u16(self.layout.magic(role)) == role.magic()
    }

    /// Loads the live record from the first healthy region.
    ///
    /// Returns the region that supplied the data. On error the live record
    /// is unchanged.
    pub fn load(&mut self) -> Result<RegionRole, ConfigError> {
        for role in [RegionRole::Primary, RegionRole::Backup] {
            if !self.check_health(role) {
                #[cfg(feature = "tracing")]
                tracing::warn!(region = role.name(), "configuration region unhealthy");
                continue;
            }
            let mut record = self.read_region(role);
            #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
            let repaired = record.sanitize();
            #[cfg(feature = "tracing")]
            tracing::info!(region = role.name(), repaired, "configuration loaded");
            self.record = record;
            return Ok(role);
        }
        Err(ConfigError::NoHealthyRegion)
    }

    /// Saves the live record to the primary region and verifies it,
    /// failing over to the backup region if the read-back differs.
    pub fn save(&mut self) -> SaveState {
        self.save_state = SaveState::Unverified;
        self.write_region(RegionRole::Primary);
        self.save_state = if self.check_health(RegionRole::Primary)
            && self.read_region(RegionRole::Primary) == self.record
        {
            SaveState::Verified
        } else {
            #[cfg(feature = "tracing")]
            tracing::warn!("primary region failed verification, writing backup");
            // A primary that keeps its magic would shadow the backup on load.
            let magic = self.layout.magic(RegionRole::Primary);
            self.storage.update_u16(magic, !RegionRole::Primary.magic());
            self.write_backup();
            SaveState::FailedOverToBackup
        };
        #[cfg(feature = "tracing")]
        tracing::info!(state = ?self.save_state, "configuration saved");
        self.save_state
    }

    /// Outcome of the most recent save; `Unverified` before the first.
    pub fn save_state(&self) -> SaveState {
        self.save_state
    }

    /// Writes the live record to the backup region. Assumed to succeed.
    pub fn write_backup(&mut self) {
        self.write_region(RegionRole::Backup);
    }

    /// Replaces the live record with factory defaults and persists it to
    /// both regions.
    pub fn reset_to_defaults(&mut self) -> SaveState {
        let mut record = self.record.clone();
        record.reset_channel_mappings();
        record.clear_assignments();
        for index in 0..ENVELOPE_COUNT {
            record.set_curve(index, FilterCurve::default());
        }
        record.set_mode(EnvelopeMode::default());
        record.set_arg_method(ArgMethod::default());
        record.set_arg_pair(DEFAULT_ARG_PAIR.0, DEFAULT_ARG_PAIR.1);
        self.record = record;
        let state = self.save();
        if state == SaveState::Verified {
            self.write_backup();
        }
        state
    }

    /// Decodes `role`'s payload regardless of its health.
    ///
    /// Bytes that do not decode fall back to their defaults; channel bytes
    /// are returned raw so [`ConfigRecord::sanitize`] can report them.
    pub fn read_region(&self, role: RegionRole) -> ConfigRecord {
        let layout = &self.layout;
        let storage = &self.storage;
        let mut record = self.record.clone();

        let raw = record.raw_parts_mut();
        for (index, (output, cc)) in raw.outputs.iter_mut().zip(raw.ccs.iter_mut()).enumerate() {
            *output = storage.read(layout.output(role, index));
            *cc = storage.read(layout.cc(role, index));
        }
        for index in 0..layout.channel_count() {
            let byte = storage.read(layout.assignment(role, index));
            let envelope = (byte != UNASSIGNED && usize::from(byte) < ENVELOPE_COUNT).then_some(byte);
            record.set_envelope_for(index, envelope);
        }
        for index in 0..ENVELOPE_COUNT {
            let curve = FilterCurve::from_byte(storage.read(layout.curve(role, index)));
            record.set_curve(index, curve.unwrap_or_default());
        }
        record.set_led_brightness(storage.read(layout.brightness(role)));
        let color = layout.color(role);
        record.set_led_color([
            storage.read(color),
            storage.read(color + 1),
            storage.read(color + 2),
        ]);
        record.set_mode(EnvelopeMode::from_byte(storage.read(layout.mode(role))).unwrap_or_default());
        record.set_arg_method(
            ArgMethod::from_byte(storage.read(layout.arg_method(role))).unwrap_or_default(),
        );
        let pair = layout.arg_pair(role);
        if !record.set_arg_pair(storage.read(pair), storage.read(pair + 1)) {
            record.set_arg_pair(DEFAULT_ARG_PAIR.0, DEFAULT_ARG_PAIR.1);
        }
        record
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables, unused_assignments))]
    fn write_region(&mut self, role: RegionRole) {
        let layout = self.layout;
        let record = &self.record;
        let storage = &mut self.storage;
        let mut written = 0usize;

        for index in 0..layout.channel_count() {
            let output = record.output_channel(index).unwrap_or(1);
            let cc = record.cc_number(index).unwrap_or(0);
            let envelope = record.envelope_for(index).unwrap_or(UNASSIGNED);
            written += usize::from(storage.update(layout.output(role, index), output));
            written += usize::from(storage.update(layout.cc(role, index), cc));
            written += usize::from(storage.update(layout.assignment(role, index), envelope));
        }
        for index in 0..ENVELOPE_COUNT {
            let curve = record.curve(index).unwrap_or_default();
            written += usize::from(storage.update(layout.curve(role, index), curve.to_byte()));
        }
        written += usize::from(storage.update(layout.brightness(role), record.led_brightness()));
        for (offset, channel) in record.led_color().into_iter().enumerate() {
            written += usize::from(storage.update(layout.color(role) + offset, channel));
        }
        written += usize::from(storage.update(layout.mode(role), record.mode().to_byte()));
        written += usize::from(storage.update(layout.arg_method(role), record.arg_method().to_byte()));
        let (a, b) = record.arg_pair();
        written += usize::from(storage.update(layout.arg_pair(role), a));
        written += usize::from(storage.update(layout.arg_pair(role) + 1, b));
        written += usize::from(storage.update_u16(layout.magic(role), role.magic()));

        #[cfg(feature = "tracing")]
        tracing::debug!(region = role.name(), written, "region written");
    }
}
