//! Fixed byte layout of the two configuration regions.
//!
//! Each region is laid out as:
//!
//! ```text
//! outputs[n] | cc[n] | assignments[n] | curves[E] | brightness | color[3]
//!   | mode | arg_method | pair_a | pair_b | magic (u16, little-endian)
//! ```
//!
//! where `n` is the channel count and `E` is [`ENVELOPE_COUNT`]. The backup
//! region starts [`RESERVE`] bytes after the end of the primary.

/// Largest supported channel count.
pub const MAX_CHANNELS: usize = 64;

/// Number of envelope processors persisted per record.
pub const ENVELOPE_COUNT: usize = 6;

/// First byte of the primary region.
pub const PRIMARY_BASE: usize = 0;

/// Gap between the primary and backup regions.
pub const RESERVE: usize = 16;

/// Layout version stored in the low byte of each magic number.
pub const SCHEMA_VERSION: u8 = 1;

/// Magic number of a healthy primary region.
pub const PRIMARY_MAGIC: u16 = 0x4D00 | SCHEMA_VERSION as u16;

/// Magic number of a healthy backup region.
pub const BACKUP_MAGIC: u16 = 0x4200 | SCHEMA_VERSION as u16;

/// Bytes of global settings after the per-channel and per-envelope arrays.
const GLOBAL_BYTES: usize = 1 + 3 + 1 + 1 + 2;

/// Which copy of the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionRole {
    /// Written first on every save.
    Primary,
    /// Written when the primary fails to verify.
    Backup,
}

impl RegionRole {
    /// Magic number expected for this role.
    pub const fn magic(self) -> u16 {
        match self {
            Self::Primary => PRIMARY_MAGIC,
            Self::Backup => BACKUP_MAGIC,
        }
    }

    /// Lowercase name for logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Backup => "backup",
        }
    }
}

/// Address calculator for a given channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionLayout {
    channels: usize,
}

impl RegionLayout {
    /// Creates a layout for `channels` channels. Callers validate the count.
    pub const fn new(channels: usize) -> Self {
        Self { channels }
    }

    /// Channel count this layout was built for.
    pub const fn channel_count(&self) -> usize {
        self.channels
    }

    /// Size of the record payload, excluding the magic number.
    pub const fn payload_size(&self) -> usize {
        3 * self.channels + ENVELOPE_COUNT + GLOBAL_BYTES
    }

    /// Size of one region including its magic number.
    pub const fn region_size(&self) -> usize {
        self.payload_size() + 2
    }

    /// Bytes needed for both regions.
    pub const fn total_size(&self) -> usize {
        self.base(RegionRole::Backup) + self.region_size()
    }

    /// First byte of `role`'s region.
    pub const fn base(&self, role: RegionRole) -> usize {
        match role {
            RegionRole::Primary => PRIMARY_BASE,
            RegionRole::Backup => PRIMARY_BASE + self.region_size() + RESERVE,
        }
    }

    /// Address of channel `index`'s output channel.
    pub const fn output(&self, role: RegionRole, index: usize) -> usize {
        self.base(role) + index
    }

    /// Address of channel `index`'s CC number.
    pub const fn cc(&self, role: RegionRole, index: usize) -> usize {
        self.base(role) + self.channels + index
    }

    /// Address of channel `index`'s envelope assignment.
    pub const fn assignment(&self, role: RegionRole, index: usize) -> usize {
        self.base(role) + 2 * self.channels + index
    }

    /// Address of envelope `index`'s filter curve.
    pub const fn curve(&self, role: RegionRole, index: usize) -> usize {
        self.base(role) + 3 * self.channels + index
    }

    /// Address of the LED brightness byte.
    pub const fn brightness(&self, role: RegionRole) -> usize {
        self.curve(role, ENVELOPE_COUNT)
    }

    /// Address of the first of three LED colour bytes.
    pub const fn color(&self, role: RegionRole) -> usize {
        self.brightness(role) + 1
    }

    /// Address of the envelope mode byte.
    pub const fn mode(&self, role: RegionRole) -> usize {
        self.color(role) + 3
    }

    /// Address of the ARG method byte.
    pub const fn arg_method(&self, role: RegionRole) -> usize {
        self.mode(role) + 1
    }

    /// Address of the ARG pair bytes (A then B).
    pub const fn arg_pair(&self, role: RegionRole) -> usize {
        self.arg_method(role) + 1
    }

    /// Address of the region's magic number.
    pub const fn magic(&self, role: RegionRole) -> usize {
        self.base(role) + self.payload_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_for_reference_device() {
        let layout = RegionLayout::new(42);
        assert_eq!(layout.payload_size(), 126 + 6 + 8);
        assert_eq!(layout.region_size(), 142);
        assert_eq!(layout.base(RegionRole::Backup), 158);
        assert_eq!(layout.total_size(), 300);
    }

    #[test]
    fn test_fields_are_contiguous() {
        let layout = RegionLayout::new(4);
        let role = RegionRole::Primary;
        assert_eq!(layout.output(role, 0), 0);
        assert_eq!(layout.cc(role, 0), 4);
        assert_eq!(layout.assignment(role, 0), 8);
        assert_eq!(layout.curve(role, 0), 12);
        assert_eq!(layout.brightness(role), 18);
        assert_eq!(layout.color(role), 19);
        assert_eq!(layout.mode(role), 22);
        assert_eq!(layout.arg_method(role), 23);
        assert_eq!(layout.arg_pair(role), 24);
        assert_eq!(layout.magic(role), 26);
        assert_eq!(layout.magic(role) + 2, layout.region_size());
    }

    #[test]
    fn test_regions_disjoint() {
        let layout = RegionLayout::new(64);
        let primary_end = layout.base(RegionRole::Primary) + layout.region_size();
        assert!(primary_end <= layout.base(RegionRole::Backup));
        assert_eq!(layout.output(RegionRole::Backup, 0), layout.base(RegionRole::Backup));
    }

    #[test]
    fn test_magic_carries_schema() {
        assert_eq!(PRIMARY_MAGIC & 0xFF, u16::from(SCHEMA_VERSION));
        assert_eq!(BACKUP_MAGIC & 0xFF, u16::from(SCHEMA_VERSION));
        assert_ne!(RegionRole::Primary.magic(), RegionRole::Backup.magic());
    }
}
