//! File-backed EEPROM images.
//!
//! An image is the raw byte content of the controller's EEPROM. It is held
//! in memory while the controller or an image command works on it and
//! written back in one go.

use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use moar_config::{ERASED, NvStorage};

/// In-memory copy of an EEPROM image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageStorage {
    bytes: Vec<u8>,
}

impl ImageStorage {
    /// A blank image of `capacity` erased bytes.
    pub fn erased(capacity: usize) -> Self {
        Self {
            bytes: vec![ERASED; capacity],
        }
    }

    /// Reads an image file. It must hold exactly `capacity` bytes.
    pub fn open(path: &Path, capacity: usize) -> anyhow::Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("reading image {}", path.display()))?;
        if bytes.len() != capacity {
            bail!(
                "image {} is {} bytes, expected {}",
                path.display(),
                bytes.len(),
                capacity
            );
        }
        Ok(Self { bytes })
    }

    /// Writes the image to `path`.
    pub fn persist(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, &self.bytes).with_context(|| format!("writing image {}", path.display()))
    }

    /// Inverts every bit of the byte at `address`.
    pub fn flip(&mut self, address: usize) -> anyhow::Result<()> {
        let Some(byte) = self.bytes.get_mut(address) else {
            bail!("address {address} outside image of {} bytes", self.bytes.len());
        };
        *byte = !*byte;
        Ok(())
    }
}

impl NvStorage for ImageStorage {
    fn capacity(&self) -> usize {
        self.bytes.len()
    }

    fn read(&self, address: usize) -> u8 {
        self.bytes.get(address).copied().unwrap_or(ERASED)
    }

    fn write(&mut self, address: usize, value: u8) {
        if let Some(byte) = self.bytes.get_mut(address) {
            *byte = value;
        }
    }
}
