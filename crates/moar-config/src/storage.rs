//! Byte-addressable non-volatile storage.
//!
//! EEPROM-class media wear out per write cycle, so every write issued by
//! the store goes through [`NvStorage::update`], which skips bytes that
//! already hold the target value.

/// Value read back from erased or out-of-range cells.
pub const ERASED: u8 = 0xFF;

/// Raw non-volatile byte storage.
///
/// Implementations must be synchronous. Reads past [`capacity`](Self::capacity)
/// return [`ERASED`]; writes past it are ignored.
pub trait NvStorage {
    /// Number of addressable bytes.
    fn capacity(&self) -> usize;

    /// Reads one byte.
    fn read(&self, address: usize) -> u8;

    /// Writes one byte unconditionally.
    fn write(&mut self, address: usize, value: u8);

    /// Writes `value` only if the stored byte differs.
    ///
    /// Returns `true` if a physical write happened.
    fn update(&mut self, address: usize, value: u8) -> bool {
        if self.read(address) == value {
            return false;
        }
        self.write(address, value);
        true
    }

    /// Reads a little-endian `u16`.
    fn read_u16(&self, address: usize) -> u16 {
        u16::from_le_bytes([self.read(address), self.read(address + 1)])
    }

    /// Updates a little-endian `u16`. Returns `true` if either byte was written.
    fn update_u16(&mut self, address: usize, value: u16) -> bool {
        let [lo, hi] = value.to_le_bytes();
        let wrote_lo = self.update(address, lo);
        let wrote_hi = self.update(address + 1, hi);
        wrote_lo || wrote_hi
    }
}

impl<T: NvStorage + ?Sized> NvStorage for &mut T {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn read(&self, address: usize) -> u8 {
        (**self).read(address)
    }

    fn write(&mut self, address: usize, value: u8) {
        (**self).write(address, value);
    }
}

/// RAM-backed storage of `N` bytes, initialised to the erased state.
///
/// Counts physical writes so wear behaviour can be asserted in tests.
///
/// # Example
///
/// ```rust
/// use moar_config::{MemoryStorage, NvStorage};
///
/// let mut eeprom = MemoryStorage::<64>::new();
/// assert!(eeprom.update(3, 7));
/// assert!(!eeprom.update(3, 7));
/// assert_eq!(eeprom.write_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStorage<const N: usize> {
    bytes: [u8; N],
    writes: usize,
}

impl<const N: usize> MemoryStorage<N> {
    /// Creates fully erased storage.
    pub const fn new() -> Self {
        Self {
            bytes: [ERASED; N],
            writes: 0,
        }
    }

    /// Wraps an existing image.
    pub const fn from_bytes(bytes: [u8; N]) -> Self {
        Self { bytes, writes: 0 }
    }

    /// Raw contents.
    pub const fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Physical writes since creation.
    pub const fn write_count(&self) -> usize {
        self.writes
    }

    /// Inverts the byte at `address`, simulating a bit-rot fault.
    pub fn corrupt(&mut self, address: usize) {
        if let Some(byte) = self.bytes.get_mut(address) {
            *byte = !*byte;
        }
    }
}

impl<const N: usize> Default for MemoryStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> NvStorage for MemoryStorage<N> {
    fn capacity(&self) -> usize {
        N
    }

    fn read(&self, address: usize) -> u8 {
        self.bytes.get(address).copied().unwrap_or(ERASED)
    }

    fn write(&mut self, address: usize, value: u8) {
        if let Some(byte) = self.bytes.get_mut(address) {
            *byte = value;
            self.writes += 1;
        }
    }
}
