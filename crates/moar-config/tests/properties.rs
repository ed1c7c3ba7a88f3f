//! Property-based tests for the configuration store.
//!
//! Round-trips arbitrary valid records through storage and checks that
//! region corruption fails over without returning a partial record.

use proptest::prelude::*;
use moar_config::{
    ConfigError, ConfigRecord, ConfigStore, ENVELOPE_COUNT, MAX_CHANNELS, MemoryStorage,
    NvStorage, RegionRole, SaveState,
};
use moar_core::{ArgMethod, EnvelopeMode, FilterCurve};

type Eeprom = MemoryStorage<1024>;

/// Builds a valid record for `channels` channels from a byte seed.
fn record_from(channels: usize, seed: &[u8]) -> ConfigRecord {
    let mut record = ConfigRecord::defaults(channels).unwrap();
    let byte = |i: usize| seed[i % seed.len()];
    for index in 0..channels {
        record.set_output_channel(index, byte(index) % 16 + 1);
        record.set_cc_number(index, byte(index + 1) % 128);
        let envelope = byte(index + 2) % 8;
        let envelope = (usize::from(envelope) < ENVELOPE_COUNT).then_some(envelope);
        record.set_envelope_for(index, envelope);
    }
    for index in 0..ENVELOPE_COUNT {
        let curve = FilterCurve::ALL[usize::from(byte(index + 3)) % FilterCurve::ALL.len()];
        record.set_curve(index, curve);
    }
    record.set_led_brightness(byte(4));
    record.set_led_color([byte(5), byte(6), byte(7)]);
    record.set_mode(if byte(8) % 2 == 0 {
        EnvelopeMode::Sef
    } else {
        EnvelopeMode::Arg
    });
    record.set_arg_method(ArgMethod::ALL[usize::from(byte(9)) % ArgMethod::ALL.len()]);
    let a = byte(10) % 6;
    record.set_arg_pair(a, (a + 1 + byte(11) % 5) % 6);
    record
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// save() then load() returns an equal record for every channel count.
    #[test]
    fn save_load_round_trip(
        channels in 1usize..=MAX_CHANNELS,
        seed in prop::collection::vec(any::<u8>(), 1..32),
    ) {
        let record = record_from(channels, &seed);
        let mut store = ConfigStore::new(Eeprom::new(), channels).unwrap();
        *store.record_mut() = record.clone();
        prop_assert_eq!(store.save(), SaveState::Verified);

        let mut reopened = ConfigStore::new(store.into_storage(), channels).unwrap();
        prop_assert_eq!(reopened.load(), Ok(RegionRole::Primary));
        prop_assert_eq!(reopened.record(), &record);
    }

    /// Corrupting only the primary magic yields the backup's data unchanged.
    #[test]
    fn corrupt_primary_magic_fails_over(
        channels in 1usize..=MAX_CHANNELS,
        primary_seed in prop::collection::vec(any::<u8>(), 1..16),
        backup_seed in prop::collection::vec(any::<u8>(), 1..16),
        magic_byte in 0usize..2,
    ) {
        let mut store = ConfigStore::new(Eeprom::new(), channels).unwrap();
        let backup = record_from(channels, &backup_seed);
        *store.record_mut() = backup.clone();
        store.write_backup();
        *store.record_mut() = record_from(channels, &primary_seed);
        store.save();

        let magic = store.layout().magic(RegionRole::Primary) + magic_byte;
        store.storage_mut().corrupt(magic);
        prop_assert_eq!(store.load(), Ok(RegionRole::Backup));
        prop_assert_eq!(store.record(), &backup);
    }

    /// With both magics corrupt, load fails and the live record is untouched.
    #[test]
    fn corrupt_both_reports_failure(
        channels in 1usize..=MAX_CHANNELS,
        seed in prop::collection::vec(any::<u8>(), 1..16),
    ) {
        let mut store = ConfigStore::new(Eeprom::new(), channels).unwrap();
        *store.record_mut() = record_from(channels, &seed);
        store.save();
        store.write_backup();
        for role in [RegionRole::Primary, RegionRole::Backup] {
            let magic = store.layout().magic(role);
            store.storage_mut().corrupt(magic + 1);
        }

        let live = ConfigRecord::defaults(channels).unwrap();
        *store.record_mut() = live.clone();
        prop_assert_eq!(store.load(), Err(ConfigError::NoHealthyRegion));
        prop_assert_eq!(store.record(), &live);
    }

    /// A repeated save of an unchanged record performs no physical writes.
    #[test]
    fn resave_is_write_free(
        channels in 1usize..=MAX_CHANNELS,
        seed in prop::collection::vec(any::<u8>(), 1..16),
    ) {
        let mut store = ConfigStore::new(Eeprom::new(), channels).unwrap();
        *store.record_mut() = record_from(channels, &seed);
        store.save();
        let writes = store.storage().write_count();
        store.save();
        prop_assert_eq!(store.storage().write_count(), writes);
    }

    /// Arbitrary bytes in a healthy region always decode to a sane record.
    #[test]
    fn garbage_payload_decodes_sanely(
        channels in 1usize..=MAX_CHANNELS,
        garbage in prop::collection::vec(any::<u8>(), 1..256),
    ) {
        let mut store = ConfigStore::new(Eeprom::new(), channels).unwrap();
        let layout = *store.layout();
        for (offset, &byte) in garbage.iter().cycle().take(layout.payload_size()).enumerate() {
            store.storage_mut().update(offset, byte);
        }
        store.storage_mut().update_u16(layout.magic(RegionRole::Primary), RegionRole::Primary.magic());

        prop_assert_eq!(store.load(), Ok(RegionRole::Primary));
        let record = store.record();
        for index in 0..channels {
            let output = record.output_channel(index).unwrap();
            prop_assert!((1..=16).contains(&output));
            prop_assert!(record.cc_number(index).unwrap() <= 127);
            prop_assert!(record.envelope_for(index).is_none_or(|e| usize::from(e) < ENVELOPE_COUNT));
        }
        let (a, b) = record.arg_pair();
        prop_assert_ne!(a, b);
    }
}
