//! EEPROM image commands.
//!
//! Create fresh images, decode both configuration regions and damage a
//! region on purpose to exercise backup failover.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Subcommand, ValueEnum};
use moar_config::{ConfigRecord, ConfigStore, NvStorage, RegionRole, SaveState};
use moar_platform::layout::{CHANNEL_COUNT, ENVELOPE_COUNT, NV_CAPACITY};

use crate::storage::ImageStorage;

#[derive(Args)]
pub struct ImageArgs {
    #[command(subcommand)]
    command: ImageCommand,
}

#[derive(Subcommand)]
enum ImageCommand {
    /// Write a factory-default image (both regions)
    Init {
        /// Output image file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Decode both configuration regions of an image
    Inspect {
        /// Image file
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Also list every channel mapping
        #[arg(short, long)]
        channels: bool,
    },

    /// Flip the magic number of one region
    Corrupt {
        /// Image file, modified in place
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Region to damage
        #[arg(long, value_enum, default_value = "primary")]
        region: Region,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Region {
    Primary,
    Backup,
}

impl From<Region> for RegionRole {
    fn from(region: Region) -> Self {
        match region {
            Region::Primary => RegionRole::Primary,
            Region::Backup => RegionRole::Backup,
        }
    }
}

pub fn run(args: ImageArgs) -> anyhow::Result<()> {
    match args.command {
        ImageCommand::Init { output, force } => init(&output, force),
        ImageCommand::Inspect { image, channels } => inspect(&image, channels),
        ImageCommand::Corrupt { image, region } => corrupt(&image, region.into()),
    }
}

fn open_store(storage: ImageStorage) -> anyhow::Result<ConfigStore<ImageStorage>> {
    ConfigStore::new(storage, CHANNEL_COUNT).context("opening configuration store")
}

fn init(output: &Path, force: bool) -> anyhow::Result<()> {
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }
    let mut store = open_store(ImageStorage::erased(NV_CAPACITY))?;
    let state = store.reset_to_defaults();
    if state != SaveState::Verified {
        bail!("default image failed verification ({state:?})");
    }
    store.storage().persist(output)?;
    println!("Wrote {} ({} bytes)", output.display(), NV_CAPACITY);
    Ok(())
}

fn inspect(path: &Path, channels: bool) -> anyhow::Result<()> {
    let store = open_store(ImageStorage::open(path, NV_CAPACITY)?)?;
    let layout = store.layout();
    println!("Image: {} ({} bytes)", path.display(), store.storage().capacity());
    println!("Region size: {} bytes", layout.region_size());
    println!();

    for role in [RegionRole::Primary, RegionRole::Backup] {
        let magic = store.storage().read_u16(layout.magic(role));
        let healthy = store.check_health(role);
        println!(
            "{} region @ {:#06x}: magic {:#06x} ({})",
            role.name(),
            layout.base(role),
            magic,
            if healthy { "healthy" } else { "UNHEALTHY" }
        );
        if healthy {
            print_record(&store.read_region(role), channels);
        }
        println!();
    }
    Ok(())
}

fn print_record(record: &ConfigRecord, channels: bool) {
    let assigned = record.assignments().iter().filter(|a| a.is_some()).count();
    let (a, b) = record.arg_pair();
    let [r, g, bl] = record.led_color();
    println!("  mode:        {}", record.mode().label());
    println!("  arg method:  {}", record.arg_method().label());
    println!("  arg pair:    A{a}/A{b}");
    println!("  led:         brightness {} colour #{r:02x}{g:02x}{bl:02x}", record.led_brightness());
    println!("  assignments: {assigned}/{}", record.channel_count());
    for envelope in 0..ENVELOPE_COUNT {
        if let Some(curve) = record.curve(envelope) {
            println!("  envelope {}:  {}", envelope + 1, curve.label());
        }
    }
    if !channels {
        return;
    }
    println!("  {:>4}  {:>4}  {:>3}  env", "pot", "chan", "cc");
    for index in 0..record.channel_count() {
        let output = record.output_channel(index).unwrap_or(0);
        let cc = record.cc_number(index).unwrap_or(0);
        let envelope = record
            .envelope_for(index)
            .map_or_else(|| "-".to_owned(), |e| (e + 1).to_string());
        println!("  {:>4}  {output:>4}  {cc:>3}  {envelope}", index + 1);
    }
}

fn corrupt(path: &Path, role: RegionRole) -> anyhow::Result<()> {
    let store = open_store(ImageStorage::open(path, NV_CAPACITY)?)?;
    let address = store.layout().magic(role);
    let mut storage = store.into_storage();
    storage.flip(address)?;
    storage.persist(path)?;
    tracing::warn!(region = role.name(), address, "region magic damaged");
    println!("Damaged {} region magic at {:#06x}", role.name(), address);
    Ok(())
}
