//! Runs a scenario through the controller on a simulated board.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use moar_platform::layout::NV_CAPACITY;
use moar_platform::sim::SimBoard;
use moar_platform::Orchestrator;

use crate::scenario::Scenario;
use crate::storage::ImageStorage;

#[derive(Args)]
pub struct SimulateArgs {
    /// Scenario file (TOML)
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,

    /// Boot from this EEPROM image and write it back afterwards
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Print only the summary
    #[arg(short, long)]
    quiet: bool,
}

pub fn run(args: SimulateArgs) -> anyhow::Result<()> {
    let scenario = Scenario::load(&args.scenario)?;
    let storage = match &args.image {
        Some(path) if path.exists() => ImageStorage::open(path, NV_CAPACITY)?,
        _ => ImageStorage::erased(NV_CAPACITY),
    };

    let mut controller = Orchestrator::new(SimBoard::new(), storage, scenario.settings.resolve())
        .context("booting controller")?;

    if let Some(name) = &scenario.name {
        println!("Scenario: {name}");
    }

    let timeline = scenario.timeline();
    let mut pending = timeline.iter().peekable();
    let mut sent_total = 0;
    let mut shown = controller.context().board.statuses().len();
    if !args.quiet {
        for text in controller.context().board.statuses() {
            println!("{:>7} ms  STATUS {text}", 0);
        }
    }

    for now in 0..scenario.duration_ms {
        while let Some((_, change)) = pending.next_if(|(at, _)| *at <= now) {
            change.apply(&mut controller.context_mut().board);
        }
        controller.tick(now);

        let board = &mut controller.context_mut().board;
        let sent = board.take_sent();
        sent_total += sent.len();
        if !args.quiet {
            for control in &sent {
                println!(
                    "{now:>7} ms  CC {:>3} = {:>3}  ch {}",
                    control.control, control.value, control.channel
                );
            }
            for text in &board.statuses()[shown..] {
                println!("{now:>7} ms  STATUS {text}");
            }
        }
        shown = board.statuses().len();

        if controller.is_halted() {
            tracing::info!(now, "controller halted, stopping scenario");
            break;
        }
    }

    let ctx = controller.context();
    println!();
    println!("Control changes: {sent_total}");
    println!("Status messages: {shown}");
    println!("Follow mode:     {}", if ctx.follow() { "on" } else { "off" });
    println!("Halted:          {}", if controller.is_halted() { "yes" } else { "no" });

    if let Some(path) = &args.image {
        let (_, storage) = controller.into_parts();
        storage.persist(path)?;
        println!("Image written:   {}", path.display());
    }
    Ok(())
}
