//! The control loop.
//!
//! One [`Orchestrator::tick`] is one loop iteration:
//!
//! ```text
//! high tier (1 ms)  : MIDI clock
//! mid tier  (5 ms)  : envelopes, tone pots
//! low tier  (50 ms) : LEDs, display, load monitor
//! every tick        : button gestures, then pot scanning
//! ```
//!
//! Tiers run in that order and each runs its tasks in registration order.
//! Gesture and pot scanning always run last, so a parameter changed by a
//! gesture is seen by the tier tasks on their next invocation.

use moar_config::{ConfigError, ConfigStore, NvStorage};
use moar_core::{Millis, TaskScheduler};

use crate::Board;
use crate::context::ControlContext;
use crate::input::InputGestureManager;
use crate::layout::CHANNEL_COUNT;
use crate::settings::Settings;

/// Whether the loop still does work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Normal operation.
    #[default]
    Running,
    /// Terminal: `tick` does nothing until the controller is rebuilt.
    Halted,
}

type Tier<B, S, const N: usize> = TaskScheduler<ControlContext<B, S>, N>;

/// Owns the context, the input manager and the three scheduler tiers.
pub struct Orchestrator<B, S> {
    ctx: ControlContext<B, S>,
    inputs: InputGestureManager,
    high: Tier<B, S, 2>,
    mid: Tier<B, S, 4>,
    low: Tier<B, S, 4>,
    state: RunState,
}

impl<B: Board, S: NvStorage> Orchestrator<B, S> {
    /// Boots a controller on `board` with configuration from `storage`.
    ///
    /// If neither region is healthy the compiled-in defaults are restored
    /// and written to both regions. Follow mode starts off.
    pub fn new(board: B, storage: S, settings: Settings) -> Result<Self, ConfigError> {
        let mut config = ConfigStore::new(storage, CHANNEL_COUNT)?;
        match config.load() {
            #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
            Ok(role) => {
                #[cfg(feature = "tracing")]
                tracing::info!(region = role.name(), "configuration loaded");
            }
            Err(ConfigError::NoHealthyRegion) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("no healthy configuration region, restoring defaults");

                config.reset_to_defaults();
            }
            Err(e) => return Err(e),
        }

        let mut ctx = ControlContext::new(board, config, settings)?;
        ctx.set_follow(false);
        ctx.status("MOAR");

        let mut high = TaskScheduler::new();
        high.add(midi_clock::<B, S>, settings.high_tier_ms);

        let mut mid = TaskScheduler::new();
        mid.add(envelopes::<B, S>, settings.mid_tier_ms);
        mid.add(tone::<B, S>, settings.mid_tier_ms);

        let mut low = TaskScheduler::new();
        low.add(leds::<B, S>, settings.low_tier_ms);
        low.add(display::<B, S>, settings.display_ms);
        low.add(load_monitor::<B, S>, settings.load_report_ms);

        Ok(Self {
            ctx,
            inputs: InputGestureManager::new(),
            high,
            mid,
            low,
            state: RunState::Running,
        })
    }

    /// Runs one loop iteration at `now`.
    pub fn tick(&mut self, now: Millis) {
        if self.state == RunState::Halted {
            return;
        }
        self.ctx.begin_tick(now);
        self.high.update(now, &mut self.ctx);
        self.mid.update(now, &mut self.ctx);
        self.low.update(now, &mut self.ctx);
        self.inputs.scan(&mut self.ctx, now);
        self.ctx.scan_channels();

        if self.ctx.halt_requested() {
            #[cfg(feature = "tracing")]
            tracing::warn!(now, "controller halted");

            self.state = RunState::Halted;
        }
    }

    /// Shared state.
    #[inline]
    pub fn context(&self) -> &ControlContext<B, S> {
        &self.ctx
    }

    /// Shared state, mutably.
    #[inline]
    pub fn context_mut(&mut self) -> &mut ControlContext<B, S> {
        &mut self.ctx
    }

    /// Gesture state.
    #[inline]
    pub fn inputs(&self) -> &InputGestureManager {
        &self.inputs
    }

    /// Current run state.
    #[inline]
    pub fn run_state(&self) -> RunState {
        self.state
    }

    /// True once the controller has halted.
    #[inline]
    pub fn is_halted(&self) -> bool {
        self.state == RunState::Halted
    }

    /// Stops the controller, returning the board and storage.
    pub fn into_parts(self) -> (B, S) {
        (self.ctx.board, self.ctx.config.into_storage())
    }
}

fn midi_clock<B: Board, S: NvStorage>(ctx: &mut ControlContext<B, S>) {
    if ctx.board.poll_clock_tick() {
        ctx.beat.clock();
    }
}

/// Updates envelope levels and sends modulated values for assigned channels.
fn envelopes<B: Board, S: NvStorage>(ctx: &mut ControlContext<B, S>) {
    if !ctx.follow() {
        return;
    }
    ctx.envelopes.update_all(&mut ctx.board, &mut ctx.rng);
    let record = ctx.config.record();
    for (index, assignment) in record.assignments().iter().enumerate() {
        let Some(envelope) = *assignment else { continue };
        let Some(channel) = ctx.scanner.channel(index) else { continue };
        let base = channel.last_value().unwrap_or(0);
        if let Some(value) = ctx.envelopes.apply_to_output(usize::from(envelope), index, base) {
            ctx.board.send_control_change(channel.cc(), value, channel.midi_channel());
            ctx.board.set_level(index, value);
        }
    }
}

fn tone<B: Board, S: NvStorage>(ctx: &mut ControlContext<B, S>) {
    ctx.tone.update(&mut ctx.board, &mut ctx.envelopes);
}

/// Mirrors reported pot changes onto the LEDs.
fn leds<B: Board, S: NvStorage>(ctx: &mut ControlContext<B, S>) {
    let follow = ctx.follow();
    let board = &mut ctx.board;
    let changed = ctx.scanner.drain_dirty(|channel| {
        if let Some(value) = channel.last_value() {
            board.set_level(usize::from(channel.index()), value);
        }
    });
    if changed > 0 || follow {
        board.refresh();
    }
}

fn display<B: Board, S: NvStorage>(ctx: &mut ControlContext<B, S>) {
    let snapshot = ctx.snapshot();
    ctx.board.show_snapshot(&snapshot);
}

fn load_monitor<B: Board, S: NvStorage>(ctx: &mut ControlContext<B, S>) {
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    let rate = ctx.roll_load_window();

    #[cfg(feature = "tracing")]
    tracing::debug!(iterations = rate, "loop rate");
}
