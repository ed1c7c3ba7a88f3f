//! Shared mutable state of the running controller.
//!
//! [`ControlContext`] is owned by the orchestrator and handed by `&mut` to
//! every scheduled task, gesture handler and [`Action`](crate::Action).
//! Nothing else holds controller state, so a single writer is guaranteed by
//! the borrow checker rather than by convention.

use core::fmt;

use heapless::String;
use moar_config::{ConfigError, ConfigStore, NvStorage};
use moar_core::{BeatCounter, EnvelopeMode, Millis, TapTempo, Xorshift32};

use crate::envelope::EnvelopeProcessor;
use crate::layout::ENVELOPE_COUNT;
use crate::mux::Mux;
use crate::scanner::ChannelScanner;
use crate::settings::Settings;
use crate::tone::ToneControl;
use crate::Board;

/// Longest status message kept; longer text is truncated.
pub const STATUS_CAPACITY: usize = 32;

/// What the display shows on each refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySnapshot {
    /// MIDI clock beat position (0..8).
    pub beat: u8,
    /// Selected channel, if any.
    pub active_channel: Option<u8>,
    /// Output MIDI channel of the selected channel.
    pub sub_channel: u8,
    /// Envelope levels in envelope order.
    pub envelope_levels: [u8; ENVELOPE_COUNT],
    /// Global envelope mode.
    pub mode: EnvelopeMode,
    /// Whether envelope follow mode is on.
    pub follow: bool,
    /// Tempo from tap input, if any.
    pub bpm: Option<f32>,
    /// Control-loop iterations in the last report window.
    pub loop_rate: u32,
}

/// Mutable state shared by every handler.
pub struct ControlContext<B, S> {
    /// Hardware collaborators.
    pub board: B,
    /// Mux address cache shared by pot and button scanning.
    pub mux: Mux,
    /// Pots.
    pub scanner: ChannelScanner,
    /// Envelopes.
    pub envelopes: EnvelopeProcessor,
    /// Tone pots.
    pub tone: ToneControl,
    /// Persisted configuration, including the channel-to-envelope map.
    pub config: ConfigStore<S>,
    /// Source for randomize actions and the `Random` curve.
    pub rng: Xorshift32,
    /// Tap-tempo capture.
    pub tap: TapTempo,
    /// MIDI clock beat position.
    pub beat: BeatCounter,
    /// Timing tunables.
    pub settings: Settings,
    active_channel: Option<u8>,
    sub_channel: u8,
    follow: bool,
    clear_armed_at: Option<Millis>,
    halt_requested: bool,
    now: Millis,
    iterations: u32,
    loop_rate: u32,
}

impl<B: Board, S: NvStorage> ControlContext<B, S> {
    /// Builds a context around a loaded (or defaulted) store.
    ///
    /// Channel mappings, envelope settings and LED appearance are taken
    /// from the store's live record.
    pub fn new(board: B, config: ConfigStore<S>, settings: Settings) -> Result<Self, ConfigError> {
        let scanner = ChannelScanner::new(config.layout().channel_count())?;
        let mut ctx = Self {
            board,
            mux: Mux::default(),
            scanner,
            envelopes: EnvelopeProcessor::new(settings.envelope_sample_rate),
            tone: ToneControl::new(),
            config,
            rng: Xorshift32::new(settings.rng_seed),
            tap: TapTempo::new(),
            beat: BeatCounter::new(),
            settings,
            active_channel: None,
            sub_channel: 1,
            follow: false,
            clear_armed_at: None,
            halt_requested: false,
            now: 0,
            iterations: 0,
            loop_rate: 0,
        };
        ctx.sync_from_config();
        Ok(ctx)
    }

    /// Pushes the store's live record into the scanner, envelopes and LEDs.
    pub fn sync_from_config(&mut self) {
        let record = self.config.record();
        self.scanner.load_mappings(record);
        self.envelopes.load_from(record);
        self.board.set_appearance(record.led_brightness(), record.led_color());
        if let Some(index) = self.active_channel {
            self.sub_channel = self.scanner.channel(usize::from(index)).map_or(1, |c| c.midi_channel());
        }
    }

    /// Shows a status message for the configured duration.
    pub fn status(&mut self, text: &str) {
        #[cfg(feature = "tracing")]
        tracing::debug!(text, "status");

        self.board.show_status(text, self.settings.status_ms);
    }

    /// Formats and shows a status message.
    pub fn status_fmt(&mut self, args: fmt::Arguments<'_>) {
        let mut text: String<STATUS_CAPACITY> = String::new();
        // Overflow only truncates the message.
        let _ = fmt::Write::write_fmt(&mut text, args);
        self.status(&text);
    }

    /// Timestamp of the current tick.
    #[inline]
    pub fn now(&self) -> Millis {
        self.now
    }

    pub(crate) fn begin_tick(&mut self, now: Millis) {
        self.now = now;
        self.iterations = self.iterations.wrapping_add(1);
    }

    /// Selected channel.
    #[inline]
    pub fn active_channel(&self) -> Option<u8> {
        self.active_channel
    }

    /// Selects a channel and highlights it. Unknown indices are ignored.
    pub fn select_channel(&mut self, index: u8) -> bool {
        let Some(channel) = self.scanner.channel(usize::from(index)) else {
            return false;
        };
        self.sub_channel = channel.midi_channel();
        self.active_channel = Some(index);
        self.board.set_highlight(Some(index));
        true
    }

    /// Output MIDI channel of the selected channel.
    #[inline]
    pub fn sub_channel(&self) -> u8 {
        self.sub_channel
    }

    pub(crate) fn set_sub_channel(&mut self, channel: u8) {
        self.sub_channel = channel;
    }

    /// Envelope assigned to the selected channel, if both exist.
    pub fn active_envelope(&self) -> Option<usize> {
        let index = usize::from(self.active_channel?);
        self.config.record().envelope_for(index).map(usize::from)
    }

    /// Whether envelopes modulate their assigned channels.
    #[inline]
    pub fn follow(&self) -> bool {
        self.follow
    }

    /// Turns follow mode on or off, activating every envelope with it.
    pub fn set_follow(&mut self, enabled: bool) {
        self.follow = enabled;
        self.envelopes.set_active_all(enabled);
        self.envelopes.clear_sent();
        self.board.indicate_follow(enabled);

        #[cfg(feature = "tracing")]
        tracing::info!(enabled, "envelope follow");
    }

    /// Arms or confirms a clear. Returns `true` when this call confirms an
    /// earlier one made within the confirm window.
    pub(crate) fn confirm_clear(&mut self, now: Millis) -> bool {
        let window = self.settings.clear_confirm_ms;
        match self.clear_armed_at.take() {
            Some(armed) if moar_core::elapsed(now, armed) <= window => true,
            _ => {
                self.clear_armed_at = Some(now);
                false
            }
        }
    }

    /// Asks the orchestrator to stop after the current tick.
    pub fn request_halt(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::warn!("halt requested");

        self.halt_requested = true;
    }

    /// True once a halt has been requested.
    #[inline]
    pub fn halt_requested(&self) -> bool {
        self.halt_requested
    }

    /// Iterations counted in the last completed report window.
    #[inline]
    pub fn loop_rate(&self) -> u32 {
        self.loop_rate
    }

    /// Closes the current load window and returns its iteration count.
    pub(crate) fn roll_load_window(&mut self) -> u32 {
        self.loop_rate = self.iterations;
        self.iterations = 0;
        self.loop_rate
    }

    /// Scans every pot and sends direct control changes.
    ///
    /// A channel with an assigned envelope is left to the envelope task
    /// while follow mode is on.
    pub fn scan_channels(&mut self) -> usize {
        let follow = self.follow;
        let record = self.config.record();
        self.scanner.process_all(&mut self.mux, &mut self.board, |board, change| {
            let modulated = follow && record.envelope_for(usize::from(change.index)).is_some();
            if !modulated {
                board.send_control_change(change.cc, change.value, change.midi_channel);
            }
        })
    }

    /// Current display contents.
    pub fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            beat: self.beat.position(),
            active_channel: self.active_channel,
            sub_channel: self.sub_channel,
            envelope_levels: self.envelopes.levels(),
            mode: self.envelopes.mode(),
            follow: self.follow,
            bpm: self.tap.bpm(),
            loop_rate: self.loop_rate,
        }
    }
}
