//! User-level actions dispatched from gestures and chords.
//!
//! Every action runs to completion against the [`ControlContext`] and
//! reports its outcome as a short status message. Channel-scoped actions
//! need a selected channel; envelope-scoped actions additionally need an
//! envelope assigned to it. When either is missing the action shows
//! `NO POT` / `NO ENV` and changes nothing.

use moar_config::{MAX_CC, MIDI_CHANNELS, NvStorage, RegionRole, SaveState};
use moar_core::Millis;

use crate::Board;
use crate::context::ControlContext;
use crate::layout::{ENVELOPE_COUNT, ENVELOPE_SOURCES};

/// Pin number of `A0`; analog labels are offsets from it.
const FIRST_ANALOG_PIN: u8 = 14;

/// Something a user can ask the controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Make a channel the target of channel-scoped actions.
    SelectChannel(u8),
    /// Step the selected channel's output MIDI channel through 1..=16.
    CycleSubChannel,
    /// Step the selected channel's CC number through 0..=127.
    CycleCc,
    /// Step the selected channel's envelope through none, 1..=6.
    CycleAssignment,
    /// Turn envelope follow mode on or off.
    ToggleFollow,
    /// Switch every envelope between SEF and ARG.
    ToggleMode,
    /// Advance the ARG combiner.
    CycleArgMethod,
    /// Advance the ARG source pair.
    CycleArgPair,
    /// Advance the curve of the selected channel's envelope.
    CycleCurve,
    /// Jump the selected channel's envelope between static and filter curves.
    CycleCurveFamily,
    /// Persist the live configuration.
    Save,
    /// Reload the configuration from storage.
    Load,
    /// Give every channel a random output MIDI channel and CC number.
    Randomize,
    /// Assign each envelope to its own random channel and start following.
    FollowRandom,
    /// Record a tempo tap.
    TapTempo,
    /// Factory reset; needs a second request inside the confirm window.
    Clear,
    /// Stop the controller so the host can restart it.
    Reboot,
}

impl Action {
    /// Runs the action at time `now`.
    pub fn execute<B: Board, S: NvStorage>(self, ctx: &mut ControlContext<B, S>, now: Millis) {
        #[cfg(feature = "tracing")]
        tracing::debug!(action = ?self, now, "execute");

        match self {
            Self::SelectChannel(index) => {
                if ctx.select_channel(index) {
                    ctx.status_fmt(format_args!("POT {}", u16::from(index) + 1));
                }
            }
            Self::CycleSubChannel => {
                let Some(index) = selected(ctx) else { return };
                let record = ctx.config.record_mut();
                let channel = record.output_channel(index).map_or(1, |c| c % MIDI_CHANNELS + 1);
                record.set_output_channel(index, channel);
                let cc = record.cc_number(index).unwrap_or(0);
                ctx.scanner.set_mapping(index, channel, cc);
                ctx.set_sub_channel(channel);
                ctx.status_fmt(format_args!("CHAN {channel}"));
            }
            Self::CycleCc => {
                let Some(index) = selected(ctx) else { return };
                let record = ctx.config.record_mut();
                let cc = record.cc_number(index).map_or(0, |c| (c + 1) % (MAX_CC + 1));
                record.set_cc_number(index, cc);
                let channel = record.output_channel(index).unwrap_or(1);
                ctx.scanner.set_mapping(index, channel, cc);
                ctx.status_fmt(format_args!("CC {cc}"));
            }
            Self::CycleAssignment => {
                let Some(index) = selected(ctx) else { return };
                let next = match ctx.config.record().envelope_for(index) {
                    None => Some(0),
                    Some(e) if usize::from(e) + 1 < ENVELOPE_COUNT => Some(e + 1),
                    Some(_) => None,
                };
                ctx.config.record_mut().set_envelope_for(index, next);
                match next {
                    Some(envelope) => ctx.status_fmt(format_args!("ENV {}", envelope + 1)),
                    None => ctx.status("ENV OFF"),
                }
            }
            Self::ToggleFollow => {
                let enabled = !ctx.follow();
                ctx.set_follow(enabled);
                ctx.status(if enabled { "EF ON" } else { "EF OFF" });
            }
            Self::ToggleMode => {
                let mode = ctx.envelopes.toggle_mode();
                ctx.config.record_mut().set_mode(mode);
                ctx.status_fmt(format_args!("MODE {}", mode.label()));
            }
            Self::CycleArgMethod => {
                let method = ctx.envelopes.cycle_arg_method();
                ctx.config.record_mut().set_arg_method(method);
                ctx.status_fmt(format_args!("ARG {}", method.label()));
            }
            Self::CycleArgPair => {
                let (a, b) = ctx.envelopes.cycle_pair();
                ctx.config.record_mut().set_arg_pair(a, b);
                ctx.status_fmt(format_args!("PAIR A{}/A{}", analog_label(a), analog_label(b)));
            }
            Self::CycleCurve | Self::CycleCurveFamily => {
                let Some(envelope) = ctx.active_envelope() else {
                    ctx.status("NO ENV");
                    return;
                };
                let curve = if self == Self::CycleCurve {
                    ctx.envelopes.cycle_curve(envelope)
                } else {
                    ctx.envelopes.cycle_curve_family(envelope)
                };
                if let Some(curve) = curve {
                    ctx.config.record_mut().set_curve(envelope, curve);
                    ctx.status(curve.label());
                }
            }
            Self::Save => {
                ctx.envelopes.store_into(ctx.config.record_mut());
                match ctx.config.save() {
                    SaveState::Verified => ctx.status("SAVED"),
                    _ => ctx.status("SAVED BACKUP"),
                }
            }
            Self::Load => match ctx.config.load() {
                Ok(role) => {
                    ctx.sync_from_config();
                    ctx.envelopes.clear_sent();
                    ctx.status(if role == RegionRole::Primary { "LOADED" } else { "LOADED BACKUP" });
                }
                Err(_) => ctx.status("LOAD FAILED"),
            },
            Self::Randomize => {
                for index in 0..ctx.scanner.len() {
                    let channel = ctx.rng.in_range(1, u32::from(MIDI_CHANNELS)) as u8;
                    let cc = ctx.rng.below(u32::from(MAX_CC) + 1) as u8;
                    let record = ctx.config.record_mut();
                    record.set_output_channel(index, channel);
                    record.set_cc_number(index, cc);
                    ctx.scanner.set_mapping(index, channel, cc);
                }
                let active = ctx.active_channel().and_then(|index| ctx.scanner.channel(usize::from(index)));
                if let Some(channel) = active.map(|c| c.midi_channel()) {
                    ctx.set_sub_channel(channel);
                }
                ctx.status("RANDOMIZED");
            }
            Self::FollowRandom => {
                let channels = ctx.scanner.len();
                let record = ctx.config.record_mut();
                record.clear_assignments();
                // Step forward from the drawn channel so every envelope lands
                // on its own channel.
                for envelope in 0..ENVELOPE_COUNT.min(channels) {
                    let mut index = ctx.rng.below(channels as u32) as usize;
                    while record.envelope_for(index).is_some() {
                        index = (index + 1) % channels;
                    }
                    record.set_envelope_for(index, Some(envelope as u8));
                }
                ctx.set_follow(true);
                ctx.status("EF RANDOM");
            }
            Self::TapTempo => match ctx.tap.tap(now) {
                Some(bpm) => ctx.status_fmt(format_args!("BPM {}", libm::roundf(bpm) as u32)),
                None => ctx.status("TAP"),
            },
            Self::Clear => {
                if !ctx.confirm_clear(now) {
                    ctx.status("CONFIRM CLEAR?");
                    return;
                }
                let state = ctx.config.reset_to_defaults();

                #[cfg(feature = "tracing")]
                tracing::warn!(?state, "configuration cleared");

                ctx.sync_from_config();
                ctx.envelopes.clear_sent();
                ctx.status(if state == SaveState::Verified { "CLEARED" } else { "CLEARED BACKUP" });
            }
            Self::Reboot => {
                ctx.status("REBOOTING");
                ctx.request_halt();
            }
        }
    }
}

/// Selected channel index, or `None` after showing `NO POT`.
fn selected<B: Board, S: NvStorage>(ctx: &mut ControlContext<B, S>) -> Option<usize> {
    match ctx.active_channel() {
        Some(index) => Some(usize::from(index)),
        None => {
            ctx.status("NO POT");
            None
        }
    }
}

fn analog_label(source: u8) -> u8 {
    ENVELOPE_SOURCES[usize::from(source) % ENVELOPE_COUNT] - FIRST_ANALOG_PIN
}
