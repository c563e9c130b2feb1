//! Timer / mode state. The transition logic that mutates this state lives
//! in `crate::engine` alongside the forest lock it must share.

use crate::channel::Bandwidth;

/// Which pre-CAC scheme, if either, is currently driving the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Off,
    Legacy,
    Agile,
}

/// Firmware's three-state report for an off-channel CAC attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcacStatus {
    Success,
    Reset,
    Cancel,
}

/// Tri-state carried over from the original `precac_state_started` flag:
/// distinguishes "nothing armed" from "armed" from "armed but paused
/// because the AP's own primary-channel CAC is running".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreCacRunState {
    NotStarted,
    Started,
    PausedForPrimaryCac,
}

/// Sentinel meaning "no channel"/"no auto-switch pending" for the `u16`
/// frequency fields below, matching the source's use of 0 as a null
/// frequency.
pub const NO_FREQ: u16 = 0;

#[derive(Debug, Clone)]
pub struct TimerState {
    pub mode: Mode,
    pub timer_running: bool,
    pub target_freq: u16,
    pub target_width: Bandwidth,
    pub current_radio_index: u8,
    pub radio_count: u8,
    pub ocac_status: OcacStatus,
    pub autoswitch_target: u16,
    pub intermediate_freq: u16,
    pub timeout_override_s: i32,
    pub run_state: PreCacRunState,
}

impl TimerState {
    pub fn new(intermediate_freq: u16, radio_count: u8) -> Self {
        TimerState {
            mode: Mode::Off,
            timer_running: false,
            target_freq: NO_FREQ,
            target_width: Bandwidth::Mhz80,
            current_radio_index: 0,
            radio_count: radio_count.max(1),
            ocac_status: OcacStatus::Cancel,
            autoswitch_target: NO_FREQ,
            intermediate_freq,
            timeout_override_s: -1,
            run_state: PreCacRunState::NotStarted,
        }
    }
}

use crate::engine::PrecacEngine;

impl PrecacEngine {
    /// Host timer expiry: dispatches on the currently active mode. A
    /// no-op if pre-CAC is off (a stray/late timer fire after disable).
    pub fn on_timer_expiry(&self) {
        let mut state = self.state.lock().unwrap();
        match state.timer.mode {
            Mode::Off => {}
            Mode::Legacy => self.on_legacy_expiry(&mut state),
            Mode::Agile => self.on_agile_expiry(&mut state),
        }
    }

    /// Firmware's off-channel-CAC completion hook. Only meaningful in
    /// agile mode.
    pub fn process_ocac_complete(&self, status: OcacStatus, center_freq: u16) {
        let mut state = self.state.lock().unwrap();
        if !matches!(state.timer.mode, Mode::Agile) {
            return;
        }
        state.timer.ocac_status = status;
        match status {
            OcacStatus::Success => {
                state.forest.mark_cac_done(center_freq, state.timer.target_width);
                self.timer_driver.arm(0);
                if self.maybe_autoswitch(&mut state) {
                    return;
                }
                self.pick_next_agile(&mut state);
            }
            OcacStatus::Reset => {
                self.pick_next_agile(&mut state);
            }
            OcacStatus::Cancel => {
                state.timer.timer_running = false;
                state.timer.run_state = PreCacRunState::NotStarted;
            }
        }
    }
}
