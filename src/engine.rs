//! The pre-CAC engine: owns the forest, the timer/mode state, and the
//! serving-channel snapshot needed for exclusion accounting, all behind
//! one mutex so the round-robin agile index is protected by the same lock
//! that guards the forest.

use std::sync::Mutex;

use log::{debug, warn};

use crate::channel::{subchannel_centers, Bandwidth, OperatingChannel, OperatingWidth};
use crate::collaborators::{AgileChCfg, FirmwarePlane, ManagementPlane, TimerDriver};
use crate::config::{PrecacConfig, PRIMARY_CAC_WAIT_SLACK_MS};
use crate::error::PrecacError;
use crate::forest::PreCacForest;
use crate::regulatory::RegulatoryDomain;
use crate::selection;
use crate::timer::{Mode, OcacStatus, PreCacRunState, TimerState, NO_FREQ};

pub(crate) struct EngineState {
    pub(crate) forest: PreCacForest,
    pub(crate) timer: TimerState,
    pub(crate) serving: OperatingChannel,
}

/// Hardware capability flags that decide which mode(s) `enable()` may pick:
/// legacy pre-CAC needs a secondary 80 MHz segment that can be
/// independently tuned; otherwise an agile off-channel detector is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareCapability {
    Legacy,
    Agile { radio_count: u8 },
}

/// The pre-CAC engine for a single radio.
pub struct PrecacEngine {
    pub(crate) regulatory: Box<dyn RegulatoryDomain>,
    pub(crate) mgmt: Box<dyn ManagementPlane>,
    pub(crate) fw: Box<dyn FirmwarePlane>,
    pub(crate) timer_driver: Box<dyn TimerDriver>,
    pub(crate) config: PrecacConfig,
    pub(crate) capability: HardwareCapability,
    pub(crate) state: Mutex<EngineState>,
}

impl PrecacEngine {
    pub fn new(
        regulatory: Box<dyn RegulatoryDomain>,
        mgmt: Box<dyn ManagementPlane>,
        fw: Box<dyn FirmwarePlane>,
        timer_driver: Box<dyn TimerDriver>,
        config: PrecacConfig,
        capability: HardwareCapability,
    ) -> Self {
        let forest = PreCacForest::build(regulatory.as_ref());
        let radio_count = match capability {
            HardwareCapability::Agile { radio_count } => radio_count,
            HardwareCapability::Legacy => 1,
        };
        let timer = TimerState::new(config.default_intermediate_freq, radio_count);
        let serving = OperatingChannel::new_simple(OperatingWidth::Mhz80, NO_FREQ);
        PrecacEngine {
            regulatory,
            mgmt,
            fw,
            timer_driver,
            config,
            capability,
            state: Mutex::new(EngineState {
                forest,
                timer,
                serving,
            }),
        }
    }

    /// Width used for an agile pre-CAC candidate, mapped from the serving
    /// primary's width: 20->20, 40->40, 80->80, 160->80, 80+80->80.
    fn agile_width_for(serving: OperatingWidth) -> Bandwidth {
        match serving {
            OperatingWidth::Mhz20 => Bandwidth::Mhz20,
            OperatingWidth::Mhz40 => Bandwidth::Mhz40,
            OperatingWidth::Mhz80 | OperatingWidth::Mhz160 | OperatingWidth::Mhz80Plus80 => {
                Bandwidth::Mhz80
            }
        }
    }

    fn duration_for(&self, state: &TimerState, candidate: u16, bandwidth: Bandwidth) -> u64 {
        let leaves = subchannel_centers(candidate, bandwidth);
        let first = *leaves.first().unwrap();
        let last = *leaves.last().unwrap();
        let min = self
            .config
            .min_duration_ms(first, last, state.timeout_override_s)
            .min(self.config.max_duration_ms(first, last));
        if matches!(state.mode, Mode::Legacy) && self.timer_driver.is_primary_cac_running() {
            // Primary and secondary CAC run concurrently; size the timer to
            // outlast whichever finishes last so pre-CAC expiry never races
            // a channel restart ahead of the primary's own CAC completing.
            min.max(self.timer_driver.primary_cac_duration_ms()) + PRIMARY_CAC_WAIT_SLACK_MS
        } else {
            min + crate::config::EXTRA_TIME_IN_MS
        }
    }

    /// `off -> legacy_selecting -> legacy_running`: picks a candidate
    /// excluding the serving primary, arms the timer, and tells management
    /// a channel change is coming. Returns `false` (and leaves the timer
    /// stopped) if nothing needs pre-CAC.
    pub(crate) fn pick_and_arm_legacy(&self, state: &mut EngineState) -> bool {
        let exclusions = selection::exclusions_for(&state.serving);
        let candidate = state.forest.select(Bandwidth::Mhz80, &exclusions);
        if candidate == NO_FREQ {
            debug!("precac: no legacy candidate available");
            state.timer.timer_running = false;
            state.timer.run_state = PreCacRunState::NotStarted;
            return false;
        }
        state.timer.mode = Mode::Legacy;
        let duration = self.duration_for(&state.timer, candidate, Bandwidth::Mhz80);
        self.timer_driver.arm(duration);
        state.timer.timer_running = true;
        state.timer.target_freq = candidate;
        state.timer.target_width = Bandwidth::Mhz80;
        state.timer.run_state = PreCacRunState::Started;
        self.mgmt.channel_change_by_precac();
        debug!("precac: legacy candidate {candidate} armed for {duration}ms");
        true
    }

    /// Same shape as `pick_and_arm_legacy` but for the agile detector:
    /// width follows the serving primary, the radio index cycles, and the
    /// command goes to firmware instead of management.
    pub(crate) fn pick_and_arm_agile(&self, state: &mut EngineState) -> bool {
        let width = Self::agile_width_for(state.serving.width);
        let exclusions = selection::exclusions_for(&state.serving);
        let candidate = state.forest.select(width, &exclusions);
        if candidate == NO_FREQ {
            debug!("precac: no agile candidate available");
            state.timer.timer_running = false;
            state.timer.run_state = PreCacRunState::NotStarted;
            return false;
        }
        state.timer.mode = Mode::Agile;
        state.timer.current_radio_index =
            (state.timer.current_radio_index + 1) % state.timer.radio_count;
        let duration = self.duration_for(&state.timer, candidate, width);
        let cfg = AgileChCfg {
            target_freq: candidate,
            width,
            min_duration_ms: duration - crate::config::EXTRA_TIME_IN_MS,
            max_duration_ms: self.config.max_duration_ms(candidate, candidate),
        };
        if !self.fw.agile_ch_cfg(cfg) {
            warn!("precac: {}", PrecacError::TransportUnavailable);
            state.timer.timer_running = false;
            state.timer.run_state = PreCacRunState::NotStarted;
            return false;
        }
        self.timer_driver.arm(duration);
        state.timer.timer_running = true;
        state.timer.target_freq = candidate;
        state.timer.target_width = width;
        state.timer.ocac_status = OcacStatus::Cancel;
        state.timer.run_state = PreCacRunState::Started;
        debug!("precac: agile candidate {candidate} ({width}) armed for {duration}ms on radio {}", state.timer.current_radio_index);
        true
    }

    /// If an operator auto-switch target is pending and now done, hand
    /// control to management and halt pre-CAC. Returns `true` if it did so
    /// (caller must not also pick a next candidate).
    pub(crate) fn maybe_autoswitch(&self, state: &mut EngineState) -> bool {
        let target = state.timer.autoswitch_target;
        if target == NO_FREQ {
            return false;
        }
        if !state.forest.is_cac_done_for(target) {
            return false;
        }
        self.mgmt.precac_chan_change_csa(target, Bandwidth::Mhz80);
        state.timer.autoswitch_target = NO_FREQ;
        state.timer.intermediate_freq = target;
        state.timer.timer_running = false;
        state.timer.run_state = PreCacRunState::NotStarted;
        debug!("precac: auto-switch target {target} ready, CSA issued, pre-CAC halted");
        true
    }

    /// Legacy timer expiry (`legacy_running -> legacy_selecting`): marks
    /// the target done, then either auto-switches or picks next.
    pub(crate) fn on_legacy_expiry(&self, state: &mut EngineState) {
        let target = state.timer.target_freq;
        let width = state.timer.target_width;
        state.forest.mark_cac_done(target, width);
        if self.maybe_autoswitch(state) {
            return;
        }
        self.pick_and_arm_legacy(state);
    }

    /// Agile timer expiry: only acts if firmware already reported success;
    /// otherwise this is a host-side timeout backstop.
    pub(crate) fn on_agile_expiry(&self, state: &mut EngineState) {
        if state.timer.ocac_status == OcacStatus::Success {
            let target = state.timer.target_freq;
            let width = state.timer.target_width;
            state.forest.mark_cac_done(target, width);
            self.timer_driver.arm(0);
            if self.maybe_autoswitch(state) {
                return;
            }
            self.pick_next_agile(state);
        } else {
            warn!("precac: agile host timer fired before OCAC completion, treating as timeout");
            self.pick_next_agile(state);
        }
    }

    pub(crate) fn pick_next_agile(&self, state: &mut EngineState) {
        state.timer.timer_running = false;
        self.pick_and_arm_agile(state);
    }

    pub(crate) fn stop(&self, state: &mut EngineState) {
        if state.timer.timer_running {
            self.timer_driver.cancel();
        }
        state.timer.timer_running = false;
        state.timer.mode = Mode::Off;
        state.timer.run_state = PreCacRunState::NotStarted;
    }
}
