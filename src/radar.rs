//! Radar and NOL hooks: entry points external radar-detection and
//! NOL-timer collaborators call into. These mutate the forest and, when
//! the pre-CAC timer is running, either re-plan or defer.

use log::debug;

use crate::channel::Bandwidth;
use crate::engine::PrecacEngine;
use crate::timer::{Mode, PreCacRunState};

impl PrecacEngine {
    /// A radar hit was found on one or more 20 MHz sub-channels.
    /// `is_on_secondary_seg` distinguishes, for legacy pre-CAC, a hit on
    /// the secondary (pre-CAC'ing) segment from one on the primary (the
    /// channel currently serving clients); `detector_id` is the agile
    /// radio index that reported the hit.
    pub fn mark_precac_nol(&self, is_on_secondary_seg: bool, detector_id: u8, freqs: &[u16]) {
        let mut state = self.state.lock().unwrap();
        for &f in freqs {
            state.forest.mark_nol(f, Bandwidth::Mhz20);
        }

        if !state.timer.timer_running {
            debug!("precac: radar reported while no precac timer running, forest updated only");
            return;
        }

        match state.timer.mode {
            Mode::Off => {}
            Mode::Legacy => {
                self.timer_driver.cancel();
                state.timer.timer_running = false;
                if is_on_secondary_seg {
                    // The hit landed on our own pre-CAC candidate: it's
                    // already marked NOL above, so just move on to the
                    // next one.
                    state.timer.run_state = PreCacRunState::NotStarted;
                    self.pick_and_arm_legacy(&mut state);
                } else {
                    // Radar on the primary: the subsequent channel change
                    // is an external channel-selection decision; the
                    // engine only stops and waits.
                    state.timer.mode = Mode::Off;
                    state.timer.run_state = PreCacRunState::NotStarted;
                }
            }
            Mode::Agile => {
                self.timer_driver.cancel();
                state.timer.timer_running = false;
                let target = state.timer.target_freq;
                let width = state.timer.target_width;
                state.forest.mark_nol(target, width);
                if detector_id == state.timer.current_radio_index {
                    self.pick_next_agile(&mut state);
                } else {
                    state.timer.target_freq = crate::timer::NO_FREQ;
                }
            }
        }
    }

    /// A previously NOL'd channel's non-occupancy hold has expired: clears
    /// the NOL counters and, if pre-CAC is enabled and nothing else is in
    /// flight, re-kicks selection.
    pub fn unmark_precac_nol(&self, freq: u16) {
        let mut state = self.state.lock().unwrap();
        state.forest.unmark_nol(freq, Bandwidth::Mhz20);

        if state.timer.timer_running {
            debug!("precac: NOL expiry for {freq} while a precac timer is already running");
            return;
        }

        match state.timer.mode {
            Mode::Off => {}
            Mode::Legacy => {
                if !self.timer_driver.is_primary_cac_running() {
                    self.mgmt.channel_change_by_precac();
                }
            }
            Mode::Agile => {
                self.pick_and_arm_agile(&mut state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::testing::{RecordingFirmware, RecordingManagement, RecordingTimer};
    use crate::engine::HardwareCapability;
    use crate::regulatory::StaticRegulatoryDomain;

    fn legacy_engine() -> PrecacEngine {
        PrecacEngine::new(
            Box::new(StaticRegulatoryDomain::etsi_reference()),
            Box::new(RecordingManagement::default()),
            Box::new(RecordingFirmware::default()),
            Box::new(RecordingTimer::default()),
            crate::config::PrecacConfig::default(),
            HardwareCapability::Legacy,
        )
    }

    #[test]
    fn nol_expiry_triggers_replan_when_idle() {
        let engine = legacy_engine();
        engine.set_precac_enable(true);
        // Drain the armed timer back to idle without marking anything NOL,
        // simulating a stray expiry report for an unrelated channel.
        {
            let mut state = engine.state.lock().unwrap();
            state.timer.timer_running = false;
        }
        engine.unmark_precac_nol(5280);
    }

    #[test]
    fn radar_on_secondary_segment_repicks() {
        let engine = legacy_engine();
        assert!(engine.set_precac_enable(true));
        let target = {
            let state = engine.state.lock().unwrap();
            state.timer.target_freq
        };
        engine.mark_precac_nol(true, 0, &[target - 30]);
        let state = engine.state.lock().unwrap();
        assert!(state.forest.is_pcac_required_for(target) || state.timer.target_freq != target);
    }

    #[test]
    fn radar_on_primary_segment_stops_and_waits() {
        let engine = legacy_engine();
        assert!(engine.set_precac_enable(true));
        engine.mark_precac_nol(false, 0, &[5180]);
        let state = engine.state.lock().unwrap();
        assert!(!state.timer.timer_running);
        assert_eq!(state.timer.mode, Mode::Off);
    }
}
