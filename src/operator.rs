//! Operator-facing surface: the entry points a management daemon or CLI
//! calls directly, as opposed to the timer/radar hooks that fire from the
//! firmware and regulatory collaborators.

use log::{debug, warn};

use crate::channel::OperatingChannel;
use crate::engine::{HardwareCapability, PrecacEngine};
use crate::error::{PrecacError, Result};
use crate::regulatory::DfsDomainKind;
use crate::timer::NO_FREQ;

/// Coarse per-channel status for `get_precac_chan_state`, mirroring the
/// legacy enum the original operator surface exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecacChanState {
    /// Needs CAC and isn't currently running one.
    Required,
    /// This is the channel the timer is currently CAC'ing.
    Now,
    /// CAC has already completed for every sub-channel.
    Done,
    /// Under non-occupancy hold from a prior radar hit.
    Nol,
    /// Not a recognized pre-CAC frequency.
    Err,
}

impl PrecacEngine {
    /// Turns pre-CAC on or off for this radio.
    /// Enabling is a no-op returning `false` outside the ETSI domain or
    /// once selection finds nothing left to do; disabling always succeeds.
    pub fn set_precac_enable(&self, enable: bool) -> bool {
        let mut state = self.state.lock().unwrap();
        if !enable {
            self.stop(&mut state);
            debug!("precac: disabled by operator");
            return true;
        }
        if self.regulatory.dfs_domain() != DfsDomainKind::Etsi {
            warn!("precac: {}", PrecacError::NotEtsi);
            return false;
        }
        match self.capability {
            HardwareCapability::Legacy => self.pick_and_arm_legacy(&mut state),
            HardwareCapability::Agile { .. } => self.pick_and_arm_agile(&mut state),
        }
    }

    /// Operator override of the regulatory CAC duration, in seconds;
    /// `-1` restores the regulatory minimum.
    pub fn override_precac_timeout(&self, timeout_s: i32) {
        let mut state = self.state.lock().unwrap();
        state.timer.timeout_override_s = timeout_s;
    }

    /// Sets the non-DFS parking channel used while no pre-CAC'd secondary is
    /// available yet. Rejects a DFS frequency.
    pub fn set_precac_intermediate_chan(&self, freq: u16) -> Result<()> {
        if !self.regulatory.is_non_dfs(freq) {
            return Err(PrecacError::InvalidIntermediateChannel);
        }
        let mut state = self.state.lock().unwrap();
        state.timer.intermediate_freq = freq;
        Ok(())
    }

    pub fn get_precac_intermediate_chan(&self) -> u16 {
        self.state.lock().unwrap().timer.intermediate_freq
    }

    /// Operator-requested future home channel. If no intermediate parking
    /// channel is configured yet, this is a no-op. Otherwise: if `freq` is
    /// a DFS channel that isn't pre-CAC'd yet, its band is rotated to the
    /// head of the selection order, it's remembered as the pending
    /// auto-switch target (§4.9 picks it up on the next completed pre-CAC),
    /// and `true` is returned so the caller redirects to the intermediate
    /// channel (`get_precac_intermediate_chan`) in the meantime. Otherwise
    /// `freq` itself is usable right away, so it's remembered as the new
    /// intermediate channel and `false` is returned (no redirect needed).
    pub fn decide_precac_preferred_chan(
        &self,
        freq: u16,
        width: crate::channel::OperatingWidth,
    ) -> bool {
        let channel = OperatingChannel::new_simple(width, freq);
        let mut state = self.state.lock().unwrap();
        if state.timer.intermediate_freq == NO_FREQ {
            return false;
        }
        let is_dfs = !self.regulatory.is_non_dfs(freq);
        if is_dfs && !state.forest.is_done_for_complex_channel(&channel) {
            state.forest.rotate_to_head(&channel);
            state.timer.autoswitch_target = freq;
            debug!(
                "precac: preferred chan {freq} pending precac, redirecting to intermediate {}",
                state.timer.intermediate_freq
            );
            return true;
        }
        state.timer.intermediate_freq = freq;
        false
    }

    /// Coarse status for one 20/40/80 MHz aggregate, factoring in whether
    /// it's the timer's current target.
    pub fn get_precac_chan_state(&self, freq: u16) -> PrecacChanState {
        let state = self.state.lock().unwrap();
        let Some(snapshot) = state.forest.snapshot_for(freq) else {
            return PrecacChanState::Err;
        };
        if state.timer.timer_running && state.timer.target_freq == freq {
            return PrecacChanState::Now;
        }
        if snapshot.n_nol > 0 {
            PrecacChanState::Nol
        } else if snapshot.n_cac_done == snapshot.bandwidth.n_subchannels() {
            PrecacChanState::Done
        } else {
            PrecacChanState::Required
        }
    }

    /// A human-readable dump of every band tree, in forest (selection)
    /// order.
    pub fn print_precaclists(&self) -> String {
        self.state.lock().unwrap().forest.dump()
    }

    /// Stops pre-CAC and rebuilds the forest from scratch, discarding
    /// every done/NOL counter (e.g. after a regulatory domain change).
    pub fn reset_precaclists(&self) {
        let mut state = self.state.lock().unwrap();
        self.stop(&mut state);
        state.forest.reset(self.regulatory.as_ref());
    }

    /// Tracks the channel the radio is actually serving clients on, used
    /// for exclusion accounting on the next selection.
    pub fn set_serving_channel(&self, channel: OperatingChannel) {
        let mut state = self.state.lock().unwrap();
        state.serving = channel;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::OperatingWidth;
    use crate::collaborators::testing::{RecordingFirmware, RecordingManagement, RecordingTimer};
    use crate::config::PrecacConfig;
    use crate::regulatory::{DfsDomainKind, StaticRegulatoryDomain};

    fn engine(capability: HardwareCapability) -> PrecacEngine {
        PrecacEngine::new(
            Box::new(StaticRegulatoryDomain::etsi_reference()),
            Box::new(RecordingManagement::default()),
            Box::new(RecordingFirmware::default()),
            Box::new(RecordingTimer::default()),
            PrecacConfig::default(),
            capability,
        )
    }

    #[test]
    fn enable_outside_etsi_is_rejected() {
        let e = PrecacEngine::new(
            Box::new(StaticRegulatoryDomain::new(DfsDomainKind::Fcc, vec![], vec![])),
            Box::new(RecordingManagement::default()),
            Box::new(RecordingFirmware::default()),
            Box::new(RecordingTimer::default()),
            PrecacConfig::default(),
            HardwareCapability::Legacy,
        );
        assert!(!e.set_precac_enable(true));
    }

    #[test]
    fn intermediate_channel_must_be_non_dfs() {
        let e = engine(HardwareCapability::Legacy);
        assert_eq!(
            e.set_precac_intermediate_chan(5290),
            Err(PrecacError::InvalidIntermediateChannel)
        );
        assert!(e.set_precac_intermediate_chan(5180).is_ok());
        assert_eq!(e.get_precac_intermediate_chan(), 5180);
    }

    #[test]
    fn chan_state_reports_now_for_armed_target() {
        let e = engine(HardwareCapability::Legacy);
        assert!(e.set_precac_enable(true));
        let target = e.state.lock().unwrap().timer.target_freq;
        assert_eq!(e.get_precac_chan_state(target), PrecacChanState::Now);
        assert_eq!(e.get_precac_chan_state(1234), PrecacChanState::Err);
    }

    #[test]
    fn preferred_chan_reorders_selection() {
        let e = engine(HardwareCapability::Legacy);
        assert!(e.decide_precac_preferred_chan(5690, OperatingWidth::Mhz80));
        let state = e.state.lock().unwrap();
        let exclusions = vec![];
        assert_eq!(state.forest.select(crate::channel::Bandwidth::Mhz80, &exclusions), 5690);
    }

    #[test]
    fn reset_precaclists_clears_progress() {
        let e = engine(HardwareCapability::Legacy);
        assert!(e.set_precac_enable(true));
        e.reset_precaclists();
        let state = e.state.lock().unwrap();
        assert!(!state.timer.timer_running);
        assert_eq!(state.forest.len(), 4);
    }
}
