//! External collaborators: everything the engine treats as somebody
//! else's problem. Production wiring backs these with the real lower-MAC
//! command transport and management-plane signaling; tests back them with
//! the fakes in `testing` below.

use crate::channel::Bandwidth;

/// Parameters for an agile off-channel CAC configuration command sent to
/// firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgileChCfg {
    pub target_freq: u16,
    pub width: Bandwidth,
    pub min_duration_ms: u64,
    pub max_duration_ms: u64,
}

/// Management-plane signaling the engine triggers but never implements:
/// the upward channel-switch-announcement path.
pub trait ManagementPlane: Send + Sync {
    /// A legacy pre-CAC timer just expired while an auto-switch target was
    /// still pending: ask management to switch to the pre-CAC'd secondary,
    /// outside of a CSA.
    fn channel_change_by_precac(&self);

    /// Issue a CSA to `target_freq` because its pre-CAC just finished and
    /// an operator auto-switch was waiting on it.
    fn precac_chan_change_csa(&self, target_freq: u16, width: Bandwidth);
}

/// Lower-MAC command transport to firmware.
pub trait FirmwarePlane: Send + Sync {
    /// Configures the agile detector to off-channel-CAC `cfg.target_freq`.
    /// Transport failures are logged and the attempt abandoned; they never
    /// corrupt forest state.
    fn agile_ch_cfg(&self, cfg: AgileChCfg) -> bool;

    /// Aborts an in-flight off-channel CAC, e.g. on disable.
    fn ocac_abort(&self);
}

/// The single per-radio OS timer resource. `arm`/`cancel` must be
/// externally serialized; the engine only ever calls these while holding
/// its own forest/timer lock, satisfying that requirement.
pub trait TimerDriver: Send + Sync {
    /// Arms the timer to fire once, `duration_ms` from now.
    fn arm(&self, duration_ms: u64);

    /// Synchronously cancels the timer, waiting out any in-flight callback.
    fn cancel(&self);

    /// Whether the AP's own primary-channel CAC is currently running
    /// (used to pause/resume pre-CAC arming around it).
    fn is_primary_cac_running(&self) -> bool;

    /// Duration in ms of the AP's own primary-channel CAC. Only queried
    /// while `is_primary_cac_running` is true, to size the legacy pre-CAC
    /// timer so it doesn't fire (and trigger a channel restart) before the
    /// primary's own CAC completes.
    fn primary_cac_duration_ms(&self) -> u64;
}

/// In-memory fakes that record every call, for engine tests and for
/// integration tests in `tests/`.
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingManagement {
        pub channel_change_calls: Mutex<u32>,
        pub csa_calls: Mutex<Vec<(u16, Bandwidth)>>,
    }

    impl ManagementPlane for RecordingManagement {
        fn channel_change_by_precac(&self) {
            *self.channel_change_calls.lock().unwrap() += 1;
        }

        fn precac_chan_change_csa(&self, target_freq: u16, width: Bandwidth) {
            self.csa_calls.lock().unwrap().push((target_freq, width));
        }
    }

    #[derive(Default)]
    pub struct RecordingFirmware {
        pub agile_cfgs: Mutex<Vec<AgileChCfg>>,
        pub abort_calls: Mutex<u32>,
        pub fail_next: Mutex<bool>,
    }

    impl FirmwarePlane for RecordingFirmware {
        fn agile_ch_cfg(&self, cfg: AgileChCfg) -> bool {
            if *self.fail_next.lock().unwrap() {
                *self.fail_next.lock().unwrap() = false;
                return false;
            }
            self.agile_cfgs.lock().unwrap().push(cfg);
            true
        }

        fn ocac_abort(&self) {
            *self.abort_calls.lock().unwrap() += 1;
        }
    }

    #[derive(Default)]
    pub struct RecordingTimer {
        pub armed_ms: Mutex<Vec<u64>>,
        pub cancel_calls: Mutex<u32>,
        pub primary_cac_running: Mutex<bool>,
        pub primary_cac_duration_ms: Mutex<u64>,
    }

    impl TimerDriver for RecordingTimer {
        fn arm(&self, duration_ms: u64) {
            self.armed_ms.lock().unwrap().push(duration_ms);
        }

        fn cancel(&self) {
            *self.cancel_calls.lock().unwrap() += 1;
        }

        fn is_primary_cac_running(&self) -> bool {
            *self.primary_cac_running.lock().unwrap()
        }

        fn primary_cac_duration_ms(&self) -> u64 {
            *self.primary_cac_duration_ms.lock().unwrap()
        }
    }
}
