//! # Failsafe monitor module
//!
//! Combines the command watchdog and the hardware safety interlock into a single safe-to-drive
//! verdict. The verdict is recomputed from scratch on every call, there is no latching or
//! debouncing: one stale command stream or one disengaged switch reading is enough to fail safe.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{info, warn};
use serde::Serialize;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default maximum age of the last command before the watchdog expires.
pub const DEFAULT_WATCHDOG_TIMEOUT_S: f64 = 0.25;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// An output showing whether the vehicle is safe to drive, for example a
/// status light.
pub trait SafetyIndicator {
    /// Set the indicator, `true` meaning safe to drive.
    fn set_safe(&mut self, safe: bool);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The result of one failsafe evaluation.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct FailsafeStatus {
    /// True if the last command is younger than the watchdog timeout.
    pub watchdog_ok: bool,

    /// True if the safety interlock switch is engaged.
    pub hardware_switch_ok: bool,
}

/// The failsafe monitor.
pub struct FailsafeMonitor {
    watchdog_timeout_s: f64,

    indicator: Box<dyn SafetyIndicator>,

    last_status: Option<FailsafeStatus>,
}

/// A [`SafetyIndicator`] which reports changes of the verdict in the log.
#[derive(Debug, Default)]
pub struct LogIndicator {
    safe: Option<bool>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FailsafeStatus {
    pub fn safe_to_drive(&self) -> bool {
        self.watchdog_ok && self.hardware_switch_ok
    }
}

impl FailsafeMonitor {
    pub fn new(watchdog_timeout_s: f64, indicator: Box<dyn SafetyIndicator>) -> Self {
        Self {
            watchdog_timeout_s,
            indicator,
            last_status: None,
        }
    }

    /// Evaluate the failsafes and drive the indicator with the result.
    ///
    /// # Inputs
    /// - `now_s`: the current time.
    /// - `last_command_time_s`: time of the last command received, or `None`
    ///   if no command has ever been received, which fails the watchdog.
    /// - `hardware_switch_engaged`: the current reading of the interlock.
    ///
    /// A command time in the future of `now_s` also fails the watchdog.
    pub fn evaluate(
        &mut self,
        now_s: f64,
        last_command_time_s: Option<f64>,
        hardware_switch_engaged: bool,
    ) -> FailsafeStatus {
        let watchdog_ok = match last_command_time_s {
            Some(t) => {
                let age_s = now_s - t;
                age_s >= 0.0 && age_s < self.watchdog_timeout_s
            }
            None => false,
        };

        let status = FailsafeStatus {
            watchdog_ok,
            hardware_switch_ok: hardware_switch_engaged,
        };

        if self.last_status != Some(status) && !status.safe_to_drive() {
            warn!(
                "Not safe to drive (watchdog ok: {}, interlock engaged: {})",
                status.watchdog_ok, status.hardware_switch_ok
            );
        }

        self.indicator.set_safe(status.safe_to_drive());
        self.last_status = Some(status);

        status
    }

    /// The status found by the most recent evaluation.
    pub fn last_status(&self) -> Option<FailsafeStatus> {
        self.last_status
    }
}

impl Default for FailsafeMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_WATCHDOG_TIMEOUT_S, Box::new(LogIndicator::default()))
    }
}

impl std::fmt::Debug for FailsafeMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailsafeMonitor")
            .field("watchdog_timeout_s", &self.watchdog_timeout_s)
            .field("last_status", &self.last_status)
            .finish()
    }
}

impl SafetyIndicator for LogIndicator {
    fn set_safe(&mut self, safe: bool) {
        if self.safe != Some(safe) {
            match safe {
                true => info!("Safety indicator: SAFE"),
                false => info!("Safety indicator: UNSAFE"),
            }
            self.safe = Some(safe);
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Indicator recording every value it is set to.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingIndicator(pub Rc<RefCell<Vec<bool>>>);

    impl SafetyIndicator for RecordingIndicator {
        fn set_safe(&mut self, safe: bool) {
            self.0.borrow_mut().push(safe);
        }
    }

    #[test]
    fn test_watchdog() {
        let mut fs = FailsafeMonitor::default();

        assert!(fs.evaluate(10.0, Some(9.99), true).watchdog_ok);
        assert!(fs.evaluate(10.0, Some(10.0), true).watchdog_ok);
        assert!(!fs.evaluate(10.0, Some(9.75), true).watchdog_ok);
        assert!(!fs.evaluate(10.0, Some(9.7), true).watchdog_ok);
        assert!(!fs.evaluate(10.0, None, true).watchdog_ok);
        assert!(!fs.evaluate(10.0, Some(10.5), true).watchdog_ok);
        assert!(!fs.evaluate(f64::NAN, Some(10.0), true).watchdog_ok);
    }

    #[test]
    fn test_switch() {
        let mut fs = FailsafeMonitor::default();

        let status = fs.evaluate(1.0, Some(0.99), false);
        assert!(status.watchdog_ok);
        assert!(!status.hardware_switch_ok);
        assert!(!status.safe_to_drive());

        // Recovers as soon as the switch is engaged again
        assert!(fs.evaluate(1.1, Some(1.0), true).safe_to_drive());
    }

    #[test]
    fn test_indicator() {
        let indicator = RecordingIndicator::default();
        let mut fs = FailsafeMonitor::new(0.25, Box::new(indicator.clone()));

        fs.evaluate(1.0, Some(0.9), true);
        fs.evaluate(1.0, Some(0.5), true);
        fs.evaluate(1.0, Some(0.9), false);
        fs.evaluate(1.0, Some(0.9), true);

        assert_eq!(*indicator.0.borrow(), vec![true, false, false, true]);
        assert_eq!(
            fs.last_status(),
            Some(FailsafeStatus {
                watchdog_ok: true,
                hardware_switch_ok: true
            })
        );
    }
}
