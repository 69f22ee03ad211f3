//! Per-component debug logging capability.
//!
//! Every long-lived substrate component carries a persistent, togglable
//! debug flag. Debug messages are emitted at error severity so they are
//! visible without reconfiguring the subscriber on a running server.

use std::sync::atomic::{AtomicBool, Ordering};

/// Capability giving a component a named log target and a togglable debug
/// flag.
pub trait Debuggable {
    /// The persistent debug flag.
    fn debug_flag(&self) -> &AtomicBool;

    /// Name used as the component field on emitted messages.
    fn component_name(&self) -> &str;

    /// Flip the debug flag, returning the new value.
    ///
    /// The transition itself is always logged, whichever direction it goes,
    /// so toggling is observable even with the flag ending up off.
    fn toggle_debug(&self) -> bool {
        let enabled = !self.debug_flag().fetch_xor(true, Ordering::SeqCst);
        let state = if enabled { "enabled" } else { "disabled" };
        self.debug_log(&format!("debug logging {state}"), true);
        enabled
    }

    /// Emit `message` at error severity iff `force` is true or the
    /// persistent flag is set; otherwise do nothing.
    fn debug_log(&self, message: &str, force: bool) {
        if force || self.debug_flag().load(Ordering::SeqCst) {
            tracing::error!(component = self.component_name(), "{message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        flag: AtomicBool,
    }

    impl Debuggable for Probe {
        fn debug_flag(&self) -> &AtomicBool {
            &self.flag
        }

        fn component_name(&self) -> &str {
            "probe"
        }
    }

    #[test]
    fn test_toggle_flips_flag() {
        let probe = Probe {
            flag: AtomicBool::new(false),
        };

        assert!(probe.toggle_debug());
        assert!(probe.flag.load(Ordering::SeqCst));

        assert!(!probe.toggle_debug());
        assert!(!probe.flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_debug_log_does_not_panic_when_disabled() {
        let probe = Probe {
            flag: AtomicBool::new(false),
        };
        probe.debug_log("quiet", false);
        probe.debug_log("forced", true);
    }
}
