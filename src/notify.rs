//! Escalation of conflicts that need a human.

use log::warn;

/// Fire-and-forget alert channel to administrators. No acknowledgement, no retry.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Writes alerts to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        warn!(target: "admin_alert", "{}", message);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every message for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        pub fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn test_log_notifier_does_not_panic() {
        LogNotifier.notify("3 unresolved conflicts");
    }
}
