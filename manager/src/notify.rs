use std::sync::Mutex;

/// Severity of a message sent through the notification sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Side channel for user-visible messages.
///
/// The store and the history engine report outcomes through this trait
/// ("no more history to undo", "failed to parse state file ...") but
/// never depend on its behavior; a host typically forwards messages to
/// its own notification facility.
pub trait Notifier {
    fn notify(&self, severity: Severity, message: &str);

    fn info(&self, message: &str) {
        self.notify(Severity::Info, message);
    }

    fn warn(&self, message: &str) {
        self.notify(Severity::Warn, message);
    }

    fn error(&self, message: &str) {
        self.notify(Severity::Error, message);
    }
}

/// Notifier that drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _severity: Severity, _message: &str) {}
}

/// Notifier that collects messages in memory, for tests and for hosts
/// that batch messages before displaying them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(Severity, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages received so far, oldest first.
    pub fn messages(&self) -> Vec<(Severity, String)> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Messages of one severity, oldest first.
    pub fn messages_with(&self, severity: Severity) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(recorded, _)| *recorded == severity)
            .map(|(_, message)| message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        match self.messages.lock() {
            Ok(mut guard) => guard.push((severity, message.to_string())),
            Err(poisoned) => poisoned
                .into_inner()
                .push((severity, message.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_notifier_keeps_order_and_severity() {
        let notifier = RecordingNotifier::new();
        notifier.info("first");
        notifier.warn("second");
        notifier.error("third");
        assert_eq!(
            notifier.messages(),
            vec![
                (Severity::Info, "first".to_string()),
                (Severity::Warn, "second".to_string()),
                (Severity::Error, "third".to_string()),
            ]
        );
        assert_eq!(
            notifier.messages_with(Severity::Warn),
            vec!["second".to_string()]
        );
    }

    #[test]
    fn null_notifier_accepts_all_severities() {
        let notifier = NullNotifier;
        notifier.info("ignored");
        notifier.warn("ignored");
        notifier.error("ignored");
    }
}
