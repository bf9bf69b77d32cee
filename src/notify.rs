//! Notification bus interface.
//!
//! Consumed, not built: the core hands transient user-facing messages to
//! whatever bus the host provides. Fire-and-forget, no acknowledgment.

/// A transient user-facing message, optionally carrying one action.
pub struct Notice {
    pub text: String,
    pub action: Option<NoticeAction>,
}

/// An action the user may invoke from a notice (e.g. "Undo").
pub struct NoticeAction {
    pub label: String,
    pub callback: Box<dyn FnOnce() + Send>,
}

impl Notice {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: None,
        }
    }

    pub fn with_action(
        text: impl Into<String>,
        label: impl Into<String>,
        callback: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            text: text.into(),
            action: Some(NoticeAction {
                label: label.into(),
                callback: Box::new(callback),
            }),
        }
    }
}

/// Delivers notices to the user. Implementations decide presentation and how
/// long the action stays invocable.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// A notifier that logs notices and drops their actions.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match &notice.action {
            Some(action) => tracing::info!(
                target: "liveboard::notify",
                text = %notice.text,
                action = %action.label,
                "notice"
            ),
            None => tracing::info!(target: "liveboard::notify", text = %notice.text, "notice"),
        }
    }
}
