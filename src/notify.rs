//! User-facing notifications
//!
//! Recoverable engine failures surface as toasts, never as errors crossing
//! this layer. Messages are localization keys; string lookup happens in the
//! rendering layer.

use tokio::sync::mpsc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

/// Sender half of the toast channel. Cheap to clone; dropping every receiver
/// turns notifications into no-ops rather than errors.
#[derive(Clone)]
pub struct ToastSink {
    tx: mpsc::UnboundedSender<Toast>,
}

impl ToastSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Toast>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn success(&self, message: &str) {
        let _ = self.tx.send(Toast {
            kind: ToastKind::Success,
            message: message.to_string(),
        });
    }

    pub fn error(&self, message: &str) {
        let _ = self.tx.send(Toast {
            kind: ToastKind::Error,
            message: message.to_string(),
        });
    }
}

/// Localization keys for navbar-level status toasts.
pub mod messages {
    pub const ADD_CONTACT_SUCCESS: &str = "navBar.snackSuccessContactAdd";
    pub const ADD_CONTACT_FAILED: &str = "navBar.snackFailContactAdd";
    pub const DELETE_CONTACT_SUCCESS: &str = "navBar.snackSuccessContactDelete";
    pub const DELETE_CONTACT_FAILED: &str = "navBar.snackFailContactDelete";
    pub const SET_CURRENCY_SUCCESS: &str = "navBar.snackSuccessCurrency";
    pub const SET_CURRENCY_FAILED: &str = "navBar.snackFailCurrency";
    pub const SET_LOCALE_SUCCESS: &str = "navBar.snackSuccessLocale";
    pub const SET_LOCALE_FAILED: &str = "navBar.snackFailLocale";
    pub const CRASH_REPORT_SUCCESS: &str = "navBar.snackSuccessCrashReport";
    pub const CRASH_REPORT_FAILED: &str = "navBar.snackFailCrashReport";
}
