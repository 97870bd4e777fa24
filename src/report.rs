//! Shared error handler.
//!
//! Sessions forward every failed request here and move on; the handler never
//! blocks them.

use crate::channel::{Channel, Subscription};
use crate::error::ErrorKind;

/// Single entry point for failed requests.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, kind: ErrorKind);
}

/// What the user gets told about a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    pub kind: ErrorKind,
    pub message: String,
}

const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// Logs each error and republishes it as an [`ErrorNotice`].
#[derive(Clone, Default)]
pub struct ErrorReporter {
    notices: Channel<ErrorNotice>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription<ErrorNotice> {
        self.notices.subscribe()
    }
}

impl ErrorHandler for ErrorReporter {
    fn handle(&self, kind: ErrorKind) {
        tracing::warn!(error = kind.error_type(), "Request failed: {}", kind);
        self.notices.publish(ErrorNotice {
            kind,
            message: GENERIC_MESSAGE.to_string(),
        });
    }
}
