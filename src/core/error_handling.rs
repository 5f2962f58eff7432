//! Fatal error reporting
//!
//! Errors that end a run are reported once, through the log sink, with a level
//! of detail that depends on whether the user can act on them.

/// Errors that can tell user-actionable failures from system failures
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`; otherwise it returns `None`.
pub trait ContextualError: std::error::Error {
    /// True for failures the user fixes themselves (bad profile, bad key file)
    fn is_user_actionable(&self) -> bool;

    /// The specific message to show for user-actionable errors
    fn user_message(&self) -> Option<&str>;
}

/// Log a fatal error with its context
///
/// User-actionable errors show their own message. System errors show the
/// operation context plus the full error chain, which carries the service
/// error code and request id needed for a support ticket.
pub fn log_error_with_context<E: ContextualError>(error: &E, operation_context: &str) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => {
            log::error!("FATAL: {}", user_msg);
        }
        _ => {
            log::error!("FATAL: {}: {}", operation_context, error_chain(error));
        }
    }
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

/// Render an error and its sources as `outer: inner: innermost`
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
