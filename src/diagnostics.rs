//! Diagnostics helpers shared by the parsers and the analysis pipeline.

/// Report a recoverable problem with the inputs.
pub fn warn(msg: impl AsRef<str>) {
    tracing::warn!("{}", msg.as_ref());
}

/// Build the message of a fatal error, logging it on the way.
pub fn error_message(msg: impl Into<String>) -> String {
    let msg = msg.into();
    tracing::debug!(error = %msg, "aborting");
    msg
}
