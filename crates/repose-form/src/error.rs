use repose_core::RuntimeError;
use thiserror::Error;

/// Why an attempt ended without a clean `Ok(())` from the submit handler.
///
/// These never reach consumers: failure is modelled by the explicit
/// `signal_failed_submission` latch, so the coordinator only logs them.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("submit handler returned an error: {0:#}")]
    Rejected(anyhow::Error),

    #[error("submit handler panicked: {0}")]
    Panicked(String),

    #[error("could not schedule submit handler: {0}")]
    Schedule(#[from] RuntimeError),
}

pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    }
}
