use crate::submission::{SubmissionCoordinator, Submitter};
use crate::validation::ValidationVisibility;

/// Snapshot of the adapter, recomputed on every render.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdapterState {
    pub is_submitting: bool,
    pub is_submitted: bool,
    pub submitter: Option<Submitter>,
    pub validation_request_count: u32,
}

impl AdapterState {
    pub fn requested_show_validation(&self) -> bool {
        self.validation_request_count > 0
    }
}

/// The live sub-states behind [`AdapterState`]. One per mounted form.
#[derive(Debug, Default)]
pub struct AdapterCore {
    pub(crate) submission: SubmissionCoordinator,
    pub(crate) visibility: ValidationVisibility,
}

impl AdapterCore {
    pub fn snapshot(&self) -> AdapterState {
        AdapterState {
            is_submitting: self.submission.is_submitting(),
            is_submitted: self.submission.is_submitted(),
            submitter: self.submission.submitter().cloned(),
            validation_request_count: self.visibility.request_count(),
        }
    }

    pub fn show_validation(&mut self) {
        self.visibility.show();
    }

    pub fn hide_validation(&mut self) {
        self.visibility.hide();
    }
}
