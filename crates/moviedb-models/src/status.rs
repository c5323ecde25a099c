use serde::{Deserialize, Serialize};
use std::fmt;

/// Review state of a user-submitted movie request.
///
/// A request starts out `Pending` and is decided exactly once, either
/// `Denied` or `Accepted`. Whether it is still shown to its author is tracked
/// separately by `MovieRequest::active`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Denied,
    Accepted,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Denied => "denied",
            RequestStatus::Accepted => "accepted",
        }
    }

    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Denied)
                | (RequestStatus::Pending, RequestStatus::Accepted)
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
