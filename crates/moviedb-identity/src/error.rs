use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Identity provider is not configured")]
    NotConfigured,

    #[error("Identity provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Identity provider answered {status}: {body}")]
    Status { status: u16, body: String },
}
