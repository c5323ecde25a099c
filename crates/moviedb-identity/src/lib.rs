pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod memory;
pub mod traits;

pub use client::Auth0Client;
pub use error::IdentityError;
pub use memory::InMemoryDirectory;
pub use traits::IdentityProvider;

/// Body the password reset endpoint answers with once the email is queued.
pub const PASSWORD_RESET_SENT: &str = "We've just sent you an email to reset your password.";
