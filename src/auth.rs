//! Session-domain values: redacted secrets, login credentials, and session records.

pub mod credentials;
pub mod secret;
pub mod session;

pub use credentials::*;
pub use secret::*;
pub use session::*;
