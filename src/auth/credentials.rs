//! Login credentials that double as the re-authentication payload.

// self
use crate::{_prelude::*, auth::Secret};

/// Non-secret identity half of the stored credentials.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
	/// Merchant company identifier.
	pub company_id: String,
	/// Username within the company.
	pub username: String,
}
impl UserData {
	/// Creates a new identity pair.
	pub fn new(company_id: impl Into<String>, username: impl Into<String>) -> Self {
		Self { company_id: company_id.into(), username: username.into() }
	}

	/// Returns `true` when both fields carry non-whitespace content.
	pub fn is_complete(&self) -> bool {
		!self.company_id.trim().is_empty() && !self.username.trim().is_empty()
	}
}

/// Company/username/password triple submitted to the login endpoint.
///
/// The same triple serves the interactive login and every silent refresh, so it serializes
/// straight into the login request body.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCredentials {
	/// Merchant company identifier.
	pub company_id: String,
	/// Username within the company.
	pub username: String,
	/// Account password; never log it.
	pub password: Secret,
}
impl LoginCredentials {
	/// Builds a credential triple.
	pub fn new(
		company_id: impl Into<String>,
		username: impl Into<String>,
		password: impl Into<Secret>,
	) -> Self {
		Self { company_id: company_id.into(), username: username.into(), password: password.into() }
	}

	/// Joins stored identity data with a stored password.
	pub fn from_parts(user: UserData, password: Secret) -> Self {
		Self { company_id: user.company_id, username: user.username, password }
	}

	/// Returns `true` when every field is present and non-blank.
	pub fn is_complete(&self) -> bool {
		!self.company_id.trim().is_empty()
			&& !self.username.trim().is_empty()
			&& !self.password.is_blank()
	}

	/// Returns the identity half of the triple.
	pub fn user_data(&self) -> UserData {
		UserData::new(self.company_id.clone(), self.username.clone())
	}
}
impl Debug for LoginCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginCredentials")
			.field("company_id", &self.company_id)
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}
