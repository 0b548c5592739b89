/// Fixed user id used by the development API-key bypass.
pub const DEV_USER_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Authenticated caller, resolved once per request by the authorizer and
/// stored in request extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
}

impl AuthUser {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    /// The sentinel identity for the development bypass.
    pub fn development() -> Self {
        Self::new(DEV_USER_ID)
    }
}
