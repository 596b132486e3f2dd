//! User model for storage and API.

use crate::error::AppError;
use crate::services::password::PasswordHasher;
use serde::{Deserialize, Serialize};

/// User account stored in Firestore.
///
/// `user_name` and `email` are persisted lower-cased and trimmed; uniqueness
/// of both is enforced by the store, not here. The password hash and refresh
/// token never leave this struct except through Firestore serialization —
/// every API response goes through [`PublicUser`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Document ID (UUID v4)
    pub id: String,
    /// Unique handle, lower-cased
    pub user_name: String,
    /// Unique email, lower-cased
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Avatar URL (required for a record to be valid)
    pub avatar: String,
    /// Optional cover image URL
    pub cover_image: Option<String>,
    /// bcrypt digest of the password
    pub password_hash: String,
    /// Current refresh token; set on login, cleared on logout
    pub refresh_token: Option<String>,
    /// Forecast/video IDs the user has viewed (weak references)
    pub watch_history: Vec<String>,
    /// When the account was created (RFC 3339)
    pub created_at: String,
    /// Last mutation timestamp (RFC 3339)
    pub updated_at: String,
}

impl User {
    /// Create a new account record. The handle and email are normalized here;
    /// the password is hashed immediately, exactly once.
    pub fn new(
        full_name: &str,
        email: &str,
        user_name: &str,
        password: &str,
        avatar: String,
        cover_image: Option<String>,
        hasher: &PasswordHasher,
    ) -> Result<Self, AppError> {
        let now = chrono::Utc::now().to_rfc3339();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_name: user_name.trim().to_lowercase(),
            email: email.trim().to_lowercase(),
            full_name: full_name.trim().to_string(),
            avatar,
            cover_image,
            password_hash: hasher.hash(password)?,
            refresh_token: None,
            watch_history: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Replace the password. Hashes immediately so there is no window where a
    /// plaintext password sits on the record, and no save-time hook to decide
    /// whether rehashing is due.
    pub fn set_password(&mut self, plaintext: &str, hasher: &PasswordHasher) -> Result<(), AppError> {
        self.password_hash = hasher.hash(plaintext)?;
        self.updated_at = chrono::Utc::now().to_rfc3339();
        Ok(())
    }
}

/// Sanitized projection of [`User`] for API responses: no password hash, no
/// refresh token. Field casing matches the public API contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    #[serde(rename = "UserName")]
    pub user_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub avatar: String,
    #[serde(rename = "coverImage")]
    pub cover_image: Option<String>,
    #[serde(rename = "watchHistory")]
    pub watch_history: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            user_name: user.user_name.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            avatar: user.avatar.clone(),
            cover_image: user.cover_image.clone(),
            watch_history: user.watch_history.clone(),
            created_at: user.created_at.clone(),
            updated_at: user.updated_at.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        let hasher = PasswordHasher::new(4);
        User::new(
            "Jane Doe",
            "Jane@X.com ",
            " JaneDoe",
            "secret123",
            "http://cdn.local/a.png".to_string(),
            None,
            &hasher,
        )
        .unwrap()
    }

    #[test]
    fn test_new_normalizes_handle_and_email() {
        let user = test_user();
        assert_eq!(user.user_name, "janedoe");
        assert_eq!(user.email, "jane@x.com");
        assert!(user.refresh_token.is_none());
        assert!(user.watch_history.is_empty());
    }

    #[test]
    fn test_public_user_omits_secrets() {
        let mut user = test_user();
        user.refresh_token = Some("some.refresh.token".to_string());

        let json = serde_json::to_value(PublicUser::from(&user)).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj["UserName"], "janedoe");
        assert_eq!(obj["fullName"], "Jane Doe");
        assert!(!obj.contains_key("password"));
        assert!(!obj.contains_key("passwordHash"));
        assert!(!obj.contains_key("refreshToken"));
    }

    #[test]
    fn test_set_password_rehashes() {
        let hasher = PasswordHasher::new(4);
        let mut user = test_user();
        let old_hash = user.password_hash.clone();

        user.set_password("new-password", &hasher).unwrap();

        assert_ne!(user.password_hash, old_hash);
        assert!(hasher.verify("new-password", &user.password_hash));
        assert!(!hasher.verify("secret123", &user.password_hash));
    }
}
