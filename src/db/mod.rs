//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Uniqueness index: document id = lower-cased handle
    pub const USER_HANDLES: &str = "user_handles";
    /// Uniqueness index: document id = lower-cased email
    pub const USER_EMAILS: &str = "user_emails";
}
