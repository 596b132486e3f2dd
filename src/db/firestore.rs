// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! The store is authoritative for handle/email uniqueness: registration
//! inserts create-precondition index documents keyed by the lower-cased
//! handle and email, so two registrations racing on the same key are
//! serialized by Firestore itself and the loser gets a conflict, never a
//! silent overwrite.

use crate::db::collections;
use crate::error::AppError;
use crate::models::User;
use firestore::{errors::FirestoreError, paths};
use serde::{Deserialize, Serialize};

/// Index document reserving a unique key (handle or email) for one user.
#[derive(Debug, Serialize, Deserialize)]
struct UniqueKeyIndex {
    user_id: String,
    created_at: String,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by document ID.
    pub async fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Look up a user by handle or email (either unique key matches).
    ///
    /// Used both for uniqueness pre-checks at registration and for identity
    /// resolution at login. Keys are compared lower-cased, matching how
    /// records are stored.
    pub async fn find_user_by_handle_or_email(
        &self,
        user_name: &str,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        let user_name = user_name.trim().to_lowercase();
        let email = email.trim().to_lowercase();

        let mut matches: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| {
                q.for_any([
                    q.field("user_name").eq(user_name.clone()),
                    q.field("email").eq(email.clone()),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(matches.pop())
    }

    /// Create a new user record, reserving the handle and email.
    ///
    /// The index inserts use create preconditions, so a concurrent
    /// registration with the same handle or email fails here with a conflict
    /// regardless of any earlier application-level pre-check. If the email
    /// reservation fails after the handle reservation succeeded, the handle
    /// reservation is rolled back best-effort.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let client = self.get_client()?;
        let index = UniqueKeyIndex {
            user_id: user.id.clone(),
            created_at: user.created_at.clone(),
        };

        let _: UniqueKeyIndex = client
            .fluent()
            .insert()
            .into(collections::USER_HANDLES)
            .document_id(&user.user_name)
            .object(&index)
            .execute()
            .await
            .map_err(|e| conflict_or_db(e, "User with this handle already exists"))?;

        let email_reserved: Result<UniqueKeyIndex, AppError> = client
            .fluent()
            .insert()
            .into(collections::USER_EMAILS)
            .document_id(&user.email)
            .object(&index)
            .execute()
            .await
            .map_err(|e| conflict_or_db(e, "User with this email already exists"));

        if let Err(err) = email_reserved {
            self.release_index(collections::USER_HANDLES, &user.user_name)
                .await;
            return Err(err);
        }

        let created: Result<User, AppError> = client
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| conflict_or_db(e, "User record already exists"));

        if let Err(err) = created {
            self.release_index(collections::USER_HANDLES, &user.user_name)
                .await;
            self.release_index(collections::USER_EMAILS, &user.email).await;
            return Err(err);
        }

        Ok(())
    }

    /// Best-effort rollback of a uniqueness reservation.
    async fn release_index(&self, collection: &str, key: &str) {
        if let Ok(client) = self.get_client() {
            if let Err(e) = client
                .fluent()
                .delete()
                .from(collection)
                .document_id(key)
                .execute()
                .await
            {
                tracing::error!(collection, key, error = %e, "Failed to roll back uniqueness index");
            }
        }
    }

    /// Set or clear the stored refresh token.
    ///
    /// Field-masked write: only the refresh token and the updated-at stamp are
    /// touched, so no other field (in particular the password hash) can be
    /// rewritten as a side effect.
    pub async fn update_refresh_token(
        &self,
        user_id: &str,
        refresh_token: Option<String>,
    ) -> Result<(), AppError> {
        let mut user = self
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No user with id {}", user_id)))?;

        user.refresh_token = refresh_token;
        user.updated_at = chrono::Utc::now().to_rfc3339();

        let _: User = self
            .get_client()?
            .fluent()
            .update()
            .fields(paths!(User::{refresh_token, updated_at}))
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

/// Map a Firestore create-precondition failure to a conflict, anything else
/// to a database error.
fn conflict_or_db(err: FirestoreError, conflict_message: &str) -> AppError {
    match err {
        FirestoreError::DataConflictError(_) => AppError::Conflict(conflict_message.to_string()),
        other => AppError::Database(other.to_string()),
    }
}
