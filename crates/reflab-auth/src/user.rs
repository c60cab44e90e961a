//! User records and their storage over the document store.
//!
//! Users live in the `"user"` collection as plain documents; the typed
//! [`User`] view pairs the envelope id with the parsed body. The public
//! projection never includes the password hash.

use std::sync::Arc;

use async_trait::async_trait;
use reflab_core::{DocumentId, Role};
use reflab_storage::{DocumentStore, StoredDocument};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::AuthResult;
use crate::error::AuthError;

/// Collection name for user documents.
pub const USER_COLLECTION: &str = "user";

/// A user in the authentication system.
#[derive(Debug, Clone)]
pub struct User {
    /// Server-assigned identifier.
    pub id: DocumentId,
    /// Display name.
    pub name: String,
    /// Login handle; unique by convention, enforced at register time.
    pub email: String,
    /// Argon2 hash of the password.
    pub password_hash: String,
    /// Assigned role.
    pub role: Role,
    /// Inactive users cannot authenticate.
    pub is_active: bool,
}

/// The body of a user document as persisted in the store.
#[derive(Debug, Serialize, Deserialize)]
struct UserBody {
    name: String,
    email: String,
    password_hash: String,
    role: Role,
    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_active() -> bool {
    true
}

impl User {
    /// Builds a typed user from a stored document.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if the document body does not parse as
    /// a user record.
    pub fn from_document(doc: &StoredDocument) -> AuthResult<Self> {
        let body: UserBody = serde_json::from_value(doc.body.clone())
            .map_err(|e| AuthError::internal(format!("corrupt user document {}: {e}", doc.id)))?;
        Ok(Self {
            id: doc.id,
            name: body.name,
            email: body.email,
            password_hash: body.password_hash,
            role: body.role,
            is_active: body.is_active,
        })
    }

    /// Returns the public projection: no hash, no internal fields.
    #[must_use]
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.to_string(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            is_active: self.is_active,
        }
    }
}

/// The external-facing shape of a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
}

/// Storage operations for users.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Finds a user by id. Returns `None` if the user doesn't exist.
    async fn find_by_id(&self, id: &DocumentId) -> AuthResult<Option<User>>;

    /// Finds a user by email. Returns `None` if the user doesn't exist.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Persists a new user record and returns it with its assigned id.
    ///
    /// Email uniqueness is the caller's responsibility (find-then-insert);
    /// the store itself enforces nothing.
    async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> AuthResult<User>;

    /// Counts users holding the given role. Used by the bootstrap path.
    async fn count_by_role(&self, role: Role) -> AuthResult<usize>;
}

/// `UserStorage` over a [`DocumentStore`] collection.
pub struct DocumentUserStore {
    store: Arc<dyn DocumentStore>,
}

impl DocumentUserStore {
    /// Creates a user store over the given document store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserStorage for DocumentUserStore {
    async fn find_by_id(&self, id: &DocumentId) -> AuthResult<Option<User>> {
        match self.store.find_by_id(USER_COLLECTION, id).await? {
            Some(doc) => Ok(Some(User::from_document(&doc)?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        match self.store.find_one(USER_COLLECTION, "email", email).await? {
            Some(doc) => Ok(Some(User::from_document(&doc)?)),
            None => Ok(None),
        }
    }

    async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> AuthResult<User> {
        let body = json!({
            "name": name,
            "email": email,
            "password_hash": password_hash,
            "role": role,
            "is_active": true,
        });
        let doc = self.store.insert(USER_COLLECTION, body).await?;
        User::from_document(&doc)
    }

    async fn count_by_role(&self, role: Role) -> AuthResult<usize> {
        Ok(self
            .store
            .count_matching(USER_COLLECTION, "role", role.as_str())
            .await?)
    }
}
