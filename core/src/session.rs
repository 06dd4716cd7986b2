//! Session record, client-side storage, and the credential provider seam.
//!
//! # Design
//! The API client never reads storage itself. It asks a
//! `CredentialProvider` for a token; `StoredSession` answers by reading the
//! tab-scoped `userSession` record out of a `KeyValueStore`, and
//! `StaticToken` lets tests hand in a token (or none) directly.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::types::PersonalDataOut;

/// Storage keys shared by every piece of code that persists client state.
pub mod keys {
    /// Tab-scoped: the JSON `Session` issued at login or profile completion.
    pub const USER_SESSION: &str = "userSession";
    /// Tab-scoped: credentials carried from signup/login into profile completion.
    pub const SIGNUP_DATA: &str = "signupData";
    /// Long-lived: cached `{email, phone, username}`.
    pub const USER: &str = "user";
    /// Long-lived: cached profile details in camelCase.
    pub const USER_DETAILS: &str = "userDetails";
    /// Long-lived: avatar as a data URL or absolute URL.
    pub const PROFILE_PICTURE: &str = "profilePicture";
}

/// Identity fields of the signed-in user, as far as the backend shares them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<serde_json::Value>,
}

impl SessionUser {
    /// Username from the top-level field or from `user_metadata.username`.
    pub fn display_username(&self) -> Option<String> {
        self.username.clone().or_else(|| self.metadata_str("username"))
    }

    pub fn display_phone(&self) -> Option<String> {
        self.phone.clone().or_else(|| self.metadata_str("phone"))
    }

    fn metadata_str(&self, key: &str) -> Option<String> {
        self.user_metadata
            .as_ref()
            .and_then(|meta| meta.get(key))
            .and_then(|value| value.as_str())
            .map(str::to_string)
    }
}

/// Client-held record of an authenticated identity.
///
/// Unknown fields returned by the backend are kept in `extra` so the record
/// round-trips through storage untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<PersonalDataOut>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            user: None,
            profile: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Profile picture URL carried in the session's profile, if non-empty.
    pub fn profile_picture_url(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .and_then(|profile| profile.profile_picture_url.as_deref())
            .filter(|url| !url.is_empty())
    }
}

/// String key-value storage in the style of browser storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

/// In-process `KeyValueStore`. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.remove(key);
    }
}

/// Read a JSON value stored under `key`. Missing or unparsable entries yield `None`.
pub fn load_json<T: serde::de::DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring unparsable stored value");
            None
        }
    }
}

/// Store `value` as JSON under `key`.
pub fn save_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => store.set(key, raw),
        Err(e) => tracing::error!(key, error = %e, "failed to encode value for storage"),
    }
}

/// Source of the bearer token for authenticated requests.
pub trait CredentialProvider: Send + Sync {
    fn access_token(&self) -> Option<String>;
}

/// Reads the token out of the `userSession` record in a store.
#[derive(Debug, Clone)]
pub struct StoredSession<S> {
    store: S,
}

impl<S: KeyValueStore> StoredSession<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn session(&self) -> Option<Session> {
        load_json(&self.store, keys::USER_SESSION)
    }
}

impl<S: KeyValueStore> CredentialProvider for StoredSession<S> {
    fn access_token(&self) -> Option<String> {
        self.session()
            .map(|session| session.access_token)
            .filter(|token| !token.is_empty())
    }
}

/// A fixed token, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticToken {
    fn access_token(&self) -> Option<String> {
        self.0.clone()
    }
}
