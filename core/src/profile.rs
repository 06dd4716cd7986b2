//! Viewing and editing the signed-in user's profile.
//!
//! # Design
//! The API is the source of truth; the long-lived `user`, `userDetails` and
//! `profilePicture` records are a cache that keeps the page usable without a
//! session or when the backend is down. Avatar uploads preview optimistically
//! into the cache and roll back if the server does not confirm them.

use serde::{Deserialize, Serialize};

use crate::avatar::absolutize;
use crate::error::{user_message, ApiError};
use crate::flow::{validate_avatar, AvatarFile, FlowError};
use crate::service::ApiService;
use crate::session::{keys, load_json, save_json, KeyValueStore, Session};
use crate::transport::Transport;
use crate::types::{PersonalDataOut, UpdateProfileRequest, UploadPictureRequest};

/// Cached `userDetails` record. Stored in camelCase.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CachedDetails {
    pub date_of_birth: String,
    pub primary_skill: String,
    pub skill_to_learn: String,
    pub bio: String,
}

/// Cached `user` record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CachedUser {
    pub email: String,
    pub phone: String,
    pub username: String,
}

/// Everything the profile page shows and edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileView {
    pub email: String,
    pub username: String,
    pub phone: String,
    pub date_of_birth: String,
    pub primary_skill: String,
    pub skill_to_learn: String,
    pub bio: String,
    pub avatar_url: Option<String>,
}

impl ProfileView {
    fn details(&self) -> CachedDetails {
        CachedDetails {
            date_of_birth: self.date_of_birth.clone(),
            primary_skill: self.primary_skill.clone(),
            skill_to_learn: self.skill_to_learn.clone(),
            bio: self.bio.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSource {
    Api,
    LocalCache,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedProfile {
    pub view: ProfileView,
    pub source: ProfileSource,
    /// Set when a session existed but the API call failed.
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProfileEditor<T, S> {
    service: ApiService<T>,
    store: S,
}

impl<T: Transport, S: KeyValueStore> ProfileEditor<T, S> {
    pub fn new(service: ApiService<T>, store: S) -> Self {
        Self { service, store }
    }

    /// Load from the API when there is a session, otherwise (or on failure)
    /// from the local cache.
    pub fn load(&self) -> LoadedProfile {
        let Some(session) = load_json::<Session>(&self.store, keys::USER_SESSION) else {
            tracing::debug!("no session, reading profile from local cache");
            return self.cached(None);
        };
        match self.service.current_profile() {
            Ok(envelope) => match envelope.data {
                Some(profile) => LoadedProfile {
                    view: self.view_from_api(&profile, &session),
                    source: ProfileSource::Api,
                    error: None,
                },
                None => self.cached(None),
            },
            Err(e) => self.cached(Some(user_message(&e))),
        }
    }

    /// Persist edits. The details are written to the local cache even when
    /// the server rejects them.
    pub fn save(&self, view: &ProfileView) -> Result<LoadedProfile, FlowError> {
        if view.primary_skill.trim().is_empty() {
            return Err(FlowError::Invalid("Primary skill is required".to_string()));
        }
        if view.skill_to_learn.trim().is_empty() {
            return Err(FlowError::Invalid("Skill to learn is required".to_string()));
        }
        let request = UpdateProfileRequest {
            date_of_birth: Some(view.date_of_birth.clone()),
            primary_skill: Some(view.primary_skill.clone()),
            skill_to_learn: Some(view.skill_to_learn.clone()),
            bio: Some(view.bio.clone()),
        };

        let outcome = self.service.update_profile(&request).map_err(FlowError::from).and_then(|envelope| {
            if envelope.is_success() {
                Ok(())
            } else if envelope.message.is_empty() {
                Err(FlowError::Rejected("Failed to update profile".to_string()))
            } else {
                Err(FlowError::Rejected(envelope.message))
            }
        });

        save_json(&self.store, keys::USER_DETAILS, &view.details());
        if let Err(e) = outcome {
            tracing::warn!(error = %e, "profile update failed, kept local copy");
            return Err(e);
        }
        save_json(
            &self.store,
            keys::USER,
            &CachedUser {
                email: view.email.clone(),
                phone: view.phone.clone(),
                username: view.username.clone(),
            },
        );
        Ok(self.load())
    }

    /// Upload a new avatar and return its absolute URL.
    ///
    /// The data URL is cached as a preview right away; it is replaced by the
    /// server URL on success and the previous avatar is restored on failure.
    pub fn upload_avatar(&self, file: &AvatarFile) -> Result<String, FlowError> {
        validate_avatar(file)?;
        let previous = self.store.get(keys::PROFILE_PICTURE);
        let image_data = file.data_url();
        self.store.set(keys::PROFILE_PICTURE, image_data.clone());

        let request = UploadPictureRequest {
            image_data,
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
        };
        let confirmed = self
            .service
            .upload_profile_picture(&request)
            .map_err(FlowError::from)
            .and_then(|envelope| {
                envelope
                    .data
                    .and_then(|data| data.profile_picture_url)
                    .filter(|url| !url.is_empty())
                    .ok_or_else(|| {
                        FlowError::Rejected(
                            "Upload succeeded but server did not return profile_picture_url".to_string(),
                        )
                    })
            });

        match confirmed {
            Ok(url) => {
                let full_url = absolutize(self.service.client().base_url(), &url);
                self.store.set(keys::PROFILE_PICTURE, full_url.clone());
                Ok(full_url)
            }
            Err(e) => {
                match previous {
                    Some(previous) => self.store.set(keys::PROFILE_PICTURE, previous),
                    None => self.store.remove(keys::PROFILE_PICTURE),
                }
                Err(e)
            }
        }
    }

    fn view_from_api(&self, profile: &PersonalDataOut, session: &Session) -> ProfileView {
        let user = session.user.clone().unwrap_or_default();
        let avatar_url = profile
            .profile_picture_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(|url| absolutize(self.service.client().base_url(), url));
        ProfileView {
            email: user.email.clone().unwrap_or_default(),
            username: user.display_username().unwrap_or_default(),
            phone: user.display_phone().unwrap_or_default(),
            date_of_birth: profile.date_of_birth.clone(),
            primary_skill: profile.primary_skill.clone(),
            skill_to_learn: profile.skill_to_learn.clone(),
            bio: profile.bio.clone(),
            avatar_url,
        }
    }

    fn cached(&self, error: Option<String>) -> LoadedProfile {
        let user: CachedUser = load_json(&self.store, keys::USER).unwrap_or_default();
        let details: CachedDetails = load_json(&self.store, keys::USER_DETAILS).unwrap_or_default();
        LoadedProfile {
            view: ProfileView {
                email: user.email,
                username: user.username,
                phone: user.phone,
                date_of_birth: details.date_of_birth,
                primary_skill: details.primary_skill,
                skill_to_learn: details.skill_to_learn,
                bio: details.bio,
                avatar_url: self.store.get(keys::PROFILE_PICTURE),
            },
            source: ProfileSource::LocalCache,
            error,
        }
    }
}

/// Message for a failed avatar upload.
pub fn upload_failure_message(error: &FlowError) -> String {
    format!("Failed to upload profile picture: {}", error.user_message())
}

/// Message for a failed save, keyed on the HTTP status where there is one.
pub fn save_failure_message(error: &FlowError) -> String {
    let detail = match error {
        FlowError::Api(ApiError::Http { status: 400, .. }) => {
            "Invalid data provided. Please check your inputs.".to_string()
        }
        FlowError::Api(ApiError::Http { status: 401, .. }) | FlowError::Api(ApiError::AuthenticationRequired) => {
            "Authentication required. Please log in again.".to_string()
        }
        FlowError::Api(ApiError::Http { status: 500, .. }) => "Server error. Please try again later.".to_string(),
        other => other.user_message(),
    };
    format!("Failed to save profile: {detail}")
}
