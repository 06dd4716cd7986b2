//! Signup, login, profile completion, the avatar step and composing posts.
//!
//! # Design
//! Each step validates its form input locally (nothing invalid reaches the
//! transport), calls the API, persists what the next step needs, and
//! answers with the `Route` the UI should show next.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error::{user_message, ApiError};
use crate::feed::{Feed, FeedContext};
use crate::service::ApiService;
use crate::session::{keys, load_json, save_json, KeyValueStore, Session};
use crate::transport::Transport;
use crate::types::{
    AuthData, CompleteProfileRequest, CreatePostRequest, Envelope, LoginRequest, ProfileData,
    SignupRequest, UploadPictureRequest,
};

/// Image types accepted for avatars.
pub const ALLOWED_IMAGE_TYPES: [&str; 5] = ["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp"];

/// Largest avatar the backend accepts.
pub const MAX_AVATAR_BYTES: usize = 20 * 1024 * 1024;

/// Longest post the compose box accepts, in characters.
pub const MAX_POST_CHARS: usize = 2000;

const MIN_PASSWORD_CHARS: usize = 6;
const MIN_BIO_CHARS: usize = 10;
const MAX_BIO_CHARS: usize = 1000;

/// Screens a flow step can lead to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Signup,
    Login,
    PersonalDetail,
    UploadProfile,
    Dashboard,
}

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// Form input failed local validation.
    #[error("{0}")]
    Invalid(String),

    /// Profile completion was reached without signup credentials in storage.
    #[error("Signup data not found. Please sign up again.")]
    SignupRequired,

    /// The server answered 2xx but with a non-success envelope.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl FlowError {
    /// Text to show next to the form.
    pub fn user_message(&self) -> String {
        match self {
            FlowError::Api(e) => user_message(e),
            other => other.to_string(),
        }
    }

    /// Where the UI should go instead of showing an error, if anywhere.
    pub fn redirect(&self) -> Option<Route> {
        match self {
            FlowError::SignupRequired => Some(Route::Signup),
            FlowError::Api(ApiError::AuthenticationRequired) => Some(Route::Login),
            _ => None,
        }
    }
}

fn invalid(message: &str) -> FlowError {
    FlowError::Invalid(message.to_string())
}

/// Credentials carried from signup or login into profile completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingSignup {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Raw personal-detail form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonalDetails {
    pub day: String,
    pub month: String,
    pub year: String,
    pub primary_skill: String,
    pub skill_to_learn: String,
    pub bio: String,
}

/// A picked avatar file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl AvatarFile {
    /// The file as a base64 data URL.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, BASE64_STANDARD.encode(&self.bytes))
    }
}

/// Check type and size of an avatar before anything is encoded or sent.
pub fn validate_avatar(file: &AvatarFile) -> Result<(), FlowError> {
    if !ALLOWED_IMAGE_TYPES.contains(&file.content_type.as_str()) {
        return Err(invalid("Please select a valid image file (JPEG, PNG, GIF, or WEBP)."));
    }
    if file.bytes.len() > MAX_AVATAR_BYTES {
        return Err(invalid("File size too large. Maximum 20MB allowed."));
    }
    Ok(())
}

/// Validate the personal-detail form and shape it for the API.
///
/// The date of birth is sent as `DD/MM/YYYY`.
pub fn validate_personal_details(details: &PersonalDetails, current_year: i32) -> Result<ProfileData, FlowError> {
    let fields = [
        &details.day,
        &details.month,
        &details.year,
        &details.primary_skill,
        &details.skill_to_learn,
        &details.bio,
    ];
    if fields.iter().any(|field| field.trim().is_empty()) {
        return Err(invalid("All fields are required."));
    }
    if details.primary_skill == details.skill_to_learn {
        return Err(invalid("Primary skill and skill to learn must be different."));
    }
    let bio = details.bio.trim();
    if bio.chars().count() < MIN_BIO_CHARS {
        return Err(invalid("Bio must be at least 10 characters long."));
    }
    if details.bio.chars().count() > MAX_BIO_CHARS {
        return Err(invalid("Bio must be less than 1000 characters."));
    }

    let day = details.day.trim().parse::<u32>().ok().filter(|d| (1..=31).contains(d));
    let month = details.month.trim().parse::<u32>().ok().filter(|m| (1..=12).contains(m));
    let year = details
        .year
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|y| (1900..=current_year).contains(y));
    let (Some(day), Some(month), Some(year)) = (day, month, year) else {
        return Err(invalid("Please enter a valid date."));
    };

    Ok(ProfileData {
        date_of_birth: format!("{day:02}/{month:02}/{year}"),
        primary_skill: details.primary_skill.clone(),
        skill_to_learn: details.skill_to_learn.clone(),
        bio: bio.to_string(),
    })
}

/// Trim a post and check it is neither blank nor too long.
pub fn validate_post(text: &str) -> Result<String, FlowError> {
    let content = text.trim();
    if content.is_empty() {
        return Err(invalid("Isi postingan tidak boleh kosong."));
    }
    if content.chars().count() > MAX_POST_CHARS {
        return Err(invalid("Postingan maksimal 2000 karakter."));
    }
    Ok(content.to_string())
}

/// Drives the onboarding screens against an `ApiService` and a store.
#[derive(Debug, Clone)]
pub struct AuthFlow<T, S> {
    service: ApiService<T>,
    store: S,
}

impl<T: Transport, S: KeyValueStore> AuthFlow<T, S> {
    /// `store` should be the same store the service's credential provider reads.
    pub fn new(service: ApiService<T>, store: S) -> Self {
        Self { service, store }
    }

    pub fn service(&self) -> &ApiService<T> {
        &self.service
    }

    pub fn session(&self) -> Option<Session> {
        load_json(&self.store, keys::USER_SESSION)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    pub fn pending_signup(&self) -> Option<PendingSignup> {
        load_json(&self.store, keys::SIGNUP_DATA)
    }

    pub fn signup(&self, username: &str, email: &str, password: &str) -> Result<Route, FlowError> {
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(invalid("Username, email, and password are required."));
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(invalid("Password must be at least 6 characters long."));
        }
        let request = SignupRequest {
            username: username.trim().to_string(),
            email: normalize_email(email),
            password: password.to_string(),
        };
        let envelope = self.service.signup(&request)?;
        ensure_success(&envelope, "Signup failed")?;
        save_json(
            &self.store,
            keys::SIGNUP_DATA,
            &PendingSignup {
                email: request.email,
                password: request.password,
                username: Some(request.username),
            },
        );
        tracing::info!("signup accepted, continuing to personal details");
        Ok(Route::PersonalDetail)
    }

    /// Log in. `None` means the server named a next step this client does
    /// not know; the UI stays where it is.
    pub fn login(&self, email: &str, password: &str) -> Result<Option<Route>, FlowError> {
        if email.is_empty() || password.is_empty() {
            return Err(invalid("Email and password are required."));
        }
        let request = LoginRequest {
            email: normalize_email(email),
            password: password.to_string(),
        };
        let envelope = self.service.login(&request)?;
        ensure_success(&envelope, "Login failed")?;
        let data = envelope.data.unwrap_or_default();
        self.store_session(&data);

        let route = match data.next_step.as_str() {
            "complete_profile" => {
                save_json(
                    &self.store,
                    keys::SIGNUP_DATA,
                    &PendingSignup {
                        email: request.email,
                        password: request.password,
                        username: None,
                    },
                );
                Some(Route::PersonalDetail)
            }
            "dashboard" => Some(Route::Dashboard),
            other => {
                tracing::warn!(next_step = other, "unknown next step after login");
                None
            }
        };
        Ok(route)
    }

    /// Skill tags for the personal-detail form.
    pub fn skills(&self) -> Result<Vec<String>, FlowError> {
        let envelope = self.service.skills()?;
        Ok(envelope.data.map(|data| data.skills).unwrap_or_default())
    }

    pub fn complete_profile(&self, details: &PersonalDetails) -> Result<Route, FlowError> {
        self.complete_profile_in_year(details, chrono::Utc::now().year())
    }

    pub fn complete_profile_in_year(&self, details: &PersonalDetails, current_year: i32) -> Result<Route, FlowError> {
        let profile = validate_personal_details(details, current_year)?;
        let pending = self.pending_signup().ok_or(FlowError::SignupRequired)?;
        let request = CompleteProfileRequest {
            email: pending.email,
            password: pending.password,
            profile,
        };
        let envelope = self.service.complete_profile(&request)?;
        ensure_success(&envelope, "Profile completion failed")?;
        self.store.remove(keys::SIGNUP_DATA);
        let data = envelope.data.unwrap_or_default();
        self.store_session(&data);

        if data.next_step == "upload_profile" {
            Ok(Route::UploadProfile)
        } else {
            Ok(Route::Dashboard)
        }
    }

    pub fn upload_avatar(&self, file: &AvatarFile) -> Result<Route, FlowError> {
        validate_avatar(file)?;
        let request = UploadPictureRequest {
            image_data: file.data_url(),
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
        };
        let envelope = self.service.upload_profile_picture(&request)?;
        ensure_success(&envelope, "Upload failed")?;
        Ok(Route::Dashboard)
    }

    pub fn skip_avatar(&self) -> Result<Route, FlowError> {
        let envelope = self.service.skip_profile_picture()?;
        ensure_success(&envelope, "Skip failed")?;
        Ok(Route::Dashboard)
    }

    /// Publish a post and put it at the top of `feed`.
    pub fn publish_post(&self, text: &str, feed: &mut Feed) -> Result<(), FlowError> {
        let content = validate_post(text)?;
        let envelope = self.service.create_post(&CreatePostRequest {
            content,
            image_url: None,
        })?;
        ensure_success(&envelope, "Failed to create post")?;

        let session = self.session();
        let ctx = FeedContext {
            base_url: self.service.client().base_url(),
            session: session.as_ref(),
        };
        match envelope.data {
            Some(post) => feed.prepend_created(post, &ctx),
            None => tracing::warn!("post created but not returned, feed left unchanged"),
        }
        Ok(())
    }

    fn store_session(&self, data: &AuthData) {
        if let Some(session) = &data.session {
            save_json(&self.store, keys::USER_SESSION, session);
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn ensure_success<D>(envelope: &Envelope<D>, fallback: &str) -> Result<(), FlowError> {
    if envelope.is_success() {
        return Ok(());
    }
    let message = if envelope.message.is_empty() {
        fallback.to_string()
    } else {
        envelope.message.clone()
    };
    Err(FlowError::Rejected(message))
}
