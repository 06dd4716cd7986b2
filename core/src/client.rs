//! HTTP request builder and response parser for the BarterUp API.
//!
//! # Design
//! `BarterClient` holds a `base_url` and a `CredentialProvider` and carries
//! no mutable state between calls. Each operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`. Authenticated builds fail with
//! `AuthenticationRequired` when the provider has no token, so no request
//! value ever exists for them.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::session::CredentialProvider;
use crate::types::{
    AuthData, CompleteProfileRequest, CreatePostRequest, EnhancedPost, Envelope, LoginRequest,
    PersonalDataOut, PictureData, PostOut, SignupData, SignupRequest, SkillsData,
    UpdateProfileRequest, UploadPictureRequest,
};

/// Synchronous, I/O-free client for the BarterUp API.
#[derive(Clone)]
pub struct BarterClient {
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl fmt::Debug for BarterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BarterClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl BarterClient {
    pub fn new(base_url: &str, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Build
    // -----------------------------------------------------------------------

    pub fn build_signup(&self, input: &SignupRequest) -> Result<HttpRequest, ApiError> {
        Ok(self.request(HttpMethod::Post, "/auth/signup", None, Some(json_body(input)?)))
    }

    pub fn build_complete_profile(&self, input: &CompleteProfileRequest) -> Result<HttpRequest, ApiError> {
        Ok(self.request(HttpMethod::Post, "/auth/complete-profile", None, Some(json_body(input)?)))
    }

    pub fn build_login(&self, input: &LoginRequest) -> Result<HttpRequest, ApiError> {
        Ok(self.request(HttpMethod::Post, "/auth/login", None, Some(json_body(input)?)))
    }

    pub fn build_skills(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/skills", None, None)
    }

    pub fn build_current_profile(&self) -> Result<HttpRequest, ApiError> {
        let token = self.require_token()?;
        Ok(self.request(HttpMethod::Get, "/api/profile", Some(token), None))
    }

    pub fn build_update_profile(&self, input: &UpdateProfileRequest) -> Result<HttpRequest, ApiError> {
        let token = self.require_token()?;
        Ok(self.request(HttpMethod::Put, "/api/profile", Some(token), Some(json_body(input)?)))
    }

    pub fn build_upload_profile_picture(&self, input: &UploadPictureRequest) -> Result<HttpRequest, ApiError> {
        let token = self.require_token()?;
        Ok(self.request(
            HttpMethod::Post,
            "/api/profile-picture/upload",
            Some(token),
            Some(json_body(input)?),
        ))
    }

    pub fn build_skip_profile_picture(&self) -> Result<HttpRequest, ApiError> {
        let token = self.require_token()?;
        Ok(self.request(HttpMethod::Post, "/api/profile-picture/skip", Some(token), None))
    }

    pub fn build_create_post(&self, input: &CreatePostRequest) -> Result<HttpRequest, ApiError> {
        let token = self.require_token()?;
        Ok(self.request(HttpMethod::Post, "/api/posts", Some(token), Some(json_body(input)?)))
    }

    /// Listing works anonymously; the token is attached when there is one so
    /// the server can flag the caller's own posts.
    pub fn build_list_posts(&self) -> HttpRequest {
        let token = self.credentials.access_token();
        self.request(HttpMethod::Get, "/api/posts", token, None)
    }

    pub fn build_test_connection(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/test/supabase", None, None)
    }

    // -----------------------------------------------------------------------
    // Parse
    // -----------------------------------------------------------------------

    pub fn parse_signup(&self, response: HttpResponse) -> Result<Envelope<SignupData>, ApiError> {
        self.parse_envelope(response)
    }

    pub fn parse_complete_profile(&self, response: HttpResponse) -> Result<Envelope<AuthData>, ApiError> {
        self.parse_envelope(response)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<Envelope<AuthData>, ApiError> {
        self.parse_envelope(response)
    }

    pub fn parse_skills(&self, response: HttpResponse) -> Result<Envelope<SkillsData>, ApiError> {
        self.parse_envelope(response)
    }

    /// Shared by `current_profile` and `update_profile`.
    pub fn parse_profile(&self, response: HttpResponse) -> Result<Envelope<PersonalDataOut>, ApiError> {
        self.parse_envelope(response)
    }

    pub fn parse_upload_profile_picture(&self, response: HttpResponse) -> Result<Envelope<PictureData>, ApiError> {
        self.parse_envelope(response)
    }

    pub fn parse_skip_profile_picture(&self, response: HttpResponse) -> Result<Envelope<Value>, ApiError> {
        self.parse_envelope(response)
    }

    pub fn parse_create_post(&self, response: HttpResponse) -> Result<Envelope<PostOut>, ApiError> {
        self.parse_envelope(response)
    }

    pub fn parse_list_posts(&self, response: HttpResponse) -> Result<Envelope<Vec<EnhancedPost>>, ApiError> {
        self.parse_envelope(response)
    }

    pub fn parse_test_connection(&self, response: HttpResponse) -> Result<Value, ApiError> {
        self.parse_payload(response)
    }

    /// Decode a response into its raw payload.
    ///
    /// 204 yields an empty object whatever the content type. Otherwise a
    /// JSON content type is parsed (failures become `null`) and anything
    /// else is kept as a string. Non-2xx statuses become `ApiError::Http`.
    pub fn parse_payload(&self, response: HttpResponse) -> Result<Value, ApiError> {
        if response.status == 204 {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        let payload = decode_body(&response);
        if !response.is_success() {
            return Err(ApiError::Http {
                status: response.status,
                message: error_message(&payload, response.status),
            });
        }
        Ok(payload)
    }

    /// Decode a response and require the `{status, message, data?}` shape.
    pub fn parse_envelope<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<Envelope<T>, ApiError> {
        let payload = self.parse_payload(response)?;
        serde_json::from_value(payload).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn require_token(&self) -> Result<String, ApiError> {
        self.credentials
            .access_token()
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::AuthenticationRequired)
    }

    fn request(&self, method: HttpMethod, path: &str, token: Option<String>, body: Option<String>) -> HttpRequest {
        let mut headers = vec![("content-type".to_string(), "application/json".to_string())];
        if let Some(token) = token {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers,
            body,
        }
    }
}

fn json_body<T: Serialize>(input: &T) -> Result<String, ApiError> {
    serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn decode_body(response: &HttpResponse) -> Value {
    let is_json = response
        .header("content-type")
        .is_some_and(|ct| ct.contains("application/json"));
    if is_json {
        serde_json::from_str(&response.body).unwrap_or(Value::Null)
    } else if response.body.is_empty() {
        Value::Null
    } else {
        Value::String(response.body.clone())
    }
}

/// `message`, then `error`, then a status-coded fallback.
fn error_message(payload: &Value, status: u16) -> String {
    ["message", "error"]
        .iter()
        .filter_map(|field| payload.get(field).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP error! status: {status}"))
}
