//! One-call API operations over a `Transport`.
//!
//! `ApiService` pairs a `BarterClient` with a transport: build, execute,
//! parse. Every failure is logged once here and handed back to the caller.
//! Nothing is retried.

use std::sync::Arc;

use serde_json::Value;

use crate::client::BarterClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::session::CredentialProvider;
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    AuthData, CompleteProfileRequest, CreatePostRequest, EnhancedPost, Envelope, LoginRequest,
    PersonalDataOut, PictureData, PostOut, SignupData, SignupRequest, SkillsData,
    UpdateProfileRequest, UploadPictureRequest,
};

#[derive(Debug, Clone)]
pub struct ApiService<T = UreqTransport> {
    client: BarterClient,
    transport: T,
}

impl ApiService<UreqTransport> {
    /// Service over the default blocking transport.
    pub fn connect(base_url: &str, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::new(BarterClient::new(base_url, credentials), UreqTransport::new())
    }

    pub fn from_config(config: &ClientConfig, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::connect(&config.api_url, credentials)
    }
}

impl<T: Transport> ApiService<T> {
    pub fn new(client: BarterClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &BarterClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn signup(&self, input: &SignupRequest) -> Result<Envelope<SignupData>, ApiError> {
        self.run("signup", |c| c.build_signup(input), |c, r| c.parse_signup(r))
    }

    pub fn complete_profile(&self, input: &CompleteProfileRequest) -> Result<Envelope<AuthData>, ApiError> {
        self.run(
            "complete_profile",
            |c| c.build_complete_profile(input),
            |c, r| c.parse_complete_profile(r),
        )
    }

    pub fn login(&self, input: &LoginRequest) -> Result<Envelope<AuthData>, ApiError> {
        self.run("login", |c| c.build_login(input), |c, r| c.parse_login(r))
    }

    pub fn skills(&self) -> Result<Envelope<SkillsData>, ApiError> {
        self.run("skills", |c| Ok(c.build_skills()), |c, r| c.parse_skills(r))
    }

    pub fn current_profile(&self) -> Result<Envelope<PersonalDataOut>, ApiError> {
        self.run(
            "current_profile",
            |c| c.build_current_profile(),
            |c, r| c.parse_profile(r),
        )
    }

    pub fn update_profile(&self, input: &UpdateProfileRequest) -> Result<Envelope<PersonalDataOut>, ApiError> {
        tracing::debug!(?input, "sending profile update");
        self.run(
            "update_profile",
            |c| c.build_update_profile(input),
            |c, r| c.parse_profile(r),
        )
    }

    pub fn upload_profile_picture(&self, input: &UploadPictureRequest) -> Result<Envelope<PictureData>, ApiError> {
        tracing::debug!(file_name = %input.file_name, content_type = %input.content_type, "uploading profile picture");
        self.run(
            "upload_profile_picture",
            |c| c.build_upload_profile_picture(input),
            |c, r| c.parse_upload_profile_picture(r),
        )
    }

    pub fn skip_profile_picture(&self) -> Result<Envelope<Value>, ApiError> {
        self.run(
            "skip_profile_picture",
            |c| c.build_skip_profile_picture(),
            |c, r| c.parse_skip_profile_picture(r),
        )
    }

    pub fn create_post(&self, input: &CreatePostRequest) -> Result<Envelope<PostOut>, ApiError> {
        self.run("create_post", |c| c.build_create_post(input), |c, r| c.parse_create_post(r))
    }

    pub fn list_posts(&self) -> Result<Envelope<Vec<EnhancedPost>>, ApiError> {
        self.run("list_posts", |c| Ok(c.build_list_posts()), |c, r| c.parse_list_posts(r))
    }

    pub fn test_connection(&self) -> Result<Value, ApiError> {
        self.run(
            "test_connection",
            |c| Ok(c.build_test_connection()),
            |c, r| c.parse_test_connection(r),
        )
    }

    fn run<R>(
        &self,
        operation: &'static str,
        build: impl FnOnce(&BarterClient) -> Result<HttpRequest, ApiError>,
        parse: impl FnOnce(&BarterClient, HttpResponse) -> Result<R, ApiError>,
    ) -> Result<R, ApiError> {
        let result = build(&self.client).and_then(|request| {
            tracing::debug!(operation, method = request.method.as_str(), url = %request.url, "sending request");
            let response = self.transport.execute(request)?;
            tracing::debug!(operation, status = response.status, "received response");
            parse(&self.client, response)
        });
        if let Err(e) = &result {
            tracing::error!(operation, error = %e, "API request failed");
        }
        result
    }
}
