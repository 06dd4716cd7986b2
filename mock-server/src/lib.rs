use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const MIN_PASSWORD_CHARS: usize = 6;

/// Skill tags offered by `GET /api/skills`.
pub const SKILLS: &[&str] = &[
    "Art",
    "Cooking",
    "Design",
    "Digital Art",
    "Graphic Design",
    "Languages",
    "Music",
    "Photography",
    "Programming",
    "Web Development",
];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

fn success<T>(message: &str, data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        status: "success".to_string(),
        message: message.to_string(),
        data: Some(data),
    })
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date_of_birth: String,
    pub primary_skill: String,
    pub skill_to_learn: String,
    pub bio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub username: String,
    pub profile: Option<Profile>,
    pub picture_skipped: bool,
}

impl Account {
    fn session(&self, access_token: &str) -> Value {
        json!({
            "access_token": access_token,
            "user": {
                "id": self.id,
                "email": self.email,
                "user_metadata": { "username": self.username },
            },
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post as listed by `GET /api/posts`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnhancedPost {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub author_role: String,
    pub author_primary_skill: Option<String>,
    pub is_own_post: bool,
}

#[derive(Deserialize)]
pub struct SignupInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ProfileInput {
    pub date_of_birth: String,
    pub primary_skill: String,
    pub skill_to_learn: String,
    #[serde(default)]
    pub bio: String,
}

#[derive(Deserialize)]
pub struct CompleteProfileInput {
    pub email: String,
    pub password: String,
    pub profile: ProfileInput,
}

#[derive(Deserialize)]
pub struct UpdateProfileInput {
    pub date_of_birth: Option<String>,
    pub primary_skill: Option<String>,
    pub skill_to_learn: Option<String>,
    pub bio: Option<String>,
}

#[derive(Deserialize)]
pub struct UploadPictureInput {
    pub image_data: String,
    pub file_name: String,
    pub content_type: String,
}

#[derive(Deserialize)]
pub struct CreatePostInput {
    pub content: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Default)]
pub struct Store {
    accounts: HashMap<Uuid, Account>,
    tokens: HashMap<String, Uuid>,
    posts: Vec<Post>,
}

impl Store {
    fn by_credentials(&self, email: &str, password: &str) -> Option<&Account> {
        let email = email.trim().to_lowercase();
        self.accounts
            .values()
            .find(|a| a.email == email && a.password == password)
    }

    fn issue_token(&mut self, user_id: Uuid) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens.insert(token.clone(), user_id);
        token
    }

    fn enhance(&self, post: &Post, viewer: Option<Uuid>) -> EnhancedPost {
        let author = self.accounts.get(&post.user_id);
        let profile = author.and_then(|a| a.profile.as_ref());
        let primary_skill = profile
            .map(|p| p.primary_skill.clone())
            .filter(|s| !s.is_empty());
        EnhancedPost {
            id: post.id,
            user_id: post.user_id,
            content: post.content.clone(),
            image_url: post.image_url.clone(),
            created_at: post.created_at,
            updated_at: post.updated_at,
            author_name: author.map(|a| a.username.clone()).unwrap_or_default(),
            author_avatar: profile.and_then(|p| p.profile_picture_url.clone()),
            author_role: primary_skill.clone().unwrap_or_else(|| "User".to_string()),
            author_primary_skill: primary_skill,
            is_own_post: viewer == Some(post.user_id),
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Error responses. Token problems carry an `error` field, everything else
/// a `message` field.
#[derive(Debug)]
pub enum Rejection {
    Unauthorized(&'static str),
    InvalidCredentials,
    BadRequest(String),
    Conflict(String),
    NotFound(String),
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Rejection::Unauthorized(error) => {
                (StatusCode::UNAUTHORIZED, json!({ "status": "error", "error": error }))
            }
            Rejection::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                json!({ "status": "error", "message": "Invalid email or password" }),
            ),
            Rejection::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "status": "error", "message": message }))
            }
            Rejection::Conflict(message) => {
                (StatusCode::CONFLICT, json!({ "status": "error", "message": message }))
            }
            Rejection::NotFound(message) => {
                (StatusCode::NOT_FOUND, json!({ "status": "error", "message": message }))
            }
        };
        (status, Json(body)).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/complete-profile", post(complete_profile))
        .route("/auth/login", post(login))
        .route("/api/skills", get(skills))
        .route("/api/profile", get(get_profile).put(update_profile))
        .route("/api/profile-picture/upload", post(upload_picture))
        .route("/api/profile-picture/skip", post(skip_picture))
        .route("/api/posts", get(list_posts).post(create_post))
        .route("/test/supabase", get(test_connection))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn authenticate(db: &Db, headers: &HeaderMap) -> Result<Uuid, Rejection> {
    let token = bearer(headers).ok_or(Rejection::Unauthorized("Missing authorization token"))?;
    db.read()
        .await
        .tokens
        .get(token)
        .copied()
        .ok_or(Rejection::Unauthorized("Invalid or expired token"))
}

async fn signup(
    State(db): State<Db>,
    Json(input): Json<SignupInput>,
) -> Result<(StatusCode, Json<Envelope<Value>>), Rejection> {
    let email = input.email.trim().to_lowercase();
    let username = input.username.trim().to_string();
    if email.is_empty() || username.is_empty() || input.password.is_empty() {
        return Err(Rejection::BadRequest(
            "Email, password, and username are required".to_string(),
        ));
    }
    if input.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(Rejection::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }

    let mut store = db.write().await;
    if store.accounts.values().any(|a| a.email == email) {
        return Err(Rejection::Conflict("Email already registered".to_string()));
    }
    let account = Account {
        id: Uuid::new_v4(),
        email,
        password: input.password,
        username,
        profile: None,
        picture_skipped: false,
    };
    let user_id = account.id;
    store.accounts.insert(user_id, account);
    tracing::info!(%user_id, "account created");

    let data = json!({
        "user_id": user_id,
        "message": "Signup successful. Please complete your profile.",
        "next_step": "complete_profile",
    });
    Ok((StatusCode::CREATED, success("Signup successful", data)))
}

async fn complete_profile(
    State(db): State<Db>,
    Json(input): Json<CompleteProfileInput>,
) -> Result<Json<Envelope<Value>>, Rejection> {
    if input.profile.primary_skill.trim().is_empty() || input.profile.skill_to_learn.trim().is_empty() {
        return Err(Rejection::BadRequest(
            "Primary skill and skill to learn are required".to_string(),
        ));
    }

    let mut store = db.write().await;
    let user_id = store
        .by_credentials(&input.email, &input.password)
        .map(|a| a.id)
        .ok_or(Rejection::InvalidCredentials)?;
    let token = store.issue_token(user_id);
    let account = store
        .accounts
        .get_mut(&user_id)
        .ok_or(Rejection::InvalidCredentials)?;
    let profile = Profile {
        id: Uuid::new_v4(),
        user_id,
        date_of_birth: input.profile.date_of_birth,
        primary_skill: input.profile.primary_skill,
        skill_to_learn: input.profile.skill_to_learn,
        bio: input.profile.bio,
        profile_picture_url: None,
        full_name: None,
    };
    account.profile = Some(profile.clone());
    tracing::info!(%user_id, "profile completed");

    let data = json!({
        "session": account.session(&token),
        "profile": profile,
        "message": "Profile completed",
        "next_step": "upload_profile",
    });
    Ok(success("Profile completed", data))
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<LoginInput>,
) -> Result<Json<Envelope<Value>>, Rejection> {
    let mut store = db.write().await;
    let account = store
        .by_credentials(&input.email, &input.password)
        .cloned()
        .ok_or(Rejection::InvalidCredentials)?;
    let token = store.issue_token(account.id);
    let next_step = if account.profile.is_some() {
        "dashboard"
    } else {
        "complete_profile"
    };
    tracing::info!(user_id = %account.id, next_step, "login");

    let data = json!({
        "session": account.session(&token),
        "profile": account.profile,
        "message": "Login successful",
        "next_step": next_step,
    });
    Ok(success("Login successful", data))
}

async fn skills() -> Json<Envelope<Value>> {
    success(
        "Skills retrieved",
        json!({ "skills": SKILLS, "total": SKILLS.len() }),
    )
}

async fn get_profile(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Envelope<Profile>>, Rejection> {
    let user_id = authenticate(&db, &headers).await?;
    let store = db.read().await;
    store
        .accounts
        .get(&user_id)
        .and_then(|a| a.profile.clone())
        .map(|profile| success("Profile retrieved", profile))
        .ok_or_else(|| Rejection::NotFound("Profile not found".to_string()))
}

async fn update_profile(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<UpdateProfileInput>,
) -> Result<Json<Envelope<Profile>>, Rejection> {
    let user_id = authenticate(&db, &headers).await?;
    if [&input.primary_skill, &input.skill_to_learn]
        .into_iter()
        .flatten()
        .any(|skill| skill.trim().is_empty())
    {
        return Err(Rejection::BadRequest("Skills cannot be empty".to_string()));
    }

    let mut store = db.write().await;
    let profile = store
        .accounts
        .get_mut(&user_id)
        .and_then(|a| a.profile.as_mut())
        .ok_or_else(|| Rejection::NotFound("Profile not found".to_string()))?;
    if let Some(date_of_birth) = input.date_of_birth {
        profile.date_of_birth = date_of_birth;
    }
    if let Some(primary_skill) = input.primary_skill {
        profile.primary_skill = primary_skill;
    }
    if let Some(skill_to_learn) = input.skill_to_learn {
        profile.skill_to_learn = skill_to_learn;
    }
    if let Some(bio) = input.bio {
        profile.bio = bio;
    }
    Ok(success("Profile updated", profile.clone()))
}

async fn upload_picture(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<UploadPictureInput>,
) -> Result<Json<Envelope<Value>>, Rejection> {
    let user_id = authenticate(&db, &headers).await?;
    if !input.content_type.starts_with("image/") || !input.image_data.starts_with("data:image/") {
        return Err(Rejection::BadRequest("Invalid image data".to_string()));
    }
    if input.file_name.trim().is_empty() {
        return Err(Rejection::BadRequest("File name is required".to_string()));
    }

    let mut store = db.write().await;
    let profile = store
        .accounts
        .get_mut(&user_id)
        .and_then(|a| a.profile.as_mut())
        .ok_or_else(|| Rejection::NotFound("Profile not found".to_string()))?;
    let url = format!("/uploads/{user_id}/{}", input.file_name);
    profile.profile_picture_url = Some(url.clone());
    tracing::info!(%user_id, %url, "profile picture stored");
    Ok(success(
        "Profile picture uploaded",
        json!({ "profile_picture_url": url }),
    ))
}

async fn skip_picture(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Envelope<Value>>, Rejection> {
    let user_id = authenticate(&db, &headers).await?;
    let mut store = db.write().await;
    if let Some(account) = store.accounts.get_mut(&user_id) {
        account.picture_skipped = true;
    }
    Ok(success(
        "Profile picture skipped",
        json!({ "next_step": "dashboard" }),
    ))
}

async fn create_post(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreatePostInput>,
) -> Result<(StatusCode, Json<Envelope<Post>>), Rejection> {
    let user_id = authenticate(&db, &headers).await?;
    let content = input.content.trim().to_string();
    if content.is_empty() {
        return Err(Rejection::BadRequest("Content is required".to_string()));
    }
    let now = Utc::now();
    let post = Post {
        id: Uuid::new_v4(),
        user_id,
        content,
        image_url: input.image_url.filter(|url| !url.is_empty()),
        created_at: now,
        updated_at: now,
    };
    db.write().await.posts.push(post.clone());
    Ok((StatusCode::CREATED, success("Post created", post)))
}

/// Newest first. A missing or unknown token lists anonymously.
async fn list_posts(State(db): State<Db>, headers: HeaderMap) -> Json<Envelope<Vec<EnhancedPost>>> {
    let store = db.read().await;
    let viewer = bearer(&headers).and_then(|token| store.tokens.get(token).copied());
    let posts: Vec<EnhancedPost> = store
        .posts
        .iter()
        .rev()
        .map(|post| store.enhance(post, viewer))
        .collect();
    success("Posts retrieved", posts)
}

async fn test_connection(State(db): State<Db>) -> Json<Envelope<Value>> {
    let store = db.read().await;
    success(
        "Connection OK",
        json!({ "accounts": store.accounts.len(), "posts": store.posts.len() }),
    )
}
