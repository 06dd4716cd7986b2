//! Full onboarding lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the auth flow,
//! profile editor, and feed through `ApiService` over real HTTP with the
//! default ureq transport. Validates that request building, response
//! parsing, and session storage work end-to-end with the actual server.

use std::sync::Arc;

use barterup_core::{
    error::{user_message, UNREACHABLE_MESSAGE},
    feed::DEMO_DATA_MESSAGE,
    flow::{AvatarFile, PersonalDetails},
    profile::ProfileSource,
    session::keys,
    types::{CreatePostRequest, UpdateProfileRequest},
    ApiError, ApiService, AuthFlow, ClientConfig, ContactBook, Feed, FollowOutcome, KeyValueStore, MemoryStore,
    ProfileEditor, Route, StaticToken, StoredSession,
};

/// Start the mock server on a random port and return its base URL.
fn spawn_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn details() -> PersonalDetails {
    PersonalDetails {
        day: "5".to_string(),
        month: "8".to_string(),
        year: "1999".to_string(),
        primary_skill: "Digital Art".to_string(),
        skill_to_learn: "Cooking".to_string(),
        bio: "Ilustrator lepas yang ingin belajar memasak.".to_string(),
    }
}

#[test]
fn onboarding_lifecycle() {
    let base_url = spawn_server();
    let store = MemoryStore::new();
    let service = ApiService::connect(&base_url, Arc::new(StoredSession::new(store.clone())));
    let flow = AuthFlow::new(service.clone(), store.clone());

    // Step 1: the backend answers the connection check.
    let status = service.test_connection().unwrap();
    assert_eq!(status["status"], "success");

    // Step 2: authenticated calls fail locally before any session exists.
    assert!(matches!(service.current_profile(), Err(ApiError::AuthenticationRequired)));

    // Step 3: signup stores pending credentials and moves to personal details.
    let route = flow.signup("rina", " Rina@BarterUp.id ", "rahasia1").unwrap();
    assert_eq!(route, Route::PersonalDetail);
    assert_eq!(flow.pending_signup().unwrap().email, "rina@barterup.id");

    // Step 4: a second signup with the same email is a 409 with the server message.
    let err = flow.signup("rina2", "rina@barterup.id", "rahasia1").unwrap_err();
    assert_eq!(err.user_message(), "Email already registered");

    // Step 5: skills feed the personal-detail form.
    let skills = flow.skills().unwrap();
    assert!(skills.iter().any(|s| s == "Digital Art"));

    // Step 6: completing the profile stores the session.
    let route = flow.complete_profile(&details()).unwrap();
    assert_eq!(route, Route::UploadProfile);
    assert!(flow.is_authenticated());
    assert!(flow.pending_signup().is_none());

    // Step 7: avatar upload through the profile editor.
    let editor = ProfileEditor::new(service.clone(), store.clone());
    let avatar = AvatarFile {
        file_name: "rina.png".to_string(),
        content_type: "image/png".to_string(),
        bytes: vec![0x89, 0x50, 0x4e, 0x47],
    };
    let url = editor.upload_avatar(&avatar).unwrap();
    assert!(url.starts_with(&base_url));
    assert!(url.ends_with("/rina.png"));
    assert_eq!(store.get(keys::PROFILE_PICTURE).as_deref(), Some(url.as_str()));
    assert_eq!(flow.skip_avatar().unwrap(), Route::Dashboard);

    // Step 8: the profile loads from the API and saves edits.
    let loaded = editor.load();
    assert_eq!(loaded.source, ProfileSource::Api);
    assert_eq!(loaded.view.username, "rina");
    assert_eq!(loaded.view.primary_skill, "Digital Art");
    assert_eq!(loaded.view.avatar_url.as_deref(), Some(url.as_str()));

    let mut edited = loaded.view.clone();
    edited.bio = "Sekarang juga mengajar menggambar.".to_string();
    let saved = editor.save(&edited).unwrap();
    assert_eq!(saved.view.bio, "Sekarang juga mengajar menggambar.");

    // Step 9: posting and listing; own posts are flagged and come first.
    let created = service
        .create_post(&CreatePostRequest {
            content: "Siapa mau tukar kelas gambar dengan kelas masak?".to_string(),
            image_url: None,
        })
        .unwrap();
    let created = created.data.unwrap();

    let session = flow.session();
    let feed = Feed::fetch(&service, session.as_ref());
    assert!(feed.error().is_none());
    assert_eq!(feed.posts().len(), 4);
    let first = &feed.posts()[0];
    assert_eq!(first.id, created.id);
    assert!(first.is_own_post);
    assert_eq!(first.author_name, "rina");
    assert_eq!(first.author_role, "Digital Art");
    assert_eq!(first.author_avatar.as_deref(), Some(url.as_str()));

    // Step 10: own posts cannot be followed, seed authors can.
    let mut contacts = ContactBook::with_defaults();
    assert_eq!(contacts.toggle_follow(first), FollowOutcome::Ignored);
    assert_eq!(contacts.toggle_follow(&feed.posts()[1]), FollowOutcome::Followed);
    assert_eq!(contacts.len(), 3);

    // Step 11: logging back in goes to the dashboard; a wrong password is rejected.
    assert_eq!(flow.login("rina@barterup.id", "rahasia1").unwrap(), Some(Route::Dashboard));
    let err = flow.login("rina@barterup.id", "salah123").unwrap_err();
    assert_eq!(err.user_message(), "Invalid email or password");
}

#[test]
fn login_before_profile_returns_to_personal_details() {
    let base_url = spawn_server();
    let store = MemoryStore::new();
    let service = ApiService::connect(&base_url, Arc::new(StoredSession::new(store.clone())));
    let flow = AuthFlow::new(service, store.clone());

    flow.signup("agus", "agus@barterup.id", "rahasia1").unwrap();
    store.remove(keys::SIGNUP_DATA);

    let route = flow.login("agus@barterup.id", "rahasia1").unwrap();
    assert_eq!(route, Some(Route::PersonalDetail));
    assert_eq!(flow.pending_signup().unwrap().email, "agus@barterup.id");
}

#[test]
fn server_rejects_stale_token() {
    let base_url = spawn_server();
    let config = ClientConfig::from_lookup(|key| (key == "BARTERUP_API_URL").then(|| base_url.clone())).unwrap();
    let service = ApiService::from_config(&config, Arc::new(StaticToken::new("stale-token")));
    assert_eq!(service.client().base_url(), base_url);

    let err = service
        .update_profile(&UpdateProfileRequest {
            bio: Some("x".to_string()),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(user_message(&err), "Invalid or expired token");

    // Listing posts tolerates the stale token and lists anonymously.
    let posts = service.list_posts().unwrap();
    assert!(posts.data.unwrap().is_empty());
}

#[test]
fn unreachable_backend_falls_back_to_seed_feed() {
    // Bind then drop to get a port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let service = ApiService::connect(&format!("http://127.0.0.1:{port}"), Arc::new(StaticToken::anonymous()));

    let err = service.skills().unwrap_err();
    assert!(matches!(err, ApiError::Unreachable(_)));
    assert_eq!(user_message(&err), UNREACHABLE_MESSAGE);

    let feed = Feed::fetch(&service, None);
    assert_eq!(feed.error(), Some(DEMO_DATA_MESSAGE));
    let ids: Vec<&str> = feed.posts().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["seed-1", "seed-2", "seed-3"]);
}
