//! Avatar URL resolution.
//!
//! # Design
//! `AvatarResolver` evaluates an ordered list of sources and takes the first
//! non-empty answer:
//!
//! 1. the session's profile picture (own posts only)
//! 2. the locally cached avatar (own posts only)
//! 3. the avatar the post carries
//! 4. a default picked from the author's primary skill
//! 5. the global default
//!
//! Relative server paths are joined to the API base URL on the way out.

use crate::session::Session;
use crate::types::EnhancedPost;

/// Global fallback avatar.
pub const DEFAULT_AVATAR: &str = "/assets/W1.jpg";
/// Default for design-oriented skills.
pub const DESIGN_AVATAR: &str = "/assets/male1.jpg";
/// Default for programming skills.
pub const CODING_AVATAR: &str = "/assets/W2.jpg";

/// Prefixes of images bundled with the client rather than served by the API.
const BUNDLED_PREFIXES: [&str; 3] = ["/assets/", "/src/", "/_astro/"];

/// Make a server-relative avatar path absolute against `base_url`.
///
/// Absolute URLs, data/blob URLs and bundled assets pass through untouched.
pub fn absolutize(base_url: &str, url: &str) -> String {
    let passthrough = ["http://", "https://", "data:", "blob:"]
        .iter()
        .chain(BUNDLED_PREFIXES.iter())
        .any(|prefix| url.starts_with(prefix));
    if !passthrough && url.starts_with('/') {
        format!("{}{url}", base_url.trim_end_matches('/'))
    } else {
        url.to_string()
    }
}

/// Everything a source may consult.
#[derive(Debug, Clone, Copy)]
pub struct AvatarContext<'a> {
    pub post: &'a EnhancedPost,
    pub session: Option<&'a Session>,
    pub cached_avatar: Option<&'a str>,
    pub base_url: &'a str,
}

pub type AvatarSource = fn(&AvatarContext<'_>) -> Option<String>;

pub fn session_profile_picture(ctx: &AvatarContext<'_>) -> Option<String> {
    if !ctx.post.is_own_post {
        return None;
    }
    ctx.session
        .and_then(Session::profile_picture_url)
        .map(|url| absolutize(ctx.base_url, url))
}

pub fn cached_avatar(ctx: &AvatarContext<'_>) -> Option<String> {
    if !ctx.post.is_own_post {
        return None;
    }
    ctx.cached_avatar
        .filter(|url| !url.is_empty())
        .map(|url| absolutize(ctx.base_url, url))
}

pub fn post_avatar(ctx: &AvatarContext<'_>) -> Option<String> {
    ctx.post
        .author_avatar
        .as_deref()
        .filter(|url| !url.is_empty())
        .map(|url| absolutize(ctx.base_url, url))
}

pub fn skill_default(ctx: &AvatarContext<'_>) -> Option<String> {
    let skill = ctx.post.author_primary_skill.as_deref()?.to_lowercase();
    let avatar = if skill.contains("art") {
        DEFAULT_AVATAR
    } else if skill.contains("design") {
        DESIGN_AVATAR
    } else if skill.contains("programming") || skill.contains("web development") {
        CODING_AVATAR
    } else {
        return None;
    };
    Some(avatar.to_string())
}

pub fn global_default(_: &AvatarContext<'_>) -> Option<String> {
    Some(DEFAULT_AVATAR.to_string())
}

#[derive(Debug, Clone)]
pub struct AvatarResolver {
    sources: Vec<AvatarSource>,
}

/// Display-time chain: the viewer's own picture wins on their posts, then
/// the post's avatar, then a skill default. UI code resolves every avatar it
/// renders through this.
impl Default for AvatarResolver {
    fn default() -> Self {
        Self::new(vec![
            session_profile_picture,
            cached_avatar,
            post_avatar,
            skill_default,
            global_default,
        ])
    }
}

impl AvatarResolver {
    pub fn new(sources: Vec<AvatarSource>) -> Self {
        Self { sources }
    }

    /// Load-time chain used when the feed normalizes backend posts: the
    /// avatar the backend sent, then the session picture for own posts.
    pub fn for_feed() -> Self {
        Self::new(vec![post_avatar, session_profile_picture, global_default])
    }

    pub fn resolve(&self, ctx: &AvatarContext<'_>) -> String {
        self.sources
            .iter()
            .find_map(|source| source(ctx).filter(|url| !url.is_empty()))
            .unwrap_or_else(|| DEFAULT_AVATAR.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PersonalDataOut;

    const BASE: &str = "http://127.0.0.1:8080/";

    fn post(own: bool, avatar: Option<&str>, skill: Option<&str>) -> EnhancedPost {
        EnhancedPost {
            id: "p1".to_string(),
            user_id: "u1".to_string(),
            content: Some("hi".to_string()),
            image_url: None,
            created_at: None,
            updated_at: None,
            author_name: "Rina".to_string(),
            author_avatar: avatar.map(str::to_string),
            author_role: "User".to_string(),
            author_primary_skill: skill.map(str::to_string),
            is_own_post: own,
        }
    }

    fn session_with_picture(url: &str) -> Session {
        let mut session = Session::new("tok");
        session.profile = Some(PersonalDataOut {
            profile_picture_url: Some(url.to_string()),
            ..Default::default()
        });
        session
    }

    fn ctx<'a>(post: &'a EnhancedPost, session: Option<&'a Session>, cached: Option<&'a str>) -> AvatarContext<'a> {
        AvatarContext {
            post,
            session,
            cached_avatar: cached,
            base_url: BASE,
        }
    }

    #[test]
    fn absolutize_joins_relative_paths() {
        assert_eq!(absolutize(BASE, "/uploads/a.png"), "http://127.0.0.1:8080/uploads/a.png");
        assert_eq!(absolutize(BASE, "https://cdn.x/a.png"), "https://cdn.x/a.png");
        assert_eq!(absolutize(BASE, "data:image/png;base64,AA=="), "data:image/png;base64,AA==");
        assert_eq!(absolutize(BASE, "/assets/W1.jpg"), "/assets/W1.jpg");
    }

    #[test]
    fn own_post_prefers_session_picture() {
        let p = post(true, Some("/uploads/old.png"), None);
        let session = session_with_picture("/uploads/me.png");
        let url = AvatarResolver::default().resolve(&ctx(&p, Some(&session), Some("data:cached")));
        assert_eq!(url, "http://127.0.0.1:8080/uploads/me.png");
    }

    #[test]
    fn own_post_falls_back_to_cache() {
        let p = post(true, None, None);
        let url = AvatarResolver::default().resolve(&ctx(&p, None, Some("data:image/png;base64,AA==")));
        assert_eq!(url, "data:image/png;base64,AA==");
    }

    #[test]
    fn other_posts_ignore_session_and_cache() {
        let p = post(false, Some("https://cdn.x/rina.png"), None);
        let session = session_with_picture("/uploads/me.png");
        let url = AvatarResolver::default().resolve(&ctx(&p, Some(&session), Some("data:cached")));
        assert_eq!(url, "https://cdn.x/rina.png");
    }

    #[test]
    fn skill_defaults_apply_in_order() {
        let resolver = AvatarResolver::default();
        let design = post(false, None, Some("Graphic Design"));
        assert_eq!(resolver.resolve(&ctx(&design, None, None)), DESIGN_AVATAR);
        let web = post(false, Some(""), Some("Web Development"));
        assert_eq!(resolver.resolve(&ctx(&web, None, None)), CODING_AVATAR);
        let cooking = post(false, None, Some("Cooking"));
        assert_eq!(resolver.resolve(&ctx(&cooking, None, None)), DEFAULT_AVATAR);
    }

    #[test]
    fn feed_chain_prefers_backend_avatar() {
        let resolver = AvatarResolver::for_feed();
        let session = session_with_picture("/uploads/me.png");
        let sent = post(true, Some("/uploads/sent.png"), None);
        assert_eq!(
            resolver.resolve(&ctx(&sent, Some(&session), None)),
            "http://127.0.0.1:8080/uploads/sent.png"
        );
        let missing = post(true, None, Some("Graphic Design"));
        assert_eq!(
            resolver.resolve(&ctx(&missing, Some(&session), Some("data:cached"))),
            "http://127.0.0.1:8080/uploads/me.png"
        );
        let other = post(false, None, Some("Graphic Design"));
        assert_eq!(resolver.resolve(&ctx(&other, Some(&session), None)), DEFAULT_AVATAR);
    }

    #[test]
    fn custom_chain_is_respected() {
        let resolver = AvatarResolver::new(vec![skill_default as AvatarSource]);
        let p = post(false, Some("https://cdn.x/a.png"), Some("Cooking"));
        assert_eq!(resolver.resolve(&ctx(&p, None, None)), DEFAULT_AVATAR);
    }
}
