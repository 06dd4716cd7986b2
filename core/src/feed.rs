//! The dashboard post feed.
//!
//! # Design
//! `Feed::load` never produces an empty feed. Backend posts are normalized
//! and followed by three fixed seed posts; when the backend call fails, the
//! seed posts stand alone and the feed carries a "using demo data" message.

use chrono::Utc;

use crate::avatar::{AvatarContext, AvatarResolver, CODING_AVATAR, DEFAULT_AVATAR, DESIGN_AVATAR};
use crate::error::ApiError;
use crate::service::ApiService;
use crate::session::Session;
use crate::transport::Transport;
use crate::types::{EnhancedPost, Envelope, PostOut};

/// Shown above the feed when it falls back to seed posts.
pub const DEMO_DATA_MESSAGE: &str = "Gagal memuat posts dari server. Menggunakan data demo.";

/// What normalization needs to know about the viewer.
#[derive(Debug, Clone, Copy)]
pub struct FeedContext<'a> {
    pub base_url: &'a str,
    pub session: Option<&'a Session>,
}

#[derive(Debug, Clone, Default)]
pub struct Feed {
    posts: Vec<EnhancedPost>,
    error: Option<String>,
}

impl Feed {
    /// Fetch posts through `service` and build the feed.
    pub fn fetch<T: Transport>(service: &ApiService<T>, session: Option<&Session>) -> Self {
        let ctx = FeedContext {
            base_url: service.client().base_url(),
            session,
        };
        Self::load(service.list_posts(), &ctx)
    }

    pub fn load(result: Result<Envelope<Vec<EnhancedPost>>, ApiError>, ctx: &FeedContext<'_>) -> Self {
        match result {
            Ok(envelope) => {
                let mut posts: Vec<EnhancedPost> = envelope
                    .data
                    .unwrap_or_default()
                    .into_iter()
                    .map(|post| normalize(post, ctx))
                    .collect();
                tracing::debug!(count = posts.len(), "loaded posts from backend");
                posts.extend(seed_posts());
                Self { posts, error: None }
            }
            Err(e) => {
                tracing::warn!(error = %e, "falling back to seed posts");
                Self {
                    posts: seed_posts(),
                    error: Some(DEMO_DATA_MESSAGE.to_string()),
                }
            }
        }
    }

    pub fn posts(&self) -> &[EnhancedPost] {
        &self.posts
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Case-insensitive match on author name, content, or primary skill.
    pub fn filter(&self, query: &str) -> Vec<&EnhancedPost> {
        let needle = query.to_lowercase();
        self.posts
            .iter()
            .filter(|post| {
                post.author_name.to_lowercase().contains(&needle)
                    || post
                        .content
                        .as_deref()
                        .is_some_and(|content| content.to_lowercase().contains(&needle))
                    || post
                        .author_primary_skill
                        .as_deref()
                        .is_some_and(|skill| skill.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Put a post the viewer just created at the top of the feed.
    pub fn prepend_created(&mut self, post: PostOut, ctx: &FeedContext<'_>) {
        let author_name = ctx
            .session
            .and_then(|s| s.user.as_ref())
            .and_then(|u| u.display_username())
            .unwrap_or_default();
        let primary_skill = ctx
            .session
            .and_then(|s| s.profile.as_ref())
            .map(|p| p.primary_skill.clone())
            .filter(|skill| !skill.is_empty());
        let enhanced = EnhancedPost {
            id: post.id,
            user_id: post.user_id.unwrap_or_default(),
            content: post.content,
            image_url: post.image_url,
            created_at: post.created_at,
            updated_at: post.updated_at,
            author_name,
            author_avatar: None,
            author_role: String::new(),
            author_primary_skill: primary_skill,
            is_own_post: true,
        };
        self.posts.insert(0, normalize(enhanced, ctx));
    }
}

fn normalize(mut post: EnhancedPost, ctx: &FeedContext<'_>) -> EnhancedPost {
    let avatar = AvatarResolver::for_feed().resolve(&AvatarContext {
        post: &post,
        session: ctx.session,
        cached_avatar: None,
        base_url: ctx.base_url,
    });
    post.author_avatar = Some(avatar);
    if post.author_name.is_empty() {
        post.author_name = if post.is_own_post { "You" } else { "Anonymous User" }.to_string();
    }
    post.author_role = post
        .author_primary_skill
        .clone()
        .filter(|skill| !skill.is_empty())
        .unwrap_or_else(|| "User".to_string());
    if post.content.as_deref().map_or(true, str::is_empty) {
        post.content = Some("No content".to_string());
    }
    post
}

/// The fixed demo posts shown under (or instead of) live content.
pub fn seed_posts() -> Vec<EnhancedPost> {
    let now = Utc::now().to_rfc3339();
    let seed = |n: u8, name: &str, avatar: &str, skill: &str, content: &str| EnhancedPost {
        id: format!("seed-{n}"),
        user_id: format!("demo-user-{n}"),
        content: Some(content.to_string()),
        image_url: None,
        created_at: Some(now.clone()),
        updated_at: None,
        author_name: name.to_string(),
        author_avatar: Some(avatar.to_string()),
        author_role: skill.to_string(),
        author_primary_skill: Some(skill.to_string()),
        is_own_post: false,
    };
    vec![
        seed(
            1,
            "Rina Suryani",
            DEFAULT_AVATAR,
            "Digital Art",
            "Senang sekali memperkenalkan BarterUp ke komunitas lokal! 🎉
        Kami percaya setiap orang memiliki keahlian unik yang bisa dibagikan.
        Di BarterUp kamu dapat menukar skill memasak, berbahasa asing, hingga coding.
        Baik kamu ingin belajar memasak resep tradisional maupun menguasai teknik debugging,
        semuanya bisa bertukar secara langsung dengan tetangga atau teman baru.
        Yuk, mulai perjalanan belajarmu dengan cara yang lebih dekat, terjangkau, dan sosial!",
        ),
        seed(
            2,
            "Agus Yuni",
            DESIGN_AVATAR,
            "Graphic Design",
            "Halo teman BarterUp! Aku sedang mendalami bahasa Spanyol 🇪🇸 dan ingin bantu kalian desain konten visual.
        Ayo bergabung untuk sesi tukar skill: aku ajarkan dasar-dasar tipografi dan layout,
        kamu bisa ajari aku percakapan sehari-hari dalam bahasa Spanyol.
        Kita bisa atur jadwal mingguan secara offline atau virtual sesuai kenyamanan.
        Tingkatkan kreativitas dan kemampuan bahasa secara bersamaan! 📚✨",
        ),
        seed(
            3,
            "Dewi Kusuma",
            CODING_AVATAR,
            "Web Development",
            "Apakah kamu tertarik belajar dasar JavaScript untuk membangun website interaktif? 🚀
        Gabung sesi coding virtual gratis setiap Sabtu jam 10:00 WIB.
        Kita akan mulai dari dasar: variabel, fungsi, hingga manipulasi DOM sederhana.
        Sempurna untuk pemula yang baru kenal programming atau yang ingin refresh kembali konsep.
        Jangan lewatkan kesempatan ini untuk mengasah skill coding-mu dengan komunitas lokal BarterUp!",
        ),
    ]
}
