//! The followed-authors contact list.
//!
//! `ContactBook` keeps the contact list and the followed-name set in step:
//! a name is in one exactly when it is in the other. All mutation goes
//! through `ContactUpdate`, so the invariant lives in one place.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::avatar::DEFAULT_AVATAR;
use crate::types::EnhancedPost;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    pub name: String,
    pub avatar: String,
}

impl Contact {
    pub fn new(name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar: avatar.into(),
        }
    }
}

/// Enumerated mutations of a `ContactBook`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactUpdate {
    Follow(Contact),
    Unfollow { name: String },
}

/// Result of toggling the follow state from a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    Unfollowed,
    /// Own posts cannot be followed.
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct ContactBook {
    contacts: Vec<Contact>,
    followed: HashSet<String>,
}

impl ContactBook {
    /// A book pre-populated with `initial`, all followed. Later duplicates of
    /// a name are dropped.
    pub fn new(initial: impl IntoIterator<Item = Contact>) -> Self {
        let mut book = Self::default();
        for contact in initial {
            if book.followed.insert(contact.name.clone()) {
                book.contacts.push(contact);
            }
        }
        book
    }

    /// The two contacts every new user starts out following.
    pub fn with_defaults() -> Self {
        Self::new([
            Contact::new("Budi Santoso", "/assets/male2.jpg"),
            Contact::new("Siti Aminah", "/assets/W3.jpg"),
        ])
    }

    /// Newest first.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn is_followed(&self, name: &str) -> bool {
        self.followed.contains(name)
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Apply one update. Returns whether anything changed.
    pub fn apply(&mut self, update: ContactUpdate) -> bool {
        match update {
            ContactUpdate::Follow(contact) => {
                if !self.followed.insert(contact.name.clone()) {
                    return false;
                }
                self.contacts.insert(0, contact);
                true
            }
            ContactUpdate::Unfollow { name } => {
                if !self.followed.remove(&name) {
                    return false;
                }
                self.contacts.retain(|c| c.name != name);
                true
            }
        }
    }

    pub fn follow(&mut self, contact: Contact) -> bool {
        self.apply(ContactUpdate::Follow(contact))
    }

    pub fn unfollow(&mut self, name: &str) -> bool {
        self.apply(ContactUpdate::Unfollow {
            name: name.to_string(),
        })
    }

    /// Follow or unfollow a post's author.
    pub fn toggle_follow(&mut self, post: &EnhancedPost) -> FollowOutcome {
        if post.is_own_post {
            tracing::debug!(author = %post.author_name, "refusing to follow own post");
            return FollowOutcome::Ignored;
        }
        if self.is_followed(&post.author_name) {
            self.unfollow(&post.author_name);
            FollowOutcome::Unfollowed
        } else {
            let avatar = post
                .author_avatar
                .clone()
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_AVATAR.to_string());
            self.follow(Contact::new(post.author_name.clone(), avatar));
            FollowOutcome::Followed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(author: &str, avatar: Option<&str>, own: bool) -> EnhancedPost {
        EnhancedPost {
            id: format!("post-{author}"),
            user_id: "u".to_string(),
            content: None,
            image_url: None,
            created_at: None,
            updated_at: None,
            author_name: author.to_string(),
            author_avatar: avatar.map(str::to_string),
            author_role: "User".to_string(),
            author_primary_skill: None,
            is_own_post: own,
        }
    }

    fn count(book: &ContactBook, name: &str) -> usize {
        book.contacts().iter().filter(|c| c.name == name).count()
    }

    #[test]
    fn defaults_are_followed() {
        let book = ContactBook::with_defaults();
        assert_eq!(book.len(), 2);
        assert!(book.is_followed("Budi Santoso"));
        assert!(book.is_followed("Siti Aminah"));
    }

    #[test]
    fn follow_adds_exactly_one_contact() {
        let mut book = ContactBook::with_defaults();
        let p = post("Dewi Kusuma", Some("/assets/W2.jpg"), false);
        assert_eq!(book.toggle_follow(&p), FollowOutcome::Followed);
        assert_eq!(book.len(), 3);
        assert_eq!(book.contacts()[0], Contact::new("Dewi Kusuma", "/assets/W2.jpg"));
        assert!(book.is_followed("Dewi Kusuma"));
    }

    #[test]
    fn unfollow_removes_exactly_one_contact() {
        let mut book = ContactBook::with_defaults();
        let p = post("Budi Santoso", None, false);
        assert_eq!(book.toggle_follow(&p), FollowOutcome::Unfollowed);
        assert_eq!(book.len(), 1);
        assert!(!book.is_followed("Budi Santoso"));
        assert_eq!(count(&book, "Budi Santoso"), 0);
    }

    #[test]
    fn repeated_follow_never_duplicates() {
        let mut book = ContactBook::default();
        assert!(book.follow(Contact::new("Agus Yuni", "a.jpg")));
        assert!(!book.follow(Contact::new("Agus Yuni", "b.jpg")));
        assert_eq!(count(&book, "Agus Yuni"), 1);
        assert!(book.unfollow("Agus Yuni"));
        assert!(!book.unfollow("Agus Yuni"));
        assert!(book.is_empty());
    }

    #[test]
    fn toggling_twice_restores_state() {
        let mut book = ContactBook::with_defaults();
        let p = post("Rina Suryani", None, false);
        book.toggle_follow(&p);
        book.toggle_follow(&p);
        assert_eq!(book.len(), 2);
        assert!(!book.is_followed("Rina Suryani"));
    }

    #[test]
    fn missing_avatar_uses_default() {
        let mut book = ContactBook::default();
        book.toggle_follow(&post("Agus Yuni", Some(""), false));
        assert_eq!(book.contacts()[0].avatar, DEFAULT_AVATAR);
    }

    #[test]
    fn own_post_is_ignored() {
        let mut book = ContactBook::default();
        assert_eq!(book.toggle_follow(&post("You", None, true)), FollowOutcome::Ignored);
        assert!(book.is_empty());
    }

    #[test]
    fn duplicate_initial_names_are_dropped() {
        let book = ContactBook::new([Contact::new("A", "1"), Contact::new("A", "2")]);
        assert_eq!(book.len(), 1);
        assert_eq!(book.contacts()[0].avatar, "1");
    }
}
