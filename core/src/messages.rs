//! Per-contact direct-message logs and drafts.
//!
//! Messages live only in memory: sending appends locally with no delivery
//! acknowledgement, persistence, or retry.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contacts::Contact;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Me,
    Them,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub from: Sender,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    fn new(from: Sender, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            text,
            sent_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Conversations {
    logs: HashMap<String, Vec<Message>>,
    drafts: HashMap<String, String>,
    selected: Option<String>,
}

impl Conversations {
    /// Open a log for every contact, each starting with a greeting from them.
    pub fn for_contacts(contacts: &[Contact]) -> Self {
        let logs = contacts
            .iter()
            .map(|c| {
                let greeting = Message::new(Sender::Them, format!("Hi, aku {}!", c.name));
                (c.name.clone(), vec![greeting])
            })
            .collect();
        Self {
            logs,
            ..Self::default()
        }
    }

    /// Oldest first. Unknown contacts have an empty log.
    pub fn messages(&self, contact: &str) -> &[Message] {
        self.logs.get(contact).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn draft(&self, contact: &str) -> &str {
        self.drafts.get(contact).map(String::as_str).unwrap_or_default()
    }

    pub fn set_draft(&mut self, contact: &str, text: impl Into<String>) {
        self.drafts.insert(contact.to_string(), text.into());
    }

    /// Send the contact's draft.
    ///
    /// A blank draft is a no-op. Otherwise exactly one `Me` message with the
    /// trimmed text is appended and only this contact's draft is cleared.
    pub fn send(&mut self, contact: &str) -> Option<&Message> {
        let text = self.drafts.get(contact)?.trim().to_string();
        if text.is_empty() {
            return None;
        }
        self.drafts.insert(contact.to_string(), String::new());
        let log = self.logs.entry(contact.to_string()).or_default();
        log.push(Message::new(Sender::Me, text));
        log.last()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Selecting the open chat again closes it.
    pub fn toggle_selection(&mut self, contact: &str) {
        if self.selected.as_deref() == Some(contact) {
            self.selected = None;
        } else {
            self.selected = Some(contact.to_string());
        }
    }

    pub fn close(&mut self) {
        self.selected = None;
    }

    pub fn send_selected(&mut self) -> Option<&Message> {
        let contact = self.selected.clone()?;
        self.send(&contact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversations() -> Conversations {
        Conversations::for_contacts(&[
            Contact::new("Budi Santoso", "/assets/male2.jpg"),
            Contact::new("Siti Aminah", "/assets/W3.jpg"),
        ])
    }

    #[test]
    fn contacts_start_with_greeting() {
        let convo = conversations();
        let log = convo.messages("Budi Santoso");
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].from, Sender::Them);
        assert_eq!(log[0].text, "Hi, aku Budi Santoso!");
    }

    #[test]
    fn blank_draft_is_noop() {
        let mut convo = conversations();
        assert!(convo.send("Budi Santoso").is_none());
        convo.set_draft("Budi Santoso", "   \n\t");
        assert!(convo.send("Budi Santoso").is_none());
        assert_eq!(convo.messages("Budi Santoso").len(), 1);
    }

    #[test]
    fn send_appends_one_message_and_clears_only_that_draft() {
        let mut convo = conversations();
        convo.set_draft("Budi Santoso", "  halo budi  ");
        convo.set_draft("Siti Aminah", "halo siti");
        let sent = convo.send("Budi Santoso").cloned().unwrap();
        assert_eq!(sent.from, Sender::Me);
        assert_eq!(sent.text, "halo budi");
        assert_eq!(convo.messages("Budi Santoso").len(), 2);
        assert_eq!(convo.draft("Budi Santoso"), "");
        assert_eq!(convo.draft("Siti Aminah"), "halo siti");
        assert_eq!(convo.messages("Siti Aminah").len(), 1);
    }

    #[test]
    fn messages_get_distinct_ids() {
        let mut convo = conversations();
        convo.set_draft("Siti Aminah", "one");
        let first = convo.send("Siti Aminah").unwrap().id;
        convo.set_draft("Siti Aminah", "two");
        let second = convo.send("Siti Aminah").unwrap().id;
        assert_ne!(first, second);
    }

    #[test]
    fn new_contact_gets_a_log_on_first_send() {
        let mut convo = conversations();
        assert!(convo.messages("Dewi Kusuma").is_empty());
        convo.set_draft("Dewi Kusuma", "hai");
        convo.send("Dewi Kusuma");
        assert_eq!(convo.messages("Dewi Kusuma").len(), 1);
    }

    #[test]
    fn selecting_twice_closes_chat() {
        let mut convo = conversations();
        convo.toggle_selection("Siti Aminah");
        assert_eq!(convo.selected(), Some("Siti Aminah"));
        convo.toggle_selection("Budi Santoso");
        assert_eq!(convo.selected(), Some("Budi Santoso"));
        convo.toggle_selection("Budi Santoso");
        assert!(convo.selected().is_none());
    }

    #[test]
    fn send_selected_targets_open_chat() {
        let mut convo = conversations();
        convo.set_draft("Siti Aminah", "hello");
        assert!(convo.send_selected().is_none());
        convo.toggle_selection("Siti Aminah");
        assert_eq!(convo.send_selected().map(|m| m.text.clone()).as_deref(), Some("hello"));
    }
}
