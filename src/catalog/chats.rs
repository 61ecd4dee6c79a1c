//! Chat threads and their messages.
//!
//! Threads are ordered by last activity: any update to a thread, including a
//! new message, refreshes its `time` and moves it to the front.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::{require, Result};
use crate::store::{Collection, Editable, Record, SeedContext, SortDir, SortKey, Store};

/// Sender name used for messages written by the local user.
pub const SELF_SENDER: &str = "me";

const LINES: &[&str] = &[
    "Hey, do you have a minute?",
    "Sure, what's up?",
    "Can you review the latest invoice?",
    "Sent it over just now.",
    "The dashboard looks great!",
    "Let's sync tomorrow morning.",
    "I pushed a fix for the export bug.",
    "Thanks, I'll take a look.",
    "Any update on the API keys?",
    "Rotated them this morning.",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatThread {
    pub id: String,
    pub title: String,
    pub participant: String,
    pub last_message: String,
    pub unread: u32,
    /// Last activity.
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewChatThread {
    pub participant: String,
    pub title: Option<String>,
    pub last_message: Option<String>,
    pub unread: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatThreadPatch {
    pub title: Option<String>,
    pub unread: Option<u32>,
}

impl Record for ChatThread {
    const KEY: &'static str = "chats";
    const DEFAULT_SORT: (&'static str, SortDir) = ("time", SortDir::Desc);
    const REORDERS_ON_UPDATE: bool = true;

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.title.as_str()),
            Cow::Borrowed(self.participant.as_str()),
            Cow::Borrowed(self.last_message.as_str()),
        ]
    }

    fn status(&self) -> Option<&str> {
        Some(if self.unread > 0 { "unread" } else { "read" })
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.time)
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "title" => Some(SortKey::text(&self.title)),
            "participant" => Some(SortKey::text(&self.participant)),
            "unread" => Some(SortKey::Number(f64::from(self.unread))),
            "time" => Some(SortKey::Time(self.time)),
            _ => None,
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.time = now;
    }

    fn seed(ctx: &mut SeedContext<'_>) -> Vec<Self> {
        (0..8)
            .map(|_| {
                let participant = ctx.person();
                ChatThread {
                    id: ctx.id(),
                    title: participant.clone(),
                    participant,
                    last_message: ctx.pick(LINES).to_string(),
                    unread: if ctx.chance(0.4) { ctx.range(1, 5) as u32 } else { 0 },
                    time: ctx.minutes_ago(60 * 24 * 10),
                }
            })
            .collect()
    }
}

impl Editable for ChatThread {
    type Draft = NewChatThread;
    type Patch = ChatThreadPatch;

    fn build(id: String, now: DateTime<Utc>, draft: NewChatThread) -> Result<Self> {
        let participant = require("participant", &draft.participant)?;
        let title = match draft.title {
            Some(title) => require("title", &title)?,
            None => participant.clone(),
        };
        Ok(ChatThread {
            id,
            title,
            participant,
            last_message: draft.last_message.unwrap_or_default(),
            unread: draft.unread.unwrap_or(0),
            time: now,
        })
    }

    fn apply(&mut self, patch: &ChatThreadPatch) -> Result<()> {
        if let Some(title) = &patch.title {
            self.title = require("title", title)?;
        }
        if let Some(unread) = patch.unread {
            self.unread = unread;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub thread_id: String,
    pub sender: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewChatMessage {
    pub thread_id: String,
    pub sender: Option<String>,
    pub text: String,
}

impl Record for ChatMessage {
    const KEY: &'static str = "chat_messages";
    const DEFAULT_SORT: (&'static str, SortDir) = ("sent_at", SortDir::Asc);
    const PARENT_KEY: Option<&'static str> = Some(ChatThread::KEY);

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.sender.as_str()),
            Cow::Borrowed(self.text.as_str()),
        ]
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.sent_at)
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "sender" => Some(SortKey::text(&self.sender)),
            "sent_at" => Some(SortKey::Time(self.sent_at)),
            _ => None,
        }
    }

    fn parent_id(&self) -> Option<&str> {
        Some(&self.thread_id)
    }

    fn seed(ctx: &mut SeedContext<'_>) -> Vec<Self> {
        let threads = ctx.parent_ids.to_vec();
        let mut messages = Vec::new();
        for thread_id in threads {
            let count = ctx.range(4, 10);
            let mut at = ctx.minutes_ago(60 * 24 * 10);
            for _ in 0..count {
                let sender = if ctx.chance(0.5) {
                    SELF_SENDER.to_string()
                } else {
                    "contact".to_string()
                };
                messages.push(ChatMessage {
                    id: ctx.id(),
                    thread_id: thread_id.clone(),
                    sender,
                    text: ctx.pick(LINES).to_string(),
                    sent_at: at,
                });
                at = (at + Duration::minutes(ctx.range(1, 90) as i64)).min(ctx.now);
            }
        }
        messages
    }
}

impl ChatMessage {
    fn new(id: String, now: DateTime<Utc>, draft: NewChatMessage) -> Result<Self> {
        let sender = match draft.sender {
            Some(sender) => require("sender", &sender)?,
            None => SELF_SENDER.to_string(),
        };
        Ok(ChatMessage {
            id,
            thread_id: require("thread_id", &draft.thread_id)?,
            sender,
            text: require("text", &draft.text)?,
            sent_at: now,
        })
    }
}

impl Store {
    pub fn chats(&self) -> Collection<ChatThread> {
        self.collection()
    }

    /// Message collection, with threads seeded first.
    pub async fn chat_messages(&self) -> Result<Collection<ChatMessage>> {
        self.chats().snapshot().await?;
        Ok(self.collection())
    }

    /// The newest `limit` messages of a thread, oldest first.
    pub async fn list_messages(&self, thread_id: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        self.chats().get(thread_id).await?;
        let mut messages: Vec<ChatMessage> = self
            .chat_messages()
            .await?
            .snapshot()
            .await?
            .into_iter()
            .filter(|m| m.thread_id == thread_id)
            .collect();
        // canonical order is already oldest first
        let skip = messages.len().saturating_sub(limit);
        Ok(messages.split_off(skip))
    }

    /// Append a message to a thread and bump the thread to the front.
    ///
    /// Messages have no generic create: this is the only way in, so every new
    /// message updates its thread.
    pub async fn send_message(&self, draft: NewChatMessage) -> Result<ChatMessage> {
        let messages = self.chat_messages().await?;
        let id = uuid::Uuid::now_v7().to_string();
        let message = messages.insert(ChatMessage::new(id, messages.now(), draft)?).await?;

        let chats = self.chats();
        let preview = message.text.clone();
        chats
            .modify(&message.thread_id, |thread| {
                thread.last_message = preview;
                Ok(())
            })
            .await?;
        tracing::debug!(thread_id = %message.thread_id, message_id = %message.id, "message sent");
        Ok(message)
    }

    /// Delete a thread together with its messages.
    pub async fn delete_chat(&self, id: &str) -> Result<()> {
        let messages = self.chat_messages().await?;
        let removed_messages = messages.delete_where(|m| m.thread_id == id).await?;
        self.chats().delete(id).await?;
        tracing::info!(thread_id = id, removed_messages, "chat deleted");
        Ok(())
    }

    /// Bulk form of [`Store::delete_chat`].
    pub async fn delete_chats(&self, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let messages = self.chat_messages().await?;
        messages
            .delete_where(|m| ids.iter().any(|id| *id == m.thread_id))
            .await?;
        self.chats().delete_bulk(ids).await
    }
}
