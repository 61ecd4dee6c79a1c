use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::{require, Result};
use crate::store::{Collection, Editable, Record, SeedContext, SortDir, SortKey, Store};

string_enum!(NotificationKind {
    Info => "info",
    Success => "success",
    Warning => "warning",
    Error => "error",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewNotification {
    pub title: String,
    pub body: Option<String>,
    pub kind: Option<NotificationKind>,
    pub read: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub kind: Option<NotificationKind>,
    pub read: Option<bool>,
}

const SAMPLES: &[(&str, &str, NotificationKind)] = &[
    ("New user signed up", "A new account is waiting for approval.", NotificationKind::Info),
    ("Payment received", "An invoice was paid in full.", NotificationKind::Success),
    ("Payment failed", "A card was declined during renewal.", NotificationKind::Error),
    ("Storage almost full", "Disk usage passed 85% on the primary volume.", NotificationKind::Warning),
    ("Deployment finished", "Release completed without errors.", NotificationKind::Success),
    ("API latency elevated", "p95 latency is above the alert threshold.", NotificationKind::Warning),
    ("New feedback", "A customer left a review.", NotificationKind::Info),
    ("Key revoked", "An API key was revoked by an administrator.", NotificationKind::Error),
];

impl Record for Notification {
    const KEY: &'static str = "notifications";
    const DEFAULT_SORT: (&'static str, SortDir) = ("created_at", SortDir::Desc);

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.title.as_str()),
            Cow::Borrowed(self.body.as_str()),
            Cow::Borrowed(self.kind.as_str()),
        ]
    }

    fn status(&self) -> Option<&str> {
        Some(if self.read { "read" } else { "unread" })
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "title" => Some(SortKey::text(&self.title)),
            "kind" => Some(SortKey::text(self.kind.as_str())),
            "read" => Some(SortKey::Number(f64::from(u8::from(self.read)))),
            "created_at" => Some(SortKey::Time(self.created_at)),
            _ => None,
        }
    }

    fn seed(ctx: &mut SeedContext<'_>) -> Vec<Self> {
        (0..30)
            .map(|_| {
                let (title, body, kind) = ctx.pick(SAMPLES);
                Notification {
                    id: ctx.id(),
                    title: title.to_string(),
                    body: body.to_string(),
                    kind,
                    read: ctx.chance(0.6),
                    created_at: ctx.minutes_ago(60 * 24 * 14),
                }
            })
            .collect()
    }
}

impl Editable for Notification {
    type Draft = NewNotification;
    type Patch = NotificationPatch;

    fn build(id: String, now: DateTime<Utc>, draft: NewNotification) -> Result<Self> {
        Ok(Notification {
            id,
            title: require("title", &draft.title)?,
            body: draft.body.map(|b| b.trim().to_string()).unwrap_or_default(),
            kind: draft.kind.unwrap_or(NotificationKind::Info),
            read: draft.read.unwrap_or(false),
            created_at: now,
        })
    }

    fn apply(&mut self, patch: &NotificationPatch) -> Result<()> {
        if let Some(title) = &patch.title {
            self.title = require("title", title)?;
        }
        if let Some(body) = &patch.body {
            self.body = body.trim().to_string();
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(read) = patch.read {
            self.read = read;
        }
        Ok(())
    }
}

impl Store {
    pub fn notifications(&self) -> Collection<Notification> {
        self.collection()
    }

    /// Mark every unread notification as read; returns how many changed.
    pub async fn mark_all_notifications_read(&self) -> Result<usize> {
        let notifications = self.notifications();
        let unread: Vec<String> = notifications
            .snapshot()
            .await?
            .into_iter()
            .filter(|n| !n.read)
            .map(|n| n.id)
            .collect();
        let patch = NotificationPatch {
            read: Some(true),
            ..Default::default()
        };
        notifications.update_bulk(&unread, &patch).await
    }
}
