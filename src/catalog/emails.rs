use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::{require, Result};
use crate::store::seed::email_for;
use crate::store::{Collection, Editable, Record, SeedContext, SortDir, SortKey, Store};

/// Sender used when a created email names none.
pub const DEFAULT_SENDER: &str = "me@example.com";

string_enum!(Folder {
    Inbox => "inbox",
    Sent => "sent",
    Drafts => "drafts",
    Archive => "archive",
    Trash => "trash",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub id: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub folder: Folder,
    pub starred: bool,
    pub read: bool,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewEmail {
    pub from: Option<String>,
    pub to: String,
    pub subject: String,
    pub body: Option<String>,
    pub folder: Option<Folder>,
    pub starred: Option<bool>,
    pub read: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailPatch {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub folder: Option<Folder>,
    pub starred: Option<bool>,
    pub read: Option<bool>,
}

const SUBJECTS: &[&str] = &[
    "Quarterly report",
    "Invoice #2041",
    "Team offsite planning",
    "Re: onboarding checklist",
    "Contract renewal",
    "Weekly sync notes",
    "Password reset request",
    "Feature request: dark mode",
];

impl Record for Email {
    const KEY: &'static str = "emails";
    const DEFAULT_SORT: (&'static str, SortDir) = ("sent_at", SortDir::Desc);

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.from.as_str()),
            Cow::Borrowed(self.to.as_str()),
            Cow::Borrowed(self.subject.as_str()),
            Cow::Borrowed(self.body.as_str()),
        ]
    }

    fn status(&self) -> Option<&str> {
        Some(self.folder.as_str())
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.sent_at)
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "from" => Some(SortKey::text(&self.from)),
            "to" => Some(SortKey::text(&self.to)),
            "subject" => Some(SortKey::text(&self.subject)),
            "sent_at" => Some(SortKey::Time(self.sent_at)),
            _ => None,
        }
    }

    fn seed(ctx: &mut SeedContext<'_>) -> Vec<Self> {
        (0..36)
            .map(|_| {
                let folder = ctx.pick(Folder::ALL);
                let contact = email_for(&ctx.person(), "example.org");
                let (from, to) = match folder {
                    Folder::Sent | Folder::Drafts => (DEFAULT_SENDER.to_string(), contact),
                    _ => (contact, DEFAULT_SENDER.to_string()),
                };
                let subject = ctx.pick(SUBJECTS);
                Email {
                    id: ctx.id(),
                    from,
                    to,
                    subject: subject.to_string(),
                    body: format!("Hi,\n\nFollowing up about \"{subject}\".\n\nThanks"),
                    folder,
                    starred: ctx.chance(0.2),
                    read: folder != Folder::Inbox || ctx.chance(0.5),
                    sent_at: ctx.minutes_ago(60 * 24 * 30),
                }
            })
            .collect()
    }
}

impl Editable for Email {
    type Draft = NewEmail;
    type Patch = EmailPatch;

    fn build(id: String, now: DateTime<Utc>, draft: NewEmail) -> Result<Self> {
        let from = match draft.from {
            Some(from) => require("from", &from)?,
            None => DEFAULT_SENDER.to_string(),
        };
        Ok(Email {
            id,
            from,
            to: require("to", &draft.to)?,
            subject: require("subject", &draft.subject)?,
            body: draft.body.unwrap_or_default(),
            folder: draft.folder.unwrap_or(Folder::Sent),
            starred: draft.starred.unwrap_or(false),
            read: draft.read.unwrap_or(true),
            sent_at: now,
        })
    }

    fn apply(&mut self, patch: &EmailPatch) -> Result<()> {
        if let Some(subject) = &patch.subject {
            self.subject = require("subject", subject)?;
        }
        if let Some(body) = &patch.body {
            self.body = body.clone();
        }
        if let Some(folder) = patch.folder {
            self.folder = folder;
        }
        if let Some(starred) = patch.starred {
            self.starred = starred;
        }
        if let Some(read) = patch.read {
            self.read = read;
        }
        Ok(())
    }
}

impl Store {
    pub fn emails(&self) -> Collection<Email> {
        self.collection()
    }
}
