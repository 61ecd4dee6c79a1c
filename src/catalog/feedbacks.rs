use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::{require, Result};
use crate::store::record::clamp_rating;
use crate::store::seed::email_for;
use crate::store::{Collection, Editable, Record, SeedContext, SortDir, SortKey, Store};

string_enum!(FeedbackStatus {
    New => "new",
    InProgress => "in_progress",
    Resolved => "resolved",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: String,
    pub author: String,
    pub email: String,
    /// Whole stars in `[1, 5]`.
    pub rating: u8,
    pub comment: String,
    pub status: FeedbackStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFeedback {
    pub author: String,
    pub email: Option<String>,
    pub rating: f64,
    pub comment: String,
    pub status: Option<FeedbackStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackPatch {
    pub comment: Option<String>,
    pub rating: Option<f64>,
    pub status: Option<FeedbackStatus>,
}

const COMMENTS: &[&str] = &[
    "Love the new dashboard layout.",
    "Export to CSV keeps timing out.",
    "Search is fast but filters reset on reload.",
    "Billing page is confusing.",
    "Great support experience, thanks!",
    "Would like more chart types.",
    "Mobile view cuts off the sidebar.",
    "Notifications arrive twice.",
];

impl Record for Feedback {
    const KEY: &'static str = "feedbacks";
    const DEFAULT_SORT: (&'static str, SortDir) = ("created_at", SortDir::Desc);

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.author.as_str()),
            Cow::Borrowed(self.email.as_str()),
            Cow::Borrowed(self.comment.as_str()),
        ]
    }

    fn status(&self) -> Option<&str> {
        Some(self.status.as_str())
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "author" => Some(SortKey::text(&self.author)),
            "rating" => Some(SortKey::Number(f64::from(self.rating))),
            "status" => Some(SortKey::text(self.status.as_str())),
            "created_at" => Some(SortKey::Time(self.created_at)),
            _ => None,
        }
    }

    fn seed(ctx: &mut SeedContext<'_>) -> Vec<Self> {
        (0..40)
            .map(|_| {
                let author = ctx.person();
                Feedback {
                    id: ctx.id(),
                    email: email_for(&author, "example.net"),
                    author,
                    rating: ctx.range(1, 5) as u8,
                    comment: ctx.pick(COMMENTS).to_string(),
                    status: ctx.pick(FeedbackStatus::ALL),
                    created_at: ctx.minutes_ago(60 * 24 * 60),
                }
            })
            .collect()
    }
}

impl Editable for Feedback {
    type Draft = NewFeedback;
    type Patch = FeedbackPatch;

    fn build(id: String, now: DateTime<Utc>, draft: NewFeedback) -> Result<Self> {
        Ok(Feedback {
            id,
            author: require("author", &draft.author)?,
            email: draft.email.map(|e| e.trim().to_lowercase()).unwrap_or_default(),
            rating: clamp_rating(draft.rating),
            comment: require("comment", &draft.comment)?,
            status: draft.status.unwrap_or(FeedbackStatus::New),
            created_at: now,
        })
    }

    fn apply(&mut self, patch: &FeedbackPatch) -> Result<()> {
        if let Some(comment) = &patch.comment {
            self.comment = require("comment", comment)?;
        }
        if let Some(rating) = patch.rating {
            self.rating = clamp_rating(rating);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        Ok(())
    }
}

impl Store {
    pub fn feedbacks(&self) -> Collection<Feedback> {
        self.collection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(rating: f64) -> NewFeedback {
        NewFeedback {
            author: "Ava".into(),
            email: None,
            rating,
            comment: "ok".into(),
            status: None,
        }
    }

    #[test]
    fn rating_is_clamped_on_build_and_apply() {
        let mut fb = Feedback::build("f".into(), Utc::now(), draft(7.0)).unwrap();
        assert_eq!(fb.rating, 5);
        fb.apply(&FeedbackPatch {
            rating: Some(0.0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(fb.rating, 1);
        assert_eq!(fb.status, FeedbackStatus::New);
    }

    #[test]
    fn blank_comment_is_rejected() {
        let mut d = draft(3.0);
        d.comment = "  ".into();
        assert!(Feedback::build("f".into(), Utc::now(), d).unwrap_err().is_validation());
    }
}
