use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::{require, Result, StoreError};
use crate::store::{Collection, Editable, Record, SeedContext, SortDir, SortKey, Store};

string_enum!(EventCategory {
    Meeting => "meeting",
    Personal => "personal",
    Deadline => "deadline",
    Reminder => "reminder",
});

const TITLES: &[(&str, EventCategory)] = &[
    ("Team standup", EventCategory::Meeting),
    ("Design review", EventCategory::Meeting),
    ("1:1 with manager", EventCategory::Meeting),
    ("Dentist", EventCategory::Personal),
    ("Gym", EventCategory::Personal),
    ("Q3 report due", EventCategory::Deadline),
    ("Release freeze", EventCategory::Deadline),
    ("Renew SSL certificate", EventCategory::Reminder),
    ("Pay contractors", EventCategory::Reminder),
];

const LOCATIONS: &[&str] = &["Room 4B", "Zoom", "Main office", "Downtown", ""];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start: DateTime<Utc>,
    /// Never before `start`.
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub category: EventCategory,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCalendarEvent {
    pub title: String,
    pub start: DateTime<Utc>,
    /// Defaults to one hour after `start`.
    pub end: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub all_day: Option<bool>,
    pub category: Option<EventCategory>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarEventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
    pub category: Option<EventCategory>,
}

impl CalendarEvent {
    fn check_span(&self) -> Result<()> {
        if self.end < self.start {
            return Err(StoreError::validation(
                "end",
                format!("{} is before start {}", self.end, self.start),
            ));
        }
        Ok(())
    }
}

impl Record for CalendarEvent {
    const KEY: &'static str = "events";
    const DEFAULT_SORT: (&'static str, SortDir) = ("start", SortDir::Asc);

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.title.as_str()),
            Cow::Borrowed(self.description.as_str()),
            Cow::Borrowed(self.location.as_str()),
        ]
    }

    fn status(&self) -> Option<&str> {
        Some(self.category.as_str())
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.start)
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "title" => Some(SortKey::text(&self.title)),
            "start" => Some(SortKey::Time(self.start)),
            "end" => Some(SortKey::Time(self.end)),
            "category" => Some(SortKey::text(self.category.as_str())),
            "created_at" => Some(SortKey::Time(self.created_at)),
            _ => None,
        }
    }

    fn seed(ctx: &mut SeedContext<'_>) -> Vec<Self> {
        let hour = ctx
            .now
            .duration_trunc(Duration::hours(1))
            .unwrap_or(ctx.now);
        (0..20)
            .map(|_| {
                let (title, category) = ctx.pick(TITLES);
                let offset_hours = ctx.range(0, 45 * 24) as i64 - 15 * 24;
                let start = hour + Duration::hours(offset_hours);
                let all_day = category == EventCategory::Deadline;
                let end = if all_day {
                    start + Duration::days(1)
                } else {
                    start + Duration::minutes(30 * ctx.range(1, 4) as i64)
                };
                CalendarEvent {
                    id: ctx.id(),
                    title: title.to_string(),
                    description: String::new(),
                    location: ctx.pick(LOCATIONS).to_string(),
                    start,
                    end,
                    all_day,
                    category,
                    created_at: ctx.minutes_ago(60 * 24 * 30),
                }
            })
            .collect()
    }
}

impl Editable for CalendarEvent {
    type Draft = NewCalendarEvent;
    type Patch = CalendarEventPatch;

    fn build(id: String, now: DateTime<Utc>, draft: NewCalendarEvent) -> Result<Self> {
        let event = CalendarEvent {
            id,
            title: require("title", &draft.title)?,
            description: draft.description.map(|d| d.trim().to_string()).unwrap_or_default(),
            location: draft.location.map(|l| l.trim().to_string()).unwrap_or_default(),
            start: draft.start,
            end: draft.end.unwrap_or(draft.start + Duration::hours(1)),
            all_day: draft.all_day.unwrap_or(false),
            category: draft.category.unwrap_or(EventCategory::Meeting),
            created_at: now,
        };
        event.check_span()?;
        Ok(event)
    }

    fn apply(&mut self, patch: &CalendarEventPatch) -> Result<()> {
        if let Some(title) = &patch.title {
            self.title = require("title", title)?;
        }
        if let Some(description) = &patch.description {
            self.description = description.trim().to_string();
        }
        if let Some(location) = &patch.location {
            self.location = location.trim().to_string();
        }
        if let Some(start) = patch.start {
            self.start = start;
        }
        if let Some(end) = patch.end {
            self.end = end;
        }
        if let Some(all_day) = patch.all_day {
            self.all_day = all_day;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        self.check_span()
    }
}

impl Store {
    pub fn events(&self) -> Collection<CalendarEvent> {
        self.collection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft() -> NewCalendarEvent {
        NewCalendarEvent {
            title: "Planning".into(),
            start: Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap(),
            end: None,
            description: None,
            location: None,
            all_day: None,
            category: None,
        }
    }

    #[test]
    fn end_defaults_to_one_hour_later() {
        let event = CalendarEvent::build("e".into(), Utc::now(), draft()).unwrap();
        assert_eq!(event.end - event.start, Duration::hours(1));
        assert_eq!(event.category, EventCategory::Meeting);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut event = CalendarEvent::build("e".into(), Utc::now(), draft()).unwrap();
        let original = event.clone();
        let err = event
            .apply(&CalendarEventPatch {
                end: Some(original.start - Duration::minutes(1)),
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.is_validation());
    }
}
