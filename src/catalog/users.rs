use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::{require, Result, StoreError};
use crate::store::seed::email_for;
use crate::store::{Collection, Editable, Record, SeedContext, SortDir, SortKey, Store, Toggle};

string_enum!(
    /// Access level of a dashboard user.
    Role {
        Admin => "admin",
        Editor => "editor",
        Viewer => "viewer",
    }
);

string_enum!(UserStatus {
    Active => "active",
    Inactive => "inactive",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub last_active_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
}

fn check_email(email: &str) -> Result<String> {
    let email = require("email", email)?;
    if !email.contains('@') {
        return Err(StoreError::validation("email", format!("not an address: {email}")));
    }
    Ok(email.to_lowercase())
}

impl Record for User {
    const KEY: &'static str = "users";
    const DEFAULT_SORT: (&'static str, SortDir) = ("created_at", SortDir::Desc);

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.name.as_str()),
            Cow::Borrowed(self.email.as_str()),
            Cow::Borrowed(self.role.as_str()),
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
            "name" => Some(SortKey::text(&self.name)),
            "email" => Some(SortKey::text(&self.email)),
            "role" => Some(SortKey::text(self.role.as_str())),
            "status" => Some(SortKey::text(self.status.as_str())),
            "created_at" => Some(SortKey::Time(self.created_at)),
            "last_active_at" => self.last_active_at.map(SortKey::Time),
            _ => None,
        }
    }

    fn seed(ctx: &mut SeedContext<'_>) -> Vec<Self> {
        (0..24)
            .map(|_| {
                let name = ctx.person();
                let created_at = ctx.minutes_ago(60 * 24 * 180);
                let last_active_at = ctx
                    .chance(0.8)
                    .then(|| created_at + Duration::minutes(ctx.range(0, 60 * 24 * 30) as i64))
                    .map(|t| t.min(ctx.now));
                User {
                    id: ctx.id(),
                    email: email_for(&name, "example.com"),
                    name,
                    role: ctx.pick(Role::ALL),
                    status: if ctx.chance(0.75) {
                        UserStatus::Active
                    } else {
                        UserStatus::Inactive
                    },
                    created_at,
                    last_active_at,
                }
            })
            .collect()
    }
}

impl Editable for User {
    type Draft = NewUser;
    type Patch = UserPatch;

    fn build(id: String, now: DateTime<Utc>, draft: NewUser) -> Result<Self> {
        Ok(User {
            id,
            name: require("name", &draft.name)?,
            email: check_email(&draft.email)?,
            role: draft.role.unwrap_or(Role::Viewer),
            status: draft.status.unwrap_or(UserStatus::Active),
            created_at: now,
            last_active_at: None,
        })
    }

    fn apply(&mut self, patch: &UserPatch) -> Result<()> {
        if let Some(name) = &patch.name {
            self.name = require("name", name)?;
        }
        if let Some(email) = &patch.email {
            self.email = check_email(email)?;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        Ok(())
    }
}

impl Toggle for User {
    fn toggle(&mut self) {
        self.status = match self.status {
            UserStatus::Active => UserStatus::Inactive,
            UserStatus::Inactive => UserStatus::Active,
        };
    }
}

impl Store {
    pub fn users(&self) -> Collection<User> {
        self.collection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    #[test]
    fn build_fills_defaults_and_trims() {
        let user = User::build("u1".into(), Utc::now(), draft("  Ada Lovelace ", "ADA@Example.com")).unwrap();
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role, Role::Viewer);
        assert_eq!(user.status, UserStatus::Active);
        assert!(user.last_active_at.is_none());
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = User::build("u1".into(), Utc::now(), draft("   ", "a@b.c")).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn email_without_at_is_rejected() {
        let err = User::build("u1".into(), Utc::now(), draft("Ada", "nope")).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn toggle_flips_status() {
        let mut user = User::build("u1".into(), Utc::now(), draft("Ada", "a@b.c")).unwrap();
        user.toggle();
        assert_eq!(user.status, UserStatus::Inactive);
        user.toggle();
        assert_eq!(user.status, UserStatus::Active);
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), *role);
        }
        assert!("owner".parse::<Role>().is_err());
    }
}
