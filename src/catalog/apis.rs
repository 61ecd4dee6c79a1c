//! External APIs and the credential keys they own.
//!
//! Keys are child records: deleting an API deletes its keys, and a key can only
//! be created for an API that exists.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::{require, Result, StoreError};
use crate::store::seed::generate_secret;
use crate::store::{Collection, Editable, Record, SeedContext, SortDir, SortKey, Store, Toggle};

string_enum!(ApiStatus {
    Active => "active",
    Inactive => "inactive",
});

string_enum!(KeyStatus {
    Active => "active",
    Revoked => "revoked",
});

/// Scopes given to a key created without any.
pub const DEFAULT_SCOPES: &[&str] = &["read"];

const SCOPES: &[&str] = &["read", "write", "admin", "billing"];

const SAMPLE_APIS: &[(&str, &str, &str)] = &[
    ("Stripe", "https://api.stripe.com", "Payments and subscriptions"),
    ("SendGrid", "https://api.sendgrid.com", "Transactional email"),
    ("OpenWeather", "https://api.openweathermap.org", "Weather data"),
    ("GitHub", "https://api.github.com", "Repository automation"),
    ("Twilio", "https://api.twilio.com", "SMS notifications"),
    ("Mapbox", "https://api.mapbox.com", "Maps and geocoding"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Api {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub description: String,
    pub status: ApiStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewApi {
    pub name: String,
    pub base_url: String,
    pub description: Option<String>,
    pub status: Option<ApiStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiPatch {
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub description: Option<String>,
    pub status: Option<ApiStatus>,
}

fn check_url(url: &str) -> Result<String> {
    let url = require("base_url", url)?;
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(StoreError::validation("base_url", format!("not an http(s) URL: {url}")));
    }
    Ok(url.trim_end_matches('/').to_string())
}

impl Record for Api {
    const KEY: &'static str = "apis";
    const DEFAULT_SORT: (&'static str, SortDir) = ("created_at", SortDir::Desc);

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.name.as_str()),
            Cow::Borrowed(self.base_url.as_str()),
            Cow::Borrowed(self.description.as_str()),
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
            "status" => Some(SortKey::text(self.status.as_str())),
            "created_at" => Some(SortKey::Time(self.created_at)),
            _ => None,
        }
    }

    fn seed(ctx: &mut SeedContext<'_>) -> Vec<Self> {
        SAMPLE_APIS
            .iter()
            .map(|(name, base_url, description)| Api {
                id: ctx.id(),
                name: name.to_string(),
                base_url: base_url.to_string(),
                description: description.to_string(),
                status: if ctx.chance(0.8) {
                    ApiStatus::Active
                } else {
                    ApiStatus::Inactive
                },
                created_at: ctx.minutes_ago(60 * 24 * 365),
            })
            .collect()
    }
}

impl Editable for Api {
    type Draft = NewApi;
    type Patch = ApiPatch;

    fn build(id: String, now: DateTime<Utc>, draft: NewApi) -> Result<Self> {
        Ok(Api {
            id,
            name: require("name", &draft.name)?,
            base_url: check_url(&draft.base_url)?,
            description: draft.description.map(|d| d.trim().to_string()).unwrap_or_default(),
            status: draft.status.unwrap_or(ApiStatus::Active),
            created_at: now,
        })
    }

    fn apply(&mut self, patch: &ApiPatch) -> Result<()> {
        if let Some(name) = &patch.name {
            self.name = require("name", name)?;
        }
        if let Some(url) = &patch.base_url {
            self.base_url = check_url(url)?;
        }
        if let Some(description) = &patch.description {
            self.description = description.trim().to_string();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        Ok(())
    }
}

impl Toggle for Api {
    fn toggle(&mut self) {
        self.status = match self.status {
            ApiStatus::Active => ApiStatus::Inactive,
            ApiStatus::Inactive => ApiStatus::Active,
        };
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: String,
    pub api_id: String,
    pub label: String,
    pub secret: String,
    pub scopes: Vec<String>,
    pub status: KeyStatus,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewApiKey {
    pub api_id: String,
    pub label: String,
    pub scopes: Option<Vec<String>>,
    pub status: Option<KeyStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeyPatch {
    pub label: Option<String>,
    pub scopes: Option<Vec<String>>,
    pub status: Option<KeyStatus>,
}

/// Trim, lowercase, drop blanks and duplicates; fall back to [`DEFAULT_SCOPES`].
fn normalize_scopes(scopes: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for scope in scopes {
        let scope = scope.trim().to_lowercase();
        if !scope.is_empty() && !out.contains(&scope) {
            out.push(scope);
        }
    }
    if out.is_empty() {
        out = DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect();
    }
    out
}

impl ApiKey {
    /// The secret with everything but the last four characters hidden.
    pub fn masked_secret(&self) -> String {
        let tail: String = self
            .secret
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("sk_••••{tail}")
    }
}

impl Record for ApiKey {
    const KEY: &'static str = "api_keys";
    const DEFAULT_SORT: (&'static str, SortDir) = ("created_at", SortDir::Desc);
    const PARENT_KEY: Option<&'static str> = Some(Api::KEY);

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.label.as_str()),
            Cow::Owned(self.scopes.join(" ")),
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
            "label" => Some(SortKey::text(&self.label)),
            "status" => Some(SortKey::text(self.status.as_str())),
            "created_at" => Some(SortKey::Time(self.created_at)),
            "last_used_at" => self.last_used_at.map(SortKey::Time),
            _ => None,
        }
    }

    fn parent_id(&self) -> Option<&str> {
        Some(&self.api_id)
    }

    fn seed(ctx: &mut SeedContext<'_>) -> Vec<Self> {
        let parents = ctx.parent_ids.to_vec();
        let mut keys = Vec::new();
        for api_id in parents {
            for n in 0..ctx.range(1, 3) {
                let created_at = ctx.minutes_ago(60 * 24 * 120);
                let scopes: Vec<String> = SCOPES
                    .iter()
                    .filter(|_| ctx.chance(0.5))
                    .map(|s| s.to_string())
                    .collect();
                let last_used_at = ctx
                    .chance(0.7)
                    .then(|| created_at + Duration::minutes(ctx.range(1, 60 * 24 * 7) as i64))
                    .map(|t| t.min(ctx.now));
                keys.push(ApiKey {
                    id: ctx.id(),
                    api_id: api_id.clone(),
                    label: if n == 0 { "Production".into() } else { format!("Staging {n}") },
                    secret: ctx.secret(),
                    scopes: normalize_scopes(&scopes),
                    status: if ctx.chance(0.85) {
                        KeyStatus::Active
                    } else {
                        KeyStatus::Revoked
                    },
                    created_at,
                    last_used_at,
                });
            }
        }
        keys
    }
}

impl Editable for ApiKey {
    type Draft = NewApiKey;
    type Patch = ApiKeyPatch;

    fn build(id: String, now: DateTime<Utc>, draft: NewApiKey) -> Result<Self> {
        Ok(ApiKey {
            id,
            api_id: require("api_id", &draft.api_id)?,
            label: require("label", &draft.label)?,
            secret: generate_secret(&mut rand::thread_rng()),
            scopes: normalize_scopes(draft.scopes.as_deref().unwrap_or_default()),
            status: draft.status.unwrap_or(KeyStatus::Active),
            created_at: now,
            last_used_at: None,
        })
    }

    fn apply(&mut self, patch: &ApiKeyPatch) -> Result<()> {
        if let Some(label) = &patch.label {
            self.label = require("label", label)?;
        }
        if let Some(scopes) = &patch.scopes {
            self.scopes = normalize_scopes(scopes);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        Ok(())
    }
}

impl Toggle for ApiKey {
    fn toggle(&mut self) {
        self.status = match self.status {
            KeyStatus::Active => KeyStatus::Revoked,
            KeyStatus::Revoked => KeyStatus::Active,
        };
    }
}

impl Store {
    pub fn apis(&self) -> Collection<Api> {
        self.collection()
    }

    /// Key collection, with the API collection seeded first so seeded keys
    /// have parents to attach to.
    pub async fn api_keys(&self) -> Result<Collection<ApiKey>> {
        self.apis().snapshot().await?;
        Ok(self.collection())
    }

    /// Create a key for an existing API.
    pub async fn create_api_key(&self, draft: NewApiKey) -> Result<ApiKey> {
        let key = self.api_keys().await?.create(draft).await?;
        tracing::info!(api_id = %key.api_id, key_id = %key.id, "api key created");
        Ok(key)
    }

    /// Delete an API together with all of its keys.
    ///
    /// Keys are removed first so a failure between the two writes never leaves
    /// keys pointing at a missing API.
    pub async fn delete_api(&self, id: &str) -> Result<()> {
        let keys = self.api_keys().await?;
        let removed_keys = keys.delete_where(|k| k.api_id == id).await?;
        self.apis().delete(id).await?;
        tracing::info!(api_id = id, removed_keys, "api deleted");
        Ok(())
    }

    /// Bulk form of [`Store::delete_api`].
    pub async fn delete_apis(&self, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let keys = self.api_keys().await?;
        let removed_keys = keys
            .delete_where(|k| ids.iter().any(|id| *id == k.api_id))
            .await?;
        let removed = self.apis().delete_bulk(ids).await?;
        tracing::info!(removed, removed_keys, "apis deleted");
        Ok(removed)
    }

    /// Issue a new secret for a key and reset its creation time. Label, scopes,
    /// and status are kept.
    pub async fn rotate_api_key(&self, id: &str) -> Result<ApiKey> {
        let keys = self.api_keys().await?;
        let now = keys.now();
        let rotated = keys
            .modify(id, |key| {
                let mut rng = rand::thread_rng();
                let mut secret = generate_secret(&mut rng);
                while secret == key.secret {
                    secret = generate_secret(&mut rng);
                }
                key.secret = secret;
                key.created_at = now;
                Ok(())
            })
            .await?;
        tracing::info!(key_id = id, "api key rotated");
        Ok(rotated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_are_normalized() {
        let scopes = normalize_scopes(&[" Write ".into(), "write".into(), "".into(), "read".into()]);
        assert_eq!(scopes, vec!["write".to_string(), "read".to_string()]);
        assert_eq!(normalize_scopes(&[]), vec!["read".to_string()]);
    }

    #[test]
    fn url_must_be_http() {
        assert!(check_url("ftp://x").unwrap_err().is_validation());
        assert_eq!(check_url(" https://api.x.com/ ").unwrap(), "https://api.x.com");
    }

    #[test]
    fn masked_secret_shows_tail() {
        let key = ApiKey::build(
            "k".into(),
            Utc::now(),
            NewApiKey {
                api_id: "a".into(),
                label: "Prod".into(),
                ..Default::default()
            },
        )
        .unwrap();
        let tail = &key.secret[key.secret.len() - 4..];
        assert!(key.masked_secret().ends_with(tail));
        assert_eq!(key.scopes, vec!["read".to_string()]);
    }
}
