//! Deterministic sample-data helpers.
//!
//! Each collection gets its own RNG stream derived from the configured seed and
//! the collection key, so seeding one collection never shifts another's data.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const FIRST_NAMES: &[&str] = &[
    "Ava", "Liam", "Mia", "Noah", "Zoe", "Ethan", "Isla", "Lucas", "Nora", "Omar", "Priya",
    "Mateo", "Hana", "Felix", "Amara", "Jonas",
];

pub const LAST_NAMES: &[&str] = &[
    "Smith", "Garcia", "Chen", "Okafor", "Novak", "Rossi", "Tanaka", "Dubois", "Kowalski",
    "Silva", "Haddad", "Larsen",
];

/// RNG and context handed to [`super::Record::seed`].
pub struct SeedContext<'a> {
    pub rng: StdRng,
    pub now: DateTime<Utc>,
    /// Ids of the parent collection, for child records.
    pub parent_ids: &'a [String],
}

impl<'a> SeedContext<'a> {
    pub fn new(seed: u64, key: &str, now: DateTime<Utc>, parent_ids: &'a [String]) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed ^ key_salt(key)),
            now,
            parent_ids,
        }
    }

    /// A reproducible UUID-formatted id.
    pub fn id(&mut self) -> String {
        uuid::Builder::from_random_bytes(self.rng.gen())
            .into_uuid()
            .to_string()
    }

    pub fn pick<T: Copy>(&mut self, options: &[T]) -> T {
        options[self.rng.gen_range(0..options.len())]
    }

    pub fn range(&mut self, low: u64, high: u64) -> u64 {
        self.rng.gen_range(low..=high)
    }

    pub fn float(&mut self, low: f64, high: f64) -> f64 {
        self.rng.gen_range(low..high)
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability)
    }

    /// A time up to `max_minutes` before now.
    pub fn minutes_ago(&mut self, max_minutes: i64) -> DateTime<Utc> {
        self.now - Duration::minutes(self.rng.gen_range(0..=max_minutes))
    }

    /// "First Last" from the shared name pools.
    pub fn person(&mut self) -> String {
        format!("{} {}", self.pick(FIRST_NAMES), self.pick(LAST_NAMES))
    }

    pub fn secret(&mut self) -> String {
        generate_secret(&mut self.rng)
    }
}

/// An `sk_`-prefixed 32 character alphanumeric secret.
pub fn generate_secret(rng: &mut impl Rng) -> String {
    let body: String = rng
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    format!("sk_{body}")
}

/// Lowercase `"First Last"` into `first.last@domain`.
pub fn email_for(name: &str, domain: &str) -> String {
    format!("{}@{domain}", name.to_lowercase().replace(' ', "."))
}

/// FNV-1a hash of the collection key.
fn key_salt(key: &str) -> u64 {
    key.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn same_seed_and_key_repeat() {
        let mut a = SeedContext::new(42, "users", now(), &[]);
        let mut b = SeedContext::new(42, "users", now(), &[]);
        assert_eq!(a.id(), b.id());
        assert_eq!(a.person(), b.person());
        assert_eq!(a.secret(), b.secret());
    }

    #[test]
    fn different_keys_diverge() {
        let mut a = SeedContext::new(42, "users", now(), &[]);
        let mut b = SeedContext::new(42, "emails", now(), &[]);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn secrets_have_prefix_and_length() {
        let secret = generate_secret(&mut rand::thread_rng());
        assert!(secret.starts_with("sk_"));
        assert_eq!(secret.len(), 35);
    }

    #[test]
    fn minutes_ago_never_in_future() {
        let mut ctx = SeedContext::new(1, "x", now(), &[]);
        for _ in 0..100 {
            assert!(ctx.minutes_ago(600) <= now());
        }
    }

    #[test]
    fn email_from_name() {
        assert_eq!(email_for("Ava Chen", "example.com"), "ava.chen@example.com");
    }
}
