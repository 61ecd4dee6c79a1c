use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::{require, Result, StoreError};
use crate::store::record::round_money;
use crate::store::seed::email_for;
use crate::store::{Collection, Editable, Record, SeedContext, SortDir, SortKey, Store};

string_enum!(Plan {
    Free => "free",
    Pro => "pro",
    Team => "team",
    Enterprise => "enterprise",
});

string_enum!(BillingInterval {
    Monthly => "monthly",
    Yearly => "yearly",
});

string_enum!(SubscriptionStatus {
    Active => "active",
    Trialing => "trialing",
    PastDue => "past_due",
    Canceled => "canceled",
});

impl Plan {
    /// List price for the plan at the given billing interval.
    pub fn list_price(&self, interval: BillingInterval) -> f64 {
        let monthly = match self {
            Self::Free => 0.0,
            Self::Pro => 19.0,
            Self::Team => 49.0,
            Self::Enterprise => 199.0,
        };
        match interval {
            BillingInterval::Monthly => monthly,
            // two months free on annual billing
            BillingInterval::Yearly => monthly * 10.0,
        }
    }
}

impl BillingInterval {
    pub fn period(&self) -> Duration {
        match self {
            Self::Monthly => Duration::days(30),
            Self::Yearly => Duration::days(365),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub customer: String,
    pub email: String,
    pub plan: Plan,
    /// Rounded to cents.
    pub price: f64,
    pub interval: BillingInterval,
    pub status: SubscriptionStatus,
    pub started_at: DateTime<Utc>,
    /// `None` once canceled.
    pub renews_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSubscription {
    pub customer: String,
    pub email: Option<String>,
    pub plan: Option<Plan>,
    pub price: Option<f64>,
    pub interval: Option<BillingInterval>,
    pub status: Option<SubscriptionStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionPatch {
    pub plan: Option<Plan>,
    pub price: Option<f64>,
    pub interval: Option<BillingInterval>,
    pub status: Option<SubscriptionStatus>,
}

fn check_price(price: f64) -> Result<f64> {
    if !price.is_finite() || price < 0.0 {
        return Err(StoreError::validation("price", format!("must be non-negative, got {price}")));
    }
    Ok(round_money(price))
}

impl Subscription {
    /// Next renewal after `started_at`, or `None` for canceled subscriptions.
    fn renewal(&self) -> Option<DateTime<Utc>> {
        (self.status != SubscriptionStatus::Canceled)
            .then(|| self.started_at + self.interval.period())
    }
}

impl Record for Subscription {
    const KEY: &'static str = "subscriptions";
    const DEFAULT_SORT: (&'static str, SortDir) = ("started_at", SortDir::Desc);

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.customer.as_str()),
            Cow::Borrowed(self.plan.as_str()),
            Cow::Borrowed(self.status.as_str()),
        ]
    }

    fn status(&self) -> Option<&str> {
        Some(self.status.as_str())
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.started_at)
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "customer" => Some(SortKey::text(&self.customer)),
            "plan" => Some(SortKey::text(self.plan.as_str())),
            "price" => Some(SortKey::Number(self.price)),
            "status" => Some(SortKey::text(self.status.as_str())),
            "started_at" => Some(SortKey::Time(self.started_at)),
            "renews_at" => self.renews_at.map(SortKey::Time),
            _ => None,
        }
    }

    fn seed(ctx: &mut SeedContext<'_>) -> Vec<Self> {
        (0..24)
            .map(|_| {
                let customer = ctx.person();
                let plan = ctx.pick(Plan::ALL);
                let interval = ctx.pick(BillingInterval::ALL);
                let mut sub = Subscription {
                    id: ctx.id(),
                    email: email_for(&customer, "example.com"),
                    customer,
                    plan,
                    price: plan.list_price(interval),
                    interval,
                    status: ctx.pick(SubscriptionStatus::ALL),
                    started_at: ctx.minutes_ago(60 * 24 * 365),
                    renews_at: None,
                };
                sub.renews_at = sub.renewal();
                sub
            })
            .collect()
    }
}

impl Editable for Subscription {
    type Draft = NewSubscription;
    type Patch = SubscriptionPatch;

    fn build(id: String, now: DateTime<Utc>, draft: NewSubscription) -> Result<Self> {
        let plan = draft.plan.unwrap_or(Plan::Pro);
        let interval = draft.interval.unwrap_or(BillingInterval::Monthly);
        let price = match draft.price {
            Some(price) => check_price(price)?,
            None => plan.list_price(interval),
        };
        let mut sub = Subscription {
            id,
            customer: require("customer", &draft.customer)?,
            email: draft.email.map(|e| e.trim().to_lowercase()).unwrap_or_default(),
            plan,
            price,
            interval,
            status: draft.status.unwrap_or(SubscriptionStatus::Active),
            started_at: now,
            renews_at: None,
        };
        sub.renews_at = sub.renewal();
        Ok(sub)
    }

    fn apply(&mut self, patch: &SubscriptionPatch) -> Result<()> {
        let repriced = patch.plan.is_some() || patch.interval.is_some();
        if let Some(plan) = patch.plan {
            self.plan = plan;
        }
        if let Some(interval) = patch.interval {
            self.interval = interval;
        }
        match patch.price {
            Some(price) => self.price = check_price(price)?,
            None if repriced => self.price = self.plan.list_price(self.interval),
            None => {}
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.renews_at = self.renewal();
        Ok(())
    }
}

impl Store {
    pub fn subscriptions(&self) -> Collection<Subscription> {
        self.collection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_defaults_to_plan_list_price() {
        let sub = Subscription::build(
            "s".into(),
            Utc::now(),
            NewSubscription {
                customer: "Ava".into(),
                plan: Some(Plan::Team),
                interval: Some(BillingInterval::Yearly),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(sub.price, 490.0);
        assert_eq!(sub.renews_at, Some(sub.started_at + Duration::days(365)));
    }

    #[test]
    fn cancel_clears_renewal_and_plan_change_reprices() {
        let mut sub = Subscription::build(
            "s".into(),
            Utc::now(),
            NewSubscription {
                customer: "Ava".into(),
                price: Some(12.346),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(sub.price, 12.35);

        sub.apply(&SubscriptionPatch {
            plan: Some(Plan::Enterprise),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(sub.price, 199.0);

        sub.apply(&SubscriptionPatch {
            status: Some(SubscriptionStatus::Canceled),
            ..Default::default()
        })
        .unwrap();
        assert!(sub.renews_at.is_none());
    }
}
