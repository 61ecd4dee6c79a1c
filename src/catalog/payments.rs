use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::{require, Result, StoreError};
use crate::store::record::round_money;
use crate::store::seed::email_for;
use crate::store::{Collection, Editable, Record, SeedContext, SortDir, SortKey, Store};

string_enum!(PaymentStatus {
    Paid => "paid",
    Pending => "pending",
    Failed => "failed",
    Refunded => "refunded",
});

string_enum!(PaymentMethod {
    Card => "card",
    BankTransfer => "bank_transfer",
    Paypal => "paypal",
});

const CURRENCIES: &[&str] = &["USD", "EUR", "GBP"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub customer: String,
    pub email: String,
    /// Rounded to cents.
    pub amount: f64,
    /// ISO 4217 code, uppercase.
    pub currency: String,
    pub status: PaymentStatus,
    pub method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPayment {
    pub customer: String,
    pub email: Option<String>,
    pub amount: f64,
    pub currency: Option<String>,
    pub status: Option<PaymentStatus>,
    pub method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentPatch {
    pub customer: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub status: Option<PaymentStatus>,
    pub method: Option<PaymentMethod>,
}

fn check_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(StoreError::validation(
            "amount",
            format!("must be a non-negative number, got {amount}"),
        ));
    }
    Ok(round_money(amount))
}

fn check_currency(currency: &str) -> Result<String> {
    let code = require("currency", currency)?.to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(StoreError::validation("currency", format!("not a currency code: {code}")));
    }
    Ok(code)
}

impl Payment {
    /// Amount as shown in lists and matched by search, e.g. `"129.90"`.
    pub fn amount_text(&self) -> String {
        format!("{:.2}", self.amount)
    }
}

impl Record for Payment {
    const KEY: &'static str = "payments";
    const DEFAULT_SORT: (&'static str, SortDir) = ("created_at", SortDir::Desc);

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.customer.as_str()),
            Cow::Borrowed(self.currency.as_str()),
            Cow::Owned(self.amount_text()),
            Cow::Borrowed(self.status.as_str()),
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
            "customer" => Some(SortKey::text(&self.customer)),
            "amount" => Some(SortKey::Number(self.amount)),
            "currency" => Some(SortKey::text(&self.currency)),
            "status" => Some(SortKey::text(self.status.as_str())),
            "created_at" => Some(SortKey::Time(self.created_at)),
            _ => None,
        }
    }

    fn seed(ctx: &mut SeedContext<'_>) -> Vec<Self> {
        (0..48)
            .map(|_| {
                let customer = ctx.person();
                Payment {
                    id: ctx.id(),
                    email: email_for(&customer, "example.com"),
                    customer,
                    amount: round_money(ctx.float(5.0, 2500.0)),
                    currency: ctx.pick(CURRENCIES).to_string(),
                    status: ctx.pick(PaymentStatus::ALL),
                    method: ctx.pick(PaymentMethod::ALL),
                    created_at: ctx.minutes_ago(60 * 24 * 90),
                }
            })
            .collect()
    }
}

impl Editable for Payment {
    type Draft = NewPayment;
    type Patch = PaymentPatch;

    fn build(id: String, now: DateTime<Utc>, draft: NewPayment) -> Result<Self> {
        Ok(Payment {
            id,
            customer: require("customer", &draft.customer)?,
            email: draft.email.map(|e| e.trim().to_lowercase()).unwrap_or_default(),
            amount: check_amount(draft.amount)?,
            currency: check_currency(draft.currency.as_deref().unwrap_or("USD"))?,
            status: draft.status.unwrap_or(PaymentStatus::Pending),
            method: draft.method.unwrap_or(PaymentMethod::Card),
            created_at: now,
        })
    }

    fn apply(&mut self, patch: &PaymentPatch) -> Result<()> {
        if let Some(customer) = &patch.customer {
            self.customer = require("customer", customer)?;
        }
        if let Some(amount) = patch.amount {
            self.amount = check_amount(amount)?;
        }
        if let Some(currency) = &patch.currency {
            self.currency = check_currency(currency)?;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(method) = patch.method {
            self.method = method;
        }
        Ok(())
    }
}

impl Store {
    pub fn payments(&self) -> Collection<Payment> {
        self.collection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(amount: f64) -> NewPayment {
        NewPayment {
            customer: "Ava Chen".into(),
            email: None,
            amount,
            currency: Some("eur".into()),
            status: None,
            method: None,
        }
    }

    #[test]
    fn amount_rounds_and_currency_uppercases() {
        let p = Payment::build("p".into(), Utc::now(), draft(19.999)).unwrap();
        assert_eq!(p.amount, 20.0);
        assert_eq!(p.currency, "EUR");
        assert_eq!(p.status, PaymentStatus::Pending);
        assert_eq!(p.amount_text(), "20.00");
    }

    #[test]
    fn negative_amount_is_rejected() {
        assert!(Payment::build("p".into(), Utc::now(), draft(-1.0))
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn amount_text_is_searchable() {
        let p = Payment::build("p".into(), Utc::now(), draft(129.9)).unwrap();
        assert!(p.search_fields().iter().any(|f| f == "129.90"));
    }
}
