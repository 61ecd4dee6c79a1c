//! Daily traffic series and the aggregates derived from it.
//!
//! `analytics_daily` is the source of truth. The per-channel breakdown and the
//! KPI singleton are computed from it the first time they are read and then
//! stored like any other collection.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::Result;
use crate::store::record::round_percent;
use crate::store::{Collection, ListParams, Page, Record, SeedContext, SortDir, SortKey, Store};

pub const KPIS_KEY: &str = "analytics_kpis";

const SERIES_DAYS: i64 = 30;

string_enum!(Channel {
    Direct => "direct",
    Organic => "organic",
    Referral => "referral",
    Social => "social",
    Email => "email",
});

impl Channel {
    /// Share of daily visitors attributed to the channel. Sums to 1.
    pub fn weight(&self) -> f64 {
        match self {
            Self::Direct => 0.30,
            Self::Organic => 0.35,
            Self::Referral => 0.15,
            Self::Social => 0.12,
            Self::Email => 0.08,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsDaily {
    pub id: String,
    pub date: NaiveDate,
    pub visitors: u64,
    pub pageviews: u64,
    pub bounce_rate: f64,
    pub avg_session_secs: u64,
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

impl Record for AnalyticsDaily {
    const KEY: &'static str = "analytics_daily";
    const DEFAULT_SORT: (&'static str, SortDir) = ("date", SortDir::Desc);

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Owned(self.date.to_string())]
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(midnight(self.date))
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "date" => Some(SortKey::Time(midnight(self.date))),
            "visitors" => Some(SortKey::Number(self.visitors as f64)),
            "pageviews" => Some(SortKey::Number(self.pageviews as f64)),
            "bounce_rate" => Some(SortKey::Number(self.bounce_rate)),
            "avg_session_secs" => Some(SortKey::Number(self.avg_session_secs as f64)),
            _ => None,
        }
    }

    fn seed(ctx: &mut SeedContext<'_>) -> Vec<Self> {
        let today = ctx.now.date_naive();
        (0..SERIES_DAYS)
            .map(|offset| {
                let visitors = ctx.range(800, 2_400);
                let depth = ctx.float(1.8, 3.6);
                AnalyticsDaily {
                    id: ctx.id(),
                    date: today - Duration::days(offset),
                    visitors,
                    pageviews: (visitors as f64 * depth).round() as u64,
                    bounce_rate: round_percent(ctx.float(28.0, 64.0)),
                    avg_session_secs: ctx.range(60, 420),
                }
            })
            .collect()
    }
}

/// Visitors of one channel on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDaily {
    /// `"{date}-{channel}"`.
    pub id: String,
    pub date: NaiveDate,
    pub channel: Channel,
    pub visitors: u64,
}

impl Record for SourceDaily {
    const KEY: &'static str = "analytics_sources_daily";
    const DEFAULT_SORT: (&'static str, SortDir) = ("date", SortDir::Desc);

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Borrowed(self.channel.as_str())]
    }

    fn status(&self) -> Option<&str> {
        Some(self.channel.as_str())
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(midnight(self.date))
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "date" => Some(SortKey::Time(midnight(self.date))),
            "channel" => Some(SortKey::text(self.channel.as_str())),
            "visitors" => Some(SortKey::Number(self.visitors as f64)),
            _ => None,
        }
    }
}

/// Split each day's visitors across [`Channel::ALL`]. Every channel but the last
/// gets the floor of its weighted share; the last takes the remainder, so the
/// channels of a day always sum to that day's visitors.
pub fn derive_sources(daily: &[AnalyticsDaily]) -> Vec<SourceDaily> {
    let mut sources = Vec::with_capacity(daily.len() * Channel::ALL.len());
    for day in daily {
        let mut assigned = 0;
        for (i, channel) in Channel::ALL.iter().enumerate() {
            let visitors = if i + 1 == Channel::ALL.len() {
                day.visitors - assigned
            } else {
                (day.visitors as f64 * channel.weight()).floor() as u64
            };
            assigned += visitors;
            sources.push(SourceDaily {
                id: format!("{}-{}", day.date, channel),
                date: day.date,
                channel: *channel,
                visitors,
            });
        }
    }
    sources
}

/// Headline numbers over the whole daily series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsKpis {
    pub days: usize,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_visitors: u64,
    pub total_pageviews: u64,
    pub avg_bounce_rate: f64,
    pub avg_session_secs: u64,
    pub pages_per_visit: f64,
    pub generated_at: DateTime<Utc>,
}

impl AnalyticsKpis {
    /// `None` for an empty series.
    pub fn compute(daily: &[AnalyticsDaily], now: DateTime<Utc>) -> Option<Self> {
        let period_start = daily.iter().map(|d| d.date).min()?;
        let period_end = daily.iter().map(|d| d.date).max()?;
        let days = daily.len();

        let total_visitors: u64 = daily.iter().map(|d| d.visitors).sum();
        let total_pageviews: u64 = daily.iter().map(|d| d.pageviews).sum();
        let bounce_sum: f64 = daily.iter().map(|d| d.bounce_rate).sum();
        let session_sum: u64 = daily.iter().map(|d| d.avg_session_secs).sum();
        let pages_per_visit = if total_visitors == 0 {
            0.0
        } else {
            total_pageviews as f64 / total_visitors as f64
        };

        Some(Self {
            days,
            period_start,
            period_end,
            total_visitors,
            total_pageviews,
            avg_bounce_rate: round_percent(bounce_sum / days as f64),
            avg_session_secs: session_sum / days as u64,
            pages_per_visit: (pages_per_visit * 100.0).round() / 100.0,
            generated_at: now,
        })
    }
}

impl Store {
    pub fn analytics_daily(&self) -> Collection<AnalyticsDaily> {
        self.collection()
    }

    /// The full channel breakdown, derived from the daily series on first read.
    pub async fn analytics_sources_snapshot(&self) -> Result<Vec<SourceDaily>> {
        let daily = self.analytics_daily().snapshot().await?;
        self.collection::<SourceDaily>()
            .snapshot_or_seed_with(|_| derive_sources(&daily))
            .await
    }

    pub async fn analytics_sources(&self, params: &ListParams) -> Result<Page<SourceDaily>> {
        let sources = self.analytics_sources_snapshot().await?;
        Ok(crate::store::query::run(sources, params))
    }

    /// KPIs over the daily series, computed and stored on first read. `None`
    /// when there is no daily data.
    pub async fn analytics_kpis(&self) -> Result<Option<AnalyticsKpis>> {
        if let Some(stored) = self.blobs().try_load::<Option<AnalyticsKpis>>(KPIS_KEY).await {
            return Ok(stored);
        }

        let daily = self.analytics_daily().snapshot().await?;
        let Some(kpis) = AnalyticsKpis::compute(&daily, self.now()) else {
            return Ok(None);
        };
        self.blobs().save(KPIS_KEY, &Some(&kpis)).await?;
        tracing::info!(collection = KPIS_KEY, "computed analytics kpis");
        Ok(Some(kpis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(date: &str, visitors: u64) -> AnalyticsDaily {
        AnalyticsDaily {
            id: date.into(),
            date: date.parse().unwrap(),
            visitors,
            pageviews: visitors * 2,
            bounce_rate: 40.0,
            avg_session_secs: 120,
        }
    }

    #[test]
    fn weights_sum_to_one() {
        let sum: f64 = Channel::ALL.iter().map(Channel::weight).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn last_channel_absorbs_residual() {
        let sources = derive_sources(&[day("2025-03-01", 1_001)]);
        assert_eq!(sources.len(), Channel::ALL.len());
        assert_eq!(sources.iter().map(|s| s.visitors).sum::<u64>(), 1_001);
        // direct 300, organic 350, referral 150, social 120
        assert_eq!(sources[4].channel, Channel::Email);
        assert_eq!(sources[4].visitors, 81);
        assert_eq!(sources[0].id, "2025-03-01-direct");
    }

    #[test]
    fn kpis_of_empty_series_are_none() {
        assert!(AnalyticsKpis::compute(&[], Utc::now()).is_none());
    }

    #[test]
    fn kpis_aggregate_the_series() {
        let now = Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap();
        let kpis = AnalyticsKpis::compute(&[day("2025-03-02", 300), day("2025-03-01", 100)], now)
            .unwrap();
        assert_eq!(kpis.days, 2);
        assert_eq!(kpis.total_visitors, 400);
        assert_eq!(kpis.total_pageviews, 800);
        assert_eq!(kpis.pages_per_visit, 2.0);
        assert_eq!(kpis.period_start, "2025-03-01".parse::<NaiveDate>().unwrap());
        assert_eq!(kpis.generated_at, now);
    }
}
