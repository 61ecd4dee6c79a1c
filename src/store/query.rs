//! Query engine: free-text search, status and date filters, stable sort,
//! and pagination over a collection snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::record::{Record, SortKey};

/// Sentinel status value that disables the status filter.
pub const STATUS_ALL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDir {
    Asc,
    Desc,
}

impl std::str::FromStr for SortDir {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("unknown sort direction: {s}")),
        }
    }
}

/// Parameters for a list call. `Default` is page 1 of 10 with no filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListParams {
    /// 1-based page number.
    pub page: usize,
    pub page_size: usize,
    /// Case-insensitive substring matched against the record's searchable fields.
    pub q: String,
    pub status: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<SortDir>,
    /// Restrict to these ids. Empty means no restriction.
    pub ids: Vec<String>,
    /// Restrict owned children to a single parent.
    pub parent_id: Option<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            q: String::new(),
            status: None,
            date_from: None,
            date_to: None,
            sort_by: None,
            sort_dir: None,
            ids: Vec::new(),
            parent_id: None,
        }
    }
}

impl ListParams {
    pub fn page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    pub fn search(mut self, q: impl Into<String>) -> Self {
        self.q = q.into();
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn sort(mut self, field: impl Into<String>, dir: SortDir) -> Self {
        self.sort_by = Some(field.into());
        self.sort_dir = Some(dir);
        self
    }

    pub fn ids(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

/// A page of results plus counts over the whole filtered set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of records after filtering, before pagination.
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// Filter, sort, and paginate `records` according to `params`.
pub fn run<T: Record>(records: Vec<T>, params: &ListParams) -> Page<T> {
    let mut matched: Vec<T> = records.into_iter().filter(|r| matches(r, params)).collect();

    let (field, dir) = match &params.sort_by {
        Some(field) => (
            field.as_str(),
            params.sort_dir.unwrap_or(T::DEFAULT_SORT.1),
        ),
        None => (T::DEFAULT_SORT.0, params.sort_dir.unwrap_or(T::DEFAULT_SORT.1)),
    };
    sort_records(&mut matched, field, dir);

    paginate(matched, params.page, params.page_size)
}

/// Stable sort by `field`. Records without a key for `field` sort last.
pub fn sort_records<T: Record>(records: &mut [T], field: &str, dir: SortDir) {
    records.sort_by(|a, b| compare_keys(a.sort_key(field), b.sort_key(field), dir));
}

fn compare_keys(a: Option<SortKey>, b: Option<SortKey>, dir: SortDir) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ord = a.compare(&b);
            match dir {
                SortDir::Asc => ord,
                SortDir::Desc => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Slice one page out of an already filtered and sorted set.
pub fn paginate<T>(records: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total = records.len();
    let total_pages = total.div_ceil(page_size).max(1);

    let start = (page - 1).saturating_mul(page_size);
    let items = records.into_iter().skip(start).take(page_size).collect();

    Page {
        items,
        total,
        page,
        page_size,
        total_pages,
    }
}

fn matches<T: Record>(record: &T, params: &ListParams) -> bool {
    if !params.ids.is_empty() && !params.ids.iter().any(|id| id == record.id()) {
        return false;
    }

    if let Some(parent) = &params.parent_id {
        if record.parent_id() != Some(parent.as_str()) {
            return false;
        }
    }

    let needle = params.q.trim().to_lowercase();
    if !needle.is_empty()
        && !record
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    {
        return false;
    }

    if let Some(status) = params.status.as_deref().filter(|s| *s != STATUS_ALL) {
        if record.status() != Some(status) {
            return false;
        }
    }

    if params.date_from.is_some() || params.date_to.is_some() {
        let Some(day) = record.timestamp().map(|t| t.date_naive()) else {
            return false;
        };
        if params.date_from.is_some_and(|from| day < from) {
            return false;
        }
        if params.date_to.is_some_and(|to| day > to) {
            return false;
        }
    }

    true
}
