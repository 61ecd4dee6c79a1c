use anyhow::{Context, Result};
use chrono::NaiveDate;

use pantry::{ListParams, SortDir, Store};

/// Filters accepted by `pantry list`.
pub struct ListArgs {
    pub q: Option<String>,
    pub status: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub desc: bool,
    pub page: usize,
    pub page_size: usize,
}

impl ListArgs {
    fn params(self) -> ListParams {
        let mut params = ListParams::default()
            .page(self.page, self.page_size)
            .between(self.from, self.to);
        if let Some(q) = self.q {
            params = params.search(q);
        }
        if let Some(status) = self.status {
            params = params.status(status);
        }
        let dir = if self.desc { SortDir::Desc } else { SortDir::Asc };
        match self.sort_by {
            Some(field) => params.sort(field, dir),
            None if self.desc => ListParams {
                sort_dir: Some(dir),
                ..params
            },
            None => params,
        }
    }
}

/// Print one page of `collection` as JSON on stdout.
pub async fn list(store: &Store, collection: &str, args: ListArgs) -> Result<()> {
    let page = store.list_json(collection, &args.params()).await?;
    let json = serde_json::to_string_pretty(&page).context("failed to encode page")?;
    println!("{json}");
    eprintln!(
        "Page {}/{} ({} matching records)",
        page.page, page.total_pages, page.total
    );
    Ok(())
}
