// src/fetch/mod.rs
pub mod cache;

use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::{path::Path, time::Duration};
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use cache::{DiskCache, TableCache};

use crate::error::FetchError;
use crate::process::RawTable;

/// The screener results page.
pub static DEFAULT_URL: &str = "https://fundamentus.com.br/resultado.php";

/// The upstream rejects requests without a browser-like agent.
pub static DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/94.0.4606.81 Safari/537.36";

/// How long a fetched table stays fresh.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// HTTP source of the raw valuation table.
pub struct FundamentusSource {
    client: Client,
    url: Url,
}

impl FundamentusSource {
    pub fn new(url: Url, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .build()
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    #[instrument(level = "info", skip(self), fields(url = %self.url))]
    pub async fn fetch(&self) -> Result<RawTable, FetchError> {
        let url = self.url.to_string();
        let request_err = |source| FetchError::Request {
            url: url.clone(),
            source,
        };

        let resp = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(request_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status,
            });
        }
        let html = resp.text().await.map_err(request_err)?;
        info!(bytes = html.len(), "page downloaded");

        parse_table(&html, &url)
    }

    /// Serve from `cache` while fresh, otherwise fetch and store for `ttl`.
    pub async fn fetch_cached(
        &self,
        cache: &dyn TableCache,
        ttl: Duration,
    ) -> Result<RawTable, FetchError> {
        let key = self.url.as_str();
        if let Some(table) = cache.get(key) {
            info!(key, fetched_at = %table.fetched_at, "using cached table");
            return Ok(table);
        }
        let table = self.fetch().await?;
        cache.put(key, &table, ttl);
        Ok(table)
    }
}

/// Read a saved copy of the page from disk.
pub fn read_table_file(path: &Path) -> Result<RawTable, FetchError> {
    let html = std::fs::read_to_string(path).map_err(|source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(&html, &path.display().to_string())
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the first `<table>` of `html`: headers from its `th` cells,
/// one row per `tr` holding `td` cells.
pub fn parse_table(html: &str, source: &str) -> Result<RawTable, FetchError> {
    let table_sel = Selector::parse("table").expect("table selector should parse");
    let th_sel = Selector::parse("th").expect("th selector should parse");
    let tr_sel = Selector::parse("tr").expect("tr selector should parse");
    let td_sel = Selector::parse("td").expect("td selector should parse");

    let document = Html::parse_document(html);
    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| FetchError::NoTable(source.to_string()))?;

    let headers: Vec<String> = table.select(&th_sel).map(cell_text).collect();
    if headers.is_empty() {
        return Err(FetchError::NoHeader(source.to_string()));
    }

    let rows: Vec<Vec<String>> = table
        .select(&tr_sel)
        .map(|tr| tr.select(&td_sel).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect();
    if rows.is_empty() {
        return Err(FetchError::EmptyTable(source.to_string()));
    }

    let ragged = rows.iter().filter(|r| r.len() != headers.len()).count();
    if ragged > 0 {
        warn!(
            ragged,
            width = headers.len(),
            "rows whose width differs from the header"
        );
    }
    debug!(headers = ?headers, "header row");
    info!(columns = headers.len(), rows = rows.len(), "parsed table");

    Ok(RawTable::new(headers, rows, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
<table id="resultado">
  <thead><tr>
    <th><span title="Código">Papel</span></th><th>P/L</th><th>P/VP</th><th>ROE</th>
  </tr></thead>
  <tbody>
    <tr><td><span><a href="detalhes.php?papel=PETR4">PETR4</a></span></td><td>5,20</td><td>0,90</td><td>25,30%</td></tr>
    <tr><td>VALE3</td><td>-</td><td> 1,10 </td><td>12,00%</td></tr>
  </tbody>
</table>
<table><tr><th>other</th></tr></table>
</body></html>"#;

    #[test]
    fn parses_first_table() -> anyhow::Result<()> {
        let table = parse_table(PAGE, "test")?;
        assert_eq!(table.headers, vec!["Papel", "P/L", "P/VP", "ROE"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["PETR4", "5,20", "0,90", "25,30%"]);
        assert_eq!(table.rows[1][2], "1,10");
        assert_eq!(table.source, "test");
        Ok(())
    }

    #[test]
    fn reports_structural_problems() {
        assert!(matches!(
            parse_table("<html><p>blocked</p></html>", "x"),
            Err(FetchError::NoTable(_))
        ));
        assert!(matches!(
            parse_table("<table><tr><td>1</td></tr></table>", "x"),
            Err(FetchError::NoHeader(_))
        ));
        assert!(matches!(
            parse_table("<table><tr><th>Papel</th></tr></table>", "x"),
            Err(FetchError::EmptyTable(_))
        ));
    }

    #[test]
    fn reads_saved_page() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("resultado.html");
        std::fs::write(&path, PAGE)?;
        assert_eq!(read_table_file(&path)?.rows.len(), 2);

        let missing = read_table_file(&dir.path().join("nope.html"));
        assert!(matches!(missing, Err(FetchError::Io { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn fetch_cached_serves_fresh_entry_under_the_url() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let cache = DiskCache::new(dir.path())?;
        // nothing listens on the discard port, so any real request fails
        let url = Url::parse("http://127.0.0.1:9/resultado.php")?;
        let source = FundamentusSource::new(url.clone(), DEFAULT_USER_AGENT)?;

        let stored = parse_table(PAGE, url.as_str())?;
        cache.put(url.as_str(), &stored, DEFAULT_TTL);
        let table = source.fetch_cached(&cache, DEFAULT_TTL).await?;
        assert_eq!(table.headers, stored.headers);
        assert_eq!(table.rows, stored.rows);

        cache.put(url.as_str(), &stored, Duration::ZERO);
        let expired = source.fetch_cached(&cache, DEFAULT_TTL).await;
        assert!(matches!(expired, Err(FetchError::Request { .. })));
        Ok(())
    }
}
