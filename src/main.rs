use anyhow::{Context, Result};
use clap::Parser;
use fundscraper::{
    config,
    export::{self, display_rows, render_table},
    fetch::{self, DiskCache, FundamentusSource},
    pipeline,
    schema::{CanonicalField, ColumnResolver, ResolverRules},
    screen::{Bound, FilterCriteria},
    FetchError, RawTable,
};
use std::{path::PathBuf, time::Duration};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

/// Screen Brazilian equities from the fundamentus.com.br results table.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Page to scrape.
    #[arg(long, default_value = fetch::DEFAULT_URL)]
    url: Url,

    /// Read a saved copy of the page instead of fetching it.
    #[arg(long)]
    html: Option<PathBuf>,

    #[arg(long, default_value = ".cache/fundscraper")]
    cache_dir: PathBuf,

    #[arg(long, default_value_t = fetch::DEFAULT_TTL.as_secs())]
    cache_ttl_secs: u64,

    /// Always fetch, ignoring and not updating the cache.
    #[arg(long)]
    no_cache: bool,

    /// Criteria file (YAML or JSON); replaces the threshold flags below.
    #[arg(long)]
    criteria: Option<PathBuf>,

    /// Resolver rules file (YAML or JSON) for adapting to upstream drift.
    #[arg(long)]
    rules: Option<PathBuf>,

    #[arg(long, default_value = "resultado_fundamentus.csv")]
    output: PathBuf,

    /// Print the result as JSON instead of a table.
    #[arg(long)]
    json: bool,

    #[arg(long, default_value_t = 15.0)]
    pe_max: f64,
    #[arg(long, default_value_t = 10.0)]
    roic_min: f64,
    #[arg(long, default_value_t = 10.0)]
    roe_min: f64,
    #[arg(long, default_value_t = 500_000.0)]
    liquidity_min: f64,
    #[arg(long, default_value_t = 1.0)]
    debt_max: f64,
    #[arg(long, default_value_t = 1.0)]
    growth_min: f64,
    #[arg(long, default_value_t = 20.0)]
    growth_max: f64,
    #[arg(long, default_value_t = 22.5)]
    graham_max: f64,
}

impl Cli {
    fn criteria(&self) -> Result<FilterCriteria> {
        if let Some(path) = &self.criteria {
            return config::load_criteria(path);
        }
        let criteria = FilterCriteria {
            bounds: Default::default(),
            max_graham_score: self.graham_max,
        }
        .with_bound(CanonicalField::PriceEarnings, Bound::at_most(self.pe_max))
        .with_bound(
            CanonicalField::ReturnOnInvestedCapital,
            Bound::at_least(self.roic_min),
        )
        .with_bound(CanonicalField::ReturnOnEquity, Bound::at_least(self.roe_min))
        .with_bound(
            CanonicalField::DailyLiquidity,
            Bound::at_least(self.liquidity_min),
        )
        .with_bound(CanonicalField::DebtToEquity, Bound::at_most(self.debt_max))
        .with_bound(
            CanonicalField::RevenueGrowth5y,
            Bound::between(self.growth_min, self.growth_max),
        );
        criteria.validate().context("invalid threshold flags")?;
        Ok(criteria)
    }

    fn resolver(&self) -> Result<ColumnResolver> {
        let rules = match &self.rules {
            Some(path) => config::load_rules(path)?,
            None => ResolverRules::default(),
        };
        Ok(ColumnResolver::new(rules))
    }

    async fn table(&self) -> Result<RawTable, FetchError> {
        if let Some(path) = &self.html {
            return fetch::read_table_file(path);
        }
        let source = FundamentusSource::new(self.url.clone(), fetch::DEFAULT_USER_AGENT)?;
        if self.no_cache {
            return source.fetch().await;
        }
        match DiskCache::new(&self.cache_dir) {
            Ok(cache) => {
                source
                    .fetch_cached(&cache, Duration::from_secs(self.cache_ttl_secs))
                    .await
            }
            Err(e) => {
                error!(
                    "cache dir {:?} unusable ({}); fetching directly",
                    self.cache_dir, e
                );
                source.fetch().await
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fundscraper=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) settings ─────────────────────────────────────────────────
    let cli = Cli::parse();
    let criteria = cli.criteria()?;
    let resolver = cli.resolver()?;

    // ─── 3) obtain the raw table ─────────────────────────────────────
    let table = match cli.table().await {
        Ok(t) => t,
        Err(e) => {
            error!("fetch failed: {}", e);
            eprintln!("{}", e.hint());
            return Err(e.into());
        }
    };
    info!(rows = table.len(), source = %table.source, "table ready");

    // ─── 4) screen ───────────────────────────────────────────────────
    let result = pipeline::screen(&table, &resolver, &criteria).context(
        "processing failed; the upstream columns may have changed (see `schema_check`)",
    )?;

    // ─── 5) present ──────────────────────────────────────────────────
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Companies analysed: {}", result.total);
        println!("Companies selected: {}", result.retained);
        println!();
        print!("{}", render_table(&display_rows(&result)));
    }
    export::write_csv(&result, &cli.output)
        .with_context(|| format!("writing {:?}", cli.output))?;

    Ok(())
}
