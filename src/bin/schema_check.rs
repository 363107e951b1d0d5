use anyhow::Result;
use clap::Parser;
use fundscraper::{
    config,
    fetch::{self, FundamentusSource},
    schema::{normalize_header, CanonicalField, ColumnResolver, ResolverRules},
};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

/// Show how the upstream header row resolves to canonical fields.
#[derive(Debug, Parser)]
struct Args {
    #[arg(long, default_value = fetch::DEFAULT_URL)]
    url: Url,

    /// Read a saved copy of the page instead of fetching it.
    #[arg(long)]
    html: Option<PathBuf>,

    /// Resolver rules to test (YAML or JSON).
    #[arg(long)]
    rules: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let table = match &args.html {
        Some(path) => fetch::read_table_file(path)?,
        None => {
            FundamentusSource::new(args.url.clone(), fetch::DEFAULT_USER_AGENT)?
                .fetch()
                .await?
        }
    };
    let rules = match &args.rules {
        Some(path) => config::load_rules(path)?,
        None => ResolverRules::default(),
    };

    let resolved = ColumnResolver::new(rules).resolve(&table.headers);

    println!("{} headers from {}:", table.headers.len(), table.source);
    for (i, h) in table.headers.iter().enumerate() {
        let field = resolved
            .as_ref()
            .ok()
            .and_then(|map| map.field_for_header(h))
            .map_or("", |f| f.as_str());
        println!("  {:>2}  {:<24} {:<24} {}", i, h, normalize_header(h), field);
    }
    println!();

    match resolved {
        Ok(map) => {
            for field in CanonicalField::ALL {
                if let Some(r) = map.get(field) {
                    println!(
                        "✔ {:<28} ← [{:>2}] {:<24} ({:?})",
                        field.as_str(),
                        r.index,
                        r.header,
                        r.tier
                    );
                }
            }
        }
        Err(e) => {
            for field in &e.unresolved {
                println!("✘ {:<28} unresolved", field.as_str());
            }
            for conflict in &e.conflicts {
                println!("! {}", conflict);
            }
            return Err(e.into());
        }
    }
    Ok(())
}
