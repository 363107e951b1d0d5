// src/schema/rules.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::CanonicalField;

/// Matching rules for one field. Entries may be written as they appear on
/// the page ("P/L", "Liq.2meses"); they are normalized before use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldRules {
    /// Whole-header aliases (tier 1).
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Substrings that identify the field inside a longer header (tier 2).
    #[serde(default)]
    pub tokens: Vec<String>,
}

/// Alias, token and positional tables for the column resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverRules {
    pub fields: BTreeMap<CanonicalField, FieldRules>,
    /// Header count the positional table applies to.
    pub layout_len: usize,
    /// Column index of each field in the expected layout.
    #[serde(default)]
    pub positions: BTreeMap<CanonicalField, usize>,
}

fn rules(aliases: &[&str], tokens: &[&str]) -> FieldRules {
    FieldRules {
        aliases: aliases.iter().map(|s| s.to_string()).collect(),
        tokens: tokens.iter().map(|s| s.to_string()).collect(),
    }
}

impl Default for ResolverRules {
    /// Tables for the fundamentus.com.br `resultado.php` layout:
    ///
    /// Papel | Cotação | P/L | P/VP | PSR | Div.Yield | P/Ativo | P/Cap.Giro |
    /// P/EBIT | P/Ativ Circ.Liq | EV/EBIT | EV/EBITDA | Mrg Ebit | Mrg. Líq. |
    /// Liq. Corr. | ROIC | ROE | Liq.2meses | Patrim. Líq | Dív.Brut/ Patrim. |
    /// Cresc. Rec.5a
    fn default() -> Self {
        use CanonicalField::*;

        let fields = BTreeMap::from([
            (Ticker, rules(&["Papel", "Ticker", "Código"], &["PAPEL", "TICKER"])),
            (
                PriceEarnings,
                rules(&["P/L", "P/E"], &["PRECOLUCRO", "PRICEEARNINGS"]),
            ),
            (
                PriceBook,
                rules(&["P/VP", "P/B"], &["PVPA", "PRECOVP", "PRICEBOOK"]),
            ),
            (ReturnOnEquity, rules(&["ROE"], &["ROE"])),
            (ReturnOnInvestedCapital, rules(&["ROIC"], &["ROIC"])),
            (
                DebtToEquity,
                rules(
                    &["Dív.Brut/ Patrim.", "Dívida Bruta/Patrimônio"],
                    &["DIVBRUT", "DIVIDABRUTA", "DEBTEQUITY"],
                ),
            ),
            (
                DailyLiquidity,
                rules(
                    &["Liq.2meses", "Liquidez 2 meses"],
                    &["2MESES", "LIQDIARIA", "LIQUIDEZDIARIA"],
                ),
            ),
            (
                RevenueGrowth5y,
                rules(
                    &["Cresc. Rec.5a", "Cresc. Rec. 5 anos"],
                    &["CRESCREC", "CRESCIMENTO"],
                ),
            ),
        ]);

        let positions = BTreeMap::from([
            (Ticker, 0),
            (PriceEarnings, 2),
            (PriceBook, 3),
            (ReturnOnInvestedCapital, 15),
            (ReturnOnEquity, 16),
            (DailyLiquidity, 17),
            (DebtToEquity, 19),
            (RevenueGrowth5y, 20),
        ]);

        Self {
            fields,
            layout_len: 21,
            positions,
        }
    }
}

/// Upper-case, fold Portuguese diacritics, and drop everything that is not
/// an ASCII letter or digit. `"Dív.Brut/ Patrim."` → `"DIVBRUTPATRIM"`.
pub fn normalize_header(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_uppercase)
        .map(fold_diacritic)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'Ç' => 'C',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_upstream_headers() {
        assert_eq!(normalize_header("P/L"), "PL");
        assert_eq!(normalize_header("Liq.2meses"), "LIQ2MESES");
        assert_eq!(normalize_header("Dív.Brut/ Patrim."), "DIVBRUTPATRIM");
        assert_eq!(normalize_header("Cresc. Rec.5a"), "CRESCREC5A");
        assert_eq!(normalize_header("  Cotação "), "COTACAO");
        assert_eq!(normalize_header("%/-"), "");
    }

    #[test]
    fn default_rules_cover_every_field() {
        let rules = ResolverRules::default();
        for field in CanonicalField::ALL {
            assert!(rules.fields.contains_key(&field), "{} has no rules", field);
            let pos = rules.positions[&field];
            assert!(pos < rules.layout_len);
        }
    }

    #[test]
    fn rules_load_from_yaml() -> anyhow::Result<()> {
        let yaml = r#"
layout_len: 3
fields:
  ticker: { aliases: ["Papel"] }
  price_earnings: { aliases: ["P/L"], tokens: ["LUCRO"] }
positions:
  ticker: 0
  price_earnings: 1
"#;
        let rules: ResolverRules = serde_yaml::from_str(yaml)?;
        assert_eq!(rules.layout_len, 3);
        assert_eq!(rules.fields[&CanonicalField::PriceEarnings].tokens, vec!["LUCRO"]);
        assert!(rules.fields[&CanonicalField::Ticker].tokens.is_empty());
        Ok(())
    }
}
