// src/config.rs
//! Loading of criteria and resolver rule files (YAML or JSON).

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::{fs, path::Path};
use tracing::info;

use crate::schema::ResolverRules;
use crate::screen::FilterCriteria;

fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let is_json = path
        .extension()
        .and_then(|s| s.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&text).with_context(|| format!("parsing {:?}", path))
    } else {
        serde_yaml::from_str(&text).with_context(|| format!("parsing {:?}", path))
    }
}

/// Read and validate screening criteria.
pub fn load_criteria(path: &Path) -> Result<FilterCriteria> {
    let criteria: FilterCriteria = load_file(path)?;
    criteria
        .validate()
        .with_context(|| format!("invalid criteria in {:?}", path))?;
    info!(path = %path.display(), bounds = criteria.bounds.len(), "loaded criteria");
    Ok(criteria)
}

/// Read replacement alias/token/position tables for the column resolver.
pub fn load_rules(path: &Path) -> Result<ResolverRules> {
    let rules: ResolverRules = load_file(path)?;
    info!(path = %path.display(), fields = rules.fields.len(), "loaded resolver rules");
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CanonicalField;
    use tempfile::tempdir;

    #[test]
    fn loads_yaml_and_json_criteria() -> Result<()> {
        let dir = tempdir()?;
        let yaml = dir.path().join("criteria.yaml");
        fs::write(
            &yaml,
            "max_graham_score: 20\nbounds:\n  price_book: { max: 2 }\n",
        )?;
        let json = dir.path().join("criteria.json");
        fs::write(
            &json,
            r#"{"max_graham_score": 20, "bounds": {"price_book": {"max": 2}}}"#,
        )?;

        let a = load_criteria(&yaml)?;
        let b = load_criteria(&json)?;
        assert_eq!(a, b);
        assert_eq!(a.bounds[&CanonicalField::PriceBook].max, Some(2.0));
        Ok(())
    }

    #[test]
    fn rejects_invalid_criteria_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("criteria.yaml");
        fs::write(&path, "max_graham_score: 20\nbounds:\n  roe: { min: 1 }\n")?;
        assert!(load_criteria(&path).is_err());

        fs::write(
            &path,
            "max_graham_score: 20\nbounds:\n  price_book: { min: 3, max: 1 }\n",
        )?;
        let err = load_criteria(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("inverted"));
        Ok(())
    }

    #[test]
    fn default_rules_survive_a_json_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("rules.json");
        fs::write(&path, serde_json::to_string(&ResolverRules::default())?)?;
        assert_eq!(load_rules(&path)?, ResolverRules::default());
        Ok(())
    }
}
