//! Header → canonical field resolution, tolerant of upstream schema drift.
//!
//! Each field is tried against three tiers, in order:
//! 1. exact match of the normalized header against the field's aliases,
//! 2. a substring token that no other field also claims,
//! 3. the fixed positional layout, only when the header count matches it.
//!
//! A field left unmapped after all tiers, or two fields claiming the same
//! header, fails the whole resolution.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, instrument, warn};

use super::rules::{normalize_header, ResolverRules};
use super::types::CanonicalField;
use crate::error::{HeaderConflict, SchemaResolutionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Substring,
    Positional,
}

/// Where a field was found in the raw table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub index: usize,
    pub header: String,
    pub tier: MatchTier,
}

/// Total mapping from canonical fields to raw columns for one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMap {
    entries: BTreeMap<CanonicalField, Resolution>,
}

impl ColumnMap {
    pub fn get(&self, field: CanonicalField) -> Option<&Resolution> {
        self.entries.get(&field)
    }

    pub fn index_of(&self, field: CanonicalField) -> Option<usize> {
        self.entries.get(&field).map(|r| r.index)
    }

    pub fn field_for_header(&self, header: &str) -> Option<CanonicalField> {
        self.entries
            .iter()
            .find(|(_, r)| r.header == header)
            .map(|(f, _)| *f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &Resolution)> {
        self.entries.iter().map(|(f, r)| (*f, r))
    }
}

struct CompiledRules {
    aliases: BTreeSet<String>,
    tokens: Vec<String>,
}

/// The single strategy object for column identity.
pub struct ColumnResolver {
    fields: BTreeMap<CanonicalField, CompiledRules>,
    layout_len: usize,
    positions: BTreeMap<CanonicalField, usize>,
}

impl Default for ColumnResolver {
    fn default() -> Self {
        Self::new(ResolverRules::default())
    }
}

/// Bookkeeping while one header list is being resolved.
#[derive(Default)]
struct Assignment {
    entries: BTreeMap<CanonicalField, Resolution>,
    claimed: HashMap<usize, CanonicalField>,
    conflicts: Vec<HeaderConflict>,
}

impl Assignment {
    fn is_resolved(&self, field: CanonicalField) -> bool {
        self.entries.contains_key(&field)
    }

    fn claim(&mut self, field: CanonicalField, index: usize, header: &str, tier: MatchTier) {
        if let Some(&owner) = self.claimed.get(&index) {
            warn!(header, %owner, %field, "header already claimed");
            self.conflicts.push(HeaderConflict::Collision {
                header: header.to_string(),
                first: owner,
                second: field,
            });
            return;
        }
        debug!(%field, header, index, ?tier, "resolved");
        self.claimed.insert(index, field);
        self.entries.insert(
            field,
            Resolution {
                index,
                header: header.to_string(),
                tier,
            },
        );
    }

    fn note_ambiguous(&mut self, header: &str, mut fields: Vec<CanonicalField>) {
        fields.sort();
        let already = self.conflicts.iter().any(|c| {
            matches!(c, HeaderConflict::Ambiguous { header: h, .. } if h == header)
        });
        if !already {
            warn!(header, ?fields, "ambiguous substring match");
            self.conflicts.push(HeaderConflict::Ambiguous {
                header: header.to_string(),
                fields,
            });
        }
    }
}

impl ColumnResolver {
    pub fn new(rules: ResolverRules) -> Self {
        let fields = rules
            .fields
            .into_iter()
            .map(|(field, r)| {
                let compiled = CompiledRules {
                    aliases: r.aliases.iter().map(|a| normalize_header(a)).collect(),
                    tokens: r
                        .tokens
                        .iter()
                        .map(|t| normalize_header(t))
                        .filter(|t| !t.is_empty())
                        .collect(),
                };
                (field, compiled)
            })
            .collect();

        Self {
            fields,
            layout_len: rules.layout_len,
            positions: rules.positions,
        }
    }

    #[instrument(level = "info", skip_all, fields(headers = headers.len()))]
    pub fn resolve(&self, headers: &[String]) -> Result<ColumnMap, SchemaResolutionError> {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
        let mut state = Assignment::default();

        // tier 1: exact normalized alias
        for field in CanonicalField::ALL {
            let Some(rules) = self.fields.get(&field) else {
                continue;
            };
            let hits: Vec<usize> = normalized
                .iter()
                .enumerate()
                .filter(|(_, n)| rules.aliases.contains(n.as_str()))
                .map(|(i, _)| i)
                .collect();
            match hits.as_slice() {
                [index] => state.claim(field, *index, &headers[*index], MatchTier::Exact),
                [] => {}
                _ => debug!(%field, count = hits.len(), "several exact hits, deferring"),
            }
        }

        // tier 2: unique, unambiguous substring
        for field in CanonicalField::ALL {
            if state.is_resolved(field) || !self.has_tokens(field) {
                continue;
            }
            let mut candidates = Vec::new();
            for (index, norm) in normalized.iter().enumerate() {
                if state.claimed.contains_key(&index) || !self.token_hit(field, norm) {
                    continue;
                }
                let rivals: Vec<CanonicalField> = CanonicalField::ALL
                    .into_iter()
                    .filter(|other| *other != field && self.token_hit(*other, norm))
                    .collect();
                if rivals.is_empty() {
                    candidates.push(index);
                } else {
                    let mut fields = rivals;
                    fields.push(field);
                    state.note_ambiguous(&headers[index], fields);
                }
            }
            match candidates.as_slice() {
                [index] => {
                    state.claim(field, *index, &headers[*index], MatchTier::Substring)
                }
                [] => {}
                _ => debug!(
                    %field,
                    count = candidates.len(),
                    "several substring hits, deferring"
                ),
            }
        }

        // tier 3: positional layout, last resort
        let pending: Vec<CanonicalField> = CanonicalField::ALL
            .into_iter()
            .filter(|f| !state.is_resolved(*f))
            .collect();
        if !pending.is_empty() && headers.len() == self.layout_len {
            for field in pending {
                if let Some(&index) = self.positions.get(&field) {
                    if index < headers.len() {
                        warn!(
                            %field,
                            index,
                            header = %headers[index],
                            "falling back to column position"
                        );
                        state.claim(field, index, &headers[index], MatchTier::Positional);
                    }
                }
            }
        }

        let unresolved: Vec<CanonicalField> = CanonicalField::ALL
            .into_iter()
            .filter(|f| !state.is_resolved(*f))
            .collect();
        let collided = state
            .conflicts
            .iter()
            .any(|c| matches!(c, HeaderConflict::Collision { .. }));
        if !unresolved.is_empty() || collided {
            return Err(SchemaResolutionError {
                unresolved,
                conflicts: state.conflicts,
            });
        }

        Ok(ColumnMap {
            entries: state.entries,
        })
    }

    fn has_tokens(&self, field: CanonicalField) -> bool {
        self.fields.get(&field).map_or(false, |r| !r.tokens.is_empty())
    }

    fn token_hit(&self, field: CanonicalField, normalized: &str) -> bool {
        self.fields.get(&field).map_or(false, |r| {
            r.tokens.iter().any(|t| normalized.contains(t.as_str()))
        })
    }
}
