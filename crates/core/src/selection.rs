use std::collections::HashSet;

use crate::domain::sku::{Ean, EnrichedSku};
use crate::pipeline::compare_by_estimated_loss;

pub const DEFAULT_TOP_N: usize = 10;

/// EANs of the `n` records with the largest scored estimated loss.
/// Unscoreable records are never picked.
pub fn select_top_by_loss(records: &[EnrichedSku], n: usize) -> HashSet<Ean> {
    let mut scored: Vec<&EnrichedSku> =
        records.iter().filter(|sku| sku.estimated_lost_gmv.is_scored()).collect();
    scored.sort_by(|left, right| compare_by_estimated_loss(left, right));
    scored.into_iter().take(n).map(|sku| sku.ean().clone()).collect()
}

pub fn select_all(records: &[EnrichedSku]) -> HashSet<Ean> {
    records.iter().map(|sku| sku.ean().clone()).collect()
}

/// Comma- or whitespace-separated EAN list; blanks are skipped.
pub fn parse_selection(text: &str) -> HashSet<Ean> {
    text.split(|ch: char| ch == ',' || ch.is_whitespace())
        .map(str::trim)
        .filter(|ean| !ean.is_empty())
        .map(Ean::from)
        .collect()
}
