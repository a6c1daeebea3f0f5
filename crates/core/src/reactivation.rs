//! Projected monthly GMV from reactivating a selection of SKUs.
//!
//! The run-rate here is `accumulated_gmv / max(1, active_days / 30)`: the
//! trailing GMV spread over the months the SKU was realistically sellable. It
//! is a different quantity from the estimated lost GMV and is always
//! recomputed from scratch for the selection passed in.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::sku::{Ean, EnrichedSku, SkuRecord};
use crate::policy::AnalysisPolicy;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactivationImpact {
    pub projected_monthly_gmv: Decimal,
    /// Selected records that contributed to the projection.
    pub included: usize,
    /// Selected records skipped because GMV or active days are unknown.
    pub excluded_unknown: usize,
    /// Selected EANs that match no record at all.
    pub unmatched_selection: usize,
}

pub trait ReactivationAggregator: Send + Sync {
    fn aggregate(&self, records: &[EnrichedSku], selection: &HashSet<Ean>) -> ReactivationImpact;
}

#[derive(Clone, Debug, Default)]
pub struct RunRateAggregator {
    policy: AnalysisPolicy,
}

impl RunRateAggregator {
    pub fn new(policy: AnalysisPolicy) -> Self {
        Self { policy }
    }

    pub fn monthly_run_rate(&self, record: &SkuRecord) -> Option<Decimal> {
        monthly_run_rate(record, &self.policy)
    }
}

impl ReactivationAggregator for RunRateAggregator {
    fn aggregate(&self, records: &[EnrichedSku], selection: &HashSet<Ean>) -> ReactivationImpact {
        if selection.is_empty() {
            return ReactivationImpact::default();
        }

        let mut impact = ReactivationImpact::default();
        let mut matched: HashSet<&Ean> = HashSet::new();

        for sku in records.iter().filter(|sku| selection.contains(sku.ean())) {
            matched.insert(sku.ean());
            match self.monthly_run_rate(&sku.record) {
                Some(monthly) => {
                    impact.projected_monthly_gmv =
                        impact.projected_monthly_gmv.saturating_add(monthly);
                    impact.included += 1;
                }
                None => impact.excluded_unknown += 1,
            }
        }
        impact.unmatched_selection = selection.len() - matched.len();

        tracing::debug!(
            event_name = "reactivation.aggregated",
            selected = selection.len(),
            included = impact.included,
            excluded_unknown = impact.excluded_unknown,
            unmatched_selection = impact.unmatched_selection,
            "reactivation impact aggregated"
        );

        impact
    }
}

pub fn monthly_run_rate(record: &SkuRecord, policy: &AnalysisPolicy) -> Option<Decimal> {
    let accumulated_gmv = record.accumulated_gmv?;
    let active_days = record.active_days?;

    let active_months =
        (Decimal::from(active_days) / Decimal::from(policy.days_per_month)).max(Decimal::ONE);
    Some(accumulated_gmv / active_months)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rust_decimal::Decimal;

    use super::{monthly_run_rate, ReactivationAggregator, ReactivationImpact, RunRateAggregator};
    use crate::domain::sku::{Ean, EnrichedSku, LossEstimate, SkuRecord, ZoneName};
    use crate::policy::AnalysisPolicy;

    fn sku(ean: &str, gmv: Option<i64>, active_days: Option<i64>) -> EnrichedSku {
        EnrichedSku {
            record: SkuRecord {
                ean: Ean(ean.to_string()),
                zone: ZoneName("Recife".to_string()),
                brand: "Ypê".to_string(),
                manufacturer: "Química Amparo".to_string(),
                product_name: None,
                accumulated_gmv: gmv.map(Decimal::from),
                last_order_at: None,
                units_sold: None,
                days_since_last_sale: active_days.map(|days| 365 - days),
                active_days,
                issues: Vec::new(),
            },
            estimated_lost_gmv: LossEstimate::Scored(Decimal::ZERO),
        }
    }

    fn selection(eans: &[&str]) -> HashSet<Ean> {
        eans.iter().map(|ean| Ean::from(*ean)).collect()
    }

    #[test]
    fn sums_monthly_run_rate_over_selection() {
        let records = vec![sku("A", Some(1200), Some(60)), sku("B", Some(900), Some(90))];

        let impact = RunRateAggregator::default().aggregate(&records, &selection(&["A", "B"]));

        assert_eq!(impact.projected_monthly_gmv, Decimal::new(900, 0));
        assert_eq!(impact.included, 2);
        assert_eq!(impact.excluded_unknown, 0);
    }

    #[test]
    fn projection_saturates_instead_of_overflowing() {
        let mut records = vec![sku("A", None, Some(15)), sku("B", None, Some(15))];
        for record in &mut records {
            record.record.accumulated_gmv = Some(Decimal::MAX);
        }

        let impact = RunRateAggregator::default().aggregate(&records, &selection(&["A", "B"]));

        assert_eq!(impact.projected_monthly_gmv, Decimal::MAX);
        assert_eq!(impact.included, 2);
    }

    #[test]
    fn empty_selection_is_zero() {
        let records = vec![sku("A", Some(1200), Some(60)), sku("B", None, Some(90))];

        let impact = RunRateAggregator::default().aggregate(&records, &HashSet::new());

        assert_eq!(impact, ReactivationImpact::default());
        assert_eq!(impact.projected_monthly_gmv, Decimal::ZERO);
    }

    #[test]
    fn unknown_eans_are_ignored_and_counted_separately() {
        let records = vec![sku("A", Some(1200), Some(60))];

        let with_ghost =
            RunRateAggregator::default().aggregate(&records, &selection(&["A", "GHOST"]));
        let without = RunRateAggregator::default().aggregate(&records, &selection(&["A"]));

        assert_eq!(with_ghost.projected_monthly_gmv, without.projected_monthly_gmv);
        assert_eq!(with_ghost.excluded_unknown, 0);
        assert_eq!(with_ghost.unmatched_selection, 1);
    }

    #[test]
    fn unknown_values_are_excluded_and_reported() {
        let records = vec![
            sku("A", Some(1200), Some(60)),
            sku("B", None, Some(90)),
            sku("C", Some(500), None),
        ];

        let impact = RunRateAggregator::default().aggregate(&records, &selection(&["A", "B", "C"]));

        assert_eq!(impact.projected_monthly_gmv, Decimal::new(600, 0));
        assert_eq!(impact.included, 1);
        assert_eq!(impact.excluded_unknown, 2);
        assert_eq!(impact.unmatched_selection, 0);
    }

    #[test]
    fn short_active_window_counts_as_one_month() {
        let policy = AnalysisPolicy::default();

        let record = sku("A", Some(450), Some(15)).record;
        assert_eq!(monthly_run_rate(&record, &policy), Some(Decimal::new(450, 0)));

        let record = sku("B", Some(450), Some(45)).record;
        assert_eq!(monthly_run_rate(&record, &policy), Some(Decimal::new(300, 0)));
    }

    #[test]
    fn every_zone_row_of_a_selected_ean_contributes() {
        let mut other_zone = sku("A", Some(300), Some(30));
        other_zone.record.zone = ZoneName("Olinda".to_string());
        let records = vec![sku("A", Some(1200), Some(60)), other_zone];

        let impact = RunRateAggregator::default().aggregate(&records, &selection(&["A"]));

        assert_eq!(impact.projected_monthly_gmv, Decimal::new(900, 0));
        assert_eq!(impact.included, 2);
    }
}
