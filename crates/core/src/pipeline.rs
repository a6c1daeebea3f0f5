use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::domain::sku::{EnrichedSku, RawSkuRow};
use crate::loss::{LossEstimator, ThresholdLossEstimator};
use crate::normalize::Normalizer;
use crate::policy::AnalysisPolicy;

pub trait EnrichmentRuntime: Send + Sync {
    fn enrich(&self, rows: &[RawSkuRow], reference: NaiveDate) -> Vec<EnrichedSku>;
}

/// Normalizes every row, then scores each record independently.
pub struct DeterministicEnrichmentRuntime<L> {
    normalizer: Normalizer,
    loss_estimator: L,
}

impl<L> DeterministicEnrichmentRuntime<L> {
    pub fn new(normalizer: Normalizer, loss_estimator: L) -> Self {
        Self { normalizer, loss_estimator }
    }
}

impl DeterministicEnrichmentRuntime<ThresholdLossEstimator> {
    pub fn with_policy(policy: AnalysisPolicy) -> Self {
        Self::new(Normalizer::new(policy), ThresholdLossEstimator::new(policy))
    }
}

impl Default for DeterministicEnrichmentRuntime<ThresholdLossEstimator> {
    fn default() -> Self {
        Self::with_policy(AnalysisPolicy::default())
    }
}

impl<L> EnrichmentRuntime for DeterministicEnrichmentRuntime<L>
where
    L: LossEstimator,
{
    fn enrich(&self, rows: &[RawSkuRow], reference: NaiveDate) -> Vec<EnrichedSku> {
        let enriched: Vec<EnrichedSku> = self
            .normalizer
            .normalize(rows, reference)
            .into_iter()
            .map(|record| {
                let estimated_lost_gmv = self.loss_estimator.estimate(&record);
                EnrichedSku { record, estimated_lost_gmv }
            })
            .collect();

        let unscoreable =
            enriched.iter().filter(|sku| !sku.estimated_lost_gmv.is_scored()).count();
        tracing::info!(
            event_name = "pipeline.enriched",
            records = enriched.len(),
            unscoreable,
            reference_date = %reference,
            "sku records enriched"
        );

        enriched
    }
}

/// Display order: highest estimated loss first, ties by EAN, unscoreable
/// records last.
pub fn rank_by_estimated_loss(mut records: Vec<EnrichedSku>) -> Vec<EnrichedSku> {
    records.sort_by(compare_by_estimated_loss);
    records
}

pub(crate) fn compare_by_estimated_loss(left: &EnrichedSku, right: &EnrichedSku) -> Ordering {
    match (left.estimated_lost_gmv.amount(), right.estimated_lost_gmv.amount()) {
        (Some(left_amount), Some(right_amount)) => right_amount.cmp(&left_amount),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| left.ean().cmp(right.ean()))
}
