use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::sku::{LossEstimate, SkuRecord, UnscoreableReason};
use crate::policy::AnalysisPolicy;

pub trait LossEstimator: Send + Sync {
    fn estimate(&self, record: &SkuRecord) -> LossEstimate;
}

/// Extrapolates the daily run-rate over the days a SKU has been inactive.
///
/// SKUs observed active for fewer than `min_active_days` are scored as zero
/// loss instead of extrapolating from a tiny denominator.
#[derive(Clone, Debug, Default)]
pub struct ThresholdLossEstimator {
    policy: AnalysisPolicy,
}

impl ThresholdLossEstimator {
    pub fn new(policy: AnalysisPolicy) -> Self {
        Self { policy }
    }
}

impl LossEstimator for ThresholdLossEstimator {
    fn estimate(&self, record: &SkuRecord) -> LossEstimate {
        estimate_lost_gmv(record, &self.policy)
    }
}

pub fn estimate_lost_gmv(record: &SkuRecord, policy: &AnalysisPolicy) -> LossEstimate {
    let (Some(days_since_last_sale), Some(active_days)) =
        (record.days_since_last_sale, record.active_days)
    else {
        return LossEstimate::Unscoreable(UnscoreableReason::UnknownRecency);
    };
    let Some(accumulated_gmv) = record.accumulated_gmv else {
        return LossEstimate::Unscoreable(UnscoreableReason::UnknownGmv);
    };

    if active_days < policy.min_active_days {
        return LossEstimate::Scored(Decimal::ZERO);
    }

    let lost = accumulated_gmv
        .checked_div(Decimal::from(active_days))
        .and_then(|daily_run_rate| daily_run_rate.checked_mul(Decimal::from(days_since_last_sale)));
    match lost {
        Some(lost) => LossEstimate::Scored(round_amount(lost, policy.loss_decimal_places)),
        None => LossEstimate::Unscoreable(UnscoreableReason::AmountOutOfRange),
    }
}

/// Half-to-even, as float rounding in the reporting layer behaves.
pub fn round_amount(amount: Decimal, decimal_places: u32) -> Decimal {
    amount.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
}
