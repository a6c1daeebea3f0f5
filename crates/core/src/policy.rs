use serde::{Deserialize, Serialize};

/// Constants that drive recency derivation, loss extrapolation and run-rate
/// conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisPolicy {
    /// Length of the trailing observation period the GMV was accrued over.
    pub observation_window_days: i64,
    /// Below this many active days a SKU is scored as zero loss.
    pub min_active_days: i64,
    /// Days per month used to express active days as active months.
    pub days_per_month: i64,
    pub loss_decimal_places: u32,
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        Self {
            observation_window_days: 365,
            min_active_days: 30,
            days_per_month: 30,
            loss_decimal_places: 2,
        }
    }
}

impl AnalysisPolicy {
    /// `max(1, window - days_since_last_sale)`.
    pub fn active_days(&self, days_since_last_sale: i64) -> i64 {
        (self.observation_window_days - days_since_last_sale).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::AnalysisPolicy;

    #[test]
    fn active_days_never_drops_below_one() {
        let policy = AnalysisPolicy::default();

        assert_eq!(policy.active_days(0), 365);
        assert_eq!(policy.active_days(300), 65);
        assert_eq!(policy.active_days(364), 1);
        assert_eq!(policy.active_days(365), 1);
        assert_eq!(policy.active_days(2_000), 1);
    }
}
