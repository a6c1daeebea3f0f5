use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::sku::{EnrichedSku, LossEstimate, ZoneName};

/// Distinct non-empty zones, sorted.
pub fn zones(records: &[EnrichedSku]) -> Vec<ZoneName> {
    records
        .iter()
        .map(EnrichedSku::zone)
        .filter(|zone| !zone.as_str().is_empty())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct non-empty brands, sorted.
pub fn brands(records: &[EnrichedSku]) -> Vec<String> {
    records
        .iter()
        .map(|sku| sku.record.brand.as_str())
        .filter(|brand| !brand.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneFilter {
    pub zone: ZoneName,
    pub brand: Option<String>,
}

impl ZoneFilter {
    pub fn zone(zone: impl Into<String>) -> Self {
        Self { zone: ZoneName(zone.into()), brand: None }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn matches(&self, sku: &EnrichedSku) -> bool {
        sku.zone() == &self.zone
            && self.brand.as_deref().map_or(true, |brand| sku.record.brand == brand)
    }
}

pub fn filter_zone(records: &[EnrichedSku], filter: &ZoneFilter) -> Vec<EnrichedSku> {
    records.iter().filter(|sku| filter.matches(sku)).cloned().collect()
}

/// Headline figures for a zone view.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSummary {
    /// Sum of known accumulated GMV over the observation period.
    pub total_gmv: Decimal,
    /// Sum of scored estimates; unscoreable records are left out.
    pub estimated_lost_gmv: Decimal,
    pub sku_count: usize,
    pub unscoreable_count: usize,
    pub unknown_gmv_count: usize,
}

impl ZoneSummary {
    pub fn from_records(records: &[EnrichedSku]) -> Self {
        records.iter().fold(Self::default(), |mut summary, sku| {
            summary.sku_count += 1;
            match sku.record.accumulated_gmv {
                Some(gmv) => summary.total_gmv = summary.total_gmv.saturating_add(gmv),
                None => summary.unknown_gmv_count += 1,
            }
            match sku.estimated_lost_gmv {
                LossEstimate::Scored(amount) => {
                    summary.estimated_lost_gmv = summary.estimated_lost_gmv.saturating_add(amount)
                }
                LossEstimate::Unscoreable(_) => summary.unscoreable_count += 1,
            }
            summary
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{brands, filter_zone, zones, ZoneFilter, ZoneName, ZoneSummary};
    use crate::domain::sku::{Ean, EnrichedSku, LossEstimate, SkuRecord, UnscoreableReason};

    fn sku(
        ean: &str,
        zone: &str,
        brand: &str,
        gmv: Option<i64>,
        loss: LossEstimate,
    ) -> EnrichedSku {
        EnrichedSku {
            record: SkuRecord {
                ean: Ean(ean.to_string()),
                zone: ZoneName(zone.to_string()),
                brand: brand.to_string(),
                manufacturer: "Unilever".to_string(),
                product_name: None,
                accumulated_gmv: gmv.map(Decimal::from),
                last_order_at: None,
                units_sold: None,
                days_since_last_sale: Some(100),
                active_days: Some(265),
                issues: Vec::new(),
            },
            estimated_lost_gmv: loss,
        }
    }

    fn dataset() -> Vec<EnrichedSku> {
        let unknown_gmv = LossEstimate::Unscoreable(UnscoreableReason::UnknownGmv);
        vec![
            sku("1", "Salvador", "Omo", Some(1000), LossEstimate::Scored(Decimal::new(37_74, 2))),
            sku("2", "Salvador", "Dove", None, unknown_gmv),
            sku("3", "Fortaleza", "Omo", Some(200), LossEstimate::Scored(Decimal::ZERO)),
            sku("4", "Salvador", "Omo", Some(500), LossEstimate::Scored(Decimal::new(18_87, 2))),
            sku("5", "", "", Some(10), LossEstimate::Scored(Decimal::ZERO)),
        ]
    }

    #[test]
    fn lists_distinct_sorted_zones_and_brands() {
        let records = dataset();

        assert_eq!(zones(&records), vec![ZoneName::from("Fortaleza"), ZoneName::from("Salvador")]);
        assert_eq!(brands(&records), vec!["Dove".to_string(), "Omo".to_string()]);
    }

    #[test]
    fn filters_by_zone_and_optional_brand() {
        let records = dataset();

        let salvador = filter_zone(&records, &ZoneFilter::zone("Salvador"));
        assert_eq!(salvador.len(), 3);

        let omo = filter_zone(&records, &ZoneFilter::zone("Salvador").with_brand("Omo"));
        let eans: Vec<&str> = omo.iter().map(|sku| sku.ean().as_str()).collect();
        assert_eq!(eans, vec!["1", "4"]);
    }

    #[test]
    fn summary_keeps_unscoreable_records_out_of_sums() {
        let salvador = filter_zone(&dataset(), &ZoneFilter::zone("Salvador"));

        let summary = ZoneSummary::from_records(&salvador);

        assert_eq!(summary.sku_count, 3);
        assert_eq!(summary.total_gmv, Decimal::new(1500, 0));
        assert_eq!(summary.estimated_lost_gmv, Decimal::new(56_61, 2));
        assert_eq!(summary.unscoreable_count, 1);
        assert_eq!(summary.unknown_gmv_count, 1);
    }

    #[test]
    fn summary_sums_saturate_instead_of_overflowing() {
        let mut records = vec![
            sku("1", "Salvador", "Omo", None, LossEstimate::Scored(Decimal::MAX)),
            sku("2", "Salvador", "Omo", None, LossEstimate::Scored(Decimal::MAX)),
        ];
        for record in &mut records {
            record.record.accumulated_gmv = Some(Decimal::MAX);
        }

        let summary = ZoneSummary::from_records(&records);

        assert_eq!(summary.total_gmv, Decimal::MAX);
        assert_eq!(summary.estimated_lost_gmv, Decimal::MAX);
        assert_eq!(summary.sku_count, 2);
    }

    #[test]
    fn empty_view_has_zero_summary() {
        assert_eq!(ZoneSummary::from_records(&[]), ZoneSummary::default());
    }
}
