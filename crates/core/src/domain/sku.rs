use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ean(pub String);

impl Ean {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Ean {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneName(pub String);

impl ZoneName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ZoneName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One dataset row exactly as read, before any coercion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSkuRow {
    pub ean: String,
    pub zone_name: String,
    pub brand_name: String,
    pub manufacturer_name: String,
    pub product_name: Option<String>,
    pub accumulated_gmv: String,
    pub last_ordered_at: String,
    pub units_sold: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkuField {
    AccumulatedGmv,
    LastOrderedAt,
    UnitsSold,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Text that does not parse as the field's type.
    MalformedValue,
    /// Parses, but falls outside the field's domain (negative money, NaN).
    OutOfRange,
    /// A last-order date after the reference date; recency clamped to zero.
    FutureDate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: SkuField,
    pub kind: IssueKind,
    pub raw: String,
}

/// A normalized SKU with recency metrics derived against a reference date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuRecord {
    pub ean: Ean,
    pub zone: ZoneName,
    pub brand: String,
    pub manufacturer: String,
    pub product_name: Option<String>,
    pub accumulated_gmv: Option<Decimal>,
    pub last_order_at: Option<NaiveDate>,
    pub units_sold: Option<u64>,
    pub days_since_last_sale: Option<i64>,
    pub active_days: Option<i64>,
    pub issues: Vec<FieldIssue>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnscoreableReason {
    UnknownRecency,
    UnknownGmv,
    /// The extrapolated amount does not fit a decimal.
    AmountOutOfRange,
}

/// Estimated lost GMV. Zero is a real "no loss" result and is never used for
/// records that cannot be scored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum LossEstimate {
    Scored(Decimal),
    Unscoreable(UnscoreableReason),
}

impl LossEstimate {
    pub fn amount(&self) -> Option<Decimal> {
        match self {
            Self::Scored(amount) => Some(*amount),
            Self::Unscoreable(_) => None,
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, Self::Scored(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedSku {
    #[serde(flatten)]
    pub record: SkuRecord,
    pub estimated_lost_gmv: LossEstimate,
}

impl EnrichedSku {
    pub fn ean(&self) -> &Ean {
        &self.record.ean
    }

    pub fn zone(&self) -> &ZoneName {
        &self.record.zone
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{LossEstimate, UnscoreableReason};

    #[test]
    fn zero_loss_is_distinct_from_unscoreable() {
        let zero = LossEstimate::Scored(Decimal::ZERO);
        let unknown = LossEstimate::Unscoreable(UnscoreableReason::UnknownGmv);

        assert_eq!(zero.amount(), Some(Decimal::ZERO));
        assert_eq!(unknown.amount(), None);
        assert_ne!(zero, unknown);
    }

    #[test]
    fn loss_estimate_serializes_with_explicit_status() {
        let json = serde_json::to_value(LossEstimate::Unscoreable(
            UnscoreableReason::UnknownRecency,
        ))
        .expect("serialize estimate");

        assert_eq!(json["status"], "unscoreable");
        assert_eq!(json["value"], "unknown_recency");
    }
}
