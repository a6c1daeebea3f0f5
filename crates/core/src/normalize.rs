//! Raw row coercion and recency derivation.
//!
//! Nothing here fails: text that cannot be read as the field's type becomes
//! an unknown value plus a [`FieldIssue`] on the record, so later stages never
//! see raw input and can always tell "unknown" apart from zero.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::domain::sku::{Ean, FieldIssue, IssueKind, RawSkuRow, SkuField, SkuRecord, ZoneName};
use crate::policy::AnalysisPolicy;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

const DATETIME_FORMATS: [&str; 4] =
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

const OFFSET_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

/// Largest accumulated GMV accepted; anything above is reported out of range.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// Today's UTC calendar date, the production reference date.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[derive(Clone, Debug, Default)]
pub struct Normalizer {
    policy: AnalysisPolicy,
}

impl Normalizer {
    pub fn new(policy: AnalysisPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AnalysisPolicy {
        &self.policy
    }

    pub fn normalize(&self, rows: &[RawSkuRow], reference: NaiveDate) -> Vec<SkuRecord> {
        let records: Vec<SkuRecord> =
            rows.iter().map(|row| self.normalize_row(row, reference)).collect();

        let with_issues = records.iter().filter(|record| !record.issues.is_empty()).count();
        if with_issues > 0 {
            tracing::debug!(
                event_name = "normalize.malformed_values",
                records = records.len(),
                records_with_issues = with_issues,
                reference_date = %reference,
                "recovered malformed values as unknown"
            );
        }

        records
    }

    pub fn normalize_row(&self, row: &RawSkuRow, reference: NaiveDate) -> SkuRecord {
        let mut issues = Vec::new();

        let accumulated_gmv = match parse_amount(&row.accumulated_gmv) {
            Ok(value) => value,
            Err(kind) => {
                issues.push(issue(SkuField::AccumulatedGmv, kind, &row.accumulated_gmv));
                None
            }
        };

        let last_order_at = match parse_order_date(&row.last_ordered_at) {
            Ok(value) => value,
            Err(kind) => {
                issues.push(issue(SkuField::LastOrderedAt, kind, &row.last_ordered_at));
                None
            }
        };

        let units_sold = match parse_units(&row.units_sold) {
            Ok(value) => value,
            Err(kind) => {
                issues.push(issue(SkuField::UnitsSold, kind, &row.units_sold));
                None
            }
        };

        let days_since_last_sale = last_order_at.map(|date| {
            let days = (reference - date).num_days();
            if days < 0 {
                issues.push(issue(
                    SkuField::LastOrderedAt,
                    IssueKind::FutureDate,
                    &row.last_ordered_at,
                ));
                0
            } else {
                days
            }
        });
        let active_days = days_since_last_sale.map(|days| self.policy.active_days(days));

        SkuRecord {
            ean: Ean(row.ean.trim().to_string()),
            zone: ZoneName(row.zone_name.trim().to_string()),
            brand: row.brand_name.trim().to_string(),
            manufacturer: row.manufacturer_name.trim().to_string(),
            product_name: row
                .product_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            accumulated_gmv,
            last_order_at,
            units_sold,
            days_since_last_sale,
            active_days,
            issues,
        }
    }
}

fn issue(field: SkuField, kind: IssueKind, raw: &str) -> FieldIssue {
    FieldIssue { field, kind, raw: raw.to_string() }
}

/// Empty text is a missing source value, not a malformed one.
pub fn parse_amount(raw: &str) -> Result<Option<Decimal>, IssueKind> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let parsed = Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed));
    match parsed {
        Ok(value) if value < Decimal::ZERO || value > Decimal::from(MAX_AMOUNT) => {
            Err(IssueKind::OutOfRange)
        }
        Ok(value) => Ok(Some(value.normalize())),
        // nan/inf parse as floats but have no decimal value
        Err(_) if trimmed.parse::<f64>().is_ok() => Err(IssueKind::OutOfRange),
        Err(_) => Err(IssueKind::MalformedValue),
    }
}

pub fn parse_order_date(raw: &str) -> Result<Option<NaiveDate>, IssueKind> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(Some(date));
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Some(datetime.date()));
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Some(datetime.date_naive()));
    }
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(datetime) = DateTime::parse_from_str(trimmed, format) {
            return Ok(Some(datetime.date_naive()));
        }
    }

    Err(IssueKind::MalformedValue)
}

/// Accepts integral decimals such as `12.0`, which spreadsheet exports emit.
pub fn parse_units(raw: &str) -> Result<Option<u64>, IssueKind> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if let Ok(units) = trimmed.parse::<u64>() {
        return Ok(Some(units));
    }

    match Decimal::from_str(trimmed) {
        Ok(value) if value < Decimal::ZERO => Err(IssueKind::OutOfRange),
        Ok(value) if value.fract().is_zero() => {
            value.to_u64().map(Some).ok_or(IssueKind::OutOfRange)
        }
        _ => Err(IssueKind::MalformedValue),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{parse_amount, parse_order_date, parse_units, Normalizer, MAX_AMOUNT};
    use crate::domain::sku::{IssueKind, RawSkuRow, SkuField};

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid reference date")
    }

    fn row(gmv: &str, last_ordered_at: &str) -> RawSkuRow {
        RawSkuRow {
            ean: " 7891000100103 ".to_string(),
            zone_name: "São Paulo".to_string(),
            brand_name: "Nescau".to_string(),
            manufacturer_name: "Nestlé".to_string(),
            product_name: Some("Achocolatado 400g".to_string()),
            accumulated_gmv: gmv.to_string(),
            last_ordered_at: last_ordered_at.to_string(),
            units_sold: "42".to_string(),
        }
    }

    #[test]
    fn derives_recency_from_reference_date() {
        let record = Normalizer::default().normalize_row(&row("3650", "2024-09-03"), reference());

        assert_eq!(record.ean.as_str(), "7891000100103");
        assert_eq!(record.accumulated_gmv, Some(Decimal::new(3650, 0)));
        assert_eq!(record.days_since_last_sale, Some(300));
        assert_eq!(record.active_days, Some(65));
        assert_eq!(record.units_sold, Some(42));
        assert!(record.issues.is_empty());
    }

    #[test]
    fn malformed_values_become_unknown_with_issues() {
        let record = Normalizer::default().normalize_row(&row("R$ 12,00", "ontem"), reference());

        assert_eq!(record.accumulated_gmv, None);
        assert_eq!(record.last_order_at, None);
        assert_eq!(record.days_since_last_sale, None);
        assert_eq!(record.active_days, None);
        assert_eq!(record.issues.len(), 2);
        assert_eq!(record.issues[0].field, SkuField::AccumulatedGmv);
        assert_eq!(record.issues[0].kind, IssueKind::MalformedValue);
        assert_eq!(record.issues[1].field, SkuField::LastOrderedAt);
    }

    #[test]
    fn missing_values_are_unknown_without_issues() {
        let record = Normalizer::default().normalize_row(&row("", "  "), reference());

        assert_eq!(record.accumulated_gmv, None);
        assert_eq!(record.active_days, None);
        assert!(record.issues.is_empty());
    }

    #[test]
    fn future_order_dates_clamp_to_zero_days() {
        let record = Normalizer::default().normalize_row(&row("100", "2025-07-04"), reference());

        assert_eq!(record.days_since_last_sale, Some(0));
        assert_eq!(record.active_days, Some(365));
        assert_eq!(record.issues.len(), 1);
        assert_eq!(record.issues[0].kind, IssueKind::FutureDate);
    }

    #[test]
    fn active_days_is_at_least_one_for_every_known_recency() {
        let normalizer = Normalizer::default();
        for last in ["2025-06-30", "2024-07-01", "2024-06-30", "2020-01-01", "1999-12-31"] {
            let record = normalizer.normalize_row(&row("10", last), reference());
            let active_days = record.active_days.expect("known recency");
            assert!(active_days >= 1, "active_days for {last} was {active_days}");
        }
    }

    #[test]
    fn amount_parsing_covers_numeric_variants() {
        assert_eq!(parse_amount(" 1234.50 "), Ok(Some(Decimal::new(123_45, 1))));
        assert_eq!(parse_amount("1.2e3"), Ok(Some(Decimal::new(1200, 0))));
        assert_eq!(parse_amount("-5"), Err(IssueKind::OutOfRange));
        assert_eq!(parse_amount("NaN"), Err(IssueKind::OutOfRange));
        assert_eq!(parse_amount("1,234.00"), Err(IssueKind::MalformedValue));
    }

    #[test]
    fn amounts_above_the_ceiling_are_out_of_range() {
        assert_eq!(parse_amount("1e15"), Ok(Some(Decimal::from(MAX_AMOUNT))));
        assert_eq!(parse_amount("1000000000000000.01"), Err(IssueKind::OutOfRange));
        assert_eq!(parse_amount("5e28"), Err(IssueKind::OutOfRange));

        let record = Normalizer::default().normalize_row(&row("5e28", "2024-07-30"), reference());
        assert_eq!(record.accumulated_gmv, None);
        assert_eq!(record.issues.len(), 1);
        assert_eq!(record.issues[0].field, SkuField::AccumulatedGmv);
        assert_eq!(record.issues[0].kind, IssueKind::OutOfRange);
    }

    #[test]
    fn date_parsing_keeps_calendar_date_only() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 15);

        assert_eq!(parse_order_date("2025-01-15"), Ok(expected));
        assert_eq!(parse_order_date("2025/01/15"), Ok(expected));
        assert_eq!(parse_order_date("2025-01-15 23:59:59"), Ok(expected));
        assert_eq!(parse_order_date("2025-01-15 08:30:00.250"), Ok(expected));
        assert_eq!(parse_order_date("2025-01-15T08:30:00Z"), Ok(expected));
        assert_eq!(parse_order_date("2025-01-15 08:30:00+00:00"), Ok(expected));
        assert_eq!(parse_order_date("15/01/2025"), Err(IssueKind::MalformedValue));
    }

    #[test]
    fn unit_parsing_accepts_integral_decimals() {
        assert_eq!(parse_units("12"), Ok(Some(12)));
        assert_eq!(parse_units("12.0"), Ok(Some(12)));
        assert_eq!(parse_units("12.5"), Err(IssueKind::MalformedValue));
        assert_eq!(parse_units("-3"), Err(IssueKind::OutOfRange));
        assert_eq!(parse_units(""), Ok(None));
    }
}
