//! CSV dataset loading and export.
//!
//! Input columns are matched case-insensitively:
//!   ean, zone_name, brand_name, manufacturer_name, search_index,
//!   gmv_acumulado_periodo, max_ordered_at, unidades_vendidas_periodo
//! Only `ean` and `zone_name` are required; any other missing column reads as
//! empty and surfaces later as an unknown value.

use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::sku::{Ean, EnrichedSku, RawSkuRow};

pub const COL_EAN: &str = "ean";
pub const COL_ZONE: &str = "zone_name";
pub const COL_BRAND: &str = "brand_name";
pub const COL_MANUFACTURER: &str = "manufacturer_name";
pub const COL_PRODUCT: &str = "search_index";
pub const COL_GMV: &str = "gmv_acumulado_periodo";
pub const COL_LAST_ORDER: &str = "max_ordered_at";
pub const COL_UNITS: &str = "unidades_vendidas_periodo";
pub const COL_DAYS_SINCE_LAST_SALE: &str = "dias_desde_ultima_venda";
pub const COL_ACTIVE_DAYS: &str = "dias_ativos";
pub const COL_ESTIMATED_LOST_GMV: &str = "gmv_perdido_estimado";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("could not open dataset `{path}`: {source}")]
    Open { path: PathBuf, source: std::io::Error },
    #[error("could not create export file `{path}`: {source}")]
    Create { path: PathBuf, source: std::io::Error },
    #[error("dataset is missing required column `{0}`")]
    MissingColumn(&'static str),
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

struct ColumnIndex {
    ean: usize,
    zone: usize,
    brand: Option<usize>,
    manufacturer: Option<usize>,
    product: Option<usize>,
    gmv: Option<usize>,
    last_order: Option<usize>,
    units: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, DatasetError> {
        let normalized: Vec<String> =
            headers.iter().map(|header| header.trim().to_ascii_lowercase()).collect();
        let find = |name: &str| normalized.iter().position(|header| header == name);

        Ok(Self {
            ean: find(COL_EAN).ok_or(DatasetError::MissingColumn(COL_EAN))?,
            zone: find(COL_ZONE).ok_or(DatasetError::MissingColumn(COL_ZONE))?,
            brand: find(COL_BRAND),
            manufacturer: find(COL_MANUFACTURER),
            product: find(COL_PRODUCT),
            gmv: find(COL_GMV),
            last_order: find(COL_LAST_ORDER),
            units: find(COL_UNITS),
        })
    }

    fn row(&self, record: &csv::StringRecord) -> RawSkuRow {
        let cell = |index: Option<usize>| {
            index.and_then(|index| record.get(index)).unwrap_or_default().to_string()
        };

        RawSkuRow {
            ean: cell(Some(self.ean)),
            zone_name: cell(Some(self.zone)),
            brand_name: cell(self.brand),
            manufacturer_name: cell(self.manufacturer),
            product_name: self.product.and_then(|index| record.get(index)).map(str::to_string),
            accumulated_gmv: cell(self.gmv),
            last_ordered_at: cell(self.last_order),
            units_sold: cell(self.units),
        }
    }
}

pub fn load_rows<R: Read>(reader: R) -> Result<Vec<RawSkuRow>, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = ColumnIndex::from_headers(csv_reader.headers()?)?;

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        rows.push(columns.row(&record?));
    }

    tracing::debug!(event_name = "dataset.loaded", rows = rows.len(), "dataset rows loaded");
    Ok(rows)
}

pub fn load_rows_file(path: &Path) -> Result<Vec<RawSkuRow>, DatasetError> {
    let file =
        File::open(path).map_err(|source| DatasetError::Open { path: path.to_path_buf(), source })?;
    load_rows(file)
}

/// Writes the zone table: input columns followed by the derived ones.
/// Unknown values are written as empty cells.
pub fn write_enriched<W: Write>(writer: W, records: &[EnrichedSku]) -> Result<(), DatasetError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        COL_EAN,
        COL_ZONE,
        COL_BRAND,
        COL_MANUFACTURER,
        COL_PRODUCT,
        COL_GMV,
        COL_LAST_ORDER,
        COL_UNITS,
        COL_DAYS_SINCE_LAST_SALE,
        COL_ACTIVE_DAYS,
        COL_ESTIMATED_LOST_GMV,
    ])?;

    for sku in records {
        let record = &sku.record;
        csv_writer.write_record([
            record.ean.as_str().to_string(),
            record.zone.as_str().to_string(),
            record.brand.clone(),
            record.manufacturer.clone(),
            record.product_name.clone().unwrap_or_default(),
            optional_cell(record.accumulated_gmv),
            optional_cell(record.last_order_at),
            optional_cell(record.units_sold),
            optional_cell(record.days_since_last_sale),
            optional_cell(record.active_days),
            optional_cell(sku.estimated_lost_gmv.amount()),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Single `ean` column, de-duplicated in first-seen order.
pub fn write_activation_list<W: Write>(
    writer: W,
    records: &[EnrichedSku],
) -> Result<usize, DatasetError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([COL_EAN])?;

    let mut seen: HashSet<&Ean> = HashSet::new();
    for sku in records {
        if seen.insert(sku.ean()) {
            csv_writer.write_record([sku.ean().as_str()])?;
        }
    }

    csv_writer.flush()?;
    Ok(seen.len())
}

pub fn create_export_file(path: &Path) -> Result<File, DatasetError> {
    File::create(path).map_err(|source| DatasetError::Create { path: path.to_path_buf(), source })
}

/// `skus_inativos` + `São Paulo` -> `skus_inativos_são_paulo`.
pub fn export_file_stem(prefix: &str, zone: &str) -> String {
    format!("{prefix}_{}", zone.trim().to_lowercase().replace(' ', "_"))
}

fn optional_cell<T: ToString>(value: Option<T>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}
