use std::path::PathBuf;

use revive_core::dataset::{create_export_file, write_enriched};
use revive_core::zone::{brands, filter_zone, ZoneFilter, ZoneSummary};
use revive_core::{rank_by_estimated_loss, ApplicationError, EnrichedSku};
use serde::Serialize;

use crate::commands::{resolve_export_path, AnalysisContext, CommandResult, DatasetArgs, ZoneArgs};

#[derive(Debug, Clone)]
pub struct ReportArgs {
    pub dataset: DatasetArgs,
    pub zone: ZoneArgs,
    pub export: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ZoneReport {
    reference_date: String,
    filter: ZoneFilter,
    brands: Vec<String>,
    summary: ZoneSummary,
    export: Option<PathBuf>,
    rows: Vec<EnrichedSku>,
}

pub fn run(args: ReportArgs) -> CommandResult {
    match build(&args) {
        Ok(report) => {
            let message = format!(
                "{} skus in {} ({} unscoreable)",
                report.summary.sku_count, report.filter.zone.0, report.summary.unscoreable_count
            );
            CommandResult::success("report", message, report)
        }
        Err(error) => CommandResult::from_error("report", error),
    }
}

fn build(args: &ReportArgs) -> Result<ZoneReport, ApplicationError> {
    let context = AnalysisContext::load(&args.dataset)?;
    let (filter, view) = context.zone_view(&args.zone)?;

    let zone_brands = {
        let zone_only = ZoneFilter { zone: filter.zone.clone(), brand: None };
        let zone_records = filter_zone(&context.records, &zone_only);
        brands(&zone_records)
    };
    let summary = ZoneSummary::from_records(&view);
    let rows = rank_by_estimated_loss(view);

    let export = args
        .export
        .as_deref()
        .map(|path| resolve_export_path(path, "skus_inativos", &filter.zone));
    if let Some(path) = &export {
        let file = create_export_file(path)?;
        write_enriched(file, &rows)?;
        tracing::info!(
            event_name = "report.exported",
            path = %path.display(),
            rows = rows.len(),
            "zone table exported"
        );
    }

    Ok(ZoneReport {
        reference_date: context.reference.to_string(),
        filter,
        brands: zone_brands,
        summary,
        export,
        rows,
    })
}
