use revive_core::zone::{filter_zone, zones, ZoneFilter, ZoneSummary};
use revive_core::ZoneName;
use serde::Serialize;

use crate::commands::{AnalysisContext, CommandResult, DatasetArgs};

#[derive(Debug, Serialize)]
struct ZoneListing {
    reference_date: String,
    zones: Vec<ZoneEntry>,
}

#[derive(Debug, Serialize)]
struct ZoneEntry {
    zone: ZoneName,
    #[serde(flatten)]
    summary: ZoneSummary,
}

pub fn run(args: DatasetArgs) -> CommandResult {
    let context = match AnalysisContext::load(&args) {
        Ok(context) => context,
        Err(error) => return CommandResult::from_error("zones", error),
    };

    let entries: Vec<ZoneEntry> = zones(&context.records)
        .into_iter()
        .map(|zone| {
            let filter = ZoneFilter { zone: zone.clone(), brand: None };
            let view = filter_zone(&context.records, &filter);
            ZoneEntry { zone, summary: ZoneSummary::from_records(&view) }
        })
        .collect();

    CommandResult::success(
        "zones",
        format!("{} zones found", entries.len()),
        ZoneListing { reference_date: context.reference.to_string(), zones: entries },
    )
}
