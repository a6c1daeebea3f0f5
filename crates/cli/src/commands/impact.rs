use std::collections::HashSet;
use std::path::PathBuf;

use revive_core::dataset::{create_export_file, write_activation_list};
use revive_core::reactivation::monthly_run_rate;
use revive_core::selection::{parse_selection, select_all, select_top_by_loss};
use revive_core::zone::ZoneFilter;
use revive_core::{
    ApplicationError, Ean, EnrichedSku, ReactivationAggregator, ReactivationImpact,
    RunRateAggregator,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::commands::{resolve_export_path, AnalysisContext, CommandResult, DatasetArgs, ZoneArgs};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionMode {
    /// Highest scored estimated loss; falls back to `analysis.top_n`.
    Top(Option<usize>),
    All,
    Eans(String),
}

#[derive(Debug, Clone)]
pub struct ImpactArgs {
    pub dataset: DatasetArgs,
    pub zone: ZoneArgs,
    pub selection: SelectionMode,
    pub activation_export: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ImpactReport {
    reference_date: String,
    filter: ZoneFilter,
    impact: ReactivationImpact,
    selected: Vec<Ean>,
    rows: Vec<SelectedRow>,
    activation_export: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct SelectedRow {
    ean: Ean,
    brand: String,
    product_name: Option<String>,
    monthly_run_rate: Option<Decimal>,
}

pub fn run(args: ImpactArgs) -> CommandResult {
    match build(&args) {
        Ok(report) => {
            let message = format!(
                "projected monthly GMV {} from {} skus",
                report.impact.projected_monthly_gmv, report.impact.included
            );
            CommandResult::success("impact", message, report)
        }
        Err(error) => CommandResult::from_error("impact", error),
    }
}

fn build(args: &ImpactArgs) -> Result<ImpactReport, ApplicationError> {
    let context = AnalysisContext::load(&args.dataset)?;
    let (filter, view) = context.zone_view(&args.zone)?;

    let selection = match &args.selection {
        SelectionMode::Top(n) => {
            select_top_by_loss(&view, n.unwrap_or(context.config.analysis.top_n))
        }
        SelectionMode::All => select_all(&view),
        SelectionMode::Eans(text) => parse_selection(text),
    };

    let policy = context.config.analysis.policy();
    let impact = RunRateAggregator::new(policy).aggregate(&context.records, &selection);

    let selected_rows: Vec<EnrichedSku> =
        view.into_iter().filter(|sku| selection.contains(sku.ean())).collect();

    let activation_export = args
        .activation_export
        .as_deref()
        .map(|path| resolve_export_path(path, "ean_reativar", &filter.zone));
    if let Some(path) = &activation_export {
        let file = create_export_file(path)?;
        let written = write_activation_list(file, &selected_rows)?;
        tracing::info!(
            event_name = "impact.activation_exported",
            path = %path.display(),
            eans = written,
            "activation list exported"
        );
    }

    let rows = selected_rows
        .iter()
        .map(|sku| SelectedRow {
            ean: sku.ean().clone(),
            brand: sku.record.brand.clone(),
            product_name: sku.record.product_name.clone(),
            monthly_run_rate: monthly_run_rate(&sku.record, &policy),
        })
        .collect();

    Ok(ImpactReport {
        reference_date: context.reference.to_string(),
        filter,
        impact,
        selected: sorted(selection),
        rows,
        activation_export,
    })
}

fn sorted(selection: HashSet<Ean>) -> Vec<Ean> {
    let mut eans: Vec<Ean> = selection.into_iter().collect();
    eans.sort();
    eans
}
