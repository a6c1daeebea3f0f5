pub mod config;
pub mod dataset;
pub mod domain;
pub mod errors;
pub mod loss;
pub mod normalize;
pub mod pipeline;
pub mod policy;
pub mod reactivation;
pub mod selection;
pub mod zone;

pub use dataset::DatasetError;
pub use domain::sku::{
    Ean, EnrichedSku, FieldIssue, IssueKind, LossEstimate, RawSkuRow, SkuField, SkuRecord,
    UnscoreableReason, ZoneName,
};
pub use errors::{ApplicationError, InterfaceError};
pub use loss::{LossEstimator, ThresholdLossEstimator};
pub use normalize::Normalizer;
pub use pipeline::{rank_by_estimated_loss, DeterministicEnrichmentRuntime, EnrichmentRuntime};
pub use policy::AnalysisPolicy;
pub use reactivation::{ReactivationAggregator, ReactivationImpact, RunRateAggregator};
pub use zone::{ZoneFilter, ZoneSummary};
