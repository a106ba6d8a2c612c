use std::path::PathBuf;

use pace_core::calendar::RaceCalendar;
use pace_core::pair::{ComparisonPair, Eligibility, EligibilityPolicy, PairKey, enumerate_pairs};
use pace_core::record::MetricRecord;
use pace_core::series::PairSeries;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::chart::{ChartError, render_pair};
use crate::config::{RenderConfig, ResolvedOutputs, ValidationError};
use crate::source::{SourceError, load_records};

/// Primary entry point for rendering a season's pair charts.
pub struct ChartRunner {
    config: RenderConfig,
    outputs: ResolvedOutputs,
    calendar: RaceCalendar,
    policy: EligibilityPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPair {
    pub key: PairKey,
    pub found: usize,
    pub required: usize,
}

#[derive(Debug)]
pub struct PairFailure {
    pub key: PairKey,
    pub error: ChartError,
}

/// Summary details returned after a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub records_loaded: usize,
    pub records_dropped: usize,
    pub pairs_seen: usize,
    pub charts: Vec<PathBuf>,
    pub skipped: Vec<SkippedPair>,
    pub failures: Vec<PairFailure>,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of taking one pair through the pipeline.
#[derive(Debug)]
pub enum PairOutcome {
    Rendered(PathBuf),
    Skipped(SkippedPair),
    Failed(PairFailure),
}

impl ChartRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: RenderConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let calendar = config.race_calendar()?;
        let policy = config.eligibility();
        Ok(Self {
            config,
            outputs,
            calendar,
            policy,
        })
    }

    pub fn calendar(&self) -> &RaceCalendar {
        &self.calendar
    }

    /// Load the metrics table and render every eligible pair.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        let report = load_records(&self.outputs.input_csv)?;
        info!(
            path = %self.outputs.input_csv.display(),
            records = report.records.len(),
            dropped = report.dropped,
            "loaded metrics table"
        );
        if report.dropped > 0 {
            warn!(
                dropped = report.dropped,
                "excluded rows with missing consistency values"
            );
        }

        let mut summary = self.run_records(&report.records);
        summary.records_dropped = report.dropped;
        Ok(summary)
    }

    /// Render every eligible pair found in `records`, one pair at a time.
    pub fn run_records(&self, records: &[MetricRecord]) -> RunSummary {
        let pairs = enumerate_pairs(records);
        let mut summary = RunSummary {
            records_loaded: records.len(),
            pairs_seen: pairs.len(),
            ..RunSummary::default()
        };

        for key in pairs {
            match self.process_pair(key, records) {
                PairOutcome::Rendered(path) => summary.charts.push(path),
                PairOutcome::Skipped(skipped) => summary.skipped.push(skipped),
                PairOutcome::Failed(failure) => summary.failures.push(failure),
            }
        }

        info!(
            run_id = %self.config.run_id,
            charts = summary.charts.len(),
            skipped = summary.skipped.len(),
            failed = summary.failures.len(),
            "render pass complete"
        );
        summary
    }

    /// Collect, filter, compute and render a single pair. All figure state is
    /// created and released inside this call.
    pub fn process_pair(&self, key: PairKey, records: &[MetricRecord]) -> PairOutcome {
        let pair = ComparisonPair::collect(key, records, &self.calendar);

        if let Eligibility::TooFewRaces { found, required } = self.policy.assess(&pair.races) {
            debug!(pair = %pair.key, found, required, "skipping pair with too few races");
            return PairOutcome::Skipped(SkippedPair {
                key: pair.key,
                found,
                required,
            });
        }

        let unscheduled: Vec<&str> = pair.unscheduled_races().collect();
        if !unscheduled.is_empty() {
            warn!(
                pair = %pair.key,
                races = ?unscheduled,
                "races missing from calendar are plotted after the season"
            );
        }

        let Some(series) = PairSeries::build(&pair) else {
            let error = ChartError::Plot("pair has no finite values to plot".into());
            error!(pair = %pair.key, %error, "chart not rendered");
            return PairOutcome::Failed(PairFailure {
                key: pair.key,
                error,
            });
        };

        match render_pair(
            &series,
            &self.outputs.charts_dir,
            self.outputs.format,
            self.config.chart.size(),
        ) {
            Ok(path) => {
                info!(
                    pair = %series.key,
                    path = %path.display(),
                    races = series.points.len(),
                    "chart written"
                );
                PairOutcome::Rendered(path)
            }
            Err(error) => {
                error!(pair = %series.key, %error, "chart not rendered");
                PairOutcome::Failed(PairFailure {
                    key: series.key,
                    error,
                })
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),
    #[error("failed to load metrics: {0}")]
    Source(#[from] SourceError),
}
