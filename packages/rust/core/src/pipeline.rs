//! Aggregation pipeline: root manifest → per-unit sub-documents → model.
//!
//! The root manifest is load-bearing: if it cannot be loaded or shaped, the
//! run fails with a single error string. Unit sub-documents are loaded
//! concurrently and independently; any of them may degrade to an empty
//! entry list without affecting siblings or the run's outcome.

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tracing::{info, instrument, warn};

use toolbox_shared::{Manifest, Unit, UnitDocument, UnitStatus};
use toolbox_transport::Transport;

use crate::loader::{LoadOutcome, Loader};

// ---------------------------------------------------------------------------
// Result and state
// ---------------------------------------------------------------------------

/// Where an [`Aggregator`] is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateState {
    /// No run requested yet.
    Idle,
    /// A run is in progress.
    Loading,
    /// The root loaded; every unit has settled (loaded or degraded).
    Settled,
    /// The root manifest was unavailable or malformed.
    Failed,
}

/// The aggregate model handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateResult {
    /// One unit per manifest descriptor, in manifest order.
    pub units: Vec<Unit>,
    /// Set only when the root manifest failed.
    pub error: Option<String>,
}

impl AggregateResult {
    fn failed(error: String) -> Self {
        Self {
            units: Vec::new(),
            error: Some(error),
        }
    }

    /// Number of units whose sub-document did not load cleanly.
    pub fn degraded_count(&self) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(u.status, UnitStatus::Failed { .. }))
            .count()
    }

    /// Total entries across all units.
    pub fn entry_count(&self) -> usize {
        self.units.iter().map(|u| u.tools.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting aggregation status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as each unit settles, in completion order.
    fn unit_settled(&self, unit: &Unit, settled: usize, total: usize);
    /// Called once the run finishes, successfully or not.
    fn done(&self, result: &AggregateResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn unit_settled(&self, _unit: &Unit, _settled: usize, _total: usize) {}
    fn done(&self, _result: &AggregateResult) {}
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Runs aggregations over one loader. Each run builds a fresh unit set.
pub struct Aggregator<T> {
    loader: Loader<T>,
    default_expanded: bool,
    state: AggregateState,
}

impl<T: Transport> Aggregator<T> {
    pub fn new(loader: Loader<T>, default_expanded: bool) -> Self {
        Self {
            loader,
            default_expanded,
            state: AggregateState::Idle,
        }
    }

    pub fn state(&self) -> AggregateState {
        self.state
    }

    pub fn loader(&self) -> &Loader<T> {
        &self.loader
    }

    /// Load the root manifest at `root_path` and every unit it declares.
    ///
    /// 1. Load and shape-check the root manifest (fatal on failure)
    /// 2. Materialize one unit per descriptor, in order
    /// 3. Load all unit sub-documents concurrently
    /// 4. Merge each outcome into its unit once all have settled
    #[instrument(skip(self, progress), fields(transport = self.loader.transport().name()))]
    pub async fn load_all(
        &mut self,
        root_path: &str,
        progress: &dyn ProgressReporter,
    ) -> AggregateResult {
        self.state = AggregateState::Loading;

        progress.phase("Loading root manifest");
        let manifest = match self.load_manifest(root_path).await {
            Ok(manifest) => manifest,
            Err(error) => {
                warn!(%error, "aggregation failed");
                self.state = AggregateState::Failed;
                let result = AggregateResult::failed(error);
                progress.done(&result);
                return result;
            }
        };

        let mut units: Vec<Unit> = manifest
            .categories
            .into_iter()
            .map(|descriptor| Unit::from_descriptor(descriptor, self.default_expanded))
            .collect();

        progress.phase("Loading categories");
        let loader = &self.loader;
        let mut pending: FuturesUnordered<_> = units
            .iter()
            .enumerate()
            .filter(|(_, unit)| unit.needs_document())
            .map(|(index, unit)| {
                let path = unit.document_path();
                async move {
                    let outcome = loader.load(&path).await;
                    (index, outcome)
                }
            })
            .collect();
        let total = pending.len();

        // Join barrier: drain every unit load; none cancels another.
        let mut settled = 0;
        while let Some((index, outcome)) = pending.next().await {
            let unit = &mut units[index];
            settle_unit(unit, outcome);
            settled += 1;
            progress.unit_settled(unit, settled, total);
        }
        drop(pending);

        let result = AggregateResult { units, error: None };
        self.state = AggregateState::Settled;

        info!(
            units = result.units.len(),
            entries = result.entry_count(),
            degraded = result.degraded_count(),
            "aggregation settled"
        );
        progress.done(&result);
        result
    }

    async fn load_manifest(&self, root_path: &str) -> Result<Manifest, String> {
        let doc = self
            .loader
            .load(root_path)
            .await
            .into_result()
            .map_err(|e| format!("unable to load tool categories from {root_path}: {e}"))?;

        Manifest::from_document(&doc)
            .map_err(|e| format!("unable to load tool categories from {root_path}: {e}"))
    }
}

/// Merge one unit's load outcome into it. Failures only degrade the unit.
fn settle_unit(unit: &mut Unit, outcome: LoadOutcome) {
    let doc = match outcome {
        LoadOutcome::Success(doc) => doc,
        LoadOutcome::Unavailable(err) => {
            warn!(unit = %unit.id, error = %err, "unit unavailable, continuing without entries");
            unit.degrade(err.to_string());
            return;
        }
    };

    match UnitDocument::from_document(&doc) {
        Ok(unit_doc) => unit.apply(unit_doc),
        Err(err) => {
            warn!(unit = %unit.id, error = %err, "unit document malformed, continuing without entries");
            unit.degrade(err.to_string());
        }
    }
}

/// One-shot aggregation with a fresh [`Aggregator`].
pub async fn load_all<T: Transport>(
    loader: Loader<T>,
    root_path: &str,
    default_expanded: bool,
    progress: &dyn ProgressReporter,
) -> AggregateResult {
    Aggregator::new(loader, default_expanded)
        .load_all(root_path, progress)
        .await
}
