mod affinity;
mod error;
mod mutations;
mod queries;
mod ranker;

pub use affinity::{Candidate, MatchKind};
pub use error::PlaceError;
pub use ranker::{fifo_eligible, rank};

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::journal::Journal;
use crate::limits::*;
use crate::model::*;
use crate::similarity::{NoSimilarity, SimilarityRelation};
use crate::source::{AssignmentSink, InventorySource};

pub type SharedLocationState = Arc<RwLock<LocationState>>;

/// Placement policy knobs.
#[derive(Debug, Clone)]
pub struct PlaceConfig {
    pub capacity_mode: CapacityMode,
    /// Commit retries after losing a capacity race.
    pub max_retries: u32,
    /// Per-unit deadline; `None` disables the timeout.
    pub unit_timeout: Option<Duration>,
}

impl Default for PlaceConfig {
    fn default() -> Self {
        Self {
            capacity_mode: CapacityMode::Quantity,
            max_retries: 3,
            unit_timeout: None,
        }
    }
}

/// Terminal result for one unit of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Committed {
        location_id: LocationId,
        rationale: Rationale,
    },
    Failed(PlaceError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementResult {
    pub unit_id: UnitId,
    pub outcome: Outcome,
}

// ── Group-commit journal channel ─────────────────────────

pub(super) enum JournalCommand {
    Append {
        record: Assignment,
        response: oneshot::Sender<io::Result<()>>,
    },
}

/// Background task that owns the journal and batches appends for group commit.
/// 1. Block until the first Append arrives.
/// 2. Buffer it (no fsync).
/// 3. Drain all immediately available Appends (the batch window).
/// 4. Single flush_sync for the whole batch.
/// 5. Respond Ok to all senders.
async fn journal_writer_loop(mut journal: Journal, mut rx: mpsc::Receiver<JournalCommand>) {
    while let Some(cmd) = rx.recv().await {
        let JournalCommand::Append { record, response } = cmd;
        let mut batch = vec![(record, response)];

        // Drain all immediately available appends
        while let Ok(JournalCommand::Append { record, response }) = rx.try_recv() {
            batch.push((record, response));
        }

        metrics::histogram!(crate::observability::JOURNAL_FLUSH_BATCH_SIZE)
            .record(batch.len() as f64);
        let flush_start = std::time::Instant::now();
        let result = flush_batch(&mut journal, &mut batch);
        metrics::histogram!(crate::observability::JOURNAL_FLUSH_DURATION_SECONDS)
            .record(flush_start.elapsed().as_secs_f64());
        respond_batch(&mut batch, &result);
    }
}

fn flush_batch(
    journal: &mut Journal,
    batch: &mut [(Assignment, oneshot::Sender<io::Result<()>>)],
) -> io::Result<()> {
    let mut append_err: Option<io::Error> = None;
    for (record, _) in batch.iter() {
        if let Err(e) = journal.append_buffered(record) {
            append_err = Some(e);
            break;
        }
    }
    // Always flush — even on append error — so partially buffered bytes
    // don't leak into the next batch (callers were told this batch failed).
    let flush_err = journal.flush_sync().err();
    if let Some(e) = append_err {
        return Err(e);
    }
    if let Some(e) = flush_err {
        return Err(e);
    }
    Ok(())
}

fn respond_batch(
    batch: &mut Vec<(Assignment, oneshot::Sender<io::Result<()>>)>,
    result: &io::Result<()>,
) {
    for (_, tx) in batch.drain(..) {
        let r = match result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

/// The placement decision engine. The location catalog is the single source
/// of truth; the SKU index and committed-unit map are secondary views kept
/// in step by the commit path.
pub struct Engine {
    /// Location Catalog: per-location state behind a per-location lock.
    pub(super) locations: DashMap<LocationId, SharedLocationState>,
    /// Inventory Index: SKU → locations currently holding it.
    pub(super) sku_index: DashMap<Sku, HashSet<LocationId>>,
    /// Units with a committed assignment; rejects resubmission.
    pub(super) committed: DashMap<UnitId, LocationId>,
    pub(super) journal_tx: mpsc::Sender<JournalCommand>,
    pub(super) similarity: Arc<dyn SimilarityRelation>,
    pub(super) sink: Option<Arc<dyn AssignmentSink>>,
    pub(super) config: PlaceConfig,
}

impl Engine {
    /// Open the engine over the journal at `journal_path`. Replays the
    /// journal to seed the committed-unit set, then starts the group-commit
    /// writer task. The catalog starts empty; call `bootstrap` or
    /// `insert_location` next.
    pub fn open(journal_path: PathBuf, config: PlaceConfig) -> io::Result<Self> {
        let records = Journal::replay(&journal_path)?;
        let journal = Journal::open(&journal_path)?;
        let (journal_tx, journal_rx) = mpsc::channel(4096);
        tokio::spawn(journal_writer_loop(journal, journal_rx));

        let engine = Self {
            locations: DashMap::new(),
            sku_index: DashMap::new(),
            committed: DashMap::new(),
            journal_tx,
            similarity: Arc::new(NoSimilarity),
            sink: None,
            config,
        };

        for record in records {
            engine.committed.insert(record.unit_id, record.location_id);
        }

        Ok(engine)
    }

    pub fn with_similarity(mut self, similarity: Arc<dyn SimilarityRelation>) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn AssignmentSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Load the location snapshot and located inventory from `source`,
    /// then rebuild the SKU index from the catalog.
    pub async fn bootstrap(&self, source: &dyn InventorySource) -> Result<(), PlaceError> {
        let locations = source
            .load_locations()
            .await
            .map_err(|e| PlaceError::Io(e.to_string()))?;
        for location in locations {
            self.insert_location(location)?;
        }
        self.rebuild_index();

        let inventory = source
            .load_inventory()
            .await
            .map_err(|e| PlaceError::Io(e.to_string()))?;
        for located in inventory {
            self.committed
                .insert(located.unit.unit_id, located.location_id);
        }

        tracing::info!(
            locations = self.locations.len(),
            located_units = self.committed.len(),
            "catalog bootstrapped"
        );
        Ok(())
    }

    /// Add one location to the catalog. Duplicate ids are rejected — the
    /// snapshot is expected to be consistent.
    pub fn insert_location(&self, location: LocationState) -> Result<(), PlaceError> {
        if self.locations.len() >= MAX_LOCATIONS {
            return Err(PlaceError::LimitExceeded("too many locations"));
        }
        if location.id.as_str().is_empty() || location.id.as_str().len() > MAX_LOCATION_ID_LEN {
            return Err(PlaceError::LimitExceeded("location id length"));
        }
        if location.zone.len() > MAX_ZONE_LEN {
            return Err(PlaceError::LimitExceeded("zone name too long"));
        }
        if self.locations.contains_key(&location.id) {
            return Err(PlaceError::LimitExceeded("duplicate location id"));
        }
        for sku in location.occupants.keys() {
            self.sku_index
                .entry(sku.clone())
                .or_default()
                .insert(location.id.clone());
        }
        self.locations
            .insert(location.id.clone(), Arc::new(RwLock::new(location)));
        Ok(())
    }

    /// Rebuild the SKU index from the catalog. Only called at bootstrap,
    /// when we are the sole owner of the location Arcs, so try_read always
    /// succeeds instantly.
    pub fn rebuild_index(&self) {
        self.sku_index.clear();
        for entry in self.locations.iter() {
            let guard = entry.value().try_read().expect("rebuild_index: uncontended read");
            for sku in guard.occupants.keys() {
                self.sku_index
                    .entry(sku.clone())
                    .or_default()
                    .insert(guard.id.clone());
            }
        }
    }

    pub fn location(&self, id: &LocationId) -> Option<SharedLocationState> {
        self.locations.get(id).map(|e| e.value().clone())
    }

    /// Write a record to the journal via the background group-commit writer.
    pub(super) async fn journal_append(&self, record: &Assignment) -> Result<(), PlaceError> {
        let (tx, rx) = oneshot::channel();
        self.journal_tx
            .send(JournalCommand::Append {
                record: record.clone(),
                response: tx,
            })
            .await
            .map_err(|_| PlaceError::Journal("journal writer shut down".into()))?;
        rx.await
            .map_err(|_| PlaceError::Journal("journal writer dropped response".into()))?
            .map_err(|e| PlaceError::Journal(e.to_string()))
    }
}
