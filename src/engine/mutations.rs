use tokio_util::sync::CancellationToken;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::observability;

use super::ranker;
use super::{Engine, Outcome, PlaceError, PlacementResult};

pub(crate) fn now_ms() -> Ms {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as Ms
}

pub(crate) fn validate_unit(unit: &Unit) -> Result<(), PlaceError> {
    if unit.unit_id.as_str().is_empty() || unit.unit_id.as_str().len() > MAX_UNIT_ID_LEN {
        return Err(PlaceError::LimitExceeded("unit id length"));
    }
    if unit.sku.as_str().is_empty() || unit.sku.as_str().len() > MAX_SKU_LEN {
        return Err(PlaceError::LimitExceeded("sku length"));
    }
    if unit.quantity == 0 || unit.quantity > MAX_UNIT_QUANTITY {
        return Err(PlaceError::LimitExceeded("unit quantity out of range"));
    }
    if unit.receipt_ts < MIN_VALID_TIMESTAMP_MS || unit.receipt_ts > MAX_VALID_TIMESTAMP_MS {
        return Err(PlaceError::LimitExceeded("receipt timestamp out of range"));
    }
    Ok(())
}

impl Engine {
    /// Decide and commit a location for one unit. Repeatable per unit: a
    /// unit that already committed is rejected, a unit that failed left no
    /// state behind and may be resubmitted.
    pub async fn place_unit(&self, unit: &Unit) -> Result<(LocationId, Rationale), PlaceError> {
        validate_unit(unit)?;

        let start = std::time::Instant::now();
        let result = match self.config.unit_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, self.place_inner(unit)).await {
                Ok(result) => result,
                Err(_) => Err(PlaceError::Timeout),
            },
            None => self.place_inner(unit).await,
        };
        metrics::histogram!(observability::PLACEMENT_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());

        match &result {
            Ok((location_id, rationale)) => {
                metrics::counter!(
                    observability::PLACEMENTS_TOTAL,
                    "rationale" => observability::rationale_label(*rationale)
                )
                .increment(1);
                tracing::debug!(
                    unit_id = %unit.unit_id,
                    location_id = %location_id,
                    rationale = observability::rationale_label(*rationale),
                    phase = ?PlacementPhase::Committed,
                    "unit placed"
                );
            }
            Err(error) => {
                metrics::counter!(
                    observability::PLACEMENT_FAILURES_TOTAL,
                    "kind" => observability::error_label(error)
                )
                .increment(1);
                tracing::warn!(
                    unit_id = %unit.unit_id,
                    phase = ?PlacementPhase::Failed,
                    %error,
                    "unit not placed"
                );
            }
        }
        result
    }

    /// Resolve → rank → commit, with a bounded retry when a concurrent
    /// commit consumes the chosen slot. Every retry re-reads current state.
    async fn place_inner(&self, unit: &Unit) -> Result<(LocationId, Rationale), PlaceError> {
        if self.committed.contains_key(&unit.unit_id) {
            return Err(PlaceError::AlreadyAssigned(unit.unit_id.clone()));
        }

        let mut attempt: u32 = 0;
        loop {
            tracing::trace!(unit_id = %unit.unit_id, attempt, phase = ?PlacementPhase::Deciding, "deciding");
            let mut candidates = self.affinity_candidates(unit).await;
            candidates.extend(self.empty_candidates(unit).await);

            let Some((target, rationale)) = ranker::rank(unit, &candidates) else {
                return Err(PlaceError::NoCapacity);
            };

            match self.try_commit(unit, &target, rationale).await {
                Ok(()) => return Ok((target, rationale)),
                Err(PlaceError::CapacityExceeded(capacity)) => {
                    attempt += 1;
                    metrics::counter!(observability::PLACEMENT_RETRIES_TOTAL).increment(1);
                    if attempt > self.config.max_retries {
                        return Err(PlaceError::NoCapacity);
                    }
                    tracing::debug!(
                        unit_id = %unit.unit_id,
                        location_id = %target,
                        capacity,
                        attempt,
                        "lost capacity race, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Commit the unit to `location_id`. Holds the location's write lock
    /// across re-validation, external persist, journal append, and the
    /// occupancy/index updates, so no partial state is ever visible.
    async fn try_commit(
        &self,
        unit: &Unit,
        location_id: &LocationId,
        rationale: Rationale,
    ) -> Result<(), PlaceError> {
        let slot = self
            .location(location_id)
            .ok_or_else(|| PlaceError::NotFound(location_id.clone()))?;
        let mut guard = slot.write().await;

        // Re-validate under the lock: the decision was made on a stale read.
        if guard.status == LocationStatus::Blocked
            || !guard.fits(&unit.sku, unit.quantity, self.config.capacity_mode)
        {
            return Err(PlaceError::CapacityExceeded(guard.capacity));
        }
        if let Some(lot) = guard.lot(&unit.sku)
            && !ranker::fifo_eligible(unit, Some(lot.oldest_receipt)) {
                // A concurrent commit created a newer lot here; rerouting
                // beats repairing.
                return Err(PlaceError::CapacityExceeded(guard.capacity));
            }
        if self.committed.contains_key(&unit.unit_id) {
            return Err(PlaceError::AlreadyAssigned(unit.unit_id.clone()));
        }

        let record = Assignment {
            id: Ulid::new(),
            unit_id: unit.unit_id.clone(),
            location_id: location_id.clone(),
            sku: unit.sku.clone(),
            quantity: unit.quantity,
            receipt_ts: unit.receipt_ts,
            decided_at: now_ms(),
            rationale,
        };

        if let Some(sink) = &self.sink {
            sink.persist(&record)
                .await
                .map_err(|e| PlaceError::Io(e.to_string()))?;
        }
        self.journal_append(&record).await?;

        guard.receive(unit.sku.clone(), unit.quantity, unit.receipt_ts);
        self.sku_index
            .entry(unit.sku.clone())
            .or_default()
            .insert(location_id.clone());
        self.committed
            .insert(unit.unit_id.clone(), location_id.clone());
        Ok(())
    }

    /// Place a batch of units, one transaction each, in deterministic order
    /// (oldest receipt first, then unit id). Failures are isolated: every
    /// unit gets a terminal outcome and one unit's failure never aborts the
    /// rest. Units not yet deciding when `cancel` fires are reported
    /// cancelled and left unlocated.
    pub async fn run_batch(
        &self,
        mut units: Vec<Unit>,
        cancel: CancellationToken,
    ) -> Result<Vec<PlacementResult>, PlaceError> {
        if units.len() > MAX_BATCH_SIZE {
            return Err(PlaceError::LimitExceeded("batch too large"));
        }
        units.sort_by(|a, b| {
            a.receipt_ts
                .cmp(&b.receipt_ts)
                .then_with(|| a.unit_id.cmp(&b.unit_id))
        });

        metrics::counter!(observability::BATCH_UNITS_TOTAL).increment(units.len() as u64);

        let mut results = Vec::with_capacity(units.len());
        for unit in &units {
            if cancel.is_cancelled() {
                tracing::debug!(
                    unit_id = %unit.unit_id,
                    phase = ?PlacementPhase::Pending,
                    "cancelled before deciding"
                );
                results.push(PlacementResult {
                    unit_id: unit.unit_id.clone(),
                    outcome: Outcome::Failed(PlaceError::Cancelled),
                });
                continue;
            }
            let outcome = match self.place_unit(unit).await {
                Ok((location_id, rationale)) => Outcome::Committed {
                    location_id,
                    rationale,
                },
                Err(error) => Outcome::Failed(error),
            };
            results.push(PlacementResult {
                unit_id: unit.unit_id.clone(),
                outcome,
            });
        }
        Ok(results)
    }

    /// Load the unlocated units from `source` and run them as one batch.
    pub async fn run_from_source(
        &self,
        source: &dyn crate::source::InventorySource,
    ) -> Result<Vec<PlacementResult>, PlaceError> {
        let units = source
            .load_unlocated_units()
            .await
            .map_err(|e| PlaceError::Io(e.to_string()))?;
        self.run_batch(units, CancellationToken::new()).await
    }
}
