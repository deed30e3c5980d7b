//! Material ledger facade.
//!
//! [`MaterialLedgerService`] is the one entry point callers use. It
//! wires the allocation aggregate to its collaborators: the repository
//! for optimistic-concurrency persistence, the catalog for pricing,
//! the document service for attachments, the cost cache, and the event
//! bus. Every mutating operation follows the same shape: load, mutate
//! a scratch copy, save against the read version, and retry a bounded
//! number of times on version conflicts before surfacing the conflict.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use tallyard_shared::types::{ActorId, AllocationId, MaterialId, ReallocationActionId, WorkOrderId};

use crate::catalog::MaterialCatalog;
use crate::costing::{CostAggregator, CostBasis, WorkOrderCostCache, WorkOrderMaterialCost};
use crate::documents::DocumentService;
use crate::events::{LedgerEvent, LedgerEventBus};
use crate::ledger::{
    Allocation, AllocationStatus, LedgerError, Priority, ReallocationAction, UsageEvent,
};
use crate::reallocation::{rank_candidates, ReallocationEngine, TriageCandidate};
use crate::reconciliation::{RecordUsageInput, UsageService};
use crate::repository::{AllocationRepository, Versioned};

pub use crate::costing::AllocationSummary;

/// Default number of retries after the initial save attempt.
const DEFAULT_MAX_SAVE_RETRIES: u32 = 3;

/// Tuning for the ledger facade.
#[derive(Debug, Clone)]
pub struct LedgerSettings {
    /// Retries after the first save attempt before a conflict surfaces.
    pub max_save_retries: u32,
    /// Quantity basis for cost aggregation.
    pub cost_basis: CostBasis,
    /// Maximum number of cached cost snapshots.
    pub cost_cache_capacity: u64,
    /// Time-to-live of a cached cost snapshot, in seconds.
    pub cost_cache_ttl_secs: u64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            max_save_retries: DEFAULT_MAX_SAVE_RETRIES,
            cost_basis: CostBasis::Used,
            cost_cache_capacity: 100,
            cost_cache_ttl_secs: 300,
        }
    }
}

/// One reallocation request.
///
/// Endpoints are optional: with both set, quantity moves between the
/// allocations; with only `from`, quantity is released back to stock;
/// with only `to`, quantity is added from stock.
#[derive(Debug, Clone, PartialEq)]
pub struct ReallocateInput {
    /// Allocation giving quantity up, when there is one.
    pub from_allocation_id: Option<AllocationId>,
    /// Allocation receiving quantity, when there is one.
    pub to_allocation_id: Option<AllocationId>,
    /// Quantity to move.
    pub quantity: Decimal,
    /// Why the move happened. Required.
    pub reason: String,
    /// Urgency of the move, for the audit trail.
    pub priority: Priority,
    /// Who ordered the move.
    pub recorded_by: ActorId,
}

/// Result of a committed (or replayed) usage recording.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUsage {
    /// The allocation after the report was applied.
    pub allocation: Allocation,
    /// Events the report produced, in recording order.
    pub events: Vec<UsageEvent>,
    /// True when the request id had already been applied.
    pub replayed: bool,
}

/// Facade over the allocation ledger and its collaborators.
pub struct MaterialLedgerService<R, C, D>
where
    R: AllocationRepository,
    C: MaterialCatalog,
    D: DocumentService,
{
    repo: Arc<R>,
    catalog: Arc<C>,
    documents: Arc<D>,
    cost_cache: WorkOrderCostCache,
    events: LedgerEventBus,
    max_save_retries: u32,
    cost_basis: CostBasis,
}

impl<R, C, D> MaterialLedgerService<R, C, D>
where
    R: AllocationRepository,
    C: MaterialCatalog,
    D: DocumentService,
{
    /// Creates a facade with default settings.
    #[must_use]
    pub fn new(repo: Arc<R>, catalog: Arc<C>, documents: Arc<D>) -> Self {
        Self::with_settings(repo, catalog, documents, LedgerSettings::default())
    }

    /// Creates a facade with explicit settings.
    #[must_use]
    pub fn with_settings(
        repo: Arc<R>,
        catalog: Arc<C>,
        documents: Arc<D>,
        settings: LedgerSettings,
    ) -> Self {
        Self {
            repo,
            catalog,
            documents,
            cost_cache: WorkOrderCostCache::with_config(
                settings.cost_cache_capacity,
                settings.cost_cache_ttl_secs,
            ),
            events: LedgerEventBus::new(),
            max_save_retries: settings.max_save_retries,
            cost_basis: settings.cost_basis,
        }
    }

    /// The event bus mutations publish to.
    #[must_use]
    pub fn events(&self) -> &LedgerEventBus {
        &self.events
    }

    /// Assigns quantity of a material to a work order.
    ///
    /// Reuses the existing allocation for the pairing when one exists;
    /// otherwise opens a new one. Only legal while the allocation is
    /// still in procurement.
    ///
    /// # Errors
    ///
    /// Returns an error if the material is not in the catalog, the
    /// quantity is not positive, the allocation is past procurement or
    /// terminal, or retries are exhausted under write contention.
    pub async fn allocate_material(
        &self,
        work_order_id: WorkOrderId,
        material_id: MaterialId,
        quantity: Decimal,
    ) -> Result<Allocation, LedgerError> {
        let entry = self
            .catalog
            .entry(material_id)
            .ok_or(LedgerError::MaterialNotInCatalog(material_id))?;

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let existing = self.repo.find_by_pairing(work_order_id, material_id).await?;
            let (opened, next, expected_version) = match existing {
                Some(Versioned { value, version }) => {
                    let mut next = value;
                    next.allocate(quantity)?;
                    (false, next, Some(version))
                }
                None => {
                    let mut next = Allocation::open(work_order_id, material_id, entry.kind.clone());
                    next.allocate(quantity)?;
                    (true, next, None)
                }
            };
            let allocation_id = next.id();

            let result = match expected_version {
                Some(version) => self.repo.save(next, version).await,
                None => self.repo.insert(next).await,
            };

            match result {
                Ok(committed) => {
                    let allocation = committed.value;
                    self.refresh_costs_after_commit(work_order_id).await;
                    if opened {
                        self.events.publish(&LedgerEvent::AllocationOpened {
                            allocation_id: allocation.id(),
                            work_order_id,
                            material_id,
                        });
                    }
                    self.events.publish(&LedgerEvent::QuantityAllocated {
                        allocation_id: allocation.id(),
                        work_order_id,
                        quantity,
                    });
                    return Ok(allocation);
                }
                Err(err) => self.check_retry(err, attempt, allocation_id)?,
            }
        }
    }

    /// Reconciles a usage report into its allocation.
    ///
    /// On success the allocation is finalized as `Used`, its events are
    /// appended, costs are refreshed, and any photos on the report are
    /// attached. Attachment failures are logged and never fail the
    /// recording. Replaying an already-applied request id returns the
    /// original events without touching the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error under the validation rules of
    /// [`UsageService::record`], when the allocation does not exist,
    /// or when retries are exhausted under write contention.
    pub async fn record_usage(
        &self,
        input: RecordUsageInput,
    ) -> Result<RecordedUsage, LedgerError> {
        let allocation_id = input.allocation_id;

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let Versioned { value, version } = self
                .repo
                .load(allocation_id)
                .await?
                .ok_or(LedgerError::AllocationNotFound(allocation_id))?;

            let mut next = value;
            let outcome = UsageService::record(&mut next, &input)?;
            if outcome.replayed {
                return Ok(RecordedUsage {
                    allocation: next,
                    events: outcome.events,
                    replayed: true,
                });
            }

            match self.repo.save(next, version).await {
                Ok(committed) => {
                    let allocation = committed.value;
                    let work_order_id = allocation.work_order_id();
                    self.refresh_costs_after_commit(work_order_id).await;
                    self.events.publish(&LedgerEvent::UsageRecorded {
                        allocation_id,
                        work_order_id,
                        request_id: input.request_id,
                    });
                    self.attach_photos(&input).await;
                    return Ok(RecordedUsage {
                        allocation,
                        events: outcome.events,
                        replayed: false,
                    });
                }
                Err(err) => self.check_retry(err, attempt, allocation_id)?,
            }
        }
    }

    /// Moves quantity between allocations, or in or out of one.
    ///
    /// Transfers are atomic: both allocations change or neither does.
    /// Every committed move is appended to the audit trail; an append
    /// failure is logged and never fails the committed move.
    ///
    /// # Errors
    ///
    /// Returns an error if the request names no endpoint, names the
    /// same allocation twice, carries a non-positive quantity or blank
    /// reason, if either allocation is missing or cannot give or take
    /// the quantity, or when retries are exhausted.
    pub async fn reallocate(
        &self,
        input: ReallocateInput,
    ) -> Result<ReallocationAction, LedgerError> {
        if input.quantity <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveQuantity);
        }
        if input.reason.trim().is_empty() {
            return Err(LedgerError::ReasonRequired);
        }

        match (input.from_allocation_id, input.to_allocation_id) {
            (None, None) => Err(LedgerError::MissingEndpoints),
            (Some(from), Some(to)) if from == to => Err(LedgerError::SameAllocation),
            (Some(from), Some(to)) => self.transfer_between(from, to, &input).await,
            (Some(from), None) => self.release_from(from, &input).await,
            (None, Some(to)) => self.top_up(to, &input).await,
        }
    }

    /// Aggregated quantities for one work order.
    ///
    /// Utilization is used over allocated as a percentage; a work
    /// order with nothing allocated reports zero.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub async fn allocation_summary(
        &self,
        work_order_id: WorkOrderId,
    ) -> Result<AllocationSummary, LedgerError> {
        let allocations = self.repo.find_by_work_order(work_order_id).await?;
        Ok(CostAggregator::summarize_work_order(
            work_order_id,
            &allocations,
        ))
    }

    /// Material cost snapshot for one work order.
    ///
    /// Served from the cache when fresh; otherwise computed from the
    /// store, cached, and returned with `cached: false`.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub async fn work_order_material_cost(
        &self,
        work_order_id: WorkOrderId,
    ) -> Result<WorkOrderMaterialCost, LedgerError> {
        if let Some(cost) = self.cost_cache.get(work_order_id) {
            return Ok(cost);
        }
        self.compute_and_cache_costs(work_order_id).await
    }

    /// Moves an allocation forward through its lifecycle.
    ///
    /// Transitioning to the current status is a no-op and does not
    /// write. `Used` is refused as a target: an allocation closes only
    /// when [`Self::record_usage`] reconciles a report against it.
    ///
    /// # Errors
    ///
    /// Returns an error if the allocation is missing or terminal, the
    /// move is backward or targets `Used`, or retries are exhausted.
    pub async fn advance_status(
        &self,
        allocation_id: AllocationId,
        next_status: AllocationStatus,
    ) -> Result<Allocation, LedgerError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let Versioned { value, version } = self
                .repo
                .load(allocation_id)
                .await?
                .ok_or(LedgerError::AllocationNotFound(allocation_id))?;

            let from = value.status();
            let mut next = value;
            next.transition_status(next_status)?;
            if next.status() == from {
                return Ok(next);
            }

            match self.repo.save(next, version).await {
                Ok(committed) => {
                    self.events.publish(&LedgerEvent::StatusChanged {
                        allocation_id,
                        from,
                        to: next_status,
                    });
                    return Ok(committed.value);
                }
                Err(err) => self.check_retry(err, attempt, allocation_id)?,
            }
        }
    }

    /// Usage events recorded against one allocation, in recording order.
    ///
    /// # Errors
    ///
    /// Returns an error if the allocation is missing or the store
    /// cannot be read.
    pub async fn usage_history(
        &self,
        allocation_id: AllocationId,
    ) -> Result<Vec<UsageEvent>, LedgerError> {
        let Versioned { value, .. } = self
            .repo
            .load(allocation_id)
            .await?
            .ok_or(LedgerError::AllocationNotFound(allocation_id))?;
        Ok(value.events().to_vec())
    }

    /// Audit trail of reallocations touching one allocation.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub async fn reallocations_for_allocation(
        &self,
        allocation_id: AllocationId,
    ) -> Result<Vec<ReallocationAction>, LedgerError> {
        self.repo.actions_for_allocation(allocation_id).await
    }

    /// Audit trail of reallocations touching a work order.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub async fn reallocations_for_work_order(
        &self,
        work_order_id: WorkOrderId,
    ) -> Result<Vec<ReallocationAction>, LedgerError> {
        self.repo.actions_for_work_order(work_order_id).await
    }

    /// Orders reallocation candidates for a planner's triage list.
    ///
    /// Priority and due date live on the work order; callers join them
    /// onto each candidate before asking for the ordering. Highest
    /// priority first, then earliest due date with undated work orders
    /// last, then allocation id. Pure ordering; nothing is read or
    /// written.
    #[allow(clippy::unused_self)]
    #[must_use]
    pub fn triage_candidates(&self, candidates: Vec<TriageCandidate>) -> Vec<TriageCandidate> {
        rank_candidates(candidates)
    }

    async fn transfer_between(
        &self,
        from_id: AllocationId,
        to_id: AllocationId,
        input: &ReallocateInput,
    ) -> Result<ReallocationAction, LedgerError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let from = self
                .repo
                .load(from_id)
                .await?
                .ok_or(LedgerError::AllocationNotFound(from_id))?;
            let to = self
                .repo
                .load(to_id)
                .await?
                .ok_or(LedgerError::AllocationNotFound(to_id))?;

            let mut from_next = from.value;
            let mut to_next = to.value;
            ReallocationEngine::transfer(&mut from_next, &mut to_next, input.quantity)?;

            let from_work_order = from_next.work_order_id();
            let to_work_order = to_next.work_order_id();

            match self
                .repo
                .save_pair((from_next, from.version), (to_next, to.version))
                .await
            {
                Ok(_) => {
                    let action = self.committed_action(input);
                    self.append_action_after_commit(&action).await;
                    self.refresh_costs_after_commit(from_work_order).await;
                    if to_work_order != from_work_order {
                        self.refresh_costs_after_commit(to_work_order).await;
                    }
                    self.publish_reallocated(&action);
                    return Ok(action);
                }
                Err(err) => self.check_retry(err, attempt, from_id)?,
            }
        }
    }

    async fn release_from(
        &self,
        from_id: AllocationId,
        input: &ReallocateInput,
    ) -> Result<ReallocationAction, LedgerError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let Versioned { value, version } = self
                .repo
                .load(from_id)
                .await?
                .ok_or(LedgerError::AllocationNotFound(from_id))?;

            let mut next = value;
            ReallocationEngine::reduce(&mut next, input.quantity)?;
            let work_order_id = next.work_order_id();

            match self.repo.save(next, version).await {
                Ok(_) => {
                    let action = self.committed_action(input);
                    self.append_action_after_commit(&action).await;
                    self.refresh_costs_after_commit(work_order_id).await;
                    self.publish_reallocated(&action);
                    return Ok(action);
                }
                Err(err) => self.check_retry(err, attempt, from_id)?,
            }
        }
    }

    async fn top_up(
        &self,
        to_id: AllocationId,
        input: &ReallocateInput,
    ) -> Result<ReallocationAction, LedgerError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let Versioned { value, version } = self
                .repo
                .load(to_id)
                .await?
                .ok_or(LedgerError::AllocationNotFound(to_id))?;

            let mut next = value;
            ReallocationEngine::increase(&mut next, input.quantity)?;
            let work_order_id = next.work_order_id();

            match self.repo.save(next, version).await {
                Ok(_) => {
                    let action = self.committed_action(input);
                    self.append_action_after_commit(&action).await;
                    self.refresh_costs_after_commit(work_order_id).await;
                    self.publish_reallocated(&action);
                    return Ok(action);
                }
                Err(err) => self.check_retry(err, attempt, to_id)?,
            }
        }
    }

    fn committed_action(&self, input: &ReallocateInput) -> ReallocationAction {
        ReallocationAction {
            id: ReallocationActionId::new(),
            from_allocation_id: input.from_allocation_id,
            to_allocation_id: input.to_allocation_id,
            quantity: input.quantity,
            reason: input.reason.clone(),
            priority: input.priority,
            recorded_by: input.recorded_by,
            occurred_at: Utc::now(),
        }
    }

    fn publish_reallocated(&self, action: &ReallocationAction) {
        self.events.publish(&LedgerEvent::Reallocated {
            action_id: action.id,
            from_allocation_id: action.from_allocation_id,
            to_allocation_id: action.to_allocation_id,
            quantity: action.quantity,
        });
    }

    /// Decides whether a failed save is retried or surfaced.
    ///
    /// Retryable errors keep the loop going until the retry budget is
    /// spent, then surface as [`LedgerError::RetriesExhausted`]. The
    /// id names the record the caller last tried to write; on a lost
    /// pairing race that is the candidate which failed to insert.
    fn check_retry(
        &self,
        err: LedgerError,
        attempt: u32,
        allocation_id: AllocationId,
    ) -> Result<(), LedgerError> {
        if !err.is_retryable() {
            return Err(err);
        }
        if attempt <= self.max_save_retries {
            tracing::debug!(
                attempt,
                error = %err,
                "write conflict, retrying against a fresh read"
            );
            return Ok(());
        }
        Err(LedgerError::RetriesExhausted {
            allocation_id,
            attempts: attempt,
        })
    }

    /// Appends a committed move to the audit trail.
    ///
    /// The quantity move already committed, so a failed append is
    /// logged and the move stands; the caller still receives the
    /// action it was promised.
    async fn append_action_after_commit(&self, action: &ReallocationAction) {
        if let Err(err) = self.repo.append_action(action.clone()).await {
            tracing::warn!(
                action_id = %action.id,
                error = %err,
                "audit append failed after commit, trail is missing this move"
            );
        }
    }

    /// Recomputes and caches the work order's cost after a commit.
    ///
    /// The mutation already committed, so a failed recompute only
    /// drops the cached snapshot and the next read computes afresh.
    async fn refresh_costs_after_commit(&self, work_order_id: WorkOrderId) {
        if let Err(err) = self.compute_and_cache_costs(work_order_id).await {
            tracing::warn!(
                %work_order_id,
                error = %err,
                "cost refresh failed after commit, dropping cached snapshot"
            );
            self.cost_cache.invalidate(work_order_id);
        }
    }

    async fn compute_and_cache_costs(
        &self,
        work_order_id: WorkOrderId,
    ) -> Result<WorkOrderMaterialCost, LedgerError> {
        let allocations = self.repo.find_by_work_order(work_order_id).await?;
        let cost = CostAggregator::work_order_cost(
            work_order_id,
            &allocations,
            self.cost_basis,
            |material_id| self.catalog.unit_cost(material_id),
        );
        self.cost_cache.insert(cost.clone());
        Ok(cost)
    }

    async fn attach_photos(&self, input: &RecordUsageInput) {
        for photo in &input.photos {
            if let Err(err) = self
                .documents
                .attach(input.allocation_id, photo.clone())
                .await
            {
                tracing::warn!(
                    allocation_id = %input.allocation_id,
                    filename = %photo.filename,
                    error = %err,
                    "document attach failed, usage recording unaffected"
                );
            }
        }
    }
}
