//! Reconciliation engine
//!
//! The [`ReconciliationEngine`] keeps a user's four entity collections
//! consistent across three copies: in-memory state (the truth while the
//! application runs), the durable local snapshot (a crash-recovery
//! shadow), and the remote resource service (authoritative between
//! sessions).
//!
//! ## Mutation flow
//!
//! 1. Apply the mutation to in-memory state immediately, online or
//!    offline (optimism).
//! 2. Offline: append the mutation verbatim to the durable queue and
//!    schedule a debounced optimistic snapshot save.
//! 3. Online: persist a best-effort authoritative snapshot, then attempt
//!    the remote call. A confirmed add replaces the provisional entity
//!    with the server's copy; a rejected update rolls back by removal; a
//!    network-level or auth failure degrades into the offline queue.
//!
//! ## Reconnect flow
//!
//! Triggered exactly once per offline→online transition: drain the
//! queue, replay every operation in enqueue order through the online
//! branch, refetch all four collections, discard anything still carrying
//! a provisional id, overwrite memory and the snapshot store, and clear
//! the queue.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use ledgersync_core::config::Config;
use ledgersync_core::domain::{
    balance, Account, AccountPatch, Activity, Budget, BudgetPatch, Card, CardPatch, Collections,
    Connectivity, DomainError, EngineState, EntityId, Mutation, Snapshot, SourceKind, Transaction,
    TransactionPatch, UserKey,
};
use ledgersync_core::ports::{
    IConnectivityMonitor, IMutationQueue, IResourceService, ISnapshotStore, QueuedMutation,
    ServiceError,
};
use ledgersync_core::views;

use crate::debounce::SnapshotDebouncer;

// ============================================================================
// Errors and reports
// ============================================================================

/// Failure of a single engine operation
///
/// A failed operation degrades only itself; the engine keeps serving the
/// rest of the application.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine has not completed its startup protocol
    #[error("engine is not ready (state: {0})")]
    NotReady(String),

    /// Domain-level rejection (unknown target, duplicate budget, ...)
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The credential was rejected; the session must re-authenticate.
    /// Mutations hitting this are still queued for durability.
    #[error("authentication required: {0}")]
    AuthRequired(String),

    /// The server answered and refused the mutation
    #[error("remote rejected the mutation: {0}")]
    RemoteRejected(String),

    /// Local durable storage failed
    #[error("storage failure: {0}")]
    Storage(String),

    /// The post-replay refetch failed; the queue is left intact for retry
    #[error("synchronization incomplete: {0}")]
    SyncFailed(String),
}

/// Summary of one queue replay cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Operations replayed successfully
    pub replayed: u32,
    /// Operations that failed and were dropped (logged, counted, not
    /// retried); a front end can surface this as "sync incomplete"
    pub failed: u32,
}

/// Point-in-time summary of the engine for status surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStatus {
    /// Current lifecycle state
    pub state: EngineState,
    /// When local state last reflected confirmed server state
    pub last_sync: Option<DateTime<Utc>>,
    /// Mutations waiting in the durable queue
    pub queued_mutations: u64,
    /// Whether any entities are loaded in memory
    pub has_local_data: bool,
}

// ============================================================================
// ReconciliationEngine
// ============================================================================

/// The orchestrator at the center of the offline-first design
///
/// Owns the in-memory collections exclusively; no other component
/// mutates them. All mutation handling completes its in-memory pass
/// synchronously before any durability operation is awaited, so
/// application order equals intent issuance order.
pub struct ReconciliationEngine {
    /// Remote REST resource service
    service: Arc<dyn IResourceService>,
    /// Durable snapshot shadow
    snapshots: Arc<dyn ISnapshotStore>,
    /// Durable mutation log
    queue: Arc<dyn IMutationQueue>,
    /// Injected connectivity signal (read at startup; transitions arrive
    /// through [`set_connectivity`](Self::set_connectivity))
    monitor: Arc<dyn IConnectivityMonitor>,
    /// Owning principal all state is partitioned by
    user: UserKey,
    /// Lifecycle state machine
    state: EngineState,
    /// The four in-memory collections (the truth)
    collections: Collections,
    /// When local state last reflected confirmed server state
    last_sync: Option<DateTime<Utc>>,
    /// Coalesces offline snapshot writes
    debouncer: SnapshotDebouncer,
}

impl ReconciliationEngine {
    /// Creates an engine for one signed-in user
    pub fn new(
        service: Arc<dyn IResourceService>,
        snapshots: Arc<dyn ISnapshotStore>,
        queue: Arc<dyn IMutationQueue>,
        monitor: Arc<dyn IConnectivityMonitor>,
        user: UserKey,
        config: &Config,
    ) -> Self {
        Self {
            service,
            snapshots,
            queue,
            monitor,
            user,
            state: EngineState::Uninitialized,
            collections: Collections::new(),
            last_sync: None,
            debouncer: SnapshotDebouncer::new(Duration::from_millis(config.snapshots.debounce_ms)),
        }
    }

    // --- Accessors ---

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The in-memory collections (read-only; mutate through intents)
    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    /// When local state last reflected confirmed server state
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }

    /// The owning principal this engine serves
    pub fn user(&self) -> &UserKey {
        &self.user
    }

    /// Point-in-time status summary
    pub async fn status(&self) -> EngineStatus {
        let queued_mutations = self.queue.len(&self.user).await.unwrap_or_else(|err| {
            warn!(error = %format!("{err:#}"), "Failed to read queue depth");
            0
        });
        EngineStatus {
            state: self.state,
            last_sync: self.last_sync,
            queued_mutations,
            has_local_data: !self.collections.is_empty(),
        }
    }

    // ========================================================================
    // Startup protocol
    // ========================================================================

    /// Runs the startup protocol for the signed-in user
    ///
    /// If online: health-probe the service, fetch all four collections,
    /// and overwrite the snapshot store with an authoritative snapshot.
    /// On any failure of that path — or when already offline — fall back
    /// to loading the last persisted snapshot verbatim. The fallback is
    /// deterministic: a fetch failure looks exactly like genuine offline
    /// status, except that an authentication failure is additionally
    /// surfaced after the fallback completes.
    pub async fn initialize(&mut self) -> Result<(), EngineError> {
        self.state.transition_to(EngineState::Loading)?;

        let online = self.monitor.is_online();
        info!(user = %self.user, online, "Starting engine");

        let mut auth_failure = None;
        if online {
            match self.refresh_from_remote().await {
                Ok(()) => {
                    self.enter_ready(Connectivity::Online);
                    info!(
                        entities = self.collections.len(),
                        "Startup fetch complete"
                    );
                    return Ok(());
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        "Startup fetch failed, falling back to local snapshot"
                    );
                    if err.is_auth() {
                        auth_failure = Some(err.to_string());
                    }
                }
            }
        }

        self.load_local_snapshot().await;
        self.enter_ready(if online {
            Connectivity::Online
        } else {
            Connectivity::Offline
        });

        match auth_failure {
            Some(message) => Err(EngineError::AuthRequired(message)),
            None => Ok(()),
        }
    }

    fn enter_ready(&mut self, connectivity: Connectivity) {
        // Loading -> Ready is always legal
        self.state = EngineState::Ready {
            connectivity,
            activity: Activity::Idle,
        };
    }

    /// Health-probe, fetch all collections, and persist authoritatively
    async fn refresh_from_remote(&mut self) -> Result<(), ServiceError> {
        self.service.health_check().await?;
        let fetched = self.fetch_all().await?;
        self.collections = fetched.without_pending();
        self.last_sync = Some(Utc::now());
        self.persist_authoritative().await;
        Ok(())
    }

    /// Fetches the four collections concurrently
    async fn fetch_all(&self) -> Result<Collections, ServiceError> {
        let (cards, accounts, transactions, budgets) = tokio::try_join!(
            self.service.list_cards(),
            self.service.list_accounts(),
            self.service.list_transactions(),
            self.service.list_budgets(),
        )?;
        Ok(Collections {
            cards,
            accounts,
            transactions,
            budgets,
        })
    }

    /// Loads the persisted snapshot verbatim; no data yields empty state
    async fn load_local_snapshot(&mut self) {
        match self.snapshots.load(&self.user).await {
            Ok(Some(snapshot)) => {
                info!(
                    entities = snapshot.collections.len(),
                    pending_sync = snapshot.pending_sync,
                    "Loaded local snapshot"
                );
                self.collections = snapshot.collections;
                self.last_sync = snapshot.last_sync;
            }
            Ok(None) => {
                info!(user = %self.user, "No local snapshot, starting empty");
                self.collections = Collections::new();
                self.last_sync = None;
            }
            Err(err) => {
                error!(
                    error = %format!("{err:#}"),
                    "Failed to load local snapshot, starting empty"
                );
                self.collections = Collections::new();
                self.last_sync = None;
            }
        }
    }

    // ========================================================================
    // Mutation application protocol
    // ========================================================================

    /// Applies one mutation through the full protocol
    ///
    /// In-memory application happens unconditionally and synchronously;
    /// the durability path depends on connectivity.
    pub async fn submit(&mut self, mutation: Mutation) -> Result<(), EngineError> {
        let EngineState::Ready { connectivity, .. } = self.state else {
            return Err(EngineError::NotReady(self.state.to_string()));
        };

        // Step 1: optimistic in-memory application. A mistargeted
        // mutation is rejected here, before any durability work.
        self.collections.apply(&mutation)?;
        debug!(mutation = %mutation, "Applied optimistically");

        match connectivity {
            Connectivity::Offline => {
                self.enqueue(&mutation).await?;
                self.debouncer.touch();
                Ok(())
            }
            Connectivity::Online => {
                // Best-effort durability before the attempt; failure is
                // logged and does not roll anything back.
                self.persist_authoritative().await;

                match self.push_remote(&mutation).await {
                    Ok(()) => Ok(()),
                    Err(err) if err.is_queueable() => {
                        warn!(
                            mutation = %mutation,
                            error = %err,
                            "Online attempt failed, queueing for replay"
                        );
                        self.enqueue(&mutation).await?;
                        if err.is_auth() {
                            Err(EngineError::AuthRequired(err.to_string()))
                        } else {
                            Ok(())
                        }
                    }
                    Err(err) => Err(EngineError::RemoteRejected(err.to_string())),
                }
            }
        }
    }

    async fn enqueue(&self, mutation: &Mutation) -> Result<(), EngineError> {
        let record = QueuedMutation::new(self.user.clone(), mutation.clone());
        self.queue.enqueue(&record).await.map_err(|err| {
            error!(
                mutation = %mutation,
                error = %format!("{err:#}"),
                "Failed to enqueue mutation"
            );
            EngineError::Storage(format!("failed to enqueue mutation: {err:#}"))
        })?;
        debug!(mutation = %mutation, "Queued for replay");
        Ok(())
    }

    /// Pushes one mutation to the remote service (the online branch)
    ///
    /// - add: POST, then replace the provisional entity with the server's
    ///   copy and persist the corrected snapshot;
    /// - update: PATCH; a non-queueable failure rolls the optimistic
    ///   update back by removing the entity (documented asymmetry — adds
    ///   and deletes drift until the next refetch instead);
    /// - delete: DELETE, skipped entirely while the id is provisional.
    async fn push_remote(&mut self, mutation: &Mutation) -> Result<(), ServiceError> {
        match mutation {
            Mutation::AddCard(card) => {
                let confirmed = self.service.create_card(card).await?;
                self.reconcile_add(card.id().clone(), |collections, id| {
                    collections.replace_card(id, confirmed)
                })
                .await
            }
            Mutation::AddAccount(account) => {
                let confirmed = self.service.create_account(account).await?;
                self.reconcile_add(account.id().clone(), |collections, id| {
                    collections.replace_account(id, confirmed)
                })
                .await
            }
            Mutation::AddTransaction(tx) => {
                let confirmed = self.service.create_transaction(tx).await?;
                self.reconcile_add(tx.id().clone(), |collections, id| {
                    collections.replace_transaction(id, confirmed)
                })
                .await
            }
            Mutation::AddBudget(budget) => {
                let confirmed = self.service.create_budget(budget).await?;
                self.reconcile_add(budget.id().clone(), |collections, id| {
                    collections.replace_budget(id, confirmed)
                })
                .await
            }

            Mutation::UpdateCard { id, updates } => {
                let outcome = self.service.update_card(id, updates).await;
                self.finish_update(outcome, Mutation::DeleteCard { id: id.clone() })
                    .await
            }
            Mutation::UpdateAccount { id, updates } => {
                let outcome = self.service.update_account(id, updates).await;
                self.finish_update(outcome, Mutation::DeleteAccount { id: id.clone() })
                    .await
            }
            Mutation::UpdateTransaction { id, updates } => {
                let outcome = self.service.update_transaction(id, updates).await;
                self.finish_update(outcome, Mutation::DeleteTransaction { id: id.clone() })
                    .await
            }
            Mutation::UpdateBudget { id, updates } => {
                let outcome = self.service.update_budget(id, updates).await;
                self.finish_update(outcome, Mutation::DeleteBudget { id: id.clone() })
                    .await
            }

            Mutation::DeleteCard { id } => {
                if Self::skip_pending_delete(id) {
                    return Ok(());
                }
                self.service.delete_card(id).await
            }
            Mutation::DeleteAccount { id } => {
                if Self::skip_pending_delete(id) {
                    return Ok(());
                }
                self.service.delete_account(id).await
            }
            Mutation::DeleteTransaction { id } => {
                if Self::skip_pending_delete(id) {
                    return Ok(());
                }
                self.service.delete_transaction(id).await
            }
            Mutation::DeleteBudget { id } => {
                if Self::skip_pending_delete(id) {
                    return Ok(());
                }
                self.service.delete_budget(id).await
            }
        }
    }

    /// A provisional id was never seen by the server; its delete has no
    /// remote counterpart.
    fn skip_pending_delete(id: &EntityId) -> bool {
        if id.is_pending() {
            debug!(id = %id, "Skipping remote delete of never-synced entity");
            true
        } else {
            false
        }
    }

    /// Replaces a confirmed add's provisional entity and persists the
    /// corrected snapshot
    async fn reconcile_add(
        &mut self,
        pending_id: EntityId,
        replace: impl FnOnce(&mut Collections, &EntityId) -> bool,
    ) -> Result<(), ServiceError> {
        if replace(&mut self.collections, &pending_id) {
            debug!(id = %pending_id, "Provisional entity replaced with server copy");
        } else {
            // already superseded by a refetch; nothing to correct
            debug!(id = %pending_id, "Provisional entity no longer present");
        }
        self.persist_authoritative().await;
        Ok(())
    }

    /// Applies the update rollback policy to a PATCH outcome
    ///
    /// `rollback` is the removal mutation that undoes the optimistic
    /// update when the server rejects it.
    async fn finish_update(
        &mut self,
        outcome: Result<(), ServiceError>,
        rollback: Mutation,
    ) -> Result<(), ServiceError> {
        match outcome {
            Ok(()) => Ok(()),
            Err(err) if err.is_queueable() => Err(err),
            Err(err) => {
                warn!(
                    resource = rollback.resource().name(),
                    id = %rollback.target_id(),
                    error = %err,
                    "Update rejected by server, rolling back by removal"
                );
                if let Err(remove_err) = self.collections.apply(&rollback) {
                    debug!(error = %remove_err, "Rollback target already gone");
                }
                self.persist_authoritative().await;
                Err(err)
            }
        }
    }

    // ========================================================================
    // Connectivity transitions and queue replay
    // ========================================================================

    /// Feeds a stable connectivity transition into the engine
    ///
    /// The offline→online edge triggers one replay cycle; the reverse
    /// edge only switches the durability path future mutations take.
    /// Duplicate notifications of the current state are ignored, so the
    /// replay fires exactly once per transition.
    pub async fn set_connectivity(
        &mut self,
        online: bool,
    ) -> Result<Option<ReplayReport>, EngineError> {
        let EngineState::Ready {
            connectivity,
            activity,
        } = self.state
        else {
            debug!(online, "Connectivity event before ready, ignoring");
            return Ok(None);
        };

        match (connectivity, online) {
            (Connectivity::Offline, true) => {
                info!("Connectivity restored, starting reconciliation");
                self.state = EngineState::Ready {
                    connectivity: Connectivity::Online,
                    activity,
                };
                self.synchronize().await.map(Some)
            }
            (Connectivity::Online, false) => {
                info!("Connectivity lost, mutations will queue");
                self.state = EngineState::Ready {
                    connectivity: Connectivity::Offline,
                    activity,
                };
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    /// Replays the queue and refetches authoritative state
    ///
    /// A replay failure is logged and counted but does not halt the
    /// drain. The queue is cleared only once the refetch has been
    /// applied; if the refetch itself fails, the queue is left intact
    /// for a later retry and the error is surfaced.
    pub async fn synchronize(&mut self) -> Result<ReplayReport, EngineError> {
        let EngineState::Ready {
            connectivity: Connectivity::Online,
            ..
        } = self.state
        else {
            return Err(EngineError::NotReady(self.state.to_string()));
        };

        self.set_activity(Activity::Syncing);

        let ops = match self.queue.drain(&self.user).await {
            Ok(ops) => ops,
            Err(err) => {
                self.set_activity(Activity::Idle);
                return Err(EngineError::Storage(format!(
                    "failed to drain mutation queue: {err:#}"
                )));
            }
        };

        info!(count = ops.len(), "Replaying queued mutations");

        let mut report = ReplayReport::default();
        for op in &ops {
            match self.push_remote(&op.mutation).await {
                Ok(()) => {
                    debug!(mutation = %op.mutation, "Replayed");
                    report.replayed += 1;
                }
                Err(err) => {
                    warn!(
                        mutation = %op.mutation,
                        error = %err,
                        "Replay failed, continuing with remaining operations"
                    );
                    report.failed += 1;
                }
            }
        }

        // One authoritative refetch; anything still provisional never
        // confirmed and must not pollute the authoritative view.
        match self.fetch_all().await {
            Ok(fetched) => {
                self.collections = fetched.without_pending();
                self.last_sync = Some(Utc::now());
                self.persist_authoritative().await;
            }
            Err(err) => {
                warn!(error = %err, "Post-replay refetch failed, queue left intact");
                self.set_activity(Activity::Idle);
                return Err(EngineError::SyncFailed(err.to_string()));
            }
        }

        if let Err(err) = self.queue.clear(&self.user).await {
            error!(
                error = %format!("{err:#}"),
                "Failed to clear mutation queue after replay"
            );
        }

        self.set_activity(Activity::Idle);

        info!(
            replayed = report.replayed,
            failed = report.failed,
            "Reconciliation complete"
        );

        Ok(report)
    }

    fn set_activity(&mut self, activity: Activity) {
        if let EngineState::Ready { connectivity, .. } = self.state {
            self.state = EngineState::Ready {
                connectivity,
                activity,
            };
        }
    }

    // ========================================================================
    // Card / account / budget intents
    // ========================================================================

    /// Adds a card (the entity carries its provisional id)
    pub async fn add_card(&mut self, card: Card) -> Result<(), EngineError> {
        self.submit(Mutation::AddCard(card)).await
    }

    /// Updates a card by id
    pub async fn update_card(
        &mut self,
        id: EntityId,
        updates: CardPatch,
    ) -> Result<(), EngineError> {
        self.submit(Mutation::UpdateCard { id, updates }).await
    }

    /// Deletes a card by id
    pub async fn delete_card(&mut self, id: EntityId) -> Result<(), EngineError> {
        self.submit(Mutation::DeleteCard { id }).await
    }

    /// Adds an account
    pub async fn add_account(&mut self, account: Account) -> Result<(), EngineError> {
        self.submit(Mutation::AddAccount(account)).await
    }

    /// Updates an account by id
    pub async fn update_account(
        &mut self,
        id: EntityId,
        updates: AccountPatch,
    ) -> Result<(), EngineError> {
        self.submit(Mutation::UpdateAccount { id, updates }).await
    }

    /// Deletes an account by id
    pub async fn delete_account(&mut self, id: EntityId) -> Result<(), EngineError> {
        self.submit(Mutation::DeleteAccount { id }).await
    }

    /// Adds a budget
    pub async fn add_budget(&mut self, budget: Budget) -> Result<(), EngineError> {
        self.submit(Mutation::AddBudget(budget)).await
    }

    /// Updates a budget by id
    pub async fn update_budget(
        &mut self,
        id: EntityId,
        updates: BudgetPatch,
    ) -> Result<(), EngineError> {
        self.submit(Mutation::UpdateBudget { id, updates }).await
    }

    /// Deletes a budget by id
    pub async fn delete_budget(&mut self, id: EntityId) -> Result<(), EngineError> {
        self.submit(Mutation::DeleteBudget { id }).await
    }

    /// Upserts the budget for a category
    ///
    /// Updates the existing budget when one exists, otherwise creates
    /// one — preserving the one-budget-per-category invariant.
    pub async fn set_budget_for_category(
        &mut self,
        category: &str,
        limit: Decimal,
    ) -> Result<(), EngineError> {
        let existing = self
            .collections
            .budgets
            .iter()
            .find(|b| b.category() == category)
            .map(|b| b.id().clone());

        match existing {
            Some(id) => {
                let updates = BudgetPatch {
                    limit: Some(limit),
                    updated_at: Some(Utc::now()),
                };
                self.submit(Mutation::UpdateBudget { id, updates }).await
            }
            None => {
                let budget = Budget::new(category, limit).map_err(EngineError::Domain)?;
                self.submit(Mutation::AddBudget(budget)).await
            }
        }
    }

    /// Removes the budget for a category
    pub async fn remove_budget(&mut self, category: &str) -> Result<(), EngineError> {
        let id = self
            .collections
            .budgets
            .iter()
            .find(|b| b.category() == category)
            .map(|b| b.id().clone())
            .ok_or_else(|| DomainError::UnknownEntity {
                resource: "budget",
                id: category.to_string(),
            })?;
        self.submit(Mutation::DeleteBudget { id }).await
    }

    // ========================================================================
    // Transaction intents (two-step scripts)
    // ========================================================================

    /// Records a transaction and adjusts its funding source
    ///
    /// Explicit two-step script: adjust the source balance, then record
    /// the transaction. If the source is not live in memory the whole
    /// script is rejected and no partial effect is applied.
    pub async fn add_transaction(&mut self, tx: Transaction) -> Result<(), EngineError> {
        let adjust = self.source_adjustment(
            tx.source_id(),
            tx.source_kind(),
            balance::addition_delta(tx.amount(), tx.direction()),
        )?;

        self.submit(adjust).await?;
        self.submit(Mutation::AddTransaction(tx)).await
    }

    /// Edits a transaction and adjusts its funding source by the net delta
    pub async fn update_transaction(
        &mut self,
        id: EntityId,
        updates: TransactionPatch,
    ) -> Result<(), EngineError> {
        let (source_id, source_kind, delta) = {
            let tx = self
                .collections
                .transactions
                .iter()
                .find(|t| t.id() == &id)
                .ok_or_else(|| DomainError::UnknownEntity {
                    resource: "transaction",
                    id: id.to_wire(),
                })?;
            let new_amount = updates.amount.unwrap_or(tx.amount());
            let new_direction = updates.direction.unwrap_or(tx.direction());
            (
                tx.source_id().clone(),
                tx.source_kind(),
                balance::update_delta(tx.amount(), tx.direction(), new_amount, new_direction),
            )
        };

        let adjust = self.source_adjustment(&source_id, source_kind, delta)?;

        self.submit(adjust).await?;
        self.submit(Mutation::UpdateTransaction { id, updates }).await
    }

    /// Deletes a transaction, reversing its effect on the funding source
    pub async fn delete_transaction(&mut self, id: EntityId) -> Result<(), EngineError> {
        let (source_id, source_kind, delta) = {
            let tx = self
                .collections
                .transactions
                .iter()
                .find(|t| t.id() == &id)
                .ok_or_else(|| DomainError::UnknownEntity {
                    resource: "transaction",
                    id: id.to_wire(),
                })?;
            (
                tx.source_id().clone(),
                tx.source_kind(),
                balance::removal_delta(tx.amount(), tx.direction()),
            )
        };

        let adjust = self.source_adjustment(&source_id, source_kind, delta)?;

        self.submit(adjust).await?;
        self.submit(Mutation::DeleteTransaction { id }).await
    }

    /// Builds the source-balance update mutation for a derived delta
    ///
    /// The mutation always targets the existing (stable) source id, so
    /// queue replay never needs to re-resolve a provisional id.
    fn source_adjustment(
        &self,
        source_id: &EntityId,
        source_kind: SourceKind,
        delta: Decimal,
    ) -> Result<Mutation, EngineError> {
        let source = self
            .collections
            .find_source(source_id, source_kind)
            .ok_or_else(|| DomainError::UnknownSource(source_id.to_wire()))?;
        let new_balance = source.balance() + delta;

        Ok(match source_kind {
            SourceKind::Card => Mutation::UpdateCard {
                id: source_id.clone(),
                updates: CardPatch::with_balance(new_balance),
            },
            SourceKind::Account => Mutation::UpdateAccount {
                id: source_id.clone(),
                updates: AccountPatch::with_balance(new_balance),
            },
        })
    }

    // ========================================================================
    // Snapshot persistence
    // ========================================================================

    /// Persists an authoritative snapshot (pending ids discarded)
    ///
    /// Failures are logged and never roll back in-memory state: the
    /// store is a cache, not the system of record.
    async fn persist_authoritative(&self) {
        let snapshot = Snapshot::authoritative(&self.collections, self.last_sync);
        if let Err(err) = self.snapshots.save(&self.user, &snapshot).await {
            error!(
                error = %format!("{err:#}"),
                "Snapshot save failed; in-memory state unaffected"
            );
        }
    }

    /// Persists an optimistic snapshot (pending ids retained)
    async fn persist_optimistic(&self) {
        let snapshot = Snapshot::optimistic(&self.collections, self.last_sync);
        if let Err(err) = self.snapshots.save(&self.user, &snapshot).await {
            error!(
                error = %format!("{err:#}"),
                "Snapshot save failed; in-memory state unaffected"
            );
        }
    }

    /// Flushes the debounced optimistic save once its quiet window elapses
    ///
    /// Called periodically by the driver loop; a no-op while clean or
    /// still inside the window.
    pub async fn flush_pending_snapshot(&mut self) {
        if self.debouncer.take_if_settled() {
            self.persist_optimistic().await;
        }
    }

    /// Flushes any pending save immediately (shutdown path)
    pub async fn flush_now(&mut self) {
        if self.debouncer.take() {
            self.persist_optimistic().await;
        }
    }

    // ========================================================================
    // Snapshot reload and data reset
    // ========================================================================

    /// Forces a re-read of the persisted snapshot into memory
    pub async fn reload_from_snapshot(&mut self) -> Result<(), EngineError> {
        if !self.state.is_ready() {
            return Err(EngineError::NotReady(self.state.to_string()));
        }
        self.load_local_snapshot().await;
        Ok(())
    }

    /// Clears all local state for the user (logout / data reset)
    ///
    /// Resets memory, removes the snapshot and the queued mutations, and
    /// returns the engine to `Uninitialized`.
    pub async fn clear_all_data(&mut self) -> Result<(), EngineError> {
        self.collections = Collections::new();
        self.last_sync = None;
        // reset is legal from every state
        self.state = EngineState::Uninitialized;

        self.snapshots
            .clear(&self.user)
            .await
            .map_err(|err| EngineError::Storage(format!("failed to clear snapshot: {err:#}")))?;
        self.queue
            .clear(&self.user)
            .await
            .map_err(|err| EngineError::Storage(format!("failed to clear queue: {err:#}")))?;

        info!(user = %self.user, "All local data cleared");
        Ok(())
    }

    // ========================================================================
    // Derived read views
    // ========================================================================

    /// Sum of expense amounts per category
    pub fn expenses_by_category(&self) -> std::collections::HashMap<String, Decimal> {
        views::expenses_by_category(&self.collections)
    }

    /// Total expenses in the given calendar month
    pub fn monthly_expenses(&self, year: i32, month: u32) -> Decimal {
        views::monthly_expenses(&self.collections, year, month)
    }

    /// Total income in the given calendar month
    pub fn monthly_income(&self, year: i32, month: u32) -> Decimal {
        views::monthly_income(&self.collections, year, month)
    }

    /// Sum of all card and account balances
    pub fn total_balance(&self) -> Decimal {
        views::total_balance(&self.collections)
    }

    /// Transactions in display order (date desc, created-at desc)
    pub fn transaction_feed(&self) -> Vec<&Transaction> {
        views::transaction_feed(&self.collections)
    }

    /// Budgets joined with their categories' spending
    pub fn budget_progress(&self) -> Vec<views::BudgetStatus<'_>> {
        views::budget_progress(&self.collections)
    }
}
