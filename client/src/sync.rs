//! Mutation/refresh orchestration
//!
//! The sync controller coordinates writes against the remote store. It is
//! not a cache: after a successful mutation it always issues one full
//! refetch and hands the caller that snapshot wholesale, sidestepping
//! partial-update consistency bugs at the cost of an extra round trip.
//! Within one mutation the refetch is strictly sequenced after the write —
//! never issued speculatively.
//!
//! A cancellation token is threaded through both stages so a superseded
//! mutation can be abandoned before its refetch overwrites newer state.
//! Concurrent mutations are not queued or coalesced here; that discipline
//! stays with the caller.

use crate::api::{Mutation, RecordStore};
use crate::error::{ClientError, ClientResult};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::{debug, info};
use trackwell_shared::decode::ActivitySnapshot;
use trackwell_shared::record::ActivityKind;

// ============================================================================
// Cancellation
// ============================================================================

/// Sender half: cancel the operation(s) holding the paired token
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiver half, threaded through both stages of a mutation
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelToken {
    /// A token that can never fire, for fire-and-forget callers
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Resolve when cancelled; pend forever otherwise
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending::<()>().await;
        };
        let mut rx = rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            // Handle dropped without cancelling: cancellation can no
            // longer happen
            std::future::pending::<()>().await;
        }
    }
}

/// Create a linked cancel handle/token pair
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx: Some(rx) })
}

/// Race a stage against its cancellation token
async fn guarded<T, F>(token: &CancelToken, stage: F) -> ClientResult<T>
where
    F: Future<Output = ClientResult<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ClientError::Cancelled),
        result = stage => result,
    }
}

// ============================================================================
// Input validation
// ============================================================================

/// Upper bound on a single entry's value, per kind
fn max_value(kind: ActivityKind) -> f64 {
    match kind {
        // A single weigh-in, kg
        ActivityKind::Weight => 500.0,
        // A single drink, ml
        ActivityKind::WaterIntake => 10_000.0,
        // A single session, minutes
        ActivityKind::Exercise => 1_440.0,
    }
}

/// Validate user-authored mutation input before it goes on the wire
fn validate(mutation: &Mutation) -> ClientResult<()> {
    let draft = match mutation {
        Mutation::Create(draft) => draft,
        Mutation::Update { id, draft } => {
            if *id <= 0 {
                return Err(ClientError::Validation(
                    "Cannot update a record without a valid id".to_string(),
                ));
            }
            draft
        }
        Mutation::Delete { id, .. } => {
            if *id <= 0 {
                return Err(ClientError::Validation(
                    "Cannot delete a record without a valid id".to_string(),
                ));
            }
            return Ok(());
        }
    };

    if !draft.value.is_finite() {
        return Err(ClientError::Validation(
            "Value must be a valid number".to_string(),
        ));
    }
    if draft.value <= 0.0 {
        return Err(ClientError::Validation(
            "Value must be greater than 0".to_string(),
        ));
    }
    let max = max_value(draft.kind);
    if draft.value > max {
        return Err(ClientError::Validation(format!(
            "Value cannot exceed {} {}",
            max,
            draft.kind.default_unit()
        )));
    }
    Ok(())
}

// ============================================================================
// Controller
// ============================================================================

/// Controller phase, observable by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    InFlight,
}

/// Coordinates mutations and the follow-up refetch against a record store
pub struct SyncController<S: RecordStore> {
    store: S,
    in_flight: AtomicBool,
}

impl<S: RecordStore> SyncController<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn phase(&self) -> SyncPhase {
        if self.in_flight.load(Ordering::SeqCst) {
            SyncPhase::InFlight
        } else {
            SyncPhase::Idle
        }
    }

    /// Fetch a fresh snapshot without mutating anything
    pub async fn refresh(&self, cancel: &CancelToken) -> ClientResult<ActivitySnapshot> {
        guarded(cancel, self.store.fetch()).await
    }

    /// Apply one mutation, then fetch and return the authoritative snapshot
    ///
    /// On any failure the error is returned without touching caller state;
    /// the previous snapshot stays valid until the next successful refresh.
    pub async fn mutate(
        &self,
        mutation: Mutation,
        cancel: &CancelToken,
    ) -> ClientResult<ActivitySnapshot> {
        validate(&mutation)?;
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        self.in_flight.store(true, Ordering::SeqCst);
        let result = self.run(&mutation, cancel).await;
        self.in_flight.store(false, Ordering::SeqCst);

        match &result {
            Ok(_) => info!(
                action = mutation.action_name(),
                kind = %mutation.kind(),
                "mutation applied and state refreshed"
            ),
            Err(err) => debug!(
                action = mutation.action_name(),
                kind = %mutation.kind(),
                error = %err,
                "mutation failed"
            ),
        }
        result
    }

    async fn run(&self, mutation: &Mutation, cancel: &CancelToken) -> ClientResult<ActivitySnapshot> {
        // Stage 1: the write. The response snapshot is only an ack.
        guarded(cancel, self.store.apply(mutation)).await?;

        // Cancellation point between stages: once cancelled, the refetch
        // must not race a newer operation's completion.
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        // Stage 2: exactly one full refetch, strictly after the write.
        guarded(cancel, self.store.fetch()).await
    }
}
