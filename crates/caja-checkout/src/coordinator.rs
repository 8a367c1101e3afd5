//! The commit state machine.
//!
//! [`CommitCoordinator::commit`] drives one [`SaleDraft`] through the
//! sequence described in the crate docs: authoritative stock validation,
//! then header, lines, and guarded stock decrements, with compensation
//! when a write fails partway. Every storage call is bounded by the
//! coordinator's io timeout, and the write sequence runs on its own task
//! so a cancelled caller cannot leave a half-written sale behind.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use caja_core::{CoreError, SaleDraft, Session};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{CheckoutError, CheckoutResult, StockViolation};
use crate::port::{BackendError, CheckoutStore, DecrementOutcome};

const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

// ===== Stages =====

/// Where a commit attempt stands. Terminal stages are `Completed`,
/// `Aborted`, and `FailedPartial`; the rest mark the last write that
/// succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitStage {
    Pending,
    StockValidated,
    HeaderWritten,
    LinesWritten,
    StockApplied,
    Completed,
    Aborted,
    FailedPartial,
}

impl std::fmt::Display for CommitStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CommitStage::Pending => "preparation",
            CommitStage::StockValidated => "stock validation",
            CommitStage::HeaderWritten => "header write",
            CommitStage::LinesWritten => "line write",
            CommitStage::StockApplied => "stock apply",
            CommitStage::Completed => "completion",
            CommitStage::Aborted => "abort",
            CommitStage::FailedPartial => "compensation",
        };
        f.write_str(name)
    }
}

/// Proof of a completed commit, ready for the receipt printer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReceipt {
    pub sale_id: String,
    pub total_cents: i64,
    pub profit_cents: i64,
    pub item_count: i64,
    pub completed_at: DateTime<Utc>,
}

// ===== Coordinator =====

/// Commits sale drafts for one session.
///
/// One coordinator per open session; it admits a single commit at a time
/// and rejects overlapping attempts with [`CheckoutError::CommitInFlight`]
/// instead of queueing them.
///
/// ## Example
///
/// ```rust,ignore
/// let coordinator = CommitCoordinator::new(Arc::new(store), session);
/// let draft = build_sale(&cart, coordinator.session())?;
/// let receipt = coordinator.commit(draft).await?;
/// ```
pub struct CommitCoordinator<S> {
    store: Arc<S>,
    session: Session,
    io_timeout: Duration,
    in_flight: Arc<tokio::sync::Mutex<()>>,
}

impl<S: CheckoutStore + 'static> CommitCoordinator<S> {
    pub fn new(store: Arc<S>, session: Session) -> Self {
        CommitCoordinator {
            store,
            session,
            io_timeout: DEFAULT_IO_TIMEOUT,
            in_flight: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Overrides the per-step io timeout (10 seconds unless set).
    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Commits a draft. On success the sale is durably placed: header and
    /// lines stored, stock decremented.
    ///
    /// Up to and including stock validation nothing has been written and
    /// dropping this future cancels cleanly. From the first write onward
    /// the sequence runs on a spawned task and always finishes, with
    /// compensation unwinding whatever was already written if a step
    /// fails. A failed commit never leaves a completed sale behind.
    pub async fn commit(&self, draft: SaleDraft) -> CheckoutResult<CommitReceipt> {
        let permit = self
            .in_flight
            .clone()
            .try_lock_owned()
            .map_err(|_| CheckoutError::CommitInFlight)?;

        if draft.lines.is_empty() {
            return Err(CheckoutError::Invalid(CoreError::EmptyCart));
        }
        if draft.header.branch_id != self.session.branch_id {
            return Err(CheckoutError::Invalid(CoreError::BranchMismatch {
                entity: "sale".into(),
                expected: self.session.branch_id.clone(),
                found: draft.header.branch_id.clone(),
            }));
        }

        debug!(sale_id = %draft.header.id, lines = draft.lines.len(), "commit started");
        self.validate_stock(&draft).await?;

        let store = Arc::clone(&self.store);
        let io_timeout = self.io_timeout;
        let handle = tokio::spawn(async move {
            let _permit = permit;
            write_phase(store, draft, io_timeout).await
        });
        match handle.await {
            Ok(result) => result,
            Err(join) => Err(CheckoutError::Internal(format!("commit task failed: {join}"))),
        }
    }

    /// Re-fetches authoritative stock and checks every line against it.
    /// The cart's own stock figures were only advisory; this read is what
    /// actually admits the draft to the write sequence.
    async fn validate_stock(&self, draft: &SaleDraft) -> CheckoutResult<()> {
        let product_ids: Vec<String> = draft
            .lines
            .iter()
            .map(|line| line.product_id.clone())
            .collect();
        let levels = timeout(
            self.io_timeout,
            self.store.stock_levels(&self.session.branch_id, &product_ids),
        )
        .await
        .map_err(|_| CheckoutError::BackendUnavailable("stock validation timed out".into()))?
        .map_err(|e| CheckoutError::BackendUnavailable(e.to_string()))?;

        let mut violations = Vec::new();
        for line in &draft.lines {
            // A product missing from the result is gone or deactivated,
            // which for a sale means zero available.
            let available = levels
                .iter()
                .find(|level| level.product_id == line.product_id)
                .map(|level| level.stock)
                .unwrap_or(0);
            if line.quantity > available {
                violations.push(StockViolation {
                    product_id: line.product_id.clone(),
                    sku: line.sku_snapshot.clone(),
                    requested: line.quantity,
                    available,
                });
            }
        }

        if violations.is_empty() {
            debug!(sale_id = %draft.header.id, "stock validated");
            Ok(())
        } else {
            info!(
                sale_id = %draft.header.id,
                violations = violations.len(),
                "commit aborted at stock validation"
            );
            Err(CheckoutError::StockExceeded { violations })
        }
    }
}

// ===== Write sequence =====

/// Bounds one storage call by the io timeout and flattens the outcome
/// into a reason string for `CommitIncomplete`.
async fn step<T>(
    io_timeout: Duration,
    what: &str,
    fut: impl Future<Output = Result<T, BackendError>>,
) -> Result<T, String> {
    match timeout(io_timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(format!("{what} failed: {e}")),
        Err(_) => Err(format!("{what} timed out")),
    }
}

async fn write_phase<S: CheckoutStore>(
    store: Arc<S>,
    draft: SaleDraft,
    io_timeout: Duration,
) -> CheckoutResult<CommitReceipt> {
    let sale_id = draft.header.id.clone();

    if let Err(reason) = step(io_timeout, "header write", store.insert_header(&draft.header)).await
    {
        let compensated = compensate(&*store, io_timeout, &sale_id, &[]).await;
        warn!(%sale_id, %reason, compensated, "commit failed writing header");
        return Err(CheckoutError::CommitIncomplete {
            sale_id,
            stage: CommitStage::HeaderWritten,
            compensated,
            reason,
        });
    }

    if let Err(reason) = step(io_timeout, "line write", store.insert_lines(&draft.lines)).await {
        let compensated = compensate(&*store, io_timeout, &sale_id, &[]).await;
        warn!(%sale_id, %reason, compensated, "commit failed writing lines");
        return Err(CheckoutError::CommitIncomplete {
            sale_id,
            stage: CommitStage::LinesWritten,
            compensated,
            reason,
        });
    }

    let mut applied: Vec<(String, i64)> = Vec::with_capacity(draft.lines.len());
    for line in &draft.lines {
        let outcome = step(
            io_timeout,
            "stock apply",
            store.apply_stock_decrement(&line.product_id, line.quantity),
        )
        .await;
        match outcome {
            Ok(DecrementOutcome::Applied) => {
                applied.push((line.product_id.clone(), line.quantity));
            }
            Ok(DecrementOutcome::Insufficient { available }) => {
                // Someone bought this stock between validation and here.
                // Undo everything and report it like a validation failure.
                let compensated = compensate(&*store, io_timeout, &sale_id, &applied).await;
                let violation = StockViolation {
                    product_id: line.product_id.clone(),
                    sku: line.sku_snapshot.clone(),
                    requested: line.quantity,
                    available,
                };
                info!(%sale_id, sku = %violation.sku, compensated, "stock race lost during commit");
                return Err(if compensated {
                    CheckoutError::StockExceeded {
                        violations: vec![violation],
                    }
                } else {
                    CheckoutError::CommitIncomplete {
                        sale_id,
                        stage: CommitStage::StockApplied,
                        compensated: false,
                        reason: format!("lost stock race for {}", violation.sku),
                    }
                });
            }
            Err(reason) => {
                let compensated = compensate(&*store, io_timeout, &sale_id, &applied).await;
                warn!(%sale_id, %reason, compensated, "commit failed applying stock");
                return Err(CheckoutError::CommitIncomplete {
                    sale_id,
                    stage: CommitStage::StockApplied,
                    compensated,
                    reason,
                });
            }
        }
    }

    info!(
        %sale_id,
        total_cents = draft.header.total_cents,
        item_count = draft.header.item_count,
        "sale committed"
    );
    Ok(CommitReceipt {
        sale_id,
        total_cents: draft.header.total_cents,
        profit_cents: draft.header.profit_cents,
        item_count: draft.header.item_count,
        completed_at: Utc::now(),
    })
}

/// Unwinds a failed write sequence. Returns whether every undo landed.
///
/// Order matters: applied decrements come back first, then lines, then
/// the header, because the header cannot be deleted while lines still
/// reference it. A header that cannot be deleted is voided instead so it
/// never counts as a completed sale.
async fn compensate<S: CheckoutStore>(
    store: &S,
    io_timeout: Duration,
    sale_id: &str,
    applied: &[(String, i64)],
) -> bool {
    let mut ok = true;

    for (product_id, quantity) in applied.iter().rev() {
        if let Err(reason) = step(
            io_timeout,
            "stock restore",
            store.restore_stock(product_id, *quantity),
        )
        .await
        {
            warn!(%sale_id, %product_id, %reason, "compensation could not restore stock");
            ok = false;
        }
    }

    if let Err(reason) = step(io_timeout, "line delete", store.delete_lines(sale_id)).await {
        warn!(%sale_id, %reason, "compensation could not delete lines");
        ok = false;
    }

    if let Err(reason) = step(io_timeout, "header delete", store.delete_header(sale_id)).await {
        warn!(%sale_id, %reason, "compensation could not delete header, voiding it");
        ok = false;
        if let Err(reason) = step(io_timeout, "header void", store.void_header(sale_id)).await {
            warn!(%sale_id, %reason, "compensation could not void header");
        }
    }

    ok
}

// =============================================================================
// Unit Tests
// =============================================================================
