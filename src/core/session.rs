use crate::core::ledger::CostLedger;
use crate::core::snapshot::{FinancialSnapshotAssembler, SnapshotInputs};
use crate::domain::model::{
    CostLine, CostLineId, FinancialSnapshot, RoleId, SurchargeRates, UserRef,
};
use crate::domain::ports::CommissionBracketResolver;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// 單一專案編輯階段的可變狀態
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    pub ledger: CostLedger,
    pub rates: SurchargeRates,
    pub revenue: Decimal,
    pub role_id: Option<RoleId>,
    pub manual_commission_percent: Option<Decimal>,
    /// UI-only; never part of the snapshot inputs.
    pub notes: String,
}

impl EditorState {
    fn inputs(&self) -> SnapshotInputs {
        SnapshotInputs::new(
            &self.ledger,
            &self.rates,
            self.revenue,
            self.role_id.as_ref(),
            self.manual_commission_percent,
        )
    }
}

/// A solve attempt tagged with the sequence number it was issued under.
///
/// 未完成就被丟棄（例如 `refresh()` 被 `timeout` 或 `select!` 取消）時，
/// 會釋放單一求解的佔位，下一次 refresh 會重新求解同一組輸入。
#[derive(Debug)]
pub struct SolveTicket {
    sequence: u64,
    inputs: SnapshotInputs,
    sequencer: Arc<Mutex<Sequencer>>,
}

impl SolveTicket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl Drop for SolveTicket {
    fn drop(&mut self) {
        let mut sequencer = lock(&self.sequencer);
        if sequencer.in_flight == Some(self.sequence) {
            sequencer.in_flight = None;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recompute {
    Published(FinancialSnapshot),
    /// The inputs changed while this solve was running.
    Stale { sequence: u64 },
    /// Declared inputs equal the published ones, or a solve for them is
    /// already running.
    Unchanged,
}

#[derive(Debug, Default)]
struct Sequencer {
    issued: u64,
    published: u64,
    /// Sequence of the ticket solving the current inputs, if any.
    in_flight: Option<u64>,
    published_inputs: Option<SnapshotInputs>,
}

impl Sequencer {
    /// Any outstanding ticket becomes stale.
    fn supersede(&mut self) {
        self.issued += 1;
        self.in_flight = None;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 專案編輯階段。
///
/// 輸入改變後呼叫 [`ProjectSession::refresh`] 重新求解；同一組輸入不會重複
/// 求解。宣告輸入一旦改變，進行中的求解結果即作廢，不會覆蓋較新輸入產生的快照。
///
/// Lock order is always `state` then `sequencer`.
pub struct ProjectSession<R: CommissionBracketResolver> {
    project: String,
    assembler: FinancialSnapshotAssembler<R>,
    state: Mutex<EditorState>,
    sequencer: Arc<Mutex<Sequencer>>,
    snapshot_tx: watch::Sender<Option<FinancialSnapshot>>,
}

impl<R: CommissionBracketResolver> ProjectSession<R> {
    pub fn new(
        project: impl Into<String>,
        assembler: FinancialSnapshotAssembler<R>,
        state: EditorState,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(None);
        Self {
            project: project.into(),
            assembler,
            state: Mutex::new(state),
            sequencer: Arc::new(Mutex::new(Sequencer::default())),
            snapshot_tx,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Applies `change` and reports whether any declared snapshot input moved.
    /// When one did, the solve in flight (if any) can no longer publish.
    pub fn edit<F>(&self, change: F) -> bool
    where
        F: FnOnce(&mut EditorState),
    {
        let mut state = lock(&self.state);
        let before = state.inputs();
        change(&mut *state);
        let changed = state.inputs() != before;

        if changed {
            let mut sequencer = lock(&self.sequencer);
            if let Some(sequence) = sequencer.in_flight {
                tracing::debug!("{}: inputs changed, cancelling solve #{}", self.project, sequence);
            }
            sequencer.supersede();
        }
        changed
    }

    pub fn add_or_update_cost(&self, line: CostLine) -> bool {
        self.edit(|s| s.ledger.add_or_update(line))
    }

    pub fn remove_cost(&self, id: CostLineId) -> bool {
        self.edit(|s| {
            s.ledger.remove(id);
        })
    }

    pub fn set_applies_vat(&self, id: CostLineId, applies: bool) -> bool {
        self.edit(|s| {
            s.ledger.set_applies_vat(id, applies);
        })
    }

    pub fn set_applies_withholding(&self, id: CostLineId, applies: bool) -> bool {
        self.edit(|s| {
            s.ledger.set_applies_withholding(id, applies);
        })
    }

    /// Returns false when the cost line does not exist.
    pub fn approve_cost(&self, id: CostLineId, user: UserRef, at: DateTime<Utc>) -> bool {
        lock(&self.state).ledger.approve(id, user, at)
    }

    pub fn set_revenue(&self, revenue: Decimal) -> bool {
        self.edit(|s| s.revenue = revenue)
    }

    pub fn set_rates(&self, rates: SurchargeRates) -> bool {
        self.edit(|s| s.rates = rates)
    }

    pub fn set_role(&self, role_id: Option<RoleId>) -> bool {
        self.edit(|s| s.role_id = role_id)
    }

    pub fn set_manual_commission(&self, percent: Option<Decimal>) -> bool {
        self.edit(|s| s.manual_commission_percent = percent)
    }

    pub fn set_notes(&self, notes: impl Into<String>) -> bool {
        let notes = notes.into();
        self.edit(|s| s.notes = notes)
    }

    pub fn state(&self) -> EditorState {
        lock(&self.state).clone()
    }

    /// Issues a new sequence number for the current inputs, or `None` when
    /// they are already published or being solved.
    pub fn prepare(&self) -> Option<SolveTicket> {
        let state = lock(&self.state);
        let inputs = state.inputs();
        let mut sequencer = lock(&self.sequencer);

        if sequencer.in_flight.is_some() {
            return None;
        }
        if sequencer.published_inputs.as_ref() == Some(&inputs) {
            return None;
        }

        sequencer.issued += 1;
        sequencer.in_flight = Some(sequencer.issued);

        Some(SolveTicket {
            sequence: sequencer.issued,
            inputs,
            sequencer: Arc::clone(&self.sequencer),
        })
    }

    pub async fn complete(&self, ticket: SolveTicket) -> Recompute {
        let snapshot = self.assembler.assemble(&ticket.inputs).await;

        let mut sequencer = lock(&self.sequencer);
        if ticket.sequence != sequencer.issued || ticket.sequence <= sequencer.published {
            tracing::debug!(
                "{}: discarding stale solve #{} (latest #{})",
                self.project,
                ticket.sequence,
                sequencer.issued
            );
            return Recompute::Stale {
                sequence: ticket.sequence,
            };
        }

        sequencer.published = ticket.sequence;
        sequencer.in_flight = None;
        sequencer.published_inputs = Some(ticket.inputs.clone());
        self.snapshot_tx.send_replace(Some(snapshot.clone()));
        Recompute::Published(snapshot)
    }

    pub async fn refresh(&self) -> Recompute {
        match self.prepare() {
            Some(ticket) => self.complete(ticket).await,
            None => Recompute::Unchanged,
        }
    }

    /// Forgets the published inputs and cancels any running solve, so the
    /// next refresh solves again.
    pub fn invalidate(&self) {
        let mut sequencer = lock(&self.sequencer);
        sequencer.supersede();
        sequencer.published_inputs = None;
    }

    pub fn current(&self) -> Option<FinancialSnapshot> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<FinancialSnapshot>> {
        self.snapshot_tx.subscribe()
    }
}
