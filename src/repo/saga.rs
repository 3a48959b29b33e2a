//! Compensation log for a single `put`.
//!
//! Every contract a `put` gets signed is recorded here. If the `put` fails
//! afterwards, contracts whose bytes this `put` wrote are cancelled so the
//! provider drops them. Contracts for bytes the provider already held are
//! left alone: other files may reference the same content address.

use crate::negotiation::AcceptedContract;
use futures::future::join_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Accepted,
    Written,
    AlreadyHeld,
}

#[derive(Debug, Default)]
pub(crate) struct PutSaga {
    entries: Vec<(AcceptedContract, Step)>,
}

impl PutSaga {
    pub(crate) fn accepted(&mut self, contracts: &[AcceptedContract]) {
        self.entries
            .extend(contracts.iter().cloned().map(|c| (c, Step::Accepted)));
    }

    pub(crate) fn written(&mut self, contract: &AcceptedContract) {
        self.mark(contract, Step::Written);
    }

    pub(crate) fn already_held(&mut self, contract: &AcceptedContract) {
        self.mark(contract, Step::AlreadyHeld);
    }

    fn mark(&mut self, contract: &AcceptedContract, step: Step) {
        if let Some(entry) = self.entries.iter_mut().find(|(c, s)| {
            *s == Step::Accepted
                && c.provider.peer.id == contract.provider.peer.id
                && c.contract.block_id == contract.contract.block_id
        }) {
            entry.1 = step;
        }
    }

    /// Contracts whose bytes would be dropped by `unwind`.
    #[cfg(test)]
    pub(crate) fn pending_cancels(&self) -> usize {
        self.entries.iter().filter(|(_, s)| *s == Step::Written).count()
    }

    /// Best-effort cancellation. Failures are logged, never returned.
    pub(crate) async fn unwind(self) {
        let (written, rest): (Vec<_>, Vec<_>) = self
            .entries
            .into_iter()
            .partition(|(_, step)| *step == Step::Written);
        for (accepted, step) in &rest {
            tracing::debug!(
                block_id = %accepted.contract.block_id,
                provider = %accepted.provider.peer.id,
                ?step,
                "releasing contract without cancel"
            );
        }

        let cancels = written.iter().map(|(accepted, _)| async move {
            if let Err(e) = accepted.link().cancel(&accepted.contract).await {
                tracing::warn!(
                    block_id = %accepted.contract.block_id,
                    provider = %accepted.provider.peer.id,
                    error = %e,
                    "failed to cancel contract"
                );
            }
        });
        join_all(cancels).await;
        tracing::info!(cancelled = written.len(), "unwound failed put");
    }
}
