//! Payload keeper.
//!
//! Plays the payload operator: reports the amounts the bridge actually
//! delivered for inbound deposits, then processes every reconciled payload.
//! Payloads whose bridge tokens have not arrived are left for a later tick.

use serde::Serialize;
use tracing::{debug, info, warn};
use vaultbridge_core::{Address, Payload, PayloadStatus, U256};
use vaultbridge_state::Call;

use crate::network::Network;

/// Outcome of one keeper pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeeperReport {
    /// Deposits whose actual amounts were reported.
    pub reconciled: usize,
    /// Payloads processed.
    pub processed: usize,
    /// Payloads waiting on the bridge.
    pub waiting: usize,
    /// Calls rejected for reasons a retry cannot fix.
    pub failed: usize,
}

impl KeeperReport {
    /// Add another report's counts to this one.
    pub fn merge(&mut self, other: &KeeperReport) {
        self.reconciled += other.reconciled;
        self.processed += other.processed;
        self.waiting += other.waiting;
        self.failed += other.failed;
    }

    /// Whether the pass changed anything.
    pub fn made_progress(&self) -> bool {
        self.reconciled + self.processed > 0
    }
}

/// Payload operator driving every chain of a network.
#[derive(Debug, Clone)]
pub struct Keeper {
    operator: Address,
}

impl Keeper {
    /// Keeper acting as `operator`, which must hold the payload operator role.
    pub fn new(operator: Address) -> Self {
        Self { operator }
    }

    pub fn operator(&self) -> Address {
        self.operator
    }

    /// One pass over every chain's open payloads.
    pub fn tick(&self, network: &mut Network) -> KeeperReport {
        let mut report = KeeperReport::default();
        for chain_id in network.chain_ids() {
            let open: Vec<Payload> = match network.chain(chain_id) {
                Ok(state) => state.open_payloads().into_iter().cloned().collect(),
                Err(_) => continue,
            };
            for payload in open {
                match payload.status {
                    PayloadStatus::AwaitingReconciliation => {
                        self.reconcile(network, &payload, &mut report)
                    }
                    PayloadStatus::Reconciled | PayloadStatus::PendingTransport => {
                        self.process(network, &payload, &mut report)
                    }
                    PayloadStatus::Processed => {}
                }
            }
        }
        if report.made_progress() {
            info!(
                reconciled = report.reconciled,
                processed = report.processed,
                waiting = report.waiting,
                "keeper pass"
            );
        }
        report
    }

    fn reconcile(&self, network: &mut Network, payload: &Payload, report: &mut KeeperReport) {
        let actual_amounts = match delivered_amounts(network, payload) {
            Some(amounts) => amounts,
            None => {
                debug!(payload_id = payload.id, "no bridge receipt yet");
                report.waiting += 1;
                return;
            }
        };
        let update = Call::UpdateState { payload_id: payload.id, actual_amounts };
        match network.call(payload.dst_chain, self.operator, U256::zero(), update) {
            Ok(_) => report.reconciled += 1,
            Err(e) => {
                warn!(payload_id = payload.id, error = %e, "update rejected");
                report.failed += 1;
            }
        }
    }

    fn process(&self, network: &mut Network, payload: &Payload, report: &mut KeeperReport) {
        let process = Call::ProcessPayload { payload_id: payload.id, aux_data: Vec::new() };
        match network.call(payload.dst_chain, self.operator, U256::zero(), process) {
            Ok(_) => report.processed += 1,
            Err(e) if e.is_retryable() => {
                debug!(payload_id = payload.id, error = %e, "waiting for bridge tokens");
                report.waiting += 1;
            }
            Err(e) => {
                warn!(payload_id = payload.id, error = %e, "processing rejected");
                report.failed += 1;
            }
        }
    }
}

/// Declared amounts scaled by what the bridge delivered for the payload's
/// transfer. None until the transfer has landed.
fn delivered_amounts(network: &Network, payload: &Payload) -> Option<Vec<U256>> {
    let transfer_id = payload.liquidity_transfer?;
    let receipt = network.receipt(payload.src_chain, transfer_id)?;
    if receipt.sent.is_zero() {
        return None;
    }
    payload
        .declared_amounts
        .iter()
        .map(|declared| declared.mul_div_floor(receipt.delivered, receipt.sent))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_merge() {
        let mut total = KeeperReport::default();
        assert!(!total.made_progress());
        total.merge(&KeeperReport { reconciled: 1, processed: 2, waiting: 3, failed: 0 });
        total.merge(&KeeperReport { reconciled: 0, processed: 1, waiting: 0, failed: 1 });
        assert_eq!(total, KeeperReport { reconciled: 1, processed: 3, waiting: 3, failed: 1 });
        assert!(total.made_progress());
    }
}
