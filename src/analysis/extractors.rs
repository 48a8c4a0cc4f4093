//! Chain and Wallet Extraction
//!
//! Single-pass scans pulling the chain id and wallet-provider identity out
//! of wallet-provider call steps. Absence is a normal outcome, never an
//! error.

use crate::recording::session::wallet_calls;
use crate::recording::types::Step;

/// First chain id found in the sequence: an explicit chain id attached to a
/// wallet call, or the hex-decoded result of a chain-id query.
pub fn extract_chain_id(steps: &[Step]) -> Option<u64> {
    for (_, call) in wallet_calls(steps) {
        if let Some(chain) = call.chain_id {
            return Some(chain);
        }
        if call.is_chain_query() {
            if let Some(chain) = call.result_chain_id() {
                return Some(chain);
            }
        }
    }
    None
}

/// First wallet-provider identity found in the sequence.
pub fn extract_wallet_name(steps: &[Step]) -> Option<String> {
    wallet_calls(steps).find_map(|(_, call)| call.wallet.clone())
}
