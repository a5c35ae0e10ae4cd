//! Ledger boundary: the governance-registry call surface the engine
//! depends on, plus the JSON-RPC gateway implementation and a scripted
//! mock for tests.

pub mod mock;
pub mod rpc;
pub mod traits;

pub use mock::MockLedgerClient;
pub use rpc::RpcLedgerClient;
pub use traits::{CommitHash, LedgerClient, LedgerError, LedgerResult, RegistryAddress, TxReceipt};
