//! Epsilon-greedy strategy bandit.
//!
//! Each strategy template is an arm. The agent explores a uniformly random
//! arm with probability `epsilon`, otherwise exploits the arm with the best
//! average reward so far. Policy state lives behind a [`PolicyStore`] so it
//! survives restarts; the agent re-reads it on every call and writes it back
//! after every mutation.
//!
//! The agent provides no cross-call atomicity. Concurrent callers must share
//! a store that serializes `load`/`save` pairs.

pub mod agent;
pub mod policy;
pub mod store;

pub use agent::{BanditAgent, BanditConfig, BanditError, BanditReport, BanditResult, ReportRow};
pub use agent::{Selection, SelectionMode};
pub use policy::{PolicyState, TemplateStat, DEFAULT_EPSILON};
pub use store::{JsonFilePolicyStore, MemoryPolicyStore, PolicyStore, StoreError, StoreResult};
