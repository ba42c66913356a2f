//! Order state machine and TTL tables.

mod order;

pub use order::{next_state, OrderStateMachine, StateTtls};
