//! Order operation handlers.
//!
//! Each handler orchestrates one inbound operation over the service
//! boundaries: creation prices and persists a new order, shipping
//! captures fulfillment details and the fee, and follow-up reacts to
//! fired expiration schedules.

pub mod creation;
pub mod follow_up;
pub mod shipping;
