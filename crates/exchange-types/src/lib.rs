//! Common types module for the exchange system.
//!
//! This module defines the core data types and structures used throughout
//! the order exchange. It provides a centralized location for shared types
//! to ensure consistency across all components.

/// Catalog ("artwork") value objects validated at the service boundary.
pub mod artwork;
/// Event types for inter-service communication.
pub mod events;
/// Order aggregate types: orders, line items, state history.
pub mod order;

// Re-export all types for convenient access
pub use artwork::*;
pub use events::*;
pub use order::*;
