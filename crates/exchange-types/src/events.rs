//! Event types for inter-service communication.
//!
//! Events flow through an in-process event bus so that components can
//! react to order lifecycle changes without being coupled to the engine.

use crate::{Order, OrderState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted by the order engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEvent {
	/// A new order has been created in its initial state.
	Created { order: Order },
	/// An order has moved to a new state.
	Transitioned {
		order_id: String,
		from: OrderState,
		to: OrderState,
		at: DateTime<Utc>,
	},
	/// An order sat in a state past that state's time-to-live.
	StateExpired {
		order_id: String,
		state: OrderState,
	},
	/// A follow-up could not be scheduled after a committed write.
	///
	/// The state change itself already took effect; this event exists so
	/// the failure can be alerted on.
	FollowUpScheduleFailed {
		order_id: String,
		state: OrderState,
		error: String,
	},
}
