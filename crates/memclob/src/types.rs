// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use perp_types::{ClobPairId, Order, OrderId, OrderStatus};
use thiserror::Error;

use crate::event::OffchainUpdates;

/// Expected business outcomes of engine calls
///
/// Invariant violations are not represented here; they panic.
#[derive(Debug, Error)]
pub enum ClobError {
	#[error("Invalid order side")]
	InvalidOrderSide,
	#[error("Invalid order: {0}")]
	InvalidOrder(String),
	#[error("Invalid replacement: {0}")]
	InvalidReplacement(String),
	#[error("Order is canceled")]
	OrderIsCanceled,
	#[error("Order is fully filled")]
	OrderFullyFilled,
	#[error("Reduce-only order would increase position size")]
	ReduceOnlyWouldIncreasePositionSize,
	#[error("Immediate execution order is already filled")]
	ImmediateExecutionOrderAlreadyFilled,
	#[error("Post-only order would cross one or more maker orders")]
	PostOnlyWouldCrossMakerOrder,
	#[error("Fill-or-kill order could not be fully filled")]
	FokOrderCouldNotBeFullyFilled,
	#[error("Cancellation already exists")]
	CancelAlreadyExists,
	#[error("Clob pair {0} is not a perpetual market")]
	NonPerpetualClobPair(ClobPairId),
	#[error("Index price is zero")]
	ZeroIndexPrice,
	#[error("Premium vote cap {0} does not fit in i32")]
	PremiumCapOverflow(u64),
	#[error("Arithmetic overflow")]
	ArithmeticOverflow,
	#[error("Orderbook not found: {0}")]
	OrderbookNotFound(ClobPairId),
	#[error("Replay of {len} operations exceeds limit of {max}")]
	ReplayTooLong { len: usize, max: usize },
	#[error("Encoding error: {0}")]
	Encoding(#[from] serde_json::Error),
}

/// Result of a placement that was accepted for matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrderResult {
	/// Quantums filled during this call
	pub filled_quantums: u64,
	pub status: OrderStatus,
	pub offchain_updates: OffchainUpdates,
}

/// Failed placement
///
/// Maker removals found while matching still took effect, so their
/// notifications travel with the error.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct PlaceOrderError {
	pub kind: ClobError,
	pub offchain_updates: OffchainUpdates,
}

impl PlaceOrderError {
	pub fn new(kind: ClobError) -> Self {
		Self {
			kind,
			offchain_updates: OffchainUpdates::new(),
		}
	}
}

impl From<ClobError> for PlaceOrderError {
	fn from(kind: ClobError) -> Self {
		Self::new(kind)
	}
}

/// Midpoint of a book together with the orders defining it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidPrice {
	pub subticks: u64,
	pub best_bid: Order,
	pub best_ask: Order,
}

/// Orders invalidated by newly committed state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeRequest {
	/// Block height being committed; short-term orders and cancels
	/// expiring at this height are dropped
	pub block_height: u32,
	pub fully_filled_order_ids: Vec<OrderId>,
	pub expired_stateful_order_ids: Vec<OrderId>,
	pub canceled_stateful_order_ids: Vec<OrderId>,
	pub removed_stateful_order_ids: Vec<OrderId>,
}
