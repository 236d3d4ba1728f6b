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

use std::collections::{BTreeMap, HashMap};

use perp_types::{LiquidationOrder, MakerFill, Order, OrderHash, OrderId, RemovalReason};
use serde::{Deserialize, Serialize};

/// One state transition performed by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
	ShortTermOrderPlacement(Order),
	StatefulOrderPlacement(Order),
	Match {
		taker: OrderId,
		fills: Vec<MakerFill>,
	},
	/// Logged even without fills so that the attempt is visible
	LiquidationMatch {
		liquidation: LiquidationOrder,
		fills: Vec<MakerFill>,
	},
	OrderRemoval {
		order_id: OrderId,
		reason: RemovalReason,
	},
	ShortTermCancellation {
		order_id: OrderId,
		good_til_block: u32,
	},
}

/// Operations log - the replayable record of everything the engine did
///
/// The log is append-only between clears. Feeding its operations back
/// through the engine in order reproduces the book it was built from.
///
/// Characteristics:
/// - Owned buffer, independent of the books it describes
/// - Short-term orders keep their exact encoded bytes, keyed by hash
/// - Remembers the last matched version of every order id
#[derive(Debug, Clone, Default)]
pub struct OperationsLog {
	operations: Vec<Operation>,
	short_term_order_bytes: BTreeMap<OrderHash, Vec<u8>>,
	matched_orders: HashMap<OrderId, Order>,
}

impl OperationsLog {
	pub fn new() -> Self {
		Self::default()
	}

	/// Log the placement of a short-term order with its encoded bytes
	pub fn add_short_term_placement(&mut self, order: Order, bytes: Vec<u8>) {
		order.order_id.must_be_short_term();
		self.short_term_order_bytes.insert(order.hash(), bytes);
		self.operations
			.push(Operation::ShortTermOrderPlacement(order));
	}

	pub fn add_stateful_placement(&mut self, order: Order) {
		order.order_id.must_be_stateful();
		self.operations
			.push(Operation::StatefulOrderPlacement(order));
	}

	pub fn add_match(&mut self, taker: OrderId, fills: Vec<MakerFill>) {
		if fills.is_empty() {
			panic!("add_match: match of taker {} has no fills", taker);
		}
		self.operations.push(Operation::Match { taker, fills });
	}

	pub fn add_liquidation_match(&mut self, liquidation: LiquidationOrder, fills: Vec<MakerFill>) {
		self.operations
			.push(Operation::LiquidationMatch { liquidation, fills });
	}

	pub fn add_removal(&mut self, order_id: OrderId, reason: RemovalReason) {
		self.operations
			.push(Operation::OrderRemoval { order_id, reason });
	}

	pub fn add_cancellation(&mut self, order_id: OrderId, good_til_block: u32) {
		order_id.must_be_short_term();
		self.operations.push(Operation::ShortTermCancellation {
			order_id,
			good_til_block,
		});
	}

	/// Remember `order` as the latest version that took part in a match
	pub fn record_matched(&mut self, order: &Order) {
		self.matched_orders
			.insert(order.order_id.clone(), order.clone());
	}

	pub fn matched_order(&self, order_id: &OrderId) -> Option<&Order> {
		self.matched_orders.get(order_id)
	}

	pub fn operations(&self) -> &[Operation] {
		&self.operations
	}

	pub fn short_term_order_bytes(&self) -> &BTreeMap<OrderHash, Vec<u8>> {
		&self.short_term_order_bytes
	}

	pub fn len(&self) -> usize {
		self.operations.len()
	}

	pub fn is_empty(&self) -> bool {
		self.operations.is_empty()
	}

	pub fn clear(&mut self) {
		self.operations.clear();
		self.short_term_order_bytes.clear();
		self.matched_orders.clear();
	}
}
