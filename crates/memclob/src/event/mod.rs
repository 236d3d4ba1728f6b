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

use perp_types::{Order, OrderId, OrderStatus, RemovalReason};
use serde::{Deserialize, Serialize};

/// How final an order removal is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalStatus {
	/// Removed locally; the order may still be included by another proposer
	BestEffortCanceled,
	/// Removed because committed state says so
	Canceled,
}

/// Notification emitted towards downstream indexers
///
/// Updates describe book transitions as they happen; they are not needed
/// for correctness of the book and are produced only when enabled in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OffchainUpdate {
	/// Order was accepted for matching
	OrderPlace { order: Order },

	/// Total filled amount of an order changed
	OrderUpdate {
		order_id: OrderId,
		total_filled_quantums: u64,
	},

	/// Order left the book
	OrderRemove {
		order_id: OrderId,
		reason: RemovalReason,
		status: RemovalStatus,
		/// Taker status that caused the removal, if any
		order_status: Option<OrderStatus>,
	},
}

impl OffchainUpdate {
	/// Get the order_id this update refers to
	pub fn order_id(&self) -> &OrderId {
		match self {
			OffchainUpdate::OrderPlace { order } => &order.order_id,
			OffchainUpdate::OrderUpdate { order_id, .. } => order_id,
			OffchainUpdate::OrderRemove { order_id, .. } => order_id,
		}
	}

	/// Check if this update marks the order leaving the book
	pub fn is_removal(&self) -> bool {
		matches!(self, OffchainUpdate::OrderRemove { .. })
	}
}

/// Ordered batch of updates produced by one engine call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffchainUpdates {
	updates: Vec<OffchainUpdate>,
}

impl OffchainUpdates {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, update: OffchainUpdate) {
		self.updates.push(update);
	}

	pub fn append(&mut self, other: OffchainUpdates) {
		self.updates.extend(other.updates);
	}

	pub fn is_empty(&self) -> bool {
		self.updates.is_empty()
	}

	pub fn len(&self) -> usize {
		self.updates.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = &OffchainUpdate> {
		self.updates.iter()
	}

	/// Removal reasons reported for `order_id`, in emission order
	pub fn removal_reasons(&self, order_id: &OrderId) -> Vec<RemovalReason> {
		self.updates
			.iter()
			.filter_map(|update| match update {
				OffchainUpdate::OrderRemove {
					order_id: id,
					reason,
					..
				} if id == order_id => Some(*reason),
				_ => None,
			})
			.collect()
	}

	pub fn into_vec(self) -> Vec<OffchainUpdate> {
		self.updates
	}
}
