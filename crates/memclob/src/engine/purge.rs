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

use std::collections::BTreeSet;

use perp_types::{OrderId, RemovalReason};
use tracing::{debug, error, info};

use super::{MemClob, removal};
use crate::{
	event::{OffchainUpdates, RemovalStatus},
	types::PurgeRequest,
};

impl MemClob {
	/// Remove a resting order because committed state invalidated it
	///
	/// Returns false if the order was not resting.
	fn purge_order(&mut self, order_id: &OrderId, reason: RemovalReason, updates: &mut OffchainUpdates) -> bool {
		let Some(book) = self.orderbooks.get_mut(&order_id.clob_pair_id) else {
			return false;
		};
		if !book.has_order(order_id) {
			return false;
		}

		book.must_remove_order(order_id);
		self.operations.add_removal(order_id.clone(), reason);
		updates.push(removal(order_id, reason, RemovalStatus::Canceled));
		true
	}

	/// Drop state invalidated by a newly committed block
	///
	/// Fully filled orders are only removed if their committed fill amount
	/// covers the resting order; a short-term order the fill ledger has
	/// never seen is kept and reported. Short-term orders and cancellations expiring at
	/// `block_height` are dropped from every book.
	///
	/// Panics if a stateful id list contains a short-term order id.
	pub fn purge_invalid_state(&mut self, request: &PurgeRequest) -> OffchainUpdates {
		let mut updates = OffchainUpdates::new();
		let mut removed = 0usize;

		for order_id in &request.fully_filled_order_ids {
			let Some(quantums) = self.get_order(order_id).map(|order| order.quantums) else {
				continue;
			};
			let Some(record) = self.fill_ledger.get_fill(order_id) else {
				if order_id.is_short_term() {
					error!("Fully filled short-term order {} has no fill record", order_id);
				}
				continue;
			};
			// Pending fills are not added: a commit already includes them.
			let filled = record.fill_amount;
			if filled < quantums {
				debug!(
					"Keeping order {} reported as filled: {} of {} quantums",
					order_id, filled, quantums
				);
				continue;
			}
			if self.purge_order(order_id, RemovalReason::FullyFilled, &mut updates) {
				removed += 1;
			}
		}

		let canceled: BTreeSet<&OrderId> = request.canceled_stateful_order_ids.iter().collect();
		for order_id in canceled {
			order_id.must_be_stateful();
			if self.purge_order(order_id, RemovalReason::UserCanceled, &mut updates) {
				removed += 1;
			}
		}

		for order_id in &request.expired_stateful_order_ids {
			order_id.must_be_stateful();
			if self.purge_order(order_id, RemovalReason::Expired, &mut updates) {
				removed += 1;
			}
		}

		let expired: Vec<OrderId> = self
			.orderbooks
			.values()
			.flat_map(|book| book.orders_expiring_at(request.block_height))
			.collect();
		for order_id in &expired {
			if self.purge_order(order_id, RemovalReason::Expired, &mut updates) {
				removed += 1;
			}
		}

		for order_id in &request.removed_stateful_order_ids {
			order_id.must_be_stateful();
			if self.purge_order(order_id, RemovalReason::CommittedRemoval, &mut updates) {
				removed += 1;
			}
		}

		let cancels: usize = self
			.orderbooks
			.values_mut()
			.map(|book| book.cancels_mut().remove_all_at_block(request.block_height))
			.sum();

		self.last_purged_block = Some(
			self.last_purged_block
				.map_or(request.block_height, |last| last.max(request.block_height)),
		);

		info!(
			"Purged block {}: removed {} orders and {} cancellations",
			request.block_height, removed, cancels
		);
		self.offchain(updates)
	}
}
