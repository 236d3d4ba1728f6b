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

use std::collections::BTreeMap;

use perp_types::{Order, OrderHash};
use tracing::{debug, info, warn};

use super::{MemClob, removal};
use crate::{
	event::{OffchainUpdates, RemovalStatus},
	operations::Operation,
	orderbook::Orderbook,
	types::ClobError,
};

impl MemClob {
	/// Whether a block has already been purged
	fn is_purged(&self, good_til_block: Option<u32>) -> bool {
		match (self.last_purged_block, good_til_block) {
			(Some(purged), Some(block)) => purged >= block,
			_ => false,
		}
	}

	/// Operations logged since the last replay, with short-term order bytes
	pub fn get_operations_to_replay(&self) -> (Vec<Operation>, BTreeMap<OrderHash, Vec<u8>>) {
		(
			self.operations.operations().to_vec(),
			self.operations.short_term_order_bytes().clone(),
		)
	}

	/// Rebuild every book from scratch by re-running `operations`
	///
	/// All books, cancellations, pending fills and the log are reset, then
	/// each operation is fed back through the public entry points in order.
	/// Short-term placements and cancellations whose block was already
	/// purged are skipped, as are business failures of individual
	/// operations. The regenerated log replaces the old one.
	///
	/// Panics if a short-term placement has no bytes or its bytes decode
	/// to a different order.
	pub fn clear_and_replay(
		&mut self,
		operations: Vec<Operation>,
		short_term_order_bytes: BTreeMap<OrderHash, Vec<u8>>,
	) -> Result<OffchainUpdates, ClobError> {
		let max = self.config.max_replay_operations;
		if operations.len() > max {
			return Err(ClobError::ReplayTooLong {
				len: operations.len(),
				max,
			});
		}

		for (clob_pair_id, clob_pair) in &self.clob_pairs {
			self.orderbooks.insert(*clob_pair_id, Orderbook::new(clob_pair));
		}
		self.pending.clear();
		self.operations.clear();

		let total = operations.len();
		let mut skipped = 0usize;
		let mut updates = OffchainUpdates::new();

		for operation in operations {
			match operation {
				Operation::ShortTermOrderPlacement(order) => {
					let hash = order.hash();
					let Some(bytes) = short_term_order_bytes.get(&hash) else {
						panic!("clear_and_replay: no bytes for short-term order {} ({})", order.order_id, hash);
					};
					let decoded = match Order::decode(bytes) {
						Ok(decoded) => decoded,
						Err(e) => panic!("clear_and_replay: bytes of order {} do not decode: {}", hash, e),
					};
					if decoded != order {
						panic!("clear_and_replay: bytes of order {} decode to a different order", hash);
					}
					if self.is_purged(decoded.good_til_block()) {
						skipped += 1;
						continue;
					}
					match self.place_order(decoded) {
						Ok(result) => updates.append(result.offchain_updates),
						Err(e) => {
							debug!("Replay of order {} failed: {}", order.order_id, e);
							updates.append(e.offchain_updates);
							skipped += 1;
						}
					}
				}
				Operation::StatefulOrderPlacement(order) => {
					let order_id = order.order_id.clone();
					match self.place_order(order) {
						Ok(result) => updates.append(result.offchain_updates),
						Err(e) => {
							debug!("Replay of order {} failed: {}", order_id, e);
							updates.append(e.offchain_updates);
							skipped += 1;
						}
					}
				}
				Operation::ShortTermCancellation {
					order_id,
					good_til_block,
				} => {
					if self.is_purged(Some(good_til_block)) {
						skipped += 1;
						continue;
					}
					match self.cancel_order(&order_id, good_til_block) {
						Ok(cancel_updates) => updates.append(cancel_updates),
						Err(e) => {
							debug!("Replay of cancel {} failed: {}", order_id, e);
							skipped += 1;
						}
					}
				}
				Operation::LiquidationMatch { liquidation, .. } => match self.place_liquidation(liquidation) {
					Ok(result) => updates.append(result.offchain_updates),
					Err(e) => {
						warn!("Replay of liquidation failed: {}", e);
						updates.append(e.offchain_updates);
						skipped += 1;
					}
				},
				Operation::OrderRemoval { order_id, reason } => {
					let Some(book) = self.orderbooks.get_mut(&order_id.clob_pair_id) else {
						skipped += 1;
						continue;
					};
					if !book.has_order(&order_id) {
						skipped += 1;
						continue;
					}
					book.must_remove_order(&order_id);
					self.operations.add_removal(order_id.clone(), reason);
					updates.push(removal(&order_id, reason, RemovalStatus::BestEffortCanceled));
				}
				// Regenerated by the placement that produced it.
				Operation::Match { .. } => {}
			}
		}

		info!(
			"Replayed {} operations ({} skipped), log now holds {}",
			total,
			skipped,
			self.operations.len()
		);
		Ok(self.offchain(updates))
	}
}
