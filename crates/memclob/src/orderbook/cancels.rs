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

use std::collections::{BTreeMap, BTreeSet, HashMap};

use perp_types::OrderId;

/// Short-term order cancellations of one trading pair
///
/// Holds `OrderId -> good til block` and the reverse index used to drop
/// every cancellation of a block once that block is committed. Only
/// short-term order ids are accepted.
#[derive(Debug, Clone, Default)]
pub struct CancelIndex {
	order_id_to_expiry: HashMap<OrderId, u32>,
	expiry_to_order_ids: BTreeMap<u32, BTreeSet<OrderId>>,
}

impl CancelIndex {
	pub fn new() -> Self {
		Self::default()
	}

	/// Good til block of the cancellation for `order_id`, if any
	pub fn get(&self, order_id: &OrderId) -> Option<u32> {
		self.order_id_to_expiry.get(order_id).copied()
	}

	/// Record a cancellation
	///
	/// Panics if `order_id` is stateful or already has a cancellation.
	pub fn add(&mut self, order_id: OrderId, good_til_block: u32) {
		order_id.must_be_short_term();
		if self.order_id_to_expiry.contains_key(&order_id) {
			panic!("CancelIndex::add: cancellation for {} already exists", order_id);
		}

		let ids = self.expiry_to_order_ids.entry(good_til_block).or_default();
		if !ids.insert(order_id.clone()) {
			panic!(
				"CancelIndex::add: {} already indexed at block {}",
				order_id, good_til_block
			);
		}
		self.order_id_to_expiry.insert(order_id, good_til_block);
	}

	/// Remove an existing cancellation
	///
	/// Panics if there is no cancellation for `order_id`.
	pub fn remove(&mut self, order_id: &OrderId) {
		let Some(good_til_block) = self.order_id_to_expiry.remove(order_id) else {
			panic!("CancelIndex::remove: no cancellation for {}", order_id);
		};

		let Some(ids) = self.expiry_to_order_ids.get_mut(&good_til_block) else {
			panic!(
				"CancelIndex::remove: block {} missing from expiry index",
				good_til_block
			);
		};
		if !ids.remove(order_id) {
			panic!(
				"CancelIndex::remove: {} missing from expiry index at block {}",
				order_id, good_til_block
			);
		}
		if ids.is_empty() {
			self.expiry_to_order_ids.remove(&good_til_block);
		}
	}

	/// Drop every cancellation expiring at `block`
	///
	/// Returns the number of cancellations removed.
	pub fn remove_all_at_block(&mut self, block: u32) -> usize {
		let Some(ids) = self.expiry_to_order_ids.remove(&block) else {
			return 0;
		};
		for id in &ids {
			self.order_id_to_expiry.remove(id);
		}
		ids.len()
	}

	pub fn len(&self) -> usize {
		self.order_id_to_expiry.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order_id_to_expiry.is_empty()
	}

	/// All cancellations sorted by order id
	pub fn entries(&self) -> Vec<(OrderId, u32)> {
		let mut entries: Vec<_> = self
			.order_id_to_expiry
			.iter()
			.map(|(id, block)| (id.clone(), *block))
			.collect();
		entries.sort();
		entries
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use perp_types::{ClobPairId, OrderFlags, SubaccountId};

	fn create_test_order_id(client_id: u32, order_flags: OrderFlags) -> OrderId {
		OrderId {
			subaccount_id: SubaccountId::new("alice", 0),
			client_id,
			order_flags,
			clob_pair_id: ClobPairId(0),
		}
	}

	#[test]
	fn test_add_get_remove() {
		let mut cancels = CancelIndex::new();
		let id = create_test_order_id(1, OrderFlags::ShortTerm);

		assert_eq!(cancels.get(&id), None);
		cancels.add(id.clone(), 20);
		assert_eq!(cancels.get(&id), Some(20));
		assert_eq!(cancels.len(), 1);

		cancels.remove(&id);
		assert_eq!(cancels.get(&id), None);
		assert!(cancels.is_empty());
		assert!(cancels.expiry_to_order_ids.is_empty());
	}

	#[test]
	fn test_remove_all_at_block() {
		let mut cancels = CancelIndex::new();
		cancels.add(create_test_order_id(1, OrderFlags::ShortTerm), 20);
		cancels.add(create_test_order_id(2, OrderFlags::ShortTerm), 20);
		cancels.add(create_test_order_id(3, OrderFlags::ShortTerm), 21);

		assert_eq!(cancels.remove_all_at_block(20), 2);
		assert_eq!(cancels.remove_all_at_block(20), 0);
		assert_eq!(cancels.len(), 1);
		assert_eq!(
			cancels.get(&create_test_order_id(3, OrderFlags::ShortTerm)),
			Some(21)
		);
	}

	#[test]
	#[should_panic(expected = "already exists")]
	fn test_duplicate_add_panics() {
		let mut cancels = CancelIndex::new();
		let id = create_test_order_id(1, OrderFlags::ShortTerm);
		cancels.add(id.clone(), 20);
		cancels.add(id, 21);
	}

	#[test]
	#[should_panic(expected = "no cancellation")]
	fn test_remove_missing_panics() {
		let mut cancels = CancelIndex::new();
		cancels.remove(&create_test_order_id(1, OrderFlags::ShortTerm));
	}

	#[test]
	#[should_panic(expected = "not a short-term order id")]
	fn test_stateful_cancel_panics() {
		let mut cancels = CancelIndex::new();
		cancels.add(create_test_order_id(1, OrderFlags::LongTerm), 20);
	}
}
