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

use perp_types::{ClobPairId, OrderId, PendingOpenOrder, SubaccountId};

use crate::ledger::{FillLedger, PositionLedger};

/// Uncommitted effects of matches made since the last replay
///
/// Fills and position changes made by the engine only reach the ledgers
/// once they are committed; until then they live here and are layered on
/// top of the committed values.
#[derive(Debug, Clone, Default)]
pub struct PendingState {
	fill_amounts: HashMap<OrderId, u64>,
	position_deltas: HashMap<(SubaccountId, ClobPairId), i128>,
	/// Exposure of every fill, per subaccount, in match order
	open_orders: BTreeMap<SubaccountId, Vec<PendingOpenOrder>>,
}

impl PendingState {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn fill_amount(&self, order_id: &OrderId) -> u64 {
		self.fill_amounts.get(order_id).copied().unwrap_or(0)
	}

	pub fn add_fill(&mut self, order_id: &OrderId, amount: u64) {
		*self.fill_amounts.entry(order_id.clone()).or_insert(0) += amount;
	}

	pub fn position_delta(&self, subaccount_id: &SubaccountId, clob_pair_id: ClobPairId) -> i128 {
		self.position_deltas
			.get(&(subaccount_id.clone(), clob_pair_id))
			.copied()
			.unwrap_or(0)
	}

	pub fn add_position_delta(&mut self, subaccount_id: &SubaccountId, clob_pair_id: ClobPairId, delta: i128) {
		*self
			.position_deltas
			.entry((subaccount_id.clone(), clob_pair_id))
			.or_insert(0) += delta;
	}

	pub fn open_orders(&self, subaccount_id: &SubaccountId) -> &[PendingOpenOrder] {
		self.open_orders
			.get(subaccount_id)
			.map(Vec::as_slice)
			.unwrap_or_default()
	}

	pub fn add_open_order(&mut self, subaccount_id: &SubaccountId, order: PendingOpenOrder) {
		self.open_orders
			.entry(subaccount_id.clone())
			.or_default()
			.push(order);
	}

	/// Committed fill plus pending fill of an order
	pub fn effective_fill(&self, ledger: &dyn FillLedger, order_id: &OrderId) -> u64 {
		let committed = ledger.get_fill(order_id).map(|r| r.fill_amount).unwrap_or(0);
		committed.saturating_add(self.fill_amount(order_id))
	}

	/// Committed position plus pending position change of a subaccount
	pub fn effective_position(
		&self,
		ledger: &dyn PositionLedger,
		subaccount_id: &SubaccountId,
		clob_pair_id: ClobPairId,
	) -> i128 {
		ledger.position(subaccount_id, clob_pair_id) + self.position_delta(subaccount_id, clob_pair_id)
	}

	pub fn clear(&mut self) {
		self.fill_amounts.clear();
		self.position_deltas.clear();
		self.open_orders.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ledger::{MemoryFillLedger, MemoryPositionLedger};
	use perp_types::OrderFlags;

	fn create_test_order_id(client_id: u32) -> OrderId {
		OrderId {
			subaccount_id: SubaccountId::new("alice", 0),
			client_id,
			order_flags: OrderFlags::ShortTerm,
			clob_pair_id: ClobPairId(0),
		}
	}

	#[test]
	fn test_effective_fill_layers_pending_on_committed() {
		let ledger = MemoryFillLedger::new();
		let mut state = PendingState::new();
		let order_id = create_test_order_id(1);

		assert_eq!(state.effective_fill(&ledger, &order_id), 0);

		ledger.commit_fill(order_id.clone(), 4, 20);
		state.add_fill(&order_id, 3);
		state.add_fill(&order_id, 2);
		assert_eq!(state.effective_fill(&ledger, &order_id), 9);
	}

	#[test]
	fn test_effective_position_and_clear() {
		let ledger = MemoryPositionLedger::new();
		let mut state = PendingState::new();
		let alice = SubaccountId::new("alice", 0);

		ledger.set_position(alice.clone(), ClobPairId(0), 10);
		state.add_position_delta(&alice, ClobPairId(0), -15);
		assert_eq!(state.effective_position(&ledger, &alice, ClobPairId(0)), -5);
		assert_eq!(state.effective_position(&ledger, &alice, ClobPairId(1)), 0);

		state.clear();
		assert_eq!(state.effective_position(&ledger, &alice, ClobPairId(0)), 10);
	}
}
