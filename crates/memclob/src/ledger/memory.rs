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

use std::{
	collections::{BTreeMap, HashMap},
	sync::{Arc, Mutex, MutexGuard},
};

use perp_types::{ClobPairId, OrderId, PendingOpenOrder, SubaccountId, UpdateResult};

use super::{CollateralizationCheck, FillLedger, FillRecord, PositionLedger};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct CollateralState {
	/// Results returned on every call for these subaccounts
	always: HashMap<SubaccountId, UpdateResult>,
	/// Results returned only on the n-th call (0-based)
	scripted: HashMap<usize, HashMap<SubaccountId, UpdateResult>>,
	calls: usize,
}

/// In-memory collateralization oracle
///
/// Every subaccount is sufficiently collateralized unless a failure has
/// been programmed for it. Clones share state, so a test can keep a handle
/// after boxing one into the engine.
///
/// Characteristics:
/// - Deterministic: results depend only on programmed failures and call count
/// - Scripted failures mirror "the n-th check fails for subaccount X"
#[derive(Debug, Clone, Default)]
pub struct MemoryCollateralizationCheck {
	state: Arc<Mutex<CollateralState>>,
}

impl MemoryCollateralizationCheck {
	pub fn new() -> Self {
		Self::default()
	}

	/// Return `result` for `subaccount_id` on every call
	pub fn set_result(&self, subaccount_id: SubaccountId, result: UpdateResult) {
		lock(&self.state).always.insert(subaccount_id, result);
	}

	/// Return `result` for `subaccount_id` on the `call`-th check only
	pub fn set_result_on_call(&self, call: usize, subaccount_id: SubaccountId, result: UpdateResult) {
		lock(&self.state)
			.scripted
			.entry(call)
			.or_default()
			.insert(subaccount_id, result);
	}

	/// Number of `check` calls made so far
	pub fn calls(&self) -> usize {
		lock(&self.state).calls
	}
}

impl CollateralizationCheck for MemoryCollateralizationCheck {
	fn check(
		&mut self,
		pending: &BTreeMap<SubaccountId, Vec<PendingOpenOrder>>,
	) -> BTreeMap<SubaccountId, UpdateResult> {
		let mut state = lock(&self.state);
		let call = state.calls;
		state.calls += 1;

		pending
			.keys()
			.map(|subaccount_id| {
				let result = state
					.scripted
					.get(&call)
					.and_then(|results| results.get(subaccount_id))
					.or_else(|| state.always.get(subaccount_id))
					.copied()
					.unwrap_or(UpdateResult::Success);
				(subaccount_id.clone(), result)
			})
			.collect()
	}
}

#[derive(Debug, Default)]
struct FillState {
	committed: HashMap<OrderId, FillRecord>,
	recorded: Vec<(OrderId, u64)>,
}

/// In-memory fill-amount ledger
///
/// Committed fills are only changed through `commit_fill`; optimistic
/// fills reported by the engine are kept as a notification trail.
#[derive(Debug, Clone, Default)]
pub struct MemoryFillLedger {
	state: Arc<Mutex<FillState>>,
}

impl MemoryFillLedger {
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the committed fill amount of an order
	pub fn commit_fill(&self, order_id: OrderId, fill_amount: u64, prunable_block_height: u32) {
		lock(&self.state).committed.insert(
			order_id,
			FillRecord {
				fill_amount,
				prunable_block_height,
			},
		);
	}

	/// Every `record_fill` notification received, in order
	pub fn recorded_fills(&self) -> Vec<(OrderId, u64)> {
		lock(&self.state).recorded.clone()
	}
}

impl FillLedger for MemoryFillLedger {
	fn get_fill(&self, order_id: &OrderId) -> Option<FillRecord> {
		lock(&self.state).committed.get(order_id).copied()
	}

	fn record_fill(&mut self, order_id: &OrderId, fill_amount: u64) {
		lock(&self.state)
			.recorded
			.push((order_id.clone(), fill_amount));
	}
}

/// In-memory position ledger
#[derive(Debug, Clone, Default)]
pub struct MemoryPositionLedger {
	positions: Arc<Mutex<HashMap<(SubaccountId, ClobPairId), i128>>>,
}

impl MemoryPositionLedger {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set_position(&self, subaccount_id: SubaccountId, clob_pair_id: ClobPairId, size: i128) {
		lock(&self.positions).insert((subaccount_id, clob_pair_id), size);
	}
}

impl PositionLedger for MemoryPositionLedger {
	fn position(&self, subaccount_id: &SubaccountId, clob_pair_id: ClobPairId) -> i128 {
		lock(&self.positions)
			.get(&(subaccount_id.clone(), clob_pair_id))
			.copied()
			.unwrap_or(0)
	}
}
