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

mod memory;

use std::collections::BTreeMap;

use perp_types::{ClobPairId, OrderId, PendingOpenOrder, SubaccountId, UpdateResult};
use serde::{Deserialize, Serialize};

pub use memory::{MemoryCollateralizationCheck, MemoryFillLedger, MemoryPositionLedger};

/// Collateralization oracle - the margin boundary of the matching engine
///
/// The engine never evaluates margin itself; for every prospective fill it
/// hands the oracle the full set of pending open-order deltas of the
/// subaccounts involved and acts on the classification it gets back.
///
/// Key semantic constraints:
/// - Called synchronously from inside the matching loop
/// - Must not call back into the engine
/// - A failed check is a normal outcome, not an error
/// - Must be deterministic for identical inputs so replay reproduces state
pub trait CollateralizationCheck: Send {
	/// Classify every subaccount in `pending`
	///
	/// `pending` maps each subaccount to all of its pending open orders,
	/// including the fill under consideration. Subaccounts absent from the
	/// returned map are treated as `UpdateCausedError`.
	fn check(
		&mut self,
		pending: &BTreeMap<SubaccountId, Vec<PendingOpenOrder>>,
	) -> BTreeMap<SubaccountId, UpdateResult>;

	/// Check whether a single order could be added to the book
	fn add_order_check(
		&mut self,
		subaccount_id: &SubaccountId,
		order: &PendingOpenOrder,
	) -> UpdateResult {
		let mut pending = BTreeMap::new();
		pending.insert(subaccount_id.clone(), vec![order.clone()]);
		self.check(&pending)
			.get(subaccount_id)
			.copied()
			.unwrap_or(UpdateResult::UpdateCausedError)
	}
}

/// Committed fill amount of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillRecord {
	pub fill_amount: u64,
	/// Block height after which the record may be pruned
	pub prunable_block_height: u32,
}

/// Fill-amount ledger - committed fills tracked outside the engine
///
/// The engine adds its own pending fills on top of the committed amount;
/// `record_fill` is a notification for the ledger's owner and must not
/// change what `get_fill` returns before the fill is committed.
pub trait FillLedger: Send {
	/// Committed fill of `order_id`, if the ledger has seen the order
	fn get_fill(&self, order_id: &OrderId) -> Option<FillRecord>;

	/// Notify the ledger of an additional optimistic fill
	fn record_fill(&mut self, order_id: &OrderId, fill_amount: u64);
}

/// Position ledger - committed signed positions
pub trait PositionLedger: Send {
	/// Signed position size in base quantums, positive for long
	fn position(&self, subaccount_id: &SubaccountId, clob_pair_id: ClobPairId) -> i128;
}
