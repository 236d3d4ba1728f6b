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

use serde::{Deserialize, Serialize};

use crate::{ClobPairId, OrderId};

/// Quantity filled against one maker order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakerFill {
	pub maker_order_id: OrderId,
	pub fill_amount: u64,
}

/// Exposure delta submitted to the collateralization check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOpenOrder {
	pub remaining_quantums: u64,
	pub is_buy: bool,
	pub subticks: u64,
	pub clob_pair_id: ClobPairId,
}

/// Outcome of a collateralization check for one subaccount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateResult {
	Success,
	NewlyUndercollateralized,
	StillUndercollateralized,
	UpdateCausedError,
}

impl UpdateResult {
	pub fn is_success(&self) -> bool {
		*self == UpdateResult::Success
	}

	/// Taker status reported when a check fails with this result
	pub fn to_order_status(self) -> OrderStatus {
		match self {
			UpdateResult::Success => OrderStatus::Success,
			UpdateResult::UpdateCausedError => OrderStatus::InternalError,
			UpdateResult::NewlyUndercollateralized | UpdateResult::StillUndercollateralized => {
				OrderStatus::Undercollateralized
			}
		}
	}
}

/// Result status of a taker order after matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
	Success,
	Undercollateralized,
	InternalError,
	ImmediateOrCancelWouldRestOnBook,
	ReduceOnlyResized,
	PostOnlyWouldCrossMakerOrder,
}

impl OrderStatus {
	pub fn is_success(&self) -> bool {
		*self == OrderStatus::Success
	}
}

/// Reason an order was removed from the book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
	Replaced,
	UserCanceled,
	Expired,
	FullyFilled,
	SelfTrade,
	InvalidReduceOnly,
	Undercollateralized,
	PostOnlyWouldCrossMakerOrder,
	FillOrKillNotFullyFilled,
	ImmediateOrCancelWouldRest,
	/// Committed state removed a stateful order
	CommittedRemoval,
	InternalError,
}

impl RemovalReason {
	/// Removal reason reported for a taker that ended with `status`
	pub fn from_status(status: OrderStatus) -> Self {
		match status {
			OrderStatus::Success => RemovalReason::FullyFilled,
			OrderStatus::Undercollateralized => RemovalReason::Undercollateralized,
			OrderStatus::InternalError => RemovalReason::InternalError,
			OrderStatus::ImmediateOrCancelWouldRestOnBook => {
				RemovalReason::ImmediateOrCancelWouldRest
			}
			OrderStatus::ReduceOnlyResized => RemovalReason::InvalidReduceOnly,
			OrderStatus::PostOnlyWouldCrossMakerOrder => {
				RemovalReason::PostOnlyWouldCrossMakerOrder
			}
		}
	}
}
