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

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::{ClobPairId, SubaccountId};

/// Order side (buy or sell)
///
/// `Unspecified` only exists so that malformed orders can be represented
/// and rejected by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
	Unspecified,
	Buy,
	Sell,
}

/// Lifetime class of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderFlags {
	/// Short-lived order, expires at a block height
	ShortTerm,
	/// Stateful order, expires at a block timestamp
	LongTerm,
}

/// Time in force of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeInForce {
	/// Good till cancelled (rests on the book)
	Unspecified,
	/// Immediate or cancel
	Ioc,
	/// Must not take liquidity at placement time
	PostOnly,
	/// Must fill completely or not at all
	FillOrKill,
}

/// Expiry of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoodTil {
	/// Last block height (inclusive) at which a short-term order is valid
	Block(u32),
	/// Block timestamp in seconds until which a stateful order is valid
	BlockTime(u32),
}

impl GoodTil {
	pub fn value(&self) -> u32 {
		match self {
			GoodTil::Block(v) | GoodTil::BlockTime(v) => *v,
		}
	}
}

/// Unique key of an order across every index of the book
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId {
	pub subaccount_id: SubaccountId,
	/// Client-chosen identifier, unique per subaccount
	pub client_id: u32,
	pub order_flags: OrderFlags,
	pub clob_pair_id: ClobPairId,
}

impl OrderId {
	pub fn is_short_term(&self) -> bool {
		self.order_flags == OrderFlags::ShortTerm
	}

	pub fn is_stateful(&self) -> bool {
		!self.is_short_term()
	}

	/// Panics if this id does not belong to a short-term order
	pub fn must_be_short_term(&self) {
		if !self.is_short_term() {
			panic!("order id {} is not a short-term order id", self);
		}
	}

	/// Panics if this id does not belong to a stateful order
	pub fn must_be_stateful(&self) {
		if !self.is_stateful() {
			panic!("order id {} is not a stateful order id", self);
		}
	}
}

impl fmt::Display for OrderId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}:{}:{:?}:{}",
			self.subaccount_id, self.client_id, self.order_flags, self.clob_pair_id
		)
	}
}

/// Error returned when parsing an order hash from hex
#[derive(Debug, Error)]
pub enum OrderHashError {
	#[error("Invalid hex encoding: {0}")]
	InvalidHex(#[from] hex::FromHexError),
	#[error("Invalid hash length: expected 32 bytes, got {0}")]
	InvalidLength(usize),
}

/// SHA-256 digest identifying one exact version of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderHash(pub [u8; 32]);

impl fmt::Display for OrderHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", hex::encode(self.0))
	}
}

impl FromStr for OrderHash {
	type Err = OrderHashError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let bytes = hex::decode(s)?;
		let len = bytes.len();
		let array: [u8; 32] = bytes
			.try_into()
			.map_err(|_| OrderHashError::InvalidLength(len))?;
		Ok(OrderHash(array))
	}
}

/// Limit order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
	pub order_id: OrderId,
	pub side: Side,
	/// Size in base quantums
	pub quantums: u64,
	/// Limit price in subticks
	pub subticks: u64,
	pub good_til: GoodTil,
	pub time_in_force: TimeInForce,
	/// The order may only shrink the subaccount's position
	pub reduce_only: bool,
}

impl Order {
	pub fn clob_pair_id(&self) -> ClobPairId {
		self.order_id.clob_pair_id
	}

	pub fn subaccount_id(&self) -> &SubaccountId {
		&self.order_id.subaccount_id
	}

	pub fn is_buy(&self) -> bool {
		self.side == Side::Buy
	}

	pub fn is_short_term(&self) -> bool {
		self.order_id.is_short_term()
	}

	pub fn is_stateful(&self) -> bool {
		self.order_id.is_stateful()
	}

	pub fn is_post_only(&self) -> bool {
		self.time_in_force == TimeInForce::PostOnly
	}

	/// IOC and FOK orders never rest on the book
	pub fn requires_immediate_execution(&self) -> bool {
		matches!(
			self.time_in_force,
			TimeInForce::Ioc | TimeInForce::FillOrKill
		)
	}

	/// Size signed by side: positive for buys, negative for sells
	pub fn signed_quantums(&self) -> i128 {
		match self.side {
			Side::Buy => i128::from(self.quantums),
			Side::Sell => -i128::from(self.quantums),
			Side::Unspecified => 0,
		}
	}

	/// Block height expiry of a short-term order
	///
	/// Stateful orders have no block expiry and return `None`.
	pub fn good_til_block(&self) -> Option<u32> {
		match self.good_til {
			GoodTil::Block(b) => Some(b),
			GoodTil::BlockTime(_) => None,
		}
	}

	/// Canonical wire encoding of the order
	pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
		serde_json::to_vec(self)
	}

	pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
		serde_json::from_slice(bytes)
	}

	/// Hash over every field of the order in declaration order
	pub fn hash(&self) -> OrderHash {
		let mut hasher = Sha256::new();
		let id = &self.order_id;
		hasher.update((id.subaccount_id.owner.len() as u64).to_be_bytes());
		hasher.update(id.subaccount_id.owner.as_bytes());
		hasher.update(id.subaccount_id.number.to_be_bytes());
		hasher.update(id.client_id.to_be_bytes());
		hasher.update([id.order_flags as u8]);
		hasher.update(id.clob_pair_id.0.to_be_bytes());
		hasher.update([self.side as u8]);
		hasher.update(self.quantums.to_be_bytes());
		hasher.update(self.subticks.to_be_bytes());
		let (tag, value) = match self.good_til {
			GoodTil::Block(v) => (0u8, v),
			GoodTil::BlockTime(v) => (1u8, v),
		};
		hasher.update([tag]);
		hasher.update(value.to_be_bytes());
		hasher.update([self.time_in_force as u8]);
		hasher.update([self.reduce_only as u8]);
		OrderHash(hasher.finalize().into())
	}

	/// Replacement precedence of two versions of the same order
	///
	/// A later expiry takes precedence. Equal expiries fall back to the
	/// order hash. `Less` means `other` may replace `self`.
	pub fn cmp_replacement(&self, other: &Order) -> Ordering {
		self.good_til
			.value()
			.cmp(&other.good_til.value())
			.then_with(|| self.hash().cmp(&other.hash()))
	}
}

/// Synthetic taker order closing out a liquidated subaccount
///
/// Liquidation orders are never added to the book and never replace
/// anything; they only take liquidity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationOrder {
	pub subaccount_id: SubaccountId,
	pub clob_pair_id: ClobPairId,
	pub perpetual_id: u32,
	pub is_buy: bool,
	pub quantums: u64,
	pub subticks: u64,
}

impl LiquidationOrder {
	pub fn side(&self) -> Side {
		if self.is_buy { Side::Buy } else { Side::Sell }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn create_test_order(client_id: u32, good_til_block: u32) -> Order {
		Order {
			order_id: OrderId {
				subaccount_id: SubaccountId::new("alice", 0),
				client_id,
				order_flags: OrderFlags::ShortTerm,
				clob_pair_id: ClobPairId(0),
			},
			side: Side::Buy,
			quantums: 10,
			subticks: 100,
			good_til: GoodTil::Block(good_til_block),
			time_in_force: TimeInForce::Unspecified,
			reduce_only: false,
		}
	}

	#[test]
	fn test_hash_is_stable_and_field_sensitive() {
		let order = create_test_order(1, 20);
		assert_eq!(order.hash(), order.clone().hash());

		let mut resized = order.clone();
		resized.quantums = 11;
		assert_ne!(order.hash(), resized.hash());
	}

	#[test]
	fn test_hash_hex_round_trip() {
		let hash = create_test_order(1, 20).hash();
		let parsed: OrderHash = hash.to_string().parse().unwrap();
		assert_eq!(parsed, hash);
		assert!(matches!(
			"abcd".parse::<OrderHash>(),
			Err(OrderHashError::InvalidLength(2))
		));
	}

	#[test]
	fn test_cmp_replacement_prefers_later_expiry() {
		let existing = create_test_order(1, 20);
		let later = create_test_order(1, 21);
		assert_eq!(existing.cmp_replacement(&later), Ordering::Less);
		assert_eq!(later.cmp_replacement(&existing), Ordering::Greater);
		assert_eq!(existing.cmp_replacement(&existing), Ordering::Equal);
	}

	#[test]
	fn test_encode_decode() {
		let order = create_test_order(7, 30);
		let bytes = order.encode().unwrap();
		assert_eq!(Order::decode(&bytes).unwrap(), order);
	}

	#[test]
	fn test_signed_quantums() {
		let mut order = create_test_order(1, 20);
		assert_eq!(order.signed_quantums(), 10);
		order.side = Side::Sell;
		assert_eq!(order.signed_quantums(), -10);
		assert!(!order.requires_immediate_execution());
		order.time_in_force = TimeInForce::FillOrKill;
		assert!(order.requires_immediate_execution());
	}
}
