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

mod cancels;
mod level;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use perp_types::{ClobPair, ClobPairId, Order, OrderId, Side, SubaccountId};
use slab::Slab;

pub use cancels::CancelIndex;
pub use level::{Level, LevelIter, LevelOrder, LevelOrderRef};

/// Sentinel best ask of a book without asks
pub const NO_BEST_ASK: u64 = u64::MAX;

/// Sentinel best bid of a book without bids
pub const NO_BEST_BID: u64 = 0;

/// Limit order book of a single trading pair (single-threaded)
///
/// All resting orders live in one node arena; each price level is a linked
/// list threaded through that arena and `order_id_to_node` is the only way
/// an order is located for removal.
///
/// Design characteristics:
/// - O(1) add at front or back of a level and O(1) removal by id
/// - Price maps hold a level iff the level is non-empty
/// - `best_bid` / `best_ask` are maintained incrementally with sentinels
/// - Secondary indices use ordered collections for deterministic iteration
#[derive(Debug, Clone)]
pub struct Orderbook {
	clob_pair_id: ClobPairId,
	subticks_per_tick: u64,
	min_order_base_quantums: u64,
	/// Buy side: subticks -> level
	bids: HashMap<u64, Level>,
	/// Sell side: subticks -> level
	asks: HashMap<u64, Level>,
	best_bid: u64,
	best_ask: u64,
	nodes: Slab<LevelOrder>,
	order_id_to_node: HashMap<OrderId, LevelOrderRef>,
	subaccount_open_orders: BTreeMap<SubaccountId, BTreeMap<Side, BTreeSet<OrderId>>>,
	subaccount_reduce_only_orders: BTreeMap<SubaccountId, BTreeSet<OrderId>>,
	/// Short-term orders by good til block
	block_expirations: BTreeMap<u32, BTreeSet<OrderId>>,
	cancels: CancelIndex,
	total_open_orders: usize,
}

impl Orderbook {
	/// Create an empty book for `clob_pair`
	///
	/// Panics if the tick size or the minimum order size is zero.
	pub fn new(clob_pair: &ClobPair) -> Self {
		if clob_pair.subticks_per_tick == 0 {
			panic!("subticks_per_tick must be greater than zero");
		}
		if clob_pair.min_order_base_quantums == 0 {
			panic!("min_order_base_quantums must be greater than zero");
		}

		Self {
			clob_pair_id: clob_pair.id,
			subticks_per_tick: clob_pair.subticks_per_tick,
			min_order_base_quantums: clob_pair.min_order_base_quantums,
			bids: HashMap::new(),
			asks: HashMap::new(),
			best_bid: NO_BEST_BID,
			best_ask: NO_BEST_ASK,
			nodes: Slab::new(),
			order_id_to_node: HashMap::new(),
			subaccount_open_orders: BTreeMap::new(),
			subaccount_reduce_only_orders: BTreeMap::new(),
			block_expirations: BTreeMap::new(),
			cancels: CancelIndex::new(),
			total_open_orders: 0,
		}
	}

	pub fn clob_pair_id(&self) -> ClobPairId {
		self.clob_pair_id
	}

	pub fn subticks_per_tick(&self) -> u64 {
		self.subticks_per_tick
	}

	pub fn min_order_base_quantums(&self) -> u64 {
		self.min_order_base_quantums
	}

	/// Best bid price, `NO_BEST_BID` if there are no bids
	pub fn best_bid(&self) -> u64 {
		self.best_bid
	}

	/// Best ask price, `NO_BEST_ASK` if there are no asks
	pub fn best_ask(&self) -> u64 {
		self.best_ask
	}

	/// Midpoint of the spread, rounded down
	pub fn mid_price(&self) -> Option<u64> {
		if self.best_bid == NO_BEST_BID || self.best_ask == NO_BEST_ASK {
			return None;
		}
		Some(self.best_bid + (self.best_ask - self.best_bid) / 2)
	}

	/// Check if the best bid reaches the best ask
	pub fn is_crossed(&self) -> bool {
		self.best_bid != NO_BEST_BID && self.best_ask != NO_BEST_ASK && self.best_bid >= self.best_ask
	}

	fn side(&self, is_buy: bool) -> &HashMap<u64, Level> {
		if is_buy { &self.bids } else { &self.asks }
	}

	fn side_mut(&mut self, is_buy: bool) -> &mut HashMap<u64, Level> {
		if is_buy {
			&mut self.bids
		} else {
			&mut self.asks
		}
	}

	pub fn level(&self, is_buy: bool, subticks: u64) -> Option<&Level> {
		self.side(is_buy).get(&subticks)
	}

	/// Prices of all populated levels on a side, best first
	pub fn level_prices(&self, is_buy: bool) -> Vec<u64> {
		let mut prices: Vec<u64> = self.side(is_buy).keys().copied().collect();
		prices.sort_unstable();
		if is_buy {
			prices.reverse();
		}
		prices
	}

	/// Orders resting at a price in time priority
	pub fn level_orders(&self, is_buy: bool, subticks: u64) -> Vec<&Order> {
		self.level(is_buy, subticks)
			.map(|level| level.iter(&self.nodes).collect())
			.unwrap_or_default()
	}

	pub fn level_order(&self, node: LevelOrderRef) -> &LevelOrder {
		&self.nodes[node]
	}

	pub fn node_of(&self, order_id: &OrderId) -> Option<LevelOrderRef> {
		self.order_id_to_node.get(order_id).copied()
	}

	pub fn has_order(&self, order_id: &OrderId) -> bool {
		self.order_id_to_node.contains_key(order_id)
	}

	pub fn get_order(&self, order_id: &OrderId) -> Option<&Order> {
		self.node_of(order_id).map(|node| &self.nodes[node].order)
	}

	pub fn total_open_orders(&self) -> usize {
		self.total_open_orders
	}

	/// All resting orders, sorted by id
	pub fn all_orders(&self) -> Vec<&Order> {
		let mut orders: Vec<&Order> = self.nodes.iter().map(|(_, node)| &node.order).collect();
		orders.sort_by(|a, b| a.order_id.cmp(&b.order_id));
		orders
	}

	/// Open orders of a subaccount on one side, sorted by id
	pub fn subaccount_orders(&self, subaccount_id: &SubaccountId, side: Side) -> Vec<&Order> {
		self.subaccount_open_orders
			.get(subaccount_id)
			.and_then(|sides| sides.get(&side))
			.map(|ids| {
				ids.iter()
					.map(|id| match self.get_order(id) {
						Some(order) => order,
						None => panic!("open subaccount order {} is not on the book", id),
					})
					.collect()
			})
			.unwrap_or_default()
	}

	/// Resting reduce-only order ids of a subaccount, sorted
	pub fn reduce_only_orders(&self, subaccount_id: &SubaccountId) -> Vec<OrderId> {
		self.subaccount_reduce_only_orders
			.get(subaccount_id)
			.map(|ids| ids.iter().cloned().collect())
			.unwrap_or_default()
	}

	/// Short-term order ids expiring at `block`, sorted
	pub fn orders_expiring_at(&self, block: u32) -> Vec<OrderId> {
		self.block_expirations
			.get(&block)
			.map(|ids| ids.iter().cloned().collect())
			.unwrap_or_default()
	}

	pub fn cancels(&self) -> &CancelIndex {
		&self.cancels
	}

	pub fn cancels_mut(&mut self) -> &mut CancelIndex {
		&mut self.cancels
	}

	/// First order of the best level on a side
	pub fn best_order_on_side(&self, is_buy: bool) -> Option<LevelOrderRef> {
		let best = if is_buy { self.best_bid } else { self.best_ask };
		self.first_order_at(is_buy, best)
	}

	pub fn first_order_at(&self, is_buy: bool, subticks: u64) -> Option<LevelOrderRef> {
		self.side(is_buy).get(&subticks).map(|level| level.front())
	}

	/// Next order in matching priority after `node`
	///
	/// Moves along the node's level first, then to the front of the next
	/// best level on the same side.
	pub fn next_best_level_order(&self, node: LevelOrderRef) -> Option<LevelOrderRef> {
		let level_order = &self.nodes[node];
		if let Some(next) = level_order.next() {
			return Some(next);
		}

		let is_buy = level_order.order.is_buy();
		let subticks = self.find_next_best_subticks(level_order.order.subticks, is_buy)?;
		self.first_order_at(is_buy, subticks)
	}

	/// Next worse populated price after `starting_subticks` on a side
	///
	/// Steps one tick at a time for at most as many steps as the side has
	/// levels, then falls back to a scan of every level on that side.
	pub fn find_next_best_subticks(&self, starting_subticks: u64, is_buy: bool) -> Option<u64> {
		let levels = self.side(is_buy);
		let mut current = starting_subticks;

		for _ in 0..levels.len() {
			let stepped = if is_buy {
				current.checked_sub(self.subticks_per_tick)
			} else {
				current.checked_add(self.subticks_per_tick)
			};
			let Some(stepped) = stepped else {
				break;
			};
			current = stepped;
			if levels.contains_key(&current) {
				return Some(current);
			}
		}

		if is_buy {
			levels
				.keys()
				.copied()
				.filter(|subticks| *subticks < starting_subticks)
				.max()
		} else {
			levels
				.keys()
				.copied()
				.filter(|subticks| *subticks > starting_subticks)
				.min()
		}
	}

	/// Add `order` to its level and every index
	///
	/// Panics if the order id is already resident or the side is unset.
	pub fn must_add_order(&mut self, order: Order, force_to_front: bool) -> LevelOrderRef {
		if order.side == Side::Unspecified {
			panic!("must_add_order: order {} has no side", order.order_id);
		}
		if let Some(existing) = self.get_order(&order.order_id) {
			panic!(
				"must_add_order: order {:?} must be removed before adding {:?}",
				existing, order
			);
		}

		let is_buy = order.is_buy();
		let subticks = order.subticks;
		if is_buy {
			if self.best_bid < subticks {
				self.best_bid = subticks;
			}
		} else if self.best_ask > subticks {
			self.best_ask = subticks;
		}

		let order_id = order.order_id.clone();
		let side = order.side;
		let reduce_only = order.reduce_only;
		let good_til_block = order.good_til_block().filter(|_| order.is_short_term());

		let node = self.nodes.insert(LevelOrder::new(order));
		let levels = if is_buy {
			&mut self.bids
		} else {
			&mut self.asks
		};
		match levels.get_mut(&subticks) {
			Some(level) if force_to_front => level.push_front(&mut self.nodes, node),
			Some(level) => level.push_back(&mut self.nodes, node),
			None => {
				levels.insert(subticks, Level::with_order(subticks, node));
			}
		}

		self.order_id_to_node.insert(order_id.clone(), node);
		self.subaccount_open_orders
			.entry(order_id.subaccount_id.clone())
			.or_default()
			.entry(side)
			.or_default()
			.insert(order_id.clone());
		if let Some(block) = good_til_block {
			self.block_expirations
				.entry(block)
				.or_default()
				.insert(order_id.clone());
		}
		if reduce_only {
			self.subaccount_reduce_only_orders
				.entry(order_id.subaccount_id.clone())
				.or_default()
				.insert(order_id);
		}
		self.total_open_orders += 1;

		node
	}

	/// Remove a resident order from its level and every index
	///
	/// Panics if the order is not on the book.
	pub fn must_remove_order(&mut self, order_id: &OrderId) -> Order {
		let Some(node) = self.order_id_to_node.remove(order_id) else {
			panic!("must_remove_order: order {} does not exist", order_id);
		};

		let (is_buy, subticks, side, reduce_only, good_til_block) = {
			let order = &self.nodes[node].order;
			(
				order.is_buy(),
				order.subticks,
				order.side,
				order.reduce_only,
				order.good_til_block().filter(|_| order.is_short_term()),
			)
		};
		let subaccount_id = &order_id.subaccount_id;

		if let Some(block) = good_til_block
			&& let Some(ids) = self.block_expirations.get_mut(&block)
		{
			ids.remove(order_id);
			if ids.is_empty() {
				self.block_expirations.remove(&block);
			}
		}

		if let Some(sides) = self.subaccount_open_orders.get_mut(subaccount_id) {
			if let Some(ids) = sides.get_mut(&side) {
				ids.remove(order_id);
				if ids.is_empty() {
					sides.remove(&side);
				}
			}
			if sides.is_empty() {
				self.subaccount_open_orders.remove(subaccount_id);
			}
		}

		if reduce_only && let Some(ids) = self.subaccount_reduce_only_orders.get_mut(subaccount_id) {
			ids.remove(order_id);
			if ids.is_empty() {
				self.subaccount_reduce_only_orders.remove(subaccount_id);
			}
		}

		let levels = if is_buy {
			&mut self.bids
		} else {
			&mut self.asks
		};
		let Some(level) = levels.get_mut(&subticks) else {
			panic!("must_remove_order: level {} does not exist for {}", subticks, order_id);
		};
		let emptied = level.unlink(&mut self.nodes, node);
		let removed = self.nodes.remove(node);
		self.total_open_orders -= 1;

		if emptied {
			self.side_mut(is_buy).remove(&subticks);
			if is_buy && subticks == self.best_bid {
				self.best_bid = self
					.find_next_best_subticks(subticks, true)
					.unwrap_or(NO_BEST_BID);
			} else if !is_buy && subticks == self.best_ask {
				self.best_ask = self
					.find_next_best_subticks(subticks, false)
					.unwrap_or(NO_BEST_ASK);
			}
		}

		removed.order
	}
}
