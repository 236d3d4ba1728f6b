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

//! Property tests for orderbook indices under random adds and removes

use std::collections::BTreeMap;

use perp_memclob::{NO_BEST_ASK, NO_BEST_BID, Orderbook};
use perp_types::{
	ClobPair, ClobPairId, GoodTil, Order, OrderFlags, OrderId, Side, SubaccountId, TimeInForce,
};
use proptest::prelude::*;

const TICK: u64 = 10;

#[derive(Debug, Clone)]
enum BookOp {
	Add { is_buy: bool, ticks: u64, owner: u8 },
	Remove { index: usize },
}

fn book_op() -> impl Strategy<Value = BookOp> {
	prop_oneof![
		3 => (any::<bool>(), 1u64..40, 0u8..4).prop_map(|(is_buy, ticks, owner)| BookOp::Add {
			is_buy,
			ticks,
			owner,
		}),
		2 => any::<usize>().prop_map(|index| BookOp::Remove { index }),
	]
}

fn create_test_order(client_id: u32, owner: u8, is_buy: bool, subticks: u64) -> Order {
	Order {
		order_id: OrderId {
			subaccount_id: SubaccountId::new(format!("owner-{}", owner), 0),
			client_id,
			order_flags: OrderFlags::ShortTerm,
			clob_pair_id: ClobPairId(0),
		},
		side: if is_buy { Side::Buy } else { Side::Sell },
		quantums: 1,
		subticks,
		good_til: GoodTil::Block(client_id % 7),
		time_in_force: TimeInForce::Unspecified,
		reduce_only: false,
	}
}

/// Resting orders per side and price in arrival order
type Model = BTreeMap<(bool, u64), Vec<OrderId>>;

fn check_book(book: &Orderbook, model: &Model) -> Result<(), TestCaseError> {
	let bids: Vec<u64> = model.keys().filter(|(b, _)| *b).map(|(_, p)| *p).rev().collect();
	let asks: Vec<u64> = model.keys().filter(|(b, _)| !*b).map(|(_, p)| *p).collect();

	prop_assert_eq!(book.best_bid(), bids.first().copied().unwrap_or(NO_BEST_BID));
	prop_assert_eq!(book.best_ask(), asks.first().copied().unwrap_or(NO_BEST_ASK));
	prop_assert_eq!(book.level_prices(true), bids.clone());
	prop_assert_eq!(book.level_prices(false), asks.clone());

	let total: usize = model.values().map(Vec::len).sum();
	prop_assert_eq!(book.total_open_orders(), total);
	prop_assert_eq!(book.all_orders().len(), total);

	for ((is_buy, price), ids) in model {
		let resting: Vec<OrderId> = book
			.level_orders(*is_buy, *price)
			.into_iter()
			.map(|order| order.order_id.clone())
			.collect();
		prop_assert_eq!(&resting, ids);
	}

	for (side, prices) in [(true, &bids), (false, &asks)] {
		for pair in prices.windows(2) {
			prop_assert_eq!(book.find_next_best_subticks(pair[0], side), Some(pair[1]));
		}
		if let Some(last) = prices.last() {
			prop_assert_eq!(book.find_next_best_subticks(*last, side), None);
		}
	}
	Ok(())
}

proptest! {
	#[test]
	fn test_book_indices_track_adds_and_removes(ops in prop::collection::vec(book_op(), 1..120)) {
		let mut book = Orderbook::new(&ClobPair {
			id: ClobPairId(0),
			subticks_per_tick: TICK,
			min_order_base_quantums: 1,
			quantum_conversion_exponent: 0,
			perpetual_id: Some(0),
		});
		let mut model: Model = BTreeMap::new();
		let mut resident: Vec<(bool, u64, OrderId)> = Vec::new();
		let mut next_client_id = 0u32;

		for op in ops {
			match op {
				BookOp::Add { is_buy, ticks, owner } => {
					let order = create_test_order(next_client_id, owner, is_buy, ticks * TICK);
					next_client_id += 1;
					resident.push((is_buy, order.subticks, order.order_id.clone()));
					model
						.entry((is_buy, order.subticks))
						.or_default()
						.push(order.order_id.clone());
					book.must_add_order(order, false);
				}
				BookOp::Remove { index } => {
					if resident.is_empty() {
						continue;
					}
					let (is_buy, price, order_id) = resident.swap_remove(index % resident.len());
					let removed = book.must_remove_order(&order_id);
					prop_assert_eq!(&removed.order_id, &order_id);

					let level = model.get_mut(&(is_buy, price)).unwrap();
					level.retain(|id| id != &order_id);
					if level.is_empty() {
						model.remove(&(is_buy, price));
					}
				}
			}
			check_book(&book, &model)?;
		}
	}

	#[test]
	fn test_subaccount_and_expiry_indices_cover_every_order(
		ops in prop::collection::vec((any::<bool>(), 1u64..20, 0u8..3), 1..60)
	) {
		let mut book = Orderbook::new(&ClobPair {
			id: ClobPairId(0),
			subticks_per_tick: TICK,
			min_order_base_quantums: 1,
			quantum_conversion_exponent: 0,
			perpetual_id: Some(0),
		});
		for (client_id, (is_buy, ticks, owner)) in ops.into_iter().enumerate() {
			book.must_add_order(create_test_order(client_id as u32, owner, is_buy, ticks * TICK), false);
		}

		let mut indexed = 0usize;
		for owner in 0u8..3 {
			let subaccount_id = SubaccountId::new(format!("owner-{}", owner), 0);
			for side in [Side::Buy, Side::Sell] {
				let orders = book.subaccount_orders(&subaccount_id, side);
				prop_assert!(orders.iter().all(|order| order.side == side));
				indexed += orders.len();
			}
		}
		prop_assert_eq!(indexed, book.total_open_orders());

		let expiring: usize = (0..7).map(|block| book.orders_expiring_at(block).len()).sum();
		prop_assert_eq!(expiring, book.total_open_orders());
	}
}
