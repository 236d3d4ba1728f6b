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

//! Tests for rebuilding books from the operations log

use perp_memclob::{
	ClobError, MemClob, MemClobConfig, MemoryCollateralizationCheck, MemoryFillLedger,
	MemoryPositionLedger, Operation, PurgeRequest,
};
use perp_types::{
	ClobPair, ClobPairId, GoodTil, LiquidationOrder, Order, OrderFlags, OrderId, RemovalReason,
	Side, SubaccountId, TimeInForce,
};

const PAIR: ClobPairId = ClobPairId(0);

fn create_test_clob(config: MemClobConfig) -> MemClob {
	let mut clob = MemClob::new(
		config,
		Box::new(MemoryCollateralizationCheck::new()),
		Box::new(MemoryFillLedger::new()),
		Box::new(MemoryPositionLedger::new()),
	);
	clob.create_orderbook(ClobPair {
		id: PAIR,
		subticks_per_tick: 5,
		min_order_base_quantums: 1,
		quantum_conversion_exponent: 0,
		perpetual_id: Some(0),
	});
	clob
}

fn create_test_order(
	owner: &str,
	client_id: u32,
	side: Side,
	quantums: u64,
	subticks: u64,
	good_til_block: u32,
) -> Order {
	Order {
		order_id: OrderId {
			subaccount_id: SubaccountId::new(owner, 0),
			client_id,
			order_flags: OrderFlags::ShortTerm,
			clob_pair_id: PAIR,
		},
		side,
		quantums,
		subticks,
		good_til: GoodTil::Block(good_til_block),
		time_in_force: TimeInForce::Unspecified,
		reduce_only: false,
	}
}

#[derive(Debug, PartialEq)]
struct BookState {
	best_bid: u64,
	best_ask: u64,
	levels: Vec<(bool, u64, Vec<Order>)>,
	filled: Vec<(OrderId, u64)>,
	cancels: Vec<(OrderId, u32)>,
	total_open_orders: usize,
}

fn book_state(clob: &MemClob) -> BookState {
	let book = clob.orderbook(PAIR).unwrap();
	let mut levels = Vec::new();
	for is_buy in [true, false] {
		for price in book.level_prices(is_buy) {
			levels.push((
				is_buy,
				price,
				book.level_orders(is_buy, price).into_iter().cloned().collect(),
			));
		}
	}

	BookState {
		best_bid: book.best_bid(),
		best_ask: book.best_ask(),
		levels,
		filled: book
			.all_orders()
			.into_iter()
			.map(|order| {
				(
					order.order_id.clone(),
					clob.get_order_filled_amount(&order.order_id),
				)
			})
			.collect(),
		cancels: book.cancels().entries(),
		total_open_orders: book.total_open_orders(),
	}
}

fn run_session(clob: &mut MemClob) {
	clob.place_order(create_test_order("alice", 1, Side::Buy, 10, 50, 20))
		.unwrap();
	clob.place_order(create_test_order("bob", 1, Side::Buy, 5, 55, 20))
		.unwrap();
	clob.place_order(create_test_order("carol", 1, Side::Sell, 8, 50, 20))
		.unwrap();
	clob.cancel_order(&create_test_order("alice", 9, Side::Buy, 1, 50, 15).order_id, 15)
		.unwrap();

	// Replacement at a worse price keeps the matched fill.
	clob.place_order(create_test_order("alice", 1, Side::Buy, 10, 45, 21))
		.unwrap();

	clob.place_order(create_test_order("dave", 1, Side::Sell, 5, 60, 20))
		.unwrap();
	clob.place_order(create_test_order("dave", 2, Side::Buy, 5, 60, 20))
		.unwrap();

	clob.place_liquidation(LiquidationOrder {
		subaccount_id: SubaccountId::new("erin", 0),
		clob_pair_id: PAIR,
		perpetual_id: 0,
		is_buy: false,
		quantums: 3,
		subticks: 40,
	})
	.unwrap();

	let mut stateful = create_test_order("frank", 1, Side::Buy, 2, 30, 0);
	stateful.order_id.order_flags = OrderFlags::LongTerm;
	stateful.good_til = GoodTil::BlockTime(1_000);
	clob.place_order(stateful).unwrap();

	// Rejected placements leave no trace in the log.
	assert!(clob
		.place_order(create_test_order("bob", 1, Side::Buy, 5, 55, 20))
		.is_err());
}

#[test]
fn test_replay_reproduces_book_and_log() {
	let mut clob = create_test_clob(MemClobConfig::default());
	run_session(&mut clob);

	let before = book_state(&clob);
	assert_eq!(before.best_bid, 60);
	assert_eq!(before.total_open_orders, 3);

	let (operations, bytes) = clob.get_operations_to_replay();
	assert!(operations.iter().any(|op| matches!(op, Operation::Match { .. })));
	assert!(operations.contains(&Operation::OrderRemoval {
		order_id: create_test_order("dave", 1, Side::Sell, 5, 60, 20).order_id,
		reason: RemovalReason::SelfTrade,
	}));

	let updates = clob
		.clear_and_replay(operations.clone(), bytes.clone())
		.unwrap();
	assert!(!updates.is_empty());

	assert_eq!(book_state(&clob), before);
	assert_eq!(clob.operations().operations(), operations.as_slice());
	assert_eq!(clob.operations().short_term_order_bytes(), &bytes);
}

#[test]
fn test_replay_twice_is_stable() {
	let mut clob = create_test_clob(MemClobConfig::default());
	run_session(&mut clob);
	let before = book_state(&clob);

	for _ in 0..2 {
		let (operations, bytes) = clob.get_operations_to_replay();
		clob.clear_and_replay(operations, bytes).unwrap();
	}
	assert_eq!(book_state(&clob), before);
}

#[test]
fn test_replay_after_purge_drops_expired_state() {
	let mut clob = create_test_clob(MemClobConfig::default());
	let expiring = create_test_order("alice", 1, Side::Buy, 5, 50, 5);
	let canceled = create_test_order("alice", 2, Side::Buy, 5, 45, 5);
	let surviving = create_test_order("bob", 1, Side::Sell, 5, 70, 10);
	clob.place_order(expiring.clone()).unwrap();
	clob.place_order(canceled.clone()).unwrap();
	clob.place_order(surviving.clone()).unwrap();
	clob.cancel_order(&canceled.order_id, 5).unwrap();
	assert!(clob.get_order(&canceled.order_id).is_none());

	clob.purge_invalid_state(&PurgeRequest {
		block_height: 5,
		..Default::default()
	});
	let before = book_state(&clob);
	assert_eq!(before.total_open_orders, 1);
	assert!(before.cancels.is_empty());

	let (operations, bytes) = clob.get_operations_to_replay();
	clob.clear_and_replay(operations, bytes).unwrap();

	assert_eq!(book_state(&clob), before);
	assert!(clob.get_order(&canceled.order_id).is_none());
	assert!(!clob
		.operations()
		.operations()
		.iter()
		.any(|op| matches!(op, Operation::ShortTermCancellation { .. })));
}

#[test]
fn test_replay_rejects_oversized_log() {
	let config = MemClobConfig {
		max_replay_operations: 2,
		..MemClobConfig::default()
	};
	let mut clob = create_test_clob(config);
	for client_id in 0..3 {
		clob.place_order(create_test_order("alice", client_id, Side::Buy, 5, 50, 20))
			.unwrap();
	}

	let (operations, bytes) = clob.get_operations_to_replay();
	let err = clob.clear_and_replay(operations, bytes).unwrap_err();
	assert!(matches!(err, ClobError::ReplayTooLong { len: 3, max: 2 }));
	assert_eq!(clob.orderbook(PAIR).unwrap().total_open_orders(), 3);
}

#[test]
#[should_panic(expected = "no bytes for short-term order")]
fn test_replay_without_order_bytes_panics() {
	let mut clob = create_test_clob(MemClobConfig::default());
	clob.place_order(create_test_order("alice", 1, Side::Buy, 5, 50, 20))
		.unwrap();

	let (operations, _) = clob.get_operations_to_replay();
	let _ = clob.clear_and_replay(operations, Default::default());
}
