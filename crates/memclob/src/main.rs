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

//! Memclob simulation entry point
//!
//! Runs a short deterministic session against in-memory ledgers:
//! - Two makers quote a book
//! - A taker sweeps part of it
//! - A short-term order is canceled and its block purged
//! - The operations log is replayed and the rebuilt book compared

use anyhow::{Context, Result, bail};
use tracing::info;

use perp_memclob::{
	MemClob, MemClobConfig, MemoryCollateralizationCheck, MemoryFillLedger, MemoryPositionLedger,
	PremiumParams, PurgeRequest,
};
use perp_types::{
	ClobPair, ClobPairId, GoodTil, Order, OrderFlags, OrderId, Side, SubaccountId, TimeInForce,
};

const CLOB_PAIR_ID: ClobPairId = ClobPairId(0);

fn short_term_order(owner: &str, client_id: u32, side: Side, quantums: u64, subticks: u64) -> Order {
	Order {
		order_id: OrderId {
			subaccount_id: SubaccountId::new(owner, 0),
			client_id,
			order_flags: OrderFlags::ShortTerm,
			clob_pair_id: CLOB_PAIR_ID,
		},
		side,
		quantums,
		subticks,
		good_til: GoodTil::Block(10),
		time_in_force: TimeInForce::Unspecified,
		reduce_only: false,
	}
}

/// Resting orders of a book in a comparable form
fn book_state(clob: &MemClob) -> Result<Vec<Order>> {
	let book = clob
		.orderbook(CLOB_PAIR_ID)
		.context("simulation orderbook missing")?;
	Ok(book.all_orders().into_iter().cloned().collect())
}

fn main() -> Result<()> {
	let log_dir = perp_memclob::logging::init_logging()?;

	let config = MemClobConfig::from_env().unwrap_or_else(|_| {
		info!(target: "memclob", "Using default configuration");
		MemClobConfig::default()
	});
	info!(target: "memclob", "Starting memclob simulation, logs in {}", log_dir.display());

	let mut clob = MemClob::new(
		config,
		Box::new(MemoryCollateralizationCheck::new()),
		Box::new(MemoryFillLedger::new()),
		Box::new(MemoryPositionLedger::new()),
	);
	clob.create_orderbook(ClobPair {
		id: CLOB_PAIR_ID,
		subticks_per_tick: 10,
		min_order_base_quantums: 1,
		quantum_conversion_exponent: 0,
		perpetual_id: Some(0),
	});

	let quotes = [
		short_term_order("alice", 1, Side::Buy, 10, 990),
		short_term_order("alice", 2, Side::Buy, 20, 980),
		short_term_order("bob", 1, Side::Sell, 10, 1_010),
		short_term_order("bob", 2, Side::Sell, 30, 1_020),
	];
	for order in quotes {
		clob.place_order(order).context("placing quote")?;
	}

	let taker = short_term_order("carol", 1, Side::Sell, 15, 980);
	let result = clob.place_order(taker).context("placing taker")?;
	info!(
		target: "memclob",
		"Taker filled {} quantums with status {:?}",
		result.filled_quantums, result.status
	);

	let canceled = short_term_order("bob", 2, Side::Sell, 30, 1_020).order_id;
	clob.cancel_order(&canceled, 10).context("canceling quote")?;

	if let Some(mid) = clob.get_mid_price(CLOB_PAIR_ID)? {
		info!(target: "memclob", "Mid price: {} subticks", mid.subticks);
	}
	let premium = clob.get_price_premium(
		CLOB_PAIR_ID,
		&PremiumParams {
			index_price_subticks: 950,
			impact_notional_quote_quantums: 5_000,
			max_abs_premium_vote_ppm: 100_000,
		},
	)?;
	info!(target: "memclob", "Premium vote: {} ppm", premium);

	let before = book_state(&clob)?;
	let (operations, bytes) = clob.get_operations_to_replay();
	info!(target: "memclob", "Replaying {} operations", operations.len());
	clob.clear_and_replay(operations, bytes)
		.context("replaying operations")?;
	if book_state(&clob)? != before {
		bail!("replayed book differs from the live book");
	}

	clob.purge_invalid_state(&PurgeRequest {
		block_height: 10,
		..Default::default()
	});
	info!(
		target: "memclob",
		"Simulation complete, {} orders resting",
		book_state(&clob)?.len()
	);
	Ok(())
}
