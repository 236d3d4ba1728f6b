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

use perp_types::{ClobPairId, GoodTil, Order, OrderFlags, OrderId, Side, SubaccountId, TimeInForce};

pub const TICK: u64 = 10;
const MID: u64 = 50_000;
const LEVELS: u64 = 2_000;

#[derive(Clone, Copy)]
pub enum Scenario {
	NoCross,
	CrossHeavy,
	DeepBook,
}

pub struct OrderGenerator {
	counter: u32,
	scenario: Scenario,
}

impl OrderGenerator {
	pub fn new(scenario: Scenario) -> Self {
		Self {
			counter: 0,
			scenario,
		}
	}

	pub fn next_order(&mut self) -> Order {
		self.counter += 1;
		let counter = self.counter as u64;
		let owner = format!("bench_{}", self.counter % 16);

		match self.scenario {
			Scenario::NoCross => {
				if counter.is_multiple_of(2) {
					create_order(&owner, self.counter, Side::Buy, 1, (4_400 + counter % 1_000) * TICK)
				} else {
					create_order(&owner, self.counter, Side::Sell, 1, (5_600 + counter % 1_000) * TICK)
				}
			}
			Scenario::CrossHeavy => {
				let side = if counter.is_multiple_of(2) {
					Side::Buy
				} else {
					Side::Sell
				};
				create_order(&owner, self.counter, side, 10, MID)
			}
			Scenario::DeepBook => {
				// Mostly makers across many levels, with an occasional taker
				// priced through the whole side.
				if counter.is_multiple_of(100) {
					let (side, subticks) = if (counter / 100).is_multiple_of(2) {
						(Side::Buy, 1_000_000 * TICK)
					} else {
						(Side::Sell, TICK)
					};
					create_order("spike", self.counter, side, 10_000_000, subticks)
				} else {
					let offset = (counter % LEVELS) as i64 - (LEVELS as i64 / 2);
					let subticks = (MID as i64 + offset * TICK as i64) as u64;
					let side = if counter.is_multiple_of(2) {
						Side::Buy
					} else {
						Side::Sell
					};
					create_order(&owner, self.counter, side, 1_000, subticks)
				}
			}
		}
	}

	/// Resting depth on both sides that never crosses itself
	pub fn warmup_orders(&self, count: u32) -> Vec<Order> {
		let half = LEVELS / 2;
		(0..count)
			.map(|i| {
				let level = (i as u64 / 2) % half;
				if i % 2 == 0 {
					create_order("warmup", u32::MAX - i, Side::Buy, 1_000, MID - (1 + level) * TICK)
				} else {
					create_order("warmup", u32::MAX - i, Side::Sell, 1_000, MID + (1 + level) * TICK)
				}
			})
			.collect()
	}
}

fn create_order(owner: &str, client_id: u32, side: Side, quantums: u64, subticks: u64) -> Order {
	Order {
		order_id: OrderId {
			subaccount_id: SubaccountId::new(owner, 0),
			client_id,
			order_flags: OrderFlags::ShortTerm,
			clob_pair_id: ClobPairId(0),
		},
		side,
		quantums,
		subticks,
		good_til: GoodTil::Block(u32::MAX),
		time_in_force: TimeInForce::Unspecified,
		reduce_only: false,
	}
}
