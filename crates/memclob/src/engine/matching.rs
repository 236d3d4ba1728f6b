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

use std::collections::BTreeMap;

use perp_types::{
	ClobPairId, LiquidationOrder, MakerFill, Order, OrderId, OrderStatus, PendingOpenOrder,
	RemovalReason, SubaccountId, UpdateResult,
};
use tracing::{debug, warn};

use super::state::PendingState;
use crate::{
	ledger::{CollateralizationCheck, FillLedger, PositionLedger},
	orderbook::Orderbook,
};

/// Incoming side of a match
#[derive(Debug, Clone, Copy)]
pub(crate) enum Taker<'a> {
	Order(&'a Order),
	Liquidation(&'a LiquidationOrder),
}

impl Taker<'_> {
	pub fn subaccount_id(&self) -> &SubaccountId {
		match self {
			Taker::Order(order) => order.subaccount_id(),
			Taker::Liquidation(liquidation) => &liquidation.subaccount_id,
		}
	}

	pub fn clob_pair_id(&self) -> ClobPairId {
		match self {
			Taker::Order(order) => order.clob_pair_id(),
			Taker::Liquidation(liquidation) => liquidation.clob_pair_id,
		}
	}

	pub fn order_id(&self) -> Option<&OrderId> {
		match self {
			Taker::Order(order) => Some(&order.order_id),
			Taker::Liquidation(_) => None,
		}
	}

	pub fn is_buy(&self) -> bool {
		match self {
			Taker::Order(order) => order.is_buy(),
			Taker::Liquidation(liquidation) => liquidation.is_buy,
		}
	}

	fn subticks(&self) -> u64 {
		match self {
			Taker::Order(order) => order.subticks,
			Taker::Liquidation(liquidation) => liquidation.subticks,
		}
	}

	fn is_reduce_only(&self) -> bool {
		matches!(self, Taker::Order(order) if order.reduce_only)
	}

	fn is_post_only(&self) -> bool {
		matches!(self, Taker::Order(order) if order.is_post_only())
	}

	fn is_liquidation(&self) -> bool {
		matches!(self, Taker::Liquidation(_))
	}

	/// Check if the taker's limit price reaches `maker_subticks`
	fn crosses(&self, maker_subticks: u64) -> bool {
		if self.is_buy() {
			self.subticks() >= maker_subticks
		} else {
			self.subticks() <= maker_subticks
		}
	}
}

/// One fill against a resting order
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MakerMatch {
	/// Resting version of the maker at match time
	pub maker: Order,
	pub fill_amount: u64,
}

/// Everything a matching pass decided, not yet applied to the book
#[derive(Debug, Clone)]
pub(crate) struct MatchingOutcome {
	pub matches: Vec<MakerMatch>,
	/// Makers found invalid while matching, in discovery order
	pub makers_to_remove: Vec<(OrderId, RemovalReason)>,
	pub status: OrderStatus,
	pub filled: u64,
	pub remaining: u64,
	/// Position change of every subaccount that traded in this pass
	pub position_deltas: BTreeMap<SubaccountId, i128>,
	/// Fill exposures made in this pass, per subaccount
	pub pending_orders: BTreeMap<SubaccountId, Vec<PendingOpenOrder>>,
}

impl MatchingOutcome {
	fn new(remaining: u64) -> Self {
		Self {
			matches: Vec::new(),
			makers_to_remove: Vec::new(),
			status: OrderStatus::Success,
			filled: 0,
			remaining,
			position_deltas: BTreeMap::new(),
			pending_orders: BTreeMap::new(),
		}
	}

	pub fn maker_fills(&self) -> Vec<MakerFill> {
		self.matches
			.iter()
			.map(|m| MakerFill {
				maker_order_id: m.maker.order_id.clone(),
				fill_amount: m.fill_amount,
			})
			.collect()
	}

	fn position_delta(&self, subaccount_id: &SubaccountId) -> i128 {
		self.position_deltas.get(subaccount_id).copied().unwrap_or(0)
	}

	fn record_match(&mut self, taker: &Taker<'_>, maker: &Order, fill_amount: u64, clob_pair_id: ClobPairId) {
		let signed = i128::from(fill_amount);
		let (taker_delta, maker_delta) = if taker.is_buy() {
			(signed, -signed)
		} else {
			(-signed, signed)
		};

		*self
			.position_deltas
			.entry(taker.subaccount_id().clone())
			.or_insert(0) += taker_delta;
		*self
			.position_deltas
			.entry(maker.subaccount_id().clone())
			.or_insert(0) += maker_delta;

		for (subaccount_id, is_buy) in [
			(taker.subaccount_id(), taker.is_buy()),
			(maker.subaccount_id(), maker.is_buy()),
		] {
			self.pending_orders
				.entry(subaccount_id.clone())
				.or_default()
				.push(PendingOpenOrder {
					remaining_quantums: fill_amount,
					is_buy,
					subticks: maker.subticks,
					clob_pair_id,
				});
		}

		self.matches.push(MakerMatch {
			maker: maker.clone(),
			fill_amount,
		});
		self.filled += fill_amount;
		self.remaining -= fill_amount;
	}
}

/// Read-only view of engine state used by a matching pass
pub(crate) struct MatchingContext<'a> {
	pub book: &'a Orderbook,
	pub pending: &'a PendingState,
	pub fill_ledger: &'a dyn FillLedger,
	pub position_ledger: &'a dyn PositionLedger,
	pub collateral: &'a mut dyn CollateralizationCheck,
	pub verbose_logging: bool,
}

/// Size a reduce-only order may trade against a position
///
/// Returns zero when trading in the order's direction would not reduce
/// the position.
pub(crate) fn resize_reduce_only(position: i128, fill_amount: u64, is_buy: bool) -> u64 {
	let direction: i128 = if is_buy { 1 } else { -1 };
	if position.signum() * direction != -1 {
		return 0;
	}
	let cap = u64::try_from(position.unsigned_abs()).unwrap_or(u64::MAX);
	fill_amount.min(cap)
}

impl MatchingContext<'_> {
	fn effective_position(&self, outcome: &MatchingOutcome, subaccount_id: &SubaccountId) -> i128 {
		self.pending
			.effective_position(self.position_ledger, subaccount_id, self.book.clob_pair_id())
			+ outcome.position_delta(subaccount_id)
	}

	fn pending_with(
		&self,
		outcome: &MatchingOutcome,
		subaccount_id: &SubaccountId,
		fill: PendingOpenOrder,
	) -> Vec<PendingOpenOrder> {
		let mut orders = self.pending.open_orders(subaccount_id).to_vec();
		if let Some(local) = outcome.pending_orders.get(subaccount_id) {
			orders.extend(local.iter().cloned());
		}
		orders.push(fill);
		orders
	}

	/// Run the collateralization check for one prospective fill
	///
	/// Returns the maker result and, unless the taker is a liquidation,
	/// the taker result.
	fn check_fill(
		&mut self,
		outcome: &MatchingOutcome,
		taker: &Taker<'_>,
		maker: &Order,
		fill_amount: u64,
	) -> (UpdateResult, Option<UpdateResult>) {
		let clob_pair_id = self.book.clob_pair_id();
		let mut request = BTreeMap::new();
		request.insert(
			maker.subaccount_id().clone(),
			self.pending_with(
				outcome,
				maker.subaccount_id(),
				PendingOpenOrder {
					remaining_quantums: fill_amount,
					is_buy: maker.is_buy(),
					subticks: maker.subticks,
					clob_pair_id,
				},
			),
		);
		if !taker.is_liquidation() {
			request.insert(
				taker.subaccount_id().clone(),
				self.pending_with(
					outcome,
					taker.subaccount_id(),
					PendingOpenOrder {
						remaining_quantums: fill_amount,
						is_buy: taker.is_buy(),
						subticks: maker.subticks,
						clob_pair_id,
					},
				),
			);
		}

		let results = self.collateral.check(&request);
		let lookup = |subaccount_id: &SubaccountId| match results.get(subaccount_id) {
			Some(result) => *result,
			None => {
				warn!(
					"Collateralization check returned no result for subaccount {}",
					subaccount_id
				);
				UpdateResult::UpdateCausedError
			}
		};

		let maker_result = lookup(maker.subaccount_id());
		let taker_result = (!taker.is_liquidation()).then(|| lookup(taker.subaccount_id()));
		(maker_result, taker_result)
	}

	/// Walk the opposite side of the book and decide every fill and removal
	///
	/// Nothing is mutated except the collateralization oracle. The pass
	/// stops when the taker is exhausted or stops crossing. It also stops
	/// when the taker fails its own collateral check (even if the maker
	/// failed too), when a post-only taker meets a maker that passed the
	/// check, and when a reduce-only taker's position has been closed.
	pub fn run(&mut self, taker: Taker<'_>, remaining: u64) -> MatchingOutcome {
		let book = self.book;
		let mut outcome = MatchingOutcome::new(remaining);
		let mut cursor = book.best_order_on_side(!taker.is_buy());

		while outcome.remaining > 0 {
			let Some(node) = cursor else {
				break;
			};
			let maker = &book.level_order(node).order;
			if !taker.crosses(maker.subticks) {
				break;
			}
			cursor = book.next_best_level_order(node);

			// The order being replaced never matches its replacement.
			if taker.order_id() == Some(&maker.order_id) {
				continue;
			}

			if maker.subaccount_id() == taker.subaccount_id() {
				outcome
					.makers_to_remove
					.push((maker.order_id.clone(), RemovalReason::SelfTrade));
				continue;
			}

			let maker_filled = self.pending.effective_fill(self.fill_ledger, &maker.order_id);
			let maker_remaining = match maker.quantums.checked_sub(maker_filled) {
				Some(r) if r > 0 => r,
				_ => panic!(
					"matching: resting maker {} has no remaining size (filled {} of {})",
					maker.order_id, maker_filled, maker.quantums
				),
			};
			let mut fill_amount = outcome.remaining.min(maker_remaining);

			if maker.reduce_only {
				let position = self.effective_position(&outcome, maker.subaccount_id());
				fill_amount = resize_reduce_only(position, fill_amount, maker.is_buy());
				if fill_amount == 0 {
					outcome
						.makers_to_remove
						.push((maker.order_id.clone(), RemovalReason::InvalidReduceOnly));
					continue;
				}
			}

			if taker.is_reduce_only() {
				let position = self.effective_position(&outcome, taker.subaccount_id());
				fill_amount = resize_reduce_only(position, fill_amount, taker.is_buy());
				if fill_amount == 0 {
					panic!(
						"matching: reduce-only taker of subaccount {} has no position left to reduce",
						taker.subaccount_id()
					);
				}
			}

			let (maker_result, taker_result) = self.check_fill(&outcome, &taker, maker, fill_amount);
			if !maker_result.is_success() {
				if self.verbose_logging {
					debug!(
						"Maker {} failed collateralization with {:?}",
						maker.order_id, maker_result
					);
				}
				outcome
					.makers_to_remove
					.push((maker.order_id.clone(), RemovalReason::Undercollateralized));
			}
			if let Some(result) = taker_result
				&& !result.is_success()
			{
				outcome.status = result.to_order_status();
				break;
			}
			if !maker_result.is_success() {
				continue;
			}

			if taker.is_post_only() {
				outcome.status = OrderStatus::PostOnlyWouldCrossMakerOrder;
				break;
			}

			if self.verbose_logging {
				debug!(
					"Matched {} quantums of maker {} at {} subticks",
					fill_amount, maker.order_id, maker.subticks
				);
			}
			outcome.record_match(&taker, maker, fill_amount, book.clob_pair_id());

			if taker.is_reduce_only()
				&& outcome.remaining > 0
				&& self.effective_position(&outcome, taker.subaccount_id()) == 0
			{
				outcome.status = OrderStatus::ReduceOnlyResized;
				break;
			}
		}

		outcome
	}
}
