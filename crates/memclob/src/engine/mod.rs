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

mod matching;
mod purge;
mod replay;
mod state;

pub use state::PendingState;

use std::{cmp::Ordering, collections::BTreeMap};

use perp_types::{
	ClobPair, ClobPairId, GoodTil, LiquidationOrder, Order, OrderFlags, OrderId, OrderStatus,
	RemovalReason, Side, SubaccountId, TimeInForce,
};
use tracing::{debug, info};

use crate::{
	config::MemClobConfig,
	event::{OffchainUpdate, OffchainUpdates, RemovalStatus},
	ledger::{CollateralizationCheck, FillLedger, PositionLedger},
	operations::OperationsLog,
	orderbook::Orderbook,
	premium::{self, PremiumParams},
	types::{ClobError, MidPrice, PlaceOrderError, PlaceOrderResult},
};
use matching::{MatchingContext, MatchingOutcome, Taker};

/// In-memory central limit order book for perpetual markets
///
/// `MemClob` owns one `Orderbook` per trading pair and is the only writer
/// of those books. Every mutating call runs to completion before the next
/// one starts and appends what it did to the operations log.
///
/// Architecture:
/// - Single-writer: callers serialize access; nothing is locked inside
/// - Two-phase matching: a read-only pass decides, a second step applies
/// - Collaborators (collateral, fills, positions) are injected trait objects
/// - Deterministic: the same calls in the same order produce the same books
pub struct MemClob {
	config: MemClobConfig,
	clob_pairs: BTreeMap<ClobPairId, ClobPair>,
	orderbooks: BTreeMap<ClobPairId, Orderbook>,
	operations: OperationsLog,
	pending: PendingState,
	collateral: Box<dyn CollateralizationCheck>,
	fill_ledger: Box<dyn FillLedger>,
	position_ledger: Box<dyn PositionLedger>,
	last_purged_block: Option<u32>,
}

fn must_get_book_mut(
	orderbooks: &mut BTreeMap<ClobPairId, Orderbook>,
	clob_pair_id: ClobPairId,
) -> &mut Orderbook {
	match orderbooks.get_mut(&clob_pair_id) {
		Some(book) => book,
		None => panic!("orderbook for clob pair {} does not exist", clob_pair_id),
	}
}

fn removal(order_id: &OrderId, reason: RemovalReason, status: RemovalStatus) -> OffchainUpdate {
	OffchainUpdate::OrderRemove {
		order_id: order_id.clone(),
		reason,
		status,
		order_status: None,
	}
}

/// Check that `order` may replace `existing`
fn validate_replacement(existing: &Order, order: &Order) -> Result<(), ClobError> {
	if existing.cmp_replacement(order) != Ordering::Less {
		return Err(ClobError::InvalidReplacement(format!(
			"order {} does not take precedence over the existing version",
			order.order_id
		)));
	}
	if existing.side != order.side {
		return Err(ClobError::InvalidReplacement(format!(
			"order {} cannot change side",
			order.order_id
		)));
	}
	if existing.time_in_force != order.time_in_force {
		return Err(ClobError::InvalidReplacement(format!(
			"order {} cannot change time in force",
			order.order_id
		)));
	}
	if existing.reduce_only != order.reduce_only {
		return Err(ClobError::InvalidReplacement(format!(
			"order {} cannot change reduce-only",
			order.order_id
		)));
	}
	Ok(())
}

impl MemClob {
	pub fn new(
		config: MemClobConfig,
		collateral: Box<dyn CollateralizationCheck>,
		fill_ledger: Box<dyn FillLedger>,
		position_ledger: Box<dyn PositionLedger>,
	) -> Self {
		Self {
			config,
			clob_pairs: BTreeMap::new(),
			orderbooks: BTreeMap::new(),
			operations: OperationsLog::new(),
			pending: PendingState::new(),
			collateral,
			fill_ledger,
			position_ledger,
			last_purged_block: None,
		}
	}

	/// Create the book of a new trading pair
	///
	/// Panics if the pair already has a book or has a zero tick or
	/// minimum order size.
	pub fn create_orderbook(&mut self, clob_pair: ClobPair) {
		if self.orderbooks.contains_key(&clob_pair.id) {
			panic!("create_orderbook: orderbook for clob pair {} already exists", clob_pair.id);
		}

		let book = Orderbook::new(&clob_pair);
		info!(
			"Created orderbook for clob pair {} (subticks_per_tick={}, min_order_base_quantums={})",
			clob_pair.id, clob_pair.subticks_per_tick, clob_pair.min_order_base_quantums
		);
		self.orderbooks.insert(clob_pair.id, book);
		self.clob_pairs.insert(clob_pair.id, clob_pair);
	}

	/// Create the book of a trading pair unless it already exists
	///
	/// Returns true if a book was created.
	pub fn maybe_create_orderbook(&mut self, clob_pair: ClobPair) -> bool {
		if self.orderbooks.contains_key(&clob_pair.id) {
			return false;
		}
		self.create_orderbook(clob_pair);
		true
	}

	pub fn orderbook(&self, clob_pair_id: ClobPairId) -> Option<&Orderbook> {
		self.orderbooks.get(&clob_pair_id)
	}

	fn book(&self, clob_pair_id: ClobPairId) -> Result<&Orderbook, ClobError> {
		self.orderbooks
			.get(&clob_pair_id)
			.ok_or(ClobError::OrderbookNotFound(clob_pair_id))
	}

	pub fn operations(&self) -> &OperationsLog {
		&self.operations
	}

	pub fn last_purged_block(&self) -> Option<u32> {
		self.last_purged_block
	}

	/// Resting order with this id, if any
	pub fn get_order(&self, order_id: &OrderId) -> Option<&Order> {
		self.orderbooks
			.get(&order_id.clob_pair_id)
			.and_then(|book| book.get_order(order_id))
	}

	/// Good til block of the cancellation for a short-term order, if any
	pub fn get_cancel(&self, order_id: &OrderId) -> Option<u32> {
		self.orderbooks
			.get(&order_id.clob_pair_id)
			.and_then(|book| book.cancels().get(order_id))
	}

	/// Open orders of a subaccount on one side of a book, sorted by id
	pub fn get_subaccount_orders(
		&self,
		clob_pair_id: ClobPairId,
		subaccount_id: &SubaccountId,
		side: Side,
	) -> Result<Vec<&Order>, ClobError> {
		if side == Side::Unspecified {
			return Err(ClobError::InvalidOrderSide);
		}
		Ok(self.book(clob_pair_id)?.subaccount_orders(subaccount_id, side))
	}

	/// Committed plus pending fill of an order
	pub fn get_order_filled_amount(&self, order_id: &OrderId) -> u64 {
		self.pending.effective_fill(self.fill_ledger.as_ref(), order_id)
	}

	pub fn get_order_remaining_amount(&self, order: &Order) -> u64 {
		order
			.quantums
			.saturating_sub(self.get_order_filled_amount(&order.order_id))
	}

	/// Committed plus pending position of a subaccount
	pub fn get_position(&self, subaccount_id: &SubaccountId, clob_pair_id: ClobPairId) -> i128 {
		self.pending
			.effective_position(self.position_ledger.as_ref(), subaccount_id, clob_pair_id)
	}

	/// Midpoint of the spread, `None` if either side is empty
	pub fn get_mid_price(&self, clob_pair_id: ClobPairId) -> Result<Option<MidPrice>, ClobError> {
		let book = self.book(clob_pair_id)?;
		let Some(subticks) = book.mid_price() else {
			return Ok(None);
		};
		let (Some(bid), Some(ask)) = (book.best_order_on_side(true), book.best_order_on_side(false))
		else {
			return Ok(None);
		};

		Ok(Some(MidPrice {
			subticks,
			best_bid: book.level_order(bid).order.clone(),
			best_ask: book.level_order(ask).order.clone(),
		}))
	}

	/// Premium of the book's impact price over the index price, in ppm
	pub fn get_price_premium(
		&mut self,
		clob_pair_id: ClobPairId,
		params: &PremiumParams,
	) -> Result<i32, ClobError> {
		let clob_pair = self
			.clob_pairs
			.get(&clob_pair_id)
			.ok_or(ClobError::OrderbookNotFound(clob_pair_id))?;
		let book = self
			.orderbooks
			.get(&clob_pair_id)
			.ok_or(ClobError::OrderbookNotFound(clob_pair_id))?;
		let pending = &self.pending;
		let fill_ledger = self.fill_ledger.as_ref();

		premium::price_premium(
			book,
			clob_pair,
			self.collateral.as_mut(),
			|order| {
				order
					.quantums
					.saturating_sub(pending.effective_fill(fill_ledger, &order.order_id))
			},
			params,
		)
	}

	fn offchain(&self, updates: OffchainUpdates) -> OffchainUpdates {
		if self.config.generate_offchain_updates {
			updates
		} else {
			OffchainUpdates::new()
		}
	}

	fn fail(&self, kind: ClobError, updates: OffchainUpdates) -> PlaceOrderError {
		PlaceOrderError {
			kind,
			offchain_updates: self.offchain(updates),
		}
	}

	/// Checks that run before any state is touched
	///
	/// Returns the size left to match.
	fn validate_order(&self, order: &Order) -> Result<u64, ClobError> {
		let book = self.book(order.clob_pair_id())?;

		if order.side == Side::Unspecified {
			return Err(ClobError::InvalidOrderSide);
		}
		if order.subticks == 0 || order.subticks % book.subticks_per_tick() != 0 {
			return Err(ClobError::InvalidOrder(format!(
				"subticks {} is not a positive multiple of {}",
				order.subticks,
				book.subticks_per_tick()
			)));
		}
		match (order.order_id.order_flags, order.good_til) {
			(OrderFlags::ShortTerm, GoodTil::Block(_)) | (OrderFlags::LongTerm, GoodTil::BlockTime(_)) => {}
			(flags, good_til) => {
				return Err(ClobError::InvalidOrder(format!(
					"{:?} order cannot expire at {:?}",
					flags, good_til
				)));
			}
		}

		if let Some(good_til_block) = order.good_til_block()
			&& order.is_short_term()
			&& let Some(cancel_block) = book.cancels().get(&order.order_id)
			&& cancel_block >= good_til_block
		{
			return Err(ClobError::OrderIsCanceled);
		}

		if let Some(existing) = book.get_order(&order.order_id) {
			validate_replacement(existing, order)?;
		}
		if let Some(matched) = self.operations.matched_order(&order.order_id) {
			validate_replacement(matched, order)?;
		}

		let remaining = self.get_order_remaining_amount(order);
		if remaining == 0 || remaining < book.min_order_base_quantums() {
			return Err(ClobError::OrderFullyFilled);
		}

		if order.reduce_only {
			let position = self.get_position(order.subaccount_id(), order.clob_pair_id());
			if order.signed_quantums().signum() * position.signum() != -1 {
				return Err(ClobError::ReduceOnlyWouldIncreasePositionSize);
			}
		}

		if order.requires_immediate_execution() && remaining < order.quantums {
			return Err(ClobError::ImmediateExecutionOrderAlreadyFilled);
		}

		Ok(remaining)
	}

	fn run_matching(&mut self, taker: Taker<'_>, remaining: u64) -> MatchingOutcome {
		let book = match self.orderbooks.get(&taker.clob_pair_id()) {
			Some(book) => book,
			None => panic!("orderbook for clob pair {} does not exist", taker.clob_pair_id()),
		};
		let mut context = MatchingContext {
			book,
			pending: &self.pending,
			fill_ledger: self.fill_ledger.as_ref(),
			position_ledger: self.position_ledger.as_ref(),
			collateral: self.collateral.as_mut(),
			verbose_logging: self.config.verbose_logging,
		};
		context.run(taker, remaining)
	}

	/// Remove resting orders and log each removal
	///
	/// `Replaced` removals are logged but not notified; the replacement
	/// already announced them.
	fn apply_removals(
		&mut self,
		clob_pair_id: ClobPairId,
		removals: &[(OrderId, RemovalReason)],
		updates: &mut OffchainUpdates,
	) {
		let book = must_get_book_mut(&mut self.orderbooks, clob_pair_id);
		for (order_id, reason) in removals {
			book.must_remove_order(order_id);
			self.operations.add_removal(order_id.clone(), *reason);
			if *reason != RemovalReason::Replaced {
				updates.push(removal(order_id, *reason, RemovalStatus::BestEffortCanceled));
			}
		}
	}

	/// Apply the fills of a matching pass
	///
	/// Records pending fills and positions, notifies the fill ledger,
	/// removes fully filled makers and sweeps reduce-only orders of every
	/// subaccount whose position changed sign.
	fn apply_fills(&mut self, taker: &Taker<'_>, outcome: &MatchingOutcome, updates: &mut OffchainUpdates) {
		let clob_pair_id = taker.clob_pair_id();
		if let Taker::Order(order) = taker {
			self.operations.record_matched(order);
		}

		let book = must_get_book_mut(&mut self.orderbooks, clob_pair_id);
		for maker_match in &outcome.matches {
			let maker_id = &maker_match.maker.order_id;
			self.operations.record_matched(&maker_match.maker);
			self.pending.add_fill(maker_id, maker_match.fill_amount);
			self.fill_ledger.record_fill(maker_id, maker_match.fill_amount);

			let total_filled = self.pending.effective_fill(self.fill_ledger.as_ref(), maker_id);
			updates.push(OffchainUpdate::OrderUpdate {
				order_id: maker_id.clone(),
				total_filled_quantums: total_filled,
			});
			if total_filled >= maker_match.maker.quantums {
				book.must_remove_order(maker_id);
				updates.push(removal(
					maker_id,
					RemovalReason::FullyFilled,
					RemovalStatus::BestEffortCanceled,
				));
			}
		}

		if let Some(taker_id) = taker.order_id() {
			self.pending.add_fill(taker_id, outcome.filled);
			self.fill_ledger.record_fill(taker_id, outcome.filled);
			updates.push(OffchainUpdate::OrderUpdate {
				order_id: taker_id.clone(),
				total_filled_quantums: self.pending.effective_fill(self.fill_ledger.as_ref(), taker_id),
			});
		}

		for (subaccount_id, delta) in &outcome.position_deltas {
			self.pending
				.add_position_delta(subaccount_id, clob_pair_id, *delta);
		}
		for (subaccount_id, orders) in &outcome.pending_orders {
			for order in orders {
				self.pending.add_open_order(subaccount_id, order.clone());
			}
		}

		for (subaccount_id, delta) in &outcome.position_deltas {
			if *delta == 0 {
				continue;
			}
			let position = self.pending.effective_position(
				self.position_ledger.as_ref(),
				subaccount_id,
				clob_pair_id,
			);
			if position.signum() == (position - delta).signum() {
				continue;
			}

			for order_id in book.reduce_only_orders(subaccount_id) {
				book.must_remove_order(&order_id);
				self.operations
					.add_removal(order_id.clone(), RemovalReason::InvalidReduceOnly);
				updates.push(removal(
					&order_id,
					RemovalReason::InvalidReduceOnly,
					RemovalStatus::BestEffortCanceled,
				));
			}
		}
	}

	fn log_placement(&mut self, order: &Order, bytes: Option<Vec<u8>>) {
		match bytes {
			Some(bytes) => self.operations.add_short_term_placement(order.clone(), bytes),
			None => self.operations.add_stateful_placement(order.clone()),
		}
	}

	fn assert_not_crossed(&self, clob_pair_id: ClobPairId) {
		if let Some(book) = self.orderbooks.get(&clob_pair_id)
			&& book.is_crossed()
		{
			panic!(
				"orderbook {} is crossed: best bid {} >= best ask {}",
				clob_pair_id,
				book.best_bid(),
				book.best_ask()
			);
		}
	}

	/// Place an order, matching it against the book
	///
	/// If an order with the same id is resting, the call is a replacement
	/// and the resting version is removed first. Whatever is left after
	/// matching rests on the book unless the order is IOC, FOK, or stopped
	/// with a non-success status.
	///
	/// Business failures are returned as `PlaceOrderError`. Maker removals
	/// found during matching, and the removal of a replaced order, stay
	/// applied on failure.
	pub fn place_order(&mut self, order: Order) -> Result<PlaceOrderResult, PlaceOrderError> {
		let remaining = self.validate_order(&order)?;
		let bytes = if order.is_short_term() {
			Some(order.encode().map_err(ClobError::from)?)
		} else {
			None
		};

		let clob_pair_id = order.clob_pair_id();
		let order_id = order.order_id.clone();
		let mut updates = OffchainUpdates::new();

		let replacing = self.book(clob_pair_id)?.has_order(&order_id);
		if replacing {
			updates.push(removal(&order_id, RemovalReason::Replaced, RemovalStatus::BestEffortCanceled));
		}
		updates.push(OffchainUpdate::OrderPlace {
			order: order.clone(),
		});

		let taker = Taker::Order(&order);
		let outcome = self.run_matching(taker, remaining);

		let mut removals = Vec::with_capacity(outcome.makers_to_remove.len() + 1);
		if replacing {
			removals.push((order_id.clone(), RemovalReason::Replaced));
		}
		removals.extend(outcome.makers_to_remove.iter().cloned());
		self.apply_removals(clob_pair_id, &removals, &mut updates);

		let failure = if outcome.status == OrderStatus::PostOnlyWouldCrossMakerOrder {
			Some((
				ClobError::PostOnlyWouldCrossMakerOrder,
				RemovalReason::PostOnlyWouldCrossMakerOrder,
			))
		} else if order.time_in_force == TimeInForce::FillOrKill && outcome.remaining > 0 {
			Some((
				ClobError::FokOrderCouldNotBeFullyFilled,
				RemovalReason::FillOrKillNotFullyFilled,
			))
		} else {
			None
		};
		if let Some((kind, reason)) = failure {
			debug!("Order {} rejected after matching: {}", order_id, kind);
			updates.push(removal(&order_id, reason, RemovalStatus::BestEffortCanceled));
			return Err(self.fail(kind, updates));
		}

		if !outcome.matches.is_empty() {
			self.apply_fills(&taker, &outcome, &mut updates);
			self.log_placement(&order, bytes.clone());
			self.operations
				.add_match(order_id.clone(), outcome.maker_fills());
		}

		let status = if !outcome.status.is_success() {
			Some(outcome.status)
		} else if outcome.remaining > 0 && order.time_in_force == TimeInForce::Ioc {
			Some(OrderStatus::ImmediateOrCancelWouldRestOnBook)
		} else {
			None
		};
		if let Some(status) = status {
			updates.push(OffchainUpdate::OrderRemove {
				order_id: order_id.clone(),
				reason: RemovalReason::from_status(status),
				status: RemovalStatus::BestEffortCanceled,
				order_status: Some(status),
			});
			self.assert_not_crossed(clob_pair_id);
			return Ok(PlaceOrderResult {
				filled_quantums: outcome.filled,
				status,
				offchain_updates: self.offchain(updates),
			});
		}

		if outcome.remaining > 0 {
			if outcome.matches.is_empty() {
				self.log_placement(&order, bytes);
				updates.push(OffchainUpdate::OrderUpdate {
					order_id: order_id.clone(),
					total_filled_quantums: self.get_order_filled_amount(&order_id),
				});
			}
			must_get_book_mut(&mut self.orderbooks, clob_pair_id).must_add_order(order.clone(), false);
		}

		self.assert_not_crossed(clob_pair_id);
		Ok(PlaceOrderResult {
			filled_quantums: outcome.filled,
			status: OrderStatus::Success,
			offchain_updates: self.offchain(updates),
		})
	}

	/// Match a liquidation against the book
	///
	/// The liquidation never rests and never replaces anything. Resting
	/// orders of the liquidated subaccount that cross are removed without
	/// a fill. A liquidation match is logged even when nothing filled.
	pub fn place_liquidation(
		&mut self,
		liquidation: LiquidationOrder,
	) -> Result<PlaceOrderResult, PlaceOrderError> {
		let clob_pair_id = liquidation.clob_pair_id;
		self.book(clob_pair_id)?;

		let mut updates = OffchainUpdates::new();
		let taker = Taker::Liquidation(&liquidation);
		let outcome = self.run_matching(taker, liquidation.quantums);

		self.apply_removals(clob_pair_id, &outcome.makers_to_remove, &mut updates);
		if !outcome.matches.is_empty() {
			self.apply_fills(&taker, &outcome, &mut updates);
		}
		self.operations
			.add_liquidation_match(liquidation.clone(), outcome.maker_fills());

		if self.config.verbose_logging {
			debug!(
				"Liquidation of {} filled {} of {} quantums",
				liquidation.subaccount_id, outcome.filled, liquidation.quantums
			);
		}

		self.assert_not_crossed(clob_pair_id);
		Ok(PlaceOrderResult {
			filled_quantums: outcome.filled,
			status: outcome.status,
			offchain_updates: self.offchain(updates),
		})
	}

	/// Cancel a short-term order until `good_til_block`
	///
	/// Replaces an existing cancellation only with a strictly later block.
	/// A resting order with this id is removed if it expires at or before
	/// the cancellation.
	///
	/// Panics if `order_id` is not a short-term order id.
	pub fn cancel_order(&mut self, order_id: &OrderId, good_til_block: u32) -> Result<OffchainUpdates, ClobError> {
		order_id.must_be_short_term();
		let book = self.book(order_id.clob_pair_id)?;

		let existing = book.cancels().get(order_id);
		if let Some(existing) = existing
			&& existing >= good_til_block
		{
			return Err(ClobError::CancelAlreadyExists);
		}

		let remove_resting = book
			.get_order(order_id)
			.and_then(Order::good_til_block)
			.is_some_and(|order_block| order_block <= good_til_block);

		let book = must_get_book_mut(&mut self.orderbooks, order_id.clob_pair_id);
		if remove_resting {
			book.must_remove_order(order_id);
		}
		if existing.is_some() {
			book.cancels_mut().remove(order_id);
		}
		book.cancels_mut().add(order_id.clone(), good_til_block);
		self.operations
			.add_cancellation(order_id.clone(), good_til_block);

		if self.config.verbose_logging {
			debug!("Canceled {} until block {}", order_id, good_til_block);
		}

		let mut updates = OffchainUpdates::new();
		updates.push(removal(
			order_id,
			RemovalReason::UserCanceled,
			RemovalStatus::BestEffortCanceled,
		));
		Ok(self.offchain(updates))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ledger::{MemoryCollateralizationCheck, MemoryFillLedger, MemoryPositionLedger};

	fn create_test_clob() -> MemClob {
		let mut clob = MemClob::new(
			MemClobConfig::default(),
			Box::new(MemoryCollateralizationCheck::new()),
			Box::new(MemoryFillLedger::new()),
			Box::new(MemoryPositionLedger::new()),
		);
		clob.create_orderbook(ClobPair {
			id: ClobPairId(0),
			subticks_per_tick: 5,
			min_order_base_quantums: 1,
			quantum_conversion_exponent: 0,
			perpetual_id: Some(0),
		});
		clob
	}

	fn create_test_order(owner: &str, client_id: u32, side: Side, quantums: u64, subticks: u64) -> Order {
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
			good_til: GoodTil::Block(20),
			time_in_force: TimeInForce::Unspecified,
			reduce_only: false,
		}
	}

	#[test]
	fn test_validate_rejects_bad_orders() {
		let mut clob = create_test_clob();

		let mut order = create_test_order("alice", 1, Side::Unspecified, 10, 50);
		assert!(matches!(
			clob.place_order(order.clone()).map_err(|e| e.kind),
			Err(ClobError::InvalidOrderSide)
		));

		order.side = Side::Buy;
		order.subticks = 52;
		assert!(matches!(
			clob.place_order(order.clone()).map_err(|e| e.kind),
			Err(ClobError::InvalidOrder(_))
		));

		order.subticks = 50;
		order.good_til = GoodTil::BlockTime(100);
		assert!(matches!(
			clob.place_order(order.clone()).map_err(|e| e.kind),
			Err(ClobError::InvalidOrder(_))
		));

		order.order_id.clob_pair_id = ClobPairId(9);
		assert!(matches!(
			clob.place_order(order).map_err(|e| e.kind),
			Err(ClobError::OrderbookNotFound(ClobPairId(9)))
		));
		assert!(clob.operations().is_empty());
	}

	#[test]
	fn test_resting_order_is_logged_once() {
		let mut clob = create_test_clob();
		let order = create_test_order("alice", 1, Side::Buy, 10, 50);

		let result = clob.place_order(order.clone()).unwrap();
		assert_eq!(result.status, OrderStatus::Success);
		assert_eq!(result.filled_quantums, 0);
		assert_eq!(clob.get_order(&order.order_id), Some(&order));
		assert_eq!(clob.operations().len(), 1);
	}

	#[test]
	fn test_replacement_requires_precedence() {
		let mut clob = create_test_clob();
		let order = create_test_order("alice", 1, Side::Buy, 10, 50);
		clob.place_order(order.clone()).unwrap();

		let err = clob.place_order(order.clone()).unwrap_err();
		assert!(matches!(err.kind, ClobError::InvalidReplacement(_)));

		let mut flipped = order.clone();
		flipped.good_til = GoodTil::Block(21);
		flipped.side = Side::Sell;
		let err = clob.place_order(flipped).unwrap_err();
		assert!(matches!(err.kind, ClobError::InvalidReplacement(_)));

		let mut later = order.clone();
		later.good_til = GoodTil::Block(21);
		later.subticks = 55;
		let result = clob.place_order(later.clone()).unwrap();
		assert_eq!(
			result.offchain_updates.removal_reasons(&order.order_id),
			vec![RemovalReason::Replaced]
		);
		assert_eq!(clob.get_order(&order.order_id), Some(&later));
		assert_eq!(clob.orderbook(ClobPairId(0)).unwrap().best_bid(), 55);
	}

	#[test]
	fn test_offchain_updates_can_be_disabled() {
		let mut clob = create_test_clob();
		clob.config.generate_offchain_updates = false;

		let result = clob
			.place_order(create_test_order("alice", 1, Side::Buy, 10, 50))
			.unwrap();
		assert!(result.offchain_updates.is_empty());
	}

	#[test]
	fn test_mid_price() {
		let mut clob = create_test_clob();
		assert_eq!(clob.get_mid_price(ClobPairId(0)).unwrap(), None);

		let bid = create_test_order("alice", 1, Side::Buy, 10, 50);
		let ask = create_test_order("bob", 2, Side::Sell, 10, 65);
		clob.place_order(bid.clone()).unwrap();
		assert_eq!(clob.get_mid_price(ClobPairId(0)).unwrap(), None);

		clob.place_order(ask.clone()).unwrap();
		let mid = clob.get_mid_price(ClobPairId(0)).unwrap().unwrap();
		assert_eq!(mid.subticks, 57);
		assert_eq!(mid.best_bid, bid);
		assert_eq!(mid.best_ask, ask);
	}

	#[test]
	fn test_subaccount_orders_rejects_unspecified_side() {
		let clob = create_test_clob();
		let alice = SubaccountId::new("alice", 0);
		assert!(matches!(
			clob.get_subaccount_orders(ClobPairId(0), &alice, Side::Unspecified),
			Err(ClobError::InvalidOrderSide)
		));
		assert!(clob
			.get_subaccount_orders(ClobPairId(0), &alice, Side::Buy)
			.unwrap()
			.is_empty());
	}

	#[test]
	fn test_maybe_create_orderbook_is_idempotent() {
		let mut clob = create_test_clob();
		let pair = clob.clob_pairs[&ClobPairId(0)].clone();
		assert!(!clob.maybe_create_orderbook(pair.clone()));

		let mut other = pair;
		other.id = ClobPairId(1);
		assert!(clob.maybe_create_orderbook(other));
		assert!(clob.orderbook(ClobPairId(1)).is_some());
	}

	#[test]
	#[should_panic(expected = "already exists")]
	fn test_duplicate_orderbook_panics() {
		let mut clob = create_test_clob();
		let pair = clob.clob_pairs[&ClobPairId(0)].clone();
		clob.create_orderbook(pair);
	}
}
