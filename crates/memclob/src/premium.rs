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

use perp_types::{ClobPair, Order, PendingOpenOrder, UpdateResult};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
	ledger::CollateralizationCheck,
	orderbook::{NO_BEST_ASK, NO_BEST_BID, Orderbook},
	types::ClobError,
};

const ONE_MILLION: u128 = 1_000_000;

/// Inputs of a premium vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumParams {
	/// Oracle price converted to subticks
	pub index_price_subticks: u64,
	/// Notional a hypothetical order walks through the book with
	pub impact_notional_quote_quantums: u128,
	/// Largest premium, in either direction, that may be voted
	pub max_abs_premium_vote_ppm: u64,
}

/// Price as an exact fraction of subticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ratio {
	num: u128,
	den: u128,
}

fn pow10(exponent: u32) -> Result<u128, ClobError> {
	10u128
		.checked_pow(exponent)
		.ok_or(ClobError::ArithmeticOverflow)
}

/// Quote quantums worth of `base_quantums` at `subticks`, rounded down
fn quote_quantums(subticks: u64, base_quantums: u64, exponent: i32) -> Result<u128, ClobError> {
	let raw = u128::from(subticks)
		.checked_mul(u128::from(base_quantums))
		.ok_or(ClobError::ArithmeticOverflow)?;
	let scale = pow10(exponent.unsigned_abs())?;
	if exponent >= 0 {
		raw.checked_mul(scale).ok_or(ClobError::ArithmeticOverflow)
	} else {
		Ok(raw / scale)
	}
}

/// Average price of spending the impact notional on one side of the book
///
/// Makers that could not rest their remaining size under the collateral
/// check are skipped. Returns `None` if the side cannot absorb the whole
/// notional.
fn impact_price(
	book: &Orderbook,
	clob_pair: &ClobPair,
	collateral: &mut dyn CollateralizationCheck,
	remaining: &impl Fn(&Order) -> u64,
	is_bid: bool,
	impact_notional: u128,
) -> Result<Option<Ratio>, ClobError> {
	let best = if is_bid { book.best_bid() } else { book.best_ask() };
	if impact_notional == 0 {
		return Ok(Some(Ratio {
			num: u128::from(best),
			den: 1,
		}));
	}

	let exponent = clob_pair.quantum_conversion_exponent;
	let mut notional_left = impact_notional;
	let mut full_base: u128 = 0;
	let mut partial: Option<(u128, u128)> = None;

	let mut cursor = book.best_order_on_side(is_bid);
	while let Some(node) = cursor {
		cursor = book.next_best_level_order(node);
		let maker = &book.level_order(node).order;
		let size = remaining(maker);
		if size == 0 {
			continue;
		}

		let result = collateral.add_order_check(
			maker.subaccount_id(),
			&PendingOpenOrder {
				remaining_quantums: size,
				is_buy: maker.is_buy(),
				subticks: maker.subticks,
				clob_pair_id: clob_pair.id,
			},
		);
		if !result.is_success() {
			if result == UpdateResult::UpdateCausedError {
				info!(
					"Skipping maker {} in impact walk: collateral check errored",
					maker.order_id
				);
			}
			continue;
		}

		let quote = quote_quantums(maker.subticks, size, exponent)?;
		if notional_left > quote {
			full_base += u128::from(size);
			notional_left -= quote;
		} else {
			partial = Some((
				notional_left
					.checked_mul(u128::from(size))
					.ok_or(ClobError::ArithmeticOverflow)?,
				quote,
			));
			notional_left = 0;
			break;
		}
	}

	if notional_left > 0 {
		return Ok(None);
	}

	// The fractional base of the last maker is rounded up to whole quantums.
	let base = match partial {
		Some((part_num, part_den)) => full_base.checked_add(part_num.div_ceil(part_den)),
		None => Some(full_base),
	}
	.ok_or(ClobError::ArithmeticOverflow)?;
	if base == 0 {
		return Ok(None);
	}

	// price = notional / (base * 10^exponent)
	let scale = pow10(exponent.unsigned_abs())?;
	let (num, den) = if exponent >= 0 {
		(Some(impact_notional), base.checked_mul(scale))
	} else {
		(impact_notional.checked_mul(scale), Some(base))
	};
	match (num, den) {
		(Some(num), Some(den)) => Ok(Some(Ratio { num, den })),
		_ => Err(ClobError::ArithmeticOverflow),
	}
}

/// Premium of the impact price over the index price, in parts per million
///
/// The bid side is used when the index is below the best bid and the ask
/// side when it is above the best ask; otherwise the premium is zero. The
/// result is truncated toward zero and clamped to the vote cap.
///
/// Panics if the book is crossed.
pub(crate) fn price_premium(
	book: &Orderbook,
	clob_pair: &ClobPair,
	collateral: &mut dyn CollateralizationCheck,
	remaining: impl Fn(&Order) -> u64,
	params: &PremiumParams,
) -> Result<i32, ClobError> {
	let cap = i32::try_from(params.max_abs_premium_vote_ppm)
		.map_err(|_| ClobError::PremiumCapOverflow(params.max_abs_premium_vote_ppm))?;
	if !clob_pair.is_perpetual() {
		return Err(ClobError::NonPerpetualClobPair(clob_pair.id));
	}
	let index = params.index_price_subticks;
	if index == 0 {
		return Err(ClobError::ZeroIndexPrice);
	}

	let (best_bid, best_ask) = (book.best_bid(), book.best_ask());
	if best_bid == NO_BEST_BID && best_ask == NO_BEST_ASK {
		return Ok(0);
	}
	if book.is_crossed() {
		panic!(
			"price_premium: orderbook {} is crossed: best bid {} >= best ask {}",
			clob_pair.id, best_bid, best_ask
		);
	}

	let is_bid = if best_bid != NO_BEST_BID && index < best_bid {
		true
	} else if best_ask != NO_BEST_ASK && index > best_ask {
		false
	} else {
		return Ok(0);
	};

	let Some(impact) = impact_price(
		book,
		clob_pair,
		collateral,
		&remaining,
		is_bid,
		params.impact_notional_quote_quantums,
	)?
	else {
		return Ok(0);
	};

	let index_scaled = u128::from(index)
		.checked_mul(impact.den)
		.ok_or(ClobError::ArithmeticOverflow)?;
	if (is_bid && impact.num <= index_scaled) || (!is_bid && impact.num >= index_scaled) {
		return Ok(0);
	}

	let to_i128 = |v: u128| i128::try_from(v).map_err(|_| ClobError::ArithmeticOverflow);
	let diff = to_i128(impact.num)? - to_i128(index_scaled)?;
	let premium = diff
		.checked_mul(ONE_MILLION as i128)
		.ok_or(ClobError::ArithmeticOverflow)?
		/ to_i128(index_scaled)?;

	let clamped = premium.clamp(-i128::from(cap), i128::from(cap));
	i32::try_from(clamped).map_err(|_| ClobError::ArithmeticOverflow)
}
