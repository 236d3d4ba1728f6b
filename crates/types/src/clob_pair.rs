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

use std::fmt;

use serde::{Deserialize, Serialize};

/// Trading pair identifier
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ClobPairId(pub u32);

impl fmt::Display for ClobPairId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Static parameters of a trading pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClobPair {
	pub id: ClobPairId,
	/// Every order price must be a multiple of this value
	pub subticks_per_tick: u64,
	/// Smallest remaining size an order may rest or match with
	pub min_order_base_quantums: u64,
	/// Power of ten applied to `subticks * quantums` to obtain quote quantums
	pub quantum_conversion_exponent: i32,
	/// Set for perpetual markets, `None` otherwise
	pub perpetual_id: Option<u32>,
}

impl ClobPair {
	pub fn is_perpetual(&self) -> bool {
		self.perpetual_id.is_some()
	}
}
