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

/// Trading account identifier
///
/// Ordering is by owner first, then by number. Every place that iterates
/// subaccounts (reduce-only sweeps, collateral checks) relies on this order
/// for deterministic output.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubaccountId {
	/// Address of the account owner
	pub owner: String,
	/// Subaccount number under the owner
	pub number: u32,
}

impl SubaccountId {
	pub fn new(owner: impl Into<String>, number: u32) -> Self {
		Self {
			owner: owner.into(),
			number,
		}
	}
}

impl fmt::Display for SubaccountId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.owner, self.number)
	}
}
