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

//! In-memory central limit order book for perpetual futures
//!
//! This crate holds the resting books of every trading pair, matches
//! incoming orders under price-time priority and records what it did in a
//! replayable operations log.
//!
//! Architecture:
//! - One `Orderbook` per trading pair: arena-backed levels with O(1) removal
//! - `MemClob` is the single writer of all books
//! - Margin, fills and positions live behind injected ledger traits
//! - The operations log rebuilds identical books through `clear_and_replay`
//! - Offchain updates describe book transitions for downstream indexers

pub mod config;
pub mod engine;
pub mod event;
pub mod ledger;
pub mod logging;
pub mod operations;
pub mod orderbook;
pub mod premium;
pub mod types;

pub use config::MemClobConfig;
pub use engine::{MemClob, PendingState};
pub use event::{OffchainUpdate, OffchainUpdates, RemovalStatus};
pub use ledger::{
	CollateralizationCheck, FillLedger, FillRecord, MemoryCollateralizationCheck, MemoryFillLedger,
	MemoryPositionLedger, PositionLedger,
};
pub use operations::{Operation, OperationsLog};
pub use orderbook::{CancelIndex, NO_BEST_ASK, NO_BEST_BID, Orderbook};
pub use premium::PremiumParams;
pub use types::*;
