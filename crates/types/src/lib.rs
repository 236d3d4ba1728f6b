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

//! Perp Types - shared value types for the in-memory CLOB
//!
//! This crate defines the identifiers, orders and matching outcomes that
//! flow between the order book, the matching engine and its external
//! collaborators.
//!
//! The crate is deliberately passive:
//! - No background threads
//! - No logging or configuration loading
//! - Only encoding, hashing and ordering helpers

pub mod clob_pair;
pub mod order;
pub mod status;
pub mod subaccount;

pub use clob_pair::{ClobPair, ClobPairId};
pub use order::{
	GoodTil, LiquidationOrder, Order, OrderFlags, OrderHash, OrderHashError, OrderId, Side,
	TimeInForce,
};
pub use status::{MakerFill, OrderStatus, PendingOpenOrder, RemovalReason, UpdateResult};
pub use subaccount::SubaccountId;
