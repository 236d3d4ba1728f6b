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

use perp_types::Order;
use slab::Slab;

/// Stable handle to a resting order inside the book's node arena
///
/// A handle stays valid until the order is removed. The arena reuses
/// freed slots, so a handle must never be kept past removal.
pub type LevelOrderRef = usize;

/// Resting order linked into its price level
#[derive(Debug, Clone)]
pub struct LevelOrder {
	pub order: Order,
	prev: Option<LevelOrderRef>,
	next: Option<LevelOrderRef>,
}

impl LevelOrder {
	pub(crate) fn new(order: Order) -> Self {
		Self {
			order,
			prev: None,
			next: None,
		}
	}

	/// Next order at the same price in time priority
	pub fn next(&self) -> Option<LevelOrderRef> {
		self.next
	}
}

/// Price level in the order book
///
/// A level is a doubly linked FIFO over nodes stored in the book's arena.
/// It is only ever created with its first order and is dropped by the book
/// once its last order is unlinked, so `head` and `tail` are always set.
#[derive(Debug, Clone)]
pub struct Level {
	subticks: u64,
	head: LevelOrderRef,
	tail: LevelOrderRef,
	len: usize,
}

impl Level {
	pub(crate) fn with_order(subticks: u64, node: LevelOrderRef) -> Self {
		Self {
			subticks,
			head: node,
			tail: node,
			len: 1,
		}
	}

	pub fn subticks(&self) -> u64 {
		self.subticks
	}

	pub fn front(&self) -> LevelOrderRef {
		self.head
	}

	pub fn back(&self) -> LevelOrderRef {
		self.tail
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	pub(crate) fn push_back(&mut self, nodes: &mut Slab<LevelOrder>, node: LevelOrderRef) {
		let old_tail = self.tail;
		nodes[node].prev = Some(old_tail);
		nodes[node].next = None;
		nodes[old_tail].next = Some(node);
		self.tail = node;
		self.len += 1;
	}

	pub(crate) fn push_front(&mut self, nodes: &mut Slab<LevelOrder>, node: LevelOrderRef) {
		let old_head = self.head;
		nodes[node].next = Some(old_head);
		nodes[node].prev = None;
		nodes[old_head].prev = Some(node);
		self.head = node;
		self.len += 1;
	}

	/// Unlink `node` from this level in O(1)
	///
	/// The node stays in the arena; the caller frees it. Returns `true` if
	/// the level is now empty.
	pub(crate) fn unlink(&mut self, nodes: &mut Slab<LevelOrder>, node: LevelOrderRef) -> bool {
		let (prev, next) = {
			let n = &nodes[node];
			(n.prev, n.next)
		};

		match prev {
			Some(p) => nodes[p].next = next,
			None => {
				if let Some(n) = next {
					self.head = n;
				}
			}
		}
		match next {
			Some(n) => nodes[n].prev = prev,
			None => {
				if let Some(p) = prev {
					self.tail = p;
				}
			}
		}

		self.len -= 1;
		self.len == 0
	}

	/// Iterate the level's orders front to back
	pub fn iter<'a>(&self, nodes: &'a Slab<LevelOrder>) -> LevelIter<'a> {
		LevelIter {
			nodes,
			cur: Some(self.head),
		}
	}
}

pub struct LevelIter<'a> {
	nodes: &'a Slab<LevelOrder>,
	cur: Option<LevelOrderRef>,
}

impl<'a> Iterator for LevelIter<'a> {
	type Item = &'a Order;

	fn next(&mut self) -> Option<Self::Item> {
		let key = self.cur?;
		let node = &self.nodes[key];
		self.cur = node.next;
		Some(&node.order)
	}
}
