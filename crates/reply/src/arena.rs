//! Bump arena owning the long strings and child replies of a parse session.
//!
//! Allocations are addressed by typed spans instead of pointers. Nothing is
//! freed individually; [`Arena::reset`] reclaims everything at once.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use log::error;
use log::trace;

use crate::error::AllocError;
use crate::types::RedisReply;

static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an arena generation. Changes on every [`Arena::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaId(u64);

impl ArenaId {
	fn next() -> Self {
		ArenaId(NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed))
	}
}

/// A NUL-terminated byte run inside an arena. `len` excludes the terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSpan {
	arena: ArenaId,
	offset: usize,
	len: usize,
}

impl ByteSpan {
	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	pub fn arena(&self) -> ArenaId {
		self.arena
	}
}

/// A contiguous run of child replies inside an arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplySpan {
	arena: ArenaId,
	start: usize,
	len: usize,
}

impl ReplySpan {
	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	pub fn arena(&self) -> ArenaId {
		self.arena
	}
}

/// Bulk-lifetime allocator for reply data.
///
/// An optional byte budget makes exhaustion observable: once the accounted
/// footprint would exceed it, allocations fail with
/// [`AllocError::Exhausted`].
#[derive(Debug)]
pub struct Arena {
	id: ArenaId,
	bytes: Vec<u8>,
	replies: Vec<RedisReply>,
	allocated: usize,
	limit: Option<usize>,
}

impl Default for Arena {
	fn default() -> Self {
		Self::new()
	}
}

impl Arena {
	pub fn new() -> Self {
		Self {
			id: ArenaId::next(),
			bytes: Vec::new(),
			replies: Vec::new(),
			allocated: 0,
			limit: None,
		}
	}

	/// Create an arena that refuses to account more than `limit` bytes.
	pub fn with_limit(limit: usize) -> Self {
		Self {
			limit: Some(limit),
			..Self::new()
		}
	}

	pub fn id(&self) -> ArenaId {
		self.id
	}

	/// Accounted footprint of everything allocated since the last reset.
	pub fn allocated(&self) -> usize {
		self.allocated
	}

	pub fn limit(&self) -> Option<usize> {
		self.limit
	}

	pub fn is_empty(&self) -> bool {
		self.allocated == 0
	}

	/// Copy `data` into the arena followed by a NUL terminator.
	///
	/// Strings are accounted in 8-byte steps with room for the terminator.
	pub fn alloc_bytes(&mut self, data: &[u8]) -> Result<ByteSpan, AllocError> {
		self.charge((data.len() / 8 + 1) * 8)?;
		let offset = self.bytes.len();
		self.bytes.extend_from_slice(data);
		self.bytes.push(0);
		Ok(ByteSpan {
			arena: self.id,
			offset,
			len: data.len(),
		})
	}

	/// Reserve `count` contiguous `Nil` replies.
	pub fn alloc_replies(&mut self, count: usize) -> Result<ReplySpan, AllocError> {
		let cost = count.saturating_mul(std::mem::size_of::<RedisReply>());
		self.charge(cost)?;
		let start = self.replies.len();
		self.replies.resize(start + count, RedisReply::Nil);
		Ok(ReplySpan {
			arena: self.id,
			start,
			len: count,
		})
	}

	pub fn bytes(&self, span: ByteSpan) -> &[u8] {
		self.check_owner(span.arena);
		&self.bytes[span.offset..span.offset + span.len]
	}

	/// The span's bytes including the trailing NUL.
	pub fn bytes_with_nul(&self, span: ByteSpan) -> &[u8] {
		self.check_owner(span.arena);
		&self.bytes[span.offset..span.offset + span.len + 1]
	}

	pub fn replies(&self, span: ReplySpan) -> &[RedisReply] {
		self.check_owner(span.arena);
		&self.replies[span.start..span.start + span.len]
	}

	pub fn replies_mut(&mut self, span: ReplySpan) -> &mut [RedisReply] {
		self.check_owner(span.arena);
		&mut self.replies[span.start..span.start + span.len]
	}

	/// Drop every allocation at once.
	///
	/// Spans handed out before the reset belong to the old generation and
	/// must not be used with this arena again.
	pub fn reset(&mut self) {
		trace!(
			"resetting arena {:?} ({} bytes accounted)",
			self.id, self.allocated
		);
		self.bytes.clear();
		self.replies.clear();
		self.allocated = 0;
		self.id = ArenaId::next();
	}

	fn charge(&mut self, cost: usize) -> Result<(), AllocError> {
		if let Some(limit) = self.limit {
			let available = limit.saturating_sub(self.allocated);
			if cost > available {
				error!("Fail to allocate {} bytes from arena, {} available", cost, available);
				return Err(AllocError::Exhausted {
					requested: cost,
					available,
				});
			}
		}
		self.allocated += cost;
		Ok(())
	}

	#[inline]
	fn check_owner(&self, owner: ArenaId) {
		debug_assert_eq!(
			owner, self.id,
			"span belongs to another arena or to a previous generation"
		);
	}
}
