//! Moving replies between arenas.

use crate::arena::Arena;
use crate::error::AllocError;
use crate::types::RedisReply;

impl RedisReply {
	/// Deep-copy `src`, which lives in `src_arena`, into `dest`.
	///
	/// Use this when a reply must outlive the arena it was parsed into. A
	/// suspended array keeps its cursor; its finished children and the
	/// suspended child array it is waiting on are copied, so parsing can go
	/// on against `dest`.
	pub fn copy_from_different_arena(
		&mut self,
		dest: &mut Arena,
		src: &RedisReply,
		src_arena: &Arena,
	) -> Result<(), AllocError> {
		*self = copy_value(src, src_arena, dest)?;
		Ok(())
	}

	/// Shallow copy. Both replies keep pointing into the same arena.
	pub fn copy_from_same_arena(&mut self, src: &RedisReply) {
		*self = *src;
	}
}

fn copy_value(src: &RedisReply, src_arena: &Arena, dest: &mut Arena) -> Result<RedisReply, AllocError> {
	match src {
		RedisReply::Status(text) if !text.is_inline() => {
			RedisReply::status(text.as_bytes(src_arena), dest)
		}
		RedisReply::Error(text) if !text.is_inline() => {
			RedisReply::error(text.as_bytes(src_arena), dest)
		}
		RedisReply::String(text) if !text.is_inline() => {
			RedisReply::bulk_string(text.as_bytes(src_arena), dest)
		}
		RedisReply::Nil
		| RedisReply::Integer(_)
		| RedisReply::Status(_)
		| RedisReply::Error(_)
		| RedisReply::String(_) => Ok(*src),
		RedisReply::Array(_) => {
			let mut copy = RedisReply::array(src.len(), dest)?;
			let children = src.elements(src_arena);
			// Past the child in progress a suspended array holds only `Nil`.
			let end = match src.resume_cursor() {
				Some(cursor) => (cursor + 1).min(children.len()),
				None => children.len(),
			};
			for (index, child) in children[..end].iter().enumerate() {
				let child = copy_value(child, src_arena, dest)?;
				if let Some(slot) = copy.element_mut(index, dest) {
					*slot = child;
				}
			}
			copy.set_resume_cursor(src.resume_cursor());
			copy.set_reserved_items(src.reserved_items());
			Ok(copy)
		}
	}
}
