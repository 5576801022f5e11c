//! Reply value representation.

use std::fmt;

use crate::arena::Arena;
use crate::arena::ByteSpan;
use crate::arena::ReplySpan;
use crate::error::AllocError;

/// Strings shorter than this are stored inline in the reply itself.
pub const INLINE_CAPACITY: usize = 16;

/// Size of the stack buffer tried first by [`RedisReply::format_string`].
const FORMAT_STACK_SIZE: usize = 64;

/// Kind of a reply, independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyKind {
	Status,
	Error,
	Integer,
	BulkString,
	Array,
	Nil,
}

impl ReplyKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ReplyKind::BulkString => "string",
			ReplyKind::Array => "array",
			ReplyKind::Integer => "integer",
			ReplyKind::Nil => "nil",
			ReplyKind::Status => "status",
			ReplyKind::Error => "error",
		}
	}
}

impl fmt::Display for ReplyKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The reply kinds that carry a byte string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
	Status,
	Error,
	BulkString,
}

/// String payload: inline when shorter than [`INLINE_CAPACITY`], otherwise
/// a NUL-terminated run in the arena.
#[derive(Debug, Clone, Copy)]
pub enum Text {
	Inline {
		len: u8,
		buf: [u8; INLINE_CAPACITY],
	},
	Arena(ByteSpan),
}

impl Text {
	pub(crate) fn new(data: &[u8], arena: &mut Arena) -> Result<Self, AllocError> {
		if data.len() < INLINE_CAPACITY {
			let mut buf = [0u8; INLINE_CAPACITY];
			buf[..data.len()].copy_from_slice(data);
			Ok(Text::Inline {
				len: data.len() as u8,
				buf,
			})
		} else {
			Ok(Text::Arena(arena.alloc_bytes(data)?))
		}
	}

	pub fn len(&self) -> usize {
		match self {
			Text::Inline { len, .. } => *len as usize,
			Text::Arena(span) => span.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn is_inline(&self) -> bool {
		matches!(self, Text::Inline { .. })
	}

	pub fn as_bytes<'a>(&'a self, arena: &'a Arena) -> &'a [u8] {
		match self {
			Text::Inline { len, buf } => &buf[..*len as usize],
			Text::Arena(span) => arena.bytes(*span),
		}
	}
}

/// Array payload: the children plus the resume cursor of a suspended parse.
#[derive(Debug, Clone, Copy)]
pub struct ReplyArray {
	elements: Option<ReplySpan>,
	resume: Option<usize>,
	// Children reserved by the parser for the whole reply, kept on the root.
	reserved: usize,
}

impl ReplyArray {
	pub(crate) fn empty() -> Self {
		Self {
			elements: None,
			resume: None,
			reserved: 0,
		}
	}

	pub(crate) fn with_elements(span: ReplySpan) -> Self {
		Self {
			elements: Some(span),
			resume: None,
			reserved: 0,
		}
	}

	pub fn len(&self) -> usize {
		self.elements.map_or(0, |span| span.len())
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Index of the next child to parse while the array is suspended.
	pub fn resume_cursor(&self) -> Option<usize> {
		self.resume
	}

	pub(crate) fn elements(&self) -> Option<ReplySpan> {
		self.elements
	}

	pub(crate) fn set_resume(&mut self, cursor: Option<usize>) {
		self.resume = cursor;
	}

	pub(crate) fn reserved(&self) -> usize {
		self.reserved
	}

	pub(crate) fn set_reserved(&mut self, reserved: usize) {
		self.reserved = reserved;
	}
}

/// A RESP reply.
///
/// Long strings and array children live in an [`Arena`]; every accessor that
/// reads them takes the arena the reply was built in. A reply never frees
/// anything, it is reclaimed with its arena.
#[derive(Debug, Clone, Copy, Default)]
pub enum RedisReply {
	/// No value yet, or `$-1` / `*-1` on the wire
	#[default]
	Nil,

	/// Status: `+OK\r\n`
	Status(Text),

	/// Error: `-ERR message\r\n`
	Error(Text),

	/// Integer: `:1000\r\n`
	Integer(i64),

	/// Bulk string: `$6\r\nfoobar\r\n`
	String(Text),

	/// Array: `*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n`
	Array(ReplyArray),
}

impl RedisReply {
	pub fn nil() -> Self {
		RedisReply::Nil
	}

	pub fn integer(value: i64) -> Self {
		RedisReply::Integer(value)
	}

	pub fn status(data: impl AsRef<[u8]>, arena: &mut Arena) -> Result<Self, AllocError> {
		Self::string(StringKind::Status, data, arena)
	}

	pub fn error(data: impl AsRef<[u8]>, arena: &mut Arena) -> Result<Self, AllocError> {
		Self::string(StringKind::Error, data, arena)
	}

	pub fn bulk_string(data: impl AsRef<[u8]>, arena: &mut Arena) -> Result<Self, AllocError> {
		Self::string(StringKind::BulkString, data, arena)
	}

	/// A string reply of `kind` holding a copy of `data`.
	///
	/// Status and error texts are single lines on the wire, so `data` must
	/// not contain CRLF for them; only bulk strings may carry arbitrary bytes.
	pub fn string(
		kind: StringKind,
		data: impl AsRef<[u8]>,
		arena: &mut Arena,
	) -> Result<Self, AllocError> {
		let data = data.as_ref();
		debug_assert!(
			kind == StringKind::BulkString || memchr::memmem::find(data, b"\r\n").is_none(),
			"{:?} text must not contain CRLF",
			kind
		);
		let text = Text::new(data, arena)?;
		Ok(match kind {
			StringKind::Status => RedisReply::Status(text),
			StringKind::Error => RedisReply::Error(text),
			StringKind::BulkString => RedisReply::String(text),
		})
	}

	/// An array of `size` `Nil` children.
	pub fn array(size: usize, arena: &mut Arena) -> Result<Self, AllocError> {
		if size == 0 {
			return Ok(RedisReply::Array(ReplyArray::empty()));
		}
		let span = arena.alloc_replies(size)?;
		Ok(RedisReply::Array(ReplyArray::with_elements(span)))
	}

	pub fn kind(&self) -> ReplyKind {
		match self {
			RedisReply::Nil => ReplyKind::Nil,
			RedisReply::Status(_) => ReplyKind::Status,
			RedisReply::Error(_) => ReplyKind::Error,
			RedisReply::Integer(_) => ReplyKind::Integer,
			RedisReply::String(_) => ReplyKind::BulkString,
			RedisReply::Array(_) => ReplyKind::Array,
		}
	}

	/// Byte length of a string, element count of an array, zero otherwise.
	pub fn len(&self) -> usize {
		match self {
			RedisReply::Status(text) | RedisReply::Error(text) | RedisReply::String(text) => {
				text.len()
			}
			RedisReply::Array(array) => array.len(),
			RedisReply::Integer(_) | RedisReply::Nil => 0,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn is_nil(&self) -> bool {
		matches!(self, RedisReply::Nil)
	}

	pub fn is_error(&self) -> bool {
		matches!(self, RedisReply::Error(_))
	}

	pub fn is_status(&self) -> bool {
		matches!(self, RedisReply::Status(_))
	}

	pub fn is_integer(&self) -> bool {
		matches!(self, RedisReply::Integer(_))
	}

	pub fn is_string(&self) -> bool {
		matches!(self, RedisReply::String(_))
	}

	pub fn is_array(&self) -> bool {
		matches!(self, RedisReply::Array(_))
	}

	pub fn integer_value(&self) -> Option<i64> {
		match self {
			RedisReply::Integer(i) => Some(*i),
			_ => None,
		}
	}

	pub(crate) fn text(&self) -> Option<&Text> {
		match self {
			RedisReply::Status(text) | RedisReply::Error(text) | RedisReply::String(text) => {
				Some(text)
			}
			_ => None,
		}
	}

	/// Bytes of a status, error or bulk string.
	pub fn data<'a>(&'a self, arena: &'a Arena) -> Option<&'a [u8]> {
		self.text().map(|text| text.as_bytes(arena))
	}

	/// Try to convert a string reply to a string slice
	pub fn as_str<'a>(&'a self, arena: &'a Arena) -> Option<&'a str> {
		self.data(arena).and_then(|b| std::str::from_utf8(b).ok())
	}

	pub fn error_message<'a>(&'a self, arena: &'a Arena) -> Option<&'a [u8]> {
		match self {
			RedisReply::Error(text) => Some(text.as_bytes(arena)),
			_ => None,
		}
	}

	/// Whether string bytes are stored inline rather than in the arena.
	pub fn is_inline(&self) -> bool {
		self.text().is_some_and(Text::is_inline)
	}

	pub fn resume_cursor(&self) -> Option<usize> {
		match self {
			RedisReply::Array(array) => array.resume_cursor(),
			_ => None,
		}
	}

	/// No-op for anything but an array.
	pub(crate) fn set_resume_cursor(&mut self, cursor: Option<usize>) {
		if let RedisReply::Array(array) = self {
			array.set_resume(cursor);
		}
	}

	/// Children reserved so far for the reply rooted here. Zero for
	/// anything but an array.
	pub(crate) fn reserved_items(&self) -> usize {
		match self {
			RedisReply::Array(array) => array.reserved(),
			_ => 0,
		}
	}

	pub(crate) fn set_reserved_items(&mut self, reserved: usize) {
		if let RedisReply::Array(array) = self {
			array.set_reserved(reserved);
		}
	}

	pub(crate) fn element_span(&self) -> Option<ReplySpan> {
		match self {
			RedisReply::Array(array) => array.elements(),
			_ => None,
		}
	}

	/// Children of an array; empty for every other kind.
	pub fn elements<'a>(&self, arena: &'a Arena) -> &'a [RedisReply] {
		match self {
			RedisReply::Array(array) => match array.elements() {
				Some(span) => arena.replies(span),
				None => &[],
			},
			_ => &[],
		}
	}

	pub fn element<'a>(&self, index: usize, arena: &'a Arena) -> Option<&'a RedisReply> {
		self.elements(arena).get(index)
	}

	pub fn element_mut<'a>(&self, index: usize, arena: &'a mut Arena) -> Option<&'a mut RedisReply> {
		match self {
			RedisReply::Array(array) => array
				.elements()
				.and_then(|span| arena.replies_mut(span).get_mut(index)),
			_ => None,
		}
	}

	/// Bind the reply to its arena for comparison and printing.
	pub fn view<'a>(&'a self, arena: &'a Arena) -> ReplyView<'a> {
		ReplyView { reply: self, arena }
	}

	pub fn swap(&mut self, other: &mut RedisReply) {
		std::mem::swap(self, other);
	}

	pub fn set_nil(&mut self) {
		*self = RedisReply::Nil;
	}

	pub fn set_integer(&mut self, value: i64) {
		*self = RedisReply::Integer(value);
	}

	/// Replace the value with an array of `size` `Nil` children.
	///
	/// The previous payload is abandoned in its arena. On failure the reply
	/// is left `Nil`.
	pub fn set_array(&mut self, size: usize, arena: &mut Arena) -> Result<(), AllocError> {
		self.set_nil();
		*self = Self::array(size, arena)?;
		Ok(())
	}

	/// Same precondition as [`RedisReply::string`].
	pub fn set_string(
		&mut self,
		kind: StringKind,
		data: impl AsRef<[u8]>,
		arena: &mut Arena,
	) -> Result<(), AllocError> {
		self.set_nil();
		*self = Self::string(kind, data, arena)?;
		Ok(())
	}

	pub fn set_status(&mut self, data: impl AsRef<[u8]>, arena: &mut Arena) -> Result<(), AllocError> {
		self.set_string(StringKind::Status, data, arena)
	}

	pub fn set_error(&mut self, data: impl AsRef<[u8]>, arena: &mut Arena) -> Result<(), AllocError> {
		self.set_string(StringKind::Error, data, arena)
	}

	pub fn set_bulk_string(
		&mut self,
		data: impl AsRef<[u8]>,
		arena: &mut Arena,
	) -> Result<(), AllocError> {
		self.set_string(StringKind::BulkString, data, arena)
	}

	/// Render `args` and store the text as a string of `kind`.
	///
	/// Short renderings never touch the heap; longer ones fall back to a
	/// `String`. See also [`format_reply!`](crate::format_reply).
	pub fn format_string(
		&mut self,
		kind: StringKind,
		args: fmt::Arguments<'_>,
		arena: &mut Arena,
	) -> Result<(), AllocError> {
		let mut stack = StackBuf::new();
		if fmt::Write::write_fmt(&mut stack, args).is_ok() {
			return self.set_string(kind, stack.as_bytes(), arena);
		}
		let text = fmt::format(args);
		self.set_string(kind, text.as_bytes(), arena)
	}
}

/// Format into a reply without allocating for short texts.
///
/// ```rust
/// use reply::{Arena, RedisReply, StringKind, format_reply};
///
/// let mut arena = Arena::new();
/// let mut reply = RedisReply::default();
/// format_reply!(reply, StringKind::Status, &mut arena, "{} keys", 3).unwrap();
/// assert_eq!(reply.as_str(&arena), Some("3 keys"));
/// ```
#[macro_export]
macro_rules! format_reply {
	($reply:expr, $kind:expr, $arena:expr, $($arg:tt)*) => {
		$reply.format_string($kind, ::std::format_args!($($arg)*), $arena)
	};
}

struct StackBuf {
	buf: [u8; FORMAT_STACK_SIZE],
	len: usize,
}

impl StackBuf {
	fn new() -> Self {
		Self {
			buf: [0u8; FORMAT_STACK_SIZE],
			len: 0,
		}
	}

	fn as_bytes(&self) -> &[u8] {
		&self.buf[..self.len]
	}
}

impl fmt::Write for StackBuf {
	fn write_str(&mut self, s: &str) -> fmt::Result {
		let end = self.len + s.len();
		if end > FORMAT_STACK_SIZE {
			return Err(fmt::Error);
		}
		self.buf[self.len..end].copy_from_slice(s.as_bytes());
		self.len = end;
		Ok(())
	}
}

/// A reply bound to the arena holding its data.
///
/// Equality is structural: two views are equal when kind, length, content
/// and every child match, whichever arenas they live in.
#[derive(Clone, Copy)]
pub struct ReplyView<'a> {
	pub(crate) reply: &'a RedisReply,
	pub(crate) arena: &'a Arena,
}

impl<'a> ReplyView<'a> {
	pub fn reply(&self) -> &'a RedisReply {
		self.reply
	}

	pub fn arena(&self) -> &'a Arena {
		self.arena
	}

	pub fn kind(&self) -> ReplyKind {
		self.reply.kind()
	}

	pub fn data(&self) -> Option<&'a [u8]> {
		self.reply.data(self.arena)
	}

	pub fn children(&self) -> impl Iterator<Item = ReplyView<'a>> + use<'a> {
		let arena = self.arena;
		self.reply
			.elements(arena)
			.iter()
			.map(move |child| child.view(arena))
	}
}

impl PartialEq for ReplyView<'_> {
	fn eq(&self, other: &Self) -> bool {
		match (self.reply, other.reply) {
			(RedisReply::Nil, RedisReply::Nil) => true,
			(RedisReply::Integer(a), RedisReply::Integer(b)) => a == b,
			(RedisReply::Status(a), RedisReply::Status(b))
			| (RedisReply::Error(a), RedisReply::Error(b))
			| (RedisReply::String(a), RedisReply::String(b)) => {
				a.as_bytes(self.arena) == b.as_bytes(other.arena)
			}
			(RedisReply::Array(a), RedisReply::Array(b)) => {
				a.len() == b.len() && self.children().eq(other.children())
			}
			_ => false,
		}
	}
}

impl fmt::Debug for ReplyView<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.reply {
			RedisReply::Nil => f.write_str("Nil"),
			RedisReply::Integer(i) => f.debug_tuple("Integer").field(i).finish(),
			RedisReply::Status(text) => f
				.debug_tuple("Status")
				.field(&String::from_utf8_lossy(text.as_bytes(self.arena)))
				.finish(),
			RedisReply::Error(text) => f
				.debug_tuple("Error")
				.field(&String::from_utf8_lossy(text.as_bytes(self.arena)))
				.finish(),
			RedisReply::String(text) => f
				.debug_tuple("BulkString")
				.field(&String::from_utf8_lossy(text.as_bytes(self.arena)))
				.finish(),
			RedisReply::Array(_) => {
				f.write_str("Array(")?;
				f.debug_list().entries(self.children()).finish()?;
				f.write_str(")")
			}
		}
	}
}
