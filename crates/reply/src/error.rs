//! Error types for RESP reply parsing and encoding.

use thiserror::Error;

/// Main error type for a failed parse.
///
/// Protocol violations and arena exhaustion are kept apart: the former means
/// the peer sent garbage, the latter means the arena was sized too small.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReplyError {
	/// Error during parsing
	#[error("Parse error: {0}")]
	Parse(#[from] ParseError),

	/// The arena could not satisfy an allocation
	#[error("Allocation error: {0}")]
	Alloc(#[from] AllocError),
}

impl ReplyError {
	/// Whether the input itself violated the protocol.
	pub fn is_malformed(&self) -> bool {
		matches!(self, ReplyError::Parse(_))
	}
}

/// Protocol violations found while parsing.
///
/// The stream that produced any of these cannot be resynchronised and
/// should be dropped together with its connection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
	/// Invalid type marker encountered
	#[error("Invalid type marker: 0x{0:02X}")]
	InvalidTypeMarker(u8),

	/// Header is not a valid 64-bit decimal
	#[error("Invalid integer: {0}")]
	InvalidInteger(String),

	/// No CRLF within the header window
	#[error("Header is not terminated within {0} bytes")]
	HeaderTooLong(usize),

	/// Unterminated status or error line beyond the 32-bit ceiling
	#[error("Simple string is too long: {0} bytes without CRLF")]
	LineTooLong(usize),

	/// Bulk string length exceeds the allocation limit
	#[error("Bulk string exceeds max allocation size: {len} > {max}")]
	BulkStringTooLarge { len: i64, max: usize },

	/// Array element count exceeds the allocation limit
	#[error("Array exceeds max allocation size: {count} > {max} elements")]
	ArrayTooLarge { count: i64, max: usize },

	/// Children reserved by one reply, summed over every nested array,
	/// exceed the allocation limit
	#[error("Reply reserves too many elements: {total} > {max}")]
	TooManyItems { total: usize, max: usize },

	/// Bulk string payload not followed by CRLF
	#[error("Bulk string is not ended with CRLF")]
	MissingCrlf,

	/// Arrays nested deeper than allowed
	#[error("Nesting too deep: depth {0} exceeds limit")]
	NestingTooDeep(usize),
}

impl From<std::str::Utf8Error> for ParseError {
	fn from(e: std::str::Utf8Error) -> Self {
		ParseError::InvalidInteger(e.to_string())
	}
}

impl From<std::num::ParseIntError> for ParseError {
	fn from(e: std::num::ParseIntError) -> Self {
		ParseError::InvalidInteger(e.to_string())
	}
}

/// Arena allocation failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocError {
	/// The arena's byte budget cannot fit the request
	#[error("Arena exhausted: requested {requested} bytes, {available} available")]
	Exhausted { requested: usize, available: usize },
}

/// Errors that can occur during RESP encoding.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
	/// A `Nil` reply has no wire form; a value was never assigned
	#[error("Nil reply cannot be serialized, was a value ever set?")]
	Nil,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_is_malformed() {
		let err: ReplyError = ParseError::MissingCrlf.into();
		assert!(err.is_malformed());

		let err: ReplyError = AllocError::Exhausted {
			requested: 64,
			available: 8,
		}
		.into();
		assert!(!err.is_malformed());
	}

	#[test]
	fn test_display() {
		assert_eq!(
			ParseError::InvalidTypeMarker(b'?').to_string(),
			"Invalid type marker: 0x3F"
		);
		assert_eq!(
			ParseError::BulkStringTooLarge { len: 10, max: 4 }.to_string(),
			"Bulk string exceeds max allocation size: 10 > 4"
		);
	}

	#[test]
	fn test_from_parse_int_error() {
		let err: ParseError = "12x".parse::<i64>().unwrap_err().into();
		assert!(matches!(err, ParseError::InvalidInteger(_)));
	}
}
