//! Utility functions and constants for RESP protocol.

use crate::error::ParseError;

/// CRLF line ending
pub const CRLF: &[u8] = b"\r\n";

/// Type markers for RESP2
pub const SIMPLE_STRING: u8 = b'+';
pub const ERROR: u8 = b'-';
pub const INTEGER: u8 = b':';
pub const BULK_STRING: u8 = b'$';
pub const ARRAY: u8 = b'*';

/// Bytes examined when looking for the end of a decimal header: the type
/// marker, a sign, 20 digits, CRLF and some slack.
pub const HEADER_WINDOW: usize = 31;

/// Unterminated simple strings longer than this are rejected.
pub const MAX_LINE_LEN: usize = u32::MAX as usize;

/// Find the position of CRLF in a byte slice
#[inline]
pub fn find_crlf(buf: &[u8]) -> Option<usize> {
	memchr::memmem::find(buf, CRLF)
}

/// Parse an integer from a byte slice
///
/// The whole slice must be an optionally signed decimal that fits in an
/// `i64`; whitespace and overflow are rejected.
#[inline]
pub fn parse_integer(buf: &[u8]) -> Result<i64, ParseError> {
	let s = std::str::from_utf8(buf)?;
	s.parse::<i64>()
		.map_err(|e| ParseError::InvalidInteger(format!("`{}' {}", s, e)))
}
