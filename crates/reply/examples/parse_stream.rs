use bytes::BytesMut;
use reply::Arena;
use reply::RedisReply;
use reply::ReplyParseResult;
use reply::ReplyParser;

fn main() {
	println!("--- Reply Streaming Parse Example ---");

	// Simulate a TCP stream with fragmented data
	// We are receiving:
	// - A Status: "+OK\r\n"
	// - An Integer: ":1000\r\n"
	// - An Array: "*2\r\n$3\r\nfoo\r\n*1\r\n$-1\r\n"
	// - But split into random chunks.
	let data_chunks = vec![
		b"+O".as_slice(),
		b"K\r\n:1".as_slice(),
		b"00".as_slice(),
		b"0\r\n*2\r\n$3\r\nfo".as_slice(),
		b"o\r\n*1\r\n$".as_slice(),
		b"-1\r\n".as_slice(),
	];

	let mut parser = ReplyParser::new();
	let mut arena = Arena::new();
	let mut buffer = BytesMut::new();
	let mut reply = RedisReply::default();

	for (i, chunk) in data_chunks.iter().enumerate() {
		println!(
			"\n[Stream] Received Chunk {}: {:?}",
			i,
			String::from_utf8_lossy(chunk)
		);

		buffer.extend_from_slice(chunk);

		loop {
			match parser.parse(&mut reply, &mut buffer, &mut arena) {
				ReplyParseResult::Complete => {
					println!("[Parser] Complete: {}", reply.view(&arena));
					// Start over for the next reply in the buffer.
					reply = RedisReply::default();
					arena.reset();
				}
				ReplyParseResult::Incomplete => {
					println!(
						"[Parser] Incomplete (cursor {:?}), waiting for more data...",
						reply.resume_cursor()
					);
					break;
				}
				ReplyParseResult::Error(e) => {
					eprintln!("[Parser] Error: {}", e);
					return;
				}
			}
		}
	}
}
