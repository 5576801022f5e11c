use bytes::BytesMut;
use config::OutputMode;
use config::ReplyConfig;
use log::debug;
use log::warn;
use reply::Arena;
use reply::EncodeError;
use reply::RedisReply;
use reply::ReplyEncoder;
use reply::ReplyParseResult;
use reply::ReplyParser;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;

/// Decodes every reply read from `reader` and writes it to `writer`.
pub struct DumpSession<R, W> {
	reader: R,
	writer: W,
	parser: ReplyParser,
	arena: Arena,
	output: OutputMode,
	chunk_size: usize,
}

impl<R, W> DumpSession<R, W>
where
	R: AsyncRead + Unpin,
	W: AsyncWrite + Unpin,
{
	pub fn new(reader: R, writer: W, config: &ReplyConfig) -> Self {
		let arena = match config.arena_limit {
			Some(limit) => Arena::with_limit(limit),
			None => Arena::new(),
		};
		Self {
			reader,
			writer,
			parser: ReplyParser::with_config(config.parser_config()),
			arena,
			output: config.output,
			chunk_size: config.chunk_size,
		}
	}

	/// Run until end of input. Returns the number of replies decoded.
	pub async fn run(&mut self) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
		let mut buffer = BytesMut::with_capacity(self.chunk_size);
		let mut chunk = vec![0u8; self.chunk_size];
		let mut reply = RedisReply::default();
		let mut count = 0;

		loop {
			let n = self.reader.read(&mut chunk).await?;
			debug!("Read {} bytes from input", n);

			if n == 0 {
				self.writer.flush().await?;
				if buffer.is_empty() && reply.resume_cursor().is_none() {
					return Ok(count);
				} else {
					return Err(format!(
						"Input ended inside a reply, {} bytes left over",
						buffer.len()
					)
					.into());
				}
			}
			buffer.extend_from_slice(&chunk[..n]);

			loop {
				match self.parser.parse(&mut reply, &mut buffer, &mut self.arena) {
					ReplyParseResult::Complete => {
						self.emit(&reply).await?;
						count += 1;
						reply = RedisReply::default();
						self.arena.reset();
					}
					ReplyParseResult::Incomplete => break,
					ReplyParseResult::Error(e) => {
						self.writer.flush().await?;
						return Err(e.into());
					}
				}
			}
		}
	}

	async fn emit(
		&mut self,
		reply: &RedisReply,
	) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
		match self.output {
			OutputMode::Print => {
				let line = format!("{}\n", reply.view(&self.arena));
				self.writer.write_all(line.as_bytes()).await?;
			}
			OutputMode::Resp => match reply.encode(&self.arena) {
				Ok(encoded) => self.writer.write_all(&encoded).await?,
				Err(EncodeError::Nil) => {
					warn!("Skipping reply holding nil, it has no RESP encoding");
				}
			},
		}
		Ok(())
	}
}
