mod session;

use config::Cli;
use config::Parser;
use config::REPLY_CONF;
use log::info;
use session::DumpSession;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	let args = Cli::parse();
	let input = args.input.clone();
	config::setup(args)?;

	let config = REPLY_CONF.load_full();
	let stdout = tokio::io::stdout();
	let count = match input {
		Some(path) => {
			info!("Decoding replies from {}", path);
			let file = tokio::fs::File::open(&path).await?;
			DumpSession::new(file, stdout, &config).run().await?
		}
		None => {
			info!("Decoding replies from stdin");
			DumpSession::new(tokio::io::stdin(), stdout, &config).run().await?
		}
	};

	info!("Decoded {} replies", count);
	Ok(())
}
