//! Runtime configuration for reply-dump
//!
//! Settings come from an optional TOML, JSON or YAML file, overridden by
//! command-line flags, and are published through a process-global
//! [`GlobalConfig`].
//!
//! # Example
//!
//! ```no_run
//! use config::{Cli, Parser, REPLY_CONF, setup};
//!
//! let args = Cli::parse();
//! setup(args)?;
//!
//! let config = REPLY_CONF.load();
//! println!("Chunk size: {}", config.chunk_size);
//! # Ok::<(), config::ConfigError>(())
//! ```

use std::path::Path;
use std::sync::Arc;
use std::sync::OnceLock;

use arc_swap::ArcSwap;
pub use clap::Parser;
use clap::ValueEnum;
use reply::ParserConfig;
use serde::Deserialize;
use serde::Serialize;
use telemetry::TelemetryError;
use thiserror::Error;

/// Used when no `--config` is given and the file exists.
pub const DEFAULT_CONFIG_PATH: &str = "conf/reply.toml";

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("Failed to read configuration file '{path}': {source}")]
	Io {
		source: std::io::Error,
		path: String,
	},

	#[error("Failed to parse TOML configuration: {0}")]
	TomlParse(#[from] toml::de::Error),

	#[error("Failed to parse JSON configuration: {0}")]
	JsonParse(#[from] serde_json::Error),

	#[error("Failed to parse YAML configuration: {0}")]
	YamlParse(#[from] serde_yaml::Error),

	#[error("Unsupported configuration format: {0}")]
	UnsupportedFormat(String),

	#[error("Configuration file has no extension")]
	NoExtension,

	#[error("Invalid configuration: {0}")]
	Invalid(String),

	#[error(transparent)]
	Telemetry(#[from] TelemetryError),
}

/// How decoded replies are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
	/// `redis-cli` style text, one reply per line
	#[default]
	Print,
	/// Re-encoded RESP bytes
	Resp,
}

/// Command-line arguments for reply-dump
#[derive(Parser, Debug)]
#[command(author, version, about = "Decode a stream of RESP replies", long_about = None)]
pub struct Cli {
	/// Configuration file path (TOML, JSON, or YAML).
	/// Defaults to conf/reply.toml if it exists.
	#[arg(short, long)]
	pub config: Option<String>,

	/// File holding the RESP stream; stdin when omitted
	#[arg(short, long)]
	pub input: Option<String>,

	/// Largest bulk string or array footprint accepted, in bytes
	#[arg(long)]
	pub max_allocation_size: Option<usize>,

	/// Deepest array nesting accepted
	#[arg(long)]
	pub max_depth: Option<usize>,

	/// Byte budget of the arena holding one reply
	#[arg(long)]
	pub arena_limit: Option<usize>,

	/// Bytes read from the input at a time
	#[arg(long)]
	pub chunk_size: Option<usize>,

	/// Output format
	#[arg(short, long, value_enum)]
	pub output: Option<OutputMode>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long)]
	pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReplyConfig {
	pub max_allocation_size: usize,
	pub max_depth: usize,
	pub arena_limit: Option<usize>,
	pub chunk_size: usize,
	pub output: OutputMode,
	pub log_level: String,
}

impl Default for ReplyConfig {
	fn default() -> Self {
		Self {
			max_allocation_size: reply::DEFAULT_MAX_ALLOCATION_SIZE,
			max_depth: reply::DEFAULT_MAX_DEPTH,
			arena_limit: None,
			chunk_size: 4096,
			output: OutputMode::Print,
			log_level: "info".into(),
		}
	}
}

impl ReplyConfig {
	/// Limits handed to the parser.
	pub fn parser_config(&self) -> ParserConfig {
		ParserConfig {
			max_allocation_size: self.max_allocation_size,
			max_depth: self.max_depth,
		}
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.chunk_size == 0 {
			return Err(ConfigError::Invalid("chunk_size must be positive".into()));
		}
		if self.max_depth == 0 {
			return Err(ConfigError::Invalid("max_depth must be positive".into()));
		}
		if self.max_allocation_size == 0 {
			return Err(ConfigError::Invalid(
				"max_allocation_size must be positive".into(),
			));
		}
		Ok(())
	}

	/// Apply the flags that were given on the command line.
	fn merge_cli(&mut self, args: &Cli) {
		if let Some(size) = args.max_allocation_size {
			self.max_allocation_size = size;
		}
		if let Some(depth) = args.max_depth {
			self.max_depth = depth;
		}
		if let Some(limit) = args.arena_limit {
			self.arena_limit = Some(limit);
		}
		if let Some(size) = args.chunk_size {
			self.chunk_size = size;
		}
		if let Some(output) = args.output {
			self.output = output;
		}
		if let Some(level) = &args.log_level {
			self.log_level = level.clone();
		}
	}
}

pub struct GlobalConfig {
	inner: OnceLock<ArcSwap<ReplyConfig>>,
}

impl GlobalConfig {
	pub const fn new() -> Self {
		Self {
			inner: OnceLock::new(),
		}
	}

	pub fn init(&self, config: ReplyConfig) {
		let _ = self.inner.set(ArcSwap::from_pointee(config));
	}

	pub fn load(&self) -> arc_swap::Guard<Arc<ReplyConfig>> {
		self.inner.get().expect("Config is not initialized").load()
	}

	/// An owned snapshot, for holders that outlive a short borrow.
	pub fn load_full(&self) -> Arc<ReplyConfig> {
		self.inner.get().expect("Config is not initialized").load_full()
	}

	/// Replace the configuration, reloading the log level if it changed.
	pub fn update(&self, new_config: ReplyConfig) -> Result<(), ConfigError> {
		new_config.validate()?;
		let inner = self.inner.get().expect("Config is not initialized");
		if inner.load().log_level != new_config.log_level {
			telemetry::reload_log_level(&new_config.log_level)?;
		}
		inner.store(Arc::new(new_config));
		Ok(())
	}
}

impl Default for GlobalConfig {
	fn default() -> Self {
		Self::new()
	}
}

pub static REPLY_CONF: GlobalConfig = GlobalConfig::new();

/// Helper macro to access configuration fields
///
/// Usage:
/// - For Copy types (numbers): `let n = reply_config!(chunk_size);`
/// - For other types, use it within one expression: `reply_config!(log_level).clone()`
#[macro_export]
macro_rules! reply_config {
	($field:ident) => {
		$crate::REPLY_CONF.load().$field
	};
}

/// Build the configuration from the file and flags, start logging and
/// publish the result in [`REPLY_CONF`].
pub fn setup(args: Cli) -> Result<(), ConfigError> {
	let config = resolve(&args)?;
	telemetry::init(&config.log_level)?;
	log::debug!("configuration: {:?}", config);
	REPLY_CONF.init(config);
	Ok(())
}

fn resolve(args: &Cli) -> Result<ReplyConfig, ConfigError> {
	let mut config = match args.config.as_deref() {
		Some(p) => load_from_file(p)?,
		None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_from_file(DEFAULT_CONFIG_PATH)?,
		None => ReplyConfig::default(),
	};
	config.merge_cli(args);
	config.validate()?;
	Ok(config)
}

pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<ReplyConfig, ConfigError> {
	let path_ref = path.as_ref();
	let content = std::fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
		path: path_ref.display().to_string(),
		source,
	})?;

	let extension = path_ref
		.extension()
		.and_then(|ext| ext.to_str())
		.ok_or(ConfigError::NoExtension)?;

	match extension.to_lowercase().as_str() {
		"toml" => Ok(toml::from_str(&content)?),
		"json" => Ok(serde_json::from_str(&content)?),
		"yaml" | "yml" => Ok(serde_yaml::from_str(&content)?),
		_ => Err(ConfigError::UnsupportedFormat(extension.to_string())),
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[test]
	fn test_config_singleton() {
		// Another test may have initialized it already; init is idempotent.
		REPLY_CONF.init(ReplyConfig::default());

		let chunk_size = reply_config!(chunk_size);
		assert_eq!(chunk_size, 4096);

		assert_eq!(reply_config!(log_level), "info");
	}

	#[test]
	fn test_snapshot_is_independent_of_updates() {
		REPLY_CONF.init(ReplyConfig::default());
		let snapshot = REPLY_CONF.load_full();
		assert_eq!(*snapshot, *REPLY_CONF.load_full());

		let current = REPLY_CONF.load_full();
		REPLY_CONF.update((*current).clone()).unwrap();
		assert!(!Arc::ptr_eq(&snapshot, &REPLY_CONF.load_full()));
		assert_eq!(snapshot.chunk_size, 4096);
	}

	#[test]
	fn test_update_rejects_invalid() {
		REPLY_CONF.init(ReplyConfig::default());
		let bad = ReplyConfig {
			chunk_size: 0,
			..ReplyConfig::default()
		};
		assert!(matches!(
			REPLY_CONF.update(bad),
			Err(ConfigError::Invalid(_))
		));
		assert_eq!(reply_config!(chunk_size), 4096);
	}

	#[test]
	fn test_parse_toml() {
		let dir = tempfile::tempdir().unwrap();
		let file_path = dir.path().join("reply.toml");
		let content = r#"
max_allocation_size = 1048576
max_depth = 16
arena_limit = 65536
chunk_size = 512
output = "resp"
log_level = "debug"
"#;
		std::fs::write(&file_path, content).unwrap();

		let config = load_from_file(&file_path).unwrap();
		assert_eq!(config.max_allocation_size, 1048576);
		assert_eq!(config.max_depth, 16);
		assert_eq!(config.arena_limit, Some(65536));
		assert_eq!(config.chunk_size, 512);
		assert_eq!(config.output, OutputMode::Resp);
		assert_eq!(config.log_level, "debug");
	}

	#[test]
	fn test_parse_json() {
		let dir = tempfile::tempdir().unwrap();
		let file_path = dir.path().join("reply.json");
		let content = r#"
{
  "max_depth": 8,
  "output": "print"
}
"#;
		std::fs::write(&file_path, content).unwrap();

		let config = load_from_file(&file_path).unwrap();
		assert_eq!(config.max_depth, 8);
		assert_eq!(config.output, OutputMode::Print);
		// Missing fields fall back to defaults.
		assert_eq!(config.chunk_size, 4096);
		assert_eq!(config.arena_limit, None);
	}

	#[test]
	fn test_parse_yaml() {
		let dir = tempfile::tempdir().unwrap();
		let file_path = dir.path().join("reply.yml");
		let content = r#"
chunk_size: 1
log_level: "warn"
"#;
		std::fs::write(&file_path, content).unwrap();

		let config = load_from_file(&file_path).unwrap();
		assert_eq!(config.chunk_size, 1);
		assert_eq!(config.log_level, "warn");
	}

	#[rstest]
	#[case("reply.ini", "ini")]
	#[case("reply.conf", "conf")]
	fn test_unsupported_format(#[case] name: &str, #[case] ext: &str) {
		let dir = tempfile::tempdir().unwrap();
		let file_path = dir.path().join(name);
		std::fs::write(&file_path, "").unwrap();

		match load_from_file(&file_path) {
			Err(ConfigError::UnsupportedFormat(found)) => assert_eq!(found, ext),
			other => panic!("Expected UnsupportedFormat, got {:?}", other),
		}
	}

	#[test]
	fn test_no_extension() {
		let dir = tempfile::tempdir().unwrap();
		let file_path = dir.path().join("reply");
		std::fs::write(&file_path, "").unwrap();
		assert!(matches!(
			load_from_file(&file_path),
			Err(ConfigError::NoExtension)
		));
	}

	#[test]
	fn test_missing_file() {
		assert!(matches!(
			load_from_file("/nonexistent/reply.toml"),
			Err(ConfigError::Io { .. })
		));
	}

	#[test]
	fn test_cli_overrides_file() {
		let dir = tempfile::tempdir().unwrap();
		let file_path = dir.path().join("reply.toml");
		std::fs::write(&file_path, "max_depth = 16\nchunk_size = 512\n").unwrap();

		let args = Cli::parse_from([
			"reply-dump",
			"--config",
			file_path.to_str().unwrap(),
			"--chunk-size",
			"7",
			"--output",
			"resp",
		]);
		let config = resolve(&args).unwrap();
		assert_eq!(config.max_depth, 16);
		assert_eq!(config.chunk_size, 7);
		assert_eq!(config.output, OutputMode::Resp);
	}

	#[rstest]
	#[case(&["reply-dump", "--chunk-size", "0"])]
	#[case(&["reply-dump", "--max-depth", "0"])]
	#[case(&["reply-dump", "--max-allocation-size", "0"])]
	fn test_cli_invalid_values(#[case] argv: &[&str]) {
		let args = Cli::parse_from(argv);
		assert!(matches!(resolve(&args), Err(ConfigError::Invalid(_))));
	}

	#[test]
	fn test_parser_config() {
		let config = ReplyConfig {
			max_allocation_size: 1024,
			max_depth: 3,
			..ReplyConfig::default()
		};
		let parser_config = config.parser_config();
		assert_eq!(parser_config.max_allocation_size, 1024);
		assert_eq!(parser_config.max_depth, 3);
	}
}
