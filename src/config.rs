//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "lap-clock")]
#[command(about = "A board of persistent lap stopwatches served over HTTP")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Number of stopwatches on the board
    #[arg(short = 'n', long, default_value = "3")]
    pub stopwatches: usize,

    /// File holding the saved stopwatch state
    #[arg(short, long, default_value = "lap-clock-storage.json")]
    pub storage_file: PathBuf,

    /// Keep state in memory only; nothing survives a restart
    #[arg(long, conflicts_with = "storage_file")]
    pub memory_storage: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["lap-clock"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.stopwatches, 3);
        assert_eq!(config.storage_file, PathBuf::from("lap-clock-storage.json"));
        assert!(!config.memory_storage);
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn overrides() {
        let config = Config::try_parse_from([
            "lap-clock", "-p", "8080", "--host", "0.0.0.0", "-n", "5", "--memory-storage", "-v",
        ])
        .unwrap();
        assert_eq!(config.address(), "0.0.0.0:8080");
        assert_eq!(config.stopwatches, 5);
        assert!(config.memory_storage);
        assert_eq!(config.log_level(), "debug");
    }
}
