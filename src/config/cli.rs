use crate::config::toml_config::TomlConfig;
use crate::core::render::OutputFormat;
use crate::core::service::load_targets;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Parser)]
#[command(name = "site-probe")]
#[command(about = "Inspect websites with a fixed battery of content probes")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Identity used for rate limiting
    #[arg(long, global = true, default_value = "cli")]
    pub caller: String,

    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[arg(long, global = true)]
    pub pacing_ms: Option<u64>,

    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Inspect a single URL
    Check { url: String },
    /// Inspect every URL listed in a file, one per line
    Batch { file: PathBuf },
}

impl CliConfig {
    /// 載入 TOML（若有指定）並套用命令列覆蓋設定
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(timeout) = self.timeout_secs {
            config.fetcher.timeout_seconds = timeout;
        }
        if let Some(pacing) = self.pacing_ms {
            config.batch.pacing_millis = pacing;
        }
        if let Some(concurrency) = self.concurrency {
            config.batch.max_concurrency = concurrency;
        }

        config.validate()?;
        Ok(config)
    }
}

pub fn read_targets_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(load_targets(&content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_check_command() {
        let cli = CliConfig::try_parse_from([
            "site-probe",
            "check",
            "https://a.example",
            "--format",
            "json",
            "--caller",
            "ops",
        ])
        .unwrap();

        assert!(matches!(cli.command, Command::Check { ref url } if url == "https://a.example"));
        assert_eq!(cli.caller, "ops");

        let config = cli.resolve().unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_overrides_toml_values() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[batch]\npacing_millis = 2000\nmax_concurrency = 2\n")
            .unwrap();

        let cli = CliConfig::try_parse_from([
            "site-probe",
            "--config",
            temp_file.path().to_str().unwrap(),
            "--pacing-ms",
            "10",
            "batch",
            "urls.txt",
        ])
        .unwrap();

        let config = cli.resolve().unwrap();
        assert_eq!(config.batch.pacing_millis, 10);
        assert_eq!(config.batch.max_concurrency, 2);
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let cli = CliConfig::try_parse_from([
            "site-probe",
            "check",
            "https://a.example",
            "--concurrency",
            "0",
        ])
        .unwrap();

        assert!(cli.resolve().is_err());
    }

    #[test]
    fn test_read_targets_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"https://a.example\n# skip\nhttps://b.example\n")
            .unwrap();

        let targets = read_targets_file(temp_file.path()).unwrap();
        assert_eq!(targets, vec!["https://a.example", "https://b.example"]);
    }
}
