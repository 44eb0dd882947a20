//! Prog Engine Configuration
//!
//! Loads engine and host settings from `progoptions.txt`, a plain
//! `key = value` file with `#` comments.

use mud_core::{MudError, Result};
use std::fs;
use std::path::Path;

/// Default location of the options file, relative to the working directory
pub const DEFAULT_OPTIONS_PATH: &str = "config/progoptions.txt";

/// Settings for the prog engine and its content-load host
#[derive(Debug, Clone, PartialEq)]
pub struct ProgConfig {
    /// Directory scanned for `.prog` files (from "progdir" option)
    pub prog_dir: String,
    /// Execution steps allowed per invocation, 0 = unlimited (from "maxsteps" option)
    pub max_steps: u64,
    /// Deepest block nesting a prog may use (from "maxnesting" option)
    pub max_nesting: usize,
    /// Compiled programs kept in the cache (from "cachesize" option)
    pub cache_size: usize,
    /// Recompile progs when their files change (from "watch" option)
    pub watch: bool,
    /// Log every successful compile at info level (from "logcompile" option)
    pub log_compile: bool,
}

impl Default for ProgConfig {
    fn default() -> Self {
        Self {
            prog_dir: "progs".into(),
            max_steps: 100_000,
            max_nesting: 32,
            cache_size: 1024,
            watch: false,
            log_compile: false,
        }
    }
}

impl ProgConfig {
    /// Load configuration from an options file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Load configuration from [`DEFAULT_OPTIONS_PATH`]
    ///
    /// A missing file is an error so the caller can decide whether to fall
    /// back to [`ProgConfig::default`].
    pub fn load_default() -> Result<Self> {
        if !Path::new(DEFAULT_OPTIONS_PATH).exists() {
            return Err(MudError::Config(format!("{} not found", DEFAULT_OPTIONS_PATH)));
        }
        Self::load_from_file(DEFAULT_OPTIONS_PATH)
    }

    /// Parse options file content
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(eq_pos) = line.find('=') {
                let key = line[..eq_pos].trim();
                let value = line[eq_pos + 1..].trim();

                config.parse_option(key, value);
            }
        }

        config
    }

    fn parse_option(&mut self, key: &str, value: &str) {
        let defaults = Self::default();

        match key.to_lowercase().as_str() {
            "progdir" => self.prog_dir = value.into(),
            "maxsteps" => {
                self.max_steps = value.parse().unwrap_or(defaults.max_steps);
            }
            "maxnesting" => {
                self.max_nesting = value.parse().unwrap_or(defaults.max_nesting);
            }
            "cachesize" => {
                self.cache_size = value.parse().unwrap_or(defaults.cache_size);
            }
            "watch" => {
                self.watch = parse_flag(value).unwrap_or(defaults.watch);
            }
            "logcompile" => {
                self.log_compile = parse_flag(value).unwrap_or(defaults.log_compile);
            }
            _ => {
                tracing::debug!("Unknown prog option: {} = {}", key, value);
            }
        }
    }

    /// Step budget as an option, `None` meaning unlimited
    pub fn step_budget(&self) -> Option<u64> {
        (self.max_steps > 0).then_some(self.max_steps)
    }

    /// Log the loaded settings
    pub fn display(&self) {
        tracing::info!("  [progoptions.txt]");
        for line in self.summary() {
            tracing::info!("    {}", line);
        }
    }

    /// One line per option, as logged by [`ProgConfig::display`]
    pub fn summary(&self) -> Vec<String> {
        let steps = match self.step_budget() {
            Some(steps) => steps.to_string(),
            None => "unlimited".to_string(),
        };
        vec![
            format!("Prog directory: {}", self.prog_dir),
            format!("Step budget: {}", steps),
            format!("Max nesting: {}", self.max_nesting),
            format!("Cache size: {}", self.cache_size),
            format!("Watch for edits: {}", self.watch),
            format!("Log compiles: {}", self.log_compile),
        ]
    }
}

/// Accepts the spellings builders actually type into option files
fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ProgConfig::default();
        assert_eq!(config.prog_dir, "progs");
        assert_eq!(config.max_steps, 100_000);
        assert_eq!(config.step_budget(), Some(100_000));
    }

    #[test]
    fn test_parse_simple_config() {
        let config_text = r#"
# engine limits
progdir = content/progs
maxsteps = 500
watch = yes
"#;
        let config = ProgConfig::parse(config_text);
        assert_eq!(config.prog_dir, "content/progs");
        assert_eq!(config.max_steps, 500);
        assert!(config.watch);
        assert_eq!(config.cache_size, 1024);
    }

    #[test]
    fn test_summary_lists_every_option() {
        let config = ProgConfig::parse("maxsteps = 0\nlogcompile = on");
        let summary = config.summary();
        assert_eq!(summary.len(), 6);
        assert_eq!(summary[1], "Step budget: unlimited");
        assert_eq!(summary.last().map(String::as_str), Some("Log compiles: true"));
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = ProgConfig::parse("maxsteps = lots\nwatch = maybe\nmaxnesting=4");
        assert_eq!(config.max_steps, 100_000);
        assert!(!config.watch);
        assert_eq!(config.max_nesting, 4);
    }

    #[test]
    fn test_zero_steps_is_unlimited() {
        let config = ProgConfig::parse("maxsteps = 0");
        assert_eq!(config.step_budget(), None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cachesize = 16").unwrap();
        writeln!(file, "logcompile = true").unwrap();

        let config = ProgConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.cache_size, 16);
        assert!(config.log_compile);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ProgConfig::load_from_file(dir.path().join("missing.txt"));
        assert!(matches!(result, Err(MudError::Io(_))));
    }
}
