//! Optional config file with defaults for CLI flags.
//!
//! The file is a flat list of `key = value` lines with `#` comments. Values
//! from the command line always win over the file, and the file wins over
//! built-in defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use albumdl_core::download::Concurrency;
use albumdl_core::pipeline::DEFAULT_TIMEOUT_SECS;
use anyhow::{Context, Result, bail};

use crate::cli::AlbumArgs;

/// Environment override for the imgur API base URL.
pub(crate) const IMGUR_API_BASE_ENV: &str = "ALBUMDL_IMGUR_API_BASE";

const MAX_TIMEOUT_SECS: u64 = 86_400;
const MAX_CONCURRENCY: u64 = 1000;

/// Values read from the config file.
#[derive(Debug, Clone, Default)]
pub(crate) struct FileConfig {
    /// Default whole-album deadline in seconds.
    pub(crate) timeout_secs: Option<u64>,
    /// Default download bound, 0 for unbounded.
    pub(crate) concurrency: Option<u64>,
    /// Default verbosity mode.
    pub(crate) verbosity: Option<VerbositySetting>,
    /// imgur API base, for mirrors and testing.
    pub(crate) imgur_api_base: Option<String>,
}

impl FileConfig {
    fn validate(&self) -> Result<()> {
        if let Some(timeout) = self.timeout_secs
            && !(1..=MAX_TIMEOUT_SECS).contains(&timeout)
        {
            bail!(
                "Invalid config value for `timeout_secs`: {timeout}. Expected range: 1..={MAX_TIMEOUT_SECS}"
            );
        }
        if let Some(concurrency) = self.concurrency
            && concurrency > MAX_CONCURRENCY
        {
            bail!(
                "Invalid config value for `concurrency`: {concurrency}. Expected range: 0..={MAX_CONCURRENCY}"
            );
        }
        Ok(())
    }
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum VerbositySetting {
    #[default]
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Maps CLI flags to a setting, `None` when neither flag was given.
    pub(crate) fn from_flags(verbose: u8, quiet: bool) -> Option<Self> {
        match (quiet, verbose) {
            (true, _) => Some(Self::Quiet),
            (false, 0) => None,
            (false, 1) => Some(Self::Verbose),
            (false, _) => Some(Self::Debug),
        }
    }

    /// Default tracing filter for this setting.
    pub(crate) fn log_level(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Effective settings for one run after merging CLI, file and defaults.
#[derive(Debug, Clone)]
pub(crate) struct RunSettings {
    pub(crate) timeout: Duration,
    pub(crate) concurrency: Concurrency,
    pub(crate) verbosity: VerbositySetting,
    pub(crate) imgur_api_base: Option<String>,
}

/// Merges CLI values over file values over defaults.
pub(crate) fn resolve_settings(
    args: &AlbumArgs,
    verbose: u8,
    quiet: bool,
    file_config: Option<&FileConfig>,
    env_api_base: Option<String>,
) -> RunSettings {
    let file_config = file_config.cloned().unwrap_or_default();

    let timeout_secs = args
        .timeout
        .or(file_config.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let concurrency = args
        .concurrency
        .map(usize::from)
        .or_else(|| {
            file_config
                .concurrency
                .and_then(|value| usize::try_from(value).ok())
        })
        .unwrap_or(0);
    let verbosity = VerbositySetting::from_flags(verbose, quiet)
        .or(file_config.verbosity)
        .unwrap_or_default();

    RunSettings {
        timeout: Duration::from_secs(timeout_secs),
        concurrency: Concurrency::from_limit(concurrency),
        verbosity,
        imgur_api_base: env_api_base.or(file_config.imgur_api_base),
    }
}

/// Reads the imgur API base override from the environment.
pub(crate) fn env_imgur_api_base() -> Option<String> {
    env::var(IMGUR_API_BASE_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/albumdl/config.toml`
/// 2. `$HOME/.config/albumdl/config.toml`
pub(crate) fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("albumdl")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("albumdl")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file from the default path, `None` when there is none.
pub(crate) fn load_default_file_config() -> Result<Option<FileConfig>> {
    let Some(path) = resolve_default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    load_file_config(&path).map(Some)
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_number = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_number}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `timeout_secs` value on line {line_number}")
                })?;
                cfg.timeout_secs = Some(parsed);
            }
            "concurrency" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `concurrency` value on line {line_number}")
                })?;
                cfg.concurrency = Some(parsed);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(|| {
                    format!("Invalid `verbosity` value on line {line_number}")
                })?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_number}")
                })?);
            }
            "imgur_api_base" => {
                let parsed = parse_string_literal(value).with_context(|| {
                    format!("Invalid `imgur_api_base` value on line {line_number}")
                })?;
                cfg.imgur_api_base = Some(parsed);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn album_args(timeout: Option<u64>, concurrency: Option<u16>) -> AlbumArgs {
        AlbumArgs {
            album: Url::parse("https://imgur.com/a/abc").unwrap(),
            destination: PathBuf::from("out"),
            timeout,
            concurrency,
        }
    }

    #[test]
    fn test_parse_config_all_fields() {
        let cfg = parse_config_str(
            r#"
timeout_secs = 120
concurrency = 8
verbosity = "verbose"
imgur_api_base = "http://127.0.0.1:9000"
"#,
        )
        .expect("full config should parse");
        assert_eq!(cfg.timeout_secs, Some(120));
        assert_eq!(cfg.concurrency, Some(8));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Verbose));
        assert_eq!(cfg.imgur_api_base.as_deref(), Some("http://127.0.0.1:9000"));
    }

    #[test]
    fn test_parse_config_supports_inline_comments() {
        let cfg = parse_config_str(
            r#"
# defaults for slow connections
timeout_secs = 300 # five minutes
verbosity = "quiet" # preferred noise level
"#,
        )
        .expect("config with comments should parse");
        assert_eq!(cfg.timeout_secs, Some(300));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Quiet));
        assert!(cfg.concurrency.is_none());
    }

    #[test]
    fn test_parse_config_keeps_hash_inside_string() {
        let cfg = parse_config_str(r#"imgur_api_base = "http://mirror.local/#api""#)
            .expect("hash inside string should be kept");
        assert_eq!(cfg.imgur_api_base.as_deref(), Some("http://mirror.local/#api"));
    }

    #[test]
    fn test_parse_config_rejects_zero_timeout() {
        let err = parse_config_str("timeout_secs = 0").expect_err("invalid timeout expected");
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_concurrency_over_max() {
        let err = parse_config_str("concurrency = 1001").expect_err("invalid concurrency expected");
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn test_parse_config_rejects_negative_integer() {
        let err = parse_config_str("concurrency = -1").expect_err("negative value expected");
        assert!(format!("{err:#}").contains("non-negative"));
    }

    #[test]
    fn test_parse_config_rejects_numeric_values_with_trailing_tokens() {
        let err = parse_config_str("timeout_secs = 4 trailing")
            .expect_err("expected trailing token error");
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_unquoted_string() {
        let err = parse_config_str("verbosity = quiet").expect_err("quotes required");
        assert!(err.to_string().contains("verbosity"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_verbosity() {
        let err = parse_config_str(r#"verbosity = "loud""#).expect_err("unknown label expected");
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn test_parse_config_rejects_missing_equals() {
        let err = parse_config_str("timeout_secs 60").expect_err("syntax error expected");
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = parse_config_str("\nunknown_key = 123").expect_err("unknown key error expected");
        assert!(err.to_string().contains("Unknown configuration key"));
        assert!(err.to_string().contains("unknown_key"));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_resolve_settings_uses_defaults_without_file() {
        let settings = resolve_settings(&album_args(None, None), 0, false, None, None);
        assert_eq!(settings.timeout, Duration::from_secs(60));
        assert_eq!(settings.concurrency, Concurrency::Unbounded);
        assert_eq!(settings.verbosity, VerbositySetting::Default);
        assert!(settings.imgur_api_base.is_none());
    }

    #[test]
    fn test_resolve_settings_file_overrides_defaults() {
        let file = FileConfig {
            timeout_secs: Some(90),
            concurrency: Some(3),
            verbosity: Some(VerbositySetting::Quiet),
            imgur_api_base: Some("http://mirror.local".to_string()),
        };
        let settings = resolve_settings(&album_args(None, None), 0, false, Some(&file), None);
        assert_eq!(settings.timeout, Duration::from_secs(90));
        assert_eq!(settings.concurrency, Concurrency::from_limit(3));
        assert_eq!(settings.verbosity, VerbositySetting::Quiet);
        assert_eq!(settings.imgur_api_base.as_deref(), Some("http://mirror.local"));
    }

    #[test]
    fn test_resolve_settings_cli_overrides_file() {
        let file = FileConfig {
            timeout_secs: Some(90),
            concurrency: Some(3),
            verbosity: Some(VerbositySetting::Quiet),
            imgur_api_base: None,
        };
        let settings =
            resolve_settings(&album_args(Some(5), Some(0)), 2, false, Some(&file), None);
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.concurrency, Concurrency::Unbounded);
        assert_eq!(settings.verbosity, VerbositySetting::Debug);
    }

    #[test]
    fn test_resolve_settings_env_overrides_file_api_base() {
        let file = FileConfig {
            imgur_api_base: Some("http://file.local".to_string()),
            ..FileConfig::default()
        };
        let settings = resolve_settings(
            &album_args(None, None),
            0,
            false,
            Some(&file),
            Some("http://env.local".to_string()),
        );
        assert_eq!(settings.imgur_api_base.as_deref(), Some("http://env.local"));
    }

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(VerbositySetting::from_flags(0, false), None);
        assert_eq!(
            VerbositySetting::from_flags(1, false),
            Some(VerbositySetting::Verbose)
        );
        assert_eq!(
            VerbositySetting::from_flags(3, false),
            Some(VerbositySetting::Debug)
        );
        assert_eq!(
            VerbositySetting::from_flags(0, true),
            Some(VerbositySetting::Quiet)
        );
    }

    #[test]
    fn test_verbosity_log_levels() {
        assert_eq!(VerbositySetting::Default.log_level(), "info");
        assert_eq!(VerbositySetting::Verbose.log_level(), "debug");
        assert_eq!(VerbositySetting::Quiet.log_level(), "error");
        assert_eq!(VerbositySetting::Debug.log_level(), "trace");
    }
}
