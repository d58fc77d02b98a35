use std::fs;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::{ImportError, Result};

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "jobroller-import.yaml";
pub const DEFAULT_TABLE_PREFIX: &str = "wp_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploads_url: Option<String>,
}

fn default_table_prefix() -> String {
    DEFAULT_TABLE_PREFIX.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            table_prefix: default_table_prefix(),
            timezone: None,
            uploads_url: None,
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database: Option<PathBuf>,
    pub table_prefix: Option<String>,
    pub timezone: Option<String>,
}

impl Config {
    /// Load from `explicit` if given, else from `DEFAULT_CONFIG_FILE` under `cwd`
    /// when it exists, else fall back to defaults.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = cwd.join(DEFAULT_CONFIG_FILE);
                if !candidate.exists() {
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let raw = fs::read_to_string(&path).map_err(|e| {
            ImportError::Config(format!("cannot read '{}': {e}", path.display()))
        })?;
        let mut config: Self = serde_yaml::from_str(&raw)?;

        // Relative database paths are anchored at the config file's directory.
        if let Some(db) = config.database.take() {
            let base = path.parent().unwrap_or(cwd);
            config.database = Some(if db.is_relative() { base.join(db) } else { db });
        }
        Ok(config)
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(db) = overrides.database {
            self.database = Some(db);
        }
        if let Some(prefix) = overrides.table_prefix {
            self.table_prefix = prefix;
        }
        if let Some(tz) = overrides.timezone {
            self.timezone = Some(tz);
        }
    }

    pub fn database_path(&self) -> Result<&Path> {
        self.database.as_deref().ok_or_else(|| {
            ImportError::Config(format!(
                "no database configured (pass --db or set `database` in {DEFAULT_CONFIG_FILE})"
            ))
        })
    }

    /// The configured offset, if any. `None` means "ask the store".
    pub fn utc_offset(&self) -> Result<Option<FixedOffset>> {
        self.timezone.as_deref().map(parse_utc_offset).transpose()
    }
}

/// Parse a fixed UTC offset.
///
/// Accepted forms: `UTC`, `GMT`, `Z`, `+02:00`, `-0530`, `UTC+2`, `GMT-03:30`,
/// and WordPress `gmt_offset` style decimal hours such as `5.5` or `-3`.
pub fn parse_utc_offset(input: &str) -> Result<FixedOffset> {
    let invalid = || ImportError::InvalidTimezone(input.to_string());
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let upper = trimmed.to_ascii_uppercase();
    let rest = if upper == "Z" {
        ""
    } else if let Some(rest) = upper.strip_prefix("UTC").or_else(|| upper.strip_prefix("GMT")) {
        rest
    } else {
        upper.as_str()
    };
    if rest.is_empty() {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, body) = match rest.as_bytes()[0] {
        b'+' => (1, &rest[1..]),
        b'-' => (-1, &rest[1..]),
        _ => (1, rest),
    };
    if body.is_empty() {
        return Err(invalid());
    }

    let seconds: i32 = if let Some((h, m)) = body.split_once(':') {
        let hours: i32 = h.parse().map_err(|_| invalid())?;
        let minutes: i32 = m.parse().map_err(|_| invalid())?;
        clock_seconds(hours, minutes).ok_or_else(invalid)?
    } else if body.contains('.') {
        let hours: f64 = body.parse().map_err(|_| invalid())?;
        if !(0.0..24.0).contains(&hours) {
            return Err(invalid());
        }
        (hours * 3600.0).round() as i32
    } else if body.len() == 4 && body.bytes().all(|b| b.is_ascii_digit()) {
        let hours: i32 = body[..2].parse().map_err(|_| invalid())?;
        let minutes: i32 = body[2..].parse().map_err(|_| invalid())?;
        clock_seconds(hours, minutes).ok_or_else(invalid)?
    } else {
        let hours: i32 = body.parse().map_err(|_| invalid())?;
        clock_seconds(hours, 0).ok_or_else(invalid)?
    };

    FixedOffset::east_opt(sign * seconds).ok_or_else(invalid)
}

/// Seconds for an unsigned `hours:minutes` offset below one day.
fn clock_seconds(hours: i32, minutes: i32) -> Option<i32> {
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    Some(hours * 3600 + minutes * 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn secs(input: &str) -> i32 {
        parse_utc_offset(input).unwrap().local_minus_utc()
    }

    #[test]
    fn parses_supported_offset_forms() {
        assert_eq!(secs("UTC"), 0);
        assert_eq!(secs("z"), 0);
        assert_eq!(secs("+02:00"), 7200);
        assert_eq!(secs("-0530"), -(5 * 3600 + 30 * 60));
        assert_eq!(secs("UTC+2"), 7200);
        assert_eq!(secs("GMT-03:30"), -(3 * 3600 + 30 * 60));
        assert_eq!(secs("5.5"), 5 * 3600 + 30 * 60);
        assert_eq!(secs("-3"), -3 * 3600);
    }

    #[test]
    fn rejects_garbage_and_out_of_range_offsets() {
        for bad in [
            "",
            "Europe/Paris",
            "+",
            "+02:75",
            "30",
            "UTC+abc",
            "+999999:00",
            "-2147483647:59",
            "+-3:00",
            "99999999999.5",
            "+24:00",
        ] {
            let err = parse_utc_offset(bad).unwrap_err();
            assert!(matches!(err, ImportError::InvalidTimezone(_)), "{bad}");
        }
    }

    #[test]
    fn load_without_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(None, dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.table_prefix, "wp_");
        assert!(config.database_path().is_err());
    }

    #[test]
    fn load_resolves_relative_database_against_config_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(
            &path,
            "database: site.db\ntable_prefix: jr_\ntimezone: '+01:00'\n",
        )
        .unwrap();

        let config = Config::load(None, dir.path()).unwrap();
        assert_eq!(config.database_path().unwrap(), dir.path().join("site.db"));
        assert_eq!(config.table_prefix, "jr_");
        assert_eq!(config.utc_offset().unwrap().unwrap().local_minus_utc(), 3600);
    }

    #[test]
    fn load_rejects_unknown_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        fs::write(&path, "database: a.db\nbatch_size: 10\n").unwrap();

        let err = Config::load(Some(&path), dir.path()).unwrap_err();
        assert!(matches!(err, ImportError::Yaml(_)));
    }

    #[test]
    fn overrides_take_precedence() {
        let mut config = Config {
            database: Some("file.db".into()),
            timezone: Some("UTC".into()),
            ..Config::default()
        };
        config.apply(ConfigOverrides {
            database: Some("flag.db".into()),
            table_prefix: None,
            timezone: Some("-05:00".into()),
        });
        assert_eq!(config.database_path().unwrap(), Path::new("flag.db"));
        assert_eq!(config.table_prefix, "wp_");
        assert_eq!(config.timezone.as_deref(), Some("-05:00"));
    }
}
