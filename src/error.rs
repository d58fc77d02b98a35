use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid timezone '{0}' (expected UTC, +HH:MM, -HHMM, UTC+H or decimal hours)")]
    InvalidTimezone(String),

    #[error("invalid table prefix '{0}' (only ASCII letters, digits and underscores allowed)")]
    InvalidTablePrefix(String),

    #[error("importer '{0}' is not registered")]
    UnknownImporter(String),

    #[error("geocoding failed for job {0}: {1}")]
    Geocode(u64, String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

impl ImportError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::InvalidTimezone(_) => "invalid_timezone",
            Self::InvalidTablePrefix(_) => "invalid_table_prefix",
            Self::UnknownImporter(_) => "unknown_importer",
            Self::Geocode(_, _) => "geocode_error",
            Self::Io(_) => "io_error",
            Self::Yaml(_) => "yaml_error",
            Self::Json(_) => "json_error",
            Self::Db(_) => "db_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
