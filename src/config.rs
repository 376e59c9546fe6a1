use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "legis";
const ENV_PREFIX: &str = "LEGIS";

/// Runtime settings. Every field has a default, so `Settings::default()`
/// works with no file and no environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite database used by the CLI.
    pub db_path: PathBuf,
    /// Boilerplate token stripped from the head of a block.
    pub banner: String,
    /// Proper names with internal capitals (e.g. "VanderMeer") that the
    /// capitalization splitters must leave whole.
    pub name_exceptions: Vec<String>,
    /// Reduce the email field to its local part.
    pub split_email_tags: bool,
    /// Blocks above this many bytes are refused before matching.
    pub max_block_len: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            db_path: PathBuf::from("data/legis.sqlite"),
            banner: "Notify".to_string(),
            name_exceptions: Vec::new(),
            split_email_tags: false,
            max_block_len: 64 * 1024,
        }
    }
}

impl Settings {
    /// Defaults, overlaid by `legis.toml` (optional) and `LEGIS_*` variables.
    /// `LEGIS_NAME_EXCEPTIONS` is comma separated.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("name_exceptions"),
            )
            .build()?
            .try_deserialize()
    }
}
