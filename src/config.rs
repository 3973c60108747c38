use crate::models::{LpRuleset, ScoreVisibility, DEFAULT_LP_BAND};
use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub static_dir: PathBuf,
    pub dictionary_path: PathBuf,
    /// `None` keeps accounts in memory only.
    pub user_store_path: Option<PathBuf>,
    pub round_seconds: u32,
    pub loading_seconds: u64,
    pub ruleset: LpRuleset,
    pub ranked_visibility: ScoreVisibility,
    pub casual_visibility: ScoreVisibility,
    pub match_band: u32,
}

impl Default for Config {
    fn default() -> Self {
        let static_dir = PathBuf::from("static");
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            dictionary_path: static_dir.join("scrabble-dictionary.txt"),
            static_dir,
            user_store_path: None,
            round_seconds: 120,
            loading_seconds: 3,
            ruleset: LpRuleset::Tiered,
            ranked_visibility: ScoreVisibility::Hidden,
            casual_visibility: ScoreVisibility::Live,
            match_band: DEFAULT_LP_BAND,
        }
    }
}

impl Config {
    /// Reads the process environment, falling back to defaults. `main` loads
    /// `.env` first.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        let static_dir = env::var("STATIC_FILES_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);
        let dictionary_path = env::var("DICTIONARY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| static_dir.join("scrabble-dictionary.txt"));

        Self {
            bind_addr: parse_var("BIND_ADDR", defaults.bind_addr),
            static_dir,
            dictionary_path,
            user_store_path: env::var("USER_STORE_PATH").ok().map(PathBuf::from),
            round_seconds: parse_var("ROUND_SECONDS", defaults.round_seconds),
            loading_seconds: parse_var("LOADING_SECONDS", defaults.loading_seconds),
            ruleset: parse_var("LP_RULESET", defaults.ruleset),
            ranked_visibility: parse_var("RANKED_SCORE_VISIBILITY", defaults.ranked_visibility),
            casual_visibility: parse_var("CASUAL_SCORE_VISIBILITY", defaults.casual_visibility),
            match_band: parse_var("MATCH_LP_BAND", defaults.match_band),
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!(%key, %raw, "ignoring invalid setting: {e}");
            default
        }),
        Err(_) => default,
    }
}
