//! Defaults for new games, loaded from `scoreboard.toml` at runtime.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::games::hearts::types::HeartsConfig;
use crate::games::kachuful::types::{KachufulConfig, PenaltyPolicy};
use crate::games::traitor::types::TraitorRules;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    pub dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".scoreboard"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HeartsDefaults {
    pub deck_count: u32,
    pub max_points: u32,
    pub strict_round_totals: bool,
}

impl Default for HeartsDefaults {
    fn default() -> Self {
        let c = HeartsConfig::default();
        Self {
            deck_count: c.deck_count,
            max_points: c.max_points,
            strict_round_totals: c.strict_round_totals,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct KachufulDefaults {
    pub deck_count: u32,
    pub zero_bid_bonus: u32,
    pub penalty: PenaltyPolicy,
}

impl Default for KachufulDefaults {
    fn default() -> Self {
        let c = KachufulConfig::default();
        Self {
            deck_count: c.deck_count,
            zero_bid_bonus: c.zero_bid_bonus,
            penalty: c.penalty,
        }
    }
}

/// Top-level TOML file structure.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub hearts: HeartsDefaults,
    pub kachuful: KachufulDefaults,
    pub traitor: TraitorRules,
}

impl Settings {
    pub fn hearts_config(&self) -> HeartsConfig {
        HeartsConfig {
            deck_count: self.hearts.deck_count,
            max_points: self.hearts.max_points,
            strict_round_totals: self.hearts.strict_round_totals,
        }
    }

    pub fn kachuful_config(&self) -> KachufulConfig {
        KachufulConfig {
            deck_count: self.kachuful.deck_count,
            zero_bid_bonus: self.kachuful.zero_bid_bonus,
            penalty: self.kachuful.penalty,
        }
    }
}

/// Load settings from a TOML file at the given path.
pub fn load_settings(path: &Path) -> Result<Settings, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_settings(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

pub fn parse_settings(content: &str) -> Result<Settings, toml::de::Error> {
    toml::from_str(content)
}

/// Try to load settings from well-known paths, returning defaults if none found.
pub fn load_default_settings() -> Settings {
    let mut candidates = vec![
        PathBuf::from("scoreboard.toml"),
        PathBuf::from("../scoreboard.toml"),
    ];
    if let Some(home) = std::env::var_os("HOME") {
        candidates.push(PathBuf::from(home).join(".config/scoreboard/scoreboard.toml"));
    }
    for p in &candidates {
        if p.exists() {
            match load_settings(p) {
                Ok(settings) => {
                    tracing::info!(path = %p.display(), "loaded settings");
                    return settings;
                }
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "failed to load settings");
                }
            }
        }
    }
    tracing::debug!("no scoreboard.toml found, using built-in defaults");
    Settings::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.kachuful.zero_bid_bonus, 10);
        assert_eq!(settings.hearts.max_points, 100);
    }

    #[test]
    fn test_partial_sections() {
        let settings = parse_settings(
            r#"
            [storage]
            dir = "/tmp/scores"

            [kachuful]
            penalty = "lose_bid"

            [traitor]
            detective_required = true
            "#,
        )
        .unwrap();
        assert_eq!(settings.storage.dir, PathBuf::from("/tmp/scores"));
        assert_eq!(settings.kachuful.penalty, PenaltyPolicy::LoseBid);
        assert_eq!(settings.kachuful.deck_count, 1);
        assert!(settings.traitor.detective_required);
        assert!(!settings.traitor.investigative_elimination);
        assert_eq!(settings.kachuful_config().penalty, PenaltyPolicy::LoseBid);
    }

    #[test]
    fn test_load_settings_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scoreboard.toml");
        std::fs::write(&path, "[hearts]\nmax_points = \"lots\"\n").unwrap();
        let err = load_settings(&path).unwrap_err();
        assert!(err.contains("scoreboard.toml"));

        std::fs::write(&path, "[hearts]\nmax_points = 50\n").unwrap();
        assert_eq!(load_settings(&path).unwrap().hearts_config().max_points, 50);
    }
}
