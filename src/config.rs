use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Thresholds for the submission quality verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationPolicy {
    /// Minimum acceptable whole-session duration, in minutes.
    pub min_duration: u64,
    /// Run length of consecutive all-same-score trials that marks invalid.
    pub max_consecutive_same_score: usize,
    pub require_attention_check: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            min_duration: 8,
            max_consecutive_same_score: 3,
            require_attention_check: true,
        }
    }
}

/// A questionnaire item with a known correct option index. Checks without a
/// `correct` answer are presented but never scored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttentionCheck {
    pub question: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub correct: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Trait items rated for every sample, in column order.
    pub default_traits: Vec<String>,
    pub sample_count: usize,
    pub attention_checks: Vec<AttentionCheck>,
    pub open_questions: Vec<String>,
    pub thanks_message: String,
    pub validation: ValidationPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_traits: vec![
                "sincere".to_string(),
                "exciting".to_string(),
                "competent".to_string(),
                "sophisticated".to_string(),
                "rugged".to_string(),
            ],
            sample_count: 12,
            attention_checks: vec![
                AttentionCheck {
                    question: "To confirm you are reading carefully, please select \"Strongly agree\"".to_string(),
                    options: vec![
                        "Strongly disagree".to_string(),
                        "Disagree".to_string(),
                        "Somewhat disagree".to_string(),
                        "Neutral".to_string(),
                        "Somewhat agree".to_string(),
                        "Agree".to_string(),
                        "Strongly agree".to_string(),
                    ],
                    correct: Some(6),
                },
                AttentionCheck {
                    question: "In this experiment, the images you rated mainly showed:".to_string(),
                    options: vec![
                        "Landscape photos".to_string(),
                        "Text descriptions".to_string(),
                        "Virtual characters".to_string(),
                        "Geometric shapes".to_string(),
                    ],
                    correct: Some(2),
                },
            ],
            open_questions: vec![
                "What impression did the characters leave on you?".to_string(),
                "Any other comments about the experiment?".to_string(),
            ],
            thanks_message: "Thank you for participating! Your responses have been recorded."
                .to_string(),
            validation: ValidationPolicy::default(),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "skala") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("skala_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_is_well_formed() {
        let cfg = Config::default();
        assert!(!cfg.default_traits.is_empty());
        assert!(cfg.sample_count > 0);
        assert_eq!(cfg.attention_checks.len(), 2);
        assert_eq!(cfg.attention_checks[0].correct, Some(6));
        assert_eq!(cfg.attention_checks[1].correct, Some(2));
        assert_eq!(cfg.validation.min_duration, 8);
        assert_eq!(cfg.validation.max_consecutive_same_score, 3);
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            default_traits: vec!["warm".into(), "competent".into()],
            sample_count: 6,
            validation: ValidationPolicy {
                min_duration: 5,
                max_consecutive_same_score: 4,
                require_attention_check: false,
            },
            ..Config::default()
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn missing_file_degrades_to_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nope.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn corrupt_file_degrades_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, br#"{"sampleCount": 4}"#).unwrap();
        let store = FileConfigStore::with_path(&path);
        let cfg = store.load();
        assert_eq!(cfg.sample_count, 4);
        assert_eq!(cfg.validation, ValidationPolicy::default());
    }
}
