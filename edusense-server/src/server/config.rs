use edusense_shared::auth::Role;
use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf};

use crate::store::curriculum::CurriculumIdMode;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub school_id: String,
    pub jwt_secret: String,
    pub users: Vec<UserConfig>,
    /// Optional YAML dataset replacing the built-in sample fixtures.
    #[serde(default)]
    pub fixtures_path: Option<PathBuf>,
    /// Uniform artificial delay range applied to store reads, in ms.
    /// Absent means no simulated latency.
    #[serde(default)]
    pub simulated_latency_ms: Option<[u64; 2]>,
    #[serde(default)]
    pub curriculum_ids: CurriculumIdMode,
    #[serde(default)]
    pub dev_cors_origin: Option<String>,
    #[serde(default)]
    pub listen_port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub username: String,
    pub password_hash: String, // bcrypt hash
    pub role: Role,
    /// Student ids this parent may see. Ignored for other roles.
    #[serde(default)]
    pub children: Vec<String>,
    /// Class ids this teacher covers. Ignored for other roles.
    #[serde(default)]
    pub classes: Vec<String>,
    /// Route ids this driver is assigned. Ignored for other roles.
    #[serde(default)]
    pub routes: Vec<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Yaml(e) => write!(f, "YAML error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        ConfigError::Yaml(value)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
        Self::load_from_path(path)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(&path)?;
        let cfg: AppConfig = serde_yaml::from_str(&text)?;
        Ok(cfg)
    }

    pub fn find_user(&self, username: &str) -> Option<&UserConfig> {
        self.users.iter().find(|u| u.username == username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_yaml() {
        let yaml = r#"
school_id: greenwood
jwt_secret: topsecret
users:
  - username: admin
    password_hash: "$2b$12$abcdefghijklmnopqrstuv"
    role: admin
  - username: priya.sharma
    password_hash: "$2b$12$abcdefghijklmnopqrstuv"
    role: parent
    children: [STU001]
  - username: dummy_driver_001
    password_hash: "$2b$12$abcdefghijklmnopqrstuv"
    role: driver
    routes: [ROUTE001, ROUTE002]
"#;
        let cfg: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.school_id, "greenwood");
        assert_eq!(cfg.users.len(), 3);
        assert_eq!(cfg.curriculum_ids, CurriculumIdMode::Random);
        assert!(cfg.simulated_latency_ms.is_none());
        let driver = cfg.find_user("dummy_driver_001").unwrap();
        assert_eq!(driver.role, Role::Driver);
        assert_eq!(driver.routes, vec!["ROUTE001", "ROUTE002"]);
    }

    #[test]
    fn parses_latency_and_id_mode() {
        let yaml = r#"
school_id: greenwood
jwt_secret: topsecret
users: []
simulated_latency_ms: [300, 2000]
curriculum_ids: stable
"#;
        let cfg: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.simulated_latency_ms, Some([300, 2000]));
        assert_eq!(cfg.curriculum_ids, CurriculumIdMode::Stable);
    }
}
