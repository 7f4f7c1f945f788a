//! Where sesmatch looks for its files.
//!
//! No I/O here, only layout.
//!
//! ```text
//! ~/.sesmatch/
//! └── config.toml              # User config
//!
//! <working dir>/
//! ├── sesmatch.toml            # Project config (wins over user config)
//! └── .env                     # API keys, loaded without overriding the environment
//! ```

use std::path::PathBuf;

/// Project config file name
pub const PROJECT_CONFIG_FILE: &str = "sesmatch.toml";

/// User's sesmatch home directory: `~/.sesmatch/`
pub fn sesmatch_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sesmatch")
}

/// User config file: `~/.sesmatch/config.toml`
pub fn user_config_path() -> PathBuf {
    sesmatch_home().join("config.toml")
}

/// Project config file: `./sesmatch.toml`
pub fn project_config_path() -> PathBuf {
    PathBuf::from(PROJECT_CONFIG_FILE)
}

/// Dotenv file: `./.env`
pub fn dotenv_path() -> PathBuf {
    PathBuf::from(".env")
}

/// Config files in lookup order (first existing wins)
pub fn config_candidates() -> Vec<PathBuf> {
    vec![project_config_path(), user_config_path()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_config_is_looked_up_first() {
        let candidates = config_candidates();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0], PathBuf::from("sesmatch.toml"));
        assert!(candidates[1].ends_with(".sesmatch/config.toml"));
    }
}
