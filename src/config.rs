use crate::{error::FixResult, PACFIX_CONFIG};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_pacman_command")]
    pub pacman_command: String,

    #[serde(default = "default_sudo_command")]
    pub sudo_command: String,

    #[serde(default = "default_confirm_command")]
    pub confirm_command: String,

    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    #[serde(default = "default_removal_attempts")]
    pub removal_attempts: u32,

    #[serde(default = "default_requiredby_passes")]
    pub requiredby_passes: u32,

    #[serde(default = "default_overwrite_glob")]
    pub overwrite_glob: String,
}

fn default_pacman_command() -> String {
    "pacman".to_string()
}

fn default_sudo_command() -> String {
    "sudo".to_string()
}

fn default_confirm_command() -> String {
    "yes".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("fixConflicts.log")
}

fn default_removal_attempts() -> u32 {
    2
}

fn default_requiredby_passes() -> u32 {
    2
}

fn default_overwrite_glob() -> String {
    "/*".to_string()
}

impl Config {
    pub fn load(config_path: Option<&str>) -> FixResult<Self> {
        let config_path = if let Some(path) = config_path {
            PathBuf::from(path)
        } else {
            PACFIX_CONFIG.join("pacfix.toml")
        };

        if config_path.exists() && config_path.is_file() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            config.save(&config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self, path: &Path) -> FixResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn upgrade_command(&self) -> String {
        format!(
            "{} {} -Syuv --needed --noconfirm --overwrite={}",
            self.sudo_command, self.pacman_command, self.overwrite_glob
        )
    }

    pub fn install_command(&self, package: &str) -> String {
        format!(
            "{} | {} {} -Syv {} 2>&1",
            self.confirm_command, self.sudo_command, self.pacman_command, package
        )
    }

    pub fn uninstall_command(&self, package: &str) -> String {
        format!(
            "{} {} -R --noconfirm {} 2>&1",
            self.sudo_command, self.pacman_command, package
        )
    }

    pub fn local_info_command(&self, package: &str) -> String {
        format!("{} -Qi {} 2>&1", self.pacman_command, package)
    }

    pub fn repo_info_command(&self, package: &str) -> String {
        format!("{} -Si {} 2>&1", self.pacman_command, package)
    }

    pub fn reinstall_command(&self, packages: &[String]) -> String {
        format!(
            "{} {} -Sy --noconfirm {}",
            self.sudo_command,
            self.pacman_command,
            packages.join(" ")
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pacman_command: default_pacman_command(),
            sudo_command: default_sudo_command(),
            confirm_command: default_confirm_command(),
            log_file: default_log_file(),
            removal_attempts: default_removal_attempts(),
            requiredby_passes: default_requiredby_passes(),
            overwrite_glob: default_overwrite_glob(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pacman_command, "pacman");
        assert_eq!(config.sudo_command, "sudo");
        assert_eq!(config.confirm_command, "yes");
        assert_eq!(config.log_file, PathBuf::from("fixConflicts.log"));
        assert_eq!(config.removal_attempts, 2);
        assert_eq!(config.requiredby_passes, 2);
        assert_eq!(config.overwrite_glob, "/*");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("pacman_command = \"pamac\"").unwrap();
        assert_eq!(config.pacman_command, "pamac");
        assert_eq!(config.sudo_command, "sudo");
        assert_eq!(config.removal_attempts, 2);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let content = toml::to_string_pretty(&config).unwrap();
        let reloaded: Config = toml::from_str(&content).unwrap();
        assert_eq!(reloaded.pacman_command, config.pacman_command);
        assert_eq!(reloaded.log_file, config.log_file);
        assert_eq!(reloaded.overwrite_glob, config.overwrite_glob);
    }

    #[test]
    fn test_command_shapes() {
        let config = Config::default();
        assert_eq!(
            config.upgrade_command(),
            "sudo pacman -Syuv --needed --noconfirm --overwrite=/*"
        );
        assert_eq!(
            config.install_command("firefox"),
            "yes | sudo pacman -Syv firefox 2>&1"
        );
        assert_eq!(
            config.uninstall_command("firefox"),
            "sudo pacman -R --noconfirm firefox 2>&1"
        );
        assert_eq!(config.local_info_command("firefox"), "pacman -Qi firefox 2>&1");
        assert_eq!(config.repo_info_command("firefox"), "pacman -Si firefox 2>&1");
        assert_eq!(
            config.reinstall_command(&["bash".to_string(), "vim".to_string()]),
            "sudo pacman -Sy --noconfirm bash vim"
        );
    }
}
