use dotenv::dotenv;
use log::warn;
use rustyline::EditMode;
use std::env;
use std::fs;
use std::path::PathBuf;

pub struct Config {
    pub name: String,
    pub theme: String,
    pub config_dir: PathBuf,
    pub history_file: PathBuf,
    pub editor_mode: String,
    pub logger_level: String,
    pub logger_dir: PathBuf,
    pub home: Option<PathBuf>,
}

impl Config {
    fn get_config_dir() -> PathBuf {
        if let Ok(home) = env::var("HOME") {
            PathBuf::from(home).join(".config/pipesh")
        } else {
            PathBuf::from("tmp")
        }
    }

    fn default() -> Self {
        let config_dir = Self::get_config_dir();
        Config {
            name: String::from(env!("CARGO_PKG_NAME")),
            theme: String::from("default"),
            history_file: config_dir.join(".pipesh_history"),
            editor_mode: String::from("emacs"),
            logger_level: String::from("info"),
            logger_dir: config_dir.join("logs"),
            home: env::var_os("HOME").map(PathBuf::from),
            config_dir,
        }
    }

    pub fn new() -> Self {
        // 优先加载环境变量
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        let mut config = Config::default();

        if let Ok(theme) = env::var("PIPESH_THEME") {
            config.theme = theme;
        }

        if let Ok(editor) = env::var("PIPESH_EDITOR") {
            config.editor_mode = editor;
        }

        config.history_file = history_file_from(|key| env::var(key).ok(), config.history_file);

        if let Ok(level) = env::var("PIPESH_LOG_LEVEL") {
            config.logger_level = level;
        }

        if let Ok(dir) = env::var("PIPESH_LOG_DIR") {
            config.logger_dir = PathBuf::from(dir);
        }

        config
    }

    /// 确保历史文件目录存在。在日志初始化之后调用，失败只记录不退出。
    pub fn ensure_history_dir(&self) {
        if let Some(parent) = self.history_file.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("无法创建历史记录目录 {}: {}", parent.display(), e);
            }
        }
    }

    pub fn get_edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "vi" => EditMode::Vi,
            _ => EditMode::Emacs,
        }
    }
}

/// 历史文件路径：`PIPESH_HISTORY` 优先，其次 `HISTFILE`，最后是默认值。
fn history_file_from(var: impl Fn(&str) -> Option<String>, default: PathBuf) -> PathBuf {
    var("PIPESH_HISTORY")
        .or_else(|| var("HISTFILE"))
        .map(PathBuf::from)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_mode_defaults_to_emacs() {
        let mut config = Config::default();
        assert_eq!(config.get_edit_mode(), EditMode::Emacs);

        config.editor_mode = String::from("VI");
        assert_eq!(config.get_edit_mode(), EditMode::Vi);

        config.editor_mode = String::from("nano");
        assert_eq!(config.get_edit_mode(), EditMode::Emacs);
    }

    #[test]
    fn test_default_paths_live_under_config_dir() {
        let config = Config::default();
        assert!(config.history_file.starts_with(&config.config_dir));
        assert!(config.logger_dir.starts_with(&config.config_dir));
        assert_eq!(config.name, "pipesh");
    }

    #[test]
    fn test_history_file_override_order() {
        let default = PathBuf::from("/default/history");
        let both = |key: &str| match key {
            "PIPESH_HISTORY" => Some(String::from("/pipesh/history")),
            "HISTFILE" => Some(String::from("/histfile")),
            _ => None,
        };
        let histfile_only = |key: &str| (key == "HISTFILE").then(|| String::from("/histfile"));
        let none = |_: &str| -> Option<String> { None };

        assert_eq!(
            history_file_from(both, default.clone()),
            PathBuf::from("/pipesh/history")
        );
        assert_eq!(
            history_file_from(histfile_only, default.clone()),
            PathBuf::from("/histfile")
        );
        assert_eq!(history_file_from(none, default.clone()), default);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_ensure_history_dir_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.history_file = dir.path().join("a/b/history");

        config.ensure_history_dir();
        assert!(dir.path().join("a/b").is_dir());
        assert!(!config.history_file.exists());
    }
}
