use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const CONFIG_FILE: &str = "tgwwlang.toml";

/// Model langfile looked up when neither the CLI nor a config names one.
pub const DEFAULT_MODEL: &str = "English.xml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TgwwConfig {
    pub model: Option<String>,
    pub indent: Option<String>,
    pub format: Option<String>,
    pub update: Option<UpdateCfg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCfg {
    pub move_comments: Option<bool>,
    pub backup: Option<bool>,
}

impl TgwwConfig {
    pub fn model_path(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn move_comments(&self) -> bool {
        self.update.as_ref().and_then(|u| u.move_comments).unwrap_or(false)
    }

    pub fn backup(&self) -> bool {
        self.update.as_ref().and_then(|u| u.backup).unwrap_or(false)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Search order: `./tgwwlang.toml`, then `$CONFIG_DIR/tgwwlang/tgwwlang.toml`.
/// Earlier files win field by field.
pub fn load_config() -> Result<TgwwConfig, ConfigError> {
    let mut paths = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(CONFIG_FILE));
    }
    if let Some(base) = dirs::config_dir() {
        paths.push(base.join("tgwwlang").join(CONFIG_FILE));
    }
    load_config_from(&paths)
}

/// Merge the given files in order. Missing files are skipped; a file that
/// exists but does not parse is an error.
pub fn load_config_from<P: AsRef<Path>>(paths: &[P]) -> Result<TgwwConfig, ConfigError> {
    let mut merged = TgwwConfig::default();
    for path in paths {
        let path = path.as_ref();
        let Ok(text) = std::fs::read_to_string(path) else {
            continue;
        };
        let cfg = toml::from_str::<TgwwConfig>(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        merged = merge(merged, cfg);
    }
    Ok(merged)
}

fn merge(mut a: TgwwConfig, b: TgwwConfig) -> TgwwConfig {
    if a.model.is_none() {
        a.model = b.model;
    }
    if a.indent.is_none() {
        a.indent = b.indent;
    }
    if a.format.is_none() {
        a.format = b.format;
    }
    a.update = merge_opt(a.update, b.update, merge_update);
    a
}

fn merge_opt<T: Default>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

fn merge_update(mut a: UpdateCfg, b: UpdateCfg) -> UpdateCfg {
    if a.move_comments.is_none() {
        a.move_comments = b.move_comments;
    }
    if a.backup.is_none() {
        a.backup = b.backup;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn earlier_files_win_field_by_field() {
        let dir = tempfile::tempdir().unwrap();
        let local = write(dir.path(), "local.toml", "indent = \"-t\"\n[update]\nbackup = true\n");
        let global = write(
            dir.path(),
            "global.toml",
            "model = \"langs/English.xml\"\nindent = \"4\"\n[update]\nbackup = false\nmove_comments = true\n",
        );
        let cfg = load_config_from(&[local, global]).unwrap();
        assert_eq!(cfg.indent.as_deref(), Some("-t"));
        assert_eq!(cfg.model_path(), "langs/English.xml");
        assert!(cfg.backup());
        assert!(cfg.move_comments());
    }

    #[test]
    fn defaults_when_nothing_is_found() {
        let cfg = load_config_from(&[PathBuf::from("/nonexistent/tgwwlang.toml")]).unwrap();
        assert_eq!(cfg.model_path(), DEFAULT_MODEL);
        assert!(!cfg.backup());
        assert!(cfg.format.is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write(dir.path(), "bad.toml", "indent = [\n");
        let err = load_config_from(&[bad]).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
