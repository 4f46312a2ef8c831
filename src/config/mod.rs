use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use directories::BaseDirs;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(default_config_path())
    }

    pub fn load_from(config_path: PathBuf) -> Self {
        let mut map = default_map();

        // Read the config file if it exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if let Some(key) = config_key(&k) {
                map.insert(key.to_string(), v);
            }
        }

        Self { inner: map, config_path }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        // ENV first, prefixed then bare
        if let Ok(v) = env::var(format!("RLSPAD_{key}")) {
            return Some(v);
        }
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn default_example(&self) -> Option<String> {
        self.get("DEFAULT_EXAMPLE").filter(|v| !v.is_empty())
    }

    pub fn color_output(&self) -> bool {
        self.get_bool("COLOR_OUTPUT")
    }

    pub fn show_line_numbers(&self) -> bool {
        self.get_bool("SHOW_LINE_NUMBERS")
    }

    /// Spaces per indent step in the editor, clamped to 1..=8.
    pub fn tab_width(&self) -> usize {
        self.get("TAB_WIDTH")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|w| (1..=8).contains(w))
            .unwrap_or(2)
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.get("LOG_FILE")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}

/// Accept known keys bare or behind the RLSPAD_ prefix.
fn config_key(k: &str) -> Option<&str> {
    const KEYS: &[&str] = &[
        "DEFAULT_EXAMPLE",
        "COLOR_OUTPUT",
        "TAB_WIDTH",
        "SHOW_LINE_NUMBERS",
        "LOG_FILE",
    ];

    if KEYS.contains(&k) {
        return Some(k);
    }
    k.strip_prefix("RLSPAD_").filter(|bare| KEYS.contains(bare))
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("rlspad").join("config")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert("COLOR_OUTPUT".into(), "true".into());
    m.insert("TAB_WIDTH".into(), "2".into());
    m.insert("SHOW_LINE_NUMBERS".into(), "true".into());
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load_from(PathBuf::from("/nonexistent/rlspad/config"));
        assert_eq!(config.tab_width(), 2);
        assert!(config.color_output());
        assert!(config.show_line_numbers());
        assert_eq!(config.default_example(), None);
        assert_eq!(config.log_file(), None);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "# playground settings").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "TAB_WIDTH = 4").unwrap();
        writeln!(file, "COLOR_OUTPUT=false").unwrap();
        writeln!(file, "DEFAULT_EXAMPLE = tenant-isolation").unwrap();

        let config = Config::load_from(path);
        assert_eq!(config.tab_width(), 4);
        assert!(!config.color_output());
        assert_eq!(config.default_example().as_deref(), Some("tenant-isolation"));
    }

    #[test]
    fn out_of_range_tab_width_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, "TAB_WIDTH = 40\n").unwrap();
        assert_eq!(Config::load_from(path).tab_width(), 2);
    }

    #[test]
    fn prefixed_keys_map_to_bare_names() {
        assert_eq!(config_key("RLSPAD_TAB_WIDTH"), Some("TAB_WIDTH"));
        assert_eq!(config_key("TAB_WIDTH"), Some("TAB_WIDTH"));
        assert_eq!(config_key("RLSPAD_LOG"), None);
        assert_eq!(config_key("PATH"), None);
    }
}
