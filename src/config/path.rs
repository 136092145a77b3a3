//! Module for searching for touchless config files

use std::path::PathBuf;

/// Base system fallback path to use if one cannot be found with XDG
const FALLBACK_BASE_PATH: &str = "/usr/share/touchless";
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Returns the base path for configuration data
pub fn get_base_path() -> PathBuf {
    let Ok(base_dirs) = xdg::BaseDirectories::with_prefix("touchless") else {
        log::warn!("Unable to determine config base path. Using fallback path.");
        return PathBuf::from(FALLBACK_BASE_PATH);
    };

    // Get the data directories in preference order
    let data_dirs = base_dirs.get_data_dirs();
    for dir in data_dirs {
        if dir.exists() {
            return dir;
        }
    }

    log::warn!("Config base path not found. Using fallback path.");
    PathBuf::from(FALLBACK_BASE_PATH)
}

/// Returns the user config directory (e.g. "~/.config/touchless"), if known
pub fn get_user_config_path() -> Option<PathBuf> {
    let base_dirs = xdg::BaseDirectories::with_prefix("touchless").ok()?;
    Some(base_dirs.get_config_home())
}

/// Returns a list of config files in load order. The first one that exists
/// wins. E.g. ["/etc/touchless/config.yaml", "~/.config/touchless/config.yaml",
/// "/usr/share/touchless/config.yaml"]
pub fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/touchless").join(CONFIG_FILE_NAME)];
    if let Some(user_path) = get_user_config_path() {
        paths.push(user_path.join(CONFIG_FILE_NAME));
    }
    paths.push(get_base_path().join(CONFIG_FILE_NAME));
    paths.push(PathBuf::from("./rootfs/usr/share/touchless").join(CONFIG_FILE_NAME));

    paths
}
