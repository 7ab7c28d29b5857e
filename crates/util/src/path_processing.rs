use std::path::PathBuf;

use dirs_next::{config_dir, home_dir};

/// Expand a leading `~` (either separator style) to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let home = || home_dir().unwrap_or_else(|| PathBuf::from("~"));
    if trimmed == "~" {
        return home();
    }
    if let Some(rest) = trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")) {
        return home().join(rest);
    }
    PathBuf::from(trimmed)
}

/// Directory holding the tool's own files (`~/.config/xcs` on most platforms).
pub fn xcs_config_dir() -> PathBuf {
    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("xcs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_home_prefixes() {
        let Some(home) = home_dir() else { return };
        assert_eq!(expand_tilde("~"), home);
        assert_eq!(expand_tilde(" ~/xcs/config.json "), home.join("xcs/config.json"));
        assert_eq!(expand_tilde("/etc/xcs.json"), PathBuf::from("/etc/xcs.json"));
    }
}
