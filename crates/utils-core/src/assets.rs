use std::path::PathBuf;

use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");
pub const ASSET_DIR_ENV: &str = "HIVE_ASSET_DIR";

/// Directory holding the SQLite database and `config.json`.
///
/// `HIVE_ASSET_DIR` wins when set; debug builds otherwise use `dev_assets/` at
/// the workspace root, release builds the platform data dir.
pub fn asset_dir() -> std::io::Result<PathBuf> {
    if let Ok(override_dir) = std::env::var(ASSET_DIR_ENV) {
        let override_dir = override_dir.trim();
        if !override_dir.is_empty() {
            let path = PathBuf::from(override_dir);
            std::fs::create_dir_all(&path)?;
            return Ok(path);
        }
    }

    let path = if cfg!(debug_assertions) {
        PathBuf::from(PROJECT_ROOT).join("../../dev_assets")
    } else {
        ProjectDirs::from("dev", "beehive", "hive-ledger")
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "OS didn't give us a home directory",
                )
            })?
            .data_dir()
            .to_path_buf()
    };

    std::fs::create_dir_all(&path)?;
    Ok(path)
}

pub fn config_path() -> std::io::Result<PathBuf> {
    Ok(asset_dir()?.join("config.json"))
}

pub fn database_path() -> std::io::Result<PathBuf> {
    Ok(asset_dir()?.join("db.sqlite"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_is_created_and_used() {
        let dir = std::env::temp_dir().join(format!("hive-assets-{}", std::process::id()));
        // SAFETY: this is the only test in the crate touching the variable.
        unsafe {
            std::env::set_var(ASSET_DIR_ENV, &dir);
        }

        let resolved = asset_dir().unwrap();
        assert_eq!(resolved, dir);
        assert!(resolved.exists());
        assert_eq!(config_path().unwrap(), dir.join("config.json"));

        unsafe {
            std::env::remove_var(ASSET_DIR_ENV);
        }
        let _ = std::fs::remove_dir_all(&dir);
    }
}
