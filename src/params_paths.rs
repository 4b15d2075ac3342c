//! Purpose: Backing-file path resolution shared by the library and the CLI.
//! Exports: `PARAMS_FILE_NAME`, `PATH_ENV`, `DIR_ENV`, `default_assets_dir`,
//! `resolve_params_path`, `params_path_from_env`.
//! Role: Keep the global bag and CLI defaults aligned from one source.
//! Invariants: Default backing file remains `assets/live_params.json` relative to the working dir.
//! Invariants: An explicit full path always wins over a directory override.

use std::path::PathBuf;

pub const PARAMS_FILE_NAME: &str = "live_params.json";
pub const PATH_ENV: &str = "LIVEPARAM_PATH";
pub const DIR_ENV: &str = "LIVEPARAM_DIR";

pub fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

pub fn resolve_params_path(path: Option<PathBuf>, dir: Option<PathBuf>) -> PathBuf {
    if let Some(path) = path.filter(|path| !path.as_os_str().is_empty()) {
        return path;
    }
    dir.filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(default_assets_dir)
        .join(PARAMS_FILE_NAME)
}

pub fn params_path_from_env() -> PathBuf {
    resolve_params_path(
        std::env::var_os(PATH_ENV).map(PathBuf::from),
        std::env::var_os(DIR_ENV).map(PathBuf::from),
    )
}

#[cfg(test)]
mod tests {
    use super::resolve_params_path;
    use std::path::PathBuf;

    #[test]
    fn default_path_is_under_assets() {
        assert_eq!(
            resolve_params_path(None, None),
            PathBuf::from("assets/live_params.json")
        );
    }

    #[test]
    fn dir_override_keeps_file_name() {
        assert_eq!(
            resolve_params_path(None, Some(PathBuf::from("/srv/demo"))),
            PathBuf::from("/srv/demo/live_params.json")
        );
    }

    #[test]
    fn explicit_path_wins() {
        assert_eq!(
            resolve_params_path(
                Some(PathBuf::from("/tmp/tuning.json")),
                Some(PathBuf::from("/srv/demo"))
            ),
            PathBuf::from("/tmp/tuning.json")
        );
    }

    #[test]
    fn empty_values_fall_back() {
        assert_eq!(
            resolve_params_path(Some(PathBuf::new()), Some(PathBuf::new())),
            PathBuf::from("assets/live_params.json")
        );
    }
}
