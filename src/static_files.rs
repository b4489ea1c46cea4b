//! Static file serving for the frontend
//!
//! Files are read from disk at request time, so the frontend can be rebuilt
//! without restarting the server.

use crate::config::AssetsConfig;
use tower_http::services::ServeDir;

/// Frontend root served at `/`; directory requests resolve to `index.html`
pub fn frontend_service(assets: &AssetsConfig) -> ServeDir {
    ServeDir::new(&assets.static_dir).append_index_html_on_directories(true)
}

/// Named configuration files served under `/assets/config/`
pub fn config_files_service(assets: &AssetsConfig) -> ServeDir {
    ServeDir::new(&assets.config_dir).append_index_html_on_directories(false)
}

/// Warn at startup when the asset directories are missing
pub fn check_asset_dirs(assets: &AssetsConfig) {
    for (name, dir) in [
        ("static_dir", &assets.static_dir),
        ("config_dir", &assets.config_dir),
    ] {
        if !std::path::Path::new(dir).is_dir() {
            tracing::warn!(
                setting = name,
                path = %dir,
                "Asset directory not found, requests under it will return 404"
            );
        }
    }
}
