use anyhow::Result;
use std::path::PathBuf;

/// Resolve the FinBridge data folder (absolute path).
/// Holds the session store, the stored auth token, and the settings file.
pub fn resolve_data_folder() -> Result<PathBuf> {
    // Explicit override wins (used by smoke runs and tests)
    if let Ok(dir) = std::env::var("FINBRIDGE_DATA_DIR") {
        let path = PathBuf::from(dir);
        std::fs::create_dir_all(&path)
            .map_err(|e| anyhow::anyhow!("Failed to create data folder: {}", e))?;
        return Ok(path);
    }

    // Platform data dir, e.g. ~/.local/share/FinBridge
    if let Some(base) = dirs::data_dir() {
        let path = base.join("FinBridge");
        std::fs::create_dir_all(&path)
            .map_err(|e| anyhow::anyhow!("Failed to create data folder: {}", e))?;
        return Ok(path);
    }

    // Fallback: current working directory
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    Ok(cwd)
}

/// Resolve the log folder (absolute path)
pub fn resolve_log_folder() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("FINBRIDGE_LOG_DIR") {
        let path = PathBuf::from(dir);
        std::fs::create_dir_all(&path)
            .map_err(|e| anyhow::anyhow!("Failed to create log folder: {}", e))?;
        return Ok(path);
    }

    let base = resolve_data_folder()?;
    let log_dir = base.join("logs");
    std::fs::create_dir_all(&log_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create log folder: {}", e))?;
    Ok(log_dir)
}

/// Resolve the settings file path (may not exist yet)
pub fn resolve_settings_file() -> Result<PathBuf> {
    Ok(resolve_data_folder()?.join("finbridge.toml"))
}
