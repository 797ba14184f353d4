use std::env;
use std::path::PathBuf;

/// Service name reported by health endpoints and logs
pub const SERVICE_NAME: &str = "porchlight";

/// File name of the SQLite database inside the Porchlight directory
pub const DATABASE_FILE: &str = "porchlight.db";

/// Get the path to the Porchlight directory (~/.porchlight)
pub fn porchlight_dir() -> PathBuf {
    // HOME first so tests can point it at a temp dir
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".porchlight")
    } else {
        dirs::home_dir()
            .unwrap_or_else(env::temp_dir)
            .join(".porchlight")
    }
}

/// Get the default database path (~/.porchlight/porchlight.db)
pub fn default_database_path() -> PathBuf {
    porchlight_dir().join(DATABASE_FILE)
}
