//! Store manager for the security database.
//!
//! Resolves the SQLite store location and opens it, with a platform-specific
//! default when no path is configured.

use busan_data::{DataError, SqliteStore};
use std::path::{Path, PathBuf};

/// Get the default data directory path.
///
/// Uses platform-specific data directories:
/// - Linux: `~/.local/share/busan/`
/// - macOS: `~/Library/Application Support/busan/`
/// - Windows: `%APPDATA%\busan\`
pub(crate) fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("busan")
}

/// Get the default store path.
pub(crate) fn default_store_path() -> PathBuf {
    default_data_dir().join("busan.db")
}

/// Open the store at `path`, creating the directory if needed.
pub(crate) fn open_store(path: &Path) -> Result<SqliteStore, DataError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    SqliteStore::new(path)
}

/// Print the store location and contents.
pub(crate) fn print_store_info(path: &Path, store: &SqliteStore) -> Result<(), DataError> {
    let stats = store.get_stats()?;
    println!("  Store location: {}", path.display());
    println!(
        "  Daily records: {} for {} instruments over {} trading days",
        stats.daily_records, stats.instruments, stats.trading_days
    );
    println!("  Fundamental records: {}", stats.fundamental_records);
    if let (Some(first), Some(last)) = (stats.first_date, stats.last_date) {
        println!("  Date range: {} to {}", first, last);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path() {
        let path = default_store_path();
        assert!(path.ends_with("busan/busan.db"));
    }

    #[test]
    fn test_open_creates_parent() {
        let dir = std::env::temp_dir().join("busan_store_manager_test");
        std::fs::remove_dir_all(&dir).ok();
        let path = dir.join("nested").join("busan.db");

        let store = open_store(&path).unwrap();
        assert!(path.parent().unwrap().is_dir());
        assert_eq!(store.get_stats().unwrap().daily_records, 0);

        std::fs::remove_dir_all(&dir).ok();
    }
}
