use crate::core::error::Result;
use std::path::{Path, PathBuf};

pub fn get_cache_directory() -> Result<PathBuf> {
    let base = match std::env::consts::OS {
        "linux" | "freebsd" | "netbsd" | "openbsd" => std::env::var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::home_dir().unwrap_or_default().join(".cache")),
        "macos" => dirs::home_dir()
            .unwrap_or_default()
            .join("Library/Caches"),
        "windows" => dirs::cache_dir().unwrap_or_default(),
        _ => dirs::cache_dir().unwrap_or_default(),
    };

    Ok(base.join("git-brief"))
}

/// Cache directory of one repository, keyed by a hash of its path
pub fn get_repository_cache_directory(repo_path: &Path) -> Result<PathBuf> {
    let repo_hash = format!("{:x}", md5::compute(repo_path.to_string_lossy().as_bytes()));
    log::debug!("Repository cache hash for {repo_path:?}: {repo_hash}");
    Ok(get_cache_directory()?.join(repo_hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_cache_directory_is_stable_and_distinct() -> Result<()> {
        let first = get_repository_cache_directory(Path::new("/repo/one"))?;
        let again = get_repository_cache_directory(Path::new("/repo/one"))?;
        let second = get_repository_cache_directory(Path::new("/repo/two"))?;

        assert_eq!(first, again);
        assert_ne!(first, second);
        assert!(first.to_string_lossy().contains("git-brief"));
        Ok(())
    }
}
