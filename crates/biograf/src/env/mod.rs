use anyhow::{Context, Result};
use home::home_dir;
use std::{
    env,
    path::{Path, PathBuf},
};

/// Directories the command line works in.
///
/// ```text
/// <root>            $BIOGRAF_ROOT or ~/.biograf
/// ├── biograf.toml  optional configuration
/// └── store/        sled database
/// ```
#[derive(Debug, Clone, Default)]
pub struct BiografEnv {
    root: PathBuf,
    config: PathBuf,
    store: PathBuf,
}

impl BiografEnv {
    pub fn new() -> Result<Self> {
        let root = match env::var_os("BIOGRAF_ROOT") {
            Some(root) => PathBuf::from(root),
            None => home_dir()
                .context("Failed to get home directory")?
                .join(".biograf"),
        };
        Ok(Self::from_root(&root))
    }

    pub fn from_root(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            config: root.join("biograf.toml"),
            store: root.join("store"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Path {
        &self.config
    }

    pub fn store(&self) -> &Path {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let dir = tempfile::tempdir().unwrap();
        let env = BiografEnv::from_root(dir.path());
        assert_eq!(env.config(), dir.path().join("biograf.toml"));
        assert_eq!(env.store(), dir.path().join("store"));
        assert_eq!(env.root(), dir.path());
    }
}
