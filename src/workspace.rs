//! Workspace management for tabcompare operations

use crate::cache::ResultCache;
use crate::config::Settings;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

const WORKSPACE_DIR: &str = ".tabcompare";
const GITIGNORE_ENTRY: &str = ".tabcompare/*.duckdb*";

/// Manages the .tabcompare workspace directory
#[derive(Debug, Clone)]
pub struct TabcompareWorkspace {
    /// Project root directory (where .tabcompare/ lives)
    pub root: PathBuf,
    /// .tabcompare/ directory path
    pub workspace_dir: PathBuf,
    /// .tabcompare/config.json
    pub config_path: PathBuf,
    /// .tabcompare/results.duckdb
    pub cache_path: PathBuf,
}

impl TabcompareWorkspace {
    /// Find existing workspace or create a new one
    pub fn find_or_create(start_dir: Option<&Path>) -> Result<Self> {
        let current_dir = std::env::current_dir()?;
        let start = start_dir.unwrap_or(&current_dir);

        if let Some(workspace) = Self::find_existing(start) {
            return Ok(workspace);
        }

        Self::create_new(start.to_path_buf())
    }

    /// Find an existing workspace by walking up the directory tree. The walk
    /// stops at a directory containing `.git`.
    pub fn find_existing(start_dir: &Path) -> Option<Self> {
        let mut current = start_dir;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Some(Self::from_root(current.to_path_buf()));
            }

            if current.join(".git").exists() {
                return None;
            }

            current = current.parent()?;
        }
    }

    /// Create a new workspace in the specified root directory
    pub fn create_new(root: PathBuf) -> Result<Self> {
        let workspace = Self::from_root(root);

        fs::create_dir_all(&workspace.workspace_dir)?;
        workspace.create_config_with_force(false)?;
        workspace.ensure_gitignore()?;

        log::info!("Created tabcompare workspace at: {}", workspace.root.display());

        Ok(workspace)
    }

    pub fn from_root(root: PathBuf) -> Self {
        let workspace_dir = root.join(WORKSPACE_DIR);
        let config_path = workspace_dir.join("config.json");
        let cache_path = workspace_dir.join("results.duckdb");

        Self {
            root,
            workspace_dir,
            config_path,
            cache_path,
        }
    }

    /// Write default settings. Existing settings are kept unless `force` is set.
    pub fn create_config_with_force(&self, force: bool) -> Result<()> {
        if self.config_path.exists() && !force {
            return Ok(());
        }
        Settings::default().save(&self.config_path)
    }

    pub fn load_settings(&self) -> Result<Settings> {
        Settings::load(&self.config_path)
    }

    pub fn result_cache(&self) -> ResultCache {
        ResultCache::new(&self.cache_path)
    }

    /// Ensure .gitignore keeps the result cache out of version control
    pub fn ensure_gitignore(&self) -> Result<()> {
        let gitignore_path = self.root.join(".gitignore");
        let block = format!("# Ignore the tabcompare result cache\n{}\n", GITIGNORE_ENTRY);

        if gitignore_path.exists() {
            let content = fs::read_to_string(&gitignore_path)?;
            if !content.contains(GITIGNORE_ENTRY) {
                let new_content = if content.ends_with('\n') {
                    format!("{}\n{}", content, block)
                } else {
                    format!("{}\n\n{}", content, block)
                };
                fs::write(gitignore_path, new_content)?;
                log::info!("Updated .gitignore with tabcompare entries");
            }
        } else {
            fs::write(gitignore_path, block)?;
            log::info!("Created .gitignore with tabcompare entries");
        }

        Ok(())
    }
}
