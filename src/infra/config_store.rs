// ============================================================
// Layer 6 — Config Store
// ============================================================
// Saves and restores the resolved TaggerConfig as JSON so a
// later run can rebuild the same model and optimiser setup:
//
//   <dir>/
//     tagger_config.json   ← encoder, heads, tagset sizes,
//                            optimisation settings
//
// Model weights are never written here.
//
// Reference: Rust Book §9 (Error Handling with anyhow)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::ml::model::TaggerConfig;

const CONFIG_FILE: &str = "tagger_config.json";

pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn save(&self, cfg: &TaggerConfig) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let path = self.path();
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved tagger config to '{}'", path.display());
        Ok(())
    }

    /// Load a saved config and check it before anything is built from it.
    pub fn load(&self) -> Result<TaggerConfig> {
        let path = self.path();
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;

        let cfg: TaggerConfig = serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))?;
        cfg.validate()
            .with_context(|| format!("Invalid config in '{}'", path.display()))?;
        Ok(cfg)
    }
}
