//! Wallet sources
//!
//! The form never loads wallets itself; it is handed snapshots by a
//! [`WalletSource`]. [`WalletRegistry`] reads them from a wallets.json file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::types::{Wallet, WalletRegistryFile};

/// Supplies wallet snapshots to the send form
#[async_trait]
pub trait WalletSource: Send + Sync {
    /// All known wallets
    async fn wallets(&self) -> Result<Vec<Wallet>>;

    /// A single wallet by identifier
    async fn wallet(&self, id: &str) -> Result<Wallet> {
        self.wallets()
            .await?
            .into_iter()
            .find(|w| w.id == id)
            .ok_or_else(|| Error::WalletNotFound(id.to_string()))
    }
}

/// File-backed wallet registry
pub struct WalletRegistry {
    path: PathBuf,
    wallets: HashMap<String, Wallet>,
    /// Registry order, used for listing
    order: Vec<String>,
}

impl WalletRegistry {
    /// Load the registry from a wallets.json file
    ///
    /// A missing file yields an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        let file = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::Io(format!("Failed to read {}: {}", path.display(), e))
            })?;

            serde_json::from_str::<WalletRegistryFile>(&content).map_err(|e| {
                Error::Deserialization(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            warn!("{} not found, using empty wallet registry", path.display());
            WalletRegistryFile::default()
        };

        let order: Vec<String> = file.wallets.iter().map(|w| w.id.clone()).collect();
        let wallets: HashMap<String, Wallet> = file
            .wallets
            .into_iter()
            .map(|w| (w.id.clone(), w))
            .collect();

        if wallets.len() != order.len() {
            warn!("Duplicate wallet ids in {}, later entries win", path.display());
        }

        info!("Loaded {} wallets from {}", wallets.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            wallets,
            order,
        })
    }

    /// Path the registry was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get wallet by id
    pub fn get_wallet(&self, id: &str) -> Option<&Wallet> {
        self.wallets.get(id)
    }

    /// Number of wallets
    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}

#[async_trait]
impl WalletSource for WalletRegistry {
    async fn wallets(&self) -> Result<Vec<Wallet>> {
        let mut seen = std::collections::HashSet::new();
        Ok(self
            .order
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| self.wallets.get(id).cloned())
            .collect())
    }

    async fn wallet(&self, id: &str) -> Result<Wallet> {
        debug!("Looking up wallet {}", id);
        self.get_wallet(id)
            .cloned()
            .ok_or_else(|| Error::WalletNotFound(id.to_string()))
    }
}
