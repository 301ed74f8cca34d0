//! Where the bearer and refresh tokens live between requests.
//!
//! Writers are last-write-wins: a concurrent refresh may overwrite a token
//! another task just stored, which is harmless because refresh is idempotent
//! per value.

use crate::error::TokenStoreError;

use common::{ErrorLocation, RedactedToken};

use std::collections::{BTreeMap, HashMap};
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    /// Key the token is persisted under.
    pub fn storage_key(&self) -> &'static str {
        match self {
            TokenKind::Access => "auth_token",
            TokenKind::Refresh => "refresh_token",
        }
    }

    fn from_storage_key(key: &str) -> Option<Self> {
        match key {
            "auth_token" => Some(TokenKind::Access),
            "refresh_token" => Some(TokenKind::Refresh),
            _ => None,
        }
    }
}

pub trait TokenStore: Send + Sync {
    fn get(&self, kind: TokenKind) -> Option<RedactedToken>;

    fn set(&self, kind: TokenKind, token: RedactedToken) -> Result<(), TokenStoreError>;

    fn remove(&self, kind: TokenKind) -> Result<(), TokenStoreError>;

    fn clear(&self) -> Result<(), TokenStoreError> {
        self.remove(TokenKind::Access)?;
        self.remove(TokenKind::Refresh)
    }
}

#[track_caller]
fn poisoned<T>(_: PoisonError<T>) -> TokenStoreError {
    TokenStoreError::Poisoned {
        location: ErrorLocation::from(Location::caller()),
    }
}

fn read_token(
    tokens: &RwLock<HashMap<TokenKind, RedactedToken>>,
    kind: TokenKind,
) -> Option<RedactedToken> {
    match tokens.read() {
        Ok(tokens) => tokens.get(&kind).cloned(),
        Err(_) => {
            warn!("Token store lock poisoned; {} token unavailable", kind.storage_key());
            None
        }
    }
}

// ============================================
// IN-MEMORY
// ============================================

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<TokenKind, RedactedToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave the lock poisoned, as a writer panicking mid-update would.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _guard = self.tokens.write();
                    panic!("token writer panicked");
                })
                .join()
        });
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, kind: TokenKind) -> Option<RedactedToken> {
        read_token(&self.tokens, kind)
    }

    fn set(&self, kind: TokenKind, token: RedactedToken) -> Result<(), TokenStoreError> {
        self.tokens.write().map_err(|e| poisoned(e))?.insert(kind, token);
        Ok(())
    }

    fn remove(&self, kind: TokenKind) -> Result<(), TokenStoreError> {
        self.tokens.write().map_err(|e| poisoned(e))?.remove(&kind);
        Ok(())
    }
}

// ============================================
// FILE-BACKED
// ============================================

/// Tokens persisted as a flat JSON object, rewritten atomically on change.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    tokens: RwLock<HashMap<TokenKind, RedactedToken>>,
}

impl FileTokenStore {
    /// Open the store, reading existing tokens if the file exists.
    pub fn open(path: &Path) -> Result<Self, TokenStoreError> {
        let mut tokens = HashMap::new();

        if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|e| TokenStoreError::Read {
                location: ErrorLocation::from(Location::caller()),
                path: path.to_path_buf(),
                source: e,
            })?;

            let stored: BTreeMap<String, String> =
                serde_json::from_str(&contents).map_err(|e| TokenStoreError::Format {
                    location: ErrorLocation::from(Location::caller()),
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;

            for (key, value) in stored {
                match TokenKind::from_storage_key(&key) {
                    Some(kind) => {
                        tokens.insert(kind, RedactedToken::new(value));
                    }
                    None => debug!("Ignoring unknown token key '{}'", key),
                }
            }
            info!("Loaded {} token(s) from {}", tokens.len(), path.display());
        }

        Ok(Self {
            path: path.to_path_buf(),
            tokens: RwLock::new(tokens),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, tokens: &HashMap<TokenKind, RedactedToken>) -> Result<(), TokenStoreError> {
        let stored: BTreeMap<&str, &str> = tokens
            .iter()
            .map(|(kind, token)| (kind.storage_key(), token.expose()))
            .collect();

        let json = serde_json::to_string_pretty(&stored).map_err(|e| TokenStoreError::Format {
            location: ErrorLocation::from(Location::caller()),
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TokenStoreError::Write {
                location: ErrorLocation::from(Location::caller()),
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, json).map_err(|e| TokenStoreError::Write {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        // Atomic rename (POSIX guarantees atomicity)
        std::fs::rename(&temp_path, &self.path).map_err(|e| TokenStoreError::Write {
            location: ErrorLocation::from(Location::caller()),
            path: self.path.clone(),
            source: e,
        })
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, kind: TokenKind) -> Option<RedactedToken> {
        read_token(&self.tokens, kind)
    }

    fn set(&self, kind: TokenKind, token: RedactedToken) -> Result<(), TokenStoreError> {
        let mut tokens = self.tokens.write().map_err(|e| poisoned(e))?;
        tokens.insert(kind, token);
        self.persist(&tokens)
    }

    fn remove(&self, kind: TokenKind) -> Result<(), TokenStoreError> {
        let mut tokens = self.tokens.write().map_err(|e| poisoned(e))?;
        if tokens.remove(&kind).is_some() {
            self.persist(&tokens)?;
        }
        Ok(())
    }
}
