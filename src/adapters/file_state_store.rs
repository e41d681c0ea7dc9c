//! JSON-file strategy state store: one file per `(instrument, strategy)`.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::error::TraderError;
use crate::domain::state::StrategyState;
use crate::ports::state_port::StateStorePort;

pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, instrument: &str, strategy: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}_state.json", sanitize(instrument), sanitize(strategy)))
    }

    fn write_atomically(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)
    }
}

/// Keep file names portable: anything but `[A-Za-z0-9._-]` becomes `_`.
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl StateStorePort for FileStateStore {
    fn load(&self, instrument: &str, strategy: &str) -> Option<StrategyState> {
        let path = self.path_for(instrument, strategy);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable state file, treating as absent");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt state file, treating as absent");
                None
            }
        }
    }

    fn save(&self, instrument: &str, strategy: &str, state: &StrategyState) -> Result<(), TraderError> {
        let path = self.path_for(instrument, strategy);
        let bytes = serde_json::to_vec_pretty(state).map_err(|e| TraderError::StateStore {
            reason: e.to_string(),
        })?;
        self.write_atomically(&path, &bytes)
            .map_err(|e| TraderError::StateStore {
                reason: format!("{}: {e}", path.display()),
            })?;
        debug!(path = %path.display(), "saved strategy state");
        Ok(())
    }

    fn delete(&self, instrument: &str, strategy: &str) -> Result<(), TraderError> {
        let path = self.path_for(instrument, strategy);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TraderError::StateStore {
                reason: format!("{}: {e}", path.display()),
            }),
        }
    }
}
