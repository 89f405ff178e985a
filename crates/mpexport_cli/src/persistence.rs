use std::fs;
use std::path::{Path, PathBuf};

use mpexport_engine::{ensure_output_dir, AtomicFileWriter};
use mpexport_logging::{mp_error, mp_info, mp_warn};
use serde::{Deserialize, Serialize};

pub(crate) const STATE_FILENAME: &str = ".mpexport_state.ron";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedState {
    completed_urls: Vec<String>,
}

/// Article URLs a previous run recorded as exported. Unreadable state counts as empty.
pub(crate) fn load_completed_urls(output_dir: &Path) -> Vec<String> {
    let path = output_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Vec::new();
        }
        Err(err) => {
            mp_warn!("Failed to read resume state from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    let state: PersistedState = match ron::from_str(&content) {
        Ok(state) => state,
        Err(err) => {
            mp_warn!("Failed to parse resume state from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    mp_info!(
        "Loaded {} exported articles from {:?}",
        state.completed_urls.len(),
        path
    );
    state.completed_urls
}

/// Adds `completed` to the URLs already recorded in `output_dir`.
pub(crate) fn save_completed_urls(output_dir: &Path, completed: &[String]) {
    if let Err(err) = ensure_output_dir(output_dir) {
        mp_error!("Failed to ensure output dir {:?}: {}", output_dir, err);
        return;
    }

    let mut completed_urls = load_completed_urls(output_dir);
    completed_urls.extend_from_slice(completed);
    completed_urls.sort();
    completed_urls.dedup();
    let state = PersistedState { completed_urls };

    let content = match ron::ser::to_string_pretty(&state, ron::ser::PrettyConfig::new()) {
        Ok(text) => text,
        Err(err) => {
            mp_error!("Failed to serialize resume state: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(PathBuf::from(output_dir));
    if let Err(err) = writer.write(STATE_FILENAME, &content) {
        mp_error!("Failed to write resume state to {:?}: {}", output_dir, err);
    }
}
