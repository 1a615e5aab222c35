//! Session state machine for one translation job.
//!
//! Mirrors the interaction flow: nothing can start until a PDF is selected,
//! a running job disables further starts, and a finished job (success or
//! failure alike) re-enables start with the selection retained.

use std::path::{Path, PathBuf};

/// Driver states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverState {
    /// No valid file selected yet
    Idle,
    /// A PDF is selected; start is enabled
    FileSelected(PathBuf),
    /// A job is in flight; start is disabled
    Running(PathBuf),
}

/// Gates job starts on a valid selection.
#[derive(Debug)]
pub struct JobDriver {
    state: DriverState,
}

impl JobDriver {
    pub const fn new() -> Self {
        Self {
            state: DriverState::Idle,
        }
    }

    pub const fn state(&self) -> &DriverState {
        &self.state
    }

    /// Offer a path for selection. Only `.pdf` paths (case-insensitive)
    /// are accepted; anything else leaves the state unchanged, as does a
    /// selection attempt while a job is running. Returns whether the
    /// selection was accepted.
    pub fn select_file(&mut self, path: &Path) -> bool {
        if matches!(self.state, DriverState::Running(_)) {
            return false;
        }

        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return false;
        }

        self.state = DriverState::FileSelected(path.to_path_buf());
        true
    }

    /// Whether the start action is currently enabled.
    pub const fn can_start(&self) -> bool {
        matches!(self.state, DriverState::FileSelected(_))
    }

    /// Move to `Running` and hand back the selected path; `None` when no
    /// valid selection is in place.
    pub fn start(&mut self) -> Option<PathBuf> {
        match &self.state {
            DriverState::FileSelected(path) => {
                let path = path.clone();
                self.state = DriverState::Running(path.clone());
                Some(path)
            }
            _ => None,
        }
    }

    /// Record job completion or failure: the selection is retained and the
    /// start action is re-enabled.
    pub fn finish(&mut self) {
        if let DriverState::Running(path) = &self.state {
            self.state = DriverState::FileSelected(path.clone());
        }
    }
}

impl Default for JobDriver {
    fn default() -> Self {
        Self::new()
    }
}
