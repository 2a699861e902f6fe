//! Server state management for the DRC server

use std::path::PathBuf;
use std::sync::Arc;

use crate::board::Board;
use crate::config::DrcSettings;
use crate::drc::{CancelToken, DesignRules, DrcReport};

/// In-memory state: loaded board, active rules and the last DRC result
pub struct ServerState {
    pub board_path: Option<PathBuf>,
    pub board: Option<Arc<Board>>,
    pub rules: DesignRules,
    pub settings: DrcSettings,
    pub report: Option<DrcReport>,
    /// Token of the background run in progress, if any
    pub running: Option<CancelToken>,
    /// Bumped whenever the board changes so stale background results are dropped
    pub generation: u64,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            board_path: None,
            board: None,
            rules: DesignRules::default(),
            settings: DrcSettings::default(),
            report: None,
            running: None,
            generation: 0,
        }
    }

    pub fn is_board_loaded(&self) -> bool {
        self.board.is_some()
    }

    pub fn is_drc_running(&self) -> bool {
        self.running.is_some()
    }

    /// Replace the board, dropping results and cancelling any run on the old one
    pub fn set_board(&mut self, path: PathBuf, board: Board) {
        if let Some(token) = self.running.take() {
            token.cancel();
        }
        self.board_path = Some(path);
        self.board = Some(Arc::new(board));
        self.report = None;
        self.generation += 1;
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Result from a background DRC run
pub struct DrcAsyncResult {
    pub generation: u64,
    pub report: DrcReport,
}

/// Input to the server's main loop
pub enum ServerEvent {
    /// One line read from stdin
    Line(String),
    DrcFinished(DrcAsyncResult),
    InputClosed,
}
