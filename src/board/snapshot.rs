//! JSON board snapshots

use std::path::Path;

use tracing::debug;

use crate::error::LoadError;

use super::types::Board;

/// Read a board snapshot from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid snapshot.
pub fn load_board(path: &Path) -> Result<Board, LoadError> {
    let contents = std::fs::read_to_string(path).map_err(|e| LoadError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let board: Board = serde_json::from_str(&contents).map_err(|e| LoadError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(
        path = %path.display(),
        parts = board.parts.len(),
        nets = board.nets.len(),
        footprints = board.footprints.len(),
        "Loaded board snapshot"
    );
    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_board_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"copper_layers": 4, "nets": [{{"name": "GND"}}],
                "outline": [{{"contours": [[{{"x": 0, "y": 0}}, {{"x": 100, "y": 0}}, {{"x": 100, "y": 100}}]]}}]}}"#
        )
        .unwrap();
        let board = load_board(file.path()).unwrap();
        assert_eq!(board.copper_layers, 4);
        assert_eq!(board.nets[0].name, "GND");
        assert_eq!(board.outline[0].num_corners(), 3);
    }

    #[test]
    fn test_load_board_errors() {
        let missing = load_board(Path::new("/nonexistent/board.json"));
        assert!(matches!(missing, Err(LoadError::ReadError { .. })), "got {:?}", missing.err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let bad = load_board(file.path());
        assert!(matches!(bad, Err(LoadError::ParseError { .. })), "got {:?}", bad.err());
    }
}
