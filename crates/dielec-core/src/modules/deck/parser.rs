use super::DielecDeck;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    #[error("failed to read input deck '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse input deck '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn load_deck(deck_path: impl AsRef<Path>) -> Result<DielecDeck, DeckError> {
    let deck_path = deck_path.as_ref();
    let source = fs::read_to_string(deck_path).map_err(|source| DeckError::Read {
        path: deck_path.to_path_buf(),
        source,
    })?;
    parse_deck(deck_path, &source)
}

pub(super) fn parse_deck(deck_path: &Path, source: &str) -> Result<DielecDeck, DeckError> {
    serde_json::from_str(source).map_err(|source| DeckError::Parse {
        path: deck_path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{DeckError, load_deck, parse_deck};
    use std::path::Path;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"{
        "prefix": "nacl",
        "lattice": [[0.0, 5.3, 5.3], [5.3, 0.0, 5.3], [5.3, 5.3, 0.0]],
        "atoms": [{ "element": "Na", "mass": 22.98977 }],
        "forceConstants": [[0,0,0],[0,0,0],[0,0,0]]
    }"#;

    #[test]
    fn omitted_keys_take_documented_defaults() {
        let deck = parse_deck(Path::new("dielec.json"), MINIMAL).expect("deck parses");
        assert!(!deck.dielec);
        assert_eq!(deck.dos.emin, 0.0);
        assert_eq!(deck.dos.emax, 1.0);
        assert_eq!(deck.dos.delta_e, 1.0);
        assert_eq!(deck.verbosity, 1);
        assert!(deck.born_info.is_none());
        assert!(!deck.born_symmetrize);
        assert!(deck.projection_directions.is_empty());
    }

    #[test]
    fn malformed_and_missing_decks_are_reported_with_their_path() {
        let error = parse_deck(Path::new("broken.json"), "{ \"prefix\": ").expect_err("truncated");
        assert!(matches!(error, DeckError::Parse { .. }));
        assert!(error.to_string().contains("broken.json"));

        let temp = TempDir::new().expect("tempdir should be created");
        let error = load_deck(temp.path().join("absent.json")).expect_err("missing file");
        assert!(matches!(error, DeckError::Read { .. }));
    }
}
