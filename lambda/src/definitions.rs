use std::path::Path;

use rpds::HashTrieMap;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DefinitionsError {
    #[error("Failed to read definitions from {path}")]
    Io {
        path: String,
        #[source]
        error: std::io::Error,
    },
    #[error("Line {line} is not of the form `name:expression`")]
    MissingColon { line: usize },
}
pub type Result<T> = std::result::Result<T, DefinitionsError>;

/// Named expressions, kept as unparsed text and expanded where referenced.
#[derive(Default, Clone, derive_more::Deref, Debug)]
pub struct Definitions(HashTrieMap<String, String>);

impl Definitions {
    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.0 = self.0.insert(name.into(), text.into());
    }

    /// Reads `name:expression` records, one per line, up to the first blank
    /// line.
    pub fn parse(input: &str) -> Result<Self> {
        let mut definitions = Self::default();
        for (i, line) in input.lines().map(str::trim).enumerate() {
            if line.is_empty() {
                break;
            }
            let (name, text) = line
                .split_once(':')
                .ok_or(DefinitionsError::MissingColon { line: i + 1 })?;
            definitions.add(name, text);
        }
        Ok(definitions)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|error| DefinitionsError::Io {
            path: path.display().to_string(),
            error,
        })?;
        let definitions = Self::parse(&input)?;
        info!(path = %path.display(), count = definitions.size(), "loaded definitions");
        Ok(definitions)
    }

    /// Definitions sorted by name.
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut entries = self
            .iter()
            .map(|(name, text)| (name.as_str(), text.as_str()))
            .collect::<Vec<_>>();
        entries.sort_unstable();
        entries
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse() {
        let definitions = Definitions::parse("id:λx.x\n  succ:λn.λf.λx.f (n f x)  \n").unwrap();
        assert_eq!(definitions.size(), 2);
        assert_eq!(definitions.get("id").map(String::as_str), Some("λx.x"));
        assert_eq!(
            definitions.get("succ").map(String::as_str),
            Some("λn.λf.λx.f (n f x)")
        );
    }

    #[test]
    fn test_parse_stops_at_blank_line() {
        let definitions = Definitions::parse("a:x\n\nb:y\n").unwrap();
        assert_eq!(definitions.sorted(), vec![("a", "x")]);
    }

    #[test]
    fn test_later_colons_belong_to_the_expression() {
        let definitions = Definitions::parse("a:b:c").unwrap();
        assert_eq!(definitions.get("a").map(String::as_str), Some("b:c"));
    }

    #[test]
    fn test_later_duplicates_win() {
        let definitions = Definitions::parse("a:x\na:y").unwrap();
        assert_eq!(definitions.sorted(), vec![("a", "y")]);
    }

    #[test]
    fn test_missing_colon() {
        assert!(matches!(
            Definitions::parse("a:x\nnonsense\n"),
            Err(DefinitionsError::MissingColon { line: 2 })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Definitions::load("/nonexistent/definitions.txt"),
            Err(DefinitionsError::Io { .. })
        ));
    }
}
