//! Speaker name to id mapping, stored as a flat JSON object next to the dataset.

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Speaker ids are usually integers, but older mappings use string labels.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SpeakerId {
    Index(i64),
    Name(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeakerMap {
    speakers: BTreeMap<String, SpeakerId>,
}

impl SpeakerMap {
    /// Loads `{"speaker name": id, ...}` from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::configuration(path, e))?;
        let speakers: BTreeMap<String, SpeakerId> =
            serde_json::from_str(&text).map_err(|e| Error::configuration(path, e))?;
        log::debug!("Loaded {} speakers from {:?}", speakers.len(), path);
        Ok(Self { speakers })
    }

    pub fn get(&self, name: &str) -> Option<&SpeakerId> {
        self.speakers.get(name)
    }

    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SpeakerId)> {
        self.speakers.iter().map(|(name, id)| (name.as_str(), id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, text: &str) -> std::path::PathBuf {
        let path = dir.join("speakers.json");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn loads_integer_and_string_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), r#"{"alto": 0, "tenor": 1, "legacy": "spk-7"}"#);

        let map = SpeakerMap::load(&path).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("tenor"), Some(&SpeakerId::Index(1)));
        assert_eq!(map.get("legacy"), Some(&SpeakerId::Name("spk-7".into())));
        assert_eq!(map.get("bass"), None);
        // BTreeMap keeps names ordered.
        let names: Vec<_> = map.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["alto", "legacy", "tenor"]);
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SpeakerMap::load(dir.path().join("speakers.json")).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn malformed_json_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        for text in ["{\"alto\": ", "[0, 1]", "{\"alto\": [1]}"] {
            let path = write(dir.path(), text);
            let err = SpeakerMap::load(&path).unwrap_err();
            assert!(matches!(err, Error::Configuration { .. }), "{text}");
        }
    }
}
