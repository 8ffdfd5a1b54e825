use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use seicon_remote::InMemoryCollection;
use seicon_types::IconRecord;
use serde::Deserialize;
use tracing::debug;

/// Contents of a remote collection, as stored in a JSON file.
///
/// ```json
/// {
///   "records": [{ "id": "a", "engineIdentifiers": ["shop*"], "imageSize": 16,
///                 "attachment": { "mimetype": "image/png" }, "last_modified": 1 }],
///   "attachments": { "a": "89504e47" }
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub records: Vec<IconRecord>,
    /// Hex-encoded attachment bytes keyed by record id.
    #[serde(default)]
    pub attachments: BTreeMap<String, String>,
}

impl Fixture {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        let fixture = Self::from_json(&text)
            .with_context(|| format!("parsing fixture {}", path.display()))?;
        debug!(
            path = %path.display(),
            records = fixture.records.len(),
            attachments = fixture.attachments.len(),
            "fixture loaded"
        );
        Ok(fixture)
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn into_collection(self) -> anyhow::Result<InMemoryCollection> {
        let collection = InMemoryCollection::default();
        for record in self.records {
            collection.insert_record(record);
        }
        for (id, data) in self.attachments {
            let bytes =
                hex::decode(&data).with_context(|| format!("attachment for {id} is not hex"))?;
            collection.set_attachment(id.as_str(), bytes);
        }
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seicon_remote::RemoteCollection;

    const FIXTURE: &str = r#"{
        "records": [
            { "id": "a", "engineIdentifiers": ["shop*"], "imageSize": 16,
              "attachment": { "mimetype": "image/png" }, "last_modified": 3 }
        ],
        "attachments": { "a": "69636f6e" }
    }"#;

    #[tokio::test]
    async fn builds_collection() {
        let collection = Fixture::from_json(FIXTURE).unwrap().into_collection().unwrap();
        let records = collection.records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].last_modified, 3);
        assert_eq!(&collection.download(&records[0]).await.unwrap()[..], b"icon");
    }

    #[test]
    fn rejects_bad_hex() {
        let fixture = Fixture::from_json(
            r#"{ "records": [], "attachments": { "a": "not hex" } }"#,
        )
        .unwrap();
        assert!(fixture.into_collection().is_err());
    }

    #[test]
    fn load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.json");
        std::fs::write(&path, "{").unwrap();
        let err = Fixture::load(&path).unwrap_err();
        assert!(err.to_string().contains("fixture.json"));
    }
}
