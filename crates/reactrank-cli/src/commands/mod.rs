pub mod rank;
pub mod serve;
pub mod stats;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use reactrank_core::{InMemoryMeasurementStore, Measurement, MeasurementStore};

/// Read a JSON array of measurements.
pub fn load_measurements(path: &Path) -> anyhow::Result<Vec<Measurement>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read data file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parse data file {}", path.display()))
}

/// Build an in-memory store, optionally pre-loaded from a data file.
pub fn make_store(path: Option<&Path>) -> anyhow::Result<Arc<dyn MeasurementStore>> {
    let measurements = match path {
        Some(path) => load_measurements(path)?,
        None => Vec::new(),
    };
    log::info!("loaded {} measurements", measurements.len());
    Ok(Arc::new(InMemoryMeasurementStore::from_measurements(
        measurements,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use reactrank_core::{Modality, UserId};

    fn write_data(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_measurements() {
        let file = write_data(
            r#"[{"user": "a", "modality": "visual", "recorded_at": 3, "value": 240.0}]"#,
        );
        let ms = load_measurements(file.path()).unwrap();
        assert_eq!(ms.len(), 1);
        assert_eq!(ms[0].modality, Modality::Visual);
    }

    #[test]
    fn test_load_rejects_invalid_user() {
        let file = write_data(
            r#"[{"user": "", "modality": "visual", "recorded_at": 3, "value": 240.0}]"#,
        );
        assert!(load_measurements(file.path()).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_measurements(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("read data file"));
    }

    #[test]
    fn test_make_store_empty() {
        let store = make_store(None).unwrap();
        assert!(store.all_values(Modality::Visual).unwrap().is_empty());
    }

    #[test]
    fn test_make_store_from_file() {
        let file = write_data(
            r#"[{"user": "a", "modality": "auditory", "recorded_at": 3, "value": 190.0}]"#,
        );
        let store = make_store(Some(file.path())).unwrap();
        let a = UserId::parse("a").unwrap();
        assert_eq!(store.latest_for_user(&a, Modality::Auditory).unwrap(), Some(190.0));
    }
}
