//! JSON file storage for the configuration document.
//!
//! Writes go to a temporary file in the data directory that is then renamed
//! over `config.json`, so a concurrent reader sees either the old or the new
//! document and never a partial one.

mod error;

pub use error::StoreError;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use crate::model::Config;

const CONFIG_FILE: &str = "config.json";
const EXAMPLE_FILE: &str = "config.example.json";

/// Reads and writes `config.json` inside a data directory.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    data_dir: PathBuf,
}

impl ConfigStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// Makes sure a configuration exists and returns it.
    ///
    /// On first start the data directory is created and seeded from
    /// `config.example.json` when present, otherwise from
    /// [`Config::starter`] in `timezone`.
    pub fn ensure(&self, timezone: &str) -> Result<Config, StoreError> {
        fs::create_dir_all(&self.data_dir).map_err(|e| StoreError::io(&self.data_dir, e))?;

        let path = self.config_path();
        if !path.exists() {
            let example = self.data_dir.join(EXAMPLE_FILE);
            let seed = if example.exists() {
                info!("Seeding {} from {}", path.display(), example.display());
                fs::read_to_string(&example).map_err(|e| StoreError::io(&example, e))?
            } else {
                info!("Seeding {} with a starter configuration", path.display());
                serde_json::to_string_pretty(&Config::starter(timezone))
                    .map_err(|e| StoreError::json(&path, e))?
            };
            self.replace(seed.as_bytes())?;
        }

        self.read()
    }

    /// Loads and validates the stored configuration.
    pub fn read(&self) -> Result<Config, StoreError> {
        let path = self.config_path();
        let raw = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| StoreError::json(&path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates `config` and atomically replaces the stored document.
    pub fn write(&self, config: &Config) -> Result<(), StoreError> {
        config.validate()?;
        let json =
            serde_json::to_string_pretty(config).map_err(|e| StoreError::json(&self.config_path(), e))?;
        self.replace(json.as_bytes())
    }

    fn replace(&self, contents: &[u8]) -> Result<(), StoreError> {
        let path = self.config_path();
        let mut file =
            NamedTempFile::new_in(&self.data_dir).map_err(|e| StoreError::io(&self.data_dir, e))?;
        file.write_all(contents)
            .and_then(|()| file.as_file().sync_all())
            .map_err(|e| StoreError::io(file.path(), e))?;
        file.persist(&path)
            .map_err(|e| StoreError::io(&path, e.error))?;
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClockTime, Course, Meeting, Weekday};

    fn sample_course() -> Course {
        Course {
            course_id: "cs101".to_string(),
            code: "CS101".to_string(),
            title: "Intro".to_string(),
            section: String::new(),
            color: "#2563EB".to_string(),
            instructors: vec!["Grace Hopper".to_string()],
            location_default: None,
            meetings: vec![Meeting {
                weekday: Weekday::Mon,
                start: ClockTime::from_hm(9, 0).unwrap(),
                end: ClockTime::from_hm(9, 50).unwrap(),
                location_override: None,
            }],
            online: Default::default(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_ensure_seeds_starter_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("data"));

        let config = store.ensure("America/Chicago").unwrap();

        assert!(store.config_path().exists());
        assert_eq!(config.timezone(), Some("America/Chicago"));
        // second call reads what is already there
        assert_eq!(store.ensure("Europe/Paris").unwrap(), config);
    }

    #[test]
    fn test_ensure_prefers_example_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut example = Config::starter("Asia/Tokyo");
        example.profile.student_name = "Example".to_string();
        fs::write(
            dir.path().join(EXAMPLE_FILE),
            serde_json::to_string(&example).unwrap(),
        )
        .unwrap();

        let config = ConfigStore::new(dir.path()).ensure("America/New_York").unwrap();
        assert_eq!(config.profile.student_name, "Example");
        assert_eq!(config.timezone(), Some("Asia/Tokyo"));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let mut config = store.ensure("America/New_York").unwrap();
        config.courses.push(sample_course());

        store.write(&config).unwrap();

        assert_eq!(store.read().unwrap(), config);
        // no temp files left behind
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_write_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let original = store.ensure("America/New_York").unwrap();

        let mut broken = original.clone();
        let mut course = sample_course();
        course.meetings[0].end = ClockTime::from_hm(8, 0).unwrap();
        broken.courses.push(course);

        assert!(matches!(store.write(&broken), Err(StoreError::Invalid(_))));
        assert_eq!(store.read().unwrap(), original);
    }

    #[test]
    fn test_read_reports_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        fs::write(store.config_path(), "{ not json").unwrap();

        assert!(matches!(store.read(), Err(StoreError::Json { .. })));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        assert!(matches!(store.read(), Err(StoreError::Io { .. })));
    }
}
