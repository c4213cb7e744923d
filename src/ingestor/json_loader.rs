use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

use crate::models::{ChannelRecord, IngestDefaults, IntermediateChannel};

/// Which input files a run consumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSelection {
    /// Every matching file in the input directory, concatenated
    All,
    /// The most recently created matching file
    Newest,
    /// One explicit file
    File(PathBuf),
}

/// Loads channel records from the intermediate JSON files.
///
/// Loading never fails: unreadable files and malformed JSON are logged and
/// contribute no channels.
pub struct JsonLoader<'a> {
    input_dir: PathBuf,
    extension: String,
    defaults: IngestDefaults<'a>,
}

impl<'a> JsonLoader<'a> {
    pub fn new(input_dir: impl Into<PathBuf>, extension: &str, defaults: IngestDefaults<'a>) -> Self {
        Self {
            input_dir: input_dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
            defaults,
        }
    }

    /// Resolve the selection into concrete file paths
    pub fn select_files(&self, selection: &InputSelection) -> Vec<PathBuf> {
        match selection {
            InputSelection::All => discover_input_files(&self.input_dir, &self.extension),
            InputSelection::Newest => {
                let files = discover_input_files(&self.input_dir, &self.extension);
                newest_file(&files).into_iter().collect()
            }
            InputSelection::File(file) => vec![self.input_dir.join(file)],
        }
    }

    /// Load and convert every selected record, preserving file then record order
    pub fn load(&self, selection: &InputSelection) -> Vec<ChannelRecord> {
        let files = self.select_files(selection);
        if files.is_empty() {
            warn!(
                "No .{} input files found in {}",
                self.extension,
                self.input_dir.display()
            );
            return Vec::new();
        }

        let channels: Vec<ChannelRecord> = files
            .iter()
            .flat_map(|path| read_channel_file(path))
            .filter_map(|channel| channel.into_record(&self.defaults))
            .collect();

        info!(
            "Loaded {} channels ({} programmes) from {} file(s)",
            channels.len(),
            channels.iter().map(ChannelRecord::programme_count).sum::<usize>(),
            files.len()
        );
        channels
    }
}

/// Read one intermediate file; any failure yields an empty contribution
fn read_channel_file(path: &Path) -> Vec<IntermediateChannel> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Failed to read input file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<IntermediateChannel>>(&contents) {
        Ok(channels) => {
            debug!("Read {} channel records from {}", channels.len(), path.display());
            channels
        }
        Err(e) => {
            warn!("JSON read error while processing {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// List files in `dir` with the given extension, sorted by file name
pub fn discover_input_files(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read input directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect();
    files.sort();
    files
}

/// The file with the latest creation time (modification time where the
/// platform does not record creation)
pub fn newest_file(files: &[PathBuf]) -> Option<PathBuf> {
    files
        .iter()
        .max_by_key(|path| {
            fs::metadata(path)
                .and_then(|meta| meta.created().or_else(|_| meta.modified()))
                .unwrap_or(SystemTime::UNIX_EPOCH)
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    fn defaults() -> IngestDefaults<'static> {
        IngestDefaults {
            timezone: chrono_tz::Europe::Athens,
            description: "n/a",
        }
    }

    fn channel_json(id: &str, name: &str) -> String {
        format!(
            r#"[{{"id": ["{id}"], "name": ["{name}"], "region": ["Nationwide"], "programmes": [
                {{"title": "[K] Morning", "desc": "d", "airDateTime": "20240115080000 +0200"}}
            ]}}]"#
        )
    }

    #[test]
    fn test_multi_file_concatenates_in_name_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b_digea.json"), channel_json("channel-2", "B")).unwrap();
        fs::write(dir.path().join("a_ert.json"), channel_json("channel-010", "A")).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let loader = JsonLoader::new(dir.path(), "json", defaults());
        let channels = loader.load(&InputSelection::All);

        let ids: Vec<&str> = channels.iter().map(|c| c.external_id.as_str()).collect();
        assert_eq!(ids, vec!["channel-010", "channel-2"]);
        assert_eq!(channels[0].programmes.len(), 1);
    }

    #[test]
    #[traced_test]
    fn test_malformed_file_contributes_nothing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), "{ not json").unwrap();
        fs::write(dir.path().join("b.json"), channel_json("channel-5", "E")).unwrap();

        let loader = JsonLoader::new(dir.path(), ".json", defaults());
        let channels = loader.load(&InputSelection::All);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].external_id, "channel-5");
        assert!(logs_contain("JSON read error while processing"));
    }

    #[test]
    fn test_missing_inputs_yield_empty() {
        let dir = TempDir::new().unwrap();
        let loader = JsonLoader::new(dir.path().join("absent"), "json", defaults());
        assert!(loader.load(&InputSelection::All).is_empty());
        assert!(loader.load(&InputSelection::Newest).is_empty());

        let loader = JsonLoader::new(dir.path(), "json", defaults());
        assert!(loader.load(&InputSelection::File(PathBuf::from("nope.json"))).is_empty());
    }

    #[test]
    fn test_explicit_file_selection() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("one.json"), channel_json("channel-1", "One")).unwrap();
        fs::write(dir.path().join("two.json"), channel_json("channel-2", "Two")).unwrap();

        let loader = JsonLoader::new(dir.path(), "json", defaults());
        let channels = loader.load(&InputSelection::File(PathBuf::from("two.json")));
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "Two");
    }

    #[test]
    fn test_newest_file_picks_single_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("one.json"), channel_json("channel-1", "One")).unwrap();

        let loader = JsonLoader::new(dir.path(), "json", defaults());
        let selected = loader.select_files(&InputSelection::Newest);
        assert_eq!(selected, vec![dir.path().join("one.json")]);
        assert_eq!(newest_file(&[]), None);
    }
}
