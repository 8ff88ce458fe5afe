use std::path::{Path, PathBuf};

/// Locations of the JSON documents under the data directory
///
/// ```text
/// data/
/// ├── currentwaitlist.json  # Pending test requests (global FIFO)
/// ├── queue_state.json      # Tester queues keyed by channel id
/// ├── settings.json         # Channel/role routing
/// ├── tierlist.json         # Gamemode -> tier -> IGNs
/// └── usermetadata.json     # Discord id <-> IGN mapping
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn waitlist(&self) -> PathBuf {
        self.root.join("currentwaitlist.json")
    }

    pub fn queue_state(&self) -> PathBuf {
        self.root.join("queue_state.json")
    }

    pub fn settings(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    pub fn tierlist(&self) -> PathBuf {
        self.root.join("tierlist.json")
    }

    pub fn user_meta(&self) -> PathBuf {
        self.root.join("usermetadata.json")
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::new("data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_locations() {
        let paths = DataPaths::new("/srv/tiers");
        assert_eq!(paths.waitlist(), PathBuf::from("/srv/tiers/currentwaitlist.json"));
        assert_eq!(paths.queue_state(), PathBuf::from("/srv/tiers/queue_state.json"));
        assert_eq!(paths.settings(), PathBuf::from("/srv/tiers/settings.json"));
        assert_eq!(DataPaths::default().root(), Path::new("data"));
    }
}
