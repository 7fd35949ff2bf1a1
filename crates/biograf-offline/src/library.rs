//! Read-only view of the video library (`videos.json`).

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub shows: Vec<Show>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Show {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub slug: String,
    #[serde(default)]
    pub title: String,
    pub asset_path: String,
    #[serde(default)]
    pub popular: bool,
}

impl Library {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn episodes(&self) -> impl Iterator<Item = &Episode> {
        self.shows.iter().flat_map(|show| show.episodes.iter())
    }

    pub fn popular(&self) -> impl Iterator<Item = &Episode> {
        self.episodes().filter(|episode| episode.popular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIDEOS: &str = r#"{
        "featured": "show-a/ep-1",
        "shows": [
            {
                "slug": "show-a",
                "title": "Show A",
                "episodes": [
                    {"slug": "ep-1", "title": "One", "assetPath": "show-a/ep-1", "popular": true},
                    {"slug": "ep-2", "title": "Two", "assetPath": "show-a/ep-2"}
                ]
            },
            {
                "slug": "show-b",
                "episodes": [
                    {"slug": "ep-1", "assetPath": "show-b/ep-1", "popular": true}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_popular_episodes() {
        let library = Library::from_json(VIDEOS).unwrap();
        assert_eq!(library.episodes().count(), 3);

        let popular: Vec<&str> = library.popular().map(|e| e.asset_path.as_str()).collect();
        assert_eq!(popular, vec!["show-a/ep-1", "show-b/ep-1"]);
    }
}
