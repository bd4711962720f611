//! Track descriptors handed to the playback core.
//!
//! Descriptors come from the search client or the playlist store. The core
//! does not interpret the metadata beyond the preview URI (what to stream)
//! and the display text (what to show on the foreground notification).

use serde::{Deserialize, Serialize};

/// A playable item as supplied by the track source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Opaque identifier assigned by the track source.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Display artist, when known.
    pub artist: Option<String>,
    /// Streamable preview location. Not every catalog entry has one.
    pub preview_url: Option<String>,
}

impl Track {
    /// Create a track descriptor with a preview URI.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        preview_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: None,
            preview_url: Some(preview_url.into()),
        }
    }

    /// Create a track descriptor without a streamable preview.
    pub fn without_preview(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: None,
            preview_url: None,
        }
    }

    /// Attach an artist name.
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    /// Text shown on the foreground notification while this track plays.
    pub fn display_text(&self) -> String {
        match &self.artist {
            Some(artist) => format!("{} - {}", artist, self.title),
            None => self.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_text_includes_artist_when_present() {
        let track = Track::new("t1", "Song", "https://example.com/a.mp3");
        assert_eq!(track.display_text(), "Song");

        let track = track.with_artist("Band");
        assert_eq!(track.display_text(), "Band - Song");
    }

    #[test]
    fn without_preview_has_no_url() {
        let track = Track::without_preview("t2", "Unstreamable");
        assert!(track.preview_url.is_none());
    }
}
