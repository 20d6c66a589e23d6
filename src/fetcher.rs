//! Fetch an artist's top tracks and pair each one with its audio features.

use crate::error::{Error, Result};
use crate::spotify::{AudioFeatures, Catalog, CatalogTrack};

/// A catalog track together with its audio features.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedTrack {
    pub track: CatalogTrack,
    pub features: AudioFeatures,
}

/// One top-tracks call followed by one feature call per track.
///
/// All or nothing: the first failing call, or a track without features,
/// aborts the fetch and no partial list is returned.
pub fn fetch_tracks<C: Catalog + ?Sized>(catalog: &C, artist_id: &str) -> Result<Vec<FetchedTrack>> {
    let tracks = catalog.artist_top_tracks(artist_id)?;
    tracing::info!("Artist {}: {} top tracks", artist_id, tracks.len());

    let mut fetched = Vec::with_capacity(tracks.len());
    for track in tracks {
        let features = catalog
            .audio_features(&track.id)?
            .ok_or_else(|| Error::MissingAudioFeatures {
                track_id: track.id.clone(),
                name: track.name.clone(),
            })?;
        tracing::debug!(
            "  {} valence={:.3} energy={:.3}",
            track.name,
            features.valence,
            features.energy
        );
        fetched.push(FetchedTrack { track, features });
    }

    Ok(fetched)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory catalog that records the calls made against it.
    #[derive(Default)]
    pub(crate) struct FakeCatalog {
        pub tracks: Vec<CatalogTrack>,
        pub features: HashMap<String, AudioFeatures>,
        pub fail_top_tracks: bool,
        pub calls: RefCell<Vec<String>>,
    }

    impl FakeCatalog {
        pub fn with(entries: &[(&str, u8, u64, f64, f64)]) -> Self {
            let mut catalog = FakeCatalog::default();
            for (i, (name, popularity, duration_ms, valence, energy)) in entries.iter().enumerate() {
                let id = format!("track{}", i);
                catalog.tracks.push(CatalogTrack {
                    id: id.clone(),
                    name: name.to_string(),
                    popularity: *popularity,
                    duration_ms: *duration_ms,
                });
                catalog.features.insert(
                    id.clone(),
                    AudioFeatures {
                        id,
                        valence: *valence,
                        energy: *energy,
                    },
                );
            }
            catalog
        }
    }

    impl Catalog for FakeCatalog {
        fn artist_top_tracks(&self, artist_id: &str) -> Result<Vec<CatalogTrack>> {
            self.calls.borrow_mut().push(format!("top:{}", artist_id));
            if self.fail_top_tracks {
                return Err(Error::Http {
                    url: "fake".into(),
                    status: 503,
                    body: String::new(),
                });
            }
            Ok(self.tracks.clone())
        }

        fn audio_features(&self, track_id: &str) -> Result<Option<AudioFeatures>> {
            self.calls.borrow_mut().push(format!("features:{}", track_id));
            Ok(self.features.get(track_id).cloned())
        }
    }

    #[test]
    fn test_fetch_keeps_catalog_order() {
        let catalog = FakeCatalog::with(&[
            ("A", 50, 200_000, 0.5, 0.6),
            ("B", 10, 180_000, 0.2, 0.3),
            ("C", 90, 220_000, 0.8, 0.9),
        ]);

        let fetched = fetch_tracks(&catalog, "artist").unwrap();
        let names: Vec<&str> = fetched.iter().map(|f| f.track.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(fetched[1].features.valence, 0.2);

        // one list call, then one feature call per track
        assert_eq!(
            *catalog.calls.borrow(),
            vec!["top:artist", "features:track0", "features:track1", "features:track2"]
        );
    }

    #[test]
    fn test_fetch_empty_artist() {
        let catalog = FakeCatalog::default();
        let fetched = fetch_tracks(&catalog, "artist").unwrap();
        assert!(fetched.is_empty());
        assert_eq!(catalog.calls.borrow().len(), 1);
    }

    #[test]
    fn test_missing_features_aborts() {
        let mut catalog = FakeCatalog::with(&[
            ("A", 50, 200_000, 0.5, 0.6),
            ("B", 10, 180_000, 0.2, 0.3),
            ("C", 90, 220_000, 0.8, 0.9),
        ]);
        catalog.features.remove("track1");

        match fetch_tracks(&catalog, "artist") {
            Err(Error::MissingAudioFeatures { track_id, name }) => {
                assert_eq!(track_id, "track1");
                assert_eq!(name, "B");
            }
            other => panic!("expected missing features error, got {:?}", other),
        }
        // nothing fetched after the failing track
        assert!(!catalog.calls.borrow().contains(&"features:track2".to_string()));
    }

    #[test]
    fn test_service_failure_propagates() {
        let catalog = FakeCatalog {
            fail_top_tracks: true,
            ..FakeCatalog::with(&[("A", 50, 200_000, 0.5, 0.6)])
        };
        assert!(matches!(
            fetch_tracks(&catalog, "artist"),
            Err(Error::Http { status: 503, .. })
        ));
    }
}
