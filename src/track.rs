//! Flat per-track records built from fetch results.

use crate::fetcher::FetchedTrack;

/// One row of the track table.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    pub name: String,
    /// 0..=100, assigned by the catalog
    pub popularity: u8,
    pub duration_ms: u64,
    pub duration_seconds: f64,
    pub valence: f64,
    pub energy: f64,
}

impl TrackRecord {
    pub fn new(name: impl Into<String>, popularity: u8, duration_ms: u64, valence: f64, energy: f64) -> Self {
        TrackRecord {
            name: name.into(),
            popularity,
            duration_ms,
            duration_seconds: duration_ms as f64 / 1000.0,
            valence,
            energy,
        }
    }
}

impl From<FetchedTrack> for TrackRecord {
    fn from(fetched: FetchedTrack) -> Self {
        let FetchedTrack { track, features } = fetched;
        TrackRecord::new(
            track.name,
            track.popularity,
            track.duration_ms,
            features.valence,
            features.energy,
        )
    }
}

/// Project fetch results into records, keeping their order.
pub fn aggregate(fetched: Vec<FetchedTrack>) -> Vec<TrackRecord> {
    fetched.into_iter().map(TrackRecord::from).collect()
}
