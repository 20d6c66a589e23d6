pub mod config;
pub mod error;
pub mod fetcher;
pub mod plot;
pub mod report;
pub mod spotify;
pub mod track;

pub use config::{Config, Credentials};
pub use error::{Error, Result};
pub use fetcher::{fetch_tracks, FetchedTrack};
pub use report::{popularity_extremes, print_head, print_ranking, top_by_popularity, Extremes};
pub use spotify::{parse_artist_id, AudioFeatures, Catalog, CatalogTrack, SpotifyClient};
pub use track::{aggregate, TrackRecord};
