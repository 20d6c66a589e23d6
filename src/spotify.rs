//! Spotify Web API client.
//!
//! Authenticates with the client-credentials grant and exposes the two
//! catalog calls the fetcher needs: an artist's top tracks and the audio
//! features of a single track.
//!
//! # Example
//! ```no_run
//! use toptracks::config::Credentials;
//! use toptracks::spotify::{parse_artist_id, Catalog, SpotifyClient};
//!
//! let creds = Credentials::new("client-id", "client-secret");
//! let client = SpotifyClient::connect(&creds, "US")?;
//! let artist = parse_artist_id("spotify:artist:4Z8W4fKeB5YxbusRsdQVPb")?;
//! let tracks = client.artist_top_tracks(&artist)?;
//! # Ok::<(), toptracks::Error>(())
//! ```

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::Credentials;
use crate::error::{Error, Result};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";

const USER_AGENT: &str = concat!("toptracks/", env!("CARGO_PKG_VERSION"));

// ── Catalog seam ─────────────────────────────────────────────────────────────

/// A track as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogTrack {
    pub id: String,
    pub name: String,
    pub popularity: u8,
    pub duration_ms: u64,
}

/// Audio features of one track. The API returns many more metrics,
/// only the ones we chart are kept.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AudioFeatures {
    pub id: String,
    pub valence: f64,
    pub energy: f64,
}

/// The music-catalog calls the fetcher depends on.
pub trait Catalog {
    /// Top tracks of an artist, in the order the service ranks them.
    fn artist_top_tracks(&self, artist_id: &str) -> Result<Vec<CatalogTrack>>;

    /// Audio features of a track, `None` if the service has none.
    fn audio_features(&self, track_id: &str) -> Result<Option<AudioFeatures>>;
}

// ── API response types ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiToken {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct ApiTopTracks {
    #[serde(default)]
    tracks: Vec<CatalogTrack>,
}

#[derive(Debug, Deserialize)]
struct ApiAudioFeatures {
    #[serde(default)]
    audio_features: Vec<Option<AudioFeatures>>,
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Extract the artist id from a URI, an open.spotify.com URL or a bare id.
///
/// "spotify:artist:4Z8W4fKeB5YxbusRsdQVPb" → "4Z8W4fKeB5YxbusRsdQVPb"
/// "https://open.spotify.com/artist/4Z8W4fKeB5YxbusRsdQVPb?si=x" → "4Z8W4fKeB5YxbusRsdQVPb"
pub fn parse_artist_id(input: &str) -> Result<String> {
    let trimmed = input.trim();

    let candidate = if let Some(rest) = trimmed.strip_prefix("spotify:artist:") {
        rest
    } else if let Some(idx) = trimmed.find("/artist/") {
        let after = &trimmed[idx + 8..];
        after.split(['?', '/', '#']).next().unwrap_or_default()
    } else {
        trimmed
    };

    if !candidate.is_empty() && candidate.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(candidate.to_string())
    } else {
        Err(Error::InvalidArtist(input.to_string()))
    }
}

fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T> {
    Ok(serde_json::from_reader(response.into_reader())?)
}

// ── Client ───────────────────────────────────────────────────────────────────

/// Authenticated Spotify client. Blocking, no retries.
pub struct SpotifyClient {
    agent: ureq::Agent,
    access_token: String,
    api_base: String,
    market: String,
}

impl std::fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("market", &self.market)
            .finish_non_exhaustive()
    }
}

impl SpotifyClient {
    /// Request an access token and build a client for the given market.
    pub fn connect(credentials: &Credentials, market: &str) -> Result<Self> {
        Self::with_endpoints(credentials, market, TOKEN_URL, API_BASE)
    }

    /// Like [`SpotifyClient::connect`], against another token endpoint and
    /// API base URL (no trailing slash).
    pub fn with_endpoints(
        credentials: &Credentials,
        market: &str,
        token_url: &str,
        api_base: &str,
    ) -> Result<Self> {
        let agent = ureq::AgentBuilder::new().user_agent(USER_AGENT).build();

        let basic = base64::engine::general_purpose::STANDARD.encode(format!(
            "{}:{}",
            credentials.client_id, credentials.client_secret
        ));

        tracing::debug!("Requesting access token for client {}", credentials.client_id);

        let response = agent
            .post(token_url)
            .set("Authorization", &format!("Basic {}", basic))
            .send_form(&[("grant_type", "client_credentials")])
            .map_err(|err| match err {
                ureq::Error::Status(status @ (400 | 401), response) => Error::Auth(format!(
                    "token endpoint returned {}: {}",
                    status,
                    response.into_string().unwrap_or_default()
                )),
                other => Error::from(other),
            })?;
        let token: ApiToken = decode(response)?;

        tracing::info!("Authenticated, token valid for {}s", token.expires_in);

        Ok(SpotifyClient {
            agent,
            access_token: token.access_token,
            api_base: api_base.trim_end_matches('/').to_string(),
            market: market.to_string(),
        })
    }

    fn api_get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("GET {}", url);
        let response = self
            .agent
            .get(url)
            .set("Authorization", &format!("Bearer {}", self.access_token))
            .call()?;
        decode(response)
    }
}

impl Catalog for SpotifyClient {
    fn artist_top_tracks(&self, artist_id: &str) -> Result<Vec<CatalogTrack>> {
        let url = format!(
            "{}/artists/{}/top-tracks?market={}",
            self.api_base, artist_id, self.market
        );
        let api: ApiTopTracks = self.api_get(&url)?;
        Ok(api.tracks)
    }

    fn audio_features(&self, track_id: &str) -> Result<Option<AudioFeatures>> {
        let url = format!("{}/audio-features?ids={}", self.api_base, track_id);
        let api: ApiAudioFeatures = self.api_get(&url)?;
        Ok(api.audio_features.into_iter().next().flatten())
    }
}
