use color_eyre::eyre::Result;

/// Decoupled representation of a remote playlist from the NetEase API.
#[derive(Debug, Clone)]
pub struct NeteaseApiPlaylist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub track_count: i32,
}

/// Decoupled representation of a remote track from the NetEase API.
#[derive(Debug, Clone)]
pub struct NeteaseApiTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub cover_url: Option<String>,
    pub duration_ms: Option<i64>,
}

/// A remote playlist plus its full track list, as returned by the playlist
/// detail endpoint.
#[derive(Debug, Clone)]
pub struct NeteaseApiPlaylistDetail {
    pub playlist: NeteaseApiPlaylist,
    pub tracks: Vec<NeteaseApiTrack>,
}

/// Port trait wrapping the NetEase API capabilities used by business logic.
///
/// Implementations live in `services::netease::client` (production) or test
/// mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait NeteaseClient: Send + Sync {
    async fn user_playlists(&self, user_id: &str, cookie: &str)
    -> Result<Vec<NeteaseApiPlaylist>>;
    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        cookie: &str,
    ) -> Result<Vec<NeteaseApiTrack>>;
    async fn playlist_detail(
        &self,
        playlist_id: &str,
        cookie: &str,
    ) -> Result<NeteaseApiPlaylistDetail>;
    async fn search_playlists(
        &self,
        keyword: &str,
        limit: u32,
        offset: u32,
        cookie: &str,
    ) -> Result<Vec<NeteaseApiPlaylist>>;
}
