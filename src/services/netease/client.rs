use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use reqwest::Client;
use url::Url;

use crate::error::ApiError;
use crate::netease_rs::playlist::{
    NeteasePlaylist, NeteasePlaylistDetail, NeteaseTrack, get_playlist_detail,
    get_playlist_tracks, get_user_playlists, search_playlists,
};
use crate::ports::netease::{
    NeteaseApiPlaylist, NeteaseApiPlaylistDetail, NeteaseApiTrack, NeteaseClient,
};

fn none_if_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl From<NeteasePlaylist> for NeteaseApiPlaylist {
    fn from(p: NeteasePlaylist) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name,
            description: none_if_empty(p.description),
            cover_url: none_if_empty(p.cover_img_url),
            track_count: p.track_count,
        }
    }
}

impl From<NeteaseTrack> for NeteaseApiTrack {
    fn from(t: NeteaseTrack) -> Self {
        let (album, cover_url) = match t.al {
            Some(al) => (none_if_empty(Some(al.name)), none_if_empty(al.pic_url)),
            None => (None, None),
        };

        Self {
            id: t.id.to_string(),
            name: t.name,
            artists: t
                .ar
                .into_iter()
                .map(|a| a.name)
                .filter(|name| !name.is_empty())
                .collect(),
            album,
            cover_url,
            duration_ms: t.dt,
        }
    }
}

impl From<NeteasePlaylistDetail> for NeteaseApiPlaylistDetail {
    fn from(d: NeteasePlaylistDetail) -> Self {
        Self {
            playlist: d.playlist.into(),
            tracks: d.tracks.into_iter().map(Into::into).collect(),
        }
    }
}

/// Production adapter for the NetEase web API.
///
/// Holds one reqwest client with fixed connect/read timeouts; every call is a
/// single GET carrying the caller's session cookie. Failures (transport,
/// non-success status, unparseable body) surface as [`ApiError::Upstream`].
#[derive(Debug, Clone)]
pub struct NeteaseHttpAdapter {
    client: Client,
    base_url: Url,
}

impl NeteaseHttpAdapter {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .wrap_err("Failed to build netease http client")?;

        Ok(Self { client, base_url })
    }
}

#[async_trait::async_trait]
impl NeteaseClient for NeteaseHttpAdapter {
    async fn user_playlists(
        &self,
        user_id: &str,
        cookie: &str,
    ) -> Result<Vec<NeteaseApiPlaylist>> {
        let playlists = get_user_playlists(&self.client, &self.base_url, user_id, cookie)
            .await
            .map_err(|e| ApiError::Upstream(format!("{e:#}")))?;

        Ok(playlists.into_iter().map(Into::into).collect())
    }

    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        cookie: &str,
    ) -> Result<Vec<NeteaseApiTrack>> {
        let tracks = get_playlist_tracks(&self.client, &self.base_url, playlist_id, cookie)
            .await
            .map_err(|e| ApiError::Upstream(format!("{e:#}")))?;

        Ok(tracks.into_iter().map(Into::into).collect())
    }

    async fn playlist_detail(
        &self,
        playlist_id: &str,
        cookie: &str,
    ) -> Result<NeteaseApiPlaylistDetail> {
        let detail = get_playlist_detail(&self.client, &self.base_url, playlist_id, cookie)
            .await
            .map_err(|e| ApiError::Upstream(format!("{e:#}")))?;

        Ok(detail.into())
    }

    async fn search_playlists(
        &self,
        keyword: &str,
        limit: u32,
        offset: u32,
        cookie: &str,
    ) -> Result<Vec<NeteaseApiPlaylist>> {
        let playlists = search_playlists(
            &self.client,
            &self.base_url,
            keyword,
            limit,
            offset,
            cookie,
        )
        .await
        .map_err(|e| ApiError::Upstream(format!("{e:#}")))?;

        Ok(playlists.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netease_rs::playlist::{NeteaseAlbum, NeteaseArtist};

    #[test]
    fn wire_playlist_converts_to_api_playlist() {
        let wire = NeteasePlaylist {
            id: 24381616,
            name: "Late Night Drive".into(),
            description: Some("".into()),
            cover_img_url: Some("https://p1.music.126.net/cover.jpg".into()),
            track_count: 42,
        };

        let api: NeteaseApiPlaylist = wire.into();
        assert_eq!(api.id, "24381616");
        assert_eq!(api.description, None);
        assert_eq!(
            api.cover_url.as_deref(),
            Some("https://p1.music.126.net/cover.jpg")
        );
    }

    #[test]
    fn wire_track_joins_artist_metadata() {
        let wire = NeteaseTrack {
            id: 347230,
            name: "海阔天空".into(),
            ar: vec![
                NeteaseArtist { name: "Beyond".into() },
                NeteaseArtist { name: "".into() },
            ],
            al: Some(NeteaseAlbum {
                name: "乐与怒".into(),
                pic_url: None,
            }),
            dt: Some(326000),
        };

        let api: NeteaseApiTrack = wire.into();
        assert_eq!(api.id, "347230");
        assert_eq!(api.artists, vec!["Beyond".to_string()]);
        assert_eq!(api.album.as_deref(), Some("乐与怒"));
        assert_eq!(api.cover_url, None);
        assert_eq!(api.duration_ms, Some(326000));
    }
}
