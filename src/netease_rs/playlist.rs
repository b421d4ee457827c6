use color_eyre::eyre::{Result, WrapErr, eyre};
use reqwest::Client;
use reqwest::header;
use serde::Deserialize;
use url::Url;

/// The remote service rejects API calls without a browser-looking referer.
pub const MUSIC_163_REFERER: &str = "https://music.163.com/";

/* ---------- Wire types ---------- */

#[derive(Debug, Clone, Deserialize)]
pub struct NeteaseArtist {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NeteaseAlbum {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "picUrl", default)]
    pub pic_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NeteaseTrack {
    pub id: i64,

    pub name: String,

    #[serde(default)]
    pub ar: Vec<NeteaseArtist>,

    #[serde(default)]
    pub al: Option<NeteaseAlbum>,

    /// Track duration in milliseconds.
    #[serde(default)]
    pub dt: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NeteasePlaylist {
    pub id: i64,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "coverImgUrl", default)]
    pub cover_img_url: Option<String>,

    #[serde(rename = "trackCount", default)]
    pub track_count: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NeteasePlaylistDetail {
    #[serde(flatten)]
    pub playlist: NeteasePlaylist,

    #[serde(default)]
    pub tracks: Vec<NeteaseTrack>,
}

/* ---------- Response envelopes ---------- */

#[derive(Debug, Clone, Deserialize)]
pub struct UserPlaylistsResponse {
    pub code: i64,

    #[serde(default)]
    pub playlist: Vec<NeteasePlaylist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTracksResponse {
    pub code: i64,

    #[serde(default)]
    pub songs: Vec<NeteaseTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistDetailResponse {
    pub code: i64,

    #[serde(default)]
    pub playlist: Option<NeteasePlaylistDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub code: i64,

    #[serde(default)]
    pub result: Option<SearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub playlists: Vec<NeteasePlaylist>,

    #[serde(rename = "playlistCount", default)]
    pub playlist_count: i64,
}

// The API reports errors as HTTP 200 with a non-200 body code.
fn ensure_ok(code: i64) -> Result<()> {
    if code == 200 {
        Ok(())
    } else {
        Err(eyre!("Netease API returned code {code}"))
    }
}

/* ---------- User playlists ---------- */

pub async fn get_user_playlists(
    client: &Client,
    base_url: &Url,
    user_id: &str,
    cookie: &str,
) -> Result<Vec<NeteasePlaylist>> {
    let mut url = base_url.join("user/playlist")?;
    url.query_pairs_mut().append_pair("uid", user_id);

    let res = client
        .get(url)
        .header(header::COOKIE, cookie)
        .header(header::REFERER, MUSIC_163_REFERER)
        .send()
        .await?
        .error_for_status()?
        .json::<UserPlaylistsResponse>()
        .await
        .wrap_err("Failed to deserialize user playlists response")?;

    ensure_ok(res.code)?;

    Ok(res.playlist)
}

/* ---------- Playlist tracks ---------- */

pub async fn get_playlist_tracks(
    client: &Client,
    base_url: &Url,
    playlist_id: &str,
    cookie: &str,
) -> Result<Vec<NeteaseTrack>> {
    let mut url = base_url.join("playlist/track/all")?;
    url.query_pairs_mut()
        .append_pair("id", playlist_id)
        .append_pair("limit", "1000")
        .append_pair("offset", "0");

    let res = client
        .get(url)
        .header(header::COOKIE, cookie)
        .header(header::REFERER, MUSIC_163_REFERER)
        .send()
        .await?
        .error_for_status()?
        .json::<PlaylistTracksResponse>()
        .await
        .wrap_err("Failed to deserialize playlist tracks response")?;

    ensure_ok(res.code)?;

    Ok(res.songs)
}

/* ---------- Playlist detail ---------- */

pub async fn get_playlist_detail(
    client: &Client,
    base_url: &Url,
    playlist_id: &str,
    cookie: &str,
) -> Result<NeteasePlaylistDetail> {
    let mut url = base_url.join("playlist/detail")?;
    url.query_pairs_mut().append_pair("id", playlist_id);

    let res = client
        .get(url)
        .header(header::COOKIE, cookie)
        .header(header::REFERER, MUSIC_163_REFERER)
        .send()
        .await?
        .error_for_status()?
        .json::<PlaylistDetailResponse>()
        .await
        .wrap_err("Failed to deserialize playlist detail response")?;

    ensure_ok(res.code)?;

    res.playlist
        .ok_or_else(|| eyre!("Playlist detail response had no playlist"))
}

/* ---------- Playlist search ---------- */

pub async fn search_playlists(
    client: &Client,
    base_url: &Url,
    keyword: &str,
    limit: u32,
    offset: u32,
    cookie: &str,
) -> Result<Vec<NeteasePlaylist>> {
    let mut url = base_url.join("search")?;
    url.query_pairs_mut()
        .append_pair("keywords", keyword)
        .append_pair("type", "1000")
        .append_pair("limit", &limit.to_string())
        .append_pair("offset", &offset.to_string());

    let res = client
        .get(url)
        .header(header::COOKIE, cookie)
        .header(header::REFERER, MUSIC_163_REFERER)
        .send()
        .await?
        .error_for_status()?
        .json::<SearchResponse>()
        .await
        .wrap_err("Failed to deserialize playlist search response")?;

    ensure_ok(res.code)?;

    Ok(res.result.map(|r| r.playlists).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_playlists_response() {
        let body = r#"{
            "code": 200,
            "more": false,
            "playlist": [
                {
                    "id": 24381616,
                    "name": "Late Night Drive",
                    "description": "windows down",
                    "coverImgUrl": "https://p1.music.126.net/cover.jpg",
                    "trackCount": 42,
                    "subscribed": false
                },
                {
                    "id": 24381617,
                    "name": "Untitled",
                    "description": null,
                    "trackCount": 0
                }
            ]
        }"#;

        let res: UserPlaylistsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(res.code, 200);
        assert_eq!(res.playlist.len(), 2);
        assert_eq!(res.playlist[0].id, 24381616);
        assert_eq!(res.playlist[0].track_count, 42);
        assert_eq!(
            res.playlist[0].cover_img_url.as_deref(),
            Some("https://p1.music.126.net/cover.jpg")
        );
        assert_eq!(res.playlist[1].description, None);
        assert_eq!(res.playlist[1].cover_img_url, None);
    }

    #[test]
    fn parses_playlist_tracks_response() {
        let body = r#"{
            "code": 200,
            "songs": [
                {
                    "id": 347230,
                    "name": "海阔天空",
                    "ar": [{"id": 11127, "name": "Beyond"}],
                    "al": {"id": 34209, "name": "乐与怒", "picUrl": "https://p1.music.126.net/al.jpg"},
                    "dt": 326000
                },
                {
                    "id": 347231,
                    "name": "No Album Track",
                    "ar": []
                }
            ]
        }"#;

        let res: PlaylistTracksResponse = serde_json::from_str(body).unwrap();
        assert_eq!(res.songs.len(), 2);
        assert_eq!(res.songs[0].ar[0].name, "Beyond");
        assert_eq!(res.songs[0].al.as_ref().unwrap().name, "乐与怒");
        assert_eq!(res.songs[0].dt, Some(326000));
        assert!(res.songs[1].al.is_none());
        assert!(res.songs[1].dt.is_none());
    }

    #[test]
    fn parses_playlist_detail_response() {
        let body = r#"{
            "code": 200,
            "playlist": {
                "id": 24381616,
                "name": "Late Night Drive",
                "trackCount": 1,
                "tracks": [
                    {"id": 1, "name": "Song", "ar": [{"name": "A"}], "dt": 1000}
                ]
            }
        }"#;

        let res: PlaylistDetailResponse = serde_json::from_str(body).unwrap();
        let detail = res.playlist.unwrap();
        assert_eq!(detail.playlist.name, "Late Night Drive");
        assert_eq!(detail.tracks.len(), 1);
    }

    #[test]
    fn parses_search_response() {
        let body = r#"{
            "code": 200,
            "result": {
                "playlists": [
                    {"id": 7, "name": "Found It", "trackCount": 3}
                ],
                "playlistCount": 1
            }
        }"#;

        let res: SearchResponse = serde_json::from_str(body).unwrap();
        let result = res.result.unwrap();
        assert_eq!(result.playlist_count, 1);
        assert_eq!(result.playlists[0].name, "Found It");
    }

    #[test]
    fn non_success_body_code_is_an_error() {
        assert!(ensure_ok(200).is_ok());
        assert!(ensure_ok(301).is_err());
        assert!(ensure_ok(502).is_err());
    }
}
