use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::entities;

const ILLEGAL_FILENAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Render one playlist as a plain-text document.
///
/// Pure string building; the caller supplies the export timestamp so the
/// output is deterministic.
pub fn render_playlist(
    playlist: &entities::playlist::Model,
    songs: &[entities::song::Model],
    exported_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    out.push_str("===== 歌单信息 =====\n");
    let _ = writeln!(out, "歌单名称: {}", playlist.name);
    if let Some(description) = playlist.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "歌单描述: {description}");
    }
    let _ = writeln!(out, "歌曲数量: {}", songs.len());
    let _ = writeln!(out, "导出时间: {}", exported_at.format("%Y-%m-%d %H:%M:%S"));
    out.push_str("==================\n\n");

    out.push_str("===== 歌曲列表 =====\n");
    for (index, song) in songs.iter().enumerate() {
        push_song(&mut out, index, song);
    }
    out.push_str("==================\n");

    out
}

/// Render all of a user's playlists into one aggregate document.
pub fn render_all_playlists(
    username: &str,
    sections: &[(entities::playlist::Model, Vec<entities::song::Model>)],
    exported_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    out.push_str("===== 网易云音乐歌单导出 =====\n");
    let _ = writeln!(out, "用户: {username}");
    let _ = writeln!(out, "导出时间: {}", exported_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "歌单总数: {}", sections.len());
    out.push_str("=========================\n\n");

    for (playlist, songs) in sections {
        let _ = writeln!(out, "===== 歌单: {} =====", playlist.name);
        if let Some(description) = playlist.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(out, "描述: {description}");
        }
        let _ = writeln!(out, "歌曲数量: {}", songs.len());
        out.push_str("=========================\n\n");

        for (index, song) in songs.iter().enumerate() {
            push_song(&mut out, index, song);
        }
        out.push('\n');
    }

    out
}

fn push_song(out: &mut String, index: usize, song: &entities::song::Model) {
    let _ = writeln!(out, "{}. {} - {}", index + 1, song.name, song.artists);
    if let Some(album) = song.album.as_deref().filter(|a| !a.is_empty()) {
        let _ = writeln!(out, "   专辑: {album}");
    }
    if let Some(duration_ms) = song.duration_ms {
        let _ = writeln!(out, "   时长: {}", format_duration(duration_ms));
    }
    out.push('\n');
}

/// Clock-format a duration. Stored durations are milliseconds (the remote
/// `dt` field); this is the only place they are converted.
fn format_duration(duration_ms: i64) -> String {
    let total_seconds = duration_ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Download filename for a single-playlist export. Characters that are
/// illegal in filenames are replaced with `_`.
pub fn export_file_name(playlist_name: &str, exported_at: DateTime<Utc>) -> String {
    let safe_name: String = playlist_name
        .chars()
        .map(|c| {
            if ILLEGAL_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    format!(
        "{}_歌单导出_{}.txt",
        safe_name,
        exported_at.format("%Y%m%d_%H%M%S")
    )
}

/// Download filename for the all-playlists export.
pub fn all_export_file_name(exported_at: DateTime<Utc>) -> String {
    format!(
        "网易云音乐_歌单导出_{}.txt",
        exported_at.format("%Y%m%d_%H%M%S")
    )
}
