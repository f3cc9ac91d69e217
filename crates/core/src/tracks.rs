//! Audio track removal planning for MKV containers.
//! Probes track layout with mkvmerge, picks audio tracks by language and
//! either remuxes to a new file or deletes the tracks in place.

use crate::error::{Error, Result};
use crate::tool::{run_checked, ToolRunner};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, trace, warn};
use walkdir::WalkDir;

/// One multiplexed stream as described by the mkvmerge probe.
#[derive(Debug, Deserialize)]
pub struct Track {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub properties: TrackProperties,
}

/// Track properties we care about; mkvmerge may omit any of them.
#[derive(Debug, Default, Deserialize)]
pub struct TrackProperties {
    pub language: Option<String>,
}

impl Track {
    /// Language code of the track, `und` when untagged.
    pub fn language(&self) -> &str {
        self.properties.language.as_deref().unwrap_or("und")
    }
}

/// How matched tracks are removed from a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Remux into a new file next to the source (the default, safe path).
    Remux,
    /// Delete the tracks from the source file itself with mkvpropedit.
    InPlace,
}

/// What happened to one file.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// No audio track matched the target languages; nothing was written.
    Skipped,
    /// Dry run: the command was logged but not executed.
    Planned(Vec<u64>),
    /// Tracks were removed; `output` is `None` for in-place edits.
    Removed {
        ids: Vec<u64>,
        output: Option<PathBuf>,
    },
}

/// Parse the `tracks` array out of `mkvmerge -J` output.
/// Malformed probe output is treated as "no tracks found", not a failure.
pub fn parse_track_list(json: &str) -> Vec<Track> {
    #[derive(Deserialize)]
    struct Probe {
        #[serde(default)]
        tracks: Vec<Track>,
    }
    match serde_json::from_str::<Probe>(json) {
        Ok(probe) => probe.tracks,
        Err(err) => {
            warn!("unreadable track probe output: {err}");
            Vec::new()
        }
    }
}

/// Probe the track layout of a container file with mkvmerge.
pub fn probe_tracks(runner: &dyn ToolRunner, file: &Path) -> Result<Vec<Track>> {
    trace!("probe_tracks file={}", file.display());
    let args = vec!["-J".to_string(), file.display().to_string()];
    let output = run_checked(runner, "mkvmerge", &args)?;
    Ok(parse_track_list(&output.stdout))
}

/// Ids of audio tracks whose language is in the target set.
pub fn matching_audio_tracks(tracks: &[Track], languages: &HashSet<String>) -> Vec<u64> {
    tracks
        .iter()
        .filter(|track| track.kind == "audio" && languages.contains(track.language()))
        .map(|track| track.id)
        .collect()
}

/// mkvmerge remux arguments keeping every audio track except `ids`.
/// The exclusion list is the matched ids negated with `!`.
pub fn remux_args(input: &Path, output: &Path, ids: &[u64]) -> Vec<String> {
    let exclude = ids
        .iter()
        .map(|id| format!("!{id}"))
        .collect::<Vec<_>>()
        .join(",");
    vec![
        "-o".to_string(),
        output.display().to_string(),
        "--audio-tracks".to_string(),
        exclude,
        input.display().to_string(),
    ]
}

/// mkvpropedit arguments deleting `ids` from the file itself.
pub fn propedit_args(input: &Path, ids: &[u64]) -> Vec<String> {
    let mut args = vec![input.display().to_string()];
    args.extend(ids.iter().map(|id| format!("--delete-track={id}")));
    args
}

/// Default remux destination: the source name with a marker suffix.
pub fn derived_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    input.with_file_name(format!("{stem}.stripped.mkv"))
}

/// Remove matching audio tracks from one file.
/// A file with no matching tracks is skipped with a warning and produces
/// no output at all.
pub fn process_file(
    runner: &dyn ToolRunner,
    file: &Path,
    languages: &HashSet<String>,
    mode: Mode,
    dry_run: bool,
) -> Result<Outcome> {
    let tracks = probe_tracks(runner, file)?;
    let ids = matching_audio_tracks(&tracks, languages);
    if ids.is_empty() {
        warn!("no matching audio tracks in {}", file.display());
        return Ok(Outcome::Skipped);
    }
    let (tool, args, output) = match mode {
        Mode::InPlace => ("mkvpropedit", propedit_args(file, &ids), None),
        Mode::Remux => {
            let output = derived_output(file);
            ("mkvmerge", remux_args(file, &output, &ids), Some(output))
        }
    };
    if dry_run {
        info!("would run: {} {}", tool, args.join(" "));
        return Ok(Outcome::Planned(ids));
    }
    run_checked(runner, tool, &args)?;
    match &output {
        Some(path) => info!(
            "removed tracks {:?} from {} into {}",
            ids,
            file.display(),
            path.display()
        ),
        None => info!("removed tracks {:?} from {} in place", ids, file.display()),
    }
    Ok(Outcome::Removed { ids, output })
}

/// Walk `directory` recursively and process every MKV file found.
/// Files are independent: a failure on one is reported and the walk goes
/// on. Finding no MKV files at all aborts the run.
pub fn process_directory(
    runner: &dyn ToolRunner,
    directory: &Path,
    languages: &HashSet<String>,
    mode: Mode,
    dry_run: bool,
) -> Result<usize> {
    let mut found = 0;
    for entry in WalkDir::new(directory) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_mkv = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("mkv"))
            .unwrap_or(false);
        if !is_mkv {
            continue;
        }
        found += 1;
        if let Err(err) = process_file(runner, path, languages, mode, dry_run) {
            warn!("skipping {}: {err}", path.display());
        }
    }
    if found == 0 {
        return Err(Error::NoInputFiles(directory.to_path_buf()));
    }
    Ok(found)
}
