//! Chapter selection and concat planning.
//! Reads a chapter list from media metadata JSON, picks a user-chosen
//! subset and drives an ffmpeg concat-demuxer run over the segments.

use crate::error::{Error, Result};
use crate::tool::{run_checked, ToolRunner};
use serde::Deserialize;
use std::io::Write as _;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{info, trace, warn};

/// A named time interval on the source file's timeline, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub title: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl Chapter {
    /// Chapter length in seconds.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Start/end values in the metadata may be numbers or numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Seconds {
    Number(f64),
    Text(String),
}

impl Seconds {
    fn as_f64(&self) -> Result<f64> {
        match self {
            Seconds::Number(n) => Ok(*n),
            Seconds::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| Error::Format(s.clone())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawChapter {
    title: String,
    start_time: Seconds,
    end_time: Seconds,
}

#[derive(Debug, Deserialize)]
struct MetadataDocument {
    #[serde(default)]
    chapters: Vec<RawChapter>,
}

/// Load the chapter list from a metadata JSON document.
/// Entries whose end does not come after their start are warned about and
/// dropped; an empty result is an error since nothing can be concatenated.
pub fn load_chapters(json: &str) -> Result<Vec<Chapter>> {
    let document: MetadataDocument = serde_json::from_str(json)?;
    let mut chapters = Vec::new();
    for raw in document.chapters {
        let chapter = Chapter {
            start_time: raw.start_time.as_f64()?,
            end_time: raw.end_time.as_f64()?,
            title: raw.title,
        };
        if chapter.end_time <= chapter.start_time {
            warn!(
                "dropping chapter {:?}: end {} not after start {}",
                chapter.title, chapter.end_time, chapter.start_time
            );
            continue;
        }
        chapters.push(chapter);
    }
    if chapters.is_empty() {
        return Err(Error::NoChapters);
    }
    Ok(chapters)
}

/// Pick chapters by a comma separated list of 1-based numbers.
/// The result follows the order the user typed, not the source order.
/// Non-numeric tokens are ignored; a number outside the list is an error.
pub fn select_chapters(chapters: &[Chapter], selection: &str) -> Result<Vec<Chapter>> {
    trace!("select_chapters selection={selection}");
    let mut picked = Vec::new();
    for token in selection.split(',') {
        let token = token.trim();
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let out_of_range = || Error::ChapterIndex {
            index: token.parse().unwrap_or(usize::MAX),
            count: chapters.len(),
        };
        let index: usize = token.parse().map_err(|_| out_of_range())?;
        let slot = index
            .checked_sub(1)
            .filter(|i| *i < chapters.len())
            .ok_or_else(out_of_range)?;
        picked.push(chapters[slot].clone());
    }
    Ok(picked)
}

/// Build the concat-demuxer segment list for the selected chapters.
/// Offsets stay on the source timeline so ffmpeg can stream-copy each
/// segment straight out of the original file.
pub fn segment_list(chapters: &[Chapter], source: &Path) -> String {
    let mut out = String::new();
    for chapter in chapters {
        out.push_str(&format!(
            "file '{}'\ninpoint {}\noutpoint {}\n",
            source.display(),
            chapter.start_time,
            chapter.end_time
        ));
    }
    out
}

/// Build the ffmetadata chapter document for the selected chapters.
/// Unlike the segment list this rebuilds a zero-based output timeline,
/// laying the chapters back-to-back with their durations preserved. The
/// asymmetry matches how the concat demuxer stitches the output.
pub fn chapter_metadata(chapters: &[Chapter]) -> String {
    let mut out = String::from(";FFMETADATA1\n");
    let mut cursor_ms: u64 = 0;
    for chapter in chapters {
        let duration_ms = (chapter.duration() * 1000.0).round() as u64;
        out.push_str(&format!(
            "[CHAPTER]\nTIMEBASE=1/1000\nSTART={}\nEND={}\ntitle={}\n",
            cursor_ms,
            cursor_ms + duration_ms,
            chapter.title
        ));
        cursor_ms += duration_ms;
    }
    out
}

/// The ffmpeg invocation that concatenates the listed segments with
/// stream copy and attaches the rebuilt chapter metadata.
fn concat_args(list: &Path, metadata: &Path, output: &Path) -> Vec<String> {
    vec![
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list.display().to_string(),
        "-i".to_string(),
        metadata.display().to_string(),
        "-map_metadata".to_string(),
        "1".to_string(),
        "-c".to_string(),
        "copy".to_string(),
        output.display().to_string(),
    ]
}

/// Concatenate the selected chapters of `input` into `output` with ffmpeg.
/// Both intermediate artifacts live in named temp files that are removed
/// when this function returns, whether ffmpeg succeeds or not.
pub fn concat_chapters(
    runner: &dyn ToolRunner,
    chapters: &[Chapter],
    input: &Path,
    output: &Path,
    dry_run: bool,
) -> Result<()> {
    trace!(
        "concat_chapters input={} output={} chapters={}",
        input.display(),
        output.display(),
        chapters.len()
    );
    // The concat demuxer resolves relative entries against the list file's
    // directory, so the source path must be absolute.
    let source = input.canonicalize()?;
    let mut list = NamedTempFile::new()?;
    list.write_all(segment_list(chapters, &source).as_bytes())?;
    list.flush()?;
    let mut metadata = NamedTempFile::new()?;
    metadata.write_all(chapter_metadata(chapters).as_bytes())?;
    metadata.flush()?;
    let args = concat_args(list.path(), metadata.path(), output);
    if dry_run {
        info!("would run: ffmpeg {}", args.join(" "));
        return Ok(());
    }
    info!("running ffmpeg concat for {} chapters", chapters.len());
    run_checked(runner, "ffmpeg", &args)?;
    info!("wrote {}", output.display());
    Ok(())
}
