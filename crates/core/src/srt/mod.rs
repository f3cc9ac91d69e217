//! SRT block handling for the subtitle merge tool.
//! Index and timing lines are treated as opaque labels so merging never
//! disturbs the original timing, only the text.

use crate::error::{Error, Result};
use tracing::trace;

/// A single SRT block: index label, timing line and one or more text lines.
#[derive(Debug, Clone, PartialEq)]
pub struct SrtBlock {
    pub index: String,
    pub timing: String,
    pub text: Vec<String>,
}

/// Parse SRT text into blocks.
/// Blocks are separated by a blank line; anything shorter than index,
/// timing and one text line is silently dropped.
pub fn parse(input: &str) -> Vec<SrtBlock> {
    let mut blocks = Vec::new();
    for chunk in input.trim().split("\n\n") {
        let lines: Vec<&str> = chunk.lines().collect();
        if lines.len() < 3 {
            continue;
        }
        blocks.push(SrtBlock {
            index: lines[0].trim_end().to_string(),
            timing: lines[1].trim_end().to_string(),
            text: lines[2..].iter().map(|l| l.to_string()).collect(),
        });
    }
    blocks
}

/// Read replacement lines from a plain text document, one per subtitle.
/// Blank lines are filtered out before pairing.
pub fn translations(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Pair each block's index and timing with the replacement text at the
/// same position. The counts must match exactly; otherwise nothing is
/// produced and the mismatch is reported with both numbers.
pub fn merge(blocks: &[SrtBlock], replacements: &[String]) -> Result<Vec<SrtBlock>> {
    trace!(
        "merge blocks={} replacements={}",
        blocks.len(),
        replacements.len()
    );
    if blocks.len() != replacements.len() {
        return Err(Error::CountMismatch {
            blocks: blocks.len(),
            translations: replacements.len(),
        });
    }
    Ok(blocks
        .iter()
        .zip(replacements)
        .map(|(block, text)| SrtBlock {
            index: block.index.clone(),
            timing: block.timing.clone(),
            text: vec![text.clone()],
        })
        .collect())
}

/// Format blocks back to SRT text, one blank line between blocks.
pub fn format(blocks: &[SrtBlock]) -> String {
    let mut out = String::new();
    for block in blocks {
        out.push_str(&format!(
            "{}\n{}\n{}\n\n",
            block.index,
            block.timing,
            block.text.join("\n")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:00,000 --> 00:00:01,000\nHello\n\n\
        2\n00:00:01,000 --> 00:00:02,000\nTwo\nlines\n";

    #[test]
    fn parses_blocks_with_multiline_text() {
        let blocks = parse(SAMPLE);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].index, "1");
        assert_eq!(blocks[0].timing, "00:00:00,000 --> 00:00:01,000");
        assert_eq!(blocks[1].text, vec!["Two".to_string(), "lines".to_string()]);
    }

    /// Blocks missing a text line do not survive parsing.
    #[test]
    fn drops_short_blocks() {
        let input = "1\n00:00:00,000 --> 00:00:01,000\n\n2\n00:00:01,000 --> 00:00:02,000\nok\n";
        let blocks = parse(input);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].index, "2");
    }

    #[test]
    fn filters_blank_translation_lines() {
        let lines = translations("ola\n\n  \nduas linhas\n");
        assert_eq!(lines, vec!["ola".to_string(), "duas linhas".to_string()]);
    }

    /// Mismatched counts abort the merge naming both numbers.
    #[test]
    fn merge_rejects_count_mismatch() {
        let blocks = parse(SAMPLE);
        let replacements = translations("only one\n");
        let err = merge(&blocks, &replacements).unwrap_err();
        assert!(matches!(
            err,
            Error::CountMismatch {
                blocks: 2,
                translations: 1
            }
        ));
    }

    /// A matched merge keeps index and timing, swaps only the text.
    #[test]
    fn merge_preserves_index_and_timing() {
        let blocks = parse(SAMPLE);
        let replacements = translations("ola\nduas linhas\n");
        let merged = merge(&blocks, &replacements).unwrap();
        let out = format(&merged);
        assert_eq!(
            out,
            "1\n00:00:00,000 --> 00:00:01,000\nola\n\n\
             2\n00:00:01,000 --> 00:00:02,000\nduas linhas\n\n"
        );
    }
}
