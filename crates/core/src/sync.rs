//! Timestamp pair reading and delay analysis.
//! This module turns a text file of `<timestamp> - <timestamp>` lines into
//! per-pair delays and summary statistics for sync correction.

use crate::timestamp::{format_timestamp, parse_timestamp};
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::{debug, warn};

/// One parsed input line: the same event timed in two recordings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimestampPair {
    pub source1: f64,
    pub source2: f64,
}

impl TimestampPair {
    /// Signed delay of source 2 relative to source 1.
    pub fn delay(&self) -> f64 {
        self.source2 - self.source1
    }
}

/// An input line that could not be used, kept for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    pub number: usize,
    pub content: String,
}

/// Read timestamp pairs from text, one `<a> - <b>` pair per line.
/// Blank lines and `#` comments are ignored; anything else that fails to
/// split or parse is recorded as skipped and processing continues.
pub fn read_pairs(input: &str) -> (Vec<TimestampPair>, Vec<SkippedLine>) {
    let mut pairs = Vec::new();
    let mut skipped = Vec::new();
    for (number, raw) in input.lines().enumerate() {
        let number = number + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parsed = line
            .split_once(" - ")
            .and_then(|(a, b)| Some((parse_timestamp(a).ok()?, parse_timestamp(b).ok()?)));
        match parsed {
            Some((source1, source2)) => {
                debug!(
                    "line {}: {} -> {:.3}s, {:.3}s",
                    number, line, source1, source2
                );
                pairs.push(TimestampPair { source1, source2 });
            }
            None => {
                warn!("skipping line {}: {}", number, line);
                skipped.push(SkippedLine {
                    number,
                    content: line.to_string(),
                });
            }
        }
    }
    (pairs, skipped)
}

/// Aggregate statistics over a set of delays.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayStatistics {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; `None` below two samples.
    pub stdev: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    /// Occurrences per delay rounded to the nearest millisecond.
    pub histogram: BTreeMap<i64, usize>,
}

/// How consistent the delays are, judged by their standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consistency {
    Excellent,
    Good,
    Inconsistent,
}

impl std::fmt::Display for Consistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Consistency::Excellent => "excellent",
            Consistency::Good => "good",
            Consistency::Inconsistent => "inconsistent",
        };
        f.write_str(label)
    }
}

/// Classify a standard deviation: under 1ms is excellent, under 10ms good.
pub fn classify(stdev: f64) -> Consistency {
    if stdev < 0.001 {
        Consistency::Excellent
    } else if stdev < 0.01 {
        Consistency::Good
    } else {
        Consistency::Inconsistent
    }
}

/// Compute statistics over the delays, or `None` when there are none.
pub fn analyze(delays: &[f64]) -> Option<DelayStatistics> {
    if delays.is_empty() {
        return None;
    }
    let count = delays.len();
    let mean = delays.iter().sum::<f64>() / count as f64;
    let stdev = if count > 1 {
        let variance = delays
            .iter()
            .map(|d| (d - mean).powi(2))
            .sum::<f64>()
            / (count - 1) as f64;
        Some(variance.sqrt())
    } else {
        None
    };
    let min = delays.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = delays.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut histogram = BTreeMap::new();
    for delay in delays {
        *histogram.entry((delay * 1000.0).round() as i64).or_insert(0) += 1;
    }
    Some(DelayStatistics {
        count,
        mean,
        median: median(delays),
        stdev,
        min,
        max,
        range: max - min,
        histogram,
    })
}

/// Offset to apply to bring the sources into sync, when one is safe to
/// recommend: the mean for consistent runs, the single measurement when
/// there is only one.
pub fn recommended_offset(stats: &DelayStatistics) -> Option<f64> {
    match stats.stdev {
        None => Some(stats.mean),
        Some(sd) if sd < 0.01 => Some(stats.mean),
        Some(_) => None,
    }
}

/// Median of an unsorted slice; averages the middle two for even counts.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Render the full human-readable analysis report for the pairs.
/// The way this works is by printing one section per pair with the signed
/// delay and direction, then the statistics summary with a distribution and
/// a consistency verdict.
pub fn render_report(pairs: &[TimestampPair]) -> String {
    let mut out = String::new();
    let delays: Vec<f64> = pairs.iter().map(TimestampPair::delay).collect();
    let stats = match analyze(&delays) {
        Some(stats) => stats,
        None => return "No valid timestamp pairs to analyze.\n".to_string(),
    };

    out.push_str("Timestamp Pair Analysis\n");
    out.push_str("=======================\n\n");
    for (i, pair) in pairs.iter().enumerate() {
        let delay = pair.delay();
        let direction = if delay > 0.0 {
            "source 2 is later"
        } else if delay < 0.0 {
            "source 2 is earlier"
        } else {
            "sources are synced"
        };
        let _ = writeln!(out, "Pair {}:", i + 1);
        let _ = writeln!(
            out,
            "  source 1: {} ({:.3}s)",
            format_timestamp(pair.source1),
            pair.source1
        );
        let _ = writeln!(
            out,
            "  source 2: {} ({:.3}s)",
            format_timestamp(pair.source2),
            pair.source2
        );
        let _ = writeln!(
            out,
            "  delay: {:+.3}s ({:+.1}ms) -> {}",
            delay,
            delay * 1000.0,
            direction
        );
        out.push('\n');
    }

    out.push_str("Summary\n");
    out.push_str("=======\n");
    let _ = writeln!(out, "pairs analyzed: {}", stats.count);
    let _ = writeln!(
        out,
        "mean delay:   {:.6}s ({:+.2}ms)",
        stats.mean,
        stats.mean * 1000.0
    );
    let _ = writeln!(
        out,
        "median delay: {:.6}s ({:+.2}ms)",
        stats.median,
        stats.median * 1000.0
    );
    match stats.stdev {
        Some(sd) => {
            let _ = writeln!(out, "delay std dev: {:.6}s ({:.2}ms)", sd, sd * 1000.0);
        }
        None => {
            let _ = writeln!(out, "delay std dev: n/a (only one data point)");
        }
    }
    let _ = writeln!(
        out,
        "min delay: {:.6}s ({:+.2}ms)",
        stats.min,
        stats.min * 1000.0
    );
    let _ = writeln!(
        out,
        "max delay: {:.6}s ({:+.2}ms)",
        stats.max,
        stats.max * 1000.0
    );
    let _ = writeln!(
        out,
        "delay range: {:.6}s ({:.2}ms)",
        stats.range,
        stats.range * 1000.0
    );

    out.push_str("\nDelay distribution:\n");
    for (bucket_ms, occurrences) in &stats.histogram {
        let _ = writeln!(
            out,
            "  {:+.3}s ({:+}ms): {} occurrence(s)",
            *bucket_ms as f64 / 1000.0,
            bucket_ms,
            occurrences
        );
    }

    out.push('\n');
    match stats.stdev {
        Some(sd) => {
            let _ = writeln!(out, "Sync consistency: {}", classify(sd));
            if let Some(offset) = recommended_offset(&stats) {
                let _ = writeln!(out, "Recommended constant offset: {offset:.3}s");
            }
        }
        None => {
            // Single measurement: no spread to judge, recommend it as-is.
            if let Some(offset) = recommended_offset(&stats) {
                let _ = writeln!(
                    out,
                    "Recommended offset: {offset:.3}s (based on single measurement)"
                );
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ensure comments, blanks and bad lines are skipped with the rest kept.
    #[test]
    fn reads_pairs_and_reports_skips() {
        let input = "00:01.000 - 00:01.500\n# comment\n\nbad line\n";
        let (pairs, skipped) = read_pairs(input);
        assert_eq!(pairs.len(), 1);
        assert!((pairs[0].delay() - 0.5).abs() < 1e-9);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].number, 4);
        assert_eq!(skipped[0].content, "bad line");
    }

    /// A line whose tokens do not parse as timestamps is skipped too.
    #[test]
    fn skips_unparseable_tokens() {
        let (pairs, skipped) = read_pairs("00:01 - nonsense\n");
        assert!(pairs.is_empty());
        assert_eq!(skipped.len(), 1);
    }

    #[test]
    fn analyzes_consistent_delays() {
        let stats = analyze(&[0.010, 0.012, 0.011]).unwrap();
        assert!((stats.mean - 0.011).abs() < 1e-9);
        assert!((stats.median - 0.011).abs() < 1e-9);
        let sd = stats.stdev.unwrap();
        assert!((sd - 0.001).abs() < 1e-12);
        let offset = recommended_offset(&stats).unwrap();
        assert!((offset - 0.011).abs() < 1e-9);
    }

    /// Sub-millisecond spread classifies as excellent.
    #[test]
    fn tight_delays_are_excellent() {
        let stats = analyze(&[0.0101, 0.0102, 0.0101]).unwrap();
        let sd = stats.stdev.unwrap();
        assert!(sd < 0.001);
        assert_eq!(classify(sd), Consistency::Excellent);
    }

    /// One sample: no standard deviation, the measurement is the offset.
    #[test]
    fn single_sample_recommends_itself() {
        let stats = analyze(&[0.020]).unwrap();
        assert!(stats.stdev.is_none());
        assert_eq!(recommended_offset(&stats), Some(0.020));
    }

    #[test]
    fn empty_delays_yield_no_statistics() {
        assert!(analyze(&[]).is_none());
        let report = render_report(&[]);
        assert!(report.contains("No valid timestamp pairs"));
    }

    #[test]
    fn histogram_buckets_by_millisecond_ascending() {
        let stats = analyze(&[0.010, 0.0101, 0.012, -0.003]).unwrap();
        let buckets: Vec<(i64, usize)> =
            stats.histogram.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(buckets, vec![(-3, 1), (10, 2), (12, 1)]);
    }

    #[test]
    fn median_of_even_count_averages_middle() {
        let stats = analyze(&[0.1, 0.2, 0.4, 0.3]).unwrap();
        assert!((stats.median - 0.25).abs() < 1e-9);
    }

    #[test]
    fn classifies_spread() {
        assert_eq!(classify(0.0005), Consistency::Excellent);
        assert_eq!(classify(0.005), Consistency::Good);
        assert_eq!(classify(0.05), Consistency::Inconsistent);
    }

    /// An inconsistent run gets no offset recommendation.
    #[test]
    fn no_offset_for_inconsistent_delays() {
        let stats = analyze(&[0.0, 0.5, 1.0]).unwrap();
        assert_eq!(recommended_offset(&stats), None);
    }

    #[test]
    fn report_labels_direction_with_exact_zero_test() {
        let pairs = [
            TimestampPair {
                source1: 1.0,
                source2: 1.5,
            },
            TimestampPair {
                source1: 2.0,
                source2: 1.5,
            },
            TimestampPair {
                source1: 3.0,
                source2: 3.0,
            },
        ];
        let report = render_report(&pairs);
        assert!(report.contains("source 2 is later"));
        assert!(report.contains("source 2 is earlier"));
        assert!(report.contains("sources are synced"));
    }
}
