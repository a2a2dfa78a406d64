//! Rank window segmentation of rendered text.
//!
//! Rendered leaderboard text lists every entity as a bare `N.` line
//! followed by a handful of field lines. [`segment`] finds those rank lines
//! after a section heading and hands back the lines that follow each one.

use std::sync::LazyLock;

use regex::Regex;

static RANK_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)\.$").expect("valid rank regex"));

/// Lines following one rank marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankWindow {
    pub rank: u32,
    /// Trimmed lines after the marker, never including another rank line.
    pub lines: Vec<String>,
}

/// Parses a line of the form `<digits>.` into a positive rank.
pub fn parse_rank_line(line: &str) -> Option<u32> {
    let rank: u32 = RANK_LINE.captures(line.trim())?.get(1)?.as_str().parse().ok()?;
    (rank > 0).then_some(rank)
}

/// Splits rendered text into per-rank windows.
///
/// Lines are ignored until one contains `section_marker`; an empty marker
/// means the whole text is in-section. Each window holds at most
/// `window_lines` lines and stops early at the next rank line. Scanning ends
/// at the first rank greater than `max_rank`. Ranks come back in encounter
/// order and may repeat if the page lists them twice.
pub fn segment(text: &str, section_marker: &str, window_lines: usize, max_rank: usize) -> Vec<RankWindow> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut windows = Vec::new();
    let mut in_section = section_marker.is_empty();

    for (index, line) in lines.iter().enumerate() {
        if !in_section {
            if line.contains(section_marker) {
                tracing::debug!(line = index, "found section marker");
                in_section = true;
            }
            continue;
        }

        let Some(rank) = parse_rank_line(line) else {
            continue;
        };

        if rank as usize > max_rank {
            break;
        }

        let window = lines[index + 1..]
            .iter()
            .take(window_lines)
            .take_while(|candidate| parse_rank_line(candidate).is_none())
            .map(|candidate| candidate.to_string())
            .collect();

        windows.push(RankWindow { rank, lines: window });
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const TEXT: &str = "Header\n1.\nNot ranked\nTop Apps\n1.\nExampleApp\nA cool app\n42.0Mtokens\n2.\nOther\n1.2Btokens\n";

    #[test]
    fn test_segment_waits_for_section_marker() {
        let windows = segment(TEXT, "Top Apps", 10, 20);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].rank, 1);
        assert_eq!(windows[0].lines, vec!["ExampleApp", "A cool app", "42.0Mtokens"]);
        assert_eq!(windows[1].lines, vec!["Other", "1.2Btokens"]);
    }

    #[test]
    fn test_empty_marker_means_whole_text() {
        let windows = segment(TEXT, "", 10, 20);
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].lines, vec!["Not ranked", "Top Apps"]);
    }

    #[test]
    fn test_missing_marker_yields_nothing() {
        assert!(segment(TEXT, "Top Models", 10, 20).is_empty());
    }

    #[test]
    fn test_window_is_capped() {
        let text = "1.\na\nb\nc\nd\ne";
        let windows = segment(text, "", 3, 20);
        assert_eq!(windows[0].lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_stops_past_max_rank() {
        let text = "1.\na\n2.\nb\n3.\nc\n1.\nd";
        let windows = segment(text, "", 10, 2);
        assert_eq!(windows.iter().map(|w| w.rank).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_duplicate_ranks_are_kept() {
        let text = "1.\na\n1.\nb";
        let windows = segment(text, "", 10, 20);
        assert_eq!(windows.len(), 2);
    }

    #[rstest]
    #[case("1.", Some(1))]
    #[case("  12. ", Some(12))]
    #[case("1", None)]
    #[case("1.5", None)]
    #[case("a.", None)]
    #[case("0.", None)]
    #[case("", None)]
    fn test_parse_rank_line(#[case] line: &str, #[case] expected: Option<u32>) {
        assert_eq!(parse_rank_line(line), expected);
    }
}
