//! Trend direction resolution for model entities.
//!
//! The leaderboard draws an arrow icon next to each model. The arrow's vector
//! path is the authoritative trend signal; the percentage printed beside it is
//! only consulted when the arrow cannot be found inside the rank's own markup
//! block. Rules are evaluated in a fixed order and the first one that applies
//! decides:
//!
//! 1. a `new` signal is always up
//! 2. the down arrow path inside the rank block
//! 3. the up arrow path inside the rank block
//! 4. the sign of the percentage signal
//! 5. stable

use crate::assets::char_window;
use crate::config::MarkupProfile;
use crate::entity::Direction;

/// Rule that decided a trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendRule {
    Novelty,
    DownIcon,
    UpIcon,
    Percentage,
    Default,
}

/// Direction plus the display glyph and color it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendResolution {
    pub direction: Direction,
    pub rule: TrendRule,
}

impl TrendResolution {
    fn new(direction: Direction, rule: TrendRule) -> Self {
        Self { direction, rule }
    }

    pub fn icon(&self) -> &'static str {
        self.direction.icon()
    }

    pub fn color(&self) -> &'static str {
        self.direction.color()
    }
}

/// Resolves the trend of the entity shown at `rank`.
///
/// `fallback_signal` is the percentage or novelty line read from the rank's
/// text window, if any.
pub fn resolve_trend(
    entity_name: &str, rank: u32, markup: &str, fallback_signal: Option<&str>, profile: &MarkupProfile,
    novelty_keyword: &str,
) -> TrendResolution {
    if let Some(signal) = fallback_signal
        && signal.eq_ignore_ascii_case(novelty_keyword)
    {
        tracing::debug!(rank, name = entity_name, "novelty signal, trend up");
        return TrendResolution::new(Direction::Up, TrendRule::Novelty);
    }

    let needle = entity_name.to_lowercase();
    for block in rank_blocks(markup, rank, profile) {
        if !block.to_lowercase().contains(&needle) {
            continue;
        }

        if block.contains(&profile.down_icon_path) {
            tracing::debug!(rank, name = entity_name, "down icon in rank block");
            return TrendResolution::new(Direction::Down, TrendRule::DownIcon);
        }
        if block.contains(&profile.up_icon_path) {
            tracing::debug!(rank, name = entity_name, "up icon in rank block");
            return TrendResolution::new(Direction::Up, TrendRule::UpIcon);
        }
    }

    if let Some(value) = fallback_signal.and_then(parse_percentage) {
        if value > 0.0 {
            tracing::debug!(rank, name = entity_name, value, "no icon, positive percentage");
            return TrendResolution::new(Direction::Up, TrendRule::Percentage);
        }
        if value < 0.0 {
            tracing::debug!(rank, name = entity_name, value, "no icon, negative percentage");
            return TrendResolution::new(Direction::Down, TrendRule::Percentage);
        }
    }

    tracing::debug!(rank, name = entity_name, "no trend evidence, stable");
    TrendResolution::new(Direction::Stable, TrendRule::Default)
}

/// Parses `1,204%` or `-4.5%` into a number.
pub fn parse_percentage(signal: &str) -> Option<f64> {
    let cleaned: String = signal.trim().chars().filter(|c| *c != ',' && *c != '%').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Markup blocks that start at an occurrence of the rank's marker.
///
/// Each block runs to the next rank's marker. When the next rank's marker
/// does not follow, the block is capped at the profile's lookahead and cut
/// short at the block terminator if one appears within it. The looser marker
/// is only used when the exact marker never occurs.
pub fn rank_blocks<'a>(markup: &'a str, rank: u32, profile: &MarkupProfile) -> Vec<&'a str> {
    let mut marker = profile.rank_marker_for(rank);
    let mut starts: Vec<usize> = markup.match_indices(&marker).map(|(index, _)| index).collect();

    if starts.is_empty() {
        marker = profile.alt_rank_marker_for(rank);
        starts = markup.match_indices(&marker).map(|(index, _)| index).collect();
    }

    let next_marker = rank.checked_add(1).map(|next| profile.rank_marker_for(next));

    starts
        .into_iter()
        .map(|start| {
            let rest = &markup[start..];
            let end = match next_marker.as_deref().and_then(|marker| rest.find(marker)) {
                Some(offset) => start + offset,
                None => {
                    let window = char_window(markup, start, start.saturating_add(profile.block_lookahead));
                    match window.find(&profile.block_terminator) {
                        Some(offset) if !profile.block_terminator.is_empty() => start + offset,
                        _ => start + window.len(),
                    }
                }
            };
            &markup[start..end]
        })
        .collect()
}
