//! Event Matcher — pairs bookmaker events with consensus events.
//!
//! The two sources name teams differently ("PSG" vs "Paris Saint-Germain"),
//! so pairing is fuzzy: team names are normalized, expanded through a
//! configurable alias table, then compared with a character-bigram Dice
//! coefficient. A pair is accepted only when BOTH team names clear the
//! similarity threshold and the kickoff times agree within a tolerance
//! window. Once matched, an id pair is stable for the event's lifetime.

use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::types::{Event, ScoutError};

/// Common club-name tokens that carry no identity ("FC Barcelona" and
/// "Barcelona" are the same club).
const CLUB_TOKENS: &[&str] = &["fc", "ac", "sc", "as", "ss", "us", "rc"];

/// A bookmaker/consensus event pair accepted by the matcher.
#[derive(Debug, Clone)]
pub struct MatchedPair {
    pub bookmaker: Event,
    pub consensus: Event,
    /// Mean of the home and away name similarities, in (threshold, 1.0].
    pub score: f64,
}

/// Matcher configuration, taken from the `[matching]` config section.
#[derive(Debug, Clone)]
pub struct MatcherSettings {
    /// Both team-name similarities must strictly exceed this.
    pub similarity_threshold: f64,
    /// Maximum kickoff disagreement between the two sources, in hours.
    pub kickoff_tolerance_hours: i64,
    /// Normalized short name → normalized canonical name.
    pub aliases: HashMap<String, String>,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.55,
            kickoff_tolerance_hours: 26,
            aliases: HashMap::new(),
        }
    }
}

pub struct EventMatcher {
    settings: MatcherSettings,
    /// Alias table with both sides normalized, built once.
    aliases: HashMap<String, String>,
}

impl EventMatcher {
    pub fn new(settings: MatcherSettings) -> Self {
        let aliases = settings
            .aliases
            .iter()
            .map(|(k, v)| (normalize_name(k), normalize_name(v)))
            .collect();
        Self { settings, aliases }
    }

    /// Pair each bookmaker event with at most one consensus event.
    ///
    /// Greedy over bookmaker events: each takes its best-scoring consensus
    /// candidate, which is then unavailable to later events. An exact score
    /// tie between two candidates is ambiguous and yields no pair at all.
    /// Events that find no partner are dropped silently.
    pub fn match_events(&self, bookmaker: &[Event], consensus: &[Event]) -> Vec<MatchedPair> {
        let mut pairs = Vec::new();
        let mut used: HashSet<usize> = HashSet::new();

        for bk in bookmaker {
            let bk_home = self.canonical(&bk.home);
            let bk_away = self.canonical(&bk.away);

            let mut best: Option<(usize, f64)> = None;
            let mut tied = false;

            for (idx, cs) in consensus.iter().enumerate() {
                if used.contains(&idx) {
                    continue;
                }
                let gap = (bk.kickoff - cs.kickoff).num_hours().abs();
                if gap > self.settings.kickoff_tolerance_hours {
                    continue;
                }

                let Some(score) = self.pair_score(&bk_home, &bk_away, cs) else {
                    continue;
                };

                match best {
                    Some((_, top)) if (score - top).abs() < 1e-9 => tied = true,
                    Some((_, top)) if score > top => {
                        best = Some((idx, score));
                        tied = false;
                    }
                    None => best = Some((idx, score)),
                    _ => {}
                }
            }

            match best {
                Some((idx, score)) if tied => {
                    let err = ScoutError::MatchAmbiguous(format!(
                        "{bk} ties between consensus candidates at score {score:.3}"
                    ));
                    warn!(error = %err, candidate = %consensus[idx], "Skipping event");
                }
                Some((idx, score)) => {
                    debug!(bookmaker = %bk, consensus = %consensus[idx], score, "Matched events");
                    used.insert(idx);
                    pairs.push(MatchedPair {
                        bookmaker: bk.clone(),
                        consensus: consensus[idx].clone(),
                        score,
                    });
                }
                None => {}
            }
        }

        pairs
    }

    /// Similarity of one candidate pairing, checking the straight
    /// orientation first and the swapped one (sources occasionally
    /// disagree on which side is home) second.
    fn pair_score(&self, bk_home: &str, bk_away: &str, cs: &Event) -> Option<f64> {
        let cs_home = self.canonical(&cs.home);
        let cs_away = self.canonical(&cs.away);
        let threshold = self.settings.similarity_threshold;

        let home = dice_similarity(bk_home, &cs_home);
        let away = dice_similarity(bk_away, &cs_away);
        if home > threshold && away > threshold {
            return Some((home + away) / 2.0);
        }

        let home_sw = dice_similarity(bk_home, &cs_away);
        let away_sw = dice_similarity(bk_away, &cs_home);
        if home_sw > threshold && away_sw > threshold {
            return Some((home_sw + away_sw) / 2.0);
        }

        None
    }

    /// Normalized name with the alias table applied.
    fn canonical(&self, name: &str) -> String {
        let normalized = normalize_name(name);
        match self.aliases.get(&normalized) {
            Some(full) => full.clone(),
            None => normalized,
        }
    }
}

/// Normalize a team name for comparison: lowercase, strip Latin
/// diacritics, drop punctuation, drop contentless club tokens, collapse
/// whitespace.
pub fn normalize_name(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        match c {
            'à' | 'á' | 'â' | 'ä' | 'ã' | 'å' => cleaned.push('a'),
            'è' | 'é' | 'ê' | 'ë' => cleaned.push('e'),
            'ì' | 'í' | 'î' | 'ï' => cleaned.push('i'),
            'ò' | 'ó' | 'ô' | 'ö' | 'õ' => cleaned.push('o'),
            'ù' | 'ú' | 'û' | 'ü' => cleaned.push('u'),
            'ç' => cleaned.push('c'),
            'ñ' => cleaned.push('n'),
            'ß' => cleaned.push_str("ss"),
            'œ' => cleaned.push_str("oe"),
            'æ' => cleaned.push_str("ae"),
            c if c.is_ascii_alphanumeric() => cleaned.push(c),
            // Punctuation and anything exotic becomes a word boundary
            _ => cleaned.push(' '),
        }
    }

    let tokens: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|t| !CLUB_TOKENS.contains(t))
        .collect();

    if tokens.is_empty() {
        // Name was nothing but club tokens ("AS" alone); keep them
        cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        tokens.join(" ")
    }
}

/// Character-bigram Dice coefficient over the space-stripped name.
/// 1.0 for identical strings, 0.0 for no shared bigrams.
pub fn dice_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let bigrams = |s: &str| -> Vec<(char, char)> {
        let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
        chars.windows(2).map(|w| (w[0], w[1])).collect()
    };

    let ga = bigrams(a);
    let gb = bigrams(b);
    if ga.is_empty() || gb.is_empty() {
        return 0.0;
    }

    let mut counts: HashMap<(char, char), usize> = HashMap::new();
    for g in &ga {
        *counts.entry(*g).or_insert(0) += 1;
    }

    let mut shared = 0usize;
    for g in &gb {
        if let Some(n) = counts.get_mut(g) {
            if *n > 0 {
                *n -= 1;
                shared += 1;
            }
        }
    }

    (2.0 * shared as f64) / (ga.len() + gb.len()) as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
