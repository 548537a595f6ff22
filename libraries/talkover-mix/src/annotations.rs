//! Annotation-to-comment formatters
//!
//! Annotation lists (measure numbers, chord symbols, leitmotif and
//! structure labels) become spoken-text comment lists here. The transforms
//! are purely textual; trailing periods and inserted pauses exist for
//! synthesis prosody.

use std::collections::HashMap;
use talkover_core::TimedEvent;

/// Reduce a measure annotation list to spoken measure numbers.
///
/// Only integral measure numbers are kept, thinned to every `step`-th
/// measure counting from `start`. Rendered as `"12."`.
pub fn measure_comments(
    measures: &[TimedEvent<f64>],
    start: i64,
    step: u32,
) -> Vec<TimedEvent<String>> {
    let step = i64::from(step.max(1));
    measures
        .iter()
        .filter_map(|event| {
            if event.value.fract() != 0.0 {
                return None;
            }
            let number = event.value as i64;
            if (number - start).rem_euclid(step) != 0 {
                return None;
            }
            Some(TimedEvent::new(event.time, format!("{number}.")))
        })
        .collect()
}

/// Append a period to each leitmotif name.
pub fn leitmotif_comments(motifs: &[TimedEvent<String>]) -> Vec<TimedEvent<String>> {
    motifs
        .iter()
        .map(|event| TimedEvent::new(event.time, format!("{}.", event.value)))
        .collect()
}

/// Turn structural labels into speakable text: colons become spaces, a
/// period is appended.
pub fn structure_comments(labels: &[TimedEvent<String>]) -> Vec<TimedEvent<String>> {
    labels
        .iter()
        .map(|event| TimedEvent::new(event.time, format!("{}.", event.value.replace(':', " "))))
        .collect()
}

/// Fixed mapping from chord symbols to spoken text.
///
/// Covers the seven naturals with sharp and flat variants, each as a plain
/// symbol (read as major), `:maj` and `:min`. Built once by a pure
/// constructor; the table never changes afterwards. The period after the
/// root letter (`"B. flat minor."`) forces a pause so the letter name is
/// intelligible.
#[derive(Debug, Clone)]
pub struct ChordVocabulary {
    table: HashMap<String, String>,
}

impl ChordVocabulary {
    const NATURALS: [char; 7] = ['C', 'D', 'E', 'F', 'G', 'A', 'B'];

    pub fn new() -> Self {
        let mut table = HashMap::new();
        for letter in Self::NATURALS {
            for accidental in ["", "#", "b"] {
                let symbol = format!("{letter}{accidental}");
                let root = match accidental {
                    "#" => format!("{letter}. sharp"),
                    "b" => format!("{letter}. flat"),
                    _ => format!("{letter}."),
                };
                table.insert(symbol.clone(), format!("{root} major."));
                table.insert(format!("{symbol}:maj"), format!("{root} major."));
                table.insert(format!("{symbol}:min"), format!("{root} minor."));
            }
        }
        Self { table }
    }

    /// Spoken text for a chord symbol, if the symbol is known.
    pub fn spoken(&self, symbol: &str) -> Option<&str> {
        self.table.get(symbol).map(String::as_str)
    }

    /// Convert a chord annotation list into spoken comments.
    ///
    /// `drop_unknown` removes symbols absent from the vocabulary (otherwise
    /// they pass through verbatim); `drop_repeats` removes immediately
    /// repeated symbols, compared before rendering.
    pub fn chord_comments(
        &self,
        chords: &[TimedEvent<String>],
        drop_unknown: bool,
        drop_repeats: bool,
    ) -> Vec<TimedEvent<String>> {
        let mut kept: Vec<&TimedEvent<String>> = chords
            .iter()
            .filter(|event| !drop_unknown || self.table.contains_key(&event.value))
            .collect();

        if drop_repeats {
            let mut previous: Option<&str> = None;
            kept.retain(|event| {
                let repeat = previous == Some(event.value.as_str());
                previous = Some(event.value.as_str());
                !repeat
            });
        }

        kept.into_iter()
            .map(|event| {
                let spoken = self
                    .spoken(&event.value)
                    .map_or_else(|| event.value.clone(), str::to_owned);
                TimedEvent::new(event.time, spoken)
            })
            .collect()
    }
}

impl Default for ChordVocabulary {
    fn default() -> Self {
        Self::new()
    }
}
