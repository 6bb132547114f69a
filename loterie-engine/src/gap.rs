use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;

use loterie_data::{DrawHistory, Pool};

use crate::config::{GapConfig, GapUnit};
use crate::error::Result;
use crate::labels::Confidence;
use crate::math;
use crate::sampler::{pad_uniform, NumberSource};

/// Score attribué aux numéros complétés au hasard dans une sélection par écarts.
pub const PADDING_SCORE: f64 = 0.1;

const CYCLE_CORRELATION: f64 = 0.7;
const MAX_CYCLE: usize = 20;
const TREND_SLOPE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    /// Index du tirage dans l'historique (0 = le plus ancien)
    Draw(usize),
    Date(NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GapTrend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapPattern {
    pub trend: GapTrend,
    pub slope: f64,
    pub cycle_length: Option<usize>,
    /// (écart, occurrences), au plus 3
    pub most_common_gaps: Vec<(u32, usize)>,
    pub std_dev: f64,
    pub variance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapRecord {
    pub number: u8,
    pub appearances: usize,
    pub gaps: Vec<u32>,
    pub average_gap: Option<f64>,
    pub min_gap: Option<u32>,
    pub max_gap: Option<u32>,
    pub current_gap: Option<u32>,
    pub last_appearance: Option<Appearance>,
    pub overdue_factor: f64,
    pub prediction_score: f64,
    pub pattern: Option<GapPattern>,
}

impl GapRecord {
    fn insufficient(number: u8, appearances: usize, last_appearance: Option<Appearance>) -> Self {
        Self {
            number,
            appearances,
            gaps: Vec::new(),
            average_gap: None,
            min_gap: None,
            max_gap: None,
            current_gap: None,
            last_appearance,
            overdue_factor: 0.0,
            prediction_score: 0.0,
            pattern: None,
        }
    }
}

/// Analyse des écarts d'un pool : un enregistrement par numéro de 1 à la taille du pool.
#[derive(Debug, Clone, Serialize)]
pub struct GapAnalysis {
    pub pool: Pool,
    pub unit: GapUnit,
    pub total_draws: usize,
    pub records: Vec<GapRecord>,
}

impl GapAnalysis {
    pub fn get(&self, number: u8) -> Option<&GapRecord> {
        let idx = (number as usize).checked_sub(1)?;
        self.records.get(idx)
    }

    /// Numéros triés par score de prédiction décroissant (à égalité, ordre croissant).
    pub fn ranked_numbers(&self) -> Vec<(u8, f64)> {
        let mut ranked: Vec<(u8, f64)> = self
            .records
            .iter()
            .map(|r| (r.number, r.prediction_score))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }

    /// Sélection de `count` numéros par score de prédiction décroissant. Seuls les numéros
    /// de score strictement positif sont retenus ; le reste est complété uniformément.
    pub fn assemble<S: NumberSource>(&self, count: usize, max: u8, source: &mut S) -> GapSelection {
        let mut scores: Vec<(u8, f64)> = self
            .ranked_numbers()
            .into_iter()
            .filter(|&(_, s)| s > 0.0)
            .take(count)
            .collect();

        let mut numbers: Vec<u8> = scores.iter().map(|&(n, _)| n).collect();
        let selected = numbers.len();
        pad_uniform(source, &mut numbers, max, count);
        if numbers.len() > selected {
            log::debug!(
                "Sélection par écarts : {} numéro(s) complété(s) au hasard",
                numbers.len() - selected
            );
        }
        scores.extend(numbers[selected..].iter().map(|&n| (n, PADDING_SCORE)));

        let average_score = math::mean(&scores.iter().map(|&(_, s)| s).collect::<Vec<_>>());
        numbers.sort_unstable();
        scores.sort_by_key(|&(n, _)| n);

        GapSelection {
            numbers,
            scores,
            average_score,
            confidence: Confidence::from_score(average_score),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GapSelection {
    pub numbers: Vec<u8>,
    pub scores: Vec<(u8, f64)>,
    pub average_score: f64,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumberSummary {
    pub number: u8,
    pub overdue_factor: f64,
    pub prediction_score: f64,
    pub current_gap: Option<u32>,
}

impl From<&GapRecord> for NumberSummary {
    fn from(record: &GapRecord) -> Self {
        Self {
            number: record.number,
            overdue_factor: record.overdue_factor,
            prediction_score: record.prediction_score,
            current_gap: record.current_gap,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GapStatistics {
    pub total_numbers: usize,
    pub overdue_numbers: usize,
    pub overdue_percentage: f64,
    pub most_overdue: Vec<NumberSummary>,
    pub best_scores: Vec<NumberSummary>,
    /// décile (1 = numéros 1-5) → écart moyen des numéros ayant un écart moyen défini
    pub average_gap_by_decile: BTreeMap<usize, f64>,
}

pub struct GapAnalyzer {
    config: GapConfig,
}

impl GapAnalyzer {
    pub fn new(config: GapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GapConfig {
        &self.config
    }

    pub fn analyze(&self, history: &DrawHistory, pool: Pool) -> GapAnalysis {
        let size = pool.size(history.game());

        // Indices d'apparition de chaque numéro, en ordre chronologique
        let mut positions: Vec<Vec<usize>> = vec![Vec::new(); size];
        for (t, draw) in history.draws().iter().enumerate() {
            for &n in pool.numbers_from(draw) {
                let idx = (n - 1) as usize;
                if idx < size {
                    positions[idx].push(t);
                }
            }
        }

        let records: Vec<GapRecord> = positions
            .par_iter()
            .enumerate()
            .map(|(idx, indices)| self.analyze_number((idx + 1) as u8, indices, history))
            .collect();

        log::debug!(
            "Analyse des écarts ({pool}) : {} numéros sur {} tirages",
            records.len(),
            history.len()
        );

        GapAnalysis {
            pool,
            unit: self.config.unit,
            total_draws: history.len(),
            records,
        }
    }

    fn analyze_number(&self, number: u8, indices: &[usize], history: &DrawHistory) -> GapRecord {
        let draws = history.draws();
        let last_appearance = indices.last().map(|&t| match self.config.unit {
            GapUnit::Draws => Appearance::Draw(t),
            GapUnit::Days => Appearance::Date(draws[t].date()),
        });

        if indices.len() < 2 {
            return GapRecord::insufficient(number, indices.len(), last_appearance);
        }

        let (gaps, current_gap): (Vec<u32>, u32) = match self.config.unit {
            GapUnit::Draws => {
                let gaps = indices.windows(2).map(|w| (w[1] - w[0]) as u32).collect();
                // Mesuré depuis le prochain tirage : même unité que les écarts (≥ 1)
                let last = indices[indices.len() - 1];
                (gaps, (draws.len() - last) as u32)
            }
            GapUnit::Days => {
                let gaps = indices
                    .windows(2)
                    .map(|w| days_between(draws[w[0]].date(), draws[w[1]].date()))
                    .collect();
                let last = draws[indices[indices.len() - 1]].date();
                (gaps, days_between(last, history.as_of()))
            }
        };

        let values: Vec<f64> = gaps.iter().map(|&g| g as f64).collect();
        let average_gap = math::mean(&values);
        let overdue_factor = if average_gap > 0.0 {
            current_gap as f64 / average_gap
        } else {
            0.0
        };
        let prediction_score =
            self.prediction_score(current_gap as f64, average_gap, overdue_factor, indices.len());

        GapRecord {
            number,
            appearances: indices.len(),
            average_gap: Some(average_gap),
            min_gap: gaps.iter().copied().min(),
            max_gap: gaps.iter().copied().max(),
            current_gap: Some(current_gap),
            last_appearance,
            overdue_factor,
            prediction_score,
            pattern: Some(gap_pattern(&gaps)),
            gaps,
        }
    }

    fn prediction_score(&self, current_gap: f64, average_gap: f64, overdue_factor: f64, appearances: usize) -> f64 {
        let c = &self.config;
        let overdue = if overdue_factor > 0.0 {
            (overdue_factor / 2.0).min(1.0)
        } else {
            0.0
        };
        let frequency = (appearances as f64 / c.frequency_saturation).min(1.0);
        let stability = if average_gap > 0.0 {
            1.0 - (current_gap / (average_gap * 3.0)).min(1.0)
        } else {
            0.5
        };
        (c.overdue_weight * overdue + c.frequency_weight * frequency + c.stability_weight * stability).clamp(0.0, 1.0)
    }

    pub fn statistics(&self, analysis: &GapAnalysis) -> GapStatistics {
        let total_numbers = analysis.records.len();
        let overdue_numbers = analysis
            .records
            .iter()
            .filter(|r| r.overdue_factor > self.config.overdue_threshold)
            .count();
        let overdue_percentage = if total_numbers > 0 {
            overdue_numbers as f64 / total_numbers as f64 * 100.0
        } else {
            0.0
        };

        let mut by_overdue: Vec<&GapRecord> = analysis.records.iter().collect();
        by_overdue.sort_by(|a, b| {
            b.overdue_factor
                .partial_cmp(&a.overdue_factor)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mut by_score: Vec<&GapRecord> = analysis.records.iter().collect();
        by_score.sort_by(|a, b| {
            b.prediction_score
                .partial_cmp(&a.prediction_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut decile_gaps: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
        for record in &analysis.records {
            if let Some(avg) = record.average_gap {
                let decile = (record.number as usize - 1) / 5 + 1;
                decile_gaps.entry(decile).or_default().push(avg);
            }
        }

        GapStatistics {
            total_numbers,
            overdue_numbers,
            overdue_percentage,
            most_overdue: by_overdue.into_iter().take(10).map(NumberSummary::from).collect(),
            best_scores: by_score.into_iter().take(10).map(NumberSummary::from).collect(),
            average_gap_by_decile: decile_gaps
                .into_iter()
                .map(|(decile, gaps)| (decile, math::mean(&gaps)))
                .collect(),
        }
    }
}

fn days_between(from: NaiveDate, to: NaiveDate) -> u32 {
    (to - from).num_days().max(0) as u32
}

fn gap_pattern(gaps: &[u32]) -> GapPattern {
    let values: Vec<f64> = gaps.iter().map(|&g| g as f64).collect();
    let slope = math::linear_slope(&values);
    let trend = if slope > TREND_SLOPE {
        GapTrend::Increasing
    } else if slope < -TREND_SLOPE {
        GapTrend::Decreasing
    } else {
        GapTrend::Stable
    };

    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for &g in gaps {
        *counts.entry(g).or_insert(0) += 1;
    }
    let mut most_common: Vec<(u32, usize)> = counts.into_iter().collect();
    most_common.sort_by(|a, b| b.1.cmp(&a.1));
    most_common.truncate(3);

    GapPattern {
        trend,
        slope,
        cycle_length: find_cycle_length(&values),
        most_common_gaps: most_common,
        std_dev: math::std_dev(&values),
        variance: math::variance(&values),
    }
}

/// Plus petite période c telle que la corrélation moyenne entre fenêtres consécutives
/// `gaps[i..i+c]` et `gaps[i+c..i+2c]` dépasse 0.7. Les corrélations indéfinies sont ignorées.
fn find_cycle_length(gaps: &[f64]) -> Option<usize> {
    if gaps.len() < 4 {
        return None;
    }
    let upper = (gaps.len() / 2).min(MAX_CYCLE);
    (2..upper).find(|&cycle| {
        let correlations: Vec<f64> = (0..=gaps.len() - 2 * cycle)
            .filter_map(|i| math::pearson(&gaps[i..i + cycle], &gaps[i + cycle..i + 2 * cycle]))
            .collect();
        !correlations.is_empty() && math::mean(&correlations) > CYCLE_CORRELATION
    })
}
