use rayon::prelude::*;
use serde::Serialize;

use loterie_data::models::validate_grid;
use loterie_data::{DrawHistory, GameType, Pool};

use crate::combination::CombinationAnalysis;
use crate::config::ScoringWeights;
use crate::error::Result;
use crate::gap::GapAnalysis;
use crate::labels::GridRating;
use crate::math;
use crate::stats::{consecutive_pairs, ideal_sum, is_low};

/// Valeur retenue quand un signal n'est pas disponible.
pub const NEUTRAL_SCORE: f64 = 0.5;
/// Contribution d'un numéro absent de l'analyse des écarts.
const UNKNOWN_GAP_SCORE: f64 = 0.1;
const DECILE_WIDTH: u8 = 5;
const DECILES: f64 = 10.0;

/// Analyses disponibles pour le scoring ; chaque absence donne un score neutre.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringContext<'a> {
    pub gap: Option<&'a GapAnalysis>,
    pub combination: Option<&'a CombinationAnalysis>,
    pub history: Option<&'a DrawHistory>,
}

impl<'a> ScoringContext<'a> {
    pub fn new(
        gap: Option<&'a GapAnalysis>,
        combination: Option<&'a CombinationAnalysis>,
        history: Option<&'a DrawHistory>,
    ) -> Self {
        Self { gap, combination, history }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubScores {
    pub gap: f64,
    pub combination: f64,
    pub frequency: f64,
    pub distribution: f64,
    pub pattern: f64,
    pub balance: f64,
}

impl SubScores {
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.gap,
            self.combination,
            self.frequency,
            self.distribution,
            self.pattern,
            self.balance,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridAnalysis {
    pub numbers: Vec<u8>,
    pub sum: u32,
    pub average: f64,
    pub range: u8,
    pub even: usize,
    pub odd: usize,
    pub low: usize,
    pub high: usize,
}

impl GridAnalysis {
    fn describe(sorted: &[u8], max: u8) -> Self {
        let sum: u32 = sorted.iter().map(|&n| n as u32).sum();
        let even = sorted.iter().filter(|&&n| n % 2 == 0).count();
        let low = sorted.iter().filter(|&&n| is_low(n, max)).count();
        let range = match (sorted.first(), sorted.last()) {
            (Some(&first), Some(&last)) => last - first,
            _ => 0,
        };
        Self {
            numbers: sorted.to_vec(),
            sum,
            average: sum as f64 / sorted.len().max(1) as f64,
            range,
            even,
            odd: sorted.len() - even,
            low,
            high: sorted.len() - low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub scores: SubScores,
    pub weights: ScoringWeights,
    pub total: f64,
    pub rating: GridRating,
    pub recommendations: Vec<String>,
    pub analysis: GridAnalysis,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedGrid {
    /// Position de la grille dans l'entrée
    pub index: usize,
    pub numbers: Vec<u8>,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreHistogram {
    pub excellent: usize,
    pub very_good: usize,
    pub good: usize,
    pub average: usize,
    pub poor: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonStatistics {
    pub total_grids: usize,
    pub mean: f64,
    pub median: f64,
    pub best: f64,
    pub worst: f64,
    pub std_dev: f64,
    pub histogram: ScoreHistogram,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridComparison {
    /// Grilles par score total décroissant ; à égalité, ordre d'entrée.
    pub ranked: Vec<RankedGrid>,
    /// `None` si aucune grille n'a été fournie.
    pub statistics: Option<ComparisonStatistics>,
}

pub struct GridScorer {
    game: GameType,
    weights: ScoringWeights,
}

impl GridScorer {
    pub fn new(game: GameType, weights: ScoringWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self { game, weights })
    }

    pub fn game(&self) -> GameType {
        self.game
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score d'une grille (numéros principaux). La grille est validée avant tout calcul.
    pub fn score(&self, numbers: &[u8], ctx: &ScoringContext) -> Result<ScoreBreakdown> {
        validate_grid(self.game, numbers)?;
        Ok(self.score_valid(numbers, ctx))
    }

    fn score_valid(&self, numbers: &[u8], ctx: &ScoringContext) -> ScoreBreakdown {
        let mut sorted = numbers.to_vec();
        sorted.sort_unstable();
        let max = self.game.main_max();

        let scores = SubScores {
            gap: unit(ctx.gap.map_or(NEUTRAL_SCORE, |gap| gap_score(&sorted, gap))),
            combination: unit(ctx.combination.map_or(NEUTRAL_SCORE, |c| combination_score(&sorted, c))),
            frequency: unit(ctx.history.map_or(NEUTRAL_SCORE, |h| frequency_score(&sorted, h))),
            distribution: unit(distribution_score(&sorted)),
            pattern: unit(pattern_score(&sorted)),
            balance: unit(balance_score(&sorted, max)),
        };

        let total = unit(
            scores
                .as_array()
                .iter()
                .zip(self.weights.as_array())
                .map(|(s, w)| s * w)
                .sum(),
        );

        ScoreBreakdown {
            recommendations: recommendations(&scores),
            weights: self.weights.clone(),
            total,
            rating: GridRating::from_total(total),
            analysis: GridAnalysis::describe(&sorted, max),
            scores,
        }
    }

    /// Valide toutes les grilles, les score en parallèle puis les classe par score décroissant.
    pub fn compare_grids(&self, grids: &[Vec<u8>], ctx: &ScoringContext) -> Result<GridComparison> {
        for grid in grids {
            validate_grid(self.game, grid)?;
        }

        let mut ranked: Vec<RankedGrid> = grids
            .par_iter()
            .enumerate()
            .map(|(index, numbers)| RankedGrid {
                index,
                numbers: numbers.clone(),
                breakdown: self.score_valid(numbers, ctx),
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.breakdown
                .total
                .partial_cmp(&a.breakdown.total)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let totals: Vec<f64> = ranked.iter().map(|r| r.breakdown.total).collect();
        let statistics = (!totals.is_empty()).then(|| comparison_statistics(&totals));

        Ok(GridComparison { ranked, statistics })
    }
}

fn unit(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}

fn gap_score(numbers: &[u8], analysis: &GapAnalysis) -> f64 {
    if analysis.pool != Pool::Main {
        log::warn!("Analyse des écarts du pool {} ignorée pour le scoring", analysis.pool);
        return NEUTRAL_SCORE;
    }
    let scores: Vec<f64> = numbers
        .iter()
        .map(|&n| match analysis.get(n) {
            Some(r) => r.prediction_score * (1.0 + (r.overdue_factor / 2.0).min(0.5)),
            None => UNKNOWN_GAP_SCORE,
        })
        .collect();
    math::mean(&scores)
}

fn combination_score(numbers: &[u8], analysis: &CombinationAnalysis) -> f64 {
    let scores: Vec<f64> = analysis
        .frequent()
        .filter_map(|combo| {
            let overlap = combo.overlap(numbers);
            (overlap >= 2).then(|| combo.score * overlap as f64 / combo.size() as f64)
        })
        .collect();
    if scores.is_empty() {
        NEUTRAL_SCORE
    } else {
        math::mean(&scores)
    }
}

fn frequency_score(numbers: &[u8], history: &DrawHistory) -> f64 {
    if history.is_empty() {
        return NEUTRAL_SCORE;
    }
    let counts = history.frequencies(Pool::Main);
    let total = history.len() as f64;
    let ratios: Vec<f64> = numbers
        .iter()
        .map(|&n| counts.get(n as usize - 1).copied().unwrap_or(0) as f64 / total)
        .collect();
    0.7 * math::mean(&ratios) + 0.3 * (1.0 - math::std_dev(&ratios))
}

/// Déciles de 5 numéros : équilibre entre déciles occupés et couverture.
fn distribution_score(numbers: &[u8]) -> f64 {
    let mut deciles = [0u32; 10];
    for &n in numbers {
        let idx = ((n - 1) / DECILE_WIDTH) as usize;
        if let Some(slot) = deciles.get_mut(idx) {
            *slot += 1;
        }
    }
    let occupied: Vec<f64> = deciles.iter().filter(|&&c| c > 0).map(|&c| c as f64).collect();
    let ideal_per_decile = numbers.len() as f64 / DECILES;
    let balance = (1.0 - math::std_dev(&occupied) / ideal_per_decile).clamp(0.0, 1.0);
    let coverage = occupied.len() as f64 / DECILES;
    0.6 * balance + 0.4 * coverage
}

fn pattern_score(sorted: &[u8]) -> f64 {
    let diffs: Vec<f64> = sorted.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
    if diffs.is_empty() {
        return NEUTRAL_SCORE;
    }
    let mean_diff = math::mean(&diffs);
    let regularity = if mean_diff > 0.0 {
        1.0 / (1.0 + math::variance(&diffs) / mean_diff)
    } else {
        NEUTRAL_SCORE
    };
    let consecutive_penalty = consecutive_pairs(sorted) as f64 / sorted.len() as f64;
    regularity * (1.0 - consecutive_penalty)
}

fn balance_score(numbers: &[u8], max: u8) -> f64 {
    let len = numbers.len();
    let low = numbers.iter().filter(|&&n| is_low(n, max)).count();
    let even = numbers.iter().filter(|&&n| n % 2 == 0).count();
    let sum: u32 = numbers.iter().map(|&n| n as u32).sum();
    let ideal = ideal_sum(max, len);
    let sum_balance = if ideal > 0.0 {
        1.0 - (sum as f64 - ideal).abs() / ideal
    } else {
        0.0
    };
    0.4 * ratio(low, len - low) + 0.4 * ratio(even, len - even) + 0.2 * sum_balance
}

fn ratio(a: usize, b: usize) -> f64 {
    let hi = a.max(b);
    if hi == 0 {
        return 0.0;
    }
    a.min(b) as f64 / hi as f64
}

const IMPROVEMENTS: [&str; 6] = [
    "Considérer des numéros avec de meilleurs écarts",
    "Inclure plus de combinaisons fréquentes",
    "Privilégier des numéros plus réguliers dans l'historique",
    "Améliorer la répartition sur les déciles",
    "Éviter les suites de numéros consécutifs et les écarts trop irréguliers",
    "Équilibrer les numéros pairs/impairs et haut/bas",
];

const STRENGTHS: [&str; 6] = [
    "Excellente sélection basée sur les écarts",
    "Bonnes combinaisons fréquentes incluses",
    "Numéros historiquement fréquents et homogènes",
    "Distribution équilibrée",
    "Écarts réguliers entre les numéros",
    "Grille bien équilibrée",
];

const NEUTRAL_REMARK: &str = "Grille équilibrée avec des scores moyens";

fn recommendations(scores: &SubScores) -> Vec<String> {
    let values = scores.as_array();
    let mut out: Vec<String> = values
        .iter()
        .zip(IMPROVEMENTS)
        .filter(|(s, _)| **s < 0.4)
        .map(|(_, msg)| msg.to_string())
        .collect();
    out.extend(
        values
            .iter()
            .zip(STRENGTHS)
            .filter(|(s, _)| **s > 0.7)
            .map(|(_, msg)| msg.to_string()),
    );
    if out.is_empty() {
        out.push(NEUTRAL_REMARK.to_string());
    }
    out
}

fn comparison_statistics(totals: &[f64]) -> ComparisonStatistics {
    let mut histogram = ScoreHistogram::default();
    for &t in totals {
        match t {
            t if t >= 0.8 => histogram.excellent += 1,
            t if t >= 0.7 => histogram.very_good += 1,
            t if t >= 0.6 => histogram.good += 1,
            t if t >= 0.5 => histogram.average += 1,
            _ => histogram.poor += 1,
        }
    }
    ComparisonStatistics {
        total_grids: totals.len(),
        mean: math::mean(totals),
        median: math::median(totals),
        best: totals.iter().copied().fold(f64::MIN, f64::max),
        worst: totals.iter().copied().fold(f64::MAX, f64::min),
        std_dev: math::std_dev(totals),
        histogram,
    }
}
