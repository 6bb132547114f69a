use std::collections::BTreeMap;

use serde::Serialize;

use loterie_data::history::count_numbers;
use loterie_data::{DrawHistory, GameType, Pool};

/// Poids attribué à un numéro jamais sorti.
pub const UNSEEN_WEIGHT: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Hot,
    Cold,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Hot => write!(f, "HOT"),
            Trend::Cold => write!(f, "COLD"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendEntry {
    pub number: u8,
    pub recent_frequency: f64,
    pub older_frequency: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, Serialize)]
pub struct HotColdAnalysis {
    /// Triés par fréquence récente décroissante.
    pub hot: Vec<TrendEntry>,
    /// Triés par fréquence ancienne décroissante.
    pub cold: Vec<TrendEntry>,
    pub recent_draws: usize,
    pub older_draws: usize,
}

impl HotColdAnalysis {
    pub fn hot_numbers(&self, limit: usize) -> Vec<u8> {
        self.hot.iter().take(limit).map(|e| e.number).collect()
    }

    pub fn cold_numbers(&self, limit: usize) -> Vec<u8> {
        self.cold.iter().take(limit).map(|e| e.number).collect()
    }
}

/// Compare la fréquence de chaque numéro sur les `window` derniers tirages à celle des tirages
/// plus anciens : chaud si > 1.5 × ancienne, froid si < 0.5 × ancienne.
pub fn hot_cold_analysis(history: &DrawHistory, pool: Pool, window: usize) -> HotColdAnalysis {
    let game = history.game();
    let (older, recent) = history.split_recent(window);
    let recent_counts = count_numbers(recent, pool, game);
    let older_counts = count_numbers(older, pool, game);

    let recent_len = recent.len().max(1) as f64;
    let older_len = older.len().max(1) as f64;

    let mut hot = Vec::new();
    let mut cold = Vec::new();
    for idx in 0..pool.size(game) {
        let recent_frequency = recent_counts[idx] as f64 / recent_len;
        let older_frequency = older_counts[idx] as f64 / older_len;
        let number = (idx + 1) as u8;

        if recent_frequency > older_frequency * 1.5 {
            hot.push(TrendEntry { number, recent_frequency, older_frequency, trend: Trend::Hot });
        } else if recent_frequency < older_frequency * 0.5 {
            cold.push(TrendEntry { number, recent_frequency, older_frequency, trend: Trend::Cold });
        }
    }

    hot.sort_by(|a, b| {
        b.recent_frequency
            .partial_cmp(&a.recent_frequency)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    cold.sort_by(|a, b| {
        b.older_frequency
            .partial_cmp(&a.older_frequency)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    HotColdAnalysis {
        hot,
        cold,
        recent_draws: recent.len(),
        older_draws: older.len(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SumRange {
    Low,
    Medium,
    High,
}

impl SumRange {
    /// Bas sous 80 % de la somme idéale, haut au-delà de 120 %.
    pub fn classify(sum: u32, ideal: f64) -> Self {
        let sum = sum as f64;
        if sum < ideal * 0.8 {
            SumRange::Low
        } else if sum > ideal * 1.2 {
            SumRange::High
        } else {
            SumRange::Medium
        }
    }
}

/// Somme « idéale » d'une sélection de `count` numéros dans [1, max] : count × (max + 1) / 2.
pub fn ideal_sum(max: u8, count: usize) -> f64 {
    (max as f64 + 1.0) * count as f64 / 2.0
}

/// Un numéro est « bas » s'il est dans la première moitié de la plage.
pub fn is_low(number: u8, max: u8) -> bool {
    number as f64 <= max as f64 / 2.0
}

/// Nombre de paires de numéros adjacents (n, n+1) dans une liste triée.
pub fn consecutive_pairs(sorted: &[u8]) -> usize {
    sorted.windows(2).filter(|w| w[1] == w[0] + 1).count()
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PatternDistribution {
    pub total_draws: usize,
    /// nombre d'impairs → nombre de tirages
    pub odd_counts: BTreeMap<usize, u32>,
    /// nombre de numéros bas → nombre de tirages
    pub low_counts: BTreeMap<usize, u32>,
    pub sum_ranges: BTreeMap<SumRange, u32>,
    pub consecutive: BTreeMap<usize, u32>,
    pub secondary_sum_ranges: BTreeMap<SumRange, u32>,
}

impl PatternDistribution {
    pub fn compute(history: &DrawHistory) -> Self {
        let game = history.game();
        let max = game.main_max();
        let main_ideal = ideal_sum(max, game.main_count());
        let secondary_ideal = ideal_sum(game.secondary_max(), game.secondary_count());

        let mut dist = PatternDistribution {
            total_draws: history.len(),
            ..Default::default()
        };

        for draw in history.draws() {
            let numbers = draw.numbers();
            let odd = numbers.iter().filter(|&&n| n % 2 == 1).count();
            let low = numbers.iter().filter(|&&n| is_low(n, max)).count();
            let sum: u32 = numbers.iter().map(|&n| n as u32).sum();

            *dist.odd_counts.entry(odd).or_insert(0) += 1;
            *dist.low_counts.entry(low).or_insert(0) += 1;
            *dist.sum_ranges.entry(SumRange::classify(sum, main_ideal)).or_insert(0) += 1;
            *dist.consecutive.entry(consecutive_pairs(numbers)).or_insert(0) += 1;

            if !draw.secondary().is_empty() {
                let secondary_sum: u32 = draw.secondary().iter().map(|&n| n as u32).sum();
                *dist
                    .secondary_sum_ranges
                    .entry(SumRange::classify(secondary_sum, secondary_ideal))
                    .or_insert(0) += 1;
            }
        }

        dist
    }

    /// Nombre d'impairs le plus fréquent (à égalité, le plus petit).
    pub fn most_common_odd_count(&self) -> Option<usize> {
        most_common(&self.odd_counts)
    }

    /// Nombre de numéros bas le plus fréquent (à égalité, le plus petit).
    pub fn most_common_low_count(&self) -> Option<usize> {
        most_common(&self.low_counts)
    }

    /// Tranche de somme des numéros secondaires la plus fréquente (à égalité, la plus basse).
    pub fn most_common_secondary_sum_range(&self) -> Option<SumRange> {
        most_common(&self.secondary_sum_ranges)
    }

    pub fn probability(&self, counts: &BTreeMap<usize, u32>, key: usize) -> f64 {
        if self.total_draws == 0 {
            return 0.0;
        }
        counts.get(&key).copied().unwrap_or(0) as f64 / self.total_draws as f64
    }
}

fn most_common<K: Copy + Ord>(counts: &BTreeMap<K, u32>) -> Option<K> {
    let mut best: Option<(K, u32)> = None;
    for (&key, &count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((key, count));
        }
    }
    best.map(|(key, _)| key)
}

/// Statistiques d'historique partagées par les stratégies de génération.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryStats {
    pub game: GameType,
    pub main_frequencies: Vec<u32>,
    pub secondary_frequencies: Vec<u32>,
    pub main_trends: HotColdAnalysis,
    pub secondary_trends: HotColdAnalysis,
    pub patterns: PatternDistribution,
}

impl HistoryStats {
    pub fn compute(history: &DrawHistory, recent_window: usize) -> Self {
        Self {
            game: history.game(),
            main_frequencies: history.frequencies(Pool::Main),
            secondary_frequencies: history.frequencies(Pool::Secondary),
            main_trends: hot_cold_analysis(history, Pool::Main, recent_window),
            secondary_trends: hot_cold_analysis(history, Pool::Secondary, recent_window),
            patterns: PatternDistribution::compute(history),
        }
    }

    pub fn frequencies(&self, pool: Pool) -> &[u32] {
        match pool {
            Pool::Main => &self.main_frequencies,
            Pool::Secondary => &self.secondary_frequencies,
        }
    }

    pub fn trends(&self, pool: Pool) -> &HotColdAnalysis {
        match pool {
            Pool::Main => &self.main_trends,
            Pool::Secondary => &self.secondary_trends,
        }
    }

    /// Poids de fréquence (numéro, nombre d'apparitions), 0.1 pour un numéro jamais sorti.
    pub fn frequency_weights(&self, pool: Pool) -> Vec<(u8, f64)> {
        self.frequencies(pool)
            .iter()
            .enumerate()
            .map(|(i, &count)| {
                let weight = if count == 0 { UNSEEN_WEIGHT } else { count as f64 };
                ((i + 1) as u8, weight)
            })
            .collect()
    }
}
