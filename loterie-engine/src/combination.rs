use std::collections::{BTreeMap, BTreeSet, HashMap};

use itertools::Itertools;
use rayon::prelude::*;
use serde::Serialize;

use loterie_data::{DrawHistory, GameType, Pool};

use crate::config::CombinationConfig;
use crate::error::Result;
use crate::labels::Confidence;
use crate::math;
use crate::sampler::{pad_uniform, NumberSource};

const MAX_FREQUENT: usize = 20;
const MAX_MOST_FREQUENT: usize = 10;
/// Score d'une sélection qui n'a pu s'appuyer sur aucune combinaison.
const NO_COMBINATION_SCORE: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinationRecord {
    pub numbers: Vec<u8>,
    pub count: u32,
    /// count / nombre de tirages
    pub frequency: f64,
    pub score: f64,
}

impl CombinationRecord {
    pub fn size(&self) -> usize {
        self.numbers.len()
    }

    /// Nombre de numéros communs avec une liste triée ou non.
    pub fn overlap(&self, numbers: &[u8]) -> usize {
        self.numbers.iter().filter(|n| numbers.contains(n)).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SizeClassAnalysis {
    pub size: usize,
    /// Nombre de combinaisons distinctes observées
    pub total_combinations: usize,
    pub total_occurrences: u64,
    pub average_occurrences: f64,
    pub std_dev: f64,
    /// moyenne + écart-type des occurrences
    pub threshold: f64,
    /// Nombre total de combinaisons fréquentes, avant troncature
    pub frequent_count: usize,
    pub frequent_combinations: Vec<CombinationRecord>,
    pub most_frequent: Vec<CombinationRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CombinationAnalysis {
    pub total_draws: usize,
    pub sizes: BTreeMap<usize, SizeClassAnalysis>,
}

impl CombinationAnalysis {
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Toutes les combinaisons fréquentes retenues, toutes tailles confondues.
    pub fn frequent(&self) -> impl Iterator<Item = &CombinationRecord> {
        self.sizes.values().flat_map(|s| s.frequent_combinations.iter())
    }

    /// Numéros appartenant à au moins une des `limit` premières combinaisons fréquentes
    /// (par score décroissant).
    pub fn top_numbers(&self, limit: usize) -> BTreeSet<u8> {
        by_score(self.frequent().collect())
            .into_iter()
            .take(limit)
            .flat_map(|c| c.numbers.iter().copied())
            .collect()
    }

    pub fn summary(&self) -> CombinationSummary {
        let per_size = self
            .sizes
            .values()
            .map(|s| SizeSummary {
                size: s.size,
                total_combinations: s.total_combinations,
                frequent_combinations: s.frequent_combinations.len(),
                average_occurrences: s.average_occurrences,
                most_frequent: s.most_frequent.iter().take(3).cloned().collect(),
            })
            .collect();

        let mut top: Vec<&CombinationRecord> = self.frequent().collect();
        top.sort_by(|a, b| b.count.cmp(&a.count));

        CombinationSummary {
            total_combinations: self.sizes.values().map(|s| s.total_combinations).sum(),
            total_occurrences: self.sizes.values().map(|s| s.total_occurrences).sum(),
            frequent_combinations: self.frequent().count(),
            per_size,
            top_combinations: top.into_iter().take(10).cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SizeSummary {
    pub size: usize,
    pub total_combinations: usize,
    pub frequent_combinations: usize,
    pub average_occurrences: f64,
    pub most_frequent: Vec<CombinationRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CombinationSummary {
    pub total_combinations: usize,
    pub total_occurrences: u64,
    pub frequent_combinations: usize,
    pub per_size: Vec<SizeSummary>,
    pub top_combinations: Vec<CombinationRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelatedCombination {
    pub combination: CombinationRecord,
    pub overlap_numbers: Vec<u8>,
    /// |intersection| / |cible| × 100
    pub overlap_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CombinationSelection {
    pub numbers: Vec<u8>,
    pub used_combinations: Vec<CombinationRecord>,
    pub prediction_score: f64,
    pub confidence: Confidence,
}

pub struct CombinationMiner {
    config: CombinationConfig,
}

impl CombinationMiner {
    pub fn new(config: CombinationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CombinationConfig {
        &self.config
    }

    pub fn analyze(&self, history: &DrawHistory) -> CombinationAnalysis {
        let total_draws = history.len();
        let mut sizes = BTreeMap::new();
        if total_draws == 0 {
            return CombinationAnalysis { total_draws, sizes };
        }

        for size in self.config.min_size..=self.config.max_size {
            let counts = count_combinations(history, size);
            if counts.is_empty() {
                continue;
            }
            let class = self.size_class(size, counts, total_draws);
            log::debug!(
                "Combinaisons de taille {size} : {} distinctes, seuil {:.2}, {} fréquentes",
                class.total_combinations,
                class.threshold,
                class.frequent_count
            );
            sizes.insert(size, class);
        }

        CombinationAnalysis { total_draws, sizes }
    }

    fn size_class(&self, size: usize, counts: HashMap<Vec<u8>, u32>, total_draws: usize) -> SizeClassAnalysis {
        let values: Vec<f64> = counts.values().map(|&c| c as f64).collect();
        let average_occurrences = math::mean(&values);
        let std_dev = math::std_dev(&values);
        let threshold = average_occurrences + std_dev;

        let mut records: Vec<CombinationRecord> = counts
            .into_iter()
            .map(|(numbers, count)| {
                let frequency = count as f64 / total_draws as f64;
                CombinationRecord {
                    numbers,
                    count,
                    frequency,
                    score: self.score(frequency, size),
                }
            })
            .collect();
        records.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.numbers.cmp(&b.numbers)));

        let frequent: Vec<&CombinationRecord> =
            records.iter().filter(|r| r.count as f64 >= threshold).collect();

        SizeClassAnalysis {
            size,
            total_combinations: records.len(),
            total_occurrences: records.iter().map(|r| r.count as u64).sum(),
            average_occurrences,
            std_dev,
            threshold,
            frequent_count: frequent.len(),
            frequent_combinations: frequent.into_iter().take(MAX_FREQUENT).cloned().collect(),
            most_frequent: records.iter().take(MAX_MOST_FREQUENT).cloned().collect(),
        }
    }

    /// min(1, fréquence × size^(-rarity_exponent) × score_scale)
    fn score(&self, frequency: f64, size: usize) -> f64 {
        let rarity = (size as f64).powf(-self.config.rarity_exponent);
        (frequency * rarity * self.config.score_scale).min(1.0)
    }

    /// Combinaisons fréquentes partageant au moins la moitié des numéros de `target`,
    /// par pourcentage de recouvrement décroissant.
    pub fn find_related(&self, target: &[u8], analysis: &CombinationAnalysis) -> Vec<RelatedCombination> {
        let target: BTreeSet<u8> = target.iter().copied().collect();
        if target.is_empty() {
            return Vec::new();
        }

        let mut related: Vec<RelatedCombination> = analysis
            .frequent()
            .filter_map(|combo| {
                let overlap_numbers: Vec<u8> =
                    combo.numbers.iter().copied().filter(|n| target.contains(n)).collect();
                let ratio = overlap_numbers.len() as f64 / target.len() as f64;
                (ratio >= 0.5).then(|| RelatedCombination {
                    combination: combo.clone(),
                    overlap_numbers,
                    overlap_percentage: ratio * 100.0,
                })
            })
            .collect();

        related.sort_by(|a, b| {
            b.overlap_percentage
                .partial_cmp(&a.overlap_percentage)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        related
    }

    /// Union gloutonne des combinaisons fréquentes par score décroissant, sans dépasser la taille
    /// de grille ; complétion uniforme parmi les numéros restants.
    pub fn assemble<S: NumberSource>(
        &self,
        analysis: &CombinationAnalysis,
        game: GameType,
        source: &mut S,
    ) -> CombinationSelection {
        let target = Pool::Main.pick_count(game);
        let mut selected: BTreeSet<u8> = BTreeSet::new();
        let mut used: Vec<CombinationRecord> = Vec::new();

        for combo in by_score(analysis.frequent().collect()) {
            if selected.len() >= target {
                break;
            }
            let added = combo.numbers.iter().filter(|n| !selected.contains(n)).count();
            if selected.len() + added <= target {
                selected.extend(combo.numbers.iter().copied());
                used.push(combo.clone());
            }
        }

        let covered = selected.len();
        let mut numbers: Vec<u8> = selected.into_iter().collect();
        pad_uniform(source, &mut numbers, game.main_max(), target);
        numbers.sort_unstable();

        let (prediction_score, confidence) = if used.is_empty() {
            (NO_COMBINATION_SCORE, Confidence::VeryLow)
        } else {
            let mean_score = math::mean(&used.iter().map(|c| c.score).collect::<Vec<_>>());
            let coverage = covered as f64 / target as f64;
            (mean_score * coverage, Confidence::from_score(mean_score))
        };

        CombinationSelection {
            numbers,
            used_combinations: used,
            prediction_score,
            confidence,
        }
    }
}

/// Comptage des sous-combinaisons triées de taille `size` des numéros principaux.
fn count_combinations(history: &DrawHistory, size: usize) -> HashMap<Vec<u8>, u32> {
    history
        .draws()
        .par_iter()
        .fold(HashMap::new, |mut acc, draw| {
            for combo in draw.numbers().iter().copied().combinations(size) {
                *acc.entry(combo).or_insert(0) += 1;
            }
            acc
        })
        .reduce(HashMap::new, |mut a, b| {
            for (combo, count) in b {
                *a.entry(combo).or_insert(0) += count;
            }
            a
        })
}

/// Tri stable par score décroissant.
fn by_score(mut combos: Vec<&CombinationRecord>) -> Vec<&CombinationRecord> {
    combos.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    combos
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use loterie_data::history::make_test_history;
    use loterie_data::DrawRecord;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn miner() -> CombinationMiner {
        CombinationMiner::new(CombinationConfig::default()).unwrap()
    }

    fn history_of(draws: &[[u8; 5]]) -> DrawHistory {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let records = draws
            .iter()
            .enumerate()
            .map(|(i, d)| {
                DrawRecord::new(GameType::Euromillions, start + Days::new(i as u64), d.to_vec(), vec![3, 7]).unwrap()
            })
            .collect();
        DrawHistory::new(GameType::Euromillions, records).unwrap()
    }

    #[test]
    fn test_counts_per_size() {
        let history = history_of(&[[1, 2, 3, 4, 5], [1, 2, 3, 10, 20], [1, 2, 30, 40, 50]]);
        let analysis = miner().analyze(&history);
        assert_eq!(analysis.total_draws, 3);
        assert_eq!(analysis.sizes.keys().copied().collect::<Vec<_>>(), vec![2, 3, 4]);

        let pairs = &analysis.sizes[&2];
        // 10 paires par tirage, (1,2) partagée 3 fois, (1,3) (2,3) 2 fois
        assert_eq!(pairs.total_occurrences, 30);
        assert_eq!(pairs.total_combinations, 26);
        assert_eq!(pairs.most_frequent[0].numbers, vec![1, 2]);
        assert_eq!(pairs.most_frequent[0].count, 3);
        assert!((pairs.most_frequent[0].frequency - 1.0).abs() < 1e-12);
        // Égalités départagées par ordre croissant des numéros
        assert_eq!(pairs.most_frequent[1].numbers, vec![1, 3]);
        assert_eq!(pairs.most_frequent[2].numbers, vec![2, 3]);
    }

    #[test]
    fn test_frequent_subset_above_threshold() {
        let history = make_test_history(GameType::Loto, 73);
        let analysis = miner().analyze(&history);
        for class in analysis.sizes.values() {
            assert!(class.frequent_combinations.len() <= MAX_FREQUENT);
            assert!(class.most_frequent.len() <= MAX_MOST_FREQUENT);
            for combo in &class.frequent_combinations {
                assert_eq!(combo.size(), class.size);
                assert!(combo.count as f64 >= class.threshold);
                assert!(combo.numbers.windows(2).all(|w| w[0] < w[1]));
                assert!((0.0..=1.0).contains(&combo.score));
            }
        }
    }

    #[test]
    fn test_threshold_mean_plus_std() {
        let history = history_of(&[[1, 2, 3, 4, 5], [1, 2, 6, 7, 8]]);
        let config = CombinationConfig {
            min_size: 2,
            max_size: 2,
            ..CombinationConfig::default()
        };
        let analysis = CombinationMiner::new(config).unwrap().analyze(&history);
        let pairs = &analysis.sizes[&2];
        // 19 paires distinctes : une à 2, dix-huit à 1
        let values: Vec<f64> = std::iter::once(2.0).chain(std::iter::repeat(1.0).take(18)).collect();
        assert_eq!(pairs.total_combinations, 19);
        assert!((pairs.threshold - (math::mean(&values) + math::std_dev(&values))).abs() < 1e-12);
        assert_eq!(pairs.frequent_count, 1);
        assert_eq!(pairs.frequent_combinations[0].numbers, vec![1, 2]);
    }

    #[test]
    fn test_score_rarity() {
        let miner = miner();
        // 2/100 × 1/2 × 100 = 1
        assert!((miner.score(0.02, 2) - 1.0).abs() < 1e-12);
        assert!((miner.score(0.01, 4) - 0.25).abs() < 1e-12);
        assert_eq!(miner.score(0.5, 2), 1.0);
    }

    #[test]
    fn test_empty_history() {
        let history = DrawHistory::new(GameType::Euromillions, vec![]).unwrap();
        let analysis = miner().analyze(&history);
        assert!(analysis.is_empty());
        let summary = analysis.summary();
        assert_eq!(summary.total_combinations, 0);
        assert!(summary.top_combinations.is_empty());

        let mut rng = StdRng::seed_from_u64(2);
        let selection = miner().assemble(&analysis, GameType::Euromillions, &mut rng);
        assert_eq!(selection.numbers.len(), 5);
        assert!(selection.used_combinations.is_empty());
        assert_eq!(selection.prediction_score, NO_COMBINATION_SCORE);
        assert_eq!(selection.confidence, Confidence::VeryLow);
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let config = CombinationConfig {
            min_size: 3,
            max_size: 5,
            ..CombinationConfig::default()
        };
        assert!(CombinationMiner::new(config).is_err());
    }

    #[test]
    fn test_find_related() {
        let history = history_of(&[[1, 2, 3, 4, 5], [1, 2, 3, 10, 20], [1, 2, 30, 40, 50]]);
        let miner = miner();
        let analysis = miner.analyze(&history);
        let related = miner.find_related(&[1, 2, 3, 44], &analysis);

        assert!(!related.is_empty());
        for r in &related {
            assert!(r.overlap_percentage >= 50.0);
            assert_eq!(r.overlap_numbers.len(), r.combination.overlap(&[1, 2, 3, 44]));
        }
        assert!(related
            .windows(2)
            .all(|w| w[0].overlap_percentage >= w[1].overlap_percentage));
        assert_eq!(related[0].combination.numbers, vec![1, 2, 3]);
        assert!((related[0].overlap_percentage - 75.0).abs() < 1e-12);

        assert!(miner.find_related(&[], &analysis).is_empty());
    }

    #[test]
    fn test_assemble_greedy_union() {
        let history = history_of(&[[1, 2, 3, 4, 5], [1, 2, 3, 10, 20], [1, 2, 30, 40, 50]]);
        let miner = miner();
        let analysis = miner.analyze(&history);
        let mut rng = StdRng::seed_from_u64(4);
        let selection = miner.assemble(&analysis, GameType::Euromillions, &mut rng);

        assert_eq!(selection.numbers.len(), 5);
        assert!(selection.numbers.windows(2).all(|w| w[0] < w[1]));
        assert!(selection.numbers.contains(&1) && selection.numbers.contains(&2));
        assert!(!selection.used_combinations.is_empty());
        for combo in &selection.used_combinations {
            assert!(combo.numbers.iter().all(|n| selection.numbers.contains(n)));
        }
        assert!((0.0..=1.0).contains(&selection.prediction_score));
    }

    #[test]
    fn test_assemble_loto_cardinality() {
        let history = make_test_history(GameType::Loto, 60);
        let miner = miner();
        let analysis = miner.analyze(&history);
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..50 {
            let selection = miner.assemble(&analysis, GameType::Loto, &mut rng);
            assert_eq!(selection.numbers.len(), 6);
            let mut dedup = selection.numbers.clone();
            dedup.dedup();
            assert_eq!(dedup.len(), 6);
            assert!(selection.numbers.iter().all(|&n| (1..=49).contains(&n)));
        }
    }

    #[test]
    fn test_summary() {
        let history = make_test_history(GameType::Euromillions, 30);
        let analysis = miner().analyze(&history);
        let summary = analysis.summary();
        assert_eq!(summary.per_size.len(), 3);
        assert!(summary.top_combinations.len() <= 10);
        assert!(summary.per_size.iter().all(|s| s.most_frequent.len() <= 3));
        assert_eq!(
            summary.total_occurrences,
            analysis.sizes.values().map(|s| s.total_occurrences).sum::<u64>()
        );
    }

    #[test]
    fn test_top_numbers() {
        let history = history_of(&[[1, 2, 3, 4, 5], [1, 2, 3, 10, 20], [1, 2, 30, 40, 50]]);
        let analysis = miner().analyze(&history);
        let top = analysis.top_numbers(1);
        assert!(top.contains(&1) && top.contains(&2));
    }
}
