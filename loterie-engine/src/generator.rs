use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use loterie_data::{DrawHistory, GameType, Grid, Pool};

use rand::rngs::StdRng;

use crate::combination::{CombinationAnalysis, CombinationMiner, CombinationRecord};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::gap::{GapAnalysis, GapAnalyzer, GapStatistics, PADDING_SCORE};
use crate::labels::{Confidence, GridRating};
use crate::sampler::{pad_uniform, seeded_source, NumberSource};
use crate::scoring::{GridScorer, ScoreBreakdown, ScoringContext};
use crate::stats::{ideal_sum, is_low, HistoryStats, SumRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Fréquence × bonus chaud × bonus combinaison
    Balanced,
    Frequency,
    Hot,
    Cold,
    /// Pattern pair/impair + bas/haut et tranche de somme secondaire les plus fréquents
    Pattern,
    GapBased,
    CombinationBased,
}

impl Strategy {
    pub const ALL: [Strategy; 7] = [
        Strategy::Balanced,
        Strategy::Frequency,
        Strategy::Hot,
        Strategy::Cold,
        Strategy::Pattern,
        Strategy::GapBased,
        Strategy::CombinationBased,
    ];

    /// Rotation des premières grilles d'une génération mixte.
    pub const MIX: [Strategy; 5] = [
        Strategy::Balanced,
        Strategy::Frequency,
        Strategy::Hot,
        Strategy::Cold,
        Strategy::Pattern,
    ];
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Balanced => write!(f, "balanced"),
            Strategy::Frequency => write!(f, "frequency"),
            Strategy::Hot => write!(f, "hot"),
            Strategy::Cold => write!(f, "cold"),
            Strategy::Pattern => write!(f, "pattern"),
            Strategy::GapBased => write!(f, "gap_based"),
            Strategy::CombinationBased => write!(f, "combination_based"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub numbers: Vec<u8>,
    pub secondary: Vec<u8>,
    pub strategy: Strategy,
    pub breakdown: ScoreBreakdown,
    pub rating: GridRating,
    /// Score de chaque numéro principal selon la stratégie, par numéro croissant
    pub number_scores: Vec<(u8, f64)>,
    /// Confiance et score moyen de la sélection (stratégies par écarts et par combinaisons)
    pub selection_confidence: Option<Confidence>,
    pub selection_score: Option<f64>,
    /// Combinaisons fréquentes à l'origine de la grille
    pub base_combinations: Vec<CombinationRecord>,
}

/// Grille d'un système de couverture : chaque grille évite les numéros des précédentes.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageGrid {
    pub numbers: Vec<u8>,
    pub secondary: Vec<u8>,
    pub breakdown: ScoreBreakdown,
}

/// Génère des grilles classées à partir d'un historique. Les deux analyses sont calculées une
/// seule fois à la construction.
pub struct PredictionGenerator<'h> {
    history: &'h DrawHistory,
    config: EngineConfig,
    gap_analyzer: GapAnalyzer,
    miner: CombinationMiner,
    scorer: GridScorer,
    gap: GapAnalysis,
    combinations: CombinationAnalysis,
    stats: HistoryStats,
}

impl<'h> PredictionGenerator<'h> {
    pub fn new(history: &'h DrawHistory, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let gap_analyzer = GapAnalyzer::new(config.gap.clone())?;
        let miner = CombinationMiner::new(config.combination.clone())?;
        let scorer = GridScorer::new(history.game(), config.weights.clone())?;

        let (gap, combinations) = rayon::join(
            || gap_analyzer.analyze(history, Pool::Main),
            || miner.analyze(history),
        );
        let stats = HistoryStats::compute(history, config.generator.recent_window);

        log::info!(
            "Générateur {} prêt : {} tirages, {} combinaisons fréquentes",
            history.game(),
            history.len(),
            combinations.frequent().count()
        );

        Ok(Self {
            history,
            config,
            gap_analyzer,
            miner,
            scorer,
            gap,
            combinations,
            stats,
        })
    }

    pub fn game(&self) -> GameType {
        self.history.game()
    }

    pub fn gap_analysis(&self) -> &GapAnalysis {
        &self.gap
    }

    pub fn gap_statistics(&self) -> GapStatistics {
        self.gap_analyzer.statistics(&self.gap)
    }

    pub fn combination_analysis(&self) -> &CombinationAnalysis {
        &self.combinations
    }

    pub fn stats(&self) -> &HistoryStats {
        &self.stats
    }

    pub fn scorer(&self) -> &GridScorer {
        &self.scorer
    }

    pub fn scoring_context(&self) -> ScoringContext<'_> {
        ScoringContext::new(Some(&self.gap), Some(&self.combinations), Some(self.history))
    }

    /// Source reproductible : seed de la configuration, sinon seed YYYYMMDD de la date de
    /// référence de l'historique.
    pub fn daily_source(&self) -> StdRng {
        seeded_source(self.config.generator.seed, self.history.as_of())
    }

    /// `count` prédictions de la stratégie, classées par score total décroissant.
    pub fn generate<S: NumberSource>(&self, strategy: Strategy, count: usize, source: &mut S) -> Result<Vec<Prediction>> {
        let mut predictions = (0..count)
            .map(|_| self.predict(strategy, source))
            .collect::<Result<Vec<_>>>()?;
        rank(&mut predictions);
        log::debug!("{} prédiction(s) générée(s) ({strategy})", predictions.len());
        Ok(predictions)
    }

    /// Les premières grilles parcourent [`Strategy::MIX`], les suivantes utilisent `strategy`.
    pub fn generate_mix<S: NumberSource>(&self, strategy: Strategy, count: usize, source: &mut S) -> Result<Vec<Prediction>> {
        let mut predictions = (0..count)
            .map(|i| self.predict(Strategy::MIX.get(i).copied().unwrap_or(strategy), source))
            .collect::<Result<Vec<_>>>()?;
        rank(&mut predictions);
        Ok(predictions)
    }

    /// Système de couverture : chaque grille est tirée parmi les numéros non encore utilisés,
    /// le pool étant réinitialisé lorsqu'il ne suffit plus.
    pub fn generate_coverage<S: NumberSource>(&self, count: usize, source: &mut S) -> Result<Vec<CoverageGrid>> {
        let game = self.game();
        let ctx = self.scoring_context();
        let mut used_main = BTreeSet::new();
        let mut used_secondary = BTreeSet::new();
        let mut grids = Vec::with_capacity(count);

        for _ in 0..count {
            let numbers = wheel(source, &mut used_main, game.main_max(), game.main_count());
            let secondary = wheel(source, &mut used_secondary, game.secondary_max(), game.secondary_count());
            let grid = Grid::new(game, numbers, secondary)?;
            let breakdown = self.scorer.score(&grid.numbers, &ctx)?;
            grids.push(CoverageGrid {
                numbers: grid.numbers,
                secondary: grid.secondary,
                breakdown,
            });
        }

        Ok(grids)
    }

    fn predict<S: NumberSource>(&self, strategy: Strategy, source: &mut S) -> Result<Prediction> {
        let game = self.game();
        let k = game.main_count();
        let max = game.main_max();
        let mut selection = None;
        let mut base_combinations = Vec::new();

        let (numbers, number_scores) = match strategy {
            Strategy::Balanced => {
                let weights = self.balanced_weights();
                let numbers = source.sample_weighted(&weights, k)?;
                let scores = lookup(&weights, &numbers);
                (numbers, scores)
            }
            Strategy::Frequency => {
                let weights = self.stats.frequency_weights(Pool::Main);
                let numbers = source.sample_weighted(&weights, k)?;
                let scores = lookup(&weights, &numbers);
                (numbers, scores)
            }
            Strategy::Hot | Strategy::Cold => self.trend_numbers(strategy, Pool::Main, source),
            Strategy::Pattern => {
                let numbers = self.pattern_numbers(source);
                let scores = lookup(&self.stats.frequency_weights(Pool::Main), &numbers);
                (numbers, scores)
            }
            Strategy::GapBased => {
                let picked = self.gap.assemble(k, max, source);
                selection = Some((picked.confidence, picked.average_score));
                (picked.numbers, picked.scores)
            }
            Strategy::CombinationBased => {
                let picked = self.miner.assemble(&self.combinations, game, source);
                let scores = picked
                    .numbers
                    .iter()
                    .map(|&n| {
                        let best = picked
                            .used_combinations
                            .iter()
                            .filter(|c| c.numbers.contains(&n))
                            .map(|c| c.score)
                            .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));
                        (n, best.unwrap_or(PADDING_SCORE))
                    })
                    .collect();
                selection = Some((picked.confidence, picked.prediction_score));
                base_combinations = picked.used_combinations;
                (picked.numbers, scores)
            }
        };

        let secondary = match strategy {
            Strategy::Balanced => {
                let weights = self.balanced_secondary_weights();
                source.sample_weighted(&weights, game.secondary_count())?
            }
            Strategy::Hot | Strategy::Cold => self.trend_numbers(strategy, Pool::Secondary, source).0,
            Strategy::Pattern => self.pattern_secondary(source)?,
            _ => source.sample_weighted(&self.stats.frequency_weights(Pool::Secondary), game.secondary_count())?,
        };

        let grid = Grid::new(game, numbers, secondary)?;
        let breakdown = self.scorer.score(&grid.numbers, &self.scoring_context())?;
        let mut number_scores = number_scores;
        number_scores.sort_by_key(|&(n, _)| n);

        Ok(Prediction {
            numbers: grid.numbers,
            secondary: grid.secondary,
            strategy,
            rating: breakdown.rating,
            breakdown,
            number_scores,
            selection_confidence: selection.map(|(c, _)| c),
            selection_score: selection.map(|(_, s)| s),
            base_combinations,
        })
    }

    fn balanced_weights(&self) -> Vec<(u8, f64)> {
        let gen = &self.config.generator;
        let hot: Vec<u8> = self.stats.main_trends.hot_numbers(gen.hot_bonus_count);
        let in_combinations = self.combinations.top_numbers(gen.combination_bonus_count);

        self.stats
            .frequency_weights(Pool::Main)
            .into_iter()
            .map(|(n, mut w)| {
                if hot.contains(&n) {
                    w *= gen.hot_bonus;
                }
                if in_combinations.contains(&n) {
                    w *= gen.combination_bonus;
                }
                (n, w)
            })
            .collect()
    }

    fn balanced_secondary_weights(&self) -> Vec<(u8, f64)> {
        let gen = &self.config.generator;
        let hot: Vec<u8> = self.stats.secondary_trends.hot_numbers(gen.secondary_hot_bonus_count);
        self.stats
            .frequency_weights(Pool::Secondary)
            .into_iter()
            .map(|(n, w)| if hot.contains(&n) { (n, w * gen.hot_bonus) } else { (n, w) })
            .collect()
    }

    /// Tirage uniforme parmi les numéros chauds (ou froids), complété uniformément si le pool
    /// ne suffit pas. Le score d'un numéro est sa fréquence récente (chaud) ou ancienne (froid).
    fn trend_numbers<S: NumberSource>(&self, strategy: Strategy, pool: Pool, source: &mut S) -> (Vec<u8>, Vec<(u8, f64)>) {
        let game = self.game();
        let gen = &self.config.generator;
        let limit = match pool {
            Pool::Main => gen.hot_cold_pool,
            Pool::Secondary => gen.hot_cold_secondary_pool,
        };
        let trends = self.stats.trends(pool);
        let entries = if strategy == Strategy::Cold { &trends.cold } else { &trends.hot };
        let candidates: Vec<(u8, f64)> = entries
            .iter()
            .take(limit)
            .map(|e| {
                let score = if strategy == Strategy::Cold { e.older_frequency } else { e.recent_frequency };
                (e.number, score)
            })
            .collect();

        let target = pool.pick_count(game);
        let pool_numbers: Vec<u8> = candidates.iter().map(|&(n, _)| n).collect();
        let mut numbers = source.sample_uniform(&pool_numbers, target);
        if numbers.len() < target {
            log::debug!("Pool {strategy} insuffisant ({} numéros), complétion aléatoire", pool_numbers.len());
        }
        pad_uniform(source, &mut numbers, pool.max(game), target);

        let scores = numbers
            .iter()
            .map(|&n| {
                let score = candidates.iter().find(|&&(c, _)| c == n).map_or(0.0, |&(_, s)| s);
                (n, score)
            })
            .collect();
        (numbers, scores)
    }

    /// Grille respectant le nombre d'impairs et de numéros bas le plus fréquent de l'historique.
    /// Les impairs/pairs sont tirés selon le quota, puis des échanges de même parité corrigent le
    /// nombre de bas, au plus `pattern_repair_attempts` fois. Heuristique : en cas d'échec, grille
    /// uniforme.
    fn pattern_numbers<S: NumberSource>(&self, source: &mut S) -> Vec<u8> {
        let game = self.game();
        let k = game.main_count();
        let max = game.main_max();
        let all: Vec<u8> = (1..=max).collect();

        let (Some(target_odd), Some(target_low)) = (
            self.stats.patterns.most_common_odd_count(),
            self.stats.patterns.most_common_low_count(),
        ) else {
            return source.sample_uniform(&all, k);
        };

        let odds: Vec<u8> = all.iter().copied().filter(|n| n % 2 == 1).collect();
        let evens: Vec<u8> = all.iter().copied().filter(|n| n % 2 == 0).collect();
        let odd_count = target_odd.min(k);
        let mut selected = source.sample_uniform(&odds, odd_count);
        selected.extend(source.sample_uniform(&evens, k - odd_count));

        for _ in 0..self.config.generator.pattern_repair_attempts {
            let low = selected.iter().filter(|&&n| is_low(n, max)).count();
            if low == target_low {
                return selected;
            }
            let need_low = low < target_low;
            let removable: Vec<u8> = selected
                .iter()
                .copied()
                .filter(|&n| is_low(n, max) != need_low)
                .collect();
            let Some(&out) = source.sample_uniform(&removable, 1).first() else {
                break;
            };
            let replacements: Vec<u8> = all
                .iter()
                .copied()
                .filter(|&n| n % 2 == out % 2 && is_low(n, max) == need_low && !selected.contains(&n))
                .collect();
            if let Some(&inn) = source.sample_uniform(&replacements, 1).first() {
                if let Some(slot) = selected.iter_mut().find(|n| **n == out) {
                    *slot = inn;
                }
            }
        }

        let low = selected.iter().filter(|&&n| is_low(n, max)).count();
        if low == target_low {
            return selected;
        }
        log::warn!(
            "Pattern {target_odd} impairs / {target_low} bas non atteint, grille aléatoire"
        );
        source.sample_uniform(&all, k)
    }

    /// Numéros secondaires dont la somme tombe dans la tranche (basse, moyenne, haute) la plus
    /// fréquente de l'historique. Tirages pondérés par fréquence, au plus
    /// `pattern_repair_attempts` essais, puis tirage uniforme.
    fn pattern_secondary<S: NumberSource>(&self, source: &mut S) -> Result<Vec<u8>> {
        let game = self.game();
        let count = game.secondary_count();
        let max = game.secondary_max();
        let weights = self.stats.frequency_weights(Pool::Secondary);

        let Some(target) = self.stats.patterns.most_common_secondary_sum_range() else {
            return source.sample_weighted(&weights, count);
        };
        let ideal = ideal_sum(max, count);

        for _ in 0..self.config.generator.pattern_repair_attempts {
            let secondary = source.sample_weighted(&weights, count)?;
            let sum: u32 = secondary.iter().map(|&n| n as u32).sum();
            if SumRange::classify(sum, ideal) == target {
                return Ok(secondary);
            }
        }

        log::warn!("Tranche de somme secondaire {target:?} non atteinte, tirage aléatoire");
        let all: Vec<u8> = (1..=max).collect();
        Ok(source.sample_uniform(&all, count))
    }
}

fn rank(predictions: &mut [Prediction]) {
    predictions.sort_by(|a, b| {
        b.breakdown
            .total
            .partial_cmp(&a.breakdown.total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

fn lookup(weights: &[(u8, f64)], numbers: &[u8]) -> Vec<(u8, f64)> {
    numbers
        .iter()
        .map(|&n| (n, weights.iter().find(|&&(w, _)| w == n).map_or(0.0, |&(_, s)| s)))
        .collect()
}

/// Tire `count` numéros parmi ceux de [1, max] absents de `used` (réinitialisé si insuffisant).
fn wheel<S: NumberSource>(source: &mut S, used: &mut BTreeSet<u8>, max: u8, count: usize) -> Vec<u8> {
    let mut available: Vec<u8> = (1..=max).filter(|n| !used.contains(n)).collect();
    if available.len() < count {
        used.clear();
        available = (1..=max).collect();
    }
    let picked = source.sample_uniform(&available, count);
    used.extend(picked.iter().copied());
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use chrono::{Days, NaiveDate};
    use loterie_data::history::make_test_history;
    use loterie_data::models::validate_draw;
    use loterie_data::DrawRecord;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Historique pseudo-aléatoire reproductible.
    fn random_history(game: GameType, n: usize, seed: u64) -> DrawHistory {
        let mut rng = StdRng::seed_from_u64(seed);
        let start = NaiveDate::from_ymd_opt(2020, 1, 3).unwrap();
        let main: Vec<u8> = (1..=game.main_max()).collect();
        let secondary: Vec<u8> = (1..=game.secondary_max()).collect();
        let draws = (0..n)
            .map(|i| {
                DrawRecord::new(
                    game,
                    start + Days::new(3 * i as u64),
                    rng.sample_uniform(&main, game.main_count()),
                    rng.sample_uniform(&secondary, game.secondary_count()),
                )
                .unwrap()
            })
            .collect();
        DrawHistory::new(game, draws).unwrap()
    }

    fn assert_valid(game: GameType, p: &Prediction) {
        assert!(validate_draw(game, &p.numbers, &p.secondary).is_ok(), "grille invalide: {p:?}");
        assert!(p.numbers.windows(2).all(|w| w[0] < w[1]));
        assert!((0.0..=1.0).contains(&p.breakdown.total));
        assert_eq!(p.rating, p.breakdown.rating);
        assert_eq!(p.number_scores.len(), p.numbers.len());
    }

    #[test]
    fn test_generation_valid_grids_every_strategy() {
        init_logs();
        for game in [GameType::Euromillions, GameType::Loto] {
            let history = random_history(game, 300, 17);
            let generator = PredictionGenerator::new(&history, EngineConfig::default()).unwrap();
            let mut rng = StdRng::seed_from_u64(2024);
            for strategy in Strategy::ALL {
                let predictions = generator.generate(strategy, 1000, &mut rng).unwrap();
                assert_eq!(predictions.len(), 1000);
                for p in &predictions {
                    assert_eq!(p.strategy, strategy);
                    assert_valid(game, p);
                }
            }
        }
    }

    #[test]
    fn test_generation_on_empty_history() {
        for game in [GameType::Euromillions, GameType::Loto] {
            let history = DrawHistory::new(game, vec![]).unwrap();
            let generator = PredictionGenerator::new(&history, EngineConfig::default()).unwrap();
            let mut rng = StdRng::seed_from_u64(5);
            for strategy in Strategy::ALL {
                for p in generator.generate(strategy, 50, &mut rng).unwrap() {
                    assert_valid(game, &p);
                    assert_eq!(p.breakdown.scores.frequency, 0.5);
                }
            }
        }
    }

    #[test]
    fn test_generation_on_structured_history() {
        let history = make_test_history(GameType::Euromillions, 120);
        let generator = PredictionGenerator::new(&history, EngineConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        for strategy in Strategy::ALL {
            for p in generator.generate(strategy, 200, &mut rng).unwrap() {
                assert_valid(GameType::Euromillions, &p);
            }
        }
    }

    #[test]
    fn test_predictions_ranked_by_total() {
        let history = random_history(GameType::Euromillions, 150, 3);
        let generator = PredictionGenerator::new(&history, EngineConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        let predictions = generator.generate(Strategy::Balanced, 40, &mut rng).unwrap();
        assert!(predictions
            .windows(2)
            .all(|w| w[0].breakdown.total >= w[1].breakdown.total));
    }

    #[test]
    fn test_seeded_generation_reproducible() {
        let history = random_history(GameType::Loto, 200, 11);
        let generator = PredictionGenerator::new(&history, EngineConfig::default()).unwrap();
        for strategy in Strategy::ALL {
            let mut a = StdRng::seed_from_u64(77);
            let mut b = StdRng::seed_from_u64(77);
            let pa = generator.generate(strategy, 10, &mut a).unwrap();
            let pb = generator.generate(strategy, 10, &mut b).unwrap();
            let grids_a: Vec<_> = pa.iter().map(|p| (p.numbers.clone(), p.secondary.clone())).collect();
            let grids_b: Vec<_> = pb.iter().map(|p| (p.numbers.clone(), p.secondary.clone())).collect();
            assert_eq!(grids_a, grids_b, "stratégie {strategy}");
        }
    }

    #[test]
    fn test_pattern_strategy_follows_history() {
        // Tous les tirages : 3 impairs, 2 bas (≤ 25)
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let shapes: [[u8; 5]; 3] = [[1, 4, 27, 31, 40], [3, 10, 33, 38, 45], [5, 20, 29, 42, 47]];
        let draws = (0..30)
            .map(|i| {
                DrawRecord::new(GameType::Euromillions, start + Days::new(i as u64), shapes[i % 3].to_vec(), vec![1, 2])
                    .unwrap()
            })
            .collect();
        let history = DrawHistory::new(GameType::Euromillions, draws).unwrap();
        let generator = PredictionGenerator::new(&history, EngineConfig::default()).unwrap();

        let mut rng = StdRng::seed_from_u64(21);
        for p in generator.generate(Strategy::Pattern, 500, &mut rng).unwrap() {
            let odd = p.numbers.iter().filter(|&&n| n % 2 == 1).count();
            let low = p.numbers.iter().filter(|&&n| n <= 25).count();
            assert_eq!((odd, low), (3, 2), "grille {:?}", p.numbers);
        }
    }

    #[test]
    fn test_pattern_secondary_follows_history() {
        // Étoiles [7, 12], [8, 11], [9, 10] : somme 19, tranche haute (somme idéale 13)
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let shapes: [[u8; 5]; 3] = [[1, 4, 27, 31, 40], [3, 10, 33, 38, 45], [5, 20, 29, 42, 47]];
        let stars: [[u8; 2]; 3] = [[7, 12], [8, 11], [9, 10]];
        let draws = (0..60)
            .map(|i| {
                DrawRecord::new(
                    GameType::Euromillions,
                    start + Days::new(i as u64),
                    shapes[i % 3].to_vec(),
                    stars[i % 3].to_vec(),
                )
                .unwrap()
            })
            .collect();
        let history = DrawHistory::new(GameType::Euromillions, draws).unwrap();
        let generator = PredictionGenerator::new(&history, EngineConfig::default()).unwrap();
        assert_eq!(
            generator.stats().patterns.most_common_secondary_sum_range(),
            Some(SumRange::High)
        );

        let ideal = ideal_sum(12, 2);
        let mut rng = StdRng::seed_from_u64(4);
        let predictions = generator.generate(Strategy::Pattern, 1000, &mut rng).unwrap();
        let off_range = predictions
            .iter()
            .filter(|p| {
                let sum: u32 = p.secondary.iter().map(|&n| n as u32).sum();
                SumRange::classify(sum, ideal) != SumRange::High
            })
            .count();
        assert_eq!(off_range, 0);
    }

    #[test]
    fn test_selection_confidence_and_base_combinations() {
        let history = random_history(GameType::Euromillions, 300, 17);
        let generator = PredictionGenerator::new(&history, EngineConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(12);

        for p in generator.generate(Strategy::GapBased, 20, &mut rng).unwrap() {
            let score = p.selection_score.unwrap();
            assert_eq!(p.selection_confidence, Some(Confidence::from_score(score)));
            assert!(p.base_combinations.is_empty());
        }

        for p in generator.generate(Strategy::CombinationBased, 20, &mut rng).unwrap() {
            assert!(p.selection_confidence.is_some());
            assert!(p.selection_score.is_some());
            assert!(!p.base_combinations.is_empty());
            for combo in &p.base_combinations {
                assert!(combo.numbers.iter().all(|n| p.numbers.contains(n)), "{combo:?} hors de {:?}", p.numbers);
            }
        }

        for p in generator.generate(Strategy::Frequency, 20, &mut rng).unwrap() {
            assert!(p.selection_confidence.is_none());
            assert!(p.selection_score.is_none());
            assert!(p.base_combinations.is_empty());
        }
    }

    #[test]
    fn test_daily_source_uses_reference_date() {
        let history = random_history(GameType::Loto, 50, 2).with_as_of(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        let generator = PredictionGenerator::new(&history, EngineConfig::default()).unwrap();
        let a = generator.generate(Strategy::Balanced, 5, &mut generator.daily_source()).unwrap();
        let b = generator.generate(Strategy::Balanced, 5, &mut StdRng::seed_from_u64(20_250_602)).unwrap();
        fn grids(ps: &[Prediction]) -> Vec<Vec<u8>> {
            ps.iter().map(|p| p.numbers.clone()).collect()
        }
        assert_eq!(grids(&a), grids(&b));

        let config = EngineConfig {
            generator: GeneratorConfig {
                seed: Some(7),
                ..GeneratorConfig::default()
            },
            ..EngineConfig::default()
        };
        let seeded = PredictionGenerator::new(&history, config).unwrap();
        let c = seeded.generate(Strategy::Balanced, 5, &mut seeded.daily_source()).unwrap();
        let d = seeded.generate(Strategy::Balanced, 5, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(grids(&c), grids(&d));
    }

    #[test]
    fn test_gap_based_picks_top_scores() {
        let history = make_test_history(GameType::Euromillions, 57);
        let generator = PredictionGenerator::new(&history, EngineConfig::default()).unwrap();
        let mut expected: Vec<u8> = generator
            .gap_analysis()
            .ranked_numbers()
            .iter()
            .take(5)
            .map(|&(n, _)| n)
            .collect();
        expected.sort_unstable();

        let mut rng = StdRng::seed_from_u64(1);
        for p in generator.generate(Strategy::GapBased, 5, &mut rng).unwrap() {
            assert_eq!(p.numbers, expected);
        }
    }

    #[test]
    fn test_hot_strategy_uses_hot_pool() {
        // Anciens tirages : 1..5 ; récents : 46..50
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let draws = (0..20)
            .map(|i| {
                let numbers = if i < 10 { vec![1, 2, 3, 4, 5] } else { vec![46, 47, 48, 49, 50] };
                DrawRecord::new(GameType::Euromillions, start + Days::new(i as u64), numbers, vec![1, 2]).unwrap()
            })
            .collect();
        let history = DrawHistory::new(GameType::Euromillions, draws).unwrap();
        let config = EngineConfig {
            generator: GeneratorConfig {
                recent_window: 10,
                ..GeneratorConfig::default()
            },
            ..EngineConfig::default()
        };
        let generator = PredictionGenerator::new(&history, config).unwrap();
        let mut rng = StdRng::seed_from_u64(4);

        for p in generator.generate(Strategy::Hot, 20, &mut rng).unwrap() {
            assert_eq!(p.numbers, vec![46, 47, 48, 49, 50]);
            assert!(p.number_scores.iter().all(|&(_, s)| s == 1.0));
        }
        for p in generator.generate(Strategy::Cold, 20, &mut rng).unwrap() {
            assert_eq!(p.numbers, vec![1, 2, 3, 4, 5]);
        }
    }

    #[test]
    fn test_generate_mix_rotation() {
        let history = random_history(GameType::Euromillions, 120, 9);
        let generator = PredictionGenerator::new(&history, EngineConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(12);
        let predictions = generator.generate_mix(Strategy::GapBased, 7, &mut rng).unwrap();
        assert_eq!(predictions.len(), 7);

        let count = |s: Strategy| predictions.iter().filter(|p| p.strategy == s).count();
        for s in Strategy::MIX {
            assert_eq!(count(s), 1);
        }
        assert_eq!(count(Strategy::GapBased), 2);
        assert_eq!(count(Strategy::CombinationBased), 0);
    }

    #[test]
    fn test_coverage_grids_disjoint_until_reset() {
        let history = random_history(GameType::Euromillions, 60, 2);
        let generator = PredictionGenerator::new(&history, EngineConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(6);
        let grids = generator.generate_coverage(12, &mut rng).unwrap();
        assert_eq!(grids.len(), 12);

        let first_ten: BTreeSet<u8> = grids[..10].iter().flat_map(|g| g.numbers.iter().copied()).collect();
        assert_eq!(first_ten.len(), 50);
        let first_six_stars: BTreeSet<u8> = grids[..6].iter().flat_map(|g| g.secondary.iter().copied()).collect();
        assert_eq!(first_six_stars.len(), 12);
        for g in &grids {
            assert!(validate_draw(GameType::Euromillions, &g.numbers, &g.secondary).is_ok());
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let history = make_test_history(GameType::Loto, 10);
        let mut config = EngineConfig::default();
        config.generator.pattern_repair_attempts = 0;
        assert!(PredictionGenerator::new(&history, config).is_err());
    }

    #[test]
    fn test_zero_count() {
        let history = make_test_history(GameType::Loto, 10);
        let generator = PredictionGenerator::new(&history, EngineConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(generator.generate(Strategy::Hot, 0, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn test_strategy_serde_and_display() {
        assert_eq!(serde_json::to_string(&Strategy::GapBased).unwrap(), "\"gap_based\"");
        let s: Strategy = serde_json::from_str("\"combination_based\"").unwrap();
        assert_eq!(s, Strategy::CombinationBased);
        assert_eq!(Strategy::Balanced.to_string(), "balanced");
    }
}
