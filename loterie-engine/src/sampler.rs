use chrono::{Datelike, NaiveDate};
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;

/// Seed YYYYMMDD d'une date : les mêmes grilles pour un même jour de référence.
pub fn date_seed(date: NaiveDate) -> u64 {
    date.year() as u64 * 10_000 + date.month() as u64 * 100 + date.day() as u64
}

/// Source reproductible : `seed` explicite, sinon le seed de `date`.
pub fn seeded_source(seed: Option<u64>, date: NaiveDate) -> StdRng {
    StdRng::seed_from_u64(seed.unwrap_or_else(|| date_seed(date)))
}

/// Source d'aléa injectée dans les générateurs. Implémentée pour tout `rand::Rng`,
/// ce qui permet de passer un `StdRng` seedé dans les tests.
pub trait NumberSource {
    /// Tire au plus `count` numéros distincts parmi `candidates` (numéro, poids), sans remise.
    /// Les poids nuls, négatifs ou non finis ne sont jamais tirés tant qu'il reste un poids
    /// positif ; ensuite le tirage devient uniforme sur le reste.
    fn sample_weighted(&mut self, candidates: &[(u8, f64)], count: usize) -> Result<Vec<u8>>;

    /// Tire au plus `count` numéros distincts, uniformément.
    fn sample_uniform(&mut self, candidates: &[u8], count: usize) -> Vec<u8>;
}

impl<R: Rng> NumberSource for R {
    fn sample_weighted(&mut self, candidates: &[(u8, f64)], count: usize) -> Result<Vec<u8>> {
        let mut available: Vec<(u8, f64)> = candidates
            .iter()
            .map(|&(n, w)| (n, if w.is_finite() && w > 0.0 { w } else { 0.0 }))
            .collect();
        let mut selected = Vec::with_capacity(count.min(available.len()));

        while selected.len() < count && !available.is_empty() {
            let idx = if available.iter().any(|(_, w)| *w > 0.0) {
                let dist = WeightedIndex::new(available.iter().map(|(_, w)| *w))?;
                dist.sample(self)
            } else {
                self.random_range(0..available.len())
            };
            let (number, _) = available.remove(idx);
            selected.push(number);
        }

        Ok(selected)
    }

    fn sample_uniform(&mut self, candidates: &[u8], count: usize) -> Vec<u8> {
        let amount = count.min(candidates.len());
        rand::seq::index::sample(self, candidates.len(), amount)
            .into_iter()
            .map(|i| candidates[i])
            .collect()
    }
}

/// Complète `selected` par des numéros uniformes de [1, max] non encore pris, jusqu'à `target`.
pub fn pad_uniform<S: NumberSource>(source: &mut S, selected: &mut Vec<u8>, max: u8, target: usize) {
    if selected.len() >= target {
        return;
    }
    let remaining: Vec<u8> = (1..=max).filter(|n| !selected.contains(n)).collect();
    let extra = source.sample_uniform(&remaining, target - selected.len());
    selected.extend(extra);
}
