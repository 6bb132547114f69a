use chrono::{Days, NaiveDate};

use crate::error::Result;
use crate::models::{validate_numbers, DrawRecord, GameType, Pool};

/// Historique immuable des tirages d'un jeu, trié chronologiquement
/// (draws[0] = le plus ancien).
#[derive(Debug, Clone)]
pub struct DrawHistory {
    game: GameType,
    draws: Vec<DrawRecord>,
    as_of: NaiveDate,
}

impl DrawHistory {
    /// Les tirages sont revalidés contre le jeu puis triés par date (tri stable).
    /// La date de référence vaut la date du jour.
    pub fn new(game: GameType, mut draws: Vec<DrawRecord>) -> Result<Self> {
        for draw in &draws {
            validate_numbers(draw.numbers(), Pool::Main, game)?;
            if !draw.secondary().is_empty() {
                validate_numbers(draw.secondary(), Pool::Secondary, game)?;
            }
        }
        draws.sort_by_key(|d| d.date());
        Ok(Self {
            game,
            draws,
            as_of: chrono::Local::now().date_naive(),
        })
    }

    /// Fixe la date de référence (« maintenant ») pour des calculs reproductibles.
    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn game(&self) -> GameType {
        self.game
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// Les `n` tirages les plus récents, en ordre chronologique.
    pub fn last(&self, n: usize) -> &[DrawRecord] {
        let start = self.draws.len().saturating_sub(n);
        &self.draws[start..]
    }

    /// Sépare l'historique en (anciens, récents) ; la fenêtre récente contient au plus `window` tirages.
    pub fn split_recent(&self, window: usize) -> (&[DrawRecord], &[DrawRecord]) {
        let start = self.draws.len().saturating_sub(window);
        self.draws.split_at(start)
    }

    /// Nombre d'apparitions par numéro (index = numéro - 1).
    pub fn frequencies(&self, pool: Pool) -> Vec<u32> {
        count_numbers(&self.draws, pool, self.game)
    }
}

pub fn count_numbers(draws: &[DrawRecord], pool: Pool, game: GameType) -> Vec<u32> {
    let size = pool.size(game);
    let mut counts = vec![0u32; size];
    for draw in draws {
        for &n in pool.numbers_from(draw) {
            let idx = (n - 1) as usize;
            if idx < size {
                counts[idx] += 1;
            }
        }
    }
    counts
}

/// Historique synthétique déterministe : un tirage tous les 3 jours à partir du 2024-01-01,
/// date de référence = 3 jours après le dernier tirage.
pub fn make_test_history(game: GameType, n: usize) -> DrawHistory {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN);
    let main_count = game.main_count() as u8;
    let step = game.main_max() / 10;
    let secondary_max = game.secondary_max();

    let draws = (0..n)
        .filter_map(|i| {
            let base = (i % 10) as u8;
            let numbers: Vec<u8> = (1..=main_count).map(|k| base * step + k).collect();
            let secondary: Vec<u8> = (0..game.secondary_count() as u8)
                .map(|j| (base + j) % secondary_max + 1)
                .collect();
            let date = start.checked_add_days(Days::new(3 * i as u64))?;
            DrawRecord::new(game, date, numbers, secondary).ok()
        })
        .collect();

    let as_of = start
        .checked_add_days(Days::new(3 * n as u64))
        .unwrap_or(start);

    DrawHistory {
        game,
        draws,
        as_of,
    }
}
