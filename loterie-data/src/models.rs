use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    /// 5 numéros (1-50) + 2 étoiles (1-12)
    Euromillions,
    /// 6 numéros (1-49) + 1 complémentaire (1-45)
    Loto,
}

impl GameType {
    pub fn main_max(&self) -> u8 {
        match self {
            GameType::Euromillions => 50,
            GameType::Loto => 49,
        }
    }

    pub fn main_count(&self) -> usize {
        match self {
            GameType::Euromillions => 5,
            GameType::Loto => 6,
        }
    }

    pub fn secondary_max(&self) -> u8 {
        match self {
            GameType::Euromillions => 12,
            GameType::Loto => 45,
        }
    }

    pub fn secondary_count(&self) -> usize {
        match self {
            GameType::Euromillions => 2,
            GameType::Loto => 1,
        }
    }
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameType::Euromillions => write!(f, "euromillions"),
            GameType::Loto => write!(f, "loto"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pool {
    Main,
    Secondary,
}

impl Pool {
    pub fn size(&self, game: GameType) -> usize {
        self.max(game) as usize
    }

    pub fn max(&self, game: GameType) -> u8 {
        match self {
            Pool::Main => game.main_max(),
            Pool::Secondary => game.secondary_max(),
        }
    }

    pub fn pick_count(&self, game: GameType) -> usize {
        match self {
            Pool::Main => game.main_count(),
            Pool::Secondary => game.secondary_count(),
        }
    }

    pub fn numbers_from<'a>(&self, draw: &'a DrawRecord) -> &'a [u8] {
        match self {
            Pool::Main => &draw.numbers,
            Pool::Secondary => &draw.secondary,
        }
    }
}

impl std::fmt::Display for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pool::Main => write!(f, "Numéros"),
            Pool::Secondary => write!(f, "Numéros secondaires"),
        }
    }
}

/// Un tirage historique. Immuable : les champs ne sont accessibles qu'en lecture
/// pour préserver les invariants vérifiés à la construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawRecord {
    date: NaiveDate,
    numbers: Vec<u8>,
    secondary: Vec<u8>,
}

impl DrawRecord {
    pub fn new(game: GameType, date: NaiveDate, numbers: Vec<u8>, secondary: Vec<u8>) -> Result<Self> {
        validate_draw(game, &numbers, &secondary)?;
        Ok(Self::sorted(date, numbers, secondary))
    }

    /// Tirage sans numéros secondaires (historiques partiels).
    pub fn main_only(game: GameType, date: NaiveDate, numbers: Vec<u8>) -> Result<Self> {
        validate_numbers(&numbers, Pool::Main, game)?;
        Ok(Self::sorted(date, numbers, Vec::new()))
    }

    fn sorted(date: NaiveDate, mut numbers: Vec<u8>, mut secondary: Vec<u8>) -> Self {
        numbers.sort_unstable();
        secondary.sort_unstable();
        Self { date, numbers, secondary }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn numbers(&self) -> &[u8] {
        &self.numbers
    }

    pub fn secondary(&self) -> &[u8] {
        &self.secondary
    }
}

/// Grille candidate (numéros + numéros secondaires), triée.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    pub numbers: Vec<u8>,
    pub secondary: Vec<u8>,
}

impl Grid {
    pub fn new(game: GameType, mut numbers: Vec<u8>, mut secondary: Vec<u8>) -> Result<Self> {
        validate_draw(game, &numbers, &secondary)?;
        numbers.sort_unstable();
        secondary.sort_unstable();
        Ok(Self { numbers, secondary })
    }
}

pub fn validate_numbers(numbers: &[u8], pool: Pool, game: GameType) -> Result<()> {
    let expected = pool.pick_count(game);
    if numbers.len() != expected {
        return Err(ValidationError::WrongCardinality {
            pool,
            expected,
            found: numbers.len(),
        });
    }
    let max = pool.max(game);
    for &n in numbers {
        if n < 1 || n > max {
            return Err(ValidationError::OutOfRange { pool, number: n, max });
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                return Err(ValidationError::Duplicate { pool, number: numbers[i] });
            }
        }
    }
    Ok(())
}

pub fn validate_draw(game: GameType, numbers: &[u8], secondary: &[u8]) -> Result<()> {
    validate_numbers(numbers, Pool::Main, game)?;
    validate_numbers(secondary, Pool::Secondary, game)
}

/// Une grille à scorer ne porte que les numéros principaux.
pub fn validate_grid(game: GameType, numbers: &[u8]) -> Result<()> {
    validate_numbers(numbers, Pool::Main, game)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    #[test]
    fn test_validate_draw_ok() {
        assert!(validate_draw(GameType::Euromillions, &[1, 2, 3, 4, 5], &[1, 2]).is_ok());
        assert!(validate_draw(GameType::Euromillions, &[50, 49, 48, 47, 46], &[11, 12]).is_ok());
        assert!(validate_draw(GameType::Loto, &[1, 2, 3, 4, 5, 49], &[45]).is_ok());
    }

    #[test]
    fn test_validate_draw_out_of_range() {
        assert_eq!(
            validate_draw(GameType::Euromillions, &[0, 2, 3, 4, 5], &[1, 2]),
            Err(ValidationError::OutOfRange { pool: Pool::Main, number: 0, max: 50 })
        );
        assert!(validate_draw(GameType::Euromillions, &[1, 2, 3, 4, 51], &[1, 2]).is_err());
        assert!(validate_draw(GameType::Loto, &[1, 2, 3, 4, 5, 50], &[1]).is_err());
        assert_eq!(
            validate_draw(GameType::Euromillions, &[1, 2, 3, 4, 5], &[1, 13]),
            Err(ValidationError::OutOfRange { pool: Pool::Secondary, number: 13, max: 12 })
        );
    }

    #[test]
    fn test_validate_draw_duplicates() {
        assert_eq!(
            validate_draw(GameType::Euromillions, &[1, 1, 3, 4, 5], &[1, 2]),
            Err(ValidationError::Duplicate { pool: Pool::Main, number: 1 })
        );
        assert!(validate_draw(GameType::Euromillions, &[1, 2, 3, 4, 5], &[3, 3]).is_err());
    }

    #[test]
    fn test_validate_grid_cardinality() {
        assert_eq!(
            validate_grid(GameType::Loto, &[1, 2, 3, 4, 5]),
            Err(ValidationError::WrongCardinality { pool: Pool::Main, expected: 6, found: 5 })
        );
    }

    #[test]
    fn test_pool_size_and_pick_count() {
        assert_eq!(Pool::Main.size(GameType::Euromillions), 50);
        assert_eq!(Pool::Secondary.size(GameType::Euromillions), 12);
        assert_eq!(Pool::Main.size(GameType::Loto), 49);
        assert_eq!(Pool::Secondary.size(GameType::Loto), 45);
        assert_eq!(Pool::Main.pick_count(GameType::Loto), 6);
        assert_eq!(Pool::Secondary.pick_count(GameType::Euromillions), 2);
    }

    #[test]
    fn test_draw_record_sorted() {
        let draw = DrawRecord::new(GameType::Euromillions, date(), vec![42, 7, 13, 1, 25], vec![9, 2]).unwrap();
        assert_eq!(draw.numbers(), &[1, 7, 13, 25, 42]);
        assert_eq!(Pool::Secondary.numbers_from(&draw), &[2, 9]);
    }

    #[test]
    fn test_draw_record_main_only() {
        let draw = DrawRecord::main_only(GameType::Loto, date(), vec![6, 5, 4, 3, 2, 1]).unwrap();
        assert!(draw.secondary().is_empty());
        assert!(DrawRecord::main_only(GameType::Loto, date(), vec![1, 2, 3]).is_err());
    }

    #[test]
    fn test_error_message() {
        let err = validate_grid(GameType::Euromillions, &[1, 2, 3, 4, 60]).unwrap_err();
        assert_eq!(err.to_string(), "Numéros : numéro 60 hors limites (1-50)");
    }

    #[test]
    fn test_game_type_serde() {
        let json = serde_json::to_string(&GameType::Euromillions).unwrap();
        assert_eq!(json, "\"euromillions\"");
        let back: GameType = serde_json::from_str("\"loto\"").unwrap();
        assert_eq!(back, GameType::Loto);
    }
}
