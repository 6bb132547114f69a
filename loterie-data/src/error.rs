use thiserror::Error;

use crate::models::Pool;

/// Violation du contrat d'entrée : tirage ou grille mal formé.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{pool} : {found} numéros fournis, {expected} attendus")]
    WrongCardinality {
        pool: Pool,
        expected: usize,
        found: usize,
    },

    #[error("{pool} : numéro {number} hors limites (1-{max})")]
    OutOfRange { pool: Pool, number: u8, max: u8 },

    #[error("{pool} : numéro en double : {number}")]
    Duplicate { pool: Pool, number: u8 },
}

pub type Result<T> = std::result::Result<T, ValidationError>;
