use thiserror::Error;

use loterie_data::ValidationError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Grille invalide : {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration invalide : {0}")]
    Config(String),

    #[error("Échantillonnage impossible : {0}")]
    Sampling(#[from] rand::distr::weighted::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
