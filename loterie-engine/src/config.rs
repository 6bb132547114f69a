use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Borne haute de la taille des combinaisons (coût combinatoire maîtrisé).
pub const MAX_COMBINATION_SIZE: usize = 4;

const WEIGHT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapUnit {
    /// Écarts comptés en nombre de tirages
    Draws,
    /// Écarts comptés en jours calendaires
    Days,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    pub unit: GapUnit,
    pub overdue_weight: f64,
    pub frequency_weight: f64,
    pub stability_weight: f64,
    /// Nombre d'apparitions à partir duquel le terme de fréquence sature à 1.
    pub frequency_saturation: f64,
    /// Facteur de retard au-delà duquel un numéro est compté « en retard ».
    pub overdue_threshold: f64,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            unit: GapUnit::Draws,
            overdue_weight: 0.4,
            frequency_weight: 0.3,
            stability_weight: 0.3,
            frequency_saturation: 50.0,
            overdue_threshold: 1.5,
        }
    }
}

impl GapConfig {
    pub fn validate(&self) -> Result<()> {
        let weights = [self.overdue_weight, self.frequency_weight, self.stability_weight];
        check_weights("score de prédiction des écarts", &weights)?;
        if !(self.frequency_saturation > 0.0) {
            return Err(EngineError::Config(format!(
                "frequency_saturation doit être > 0 (reçu {})",
                self.frequency_saturation
            )));
        }
        if !(self.overdue_threshold > 0.0) {
            return Err(EngineError::Config(format!(
                "overdue_threshold doit être > 0 (reçu {})",
                self.overdue_threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinationConfig {
    pub min_size: usize,
    pub max_size: usize,
    /// score = fréquence × size^(-rarity_exponent) × score_scale, borné à 1
    pub rarity_exponent: f64,
    pub score_scale: f64,
}

impl Default for CombinationConfig {
    fn default() -> Self {
        Self {
            min_size: 2,
            max_size: 4,
            rarity_exponent: 1.0,
            score_scale: 100.0,
        }
    }
}

impl CombinationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_size == 0 || self.min_size > self.max_size || self.max_size > MAX_COMBINATION_SIZE {
            return Err(EngineError::Config(format!(
                "tailles de combinaison invalides [{}, {}] (attendu 1 <= min <= max <= {})",
                self.min_size, self.max_size, MAX_COMBINATION_SIZE
            )));
        }
        if !self.rarity_exponent.is_finite() || self.rarity_exponent < 0.0 {
            return Err(EngineError::Config(format!(
                "rarity_exponent invalide : {}",
                self.rarity_exponent
            )));
        }
        if !(self.score_scale > 0.0) || !self.score_scale.is_finite() {
            return Err(EngineError::Config(format!("score_scale invalide : {}", self.score_scale)));
        }
        Ok(())
    }
}

/// Poids des six composantes du score de grille. Leur somme doit valoir 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub gap: f64,
    pub combination: f64,
    pub frequency: f64,
    pub distribution: f64,
    pub pattern: f64,
    pub balance: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            gap: 0.25,
            combination: 0.20,
            frequency: 0.15,
            distribution: 0.15,
            pattern: 0.15,
            balance: 0.10,
        }
    }
}

impl ScoringWeights {
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

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    pub fn validate(&self) -> Result<()> {
        check_weights("poids de scoring", &self.as_array())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Taille de la fenêtre récente pour la comparaison chaud/froid.
    pub recent_window: usize,
    pub hot_cold_pool: usize,
    pub hot_cold_secondary_pool: usize,
    pub hot_bonus: f64,
    pub hot_bonus_count: usize,
    pub secondary_hot_bonus_count: usize,
    pub combination_bonus: f64,
    pub combination_bonus_count: usize,
    /// Nombre maximal d'échanges pour satisfaire un pattern pair/impair + bas/haut.
    pub pattern_repair_attempts: usize,
    /// Seed de [`PredictionGenerator::daily_source`](crate::generator::PredictionGenerator::daily_source) ;
    /// à défaut, seed YYYYMMDD de la date de référence de l'historique.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            recent_window: 50,
            hot_cold_pool: 15,
            hot_cold_secondary_pool: 6,
            hot_bonus: 1.5,
            hot_bonus_count: 10,
            secondary_hot_bonus_count: 5,
            combination_bonus: 1.2,
            combination_bonus_count: 20,
            pattern_repair_attempts: 32,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.recent_window == 0 {
            return Err(EngineError::Config("recent_window doit être > 0".into()));
        }
        if self.pattern_repair_attempts == 0 {
            return Err(EngineError::Config("pattern_repair_attempts doit être > 0".into()));
        }
        for (name, bonus) in [("hot_bonus", self.hot_bonus), ("combination_bonus", self.combination_bonus)] {
            if !bonus.is_finite() || bonus <= 0.0 {
                return Err(EngineError::Config(format!("{name} doit être > 0 (reçu {bonus})")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub gap: GapConfig,
    pub combination: CombinationConfig,
    pub weights: ScoringWeights,
    pub generator: GeneratorConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.gap.validate()?;
        self.combination.validate()?;
        self.weights.validate()?;
        self.generator.validate()
    }
}

fn check_weights(label: &str, weights: &[f64]) -> Result<()> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(EngineError::Config(format!("{label} : poids négatif ou non fini {weights:?}")));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(EngineError::Config(format!("{label} : la somme des poids vaut {sum}, 1.0 attendu")));
    }
    Ok(())
}

pub fn save_config(config: &EngineConfig, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json).with_context(|| format!("Impossible d'écrire {:?}", path))?;
    Ok(())
}

/// Charge une configuration JSON (champs absents = valeurs par défaut) et la valide.
pub fn load_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let json = std::fs::read_to_string(path).with_context(|| format!("Impossible de lire {:?}", path))?;
    let config: EngineConfig =
        serde_json::from_str(&json).with_context(|| format!("JSON invalide dans {:?}", path))?;
    config.validate()?;
    Ok(config)
}
