use serde::Serialize;

/// Niveau de confiance d'une sélection, dérivé du score moyen des éléments retenus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    VeryLow,
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn from_score(score: f64) -> Self {
        if score > 0.7 {
            Confidence::High
        } else if score > 0.5 {
            Confidence::Medium
        } else if score > 0.3 {
            Confidence::Low
        } else {
            Confidence::VeryLow
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "Élevée"),
            Confidence::Medium => write!(f, "Moyenne"),
            Confidence::Low => write!(f, "Faible"),
            Confidence::VeryLow => write!(f, "Très faible"),
        }
    }
}

/// Appréciation d'une grille à partir de son score total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GridRating {
    VeryWeak,
    Weak,
    Average,
    Good,
    VeryGood,
    Excellent,
}

impl GridRating {
    pub fn from_total(total: f64) -> Self {
        if total >= 0.8 {
            GridRating::Excellent
        } else if total >= 0.7 {
            GridRating::VeryGood
        } else if total >= 0.6 {
            GridRating::Good
        } else if total >= 0.5 {
            GridRating::Average
        } else if total >= 0.4 {
            GridRating::Weak
        } else {
            GridRating::VeryWeak
        }
    }
}

impl std::fmt::Display for GridRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridRating::Excellent => write!(f, "Excellente"),
            GridRating::VeryGood => write!(f, "Très bonne"),
            GridRating::Good => write!(f, "Bonne"),
            GridRating::Average => write!(f, "Moyenne"),
            GridRating::Weak => write!(f, "Faible"),
            GridRating::VeryWeak => write!(f, "Très faible"),
        }
    }
}
