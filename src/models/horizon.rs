// ============================================================================
// Enum : Horizon
// ============================================================================
// Horizon de prévision sélectionnable dans l'interface
//
// CONCEPT : Sélection purement locale
// - Changer d'horizon ne déclenche aucun appel réseau
// - Seule la demande explicite de prévision ([f]) l'envoie au backend
// ============================================================================

/// Horizon de prévision (en heures)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Horizon {
    /// 1 heure
    H1,
    /// 3 heures
    H3,
    /// 24 heures
    H24,
    /// 72 heures
    H72,
}

impl Horizon {
    /// Nombre d'heures (valeur envoyée au backend)
    pub fn hours(&self) -> u32 {
        match self {
            Horizon::H1 => 1,
            Horizon::H3 => 3,
            Horizon::H24 => 24,
            Horizon::H72 => 72,
        }
    }

    /// Label pour le sélecteur
    pub fn label(&self) -> &'static str {
        match self {
            Horizon::H1 => "1 Hour",
            Horizon::H3 => "3 Hours",
            Horizon::H24 => "24 Hours",
            Horizon::H72 => "72 Hours",
        }
    }

    /// Tous les horizons, dans l'ordre du sélecteur
    pub fn all() -> [Horizon; 4] {
        [Horizon::H1, Horizon::H3, Horizon::H24, Horizon::H72]
    }

    /// Horizon à la position `index` (0-based) du sélecteur
    pub fn from_index(index: usize) -> Option<Horizon> {
        Self::all().get(index).copied()
    }

    /// Horizon suivant (cycle)
    pub fn next(&self) -> Horizon {
        match self {
            Horizon::H1 => Horizon::H3,
            Horizon::H3 => Horizon::H24,
            Horizon::H24 => Horizon::H72,
            Horizon::H72 => Horizon::H1, // Boucle
        }
    }

    /// Horizon précédent (cycle)
    pub fn previous(&self) -> Horizon {
        match self {
            Horizon::H1 => Horizon::H72, // Boucle
            Horizon::H3 => Horizon::H1,
            Horizon::H24 => Horizon::H3,
            Horizon::H72 => Horizon::H24,
        }
    }
}

impl Default for Horizon {
    /// 24 heures par défaut
    fn default() -> Self {
        Horizon::H24
    }
}
