use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The fixed catalogue of risk categories an inspected site may exhibit.
/// Serialized with the Italian label used as the record key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Hazard {
    #[serde(rename = "Scivolamento e cadute a livello")]
    SlipsAndFalls,
    #[serde(rename = "Cadute dall'alto")]
    FallsFromHeight,
    #[serde(rename = "Urti, colpi, impatti, compressioni")]
    Impacts,
    #[serde(rename = "Tagli, punture, abrasioni")]
    Cuts,
    #[serde(rename = "Schiacciamento")]
    Crushing,
    #[serde(rename = "Elettrico")]
    Electrical,
    #[serde(rename = "Rumore")]
    Noise,
    #[serde(rename = "Vibrazioni")]
    Vibration,
    #[serde(rename = "Rischio chimico")]
    Chemical,
    #[serde(rename = "Movimentazione Manuale Carichi (MMC)")]
    ManualHandling,
    #[serde(rename = "Videoterminali (VDT)")]
    DisplayScreens,
    #[serde(rename = "Lavori in quota")]
    WorkAtHeight,
    #[serde(rename = "Incendio ed esplosione")]
    FireAndExplosion,
    #[serde(rename = "Biologico")]
    Biological,
    #[serde(rename = "Radiazioni")]
    Radiation,
    #[serde(rename = "Microclima")]
    Microclimate,
    #[serde(rename = "Illuminazione")]
    Lighting,
    #[serde(rename = "Stress lavoro-correlato")]
    WorkStress,
    #[serde(rename = "Posture incongrue")]
    AwkwardPostures,
    #[serde(rename = "Lavoro notturno")]
    NightWork,
    #[serde(rename = "Lavoro solitario")]
    LoneWork,
    #[serde(rename = "Differenze di genere, età, provenienza")]
    GenderAgeOrigin,
}

impl Hazard {
    pub const ALL: [Hazard; 22] = [
        Hazard::SlipsAndFalls,
        Hazard::FallsFromHeight,
        Hazard::Impacts,
        Hazard::Cuts,
        Hazard::Crushing,
        Hazard::Electrical,
        Hazard::Noise,
        Hazard::Vibration,
        Hazard::Chemical,
        Hazard::ManualHandling,
        Hazard::DisplayScreens,
        Hazard::WorkAtHeight,
        Hazard::FireAndExplosion,
        Hazard::Biological,
        Hazard::Radiation,
        Hazard::Microclimate,
        Hazard::Lighting,
        Hazard::WorkStress,
        Hazard::AwkwardPostures,
        Hazard::NightWork,
        Hazard::LoneWork,
        Hazard::GenderAgeOrigin,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Hazard::SlipsAndFalls => "Scivolamento e cadute a livello",
            Hazard::FallsFromHeight => "Cadute dall'alto",
            Hazard::Impacts => "Urti, colpi, impatti, compressioni",
            Hazard::Cuts => "Tagli, punture, abrasioni",
            Hazard::Crushing => "Schiacciamento",
            Hazard::Electrical => "Elettrico",
            Hazard::Noise => "Rumore",
            Hazard::Vibration => "Vibrazioni",
            Hazard::Chemical => "Rischio chimico",
            Hazard::ManualHandling => "Movimentazione Manuale Carichi (MMC)",
            Hazard::DisplayScreens => "Videoterminali (VDT)",
            Hazard::WorkAtHeight => "Lavori in quota",
            Hazard::FireAndExplosion => "Incendio ed esplosione",
            Hazard::Biological => "Biologico",
            Hazard::Radiation => "Radiazioni",
            Hazard::Microclimate => "Microclima",
            Hazard::Lighting => "Illuminazione",
            Hazard::WorkStress => "Stress lavoro-correlato",
            Hazard::AwkwardPostures => "Posture incongrue",
            Hazard::NightWork => "Lavoro notturno",
            Hazard::LoneWork => "Lavoro solitario",
            Hazard::GenderAgeOrigin => "Differenze di genere, età, provenienza",
        }
    }
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hazard label: {0}")]
pub struct UnknownHazard(pub String);

impl FromStr for Hazard {
    type Err = UnknownHazard;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Hazard::ALL
            .iter()
            .copied()
            .find(|h| h.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownHazard(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardEntry {
    pub presente: bool,
    #[serde(default)]
    pub note: String,
}

/// Selected hazards. A key is present only while the hazard is selected and
/// its entry always carries `presente: true`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Hazard, HazardEntry>")]
pub struct HazardMap(BTreeMap<Hazard, HazardEntry>);

impl From<BTreeMap<Hazard, HazardEntry>> for HazardMap {
    fn from(entries: BTreeMap<Hazard, HazardEntry>) -> Self {
        // stored rows written by older clients may carry unselected entries
        Self(entries.into_iter().filter(|(_, e)| e.presente).collect())
    }
}

impl HazardMap {
    /// Selecting an already selected hazard keeps its notes.
    pub fn select(&mut self, hazard: Hazard) -> &HazardEntry {
        self.0.entry(hazard).or_insert_with(|| HazardEntry {
            presente: true,
            note: String::new(),
        })
    }

    /// Returns false when the hazard is not selected; notes are only editable
    /// on selected hazards.
    pub fn set_note(&mut self, hazard: Hazard, note: impl Into<String>) -> bool {
        match self.0.get_mut(&hazard) {
            Some(entry) => {
                entry.note = note.into();
                true
            }
            None => false,
        }
    }

    /// Drops the entry and its notes.
    pub fn deselect(&mut self, hazard: Hazard) -> Option<HazardEntry> {
        self.0.remove(&hazard)
    }

    pub fn get(&self, hazard: Hazard) -> Option<&HazardEntry> {
        self.0.get(&hazard)
    }

    pub fn contains(&self, hazard: Hazard) -> bool {
        self.0.contains_key(&hazard)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Hazard, &HazardEntry)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
