//! Risk-assessment document generation. Not available yet; the outcome type
//! is what callers code against until it is.

use crate::domain::models::Checklist;
use serde::Serialize;

pub const NOT_YET_AVAILABLE: &str =
    "La generazione automatica del DVR è in fase di sviluppo e non è ancora disponibile";

/// Counts shown next to the generate action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DvrPreview {
    pub ragione_sociale: String,
    pub dipendenti: usize,
    pub luoghi_lavoro: usize,
    pub attrezzature: usize,
    pub mansioni: usize,
    pub rischi: usize,
    pub non_conformita: usize,
    pub servizi_offerta: usize,
}

impl DvrPreview {
    pub fn of(checklist: &Checklist) -> Self {
        let survey = &checklist.survey;
        let completion = &checklist.completion;
        Self {
            ragione_sociale: survey.ragione_sociale.clone(),
            dipendenti: survey.dipendenti.len(),
            luoghi_lavoro: survey.luoghi_lavoro.len(),
            attrezzature: survey.attrezzature.len(),
            mansioni: completion.mansioni.len(),
            rischi: survey.rischi_selezionati.len(),
            non_conformita: survey.non_conformita.len(),
            servizi_offerta: completion.servizi_offerta.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DvrOutcome {
    NotYetAvailable { message: String, preview: DvrPreview },
}

/// Takes the whole aggregate and never mutates it.
pub fn generate_dvr(checklist: &Checklist) -> DvrOutcome {
    tracing::info!(
        "DVR requested for {} (complete: {}), generation not yet available",
        checklist.survey.ragione_sociale,
        checklist.is_complete()
    );
    DvrOutcome::NotYetAvailable {
        message: NOT_YET_AVAILABLE.to_string(),
        preview: DvrPreview::of(checklist),
    }
}
