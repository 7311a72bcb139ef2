//! The editing session for one checklist: the in-memory draft, the two save
//! checkpoints and the list mutations that happen between saves.

use crate::db::ChecklistStore;
use crate::domain::hazards::Hazard;
use crate::domain::models::{
    Checklist, ChecklistId, ChecklistStatus, ChecklistSummary, CompletionData, Employee,
    Equipment, FireSafetyCheck, FireSafetyScia, FireTrainingLevel, FirstAidGroup,
    ImprovementAction, JobRole, NonConformity, RsppType, Site, SurveyData,
};
use crate::domain::offer::{ServiceDetail, ServiceOffer};
use crate::domain::record::{from_record, merge, strip_server_owned, to_record, Record};
use crate::error::ChecklistError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const RECENT_LIMIT: usize = 10;

/// Scalar survey fields typed in on site. The survey lists (sites, employees,
/// equipment, hazards, non-conformities) come from the draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyForm {
    pub ragione_sociale: String,
    pub ateco: String,
    pub sede: String,
    pub n_dipendenti: u32,
    pub datore_lavoro: String,
    pub rspp: RsppType,
    pub soggetta_scia_antincendio: FireSafetyScia,
    pub verifica_antincendio: Option<FireSafetyCheck>,
    pub note_sopralluogo: String,
}

impl SurveyForm {
    fn apply(self, survey: &mut SurveyData) {
        survey.ragione_sociale = self.ragione_sociale.trim().to_string();
        survey.ateco = self.ateco;
        survey.sede = self.sede;
        survey.n_dipendenti = self.n_dipendenti;
        survey.datore_lavoro.nome = self.datore_lavoro;
        survey.rspp.tipo = self.rspp;
        survey.soggetta_scia_antincendio = self.soggetta_scia_antincendio;
        // the mini-code check only applies to companies outside the SCIA regime
        survey.verifica_antincendio = match self.soggetta_scia_antincendio {
            FireSafetyScia::No => Some(self.verifica_antincendio.unwrap_or_default()),
            _ => None,
        };
        survey.note_sopralluogo = self.note_sopralluogo;
    }
}

/// Scalar completion fields filled in at the office.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionForm {
    pub livello_formazione_antincendio: Option<FireTrainingLevel>,
    pub note_formazione_antincendio: String,
    pub gruppo_primo_soccorso: Option<FirstAidGroup>,
    pub note_primo_soccorso: String,
    pub desc_luoghi_lavoro: String,
    pub ciclo_lavorativo: String,
    pub misure_prevenzione: String,
}

impl CompletionForm {
    fn apply(self, completion: &mut CompletionData) {
        completion.livello_formazione_antincendio = self.livello_formazione_antincendio;
        completion.note_formazione_antincendio = self.note_formazione_antincendio;
        completion.gruppo_primo_soccorso = self.gruppo_primo_soccorso;
        completion.note_primo_soccorso = self.note_primo_soccorso;
        completion.desc_luoghi_lavoro = self.desc_luoghi_lavoro;
        completion.ciclo_lavorativo = self.ciclo_lavorativo;
        completion.misure_prevenzione = self.misure_prevenzione;
    }
}

#[derive(Debug, Clone)]
pub enum Stage {
    Survey(SurveyForm),
    Completion(CompletionForm),
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Survey(_) => "survey",
            Stage::Completion(_) => "completion",
        }
    }
}

/// The ordered lists of the draft that support remove-by-position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    Sites,
    Employees,
    Equipment,
    NonConformities,
    Services,
    JobRoles,
    ImprovementActions,
}

impl Collection {
    pub fn label(&self) -> &'static str {
        match self {
            Collection::Sites => "sites",
            Collection::Employees => "employees",
            Collection::Equipment => "equipment",
            Collection::NonConformities => "non-conformities",
            Collection::Services => "services",
            Collection::JobRoles => "job-roles",
            Collection::ImprovementActions => "improvement-actions",
        }
    }
}

fn remove_at<T>(
    items: &mut Vec<T>,
    index: usize,
    collection: Collection,
) -> Result<T, ChecklistError> {
    if index >= items.len() {
        return Err(ChecklistError::IndexOutOfRange {
            collection: collection.label(),
            index,
            len: items.len(),
        });
    }
    Ok(items.remove(index))
}

fn require(value: &str, message: &str) -> Result<(), ChecklistError> {
    if value.trim().is_empty() {
        return Err(ChecklistError::validation(message));
    }
    Ok(())
}

/// Owns the single draft being edited and reconciles it with the store.
/// The draft's `id` is `None` until the first successful write; every later
/// write updates that same record.
pub struct ChecklistManager {
    store: Arc<dyn ChecklistStore>,
    draft: Checklist,
}

impl ChecklistManager {
    pub fn new(store: Arc<dyn ChecklistStore>) -> Self {
        Self {
            store,
            draft: Checklist::default(),
        }
    }

    pub fn draft(&self) -> &Checklist {
        &self.draft
    }

    pub fn id(&self) -> Option<ChecklistId> {
        self.draft.id
    }

    pub fn start_new(&mut self) -> &Checklist {
        self.draft = Checklist::default();
        tracing::info!("Started a new checklist");
        &self.draft
    }

    /// Replaces the draft with the stored record. On failure the previous
    /// draft stays in place.
    pub async fn load(&mut self, id: ChecklistId) -> Result<&Checklist, ChecklistError> {
        let record = self.store.select(id).await.map_err(|e| {
            tracing::error!("Failed to load checklist {}: {}", id, e);
            ChecklistError::from(e)
        })?;
        let mut checklist: Checklist = from_record(record)?;
        checklist.id = Some(id);
        self.draft = checklist;
        tracing::info!("Loaded checklist {}", id);
        Ok(&self.draft)
    }

    /// Never fails: a listing error only means there is nothing to pick from.
    pub async fn list_recent(&self, limit: usize) -> Vec<ChecklistSummary> {
        match self.store.select_summaries(limit).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("Failed to list recent checklists: {}", e);
                Vec::new()
            }
        }
    }

    /// Writes one stage checkpoint.
    ///
    /// The survey stage owns its fields and writes all of them with
    /// `status = bozza`, also when the checklist was already complete. The
    /// completion stage writes the draft's full record with the completion
    /// fields merged over it (see [`merge`]) and `status = completa`, so
    /// survey fields are never clobbered. The draft only changes once the
    /// store accepted the write.
    pub async fn save_stage(&mut self, stage: Stage) -> Result<&Checklist, ChecklistError> {
        let stage_name = stage.name();
        let mut candidate = self.draft.clone();
        let (mut section, status) = match stage {
            Stage::Survey(form) => {
                form.apply(&mut candidate.survey);
                (to_record(&candidate.survey)?, ChecklistStatus::Draft)
            }
            Stage::Completion(form) => {
                form.apply(&mut candidate.completion);
                (to_record(&candidate.completion)?, ChecklistStatus::Complete)
            }
        };
        require(
            &candidate.survey.ragione_sociale,
            "company name (ragione sociale) is required",
        )?;

        let now = Utc::now();
        section.insert("status".to_string(), Value::String(status.as_str().to_string()));
        section.insert("updated_at".to_string(), Value::String(now.to_rfc3339()));

        let base = to_record(&self.draft)?;
        let merged = merge(&base, &section);
        let payload: Record = match status {
            ChecklistStatus::Draft => strip_server_owned(section),
            ChecklistStatus::Complete => strip_server_owned(merged.clone()),
        };

        let id = match self.draft.id {
            Some(id) => {
                self.store.update(id, payload).await.map_err(|e| {
                    tracing::error!("Failed to save {} stage of {}: {}", stage_name, id, e);
                    ChecklistError::from(e)
                })?;
                id
            }
            None => self.store.insert(payload).await.map_err(|e| {
                tracing::error!("Failed to insert checklist at {} stage: {}", stage_name, e);
                ChecklistError::from(e)
            })?,
        };

        let mut saved: Checklist = from_record(merged)?;
        saved.id = Some(id);
        self.draft = saved;
        tracing::info!("Saved {} stage of checklist {}", stage_name, id);
        Ok(&self.draft)
    }

    pub fn add_site(&mut self, site: Site) -> Result<&Checklist, ChecklistError> {
        require(&site.nome, "site name is required")?;
        self.draft.survey.luoghi_lavoro.push(site);
        Ok(&self.draft)
    }

    pub fn add_employee(&mut self, employee: Employee) -> Result<&Checklist, ChecklistError> {
        if employee.nome.trim().is_empty() && employee.cognome.trim().is_empty() {
            return Err(ChecklistError::validation(
                "employee first or last name is required",
            ));
        }
        self.draft.survey.dipendenti.push(employee);
        Ok(&self.draft)
    }

    pub fn add_equipment(&mut self, equipment: Equipment) -> Result<&Checklist, ChecklistError> {
        require(&equipment.nome, "equipment name is required")?;
        self.draft.survey.attrezzature.push(equipment);
        Ok(&self.draft)
    }

    pub fn add_non_conformity(
        &mut self,
        non_conformity: NonConformity,
    ) -> Result<&Checklist, ChecklistError> {
        require(
            &non_conformity.descrizione,
            "non-conformity description is required",
        )?;
        self.draft.survey.non_conformita.push(non_conformity);
        Ok(&self.draft)
    }

    pub fn add_service(&mut self, mut service: ServiceOffer) -> Result<&Checklist, ChecklistError> {
        if let ServiceDetail::HealthSurveillance { mansioni } = &service.dettaglio {
            let rows: Vec<(String, u32)> = mansioni
                .iter()
                .map(|(name, workers)| (name.clone(), *workers))
                .collect();
            service.dettaglio =
                ServiceDetail::surveillance(&rows).map_err(ChecklistError::Validation)?;
        }
        service.validate().map_err(ChecklistError::Validation)?;
        self.draft.completion.servizi_offerta.push(service);
        Ok(&self.draft)
    }

    pub fn add_job_role(&mut self, job_role: JobRole) -> Result<&Checklist, ChecklistError> {
        require(&job_role.nome, "job role name is required")?;
        self.draft.completion.mansioni.push(job_role);
        Ok(&self.draft)
    }

    pub fn add_improvement_action(
        &mut self,
        action: ImprovementAction,
    ) -> Result<&Checklist, ChecklistError> {
        require(&action.descrizione, "improvement action description is required")?;
        self.draft.completion.piano_miglioramento.push(action);
        Ok(&self.draft)
    }

    /// Removes the item at `index`; an out-of-range index leaves the list as is.
    pub fn remove(
        &mut self,
        collection: Collection,
        index: usize,
    ) -> Result<&Checklist, ChecklistError> {
        let survey = &mut self.draft.survey;
        let completion = &mut self.draft.completion;
        match collection {
            Collection::Sites => {
                remove_at(&mut survey.luoghi_lavoro, index, collection)?;
            }
            Collection::Employees => {
                remove_at(&mut survey.dipendenti, index, collection)?;
            }
            Collection::Equipment => {
                remove_at(&mut survey.attrezzature, index, collection)?;
            }
            Collection::NonConformities => {
                remove_at(&mut survey.non_conformita, index, collection)?;
            }
            Collection::Services => {
                remove_at(&mut completion.servizi_offerta, index, collection)?;
            }
            Collection::JobRoles => {
                remove_at(&mut completion.mansioni, index, collection)?;
            }
            Collection::ImprovementActions => {
                remove_at(&mut completion.piano_miglioramento, index, collection)?;
            }
        }
        Ok(&self.draft)
    }

    /// Idempotent: re-selecting keeps the existing notes.
    pub fn select_hazard(&mut self, hazard: Hazard) -> &Checklist {
        self.draft.survey.rischi_selezionati.select(hazard);
        &self.draft
    }

    pub fn set_hazard_note(
        &mut self,
        hazard: Hazard,
        note: String,
    ) -> Result<&Checklist, ChecklistError> {
        if !self.draft.survey.rischi_selezionati.set_note(hazard, note) {
            return Err(ChecklistError::validation(format!(
                "hazard '{hazard}' is not selected"
            )));
        }
        Ok(&self.draft)
    }

    /// Drops the hazard together with its notes.
    pub fn deselect_hazard(&mut self, hazard: Hazard) -> &Checklist {
        self.draft.survey.rischi_selezionati.deselect(hazard);
        &self.draft
    }
}
