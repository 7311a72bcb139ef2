use crate::domain::hazards::HazardMap;
use crate::domain::offer::{offer_total, ServiceOffer};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub type ChecklistId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChecklistStatus {
    #[default]
    #[serde(rename = "bozza")]
    Draft,
    #[serde(rename = "completa")]
    Complete,
}

impl ChecklistStatus {
    /// Value stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecklistStatus::Draft => "bozza",
            ChecklistStatus::Complete => "completa",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChecklistStatus::Draft => "Bozza",
            ChecklistStatus::Complete => "Completa",
        }
    }
}

/// Who acts as RSPP (responsabile del servizio di prevenzione e protezione).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RsppType {
    #[default]
    #[serde(rename = "Datore Lavoro")]
    Employer,
    #[serde(rename = "Interno")]
    Internal,
    #[serde(rename = "Esterno")]
    External,
}

impl RsppType {
    pub fn label(&self) -> &'static str {
        match self {
            RsppType::Employer => "Datore Lavoro",
            RsppType::Internal => "Interno",
            RsppType::External => "Esterno",
        }
    }
}

/// Whether the company falls under the fire-prevention SCIA regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FireSafetyScia {
    #[serde(rename = "Sì")]
    Yes,
    #[serde(rename = "No")]
    No,
    #[default]
    #[serde(rename = "Da verificare")]
    ToVerify,
}

impl FireSafetyScia {
    pub fn label(&self) -> &'static str {
        match self {
            FireSafetyScia::Yes => "Sì",
            FireSafetyScia::No => "No",
            FireSafetyScia::ToVerify => "Da verificare",
        }
    }
}

/// Mini-code conformity check (D.M. 03/09/2021), only filled in when the
/// company is not subject to SCIA.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireSafetyCheck {
    pub reazione_fuoco: bool,
    pub compartimentazione: bool,
    pub vie_esodo: bool,
    pub estintori: bool,
    pub segnaletica: bool,
    pub illuminazione_emergenza: bool,
    pub non_conformita: String,
}

impl FireSafetyCheck {
    pub fn items(&self) -> [(&'static str, bool); 6] {
        [
            ("Reazione al fuoco materiali conforme", self.reazione_fuoco),
            ("Compartimentazione adeguata", self.compartimentazione),
            ("Vie di esodo libere e segnalate", self.vie_esodo),
            ("Estintori adeguati e verificati", self.estintori),
            ("Segnaletica sicurezza conforme", self.segnaletica),
            ("Illuminazione emergenza funzionante", self.illuminazione_emergenza),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    #[serde(rename = "Bassa")]
    Low,
    #[serde(rename = "Media")]
    Medium,
    #[serde(rename = "Alta")]
    High,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Bassa",
            Priority::Medium => "Media",
            Priority::High => "Alta",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FireTrainingLevel {
    #[serde(rename = "Livello 1 (4h)")]
    Level1,
    #[serde(rename = "Livello 2 (8h)")]
    Level2,
    #[serde(rename = "Livello 3 (16h)")]
    Level3,
    #[serde(rename = "Non necessario")]
    NotRequired,
}

impl FireTrainingLevel {
    pub fn label(&self) -> &'static str {
        match self {
            FireTrainingLevel::Level1 => "Livello 1 (4h)",
            FireTrainingLevel::Level2 => "Livello 2 (8h)",
            FireTrainingLevel::Level3 => "Livello 3 (16h)",
            FireTrainingLevel::NotRequired => "Non necessario",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FirstAidGroup {
    #[serde(rename = "Gruppo A (16h)")]
    GroupA,
    #[serde(rename = "Gruppo B (12h)")]
    GroupB,
    #[serde(rename = "Gruppo C (12h)")]
    GroupC,
    #[serde(rename = "Non necessario")]
    NotRequired,
}

impl FirstAidGroup {
    pub fn label(&self) -> &'static str {
        match self {
            FirstAidGroup::GroupA => "Gruppo A (16h)",
            FirstAidGroup::GroupB => "Gruppo B (12h)",
            FirstAidGroup::GroupC => "Gruppo C (12h)",
            FirstAidGroup::NotRequired => "Non necessario",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Employer {
    pub nome: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rspp {
    pub tipo: RsppType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Site {
    pub nome: String,
    pub superficie_mq: u32,
    pub note: String,
    pub foto: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Employee {
    pub nome: String,
    pub cognome: String,
    pub mansione: String,
    pub documenti: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Equipment {
    pub nome: String,
    pub marca: String,
    pub modello: String,
    pub note: String,
    pub foto: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NonConformity {
    pub descrizione: String,
    pub priorita: Priority,
    pub foto_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRole {
    pub nome: String,
    pub n_lavoratori: u32,
    pub descrizione: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImprovementAction {
    pub descrizione: String,
    #[serde(default)]
    pub responsabile: String,
    pub scadenza: NaiveDate,
}

/// Fields written by the survey stage (on-site visit). A survey save owns
/// every one of them and writes them all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyData {
    pub ragione_sociale: String,
    pub ateco: String,
    pub sede: String,
    pub n_dipendenti: u32,
    pub datore_lavoro: Employer,
    pub rspp: Rspp,
    pub luoghi_lavoro: Vec<Site>,
    pub dipendenti: Vec<Employee>,
    pub attrezzature: Vec<Equipment>,
    pub soggetta_scia_antincendio: FireSafetyScia,
    pub verifica_antincendio: Option<FireSafetyCheck>,
    pub rischi_selezionati: HazardMap,
    pub non_conformita: Vec<NonConformity>,
    pub note_sopralluogo: String,
}

/// Fields written by the completion stage (office follow-up).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionData {
    pub servizi_offerta: Vec<ServiceOffer>,
    pub livello_formazione_antincendio: Option<FireTrainingLevel>,
    pub note_formazione_antincendio: String,
    pub gruppo_primo_soccorso: Option<FirstAidGroup>,
    pub note_primo_soccorso: String,
    pub mansioni: Vec<JobRole>,
    pub desc_luoghi_lavoro: String,
    pub ciclo_lavorativo: String,
    pub misure_prevenzione: String,
    pub piano_miglioramento: Vec<ImprovementAction>,
}

/// One workplace inspection. Stored as a single flat record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ChecklistId>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: ChecklistStatus,
    #[serde(flatten)]
    pub survey: SurveyData,
    #[serde(flatten)]
    pub completion: CompletionData,
}

impl Checklist {
    pub fn offer_total(&self) -> f64 {
        offer_total(&self.completion.servizi_offerta)
    }

    pub fn is_complete(&self) -> bool {
        self.status == ChecklistStatus::Complete
    }
}

/// Projection used to pick a recent checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistSummary {
    pub id: ChecklistId,
    #[serde(default)]
    pub ragione_sociale: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: ChecklistStatus,
}

/// RFC 3339, or a naive `YYYY-mm-ddTHH:MM:SS[.ffffff]` as written by the
/// first version of the form, taken as UTC.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(Utc.from_utc_datetime(&naive)))
        .map_err(serde::de::Error::custom)
}
