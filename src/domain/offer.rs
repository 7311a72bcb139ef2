use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MAX_SURVEILLANCE_ROLES: usize = 10;
pub const MIN_DOCUMENT_HOURS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ServiceCategory {
    #[serde(rename = "documento")]
    Document,
    #[serde(rename = "formazione")]
    Training,
    #[serde(rename = "sorveglianza_sanitaria")]
    HealthSurveillance,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 3] = [
        ServiceCategory::Document,
        ServiceCategory::Training,
        ServiceCategory::HealthSurveillance,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ServiceCategory::Document => "Documenti",
            ServiceCategory::Training => "Formazione",
            ServiceCategory::HealthSurveillance => "Sorveglianza Sanitaria",
        }
    }
}

/// Category-specific payload of an offered service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "categoria")]
pub enum ServiceDetail {
    #[serde(rename = "documento")]
    Document { ore: f64 },
    #[serde(rename = "formazione")]
    Training { n_persone: u32, ore_corso: u32 },
    #[serde(rename = "sorveglianza_sanitaria")]
    HealthSurveillance {
        /// job role name -> workers subject to health surveillance
        mansioni: BTreeMap<String, u32>,
    },
}

impl ServiceDetail {
    pub fn category(&self) -> ServiceCategory {
        match self {
            ServiceDetail::Document { .. } => ServiceCategory::Document,
            ServiceDetail::Training { .. } => ServiceCategory::Training,
            ServiceDetail::HealthSurveillance { .. } => ServiceCategory::HealthSurveillance,
        }
    }

    /// Builds the health-surveillance detail from the rows the operator
    /// filled in. Rows with a blank role name are skipped.
    pub fn surveillance(rows: &[(String, u32)]) -> Result<Self, String> {
        if rows.is_empty() || rows.len() > MAX_SURVEILLANCE_ROLES {
            return Err(format!(
                "health surveillance needs between 1 and {MAX_SURVEILLANCE_ROLES} job roles"
            ));
        }
        let mut mansioni = BTreeMap::new();
        for (name, workers) in rows {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if *workers < 1 {
                return Err(format!("job role '{name}' needs at least one worker"));
            }
            if mansioni.insert(name.to_string(), *workers).is_some() {
                return Err(format!("job role '{name}' is listed more than once"));
            }
        }
        if mansioni.is_empty() {
            return Err("health surveillance needs at least one named job role".to_string());
        }
        Ok(ServiceDetail::HealthSurveillance { mansioni })
    }

    /// Reads the free-text detail the first version of the offer form stored
    /// next to a display category such as "📄 DOCUMENTO": "4.0 ore",
    /// "3 persone - 8h", or a JSON object of job role -> workers.
    pub fn from_legacy(categoria: &str, text: &str) -> Result<Self, String> {
        let text = text.trim();
        let unrecognised = || format!("unrecognised service detail '{text}' ({categoria})");
        let category = categoria.to_uppercase();

        if category.contains("DOCUMENTO") {
            let ore = text
                .trim_end_matches("ore")
                .trim()
                .parse::<f64>()
                .map_err(|_| unrecognised())?;
            Ok(ServiceDetail::Document { ore })
        } else if category.contains("FORMAZIONE") {
            let (persone, ore) = text.split_once("persone -").ok_or_else(unrecognised)?;
            let n_persone = legacy_count(persone).ok_or_else(unrecognised)?;
            let ore_corso =
                legacy_count(ore.trim().trim_end_matches('h')).ok_or_else(unrecognised)?;
            Ok(ServiceDetail::Training {
                n_persone,
                ore_corso,
            })
        } else if category.contains("SORVEGLIANZA") {
            let mansioni: BTreeMap<String, f64> =
                serde_json::from_str(text).map_err(|_| unrecognised())?;
            let mansioni = mansioni
                .into_iter()
                .map(|(name, n)| whole_count(n).map(|n| (name, n)))
                .collect::<Option<_>>()
                .ok_or_else(unrecognised)?;
            Ok(ServiceDetail::HealthSurveillance { mansioni })
        } else {
            Err(unrecognised())
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            ServiceDetail::Document { ore } => {
                if !ore.is_finite() || *ore < MIN_DOCUMENT_HOURS {
                    return Err(format!("document hours must be at least {MIN_DOCUMENT_HOURS}"));
                }
            }
            ServiceDetail::Training { n_persone, ore_corso } => {
                if *n_persone < 1 {
                    return Err("training needs at least one trainee".to_string());
                }
                if *ore_corso < 1 {
                    return Err("training course needs at least one hour".to_string());
                }
            }
            ServiceDetail::HealthSurveillance { mansioni } => {
                if mansioni.is_empty() || mansioni.len() > MAX_SURVEILLANCE_ROLES {
                    return Err(format!(
                        "health surveillance needs between 1 and {MAX_SURVEILLANCE_ROLES} job roles"
                    ));
                }
                if let Some((name, _)) = mansioni.iter().find(|(_, n)| **n < 1) {
                    return Err(format!("job role '{name}' needs at least one worker"));
                }
            }
        }
        Ok(())
    }

    /// Short human readable summary, e.g. "3 persone - 8h".
    pub fn summary(&self) -> String {
        match self {
            ServiceDetail::Document { ore } => format!("{ore} ore"),
            ServiceDetail::Training { n_persone, ore_corso } => {
                format!("{n_persone} persone - {ore_corso}h")
            }
            ServiceDetail::HealthSurveillance { mansioni } => mansioni
                .iter()
                .map(|(name, n)| format!("{name}: {n} dipendenti"))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

fn legacy_count(text: &str) -> Option<u32> {
    whole_count(text.trim().parse::<f64>().ok()?)
}

// number inputs of the old form were floats or ints depending on the field
fn whole_count(value: f64) -> Option<u32> {
    (value.is_finite() && value >= 0.0 && value <= u32::MAX as f64).then(|| value.round() as u32)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredServiceOffer")]
pub struct ServiceOffer {
    pub nome: String,
    pub dettaglio: ServiceDetail,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub prezzo: f64,
}

impl ServiceOffer {
    pub fn category(&self) -> ServiceCategory {
        self.dettaglio.category()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.nome.trim().is_empty() {
            return Err("service name is required".to_string());
        }
        if !self.prezzo.is_finite() || self.prezzo < 0.0 {
            return Err("service price must be zero or positive".to_string());
        }
        self.dettaglio.validate()
    }
}

/// A stored offer row: either the tagged `dettaglio` object, or the older
/// shape with a top-level display `categoria` and a free-text `dettaglio`.
#[derive(Deserialize)]
struct StoredServiceOffer {
    nome: String,
    #[serde(default)]
    categoria: Option<String>,
    dettaglio: StoredDetail,
    #[serde(default)]
    note: String,
    #[serde(default)]
    prezzo: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredDetail {
    Tagged(ServiceDetail),
    Text(String),
}

impl TryFrom<StoredServiceOffer> for ServiceOffer {
    type Error = String;

    fn try_from(row: StoredServiceOffer) -> Result<Self, Self::Error> {
        let dettaglio = match row.dettaglio {
            StoredDetail::Tagged(detail) => detail,
            StoredDetail::Text(text) => {
                ServiceDetail::from_legacy(row.categoria.as_deref().unwrap_or_default(), &text)?
            }
        };
        Ok(ServiceOffer {
            nome: row.nome,
            dettaglio,
            note: row.note,
            prezzo: row.prezzo,
        })
    }
}

/// Plain sum of the service prices; rounding is left to display.
/// Recomputed on every call.
pub fn offer_total(services: &[ServiceOffer]) -> f64 {
    services.iter().map(|s| s.prezzo).sum()
}
