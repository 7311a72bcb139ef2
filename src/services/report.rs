//! Read-only projection of a checklist into the sections of the final report.

use crate::domain::models::{
    Checklist, Employee, Equipment, ImprovementAction, JobRole, NonConformity, Site,
};
use crate::domain::offer::ServiceCategory;
use serde::Serialize;
use std::fmt;

const NOT_SPECIFIED: &str = "Non specificato";
const JOB_ROLE_PREVIEW_CHARS: usize = 300;

/// One report section. Empty sections are kept and carry `none_recorded`.
#[derive(Debug, Clone, Serialize)]
pub struct Section<T> {
    pub title: &'static str,
    pub total: usize,
    pub entries: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub none_recorded: Option<&'static str>,
}

impl<T> Section<T> {
    fn new(title: &'static str, entries: Vec<T>, empty_notice: &'static str) -> Self {
        let none_recorded = entries.is_empty().then_some(empty_notice);
        Self {
            title,
            total: entries.len(),
            entries,
            none_recorded,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyFacts {
    pub ragione_sociale: String,
    pub ateco: String,
    pub sede: String,
    pub n_dipendenti: u32,
    pub datore_lavoro: String,
    pub rspp: &'static str,
    pub stato: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct FireSafetyReport {
    pub soggetta_scia: &'static str,
    pub verifiche: Vec<FireCheckLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_conformita: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FireCheckLine {
    pub voce: &'static str,
    pub conforme: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HazardLine {
    pub rischio: &'static str,
    pub note: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub antincendio: &'static str,
    pub note_antincendio: String,
    pub primo_soccorso: &'static str,
    pub note_primo_soccorso: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OfferLine {
    pub nome: String,
    pub dettaglio: String,
    pub note: String,
    pub prezzo: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OfferGroup {
    pub categoria: ServiceCategory,
    pub titolo: &'static str,
    pub entries: Vec<OfferLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OfferReport {
    pub total: usize,
    pub groups: Vec<OfferGroup>,
    pub totale_offerta: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub none_recorded: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Narratives {
    pub desc_luoghi_lavoro: Option<String>,
    pub ciclo_lavorativo: Option<String>,
    pub misure_prevenzione: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub company: CompanyFacts,
    pub sites: Section<Site>,
    pub employees: Section<Employee>,
    pub equipment: Section<Equipment>,
    pub fire_safety: FireSafetyReport,
    pub hazards: Section<HazardLine>,
    pub non_conformities: Section<NonConformity>,
    pub job_roles: Section<JobRole>,
    pub training: TrainingReport,
    pub offer: OfferReport,
    pub narratives: Narratives,
    pub improvement_plan: Section<ImprovementAction>,
    pub survey_notes: Option<String>,
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn render(checklist: &Checklist) -> Report {
    let survey = &checklist.survey;
    let completion = &checklist.completion;

    let company = CompanyFacts {
        ragione_sociale: survey.ragione_sociale.clone(),
        ateco: survey.ateco.clone(),
        sede: survey.sede.clone(),
        n_dipendenti: survey.n_dipendenti,
        datore_lavoro: survey.datore_lavoro.nome.clone(),
        rspp: survey.rspp.tipo.label(),
        stato: checklist.status.label(),
    };

    let fire_safety = FireSafetyReport {
        soggetta_scia: survey.soggetta_scia_antincendio.label(),
        verifiche: survey
            .verifica_antincendio
            .as_ref()
            .map(|check| {
                check
                    .items()
                    .into_iter()
                    .map(|(voce, conforme)| FireCheckLine { voce, conforme })
                    .collect()
            })
            .unwrap_or_default(),
        non_conformita: survey
            .verifica_antincendio
            .as_ref()
            .and_then(|check| non_blank(&check.non_conformita)),
    };

    let hazards = survey
        .rischi_selezionati
        .iter()
        .map(|(hazard, entry)| HazardLine {
            rischio: hazard.label(),
            note: entry.note.clone(),
        })
        .collect();

    let groups = ServiceCategory::ALL
        .into_iter()
        .filter_map(|categoria| {
            let entries: Vec<OfferLine> = completion
                .servizi_offerta
                .iter()
                .filter(|s| s.category() == categoria)
                .map(|s| OfferLine {
                    nome: s.nome.clone(),
                    dettaglio: s.dettaglio.summary(),
                    note: s.note.clone(),
                    prezzo: s.prezzo,
                })
                .collect();
            (!entries.is_empty()).then(|| OfferGroup {
                categoria,
                titolo: categoria.label(),
                entries,
            })
        })
        .collect();

    let offer = OfferReport {
        total: completion.servizi_offerta.len(),
        groups,
        totale_offerta: checklist.offer_total(),
        none_recorded: completion
            .servizi_offerta
            .is_empty()
            .then_some("Nessun servizio in offerta"),
    };

    Report {
        company,
        sites: Section::new(
            "Luoghi di Lavoro",
            survey.luoghi_lavoro.clone(),
            "Nessun luogo di lavoro inserito",
        ),
        employees: Section::new(
            "Dipendenti",
            survey.dipendenti.clone(),
            "Nessun dipendente inserito",
        ),
        equipment: Section::new(
            "Attrezzature",
            survey.attrezzature.clone(),
            "Nessuna attrezzatura inserita",
        ),
        fire_safety,
        hazards: Section::new("Rischi Identificati", hazards, "Nessun rischio selezionato"),
        non_conformities: Section::new(
            "Non Conformità",
            survey.non_conformita.clone(),
            "Nessuna non conformità rilevata",
        ),
        job_roles: Section::new(
            "Mansioni",
            completion.mansioni.clone(),
            "Nessuna mansione inserita",
        ),
        training: TrainingReport {
            antincendio: completion
                .livello_formazione_antincendio
                .map(|l| l.label())
                .unwrap_or(NOT_SPECIFIED),
            note_antincendio: completion.note_formazione_antincendio.clone(),
            primo_soccorso: completion
                .gruppo_primo_soccorso
                .map(|g| g.label())
                .unwrap_or(NOT_SPECIFIED),
            note_primo_soccorso: completion.note_primo_soccorso.clone(),
        },
        offer,
        narratives: Narratives {
            desc_luoghi_lavoro: non_blank(&completion.desc_luoghi_lavoro),
            ciclo_lavorativo: non_blank(&completion.ciclo_lavorativo),
            misure_prevenzione: non_blank(&completion.misure_prevenzione),
        },
        improvement_plan: Section::new(
            "Piano di Miglioramento",
            completion.piano_miglioramento.clone(),
            "Nessuna azione di miglioramento",
        ),
        survey_notes: non_blank(&survey.note_sopralluogo),
    }
}

/// `€ 1,234.50`
pub fn format_euro(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (digits, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("€ {}{}.{}", sign, grouped, cents)
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        "N/A"
    } else {
        value
    }
}

fn write_section<T>(
    f: &mut fmt::Formatter<'_>,
    section: &Section<T>,
    mut line: impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    writeln!(f, "\n## {}", section.title)?;
    if let Some(notice) = section.none_recorded {
        return writeln!(f, "{notice}");
    }
    writeln!(f, "Totale: {}", section.total)?;
    for entry in &section.entries {
        line(f, entry)?;
    }
    Ok(())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.company;
        writeln!(f, "# Report Checklist - {}", or_na(&c.ragione_sociale))?;
        writeln!(f, "\n## Dati Azienda")?;
        writeln!(f, "- Ragione Sociale: {}", or_na(&c.ragione_sociale))?;
        writeln!(f, "- ATECO: {}", or_na(&c.ateco))?;
        writeln!(f, "- Sede: {}", or_na(&c.sede))?;
        writeln!(f, "- N. Dipendenti: {}", c.n_dipendenti)?;
        writeln!(f, "- Datore Lavoro: {}", or_na(&c.datore_lavoro))?;
        writeln!(f, "- RSPP: {}", c.rspp)?;
        writeln!(f, "- Stato: {}", c.stato)?;

        write_section(f, &self.sites, |f, site| {
            writeln!(
                f,
                "- {} ({} mq): {}",
                site.nome,
                site.superficie_mq,
                or_na(&site.note)
            )
        })?;
        write_section(f, &self.employees, |f, e| {
            writeln!(f, "- {} {} - {}", e.nome, e.cognome, or_na(&e.mansione))
        })?;
        write_section(f, &self.equipment, |f, e| {
            writeln!(f, "- {} - {} {}", e.nome, e.marca, e.modello)
        })?;

        writeln!(f, "\n## Antincendio")?;
        writeln!(f, "Soggetta a SCIA: {}", self.fire_safety.soggetta_scia)?;
        for check in &self.fire_safety.verifiche {
            let mark = if check.conforme { "x" } else { " " };
            writeln!(f, "- [{}] {}", mark, check.voce)?;
        }
        if let Some(nc) = &self.fire_safety.non_conformita {
            writeln!(f, "Non conformità: {nc}")?;
        }

        write_section(f, &self.hazards, |f, h| {
            let note = if h.note.trim().is_empty() {
                "Nessuna nota"
            } else {
                h.note.as_str()
            };
            writeln!(f, "- {}: {}", h.rischio, note)
        })?;
        write_section(f, &self.non_conformities, |f, nc| {
            writeln!(f, "- [Priorità {}] {}", nc.priorita.label(), nc.descrizione)
        })?;
        write_section(f, &self.job_roles, |f, role| {
            writeln!(
                f,
                "- {} ({} lavoratori): {}",
                role.nome,
                role.n_lavoratori,
                truncate_chars(&role.descrizione, JOB_ROLE_PREVIEW_CHARS)
            )
        })?;

        writeln!(f, "\n## Formazione Obbligatoria")?;
        writeln!(f, "- Antincendio: {}", self.training.antincendio)?;
        writeln!(f, "- Primo Soccorso: {}", self.training.primo_soccorso)?;

        writeln!(f, "\n## Offerta Commerciale")?;
        match self.offer.none_recorded {
            Some(notice) => writeln!(f, "{notice}")?,
            None => {
                writeln!(f, "Totale servizi: {}", self.offer.total)?;
                for group in &self.offer.groups {
                    writeln!(f, "### {}", group.titolo)?;
                    for line in &group.entries {
                        writeln!(
                            f,
                            "- {} - {} - {}",
                            line.nome,
                            line.dettaglio,
                            format_euro(line.prezzo)
                        )?;
                    }
                }
                writeln!(f, "Totale Offerta: {}", format_euro(self.offer.totale_offerta))?;
            }
        }

        writeln!(f, "\n## Descrizioni Dettagliate")?;
        let narratives = [
            ("Luoghi di Lavoro", &self.narratives.desc_luoghi_lavoro),
            ("Ciclo Lavorativo", &self.narratives.ciclo_lavorativo),
            ("Misure di Prevenzione", &self.narratives.misure_prevenzione),
        ];
        for (title, text) in narratives {
            writeln!(f, "{}: {}", title, text.as_deref().unwrap_or("Nessuna descrizione"))?;
        }

        write_section(f, &self.improvement_plan, |f, a| {
            writeln!(
                f,
                "- {} (responsabile: {}, scadenza: {})",
                a.descrizione,
                or_na(&a.responsabile),
                a.scadenza
            )
        })?;

        if let Some(notes) = &self.survey_notes {
            writeln!(f, "\n## Note Sopralluogo\n{notes}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hazards::Hazard;
    use crate::domain::models::{ChecklistStatus, FireTrainingLevel};
    use crate::domain::offer::{ServiceDetail, ServiceOffer};

    #[test]
    fn test_empty_checklist_marks_every_section() {
        let report = render(&Checklist::default());
        assert_eq!(report.sites.none_recorded, Some("Nessun luogo di lavoro inserito"));
        assert_eq!(report.employees.total, 0);
        assert!(report.equipment.none_recorded.is_some());
        assert!(report.hazards.none_recorded.is_some());
        assert!(report.non_conformities.none_recorded.is_some());
        assert!(report.job_roles.none_recorded.is_some());
        assert!(report.improvement_plan.none_recorded.is_some());
        assert_eq!(report.offer.none_recorded, Some("Nessun servizio in offerta"));
        assert_eq!(report.offer.totale_offerta, 0.0);
        assert_eq!(report.training.antincendio, NOT_SPECIFIED);

        let text = report.to_string();
        assert!(text.contains("Nessun dipendente inserito"));
        assert!(text.contains("Nessuna azione di miglioramento"));
    }

    #[test]
    fn test_populated_report() {
        let mut checklist = Checklist::default();
        checklist.status = ChecklistStatus::Complete;
        checklist.survey.ragione_sociale = "Acme Srl".to_string();
        checklist.survey.luoghi_lavoro.push(Site {
            nome: "Magazzino".to_string(),
            superficie_mq: 120,
            ..Default::default()
        });
        checklist.survey.rischi_selezionati.select(Hazard::Noise);
        checklist
            .survey
            .rischi_selezionati
            .set_note(Hazard::Noise, "livello 85dB");
        checklist.completion.livello_formazione_antincendio = Some(FireTrainingLevel::Level1);
        checklist.completion.mansioni.push(JobRole {
            nome: "Magazziniere".to_string(),
            n_lavoratori: 2,
            descrizione: "è".repeat(400),
        });
        for (nome, prezzo, dettaglio) in [
            ("DVR", 100.0, ServiceDetail::Document { ore: 6.0 }),
            (
                "Corso antincendio",
                250.50,
                ServiceDetail::Training {
                    n_persone: 4,
                    ore_corso: 8,
                },
            ),
            ("Visite", 75.0, ServiceDetail::Document { ore: 1.0 }),
        ] {
            checklist.completion.servizi_offerta.push(ServiceOffer {
                nome: nome.to_string(),
                dettaglio,
                note: String::new(),
                prezzo,
            });
        }

        let report = render(&checklist);
        assert_eq!(report.company.stato, "Completa");
        assert_eq!(report.sites.total, 1);
        assert!(report.sites.none_recorded.is_none());
        assert_eq!(report.hazards.entries[0].rischio, "Rumore");
        assert_eq!(report.hazards.entries[0].note, "livello 85dB");
        assert_eq!(report.offer.total, 3);
        assert_eq!(report.offer.groups.len(), 2);
        assert_eq!(report.offer.groups[0].entries.len(), 2);
        assert_eq!(report.offer.totale_offerta, 425.50);
        assert_eq!(report.training.antincendio, "Livello 1 (4h)");

        let text = report.to_string();
        assert!(text.contains("Totale Offerta: € 425.50"));
        assert!(text.contains("4 persone - 8h"));
        assert!(text.contains(&format!("{}...", "è".repeat(300))));

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["sites"].get("none_recorded").is_none());
        assert_eq!(json["sites"]["entries"][0]["superficie_mq"], 120);
    }

    #[test]
    fn test_format_euro() {
        assert_eq!(format_euro(425.5), "€ 425.50");
        assert_eq!(format_euro(1234567.891), "€ 1,234,567.89");
        assert_eq!(format_euro(0.0), "€ 0.00");
        assert_eq!(format_euro(0.012), "€ 0.01");
        assert_eq!(format_euro(1e17), "€ 100,000,000,000,000,000.00");
    }
}
