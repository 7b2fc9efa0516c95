//! Text and JSON renderings of command results.

use std::fmt::Write as _;

use serde::Serialize;

use monalisa_core::{ActionSpace, BlockedReason, Klien, Litmas, TppSchedule, UserProfile};
use monalisa_workflow::{CaseDetail, RegisteredCase, StatusSummary, TransitionReport};

/// What a command prints: one text form, one JSON form.
#[derive(Debug)]
pub struct Rendered {
    pub text: String,
    pub json: serde_json::Value,
}

impl Rendered {
    pub fn new(text: impl Into<String>, value: &impl Serialize) -> Result<Self, String> {
        let json = serde_json::to_value(value)
            .map_err(|e| format!("could not serialize result: {}", e))?;
        Ok(Rendered {
            text: text.into(),
            json,
        })
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

pub fn transition(report: &TransitionReport) -> Result<Rendered, String> {
    Rendered::new(report.confirmation(), report)
}

pub fn registered(case: &RegisteredCase) -> Result<Rendered, String> {
    let text = format!(
        "Registered litmas {} ({}) for klien {} [{}], caseworker {}",
        case.litmas.id,
        case.litmas.jenis_litmas,
        case.klien.nama,
        case.klien.id,
        case.litmas.assigned_pk_id
    );
    Rendered::new(text, case)
}

pub fn case_line(case: &Litmas) -> String {
    format!(
        "{}\t{}\t{}\tPK {}\tAnev {}",
        case.id,
        case.status,
        case.jenis_litmas,
        case.assigned_pk_id,
        or_dash(case.assigned_anev_id.as_ref().map(|a| a.as_str()))
    )
}

pub fn case_list(cases: &[Litmas]) -> Result<Rendered, String> {
    let text = if cases.is_empty() {
        "No cases".to_string()
    } else {
        cases.iter().map(case_line).collect::<Vec<_>>().join("\n")
    };
    Rendered::new(text, &cases)
}

pub fn detail(detail: &CaseDetail) -> Result<Rendered, String> {
    let litmas = &detail.litmas;
    let mut text = String::new();
    let _ = writeln!(text, "Litmas {} ({})", litmas.id, litmas.jenis_litmas);
    let _ = writeln!(text, "  status:      {}", litmas.status);
    let _ = writeln!(
        text,
        "  klien:       {} (NIK {})",
        detail.klien.nama,
        or_dash(detail.klien.nik.as_deref())
    );
    if let Some(penjamin) = &detail.penjamin {
        let _ = writeln!(text, "  penjamin:    {}", penjamin.nama);
    }
    let _ = writeln!(text, "  caseworker:  {}", litmas.assigned_pk_id);
    let _ = writeln!(
        text,
        "  verifier:    {}",
        or_dash(litmas.assigned_anev_id.as_ref().map(|a| a.as_str()))
    );
    for perkara in &detail.perkara {
        let _ = writeln!(
            text,
            "  perkara:     {} ({})",
            perkara.pasal, perkara.tindak_pidana
        );
    }
    if let Some(slot) = &detail.schedule {
        let _ = writeln!(text, "  sidang TPP:  {} (slot {})", slot.tanggal_sidang, slot.id);
    }
    if let Some(notes) = &litmas.anev_notes {
        let _ = writeln!(text, "  catatan:     {}", notes);
    }
    let _ = writeln!(
        text,
        "  surat tugas: {}",
        or_dash(detail.surat_tugas_url.as_deref())
    );
    let _ = write!(
        text,
        "  laporan:     {}",
        or_dash(detail.hasil_litmas_url.as_deref())
    );
    Rendered::new(text, detail)
}

pub fn actions(space: &ActionSpace) -> Result<Rendered, String> {
    let mut lines = vec![format!("Litmas {} ({})", space.case_id, space.status)];
    if space.offers.is_empty() {
        lines.push("  no actions available".to_string());
    }
    for offer in &space.offers {
        let mut needs = Vec::new();
        if let Some(kind) = offer.requires_document {
            needs.push(format!("{} document", kind.category()));
        }
        if offer.needs_verifier_choice {
            needs.push("verifier".to_string());
        }
        if offer.needs_slot_choice {
            needs.push("slot".to_string());
        }
        if needs.is_empty() {
            lines.push(format!("  {}", offer.action.id()));
        } else {
            lines.push(format!("  {} (needs {})", offer.action.id(), needs.join(", ")));
        }
    }
    for blocked in &space.blocked {
        let reason = match &blocked.reason {
            BlockedReason::ActorNotAuthorized => "not permitted for this user".to_string(),
            BlockedReason::NotInSourceState { current, .. } => format!("case is {}", current),
        };
        lines.push(format!("  [blocked] {}: {}", blocked.action.id(), reason));
    }
    Rendered::new(lines.join("\n"), space)
}

pub fn summary(summary: &StatusSummary) -> Result<Rendered, String> {
    let mut lines: Vec<String> = summary
        .counts
        .iter()
        .map(|c| format!("{:<14}{}", c.status.label(), c.count))
        .collect();
    lines.push(format!("{:<14}{}", "Total", summary.total));
    Rendered::new(lines.join("\n"), summary)
}

pub fn schedules(slots: &[TppSchedule]) -> Result<Rendered, String> {
    let text = if slots.is_empty() {
        "No open slots".to_string()
    } else {
        slots
            .iter()
            .map(|s| {
                format!(
                    "{}\t{}\t{}",
                    s.id,
                    s.tanggal_sidang,
                    or_dash(s.keterangan.as_deref())
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    Rendered::new(text, &slots)
}

pub fn klien_list(found: &[Klien]) -> Result<Rendered, String> {
    let text = if found.is_empty() {
        "No matching klien".to_string()
    } else {
        found
            .iter()
            .map(|k| format!("{}\t{}\t{}", k.id, k.nama, or_dash(k.nik.as_deref())))
            .collect::<Vec<_>>()
            .join("\n")
    };
    Rendered::new(text, &found)
}

pub fn users(users: &[UserProfile]) -> Result<Rendered, String> {
    let text = users
        .iter()
        .map(|u| {
            let roles: Vec<&str> = u.roles.iter().map(|r| r.as_str()).collect();
            format!("{}\t{}\t{}", u.id, u.nama, roles.join(","))
        })
        .collect::<Vec<_>>()
        .join("\n");
    Rendered::new(text, &users)
}
