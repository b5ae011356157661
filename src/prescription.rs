//! Prescription composition: SIG text derivation, end-date derivation,
//! and batch assembly for submission.
//!
//! Both derivations are pure functions of canonical inputs and are
//! recomputed whenever an input changes. The SIG strip-then-append cycle
//! is idempotent: re-deriving from already-derived text never stacks
//! duplicate clauses.

use std::sync::LazyLock;

use chrono::{Days, NaiveDate};
use regex::Regex;

use crate::api::types::DrugPayload;
use crate::models::{CatalogDrug, DrugLine, SubmittedBatch, SubmittedLine};

/// Auto-appended clauses recognised (and stripped) on re-derivation.
static AUTO_CLAUSES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"\s*Follow up in \d+ days\.").expect("valid follow-up pattern"),
        Regex::new(r"\s*\d+ Refills allowed\.").expect("valid refills pattern"),
        Regex::new(r"\s*Quantity allowed: \d+\.").expect("valid quantity pattern"),
    ]
});

/// Errors from batch validation.
#[derive(Debug, thiserror::Error)]
pub enum PrescriptionError {
    #[error("Add at least one drug before submitting.")]
    EmptyBatch,
    #[error("Duration and quantity are required for {drug}.")]
    MissingFields { drug: String },
}

// ═══════════════════════════════════════════════════════════
// Derivations
// ═══════════════════════════════════════════════════════════

/// Remove every previously auto-appended clause, leaving the user's own
/// text untouched.
pub fn strip_auto_clauses(text: &str) -> String {
    let mut out = text.to_string();
    for pattern in AUTO_CLAUSES.iter() {
        out = pattern.replace_all(&out, "").into_owned();
    }
    out.trim().to_string()
}

/// Derive the SIG: user text with the follow-up and refill clauses
/// appended from the current duration and refill count. A refill count
/// of zero is an explicit value and still produces a clause; only an
/// unset count omits it.
pub fn derive_sig(text: &str, duration_days: Option<u32>, refills: Option<u32>) -> String {
    let mut sig = strip_auto_clauses(text);
    if let Some(days) = duration_days {
        sig.push_str(&format!(" Follow up in {days} days."));
    }
    if let Some(count) = refills {
        sig.push_str(&format!(" {count} Refills allowed."));
    }
    sig.trim().to_string()
}

/// End date = start date + duration days when both are present. Always a
/// derived display value; the line never stores it.
pub fn derive_end_date(start_date: Option<NaiveDate>, duration_days: Option<u32>) -> Option<NaiveDate> {
    let start = start_date?;
    let days = duration_days?;
    start.checked_add_days(Days::new(days as u64))
}

/// Re-derive the instruction text on a line after any change to its
/// duration or refill count. Applies to the in-progress line and to
/// already-added lines being edited alike.
pub fn rederive_sig(line: &mut DrugLine) {
    line.instructions = derive_sig(&line.instructions, line.duration_days, line.refills);
}

/// Seed a line from a catalog pick: name, dosage form, and the drug's
/// canonical instruction template as the SIG base.
pub fn seed_from_catalog(line: &mut DrugLine, drug: &CatalogDrug) {
    line.drug_name = drug.name.clone();
    line.dosage_form = drug.dosage_form.clone();
    line.instructions = drug.instruction_template.clone();
    rederive_sig(line);
}

// ═══════════════════════════════════════════════════════════
// Batch assembly
// ═══════════════════════════════════════════════════════════

/// Gather the lines going into one submission: every added line, plus the
/// in-progress line when it names a drug — in which case its duration and
/// quantity must be filled in.
pub fn gather_lines(
    added: &[DrugLine],
    in_progress: Option<&DrugLine>,
) -> Result<Vec<DrugLine>, PrescriptionError> {
    let mut lines: Vec<DrugLine> = added.to_vec();
    if let Some(current) = in_progress {
        if !current.drug_name.trim().is_empty() {
            if current.duration_days.is_none() || current.quantity.is_none() {
                return Err(PrescriptionError::MissingFields {
                    drug: current.drug_name.clone(),
                });
            }
            lines.push(current.clone());
        }
    }
    if lines.is_empty() {
        return Err(PrescriptionError::EmptyBatch);
    }
    Ok(lines)
}

fn iso(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Map a line to the server schema. The computed end date is sent as a
/// plain field — the server does not recompute it.
pub fn to_payload(line: &DrugLine) -> DrugPayload {
    DrugPayload {
        drug_name: line.drug_name.clone(),
        dosage_form: line.dosage_form.clone(),
        start_date: iso(line.start_date),
        end_date: iso(derive_end_date(line.start_date, line.duration_days)),
        duration: line.duration_days.unwrap_or(0),
        quantity: line.quantity.unwrap_or(0),
        repeats: line.refills.unwrap_or(0),
        instructions: line.instructions.clone(),
        route: String::new(),
        frequency: String::new(),
    }
}

/// The preview record kept after submission; reproduces exactly what was
/// submitted (names, quantities, computed end dates), no silent rewrite.
pub fn to_submitted(line: &DrugLine) -> SubmittedLine {
    SubmittedLine {
        drug_name: line.drug_name.clone(),
        dosage_form: line.dosage_form.clone(),
        quantity: line.quantity.unwrap_or(0),
        start_date: line.start_date,
        end_date: derive_end_date(line.start_date, line.duration_days),
        refills: line.refills.unwrap_or(0),
        instructions: line.instructions.clone(),
    }
}

/// Build the wire payloads and the local preview batch in one pass.
pub fn build_batch(
    demographic_no: i64,
    appointment_no: i64,
    lines: &[DrugLine],
) -> (Vec<DrugPayload>, SubmittedBatch) {
    let payloads = lines.iter().map(to_payload).collect();
    let batch = SubmittedBatch {
        batch_id: None,
        demographic_no,
        appointment_no,
        lines: lines.iter().map(to_submitted).collect(),
    };
    (payloads, batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn line(name: &str) -> DrugLine {
        DrugLine {
            id: Uuid::new_v4(),
            drug_name: name.into(),
            dosage_form: "Tablet".into(),
            start_date: None,
            duration_days: None,
            quantity: None,
            refills: None,
            instructions: String::new(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn sig_appends_duration_and_refills() {
        let sig = derive_sig("Apply twice daily", Some(10), Some(2));
        assert_eq!(sig, "Apply twice daily Follow up in 10 days. 2 Refills allowed.");
    }

    #[test]
    fn sig_derivation_is_idempotent() {
        let once = derive_sig("Apply twice daily", Some(10), Some(2));
        let twice = derive_sig(&once, Some(10), Some(2));
        assert_eq!(once, twice);

        // Changing an input re-derives from the user text, not on top of
        // the old clauses.
        let changed = derive_sig(&once, Some(10), Some(0));
        assert_eq!(
            changed,
            "Apply twice daily Follow up in 10 days. 0 Refills allowed."
        );
    }

    #[test]
    fn zero_refills_is_explicit_not_absent() {
        let sig = derive_sig("Take with food", None, Some(0));
        assert_eq!(sig, "Take with food 0 Refills allowed.");

        let sig = derive_sig("Take with food", None, None);
        assert_eq!(sig, "Take with food");
    }

    #[test]
    fn strip_removes_all_known_clauses() {
        let text = "Use as directed. Follow up in 7 days. 3 Refills allowed. Quantity allowed: 30.";
        assert_eq!(strip_auto_clauses(text), "Use as directed.");
    }

    #[test]
    fn sig_from_empty_base_has_no_leading_space() {
        assert_eq!(derive_sig("", Some(5), None), "Follow up in 5 days.");
    }

    #[test]
    fn end_date_is_start_plus_duration() {
        assert_eq!(
            derive_end_date(Some(date("2024-01-10")), Some(10)),
            Some(date("2024-01-20"))
        );
        assert_eq!(derive_end_date(Some(date("2024-01-10")), None), None);
        assert_eq!(derive_end_date(None, Some(10)), None);
        // Zero duration is a same-day end, not an error.
        assert_eq!(
            derive_end_date(Some(date("2024-01-10")), Some(0)),
            Some(date("2024-01-10"))
        );
    }

    #[test]
    fn changing_duration_recomputes_end_date_only() {
        let mut l = line("Nitrofurantoin");
        l.start_date = Some(date("2024-01-10"));
        l.duration_days = Some(5);
        assert_eq!(
            derive_end_date(l.start_date, l.duration_days),
            Some(date("2024-01-15"))
        );

        l.duration_days = Some(7);
        assert_eq!(l.start_date, Some(date("2024-01-10")));
        assert_eq!(
            derive_end_date(l.start_date, l.duration_days),
            Some(date("2024-01-17"))
        );
    }

    #[test]
    fn rederive_updates_line_in_place() {
        let mut l = line("Mupirocin");
        l.instructions = "Apply to affected area".into();
        l.duration_days = Some(10);
        l.refills = Some(2);
        rederive_sig(&mut l);
        assert_eq!(
            l.instructions,
            "Apply to affected area Follow up in 10 days. 2 Refills allowed."
        );

        l.refills = Some(0);
        rederive_sig(&mut l);
        assert_eq!(
            l.instructions,
            "Apply to affected area Follow up in 10 days. 0 Refills allowed."
        );
    }

    #[test]
    fn catalog_seed_uses_template_and_rederives() {
        let mut l = line("");
        l.duration_days = Some(7);
        seed_from_catalog(
            &mut l,
            &CatalogDrug {
                name: "Mupirocin 2%".into(),
                dosage_form: "Ointment".into(),
                instruction_template: "Apply thin layer twice daily".into(),
            },
        );
        assert_eq!(l.drug_name, "Mupirocin 2%");
        assert_eq!(l.dosage_form, "Ointment");
        assert_eq!(
            l.instructions,
            "Apply thin layer twice daily Follow up in 7 days."
        );
    }

    #[test]
    fn gather_includes_named_in_progress_line() {
        let mut current = line("Cephalexin");
        current.duration_days = Some(7);
        current.quantity = Some(28);

        let lines = gather_lines(&[line("Mupirocin")], Some(&current)).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].drug_name, "Cephalexin");
    }

    #[test]
    fn gather_requires_duration_and_quantity_on_in_progress() {
        let mut current = line("Cephalexin");
        current.quantity = Some(28);
        let err = gather_lines(&[], Some(&current)).unwrap_err();
        assert!(matches!(err, PrescriptionError::MissingFields { .. }));
        assert!(err.to_string().contains("Cephalexin"));
    }

    #[test]
    fn gather_skips_unnamed_in_progress_line() {
        let empty = line("  ");
        assert!(matches!(
            gather_lines(&[], Some(&empty)),
            Err(PrescriptionError::EmptyBatch)
        ));
        let lines = gather_lines(&[line("Mupirocin")], Some(&empty)).unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn payload_carries_computed_end_date_and_fixed_blanks() {
        let mut l = line("Nitrofurantoin");
        l.start_date = Some(date("2024-01-10"));
        l.duration_days = Some(5);
        l.quantity = Some(10);
        l.refills = Some(1);

        let payload = to_payload(&l);
        assert_eq!(payload.start_date, "2024-01-10");
        assert_eq!(payload.end_date, "2024-01-15");
        assert_eq!(payload.duration, 5);
        assert_eq!(payload.quantity, 10);
        assert_eq!(payload.repeats, 1);
        assert_eq!(payload.route, "");
        assert_eq!(payload.frequency, "");
    }

    #[test]
    fn submit_preview_roundtrip_preserves_lines() {
        let mut a = line("Mupirocin");
        a.start_date = Some(date("2024-01-10"));
        a.duration_days = Some(10);
        a.quantity = Some(1);
        let mut b = line("Cephalexin");
        b.start_date = Some(date("2024-01-11"));
        b.duration_days = Some(7);
        b.quantity = Some(28);

        let lines = vec![a, b];
        let (payloads, batch) = build_batch(5, 42, &lines);

        assert_eq!(payloads.len(), batch.lines.len());
        for (payload, preview) in payloads.iter().zip(&batch.lines) {
            assert_eq!(payload.drug_name, preview.drug_name);
            assert_eq!(payload.quantity, preview.quantity);
            assert_eq!(payload.end_date, iso(preview.end_date));
        }
        assert_eq!(batch.demographic_no, 5);
        assert_eq!(batch.appointment_no, 42);
    }
}
