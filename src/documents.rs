//! Patient document templating.
//!
//! Deterministic string transforms: clinic + patient + content in, one
//! complete HTML document out, inline styles only (the webview converts
//! it to PDF; no external stylesheet may be assumed). No state, no side
//! effects — tested as pure functions.

use crate::config::{DRUG_LINES_PER_PAGE, MEDIA_BASE_URL};
use crate::models::{Clinic, Patient, SubmittedLine};

/// One titled block of question/answer pairs on the assessment document.
#[derive(Debug, Clone)]
pub struct QaSection {
    pub title: String,
    pub entries: Vec<(String, String)>,
}

/// Resolve the clinic logo to an image source. Absolute URLs pass
/// through; relative paths get the media host prefix; no logo, no image.
pub fn logo_src(logo: Option<&str>) -> Option<String> {
    let logo = logo?.trim();
    if logo.is_empty() {
        return None;
    }
    if logo.starts_with("http://") || logo.starts_with("https://") {
        Some(logo.to_string())
    } else {
        Some(format!("{}/{}", MEDIA_BASE_URL, logo.trim_start_matches('/')))
    }
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn document_open(title: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title></head>\
         <body style=\"font-family: Helvetica, Arial, sans-serif; font-size: 12px; \
         color: #222; margin: 24px;\">",
        escape(title)
    )
}

fn clinic_header(clinic: &Clinic) -> String {
    let mut html = String::from(
        "<div style=\"border-bottom: 2px solid #2a6ebb; padding-bottom: 8px; \
         margin-bottom: 12px; overflow: auto;\">",
    );
    if let Some(src) = logo_src(clinic.logo.as_deref()) {
        html.push_str(&format!(
            "<img src=\"{}\" alt=\"\" style=\"float: right; max-height: 56px;\">",
            escape(&src)
        ));
    }
    html.push_str(&format!(
        "<div style=\"font-size: 18px; font-weight: bold;\">{}</div>\
         <div>{}, {} {} {}</div><div>Tel: {} &nbsp; Fax: {}</div></div>",
        escape(&clinic.name),
        escape(&clinic.address),
        escape(&clinic.city),
        escape(&clinic.province),
        escape(&clinic.postal_code),
        escape(&clinic.phone),
        escape(&clinic.fax),
    ));
    html
}

fn patient_block(patient: &Patient) -> String {
    let dob = patient
        .date_of_birth
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    format!(
        "<div style=\"margin-bottom: 12px;\">\
         <span style=\"font-weight: bold;\">{}</span> \
         (PHN {}) &nbsp; DOB: {} &nbsp; Allergies: {}</div>",
        escape(&patient.full_name()),
        escape(&patient.phn),
        escape(&dob),
        escape(&patient.allergies_display()),
    )
}

/// Render the assessment document: clinic header, patient line, then one
/// table per Q&A section.
pub fn assessment_html(clinic: &Clinic, patient: &Patient, sections: &[QaSection]) -> String {
    let mut html = document_open("Assessment");
    html.push_str(&clinic_header(clinic));
    html.push_str(&patient_block(patient));

    for section in sections {
        html.push_str(&format!(
            "<div style=\"font-size: 14px; font-weight: bold; margin: 12px 0 4px 0;\">{}</div>\
             <table style=\"width: 100%; border-collapse: collapse;\">",
            escape(&section.title)
        ));
        for (question, answer) in &section.entries {
            html.push_str(&format!(
                "<tr><td style=\"border: 1px solid #ccc; padding: 4px; width: 55%;\">{}</td>\
                 <td style=\"border: 1px solid #ccc; padding: 4px;\">{}</td></tr>",
                escape(question),
                escape(answer),
            ));
        }
        html.push_str("</table>");
    }

    html.push_str("</body></html>");
    html
}

/// Render the prescription document. Paginated at a fixed per-page line
/// count; every page but the last ends with a "continued" footer.
pub fn prescription_html(
    clinic: &Clinic,
    patient: &Patient,
    lines: &[SubmittedLine],
    signature: &str,
) -> String {
    let mut html = document_open("Prescription");
    let pages: Vec<&[SubmittedLine]> = if lines.is_empty() {
        vec![&[]]
    } else {
        lines.chunks(DRUG_LINES_PER_PAGE).collect()
    };
    let last_page = pages.len() - 1;

    for (page_no, page) in pages.iter().enumerate() {
        let break_style = if page_no < last_page {
            "page-break-after: always;"
        } else {
            ""
        };
        html.push_str(&format!("<div style=\"{break_style}\">"));
        html.push_str(&clinic_header(clinic));
        html.push_str(&patient_block(patient));

        for line in page.iter() {
            let dates = match (line.start_date, line.end_date) {
                (Some(start), Some(end)) => format!("{start} to {end}"),
                (Some(start), None) => start.to_string(),
                _ => String::new(),
            };
            html.push_str(&format!(
                "<div style=\"border-bottom: 1px dashed #999; padding: 6px 0;\">\
                 <div style=\"font-weight: bold;\">{} {}</div>\
                 <div>{}</div>\
                 <div>Qty: {} &nbsp; Repeats: {} &nbsp; {}</div></div>",
                escape(&line.drug_name),
                escape(&line.dosage_form),
                escape(&line.instructions),
                line.quantity,
                line.refills,
                escape(&dates),
            ));
        }

        if page_no < last_page {
            html.push_str(
                "<div style=\"margin-top: 16px; font-style: italic; text-align: center;\">\
                 Continued on next page</div>",
            );
        } else {
            html.push_str(&format!(
                "<div style=\"margin-top: 32px;\">\
                 <div style=\"border-top: 1px solid #222; width: 220px; padding-top: 4px;\">{}\
                 </div></div>",
                escape(signature),
            ));
        }
        html.push_str("</div>");
    }

    html.push_str("</body></html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clinic() -> Clinic {
        Clinic {
            subdomain: "123virtual1".into(),
            name: "Virtual One Clinic".into(),
            address: "12 Main St".into(),
            city: "Toronto".into(),
            province: "ON".into(),
            postal_code: "M1M 1M1".into(),
            phone: "416-555-0100".into(),
            fax: "416-555-0101".into(),
            logo: None,
        }
    }

    fn patient() -> Patient {
        Patient {
            demographic_no: 5,
            first_name: "Ada".into(),
            last_name: "Nguyen".into(),
            phn: "9876".into(),
            allergies: vec!["penicillin".into()],
            ..Default::default()
        }
    }

    fn rx_line(name: &str) -> SubmittedLine {
        SubmittedLine {
            drug_name: name.into(),
            dosage_form: "Tablet".into(),
            quantity: 10,
            start_date: None,
            end_date: None,
            refills: 0,
            instructions: "Take one daily".into(),
        }
    }

    #[test]
    fn logo_absolute_url_passes_through() {
        assert_eq!(
            logo_src(Some("https://cdn.example/logo.png")).as_deref(),
            Some("https://cdn.example/logo.png")
        );
    }

    #[test]
    fn logo_relative_path_gets_media_prefix() {
        let src = logo_src(Some("clinics/one/logo.png")).unwrap();
        assert_eq!(src, format!("{MEDIA_BASE_URL}/clinics/one/logo.png"));
        // Leading slash does not double up.
        let src = logo_src(Some("/clinics/one/logo.png")).unwrap();
        assert_eq!(src, format!("{MEDIA_BASE_URL}/clinics/one/logo.png"));
    }

    #[test]
    fn missing_logo_omits_img_tag() {
        assert!(logo_src(None).is_none());
        assert!(logo_src(Some("  ")).is_none());
        let html = assessment_html(&clinic(), &patient(), &[]);
        assert!(!html.contains("<img"));
    }

    #[test]
    fn assessment_document_is_deterministic_and_complete() {
        let sections = vec![QaSection {
            title: "Scope Assessment — In Scope".into(),
            entries: vec![("Any fever?".into(), "no".into())],
        }];
        let a = assessment_html(&clinic(), &patient(), &sections);
        let b = assessment_html(&clinic(), &patient(), &sections);
        assert_eq!(a, b);
        assert!(a.contains("Virtual One Clinic"));
        assert!(a.contains("Ada Nguyen"));
        assert!(a.contains("Any fever?"));
        assert!(a.contains("penicillin"));
        assert!(a.starts_with("<!DOCTYPE html>"));
        assert!(a.ends_with("</body></html>"));
        // Inline styles only.
        assert!(!a.contains("<link"));
        assert!(!a.contains("stylesheet"));
    }

    #[test]
    fn prescription_paginates_at_five_lines() {
        let lines: Vec<SubmittedLine> = (0..7).map(|i| rx_line(&format!("Drug {i}"))).collect();
        let html = prescription_html(&clinic(), &patient(), &lines, "Dr. Jones");

        assert_eq!(html.matches("Continued on next page").count(), 1);
        assert_eq!(html.matches("page-break-after: always").count(), 1);
        // Header repeats per page.
        assert_eq!(html.matches("Virtual One Clinic").count(), 2);
        // Signature only on the last page.
        assert_eq!(html.matches("Dr. Jones").count(), 1);
    }

    #[test]
    fn prescription_single_page_has_no_continuation_footer() {
        let lines: Vec<SubmittedLine> = (0..5).map(|i| rx_line(&format!("Drug {i}"))).collect();
        let html = prescription_html(&clinic(), &patient(), &lines, "Dr. Jones");
        assert!(!html.contains("Continued on next page"));
        assert_eq!(html.matches("Virtual One Clinic").count(), 1);
    }

    #[test]
    fn markup_in_names_is_escaped() {
        let mut bad = rx_line("Amox <script>alert(1)</script>");
        bad.instructions = "1 tab & water".into();
        let html = prescription_html(&clinic(), &patient(), &[bad], "Dr. Jones");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("1 tab &amp; water"));
    }
}
