//! Appointment list handling: ordering and selection.
//!
//! The list is always presented newest-first — (date desc, start time
//! desc) — with ties left in wire order. Selecting an appointment is what
//! triggers the patient-detail fetch; the auto-selected row is the head
//! of the sorted list, since that is the row the user sees first.

use crate::models::Appointment;

/// Sort newest-first. `sort_by` is stable, so rows sharing a (date, time)
/// key keep their relative wire order across repeated sorts.
pub fn sort_appointments(mut appointments: Vec<Appointment>) -> Vec<Appointment> {
    appointments.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
    appointments
}

/// The appointment whose patient gets prefetched after a list load:
/// the first element of the sorted list.
pub fn auto_select(sorted: &[Appointment]) -> Option<&Appointment> {
    sorted.first()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentKind;
    use chrono::{NaiveDate, NaiveTime};

    fn appt(no: i64, demographic: i64, date: &str, time: &str) -> Appointment {
        Appointment {
            appointment_no: no,
            demographic_no: demographic,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            start_time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
            kind: AppointmentKind::New,
            reason: String::new(),
            patient_name: String::new(),
        }
    }

    #[test]
    fn sorts_date_desc_then_time_desc() {
        let sorted = sort_appointments(vec![
            appt(1, 5, "2024-01-02", "09:00"),
            appt(2, 7, "2024-01-03", "10:00"),
            appt(3, 9, "2024-01-03", "08:00"),
        ]);
        let order: Vec<i64> = sorted.iter().map(|a| a.appointment_no).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn no_earlier_entry_precedes_a_later_one() {
        let sorted = sort_appointments(vec![
            appt(1, 1, "2024-02-01", "09:00"),
            appt(2, 2, "2024-01-15", "16:30"),
            appt(3, 3, "2024-02-01", "11:00"),
            appt(4, 4, "2024-01-15", "08:00"),
        ]);
        for pair in sorted.windows(2) {
            assert!(pair[0].sort_key() >= pair[1].sort_key());
        }
    }

    #[test]
    fn ties_are_stable_across_repeated_sorts() {
        let input = vec![
            appt(1, 1, "2024-01-02", "09:00"),
            appt(2, 2, "2024-01-02", "09:00"),
            appt(3, 3, "2024-01-02", "09:00"),
        ];
        let once = sort_appointments(input.clone());
        let twice = sort_appointments(once.clone());
        assert_eq!(once, twice);
        let order: Vec<i64> = once.iter().map(|a| a.appointment_no).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn auto_select_takes_sorted_head() {
        // Raw order starts with the older appointment; the prefetch target
        // is the newest one, i.e. the row rendered at the top.
        let sorted = sort_appointments(vec![
            appt(1, 5, "2024-01-02", "09:00"),
            appt(2, 7, "2024-01-03", "10:00"),
        ]);
        assert_eq!(auto_select(&sorted).unwrap().demographic_no, 7);
        assert!(auto_select(&[]).is_none());
    }
}
