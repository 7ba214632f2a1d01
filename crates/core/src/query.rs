//! Read-only queries over visit and note records.

use crate::dates::{flexible_date, format_visit_date, parse_visit_date};
use crate::records::{NoteRecord, VisitRecord};
use chrono::NaiveDate;
use std::collections::HashSet;

/// Counts the records whose Visit_time falls on `date`.
///
/// Only the canonical layouts are recognised (see [`parse_visit_date`]); records with any
/// other Visit_time are skipped. Time of day is ignored.
pub fn count_by_date<'a>(records: impl IntoIterator<Item = &'a VisitRecord>, date: NaiveDate) -> usize {
    let mut skipped = 0usize;
    let count = records
        .into_iter()
        .filter(|v| match parse_visit_date(&v.visit_time) {
            Some(d) => d == date,
            None => {
                skipped += 1;
                false
            }
        })
        .count();

    if skipped > 0 {
        tracing::debug!("count_by_date skipped {} unparseable visit times", skipped);
    }
    count
}

/// All visits of `patient_id`, in list order.
pub fn patient_visits<'a>(records: &'a [VisitRecord], patient_id: &str) -> Vec<&'a VisitRecord> {
    records
        .iter()
        .filter(|v| v.patient_id == patient_id)
        .collect()
}

/// The patient's most recent visit.
///
/// Visit times are read with the flexible parser; an unparseable time counts as the
/// earliest possible date, so it never beats a real one. Among visits on the latest
/// calendar date, the last one in list order wins.
///
/// Returns `None` only if the patient has no visits.
pub fn most_recent_visit<'a>(records: &'a [VisitRecord], patient_id: &str) -> Option<&'a VisitRecord> {
    let dated: Vec<(NaiveDate, &VisitRecord)> = patient_visits(records, patient_id)
        .into_iter()
        .map(|v| (flexible_date(&v.visit_time).unwrap_or(NaiveDate::MIN), v))
        .collect();

    let latest = dated.iter().map(|(d, _)| *d).max()?;
    dated
        .into_iter()
        .filter(|(d, _)| *d == latest)
        .map(|(_, v)| v)
        .last()
}

/// Visit_IDs of the patient's visits stored with Visit_time exactly `M/D/YYYY` for `date`.
pub fn visit_ids_on<'a>(
    records: &'a [VisitRecord],
    patient_id: &str,
    date: NaiveDate,
) -> HashSet<&'a str> {
    let formatted = format_visit_date(date);
    records
        .iter()
        .filter(|v| v.patient_id == patient_id && v.visit_time == formatted)
        .map(|v| v.visit_id.as_str())
        .collect()
}

/// Notes of `patient_id` attached to a visit in `visit_ids`.
pub fn notes_for_visits<'a>(
    notes: &'a [NoteRecord],
    patient_id: &str,
    visit_ids: &HashSet<&str>,
) -> Vec<&'a NoteRecord> {
    notes
        .iter()
        .filter(|n| n.patient_id == patient_id && visit_ids.contains(n.visit_id.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit(patient: &str, id: &str, time: &str) -> VisitRecord {
        VisitRecord {
            patient_id: patient.into(),
            visit_id: id.into(),
            visit_time: time.into(),
            ..Default::default()
        }
    }

    fn note(patient: &str, visit: &str, note: &str, text: &str) -> NoteRecord {
        NoteRecord {
            index: None,
            patient_id: patient.into(),
            visit_id: visit.into(),
            note_id: note.into(),
            text: text.into(),
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_count_by_date_ignores_time_of_day() {
        let store = vec![visit("1", "A", "1/2/2020"), visit("1", "B", "1/2/2020 10:00:00")];
        assert_eq!(count_by_date(&store, ymd(2020, 1, 2)), 2);
    }

    #[test]
    fn test_count_by_date_skips_unrecognised_layouts() {
        let store = vec![
            visit("1", "A", "1/2/2020"),
            visit("2", "B", "2020-01-02"),
            visit("3", "C", "garbage"),
            visit("4", "D", ""),
            visit("5", "E", "01-02-2020"),
            visit("6", "F", "1/3/2020"),
        ];
        assert_eq!(count_by_date(&store, ymd(2020, 1, 2)), 2);
        assert_eq!(count_by_date(&store, ymd(2020, 1, 3)), 1);
        assert_eq!(count_by_date(&store, ymd(1999, 1, 1)), 0);
    }

    #[test]
    fn test_most_recent_visit_picks_latest_date() {
        let store = vec![
            visit("1", "A", "1/2/2020"),
            visit("1", "B", "2021-06-30"),
            visit("2", "C", "12/31/2030"),
            visit("1", "D", "3/4/2019"),
        ];
        assert_eq!(most_recent_visit(&store, "1").unwrap().visit_id, "B");
    }

    #[test]
    fn test_most_recent_visit_ties_go_to_last_in_order() {
        let store = vec![
            visit("1", "A", "5/5/2022 18:00:00"),
            visit("1", "B", "1/1/2020"),
            visit("1", "C", "5/5/2022 08:00:00"),
        ];
        // Same calendar date: the later list position wins even with an earlier time.
        assert_eq!(most_recent_visit(&store, "1").unwrap().visit_id, "C");
    }

    #[test]
    fn test_most_recent_visit_unparseable_never_outranks_real_date() {
        let store = vec![
            visit("1", "A", "1/2/2020"),
            visit("1", "B", "unknown"),
        ];
        assert_eq!(most_recent_visit(&store, "1").unwrap().visit_id, "A");
    }

    #[test]
    fn test_most_recent_visit_all_unparseable_returns_last() {
        let store = vec![visit("1", "A", "??"), visit("1", "B", "")];
        assert_eq!(most_recent_visit(&store, "1").unwrap().visit_id, "B");
    }

    #[test]
    fn test_most_recent_visit_is_idempotent() {
        let store = vec![
            visit("1", "A", "1/2/2020"),
            visit("1", "B", "1/2/2020"),
            visit("1", "C", "1/1/2020"),
        ];
        let first = most_recent_visit(&store, "1").map(|v| v.visit_id.clone());
        let second = most_recent_visit(&store, "1").map(|v| v.visit_id.clone());
        assert_eq!(first, second);
        assert_eq!(first.as_deref(), Some("B"));
    }

    #[test]
    fn test_most_recent_visit_unknown_patient() {
        let store = vec![visit("1", "A", "1/2/2020")];
        assert!(most_recent_visit(&store, "2").is_none());
    }

    #[test]
    fn test_visit_ids_on_uses_exact_stored_format() {
        let store = vec![
            visit("1", "A", "1/2/2020"),
            visit("1", "B", "01/02/2020"),
            visit("1", "C", "1/2/2020 10:00:00"),
            visit("2", "D", "1/2/2020"),
        ];

        let ids = visit_ids_on(&store, "1", ymd(2020, 1, 2));
        assert_eq!(ids, HashSet::from(["A"]));
    }

    #[test]
    fn test_notes_for_visits_requires_patient_match() {
        let store = vec![visit("1", "A", "1/2/2020"), visit("1", "B", "1/2/2020")];
        let notes = vec![
            note("1", "A", "N1", "first"),
            note("1", "B", "N2", "second"),
            note("2", "A", "N3", "wrong patient"),
            note("1", "Z", "N4", "other visit"),
        ];

        let ids = visit_ids_on(&store, "1", ymd(2020, 1, 2));
        let found: Vec<&str> = notes_for_visits(&notes, "1", &ids)
            .into_iter()
            .map(|n| n.text.as_str())
            .collect();
        assert_eq!(found, vec!["first", "second"]);
    }
}
