//! Aggregate statistics over visit records.
//!
//! Three independent frequency tables are produced from the full visit list. Rendering is
//! handed to a [`ChartSink`]; the shipped sink is [`clinic_files::ChartArtifacts`], which
//! writes each table as a CSV into the day's statistics folder.

use crate::constants::{COMPLAINTS_CHART, DEPARTMENTS_CHART, UNKNOWN_DEPARTMENT, YEARLY_CHART};
use crate::dates::flexible_date;
use crate::records::VisitRecord;
use crate::ClinicResult;
use chrono::Datelike;
use clinic_files::{ChartArtifact, ChartArtifacts, ChartKind};
use clinic_types::FrequencyTable;
use std::collections::BTreeMap;

pub const COMPLAINTS_TITLE: &str = "Occurrences of Chief Complaints";
pub const DEPARTMENTS_TITLE: &str = "Department Visit Counts";
pub const YEARLY_TITLE: &str = "Visits per Year";

/// Destination for rendered statistics tables.
pub trait ChartSink {
    /// Output produced per table, e.g. the written file.
    type Output;

    fn render(
        &mut self,
        name: &str,
        kind: ChartKind,
        table: &FrequencyTable,
    ) -> ClinicResult<Self::Output>;
}

impl ChartSink for ChartArtifacts {
    type Output = ChartArtifact;

    fn render(
        &mut self,
        name: &str,
        kind: ChartKind,
        table: &FrequencyTable,
    ) -> ClinicResult<ChartArtifact> {
        Ok(self.write_table(name, kind, table)?)
    }
}

/// Visits per Chief_complaint, in order of first occurrence. Blank complaints are skipped.
pub fn count_by_complaint(records: &[VisitRecord]) -> FrequencyTable {
    let mut table = FrequencyTable::new(COMPLAINTS_TITLE);
    for complaint in records.iter().map(|v| v.chief_complaint.trim()) {
        if !complaint.is_empty() {
            table.increment(complaint);
        }
    }
    table
}

/// Visits per Visit_department, in order of first occurrence.
///
/// Blank departments are counted under `Unknown`.
pub fn count_by_department(records: &[VisitRecord]) -> FrequencyTable {
    let mut table = FrequencyTable::new(DEPARTMENTS_TITLE);
    for visit in records {
        let department = visit.visit_department.trim();
        if department.is_empty() {
            table.increment(UNKNOWN_DEPARTMENT);
        } else {
            table.increment(department);
        }
    }
    table
}

/// Visits per calendar year of Visit_time, ascending by year.
///
/// Blank times are skipped; times no layout can read are skipped with a warning.
pub fn count_by_year(records: &[VisitRecord]) -> FrequencyTable {
    let mut years: BTreeMap<i32, u64> = BTreeMap::new();
    for visit in records {
        let raw = visit.visit_time.trim();
        if raw.is_empty() {
            continue;
        }
        match flexible_date(raw) {
            Some(date) => *years.entry(date.year()).or_default() += 1,
            None => tracing::warn!(
                "skipping visit {} with unreadable Visit_time '{}'",
                visit.visit_id,
                raw
            ),
        }
    }

    FrequencyTable::from_pairs(
        YEARLY_TITLE,
        years.into_iter().map(|(year, n)| (year.to_string(), n)),
    )
}

/// The three statistics tables of one run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StatisticsReport {
    pub complaints: FrequencyTable,
    pub departments: FrequencyTable,
    pub years: FrequencyTable,
}

impl StatisticsReport {
    pub fn from_records(records: &[VisitRecord]) -> Self {
        Self {
            complaints: count_by_complaint(records),
            departments: count_by_department(records),
            years: count_by_year(records),
        }
    }

    /// Renders every table into `sink`.
    ///
    /// The yearly chart is skipped when no visit has a readable year.
    pub fn generate_all<S: ChartSink>(&self, sink: &mut S) -> ClinicResult<Vec<S::Output>> {
        let mut outputs = vec![
            sink.render(COMPLAINTS_CHART, ChartKind::Bar, &self.complaints)?,
            sink.render(DEPARTMENTS_CHART, ChartKind::Bar, &self.departments)?,
        ];

        if self.years.is_empty() {
            tracing::info!("no valid visit years; skipping '{}'", YEARLY_TITLE);
        } else {
            outputs.push(sink.render(YEARLY_CHART, ChartKind::Line, &self.years)?);
        }

        Ok(outputs)
    }
}
