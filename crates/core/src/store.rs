//! CSV-backed record store.
//!
//! A [`RecordStore`] owns the in-memory rows of one table together with the path of the
//! file they came from. The file is the only durable copy:
//!
//! - [`RecordStore::load`] reads the whole table (a missing file is an empty table)
//! - mutations ([`RecordStore::append`], [`RecordStore::retain`], ...) touch memory only
//! - [`RecordStore::save`] rewrites the whole file
//!
//! There is no hidden reload. Callers that need to see external edits call
//! [`RecordStore::reload`] explicitly; external edits made between load and save are lost.

use crate::records::{CredentialEntry, NoteRecord, VisitRecord};
use crate::{ClinicError, ClinicResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A row type that can be stored in a CSV table.
pub trait TableRecord: Serialize + DeserializeOwned {
    /// Called with the zero-based row position just before the row is written.
    fn set_position(&mut self, _position: usize) {}

    /// Column name and value that must not repeat within one table. Blank values are exempt.
    fn unique_key(&self) -> Option<(&'static str, &str)> {
        None
    }
}

impl TableRecord for VisitRecord {
    fn unique_key(&self) -> Option<(&'static str, &str)> {
        Some(("Visit_ID", self.visit_id.as_str()))
    }
}

impl TableRecord for NoteRecord {
    fn set_position(&mut self, position: usize) {
        self.index = Some(position as u64 + 1);
    }
}

impl TableRecord for CredentialEntry {}

/// Reads every row of the table at `path`.
///
/// A missing file is logged and read as an empty table. Missing columns are read as empty
/// strings.
///
/// # Errors
///
/// - `ClinicError::FileRead` if the file exists but cannot be opened
/// - `ClinicError::MalformedRecord` for a row with more fields than the header, one that
///   cannot be decoded (for example invalid UTF-8) or one repeating a unique key
pub fn load_table<R: TableRecord>(path: &Path) -> ClinicResult<Vec<R>> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!("file {} not found; treating as empty", path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(ClinicError::FileRead(e)),
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| malformed(path, &e, 1))?
        .clone();

    let mut records = Vec::new();
    let mut seen: HashMap<String, u64> = HashMap::new();
    for row in reader.records() {
        let mut row = row.map_err(|e| malformed(path, &e, 0))?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        if row.len() > headers.len() {
            return Err(ClinicError::MalformedRecord {
                path: path.to_path_buf(),
                line,
                reason: format!(
                    "row has {} fields but the header has {}",
                    row.len(),
                    headers.len()
                ),
            });
        }

        // Short rows are padded so trailing columns read as empty strings.
        while row.len() < headers.len() {
            row.push_field("");
        }

        let record = row
            .deserialize::<R>(Some(&headers))
            .map_err(|e| malformed(path, &e, line))?;

        if let Some((column, key)) = record.unique_key().filter(|(_, k)| !k.is_empty()) {
            if let Some(first) = seen.insert(key.to_string(), line) {
                return Err(ClinicError::MalformedRecord {
                    path: path.to_path_buf(),
                    line,
                    reason: format!("duplicate {} {} (first on line {})", column, key, first),
                });
            }
        }
        records.push(record);
    }

    tracing::debug!("loaded {} rows from {}", records.len(), path.display());
    Ok(records)
}

/// Rewrites the table at `path` with `records`.
///
/// Each row's position is stamped with [`TableRecord::set_position`] first. An empty slice
/// truncates the file to zero bytes. The parent directory is created if needed.
pub fn save_table<R: TableRecord>(path: &Path, records: &mut [R]) -> ClinicResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(ClinicError::FileWrite)?;
    }

    if records.is_empty() {
        fs::File::create(path).map_err(ClinicError::FileWrite)?;
        tracing::info!("{} emptied (no remaining records)", path.display());
        return Ok(());
    }

    let mut writer = csv::Writer::from_path(path).map_err(ClinicError::Csv)?;
    for (position, record) in records.iter_mut().enumerate() {
        record.set_position(position);
        writer.serialize(&*record).map_err(ClinicError::Csv)?;
    }
    writer.flush().map_err(ClinicError::FileWrite)?;

    tracing::info!("saved {} rows to {}", records.len(), path.display());
    Ok(())
}

fn malformed(path: &Path, err: &csv::Error, fallback_line: u64) -> ClinicError {
    let line = err
        .position()
        .map(|p| p.line())
        .unwrap_or(fallback_line);
    ClinicError::MalformedRecord {
        path: path.to_path_buf(),
        line,
        reason: err.to_string(),
    }
}

/// In-memory rows of one table bound to its backing file.
#[derive(Debug, Clone)]
pub struct RecordStore<R> {
    path: PathBuf,
    records: Vec<R>,
}

pub type VisitStore = RecordStore<VisitRecord>;
pub type NoteStore = RecordStore<NoteRecord>;

impl<R: TableRecord> RecordStore<R> {
    /// Loads the table at `path`. See [`load_table`].
    pub fn load(path: impl Into<PathBuf>) -> ClinicResult<Self> {
        let path = path.into();
        let records = load_table(&path)?;
        Ok(Self { path, records })
    }

    /// Binds `records` to `path` without touching the file.
    pub fn from_records(path: impl Into<PathBuf>, records: Vec<R>) -> Self {
        Self {
            path: path.into(),
            records,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Adds a row in memory. Call [`RecordStore::save`] to persist it.
    pub fn append(&mut self, record: R) {
        self.records.push(record);
    }

    /// Keeps only the rows matching `keep` and returns how many were removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&R) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(|r| keep(r));
        before - self.records.len()
    }

    /// Rewrites the backing file with the in-memory rows.
    pub fn save(&mut self) -> ClinicResult<()> {
        save_table(&self.path, &mut self.records)
    }

    /// Discards in-memory rows and re-reads the backing file.
    ///
    /// On error the in-memory rows are left untouched.
    pub fn reload(&mut self) -> ClinicResult<()> {
        self.records = load_table(&self.path)?;
        Ok(())
    }
}

impl RecordStore<VisitRecord> {
    /// All visits whose Patient_ID equals `patient_id` exactly, in list order.
    pub fn get(&self, patient_id: &str) -> Vec<&VisitRecord> {
        self.records
            .iter()
            .filter(|v| v.patient_id == patient_id)
            .collect()
    }

    pub fn patient_exists(&self, patient_id: &str) -> bool {
        self.records.iter().any(|v| v.patient_id == patient_id)
    }

    /// The visit `visit_id` of patient `patient_id`, both matched exactly.
    pub fn find_visit(&self, patient_id: &str, visit_id: &str) -> Option<&VisitRecord> {
        self.records
            .iter()
            .find(|v| v.patient_id == patient_id && v.visit_id == visit_id)
    }

    pub fn visit_ids(&self) -> HashSet<String> {
        self.records.iter().map(|v| v.visit_id.clone()).collect()
    }

    /// Note_IDs referenced from visit rows.
    pub fn note_ids(&self) -> HashSet<String> {
        self.records
            .iter()
            .filter(|v| !v.note_id.is_empty())
            .map(|v| v.note_id.clone())
            .collect()
    }
}

impl RecordStore<NoteRecord> {
    pub fn note_ids(&self) -> HashSet<String> {
        self.records.iter().map(|n| n.note_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const VISITS_CSV: &str = "\
Patient_ID,Visit_ID,Visit_time,Visit_department,Race,Gender,Ethnicity,Age,Zip_code,Insurance,Chief_complaint,Note_ID,Note_type
1,100001,1/2/2020,ER,White,F,Not Hispanic,34,02139,Aetna,Cough,200001,Progress
1,100002,3/4/2021 10:15:00,Cardiology,White,F,Not Hispanic,35,02139,Aetna,\"Chest pain, mild\",200002,Consult
2,100003,12-25-2019,ER,Black,M,Hispanic,61,10001,Medicare,Fever,200003,Progress
";

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_reads_all_fields() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "Patient_data.csv", VISITS_CSV);

        let store = VisitStore::load(&path).unwrap();
        assert_eq!(store.len(), 3);

        let second = &store.records()[1];
        assert_eq!(second.visit_id, "100002");
        assert_eq!(second.visit_time, "3/4/2021 10:15:00");
        assert_eq!(second.chief_complaint, "Chest pain, mild");
        assert_eq!(second.zip_code, "02139");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = VisitStore::load(temp.path().join("absent.csv")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_missing_columns_default_to_empty() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "v.csv", "Patient_ID,Visit_ID\n7,100010\n");

        let store = VisitStore::load(&path).unwrap();
        let visit = &store.records()[0];
        assert_eq!(visit.patient_id, "7");
        assert_eq!(visit.visit_time, "");
        assert_eq!(visit.chief_complaint, "");
    }

    #[test]
    fn test_load_short_row_defaults_trailing_fields() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "v.csv", "Patient_ID,Visit_ID,Visit_time\n7,100010\n");

        let store = VisitStore::load(&path).unwrap();
        assert_eq!(store.records()[0].visit_id, "100010");
        assert_eq!(store.records()[0].visit_time, "");
    }

    #[test]
    fn test_load_rejects_row_longer_than_header() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "v.csv", "Patient_ID,Visit_ID\n1,100001\n2,100002,extra\n");

        let err = VisitStore::load(&path).unwrap_err();
        match err {
            ClinicError::MalformedRecord { line, .. } => assert_eq!(line, 3),
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("v.csv");
        fs::write(&path, b"Patient_ID,Visit_ID\n1,\xff\xfe\n").unwrap();

        assert!(matches!(
            VisitStore::load(&path),
            Err(ClinicError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_save_then_load_round_trips_field_values() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "Patient_data.csv", VISITS_CSV);

        let mut store = VisitStore::load(&path).unwrap();
        let original = store.records().to_vec();
        store.save().unwrap();

        let reloaded = VisitStore::load(&path).unwrap();
        assert_eq!(reloaded.records(), original.as_slice());
    }

    #[test]
    fn test_round_trip_ignores_header_order() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            "v.csv",
            "Visit_time,Patient_ID,Visit_ID\n1/2/2020,5,100050\n",
        );

        let mut store = VisitStore::load(&path).unwrap();
        store.save().unwrap();

        let reloaded = VisitStore::load(&path).unwrap();
        assert_eq!(reloaded.records()[0].patient_id, "5");
        assert_eq!(reloaded.records()[0].visit_time, "1/2/2020");
    }

    #[test]
    fn test_save_empty_truncates_file() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "v.csv", VISITS_CSV);

        let mut store = VisitStore::load(&path).unwrap();
        store.retain(|_| false);
        store.save().unwrap();

        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
        assert!(VisitStore::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_save_writes_fixed_header() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sub").join("v.csv");
        let mut store = VisitStore::from_records(
            &path,
            vec![VisitRecord {
                patient_id: "1".into(),
                ..Default::default()
            }],
        );
        store.save().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with(
            "Patient_ID,Visit_ID,Visit_time,Visit_department,Race,Gender,Ethnicity,Age,Zip_code,Insurance,Chief_complaint,Note_ID,Note_type\n"
        ));
    }

    #[test]
    fn test_get_matches_patient_id_exactly() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "v.csv", VISITS_CSV);
        let store = VisitStore::load(&path).unwrap();

        assert_eq!(store.get("1").len(), 2);
        assert_eq!(store.get("2").len(), 1);
        assert!(store.get("1 ").is_empty());
        assert!(store.get("10").is_empty());
    }

    #[test]
    fn test_append_is_memory_only_until_save() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "v.csv", VISITS_CSV);
        let mut store = VisitStore::load(&path).unwrap();

        store.append(VisitRecord {
            patient_id: "3".into(),
            visit_id: "100004".into(),
            ..Default::default()
        });
        assert_eq!(store.len(), 4);
        assert_eq!(VisitStore::load(&path).unwrap().len(), 3);

        store.save().unwrap();
        assert_eq!(VisitStore::load(&path).unwrap().len(), 4);
    }

    #[test]
    fn test_reload_picks_up_external_edit() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "v.csv", VISITS_CSV);
        let mut store = VisitStore::load(&path).unwrap();

        fs::write(&path, "Patient_ID,Visit_ID\n9,100099\n").unwrap();
        assert_eq!(store.len(), 3);

        store.reload().unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.patient_exists("9"));
    }

    #[test]
    fn test_load_rejects_duplicate_visit_id() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            "v.csv",
            "Patient_ID,Visit_ID,Visit_time,Gender\n1,100001,1/2/2020,F\n2,100001,1/3/2020,M\n",
        );

        match VisitStore::load(&path).unwrap_err() {
            ClinicError::MalformedRecord { line, reason, .. } => {
                assert_eq!(line, 3);
                assert!(reason.contains("duplicate Visit_ID 100001"));
            }
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_load_allows_repeated_blank_visit_ids() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "v.csv", "Patient_ID,Visit_ID\n1,\n2,\n");

        assert_eq!(VisitStore::load(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_reload_rejects_duplicate_visit_id_and_keeps_rows() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "v.csv", VISITS_CSV);
        let mut store = VisitStore::load(&path).unwrap();

        fs::write(&path, "Patient_ID,Visit_ID\n1,100001\n2,100001\n").unwrap();
        assert!(matches!(
            store.reload(),
            Err(ClinicError::MalformedRecord { .. })
        ));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_notes_are_renumbered_on_save() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            "Notes.csv",
            ",Patient_ID,Visit_ID,Note_ID,Note_text\n4,1,100001,200001,First\n9,2,100003,200003,Second\n",
        );

        let mut notes = NoteStore::load(&path).unwrap();
        assert_eq!(notes.records()[0].index, Some(4));
        notes.save().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            ",Patient_ID,Visit_ID,Note_ID,Note_text\n1,1,100001,200001,First\n2,2,100003,200003,Second\n"
        );
    }

    #[test]
    fn test_notes_accept_legacy_column_names() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            "Notes.csv",
            "Entry_ID,Patient_ID,Visit_ID,Note_ID,Note\nx,1,100001,200001,Legacy text\n",
        );

        let notes = NoteStore::load(&path).unwrap();
        assert_eq!(notes.records()[0].text, "Legacy text");
        assert_eq!(notes.records()[0].index, None);
    }

    #[test]
    fn test_id_sets() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "v.csv", VISITS_CSV);
        let store = VisitStore::load(&path).unwrap();

        let visit_ids = store.visit_ids();
        assert!(visit_ids.contains("100001") && visit_ids.contains("100003"));
        assert_eq!(store.note_ids().len(), 3);
    }
}
