use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use derive_more::Display;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::{debug, info, warn};

use crate::model::attendance::{AttendanceEntry, AttendanceRecord, Month};

/// date ("YYYY-MM-DD") -> records submitted for that day, in the order the
/// dates were first saved
pub type OfficeDays = IndexMap<String, Vec<AttendanceRecord>>;
/// office -> its days, in the order the offices were first saved
pub type AttendanceDocument = IndexMap<String, OfficeDays>;

#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "failed to read {}: {}", path, source)]
    Read { path: String, source: io::Error },
    #[display(fmt = "failed to parse {}: {}", path, source)]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[display(fmt = "failed to serialize attendance document: {}", _0)]
    Serialize(serde_json::Error),
    #[display(fmt = "failed to write {}: {}", path, source)]
    Write { path: String, source: io::Error },
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Read { source, .. } | StoreError::Write { source, .. } => Some(source),
            StoreError::Parse { source, .. } | StoreError::Serialize(source) => Some(source),
        }
    }
}

/// Attendance for every office, persisted as one JSON document.
///
/// The whole document lives in memory. Every mutation re-reads the file,
/// applies the change and rewrites the file in full before the in-memory
/// copy is replaced, so writes from another process to other offices or
/// dates survive. Two writers to the same office and date: last one wins.
pub struct AttendanceStore {
    path: PathBuf,
    data: RwLock<AttendanceDocument>,
}

impl AttendanceStore {
    /// Loads the document at `path`. A missing, unreadable or malformed
    /// document yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match read_document(&path) {
            Ok(Some(document)) => {
                info!(
                    path = %path.display(),
                    offices = document.len(),
                    "Attendance document loaded"
                );
                document
            }
            Ok(None) => {
                info!(path = %path.display(), "No attendance document yet, starting empty");
                AttendanceDocument::new()
            }
            Err(e) => {
                warn!(error = %e, "Attendance document unusable, starting empty");
                AttendanceDocument::new()
            }
        };

        Self {
            path,
            data: RwLock::new(data),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the in-memory document over the persisted one. Offices and
    /// dates keep the order they were loaded or first saved in.
    pub fn save(&self) -> Result<(), StoreError> {
        let data = self.read();
        write_document(&self.path, &data)
    }

    /// Saves the in-memory document if nothing is persisted at the path yet.
    /// Returns whether a file was created.
    pub fn ensure_persisted(&self) -> Result<bool, StoreError> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save().map(|()| true)
    }

    /// Replaces the records stored for `office` on `date` and persists the
    /// result. Nothing changes in memory if the write fails.
    pub fn mark_attendance(
        &self,
        office: &str,
        date: &str,
        records: Vec<AttendanceRecord>,
    ) -> Result<(), StoreError> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);

        let mut next = match read_document(&self.path) {
            Ok(Some(on_disk)) => on_disk,
            Ok(None) => data.clone(),
            Err(e) => {
                warn!(error = %e, "Reload before write failed, using in-memory copy");
                data.clone()
            }
        };

        let count = records.len();
        next.entry(office.to_string())
            .or_default()
            .insert(date.to_string(), records);

        write_document(&self.path, &next)?;
        *data = next;

        debug!(office, date, records = count, "Attendance marked");
        Ok(())
    }

    /// All records of one office in stored date order, optionally limited to a month.
    pub fn get_office_attendance(&self, office: &str, month: Option<Month>) -> Vec<AttendanceEntry> {
        flatten_office(&self.read(), office, month)
    }

    /// Records of every office present in the store, office by office.
    pub fn get_all_attendance(&self, month: Option<Month>) -> Vec<AttendanceEntry> {
        let data = self.read();
        data.keys()
            .flat_map(|office| flatten_office(&data, office, month))
            .collect()
    }

    pub fn get_daily_roster(&self, office: &str, date: &str) -> Option<Vec<AttendanceRecord>> {
        self.read()
            .get(office)
            .and_then(|days| days.get(date))
            .cloned()
    }

    /// Offices that have records stored for `date`.
    pub fn offices_reported(&self, date: &str) -> Vec<String> {
        self.read()
            .iter()
            .filter(|(_, days)| days.contains_key(date))
            .map(|(office, _)| office.clone())
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, AttendanceDocument> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn flatten_office(
    data: &AttendanceDocument,
    office: &str,
    month: Option<Month>,
) -> Vec<AttendanceEntry> {
    let Some(days) = data.get(office) else {
        return Vec::new();
    };

    days.iter()
        .filter(|(date, _)| month.is_none_or(|m| m.matches_key(date)))
        .flat_map(|(date, records)| {
            records.iter().map(move |record| AttendanceEntry {
                date: date.clone(),
                office: office.to_string(),
                record: record.clone(),
            })
        })
        .collect()
}

/// `Ok(None)` when there is no document yet.
fn read_document(path: &Path) -> Result<Option<AttendanceDocument>, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.display().to_string(),
                source,
            });
        }
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StoreError::Parse {
            path: path.display().to_string(),
            source,
        })
}

fn to_pretty_json(data: &AttendanceDocument) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut bytes, PrettyFormatter::with_indent(b"    "));
    data.serialize(&mut serializer)?;
    Ok(bytes)
}

/// Writes to a sibling temp file and renames it over `path`.
fn write_document(path: &Path, data: &AttendanceDocument) -> Result<(), StoreError> {
    let bytes = to_pretty_json(data).map_err(StoreError::Serialize)?;
    let write_err = |source: io::Error| StoreError::Write {
        path: path.display().to_string(),
        source,
    };

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("attendance");
    let tmp_name = format!(".{}.tmp.{}", file_name, std::process::id());
    let tmp = match parent {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    };

    let written = fs::File::create(&tmp).and_then(|mut f| {
        f.write_all(&bytes)?;
        f.sync_all()
    });
    if let Err(e) = written.and_then(|_| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::Status;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> AttendanceStore {
        AttendanceStore::load(dir.path().join("attendance_data.json"))
    }

    fn present(name: &str, time: &str) -> AttendanceRecord {
        AttendanceRecord::new(name, Status::Present, time)
    }

    fn absent(name: &str) -> AttendanceRecord {
        AttendanceRecord::new(name, Status::Absent, "")
    }

    fn month(value: &str) -> Option<Month> {
        Some(value.parse().unwrap())
    }

    #[test]
    fn missing_document_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.get_all_attendance(None).is_empty());
    }

    #[test]
    fn corrupt_document_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("attendance_data.json");
        fs::write(&path, "{ not json").unwrap();

        let store = AttendanceStore::load(&path);
        assert!(store.get_all_attendance(None).is_empty());
    }

    #[test]
    fn save_of_loaded_document_keeps_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("attendance_data.json");
        let original = r#"{
    "Koraput": {
        "2024-01-11": [
            {
                "Employee_Name": "X",
                "Status": "Leave",
                "In_Time": "",
                "Remarks": ""
            }
        ],
        "2024-01-10": []
    },
    "Hyderabad": {
        "2024-01-10": [
            {
                "Employee_Name": "A",
                "Status": "Present",
                "In_Time": "09:15",
                "Remarks": "site visit"
            },
            {
                "Employee_Name": "B",
                "Status": "Half-day",
                "In_Time": "",
                "Remarks": ""
            }
        ]
    },
    "Annavaram": {}
}"#;
        fs::write(&path, original).unwrap();

        let store = AttendanceStore::load(&path);
        store.save().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn offices_and_dates_keep_stored_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("attendance_data.json");
        fs::write(
            &path,
            r#"{"Koraput": {"2024-01-10": []}, "Annavaram": {"2024-01-10": []}}"#,
        )
        .unwrap();

        let store = AttendanceStore::load(&path);
        assert_eq!(store.offices_reported("2024-01-10"), ["Koraput", "Annavaram"]);

        store
            .mark_attendance("Koraput", "2024-01-05", vec![absent("X")])
            .unwrap();
        store
            .mark_attendance("Annavaram", "2024-01-10", vec![absent("Y")])
            .unwrap();
        store
            .mark_attendance("Hyderabad", "2024-01-10", vec![absent("A")])
            .unwrap();

        let entries = store.get_all_attendance(None);
        let keys: Vec<_> = entries
            .iter()
            .map(|e| (e.office.as_str(), e.date.as_str()))
            .collect();
        assert_eq!(
            keys,
            [
                ("Koraput", "2024-01-05"),
                ("Annavaram", "2024-01-10"),
                ("Hyderabad", "2024-01-10"),
            ]
        );
        assert_eq!(
            store.offices_reported("2024-01-10"),
            ["Koraput", "Annavaram", "Hyderabad"]
        );
    }

    #[test]
    fn ensure_persisted_creates_missing_document_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("attendance_data.json");
        let store = AttendanceStore::load(&path);

        assert!(store.ensure_persisted().unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");

        store
            .mark_attendance("Koraput", "2024-01-10", vec![absent("X")])
            .unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(!store.ensure_persisted().unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), written);
    }

    #[test]
    fn ensure_persisted_reports_unwritable_location() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "x").unwrap();

        let store = AttendanceStore::load(blocker.join("attendance_data.json"));
        assert!(matches!(store.ensure_persisted(), Err(StoreError::Write { .. })));
    }

    #[test]
    fn document_is_pretty_printed_with_four_spaces() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .mark_attendance("Koraput", "2024-02-01", vec![absent("Ajay Mishra")])
            .unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("{\n    \"Koraput\": {\n        \"2024-02-01\": ["));
    }

    #[test]
    fn marking_twice_with_same_records_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let records = vec![present("A", "09:15"), absent("B")];

        store
            .mark_attendance("Hyderabad", "2024-01-10", records.clone())
            .unwrap();
        let once = store.get_office_attendance("Hyderabad", None);
        store
            .mark_attendance("Hyderabad", "2024-01-10", records)
            .unwrap();

        assert_eq!(store.get_office_attendance("Hyderabad", None), once);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn marking_again_overwrites_the_whole_day() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store
            .mark_attendance("Hyderabad", "2024-01-10", vec![present("A", "09:15"), absent("B")])
            .unwrap();
        store
            .mark_attendance("Hyderabad", "2024-01-10", vec![absent("C")])
            .unwrap();

        let records: Vec<_> = store
            .get_office_attendance("Hyderabad", None)
            .into_iter()
            .map(|e| e.record)
            .collect();
        assert_eq!(records, vec![absent("C")]);
    }

    #[test]
    fn duplicate_names_are_stored_as_submitted() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .mark_attendance("Hyderabad", "2024-01-10", vec![absent("A"), absent("A")])
            .unwrap();
        assert_eq!(store.get_daily_roster("Hyderabad", "2024-01-10").unwrap().len(), 2);
    }

    #[test]
    fn marking_one_office_leaves_others_untouched() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .mark_attendance("Koraput", "2024-01-10", vec![absent("Ajay Mishra")])
            .unwrap();
        let koraput = store.get_office_attendance("Koraput", None);

        store
            .mark_attendance("Hyderabad", "2024-01-10", vec![present("A", "09:00")])
            .unwrap();

        assert_eq!(store.get_office_attendance("Koraput", None), koraput);
    }

    #[test]
    fn unknown_office_yields_no_records() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .mark_attendance("Hyderabad", "2024-01-10", vec![absent("A")])
            .unwrap();

        assert!(store.get_office_attendance("NoSuchOffice", None).is_empty());
        assert!(store.get_daily_roster("NoSuchOffice", "2024-01-10").is_none());
    }

    #[test]
    fn month_filter_keeps_only_that_month() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .mark_attendance("Hyderabad", "2024-03-01", vec![absent("A")])
            .unwrap();
        store
            .mark_attendance("Hyderabad", "2024-03-15", vec![absent("B")])
            .unwrap();
        store
            .mark_attendance("Hyderabad", "2024-04-01", vec![absent("C")])
            .unwrap();

        let march = store.get_office_attendance("Hyderabad", month("2024-03"));
        let dates: Vec<_> = march.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, ["2024-03-01", "2024-03-15"]);
    }

    #[test]
    fn month_filter_does_not_match_by_prefix() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .mark_attendance("Hyderabad", "2024-01-05", vec![absent("A")])
            .unwrap();
        store
            .mark_attendance("Hyderabad", "2024-10-05", vec![absent("B")])
            .unwrap();

        let january = store.get_office_attendance("Hyderabad", month("2024-01"));
        assert_eq!(january.len(), 1);
        assert_eq!(january[0].date, "2024-01-05");
    }

    #[test]
    fn all_attendance_tags_records_with_office_and_date() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .mark_attendance("Hyderabad", "2024-01-10", vec![present("A", "09:15"), absent("B")])
            .unwrap();

        let entries = store.get_all_attendance(month("2024-01"));
        assert_eq!(
            entries,
            vec![
                AttendanceEntry {
                    date: "2024-01-10".into(),
                    office: "Hyderabad".into(),
                    record: present("A", "09:15"),
                },
                AttendanceEntry {
                    date: "2024-01-10".into(),
                    office: "Hyderabad".into(),
                    record: absent("B"),
                },
            ]
        );
        assert!(store.get_all_attendance(month("2024-02")).is_empty());
    }

    #[test]
    fn offices_reported_lists_offices_with_a_roster_for_the_date() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .mark_attendance("Koraput", "2024-01-10", vec![absent("X")])
            .unwrap();
        store
            .mark_attendance("Hyderabad", "2024-01-11", vec![absent("A")])
            .unwrap();

        assert_eq!(store.offices_reported("2024-01-10"), ["Koraput"]);
    }

    #[test]
    fn reload_before_write_keeps_other_writers_changes() {
        let dir = TempDir::new().unwrap();
        let first = store_in(&dir);
        let second = store_in(&dir);

        first
            .mark_attendance("Koraput", "2024-01-10", vec![absent("X")])
            .unwrap();
        second
            .mark_attendance("Hyderabad", "2024-01-10", vec![absent("A")])
            .unwrap();

        let reopened = store_in(&dir);
        assert_eq!(reopened.get_office_attendance("Koraput", None).len(), 1);
        assert_eq!(reopened.get_office_attendance("Hyderabad", None).len(), 1);
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let dir = TempDir::new().unwrap();
        // a directory where the document should be makes the rename fail
        let path = dir.path().join("attendance_data.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupied"), "x").unwrap();

        let store = AttendanceStore::load(&path);
        let result = store.mark_attendance("Hyderabad", "2024-01-10", vec![absent("A")]);

        assert!(matches!(result, Err(StoreError::Write { .. })));
        assert!(store.get_all_attendance(None).is_empty());
    }
}
