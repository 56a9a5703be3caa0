//! In-memory engine driver for testing and development.
//!
//! Stands in for the native library behind the same status-code protocol:
//! identifiers are derived from file content, features are normalized byte
//! histograms compared by cosine similarity, and inserts are staged until
//! `pull` commits them to the searchable set. Useful for exercising the
//! binding without linking `libotama`; it is not a real retrieval engine.

use std::fs;

use crate::driver::{EngineDriver, RawResults, Status};
use crate::error::Result;
use crate::id::{RECORD_ID_LEN, RecordId};
use crate::variant::Variant;

const HISTOGRAM_BINS: usize = 256;

/// One indexed record: content-derived id plus its feature histogram.
#[derive(Debug, Clone)]
struct Record {
    id: RecordId,
    feature: Vec<f64>,
}

/// Deterministic in-memory engine.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    opened: bool,
    database: Option<Database>,
}

#[derive(Debug, Default)]
struct Database {
    committed: Vec<Record>,
    pending: Vec<Record>,
}

impl MemoryDriver {
    /// Create a driver with no database.
    pub fn new() -> Self {
        MemoryDriver::default()
    }

    fn load_record(source: &str) -> std::io::Result<Record> {
        let bytes = fs::read(source)?;
        Ok(Record {
            id: content_id(&bytes),
            feature: histogram(&bytes),
        })
    }
}

/// Derive a record identifier from raw content.
///
/// Five salted CRC32 passes fill the 20-byte width. Collision resistance is
/// irrelevant here; the tests only need determinism.
fn content_id(bytes: &[u8]) -> RecordId {
    let mut octets = [0u8; RECORD_ID_LEN];
    for (i, chunk) in octets.chunks_exact_mut(4).enumerate() {
        let mut hasher = crc32fast::Hasher::new_with_initial(i as u32);
        hasher.update(&[i as u8]);
        hasher.update(bytes);
        chunk.copy_from_slice(&hasher.finalize().to_be_bytes());
    }
    RecordId::new(octets)
}

/// Normalized byte-value histogram as a stand-in feature vector.
fn histogram(bytes: &[u8]) -> Vec<f64> {
    let mut bins = vec![0.0f64; HISTOGRAM_BINS];
    for &b in bytes {
        bins[b as usize] += 1.0;
    }
    let norm = bins.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in &mut bins {
            *v /= norm;
        }
    }
    bins
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl EngineDriver for MemoryDriver {
    fn open(&mut self, _config: &str) -> Status {
        // The configuration locator is opaque; any string opens.
        self.opened = true;
        Status::Ok
    }

    fn close(&mut self) {
        self.opened = false;
        self.database = None;
    }

    fn create_database(&mut self) -> Status {
        if self.database.is_none() {
            self.database = Some(Database::default());
        }
        Status::Ok
    }

    fn drop_database(&mut self) -> Status {
        self.database = None;
        Status::Ok
    }

    fn pull(&mut self) -> Status {
        match self.database.as_mut() {
            Some(db) => {
                let staged = std::mem::take(&mut db.pending);
                db.committed.extend(staged);
                Status::Ok
            }
            None => Status::NoData,
        }
    }

    fn insert(&mut self, source: &str, id_out: &mut RecordId) -> Status {
        let Some(db) = self.database.as_mut() else {
            return Status::NoData;
        };
        match Self::load_record(source) {
            Ok(record) => {
                *id_out = record.id;
                db.pending.push(record);
                Status::Ok
            }
            Err(_) => Status::SysError,
        }
    }

    fn search(&mut self, limit: usize, source: &str) -> (Status, Option<Box<dyn RawResults>>) {
        if limit == 0 {
            return (Status::InvalidArguments, None);
        }
        let Some(db) = self.database.as_ref() else {
            return (Status::NoData, None);
        };
        let query = match Self::load_record(source) {
            Ok(record) => record,
            Err(_) => return (Status::SysError, None),
        };

        let mut scored: Vec<(RecordId, f64)> = db
            .committed
            .iter()
            .map(|r| (r.id, cosine(&r.feature, &query.feature)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);

        let rows = scored
            .into_iter()
            .map(|(id, sim)| {
                // Composite score object, the shape the drill policy expects.
                let value = Variant::Hash(vec![("similarity".to_string(), Variant::Float(sim))]);
                (id, value)
            })
            .collect();
        (Status::Ok, Some(Box::new(MemoryResults { rows })))
    }

    fn exists(&mut self, id: &RecordId, found_out: &mut bool) -> Status {
        match self.database.as_ref() {
            Some(db) => {
                *found_out = db.committed.iter().any(|r| r.id == *id);
                Status::Ok
            }
            None => Status::NoData,
        }
    }

    fn status_message(&self, status: Status) -> String {
        match status {
            Status::Ok => "OK".to_string(),
            Status::NoData => "no data available".to_string(),
            Status::InvalidArguments => "invalid arguments".to_string(),
            Status::AssertionFailure => "assertion failure".to_string(),
            Status::SysError => "system error".to_string(),
            Status::NotImplemented => "not implemented".to_string(),
            Status::Unknown(code) => format!("unknown status ({code})"),
        }
    }
}

struct MemoryResults {
    rows: Vec<(RecordId, Variant)>,
}

impl RawResults for MemoryResults {
    fn count(&self) -> usize {
        self.rows.len()
    }

    fn id_at(&self, index: usize) -> RecordId {
        self.rows[index].0
    }

    fn value_at(&self, index: usize) -> Result<Variant> {
        Ok(self.rows[index].1.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_id_is_deterministic() {
        assert_eq!(content_id(b"lena"), content_id(b"lena"));
        assert_ne!(content_id(b"lena"), content_id(b"baboon"));
    }

    #[test]
    fn test_identical_content_has_unit_similarity() {
        let h = histogram(b"some image bytes");
        assert!((cosine(&h, &h) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_insert_is_staged_until_pull() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        fs::write(&path, b"payload").unwrap();
        let source = path.to_str().unwrap();

        let mut driver = MemoryDriver::new();
        assert!(driver.open("").is_ok());
        assert!(driver.create_database().is_ok());

        let mut id = RecordId::default();
        assert!(driver.insert(source, &mut id).is_ok());

        let mut found = true;
        assert!(driver.exists(&id, &mut found).is_ok());
        assert!(!found, "insert must stay invisible until pull");

        assert!(driver.pull().is_ok());
        assert!(driver.exists(&id, &mut found).is_ok());
        assert!(found);
    }

    #[test]
    fn test_drop_database_clears_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        fs::write(&path, b"payload").unwrap();
        let source = path.to_str().unwrap();

        let mut driver = MemoryDriver::new();
        driver.open("");
        driver.create_database();
        let mut id = RecordId::default();
        driver.insert(source, &mut id);
        driver.pull();
        driver.drop_database();

        let mut found = false;
        assert_eq!(driver.exists(&id, &mut found), Status::NoData);
    }

    #[test]
    fn test_missing_source_is_a_system_error() {
        let mut driver = MemoryDriver::new();
        driver.open("");
        driver.create_database();
        let mut id = RecordId::default();
        assert_eq!(driver.insert("/no/such/file.jpg", &mut id), Status::SysError);
    }
}
