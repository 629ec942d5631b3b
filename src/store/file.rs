use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::error::StoreError;
use crate::model::{AttendanceRecord, DeviceBinding};

use super::memory::upsert;
use super::{BindingStore, RecordSink, RecordSource};

fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Bindings persisted as a JSON object `{ "<employee>": "<device>" }`,
/// rewritten whole on every mutation. Key order is registration order.
///
/// The file is replaced through a temporary sibling and a rename, and the
/// cached copy only changes once that succeeds.
#[derive(Debug)]
pub struct JsonBindingStore {
    path: PathBuf,
    bindings: RwLock<Vec<DeviceBinding>>,
}

fn decode_bindings(bytes: &[u8]) -> Result<Vec<DeviceBinding>, StoreError> {
    let map: Map<String, Value> = serde_json::from_slice(bytes)?;
    map.into_iter()
        .map(|(employee_id, device)| match device {
            Value::String(device_id) => Ok(DeviceBinding {
                employee_id,
                device_id,
            }),
            other => Err(StoreError::Corrupt(format!(
                "device for '{employee_id}' is not a string: {other}"
            ))),
        })
        .collect()
}

fn encode_bindings(bindings: &[DeviceBinding]) -> Map<String, Value> {
    bindings
        .iter()
        .map(|b| (b.employee_id.clone(), Value::String(b.device_id.clone())))
        .collect()
}

impl JsonBindingStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let bindings = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => decode_bindings(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), count = bindings.len(), "Loaded device bindings");

        Ok(Self {
            path,
            bindings: RwLock::new(bindings),
        })
    }

    fn persist(&self, bindings: &[DeviceBinding]) -> Result<(), StoreError> {
        ensure_parent(&self.path)?;
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp)?;
            serde_json::to_writer_pretty(&mut file, &encode_bindings(bindings))?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "Persisted device bindings");
        Ok(())
    }

    fn mutate(&self, f: impl FnOnce(&mut Vec<DeviceBinding>) -> bool) -> Result<bool, StoreError> {
        let mut current = self.bindings.write();
        let mut next = current.clone();
        let changed = f(&mut next);
        if changed {
            self.persist(&next)?;
            *current = next;
        }
        Ok(changed)
    }
}

impl BindingStore for JsonBindingStore {
    fn get(&self, employee_id: &str) -> Result<Option<DeviceBinding>, StoreError> {
        Ok(self
            .bindings
            .read()
            .iter()
            .find(|b| b.employee_id == employee_id)
            .cloned())
    }

    fn put(&self, binding: DeviceBinding) -> Result<(), StoreError> {
        self.mutate(|bindings| {
            upsert(bindings, binding);
            true
        })?;
        Ok(())
    }

    fn delete(&self, employee_id: &str) -> Result<bool, StoreError> {
        self.mutate(|bindings| {
            let before = bindings.len();
            bindings.retain(|b| b.employee_id != employee_id);
            bindings.len() != before
        })
    }

    fn scan(&self) -> Result<Vec<DeviceBinding>, StoreError> {
        Ok(self.bindings.read().clone())
    }
}

/// An append-only log file that can be cut back to an earlier length.
trait LogFile: Write {
    fn current_len(&self) -> io::Result<u64>;
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl LogFile for File {
    fn current_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

/// Write one whole line or nothing: a failed write is cut back so the next
/// line starts on a clean boundary.
fn append_line<F: LogFile>(file: &mut F, line: &[u8]) -> Result<(), StoreError> {
    let len = file.current_len()?;
    if let Err(e) = file.write_all(line).and_then(|()| file.sync()) {
        if let Err(undo) = file.truncate_to(len) {
            error!(error = %undo, "Failed to roll back partial record");
        }
        return Err(e.into());
    }
    Ok(())
}

/// Drop a trailing line with no newline, left by an interrupted append.
/// Returns the number of bytes removed.
fn truncate_torn_tail(file: &mut File) -> io::Result<u64> {
    let len = file.metadata()?.len();
    let mut buf = [0u8; 4096];
    let mut end = len;
    let mut keep = 0;

    while end > 0 {
        let start = end.saturating_sub(buf.len() as u64);
        let chunk = &mut buf[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(chunk)?;
        if let Some(pos) = chunk.iter().rposition(|&b| b == b'\n') {
            keep = start + pos as u64 + 1;
            break;
        }
        end = start;
    }

    if keep < len {
        file.set_len(keep)?;
        file.sync_data()?;
    }
    Ok(len - keep)
}

/// Records appended one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesRecordStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesRecordStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        ensure_parent(&path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        let dropped = truncate_torn_tail(&mut file)?;
        if dropped > 0 {
            warn!(path = %path.display(), bytes = dropped, "Dropped incomplete trailing record");
        }

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }
}

impl RecordSink for JsonLinesRecordStore {
    fn append(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = self.file.lock();
        append_line(&mut *file, &line)
    }
}

impl RecordSource for JsonLinesRecordStore {
    fn records(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        // hold the writer lock so a half-written line is never read
        let _writer = self.file.lock();
        let reader = BufReader::new(File::open(&self.path)?);

        let mut records = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line)
                .map_err(|e| StoreError::Corrupt(format!("line {}: {e}", idx + 1)))?;
            records.push(record);
        }
        Ok(records)
    }
}
