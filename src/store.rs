//! 저장된 계산 목록과 로컬 키-값 영속 슬롯.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::model::CalculationRecord;

/// 저장 목록을 담는 고정 슬롯 키.
pub const STORAGE_KEY: &str = "ledCalculations";

/// 영속화 중 발생 가능한 오류.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("저장소 입출력 오류: {0}")]
    Io(#[from] std::io::Error),
    #[error("저장 목록 직렬화 오류: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 키 -> 문자열 슬롯을 제공하는 로컬 영속 저장소.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// 디렉터리 아래 `<key>.json` 파일 하나에 슬롯을 저장한다.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.slot_path(key);
        // 중간에 끊겨도 이전 내용이 남도록 임시 파일에 쓴 뒤 교체한다.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.slot_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// 메모리 전용 슬롯. 테스트와 `--no-persist` 실행에서 쓴다.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    slots: HashMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.slots.remove(key);
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).write(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// 삽입 순서를 유지하는 저장 계산 목록.
///
/// 변경 연산은 반환 전에 전체 목록을 슬롯에 다시 쓴다. 쓰기가 실패하면 메모리
/// 목록도 바뀌지 않으므로 호출이 끝난 시점의 두 상태는 항상 같다.
#[derive(Debug)]
pub struct CalculationStore<S> {
    backend: S,
    records: Vec<CalculationRecord>,
}

impl<S: KeyValueStore> CalculationStore<S> {
    /// 비어 있는 목록으로 시작한다. 기존 데이터는 `load_all`로 읽는다.
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            records: Vec::new(),
        }
    }

    /// 생성과 동시에 슬롯에서 목록을 읽는다.
    pub fn open(backend: S) -> Self {
        let mut store = Self::new(backend);
        store.load_all();
        store
    }

    /// 슬롯 내용으로 메모리 목록을 통째로 교체한다.
    /// 없거나 깨진 데이터는 빈 목록으로 취급한다.
    pub fn load_all(&mut self) {
        self.records = match self.backend.read(STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CalculationRecord>>(&raw) {
                Ok(records) => records,
                Err(e) => {
                    warn!(error = %e, "saved calculations are corrupted; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "saved calculations could not be read; starting empty");
                Vec::new()
            }
        };
        debug!(count = self.records.len(), "saved calculations loaded");
    }

    /// 목록 끝에 추가한다. 이름이 비어 있으면 "Calculation N"을 붙인다.
    pub fn add(&mut self, mut record: CalculationRecord) -> Result<usize, StoreError> {
        if record.name.trim().is_empty() {
            record.name = format!("Calculation {}", self.records.len() + 1);
        }
        let mut next = self.records.clone();
        next.push(record);
        self.commit(next)?;
        let index = self.records.len() - 1;
        info!(name = %self.records[index].name, index, "saved calculation");
        Ok(index)
    }

    pub fn get(&self, index: usize) -> Option<&CalculationRecord> {
        self.records.get(index)
    }

    /// 위치로 삭제한다. 범위를 벗어나면 아무 일도 하지 않는다.
    pub fn delete_at(&mut self, index: usize) -> Result<Option<CalculationRecord>, StoreError> {
        if index >= self.records.len() {
            debug!(index, "delete ignored: index out of range");
            return Ok(None);
        }
        let mut next = self.records.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        info!(name = %removed.name, index, "deleted calculation");
        Ok(Some(removed))
    }

    /// 목록과 슬롯을 모두 비운다.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.backend.remove(STORAGE_KEY)?;
        self.records.clear();
        info!("cleared saved calculations");
        Ok(())
    }

    pub fn records(&self) -> &[CalculationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// 후보 목록을 슬롯에 쓰고, 성공했을 때만 메모리 목록으로 교체한다.
    fn commit(&mut self, next: Vec<CalculationRecord>) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(&next)?;
        self.backend.write(STORAGE_KEY, &encoded)?;
        self.records = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CalculationInputs, CalculationResults};
    use crate::units::LengthUnit;

    fn record(name: &str, voltage: f64) -> CalculationRecord {
        let results: CalculationResults = serde_json::from_value(serde_json::json!({
            "power": 24.0,
            "current": 2.0,
            "recommended": 2.4,
            "total_length_meters": 5.0,
            "wire_gauge": "22 AWG",
            "max_run": 6.0
        }))
        .unwrap();
        let mut rec = CalculationRecord::new(
            CalculationInputs {
                voltage,
                density: 60,
                length: 5.0,
                length_unit: LengthUnit::Meter,
                pieces: 1,
            },
            results,
        );
        rec.name = name.to_string();
        rec
    }

    #[test]
    fn auto_names_use_next_position() {
        let mut store = CalculationStore::new(MemoryKeyValueStore::new());
        store.add(record("", 5.0)).unwrap();
        store.add(record("kitchen", 12.0)).unwrap();
        store.add(record("   ", 24.0)).unwrap();
        let names: Vec<_> = store.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Calculation 1", "kitchen", "Calculation 3"]);
    }

    #[test]
    fn every_mutation_is_persisted() {
        let mut store = CalculationStore::new(MemoryKeyValueStore::new());
        store.add(record("a", 5.0)).unwrap();
        store.add(record("b", 12.0)).unwrap();
        store.delete_at(0).unwrap();
        let raw = store.backend().read(STORAGE_KEY).unwrap().unwrap();
        let persisted: Vec<CalculationRecord> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, store.records());
    }

    #[test]
    fn corrupted_slot_loads_empty() {
        let mut backend = MemoryKeyValueStore::new();
        backend.write(STORAGE_KEY, "{not json").unwrap();
        let store = CalculationStore::open(backend);
        assert!(store.is_empty());
    }

    #[test]
    fn clear_removes_slot() {
        let mut store = CalculationStore::new(MemoryKeyValueStore::new());
        store.add(record("a", 5.0)).unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.backend().read(STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn file_slot_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let mut kv = FileKeyValueStore::new(dir.path().join("nested"));
        assert_eq!(kv.read("k").unwrap(), None);
        kv.write("k", "[1,2]").unwrap();
        assert_eq!(kv.read("k").unwrap().as_deref(), Some("[1,2]"));
        kv.remove("k").unwrap();
        kv.remove("k").unwrap();
        assert_eq!(kv.read("k").unwrap(), None);
    }
}
