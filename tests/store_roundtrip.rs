use std::io;

use led_driver_calculator::{
    model::{CalculationInputs, CalculationRecord, CalculationResults},
    store::{
        CalculationStore, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StoreError,
        STORAGE_KEY,
    },
    units::LengthUnit,
};

fn record(name: &str, voltage: f64) -> CalculationRecord {
    let results: CalculationResults = serde_json::from_value(serde_json::json!({
        "power": voltage * 2.0, "current": 2.0, "recommended": 2.4,
        "total_length_meters": 5.0, "wire_gauge": "22 AWG", "max_run": 6.0,
        "standard_driver": "3A"
    }))
    .expect("results");
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
fn added_records_survive_reload() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = CalculationStore::open(FileKeyValueStore::new(dir.path()));
    assert!(store.is_empty());
    store.add(record("Kitchen", 12.0)).expect("add");
    store.add(record("Hall", 24.0)).expect("add");

    let reopened = CalculationStore::open(FileKeyValueStore::new(dir.path()));
    assert_eq!(reopened.records(), store.records());
    assert_eq!(reopened.get(1).map(|r| r.name.as_str()), Some("Hall"));
    assert_eq!(reopened.get(1).map(|r| r.results.power), Some(48.0));
}

#[test]
fn delete_shifts_later_indices() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = CalculationStore::open(FileKeyValueStore::new(dir.path()));
    for (name, v) in [("A", 5.0), ("B", 12.0), ("C", 24.0)] {
        store.add(record(name, v)).expect("add");
    }
    let removed = store.delete_at(1).expect("delete");
    assert_eq!(removed.map(|r| r.name), Some("B".to_string()));
    let names: Vec<_> = store.records().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["A", "C"]);

    let reopened = CalculationStore::open(FileKeyValueStore::new(dir.path()));
    assert_eq!(reopened.get(1).map(|r| r.name.as_str()), Some("C"));
}

#[test]
fn out_of_range_delete_is_noop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = CalculationStore::open(FileKeyValueStore::new(dir.path()));
    store.add(record("only", 12.0)).expect("add");
    assert!(store.delete_at(5).expect("delete").is_none());
    assert_eq!(store.len(), 1);
}

#[test]
fn blank_name_gets_sequence_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = CalculationStore::open(FileKeyValueStore::new(dir.path()));
    store.add(record("first", 12.0)).expect("add");
    store.add(record("second", 12.0)).expect("add");
    let idx = store.add(record("   ", 12.0)).expect("add");
    assert_eq!(store.get(idx).map(|r| r.name.as_str()), Some("Calculation 3"));
}

#[test]
fn corrupted_slot_starts_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut backend = FileKeyValueStore::new(dir.path());
    backend.write(STORAGE_KEY, "{not json").expect("write");
    let mut store = CalculationStore::open(backend);
    assert!(store.is_empty());
    // 깨진 슬롯은 다음 저장 때 덮어쓴다.
    store.add(record("fresh", 12.0)).expect("add");
    let reopened = CalculationStore::open(FileKeyValueStore::new(dir.path()));
    assert_eq!(reopened.len(), 1);
}

proptest::proptest! {
    #[test]
    fn reload_preserves_order(names in proptest::collection::vec("[a-z]{0,8}", 0..12)) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = CalculationStore::open(FileKeyValueStore::new(dir.path()));
        for (i, name) in names.iter().enumerate() {
            store.add(record(name, i as f64 + 1.0)).expect("add");
        }
        let reopened = CalculationStore::open(FileKeyValueStore::new(dir.path()));
        proptest::prop_assert_eq!(reopened.records(), store.records());
    }
}

#[test]
fn clear_removes_slot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = CalculationStore::open(FileKeyValueStore::new(dir.path()));
    store.add(record("x", 12.0)).expect("add");
    store.clear().expect("clear");
    assert!(store.is_empty());
    assert_eq!(store.backend().read(STORAGE_KEY).expect("read"), None);
}

/// 스위치를 켜면 쓰기/삭제가 실패하는 저장소.
#[derive(Default)]
struct FailingStore {
    inner: MemoryKeyValueStore,
    broken: bool,
}

impl KeyValueStore for FailingStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.broken {
            return Err(io::Error::other("disk full").into());
        }
        self.inner.write(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.broken {
            return Err(io::Error::other("disk full").into());
        }
        self.inner.remove(key)
    }
}

fn persisted_len(store: &CalculationStore<FailingStore>) -> usize {
    store
        .backend()
        .read(STORAGE_KEY)
        .expect("read")
        .map(|raw| {
            serde_json::from_str::<Vec<CalculationRecord>>(&raw)
                .expect("decode")
                .len()
        })
        .unwrap_or(0)
}

#[test]
fn failed_write_leaves_memory_untouched() {
    let mut store = CalculationStore::open(FailingStore::default());
    store.add(record("kept", 12.0)).expect("add");
    store.add(record("second", 24.0)).expect("add");
    let before = store.records().to_vec();

    let mut broken = CalculationStore::new(FailingStore {
        inner: store.backend().inner.clone(),
        broken: true,
    });
    broken.load_all();
    assert_eq!(broken.records(), before.as_slice());

    assert!(matches!(broken.add(record("lost", 5.0)), Err(StoreError::Io(_))));
    assert_eq!(broken.records(), before.as_slice());
    assert_eq!(persisted_len(&broken), 2);

    assert!(broken.delete_at(0).is_err());
    assert_eq!(broken.records(), before.as_slice());
    assert_eq!(persisted_len(&broken), 2);

    assert!(broken.clear().is_err());
    assert_eq!(broken.len(), 2);
    assert_eq!(persisted_len(&broken), 2);
}
