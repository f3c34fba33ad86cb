pub mod storage;

pub use storage::{
    AuditStore, NewStepRun, RecordedStepRun, SqliteAuditStore, StoreError, StoreResult,
};
