// Embedded scope store backed by RocksDB
// One column family per service namespace, created on demand

use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;
use rocksdb::{DBWithThreadMode, IteratorMode, MultiThreaded, Options};

use crate::model::ScopeConfig;
use crate::traits::ScopeStore;

type Db = DBWithThreadMode<MultiThreaded>;

/// Standalone embedded scope store using RocksDB
///
/// Keys are big-endian scope identifiers, values a single flag byte, so a
/// column family iterates in scope order for non-negative scopes.
pub struct EmbeddedScopeStore {
    db: Db,
    /// Guards column family creation
    create_lock: Mutex<()>,
}

impl EmbeddedScopeStore {
    /// Open (or create) the database at `path`, reopening every existing namespace
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cfs = match Db::list_cf(&db_opts, path) {
            Ok(cfs) => cfs,
            // No database yet
            Err(_) => vec![rocksdb::DEFAULT_COLUMN_FAMILY_NAME.to_string()],
        };

        let db = Db::open_cf(&db_opts, path, &cfs)
            .map_err(|e| anyhow::anyhow!("RocksDB open error at {}: {}", path.display(), e))?;

        tracing::info!(
            path = %path.display(),
            namespaces = cfs.len().saturating_sub(1),
            "Embedded scope store opened"
        );

        Ok(Self {
            db,
            create_lock: Mutex::new(()),
        })
    }

    fn encode_key(scope: i64) -> [u8; 8] {
        scope.to_be_bytes()
    }

    fn decode_row(key: &[u8], value: &[u8]) -> anyhow::Result<ScopeConfig> {
        let key: [u8; 8] = key
            .try_into()
            .map_err(|_| anyhow::anyhow!("malformed scope key of {} bytes", key.len()))?;
        let disabled = *value
            .first()
            .ok_or_else(|| anyhow::anyhow!("empty scope value"))?;
        Ok(ScopeConfig {
            scope: i64::from_be_bytes(key),
            disabled,
        })
    }
}

fn missing_namespace(namespace: &str) -> anyhow::Error {
    anyhow::anyhow!("namespace '{}' not found", namespace)
}

#[async_trait]
impl ScopeStore for EmbeddedScopeStore {
    async fn create_namespace(&self, namespace: &str) -> anyhow::Result<()> {
        let _guard = self.create_lock.lock();
        if self.db.cf_handle(namespace).is_some() {
            return Ok(());
        }
        self.db
            .create_cf(namespace, &Options::default())
            .map_err(|e| anyhow::anyhow!("RocksDB create column family '{}' error: {}", namespace, e))
    }

    async fn upsert(&self, namespace: &str, row: ScopeConfig) -> anyhow::Result<()> {
        let cf = self
            .db
            .cf_handle(namespace)
            .ok_or_else(|| missing_namespace(namespace))?;
        self.db
            .put_cf(&cf, Self::encode_key(row.scope), [row.disabled])
            .map_err(|e| anyhow::anyhow!("RocksDB put error: {}", e))
    }

    async fn find_one(&self, namespace: &str, scope: i64) -> anyhow::Result<Option<ScopeConfig>> {
        let cf = self
            .db
            .cf_handle(namespace)
            .ok_or_else(|| missing_namespace(namespace))?;
        let key = Self::encode_key(scope);
        let value = self
            .db
            .get_cf(&cf, key)
            .map_err(|e| anyhow::anyhow!("RocksDB get error: {}", e))?;
        value
            .map(|value| Self::decode_row(&key, &value))
            .transpose()
    }

    async fn list(&self, namespace: &str) -> anyhow::Result<Vec<ScopeConfig>> {
        let cf = self
            .db
            .cf_handle(namespace)
            .ok_or_else(|| missing_namespace(namespace))?;
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (key, value) = item.map_err(|e| anyhow::anyhow!("RocksDB iterate error: {}", e))?;
            rows.push(Self::decode_row(&key, &value)?);
        }
        rows.sort_by_key(|r| r.scope);
        Ok(rows)
    }
}
