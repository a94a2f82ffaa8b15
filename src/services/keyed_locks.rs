//! Bloqueos por clave
//!
//! Un mutex asíncrono por conductor y por vehículo. Cada operación adquiere
//! todas sus claves en orden ascendente y mantiene los guards durante la
//! verificación y el commit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LockKey {
    Driver(Uuid),
    Vehicle(Uuid),
}

type LockTable = HashMap<LockKey, Arc<Mutex<()>>>;

#[derive(Clone, Default)]
pub struct KeyedLocks {
    table: Arc<StdMutex<LockTable>>,
}

/// Guards retenidos; al soltarse libera los mutex y poda las entradas libres
pub struct KeyedGuard {
    keys: Vec<LockKey>,
    guards: Vec<OwnedMutexGuard<()>>,
    table: Arc<StdMutex<LockTable>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: LockKey) -> Arc<Mutex<()>> {
        let mut table = self.table.lock().unwrap_or_else(|p| p.into_inner());
        table.entry(key).or_default().clone()
    }

    /// Adquiere todas las claves (ordenadas y sin duplicados)
    pub async fn acquire<I>(&self, keys: I) -> KeyedGuard
    where
        I: IntoIterator<Item = LockKey>,
    {
        let mut keys: Vec<LockKey> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            let mutex = self.entry(*key);
            guards.push(mutex.lock_owned().await);
        }
        debug!("🔒 Bloqueos adquiridos: {:?}", keys);

        KeyedGuard {
            keys,
            guards,
            table: self.table.clone(),
        }
    }

    /// Número de claves registradas en este momento
    pub fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for KeyedGuard {
    fn drop(&mut self) {
        self.guards.clear();
        let mut table = self.table.lock().unwrap_or_else(|p| p.into_inner());
        for key in &self.keys {
            // Solo la tabla conserva la referencia: nadie la usa ni la espera
            let unused = table
                .get(key)
                .map_or(false, |mutex| Arc::strong_count(mutex) == 1);
            if unused {
                table.remove(key);
            }
        }
    }
}
