use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use bytes::Bytes;
use log::{debug, info};
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{RawMutex, RwLock};
use protocol::{AreaBuffer, MAX_AREA_SIZE};

use crate::components::AreaKey;
use crate::Error;

/// Exclusive access to one registered area, released on drop.
pub struct AreaGuard {
    key: AreaKey,
    guard: ArcMutexGuard<RawMutex, Box<[u8]>>,
}

impl AreaGuard {
    pub fn key(&self) -> AreaKey {
        self.key
    }

    pub fn unlock(self) {}
}

impl Deref for AreaGuard {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.guard
    }
}

impl DerefMut for AreaGuard {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.guard
    }
}

/// Buffers backing the emulated areas of one server.
///
/// Each buffer keeps the size it was registered with; every access copies
/// under the buffer's own lock.
#[derive(Default)]
pub struct AreaRegistry {
    areas: RwLock<HashMap<AreaKey, AreaBuffer>>,
}

impl AreaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, key: AreaKey, initial: &[u8]) -> Result<AreaBuffer, Error> {
        if initial.is_empty() {
            return Err(Error::InvalidArgument("area buffer must not be empty"));
        }
        if initial.len() > MAX_AREA_SIZE {
            return Err(Error::SizeLimitExceeded(initial.len()));
        }

        let mut areas = self.areas.write();
        if areas.contains_key(&key) {
            return Err(Error::AlreadyExists(key.area, key.index));
        }

        let buffer = AreaBuffer::new(initial);
        areas.insert(key, buffer.clone());
        info!("Area {:?} #{} registered with {} bytes", key.area, key.index, initial.len());
        Ok(buffer)
    }

    pub fn unregister(&self, key: AreaKey) -> Result<AreaBuffer, Error> {
        let buffer = self
            .areas
            .write()
            .remove(&key)
            .ok_or(Error::UnknownArea(key.area, key.index))?;
        info!("Area {:?} #{} unregistered", key.area, key.index);
        Ok(buffer)
    }

    pub fn contains(&self, key: AreaKey) -> bool {
        self.areas.read().contains_key(&key)
    }

    pub fn keys(&self) -> Vec<AreaKey> {
        let mut keys = self.areas.read().keys().copied().collect::<Vec<_>>();
        keys.sort();
        keys
    }

    fn buffer(&self, key: AreaKey) -> Result<AreaBuffer, Error> {
        self.areas
            .read()
            .get(&key)
            .cloned()
            .ok_or(Error::UnknownArea(key.area, key.index))
    }

    /// Copy of the whole area taken under its lock.
    pub fn get(&self, key: AreaKey) -> Result<Bytes, Error> {
        Ok(Bytes::from(self.buffer(key)?.to_vec()))
    }

    /// Replaces the whole area under its lock. The length must match the
    /// registered size.
    pub fn set(&self, key: AreaKey, data: &[u8]) -> Result<(), Error> {
        let buffer = self.buffer(key)?;
        if data.len() != buffer.len() {
            return Err(Error::SizeMismatch {
                expected: buffer.len(),
                actual: data.len(),
            });
        }
        buffer.lock().copy_from_slice(data);
        Ok(())
    }

    pub fn lock(&self, key: AreaKey) -> Result<AreaGuard, Error> {
        let buffer = self.buffer(key)?;
        Ok(AreaGuard {
            key,
            guard: buffer.lock_arc(),
        })
    }

    /// Writes `data` at `offset` when the area exists and the range fits.
    /// Returns whether anything was written.
    pub fn store(&self, key: AreaKey, offset: usize, data: &[u8]) -> bool {
        let Ok(buffer) = self.buffer(key) else {
            return false;
        };

        let mut area = buffer.lock();
        match area.get_mut(offset..offset + data.len()) {
            Some(range) => {
                range.copy_from_slice(data);
                true
            }
            None => {
                debug!("Range {}..{} outside of area {:?} #{}", offset, offset + data.len(), key.area, key.index);
                false
            }
        }
    }
}
