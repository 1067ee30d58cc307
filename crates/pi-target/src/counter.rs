//! Counter operations and their dispatch to device backends.
//!
//! A [`CounterTarget`] is one device backend. The [`PiDispatcher`] keeps
//! the backend assigned to each device and forwards every counter call to
//! the backend of `dev_tgt.device_id`, arguments and result unchanged.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::{debug, warn};
use pi_types::P4Id;

use crate::error::{PiError, PiResult};
use crate::types::{CounterData, CounterReadFlags, DevTgt, EntryHandle, SessionHandle};

/// Counter capability of a device backend.
///
/// Indirect counters are addressed by `(counter_id, index)`, direct
/// counters by `(counter_id, entry)`.
pub trait CounterTarget: Send + Sync {
    fn counter_read(
        &self,
        session: SessionHandle,
        dev_tgt: DevTgt,
        counter_id: P4Id,
        index: usize,
        flags: CounterReadFlags,
    ) -> PiResult<CounterData>;

    fn counter_write(
        &self,
        session: SessionHandle,
        dev_tgt: DevTgt,
        counter_id: P4Id,
        index: usize,
        data: &CounterData,
    ) -> PiResult<()>;

    fn counter_read_direct(
        &self,
        session: SessionHandle,
        dev_tgt: DevTgt,
        counter_id: P4Id,
        entry: EntryHandle,
        flags: CounterReadFlags,
    ) -> PiResult<CounterData>;

    fn counter_write_direct(
        &self,
        session: SessionHandle,
        dev_tgt: DevTgt,
        counter_id: P4Id,
        entry: EntryHandle,
        data: &CounterData,
    ) -> PiResult<()>;
}

/// Routes counter operations to the backend assigned to each device.
#[derive(Default)]
pub struct PiDispatcher {
    targets: RwLock<HashMap<u64, Arc<dyn CounterTarget>>>,
}

impl PiDispatcher {
    /// Creates a dispatcher with no devices assigned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `target` as the backend of `device_id`.
    pub fn assign_device(&self, device_id: u64, target: Arc<dyn CounterTarget>) -> PiResult<()> {
        let mut targets = self.targets.write().unwrap_or_else(|e| e.into_inner());
        if targets.contains_key(&device_id) {
            return Err(PiError::DevAlreadyAssigned { device_id });
        }
        targets.insert(device_id, target);
        debug!("Assigned device {} to a counter target", device_id);
        Ok(())
    }

    /// Removes the backend of `device_id`, returning it.
    pub fn remove_device(&self, device_id: u64) -> PiResult<Arc<dyn CounterTarget>> {
        let mut targets = self.targets.write().unwrap_or_else(|e| e.into_inner());
        let target = targets
            .remove(&device_id)
            .ok_or(PiError::DevNotAssigned { device_id })?;
        debug!("Removed device {}", device_id);
        Ok(target)
    }

    /// Returns true if `device_id` has a backend.
    pub fn is_assigned(&self, device_id: u64) -> bool {
        self.targets
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&device_id)
    }

    fn target(&self, dev_tgt: DevTgt) -> PiResult<Arc<dyn CounterTarget>> {
        let targets = self.targets.read().unwrap_or_else(|e| e.into_inner());
        match targets.get(&dev_tgt.device_id) {
            Some(target) => Ok(Arc::clone(target)),
            None => {
                warn!("Counter operation on unassigned {}", dev_tgt);
                Err(PiError::DevNotAssigned {
                    device_id: dev_tgt.device_id,
                })
            }
        }
    }

    pub fn counter_read(
        &self,
        session: SessionHandle,
        dev_tgt: DevTgt,
        counter_id: P4Id,
        index: usize,
        flags: CounterReadFlags,
    ) -> PiResult<CounterData> {
        debug!(
            "counter_read {} {} counter {} index {} flags {:?}",
            session, dev_tgt, counter_id, index, flags
        );
        self.target(dev_tgt)?
            .counter_read(session, dev_tgt, counter_id, index, flags)
    }

    pub fn counter_write(
        &self,
        session: SessionHandle,
        dev_tgt: DevTgt,
        counter_id: P4Id,
        index: usize,
        data: &CounterData,
    ) -> PiResult<()> {
        debug!(
            "counter_write {} {} counter {} index {}",
            session, dev_tgt, counter_id, index
        );
        self.target(dev_tgt)?
            .counter_write(session, dev_tgt, counter_id, index, data)
    }

    pub fn counter_read_direct(
        &self,
        session: SessionHandle,
        dev_tgt: DevTgt,
        counter_id: P4Id,
        entry: EntryHandle,
        flags: CounterReadFlags,
    ) -> PiResult<CounterData> {
        debug!(
            "counter_read_direct {} {} counter {} {} flags {:?}",
            session, dev_tgt, counter_id, entry, flags
        );
        self.target(dev_tgt)?
            .counter_read_direct(session, dev_tgt, counter_id, entry, flags)
    }

    pub fn counter_write_direct(
        &self,
        session: SessionHandle,
        dev_tgt: DevTgt,
        counter_id: P4Id,
        entry: EntryHandle,
        data: &CounterData,
    ) -> PiResult<()> {
        debug!(
            "counter_write_direct {} {} counter {} {}",
            session, dev_tgt, counter_id, entry
        );
        self.target(dev_tgt)?
            .counter_write_direct(session, dev_tgt, counter_id, entry, data)
    }
}

impl std::fmt::Debug for PiDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let targets = self.targets.read().unwrap_or_else(|e| e.into_inner());
        let mut devices: Vec<_> = targets.keys().copied().collect();
        devices.sort_unstable();
        f.debug_struct("PiDispatcher").field("devices", &devices).finish()
    }
}
