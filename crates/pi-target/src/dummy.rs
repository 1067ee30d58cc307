//! In-memory counter backend.

use std::collections::HashMap;
use std::sync::Mutex;

use log::trace;
use pi_types::P4Id;

use crate::counter::CounterTarget;
use crate::error::{PiError, PiResult};
use crate::types::{CounterData, CounterReadFlags, DevTgt, EntryHandle, SessionHandle};

type IndirectKey = (u64, P4Id, usize);
type DirectKey = (u64, P4Id, EntryHandle);

/// A [`CounterTarget`] that keeps counters in memory.
///
/// Counters never written read as zero. Useful for tests and for running
/// without hardware.
#[derive(Debug, Default)]
pub struct DummyTarget {
    indirect: Mutex<HashMap<IndirectKey, CounterData>>,
    direct: Mutex<HashMap<DirectKey, CounterData>>,
    /// Cells per indirect counter, if bounded.
    size: Option<usize>,
}

impl DummyTarget {
    /// Creates a backend with unbounded counter arrays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend whose indirect counters hold `size` cells each.
    pub fn with_size(size: usize) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    fn check_index(&self, counter_id: P4Id, index: usize) -> PiResult<()> {
        match self.size {
            Some(size) if index >= size => Err(PiError::invalid_argument(format!(
                "index {} out of range for counter {} (size {})",
                index, counter_id, size
            ))),
            _ => Ok(()),
        }
    }

    fn zero() -> CounterData {
        CounterData::new(0, 0)
    }
}

impl CounterTarget for DummyTarget {
    fn counter_read(
        &self,
        _session: SessionHandle,
        dev_tgt: DevTgt,
        counter_id: P4Id,
        index: usize,
        _flags: CounterReadFlags,
    ) -> PiResult<CounterData> {
        self.check_index(counter_id, index)?;
        let counters = self.indirect.lock().unwrap_or_else(|e| e.into_inner());
        let data = counters
            .get(&(dev_tgt.device_id, counter_id, index))
            .copied()
            .unwrap_or_else(Self::zero);
        trace!("read counter {}[{}] = {:?}", counter_id, index, data);
        Ok(data)
    }

    fn counter_write(
        &self,
        _session: SessionHandle,
        dev_tgt: DevTgt,
        counter_id: P4Id,
        index: usize,
        data: &CounterData,
    ) -> PiResult<()> {
        self.check_index(counter_id, index)?;
        let mut counters = self.indirect.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .entry((dev_tgt.device_id, counter_id, index))
            .or_insert_with(Self::zero)
            .apply(data);
        Ok(())
    }

    fn counter_read_direct(
        &self,
        _session: SessionHandle,
        dev_tgt: DevTgt,
        counter_id: P4Id,
        entry: EntryHandle,
        _flags: CounterReadFlags,
    ) -> PiResult<CounterData> {
        let counters = self.direct.lock().unwrap_or_else(|e| e.into_inner());
        let data = counters
            .get(&(dev_tgt.device_id, counter_id, entry))
            .copied()
            .unwrap_or_else(Self::zero);
        trace!("read counter {} {} = {:?}", counter_id, entry, data);
        Ok(data)
    }

    fn counter_write_direct(
        &self,
        _session: SessionHandle,
        dev_tgt: DevTgt,
        counter_id: P4Id,
        entry: EntryHandle,
        data: &CounterData,
    ) -> PiResult<()> {
        let mut counters = self.direct.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .entry((dev_tgt.device_id, counter_id, entry))
            .or_insert_with(Self::zero)
            .apply(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PiStatus;
    use pretty_assertions::assert_eq;

    const COUNTER: P4Id = P4Id::new(0x1200_0001);

    #[test]
    fn test_unwritten_reads_zero() {
        let target = DummyTarget::new();
        let data = target
            .counter_read(
                SessionHandle(0),
                DevTgt::all_pipes(0),
                COUNTER,
                5,
                CounterReadFlags::empty(),
            )
            .unwrap();
        assert_eq!(data, CounterData::new(0, 0));
    }

    #[test]
    fn test_partial_write_keeps_other_unit() {
        let target = DummyTarget::new();
        let dev = DevTgt::all_pipes(0);
        let session = SessionHandle(0);
        target
            .counter_write(session, dev, COUNTER, 1, &CounterData::new(4, 400))
            .unwrap();
        target
            .counter_write(session, dev, COUNTER, 1, &CounterData::packets(9))
            .unwrap();

        let data = target
            .counter_read(session, dev, COUNTER, 1, CounterReadFlags::HW_SYNC)
            .unwrap();
        assert_eq!(data, CounterData::new(9, 400));
    }

    #[test]
    fn test_devices_are_isolated() {
        let target = DummyTarget::new();
        let session = SessionHandle(0);
        let entry = EntryHandle(17);
        target
            .counter_write_direct(session, DevTgt::all_pipes(0), COUNTER, entry, &CounterData::new(1, 64))
            .unwrap();

        let other = target
            .counter_read_direct(session, DevTgt::all_pipes(1), COUNTER, entry, CounterReadFlags::empty())
            .unwrap();
        assert_eq!(other, CounterData::new(0, 0));
    }

    #[test]
    fn test_index_out_of_range() {
        let target = DummyTarget::with_size(4);
        let err = target
            .counter_write(
                SessionHandle(0),
                DevTgt::all_pipes(0),
                COUNTER,
                4,
                &CounterData::new(1, 1),
            )
            .unwrap_err();
        assert_eq!(err.status(), PiStatus::InvalidArgument);
    }
}
