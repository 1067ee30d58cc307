//! Dispatch tests: every counter call reaches the backend of its device
//! with the caller's arguments, and the backend's result comes back as is.

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pi_target::{
        CounterData, CounterReadFlags, CounterTarget, DevTgt, DummyTarget, EntryHandle,
        PiDispatcher, PiError, PiResult, PiStatus, SessionHandle,
    };
    use pi_types::P4Id;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Read(SessionHandle, DevTgt, P4Id, usize, CounterReadFlags),
        Write(SessionHandle, DevTgt, P4Id, usize, CounterData),
        ReadDirect(SessionHandle, DevTgt, P4Id, EntryHandle, CounterReadFlags),
        WriteDirect(SessionHandle, DevTgt, P4Id, EntryHandle, CounterData),
    }

    /// Records every call and answers with a fixed result.
    struct Recorder {
        calls: Mutex<Vec<Call>>,
        reply: PiResult<CounterData>,
    }

    impl Recorder {
        fn new(reply: PiResult<CounterData>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply,
            })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().expect("calls lock").clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().expect("calls lock").push(call);
        }
    }

    impl CounterTarget for Recorder {
        fn counter_read(
            &self,
            session: SessionHandle,
            dev_tgt: DevTgt,
            counter_id: P4Id,
            index: usize,
            flags: CounterReadFlags,
        ) -> PiResult<CounterData> {
            self.record(Call::Read(session, dev_tgt, counter_id, index, flags));
            self.reply.clone()
        }

        fn counter_write(
            &self,
            session: SessionHandle,
            dev_tgt: DevTgt,
            counter_id: P4Id,
            index: usize,
            data: &CounterData,
        ) -> PiResult<()> {
            self.record(Call::Write(session, dev_tgt, counter_id, index, *data));
            self.reply.clone().map(|_| ())
        }

        fn counter_read_direct(
            &self,
            session: SessionHandle,
            dev_tgt: DevTgt,
            counter_id: P4Id,
            entry: EntryHandle,
            flags: CounterReadFlags,
        ) -> PiResult<CounterData> {
            self.record(Call::ReadDirect(session, dev_tgt, counter_id, entry, flags));
            self.reply.clone()
        }

        fn counter_write_direct(
            &self,
            session: SessionHandle,
            dev_tgt: DevTgt,
            counter_id: P4Id,
            entry: EntryHandle,
            data: &CounterData,
        ) -> PiResult<()> {
            self.record(Call::WriteDirect(session, dev_tgt, counter_id, entry, *data));
            self.reply.clone().map(|_| ())
        }
    }

    const COUNTER: P4Id = P4Id::new(0x1200_0003);

    #[test]
    fn test_arguments_forwarded_verbatim() {
        let reply = CounterData::packets(42);
        let recorder = Recorder::new(Ok(reply));
        let dispatcher = PiDispatcher::new();
        dispatcher
            .assign_device(2, recorder.clone())
            .expect("assign");

        let session = SessionHandle(11);
        let dev = DevTgt {
            device_id: 2,
            pipe_mask: 0x0003,
        };
        let payload = CounterData::bytes(9000);

        let read = dispatcher
            .counter_read(session, dev, COUNTER, 17, CounterReadFlags::HW_SYNC)
            .expect("read");
        assert_eq!(read, reply);
        dispatcher
            .counter_write(session, dev, COUNTER, 17, &payload)
            .expect("write");
        let read = dispatcher
            .counter_read_direct(session, dev, COUNTER, EntryHandle(0xbeef), CounterReadFlags::empty())
            .expect("read direct");
        assert_eq!(read, reply);
        dispatcher
            .counter_write_direct(session, dev, COUNTER, EntryHandle(0xbeef), &payload)
            .expect("write direct");

        assert_eq!(
            recorder.calls(),
            vec![
                Call::Read(session, dev, COUNTER, 17, CounterReadFlags::HW_SYNC),
                Call::Write(session, dev, COUNTER, 17, payload),
                Call::ReadDirect(session, dev, COUNTER, EntryHandle(0xbeef), CounterReadFlags::empty()),
                Call::WriteDirect(session, dev, COUNTER, EntryHandle(0xbeef), payload),
            ]
        );
    }

    #[test]
    fn test_routes_by_device() {
        let first = Recorder::new(Ok(CounterData::new(1, 1)));
        let second = Recorder::new(Ok(CounterData::new(2, 2)));
        let dispatcher = PiDispatcher::new();
        dispatcher.assign_device(0, first.clone()).expect("assign 0");
        dispatcher.assign_device(1, second.clone()).expect("assign 1");

        let data = dispatcher
            .counter_read(SessionHandle(0), DevTgt::all_pipes(1), COUNTER, 0, CounterReadFlags::empty())
            .expect("read");
        assert_eq!(data, CounterData::new(2, 2));
        assert!(first.calls().is_empty());
        assert_eq!(second.calls().len(), 1);
    }

    #[test]
    fn test_backend_status_returned_unchanged() {
        let recorder = Recorder::new(Err(PiError::target(1404, "counter not mapped")));
        let dispatcher = PiDispatcher::new();
        dispatcher.assign_device(0, recorder.clone()).expect("assign");

        let err = dispatcher
            .counter_write(SessionHandle(0), DevTgt::all_pipes(0), COUNTER, 3, &CounterData::new(0, 0))
            .unwrap_err();
        assert_eq!(err, PiError::target(1404, "counter not mapped"));
        assert_eq!(err.status(), PiStatus::TargetError);
        assert_eq!(err.raw_code(), 1404);
    }

    #[test]
    fn test_raw_backend_code_survives_dispatch() {
        let reply = PiError::check_raw(1042).map(|_| CounterData::default());
        let recorder = Recorder::new(reply);
        let dispatcher = PiDispatcher::new();
        dispatcher.assign_device(0, recorder.clone()).expect("assign");

        let err = dispatcher
            .counter_read(SessionHandle(0), DevTgt::all_pipes(0), COUNTER, 0, CounterReadFlags::empty())
            .unwrap_err();
        assert_eq!(err.raw_code(), 1042);
        assert_eq!(err.status(), PiStatus::TargetError);
    }

    #[test]
    fn test_removed_device_not_dispatched() {
        let recorder = Recorder::new(Ok(CounterData::default()));
        let dispatcher = PiDispatcher::new();
        dispatcher.assign_device(5, recorder.clone()).expect("assign");
        dispatcher.remove_device(5).expect("remove");

        let err = dispatcher
            .counter_read_direct(
                SessionHandle(0),
                DevTgt::all_pipes(5),
                COUNTER,
                EntryHandle(1),
                CounterReadFlags::empty(),
            )
            .unwrap_err();
        assert_eq!(err.status(), PiStatus::DevNotAssigned);
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_dummy_target_through_dispatcher() {
        let dispatcher = PiDispatcher::new();
        dispatcher
            .assign_device(0, Arc::new(DummyTarget::with_size(8)))
            .expect("assign");
        let session = SessionHandle(1);
        let dev = DevTgt::all_pipes(0);

        dispatcher
            .counter_write(session, dev, COUNTER, 7, &CounterData::new(10, 1280))
            .expect("write");
        dispatcher
            .counter_write(session, dev, COUNTER, 7, &CounterData::bytes(0))
            .expect("clear bytes");
        let data = dispatcher
            .counter_read(session, dev, COUNTER, 7, CounterReadFlags::HW_SYNC)
            .expect("read");
        assert_eq!(data, CounterData::new(10, 0));

        let err = dispatcher
            .counter_read(session, dev, COUNTER, 8, CounterReadFlags::empty())
            .unwrap_err();
        assert_eq!(err.status(), PiStatus::InvalidArgument);

        let entry = EntryHandle(3);
        dispatcher
            .counter_write_direct(session, dev, COUNTER, entry, &CounterData::packets(5))
            .expect("write direct");
        let data = dispatcher
            .counter_read_direct(session, dev, COUNTER, entry, CounterReadFlags::empty())
            .expect("read direct");
        assert_eq!(data, CounterData::new(5, 0));
    }
}
