//! Lifecycle tests for whole catalogs: teardown and rebuild, loading
//! from a description file, and concurrent readers across a swap.

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::atomic::{AtomicBool, Ordering};

    use pi_p4info::{
        ActionDescription, CatalogConfig, CatalogError, FieldDescription,
        MatchFieldDescription, P4Info, ParamDescription, ProgramDescription, RegistryState,
        SharedP4Info, TableDescription,
    };
    use pi_types::{MatchKind, P4Id};
    use pretty_assertions::assert_eq;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    /// A small L3 program; `version` is folded into the table name so
    /// successive versions are distinguishable.
    fn l3_program(version: u32) -> ProgramDescription {
        ProgramDescription {
            fields: vec![
                FieldDescription {
                    id: P4Id::new(0x0100_0002),
                    name: "ipv4.dstAddr".to_string(),
                    bitwidth: 32,
                },
                FieldDescription {
                    id: P4Id::new(0x0100_0001),
                    name: "ethernet.dstAddr".to_string(),
                    bitwidth: 48,
                },
            ],
            actions: vec![
                ActionDescription {
                    id: P4Id::new(0x0200_0001),
                    name: "set_nhop".to_string(),
                    params: vec![
                        ParamDescription {
                            index: 1,
                            name: "port".to_string(),
                            bitwidth: 9,
                        },
                        ParamDescription {
                            index: 0,
                            name: "nhop_ipv4".to_string(),
                            bitwidth: 32,
                        },
                    ],
                },
                ActionDescription {
                    id: P4Id::new(0x0200_0002),
                    name: "_drop".to_string(),
                    params: Vec::new(),
                },
            ],
            tables: vec![TableDescription {
                id: P4Id::new(0x0300_0001),
                name: format!("ipv4_lpm_v{}", version),
                match_fields: vec![MatchFieldDescription {
                    field_id: P4Id::new(0x0100_0002),
                    name: "ipv4.dstAddr".to_string(),
                    match_kind: MatchKind::Lpm,
                    bitwidth: 32,
                }],
                actions: vec![P4Id::new(0x0200_0002), P4Id::new(0x0200_0001)],
            }],
        }
    }

    #[test]
    fn test_teardown_then_rebuild_matches_fresh() {
        init_tracing();
        let desc = l3_program(1);

        let fresh = P4Info::from_description(&desc, CatalogConfig::strict()).expect("fresh");

        let mut reused = P4Info::new(CatalogConfig::strict());
        reused.load_description(&l3_program(0)).expect("first build");
        reused.free().expect("free");
        assert_eq!(reused.tables().state(), RegistryState::Freed);
        reused.load_description(&desc).expect("rebuild");

        assert_eq!(
            reused.to_description().expect("dump reused"),
            fresh.to_description().expect("dump fresh")
        );
        // Nothing of the first build survives.
        assert!(reused.tables().id_from_name("ipv4_lpm_v0").is_err());
        assert!(reused.is_sealed());
    }

    #[test]
    fn test_load_description_file() {
        init_tracing();
        let json = l3_program(7).to_json_string().expect("serialize");
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(json.as_bytes()).expect("write");

        let desc = ProgramDescription::from_file(file.path()).expect("load");
        let p4info = P4Info::from_description(&desc, CatalogConfig::strict()).expect("build");

        let table = p4info.tables().id_from_name("ipv4_lpm_v7").unwrap();
        let set_nhop = p4info.actions().id_from_name("set_nhop").unwrap();
        assert_eq!(p4info.tables().action_index(table, set_nhop).unwrap(), Some(1));
        assert_eq!(p4info.actions().param_name_from_id(set_nhop, 0).unwrap(), "nhop_ipv4");
        assert_eq!(p4info.actions().param_byte0_mask(set_nhop, 1).unwrap(), 0x01);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ProgramDescription::from_file("/nonexistent/program.json").unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }

    #[test]
    fn test_concurrent_readers_across_swap() {
        init_tracing();
        let v1 = P4Info::from_description(&l3_program(1), CatalogConfig::default()).unwrap();
        let shared = SharedP4Info::new(v1).expect("publish");
        let swapped = AtomicBool::new(false);

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        let snapshot = shared.load();
                        let table = snapshot
                            .tables()
                            .iter()
                            .expect("sealed")
                            .next()
                            .expect("one table");
                        let name = snapshot.tables().name_from_id(table.id()).unwrap();
                        // Every snapshot is internally consistent.
                        assert_eq!(snapshot.tables().id_from_name(name).unwrap(), table.id());
                        assert!(name == "ipv4_lpm_v1" || name == "ipv4_lpm_v2");
                        if swapped.load(Ordering::Acquire) {
                            assert_eq!(shared.load().tables().len(), 1);
                        }
                    }
                });
            }

            s.spawn(|| {
                let v2 =
                    P4Info::from_description(&l3_program(2), CatalogConfig::default()).unwrap();
                let previous = shared.replace(v2).expect("replace");
                swapped.store(true, Ordering::Release);
                assert!(previous.tables().id_from_name("ipv4_lpm_v1").is_ok());
            });
        });

        let current = shared.load();
        assert!(current.tables().id_from_name("ipv4_lpm_v2").is_ok());
    }
}
