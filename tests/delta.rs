mod integration {
    mod delta {

        extern crate rand;
        extern crate sysinfo_influxdb;

        use self::rand::Rng;
        use self::sysinfo_influxdb::delta::DeltaEngine;
        use self::sysinfo_influxdb::metric::{FieldValue, Point};
        use std::collections::HashMap;
        use std::sync::Arc;
        use std::thread;

        fn tag_value(point: &Point, key: &str) -> Option<String> {
            point.tags.get(&key.to_string()).cloned()
        }

        #[test]
        fn test_simple() {
            let engine = DeltaEngine::default();

            let serie1 = Point::new("test_init")
                .overlay_tag("tag0", "val0")
                .field("col0", 42i64);
            assert!(engine.compute_delta(serie1.clone()).is_none());
            assert_eq!("test_init", serie1.name);
            assert_eq!(1, serie1.tags.len());
            assert_eq!(Some("val0".to_string()), tag_value(&serie1, "tag0"));

            let serie2 = Point::new("test_init_other")
                .overlay_tag("tag0", "val0")
                .overlay_tag("tag1", "val1")
                .field("col1", 22i64)
                .field("col0", 23i64);
            assert!(engine.compute_delta(serie2).is_none());

            let serie1 = Point::new("test_init")
                .overlay_tag("tag0", "val0")
                .field("col0", 23i64);
            let serie2 = Point::new("test_init_other")
                .overlay_tag("tag0", "val0")
                .overlay_tag("tag1", "val1")
                .field("col0", 43i64)
                .field("col1", 42i64);

            let diff1 = engine.compute_delta(serie1).expect("serie1 is initialized");
            let diff2 = engine.compute_delta(serie2).expect("serie2 is initialized");

            assert_eq!(Some(&FieldValue::I64(23 - 42)), diff1.fields.get("col0"));
            assert_eq!(Some(&FieldValue::I64(43 - 23)), diff2.fields.get("col0"));
            assert_eq!(Some(&FieldValue::I64(42 - 22)), diff2.fields.get("col1"));
            assert_eq!("test_init_other", diff2.name);
            assert_eq!(2, diff2.tags.len());
        }

        fn fill_points(rng: &mut rand::ThreadRng, size: usize) -> (Point, HashMap<String, i64>) {
            let mut values = HashMap::new();
            let mut point = Point::new("test_rnd").overlay_tag("toto", "titi");
            for i in 0..size {
                let val: i64 = rng.gen_range(0, 9_876_543_210);
                let key = format!("col{}", i);
                point = point.field(key.as_str(), val);
                values.insert(key, val);
            }
            (point, values)
        }

        #[test]
        fn test_random() {
            let mut rng = rand::thread_rng();
            let engine = DeltaEngine::default();
            let size = rng.gen_range(12, 42);

            let (point, mut old_values) = fill_points(&mut rng, size);
            assert!(engine.compute_delta(point).is_none());

            let rounds = rng.gen_range(10, 60);
            for round in 0..rounds {
                let (point, new_values) = fill_points(&mut rng, size);
                let diff = engine
                    .compute_delta(point)
                    .expect("series is initialized");
                for i in 0..size {
                    let key = format!("col{}", i);
                    let expected = new_values[&key] - old_values[&key];
                    assert_eq!(
                        Some(&FieldValue::I64(expected)),
                        diff.fields.get(&key),
                        "round {}, field {}",
                        round,
                        key
                    );
                }
                old_values = new_values;
            }
        }

        #[test]
        fn test_consistency_factor_scales_deltas() {
            let engine = DeltaEngine::new(0.5);
            let point = |v: u64| Point::new("net").overlay_tag("iface", "eth0").field("rx", v);
            assert!(engine.compute_delta(point(100)).is_none());
            let diff = engine.compute_delta(point(300)).unwrap();
            assert_eq!(Some(&FieldValue::U64(100)), diff.fields.get("rx"));
        }

        #[test]
        fn test_concurrent_series() {
            let engine = Arc::new(DeltaEngine::default());
            let mut workers = Vec::new();
            for t in 0..8 {
                let engine = Arc::clone(&engine);
                workers.push(thread::spawn(move || {
                    let id = format!("{}", t);
                    let mut deltas = 0;
                    for n in 0..100u64 {
                        let point = Point::new("worker")
                            .overlay_tag("id", id.as_str())
                            .field("count", n * 3);
                        if let Some(diff) = engine.compute_delta(point) {
                            assert_eq!(Some(&FieldValue::U64(3)), diff.fields.get("count"));
                            deltas += 1;
                        }
                    }
                    deltas
                }));
            }
            for worker in workers {
                assert_eq!(99, worker.join().unwrap());
            }
            assert_eq!(8, engine.series_count());
        }
    }
}
