mod integration {
    mod sampler {

        extern crate sysinfo_influxdb;
        extern crate tempdir;

        use self::sysinfo_influxdb::collector::{self, Host, Kind};
        use self::sysinfo_influxdb::delta::DeltaEngine;
        use self::sysinfo_influxdb::metric::{FieldValue, Point};
        use self::sysinfo_influxdb::sampler::Sampler;
        use self::sysinfo_influxdb::sink::{self, Sink};
        use self::tempdir::TempDir;
        use std::fs::File;
        use std::io::Write;
        use std::sync::{Arc, Mutex};
        use std::time::Duration;

        #[derive(Clone, Default)]
        struct Recorder(Arc<Mutex<Vec<Vec<Point>>>>);

        impl Sink for Recorder {
            fn name(&self) -> &'static str {
                "recorder"
            }

            fn deliver(&mut self, batch: &[Point]) -> Result<(), sink::Error> {
                self.0.lock().unwrap().push(batch.to_vec());
                Ok(())
            }
        }

        fn write(dir: &TempDir, relative: &str, content: &str) {
            let mut fp = File::create(dir.path().join(relative)).unwrap();
            fp.write_all(content.as_bytes()).unwrap();
        }

        #[test]
        fn single_shot_delivers_one_complete_batch() {
            let proc_fs = TempDir::new("sysinfo-proc").unwrap();
            write(&proc_fs, "stat", "cpu  100 10 50 1000 5 1 2 0 0 0\ncpu0 100 10 50 1000 5 1 2 0 0 0\n");
            write(
                &proc_fs,
                "meminfo",
                "MemTotal: 16000 kB\nMemFree: 4000 kB\nBuffers: 1000 kB\nCached: 3000 kB\nSwapTotal: 0 kB\nSwapFree: 0 kB\n",
            );
            write(&proc_fs, "loadavg", "0.50 0.25 0.10 1/123 4567\n");

            let mut host = Host::new("host1.example.com");
            host.proc_root = proc_fs.path().to_path_buf();
            let kinds = collector::parse_list("cpu,mem,load").unwrap();
            assert_eq!(vec![Kind::Cpu, Kind::Mem, Kind::Load], kinds);

            let recorder = Recorder::default();
            let mut sampler = Sampler::new(
                collector::build(&kinds, &host),
                Arc::new(DeltaEngine::default()),
                vec![Box::new(recorder.clone())],
                Duration::from_millis(1),
                false,
            );
            sampler.run();

            let batches = recorder.0.lock().unwrap().clone();
            assert_eq!(1, batches.len());
            let batch = &batches[0];
            assert_eq!(3, batch.len());

            let mut names: Vec<&str> = batch.iter().map(|p| p.name.as_str()).collect();
            names.sort();
            assert_eq!(vec!["cpu", "load", "mem"], names);

            for point in batch {
                assert_eq!(
                    Some(&"host1.example.com".to_string()),
                    point.tags.get(&"fqdn".to_string())
                );
                if point.name == "cpu" {
                    assert_eq!(Some(&FieldValue::U64(0)), point.fields.get("user"));
                }
                if point.name == "load" {
                    assert_eq!(Some(&FieldValue::F64(0.5)), point.fields.get("one"));
                }
            }
        }
    }
}
