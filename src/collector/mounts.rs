use collector::{CollectResult, Collector, Error, Host};
use delta::DeltaEngine;
use libc;
use std::ffi::CString;
use std::io;
use std::mem;

/// Filesystem types that describe no real storage.
pub const VIRTUAL_FS: [&str; 17] = [
    "binfmt_misc",
    "cgroup",
    "configfs",
    "debugfs",
    "devpts",
    "devtmpfs",
    "efivarfs",
    "fusectl",
    "mqueue",
    "none",
    "proc",
    "rootfs",
    "securityfs",
    "sysfs",
    "rpc_pipefs",
    "fuse.gvfsd-fuse",
    "tmpfs",
];

/// One line of `/proc/mounts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub device: String,
    pub mountpoint: String,
    pub fstype: String,
}

/// Space of a mounted filesystem, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub free: u64,
    pub total: u64,
}

// The kernel escapes space, tab, newline and backslash as `\ooo`.
fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut res = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'\\' && idx + 4 <= bytes.len() {
            let octal = &bytes[idx + 1..idx + 4];
            if octal.iter().all(|b| *b >= b'0' && *b <= b'7') {
                let val = octal
                    .iter()
                    .fold(0u32, |acc, b| acc * 8 + u32::from(*b - b'0'));
                if val <= 0xff {
                    res.push(val as u8);
                    idx += 4;
                    continue;
                }
            }
        }
        res.push(bytes[idx]);
        idx += 1;
    }
    String::from_utf8_lossy(&res).into_owned()
}

/// Parse `/proc/mounts`, keeping only filesystems backed by real storage.
///
/// Returns `None` if a line has fewer than three columns.
pub fn parse_mounts(content: &str) -> Option<Vec<Mount>> {
    let mut res = Vec::new();
    for line in content.lines() {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 3 {
            return None;
        }
        if cols[0] == "none" || VIRTUAL_FS.contains(&cols[2]) {
            continue;
        }
        res.push(Mount {
            device: unescape(cols[0]),
            mountpoint: unescape(cols[1]),
            fstype: cols[2].to_string(),
        });
    }
    Some(res)
}

/// Ask the kernel how much space the filesystem mounted at `path` has.
pub fn statvfs(path: &str) -> io::Result<Usage> {
    let c_path = CString::new(path)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let mut buf: libc::statvfs = unsafe { mem::zeroed() };
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), &mut buf) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    let block = u64::from(buf.f_frsize);
    Ok(Usage {
        free: u64::from(buf.f_bfree).saturating_mul(block),
        total: u64::from(buf.f_blocks).saturating_mul(block),
    })
}

/// Space of every mounted filesystem, differenced.
pub struct Mounts {
    host: Host,
}

impl Mounts {
    /// Create a `Mounts` collector for `host`.
    pub fn new(host: Host) -> Mounts {
        Mounts { host: host }
    }
}

impl Collector for Mounts {
    fn name(&self) -> &'static str {
        "mounts"
    }

    fn collect(&self, engine: &DeltaEngine) -> CollectResult {
        let content = self.host.read_proc("mounts")?;
        let mounts = match parse_mounts(&content) {
            Some(mounts) => mounts,
            None => {
                warn!("malformed /proc/mounts, skipping this cycle");
                return Ok(Vec::new());
            }
        };

        let mut points = Vec::new();
        for mount in mounts {
            let usage = statvfs(&mount.mountpoint).map_err(|e| {
                Error::Io(io::Error::new(
                    e.kind(),
                    format!("statvfs {}: {}", mount.mountpoint, e),
                ))
            })?;
            let point = self.host
                .point("mounts")
                .overlay_tag("disk", mount.device.as_str())
                .overlay_tag("mountpoint", mount.mountpoint.as_str())
                .field("free", usage.free)
                .field("total", usage.total);
            if let Some(point) = engine.compute_delta(point) {
                points.push(Some(point));
            }
        }
        Ok(points)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use collector::test_util::FakeProc;
    use metric::FieldValue;

    const MOUNTS: &str = "sysfs /sys sysfs rw,nosuid,nodev,noexec,relatime 0 0
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
/dev/sda1 / ext4 rw,relatime,errors=remount-ro 0 0
tmpfs /run tmpfs rw,nosuid,noexec,relatime 0 0
none /sys/fs/pstore pstore rw 0 0
/dev/sdb1 /mnt/my\\040disk xfs rw 0 0
";

    #[test]
    fn virtual_filesystems_are_skipped() {
        let mounts = parse_mounts(MOUNTS).unwrap();
        assert_eq!(2, mounts.len());
        assert_eq!(
            Mount {
                device: "/dev/sda1".into(),
                mountpoint: "/".into(),
                fstype: "ext4".into(),
            },
            mounts[0]
        );
        assert_eq!("/mnt/my disk", mounts[1].mountpoint);
    }

    #[test]
    fn short_line_is_malformed() {
        assert!(parse_mounts("/dev/sda1 /\n").is_none());
    }

    #[test]
    fn unescape_octal() {
        assert_eq!("a b", unescape("a\\040b"));
        assert_eq!("tab\there", unescape("tab\\011here"));
        assert_eq!("trailing\\", unescape("trailing\\"));
        assert_eq!("not\\xyz", unescape("not\\xyz"));
    }

    #[test]
    fn statvfs_root() {
        let usage = statvfs("/").expect("statvfs / failed");
        assert!(usage.total >= usage.free);
    }

    #[test]
    fn statvfs_missing_path() {
        assert!(statvfs("/this/path/does/not/exist").is_err());
    }

    #[test]
    fn root_filesystem_is_differenced() {
        let proc_fs = FakeProc::new();
        proc_fs.write("mounts", "/dev/root / ext4 rw 0 0\n");
        let engine = DeltaEngine::default();
        let mounts = Mounts::new(proc_fs.host.clone());

        assert!(mounts.collect(&engine).unwrap().is_empty());
        let points = mounts.collect(&engine).unwrap();
        assert_eq!(1, points.len());
        let root = points[0].clone().unwrap();
        assert_eq!(
            Some(&"/".to_string()),
            root.tags.get(&"mountpoint".to_string())
        );
        assert_eq!(Some(&FieldValue::U64(0)), root.fields.get("total"));
    }

    #[test]
    fn statvfs_failure_is_an_error() {
        let proc_fs = FakeProc::new();
        proc_fs.write("mounts", "/dev/sdz1 /this/path/does/not/exist ext4 rw 0 0\n");
        match Mounts::new(proc_fs.host.clone()).collect(&DeltaEngine::default()) {
            Err(Error::Io(_)) => {}
            other => panic!("expected an i/o error, got {:?}", other),
        }
    }
}
