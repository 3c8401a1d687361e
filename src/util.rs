//! Utility module, a grab-bag of functionality

use libc;
use std::ffi::CStr;
use std::fs::File;
use std::io;
use std::io::Write;
use std::os::raw::c_char;
use std::path::Path;
use std::process;
use std::process::Command;

/// The fully qualified name of this machine.
///
/// Asks `hostname -f` first, falling back to `gethostname(2)` and finally to
/// `"localhost"`.
pub fn fqdn() -> String {
    match Command::new("hostname").arg("-f").output() {
        Ok(ref out) if out.status.success() => {
            let name = String::from_utf8_lossy(&out.stdout).trim().to_string();
            if !name.is_empty() {
                return name;
            }
        }
        Ok(out) => debug!("hostname -f exited with {}", out.status),
        Err(e) => debug!("could not run hostname -f: {}", e),
    }
    match gethostname() {
        Ok(name) => name,
        Err(e) => {
            warn!("could not determine host name, using localhost: {}", e);
            "localhost".to_string()
        }
    }
}

/// The kernel's idea of this machine's name.
pub fn gethostname() -> io::Result<String> {
    let mut buf: [c_char; 256] = [0; 256];
    let ret = unsafe { libc::gethostname(buf.as_mut_ptr(), buf.len()) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    // Truncated names are not guaranteed to be terminated.
    buf[buf.len() - 1] = 0;
    let name = unsafe { CStr::from_ptr(buf.as_ptr()) };
    Ok(name.to_string_lossy().into_owned())
}

/// Write the pid of this process, followed by a newline, to `path`.
pub fn write_pid_file<P: AsRef<Path>>(path: P) -> io::Result<()> {
    let mut fp = File::create(path)?;
    writeln!(fp, "{}", process::id())?;
    fp.sync_all()
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Read;
    use tempdir::TempDir;

    #[test]
    fn fqdn_is_never_empty() {
        assert!(!fqdn().is_empty());
    }

    #[test]
    fn gethostname_works() {
        assert!(!gethostname().unwrap().is_empty());
    }

    #[test]
    fn pid_file_holds_our_pid() {
        let dir = TempDir::new("sysinfo-pid").unwrap();
        let path = dir.path().join("sysinfo.pid");
        write_pid_file(&path).unwrap();

        let mut contents = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(format!("{}\n", process::id()), contents);
    }

    #[test]
    fn pid_file_in_missing_directory_fails() {
        assert!(write_pid_file("/no/such/directory/sysinfo.pid").is_err());
    }
}
