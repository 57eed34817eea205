/*!
 * Installed-version discovery
 *
 * The host keeps a registered-application index with one subkey per installed version
 * (for example `180.0`). Only the prefix before the first `.` is meaningful.
 */

use std::cmp::Ordering;
use std::io;

/// Source of installed host versions
pub trait InstallIndex: Send + Sync {
    /// Raw subkey names under the vendor path
    fn installed_versions(&self) -> io::Result<Vec<String>>;
}

/// Fixed list of versions (tests, or hosts without a registry)
#[derive(Debug, Clone, Default)]
pub struct StaticInstallIndex {
    versions: Vec<String>,
}

impl StaticInstallIndex {
    pub fn new<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            versions: versions.into_iter().map(Into::into).collect(),
        }
    }

    /// An index that reports nothing installed
    pub fn empty() -> Self {
        Self::default()
    }
}

impl InstallIndex for StaticInstallIndex {
    fn installed_versions(&self) -> io::Result<Vec<String>> {
        Ok(self.versions.clone())
    }
}

/// Reduce raw subkeys to version prefixes, newest first, without duplicates
pub fn version_prefixes(keys: &[String]) -> Vec<String> {
    let mut prefixes: Vec<String> = keys
        .iter()
        .filter_map(|key| key.split('.').next())
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .map(str::to_string)
        .collect();

    prefixes.sort_by(|a, b| compare_versions(b, a));
    prefixes.dedup();
    prefixes
}

fn compare_versions(a: &str, b: &str) -> Ordering {
    match (a.parse::<u32>(), b.parse::<u32>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        // Numeric versions sort above anything unparseable
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// The platform's own index
pub fn default_install_index(registry_path: &str) -> Box<dyn InstallIndex> {
    #[cfg(windows)]
    {
        Box::new(registry::RegistryInstallIndex::new(registry_path))
    }

    #[cfg(not(windows))]
    {
        let _ = registry_path;
        Box::new(StaticInstallIndex::empty())
    }
}

#[cfg(windows)]
pub use registry::RegistryInstallIndex;

#[cfg(windows)]
mod registry {
    use super::InstallIndex;
    use std::io;
    use std::ptr;
    use windows_sys::Win32::Foundation::ERROR_SUCCESS;
    use windows_sys::Win32::System::Registry::{
        RegCloseKey, RegEnumKeyExW, RegOpenKeyExW, RegQueryInfoKeyW, HKEY, HKEY_LOCAL_MACHINE,
        KEY_READ, KEY_WOW64_32KEY, KEY_WOW64_64KEY,
    };

    /// Subkeys of a local-machine registry key
    #[derive(Debug, Clone)]
    pub struct RegistryInstallIndex {
        path: String,
    }

    impl RegistryInstallIndex {
        pub fn new(path: impl Into<String>) -> Self {
            Self { path: path.into() }
        }
    }

    struct OpenKey(HKEY);

    impl Drop for OpenKey {
        fn drop(&mut self) {
            unsafe {
                RegCloseKey(self.0);
            }
        }
    }

    fn check(status: u32, what: &str) -> io::Result<()> {
        if status == ERROR_SUCCESS {
            Ok(())
        } else {
            Err(io::Error::new(
                io::Error::from_raw_os_error(status as i32).kind(),
                format!("{} failed with status {}", what, status),
            ))
        }
    }

    impl InstallIndex for RegistryInstallIndex {
        fn installed_versions(&self) -> io::Result<Vec<String>> {
            let view = if cfg!(target_pointer_width = "64") {
                KEY_WOW64_64KEY
            } else {
                KEY_WOW64_32KEY
            };
            let path: Vec<u16> = self.path.encode_utf16().chain(Some(0)).collect();

            let mut raw: HKEY = 0;
            let status =
                unsafe { RegOpenKeyExW(HKEY_LOCAL_MACHINE, path.as_ptr(), 0, KEY_READ | view, &mut raw) };
            check(status, "RegOpenKeyExW")?;
            let key = OpenKey(raw);

            let mut count: u32 = 0;
            let mut max_len: u32 = 0;
            let status = unsafe {
                RegQueryInfoKeyW(
                    key.0,
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null(),
                    &mut count,
                    &mut max_len,
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                )
            };
            check(status, "RegQueryInfoKeyW")?;

            let mut names = Vec::with_capacity(count as usize);
            let mut buffer = vec![0u16; max_len as usize + 1];
            for index in 0..count {
                let mut len = buffer.len() as u32;
                let status = unsafe {
                    RegEnumKeyExW(
                        key.0,
                        index,
                        buffer.as_mut_ptr(),
                        &mut len,
                        ptr::null(),
                        ptr::null_mut(),
                        ptr::null_mut(),
                        ptr::null_mut(),
                    )
                };
                check(status, "RegEnumKeyExW")?;
                names.push(String::from_utf16_lossy(&buffer[..len as usize]));
            }

            Ok(names)
        }
    }
}
