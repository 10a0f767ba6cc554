use std::path::PathBuf;

/// Default TCP port `adb` listens on for network debugging.
pub const ADB_TCP_PORT: u16 = 5555;

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/droidremote/ (XDG standard)
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join("droidremote")
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("droidremote")
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("droidremote")
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("droidremote")
    }
}

#[cfg(unix)]
fn adb_binary_names() -> &'static [&'static str] {
    &["adb"]
}

#[cfg(windows)]
fn adb_binary_names() -> &'static [&'static str] {
    &["adb.exe", "adb"]
}

fn find_beside_exe(names: &[&str]) -> Option<PathBuf> {
    let current_exe = std::env::current_exe().ok()?;
    let dir = current_exe.parent()?;
    for name in names {
        let p = dir.join(name);
        if p.exists() {
            return Some(p);
        }
        let p = dir.join("platform-tools").join(name);
        if p.exists() {
            return Some(p);
        }
    }
    None
}

fn find_in_sdk(names: &[&str]) -> Option<PathBuf> {
    for var in ["ANDROID_HOME", "ANDROID_SDK_ROOT"] {
        let Ok(root) = std::env::var(var) else {
            continue;
        };
        for name in names {
            let p = PathBuf::from(&root).join("platform-tools").join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }
    None
}

fn find_on_path(names: &[&str]) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path) {
        for name in names {
            let p = dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }
    None
}

/// Find the adb binary.
///
/// Searches in order:
/// 1. ADB_PATH environment variable
/// 2. Beside current executable (or its `platform-tools/` subdir)
/// 3. `platform-tools/` under ANDROID_HOME / ANDROID_SDK_ROOT
/// 4. PATH
pub fn find_adb_binary() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("ADB_PATH") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }

    find_beside_exe(adb_binary_names())
        .or_else(|| find_in_sdk(adb_binary_names()))
        .or_else(|| find_on_path(adb_binary_names()))
}
