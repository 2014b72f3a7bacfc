//! Safe base directory for scratch workspaces so they are never created under the
//! current working directory (e.g. when TMPDIR=tmp or TMPDIR=./tmp).

use std::env;
use std::path::PathBuf;

/// Environment variable overriding where scratch workspaces are created
pub const SCRATCH_DIR_ENV: &str = "COVSTAGE_TMPDIR";

/// Returns a directory path suitable for creating scratch workspaces.
///
/// `COVSTAGE_TMPDIR` wins when it is an absolute path. Never returns a relative
/// path, so a scratch root can never land inside the project being staged.
pub fn temp_dir_base() -> PathBuf {
    if let Some(dir) = env::var_os(SCRATCH_DIR_ENV).map(PathBuf::from) {
        if dir.is_absolute() {
            return dir;
        }
    }

    let t = env::temp_dir();
    if t.is_absolute() {
        t
    } else {
        #[cfg(windows)]
        {
            env::var("TEMP")
                .or_else(|_| env::var("TMP"))
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("C:\\Windows\\Temp"))
        }
        #[cfg(not(windows))]
        {
            PathBuf::from("/tmp")
        }
    }
}
