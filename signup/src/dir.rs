use std::path::{Path, PathBuf};

use crate::config::ConfigError;

pub const SESSION_FILE_NAME: &str = "session.json";
pub const CONFIG_FILE_NAME: &str = "signup.toml";

/// The directory holding the configuration, the persisted session and the logs.
#[derive(Clone, Debug, PartialEq)]
pub struct DataDirectory(PathBuf);

impl DataDirectory {
    pub fn new(p: PathBuf) -> Self {
        DataDirectory(p)
    }
    pub fn new_default() -> Result<Self, ConfigError> {
        default_datadir().map(DataDirectory::new)
    }
}

impl DataDirectory {
    pub fn exists(&self) -> bool {
        self.0.as_path().exists()
    }
    pub fn init(&self) -> Result<(), std::io::Error> {
        #[cfg(unix)]
        return {
            use std::fs::DirBuilder;
            use std::os::unix::fs::DirBuilderExt;

            let mut builder = DirBuilder::new();
            builder.mode(0o700).recursive(true).create(self.path())
        };

        #[cfg(not(unix))]
        return { std::fs::create_dir_all(self.path()) };
    }
    pub fn path(&self) -> &Path {
        self.0.as_path()
    }
    pub fn session_file_path(&self) -> PathBuf {
        self.0.join(SESSION_FILE_NAME)
    }
    pub fn config_file_path(&self) -> PathBuf {
        self.0.join(CONFIG_FILE_NAME)
    }
}

/// Get the absolute path to the signup data folder.
///
/// This a "Signup" directory in the XDG standard configuration directory for all OSes but
/// Linux-based ones, for which it's `~/.signup`.
fn default_datadir() -> Result<PathBuf, ConfigError> {
    #[cfg(target_os = "linux")]
    let configs_dir = dirs::home_dir();

    #[cfg(not(target_os = "linux"))]
    let configs_dir = dirs::config_dir();

    datadir_in(configs_dir)
}

fn datadir_in(configs_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    let mut path = configs_dir.ok_or(ConfigError::DatadirNotFound)?;

    #[cfg(target_os = "linux")]
    path.push(".signup");

    #[cfg(not(target_os = "linux"))]
    path.push("Signup");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_home_directory() {
        assert_eq!(datadir_in(None), Err(ConfigError::DatadirNotFound));

        let datadir = datadir_in(Some(PathBuf::from("/home/ada"))).unwrap();
        assert!(datadir.starts_with("/home/ada"));
        assert_ne!(datadir, PathBuf::from("/home/ada"));
    }

    #[test]
    fn init_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let datadir = DataDirectory::new(tmp.path().join("a").join("b"));
        assert!(!datadir.exists());
        datadir.init().unwrap();
        assert!(datadir.exists());
        assert_eq!(
            datadir.session_file_path(),
            tmp.path().join("a").join("b").join("session.json")
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(datadir.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o700);
        }
    }
}
