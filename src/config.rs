//! The one piece of outside configuration this engine consumes: the undo
//! memory budget, in mebibytes (§6.3).

use {
    directories::ProjectDirs,
    serde::{Deserialize, Serialize},
    std::{
        fs::{create_dir_all, read_to_string, File},
        io::{Error as IoError, ErrorKind, Write},
        path::PathBuf,
    },
    toml::{from_str, to_string_pretty},
};

/// The name of the config file while in debug mode.
#[cfg(debug_assertions)]
const CONFIG_FILENAME: &str = "undo-debug.toml";

/// The name of the config file while in release mode.
#[cfg(not(debug_assertions))]
const CONFIG_FILENAME: &str = "undo.toml";

/// Default value of `Options/UndoSizeLimit`, in mebibytes.
pub const DEFAULT_UNDO_SIZE_LIMIT_MIB: u32 = 8;

fn config_dir() -> Result<PathBuf, IoError> {
    ProjectDirs::from("io", "stipple", "stipple")
        .map(|dirs| dirs.config_dir().to_owned())
        .ok_or_else(|| IoError::new(ErrorKind::NotFound, "no home directory for this platform"))
}

fn config_path() -> Result<PathBuf, IoError> {
    Ok(config_dir()?.join(CONFIG_FILENAME))
}

#[derive(Default, Deserialize, Serialize)]
struct Data {
    #[serde(rename = "Options/UndoSizeLimit")]
    undo_size_limit: Option<u32>,
}

/// Holds the single `"Options/UndoSizeLimit"` key.
pub struct UndoConfig {
    data: Data,
}

impl UndoConfig {
    /// Reads the config file, creating it with defaults if absent.
    pub fn read() -> Result<Self, IoError> {
        let path = config_path()?;
        Ok(if path.exists() {
            let contents = read_to_string(&path).unwrap_or_else(|_| {
                #[cfg(debug_assertions)]
                warn!("undo config file read error, using defaults");

                String::new()
            });
            Self {
                data: from_str(&contents).unwrap_or_default(),
            }
        } else {
            #[cfg(debug_assertions)]
            info!("undo config file not found, creating one with defaults");

            let mut config = Self {
                data: Data::default(),
            };
            config.data.undo_size_limit = Some(config.undo_size_limit_mib());
            config.write()?;
            config
        })
    }

    /// Mebibytes; defaults to [`DEFAULT_UNDO_SIZE_LIMIT_MIB`].
    pub fn undo_size_limit_mib(&self) -> u32 {
        self.data
            .undo_size_limit
            .unwrap_or(DEFAULT_UNDO_SIZE_LIMIT_MIB)
            .max(1)
    }

    /// The configured budget in bytes (`mebibytes * 2^20`), per §6.3.
    pub fn undo_size_limit_bytes(&self) -> usize {
        self.undo_size_limit_mib() as usize * (1 << 20)
    }

    pub fn set_undo_size_limit_mib(&mut self, mib: u32) {
        self.data.undo_size_limit = Some(mib.max(1));
    }

    pub fn write(&self) -> Result<(), IoError> {
        let dir = config_dir()?;
        if !dir.exists() {
            create_dir_all(&dir)?;
        }

        let toml = to_string_pretty(&self.data);
        if toml.is_err() {
            return Err(IoError::from(ErrorKind::Other));
        }
        let toml = toml.unwrap();

        let mut file = File::create(config_path()?)?;
        file.write_all(toml.as_bytes())?;

        Ok(())
    }
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            data: Data::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limit_is_eight_mebibytes() {
        let config = UndoConfig::default();
        assert_eq!(config.undo_size_limit_mib(), DEFAULT_UNDO_SIZE_LIMIT_MIB);
        assert_eq!(config.undo_size_limit_bytes(), 8 * (1 << 20));
    }

    #[test]
    fn zero_is_clamped_to_one_mebibyte() {
        let mut config = UndoConfig::default();
        config.set_undo_size_limit_mib(0);
        assert_eq!(config.undo_size_limit_mib(), 1);
    }
}
