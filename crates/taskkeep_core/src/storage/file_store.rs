use super::KeyValueStore;
use crate::error::AppError;
use std::path::{Path, PathBuf};

const DATA_DIR_ENV_VAR: &str = "TASKKEEP_DATA_DIR";
const APP_DIR_NAME: &str = "taskkeep";

/// Resolves the directory holding the persisted keys.
///
/// `TASKKEEP_DATA_DIR` wins over `configured`, which wins over the per-user
/// default.
pub fn data_dir(configured: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(DATA_DIR_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join(APP_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
    }
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid {
            return Err(AppError::invalid_input(format!(
                "storage key '{key}' is not allowed"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
        Ok(Some(content))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)
            .map_err(|err| AppError::io(format!("{}: {}", self.dir.display(), err)))?;
        std::fs::write(&path, value)
            .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, permissions)
                .map_err(|err| AppError::io(err.to_string()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::FileStore;
    use crate::storage::KeyValueStore;

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert_eq!(store.get("tasks").unwrap(), None);
    }

    #[test]
    fn set_then_get_returns_value_and_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        store.set("completedTasks", "[]").unwrap();

        assert_eq!(store.get("completedTasks").unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("nested").join("completedTasks.json").exists());
    }

    #[test]
    fn set_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.set("tasks", "[1]").unwrap();
        store.set("tasks", "[2]").unwrap();

        assert_eq!(store.get("tasks").unwrap().as_deref(), Some("[2]"));
    }

    #[test]
    fn rejects_keys_that_escape_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let err = store.set("../tasks", "[]").unwrap_err();
        assert_eq!(err.code(), "invalid_input");
        assert_eq!(store.get("").unwrap_err().code(), "invalid_input");
    }

    #[cfg(unix)]
    #[test]
    fn written_files_are_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set("tasks", "[]").unwrap();

        let mode = std::fs::metadata(dir.path().join("tasks.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
