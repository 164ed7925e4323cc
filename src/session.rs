use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{fs, io};

use spdlog::debug;

/// Durable place where the session token lives between requests.
pub trait TokenStore {
    fn load(&self) -> Option<String>;
    fn save(&mut self, token: &str) -> io::Result<()>;
    fn remove(&mut self) -> io::Result<()>;
}

/// Admin session handed explicitly to whatever needs it.
///
/// The token is never inspected: whether it is still good is up to the
/// server's verify endpoint.
pub struct Session<S: TokenStore> {
    store: S,
    token: Option<String>,
}

impl<S: TokenStore> Session<S> {
    pub fn open(store: S) -> Self {
        let token = store.load().filter(|t| !t.is_empty());
        Session { store, token }
    }

    pub fn set_session(&mut self, token: &str) -> io::Result<()> {
        self.store.save(token)?;
        self.token = Some(token.to_string());
        Ok(())
    }

    pub fn clear_session(&mut self) -> io::Result<()> {
        self.token = None;
        self.store.remove()
    }

    pub fn has_session(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

#[derive(Default, Debug)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        MemoryTokenStore { token: Some(token.to_string()) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.clone()
    }

    fn save(&mut self, token: &str) -> io::Result<()> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn remove(&mut self) -> io::Result<()> {
        self.token = None;
        Ok(())
    }
}

/// One-file token jar used by the admin tool.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        FileTokenStore { path }
    }

    /// `<config dir>/blogfront/session`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("blogfront").join("session"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Some(content.trim().to_string()),
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    debug!("Could not read session file {}: {}", self.path.display(), e);
                }
                None
            }
        }
    }

    fn save(&mut self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)
    }

    fn remove(&mut self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::process;

    use super::*;

    fn temp_session_path(name: &str) -> PathBuf {
        env::temp_dir()
            .join(format!("blogfront-test-{}", process::id()))
            .join(name)
    }

    #[test]
    fn test_memory_session_lifecycle() {
        let mut session = Session::open(MemoryTokenStore::default());
        assert!(!session.has_session());

        session.set_session("abc").unwrap();
        assert!(session.has_session());
        assert_eq!(session.token(), Some("abc"));
        assert_eq!(session.store().load(), Some("abc".to_string()));

        session.clear_session().unwrap();
        assert!(!session.has_session());
        assert_eq!(session.store().load(), None);
    }

    #[test]
    fn test_empty_token_is_no_session() {
        let session = Session::open(MemoryTokenStore::with_token(""));
        assert!(!session.has_session());
    }

    #[test]
    fn test_file_session_persists() -> io::Result<()> {
        let path = temp_session_path("persist/session");

        let mut session = Session::open(FileTokenStore::new(path.clone()));
        assert!(!session.has_session());
        session.set_session("token-123")?;

        let reopened = Session::open(FileTokenStore::new(path.clone()));
        assert_eq!(reopened.token(), Some("token-123"));

        let mut reopened = reopened;
        reopened.clear_session()?;
        assert!(!path.exists());

        // Clearing twice is fine
        reopened.clear_session()?;
        Ok(())
    }
}
