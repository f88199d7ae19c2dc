use std::{fs, io, path::PathBuf};

use anyhow::Context;

/// Persistent slot for the session token (the browser's local storage).
pub trait TokenStore {
    fn get(&self) -> Option<String>;
    fn set(&mut self, token: &str) -> anyhow::Result<()>;
    fn remove(&mut self) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl MemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.clone()
    }

    fn set(&mut self, token: &str) -> anyhow::Result<()> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn remove(&mut self) -> anyhow::Result<()> {
        self.token = None;
        Ok(())
    }
}

/// Keeps the token in a single file so it survives restarts.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let token = raw.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    fn set(&mut self, token: &str) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("create token dir {}", dir.display()))?;
        }
        fs::write(&self.path, token)
            .with_context(|| format!("write token file {}", self.path.display()))
    }

    fn remove(&mut self) -> anyhow::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove token file {}", self.path.display())),
        }
    }
}
