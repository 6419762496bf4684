use std::path::PathBuf;

pub const ROOT_ENV: &str = "DASH_ROOT";

/// On-disk layout of a dash installation.
///
/// Everything is resolved relative to one root directory, normally the
/// directory holding the executable.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// `DASH_ROOT` if set, otherwise the executable's own directory.
    pub fn resolve() -> Result<Self, String> {
        if let Ok(root) = std::env::var(ROOT_ENV) {
            let root = PathBuf::from(root);
            if !root.is_dir() {
                return Err(format!(
                    "{ROOT_ENV} is not a directory: {}",
                    root.display()
                ));
            }
            return Ok(Self::new(root));
        }
        let exe = std::env::current_exe()
            .map_err(|e| format!("failed to locate executable: {e}"))?;
        let dir = exe
            .parent()
            .ok_or_else(|| format!("executable has no parent directory: {}", exe.display()))?;
        Ok(Self::new(dir.to_path_buf()))
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("templates")
    }

    pub fn static_js_dir(&self) -> PathBuf {
        self.root.join("static").join("js")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("Data")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join("log")
    }

    pub fn default_cert(&self) -> PathBuf {
        self.root.join("cert.pem")
    }

    pub fn default_key(&self) -> PathBuf {
        self.root.join("key.pem")
    }
}
