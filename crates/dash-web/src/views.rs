use std::error::Error;
use std::fmt;
use std::path::{Component, Path, PathBuf};

pub const VIEW_EXTENSION: &str = "html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    NotFound,
    Read(String),
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "view not found"),
            Self::Read(detail) => write!(f, "Read view error: {detail}"),
        }
    }
}

impl Error for ViewError {}

/// Page templates under `templates/`, rendered with query parameters as
/// view data. `{{.key}}` is replaced with the HTML-escaped value of `key`;
/// unknown keys render as nothing.
#[derive(Debug, Clone)]
pub struct ViewStore {
    dir: PathBuf,
}

impl ViewStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        if path.is_empty()
            || !relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)))
        {
            return None;
        }
        let mut full = self.dir.join(relative);
        if full.extension().is_none() {
            full.set_extension(VIEW_EXTENSION);
        }
        full.is_file().then_some(full)
    }

    pub fn render(&self, path: &str, data: &[(String, String)]) -> Result<String, ViewError> {
        let file = self.resolve(path).ok_or(ViewError::NotFound)?;
        let source = std::fs::read_to_string(&file)
            .map_err(|error| ViewError::Read(format!("{}: {error}", file.display())))?;
        Ok(substitute(&source, data))
    }
}

fn substitute(source: &str, data: &[(String, String)]) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let inner = after_open[..end].trim();
        match inner.strip_prefix('.') {
            Some(key) if is_identifier(key) => {
                if let Some((_, value)) = data.iter().find(|(k, _)| k == key) {
                    out.push_str(&escape_html(value));
                }
            }
            _ => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after_open[end + 2..];
    }
    out.push_str(rest);
    out
}

fn is_identifier(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
