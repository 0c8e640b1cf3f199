use super::codec::{line_key, parse_line, render_line};
use crate::agent_config::AgentConfig;
use crate::error::{AgentError, Result};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// One recognized directive of an arguments file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceArgument {
    pub key: String,
    pub value: String,
}

/// Per-service argument files under a single directory (`$SNAP_DATA/args`).
///
/// Nothing is cached: every call reads the file as it is on disk. Writers to
/// the same service file are not serialized here.
#[derive(Debug, Clone)]
pub struct ArgumentStore {
    args_dir: PathBuf,
}

impl ArgumentStore {
    pub fn new(args_dir: impl Into<PathBuf>) -> Self {
        Self {
            args_dir: args_dir.into(),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.args_dir())
    }

    pub fn args_dir(&self) -> &Path {
        &self.args_dir
    }

    pub fn argument_file(&self, service: &str) -> PathBuf {
        let path = self.args_dir.join(service);
        tracing::trace!(service, path = %path.display(), "Resolved arguments file");
        path
    }

    /// Value of the first line whose key equals `key`.
    ///
    /// Returns an empty string when the key is absent, is a bare flag, or the
    /// file cannot be read. Missing and unset are the same to callers.
    pub fn get_service_argument(&self, service: &str, key: &str) -> String {
        let path = self.argument_file(service);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(service, path = %path.display(), error = %e, "Failed to read arguments file");
                }
                return String::new();
            }
        };

        let value = content
            .lines()
            .filter_map(parse_line)
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
            .unwrap_or_default();
        debug!(service, key, value = %value, "Looked up service argument");
        value
    }

    /// Every recognized directive in file order. Empty when the file is unreadable.
    pub fn service_arguments(&self, service: &str) -> Vec<ServiceArgument> {
        let path = self.argument_file(service);
        match fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .filter_map(parse_line)
                .map(|(key, value)| ServiceArgument {
                    key: key.to_string(),
                    value: value.to_string(),
                })
                .collect(),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(service, path = %path.display(), error = %e, "Failed to read arguments file");
                }
                Vec::new()
            }
        }
    }

    /// Rewrite a service's arguments file in one pass.
    ///
    /// The first line of each key in `updates` becomes `key=value`; later lines
    /// with the same key stay as they are. Every line whose key is in
    /// `deletions` is dropped, and deletion wins over an update of the same key.
    /// Updates that matched no line are appended in key order. All other lines
    /// are kept verbatim.
    ///
    /// Every key and value must survive a render/parse cycle on a single line;
    /// anything else is rejected with [`AgentError::InvalidArgument`] before the
    /// file is touched.
    ///
    /// The new content goes to a temporary file in the same directory which then
    /// replaces the original, keeping its permission bits.
    pub fn update_service_arguments<S: AsRef<str>>(
        &self,
        service: &str,
        updates: &HashMap<String, String>,
        deletions: &[S],
    ) -> Result<()> {
        validate_changes(updates, deletions)?;

        let path = self.argument_file(service);
        let content = fs::read_to_string(&path).map_err(|source| AgentError::ArgumentsRead {
            path: path.clone(),
            source,
        })?;

        let deletions: HashSet<&str> = deletions.iter().map(AsRef::as_ref).collect();
        let rewritten = rewrite_lines(&content, updates, &deletions);

        let permissions = fs::metadata(&path)
            .map_err(|source| AgentError::ArgumentsRead {
                path: path.clone(),
                source,
            })?
            .permissions();

        persist(&path, &rewritten, permissions).map_err(|source| AgentError::ArgumentsWrite {
            path: path.clone(),
            source,
        })?;

        info!(
            service,
            path = %path.display(),
            updated = updates.len(),
            deleted = deletions.len(),
            "Updated service arguments"
        );
        Ok(())
    }
}

fn validate_changes<S: AsRef<str>>(
    updates: &HashMap<String, String>,
    deletions: &[S],
) -> Result<()> {
    let invalid = |key: &str, reason: &str| AgentError::InvalidArgument {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let updated = updates.iter().map(|(k, v)| (k.as_str(), v.as_str()));
    let deleted = deletions.iter().map(|k| (AsRef::<str>::as_ref(k), ""));
    for (key, value) in updated.chain(deleted) {
        if key.contains(['\n', '\r']) || value.contains(['\n', '\r']) {
            return Err(invalid(key, "line breaks are not allowed"));
        }
        if parse_line(&render_line(key, value)) != Some((key, value)) {
            return Err(invalid(key, "not readable back as a single directive"));
        }
    }
    Ok(())
}

/// Line terminator of `line` as produced by `split_inclusive('\n')`.
fn line_ending(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

fn rewrite_lines(
    content: &str,
    updates: &HashMap<String, String>,
    deletions: &HashSet<&str>,
) -> String {
    let mut pending: HashMap<&str, &str> = updates
        .iter()
        .filter(|(key, _)| !deletions.contains(key.as_str()))
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();

    let mut out = String::with_capacity(content.len());
    for line in content.split_inclusive('\n') {
        match line_key(line) {
            Some(key) if deletions.contains(key) => {}
            Some(key) => match pending.remove(key) {
                Some(value) => {
                    out.push_str(&render_line(key, value));
                    out.push_str(line_ending(line));
                }
                None => out.push_str(line),
            },
            None => out.push_str(line),
        }
    }

    let mut remaining: Vec<(&str, &str)> = pending.into_iter().collect();
    if remaining.is_empty() {
        return out;
    }
    remaining.sort_unstable();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    for (key, value) in remaining {
        out.push_str(&render_line(key, value));
        out.push('\n');
    }
    out
}

fn persist(path: &Path, content: &str, permissions: fs::Permissions) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.as_file().set_permissions(permissions)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
