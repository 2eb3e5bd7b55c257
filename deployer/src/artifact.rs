//! Compiled contract artifacts.

use ethers::types::Bytes;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::error::DeployError;

/// Where creation bytecode comes from.
pub trait ArtifactSource: Send + Sync {
    fn bytecode(&self, name: &str) -> Result<Bytes, DeployError>;
}

/// A directory of compiler output: either `<Name>.json` or Foundry's
/// `<Name>.sol/<Name>.json`, with the bytecode at `bytecode.object` or as a
/// plain `bytecode` string.
#[derive(Clone, Debug)]
pub struct ArtifactDir {
    root: PathBuf,
}

impl ArtifactDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locate(&self, name: &str) -> Option<PathBuf> {
        [
            self.root.join(format!("{name}.json")),
            self.root.join(format!("{name}.sol")).join(format!("{name}.json")),
        ]
        .into_iter()
        .find(|p| p.is_file())
    }
}

fn parse_bytecode(path: &Path, content: &str) -> Result<Bytes, DeployError> {
    let invalid = |reason: String| DeployError::InvalidArtifact {
        path: path.display().to_string(),
        reason,
    };
    let json: Value = serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?;
    let hex = match json.get("bytecode") {
        Some(Value::String(s)) => s.as_str(),
        Some(obj) => obj
            .get("object")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("bytecode.object is missing".into()))?,
        None => return Err(invalid("no bytecode field".into())),
    };
    let code = Bytes::from_str(hex).map_err(|e| invalid(e.to_string()))?;
    if code.is_empty() {
        return Err(invalid("bytecode is empty (abstract contract or interface?)".into()));
    }
    Ok(code)
}

impl ArtifactSource for ArtifactDir {
    fn bytecode(&self, name: &str) -> Result<Bytes, DeployError> {
        let path = self.locate(name).ok_or_else(|| DeployError::ArtifactNotFound {
            name: name.to_string(),
            root: self.root.display().to_string(),
        })?;
        let content = std::fs::read_to_string(&path).map_err(|e| DeployError::InvalidArtifact {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        debug!(name, path = %path.display(), "loaded artifact");
        parse_bytecode(&path, &content)
    }
}
