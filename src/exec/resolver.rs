// src/exec/resolver.rs

//! Resolution of the result file named by the protocol.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::fs::{FileSystem, RealFileSystem};

/// Turns the `file` reference of a result record into the result body.
///
/// Decoding the file content (e.g. extracting XML) is up to the
/// implementation; the executor only needs "path in, body out".
pub trait ResultResolver: Send + Sync + std::fmt::Debug {
    fn resolve<'a>(
        &'a self,
        path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>>;
}

/// Reads the file as text and deletes it afterwards.
///
/// Each result file is consumed exactly once; a second resolution of the
/// same path fails because the file is gone.
#[derive(Debug, Clone)]
pub struct FileResultResolver {
    fs: Arc<dyn FileSystem>,
}

impl Default for FileResultResolver {
    fn default() -> Self {
        Self::new(Arc::new(RealFileSystem))
    }
}

impl FileResultResolver {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl ResultResolver for FileResultResolver {
    fn resolve<'a>(
        &'a self,
        path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>> {
        let fs = Arc::clone(&self.fs);
        let path: PathBuf = path.to_path_buf();

        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                let content = fs.read_to_string(&path)?;
                fs.remove_file(&path)?;
                debug!(path = ?path, bytes = content.len(), "result file consumed");
                Ok::<_, anyhow::Error>(Value::String(content))
            })
            .await
            .context("result file reader task failed")?
        })
    }
}
