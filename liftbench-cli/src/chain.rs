//! Chain file remediation
//!
//! Some tools cannot read gzip-compressed chain files. For those the resolver
//! hands out an uncompressed sibling, decompressing it once if needed.

use crate::error::BenchError;
use crate::tools::Tool;
use flate2::read::MultiGzDecoder;
use std::sync::OnceLock;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::info;

/// Resolves the chain file each tool should be given.
#[derive(Debug)]
pub struct ChainResolver {
    chain: PathBuf,
    uncompressed: OnceLock<PathBuf>,
}

impl ChainResolver {
    /// Resolver for the configured chain file.
    pub fn new(chain: impl Into<PathBuf>) -> Self {
        Self {
            chain: chain.into(),
            uncompressed: OnceLock::new(),
        }
    }

    /// The chain file as configured.
    pub fn chain(&self) -> &Path {
        &self.chain
    }

    /// Chain path suitable for `tool`.
    pub fn resolve(&self, tool: Tool) -> Result<PathBuf, BenchError> {
        if !tool.requires_uncompressed_chain() || !is_gzip_path(&self.chain) {
            return Ok(self.chain.clone());
        }
        if let Some(path) = self.uncompressed.get() {
            return Ok(path.clone());
        }
        let path = ensure_uncompressed(&self.chain)?;
        let _ = self.uncompressed.set(path.clone());
        Ok(path)
    }
}

fn is_gzip_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Return the uncompressed sibling of `chain`, creating it if absent.
pub fn ensure_uncompressed(chain: &Path) -> Result<PathBuf, BenchError> {
    let target = chain.with_extension("");
    if target.exists() {
        return Ok(target);
    }

    let unavailable = |reason: String| BenchError::ResourceUnavailable {
        path: target.clone(),
        reason,
    };

    info!(
        "decompressing {} -> {}",
        chain.display(),
        target.display()
    );
    let source = File::open(chain)
        .map_err(|e| unavailable(format!("cannot open {}: {}", chain.display(), e)))?;
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    // Decompress next to the target and rename, so a failed run never leaves
    // a truncated chain behind for the next one to pick up.
    let staging = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| unavailable(format!("cannot create staging file: {e}")))?;
    {
        let mut decoder = MultiGzDecoder::new(BufReader::new(source));
        let mut writer = BufWriter::new(staging.as_file());
        io::copy(&mut decoder, &mut writer)
            .map_err(|e| unavailable(format!("decompression failed: {e}")))?;
        io::Write::flush(&mut writer).map_err(|e| unavailable(format!("write failed: {e}")))?;
    }
    staging
        .persist(&target)
        .map_err(|e| unavailable(format!("cannot move into place: {}", e.error)))?;

    Ok(target)
}
