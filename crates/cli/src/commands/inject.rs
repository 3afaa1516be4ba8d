//! Splice a fix into a local theme file.
//!
//! Useful for checking where a block lands before creating a sandbox theme.
//! Without `--in-place` the result goes to stdout.

use std::path::Path;

use ghost_cro_core::sandbox::{Injection, InjectionKind, SandboxError, inject};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InjectError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

fn read(path: &Path) -> Result<String, InjectError> {
    std::fs::read_to_string(path).map_err(|source| InjectError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Inject `content_file` into `file` as block `id`.
///
/// # Errors
///
/// Returns an error if either file cannot be read, the injection is
/// rejected, or the in-place write fails.
pub fn run(
    file: &Path,
    id: String,
    kind: InjectionKind,
    content_file: &Path,
    in_place: bool,
) -> Result<(), InjectError> {
    let source = read(file)?;
    let injection = Injection {
        id,
        kind,
        content: read(content_file)?,
    };

    let injected = inject(&source, &injection)?;
    tracing::info!(id = %injection.id, outcome = %injected.outcome, "Block injected");

    if in_place {
        std::fs::write(file, &injected.source).map_err(|source| InjectError::Write {
            path: file.display().to_string(),
            source,
        })?;
        tracing::info!(path = %file.display(), "Theme file updated");
    } else {
        #[allow(clippy::print_stdout)]
        {
            print!("{}", injected.source);
        }
    }
    Ok(())
}
