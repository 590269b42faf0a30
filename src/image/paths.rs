// ABOUTME: Dockerfile and ignore-file path resolution.
// ABOUTME: Config paths are relative to the config file; results are absolute and cleaned.

use std::path::{Component, Path, PathBuf};

use super::error::{BuildError, Result};

/// Resolve a build file path: a config-declared path (relative to the config
/// file's directory) beats a CLI path. Relative paths without a config file to
/// anchor them, including everything from a remote config, resolve against
/// `working_dir`. The result is absolute.
pub fn resolve_build_file(
    config_value: Option<&str>,
    config_path: &Path,
    cli_value: Option<&Path>,
    working_dir: &Path,
) -> Result<Option<PathBuf>> {
    let path = match config_value {
        Some(value) => match config_path.parent() {
            Some(dir) => dir.join(value),
            None => PathBuf::from(value),
        },
        None => match cli_value {
            Some(value) if !value.as_os_str().is_empty() => value.to_path_buf(),
            _ => return Ok(None),
        },
    };

    absolute(&path, working_dir).map(Some)
}

/// Make `path` absolute against `base` and clean it lexically.
pub fn absolute(path: &Path, base: &Path) -> Result<PathBuf> {
    let joined = base.join(path);
    let abs = std::path::absolute(&joined).map_err(|source| BuildError::Path {
        path: joined.clone(),
        source,
    })?;
    Ok(clean(&abs))
}

fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Find a Dockerfile in `dir` the way `docker build` would.
pub fn discover_dockerfile(dir: &Path) -> Option<PathBuf> {
    ["Dockerfile", "dockerfile"]
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}
