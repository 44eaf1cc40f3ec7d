//! Provenance recorded in the execution header: input fingerprints and the
//! host environment.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use beir_core::trail::{EnvironmentInfo, InputsIntegrity};
use sha2::{Digest, Sha256};

/// Written in place of a digest when the file cannot be read.
pub const HASH_UNAVAILABLE: &str = "HASH_ERROR_OR_FILE_NOT_FOUND";

/// Lowercase hex SHA-256 of a file, read in fixed-size blocks.
///
/// # Errors
///
/// Returns the underlying I/O error when the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}

/// Fingerprint both run inputs. Unreadable files get [`HASH_UNAVAILABLE`].
#[must_use]
pub fn inputs_integrity(dose_matrix: &Path, params: &Path) -> InputsIntegrity {
    InputsIntegrity {
        dose_matrix: dose_matrix.display().to_string(),
        dose_matrix_sha256: digest_or_marker(dose_matrix),
        params: params.display().to_string(),
        params_sha256: digest_or_marker(params),
    }
}

fn digest_or_marker(path: &Path) -> String {
    sha256_file(path).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), "cannot hash input: {e}");
        HASH_UNAVAILABLE.to_string()
    })
}

/// User, host, OS and tool version of the current process.
#[must_use]
pub fn environment() -> EnvironmentInfo {
    let var = |names: &[&str]| {
        names
            .iter()
            .find_map(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| "unknown".to_string())
    };
    EnvironmentInfo {
        user: var(&["USER", "USERNAME"]),
        host: var(&["HOSTNAME", "COMPUTERNAME"]),
        os: std::env::consts::OS.to_string(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn digest_of_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, "abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn missing_file_gets_marker() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("matrix.csv");
        std::fs::write(&present, "").unwrap();
        let integrity = inputs_integrity(&present, &dir.path().join("absent.json"));
        assert_eq!(
            integrity.dose_matrix_sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(integrity.params_sha256, HASH_UNAVAILABLE);
    }

    #[test]
    fn environment_names_the_os() {
        let env = environment();
        assert_eq!(env.os, std::env::consts::OS);
        assert!(!env.tool_version.is_empty());
    }
}
