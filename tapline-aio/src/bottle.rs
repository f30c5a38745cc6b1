// tapline-aio/src/bottle.rs
//! Recovers formula names from a bottle's embedded install receipt.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use serde::Deserialize;
use tapline_common::capability::{BottleInspector, BottleNames};
use tapline_common::error::{Result, TaplineError};
use tracing::debug;

const RECEIPT_FILE: &str = "INSTALL_RECEIPT.json";

#[derive(Debug, Default, Deserialize)]
struct Receipt {
    #[serde(default)]
    tapped_from: Option<String>,
    #[serde(default)]
    source: Option<ReceiptSource>,
}

#[derive(Debug, Default, Deserialize)]
struct ReceiptSource {
    #[serde(default)]
    tap: Option<String>,
}

impl Receipt {
    fn tap(&self) -> Option<&str> {
        self.source
            .as_ref()
            .and_then(|s| s.tap.as_deref())
            .or(self.tapped_from.as_deref())
    }
}

/// [`BottleInspector`] for gzip-compressed tar bottles.
#[derive(Debug, Default, Clone, Copy)]
pub struct TarBottleInspector;

impl TarBottleInspector {
    pub fn new() -> Self {
        Self
    }
}

impl BottleInspector for TarBottleInspector {
    fn formula_names(&self, bottle: &Path) -> Result<BottleNames> {
        debug!("Reading install receipt from bottle {}", bottle.display());
        let file = File::open(bottle)?;
        let mut archive = tar::Archive::new(GzDecoder::new(file));

        for entry in archive.entries()? {
            let mut entry = entry?;
            let entry_path = entry.path()?.to_string_lossy().into_owned();
            // <name>/<version>/INSTALL_RECEIPT.json
            let parts: Vec<&str> = entry_path.trim_start_matches("./").split('/').collect();
            if parts.len() != 3 || parts[2] != RECEIPT_FILE {
                continue;
            }
            let name = parts[0].to_string();

            let mut contents = String::new();
            entry.read_to_string(&mut contents)?;
            let receipt: Receipt = serde_json::from_str(&contents).map_err(|e| {
                TaplineError::Bottle(format!(
                    "invalid receipt {entry_path} in {}: {e}",
                    bottle.display()
                ))
            })?;

            let full_name = full_name_for(&name, receipt.tap());
            debug!("Bottle {} provides {} ({})", bottle.display(), name, full_name);
            return Ok(BottleNames { name, full_name });
        }

        Err(TaplineError::Bottle(format!(
            "no {RECEIPT_FILE} found in {}",
            bottle.display()
        )))
    }
}

fn full_name_for(name: &str, tap: Option<&str>) -> String {
    match tap {
        None => name.to_string(),
        Some(tap)
            if tap.eq_ignore_ascii_case("homebrew/homebrew")
                || tap.eq_ignore_ascii_case("homebrew/core") =>
        {
            name.to_string()
        }
        Some(tap) => {
            let tap = match tap.split_once('/') {
                Some((user, repo)) => {
                    format!("{user}/{}", repo.strip_prefix("homebrew-").unwrap_or(repo))
                }
                None => tap.to_string(),
            };
            format!("{tap}/{name}")
        }
    }
}

#[cfg(test)]
mod tests {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    use super::*;

    fn write_bottle(path: &Path, receipt: &str) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        let mut header = tar::Header::new_gnu();
        header.set_size(receipt.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "wget/1.21/INSTALL_RECEIPT.json", receipt.as_bytes())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn tapped_bottle_yields_qualified_name() {
        let dir = tempfile::tempdir().unwrap();
        let bottle = dir.path().join("wget-1.21.x86_64_linux.bottle.tar.gz");
        write_bottle(&bottle, r#"{"tapped_from": "alice/homebrew-tools"}"#);

        let names = TarBottleInspector::new().formula_names(&bottle).unwrap();
        assert_eq!(names.name, "wget");
        assert_eq!(names.full_name, "alice/tools/wget");
    }

    #[test]
    fn core_bottle_keeps_bare_name() {
        let dir = tempfile::tempdir().unwrap();
        let bottle = dir.path().join("wget-1.21.x86_64_linux.bottle.tar.gz");
        write_bottle(&bottle, r#"{"source": {"tap": "homebrew/core"}}"#);

        let names = TarBottleInspector::new().formula_names(&bottle).unwrap();
        assert_eq!(names.full_name, "wget");
    }

    #[test]
    fn receipt_without_tap_is_core() {
        assert_eq!(full_name_for("wget", None), "wget");
        assert_eq!(full_name_for("wget", Some("Homebrew/homebrew")), "wget");
    }
}
