//! `modseal inspect` — Show how files would be classified when loaded.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use modseal_codec::{declared_payload_len, Codec, ContentKind, ENVELOPE_LEN};
use modseal_runtime::LoaderConfig;
use serde::Serialize;

use super::sealing_codec;

#[derive(Debug, Serialize)]
pub struct Inspection {
    pub path: PathBuf,
    pub len: u64,
    pub kind: ContentKind,
    /// Size field of a well-formed header, even when it does not match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_payload: Option<u64>,
}

pub fn execute(config: &LoaderConfig, files: &[PathBuf], json: bool) -> anyhow::Result<()> {
    let codec = sealing_codec(config);
    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        reports.push(inspect(&codec, path)?);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        let declared = match report.declared_payload {
            Some(n) if report.kind == ContentKind::Protected => format!("payload {} bytes", n),
            Some(n) => format!("header declares {} bytes, does not match", n),
            None => "no envelope".to_string(),
        };
        println!(
            "{:<40} {:>10} bytes  {:<10} {}",
            report.path.display(),
            report.len,
            report.kind.describe(),
            declared
        );
    }
    Ok(())
}

/// Classify one file from its first bytes and length.
pub fn inspect(codec: &Codec, path: &Path) -> anyhow::Result<Inspection> {
    let mut file =
        File::open(path).with_context(|| format!("cannot open '{}'", path.display()))?;
    let len = file.metadata()?.len();

    let mut prefix = Vec::with_capacity(ENVELOPE_LEN);
    (&mut file)
        .take(ENVELOPE_LEN as u64)
        .read_to_end(&mut prefix)
        .with_context(|| format!("cannot read '{}'", path.display()))?;

    Ok(Inspection {
        path: path.to_path_buf(),
        len,
        kind: codec.classify(&prefix, len),
        declared_payload: declared_payload_len(&prefix),
    })
}
