//! `modseal pack` — Build an asset pack from a directory.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use modseal_codec::{ContentKind, ENVELOPE_LEN};
use modseal_runtime::assets::{write_pack, Assets};
use modseal_runtime::LoaderConfig;
use tracing::{debug, info};

use super::sealing_codec;

pub fn execute(config: &LoaderConfig, dir: &Path, output: &Path, seal: bool) -> anyhow::Result<()> {
    let assets = Assets::from_dir(dir)
        .with_context(|| format!("cannot index '{}'", dir.display()))?;
    let mut entries = assets.collect_for_pack()?;

    let mut sealed = 0;
    if seal {
        let codec = sealing_codec(config);
        for (path, data) in entries.iter_mut() {
            let prefix = &data[..data.len().min(ENVELOPE_LEN)];
            if codec.classify(prefix, data.len() as u64) == ContentKind::Protected {
                debug!(%path, "already sealed");
                continue;
            }
            *data = codec
                .seal(&data[..])
                .with_context(|| format!("cannot seal '{}'", path))?;
            sealed += 1;
        }
    }

    let file = File::create(output)
        .with_context(|| format!("cannot create '{}'", output.display()))?;
    let mut writer = BufWriter::new(file);
    let size = write_pack(&mut writer, &entries)?;
    writer.flush()?;

    info!(entries = entries.len(), sealed, size, "wrote asset pack");
    println!(
        "Packed {} assets ({} sealed) into {} ({} bytes)",
        entries.len(),
        sealed,
        output.display(),
        size
    );
    Ok(())
}
