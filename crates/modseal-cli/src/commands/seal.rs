//! `modseal seal` — Wrap a plain module in an envelope.

use std::path::Path;

use anyhow::{bail, Context};
use modseal_codec::{ContentKind, ENVELOPE_LEN};
use modseal_runtime::LoaderConfig;
use tracing::info;

use super::sealing_codec;

pub fn execute(config: &LoaderConfig, input: &Path, output: &Path) -> anyhow::Result<()> {
    let codec = sealing_codec(config);
    let bytes = std::fs::read(input)
        .with_context(|| format!("cannot read '{}'", input.display()))?;

    let prefix = &bytes[..bytes.len().min(ENVELOPE_LEN)];
    if codec.classify(prefix, bytes.len() as u64) == ContentKind::Protected {
        bail!("'{}' is already sealed", input.display());
    }

    let sealed = codec.seal(&bytes)?;
    std::fs::write(output, &sealed)
        .with_context(|| format!("cannot write '{}'", output.display()))?;

    info!(input = %input.display(), output = %output.display(), payload = bytes.len(), "sealed");
    println!(
        "Sealed {} -> {} ({} bytes)",
        input.display(),
        output.display(),
        sealed.len()
    );
    Ok(())
}
