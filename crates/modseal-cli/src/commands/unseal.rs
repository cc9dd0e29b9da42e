//! `modseal unseal` — Strip the envelope from a sealed module.

use std::path::Path;

use anyhow::Context;
use modseal_runtime::LoaderConfig;
use tracing::info;

use super::sealing_codec;

pub fn execute(config: &LoaderConfig, input: &Path, output: &Path) -> anyhow::Result<()> {
    let codec = sealing_codec(config);
    let bytes = std::fs::read(input)
        .with_context(|| format!("cannot read '{}'", input.display()))?;

    let plain = codec
        .unseal(&bytes)
        .with_context(|| format!("cannot unseal '{}'", input.display()))?;
    std::fs::write(output, &plain)
        .with_context(|| format!("cannot write '{}'", output.display()))?;

    info!(input = %input.display(), output = %output.display(), payload = plain.len(), "unsealed");
    println!(
        "Unsealed {} -> {} ({} bytes)",
        input.display(),
        output.display(),
        plain.len()
    );
    Ok(())
}
