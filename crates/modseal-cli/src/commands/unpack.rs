//! `modseal unpack` — List or extract asset pack entries.

use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context};
use modseal_runtime::assets::read_pack;

pub fn execute(pack: &Path, dir: Option<&Path>, list: bool) -> anyhow::Result<()> {
    let data = std::fs::read(pack).with_context(|| format!("cannot read '{}'", pack.display()))?;
    let entries = read_pack(&data)?;

    if list {
        for (path, bytes) in &entries {
            println!("{:>10}  {}", bytes.len(), path);
        }
        println!("{} entries", entries.len());
        return Ok(());
    }

    let Some(dir) = dir else {
        bail!("an output directory is required unless --list is given");
    };
    for (path, bytes) in &entries {
        let target = dir.join(safe_relative(path)?);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, bytes)
            .with_context(|| format!("cannot write '{}'", target.display()))?;
    }
    println!("Extracted {} assets into {}", entries.len(), dir.display());
    Ok(())
}

/// Reject entry paths that would escape the output directory.
fn safe_relative(path: &str) -> anyhow::Result<PathBuf> {
    let candidate = Path::new(path);
    let mut out = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => bail!("refusing to extract '{}' outside the output directory", path),
        }
    }
    if out.as_os_str().is_empty() {
        bail!("empty asset path in pack");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_relative() {
        assert_eq!(safe_relative("ui/list.lua").unwrap(), PathBuf::from("ui/list.lua"));
        assert_eq!(safe_relative("./main.lua").unwrap(), PathBuf::from("main.lua"));
        assert!(safe_relative("../evil.lua").is_err());
        assert!(safe_relative("/etc/passwd").is_err());
        assert!(safe_relative("").is_err());
    }
}
