use anyhow::Result;
use tracing::{info, warn};

use crate::cli::InventoryArgs;
use crate::layout::{INVENTORY_FILE_NAME, SourceLayout};
use crate::model::{Source, SourceInventoryEntry, SourceInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let config = args.workspace.load_config()?;
    let layout = SourceLayout::new(&args.workspace.base_dir, &config);
    let manifest = build_manifest(&layout)?;

    for entry in manifest.sources.iter().filter(|entry| !entry.present) {
        warn!(api = %entry.api, source = %entry.source, path = %entry.path, "source document missing");
    }

    if args.dry_run {
        info!(
            present = manifest.present_count,
            missing = manifest.missing_count,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| layout.comparison_dir().join(INVENTORY_FILE_NAME));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote source inventory");
    info!(
        apis = manifest.api_count,
        present = manifest.present_count,
        missing = manifest.missing_count,
        "inventory completed"
    );

    Ok(())
}

pub fn build_manifest(layout: &SourceLayout) -> Result<SourceInventoryManifest> {
    let apis = &layout.config().apis;
    let mut sources = Vec::with_capacity(apis.len() * Source::ALL.len());

    for api in apis {
        for source in Source::ALL {
            let path = layout.source_path(api, source);
            let present = path.is_file();
            let sha256 = if present {
                Some(sha256_file(&path)?)
            } else {
                None
            };

            sources.push(SourceInventoryEntry {
                api: api.clone(),
                source: source.key().to_string(),
                path: path.display().to_string(),
                present,
                sha256,
            });
        }
    }

    let present_count = sources.iter().filter(|entry| entry.present).count();

    Ok(SourceInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        base_directory: layout.base_dir().display().to_string(),
        api_count: apis.len(),
        present_count,
        missing_count: sources.len() - present_count,
        sources,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::build_manifest;
    use crate::config::EvalConfig;
    use crate::layout::SourceLayout;

    #[test]
    fn manifest_hashes_present_sources_and_flags_missing_ones() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let config = EvalConfig::from_toml("apis = [\"sap\"]").expect("config should parse");

        let rag_dir = dir.path().join("rag");
        fs::create_dir_all(&rag_dir).expect("rag dir should be created");
        fs::write(rag_dir.join("sap_to_flip_mapping.json"), "abc")
            .expect("fixture should be written");

        let layout = SourceLayout::new(dir.path(), &config);
        let manifest = build_manifest(&layout).expect("manifest should build");

        assert_eq!(manifest.api_count, 1);
        assert_eq!(manifest.sources.len(), 5);
        assert_eq!(manifest.present_count, 1);
        assert_eq!(manifest.missing_count, 4);

        let rag = manifest
            .sources
            .iter()
            .find(|entry| entry.source == "rag")
            .expect("rag entry should exist");
        assert!(rag.present);
        assert_eq!(
            rag.sha256.as_deref(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );

        let ground_truth = manifest
            .sources
            .iter()
            .find(|entry| entry.source == "ground_truth")
            .expect("ground truth entry should exist");
        assert!(!ground_truth.present);
        assert!(ground_truth.sha256.is_none());
    }
}
