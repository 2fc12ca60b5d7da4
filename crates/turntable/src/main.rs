//! Command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use turntable::{
    run_batch, AssetReference, BatchOptions, LoadFailurePolicy, ModelCatalog, Result,
};

/// Photographs 3D models on a turntable from 16 angles.
#[derive(Parser, Debug)]
#[command(name = "turntable", version, about)]
struct Args {
    /// JSON manifest listing models: {"models": ["a.obj", ...]}.
    #[arg(long, value_name = "MANIFEST")]
    catalog: Option<PathBuf>,

    /// Stop the batch when a model fails to load instead of skipping it.
    #[arg(long)]
    abort_on_load_failure: bool,

    /// Directory the per-model frame directories are created in.
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Maximum frame writes in flight.
    #[arg(long, value_name = "N", default_value_t = BatchOptions::default().max_pending_writes)]
    max_pending_writes: usize,

    /// Model files (OBJ) to capture, after those in the manifest.
    #[arg(value_name = "MODEL")]
    models: Vec<PathBuf>,
}

impl Args {
    fn catalog(&self) -> Result<ModelCatalog> {
        let mut catalog = match &self.catalog {
            Some(manifest) => ModelCatalog::from_manifest(manifest)?,
            None => ModelCatalog::default(),
        };
        catalog.extend(self.models.iter().map(AssetReference::new).collect());
        Ok(catalog)
    }

    fn options(&self) -> Result<BatchOptions> {
        let mut options = match &self.output {
            Some(root) => BatchOptions::default().with_output_root(root),
            None => BatchOptions::in_working_dir()?,
        };
        if self.abort_on_load_failure {
            options = options.with_load_failure_policy(LoadFailurePolicy::Abort);
        }
        options.max_pending_writes = self.max_pending_writes;
        Ok(options)
    }
}

fn run(args: &Args) -> Result<bool> {
    let report = run_batch(args.catalog()?, args.options()?)?;
    Ok(report.is_success())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_batch_options() {
        let args = Args::try_parse_from(["turntable", "a.obj"]).unwrap();
        assert_eq!(
            args.max_pending_writes,
            BatchOptions::default().max_pending_writes
        );
        assert!(!args.abort_on_load_failure);

        let options = args.options().unwrap();
        assert_eq!(options.load_failure_policy, LoadFailurePolicy::Skip);
    }

    #[test]
    fn test_flags_override_options() {
        let args = Args::try_parse_from([
            "turntable",
            "--abort-on-load-failure",
            "--output",
            "/tmp/shots",
            "--max-pending-writes",
            "3",
            "a.obj",
        ])
        .unwrap();

        let options = args.options().unwrap();
        assert_eq!(options.load_failure_policy, LoadFailurePolicy::Abort);
        assert_eq!(options.output_root, PathBuf::from("/tmp/shots"));
        assert_eq!(options.max_pending_writes, 3);
    }

    #[test]
    fn test_catalog_lists_manifest_before_positional_models() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("catalog.json");
        std::fs::write(&manifest, r#"{ "models": ["chair.obj"] }"#).unwrap();

        let argv: Vec<std::ffi::OsString> = vec![
            "turntable".into(),
            "--catalog".into(),
            manifest.into_os_string(),
            "lamp.obj".into(),
            "desk.obj".into(),
        ];
        let args = Args::try_parse_from(argv).unwrap();

        let catalog = args.catalog().unwrap();
        let names: Vec<String> = catalog.iter().map(AssetReference::name).collect();
        assert_eq!(names, ["chair", "lamp", "desk"]);
        assert_eq!(
            catalog.reference_at(0).unwrap().path(),
            dir.path().join("chair.obj")
        );
    }
}
