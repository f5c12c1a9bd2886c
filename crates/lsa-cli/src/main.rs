//! lsa: hidden-gallery container recovery CLI
//!
//! Commands:
//!   decrypt <input> [-o <dir>]  - recover a local .lsa/.lsav container to disk
//!   sniff <file>                - classify a media file by magic signature
//!   config show                 - display the active configuration (key material redacted)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lsa_core::config::LsaConfig;
use lsa_core::{MediaFormat, RecoveredArtifact};
use lsa_recovery::{Recoverer, Sniffer};
use std::path::{Path, PathBuf};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "lsa",
    version,
    about = "Hidden-gallery container recovery",
    long_about = "lsa: recover images and videos from .lsa/.lsav hidden-gallery containers"
)]
struct Cli {
    /// Path to lsa.toml configuration file
    #[arg(long, short = 'c', env = "LSA_CONFIG", default_value = "/etc/lsa/lsa.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LSA_LOG", default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recover the media inside a local container
    ///
    /// The output is named after the container's stem plus the inferred
    /// extension, e.g. IMG_0001.lsa → IMG_0001.jpg.
    Decrypt {
        /// Container file (.lsa or .lsav)
        input: PathBuf,
        /// Output directory (default: alongside the input)
        #[arg(long, short = 'o')]
        output_dir: Option<PathBuf>,
        /// Overwrite an existing output file
        #[arg(long)]
        force: bool,
    },

    /// Print the media type inferred from a file's leading bytes
    Sniff { file: PathBuf },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log);

    let config = LsaConfig::load(&cli.config)
        .with_context(|| format!("loading config: {}", cli.config.display()))?;

    match cli.command {
        Commands::Decrypt {
            input,
            output_dir,
            force,
        } => {
            let recoverer =
                Recoverer::from_config(&config).context("building transform provider")?;
            let out_dir = output_dir.unwrap_or_else(|| parent_dir(&input));
            let written = cmd_decrypt(
                &recoverer,
                &input,
                &out_dir,
                force,
                config.server.max_upload_bytes,
            )?;
            println!("{}", written.display());
            Ok(())
        }
        Commands::Sniff { file } => cmd_sniff(&config, &file),
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &cli.config),
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Recover `input` into `out_dir`, returning the path written.
fn cmd_decrypt(
    recoverer: &Recoverer,
    input: &Path,
    out_dir: &Path,
    force: bool,
    max_bytes: usize,
) -> Result<PathBuf> {
    let size = std::fs::metadata(input)
        .with_context(|| format!("reading {}", input.display()))?
        .len();
    if size > max_bytes as u64 {
        anyhow::bail!(
            "{} is {size} bytes, larger than server.max_upload_bytes ({max_bytes})",
            input.display()
        );
    }

    let bytes = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let filename = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("input path has no file name")?;

    let artifact = recoverer
        .recover(&filename, bytes)
        .map_err(|e| anyhow::anyhow!("{}: {} ({e})", input.display(), e.reason()))?;

    write_artifact(&artifact, out_dir, force)
}

fn write_artifact(artifact: &RecoveredArtifact, out_dir: &Path, force: bool) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let dest = out_dir.join(&artifact.filename);
    if dest.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            dest.display()
        );
    }
    std::fs::write(&dest, &artifact.bytes)
        .with_context(|| format!("writing {}", dest.display()))?;

    tracing::info!(
        path = %dest.display(),
        mime = artifact.mime(),
        bytes = artifact.bytes.len(),
        "wrote recovered media"
    );
    Ok(dest)
}

fn cmd_sniff(config: &LsaConfig, file: &Path) -> Result<()> {
    let data = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    match Sniffer::new(config.recovery.sniff_window).classify(&data) {
        Some(format) => println!("{}\t{}", format.extension, format.mime),
        None => println!(
            "{}\t{}\t(no signature in first {} bytes)",
            MediaFormat::UNKNOWN.extension,
            MediaFormat::UNKNOWN.mime,
            config.recovery.sniff_window
        ),
    }
    Ok(())
}

fn cmd_config_show(config: &LsaConfig, path: &Path) -> Result<()> {
    println!("# config: {}", path.display());
    let rendered = toml::to_string_pretty(&config.redacted()).context("serializing config")?;
    print!("{rendered}");
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsa_recovery::ValidationPolicy;
    use lsa_transform::IdentityProvider;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn identity() -> Recoverer {
        Recoverer::new(
            Arc::new(IdentityProvider),
            Sniffer::default(),
            ValidationPolicy::default(),
        )
    }

    #[test]
    fn decrypt_writes_named_output() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("IMG_0001.lsa");
        std::fs::write(&input, [0xFF, 0xD8, 0xFF, 0xE0, 0x00]).unwrap();

        let out = tmp.path().join("out");
        let written = cmd_decrypt(&identity(), &input, &out, false, 1024).unwrap();

        assert_eq!(written, out.join("IMG_0001.jpg"));
        assert_eq!(
            std::fs::read(&written).unwrap(),
            [0xFF, 0xD8, 0xFF, 0xE0, 0x00]
        );
    }

    #[test]
    fn decrypt_refuses_overwrite_without_force() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("clip.lsav");
        std::fs::write(&input, b"\0\0\0\x18ftypmp42").unwrap();
        std::fs::write(tmp.path().join("clip.mp4"), b"old").unwrap();

        let err = cmd_decrypt(&identity(), &input, tmp.path(), false, 1024).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        let written = cmd_decrypt(&identity(), &input, tmp.path(), true, 1024).unwrap();
        assert_eq!(std::fs::read(written).unwrap(), b"\0\0\0\x18ftypmp42");
    }

    #[test]
    fn decrypt_rejects_oversize_input() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("big.lsa");
        std::fs::write(&input, vec![0xFF; 64]).unwrap();

        let err = cmd_decrypt(&identity(), &input, tmp.path(), false, 32).unwrap_err();
        assert!(err.to_string().contains("max_upload_bytes"));
    }

    #[test]
    fn decrypt_reports_rejection_reason() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("notes.txt");
        std::fs::write(&input, b"hello").unwrap();

        let err = cmd_decrypt(&identity(), &input, tmp.path(), false, 1024).unwrap_err();
        assert!(err.to_string().contains("unsupported container kind"));
    }

    #[test]
    fn parent_dir_of_bare_name_is_cwd() {
        assert_eq!(parent_dir(Path::new("photo.lsa")), PathBuf::from("."));
        assert_eq!(
            parent_dir(Path::new("/tmp/photo.lsa")),
            PathBuf::from("/tmp")
        );
    }
}
