//! genmoji – one-shot image generation.
//!
//! Sends the prompt to the diffusion server once, writes the image to
//! `genmoji_<unix-seconds>.png` in the working directory and prints the file
//! name on stdout. Diagnostics go to stderr.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use kira_core::services::diffusion::{self, HttpDiffusion, ImageGenerator};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_PROMPT: &str = "happy local foodie cartoon emoji";

/// Generate a cartoon emoji image from a text prompt.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// What the emoji should show
    #[arg(default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// Base URL of the OpenAI-compatible image server
    #[arg(long, env = "KIRA_IMAGE_BASE_URL", default_value = diffusion::DEFAULT_BASE_URL)]
    base_url: String,

    /// Diffusion model name
    #[arg(long, env = "KIRA_IMAGE_MODEL", default_value = diffusion::DEFAULT_MODEL)]
    model: String,

    /// Image size as WIDTHxHEIGHT
    #[arg(long, env = "KIRA_IMAGE_SIZE", default_value = diffusion::DEFAULT_SIZE)]
    size: String,

    /// Bearer token for the image server
    #[arg(long, env = "KIRA_IMAGE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

fn output_file_name(unix_seconds: i64) -> String {
    format!("genmoji_{unix_seconds}.png")
}

/// Generate one image for `prompt` and write it into `dir`.
async fn generate_to(
    generator: &dyn ImageGenerator,
    prompt: &str,
    dir: &Path,
    unix_seconds: i64,
) -> anyhow::Result<PathBuf> {
    let png = generator
        .generate(prompt)
        .await
        .context("image generation failed")?;

    let path = dir.join(output_file_name(unix_seconds));
    tokio::fs::write(&path, &png)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = png.len(), "image saved");
    Ok(path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let started = chrono::Utc::now().timestamp();

    let generator = HttpDiffusion::new()
        .with_base_url(cli.base_url)
        .with_model(cli.model)
        .with_size(cli.size)
        .with_api_key(cli.api_key);

    let path = generate_to(&generator, &cli.prompt, Path::new("."), started).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| output_file_name(started));
    println!("{name}");
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use kira_core::ServiceError;

    use super::*;

    struct FixedImage {
        result: Result<Vec<u8>, String>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageGenerator for FixedImage {
        async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ServiceError> {
            self.prompts.lock().unwrap().push(prompt.to_owned());
            self.result
                .clone()
                .map_err(|message| ServiceError::InvalidResponse {
                    service: "image generation",
                    message,
                })
        }
    }

    #[test]
    fn file_name_uses_unix_seconds() {
        assert_eq!(output_file_name(1_760_000_000), "genmoji_1760000000.png");
    }

    #[test]
    fn prompt_defaults_when_omitted() {
        let cli = Cli::try_parse_from(["genmoji"]).unwrap();
        assert_eq!(cli.prompt, DEFAULT_PROMPT);

        let cli = Cli::try_parse_from(["genmoji", "sleepy cat emoji"]).unwrap();
        assert_eq!(cli.prompt, "sleepy cat emoji");
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "genmoji",
            "--model",
            "sdxl-turbo",
            "--size",
            "256x256",
            "--base-url",
            "http://gpu:3000/v1",
        ])
        .unwrap();
        assert_eq!(cli.model, "sdxl-turbo");
        assert_eq!(cli.size, "256x256");
        assert_eq!(cli.base_url, "http://gpu:3000/v1");
    }

    #[tokio::test]
    async fn writes_generated_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let generator = FixedImage {
            result: Ok(b"\x89PNG fake".to_vec()),
            prompts: Mutex::default(),
        };

        let path = generate_to(&generator, "taco emoji", dir.path(), 42).await.unwrap();

        assert_eq!(path, dir.path().join("genmoji_42.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG fake");
        assert_eq!(*generator.prompts.lock().unwrap(), vec!["taco emoji".to_owned()]);
    }

    #[tokio::test]
    async fn generation_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let generator = FixedImage {
            result: Err("no data".into()),
            prompts: Mutex::default(),
        };

        let err = generate_to(&generator, "x", dir.path(), 42).await.unwrap_err();

        assert!(format!("{err:#}").contains("no data"));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
