use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use cli::{read_image_payload, write_image_payload};
use color_eyre::eyre::{Result, eyre};
use inpaint_common::{ImagePayload, InpaintRequest};
use inpainting::{FileSettings, HttpBackend, InpaintBackend, settings};
use masking::FlattenFormat;
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "Headless driver for the inpaint-kit pipeline", long_about = None)]
struct Cli {
    /// Path to the JSON settings file
    #[arg(long, default_value = "inpaint_settings.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a document and layer export through the inpainting backend
    Inpaint {
        /// Full-canvas document export (PNG)
        #[arg(short, long)]
        image: PathBuf,
        /// Isolated active-layer export whose alpha becomes the mask (PNG)
        #[arg(short, long)]
        layer: PathBuf,
        /// Where to write the inpainted result (PNG)
        #[arg(short, long)]
        output: PathBuf,
        /// What the model should paint into the masked region
        #[arg(long, default_value = "")]
        positive: String,
        /// What the model should avoid
        #[arg(long, default_value = "")]
        negative: String,
        /// Override the persisted backend base URL for this run
        #[arg(long)]
        api_url: Option<String>,
    },
    /// Convert a layer export's alpha channel into a grayscale mask
    Mask {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Discard transparency, optionally re-encoding as JPEG
    Flatten {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Re-encode as JPEG at this quality (1-100) instead of PNG
        #[arg(long)]
        jpeg_quality: Option<u8>,
    },
    /// Persist the backend base URL
    SetApiUrl { url: String },
    /// Print the effective configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = FileSettings::new(&cli.config);

    match cli.command {
        Commands::Inpaint {
            image,
            layer,
            output,
            positive,
            negative,
            api_url,
        } => {
            run_inpaint(&store, &image, &layer, &output, &positive, &negative, api_url).await?;
        }
        Commands::Mask { input, output } => {
            let mask = masking::alpha_to_mask(&read_image_payload(&input)?)?;
            write_image_payload(&mask, &output)?;
            info!(path = %output.display(), "wrote mask");
        }
        Commands::Flatten {
            input,
            output,
            jpeg_quality,
        } => {
            let format = match jpeg_quality {
                Some(quality) => FlattenFormat::Jpeg { quality },
                None => FlattenFormat::Png,
            };
            let flattened = masking::flatten_alpha(&read_image_payload(&input)?, format)?;
            write_image_payload(&flattened, &output)?;
            info!(path = %output.display(), "wrote flattened image");
        }
        Commands::SetApiUrl { url } => {
            settings::set_api_url(&store, &url)?;
            info!(%url, config = %store.path().display(), "persisted backend URL");
        }
        Commands::ShowConfig => {
            println!("config file: {}", store.path().display());
            println!("api_url:     {}", settings::api_url(&store));
        }
    }

    Ok(())
}

async fn run_inpaint(
    store: &FileSettings,
    image: &Path,
    layer: &Path,
    output: &Path,
    positive: &str,
    negative: &str,
    api_url: Option<String>,
) -> Result<()> {
    let api_url = api_url.unwrap_or_else(|| settings::api_url(store));
    info!(%api_url, "sending inpaint request");

    let request = InpaintRequest {
        image: read_image_payload(image)?,
        mask: masking::alpha_to_mask(&read_image_payload(layer)?)?,
        positive_prompt: non_empty(positive),
        negative_prompt: non_empty(negative),
    };

    let backend = HttpBackend::new(api_url);
    let response = backend.inpaint(&request).await?;

    let image_field = response
        .image
        .filter(|s| !s.is_empty())
        .ok_or_else(|| eyre!("backend returned no image"))?;
    write_image_payload(&ImagePayload::normalize(&image_field), output)?;
    info!(path = %output.display(), "wrote inpainted image");
    Ok(())
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
