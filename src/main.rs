use clap::{Parser, Subcommand};
use image_depot::config::{self, StoreConfig};
use image_depot::output;
use image_depot::store::{ImageStore, StoreError};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "image-depot")]
#[command(about = "Store images with resized WebP variants and EXIF metadata")]
#[command(long_about = "\
Store images with resized WebP variants and EXIF metadata

Every upload gets its own directory under the storage root:

  storage/
  └── 3f2a9c0d4b5e4f60a1b2c3d4e5f60718/
      ├── original.jpg
      ├── phone.webp             # fits 640x480
      ├── tablet.webp            # fits 1024x768
      ├── desktop.webp           # fits 1920x1080
      └── metadata.json

Variants shrink to fit their bounding box and are never enlarged.
Camera make/model, capture time and GPS position are read from EXIF when
present and left empty otherwise.

Logging goes to stderr; set RUST_LOG (e.g. RUST_LOG=image_depot=debug).

Run 'image-depot gen-config' to generate a documented depot.toml.")]
#[command(version)]
struct Cli {
    /// Config file [default: ./depot.toml, optional]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the storage root from the config
    #[arg(long, global = true)]
    storage_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store an image and generate its variants
    Upload {
        file: PathBuf,
        /// Declared MIME type [default: derived from the extension]
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Write one variant of an image to a file
    Get {
        id: String,
        variant: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write the original upload to a file
    Original {
        id: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Show the metadata record of an image
    Metadata {
        id: String,
        /// Print the stored JSON record
        #[arg(long)]
        json: bool,
    },
    /// Delete an image and all its variants
    Delete { id: String },
    /// List stored images
    List,
    /// Remove directories left behind by uploads that never finished
    Sweep,
    /// Print a stock depot.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let store_config = load_store_config(cli.config.as_deref(), cli.storage_root.as_deref())?;
    init_thread_pool(&store_config.processing);
    let store = ImageStore::open(store_config);

    match cli.command {
        Command::Upload { file, content_type } => {
            let bytes = std::fs::read(&file)?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or("upload path has no usable file name")?;
            let manifest = store
                .upload(&bytes, file_name, content_type.as_deref())
                .map_err(report)?;
            output::print_manifest(&manifest);
        }
        Command::Get {
            id,
            variant,
            output,
        } => {
            let (bytes, content_type) = store.get_variant(&id, &variant).map_err(report)?;
            std::fs::write(&output, &bytes)?;
            println!("{} ({}, {} bytes)", output.display(), content_type, bytes.len());
        }
        Command::Original { id, output } => {
            let (bytes, content_type) = store.get_original(&id).map_err(report)?;
            std::fs::write(&output, &bytes)?;
            println!("{} ({}, {} bytes)", output.display(), content_type, bytes.len());
        }
        Command::Metadata { id, json } => {
            let record = store.get_metadata(&id).map_err(report)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                output::print_record(&record);
            }
        }
        Command::Delete { id } => {
            if store.delete_image(&id).map_err(report)? {
                println!("Deleted {id}");
            } else {
                println!("No image {id}");
            }
        }
        Command::List => {
            let ids = store.list().map_err(report)?;
            output::print_list(&ids);
        }
        Command::Sweep => {
            let removed = store.sweep_incomplete().map_err(report)?;
            println!("{}", output::format_sweep(removed));
        }
        Command::GenConfig => {}
    }

    Ok(())
}

/// Load the config file and apply command-line overrides.
///
/// An explicit `--config` must exist; the default `depot.toml` is optional.
fn load_store_config(
    path: Option<&Path>,
    storage_root: Option<&Path>,
) -> Result<StoreConfig, Box<dyn std::error::Error>> {
    let mut store_config = match path {
        Some(p) if !p.exists() => {
            return Err(format!("config file not found: {}", p.display()).into());
        }
        Some(p) => config::load_config(p)?,
        None => config::load_config(Path::new(config::CONFIG_FILE_NAME))?,
    };
    if let Some(root) = storage_root {
        store_config.storage_root = root.to_string_lossy().into_owned();
    }
    Ok(store_config)
}

/// Log the full error; hand the caller-safe message back for display.
fn report(err: StoreError) -> Box<dyn std::error::Error> {
    if err.is_client_error() {
        tracing::debug!(error = %err, "request rejected");
    } else {
        tracing::error!(error = %err, "request failed");
    }
    err.public_message().into()
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "image_depot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can lower it, not raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
