use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use stickergen::export::{CaptionFont, CaptionPosition, CaptionSize, StickerExporter};
use stickergen::logger::{self, LogLevel, LoggerConfig};
use stickergen::{
    ArtStyle, BatchOrchestrator, Config, GeminiImageClient, GenerationParameters, OutputMode,
    ReferenceImage, StickerError, Variant,
};

#[derive(Parser)]
#[command(name = "stickergen", version, about = "Generate LINE stickers and emoji with Gemini")]
struct Cli {
    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a sticker or emoji set and export it at LINE sizes
    Generate(GenerateArgs),
    /// List the preset emotion variants
    Variants,
}

#[derive(Args)]
struct GenerateArgs {
    /// Description of the character
    #[arg(short, long, default_value = "")]
    prompt: String,

    /// Reference photo the character should resemble
    #[arg(short, long)]
    reference: Option<PathBuf>,

    /// anime, pixel, 3d, flat or sketch
    #[arg(short, long, default_value = "anime")]
    style: ArtStyle,

    /// sticker or emoji
    #[arg(short, long, default_value = "sticker")]
    mode: OutputMode,

    /// Attach a caption to each image
    #[arg(long)]
    caption: bool,

    /// Caption used for every variant instead of the variant default
    #[arg(long)]
    caption_text: Option<String>,

    /// Comma-separated variant ids (default: all presets)
    #[arg(long, value_delimiter = ',')]
    variants: Vec<String>,

    /// Caption position, e.g. top-right or bottom-center
    #[arg(long, default_value = "top-right")]
    position: CaptionPosition,

    /// Caption size: sm, md, lg, xl
    #[arg(long, default_value = "md")]
    size: CaptionSize,

    /// Font file used to draw captions (defaults to STICKERGEN_FONT)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Output directory (defaults to STICKERGEN_OUTPUT_DIR or ./stickers)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let level = LogLevel::parse(&cli.log_level).unwrap_or(LogLevel::Info);
    if let Err(e) = logger::init_with_config(
        LoggerConfig::default()
            .with_level(level)
            .with_json_output(cli.json_logs),
    ) {
        eprintln!("{}", e);
    }
    if dotenv_loaded {
        log::debug!("✅ .env file loaded");
    }

    let outcome = match cli.command {
        Command::Variants => {
            list_variants();
            Ok(())
        }
        Command::Generate(args) => generate(args).await,
    };

    if let Err(e) = outcome {
        match &e {
            StickerError::AggregateGeneration(_) => eprintln!("No stickers were generated:\n{}", e),
            _ => eprintln!("{}", e),
        }
        std::process::exit(1);
    }
}

fn list_variants() {
    for variant in Variant::presets() {
        println!(
            "{:<8} {:<8} caption \"{}\"  ({})",
            variant.id, variant.display_name, variant.default_caption, variant.prompt_fragment
        );
    }
}

async fn generate(args: GenerateArgs) -> stickergen::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(out) = args.out {
        config = config.with_output_dir(out);
    }
    if let Some(font) = args.font {
        config = config.with_caption_font(font);
    }
    logger::log_config_info(&config);

    let mut params = GenerationParameters::new(args.prompt)
        .with_style(args.style)
        .with_mode(args.mode)
        .with_caption(args.caption);
    if let Some(text) = args.caption_text {
        params = params.with_caption_override(text);
    }
    if let Some(path) = args.reference {
        params = params.with_reference_image(ReferenceImage::from_path(path)?);
    }
    params.validate()?;

    let variants = if args.variants.is_empty() {
        Variant::presets()
    } else {
        Variant::select(&args.variants)?
    };

    let client = GeminiImageClient::new(&config.gemini)?;
    let orchestrator = BatchOrchestrator::new(client, &config);
    let mut exporter = StickerExporter::new(&config.output_dir, params.mode)?
        .with_caption_style(args.position, args.size);
    if let Some(path) = &config.caption_font {
        exporter = exporter.with_font(CaptionFont::from_path(path)?);
    } else if params.include_caption {
        log::warn!("Captions requested without --font or STICKERGEN_FONT; only their layout is recorded");
    }

    let summary = orchestrator
        .run(
            &params,
            &variants,
            |artifact| match exporter.export(&artifact) {
                Ok(entry) => {
                    for file in &entry.files {
                        println!("  saved {}", file.path.display());
                    }
                }
                Err(e) => log::error!("Export of {} failed: {}", artifact.variant, e),
            },
            |current, total| println!("[{}/{}] generating...", current, total),
        )
        .await?;

    let manifest = exporter.write_manifest()?;
    println!(
        "Done: {}/{} generated, manifest at {}",
        summary.succeeded,
        summary.requested,
        manifest.display()
    );
    for failure in &summary.failures {
        println!("  {}: {}", failure.variant, failure.reason);
    }
    Ok(())
}
