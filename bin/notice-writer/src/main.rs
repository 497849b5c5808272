//! # Notice Writer Binary
//!
//! The entry point that assembles config, plugins and the composer, and
//! drives them from the command line.

mod terminal;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use configs::Settings;
use nb_api_reqwest::HttpNoticeApi;
use nb_core::{
    ComposerPorts, ComposerSettings, DataUri, ExitDecision, NoticeApi, NoticeComposer, NoticeNo,
    ResizeOptions, SubmitState,
};
use nb_markup_regex::RegexMarkupParser;
use nb_raster_image::ImageRasterSurface;
use terminal::{PrintingNavigator, TerminalDialog};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "notice-writer")]
#[command(about = "Write and browse notices on the notice board backend")]
struct Cli {
    /// Settings file (defaults to ./notice-writer.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a new notice and print the route of its detail view
    Write {
        /// Notice title (capped at 100 characters)
        #[arg(long)]
        title: String,
        /// HTML file with the notice body; reads stdin when omitted
        #[arg(long)]
        content: Option<PathBuf>,
    },
    /// Leave the write form for the list, after confirmation
    Back {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long)]
        content: Option<PathBuf>,
    },
    /// List stored notices
    List,
    /// Show one notice
    Show {
        /// Notice number
        no: String,
        /// Write the attached image to this path
        #[arg(long)]
        image_out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    tracing::debug!(base_url = %settings.api.base_url, "settings loaded");

    let api = Arc::new(HttpNoticeApi::new(
        settings.api.base_url.clone(),
        settings.api.timeout(),
    )?);

    match cli.command {
        Commands::Write { title, content } => {
            let body = read_content(content.as_deref())?;
            let mut composer = composer(&settings, api);
            composer.set_title(&title);
            composer.set_content(body);

            if let SubmitState::Failed = composer.submit().await {
                bail!("notice was not saved");
            }
        }
        Commands::Back { title, content } => {
            let body = match content {
                Some(path) => read_content(Some(path.as_path()))?,
                None => String::new(),
            };
            let mut composer = composer(&settings, api);
            composer.set_title(&title);
            composer.set_content(body);

            if composer.request_exit() == ExitDecision::Stayed {
                tracing::info!("staying on the write form");
            }
        }
        Commands::List => {
            for notice in api.list_notices().await? {
                println!(
                    "{}\t{}\t{}",
                    notice.no,
                    notice.date.format("%Y-%m-%d %H:%M"),
                    notice.title
                );
            }
        }
        Commands::Show { no, image_out } => {
            let notice = api.get_notice(&NoticeNo::new(no)).await?;
            println!("#{} {}", notice.no, notice.title);
            println!("{}", notice.date.format("%Y-%m-%d %H:%M:%S"));
            println!();
            println!("{}", notice.content.as_deref().unwrap_or_default());

            if let Some(path) = image_out {
                let Some(file) = notice.file.as_deref() else {
                    bail!("notice {} has no image", notice.no);
                };
                let bytes =
                    DataUri::parse(&format!("data:image/png;base64,{}", file))?.decode_bytes()?;
                std::fs::write(&path, bytes)
                    .with_context(|| format!("writing image to {}", path.display()))?;
                tracing::info!(path = %path.display(), "image saved");
            }
        }
    }

    Ok(())
}

fn composer(settings: &Settings, api: Arc<HttpNoticeApi>) -> NoticeComposer {
    let ports = ComposerPorts {
        api,
        markup: Arc::new(RegexMarkupParser::new()),
        raster: Arc::new(ImageRasterSurface::new(
            settings.image.decode_timeout(),
            settings.image.optimize_png,
        )),
        navigator: Arc::new(PrintingNavigator),
        dialog: Arc::new(TerminalDialog),
    };
    let composer_settings = ComposerSettings {
        resize: ResizeOptions {
            max_width: settings.image.max_width,
            max_height: settings.image.max_height,
            quality: settings.image.quality,
        },
    };
    NoticeComposer::new(ports, composer_settings)
}

fn read_content(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading content from {}", path.display())),
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("reading content from stdin")?;
            Ok(body)
        }
    }
}
