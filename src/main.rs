// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use txt2img::{
    encoder, FontDriver, FontStyle, HeadlessFontDriver, Properties, RenderConfig, Renderer,
    SystemFontDriver,
};

/// Render a centered caption into a placeholder image.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Caption; defaults to "WIDTHxHEIGHT"
    #[arg(short, long)]
    text: Option<String>,

    /// Size token such as 300x250 or 300x250.png
    #[arg(short, long)]
    size: Option<String>,

    /// Canvas width in pixels (overrides --size)
    #[arg(long)]
    width: Option<i64>,

    /// Canvas height in pixels (overrides --size)
    #[arg(long)]
    height: Option<i64>,

    /// Background color, RGB or RRGGBB hex
    #[arg(long)]
    bg: Option<String>,

    /// Foreground color, RGB or RRGGBB hex
    #[arg(long)]
    fg: Option<String>,

    /// Output format: png, jpg, jpeg or gif
    #[arg(short, long)]
    format: Option<String>,

    /// Font family
    #[arg(long)]
    font: Option<String>,

    /// Font style: normal, bold, italic or bold-italic
    #[arg(long)]
    style: Option<String>,

    /// JSON file overriding the render defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the built-in block font instead of system fonts
    #[arg(long)]
    headless: bool,

    /// Output file; defaults to "placeholder.<format>"
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    fn properties(&self) -> Result<Properties> {
        let mut props = Properties::new();
        if let Some(size) = &self.size {
            props = props.size_token(size);
        }
        props.width = self.width.or(props.width);
        props.height = self.height.or(props.height);
        props.text = self.text.clone();
        props.background = self.bg.clone();
        props.foreground = self.fg.clone();
        props.format = self.format.clone().or(props.format);
        props.font_family = self.font.clone();
        props.font_style = match &self.style {
            Some(s) => Some(
                FontStyle::from_keyword(s).with_context(|| format!("Unknown font style {:?}", s))?,
            ),
            None => None,
        };
        Ok(props)
    }
}

fn run<D: FontDriver>(driver: D, config: RenderConfig, args: &Args) -> Result<()> {
    let renderer = Renderer::new(driver, config);
    let props = args.properties()?;

    let (mut raster, format) = renderer
        .render_properties(&props)
        .context("Failed to render placeholder")?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("placeholder.{}", format.extension())));

    let written = encoder::write_file(&output, &raster, format)
        .with_context(|| format!("Failed to write {:?}", output));
    raster.release();
    written?;

    info!("Wrote {:?}", output);
    Ok(())
}

fn main() -> Result<()> {
    // Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };

    if args.headless {
        run(HeadlessFontDriver::new(), config, &args)
    } else {
        run(SystemFontDriver::new(), config, &args)
    }
}
