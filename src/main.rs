use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use phote::{CanvasConfig, ItemQueue, Page, QueryParams};

#[derive(Parser)]
#[command(name = "phote", version, about = "Inspect canvas items and capture page elements")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Queue the items described by a page URL and print the pending buffer
    Items {
        /// Page URL carrying `type`, `value`, `x`, ... query keys
        url: String,
    },
    /// Print the canvas size requested by a page URL
    Settings { url: String },
    /// Capture an element of an HTML document to a PNG file
    Capture {
        /// HTML document to read
        #[arg(long)]
        html: PathBuf,
        /// Element selector, `#id`
        #[arg(long, default_value = "#photo-canvas")]
        selector: String,
        /// Where to write the image (defaults to image.png)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Items { url } => {
            let params = QueryParams::parse(&url)?;
            let config = CanvasConfig::default();
            let mut queue = ItemQueue::new(Page::canvas_scaffold(&config), config);
            queue.on_flush(|_| log::debug!("flush"));
            for item in params.parse_items() {
                queue.add_item(&item)?;
            }
            println!("{}", queue.buffer()?);
        }
        Command::Settings { url } => {
            let config = CanvasConfig::default();
            let settings = QueryParams::parse(&url)?.parse_canvas_settings();
            println!(
                "width: {}\nheight: {}",
                settings.width.unwrap_or(config.default_canvas_width as i32),
                settings.height.unwrap_or(config.default_canvas_height as i32)
            );
        }
        Command::Capture { html, selector, out } => capture(html, &selector, out)?,
    }
    Ok(())
}

#[cfg(all(feature = "html", feature = "capture"))]
fn capture(html: PathBuf, selector: &str, out: Option<PathBuf>) -> Result<()> {
    use anyhow::Context;
    use phote::capture::SolidFillRasterizer;
    use std::fs;

    let source = fs::read_to_string(&html)
        .with_context(|| format!("failed to read {}", html.display()))?;
    let mut page = Page::from_html(&source)?;
    let rasterizer = SolidFillRasterizer::from_config(&CanvasConfig::default());
    let download = phote::capture::capture(&mut page, selector, &rasterizer)?;

    let out = out.unwrap_or_else(|| PathBuf::from(&download.file_name));
    fs::write(&out, &download.screenshot.png_data)
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!(
        "Wrote {} ({}x{})",
        out.display(),
        download.screenshot.width,
        download.screenshot.height
    );
    Ok(())
}

#[cfg(not(all(feature = "html", feature = "capture")))]
fn capture(_html: PathBuf, _selector: &str, _out: Option<PathBuf>) -> Result<()> {
    anyhow::bail!("capture requires the 'html' and 'capture' features")
}
