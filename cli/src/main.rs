//! svgtint CLI - SVG rasterization with style overrides

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use svgtint::{
    detect_format_from_path, Color, OverrideStore, ResourceOptions, ResvgBackend, Size,
    SvgResource,
};

#[derive(Parser)]
#[command(name = "svgtint")]
#[command(version)]
#[command(about = "Rasterize SVG documents and symbols with style overrides", long_about = None)]
struct Cli {
    /// Input SVG file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output PNG file
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the document, a symbol or an element to PNG
    Render {
        /// Input SVG file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output PNG file (defaults to <input>.png)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Render only this symbol
        #[arg(long, value_name = "ID", conflicts_with = "element")]
        symbol: Option<String>,

        /// Render only the element with this id
        #[arg(long, value_name = "ID")]
        element: Option<String>,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// List the symbols of a document
    Symbols {
        /// Input SVG file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render every symbol to its own PNG
    Export {
        /// Input SVG file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Show document information
    Info {
        /// Input SVG file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Args, Clone)]
struct RenderArgs {
    /// Output size, WIDTHxHEIGHT or a single number
    #[arg(short, long, default_value = "256", value_parser = Size::parse)]
    size: Size,

    /// Fill override, SELECTOR=COLOR (selector is an id or .class)
    #[arg(long, value_name = "SEL=COLOR")]
    fill: Vec<String>,

    /// Stroke override, SELECTOR=COLOR
    #[arg(long, value_name = "SEL=COLOR")]
    stroke: Vec<String>,

    /// Attribute override, ID:NAME=VALUE
    #[arg(long, value_name = "ID:NAME=VALUE")]
    property: Vec<String>,

    /// Load overrides from a JSON snapshot
    #[arg(long, value_name = "FILE")]
    overrides: Option<PathBuf>,

    /// Background color (transparent if not specified)
    #[arg(long, value_name = "COLOR")]
    background: Option<String>,

    /// Render at level-of-detail size, then rescale
    #[arg(long)]
    lod: bool,

    /// LOD bias (0.1 - 4.0)
    #[arg(long, default_value = "1.0")]
    lod_bias: f32,

    /// Load system fonts for <text>
    #[arg(long)]
    system_fonts: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Render {
            input,
            output,
            symbol,
            element,
            render,
        }) => cmd_render(
            &input,
            output.as_deref(),
            symbol.as_deref(),
            element.as_deref(),
            &render,
        ),
        Some(Commands::Symbols { input, json }) => cmd_symbols(&input, json),
        Some(Commands::Export {
            input,
            output,
            render,
        }) => cmd_export(&input, output.as_deref(), &render),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: render the whole document if input is provided
            if let Some(input) = cli.input {
                let render = RenderArgs::parse_defaults();
                cmd_render(&input, cli.output.as_deref(), None, None, &render)
            } else {
                println!("{}", "Usage: svgtint <FILE> [OUTPUT]".yellow());
                println!("       svgtint --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

impl RenderArgs {
    fn parse_defaults() -> Self {
        Self {
            size: Size::square(256),
            fill: Vec::new(),
            stroke: Vec::new(),
            property: Vec::new(),
            overrides: None,
            background: None,
            lod: false,
            lod_bias: 1.0,
            system_fonts: false,
        }
    }

    /// Build a loaded resource with every requested override applied.
    fn open(&self, input: &Path) -> Result<SvgResource, Box<dyn std::error::Error>> {
        let mut options = ResourceOptions::new()
            .with_lod(self.lod)
            .with_lod_bias(self.lod_bias);
        if let Some(ref bg) = self.background {
            options = options.with_background(Color::parse(bg)?.to_argb());
        }

        let mut backend = ResvgBackend::new();
        if self.system_fonts {
            backend = backend.with_system_fonts();
        }

        let mut resource = SvgResource::with_options(options).with_backend(backend);
        resource.load_from_file(input)?;

        if let Some(ref path) = self.overrides {
            let json = fs::read_to_string(path)?;
            resource.set_overrides(OverrideStore::from_json(&json)?);
        }
        for entry in &self.fill {
            let (selector, color) = parse_color_override(entry)?;
            resource.set_fill(selector, color);
        }
        for entry in &self.stroke {
            let (selector, color) = parse_color_override(entry)?;
            resource.set_stroke(selector, color);
        }
        for entry in &self.property {
            let (id, name, value) = parse_property_override(entry)?;
            resource.set_property(id, name, value);
        }

        Ok(resource)
    }
}

fn parse_color_override(entry: &str) -> Result<(&str, Color), Box<dyn std::error::Error>> {
    let (selector, color) = entry
        .split_once('=')
        .ok_or_else(|| format!("Expected SELECTOR=COLOR, got '{}'", entry))?;
    Ok((selector.trim(), Color::parse(color)?))
}

fn parse_property_override(entry: &str) -> Result<(&str, &str, &str), Box<dyn std::error::Error>> {
    let (id, rest) = entry
        .split_once(':')
        .ok_or_else(|| format!("Expected ID:NAME=VALUE, got '{}'", entry))?;
    let (name, value) = rest
        .split_once('=')
        .ok_or_else(|| format!("Expected ID:NAME=VALUE, got '{}'", entry))?;
    Ok((id.trim(), name.trim(), value))
}

fn cmd_render(
    input: &Path,
    output: Option<&Path>,
    symbol: Option<&str>,
    element: Option<&str>,
    args: &RenderArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let resource = args.open(input)?;

    let image = match (symbol, element) {
        (Some(id), _) => resource.rasterize_symbol(id, args.size)?,
        (None, Some(id)) => resource.rasterize_element(id, args.size)?,
        (None, None) => resource.rasterize_full(args.size)?,
    };

    let output = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| input.with_extension("png"));
    image.save(&output)?;

    println!(
        "{} {} ({}x{})",
        "Rendered".green(),
        output.display(),
        image.width(),
        image.height()
    );
    Ok(())
}

fn cmd_symbols(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut resource = SvgResource::new();
    resource.load_from_file(input)?;

    if json {
        let symbols: Vec<_> = resource.symbols().collect();
        println!("{}", serde_json::to_string_pretty(&symbols)?);
        return Ok(());
    }

    if resource.symbol_ids().is_empty() {
        println!("{}", "No symbols found".yellow());
        return Ok(());
    }

    for symbol in resource.symbols() {
        let frame = symbol.frame();
        println!(
            "{} {}",
            symbol.id.bold(),
            format!(
                "{} {} {} {}",
                frame.x, frame.y, frame.w, frame.h
            )
            .dimmed()
        );
    }
    Ok(())
}

fn cmd_export(
    input: &Path,
    output: Option<&Path>,
    args: &RenderArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let resource = args.open(input)?;

    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_symbols", stem))
    });
    fs::create_dir_all(&output_dir)?;

    let ids: Vec<String> = resource.symbol_ids().into_iter().map(String::from).collect();
    let pb = ProgressBar::new(ids.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut failed = 0;
    for id in &ids {
        pb.set_message(id.clone());
        match resource.rasterize_symbol(id, args.size) {
            Ok(image) => image.save(output_dir.join(format!("{}.png", id)))?,
            Err(e) => {
                log::warn!("Skipping symbol '{}': {}", id, e);
                failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Done!");

    println!(
        "\n{} {} symbols exported to {}",
        "Done!".green().bold(),
        ids.len() - failed,
        output_dir.display()
    );
    if failed > 0 {
        println!("{} {} symbols failed", "Warning:".yellow(), failed);
    }
    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let format = detect_format_from_path(input)?;
    let mut resource = SvgResource::new();
    resource.load_from_file(input)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {:?}", "Format".bold(), format);

    if let Some(doc) = resource.document() {
        let root = doc.root();
        for attr in ["width", "height", "viewBox"] {
            if let Some(value) = doc.get_attribute(root, attr) {
                println!("{}: {}", attr.bold(), value);
            }
        }
        println!("{}: {}", "Elements".bold(), doc.element_count());
    }
    println!("{}: {}", "Symbols".bold(), resource.symbol_ids().len());
    println!("{}: {} bytes", "Source".bold(), resource.source().len());

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "svgtint".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("SVG rasterization with style overrides");
    println!();
    println!("License: MIT");
}
