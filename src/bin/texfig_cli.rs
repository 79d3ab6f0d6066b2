//! texfig CLI - Bridge interface for the site generator
//!
//! Commands: latex, chart, fingerprint, scan, inline-svg, data-uri
//! Outputs JSON to stdout, logs to stderr (RUST_LOG)
//! Returns 1 on configuration errors, 2 on build failures

use clap::{Parser, Subcommand};
use log::error;
use serde_json::json;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use texfig::{fingerprint_source, FigurePipeline, Page, PipelineError, SiteConfig, StaticFiles};

#[derive(Parser)]
#[command(name = "texfig-cli")]
#[command(about = "texfig CLI - LaTeX figures for static sites", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the site configuration
    #[arg(short, long, default_value = "texfig.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the formula read from stdin and print its markup
    Latex {
        /// Source path of the page
        #[arg(short, long)]
        page: PathBuf,

        /// Output URL of the page
        #[arg(short, long)]
        url: String,

        /// Figure tag, `[<variant> ]fig-NN`
        #[arg(short, long, default_value = "fig-00")]
        tag: String,
    },

    /// Print the markup for an existing chart
    Chart {
        #[arg(short, long)]
        page: PathBuf,

        #[arg(short, long)]
        url: String,

        /// Chart file name inside the page's asset directory
        #[arg(short, long)]
        file: String,
    },

    /// Print the normalized text and fingerprint of the formula on stdin
    Fingerprint,

    /// Register existing asset files and print them
    Scan {
        /// Pages as `<source path>=<url>`
        #[arg(short, long = "page", value_parser = parse_page)]
        pages: Vec<Page>,
    },

    /// Print an SVG from the inline assets directory
    InlineSvg { name: String },

    /// Print a file as a data URI
    DataUri { path: PathBuf },
}

fn parse_page(arg: &str) -> Result<Page, String> {
    let (path, url) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected `<source path>=<url>`, got `{arg}`"))?;
    Ok(Page::new(path, url))
}

fn read_stdin() -> Result<String, std::io::Error> {
    let mut source = String::new();
    std::io::stdin().read_to_string(&mut source)?;
    Ok(source)
}

fn fail(e: &PipelineError) -> ExitCode {
    error!("{e}");
    let output = json!({
        "success": false,
        "error": e.to_string(),
    });
    println!("{}", output);
    if e.is_configuration() {
        ExitCode::FAILURE
    } else {
        ExitCode::from(2)
    }
}

fn main() -> ExitCode {
    // Logging setup lives in the binary; the library only emits records.
    env_logger::init();
    let cli = Cli::parse();

    let config = match SiteConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => return fail(&e.into()),
    };

    match cli.command {
        Commands::Fingerprint => {
            let source = match read_stdin() {
                Ok(s) => s,
                Err(e) => {
                    println!(r#"{{"success": false, "error": "Failed to read stdin: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };
            let (normalized, fingerprint) = fingerprint_source(&source);
            let output = json!({
                "normalized": normalized.as_str(),
                "fingerprint": fingerprint.to_string(),
            });
            println!("{}", output);
            ExitCode::SUCCESS
        }

        Commands::Latex { page, url, tag } => {
            let source = match read_stdin() {
                Ok(s) => s,
                Err(e) => {
                    println!(r#"{{"success": false, "error": "Failed to read stdin: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };
            let mut pipeline = match FigurePipeline::from_config(&config, StaticFiles::new()) {
                Ok(p) => p,
                Err(e) => return fail(&e),
            };
            let page = Page::new(page, url);

            match pipeline.latex(&page, &tag, &source) {
                Ok(figure) => {
                    let output = json!({
                        "success": true,
                        "markup": figure.markup,
                        "file": figure.artifact.path,
                        "created": figure.artifact.created,
                        "width": figure.size.width,
                        "height": figure.size.height,
                        "registered": pipeline.registry().files,
                    });
                    println!("{}", output);
                    ExitCode::SUCCESS
                }
                Err(e) => fail(&e),
            }
        }

        Commands::Chart { page, url, file } => {
            // Charts never render, so no toolchain lookup is needed.
            let pipeline = FigurePipeline::new(&config, Box::new(NoRenderer), StaticFiles::new());
            match pipeline.chart(&Page::new(page, url), &file) {
                Ok(markup) => {
                    println!("{}", json!({ "success": true, "markup": markup }));
                    ExitCode::SUCCESS
                }
                Err(e) => fail(&e),
            }
        }

        Commands::Scan { pages } => {
            let mut pipeline = FigurePipeline::new(&config, Box::new(NoRenderer), StaticFiles::new());
            match pipeline.scan(&pages) {
                Ok(_) => {
                    let registry = pipeline.into_registry();
                    println!("{}", json!({ "success": true, "files": registry.files }));
                    ExitCode::SUCCESS
                }
                Err(e) => fail(&e),
            }
        }

        Commands::InlineSvg { name } => {
            let pipeline = FigurePipeline::new(&config, Box::new(NoRenderer), StaticFiles::new());
            match pipeline.inline_svg(&name) {
                Ok(svg) => {
                    println!("{}", svg);
                    ExitCode::SUCCESS
                }
                Err(e) => fail(&e),
            }
        }

        Commands::DataUri { path } => {
            let pipeline = FigurePipeline::new(&config, Box::new(NoRenderer), StaticFiles::new());
            match pipeline.data_uri(&path) {
                Ok(uri) => {
                    println!("{}", uri);
                    ExitCode::SUCCESS
                }
                Err(e) => fail(&e),
            }
        }
    }
}

/// Stand-in for commands that only read existing assets.
struct NoRenderer;

impl texfig::RenderInvoker for NoRenderer {
    fn invoke(&self, _document: &str, _font: &str) -> Result<Vec<u8>, texfig::RenderError> {
        Err(texfig::RenderError::NotFound {
            program: "<none>".to_string(),
            reason: "this command does not render".to_string(),
        })
    }
}
