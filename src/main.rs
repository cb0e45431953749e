use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use nirnay::{EngineInstallation, Preset, RenderConfig, Renderer};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nirnay", version, about = "HTML to multi-format PDF generator")]
struct Cli {
    /// Log pipeline steps (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render an HTML body fragment to PDF
    Render {
        #[command(flatten)]
        input: InputArgs,

        /// Where to write the PDF
        #[arg(short, long, default_value = nirnay::DOWNLOAD_FILE_NAME)]
        output: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Print the composed HTML document without rendering it
    Preview {
        #[command(flatten)]
        input: InputArgs,

        /// Write the document here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Static-assets directory with base/a4/poster/slides stylesheets
        #[arg(long, env = "NIRNAY_ASSETS")]
        assets: Option<PathBuf>,
    },
    /// Locate the browser engine and report where it is
    Check {
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// List the available output presets
    Presets,
}

#[derive(Args)]
struct InputArgs {
    /// Output format: a4, poster or slide (labels like "PPT (16:9)" work too)
    #[arg(short, long, default_value = "a4")]
    preset: Preset,

    /// HTML body fragment to read; stdin when omitted or "-"
    #[arg(short, long)]
    input: Option<PathBuf>,
}

#[derive(Args)]
struct EngineArgs {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Chrome/Chromium executable
    #[arg(long, env = "NIRNAY_CHROME")]
    chrome: Option<PathBuf>,

    /// Static-assets directory with base/a4/poster/slides stylesheets
    #[arg(long, env = "NIRNAY_ASSETS")]
    assets: Option<PathBuf>,

    /// Page load and print timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Keep the Chrome sandbox enabled
    #[arg(long)]
    sandbox: bool,
}

impl EngineArgs {
    fn load_config(&self) -> anyhow::Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => RenderConfig::from_json_file(path)?,
            None => RenderConfig::default(),
        };
        if let Some(chrome) = &self.chrome {
            config.chrome_path = Some(chrome.clone());
        }
        if let Some(assets) = &self.assets {
            config.assets_dir = Some(assets.clone());
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if self.sandbox {
            config.disable_sandbox = false;
        }
        Ok(config)
    }
}

impl InputArgs {
    fn read_fragment(&self) -> anyhow::Result<String> {
        match &self.input {
            Some(path) if path.as_os_str() != "-" => {
                std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
            }
            _ => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read HTML from stdin")?;
                Ok(buf)
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "nirnay=debug" } else { "nirnay=info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Render { input, output, engine } => {
            let config = engine.load_config()?;
            let fragment = input.read_fragment()?;
            let profile = input.preset.profile();

            let installation = EngineInstallation::ensure(&config)?;
            let renderer = Renderer::new(installation, config)?;
            let pdf = renderer.render(&fragment, profile)?;
            pdf.write_to(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            match nirnay::inspect::inspect(pdf.as_bytes()) {
                Ok(summary) => println!(
                    "Wrote {} ({} bytes, {} page(s), {:.0}x{:.0}pt, {})",
                    output.display(),
                    pdf.len(),
                    summary.page_count,
                    summary.page_size_pt.0,
                    summary.page_size_pt.1,
                    input.preset
                ),
                Err(e) => {
                    log::warn!("Could not inspect the produced PDF: {}", e);
                    println!("Wrote {} ({} bytes, {})", output.display(), pdf.len(), input.preset);
                }
            }
        }
        Command::Preview { input, output, assets } => {
            let fragment = input.read_fragment()?;
            let assets = match assets {
                Some(dir) => nirnay::StyleAssets::directory(dir)?,
                None => nirnay::StyleAssets::Bundled,
            };
            let doc = nirnay::compose(&fragment, input.preset.profile(), &assets)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, doc.html())
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Wrote {} (sha256 {})", path.display(), doc.fingerprint());
                }
                None => print!("{}", doc.html()),
            }
        }
        Command::Check { engine } => {
            let config = engine.load_config()?;
            let installation = EngineInstallation::ensure(&config)?;
            println!(
                "Browser engine: {} ({:?})",
                installation.executable().display(),
                installation.source()
            );
        }
        Command::Presets => {
            for preset in Preset::ALL {
                let profile = preset.profile();
                println!(
                    "{:<20} stylesheet={:<7} page={}",
                    preset.label(),
                    profile.stylesheet_name,
                    profile.page_geometry
                );
            }
        }
    }

    Ok(())
}
