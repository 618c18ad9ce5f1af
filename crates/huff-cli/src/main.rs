//! HUFF CLI
//!
//! Command-line host for the HUFF FHIR-JSON viewer pipeline

mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use huff_core::{Result, init_tracing};
use std::io;
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "huff")]
#[command(about = "HUFF: render FHIR-JSON documents as highlighted, cross-linked HUFF")]
#[command(version = huff_core::VERSION)]
#[command(
    long_about = "HUFF detects FHIR-JSON documents from their Content-Type and renders them as\n\
syntax-highlighted, cross-linked HUFF (a friendlier YAML-like view).\n\
\n\
Examples:\n  \
huff classify --content-type 'application/fhir+json; charset=utf-8'\n  \
huff render patient.json --page-url https://hapi.fhir.org/baseR4/Patient/1\n  \
huff page saved.html --page-url https://host/fhir/Patient/1 --content-type application/fhir+json\n  \
huff fetch https://hapi.fhir.org/baseR4/Patient/1 -o patient.html\n  \
huff prefs set makeLinksClickable false"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (.huffrc.json/.huffrc.toml/huff.yaml)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Generate shell completion script
    #[arg(
        long,
        value_enum,
        help = "Generate completion script for specified shell"
    )]
    generate_completion: Option<Shell>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a Content-Type marks a response as FHIR-JSON
    Classify {
        /// Content-Type header value (repeat for multiple headers)
        #[arg(long = "content-type", required = true)]
        content_types: Vec<String>,
    },

    /// Convert a FHIR-JSON file and print the rendered <pre> element
    Render {
        /// FHIR-JSON file to render
        #[arg(help = "Path to a FHIR-JSON document")]
        file: PathBuf,

        /// URL the document was served from, used to resolve references
        #[arg(long, help = "Page URL used as the reference base")]
        page_url: Option<String>,

        /// Skip syntax highlighting
        #[arg(long)]
        no_highlight: bool,

        /// Leave bare URLs as text
        #[arg(long)]
        no_links: bool,

        /// Leave Reference(...) summaries as text
        #[arg(long)]
        no_references: bool,
    },

    /// Run the full pipeline over a saved HTML page
    Page {
        /// Saved HTML page
        #[arg(help = "Path to an HTML document")]
        file: PathBuf,

        /// URL the page was loaded from
        #[arg(long)]
        page_url: String,

        /// Content-Type the page was served with
        #[arg(long)]
        content_type: String,

        /// Write the resulting page here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch a URL and run the full pipeline over the response
    Fetch {
        /// URL to GET
        url: String,

        /// Write the resulting page here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inspect and edit stored preferences
    #[command(alias = "preferences")]
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },

    /// Show version information
    #[command(alias = "ver")]
    Version {
        /// Show detailed version information
        #[arg(long, help = "Show detailed version and build information")]
        detailed: bool,
    },
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Show effective preferences (stored values over defaults)
    Show,

    /// Set a single preference by its key
    Set {
        /// Preference key (highlightHuff, makeLinksClickable, ...)
        key: String,

        /// New value; use \n to separate content types
        value: String,
    },

    /// Seed custom mappings from the engine's default mapping table
    Init {
        /// Overwrite existing custom mappings
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    let cli = Cli::parse();

    // Handle shell completion generation
    if let Some(shell) = cli.generate_completion {
        generate_completion_script(shell);
        return Ok(());
    }

    if !cli.no_color && std::env::var("NO_COLOR").is_err() {
        colored::control::set_override(true);
    } else {
        colored::control::set_override(false);
    }

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "huff=error",
        1 => "huff=warn",
        2 => "huff=info",
        3 => "huff=debug",
        _ => "huff=trace",
    };
    unsafe {
        std::env::set_var("RUST_LOG", log_level);
    }
    init_tracing();

    match run_command(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("huff failed: {}", e);
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn generate_completion_script(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

async fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Classify { content_types }) => {
            commands::classify_command(content_types, cli.config).await
        }

        Some(Commands::Render {
            file,
            page_url,
            no_highlight,
            no_links,
            no_references,
        }) => {
            let overrides = commands::RenderOverrides {
                no_highlight,
                no_links,
                no_references,
            };
            commands::render_command(file, page_url, overrides, cli.config).await
        }

        Some(Commands::Page {
            file,
            page_url,
            content_type,
            output,
        }) => commands::page_command(file, page_url, content_type, output, cli.config).await,

        Some(Commands::Fetch { url, output }) => {
            commands::fetch_command(url, output, cli.config).await
        }

        Some(Commands::Prefs { action }) => match action {
            PrefsAction::Show => commands::prefs::show_command(cli.config).await,
            PrefsAction::Set { key, value } => {
                commands::prefs::set_command(key, value, cli.config).await
            }
            PrefsAction::Init { force } => commands::prefs::init_command(force, cli.config).await,
        },

        Some(Commands::Version { detailed }) => {
            if detailed {
                println!("huff {}", huff_core::VERSION);
                println!("Build information:");
                println!("  Target: {}", std::env::consts::ARCH);
                println!("  OS: {}", std::env::consts::OS);
                println!(
                    "  Preferences carrier version: {}",
                    huff_core::PreferencesCarrier::VERSION
                );
            } else {
                println!("{}", huff_core::VERSION);
            }
            Ok(())
        }

        None => {
            // No subcommand provided, show help
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
