use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use sectio_core::{
    Document, FetchConfig, MediaWikiClient, Metadata, Mode, PageRequest, Pipeline, RawDocument, SectionsConfig,
    StaticSource, WikiSource, fetch_file, fetch_stdin,
};
use serde_json::Value;

mod echo;

use echo::{
    format_size, print_banner, print_error, print_field, print_info, print_outline, print_step, print_success,
    print_timing, print_warning,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_DOMAIN: &str = "en.wikipedia.org";

/// Which response to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    MobileSections,
    Lead,
    Remaining,
    References,
    Formatted,
    FormattedLead,
}

impl Endpoint {
    fn mode(self) -> Mode {
        match self {
            Self::Formatted | Self::FormattedLead => Mode::Formatted,
            _ => Mode::Legacy,
        }
    }
}

impl FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mobile-sections" | "all" => Ok(Self::MobileSections),
            "mobile-sections-lead" | "lead" => Ok(Self::Lead),
            "mobile-sections-remaining" | "remaining" => Ok(Self::Remaining),
            "mobile-sections-references" | "references" => Ok(Self::References),
            "formatted" => Ok(Self::Formatted),
            "formatted-lead" => Ok(Self::FormattedLead),
            _ => Err(format!(
                "Invalid endpoint: {}. Valid options: mobile-sections, mobile-sections-lead, \
                 mobile-sections-remaining, mobile-sections-references, formatted, formatted-lead",
                s
            )),
        }
    }
}

/// Render wiki articles as mobile-sections JSON
#[derive(Parser, Debug)]
#[command(name = "sectio")]
#[command(author = "Sectio Contributors")]
#[command(version)]
#[command(about = "Render wiki articles as mobile-sections JSON", long_about = None)]
struct Args {
    /// Page title with --domain, otherwise a local Parsoid HTML file or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Wiki domain to fetch from (e.g. en.wikipedia.org)
    #[arg(short, long, value_name = "DOMAIN")]
    domain: Option<String>,

    /// Revision to render (live mode only)
    #[arg(short, long, value_name = "REV")]
    revision: Option<u64>,

    /// Page metadata JSON for offline input
    #[arg(long, value_name = "FILE")]
    meta: Option<PathBuf>,

    /// Page title for offline input (default: the document <title>)
    #[arg(long, value_name = "TITLE")]
    title: Option<String>,

    /// Response to render
    #[arg(short, long, default_value = "mobile-sections", value_name = "ENDPOINT")]
    endpoint: Endpoint,

    /// Deepest heading level that starts a section
    #[arg(long, default_value = "6", value_name = "LEVEL")]
    split_depth: u8,

    /// Pretty-print the JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Print progress and a section outline to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Builds the offline source: the document and optional metadata served under one title.
fn offline_source(args: &Args, html: String) -> anyhow::Result<(StaticSource, String)> {
    let title = match &args.title {
        Some(title) => title.clone(),
        None => Document::parse(&html)
            .title()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| file_stem(&args.input))
            .context("No title given and the document has none; pass --title")?,
    };

    let meta = match &args.meta {
        Some(path) => {
            let json =
                fs::read_to_string(path).with_context(|| format!("Failed to read metadata: {}", path.display()))?;
            serde_json::from_str::<Metadata>(&json)
                .with_context(|| format!("Failed to parse metadata: {}", path.display()))?
        }
        None => Metadata::default(),
    };

    Ok((StaticSource::new().with_document(&title, RawDocument::new(html), meta), title))
}

fn file_stem(input: &str) -> Option<String> {
    Path::new(input).file_stem().and_then(|s| s.to_str()).map(str::to_string)
}

async fn render(
    pipeline: &Pipeline, request: &PageRequest, endpoint: Endpoint, verbose: bool,
) -> anyhow::Result<Value> {
    let mode = endpoint.mode();
    let value = match endpoint {
        Endpoint::MobileSections | Endpoint::Formatted => {
            let response = pipeline.mobile_sections(request, mode).await?;
            if verbose {
                print_outline(&response.body);
            }
            serde_json::to_value(&response.body)?
        }
        Endpoint::Lead | Endpoint::FormattedLead => serde_json::to_value(pipeline.lead(request, mode).await?.body)?,
        Endpoint::Remaining => serde_json::to_value(pipeline.remaining(request).await?.body)?,
        Endpoint::References => serde_json::to_value(pipeline.references(request).await?.body)?,
    };
    Ok(value)
}

async fn run(args: Args) -> anyhow::Result<()> {
    let started = Instant::now();

    if args.verbose {
        print_banner();
        print_info("Verbose output enabled");
        eprintln!();
    }

    let (source, request): (Arc<dyn WikiSource>, PageRequest) = match &args.domain {
        Some(domain) => {
            if args.meta.is_some() || args.title.is_some() {
                print_warning("--meta and --title only apply to offline input; ignoring");
            }
            if args.verbose {
                print_step(
                    1,
                    3,
                    &format!("Fetching {} from {}", args.input.bright_white(), domain.bright_white().underline()),
                );
            }

            let mut config = FetchConfig { timeout: args.timeout, ..Default::default() };
            if let Some(user_agent) = &args.user_agent {
                config.user_agent = user_agent.clone();
            }
            let client = MediaWikiClient::new(config).context("Failed to build HTTP client")?;

            let mut request = PageRequest::new(domain.as_str(), args.input.as_str());
            if let Some(revision) = args.revision {
                request = request.with_revision(revision);
            }
            let source: Arc<dyn WikiSource> = Arc::new(client);
            (source, request)
        }
        None => {
            let html = if args.input == "-" {
                if args.verbose {
                    print_step(1, 3, "Reading from stdin");
                }
                fetch_stdin().context("Failed to read from stdin")?
            } else {
                if args.verbose {
                    print_step(1, 3, &format!("Reading from file {}", args.input.bright_white()));
                }
                fetch_file(&args.input).with_context(|| format!("Failed to read file: {}", args.input))?
            };

            if args.verbose {
                print_field("Size", &format_size(html.len()));
            }

            let (source, title) = offline_source(&args, html)?;
            if args.verbose {
                print_field("Title", &title);
                eprintln!();
            }
            let source: Arc<dyn WikiSource> = Arc::new(source);
            (source, PageRequest::new(DEFAULT_DOMAIN, title))
        }
    };

    if args.verbose {
        print_step(2, 3, &format!("Rendering {:?}", args.endpoint));
    }

    let config = SectionsConfig::builder().split_depth(args.split_depth).build();
    let pipeline = Pipeline::new(source, config);
    let value = render(&pipeline, &request, args.endpoint, args.verbose).await.context("Failed to render page")?;

    let output = if args.pretty { serde_json::to_string_pretty(&value)? } else { serde_json::to_string(&value)? };

    if args.verbose {
        print_step(3, 3, "Writing output");
        print_timing("Total", started.elapsed());
        eprintln!();
    }

    match &args.output {
        Some(path) => {
            fs::write(path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            println!("{}", output);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Err(err) = run(args).await {
        print_error(&format!("{:#}", err));
        std::process::exit(1);
    }

    Ok(())
}
