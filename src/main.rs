use anyhow::{Context, Result};
use bibshelf::config::{
    default_config_path, expand_tilde, find_config_file, get_config, load_config, save_config,
    Config, DocAddMode,
};
use bibshelf::ingest::{AddOutcome, AddRequest, BibSource, Ingestor};
use bibshelf::query::{self, CaseSensitivity, Hit};
use bibshelf::repository::{FileRepository, Repository};
use bibshelf::sources::ResolverRegistry;
use bibshelf::ui::pretty::paper_oneliner;
use bibshelf::ui::{TerminalUi, Ui};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// bibshelf - Keep your bibliography on a shelf and find papers again
#[derive(Parser, Debug)]
#[command(name = "bibshelf")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Personal bibliography manager", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path (default: $BIBSHELF_CONFIG, then the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the repository and a default configuration file
    Init {
        /// Repository directory (defaults to main.pubsdir)
        #[arg(long)]
        pubsdir: Option<PathBuf>,
    },

    /// Add a paper to the repository
    Add {
        /// BibTeX file
        bibfile: Option<PathBuf>,

        /// DOI to retrieve the BibTeX entry from
        #[arg(short = 'D', long)]
        doi: Option<String>,

        /// ISBN to retrieve the BibTeX entry from
        #[arg(short = 'I', long)]
        isbn: Option<String>,

        /// arXiv ID to retrieve the BibTeX entry from
        #[arg(short = 'X', long)]
        arxiv: Option<String>,

        /// Document file (pdf, ps, ...)
        #[arg(short = 'd', long)]
        docfile: Option<PathBuf>,

        /// Tags, separated by commas
        #[arg(short = 't', long)]
        tags: Option<String>,

        /// Citekey for the paper; generated when not given
        #[arg(short = 'k', long)]
        citekey: Option<String>,

        /// Don't copy the document, record a link to it
        #[arg(short = 'L', long, conflicts_with_all = ["move_doc", "copy"])]
        link: bool,

        /// Move the document into the repository
        #[arg(short = 'M', long = "move", conflicts_with = "copy")]
        move_doc: bool,

        /// Copy the document into the repository
        #[arg(short = 'C', long)]
        copy: bool,
    },

    /// List papers, optionally filtered by field:value queries
    #[command(visible_alias = "ls")]
    List {
        /// Query clauses (e.g. "year:2000" "tags:math" "a:smith")
        query: Vec<String>,

        /// Only print the citekeys of matching papers
        #[arg(short = 'k', long = "citekeys-only")]
        citekeys_only: bool,

        /// Compare case-insensitively
        #[arg(short = 'i', long, conflicts_with = "force_case")]
        ignore_case: bool,

        /// Compare case-sensitively
        #[arg(short = 'I', long)]
        force_case: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            TerminalUi::new("").error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config.clone().or_else(find_config_file);
    let config = match &config_path {
        Some(path) => load_config(path)
            .with_context(|| format!("cannot load config {}", path.display()))?,
        None => get_config()?,
    };

    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    match cli.command {
        Commands::Init { pubsdir } => init(config, config_path, pubsdir),

        Commands::Add {
            bibfile,
            doi,
            isbn,
            arxiv,
            docfile,
            tags,
            citekey,
            link,
            move_doc,
            copy,
        } => {
            let mut repo = open_repository(&config)?;
            let registry = ResolverRegistry::from_config(&config.resolvers)?;
            let mut ui = TerminalUi::new(config.main.editor_command());
            let color = ui.color();

            let doc_mode = if link {
                Some(DocAddMode::Link)
            } else if move_doc {
                Some(DocAddMode::Move)
            } else if copy {
                Some(DocAddMode::Copy)
            } else {
                None
            };

            let request = AddRequest {
                source: BibSource::select(bibfile, doi, isbn, arxiv),
                docfile,
                tags,
                citekey,
                doc_mode,
            };

            let outcome = Ingestor::new(&mut repo, &registry, &mut ui, config.main.doc_add)
                .with_color(color)
                .add(request)?;

            Ok(match outcome {
                AddOutcome::Added(_) => ExitCode::SUCCESS,
                AddOutcome::Aborted(reason) => ExitCode::from(reason.exit_code()),
            })
        }

        Commands::List {
            query: clauses,
            citekeys_only,
            ignore_case,
            force_case,
        } => {
            let repo = open_repository(&config)?;
            let mut ui = TerminalUi::new(config.main.editor_command());
            let color = ui.color();

            let case = if ignore_case {
                CaseSensitivity::Insensitive
            } else if force_case {
                CaseSensitivity::Sensitive
            } else {
                CaseSensitivity::Infer
            };

            let papers = repo.all_papers()?;
            let hits = query::run(&papers, clauses.as_slice(), case, citekeys_only)?;
            tracing::debug!("{} of {} papers matched", hits.len(), papers.len());

            let lines: Vec<String> = hits
                .iter()
                .map(|hit| match hit {
                    Hit::Paper { index, paper } => paper_oneliner(paper, Some(*index), color),
                    Hit::Citekey(key) => key.to_string(),
                })
                .collect();
            if !lines.is_empty() {
                ui.message(&lines.join("\n"));
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(cli: &Cli, config: &Config) {
    let log_level = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("bibshelf={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_repository(config: &Config) -> Result<FileRepository> {
    let root = config.main.repository_dir();
    FileRepository::open(&root)
        .with_context(|| format!("cannot open repository {}", root.display()))
}

fn init(
    mut config: Config,
    config_path: Option<PathBuf>,
    pubsdir: Option<PathBuf>,
) -> Result<ExitCode> {
    let mut ui = TerminalUi::new("");
    if let Some(dir) = pubsdir {
        config.main.pubsdir = dir;
    }

    let root = expand_tilde(&config.main.pubsdir);
    let repo = FileRepository::init(&root)
        .with_context(|| format!("cannot create repository {}", root.display()))?;
    ui.message(&format!(
        "Initialized bibshelf repository in {}",
        repo.root().display()
    ));

    let config_path = config_path.unwrap_or_else(default_config_path);
    if config_path.exists() {
        tracing::info!("Keeping existing config file {}", config_path.display());
    } else {
        save_config(&config, &config_path)?;
        ui.message(&format!("Wrote configuration to {}", config_path.display()));
    }

    Ok(ExitCode::SUCCESS)
}
