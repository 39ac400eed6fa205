mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;
use motif_core::config::{self, MotifConfig};
use motif_core::{Category, Framework, PatternLibrary, SearchOptions, SuggestOptions};
use tracing::info;

use crate::output::Output;

#[derive(Parser)]
#[command(name = "motif")]
#[command(about = "Design pattern knowledge base")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Pattern store directory (overrides config)
    #[arg(long, short = 's', global = true)]
    store: Option<PathBuf>,

    /// Print JSON instead of tables where supported
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored pattern ids
    List {
        /// Only list one category
        #[arg(long)]
        category: Option<Category>,
    },
    /// Print a stored pattern
    Show {
        /// Pattern id, e.g. layout/card-grid.yaml
        id: String,
    },
    /// Validate and store patterns from YAML files
    Add {
        /// Files holding one pattern or a list of patterns
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Delete a stored pattern
    Delete {
        /// Pattern id
        id: String,
    },
    /// Find patterns by tag, category and framework
    Search {
        /// Required tag, may be repeated
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,

        #[arg(long)]
        category: Option<Category>,

        #[arg(long)]
        framework: Option<Framework>,

        /// Read every document instead of using the index
        #[arg(long)]
        linear: bool,
    },
    /// Suggest patterns for a task description
    Suggest {
        /// What you are building
        #[arg(required = true)]
        context: Vec<String>,

        #[arg(long)]
        framework: Option<Framework>,

        /// Use these categories instead of ones found in the description
        #[arg(long = "category")]
        categories: Vec<Category>,

        /// Maximum suggestions (default from config)
        #[arg(long)]
        limit: Option<usize>,

        /// Minimum relevance between 0 and 1 (default from config)
        #[arg(long)]
        min_relevance: Option<f64>,
    },
    /// Grade patterns for completeness and coherence
    Quality {
        /// Pattern id
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<String>,

        /// Grade every stored pattern
        #[arg(long)]
        all: bool,
    },
    /// Check every stored document against the schema
    Validate,
    /// Build the index and show its statistics
    Index,
    /// Compare linear and indexed search
    Bench {
        /// Runs per query
        #[arg(long, default_value_t = 5)]
        iterations: u32,
    },
    /// Print the JSON Schema for pattern documents
    Schema,
    /// Configuration management
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Write the current configuration to a file
    Init {
        /// Path to write (defaults to the user config directory)
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    use tracing_appender::rolling;
    use tracing_subscriber::{
        EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt,
    };

    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("motif")
        .join("logs");
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = rolling::daily(&log_dir, "motif.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // RUST_LOG wins over the built-in levels when set
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("motif_core=debug,motif=debug,info")
        } else {
            EnvFilter::new("motif_core=warn,motif=warn,warn")
        }
    });

    let terminal_layer = if cli.debug {
        fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(std::io::stderr)
            .pretty()
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(std::io::stderr)
            .compact()
            .boxed()
    };

    let file_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_ansi(false)
        .with_writer(non_blocking);

    tracing_subscriber::registry()
        .with(terminal_layer.with_filter(env_filter))
        .with(file_layer.with_filter(EnvFilter::new("motif_core=debug,motif=debug,info")))
        .init();

    info!(
        "Logging initialized. Logs are being written to: {:?}",
        log_dir.join("motif.log")
    );

    let mut config = if let Some(config_path) = &cli.config {
        info!("Loading config from: {:?}", config_path);
        config::load_config(config_path).await?
    } else {
        info!("Loading config from standard locations");
        config::load_config_from_standard_locations().await?
    };
    if let Some(store) = &cli.store {
        config.store.root = store.clone();
    }

    let output = Output::quiet(cli.json);

    match &cli.command {
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => commands::config::show(&config, &output).await?,
            ConfigCommands::Init { path } => {
                let path = path.clone().unwrap_or_else(config::default_config_path);
                commands::config::init(&config, &path, &output).await?
            }
        },
        Commands::Schema => commands::schema::print(&output)?,
        command => {
            let library = PatternLibrary::from_config(&config);
            run(command, &library, &config, &output).await?;
        }
    }

    Ok(())
}

async fn run(
    command: &Commands,
    library: &PatternLibrary,
    config: &MotifConfig,
    output: &Output,
) -> Result<()> {
    match command {
        Commands::List { category } => commands::pattern::list(library, *category, output).await,
        Commands::Show { id } => commands::pattern::show(library, id, output).await,
        Commands::Add { files } => commands::pattern::add(library, files, output).await,
        Commands::Delete { id } => commands::pattern::delete(library, id, output).await,
        Commands::Search {
            tags,
            category,
            framework,
            linear,
        } => {
            let mut options = SearchOptions::new().tags(tags.iter().cloned());
            options.category = *category;
            options.framework = *framework;
            commands::search::search(library, &options, *linear, output).await
        }
        Commands::Suggest {
            context,
            framework,
            categories,
            limit,
            min_relevance,
        } => {
            let mut options = SuggestOptions::new(context.join(" "))
                .categories(categories.iter().copied())
                .limit(limit.unwrap_or(config.suggest.limit))
                .min_relevance(min_relevance.unwrap_or(config.suggest.min_relevance));
            options.framework = *framework;
            commands::search::suggest(library, &options, output).await
        }
        Commands::Quality { id, all } => match id {
            Some(id) if !*all => commands::quality::one(library, id, output).await,
            _ => commands::quality::all(library, output).await,
        },
        Commands::Validate => commands::quality::validate(library, output).await,
        Commands::Index => commands::index::stats(library, output).await,
        Commands::Bench { iterations } => {
            commands::index::bench(library, *iterations, output).await
        }
        Commands::Schema | Commands::Config { .. } => Ok(()),
    }
}
