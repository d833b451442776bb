mod cli; // Output formatting for plugin listings

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use codecplug_core::{
    Error, LibloadingLoader, LoaderConfig, PluginContext, PluginContextBuilder, PluginDescriptor,
};
use log::{debug, error};
use tracing_subscriber::EnvFilter;

/// codecplug: inspect native codec plugins
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load every plugin module in a directory and report what was found
    Scan {
        /// Directory to scan (not recursive)
        dir: PathBuf,
        /// Record at most this many descriptors, the way a fixed buffer would
        #[arg(long)]
        capacity: Option<usize>,
    },
    /// Load individual plugin modules
    Load {
        /// Module files to load, in order
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Initialize the library and list the active encoders and decoders
    List {
        /// Loader config file (.json, .yaml, .yml or .toml)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Overrides the default plugin directory
        #[arg(long)]
        plugin_dir: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // Diagnostics go to stderr so listings on stdout stay clean.
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

fn builder() -> PluginContextBuilder<LibloadingLoader> {
    PluginContext::builder(LibloadingLoader::new())
}

fn run_scan(dir: PathBuf, capacity: Option<usize>) -> Result<(), Error> {
    // Only the named directory is scanned, never the search path.
    let ctx = builder().plugin_paths(Vec::<PathBuf>::new()).build()?;

    let (count, recorded) = match capacity {
        Some(capacity) => {
            let mut buffer: Vec<Option<PluginDescriptor>> = vec![None; capacity];
            let count = ctx.load_plugins(&dir, Some(buffer.as_mut_slice()))?;
            let recorded: Vec<_> = buffer.into_iter().map_while(|slot| slot).collect();
            (count, recorded)
        }
        None => {
            let count = ctx.load_plugins(&dir, None)?;
            (count, ctx.loaded_plugins())
        }
    };

    println!("Loaded {} plugins from {}", count, dir.display());
    for descriptor in &recorded {
        println!("  {}", cli::describe(*descriptor));
    }
    if recorded.len() < count {
        println!("  ... {} more not recorded", count - recorded.len());
    }

    ctx.destroy();
    Ok(())
}

fn run_load(paths: Vec<PathBuf>) -> Result<(), Error> {
    let ctx = builder().plugin_paths(Vec::<PathBuf>::new()).build()?;
    let mut first_error = None;

    for path in &paths {
        match ctx.load_plugin(path) {
            Ok(descriptor) => println!("{}: {}", path.display(), cli::describe(descriptor)),
            Err(e) => {
                error!("{}", e);
                first_error.get_or_insert(e);
            }
        }
    }
    debug!("{} distinct modules loaded", ctx.loaded_module_count());

    ctx.destroy();
    first_error.map_or(Ok(()), Err)
}

fn run_list(config: Option<PathBuf>, plugin_dir: Option<PathBuf>) -> Result<(), Error> {
    let mut builder = builder();
    if let Some(path) = config {
        builder = builder.config(LoaderConfig::from_file(&path)?);
    }
    if let Some(dir) = plugin_dir {
        builder = builder.default_plugin_dir(dir);
    }
    let ctx = builder.build()?;

    let init_result = ctx.init();
    if init_result.is_ok() {
        print!("{}", cli::render_registry(&ctx.encoders(), &ctx.decoders()));
    }
    ctx.deinit();
    init_result
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    let result = match args.command {
        Commands::Scan { dir, capacity } => run_scan(dir, capacity),
        Commands::Load { paths } => run_load(paths),
        Commands::List { config, plugin_dir } => run_list(config, plugin_dir),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", cli::codes(&e));
            ExitCode::FAILURE
        }
    }
}
