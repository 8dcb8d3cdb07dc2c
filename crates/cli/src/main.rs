// Pokedex CLI - look up Pokemon by name, number or type
// Without a subcommand, runs the interactive menu.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use pokedex_cli::exit_codes::EXIT_SUCCESS;
use pokedex_cli::interactive::Session;
use pokedex_cli::{display, CliError};
use pokedex_config::Settings;
use pokedex_matcher::closest;
use pokedex_store::{Lookup, Pokemon, Source, Store, StoreError};

#[derive(Parser)]
#[command(name = "pokedex")]
#[command(about = "Look up Pokemon by name, number or type")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Settings file (default: <config dir>/pokedex/settings.toml)
    #[arg(long, global = true, env = "POKEDEX_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// CSV source to build the index from (overrides data.csv_path)
    #[arg(long, global = true, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// SQLite index file (overrides data.db_path)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// CSV field delimiter (overrides data.delimiter; default: sniffed)
    #[arg(long, global = true)]
    delimiter: Option<char>,

    /// Debug logging on stderr (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a Pokemon by name
    #[command(after_help = "\
Examples:
  pokedex name pikachu
  pokedex name 'mr. mime' --json")]
    Name {
        /// Pokemon name (case-insensitive)
        name: String,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a Pokemon by species number
    Number {
        /// Species number
        id: u32,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the Pokemon of a type
    Type {
        /// Type name, matched against both type columns
        #[arg(value_name = "TYPE")]
        pokemon_type: String,

        /// Print the names as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Print every name, number or type, one per line
    List {
        what: Listing,

        /// Print a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Rebuild the index from the CSV source
    Reload,

    /// Show where the index came from and whether it is up to date
    Status {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Listing {
    Names,
    Numbers,
    Types,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\ntarget:  ", env!("TARGET"),
    )
}

fn setup_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Also bridges `log` records from the library crates
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// Settings plus the resolved source, after command-line overrides.
struct Context {
    settings: Settings,
    config_path: Option<PathBuf>,
    source: Source,
}

impl Context {
    fn new(cli: &Cli) -> Result<Self, CliError> {
        let (mut settings, config_path) = match &cli.config {
            Some(path) => (Settings::load_from(path)?, Some(path.clone())),
            None => {
                let path = Settings::config_path();
                let found = path.exists().then_some(path);
                (Settings::load(), found)
            }
        };

        if let Some(csv) = &cli.csv {
            settings.data.csv_path = csv.clone();
        }
        if let Some(db) = &cli.db {
            settings.data.db_path = db.clone();
        }
        if let Some(d) = cli.delimiter {
            settings.data.delimiter = Some(d);
        }
        // Flags go through the same checks as the file
        settings.validate()?;

        let mut source = Source::new(&settings.data.csv_path);
        if let Some(d) = settings.data.delimiter_byte() {
            source = source.with_delimiter(d);
        }

        Ok(Self { settings, config_path, source })
    }

    fn open_store(&self) -> Result<Store, CliError> {
        Ok(Store::open(&self.settings.data.db_path)?)
    }

    /// Open the index, building it from the source on first use.
    fn open_loaded(&self) -> Result<Store, CliError> {
        let mut store = self.open_store()?;
        match store.ensure_loaded(&self.source) {
            Ok(true) => log::info!("built index {}", self.settings.data.db_path.display()),
            Ok(false) => {}
            Err(e @ StoreError::Io(_)) => {
                return Err(CliError::from(e)
                    .with_hint("the index is empty; set data.csv_path or pass --csv"));
            }
            Err(e) => return Err(e.into()),
        }
        Ok(store)
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = Context::new(&cli)?;

    match cli.command {
        None => cmd_interactive(&ctx),
        Some(Commands::Name { name, json }) => cmd_name(&ctx, &name, json),
        Some(Commands::Number { id, json }) => cmd_number(&ctx, id, json),
        Some(Commands::Type { pokemon_type, json }) => cmd_type(&ctx, &pokemon_type, json),
        Some(Commands::List { what, json }) => cmd_list(&ctx, what, json),
        Some(Commands::Reload) => cmd_reload(&ctx),
        Some(Commands::Status { json }) => cmd_status(&ctx, json),
    }
}

fn cmd_interactive(ctx: &Context) -> Result<(), CliError> {
    let mut store = ctx.open_loaded()?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    Session::new(&mut store, &ctx.source, &ctx.settings.display, stdin.lock(), stdout.lock()).run()
}

fn cmd_name(ctx: &Context, name: &str, json: bool) -> Result<(), CliError> {
    let store = ctx.open_loaded()?;
    match store.find_by_name(name) {
        Ok(pokemon) => print_pokemon(ctx, &pokemon, json),
        Err(StoreError::NotFound(Lookup::Name(name))) => {
            let names = store.all_names()?;
            let err = CliError::not_found(format!("I don't recognize the name {name}"));
            // Nothing to suggest from an empty index
            match closest(&name, &names) {
                Ok(suggestion) => Err(err.with_hint(format!("did you mean {suggestion}?"))),
                Err(_) => Err(err),
            }
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_number(ctx: &Context, id: u32, json: bool) -> Result<(), CliError> {
    let store = ctx.open_loaded()?;
    match store.find_by_species_id(id) {
        Ok(pokemon) => print_pokemon(ctx, &pokemon, json),
        Err(e @ StoreError::NotFound(_)) => {
            let hint = store
                .all_species_ids()?
                .last()
                .map(|max| format!("numbers go up to {max}"));
            let err = CliError::from(e);
            Err(match hint {
                Some(hint) => err.with_hint(hint),
                None => err,
            })
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_type(ctx: &Context, pokemon_type: &str, json: bool) -> Result<(), CliError> {
    let store = ctx.open_loaded()?;
    let names = match store.find_by_type(pokemon_type) {
        Ok(names) => names,
        Err(e @ StoreError::NotFound(_)) => {
            let types = store.all_types()?;
            return Err(CliError::from(e).with_hint(format!("known types: {}", types.join(", "))));
        }
        Err(e) => return Err(e.into()),
    };

    let mut out = io::stdout().lock();
    if json {
        print_json(&mut out, &names)
    } else {
        display::write_names(&mut out, &names, ctx.settings.display.names_per_line)?;
        Ok(())
    }
}

fn cmd_list(ctx: &Context, what: Listing, json: bool) -> Result<(), CliError> {
    let store = ctx.open_loaded()?;
    let mut out = io::stdout().lock();
    match what {
        Listing::Names => print_listing(&mut out, &store.all_names()?, json),
        Listing::Numbers => print_listing(&mut out, &store.all_species_ids()?, json),
        Listing::Types => print_listing(&mut out, &store.all_types()?, json),
    }
}

fn print_listing<W, T>(out: &mut W, items: &[T], json: bool) -> Result<(), CliError>
where
    W: Write,
    T: serde::Serialize + std::fmt::Display,
{
    if json {
        return print_json(out, items);
    }
    for item in items {
        writeln!(out, "{item}")?;
    }
    Ok(())
}

fn cmd_reload(ctx: &Context) -> Result<(), CliError> {
    let mut store = ctx.open_store()?;
    let count = store.reload(&ctx.source)?;
    println!("Loaded {} pokemon from {}", count, ctx.source.path().display());
    Ok(())
}

fn cmd_status(ctx: &Context, json: bool) -> Result<(), CliError> {
    let store = ctx.open_store()?;
    let info = store.info()?;

    let state = if info.is_none() {
        "not built"
    } else {
        match store.is_stale(&ctx.source) {
            Ok(true) => "stale",
            Ok(false) => "up to date",
            Err(StoreError::Io(_)) => "source missing",
            Err(e) => return Err(e.into()),
        }
    };
    let config = ctx
        .config_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| format!("(defaults; {} not found)", Settings::config_path_display()));

    let mut out = io::stdout().lock();
    if json {
        let value = serde_json::json!({
            "config": ctx.config_path.as_ref().map(|p| p.display().to_string()),
            "source": ctx.source.path().display().to_string(),
            "index": ctx.settings.data.db_path.display().to_string(),
            "state": state,
            "record_count": info.as_ref().map(|i| i.record_count),
            "loaded_at": info.as_ref().map(|i| i.loaded_at.to_rfc3339()),
            "loaded_from": info.as_ref().map(|i| i.source.clone()),
        });
        return print_json(&mut out, &value);
    }

    writeln!(out, "config:  {config}")?;
    writeln!(out, "source:  {}", ctx.source.path().display())?;
    writeln!(out, "index:   {}", ctx.settings.data.db_path.display())?;
    writeln!(out, "state:   {state}")?;
    if let Some(info) = info {
        writeln!(out, "records: {}", info.record_count)?;
        writeln!(out, "loaded:  {} from {}", info.loaded_at.to_rfc3339(), info.source)?;
    }
    Ok(())
}

fn print_pokemon(ctx: &Context, pokemon: &Pokemon, json: bool) -> Result<(), CliError> {
    let mut out = io::stdout().lock();
    if json {
        return print_json(&mut out, pokemon);
    }
    display::write_stats(&mut out, pokemon)?;
    display::show_image(&mut out, pokemon, &ctx.settings.display)?;
    Ok(())
}

fn print_json<W: Write, T: serde::Serialize + ?Sized>(out: &mut W, value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::io(e.to_string()))?;
    writeln!(out, "{text}")?;
    Ok(())
}
