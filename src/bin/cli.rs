//! recordstore CLI
//!
//! Read-only inspection of a store file: counts, primary keys, index entries.
//! Payloads are never decoded; the CLI has no knowledge of record types.

use clap::{Parser, Subcommand, ValueEnum};
use recordstore::keys::IndexKind;
use recordstore::{Config, Store};
use tracing_subscriber::{fmt, EnvFilter};

/// recordstore CLI
#[derive(Parser, Debug)]
#[command(name = "recordstore-cli")]
#[command(about = "Inspect a recordstore database file")]
#[command(version)]
struct Args {
    /// Directory holding the database file
    #[arg(short, long, default_value = "./recordstore_data")]
    root: String,

    /// Database name (file is {root}/{db}.db)
    #[arg(short, long, default_value = "store")]
    db: String,

    /// Main bucket name
    #[arg(short, long, default_value = "records")]
    bucket: String,

    /// Index bucket name
    #[arg(long, default_value = Config::DEFAULT_INDEX_BUCKET)]
    index_bucket: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show file location and entry counts
    Info,

    /// List primary keys in natural order
    Keys {
        /// Only keys in this namespace
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// List index entries in key order
    Index {
        /// Only entries of this kind
        #[arg(short, long)]
        kind: Option<KindArg>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Created,
    Updated,
}

impl From<KindArg> for IndexKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Created => IndexKind::Created,
            KindArg::Updated => IndexKind::Updated,
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,recordstore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> recordstore::Result<()> {
    let config = Config::builder()
        .root(&args.root)
        .db_name(&args.db)
        .bucket(&args.bucket)
        .index_bucket(&args.index_bucket)
        .build();

    let store = Store::open(config)?;

    match args.command {
        Commands::Info => {
            let stats = store.stats()?;
            println!("handler:         {}", store.config().handler());
            println!("file:            {}", store.path().display());
            println!("records:         {}", stats.records);
            println!("created entries: {}", stats.created_entries);
            println!("updated entries: {}", stats.updated_entries);
        }
        Commands::Keys { namespace } => {
            for key in store.primary_keys(namespace.as_deref())? {
                println!("{}", key);
            }
        }
        Commands::Index { kind } => {
            let wanted = kind.map(IndexKind::from);
            for entry in store.index_entries()? {
                if wanted.is_some() && entry.kind != wanted {
                    continue;
                }
                println!("{}\t{}", entry.key, entry.primary_key);
            }
        }
    }

    store.close()
}
