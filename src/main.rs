use clap::{Parser, Subcommand};
use datum_query::{Context, Datum, Query};
use tracing::Level;

/// Query and rewrite JSON documents with datum path queries.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the value addressed by QUERY
    Get { json: String, query: String },
    /// Print whether QUERY addresses an existing value
    Has { json: String, query: String },
    /// Write VALUE (JSON text) at QUERY and print the new document
    Set {
        json: String,
        query: String,
        value: String,
    },
    /// Remove the value addressed by QUERY (a `!` query)
    Delete { json: String, query: String },
    /// Relocate a value using a two-segment `source>destination` query
    Move { json: String, query: String },
    /// Deep-merge two documents
    Merge { left: String, right: String },
    /// List one query per leaf of the document's object nesting
    Tree { json: String },
    /// Parse QUERY and print its canonical form and per-node flags
    Check { query: String },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn document(text: &str) -> Datum {
    Datum::from_json(text).unwrap_or_else(|e| fail(format!("Invalid JSON: {e}")))
}

fn print(datum: &Datum) {
    match datum.pretty() {
        Ok(text) => println!("{text}"),
        Err(e) => fail(e),
    }
}

fn main() {
    // Parse CLI arguments.
    let args = Args::parse();
    init_logging(args.verbose);

    let ctx = Context::default();
    let query = |spec: &str| -> Query {
        ctx.parse(spec)
            .unwrap_or_else(|e| fail(format!("Invalid query: {e}")))
    };

    match args.command {
        Command::Get { json, query: spec } => {
            match document(&json).get(&query(&spec)) {
                Ok(out) => print(&out),
                Err(e) => fail(e),
            }
        }
        Command::Has { json, query: spec } => match document(&json).has(&query(&spec)) {
            Ok(found) => println!("{found}"),
            Err(e) => fail(e),
        },
        Command::Set {
            json,
            query: spec,
            value,
        } => {
            let value = document(&value);
            match document(&json).set(&query(&spec), value) {
                Ok(out) => print(&out),
                Err(e) => fail(e),
            }
        }
        Command::Delete { json, query: spec } => match document(&json).delete(&query(&spec)) {
            Ok(out) => print(&out),
            Err(e) => fail(e),
        },
        Command::Move { json, query: spec } => {
            match document(&json).move_value(&query(&spec)) {
                Ok(out) => print(&out),
                Err(e) => fail(e),
            }
        }
        Command::Merge { left, right } => match document(&left).merge(&document(&right)) {
            Ok(out) => print(&out),
            Err(e) => fail(e),
        },
        Command::Tree { json } => match document(&json).tree() {
            Ok(queries) => queries.iter().for_each(|q| println!("{q}")),
            Err(e) => fail(e),
        },
        Command::Check { query: spec } => {
            let q = query(&spec);
            println!("{q}");
            for node in q.nodes() {
                println!("{:>3} {} {:?}", node.seq(), node.flags(), node.text());
            }
        }
    }
}
