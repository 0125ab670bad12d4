//! The phonebook-client executable supports the following command line arguments:
//!
//! `phonebook-client list [--filter TEXT] [--url URL]`
//!
//!     Print every person, or only those whose name contains TEXT (ignoring case).
//!
//! `phonebook-client add <NAME> <NUMBER> [--yes] [--url URL]`
//!
//!     Add a person. If a person with exactly NAME already exists, ask whether its number
//!     should be replaced with NUMBER.
//!
//! `phonebook-client rm <ID> [--yes] [--url URL]`
//!
//!     Delete the person with the given id, after asking for confirmation.
//!
//! `phonebook-client info [--url URL]`
//!
//!     Print the server's info page.
//!
//! --url defaults to http://127.0.0.1:3001, or the PHONEBOOK_URL environment variable.
//! --yes answers every confirmation with yes, otherwise the answer is read from stdin.
//! Print an error and return a non-zero exit code if the server can't be reached or
//! an argument doesn't parse.

use std::sync::Arc;

use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use phonebook::app::{view, Confirm, PhonebookController, TerminalConfirm, TokioScheduler};
use phonebook::{HttpPersonService, PersonId, Result};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const DEFAULT_URL: &str = "http://127.0.0.1:3001";

/// The request given on the command line
#[derive(Debug)]
enum Request {
    List { filter: String },
    Add { name: String, number: String },
    Remove { id: PersonId },
    Info,
}

/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    /// the server's base url
    url: String,
    /// answer every confirmation with yes
    assume_yes: bool,
    req: Request,
}

fn main() {
    // configure a subscriber that will log warnings to STDERR
    subscriber_config();

    let url_arg = Arg::with_name("url")
        .long("url")
        .value_name("URL")
        .env("PHONEBOOK_URL")
        .help("the base url of the phonebook server")
        .global(true)
        .default_value(DEFAULT_URL);
    let yes_arg = Arg::with_name("yes")
        .long("yes")
        .short("y")
        .global(true)
        .help("answer yes to every confirmation");

    let matches = App::new("phonebook-client")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("a terminal client for the phonebook")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .args(&[url_arg, yes_arg])
        .subcommands(vec![
            SubCommand::with_name("list")
                .about("Print the persons in the phonebook")
                .arg(Arg::with_name("filter")
                    .long("filter")
                    .value_name("TEXT")
                    .help("only show names containing TEXT")),
            SubCommand::with_name("add")
                .about("Add a person, or replace the number of an existing one")
                .arg(Arg::with_name("NAME").required(true).index(1))
                .arg(Arg::with_name("NUMBER").required(true).index(2)),
            SubCommand::with_name("rm")
                .about("Delete a person by id")
                .arg(Arg::with_name("ID").required(true).index(1)),
            SubCommand::with_name("info")
                .about("Print the server's info page"),
        ])
        .get_matches();

    let result = parse_options(&matches).and_then(run);
    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// parses the matches from the command line into an [`Opt`] struct
fn parse_options(matches: &ArgMatches) -> Result<Opt> {
    let (name, args) = match matches.subcommand() {
        (name, Some(args)) => (name, args),
        (name, None) => (name, matches),
    };
    // global options may be given before or after the subcommand
    let url = args
        .value_of("url")
        .or_else(|| matches.value_of("url"))
        .unwrap_or(DEFAULT_URL)
        .to_string();
    let assume_yes = args.is_present("yes") || matches.is_present("yes");

    let req = match name {
        "list" => Request::List {
            filter: args.value_of("filter").unwrap_or_default().to_string(),
        },
        "add" => Request::Add {
            name: args.value_of("NAME").unwrap_or_default().to_string(),
            number: args.value_of("NUMBER").unwrap_or_default().to_string(),
        },
        "rm" => Request::Remove {
            id: args.value_of("ID").unwrap_or_default().parse()?,
        },
        _ => Request::Info,
    };
    Ok(Opt { url, assume_yes, req })
}

/// runs the specified request through a [`PhonebookController`] and prints the resulting view
#[tokio::main]
async fn run(opt: Opt) -> Result<()> {
    let service = HttpPersonService::new(&opt.url)?;
    if let Request::Info = opt.req {
        println!("{}", service.info().await?.replace("</br>", "\n"));
        return Ok(());
    }

    let assume_yes = opt.assume_yes;
    let confirm = move |prompt: &str| assume_yes || TerminalConfirm.confirm(prompt);
    let controller = PhonebookController::new(service, confirm, Arc::new(TokioScheduler::current()?));
    controller.load().await?;

    match opt.req {
        Request::List { filter } => controller.set_filter(filter),
        Request::Add { name, number } => {
            controller.set_draft_name(name);
            controller.set_draft_number(number);
            controller.submit().await;
        }
        Request::Remove { id } => {
            controller.delete(id).await;
        }
        Request::Info => {}
    }

    print!("{}", view::render(&controller.snapshot()));
    controller.unmount();
    Ok(())
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config() {
    let subscriber = FmtSubscriber::builder()
        // only warnings and errors, the client's output is the rendered view
        .with_max_level(Level::WARN)
        // log to stderr instead of stdout
        .with_writer(std::io::stderr)
        // completes the builder.
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting tracing default subscriber failed: {}", e);
    }
}
