//! this binary starts the phonebook server
//! to see the list of options, type: `phonebook-server --help`
//!
//! Every option can also be given through the environment variable named in its help text.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::exit;

use clap::{arg_enum, crate_version, value_t, App, Arg, ArgMatches};
use phonebook::{MemPhonebook, PhonebookEngine, PhonebookError, PhonebookServer, Result, SledPhonebook};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

arg_enum! {
    #[allow(non_camel_case_types)]
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum Engine {
        sled,
        memory
    }
}

const DEFAULT_ADDRESS: &str = "127.0.0.1:3001";
const DEFAULT_DATA_DIR: &str = "phonebook-data";
const DEFAULT_STATIC_DIR: &str = "dist";
const DEFAULT_LOG_LEVEL: &str = "info";

/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    addr: SocketAddr,
    engine: Engine,
    data_dir: PathBuf,
    static_dir: PathBuf,
    log_level: Level,
}

impl Opt {
    /// validates the command line parameters
    /// returns `Ok<Opt>` if everything is valid
    /// # Errors
    /// returns [`PhonebookError::Parsing`] if one of the parameters is invalid
    ///
    fn build(matches: &ArgMatches) -> Result<Opt> {
        let addr = matches.value_of("addr").unwrap_or(DEFAULT_ADDRESS);
        let mut addr: SocketAddr = addr.parse().map_err(|_| {
            PhonebookError::Parsing(format!("could not parse {} into an IP address and port", addr))
        })?;
        if let Some(port) = matches.value_of("port") {
            let port: u16 = port
                .parse()
                .map_err(|_| PhonebookError::Parsing(format!("could not parse {} into a port", port)))?;
            addr.set_port(port);
        }

        let engine = value_t!(matches, "engine", Engine)
            .map_err(|e| PhonebookError::Parsing(e.message))?;

        let log_level = matches.value_of("log-level").unwrap_or(DEFAULT_LOG_LEVEL);
        let log_level: Level = log_level
            .parse()
            .map_err(|_| PhonebookError::Parsing(format!("unknown log level {}", log_level)))?;

        Ok(Opt {
            addr,
            engine,
            data_dir: PathBuf::from(matches.value_of("data-dir").unwrap_or(DEFAULT_DATA_DIR)),
            static_dir: PathBuf::from(matches.value_of("static-dir").unwrap_or(DEFAULT_STATIC_DIR)),
            log_level,
        })
    }
}

fn main() {
    // parse command line args
    let matches = App::new("phonebook-server")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("a phonebook REST service")
        .arg(Arg::with_name("addr")
            .long("addr")
            .value_name("IP_ADDR:PORT")
            .env("PHONEBOOK_ADDR")
            .help("sets the IP_ADDR:PORT that the server listens on")
            .default_value(DEFAULT_ADDRESS))
        .arg(Arg::with_name("port")
            .long("port")
            .value_name("PORT")
            .env("PORT")
            .help("overrides the port of --addr"))
        .arg(Arg::with_name("engine")
            .long("engine")
            .value_name("ENGINE_NAME")
            .env("PHONEBOOK_ENGINE")
            .help("sets the storage engine to use, either 'sled' or 'memory'")
            .default_value("sled"))
        .arg(Arg::with_name("data-dir")
            .long("data-dir")
            .value_name("DIR")
            .env("PHONEBOOK_DATA_DIR")
            .help("the directory the sled engine keeps its data in")
            .default_value(DEFAULT_DATA_DIR))
        .arg(Arg::with_name("static-dir")
            .long("static-dir")
            .value_name("DIR")
            .env("PHONEBOOK_STATIC_DIR")
            .help("the directory holding the built client bundle")
            .default_value(DEFAULT_STATIC_DIR))
        .arg(Arg::with_name("log-level")
            .long("log-level")
            .value_name("LEVEL")
            .env("PHONEBOOK_LOG")
            .help("one of trace, debug, info, warn, error")
            .default_value(DEFAULT_LOG_LEVEL))
        .get_matches();

    // validate command line options, store them in Opt
    let opt = match Opt::build(&matches) {
        Ok(opt) => opt,
        Err(err) => {
            eprintln!("{}", err);
            exit(1);
        }
    };

    // set up a tracing subscriber to log to STDERR
    subscriber_config(opt.log_level);

    // start the server
    if let Err(e) = run(opt) {
        eprintln!("{}", e);
        exit(1);
    }
}

#[tokio::main]
async fn run(opt: Opt) -> Result<()> {
    info!("phonebook-server {}", env!("CARGO_PKG_VERSION"));
    info!("Storage engine: {}", opt.engine);

    match opt.engine {
        Engine::sled => {
            let engine = SledPhonebook::open(&opt.data_dir)?;
            run_with_engine(engine, &opt).await
        }
        Engine::memory => run_with_engine(MemPhonebook::new(), &opt).await,
    }
}

async fn run_with_engine<E: PhonebookEngine>(engine: E, opt: &Opt) -> Result<()> {
    let mut server = PhonebookServer::new(engine);
    if opt.static_dir.is_dir() {
        info!("Serving static files from {:?}", opt.static_dir);
        server = server.with_static_dir(&opt.static_dir);
    } else {
        warn!("static directory {:?} does not exist, not serving the client", opt.static_dir);
    }
    server.run(opt.addr).await
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config(level: Level) {
    let subscriber = FmtSubscriber::builder()
        // spans/events at `level` and above will be written
        .with_max_level(level)
        // log to stderr instead of stdout
        .with_writer(std::io::stderr)
        // completes the builder.
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting tracing default subscriber failed: {}", e);
    }
}
