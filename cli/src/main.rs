use std::io::Write;

use anyhow::Error;

use clap::{ArgAction, Parser, Subcommand};

mod args;

mod fasta;
use fasta::CountsToFasta;

mod filter;
use filter::FilterMsa;

mod model;
use model::ModelInput;

mod msa;
use msa::MsaToCounts;

mod vcf;
use vcf::VcfToCounts;

const NAME: &str = env!("CARGO_BIN_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Tools for converting alignments and variant calls to allele counts.
#[derive(Debug, Parser)]
#[clap(name = NAME, author = AUTHOR, version = VERSION, about)]
#[clap(subcommand_required = true)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Suppress warnings.
    ///
    /// By default, only warnings are printed. By setting this flag, warnings will be disabled.
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbosity.
    ///
    /// Flag can be set multiply times to increase verbosity, or left unset for quiet mode.
    #[clap(short = 'v', long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Print CLI arguments for debugging.
    #[clap(long, hide = true, global = true)]
    debug: bool,
}

impl Cli {
    pub fn run(self) -> Result<(), Error> {
        if self.debug {
            eprintln!("{self:#?}");
        }

        let level = if self.quiet {
            log::LevelFilter::Off
        } else {
            match self.verbose {
                0 => log::LevelFilter::Warn,
                1 => log::LevelFilter::Info,
                2 => log::LevelFilter::Debug,
                _ => log::LevelFilter::Trace,
            }
        };

        match env_logger::Builder::new()
            .filter_level(level)
            .target(env_logger::Target::Stderr)
            .format(|buf, record| {
                let level = record.level().as_str().to_lowercase();
                let args = record.args();
                writeln!(buf, "[counts {level:>5}] {args}")
            })
            .try_init()
        {
            Ok(()) => (),
            Err(e) => eprintln!("failed to setup logger: {e}"),
        }

        self.command.run()
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    MsaToCounts(MsaToCounts),
    VcfToCounts(VcfToCounts),
    CountsToFasta(CountsToFasta),
    FilterMsa(FilterMsa),
    ModelInput(ModelInput),
}

impl Command {
    fn run(self) -> Result<(), Error> {
        match self {
            Command::MsaToCounts(cmd) => cmd.run(),
            Command::VcfToCounts(cmd) => cmd.run(),
            Command::CountsToFasta(cmd) => cmd.run(),
            Command::FilterMsa(cmd) => cmd.run(),
            Command::ModelInput(cmd) => cmd.run(),
        }
    }
}

macro_rules! impl_try_from_command {
    ($variant:ident) => {
        impl TryFrom<Command> for $variant {
            type Error = Command;

            fn try_from(command: Command) -> Result<Self, Self::Error> {
                match command {
                    Command::$variant(cmd) => Ok(cmd),
                    command => Err(command),
                }
            }
        }
    };
}

impl_try_from_command!(MsaToCounts);
impl_try_from_command!(VcfToCounts);
impl_try_from_command!(CountsToFasta);
impl_try_from_command!(FilterMsa);
impl_try_from_command!(ModelInput);

fn main() {
    let cli = Cli::parse();

    match cli.run() {
        Ok(()) => (),
        Err(e) => {
            eprintln!("{e:#}");
            std::process::exit(1);
        }
    }
}
