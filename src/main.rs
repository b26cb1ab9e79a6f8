use clap::{CommandFactory, Parser};

use tillroll::cli::{self, Cli, Commands};
use tillroll::logging::{self, LogTarget};

fn main() {
    let cli = Cli::parse();
    let file = cli.file.as_deref();

    let target = match cli.command {
        None | Some(Commands::Dashboard) => LogTarget::File,
        Some(_) => LogTarget::Stderr,
    };
    if let Err(e) = logging::init(cli.verbose, target) {
        eprintln!("Warning: {e}");
    }

    let result = match cli.command {
        None | Some(Commands::Dashboard) => cli::dashboard::run(file),
        Some(Commands::Report {
            view,
            ref filters,
            json,
        }) => cli::report::run(file, view, filters, json),
        Some(Commands::Export {
            ref output_dir,
            format,
            records,
            ref filters,
        }) => cli::export::run(file, output_dir.clone(), format, records, filters),
        Some(Commands::Periods) => cli::status::periods(file),
        Some(Commands::Countries) => cli::status::countries(file),
        Some(Commands::Status) => cli::status::run(file),
        Some(Commands::Init {
            ref countries,
            debounce_ms,
        }) => cli::init::run(file, countries.clone(), debounce_ms),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "tillroll", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
