use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use env_logger::Builder;
use log::{info, LevelFilter};

use symbolic_ctl::bdd::Bdd;
use symbolic_ctl::error::Error;
use symbolic_ctl::parse::parse_system;

#[derive(Parser)]
#[command(name = "symbolic-ctl")]
#[command(about = "Check CTL properties of a finite-state system, symbolically")]
struct Args {
    /// Path to the specification file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Directory to dump DOT renderings of the checked BDDs into
    #[arg(long, value_name = "DIR")]
    dot_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Off,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    Builder::from_default_env().filter_level(level).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let text = std::fs::read_to_string(&args.file).map_err(|e| Error::Io {
        path: args.file.clone(),
        source: e,
    })?;

    let bdd = Rc::new(Bdd::new());
    let system = parse_system(&bdd, &text)?;

    info!(
        "model: {} state bits, {:?} initial states, {} properties",
        system.space.state_bits(),
        system.init.count_states(),
        system.properties.len()
    );

    if let Some(dir) = &args.dot_dir {
        std::fs::create_dir_all(dir).map_err(|e| Error::Io {
            path: dir.clone(),
            source: e,
        })?;
        bdd.dump_dot(&[system.init.get_bdd()], dir.join("init.dot"))?;
        bdd.dump_dot(&[system.transition.forward_bdd()], dir.join("transition.dot"))?;
    }

    for (i, property) in system.properties.iter().enumerate() {
        let number = i + 1;
        info!("checking property {}: {}", number, property);

        let sat = property.eval(&system.transition)?;
        let holds = system.init.implies(&sat)?;
        println!("Property {} is {}", number, if holds { "sat" } else { "unsat" });

        if let Some(path) = property.explain(&system.transition, &system.init, holds)? {
            print!("{}", path);
        }

        if let Some(dir) = &args.dot_dir {
            bdd.dump_dot(&[sat.get_bdd()], dir.join(format!("property_{}.dot", number)))?;
        }
    }

    info!("engine: {} nodes allocated", bdd.num_nodes());
    Ok(())
}
