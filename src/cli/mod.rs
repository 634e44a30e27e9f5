//! Command-line front end

use crate::cpu::{Cpu, MemoryModel};
use crate::memory::Ram;
use clap::{App, Arg, ArgMatches, SubCommand};
use std::fs;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown memory model {0}")]
    UnknownModel(String),

    #[error("invalid step count: {0}")]
    BadStepCount(#[from] std::num::ParseIntError),
}

pub fn main() -> Result<(), Error> {
    let matches = App::new("tracegram")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Runs a program image and reconstructs its control flow")
        .subcommand(
            SubCommand::with_name("run")
                .about("Execute an image and dump the recovered basic blocks")
                .arg(
                    Arg::with_name("image")
                        .required(true)
                        .value_name("image.bin")
                        .help("Program image, loaded at address 0"),
                )
                .arg(
                    Arg::with_name("steps")
                        .long("steps")
                        .takes_value(true)
                        .default_value("1000")
                        .help("How many instructions to execute"),
                )
                .arg(
                    Arg::with_name("model")
                        .long("model")
                        .takes_value(true)
                        .default_value("small")
                        .help("Memory model (small or large)"),
                )
                .arg(
                    Arg::with_name("json")
                        .long("json")
                        .help("Dump the graph as JSON instead of pseudo-code"),
                )
                .arg(
                    Arg::with_name("backtrace")
                        .long("backtrace")
                        .help("Also print the shadow call stack"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        ("run", Some(submatches)) => run(submatches),
        _ => {
            eprintln!("Please enter a command");
            Ok(())
        }
    }
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let path = matches.value_of("image").unwrap_or_default();
    let steps: u64 = matches.value_of("steps").unwrap_or("1000").parse()?;

    let model_name = matches.value_of("model").unwrap_or("small");
    let model = MemoryModel::from_str(model_name)
        .map_err(|_| Error::UnknownModel(model_name.to_string()))?;

    let image = fs::read(path)?;
    let mut ram = Ram::from_image(image);

    let mut cpu = Cpu::new(model);
    cpu.reset(&mut ram);

    for _ in 0..steps {
        cpu.step(&mut ram);
    }

    if matches.is_present("json") {
        println!("{}", serde_json::to_string_pretty(cpu.cfg())?);
    } else {
        print!("{}", cpu.dump_basic_blocks());
    }

    if matches.is_present("backtrace") {
        print!("{}", cpu.backtrace());
    }

    Ok(())
}
