use std::process;

fn main() {
    if let Err(error) = tracegram::cli::main() {
        eprintln!("{}", error);
        process::exit(1);
    }
}
