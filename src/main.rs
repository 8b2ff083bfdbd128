use std::env;

use lox::Lox;

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let mut args = env::args().skip(1).collect::<Vec<_>>();

    let mut lox = Lox::new();
    match args.len() {
        1 => {
            let filename = args.pop().expect("length checked above");
            lox.run_file(filename.as_ref())?;

            // sysexits.h conventions: 64 for bad input, 70 for an internal
            // software error
            if lox.had_error() {
                std::process::exit(64);
            }
            if lox.had_runtime_error() {
                std::process::exit(70);
            }

            Ok(())
        }
        2.. => {
            println!("Usage: lox [script]");
            std::process::exit(64);
        }
        _ => lox.run_prompt(),
    }
}
