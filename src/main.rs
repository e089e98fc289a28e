#![allow(non_snake_case)]
use SymEntry::Examples::validation_examples::{validate_text, validation_examples};
use SymEntry::Utils::logger::init_logger;
use std::env;

/// `SymEntry [expression [target-unit]]`; without arguments the demo catalogue runs.
/// The log level comes from `SYMENTRY_LOG` (default `warn`).
fn main() {
    let level = env::var("SYMENTRY_LOG").unwrap_or_else(|_| "warn".to_string());
    if let Err(err) = init_logger(&level, None) {
        eprintln!("{}", err);
    }
    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [] => {
            for example in 0..6 {
                println!("\n__________ example {} __________", example);
                validation_examples(example);
            }
        }
        [text] => println!("{}", validate_text(text, None)),
        [text, target, ..] => println!("{}", validate_text(text, Some(target.as_str()))),
    }
}
