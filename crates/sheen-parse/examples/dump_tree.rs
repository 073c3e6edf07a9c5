//! Print the tokens and the parsed tree of a stylesheet read from stdin.
//!
//! `cargo run -p sheen-parse --example dump_tree [--tolerant] < style.css`

use std::io::Read;

use sheen_parse::{ParseOptions, parse};
use sheen_tokenizer::Tokenizer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut source = String::new();
    std::io::stdin().read_to_string(&mut source)?;
    let tolerant = std::env::args().any(|arg| arg == "--tolerant");

    println!("=== Tokens ===");
    let mut tokenizer = if tolerant {
        Tokenizer::tolerant(&source)
    } else {
        Tokenizer::new(&source)
    };
    while let Some(token) = tokenizer.next_token()? {
        println!("{token:?}");
    }

    println!("\n=== Tree ===");
    let options = if tolerant {
        ParseOptions::new().tolerant()
    } else {
        ParseOptions::new()
    };
    match parse(&source, &options) {
        Ok(tree) => {
            println!("{:#}", tree.to_json(tree.root()));
            for recovery in tree.recoveries() {
                eprintln!("repaired at {}: {}", recovery.position, recovery.message);
            }
        }
        Err(err) => eprint!("{}", err.render(&source)),
    }
    Ok(())
}
