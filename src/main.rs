//! `libtojson <in.lib> <out.json>`: parse a Liberty file and write its
//! JSON projection.

use std::{env, fs, io, process};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: libtojson <in.lib> <out.json>");
        process::exit(2);
    }
    if let Err(message) = run(&args[1], &args[2]) {
        eprintln!("{}", message);
        process::exit(1);
    }
}

fn run(input_path: &str, output_path: &str) -> Result<(), String> {
    let text =
        fs::read_to_string(input_path).map_err(|err| format!("{}: {}", input_path, err))?;
    let library =
        liberty_tojson::parse(&text).map_err(|err| format!("{}: {}", input_path, err))?;
    let output =
        fs::File::create(output_path).map_err(|err| format!("{}: {}", output_path, err))?;
    library
        .to_json(io::BufWriter::new(output))
        .map_err(|err| format!("{}: {}", output_path, err))
}
