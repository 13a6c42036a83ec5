use clap::{Arg, ArgMatches, Command as ClapCommand};
use std::{fs, io, process};

mod ast;
mod error;
mod heap;
mod input;
mod interpreter;
mod lexer;
mod line_reader;
mod parser;
mod value;

use error::error_formatting;
use input::{Input, Source};
use interpreter::Interpreter;
use line_reader::{LineReadStatus, LineReader};
use value::Closure;

const HISTORY_FILE: &str = ".mython-history.txt";

fn get_input(matches: &ArgMatches) -> Option<Input> {
    if let Some(input_file) = matches.get_one::<String>("input") {
        match fs::read_to_string(input_file) {
            Ok(content) => {
                return Some(Input {
                    source: Source::File(input_file.to_string()),
                    content,
                });
            }
            Err(err) => {
                println!("Error reading {}: {}", input_file, err);
                process::exit(-1);
            }
        }
    }

    None
}

fn run_file(input: &Input) {
    let stmts = match parser::parse(&input.content) {
        Ok(stmts) => stmts,
        Err(err) => {
            error_formatting::format_parse_error(&err, input);
            process::exit(1);
        }
    };

    let mut stdout = io::stdout();
    let mut interp = Interpreter::new(&mut stdout);
    let mut globals = Closure::new();
    if let Err(err) = interp.interpret(&stmts, &mut globals) {
        error_formatting::format_runtime_error(&err, input);
        process::exit(1);
    }
}

// A line ending in ':' opens a block; continuation lines are collected
// until a blank line closes the entry.
fn read_entry(reader: &mut LineReader) -> Option<String> {
    let first = match reader.readline(">>> ") {
        LineReadStatus::Line(line) => line,
        LineReadStatus::Done => return None,
    };
    let mut source = first.clone();
    source.push('\n');
    if !first.trim_end().ends_with(':') {
        return Some(source);
    }
    loop {
        match reader.readline("... ") {
            LineReadStatus::Line(line) => {
                if line.trim().is_empty() {
                    break;
                }
                source.push_str(&line);
                source.push('\n');
            }
            LineReadStatus::Done => break,
        }
    }
    Some(source)
}

// Interactive session: definitions accumulate in one closure and one heap
// until the user leaves.
fn repl() {
    println!("mython {}", env!("CARGO_PKG_VERSION"));
    let mut reader = LineReader::new(HISTORY_FILE);
    let mut stdout = io::stdout();
    let mut interp = Interpreter::new(&mut stdout);
    let mut globals = Closure::new();

    while let Some(source) = read_entry(&mut reader) {
        if source.trim().is_empty() {
            continue;
        }
        let input = Input {
            source: Source::Literal,
            content: source,
        };
        match parser::parse(&input.content) {
            Ok(stmts) => {
                if let Err(err) = interp.interpret(&stmts, &mut globals) {
                    error_formatting::format_runtime_error(&err, &input);
                }
            }
            Err(err) => error_formatting::format_parse_error(&err, &input),
        }
    }
}

fn main() {
    let matches = ClapCommand::new("mython")
        .version("0.1.0")
        .about("mython language interpreter")
        .arg(
            Arg::new("input")
                .help("sets input file to use")
                .required(false)
                .index(1),
        )
        .get_matches();

    match get_input(&matches) {
        Some(input) => run_file(&input),
        None => repl(),
    }
}
