use colored::*;

use crate::error::parser_error;
use crate::input::{Input, Source};
use crate::interpreter::InterpreterError;

fn format_source(input: &Input) {
    if let Source::File(filename) = &input.source {
        eprintln!("in {}", filename);
    }
}

pub fn format_parse_error(err: &parser_error::Error, input: &Input) {
    eprintln!(
        "mython: {}: {}",
        "parse error".red().bold(),
        err.to_string().white().bold(),
    );
    format_source(input);
}

pub fn format_runtime_error(err: &InterpreterError, input: &Input) {
    let InterpreterError::Runtime(what) = err;
    eprintln!(
        "mython: {}: {}",
        "runtime error".red().bold(),
        what.white().bold(),
    );
    format_source(input);
}
