//! Convert one HTML file and list any engine warnings.
//!
//!   cargo run --example simple_convert -- page.html [out.pdf]

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use html2pdf::error::ConvertError;

fn main() -> ExitCode {
    let mut args = env::args_os().skip(1);
    let (Some(input), output, None) = (args.next(), args.next().map(PathBuf::from), args.next())
    else {
        eprintln!("usage: simple_convert <page.html> [out.pdf]");
        return ExitCode::from(2);
    };

    match html2pdf::convert(&input, output.as_deref()) {
        Ok(result) => {
            for warning in &result.warnings {
                eprintln!("warning: {warning}");
            }
            println!("{}", result.output.display());
            ExitCode::SUCCESS
        }
        Err(ConvertError::MissingEngine(hint)) => {
            eprintln!("install an engine first: {hint}");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
