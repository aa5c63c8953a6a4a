mod cli;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use samt_core::DiagnosticController;
use samt_lib::{compile, LinterConfig};

use cli::{Cli, ColorChoice, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Compile { files, color } => run_compile(files, color),
    }
}

fn run_compile(files: Vec<PathBuf>, color: ColorChoice) -> ExitCode {
    let started = Instant::now();
    let mut controller = DiagnosticController::new();

    let mut sources = Vec::with_capacity(files.len());
    for path in files {
        match fs::read_to_string(&path) {
            Ok(content) => sources.push((path.display().to_string(), content)),
            Err(err) => controller
                .report_global_error(format!("could not read '{}': {err}", path.display())),
        }
    }

    let _model = compile(sources, &LinterConfig::default(), &mut controller);

    let printer = controller.printer().colored(color.should_colorize());
    print!("{}", printer.render());
    println!("{}", printer.render_summary(started.elapsed().as_millis()));

    if controller.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
