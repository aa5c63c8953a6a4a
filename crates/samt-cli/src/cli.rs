use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn should_colorize(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

#[derive(Parser)]
#[command(name = "samt", bin_name = "samt")]
#[command(about = "Compiler for the SAMT interface-definition language")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compile source files and report every diagnostic found
    #[command(after_help = r#"EXAMPLES:
  samt compile api.samt
  samt compile model/*.samt --color never"#)]
    Compile {
        /// Source files to compile
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,

        /// When to colorize diagnostic output
        #[arg(long, value_name = "WHEN", default_value = "auto")]
        color: ColorChoice,
    },
}
