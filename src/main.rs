use std::{fs, path::PathBuf};

use clap::Parser;
use miette::{IntoDiagnostic, Result, WrapErr};

#[derive(Debug, Parser)]
#[clap(about = "Parse protocol buffers schema files and print their syntax trees")]
pub struct Args {
    #[clap(value_name = "PROTO_FILES", required = true, value_parser)]
    files: Vec<PathBuf>,
    /// Only check that the files parse, without printing anything.
    #[clap(short = 'c', long = "check")]
    check: bool,
}

pub fn main() -> Result<()> {
    miette::set_panic_hook();
    env_logger::init();

    let args = Args::parse();
    for path in &args.files {
        let source = fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read '{}'", path.display()))?;

        log::info!("parsing '{}'", path.display());
        let schema = proto_idl::parse_named(&path.display().to_string(), &source)?;
        if !args.check {
            println!("{:#?}", schema);
        }
    }
    Ok(())
}
