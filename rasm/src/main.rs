#[macro_use]
extern crate clap;

use clap::Arg;
use rasm::Shared;
use std::path::PathBuf;
use std::process;

fn main() {
    // Parse command line arguments.
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Base names of the source files to assemble, without the .as extension")
                .required(true)
                .multiple(true)
                .index(1),
        )
        .get_matches();

    let mut failed = false;

    for basename in matches.values_of("INPUT").unwrap() {
        if let Err(err) = assemble(basename) {
            eprintln!("{}: assembly failed: {}", basename, err);
            failed = true;
        }
    }

    if failed {
        process::exit(1);
    }
}

/// Appends an extension to a base name. The base name may contain dots, so
/// this never replaces anything.
fn with_suffix(basename: &str, extension: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", basename, extension))
}

/// Runs the full pipeline for one base name: expand macros into the `.am`
/// file, then translate it in two passes.
fn assemble(basename: &str) -> rasm::Result<()> {
    let amfile = with_suffix(basename, "am");

    rasm::preprocess_file(&with_suffix(basename, "as"), &amfile)?;

    let mut shared = Shared::new();
    rasm::firstpass_file(&amfile, &mut shared)?;

    rasm::secondpass_file(
        &amfile,
        &with_suffix(basename, "ob"),
        &with_suffix(basename, "ent"),
        &with_suffix(basename, "ext"),
        &mut shared,
    )?;

    Ok(())
}
