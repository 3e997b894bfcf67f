use std::error::Error;

use clap::Parser;
use cursed_handbook::handbook::handbook_content;
use cursed_handbook::palette::Palette;
use cursed_handbook::{DocumentDriver, DriverConfig, HandbookDecorator, StyleSheet};

/// Generates the Cursed Energy Handbook PDF in the current directory.
///
/// The content, page geometry and font paths are fixed. Missing fonts fall back to bundled or
/// system faces; set `RUST_LOG=warn` to see which one was used.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {}

fn main() {
    env_logger::init();
    let _cli = Cli::parse();

    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let palette = Palette::default();
    let sheet = StyleSheet::handbook(&palette);
    let blocks = handbook_content(&palette);

    let mut driver = DocumentDriver::new(DriverConfig::default(), HandbookDecorator::new(&palette));
    let document = driver.build(blocks, &sheet)?;
    log::debug!("Rendered {} pages", document.page_count);

    println!(
        "PDF generation complete. Output file: {}",
        document.path.display()
    );
    Ok(())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
