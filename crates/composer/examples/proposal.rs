//! Compose a proposal PDF from screenshots on disk
//!
//! ```text
//! cargo run -p composer --example proposal -- <font.ttf> <out.pdf> <image>...
//! ```
//!
//! Set `COMPOSER_LAYOUT` to a JSON file to override the layout, and
//! `RUST_LOG=debug` to see what gets embedded.

use composer::{compose_proposal, LayoutConfig, ProposalComments, ProposalFonts, ProposalPage};
use pdf_core::FileImage;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        eprintln!("usage: proposal <font.ttf> <out.pdf> <image>...");
        std::process::exit(2);
    }

    let config = match std::env::var_os("COMPOSER_LAYOUT") {
        Some(path) => LayoutConfig::from_file(path)?,
        None => LayoutConfig::default(),
    };

    let font_path = Path::new(&args[0]);
    let font_name = font_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("ProposalFont");
    let fonts = ProposalFonts::single(font_name, std::fs::read(font_path)?);

    let pages: Vec<ProposalPage> = args[2..]
        .iter()
        .map(|image| {
            let comments = ProposalComments::new(Some(format!("Screenshot: {image}")), None);
            ProposalPage::new(FileImage::new(image), comments)
        })
        .collect();

    let output = compose_proposal(&config, &fonts, &pages)?;
    for failure in &output.failed_images {
        eprintln!(
            "page {}: image {} skipped: {}",
            failure.page,
            failure.file_name.as_deref().unwrap_or("<unnamed>"),
            failure.reason
        );
    }

    std::fs::write(&args[1], &output.bytes)?;
    println!("wrote {} pages to {}", pages.len(), args[1]);
    Ok(())
}
