//! Generate a sample certificate from a template.
//!
//! Usage: cargo run --example sample_certificate -- [template.pdf]

use certificate_overlay_core::{CertificateGenerator, CertificateRequest, CertificateConfig};
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let template_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("modelo.pdf"), PathBuf::from);

    let generator = CertificateGenerator::new(CertificateConfig::load())?;
    let completion_date = chrono::Local::now()
        .format(&generator.config().date_format)
        .to_string();

    let request = CertificateRequest::new(
        "Gedeon da Conceição Cordeiro",
        [
            ("Introdução à Informática", 40_u32),
            ("Redes de Computadores", 60),
            ("Programação em Python", 30),
        ],
        completion_date,
    );

    let output_dir = PathBuf::from("certificados");
    std::fs::create_dir_all(&output_dir)?;
    let output_path = output_dir.join("certificado_final.pdf");

    let summary = generator.generate(&request, &template_path, &output_path)?;

    println!(
        "Certificate merged onto the first page: {} ({} pages)",
        output_path.display(),
        summary.page_count
    );

    Ok(())
}
