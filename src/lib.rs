pub mod blocks;
mod error;
mod fonts;
pub mod model;
pub mod pdf;
pub mod session;
pub mod snapshot;

pub use error::Error;

use std::path::Path;
use std::time::Instant;

use blocks::PhotoSource;
use model::ProcessRecord;
use pdf::layout::PageGeometry;

/// Render a record straight to a PDF file. This is the low-level path; it
/// does not enforce the finalize-before-export gate — use
/// [`session::Session`] for the guided flow.
pub fn export_process_to_pdf(
    record: &ProcessRecord,
    source: &dyn PhotoSource,
    geom: &PageGeometry,
    output: &Path,
) -> Result<(), Error> {
    let t0 = Instant::now();

    let bytes = pdf::render(record, source, geom)?;
    let t_render = t0.elapsed();

    std::fs::write(output, &bytes)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: render={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_render.as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(())
}
