use std::path::PathBuf;

use clap::{Parser, Subcommand};

use stepdoc::blocks::FsPhotoSource;
use stepdoc::pdf::layout::PageGeometry;
use stepdoc::session::Session;
use stepdoc::{snapshot, Error};

#[derive(Parser)]
#[command(name = "stepdoc", version, about = "Process recorder PDF export")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a summary of a saved process snapshot.
    Show { snapshot: PathBuf },
    /// Finalize a snapshot and export it as a paginated PDF.
    Export {
        snapshot: PathBuf,
        /// Directory the PDF is written into.
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Resolve photo references relative to this directory.
        #[arg(long)]
        photos_root: Option<PathBuf>,
    },
}

fn run() -> Result<(), Error> {
    let cli = Cli::parse();

    match cli.command {
        Command::Show { snapshot } => {
            let record = snapshot::load_from_path(&snapshot)?;
            println!("{} (v{})", record.name, record.version);
            println!("created: {}", record.created_at.format("%Y-%m-%d %H:%M"));
            for step in &record.steps {
                let marker = if step.done { "x" } else { " " };
                println!(
                    "  [{marker}] step {}: {} photo(s), {} text line(s)",
                    step.index,
                    step.photos.len(),
                    step.texts.len(),
                );
            }
        }
        Command::Export {
            snapshot,
            out,
            photos_root,
        } => {
            let record = snapshot::load_from_path(&snapshot)?;
            let source = match photos_root {
                Some(root) => FsPhotoSource::with_root(root),
                None => FsPhotoSource::new(),
            };
            let mut session = Session::from_record(record);
            session.finalize()?;
            let path = session.export_to_dir(&source, &PageGeometry::a4(), &out)?;
            println!("wrote {}", path.display());
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
