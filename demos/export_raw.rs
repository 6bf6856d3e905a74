use psg_importer::load;
use std::env;
use std::error::Error;

// Writes the waveform viewer stream for one recording.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <recording_directory> <output_file> [stride]", args[0]);
        std::process::exit(1);
    }

    let mut sample = load(&args[1])?;
    if let Some(stride) = args.get(3) {
        sample.downsample(stride.parse()?)?;
    }

    sample.export_raw(&args[2])?;
    println!(
        "Wrote {} samples x 15 columns to {}",
        sample.len(),
        args[2]
    );

    Ok(())
}
