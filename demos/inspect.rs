use psg_importer::corpus;
use psg_importer::{load, STAGE_NAMES};
use std::env;
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <recording_directory_or_dataset_root>", args[0]);
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    if corpus::find_recordings(path)?.is_empty() {
        let sample = load(path)?;
        print_summary(&sample);
    } else {
        let report = corpus::load_all(path, None)?;
        for sample in &report.samples {
            print_summary(sample);
        }
        for (dir, e) in &report.failures {
            println!("✗ {}: {}", dir.display(), e);
        }
        println!(
            "\n{} of {} recordings loaded",
            report.samples.len(),
            report.attempted()
        );
    }

    Ok(())
}

fn print_summary(sample: &psg_importer::Sample) {
    println!("\nRecording: {}", sample.name().unwrap_or("?"));
    println!("  Samples: {} at {} Hz", sample.len(), sample.sample_rate());
    println!("  Duration: {:.1} hours", sample.duration() / 3600.0);

    match (sample.arousal(), sample.stages()) {
        (Some(arousal), Some(stages)) => {
            let scored = arousal.iter().filter(|&&v| v >= 0).count();
            let present = arousal.iter().filter(|&&v| v == 1).count();
            println!("  Arousal: {} of {} samples scored, {} present", scored, arousal.len(), present);

            let mut counts = [0usize; STAGE_NAMES.len()];
            for &stage in stages.iter() {
                counts[stage as usize] += 1;
            }
            for (name, count) in STAGE_NAMES.iter().zip(counts) {
                println!("    {:<10} {:>6.2}%", name, 100.0 * count as f64 / stages.len().max(1) as f64);
            }
        }
        _ => println!("  No annotations (test recording)"),
    }
}
