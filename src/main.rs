use nucleseg::config::run::load_config;
use nucleseg::stack::io::write_json_file;
use nucleseg::{run_batch, BatchSummary};
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let options = config.batch_options();
    let params = config.segmentation_params();
    let summary = run_batch(&options, &params).map_err(|e| e.to_string())?;

    print_text_summary(&summary);
    if let Some(path) = &config.report_json {
        write_json_file(path, &summary)?;
        println!("JSON report written to {}", path.display());
    }
    Ok(())
}

fn usage() -> String {
    "Usage: nucleseg <config.json>".to_string()
}

fn print_text_summary(summary: &BatchSummary) {
    println!(
        "{} stacks discovered, {} masks written, {} failed",
        summary.discovered,
        summary.written,
        summary.failed.len()
    );
    for report in &summary.images {
        if let Some(output) = &report.output {
            let note = if report.degenerate {
                " [degenerate: no foreground]"
            } else {
                ""
            };
            println!(
                "  {} -> {} ({} objects, {} removed){note}",
                report.input.display(),
                output.display(),
                report.objects_kept,
                report.removed.len()
            );
        }
    }
    for failure in &summary.failed {
        println!(
            "  FAILED {} at {:?}: {}",
            failure.input.display(),
            failure.stage,
            failure.cause
        );
    }
}
