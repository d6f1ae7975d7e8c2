use cvtrack::{Dataset, EvalConfig, Evaluator};
use tracing_subscriber::EnvFilter;

// usage: evaluate <config.json | default> <dataset dir>...
fn main() -> Result<(), cvtrack::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next().as_deref() {
        None | Some("default") => EvalConfig::default(),
        Some(path) => EvalConfig::from_path(path)?,
    };

    let datasets = args
        .map(Dataset::load_dir)
        .collect::<Result<Vec<_>, _>>()?;

    if datasets.is_empty() {
        eprintln!("usage: evaluate <config.json | default> <dataset dir>...");
        return Ok(());
    }

    let evaluator = Evaluator::new(config)?;
    let summary = evaluator.evaluate_run(&datasets)?;

    for report in &summary.reports {
        println!(
            "{:<24} windows {:>6} skipped {:>4}  ADE {:.4}  FDE {:.4}",
            report.name, report.windows, report.skipped, report.ade, report.fde
        );
    }

    for name in &summary.excluded {
        println!("{:<24} excluded: no qualifying windows", name);
    }

    println!("{:<24} ADE {:.4}  FDE {:.4}", "average", summary.ade, summary.fde);

    if evaluator.config().keep_trajectories {
        for report in &summary.reports {
            let path = format!("{}.trajectories.json", report.name);
            let bundles: Vec<_> = report.bundles().collect();
            std::fs::write(&path, serde_json::to_string(&bundles)?)?;
            println!("wrote {}", path);
        }
    }

    Ok(())
}
