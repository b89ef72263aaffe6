use anyhow::Context;
use eca::config::ConfigManager;
use eca::Optimizer;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "eca.toml".to_string());
    let manager = ConfigManager::new();
    manager
        .load_from_file(&path)
        .with_context(|| format!("Failed to load configuration from {}", path))?;

    let report = Optimizer::new(manager.get()?)?.run()?;

    for variant in &report.variants {
        match variant.elapsed {
            Some(t) => println!("{:<14} {:>12.6}s", variant.name, t),
            None => println!("{:<14} {:>13} (exit {:?})", variant.name, "failed", variant.exit_code),
        }
    }
    if let Some(hotspots) = &report.hotspots {
        let names: Vec<&str> = hotspots.entries().iter().map(|h| h.function.as_str()).collect();
        println!("Hotspots: {}", names.join(", "));
    }

    match (&report.best_source, report.best_time) {
        (Some(source), Some(best)) => {
            println!("Best time: {:.6}s", best);
            if let Some(speedup) = report.speedup() {
                println!("Speedup over original: {:.2}x", speedup);
            }
            println!("\n{}", source);
        }
        _ => println!("No candidate produced a valid measurement"),
    }
    Ok(())
}
