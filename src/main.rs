use cncsend::{console, engine_config, init_logging, load_config, tick_scheduler};
use cncsend::{ProjectFiles, StreamingEngine, SystemPorts};
use std::path::PathBuf;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional config file path as the only argument
    let config = load_config(std::env::args_os().nth(1).map(PathBuf::from))?;
    init_logging(&config.logging)?;

    let mut engine = StreamingEngine::new(
        engine_config(&config),
        Box::new(SystemPorts),
        Box::new(ProjectFiles::new(config.files.project_root.clone())),
    );
    let handle = engine.handle();
    let scheduler = tick_scheduler(&config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ticker = tokio::spawn(async move {
        scheduler.run(&mut engine, shutdown_rx).await;
        engine
    });

    println!("{}", console::HELP);
    tokio::select! {
        _ = console::run(console::stdin_lines(), handle) => {}
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
    }

    let _ = shutdown_tx.send(true);
    let mut engine = ticker.await?;
    engine.reset();
    tracing::info!("Shut down");

    Ok(())
}
