use std::path::{Path, PathBuf};

use axum::Router;
use bubblechart::generate::Job;
use notify::{Event, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tower_http::services::ServeDir;
use tower_livereload::LiveReloadLayer;
use tracing::{debug, error, info};

/// Whether a change event touches one of the files the chart is built from
fn touches(event: &Event, watched: &[PathBuf]) -> bool {
    event.paths.iter().any(|p| {
        p.file_name()
            .is_some_and(|name| watched.iter().any(|w| w.file_name() == Some(name)))
    })
}

/// Directories to watch so that edits to `files` are seen
fn watch_dirs(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    for file in files {
        let dir = match file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    dirs
}

/// Start the development server with hot reload
pub async fn serve(job: Job, port: u16) -> anyhow::Result<()> {
    let output: &Path = &job.output;

    // Generate initial chart
    let outcome = job.run()?;
    println!(
        "Generated '{}' ({} bubbles) in {}",
        outcome.title,
        outcome.bubbles,
        output.display()
    );

    // Create channel for file change notifications
    let (tx, mut rx) = mpsc::channel::<()>(1);

    let watched: Vec<PathBuf> = job
        .watched_files()
        .into_iter()
        .map(Path::to_path_buf)
        .collect();
    let filter = watched.clone();
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
        if let Ok(event) = res {
            if (event.kind.is_modify() || event.kind.is_create()) && touches(&event, &filter) {
                // Notify the regeneration task
                let _ = tx.blocking_send(());
            }
        }
    })?;
    for dir in watch_dirs(&watched) {
        debug!(dir = %dir.display(), "watching");
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    }

    // Spawn regeneration task
    let regen_job = job.clone();
    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            // Debounce: wait a bit for rapid changes to settle
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

            // Drain any additional notifications
            while rx.try_recv().is_ok() {}

            // Layout is CPU-bound; keep it off the async workers
            let job = regen_job.clone();
            match tokio::task::spawn_blocking(move || job.run()).await {
                Ok(Ok(outcome)) => {
                    info!(ticks = outcome.ticks, "regenerated chart");
                    println!("Regenerated chart ({} bubbles)", outcome.bubbles);
                }
                Ok(Err(e)) => eprintln!("Error regenerating: {e}"),
                Err(e) => error!("regeneration task failed: {e}"),
            }
        }
    });

    // Create live reload layer
    let livereload = LiveReloadLayer::new();
    let reloader = livereload.reloader();

    // Set up file watcher for output directory to trigger browser reload
    let mut output_watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
        if let Ok(event) = res {
            if event.kind.is_modify() || event.kind.is_create() {
                reloader.reload();
            }
        }
    })?;
    output_watcher.watch(output, RecursiveMode::Recursive)?;

    // Build the router
    let app = Router::new()
        .fallback_service(ServeDir::new(output))
        .layer(livereload);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("Development server running at http://localhost:{port}");
    for file in &watched {
        println!("Watching {} for changes...", file.display());
    }
    println!("Press Ctrl+C to stop");

    // Keep watchers alive
    let _watcher = watcher;
    let _output_watcher = output_watcher;

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::EventKind;
    use notify::event::{CreateKind, ModifyKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn only_watched_files_trigger() {
        let watched = vec![PathBuf::from("data/flights.csv"), PathBuf::from("chart.yaml")];
        let modify = || EventKind::Modify(ModifyKind::Any);

        assert!(touches(&event(modify(), "/home/me/data/flights.csv"), &watched));
        assert!(touches(
            &event(EventKind::Create(CreateKind::File), "/home/me/chart.yaml"),
            &watched
        ));
        assert!(!touches(&event(modify(), "/home/me/data/other.csv"), &watched));
        assert!(!touches(&event(modify(), "/home/me/output/index.html"), &watched));
    }

    #[test]
    fn watch_dirs_deduplicates_parents() {
        let files = vec![
            PathBuf::from("data/flights.csv"),
            PathBuf::from("data/chart.yaml"),
            PathBuf::from("flights.csv"),
        ];
        assert_eq!(
            watch_dirs(&files),
            vec![PathBuf::from("data"), PathBuf::from(".")]
        );
    }
}
