use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use rhyme::config::PlayerConfig;
use rhyme::player::PlaybackCoordinator;
use rhyme::player::gst_backend::GstBackend;
use rhyme::types::project::Project;
use rhyme::types::track::{Channel, TrackKind};
use rhyme::ui::app::RhymeApp;

const DEFAULT_CONFIG: &str = "rhyme.yaml";

fn config_path() -> PathBuf {
    std::env::var_os("RHYME_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG))
}

fn empty_project() -> Project {
    let mut project = Project::new("Untitled Presentation");
    for kind in [TrackKind::Emcee, TrackKind::Background, TrackKind::Effects] {
        project.timeline.add_channel(Channel::new(kind.label(), kind));
    }
    project
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = config_path();
    let config = PlayerConfig::load(&config_path);
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            log::warn!("Could not write default config: {:#}", e);
        }
    }

    let project_path = std::env::args_os().nth(1).map(PathBuf::from);
    let project = match &project_path {
        Some(path) => Project::load_from_file(path)
            .with_context(|| format!("Failed to open project {:?}", path))?,
        None => empty_project(),
    };
    log::info!(
        "Loaded {:?}: {} segments, {} clips",
        project.name,
        project.segments.len(),
        project.timeline.clips.len()
    );

    let backend = GstBackend::new().context("Failed to initialise GStreamer")?;
    let coordinator = PlaybackCoordinator::new(Box::new(backend), config);
    let app = RhymeApp::new(project, project_path, coordinator);

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "RhymeAI Playground",
        native_options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow!("{}", e))
}
