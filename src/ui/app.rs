use std::path::{Path, PathBuf};
use std::time::Instant;

use eframe::egui;

use crate::player::gst_backend::probe_duration;
use crate::player::{NoticeKind, PlaybackCoordinator};
use crate::renderer::timeline_view::TimelineView;
use crate::types::media::AudioClip;
use crate::types::playback_state::PlayerPhase;
use crate::types::project::Project;
use crate::ui::segment_panel::{SegmentAction, SegmentDraft, segment_panel};
use crate::ui::timeline_widget::{TimelineEvent, TimelineWidget, format_time};

const RATES: [f64; 6] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

pub struct RhymeApp {
    project: Project,
    project_path: Option<PathBuf>,
    coordinator: PlaybackCoordinator,
    view: TimelineView,
    /// Timeline clip driving the transport, if playback came from the timeline
    active_clip: Option<AudioClip>,
    /// Playhead shown while nothing on the timeline is bound
    idle_playhead: f64,
    draft: Option<SegmentDraft>,
    status: Option<String>,
}

impl RhymeApp {
    pub fn new(
        project: Project,
        project_path: Option<PathBuf>,
        mut coordinator: PlaybackCoordinator,
    ) -> Self {
        coordinator.bind_segments(project.ordered_segments());
        coordinator.set_on_next_segment(Box::new(|id| {
            log::info!("Auto-advancing to segment {}", id);
        }));
        Self {
            project,
            project_path,
            coordinator,
            view: TimelineView::default(),
            active_clip: None,
            idle_playhead: 0.0,
            draft: None,
            status: None,
        }
    }

    fn rebind_segments(&mut self) {
        self.coordinator.bind_segments(self.project.ordered_segments());
    }

    fn channel_gain_of(&self, clip: &AudioClip) -> f64 {
        self.project.timeline.channel_gain(&clip.channel_id) as f64
    }

    /// Pushes mute, solo and volume of every channel to whatever is sounding.
    fn apply_channel_gains(&mut self) {
        let sounding: Vec<(String, f64)> = self
            .project
            .timeline
            .clips
            .iter()
            .filter(|c| self.coordinator.bound_id() == Some(c.id.as_str()) || self.coordinator.has_layer(&c.id))
            .map(|c| (c.id.clone(), self.channel_gain_of(c)))
            .collect();
        for (id, gain) in sounding {
            self.coordinator.set_gain(&id, gain);
        }
    }

    /// Timeline time of the transport playhead.
    fn playhead(&self) -> f64 {
        let current = self.coordinator.transport().current_time;
        let bound = self.coordinator.bound_id();
        if let Some(clip) = self.active_clip.as_ref().filter(|c| Some(c.id.as_str()) == bound) {
            return clip.start_time + current;
        }
        // A segment placed on the timeline follows its clip.
        if let Some(clip) = bound.and_then(|id| {
            self.project
                .timeline
                .clips
                .iter()
                .find(|c| c.segment_id.as_deref() == Some(id))
        }) {
            return clip.start_time + current;
        }
        self.idle_playhead
    }

    fn open_project(&mut self, path: &Path) {
        match Project::load_from_file(path) {
            Ok(project) => {
                self.coordinator.bind_segments(project.ordered_segments());
                self.project = project;
                self.project_path = Some(path.to_path_buf());
                self.active_clip = None;
                self.idle_playhead = 0.0;
                self.status = Some(format!("Opened {}", path.display()));
            }
            Err(e) => {
                log::warn!("Failed to open {:?}: {}", path, e);
                self.status = Some(format!("Could not open project: {}", e));
            }
        }
    }

    fn save_project(&mut self, path: PathBuf) {
        match self.project.save_to_file(&path) {
            Ok(()) => {
                self.status = Some(format!("Saved {}", path.display()));
                self.project_path = Some(path);
            }
            Err(e) => {
                log::warn!("Failed to save {:?}: {}", path, e);
                self.status = Some(format!("Could not save project: {}", e));
            }
        }
    }

    fn handle_segment_action(&mut self, action: SegmentAction) {
        match action {
            SegmentAction::Play(id) => {
                self.active_clip = None;
                self.coordinator.play_segment(&id);
            }
            SegmentAction::Place(id) => {
                let Some(channel_id) = self.project.timeline.primary_channel().map(|c| c.id.clone())
                else {
                    self.status = Some("Add a channel first".to_string());
                    return;
                };
                let start = self.project.timeline.duration();
                if let Err(e) = self.project.place_segment(&id, &channel_id, start) {
                    self.status = Some(e.to_string());
                }
            }
            SegmentAction::ImportAudio(path) => self.import_audio(&path),
            SegmentAction::Edit { id, content } => {
                match self.project.edit_segment(&id, &content) {
                    Ok(removed) if removed > 0 => {
                        self.status = Some(format!("Removed {} stale clip(s)", removed));
                    }
                    Ok(_) => {}
                    Err(e) => self.status = Some(e.to_string()),
                }
                self.rebind_segments();
            }
            SegmentAction::AttachAudio { id, path } => {
                let url = path.to_string_lossy().to_string();
                let result = probe_duration(&url)
                    .map_err(|e| e.to_string())
                    .and_then(|duration| {
                        self.project
                            .attach_audio(&id, url, duration)
                            .map_err(|e| e.to_string())
                    });
                if let Err(e) = result {
                    self.status = Some(e);
                }
                self.rebind_segments();
            }
        }
    }

    fn import_audio(&mut self, path: &Path) {
        let Some(channel_id) = self.project.timeline.primary_channel().map(|c| c.id.clone()) else {
            self.status = Some("Add a channel first".to_string());
            return;
        };
        let url = path.to_string_lossy().to_string();
        let duration = match probe_duration(&url) {
            Ok(duration) => duration,
            Err(e) => {
                self.status = Some(e.to_string());
                return;
            }
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let start = self.project.timeline.duration();
        let result = AudioClip::new(channel_id, url, start, duration)
            .and_then(|clip| self.project.timeline.add_clip(clip.with_name(name)));
        if let Err(e) = result {
            self.status = Some(e.to_string());
        }
    }

    fn handle_timeline_event(&mut self, event: TimelineEvent) {
        match event {
            TimelineEvent::Seek(time) => self.seek_timeline(time),
            TimelineEvent::ClipActivated(clip_id) => {
                let Some(clip) = self.project.timeline.clip(&clip_id).cloned() else {
                    return;
                };
                let primary = self.project.timeline.primary_channel().map(|c| c.id.as_str());
                let gain = self.channel_gain_of(&clip);
                if primary == Some(clip.channel_id.as_str()) {
                    if self.coordinator.load_clip(&clip, gain) {
                        self.active_clip = Some(clip);
                    }
                } else if self.coordinator.has_layer(&clip.id) {
                    self.coordinator.stop_layer(&clip.id);
                } else {
                    let position = clip.in_point + (self.playhead() - clip.start_time).max(0.0);
                    self.coordinator
                        .play_layer(&clip.id, &clip.audio_url, gain, position);
                }
            }
            TimelineEvent::ClipMoved {
                clip_id,
                new_start_time,
            } => {
                if let Err(e) = self.project.timeline.move_clip(&clip_id, new_start_time) {
                    log::warn!("Move of {} rejected: {}", clip_id, e);
                }
                if let Some(active) = self.active_clip.as_mut().filter(|c| c.id == clip_id) {
                    active.start_time = new_start_time.max(0.0);
                }
            }
            TimelineEvent::ClipTrimmed {
                clip_id,
                new_duration,
            } => {
                if let Err(e) = self.project.timeline.trim_clip(&clip_id, new_duration) {
                    log::debug!("Trim of {} rejected: {}", clip_id, e);
                }
            }
            TimelineEvent::SplitAtPlayhead => {
                let playhead = self.playhead();
                let Some(channel_id) = self.project.timeline.primary_channel().map(|c| c.id.clone())
                else {
                    return;
                };
                if !self.project.timeline.split_clip_at_playhead(&channel_id, playhead) {
                    self.status = Some("No clip under the playhead".to_string());
                }
            }
            TimelineEvent::ToggleMute(channel_id) => {
                if let Some(channel) = self.project.timeline.channel_mut(&channel_id) {
                    channel.muted = !channel.muted;
                }
                self.apply_channel_gains();
            }
            TimelineEvent::ToggleSolo(channel_id) => {
                if let Some(channel) = self.project.timeline.channel_mut(&channel_id) {
                    channel.solo = !channel.solo;
                }
                self.apply_channel_gains();
            }
        }
    }

    /// Seeks inside the primary-channel clip under `time`, loading it first
    /// when another source is bound.
    fn seek_timeline(&mut self, time: f64) {
        let clip = self
            .project
            .timeline
            .primary_channel()
            .and_then(|c| self.project.timeline.clip_at(&c.id, time))
            .cloned();
        let Some(clip) = clip else {
            self.idle_playhead = time;
            return;
        };
        if self.coordinator.bound_id() != Some(clip.id.as_str()) {
            let gain = self.channel_gain_of(&clip);
            if !self.coordinator.load_clip(&clip, gain) {
                return;
            }
            self.active_clip = Some(clip.clone());
        }
        self.coordinator.seek(time - clip.start_time);
    }

    fn menu_bar(&mut self, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open...").clicked() {
                    ui.close_menu();
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Project", &["json"])
                        .pick_file()
                    {
                        self.open_project(&path);
                    }
                }
                if ui.button("Save").clicked() {
                    ui.close_menu();
                    let path = self.project_path.clone().or_else(|| {
                        rfd::FileDialog::new()
                            .add_filter("Project", &["json"])
                            .save_file()
                    });
                    if let Some(path) = path {
                        self.save_project(path);
                    }
                }
                if ui.button("Save As...").clicked() {
                    ui.close_menu();
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Project", &["json"])
                        .save_file()
                    {
                        self.save_project(path);
                    }
                }
            });
            ui.separator();
            ui.label(&self.project.name);
            if let Some(status) = &self.status {
                ui.separator();
                ui.label(egui::RichText::new(status).color(egui::Color32::GRAY));
            }
        });
    }

    fn notices(&mut self, ui: &mut egui::Ui) {
        let notices = self.coordinator.notices().to_vec();
        for notice in notices {
            ui.horizontal(|ui| {
                let color = match notice.kind {
                    NoticeKind::Dismissible => egui::Color32::from_rgb(220, 90, 90),
                    NoticeKind::InteractionPrompt => egui::Color32::from_rgb(230, 190, 90),
                    NoticeKind::Retryable => egui::Color32::from_rgb(230, 140, 60),
                };
                ui.colored_label(color, &notice.message);
                match (notice.kind, notice.target.as_deref()) {
                    (NoticeKind::Retryable, Some(target)) => {
                        if ui.button("Refresh").clicked() && self.coordinator.refresh_url(target) {
                            self.coordinator.dismiss_notice(notice.id);
                        }
                    }
                    (NoticeKind::InteractionPrompt, _) => {
                        if ui.button("Play").clicked() {
                            self.coordinator.toggle_play();
                            self.coordinator.dismiss_notice(notice.id);
                        }
                    }
                    _ => {}
                }
                if ui.small_button("✖").clicked() {
                    self.coordinator.dismiss_notice(notice.id);
                }
            });
        }
    }

    fn transport(&mut self, ui: &mut egui::Ui) {
        let phase = self.coordinator.phase();
        let transport = self.coordinator.transport().clone();
        let has_source = self.coordinator.bound_id().is_some();

        ui.horizontal(|ui| {
            if ui.add_enabled(has_source, egui::Button::new("⏪")).clicked() {
                self.coordinator.skip_backward();
            }
            let label = match phase {
                PlayerPhase::Loading => "…",
                PlayerPhase::Playing => "⏸",
                _ => "▶",
            };
            let can_toggle = has_source && phase != PlayerPhase::Loading;
            if ui.add_enabled(can_toggle, egui::Button::new(label)).clicked() {
                self.coordinator.toggle_play();
            }
            if ui.add_enabled(has_source, egui::Button::new("⏩")).clicked() {
                self.coordinator.skip_forward();
            }

            let duration = self.coordinator.duration().unwrap_or(0.0);
            let mut position = transport.current_time;
            let seek = egui::Slider::new(&mut position, 0.0..=duration.max(0.01))
                .show_value(false);
            if ui.add_enabled(has_source, seek).changed() {
                self.coordinator.seek(position);
            }
            ui.monospace(format!(
                "{} / {}",
                format_time(transport.current_time),
                format_time(duration)
            ));

            ui.separator();
            let mut volume = transport.volume;
            if ui
                .add(egui::Slider::new(&mut volume, 0.0..=100.0).text("Vol"))
                .changed()
            {
                self.coordinator.set_volume(volume);
            }

            let mut rate = transport.playback_rate;
            egui::ComboBox::from_id_salt("playback_rate")
                .selected_text(format!("{}x", rate))
                .show_ui(ui, |ui| {
                    for option in RATES {
                        ui.selectable_value(&mut rate, option, format!("{}x", option));
                    }
                });
            if rate != transport.playback_rate {
                self.coordinator.set_playback_rate(rate);
            }
        });
    }
}

impl eframe::App for RhymeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.coordinator.tick(Instant::now());

        egui::TopBottomPanel::top("menu_panel").show(ctx, |ui| {
            self.menu_bar(ui);
            if !self.coordinator.notices().is_empty() {
                ui.separator();
                self.notices(ui);
            }
        });

        egui::SidePanel::left("segment_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                let active = self.coordinator.transport().active_segment_id.clone();
                let segments = self.project.ordered_segments();
                if let Some(action) =
                    segment_panel(ui, &segments, active.as_deref(), &mut self.draft)
                {
                    self.handle_segment_action(action);
                }
            });

        egui::TopBottomPanel::bottom("transport_panel").show(ctx, |ui| {
            self.transport(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let playhead = self.playhead();
            let active = self.active_clip.as_ref().map(|c| c.id.clone());
            let events = TimelineWidget::new(&self.project.timeline, &mut self.view, playhead)
                .active_clip(active.as_deref())
                .show(ui);
            for event in events {
                self.handle_timeline_event(event);
            }
        });

        // Keep polling while a source is bound so telemetry and auto-advance run.
        if self.coordinator.bound_id().is_some() {
            ctx.request_repaint_after(self.coordinator.config().poll_interval());
        }
    }
}
