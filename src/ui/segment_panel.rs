use std::path::PathBuf;

use eframe::egui;

use crate::types::segment::{Segment, SegmentStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum SegmentAction {
    Play(String),
    /// Put the segment's audio on the emcee channel
    Place(String),
    /// Local audio file picked for the timeline
    ImportAudio(PathBuf),
    Edit { id: String, content: String },
    /// Local audio file recorded or generated for a segment
    AttachAudio { id: String, path: PathBuf },
}

/// Script text being edited in the panel.
#[derive(Debug, Clone, Default)]
pub struct SegmentDraft {
    pub segment_id: String,
    pub content: String,
}

fn pick_audio() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Audio", &["mp3", "wav", "ogg", "flac", "m4a"])
        .pick_file()
}

fn status_color(status: SegmentStatus) -> egui::Color32 {
    match status {
        SegmentStatus::Generated => egui::Color32::from_rgb(120, 200, 120),
        SegmentStatus::Generating => egui::Color32::from_rgb(230, 190, 90),
        SegmentStatus::Failed => egui::Color32::from_rgb(220, 90, 90),
        SegmentStatus::Draft | SegmentStatus::Editing => egui::Color32::GRAY,
    }
}

/// Script segments in order, with play and placement buttons.
pub fn segment_panel(
    ui: &mut egui::Ui,
    segments: &[Segment],
    active_segment: Option<&str>,
    draft: &mut Option<SegmentDraft>,
) -> Option<SegmentAction> {
    let mut action = None;
    ui.vertical(|ui| {
        ui.heading("Script");
        ui.separator();

        if ui.button("Import Audio").clicked() {
            if let Some(path) = pick_audio() {
                action = Some(SegmentAction::ImportAudio(path));
            }
        }
        ui.add_space(4.0);

        if segments.is_empty() {
            ui.label("No segments");
            return;
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            for segment in segments {
                let is_active = active_segment == Some(segment.id.as_str());
                let playable = segment.playable_url().is_some();
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let title = egui::RichText::new(format!("#{}", segment.order + 1)).strong();
                        ui.label(if is_active {
                            title.color(egui::Color32::YELLOW)
                        } else {
                            title
                        });
                        ui.label(
                            egui::RichText::new(format!("{:?}", segment.status))
                                .size(10.0)
                                .color(status_color(segment.status)),
                        );
                        if let Some(duration) = segment.duration {
                            ui.label(egui::RichText::new(format!("{:.1}s", duration)).size(10.0));
                        }
                    });
                    let editing = draft.as_ref().is_some_and(|d| d.segment_id == segment.id);
                    if editing {
                        let mut save = false;
                        let mut cancel = false;
                        if let Some(d) = draft.as_mut() {
                            ui.add(egui::TextEdit::multiline(&mut d.content).desired_rows(3));
                            ui.horizontal(|ui| {
                                save = ui.button("Save").clicked();
                                cancel = ui.button("Cancel").clicked();
                            });
                        }
                        if save {
                            if let Some(d) = draft.take() {
                                action = Some(SegmentAction::Edit {
                                    id: d.segment_id,
                                    content: d.content,
                                });
                            }
                        } else if cancel {
                            *draft = None;
                        }
                        return;
                    }
                    ui.add(egui::Label::new(egui::RichText::new(&segment.content).size(11.0)).truncate());
                    ui.horizontal(|ui| {
                        if ui.add_enabled(playable, egui::Button::new("▶")).clicked() {
                            action = Some(SegmentAction::Play(segment.id.clone()));
                        }
                        if ui
                            .add_enabled(playable, egui::Button::new("Place"))
                            .on_hover_text("Add to the emcee channel")
                            .clicked()
                        {
                            action = Some(SegmentAction::Place(segment.id.clone()));
                        }
                        let can_edit = segment.status != SegmentStatus::Generating;
                        if ui.add_enabled(can_edit, egui::Button::new("Edit")).clicked() {
                            *draft = Some(SegmentDraft {
                                segment_id: segment.id.clone(),
                                content: segment.content.clone(),
                            });
                        }
                        if !playable
                            && ui
                                .button("Attach")
                                .on_hover_text("Use a local audio file for this segment")
                                .clicked()
                        {
                            if let Some(path) = pick_audio() {
                                action = Some(SegmentAction::AttachAudio {
                                    id: segment.id.clone(),
                                    path,
                                });
                            }
                        }
                    });
                });
            }
        });
    });
    action
}
