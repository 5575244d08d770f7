use eframe::egui;

use crate::renderer::timeline_view::TimelineView;
use crate::types::timeline::Timeline;
use crate::ui::track_widget::{channel_header, clip_lane};

const CHANNEL_HEIGHT: f32 = 56.0;
const RULER_HEIGHT: f32 = 30.0;
const HEADER_WIDTH: f32 = 140.0;

#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent {
    /// Ruler clicked or dragged to a timeline time
    Seek(f64),
    ClipActivated(String),
    ClipMoved { clip_id: String, new_start_time: f64 },
    ClipTrimmed { clip_id: String, new_duration: f64 },
    /// Cut the primary-channel clip under the playhead in two
    SplitAtPlayhead,
    ToggleMute(String),
    ToggleSolo(String),
}

/// Read-only drawing of a [`Timeline`]. Edits come back as events so the
/// app decides what reaches the model and the coordinator.
pub struct TimelineWidget<'a> {
    timeline: &'a Timeline,
    view: &'a mut TimelineView,
    playhead: f64,
    active_clip: Option<&'a str>,
}

impl<'a> TimelineWidget<'a> {
    pub fn new(timeline: &'a Timeline, view: &'a mut TimelineView, playhead: f64) -> Self {
        Self {
            timeline,
            view,
            playhead,
            active_clip: None,
        }
    }

    pub fn active_clip(mut self, clip_id: Option<&'a str>) -> Self {
        self.active_clip = clip_id;
        self
    }

    pub fn show(&mut self, ui: &mut egui::Ui) -> Vec<TimelineEvent> {
        let mut events = Vec::new();

        ui.horizontal(|ui| {
            if ui.button("-").clicked() {
                self.view.set_zoom(self.view.zoom_level / 1.25);
            }
            ui.label(format!("Zoom {:.0}%", self.view.zoom_level * 100.0));
            if ui.button("+").clicked() {
                self.view.set_zoom(self.view.zoom_level * 1.25);
            }
            ui.separator();
            if ui.button("✂ Split").clicked() {
                events.push(TimelineEvent::SplitAtPlayhead);
            }
            ui.label(format!("Playhead {}", format_time(self.playhead)));
        });

        let channel_count = self.timeline.channels.len().max(1);
        let height = RULER_HEIGHT + channel_count as f32 * CHANNEL_HEIGHT;
        let (outer, response) = ui.allocate_exact_size(
            egui::vec2(ui.available_width(), height),
            egui::Sense::hover(),
        );

        // Ctrl + wheel zooms around the pointer, plain wheel scrolls.
        if response.hovered() {
            let (scroll, zoom, pointer) =
                ui.ctx().input(|i| (i.raw_scroll_delta, i.zoom_delta(), i.pointer.hover_pos()));
            if zoom != 1.0 {
                let anchor = pointer.map(|p| p.x - outer.left() - HEADER_WIDTH).unwrap_or(0.0);
                self.view.zoom_around(zoom, anchor.max(0.0));
            } else if scroll.x != 0.0 || scroll.y != 0.0 {
                self.view.scroll_by(-(scroll.x + scroll.y));
            }
        }

        let ruler_rect = egui::Rect::from_min_max(
            outer.left_top() + egui::vec2(HEADER_WIDTH, 0.0),
            egui::pos2(outer.right(), outer.top() + RULER_HEIGHT),
        );
        let lanes_rect = egui::Rect::from_min_max(
            outer.left_top() + egui::vec2(HEADER_WIDTH, RULER_HEIGHT),
            outer.right_bottom(),
        );

        let painter = ui.painter_at(outer);
        painter.rect_filled(outer, 0.0, ui.style().visuals.window_fill);
        self.draw_ruler(&painter, ruler_rect);

        let ruler_response = ui.interact(
            ruler_rect,
            ui.id().with("timeline_ruler"),
            egui::Sense::click_and_drag(),
        );
        if ruler_response.clicked() || ruler_response.dragged() {
            if let Some(pos) = ruler_response.interact_pointer_pos() {
                events.push(TimelineEvent::Seek(self.view.x_to_time(pos.x - ruler_rect.left())));
            }
        }

        let any_solo = self.timeline.any_solo();
        for (idx, channel) in self.timeline.channels.iter().enumerate() {
            let top = lanes_rect.top() + idx as f32 * CHANNEL_HEIGHT;
            let header_rect = egui::Rect::from_min_size(
                egui::pos2(outer.left(), top),
                egui::vec2(HEADER_WIDTH, CHANNEL_HEIGHT),
            );
            let lane_rect = egui::Rect::from_min_size(
                egui::pos2(lanes_rect.left(), top),
                egui::vec2(lanes_rect.width(), CHANNEL_HEIGHT),
            );

            painter.rect_filled(lane_rect, 0.0, ui.style().visuals.widgets.noninteractive.bg_fill);
            painter.line_segment(
                [lane_rect.left_bottom(), lane_rect.right_bottom()],
                egui::Stroke::new(1.0, ui.style().visuals.widgets.noninteractive.bg_stroke.color),
            );

            events.extend(channel_header(ui, header_rect, channel));
            let clips = self.timeline.clips_for_channel(&channel.id);
            let audible = channel.effective_gain(any_solo) > 0.0;
            events.extend(clip_lane(
                ui,
                lane_rect,
                channel,
                &clips,
                self.view,
                self.active_clip,
                audible,
            ));
        }

        self.draw_playhead(&painter, ruler_rect.union(lanes_rect));
        events
    }

    fn draw_ruler(&self, painter: &egui::Painter, ruler_rect: egui::Rect) {
        painter.rect_filled(ruler_rect, 0.0, egui::Color32::from_gray(40));

        let pixels_per_second = self.view.pixels_per_second();
        let (major, minor) = if pixels_per_second > 200.0 {
            (1.0, 0.1)
        } else if pixels_per_second > 50.0 {
            (5.0, 1.0)
        } else {
            (10.0, 5.0)
        };
        let start = self.view.x_to_time(0.0);
        let end = self.view.x_to_time(ruler_rect.width());

        let mut time = (start / minor).floor() * minor;
        while time <= end {
            let x = ruler_rect.left() + self.view.time_to_x(time);
            if x >= ruler_rect.left() {
                painter.line_segment(
                    [
                        egui::pos2(x, ruler_rect.bottom() - 5.0),
                        egui::pos2(x, ruler_rect.bottom()),
                    ],
                    egui::Stroke::new(1.0, egui::Color32::from_gray(120)),
                );
            }
            time += minor;
        }

        let mut time = (start / major).floor() * major;
        while time <= end {
            let x = ruler_rect.left() + self.view.time_to_x(time);
            if x >= ruler_rect.left() {
                painter.line_segment(
                    [
                        egui::pos2(x, ruler_rect.bottom() - 15.0),
                        egui::pos2(x, ruler_rect.bottom()),
                    ],
                    egui::Stroke::new(2.0, egui::Color32::WHITE),
                );
                painter.text(
                    egui::pos2(x + 2.0, ruler_rect.center().y),
                    egui::Align2::LEFT_CENTER,
                    format_time(time),
                    egui::FontId::monospace(10.0),
                    egui::Color32::WHITE,
                );
            }
            time += major;
        }
    }

    fn draw_playhead(&self, painter: &egui::Painter, rect: egui::Rect) {
        let x = rect.left() + self.view.time_to_x(self.playhead);
        if x < rect.left() || x > rect.right() {
            return;
        }
        painter.line_segment(
            [egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())],
            egui::Stroke::new(2.0, egui::Color32::RED),
        );
        painter.add(egui::Shape::convex_polygon(
            vec![
                egui::pos2(x - 6.0, rect.top()),
                egui::pos2(x + 6.0, rect.top()),
                egui::pos2(x, rect.top() + 10.0),
            ],
            egui::Color32::RED,
            egui::Stroke::NONE,
        ));
    }
}

/// `mm:ss.s` for transport and ruler labels.
pub fn format_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let minutes = (seconds / 60.0) as u32;
    let secs = seconds - minutes as f64 * 60.0;
    format!("{:02}:{:04.1}", minutes, secs)
}
