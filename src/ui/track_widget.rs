use eframe::egui;

use crate::renderer::timeline_view::TimelineView;
use crate::types::media::AudioClip;
use crate::types::track::Channel;
use crate::ui::timeline_widget::TimelineEvent;

/// Width of the grab zone at a clip's right edge.
const TRIM_HANDLE_WIDTH: f32 = 6.0;

fn channel_color(channel: &Channel) -> egui::Color32 {
    let [r, g, b] = channel.color;
    egui::Color32::from_rgb(r, g, b)
}

/// Draws the header of one channel: name, kind, mute and solo toggles.
pub fn channel_header(ui: &mut egui::Ui, rect: egui::Rect, channel: &Channel) -> Vec<TimelineEvent> {
    let mut events = Vec::new();
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, egui::Color32::DARK_GRAY);
    painter.rect_filled(
        egui::Rect::from_min_size(rect.left_top(), egui::vec2(4.0, rect.height())),
        0.0,
        channel_color(channel),
    );
    painter.text(
        rect.left_top() + egui::vec2(10.0, 6.0),
        egui::Align2::LEFT_TOP,
        &channel.name,
        egui::FontId::proportional(14.0),
        egui::Color32::WHITE,
    );
    painter.text(
        rect.left_top() + egui::vec2(10.0, 24.0),
        egui::Align2::LEFT_TOP,
        channel.kind.label(),
        egui::FontId::proportional(11.0),
        egui::Color32::LIGHT_GRAY,
    );

    let mute_rect = egui::Rect::from_min_size(
        rect.right_top() + egui::vec2(-60.0, 6.0),
        egui::vec2(26.0, 22.0),
    );
    let mute = egui::Button::new("M").selected(channel.muted);
    if ui.put(mute_rect, mute).clicked() {
        events.push(TimelineEvent::ToggleMute(channel.id.clone()));
    }
    let solo_rect = mute_rect.translate(egui::vec2(30.0, 0.0));
    let solo = egui::Button::new("S").selected(channel.solo);
    if ui.put(solo_rect, solo).clicked() {
        events.push(TimelineEvent::ToggleSolo(channel.id.clone()));
    }
    events
}

/// Draws the clips of one channel lane. Clicking a clip activates it,
/// dragging it moves it along the timeline and dragging its right edge
/// trims it.
pub fn clip_lane(
    ui: &mut egui::Ui,
    lane_rect: egui::Rect,
    channel: &Channel,
    clips: &[&AudioClip],
    view: &TimelineView,
    active_clip: Option<&str>,
    audible: bool,
) -> Vec<TimelineEvent> {
    let mut events = Vec::new();
    let clip_height = lane_rect.height() - 12.0;
    let base = channel_color(channel);
    let base = if audible { base } else { base.gamma_multiply(0.35) };

    for clip in clips {
        let x = view.time_to_x(clip.start_time);
        let w = view.content_width(clip.duration).max(2.0);
        if x + w < 0.0 || x > lane_rect.width() {
            continue;
        }
        let rect = egui::Rect::from_min_size(
            egui::pos2(lane_rect.left() + x, lane_rect.top() + 6.0),
            egui::vec2(w, clip_height),
        );
        let response = ui.interact(
            rect,
            egui::Id::new(("clip", &clip.id)),
            egui::Sense::click_and_drag(),
        );

        let painter = ui.painter_at(lane_rect);
        painter.rect_filled(rect, 4.0, base);
        if active_clip == Some(clip.id.as_str()) {
            painter.rect_stroke(
                rect,
                4.0,
                egui::Stroke::new(2.0, egui::Color32::YELLOW),
                egui::StrokeKind::Inside,
            );
        }
        let label = if clip.name.is_empty() { &clip.id } else { &clip.name };
        painter.text(
            rect.left_center() + egui::vec2(6.0, 0.0),
            egui::Align2::LEFT_CENTER,
            label,
            egui::FontId::proportional(12.0),
            egui::Color32::BLACK,
        );

        let on_handle = |pos: egui::Pos2| (rect.right() - pos.x).abs() <= TRIM_HANDLE_WIDTH;
        if response.hovered() && response.hover_pos().is_some_and(on_handle) {
            ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
        }

        if response.dragged() {
            // The edge moves while trimming, so the mode is fixed at drag start.
            let trim_id = response.id.with("trim");
            if response.drag_started() {
                let on_edge = ui.input(|i| i.pointer.press_origin()).is_some_and(on_handle);
                ui.data_mut(|d| d.insert_temp(trim_id, on_edge));
            }
            let trimming = ui.data(|d| d.get_temp::<bool>(trim_id)).unwrap_or(false);
            let dt = (response.drag_delta().x / view.pixels_per_second()) as f64;
            if dt != 0.0 && trimming {
                events.push(TimelineEvent::ClipTrimmed {
                    clip_id: clip.id.clone(),
                    new_duration: clip.duration + dt,
                });
            } else if dt != 0.0 {
                events.push(TimelineEvent::ClipMoved {
                    clip_id: clip.id.clone(),
                    new_start_time: (clip.start_time + dt).max(0.0),
                });
            }
        } else if response.clicked() {
            events.push(TimelineEvent::ClipActivated(clip.id.clone()));
        }
    }
    events
}
