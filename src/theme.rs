use eframe::egui;
use egui::{Color32, CornerRadius, Margin, Stroke};
use quickeda::config::Theme;

pub const ACCENT_COLOR: Color32 = Color32::from_rgb(0, 137, 123);
pub const WARNING_COLOR: Color32 = Color32::from_rgb(230, 145, 56);
pub const ERROR_COLOR: Color32 = Color32::from_rgb(211, 47, 47);

pub const SPACING_SMALL: f32 = 8.0;
pub const SPACING_MEDIUM: f32 = 12.0;
pub const SPACING_LARGE: f32 = 20.0;

pub const MARGIN_SIDEBAR: f32 = 10.0;
pub const MARGIN_CARD: f32 = 15.0;
pub const SIDEBAR_WIDTH: f32 = 170.0;

struct Palette {
    hovered: Color32,
    inactive: Color32,
    noninteractive: Color32,
    faint: Color32,
    extreme: Color32,
    sidebar: Color32,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            hovered: Color32::from_rgb(0, 105, 92),
            inactive: Color32::from_rgb(45, 45, 45),
            noninteractive: Color32::from_rgb(30, 30, 30),
            faint: Color32::from_rgb(35, 35, 35),
            extreme: Color32::from_rgb(20, 20, 20),
            sidebar: Color32::from_rgb(25, 25, 25),
        },
        Theme::Light => Palette {
            hovered: Color32::from_rgb(128, 203, 196),
            inactive: Color32::from_rgb(225, 225, 225),
            noninteractive: Color32::from_rgb(245, 245, 245),
            faint: Color32::from_rgb(238, 240, 240),
            extreme: Color32::from_rgb(255, 255, 255),
            sidebar: Color32::from_rgb(232, 236, 236),
        },
    }
}

pub fn apply_theme(ctx: &egui::Context, theme: Theme) {
    let p = palette(theme);
    let mut visuals = match theme {
        Theme::Dark => egui::Visuals::dark(),
        Theme::Light => egui::Visuals::light(),
    };

    visuals.widgets.active.bg_fill = ACCENT_COLOR;
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);

    visuals.widgets.hovered.bg_fill = p.hovered;
    visuals.widgets.hovered.corner_radius = CornerRadius::same(6);

    visuals.widgets.inactive.bg_fill = p.inactive;
    visuals.widgets.inactive.corner_radius = CornerRadius::same(6);

    visuals.widgets.noninteractive.bg_fill = p.noninteractive;
    visuals.widgets.noninteractive.corner_radius = CornerRadius::same(6);

    visuals.selection.bg_fill = ACCENT_COLOR.linear_multiply(0.4);
    visuals.window_corner_radius = CornerRadius::same(12);

    visuals.faint_bg_color = p.faint;
    visuals.extreme_bg_color = p.extreme;
    visuals.panel_fill = p.noninteractive;

    ctx.set_visuals(visuals);
}

pub fn card_frame(ui: &egui::Ui) -> egui::Frame {
    egui::Frame::new()
        .fill(ui.visuals().faint_bg_color)
        .corner_radius(CornerRadius::same(10))
        .inner_margin(Margin::same(MARGIN_CARD as i8))
        .stroke(Stroke::new(
            1.0,
            ui.visuals().widgets.noninteractive.bg_stroke.color,
        ))
}

pub fn sidebar_frame(theme: Theme) -> egui::Frame {
    egui::Frame::new()
        .fill(palette(theme).sidebar)
        .inner_margin(Margin::same(MARGIN_SIDEBAR as i8))
}
