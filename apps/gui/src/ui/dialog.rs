//! Modal dialog chrome, status banner, and small layout helpers.

use eframe::egui::{self, Align, Align2, Color32, Frame, Id, Layout, Margin, Order, RichText};

use crate::controller::events::UiError;

const BACKDROP: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 150);

/// Centered modal window drawn above a dimmed backdrop that swallows clicks.
pub struct Dialog<'a> {
    id: Id,
    title: &'a str,
    closable: bool,
    width: f32,
}

pub struct DialogResponse<R> {
    pub inner: R,
    /// Header close button or Escape, only when the dialog is closable.
    pub close_requested: bool,
}

impl<'a> Dialog<'a> {
    pub fn new(id: impl Into<Id>, title: &'a str) -> Self {
        Self {
            id: id.into(),
            title,
            closable: true,
            width: 420.0,
        }
    }

    pub fn closable(mut self, closable: bool) -> Self {
        self.closable = closable;
        self
    }

    pub fn width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn show<R>(
        self,
        ctx: &egui::Context,
        add_contents: impl FnOnce(&mut egui::Ui) -> R,
    ) -> DialogResponse<R> {
        paint_backdrop(ctx, self.id);

        let mut close_requested = false;
        let closable = self.closable;
        let title = self.title;
        let width = self.width;
        let inner = egui::Area::new(self.id.with("panel"))
            .order(Order::Tooltip)
            .constrain(true)
            .anchor(Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                Frame::window(&ctx.style())
                    .inner_margin(Margin::symmetric(16, 14))
                    .show(ui, |ui| {
                        ui.set_width(width);
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(title).strong().size(17.0));
                            if closable {
                                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                    if ui.small_button("✕").clicked() {
                                        close_requested = true;
                                    }
                                });
                            }
                        });
                        ui.separator();
                        add_contents(ui)
                    })
                    .inner
            })
            .inner;

        if closable && ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            close_requested = true;
        }
        DialogResponse {
            inner,
            close_requested,
        }
    }
}

fn paint_backdrop(ctx: &egui::Context, id: Id) {
    let rect = ctx.viewport_rect();
    ctx.layer_painter(egui::LayerId::new(Order::Foreground, id.with("backdrop_paint")))
        .rect_filled(rect, 0.0, BACKDROP);
    egui::Area::new(id.with("backdrop_blocker"))
        .order(Order::Foreground)
        .fixed_pos(rect.min)
        .show(ctx, |ui| {
            ui.allocate_rect(rect, egui::Sense::click_and_drag());
        });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBannerSeverity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBanner {
    pub severity: StatusBannerSeverity,
    pub message: String,
}

impl StatusBanner {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: StatusBannerSeverity::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: StatusBannerSeverity::Error,
            message: message.into(),
        }
    }

    pub fn from_error(err: &UiError) -> Self {
        Self::error(format!("{} error: {}", err.category().label(), err.message()))
    }
}

/// Renders `banner` if set; the Dismiss button clears it.
pub fn show_status_banner(ui: &mut egui::Ui, banner: &mut Option<StatusBanner>) {
    let Some(current) = banner.as_ref() else {
        return;
    };
    let (fill, stroke) = match current.severity {
        StatusBannerSeverity::Error => (
            Color32::from_rgb(111, 53, 53),
            egui::Stroke::new(1.0, Color32::from_rgb(175, 96, 96)),
        ),
        StatusBannerSeverity::Info => (
            Color32::from_rgb(38, 66, 96),
            egui::Stroke::new(1.0, Color32::from_rgb(84, 126, 170)),
        ),
    };

    let mut dismissed = false;
    Frame::NONE
        .fill(fill)
        .stroke(stroke)
        .corner_radius(8.0)
        .inner_margin(Margin::symmetric(10, 8))
        .show(ui, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.label(RichText::new(&current.message).color(Color32::WHITE));
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui.button("Dismiss").clicked() {
                        dismissed = true;
                    }
                });
            });
        });
    if dismissed {
        *banner = None;
    }
}

pub fn card_width(available: f32, min: f32, max: f32) -> f32 {
    available.max(min).min(max)
}

/// Horizontally centered card with a width clamped to `min..=max`.
pub fn centered_card<R>(
    ui: &mut egui::Ui,
    min: f32,
    max: f32,
    add_contents: impl FnOnce(&mut egui::Ui) -> R,
) -> R {
    let width = card_width(ui.available_width(), min, max);
    ui.vertical_centered(|ui| {
        ui.set_width(width);
        Frame::NONE
            .fill(ui.visuals().faint_bg_color)
            .corner_radius(12.0)
            .stroke(egui::Stroke::new(
                1.0,
                ui.visuals().widgets.noninteractive.bg_stroke.color,
            ))
            .inner_margin(Margin::symmetric(20, 18))
            .show(ui, add_contents)
            .inner
    })
    .inner
}
