//! Upload wizard dialog rendered from a [`WizardView`] projection.

use client_core::{WizardStep, WizardView};
use eframe::egui::{self, Color32, ProgressBar, RichText};

use crate::ui::dialog::Dialog;

const WIZARD_WIDTH: f32 = 460.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardAction {
    ChooseFile,
    Cancel,
    Close,
    UploadAnother,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMarker {
    Done,
    Current,
    Failed,
    Pending,
}

pub fn step_marker(step: WizardStep, current: WizardStep, failed: bool) -> StepMarker {
    if step.index() < current.index() {
        StepMarker::Done
    } else if step == current && failed {
        StepMarker::Failed
    } else if step == current {
        StepMarker::Current
    } else {
        StepMarker::Pending
    }
}

/// Draws the wizard. `view` is `None` until a file has been picked.
pub fn show_upload_wizard(ctx: &egui::Context, view: Option<&WizardView>) -> Option<WizardAction> {
    let busy = view.is_some_and(|view| view.is_busy);
    let response = Dialog::new("upload_wizard", "Upload paper")
        .closable(!busy)
        .width(WIZARD_WIDTH)
        .show(ctx, |ui| {
            let current = view.map_or(WizardStep::SelectFile, |view| view.step);
            let failed = view.is_some_and(|view| view.error.is_some());
            show_step_indicator(ui, current, failed);
            ui.add_space(10.0);
            match view {
                None => show_file_picker(ui),
                Some(view) => show_progress(ui, view),
            }
        });

    if response.close_requested {
        Some(WizardAction::Close)
    } else {
        response.inner
    }
}

fn show_step_indicator(ui: &mut egui::Ui, current: WizardStep, failed: bool) {
    ui.horizontal(|ui| {
        for (position, step) in WizardStep::ALL.into_iter().enumerate() {
            if position > 0 {
                ui.weak("›");
            }
            let label = format!("{}. {}", step.index() + 1, step.title());
            let text = match step_marker(step, current, failed) {
                StepMarker::Done => RichText::new(format!("✓ {label}")).weak(),
                StepMarker::Current => RichText::new(label).strong(),
                StepMarker::Failed => RichText::new(label)
                    .strong()
                    .color(Color32::from_rgb(220, 110, 110)),
                StepMarker::Pending => RichText::new(label).weak(),
            };
            ui.label(text);
        }
    });
}

fn show_file_picker(ui: &mut egui::Ui) -> Option<WizardAction> {
    ui.label("Choose a PDF to add to your library. DOI and ISBN are extracted automatically.");
    ui.add_space(8.0);
    let mut action = None;
    ui.horizontal(|ui| {
        if ui.button("Choose PDF…").clicked() {
            action = Some(WizardAction::ChooseFile);
        }
        if ui.button("Close").clicked() {
            action = Some(WizardAction::Close);
        }
    });
    action
}

fn show_progress(ui: &mut egui::Ui, view: &WizardView) -> Option<WizardAction> {
    ui.label(RichText::new(&view.headline).strong());
    if let Some(detail) = &view.detail {
        ui.weak(detail);
    }
    ui.add_space(6.0);
    ui.add(
        ProgressBar::new(view.fraction)
            .desired_width(ui.available_width())
            .text(view.percent_label.as_str())
            .animate(view.is_busy),
    );

    if !view.identifiers.is_empty() {
        ui.add_space(8.0);
        egui::Grid::new("wizard_identifiers")
            .num_columns(2)
            .spacing([12.0, 4.0])
            .show(ui, |ui| {
                for row in &view.identifiers {
                    ui.label(RichText::new(row.label).strong());
                    ui.monospace(&row.value);
                    ui.end_row();
                }
            });
    }

    if let Some(error) = &view.error {
        ui.add_space(8.0);
        ui.colored_label(Color32::from_rgb(220, 110, 110), error);
    }

    ui.add_space(10.0);
    let mut action = None;
    ui.horizontal(|ui| {
        if ui.button(view.close_label).clicked() {
            action = Some(if view.is_busy {
                WizardAction::Cancel
            } else {
                WizardAction::Close
            });
        }
        if view.is_finished && ui.button("Upload another").clicked() {
            action = Some(WizardAction::UploadAnother);
        }
    });
    action
}
