//! Navigation shell: top menu bar built from the auth-aware menu, and the footer.

use client_core::navigation::{footer_text, MenuEntry, MenuTarget, APP_NAME};
use eframe::egui::{self, Align, Layout, RichText};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellAction {
    Navigate(String),
    Logout,
}

pub fn action_for(entry: &MenuEntry) -> ShellAction {
    match &entry.target {
        MenuTarget::Route(route) => ShellAction::Navigate(route.path().to_string()),
        MenuTarget::Logout => ShellAction::Logout,
    }
}

pub fn server_environment_label(server_url: &str) -> &'static str {
    let server = server_url.to_ascii_lowercase();
    if server.contains("127.0.0.1") || server.contains("localhost") {
        "Local"
    } else if server.contains("staging") {
        "Staging"
    } else {
        "Remote"
    }
}

pub fn show_top_bar(
    ctx: &egui::Context,
    entries: &[MenuEntry],
    server_url: &str,
) -> Option<ShellAction> {
    let mut action = None;
    egui::TopBottomPanel::top("app_top_menu_bar")
        .resizable(false)
        .frame(egui::Frame::new().inner_margin(egui::Margin::symmetric(8, 6)))
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(APP_NAME).strong().size(16.0));
                ui.separator();
                for entry in entries {
                    if ui.selectable_label(entry.active, &entry.label).clicked() {
                        action = Some(action_for(entry));
                    }
                }
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    ui.weak(server_environment_label(server_url));
                });
            });
        });
    action
}

pub fn show_footer(ctx: &egui::Context, year: i32, status: &str) {
    egui::TopBottomPanel::bottom("app_footer")
        .resizable(false)
        .frame(egui::Frame::new().inner_margin(egui::Margin::symmetric(8, 4)))
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.small(footer_text(year));
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    ui.small(status);
                });
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::{navigation::menu_entries, AuthContext};

    #[test]
    fn menu_entries_turn_into_shell_actions() {
        let actions: Vec<ShellAction> = menu_entries(&AuthContext::anonymous(), "/")
            .iter()
            .map(action_for)
            .collect();
        assert_eq!(
            actions,
            vec![
                ShellAction::Navigate("/".into()),
                ShellAction::Navigate("/about".into()),
                ShellAction::Navigate("/login".into()),
            ]
        );
    }

    #[test]
    fn labels_local_servers() {
        assert_eq!(server_environment_label("http://127.0.0.1:8080"), "Local");
        assert_eq!(server_environment_label("https://staging.scilit.org"), "Staging");
        assert_eq!(server_environment_label("https://scilit.org"), "Remote");
    }
}
