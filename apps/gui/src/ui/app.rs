use std::path::{Path, PathBuf};

use chrono::{Datelike, Local};
use client_core::{
    navigation::{Route, Router},
    AuthContext, ClientSettings, UploadProgressController, UploadSession, WizardView,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::Stage;

use crate::backend_bridge::commands::{BackendCommand, UploadTicket};
use crate::controller::events::UiEvent;
use crate::controller::orchestration::dispatch_backend_command;
use crate::ui::dialog::{centered_card, show_status_banner, StatusBanner};
use crate::ui::shell::{show_footer, show_top_bar, ShellAction};
use crate::ui::wizard::{show_upload_wizard, WizardAction};

struct ActiveUpload {
    ticket: UploadTicket,
    controller: UploadProgressController,
}

pub struct ScilitApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    server_url: String,
    username: String,
    auth: AuthContext,
    router: Router,
    return_to: Option<String>,
    status: String,
    status_banner: Option<StatusBanner>,
    login_pending: bool,
    wizard_open: bool,
    active_upload: Option<ActiveUpload>,
    next_ticket: u64,
    library: Vec<UploadSession>,
    year: i32,
}

impl ScilitApp {
    pub fn new(
        settings: ClientSettings,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            server_url: settings.server_url,
            username: settings.username.unwrap_or_default(),
            auth: AuthContext::anonymous(),
            router: Router::default(),
            return_to: None,
            status: "Starting...".to_string(),
            status_banner: None,
            login_pending: false,
            wizard_open: false,
            active_upload: None,
            next_ticket: 0,
            library: Vec::new(),
            year: Local::now().year(),
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.handle_ui_event(event);
        }
    }

    fn handle_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Info(message) => {
                self.status = message;
            }
            UiEvent::LoggedIn(profile) => {
                self.status = format!("Signed in as {}", profile.name);
                self.auth = AuthContext::signed_in(profile);
                self.login_pending = false;
                self.status_banner = None;
                let target = self.return_to.take().unwrap_or_else(|| "/".to_string());
                self.navigate(&target);
            }
            UiEvent::LoggedOut => {
                let was_signed_in = self.auth.is_authenticated;
                self.auth = AuthContext::anonymous();
                self.active_upload = None;
                self.wizard_open = false;
                self.status = "Signed out".to_string();
                // Already anonymous when the worker confirms a reauth sign-out.
                if was_signed_in {
                    self.status_banner = Some(StatusBanner::info("You have been signed out."));
                    self.navigate("/");
                }
            }
            UiEvent::UploadAccepted { ticket, upload_id } => {
                if let Some(controller) = self.controller_for(ticket) {
                    controller.mark_accepted(upload_id);
                }
            }
            UiEvent::UploadProgress { ticket, event } => {
                let Some(controller) = self.controller_for(ticket) else {
                    return;
                };
                let was_finished = controller.snapshot().is_finished();
                let applied = controller.apply(&event).is_applied();
                let session = controller.snapshot();
                if applied && !was_finished && session.stage() == Stage::Complete {
                    let session = session.clone();
                    self.status = format!("{} added to your library", session.file_name());
                    self.library.push(session);
                }
            }
            UiEvent::UploadFailed { ticket, message } => {
                if let Some(controller) = self.controller_for(ticket) {
                    controller.fail(message);
                }
            }
            UiEvent::Error(err) => {
                self.login_pending = false;
                self.status = err.message().to_string();
                if err.requires_reauth() {
                    if self.auth.is_authenticated {
                        // Drop the worker's stale session too.
                        dispatch_backend_command(
                            &self.cmd_tx,
                            BackendCommand::Logout,
                            &mut self.status,
                        );
                    }
                    self.auth = AuthContext::anonymous();
                    self.status_banner = Some(StatusBanner::error(
                        "Session expired or invalid credentials. Please sign in again.",
                    ));
                    self.navigate("/login");
                } else {
                    self.status_banner = Some(StatusBanner::from_error(&err));
                }
            }
        }
    }

    /// Controller of the active upload, or `None` for events of a discarded one.
    fn controller_for(&mut self, ticket: UploadTicket) -> Option<&mut UploadProgressController> {
        match self.active_upload.as_mut() {
            Some(active) if active.ticket == ticket => Some(&mut active.controller),
            _ => {
                tracing::debug!(ticket = ticket.0, "dropping event for inactive upload");
                None
            }
        }
    }

    fn navigate(&mut self, path: &str) {
        let route = self.router.navigate(&self.auth, path);
        if route == Route::Login && Route::from_path(path).requires_auth() {
            self.return_to = Some(path.to_string());
        }
    }

    fn try_login(&mut self) {
        let username = self.username.trim().to_string();
        if username.is_empty() {
            self.status_banner = Some(StatusBanner::error("Please enter a username."));
            return;
        }
        let server_url = self.server_url.trim().to_string();
        if server_url.is_empty() {
            self.status_banner = Some(StatusBanner::error("Please enter a server URL."));
            return;
        }

        self.status_banner = None;
        self.status = format!("Signing in to {server_url}...");
        self.login_pending = dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::Login {
                server_url,
                username,
            },
            &mut self.status,
        );
    }

    fn logout(&mut self) {
        if let Some(active) = self.active_upload.take() {
            self.discard(active.ticket);
        }
        self.status = "Signing out...".to_string();
        dispatch_backend_command(&self.cmd_tx, BackendCommand::Logout, &mut self.status);
    }

    fn pick_and_upload(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("PDF documents", &["pdf"])
            .pick_file()
        {
            self.start_upload(path);
        }
    }

    fn start_upload(&mut self, path: PathBuf) {
        if let Some(previous) = self.active_upload.take() {
            self.discard(previous.ticket);
        }
        self.next_ticket += 1;
        let ticket = UploadTicket(self.next_ticket);
        let mut controller = UploadProgressController::new(display_file_name(&path));
        let queued = dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::UploadPaper { ticket, path },
            &mut self.status,
        );
        if !queued {
            controller.fail(self.status.clone());
        }
        self.active_upload = Some(ActiveUpload { ticket, controller });
        self.wizard_open = true;
    }

    fn discard(&mut self, ticket: UploadTicket) {
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::DiscardUpload { ticket },
            &mut self.status,
        );
    }

    fn handle_wizard_action(&mut self, action: WizardAction) {
        match action {
            WizardAction::ChooseFile => self.pick_and_upload(),
            WizardAction::Cancel => {
                if let Some(active) = self.active_upload.take() {
                    self.discard(active.ticket);
                    self.status = "Upload cancelled".to_string();
                }
                self.wizard_open = false;
            }
            WizardAction::Close => {
                if self
                    .active_upload
                    .as_ref()
                    .is_some_and(|active| !active.controller.snapshot().is_finished())
                {
                    // Closing a running upload is the same as cancelling it.
                    self.handle_wizard_action(WizardAction::Cancel);
                    return;
                }
                self.active_upload = None;
                self.wizard_open = false;
            }
            WizardAction::UploadAnother => {
                if let Some(active) = self.active_upload.take() {
                    if !active.controller.snapshot().is_finished() {
                        self.discard(active.ticket);
                    }
                }
            }
        }
    }

    fn open_wizard(&mut self) {
        if self
            .active_upload
            .as_ref()
            .is_some_and(|active| active.controller.snapshot().is_finished())
        {
            self.active_upload = None;
        }
        self.wizard_open = true;
    }

    fn show_page(&mut self, ui: &mut egui::Ui) {
        show_status_banner(ui, &mut self.status_banner);
        ui.add_space(8.0);
        match self.router.route(&self.auth) {
            Route::Home => self.show_home(ui),
            Route::Upload => self.show_upload_page(ui),
            Route::Library => self.show_library(ui),
            Route::Login => self.show_login(ui),
            Route::About => show_about(ui),
            Route::NotFound(path) => {
                ui.heading("Page not found");
                ui.label(format!("Nothing lives at {path}."));
                if ui.button("Go home").clicked() {
                    self.navigate("/");
                }
            }
        }
    }

    fn show_home(&mut self, ui: &mut egui::Ui) {
        ui.heading("Welcome to SciLit2.0");
        ui.label("Collect papers, extract their identifiers, and search them by chunk.");
        ui.add_space(8.0);
        match self.auth.display_name().map(str::to_string) {
            Some(name) => {
                ui.label(format!("Signed in as {name}."));
                if ui.button("Upload a paper").clicked() {
                    self.navigate("/upload");
                    self.open_wizard();
                }
            }
            None => {
                if ui.button("Log in to get started").clicked() {
                    self.navigate("/login");
                }
            }
        }
    }

    fn show_upload_page(&mut self, ui: &mut egui::Ui) {
        ui.heading("Upload");
        ui.label("PDF papers are uploaded, processed, and split into chunks.");
        ui.add_space(8.0);
        if ui.button("New upload").clicked() {
            self.open_wizard();
        }
        if let Some(active) = &self.active_upload {
            let view = WizardView::project(active.controller.snapshot());
            ui.add_space(8.0);
            ui.label(format!(
                "{}: {} ({})",
                active.controller.snapshot().file_name(),
                view.headline,
                view.percent_label
            ));
            if !self.wizard_open && ui.button("Show progress").clicked() {
                self.wizard_open = true;
            }
        }
    }

    fn show_library(&mut self, ui: &mut egui::Ui) {
        ui.heading("Library");
        if self.library.is_empty() {
            ui.weak("No papers uploaded in this session yet.");
            return;
        }
        egui::Grid::new("library_grid")
            .num_columns(4)
            .striped(true)
            .spacing([16.0, 6.0])
            .show(ui, |ui| {
                ui.label(egui::RichText::new("File").strong());
                ui.label(egui::RichText::new("DOI").strong());
                ui.label(egui::RichText::new("ISBN").strong());
                ui.label(egui::RichText::new("Chunks").strong());
                ui.end_row();
                for session in &self.library {
                    let ids = session.identifiers();
                    ui.label(session.file_name());
                    ui.monospace(ids.doi.as_deref().unwrap_or("-"));
                    ui.monospace(ids.isbn.as_deref().unwrap_or("-"));
                    ui.label(session.chunk_count().to_string());
                    ui.end_row();
                }
            });
    }

    fn show_login(&mut self, ui: &mut egui::Ui) {
        let ctx = ui.ctx().clone();
        ui.add_space(24.0);
        centered_card(ui, 360.0, 480.0, |ui| {
            ui.heading("Log in");
            ui.weak("Sign in with your SciLit2.0 username.");
            ui.add_space(8.0);

            ui.label(egui::RichText::new("Server URL").strong());
            let server = ui.add(
                egui::TextEdit::singleline(&mut self.server_url)
                    .id_salt("login_server_url")
                    .hint_text("http://127.0.0.1:8080")
                    .desired_width(f32::INFINITY),
            );
            ui.label(egui::RichText::new("Username").strong());
            let user = ui.add(
                egui::TextEdit::singleline(&mut self.username)
                    .id_salt("login_username")
                    .hint_text("ada")
                    .desired_width(f32::INFINITY),
            );

            let enter = ctx.input(|i| i.key_pressed(egui::Key::Enter));
            let submit_via_enter = enter && (server.lost_focus() || user.lost_focus());
            ui.add_space(8.0);
            let button = egui::Button::new(egui::RichText::new("Sign in").strong())
                .min_size(egui::vec2(ui.available_width(), 34.0));
            let clicked = ui.add_enabled(!self.login_pending, button).clicked();
            if (clicked || submit_via_enter) && !self.login_pending {
                self.try_login();
            }
        });
    }
}

fn show_about(ui: &mut egui::Ui) {
    ui.heading("About");
    ui.label(
        "SciLit2.0 manages scientific literature: upload PDFs, let the service extract \
         DOI and ISBN identifiers, and browse the resulting chunks.",
    );
}

fn display_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl eframe::App for ScilitApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        let entries = client_core::navigation::menu_entries(&self.auth, self.router.location());
        match show_top_bar(ctx, &entries, &self.server_url) {
            Some(ShellAction::Navigate(path)) => self.navigate(&path),
            Some(ShellAction::Logout) => self.logout(),
            None => {}
        }
        show_footer(ctx, self.year, &self.status);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| self.show_page(ui));
        });

        if self.wizard_open && self.auth.is_authenticated {
            let view = self
                .active_upload
                .as_ref()
                .map(|active| WizardView::project(active.controller.snapshot()));
            if let Some(action) = show_upload_wizard(ctx, view.as_ref()) {
                self.handle_wizard_action(action);
            }
        }

        let busy = self
            .active_upload
            .as_ref()
            .is_some_and(|active| !active.controller.snapshot().is_finished());
        ctx.request_repaint_after(std::time::Duration::from_millis(if busy { 50 } else { 200 }));
    }
}

#[cfg(test)]
#[path = "../tests/app_tests.rs"]
mod tests;
