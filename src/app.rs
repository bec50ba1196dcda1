use crate::auth::identity::MicrosoftIdentity;
use crate::config::AppConfig;
use crate::graph::CreatedEvent;
use crate::meeting::{Field, MeetingForm, Phase, SUCCESS_MESSAGE};
use crate::scheduler::{ScheduleError, Scheduler};
use eframe::egui;
use egui::{Color32, Margin, Vec2, Visuals};
use log::error;
use std::sync::{mpsc, Arc};
use std::thread;
use tokio::runtime::{Handle, Runtime};

const TEAMS_BLUE: Color32 = Color32::from_rgb(0x00, 0x78, 0xD4);

// (field, label, hint)
const FORM_FIELDS: [(Field, &str, &str); 4] = [
    (Field::Subject, "Meeting Subject:", "Enter meeting subject"),
    (Field::StartDateTime, "Start Date and Time:", "YYYY-MM-DDTHH:MM"),
    (Field::EndDateTime, "End Date and Time:", "YYYY-MM-DDTHH:MM"),
    (
        Field::Attendees,
        "Attendees (comma-separated emails):",
        "e.g., user1@example.com, user2@example.com",
    ),
];

enum Message {
    ConfigLoaded(Result<AppConfig, String>),
    Scheduled(Result<CreatedEvent, ScheduleError>),
}

pub struct SchedulerApp {
    form: MeetingForm,
    status_message: String,
    scheduler: Option<Arc<Scheduler<MicrosoftIdentity>>>,

    // Background Communication
    tokio_rt: Option<Runtime>,
    receiver: mpsc::Receiver<Message>,
    sender: mpsc::Sender<Message>,
}

impl Default for SchedulerApp {
    fn default() -> Self {
        let (sender, receiver) = mpsc::channel();

        let initial_sender = sender.clone();
        thread::spawn(move || {
            let loaded = AppConfig::load().map_err(|e| e.to_string());
            initial_sender.send(Message::ConfigLoaded(loaded)).ok();
        });

        Self {
            form: MeetingForm::default(),
            status_message: "Loading configuration...".to_string(),
            scheduler: None,
            tokio_rt: None,
            receiver,
            sender,
        }
    }
}

impl SchedulerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut visuals = Visuals::light();
        visuals.selection.bg_fill = TEAMS_BLUE;
        visuals.hyperlink_color = TEAMS_BLUE;
        visuals.window_corner_radius = 8.into();
        cc.egui_ctx.set_visuals(visuals);
        cc.egui_ctx.set_theme(egui::Theme::Light);
        Self::default()
    }

    fn runtime_handle(&mut self) -> std::io::Result<Handle> {
        if let Some(rt) = &self.tokio_rt {
            return Ok(rt.handle().clone());
        }
        let rt = Runtime::new()?;
        let handle = rt.handle().clone();
        self.tokio_rt = Some(rt);
        Ok(handle)
    }

    fn apply_config(&mut self, config: AppConfig) {
        let identity = MicrosoftIdentity::new(config.identity.clone());
        match Scheduler::from_config(identity, &config) {
            Ok(scheduler) => {
                self.scheduler = Some(Arc::new(scheduler));
                self.status_message = "Ready.".to_string();
            }
            Err(e) => {
                error!("Failed to set up calendar client: {}", e);
                self.status_message = format!("ERROR setting up calendar client: {}", e);
            }
        }
    }

    fn handle_schedule(&mut self, ctx: &egui::Context) {
        let Some(scheduler) = self.scheduler.clone() else {
            self.status_message = "Configuration not loaded.".to_string();
            return;
        };
        let handle = match self.runtime_handle() {
            Ok(handle) => handle,
            Err(e) => {
                self.status_message = format!("ERROR starting async runtime: {}", e);
                return;
            }
        };
        let Some(meeting) = self.form.begin_submit() else {
            return;
        };

        self.status_message = "Scheduling meeting...".to_string();
        let sender = self.sender.clone();
        let ctx = ctx.clone();
        handle.spawn(async move {
            let outcome = scheduler.submit_in_task(meeting).await;
            sender.send(Message::Scheduled(outcome)).ok();
            ctx.request_repaint();
        });
    }

    fn ui_form(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("meeting_grid")
            .num_columns(2)
            .spacing([10.0, 12.0])
            .show(ui, |ui| {
                for (field, label, hint) in FORM_FIELDS {
                    ui.label(egui::RichText::new(label).strong());
                    ui.add(
                        egui::TextEdit::singleline(self.form.request.field_mut(field))
                            .hint_text(hint)
                            .desired_width(320.0),
                    );
                    ui.end_row();
                }
            });
        ui.add_space(10.0);

        if !self.form.submission.error.is_empty() {
            ui.colored_label(Color32::RED, &self.form.submission.error);
            ui.add_space(10.0);
        }

        let label = if self.form.submission.is_loading {
            "Scheduling..."
        } else {
            "Schedule Meeting"
        };
        let button = egui::Button::new(egui::RichText::new(label).color(Color32::WHITE))
            .fill(TEAMS_BLUE)
            .min_size(Vec2::new(ui.available_width(), 30.0));
        let enabled = self.form.can_submit() && self.scheduler.is_some();
        if ui.add_enabled(enabled, button).clicked() {
            self.handle_schedule(ui.ctx());
        }
    }

    fn ui_success(&mut self, ctx: &egui::Context) {
        let Phase::Success(event) = &self.form.phase else {
            return;
        };
        let join_url = event.join_url().map(str::to_string);

        let response = egui::Modal::new(egui::Id::new("scheduled_modal")).show(ctx, |ui| {
            ui.set_width(320.0);
            ui.heading("Meeting scheduled");
            ui.add_space(8.0);
            ui.label(SUCCESS_MESSAGE);
            if let Some(url) = &join_url {
                ui.hyperlink_to("Join in Microsoft Teams", url);
            }
            ui.add_space(8.0);
            ui.button("OK").clicked()
        });

        if response.inner || response.should_close() {
            self.form.acknowledge();
            self.status_message = "Ready.".to_string();
        }
    }
}

impl eframe::App for SchedulerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(message) = self.receiver.try_recv() {
            match message {
                Message::ConfigLoaded(Ok(config)) => self.apply_config(config),
                Message::ConfigLoaded(Err(e)) => {
                    error!("Failed to load config: {}", e);
                    self.status_message = format!("ERROR loading config: {}", e);
                }
                Message::Scheduled(outcome) => {
                    self.status_message = match &outcome {
                        Ok(_) => "Meeting scheduled.".to_string(),
                        Err(_) => "Scheduling failed.".to_string(),
                    };
                    self.form.finish(outcome);
                }
            }
        }

        // Status bar at the bottom
        egui::TopBottomPanel::bottom("status_panel")
            .frame(egui::Frame::new().inner_margin(Margin::symmetric(10, 5)))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if self.form.submission.is_loading {
                        ui.add(egui::Spinner::new().size(14.0));
                        ui.add_space(5.0);
                    }
                    ui.label(&self.status_message);
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::new().inner_margin(Margin::same(20)))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading("Schedule a Microsoft Teams Meeting");
                });
                ui.separator();
                ui.add_space(15.0);
                self.ui_form(ui);
            });

        self.ui_success(ctx);

        if self.form.submission.is_loading {
            ctx.request_repaint();
        }
    }
}
