//! Desktop front end.
//!
//! The app owns one [`Session`] and turns every button press into a
//! [`Command`]. Pages only read the session and queue commands; the result of a
//! dispatch becomes the status line at the bottom of the window.

use crate::theme;
use eframe::egui;
use polars::prelude::DataFrame;
use quickeda::config::{self, AppSettings};
use quickeda::dataset::{ColumnKind, schema_kinds};
use quickeda::error::QuickEdaError;
use quickeda::report::{ReportMode, ReportTarget};
use quickeda::session::{Command, Outcome, Session};
use std::collections::{BTreeMap, BTreeSet};

mod data;
mod help;
mod report;
mod table;
mod transform;

use transform::TransformForm;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Page {
    #[default]
    Upload,
    Types,
    Columns,
    Transform,
    Report,
    Download,
    Help,
    About,
}

impl Page {
    const ALL: [Self; 8] = [
        Self::Upload,
        Self::Types,
        Self::Columns,
        Self::Transform,
        Self::Report,
        Self::Download,
        Self::Help,
        Self::About,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Upload => "📂 Upload",
            Self::Types => "🔢 Types",
            Self::Columns => "☑ Columns",
            Self::Transform => "🛠 Transform",
            Self::Report => "📊 Report",
            Self::Download => "💾 Download",
            Self::Help => "❓ Help",
            Self::About => "ℹ About",
        }
    }

    /// Pages that make no sense before a dataset is loaded.
    fn needs_dataset(self) -> bool {
        matches!(
            self,
            Self::Types | Self::Columns | Self::Transform | Self::Report | Self::Download
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StatusKind {
    Info,
    Error,
}

#[derive(Clone, Debug)]
struct Status {
    kind: StatusKind,
    message: String,
    warnings: Vec<String>,
}

impl Status {
    fn info(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            message: message.into(),
            warnings: Vec::new(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            message: message.into(),
            warnings: Vec::new(),
        }
    }
}

impl From<Outcome> for Status {
    fn from(outcome: Outcome) -> Self {
        Self {
            kind: StatusKind::Info,
            message: outcome.message,
            warnings: outcome.warnings,
        }
    }
}

pub struct QuickEdaApp {
    settings: AppSettings,
    session: Session,
    page: Page,
    status: Option<Status>,
    /// Random sample of the working dataset, refreshed after every change
    preview: Option<DataFrame>,
    /// Target kind per column on the Types page
    type_choices: BTreeMap<String, ColumnKind>,
    /// Ticked columns on the Columns page
    column_choices: BTreeSet<String>,
    transform_form: TransformForm,
    report_mode: ReportMode,
    report_target: ReportTarget,
}

impl QuickEdaApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: AppSettings) -> Self {
        theme::apply_theme(&cc.egui_ctx, settings.theme);
        Self {
            session: Session::new(&settings),
            report_mode: settings.default_report_mode,
            report_target: ReportTarget::default(),
            settings,
            page: Page::default(),
            status: None,
            preview: None,
            type_choices: BTreeMap::new(),
            column_choices: BTreeSet::new(),
            transform_form: TransformForm::default(),
        }
    }

    /// Runs `command` and records its outcome for the status line.
    fn dispatch(&mut self, command: Command) {
        let result = if matches!(command, Command::GenerateReport { .. }) {
            self.session.dispatch_with_progress(command, |p| {
                tracing::debug!("Profiling {} ({}/{})", p.column, p.index + 1, p.total);
            })
        } else {
            self.session.dispatch(command)
        };

        match result {
            Ok(outcome) => {
                self.status = Some(outcome.into());
                self.refresh();
            }
            Err(e) => self.report_error(&e),
        }
    }

    fn report_error(&mut self, e: &QuickEdaError) {
        self.status = Some(Status::error(e.to_string()));
    }

    /// Re-reads everything the pages cache from the session.
    fn refresh(&mut self) {
        let Ok(working) = self.session.working() else {
            self.preview = None;
            self.type_choices.clear();
            self.column_choices.clear();
            return;
        };

        self.type_choices = schema_kinds(working).into_iter().collect();
        self.transform_form
            .columns
            .retain(|c| self.type_choices.contains_key(c));
        self.column_choices = self
            .session
            .profile_columns()
            .unwrap_or_default()
            .into_iter()
            .collect();

        match self.session.preview() {
            Ok(preview) => self.preview = Some(preview),
            Err(e) => {
                self.preview = None;
                tracing::warn!("Preview failed: {e}");
            }
        }
    }

    fn toggle_theme(&mut self, ctx: &egui::Context) {
        self.settings.theme = self.settings.theme.toggled();
        theme::apply_theme(ctx, self.settings.theme);
        if let Err(e) = config::save_settings(&self.settings) {
            self.status = Some(Status::error(format!("Could not save settings: {e}")));
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(egui::RichText::new("quickeda").strong());
                ui.separator();
                match (self.session.file_name(), self.session.working()) {
                    (Some(name), Ok(df)) => {
                        ui.label(egui::RichText::new(name).strong());
                        ui.label(format!("{} rows × {} columns", df.height(), df.width()));
                    }
                    _ => {
                        ui.label("No dataset loaded");
                    }
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let label = match self.settings.theme {
                        config::Theme::Dark => "☀ Light mode",
                        config::Theme::Light => "🌙 Dark mode",
                    };
                    if ui.button(label).clicked() {
                        self.toggle_theme(ui.ctx());
                    }
                });
            });
        });
    }

    fn render_sidebar(&mut self, ctx: &egui::Context) {
        let loaded = self.session.is_loaded();
        egui::SidePanel::left("navigation")
            .exact_width(theme::SIDEBAR_WIDTH)
            .resizable(false)
            .frame(theme::sidebar_frame(self.settings.theme))
            .show(ctx, |ui| {
                ui.add_space(theme::SPACING_SMALL);
                for page in Page::ALL {
                    let enabled = loaded || !page.needs_dataset();
                    ui.add_enabled_ui(enabled, |ui| {
                        ui.selectable_value(&mut self.page, page, page.label());
                    });
                    if page == Page::Download {
                        ui.separator();
                    }
                }
            });
    }

    fn render_status(&mut self, ctx: &egui::Context) {
        let Some(status) = &self.status else {
            return;
        };
        let mut dismissed = false;
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.add_space(theme::SPACING_SMALL / 2.0);
            ui.horizontal(|ui| {
                match status.kind {
                    StatusKind::Info => ui.label(&status.message),
                    StatusKind::Error => ui.colored_label(theme::ERROR_COLOR, &status.message),
                };
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("✖").clicked() {
                        dismissed = true;
                    }
                });
            });
            for warning in &status.warnings {
                ui.colored_label(theme::WARNING_COLOR, format!("⚠ {warning}"));
            }
            ui.add_space(theme::SPACING_SMALL / 2.0);
        });
        if dismissed {
            self.status = None;
        }
    }
}

impl eframe::App for QuickEdaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.page.needs_dataset() && !self.session.is_loaded() {
            self.page = Page::Upload;
        }

        self.render_top_bar(ctx);
        self.render_sidebar(ctx);
        self.render_status(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| match self.page {
                    Page::Upload => self.render_upload(ui),
                    Page::Types => self.render_types(ui),
                    Page::Columns => self.render_columns(ui),
                    Page::Transform => self.render_transform(ui),
                    Page::Report => self.render_report(ui),
                    Page::Download => self.render_download(ui),
                    Page::Help => help::render_help(ui),
                    Page::About => help::render_about(ui),
                });
        });
    }
}
