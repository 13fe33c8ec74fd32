use super::{QuickEdaApp, Status};
use crate::theme;
use eframe::egui;
use quickeda::export::ExportFormat;
use quickeda::report::{Report, ReportMode, ReportTarget};
use quickeda::session::Command;
use quickeda::utils::{fmt_bytes, fmt_count, fmt_pct};
use rfd::FileDialog;
use std::path::Path;

fn save_bytes(path: &Path, bytes: &[u8]) -> Status {
    match std::fs::write(path, bytes) {
        Ok(()) => {
            tracing::info!("Saved {} ({})", path.display(), fmt_bytes(bytes.len()));
            Status::info(format!("Saved {}", path.display()))
        }
        Err(e) => Status::error(format!("Failed to write {}: {e}", path.display())),
    }
}

fn render_summary(ui: &mut egui::Ui, report: &Report) {
    let overview = &report.profile.overview;
    ui.label(egui::RichText::new(&report.title).strong());
    ui.label(format!(
        "{} report of the {} dataset, generated {}",
        report.mode,
        report.target,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    ui.add_space(theme::SPACING_SMALL);

    egui::Grid::new("report_overview")
        .num_columns(2)
        .spacing([20.0, 4.0])
        .show(ui, |ui| {
            ui.label("Rows");
            ui.label(fmt_count(overview.rows));
            ui.end_row();
            ui.label("Columns");
            ui.label(fmt_count(overview.columns));
            ui.end_row();
            ui.label("Missing cells");
            ui.label(format!(
                "{} ({})",
                fmt_count(overview.missing_cells),
                fmt_pct(overview.missing_pct)
            ));
            ui.end_row();
            if let Some(duplicates) = overview.duplicate_rows {
                ui.label("Duplicate rows");
                ui.label(fmt_count(duplicates));
                ui.end_row();
            }
        });

    let alerts = &report.profile.alerts;
    ui.add_space(theme::SPACING_SMALL);
    if alerts.is_empty() {
        ui.label("No alerts");
        return;
    }
    ui.collapsing(format!("Alerts ({})", alerts.len()), |ui| {
        for alert in alerts {
            ui.horizontal_wrapped(|ui| {
                ui.colored_label(theme::WARNING_COLOR, alert.kind.label());
                ui.label(&alert.message);
            });
        }
    });
}

impl QuickEdaApp {
    pub(super) fn render_report(&mut self, ui: &mut egui::Ui) {
        ui.heading("Profiling report");
        ui.label("Minimal skips correlations, duplicate rows and histograms.");
        ui.add_space(theme::SPACING_SMALL);

        theme::card_frame(ui).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.label("Mode");
                ui.radio_value(&mut self.report_mode, ReportMode::Full, "Full");
                ui.radio_value(&mut self.report_mode, ReportMode::Minimal, "Minimal");
            });
            ui.horizontal(|ui| {
                ui.label("Dataset");
                ui.radio_value(&mut self.report_target, ReportTarget::Working, "Working");
                ui.radio_value(&mut self.report_target, ReportTarget::Raw, "Uploaded");
            });

            let columns = self.session.profile_columns().map(|c| c.len()).unwrap_or(0);
            if !self.session.filter().is_all() {
                ui.label(
                    egui::RichText::new(format!("Profiling {columns} selected column(s)")).weak(),
                );
            }

            ui.add_space(theme::SPACING_SMALL);
            if ui.button("📊 Generate report").clicked() {
                self.dispatch(Command::GenerateReport {
                    target: self.report_target,
                    mode: self.report_mode,
                });
            }
        });

        if let Some(report) = self.session.current_report() {
            ui.add_space(theme::SPACING_MEDIUM);
            theme::card_frame(ui).show(ui, |ui| {
                ui.set_width(ui.available_width());
                render_summary(ui, report);
            });
        }
    }

    pub(super) fn render_download(&mut self, ui: &mut egui::Ui) {
        ui.heading("Download");
        ui.add_space(theme::SPACING_SMALL);

        theme::card_frame(ui).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(egui::RichText::new("Report").strong());
            let has_report = self.session.current_report().is_some();
            if !has_report {
                ui.label(egui::RichText::new("Generate a report first").weak());
            }
            if ui
                .add_enabled(has_report, egui::Button::new("💾 Save HTML report…"))
                .clicked()
            {
                self.save_report();
            }
        });

        ui.add_space(theme::SPACING_MEDIUM);
        theme::card_frame(ui).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(egui::RichText::new("Working dataset").strong());
            ui.horizontal(|ui| {
                if ui.button("💾 Save as CSV…").clicked() {
                    self.save_dataset(ExportFormat::Csv);
                }
                if ui.button("💾 Save as Excel…").clicked() {
                    self.save_dataset(ExportFormat::Xlsx);
                }
            });
        });
    }

    fn save_report(&mut self) {
        let status = match self.session.report_download() {
            Ok((name, html)) => FileDialog::new()
                .add_filter("HTML", &["html"])
                .set_file_name(&name)
                .save_file()
                .map(|path| save_bytes(&path, html)),
            Err(e) => Some(Status::error(e.to_string())),
        };
        if status.is_some() {
            self.status = status;
        }
    }

    fn save_dataset(&mut self, format: ExportFormat) {
        let name = match self.session.dataset_file_name(format) {
            Ok(name) => name,
            Err(e) => {
                self.report_error(&e);
                return;
            }
        };
        let Some(path) = FileDialog::new()
            .add_filter(format.extension(), &[format.extension()])
            .set_file_name(&name)
            .save_file()
        else {
            return;
        };
        self.status = Some(match self.session.dataset_download(format) {
            Ok((_, bytes)) => save_bytes(&path, &bytes),
            Err(e) => Status::error(e.to_string()),
        });
    }
}
