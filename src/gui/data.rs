use super::{QuickEdaApp, Status, table};
use crate::theme;
use eframe::egui;
use quickeda::dataset::{ColumnKind, column_names, schema_kinds};
use quickeda::session::Command;
use quickeda::utils::fmt_bytes;
use rfd::FileDialog;
use std::collections::BTreeMap;
use std::path::Path;

const UPLOAD_EXTENSIONS: [&str; 5] = ["csv", "xlsx", "xls", "xlsm", "ods"];

impl QuickEdaApp {
    fn upload_file(&mut self, path: &Path) {
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .map(str::to_owned);
        let Some(file_name) = file_name else {
            self.status = Some(Status::error(format!("Invalid file name: {}", path.display())));
            return;
        };
        match std::fs::read(path) {
            Ok(bytes) => {
                tracing::info!("Read {} ({})", path.display(), fmt_bytes(bytes.len()));
                self.dispatch(Command::Upload { file_name, bytes });
            }
            Err(e) => {
                self.status = Some(Status::error(format!("Failed to read {}: {e}", path.display())));
            }
        }
    }

    pub(super) fn render_upload(&mut self, ui: &mut egui::Ui) {
        ui.heading("Upload a dataset");
        ui.label("CSV or spreadsheet (first sheet). Uploading replaces the current dataset.");
        ui.add_space(theme::SPACING_SMALL);

        if ui.button("📂 Choose file…").clicked()
            && let Some(path) = FileDialog::new()
                .add_filter("Tables", &UPLOAD_EXTENSIONS)
                .pick_file()
        {
            self.upload_file(&path);
        }

        let (Some(name), Ok(raw)) = (self.session.file_name(), self.session.raw()) else {
            return;
        };

        ui.add_space(theme::SPACING_LARGE);
        theme::card_frame(ui).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(egui::RichText::new(name).strong());
            ui.label(format!("Uploaded: {} rows × {} columns", raw.height(), raw.width()));
            if let Ok(working) = self.session.working() {
                ui.label(format!(
                    "Working: {} rows × {} columns",
                    working.height(),
                    working.width()
                ));
            }
        });

        if let Some(preview) = &self.preview {
            ui.add_space(theme::SPACING_MEDIUM);
            ui.label(egui::RichText::new("Preview (random sample)").strong());
            table::render_frame(ui, "preview", preview);
        }
    }

    pub(super) fn render_types(&mut self, ui: &mut egui::Ui) {
        ui.heading("Column types");
        ui.label("Pick a type per column. Columns that cannot be converted keep their type.");
        ui.add_space(theme::SPACING_SMALL);

        let Ok(current) = self.session.working().map(schema_kinds) else {
            return;
        };

        egui::Grid::new("types_grid")
            .num_columns(3)
            .striped(true)
            .spacing([20.0, 6.0])
            .show(ui, |ui| {
                ui.label(egui::RichText::new("Column").strong());
                ui.label(egui::RichText::new("Current").strong());
                ui.label(egui::RichText::new("Convert to").strong());
                ui.end_row();

                for (name, kind) in &current {
                    ui.label(name.as_str());
                    ui.label(kind.as_str());
                    let choice = self.type_choices.entry(name.clone()).or_insert(*kind);
                    egui::ComboBox::from_id_salt(format!("type_{name}"))
                        .selected_text(choice.as_str())
                        .show_ui(ui, |ui| {
                            if *kind == ColumnKind::Boolean {
                                ui.selectable_value(&mut *choice, ColumnKind::Boolean, "boolean");
                            }
                            for target in ColumnKind::COERCIBLE {
                                ui.selectable_value(&mut *choice, target, target.as_str());
                            }
                        });
                    ui.end_row();
                }
            });

        ui.add_space(theme::SPACING_MEDIUM);
        let changes: BTreeMap<String, ColumnKind> = current
            .iter()
            .filter_map(|(name, kind)| {
                self.type_choices
                    .get(name)
                    .filter(|choice| *choice != kind)
                    .map(|choice| (name.clone(), *choice))
            })
            .collect();

        ui.horizontal(|ui| {
            let label = format!("Apply {} change(s)", changes.len());
            if ui
                .add_enabled(!changes.is_empty(), egui::Button::new(label))
                .clicked()
            {
                self.dispatch(Command::CoerceTypes(changes));
            }
            if ui.button("Undo edits").clicked() {
                self.type_choices = current.into_iter().collect();
            }
        });
    }

    pub(super) fn render_columns(&mut self, ui: &mut egui::Ui) {
        ui.heading("Columns to profile");
        ui.label("The report covers only the ticked columns.");
        ui.add_space(theme::SPACING_SMALL);

        let Ok(all) = self.session.working().map(column_names) else {
            return;
        };

        ui.horizontal(|ui| {
            if ui.button("Select all").clicked() {
                self.column_choices = all.iter().cloned().collect();
            }
            if ui.button("Clear").clicked() {
                self.column_choices.clear();
            }
        });
        ui.add_space(theme::SPACING_SMALL);

        theme::card_frame(ui).show(ui, |ui| {
            ui.set_width(ui.available_width());
            for name in &all {
                let mut checked = self.column_choices.contains(name);
                if ui.checkbox(&mut checked, name.as_str()).changed() {
                    if checked {
                        self.column_choices.insert(name.clone());
                    } else {
                        self.column_choices.remove(name);
                    }
                }
            }
        });

        ui.add_space(theme::SPACING_MEDIUM);
        if ui.button("Apply selection").clicked() {
            let selected = all
                .into_iter()
                .filter(|name| self.column_choices.contains(name))
                .collect();
            self.dispatch(Command::SelectProfileColumns(selected));
        }
    }
}
