use super::{QuickEdaApp, Status};
use crate::theme;
use eframe::egui;
use quickeda::dataset::{ColumnKind, schema_kinds};
use quickeda::session::Command;
use quickeda::transforms::{
    EncodingMethod, MissingPolicy, OutlierMethod, TransformPipeline, TransformRequest,
};
use rfd::FileDialog;
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Operation {
    #[default]
    Missing,
    Outliers,
    Encode,
    Log,
    Standardize,
    Normalize,
}

impl Operation {
    const ALL: [Self; 6] = [
        Self::Missing,
        Self::Outliers,
        Self::Encode,
        Self::Log,
        Self::Standardize,
        Self::Normalize,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Missing => "Handle missing values",
            Self::Outliers => "Remove outliers",
            Self::Encode => "Encode categories",
            Self::Log => "Log transform",
            Self::Standardize => "Standardize",
            Self::Normalize => "Normalize (min-max)",
        }
    }

    fn hint(self) -> &'static str {
        match self {
            Self::Missing => "Drop rows with nulls or fill them per column.",
            Self::Outliers => "Drops every row outside the bounds on any selected column.",
            Self::Encode => "Label codes in place, or one indicator column per value.",
            Self::Log => "ln(1 + x). Fails if any value is -1 or below.",
            Self::Standardize => "Rescales to mean 0 and standard deviation 1.",
            Self::Normalize => "Rescales to the range [0, 1].",
        }
    }

    /// Whether a column of this kind is worth offering for the operation.
    fn accepts(self, kind: ColumnKind) -> bool {
        match self {
            Self::Missing | Self::Encode => true,
            Self::Outliers | Self::Log | Self::Standardize | Self::Normalize => kind.is_numeric(),
        }
    }
}

/// Inputs of the Transform page.
#[derive(Clone, Debug)]
pub struct TransformForm {
    pub operation: Operation,
    pub columns: BTreeSet<String>,
    pub policy: MissingPolicy,
    pub outliers: OutlierMethod,
    pub encoding: EncodingMethod,
}

impl Default for TransformForm {
    fn default() -> Self {
        Self {
            operation: Operation::default(),
            columns: BTreeSet::new(),
            policy: MissingPolicy::FillMean,
            outliers: OutlierMethod::Iqr,
            encoding: EncodingMethod::OneHot,
        }
    }
}

impl TransformForm {
    /// Builds the request for the ticked columns, in dataset order.
    pub fn to_request(&self, order: &[String]) -> TransformRequest {
        let columns: Vec<String> = order
            .iter()
            .filter(|c| self.columns.contains(*c))
            .cloned()
            .collect();
        match self.operation {
            Operation::Missing => TransformRequest::Missing {
                columns,
                policy: self.policy,
            },
            Operation::Outliers => TransformRequest::Outliers {
                columns,
                method: self.outliers,
            },
            Operation::Encode => TransformRequest::Encode {
                columns,
                method: self.encoding,
            },
            Operation::Log => TransformRequest::Log { columns },
            Operation::Standardize => TransformRequest::Standardize { columns },
            Operation::Normalize => TransformRequest::Normalize { columns },
        }
    }
}

impl QuickEdaApp {
    pub(super) fn render_transform(&mut self, ui: &mut egui::Ui) {
        ui.heading("Transform");
        ui.label("Each step runs on the working dataset. The uploaded file is never changed.");
        ui.add_space(theme::SPACING_SMALL);

        let Ok(kinds) = self.session.working().map(schema_kinds) else {
            return;
        };
        let order: Vec<String> = kinds.iter().map(|(name, _)| name.clone()).collect();

        theme::card_frame(ui).show(ui, |ui| {
            ui.set_width(ui.available_width());
            self.render_operation_picker(ui);
            ui.add_space(theme::SPACING_SMALL);

            let operation = self.transform_form.operation;
            ui.label(egui::RichText::new("Columns").strong());
            ui.horizontal_wrapped(|ui| {
                for (name, kind) in &kinds {
                    let enabled = operation.accepts(*kind);
                    let mut checked = self.transform_form.columns.contains(name);
                    let response = ui
                        .add_enabled(enabled, egui::Checkbox::new(&mut checked, name.as_str()))
                        .on_hover_text(kind.as_str());
                    if response.changed() {
                        if checked {
                            self.transform_form.columns.insert(name.clone());
                        } else {
                            self.transform_form.columns.remove(name);
                        }
                    }
                }
            });

            ui.add_space(theme::SPACING_MEDIUM);
            if ui.button("▶ Apply").clicked() {
                let request = self.transform_form.to_request(&order);
                self.dispatch(Command::Transform(request));
            }
        });

        ui.add_space(theme::SPACING_MEDIUM);
        self.render_history(ui);
    }

    fn render_operation_picker(&mut self, ui: &mut egui::Ui) {
        let form = &mut self.transform_form;
        ui.horizontal(|ui| {
            ui.label("Operation");
            egui::ComboBox::from_id_salt("operation")
                .selected_text(form.operation.label())
                .width(220.0)
                .show_ui(ui, |ui| {
                    for op in Operation::ALL {
                        ui.selectable_value(&mut form.operation, op, op.label());
                    }
                });

            match form.operation {
                Operation::Missing => {
                    egui::ComboBox::from_id_salt("missing_policy")
                        .selected_text(form.policy.label())
                        .show_ui(ui, |ui| {
                            for policy in MissingPolicy::ALL {
                                ui.selectable_value(&mut form.policy, policy, policy.label());
                            }
                        });
                }
                Operation::Outliers => {
                    for method in OutlierMethod::ALL {
                        ui.radio_value(&mut form.outliers, method, method.label());
                    }
                }
                Operation::Encode => {
                    for method in EncodingMethod::ALL {
                        ui.radio_value(&mut form.encoding, method, method.label());
                    }
                }
                Operation::Log | Operation::Standardize | Operation::Normalize => {}
            }
        });
        ui.label(egui::RichText::new(form.operation.hint()).weak());

        let options = self.session.options();
        if form.operation == Operation::Outliers {
            let detail = match form.outliers {
                OutlierMethod::ZScore => format!("|z| above {} is an outlier", options.z_threshold),
                OutlierMethod::Iqr => format!("Fences at Q1/Q3 ∓ {} × IQR", options.iqr_factor),
            };
            ui.label(egui::RichText::new(detail).weak());
        }
    }

    fn render_history(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Applied steps").strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("↺ Reset to upload").clicked() {
                    self.dispatch(Command::ResetWorking);
                }
                if ui.button("Load pipeline…").clicked() {
                    self.load_pipeline();
                }
                if ui
                    .add_enabled(
                        !self.session.history().is_empty(),
                        egui::Button::new("Save pipeline…"),
                    )
                    .clicked()
                {
                    self.save_pipeline();
                }
            });
        });

        theme::card_frame(ui).show(ui, |ui| {
            ui.set_width(ui.available_width());
            if self.session.history().is_empty() {
                ui.label(egui::RichText::new("Nothing applied yet").weak());
            }
            for (i, step) in self.session.history().iter().enumerate() {
                ui.label(format!("{}. {}", i + 1, step.describe()));
            }
        });
    }

    fn save_pipeline(&mut self) {
        let Some(path) = FileDialog::new()
            .add_filter("Pipeline", &["json"])
            .set_file_name("pipeline.json")
            .save_file()
        else {
            return;
        };
        self.status = Some(match self.session.history().save(&path) {
            Ok(()) => Status::info(format!("Pipeline saved to {}", path.display())),
            Err(e) => Status::error(e.to_string()),
        });
    }

    fn load_pipeline(&mut self) {
        let Some(path) = FileDialog::new()
            .add_filter("Pipeline", &["json"])
            .pick_file()
        else {
            return;
        };
        match TransformPipeline::load(&path) {
            Ok(pipeline) => self.dispatch(Command::ReplayPipeline(pipeline)),
            Err(e) => self.report_error(&e),
        }
    }
}
