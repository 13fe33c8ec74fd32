use crate::theme;
use eframe::egui;

pub fn render_help(ui: &mut egui::Ui) {
    ui.heading("How to use quickeda");
    ui.add_space(theme::SPACING_SMALL);

    theme::card_frame(ui).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.label("1. Upload a CSV or spreadsheet. The first sheet is read.");
        ui.label("2. Fix column types on the Types page if the guess was wrong.");
        ui.label("3. Clean the data on the Transform page. Steps stack up and can be saved as a pipeline.");
        ui.label("4. Pick the columns to profile, then generate a report.");
        ui.label("5. Download the report and the cleaned dataset.");
    });

    ui.add_space(theme::SPACING_MEDIUM);
    theme::card_frame(ui).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.heading("Transformations");
        ui.add_space(theme::SPACING_SMALL);
        ui.collapsing("Missing values", |ui| {
            ui.label("• Drop rows: removes every row with a null in a selected column.");
            ui.label("• Mean / median: numeric columns only; other columns are skipped with a warning.");
            ui.label("• Mode: most frequent value per column, works for text. Ties go to the smallest value.");
        });
        ui.collapsing("Outliers", |ui| {
            ui.label("• Z-score: drops rows whose |value - mean| / std is above the threshold.");
            ui.label("• IQR: drops rows outside [Q1 - k·IQR, Q3 + k·IQR]. Values on a fence are kept.");
            ui.label("Nulls are never treated as outliers.");
        });
        ui.collapsing("Scaling", |ui| {
            ui.label("• Log: ln(1 + x). Refused when any value is -1 or below.");
            ui.label("• Standardize: mean 0, standard deviation 1.");
            ui.label("• Normalize: min becomes 0, max becomes 1.");
            ui.label("A constant column cannot be rescaled and is reported in the status bar.");
        });
        ui.collapsing("Encoding", |ui| {
            ui.label("• Label: sorted distinct values become 0, 1, 2, …");
            ui.label("• One-hot: one true/false column per value, named column_value. The original column is dropped.");
        });
    });

    ui.add_space(theme::SPACING_MEDIUM);
    theme::card_frame(ui).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.heading("Command line");
        ui.label("Run with a subcommand to skip the window:");
        ui.monospace("quickeda info data.csv");
        ui.monospace("quickeda profile data.csv --minimal --columns age,city");
        ui.monospace("quickeda transform data.csv --pipeline pipeline.json -o clean.xlsx");
        ui.add_space(theme::SPACING_SMALL);
        ui.label("Set RUST_LOG=debug for detailed logs.");
    });
}

pub fn render_about(ui: &mut egui::Ui) {
    ui.heading("About");
    ui.add_space(theme::SPACING_SMALL);
    theme::card_frame(ui).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.label(egui::RichText::new(format!("quickeda {}", env!("CARGO_PKG_VERSION"))).strong());
        ui.label(env!("CARGO_PKG_DESCRIPTION"));
        ui.add_space(theme::SPACING_SMALL);
        ui.label("Everything runs locally. Files never leave this machine.");
        match quickeda::logging::get_current_log_path() {
            Ok(path) => ui.label(format!("Log file: {}", path.display())),
            Err(e) => ui.label(format!("Log file unavailable: {e}")),
        };
        ui.label(format!(
            "Settings: {}",
            quickeda::config::get_config_path().display()
        ));
    });
}
