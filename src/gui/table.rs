use eframe::egui;
use polars::prelude::DataFrame;
use quickeda::dataset::{ColumnKind, text_values};

const MAX_CELL_CHARS: usize = 40;

fn clip(value: &str) -> String {
    if value.chars().count() > MAX_CELL_CHARS {
        let mut clipped: String = value.chars().take(MAX_CELL_CHARS - 1).collect();
        clipped.push('…');
        clipped
    } else {
        value.to_owned()
    }
}

/// Striped grid with a `name (kind)` header; nulls render as a faint `null`.
pub fn render_frame(ui: &mut egui::Ui, id: &str, df: &DataFrame) {
    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        match text_values(series) {
            Ok(values) => columns.push((
                series.name().to_string(),
                ColumnKind::of(series.dtype()),
                values,
            )),
            Err(e) => {
                ui.colored_label(crate::theme::ERROR_COLOR, format!("Cannot display table: {e}"));
                return;
            }
        }
    }

    egui::ScrollArea::horizontal().id_salt(id).show(ui, |ui| {
        egui::Grid::new(id)
            .striped(true)
            .spacing([16.0, 4.0])
            .show(ui, |ui| {
                for (name, kind, _) in &columns {
                    ui.label(egui::RichText::new(name).strong())
                        .on_hover_text(kind.as_str());
                }
                ui.end_row();

                for row in 0..df.height() {
                    for (_, _, values) in &columns {
                        match values.get(row).and_then(Option::as_deref) {
                            Some(v) => {
                                ui.label(clip(v)).on_hover_text(v);
                            }
                            None => {
                                ui.label(egui::RichText::new("null").weak().italics());
                            }
                        }
                    }
                    ui.end_row();
                }
            });
    });
}
