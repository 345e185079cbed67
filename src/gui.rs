//! GUI for curve reports using egui

use eframe::egui;
use egui_plot::{Legend, Line, LineStyle, Plot, PlotPoints, Points};
use std::fs;
use std::path::{Path, PathBuf};

use crate::classify::{StatusRow, ValueStatus};
use crate::config::{default_export_dir, settings_file_path, Config, ReportSettings};
use crate::curve::{format_times, PRESETS};
use crate::diagnosis::{overall_severity, Severity};
use crate::error::ReportError;
use crate::export::export_to_pdf;
use crate::reference::ReferenceRange;
use crate::report::Sex;
use crate::session::Session;
use crate::storage::{ArchiveStats, ReportSummary, Storage};
use crate::units::{format_value, Analyte, GlycemiaUnit, InsulinUnit};

#[derive(PartialEq, Clone, Copy)]
enum Tab {
    Setup,
    Data,
    Results,
    Pdf,
    Archive,
}

#[derive(PartialEq, Clone, Copy)]
enum MessageKind {
    Info,
    Success,
    Error,
}

/// Main application state
pub struct CurveReportApp {
    db_path: PathBuf,
    settings: ReportSettings,
    session: Session,

    // UI state
    current_tab: Tab,
    glyc_times_input: String,
    ins_times_input: String,
    message: String,
    message_kind: MessageKind,

    // Archive
    archive: Vec<ReportSummary>,
    archive_stats: ArchiveStats,
    archive_query: String,
    confirm_clear: bool,
}

impl CurveReportApp {
    pub fn new(cc: &eframe::CreationContext<'_>, db_path: PathBuf, config: &Config) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());

        let settings = ReportSettings::load_or_default(settings_file_path());
        let mut session = Session::new();
        session.glucose_load = config.glucose_load;
        session.glyc_unit = config.glyc_unit;
        session.ins_unit = config.ins_unit;
        session.options = config.evaluation_options();
        session.methodology = settings.methodology.clone();
        session.notes = settings.default_notes.clone();

        let mut app = Self {
            db_path,
            settings,
            session,
            current_tab: Tab::Setup,
            glyc_times_input: String::new(),
            ins_times_input: String::new(),
            message: String::new(),
            message_kind: MessageKind::Info,
            archive: Vec::new(),
            archive_stats: ArchiveStats::default(),
            archive_query: String::new(),
            confirm_clear: false,
        };
        app.refresh_archive();
        app
    }

    fn set_message(&mut self, kind: MessageKind, message: impl Into<String>) {
        self.message_kind = kind;
        self.message = message.into();
    }

    fn report_result<T>(&mut self, result: Result<T, ReportError>, success: impl FnOnce(&T) -> String) -> Option<T> {
        match result {
            Ok(value) => {
                let text = success(&value);
                self.set_message(MessageKind::Success, text);
                Some(value)
            }
            Err(e) => {
                self.set_message(MessageKind::Error, format!("✗ {}", e));
                None
            }
        }
    }

    fn storage(&self) -> Result<Storage, ReportError> {
        Storage::new(&self.db_path)
    }

    fn refresh_archive(&mut self) {
        if let Ok(storage) = self.storage() {
            self.archive = storage.search_reports(&self.archive_query).unwrap_or_default();
            self.archive_stats = storage.stats().unwrap_or_default();
        }
    }

    fn sync_time_inputs(&mut self) {
        self.glyc_times_input = format_times(&self.session.curve().glyc_times);
        self.ins_times_input = format_times(&self.session.curve().ins_times);
    }

    /// Archive the current session, render the PDF and cache it
    fn export_pdf(&mut self) {
        let surname = self.session.patient.surname.trim().replace(' ', "_");
        let default_name = if surname.is_empty() {
            format!("curve_report_{}.pdf", chrono::Local::now().format("%Y%m%d"))
        } else {
            format!("curve_report_{}_{}.pdf", surname, self.session.patient.name.trim().replace(' ', "_"))
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("PDF", &["pdf"])
            .set_directory(default_export_dir())
            .set_file_name(&default_name)
            .save_file()
        else {
            return;
        };

        let result = self.save_and_export(&path);
        self.report_result(result, |id| format!("✓ Report {} exported to {}", id, path.display()));
        self.refresh_archive();
    }

    fn save_and_export(&self, path: &Path) -> Result<String, ReportError> {
        let storage = self.storage()?;
        let record = storage.save_report(&self.session.to_record()?)?;
        let bytes = export_to_pdf(path, &record, &record.report(), &self.settings)?;
        storage.store_pdf(&record.id, &bytes)?;
        Ok(record.id)
    }

    fn load_report(&mut self, id: &str) {
        let result = self.storage().and_then(|s| s.load_report(id));
        if let Some(record) = self.report_result(result, |r| format!("Loaded report for {}", r.patient.full_name())) {
            self.session.load_record(&record);
            self.sync_time_inputs();
            self.current_tab = Tab::Data;
        }
    }

    fn delete_report(&mut self, id: &str) {
        let result = self.storage().and_then(|s| s.delete_report(id));
        self.report_result(result, |_| "Report deleted".to_string());
        self.refresh_archive();
    }

    fn save_cached_pdf(&mut self, summary: &ReportSummary) {
        let pdf = match self.storage().and_then(|s| s.load_pdf(&summary.id)) {
            Ok(Some(pdf)) => pdf,
            Ok(None) => {
                self.set_message(MessageKind::Error, "PDF not cached. Load the report and export it again.");
                return;
            }
            Err(e) => {
                self.set_message(MessageKind::Error, format!("✗ {}", e));
                return;
            }
        };

        let name = format!("curve_report_{}_{}.pdf", summary.surname, summary.name);
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("PDF", &["pdf"])
            .set_directory(default_export_dir())
            .set_file_name(&name)
            .save_file()
        {
            let result = fs::write(&path, pdf).map_err(ReportError::from);
            self.report_result(result, |_| format!("✓ PDF saved to {}", path.display()));
        }
    }

    fn export_archive(&mut self) {
        let name = format!("curve_archive_{}.json", chrono::Local::now().format("%Y%m%d"));
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_directory(default_export_dir())
            .set_file_name(&name)
            .save_file()
        {
            let result = self
                .storage()
                .and_then(|s| s.export_json())
                .and_then(|json| fs::write(&path, json).map_err(ReportError::from));
            self.report_result(result, |_| format!("✓ Archive exported to {}", path.display()));
        }
    }

    fn import_archive(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_directory(default_export_dir())
            .pick_file()
        {
            let result = fs::read_to_string(&path)
                .map_err(ReportError::from)
                .and_then(|json| self.storage()?.import_json(&json));
            self.report_result(result, |added| format!("✓ Imported {} reports", added));
            self.refresh_archive();
        }
    }

    fn severity_color(severity: Severity) -> egui::Color32 {
        match severity {
            Severity::Normal => egui::Color32::from_rgb(40, 150, 70),
            Severity::Warning => egui::Color32::from_rgb(210, 130, 20),
            Severity::Danger => egui::Color32::from_rgb(200, 40, 40),
        }
    }

    fn status_color(status: Option<ValueStatus>) -> egui::Color32 {
        match status {
            Some(ValueStatus::Within) => egui::Color32::from_rgb(40, 150, 70),
            Some(ValueStatus::Below) => egui::Color32::from_rgb(50, 100, 200),
            Some(ValueStatus::Above) => egui::Color32::from_rgb(200, 40, 40),
            None => egui::Color32::GRAY,
        }
    }

    fn unit_label(&self, analyte: Analyte) -> &'static str {
        match analyte {
            Analyte::Glycemia => self.session.glyc_unit.label(),
            Analyte::Insulin => self.session.ins_unit.label(),
        }
    }

    fn show_setup(&mut self, ui: &mut egui::Ui) {
        ui.heading("Test type");
        ui.separator();

        let current = self.session.preset().map(|p| p.id);
        let mut selected = None;
        ui.horizontal_wrapped(|ui| {
            for preset in PRESETS {
                let label = format!("{}\n{} · {}", preset.name, preset.points_label(), preset.description);
                if ui.selectable_label(current == Some(preset.id), label).clicked() {
                    selected = Some(preset.id);
                }
            }
        });
        if let Some(id) = selected {
            let result = self.session.select_preset(id);
            self.report_result(result, |p| format!("Preset: {}", p.name));
            self.sync_time_inputs();
        }

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            let mut pregnant = self.session.curve().is_pregnant;
            if ui.checkbox(&mut pregnant, "Pregnancy (GDM criteria)").changed() {
                self.session.set_pregnant(pregnant);
            }
            let mut combined = self.session.curve().is_combined;
            if ui.checkbox(&mut combined, "Combined insulin curve").changed() {
                self.session.set_combined(combined);
                self.sync_time_inputs();
            }
            ui.checkbox(&mut self.session.options.hypoglycemia_screening, "Hypoglycemia screening");
        });

        ui.add_space(10.0);
        egui::Grid::new("setup_grid").num_columns(2).spacing([10.0, 6.0]).show(ui, |ui| {
            ui.label("Glycemic times (min):");
            ui.text_edit_singleline(&mut self.glyc_times_input);
            ui.end_row();

            ui.label("Insulin times (min):");
            ui.add_enabled(
                self.session.curve().is_combined,
                egui::TextEdit::singleline(&mut self.ins_times_input),
            );
            ui.end_row();

            ui.label("Glucose load (g):");
            ui.add(egui::DragValue::new(&mut self.session.glucose_load).range(1..=200));
            ui.end_row();

            ui.label("Glycemia unit:");
            egui::ComboBox::from_id_salt("glyc_unit")
                .selected_text(self.session.glyc_unit.label())
                .show_ui(ui, |ui| {
                    for unit in GlycemiaUnit::all() {
                        ui.selectable_value(&mut self.session.glyc_unit, unit, unit.label());
                    }
                });
            ui.end_row();

            ui.label("Insulin unit:");
            egui::ComboBox::from_id_salt("ins_unit")
                .selected_text(self.session.ins_unit.label())
                .show_ui(ui, |ui| {
                    for unit in InsulinUnit::all() {
                        ui.selectable_value(&mut self.session.ins_unit, unit, unit.label());
                    }
                });
            ui.end_row();
        });

        if ui.button("Apply times").clicked() {
            let ins = if self.session.curve().is_combined { self.ins_times_input.clone() } else { String::new() };
            let glyc = self.glyc_times_input.clone();
            let result = self.session.apply_time_inputs(&glyc, &ins);
            self.report_result(result, |_| "Sampling times updated".to_string());
            self.sync_time_inputs();
        }

        ui.add_space(15.0);
        ui.horizontal(|ui| {
            ui.heading("Reference ranges");
            if ui.button("Reset to defaults").clicked() {
                self.session.reset_ranges();
                self.set_message(MessageKind::Info, "Reference ranges restored");
            }
        });
        ui.separator();
        for analyte in [Analyte::Glycemia, Analyte::Insulin] {
            self.show_range_editor(ui, analyte);
        }
    }

    fn show_range_editor(&mut self, ui: &mut egui::Ui, analyte: Analyte) {
        let entries = self.session.ranges(analyte).entries().to_vec();
        if entries.is_empty() {
            return;
        }
        ui.label(egui::RichText::new(analyte.curve_title()).strong());

        let mut rejected = false;
        egui::Grid::new(("range_editor", analyte.label())).num_columns(3).show(ui, |ui| {
            for entry in entries {
                let mut range = entry.range;
                ui.label(entry.time.label());
                let min_changed = ui.add(egui::DragValue::new(&mut range.min).prefix("min ")).changed();
                let max_changed = ui.add(egui::DragValue::new(&mut range.max).prefix("max ")).changed();
                if (min_changed || max_changed) && !self.session.override_range(analyte, entry.time, range) {
                    rejected = true;
                }
                ui.end_row();
            }
        });
        if rejected {
            self.set_message(MessageKind::Error, "Minimum cannot exceed maximum");
        }
        ui.add_space(8.0);
    }

    fn show_data(&mut self, ui: &mut egui::Ui) {
        ui.heading("Patient");
        ui.separator();

        let patient = &mut self.session.patient;
        egui::Grid::new("patient_grid").num_columns(4).spacing([10.0, 6.0]).show(ui, |ui| {
            ui.label("Surname:");
            ui.text_edit_singleline(&mut patient.surname);
            ui.label("Name:");
            ui.text_edit_singleline(&mut patient.name);
            ui.end_row();

            ui.label("Date of birth:");
            ui.text_edit_singleline(&mut patient.birth_date);
            ui.label("Sex:");
            ui.horizontal(|ui| {
                ui.selectable_value(&mut patient.sex, Sex::Male, "M");
                ui.selectable_value(&mut patient.sex, Sex::Female, "F");
            });
            ui.end_row();

            ui.label("Fiscal code:");
            ui.text_edit_singleline(&mut patient.fiscal_code);
            ui.label("Exam date:");
            ui.text_edit_singleline(&mut patient.exam_date);
            ui.end_row();

            ui.label("Physician:");
            ui.text_edit_singleline(&mut patient.physician);
            ui.label("Accession no.:");
            ui.text_edit_singleline(&mut patient.accession);
            ui.end_row();
        });

        ui.add_space(15.0);
        if !self.session.curve().has_glycemia() && !self.session.curve().has_insulin() {
            ui.label("Choose a test type in Setup first.");
            return;
        }

        ui.columns(2, |columns| {
            self.show_value_entry(&mut columns[0], Analyte::Glycemia);
            self.show_value_entry(&mut columns[1], Analyte::Insulin);
        });

        ui.add_space(10.0);
        if ui.button("Show results").clicked() {
            self.current_tab = Tab::Results;
        }
    }

    fn show_value_entry(&mut self, ui: &mut egui::Ui, analyte: Analyte) {
        let times = self.session.times(analyte).to_vec();
        if times.is_empty() {
            return;
        }
        let unit = self.unit_label(analyte);
        ui.label(egui::RichText::new(analyte.curve_title()).strong());

        egui::Grid::new(("entry", analyte.label())).num_columns(4).show(ui, |ui| {
            for (idx, time) in times.iter().enumerate() {
                ui.label(time.entry_label());
                if let Some(input) = self.session.inputs_mut(analyte).get_mut(idx) {
                    ui.add(egui::TextEdit::singleline(input).desired_width(70.0));
                }
                ui.label(unit);
                let row = self.session.status_rows(analyte).get(idx).cloned();
                if let Some(row) = row {
                    let text = row.status.map(|s| s.table_label()).unwrap_or("");
                    ui.colored_label(Self::status_color(row.status), text);
                }
                ui.end_row();
            }
        });
    }

    fn show_results(&mut self, ui: &mut egui::Ui) {
        let findings = self.session.findings();

        egui::ScrollArea::vertical().show(ui, |ui| {
            for analyte in [Analyte::Glycemia, Analyte::Insulin] {
                let rows = self.session.status_rows(analyte);
                if rows.is_empty() {
                    continue;
                }
                ui.heading(analyte.curve_title());
                ui.separator();
                self.show_result_table(ui, analyte, &rows);
                self.show_curve_plot(ui, analyte, &rows);
                ui.add_space(15.0);
            }

            ui.heading("Interpretation");
            ui.separator();
            if findings.is_empty() {
                ui.label("Enter values to see the interpretation.");
            } else {
                let overall = overall_severity(&findings);
                ui.colored_label(
                    Self::severity_color(overall),
                    egui::RichText::new(format!("Overall: {}", overall.label())).strong(),
                );
                for finding in &findings {
                    ui.group(|ui| {
                        ui.colored_label(
                            Self::severity_color(finding.severity),
                            egui::RichText::new(finding.severity.prefix()).strong(),
                        );
                        ui.label(&finding.message);
                    });
                }
            }
        });
    }

    fn show_result_table(&self, ui: &mut egui::Ui, analyte: Analyte, rows: &[StatusRow]) {
        let unit = self.unit_label(analyte);
        egui::Grid::new(("results", analyte.label()))
            .num_columns(4)
            .striped(true)
            .spacing([20.0, 4.0])
            .show(ui, |ui| {
                ui.strong("Time");
                ui.strong(format!("Value ({})", unit));
                ui.strong("Reference interval");
                ui.strong("Status");
                ui.end_row();

                for row in rows {
                    ui.label(row.time.label());
                    ui.label(row.value.map(format_value).unwrap_or_else(|| "-".to_string()));
                    ui.label(row.range.map(|r| r.format(unit)).unwrap_or_else(|| "-".to_string()));
                    ui.colored_label(
                        Self::status_color(row.status),
                        row.status.map(|s| s.table_label()).unwrap_or("-"),
                    );
                    ui.end_row();
                }
            });
    }

    fn show_curve_plot(&self, ui: &mut egui::Ui, analyte: Analyte, rows: &[StatusRow]) {
        let ranges: Vec<(f64, ReferenceRange)> = rows
            .iter()
            .filter_map(|r| r.range.map(|g| (r.time.minutes() as f64, g)))
            .collect();
        let measured: Vec<[f64; 2]> = rows
            .iter()
            .filter_map(|r| r.value.map(|v| [r.time.minutes() as f64, v]))
            .collect();

        let min_line = Line::new("Reference min", PlotPoints::from_iter(ranges.iter().map(|(t, g)| [*t, g.min])))
            .color(egui::Color32::from_rgb(120, 180, 120))
            .style(LineStyle::dashed_dense());
        let max_line = Line::new("Reference max", PlotPoints::from_iter(ranges.iter().map(|(t, g)| [*t, g.max])))
            .color(egui::Color32::from_rgb(120, 180, 120))
            .style(LineStyle::dashed_dense());
        let curve = Line::new(analyte.label(), PlotPoints::from(measured.clone()))
            .color(egui::Color32::from_rgb(50, 100, 200))
            .width(2.0);
        let points = Points::new(format!("{} values", analyte.label()), PlotPoints::from(measured))
            .radius(4.0)
            .color(egui::Color32::from_rgb(50, 100, 200));

        Plot::new(("curve_plot", analyte.label()))
            .height(220.0)
            .show_axes(true)
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                plot_ui.line(min_line);
                plot_ui.line(max_line);
                plot_ui.line(curve);
                plot_ui.points(points);
            });
    }

    fn show_pdf(&mut self, ui: &mut egui::Ui) {
        ui.heading("Report settings");
        ui.separator();

        egui::Grid::new("pdf_grid").num_columns(2).spacing([10.0, 6.0]).show(ui, |ui| {
            ui.label("Title:");
            ui.text_edit_singleline(&mut self.settings.pdf_title);
            ui.end_row();

            ui.label("Methodology:");
            ui.text_edit_multiline(&mut self.session.methodology);
            ui.end_row();

            ui.label("Notes:");
            ui.text_edit_multiline(&mut self.session.notes);
            ui.end_row();
        });
        ui.checkbox(&mut self.settings.include_interpretation, "Include interpretation");
        ui.checkbox(&mut self.settings.include_charts, "Include charts");

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            if ui.button("Save as default settings").clicked() {
                self.settings.methodology = self.session.methodology.clone();
                self.settings.default_notes = self.session.notes.clone();
                let result = self.settings.save(settings_file_path());
                self.report_result(result, |_| "✓ Settings saved".to_string());
            }
            if ui.button("Save report and export PDF").clicked() {
                self.export_pdf();
            }
        });
    }

    fn show_archive(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Archive");
            ui.label(format!(
                "{} reports · {} patients · {} pregnancy",
                self.archive_stats.reports, self.archive_stats.patients, self.archive_stats.pregnant
            ));
        });
        ui.separator();

        ui.horizontal(|ui| {
            ui.label("Search:");
            if ui.text_edit_singleline(&mut self.archive_query).changed() {
                self.refresh_archive();
            }
            if ui.button("Export JSON").clicked() {
                self.export_archive();
            }
            if ui.button("Import JSON").clicked() {
                self.import_archive();
            }
            if ui.button("Clear archive").clicked() {
                self.confirm_clear = true;
            }
        });

        if self.archive.is_empty() {
            ui.label("No reports saved.");
            return;
        }

        let mut action: Option<(ArchiveAction, ReportSummary)> = None;
        egui::ScrollArea::vertical().id_salt("archive_list").show(ui, |ui| {
            egui::Grid::new("archive_grid").num_columns(5).striped(true).show(ui, |ui| {
                for summary in &self.archive {
                    ui.label(summary.patient_label());
                    ui.label(&summary.exam_date);
                    ui.label(&summary.preset_name);
                    ui.label(summary.created_at.get(..16).unwrap_or(summary.created_at.as_str()));
                    ui.horizontal(|ui| {
                        if ui.button("Load").clicked() {
                            action = Some((ArchiveAction::Load, summary.clone()));
                        }
                        if ui.add_enabled(summary.has_pdf, egui::Button::new("PDF")).clicked() {
                            action = Some((ArchiveAction::SavePdf, summary.clone()));
                        }
                        if ui.button("Delete").clicked() {
                            action = Some((ArchiveAction::Delete, summary.clone()));
                        }
                    });
                    ui.end_row();
                }
            });
        });

        match action {
            Some((ArchiveAction::Load, summary)) => self.load_report(&summary.id),
            Some((ArchiveAction::SavePdf, summary)) => self.save_cached_pdf(&summary),
            Some((ArchiveAction::Delete, summary)) => self.delete_report(&summary.id),
            None => {}
        }
    }
}

enum ArchiveAction {
    Load,
    SavePdf,
    Delete,
}

impl eframe::App for CurveReportApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Curve Report");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if !self.message.is_empty() {
                        let color = match self.message_kind {
                            MessageKind::Success => egui::Color32::from_rgb(40, 150, 70),
                            MessageKind::Error => egui::Color32::from_rgb(200, 40, 40),
                            MessageKind::Info => egui::Color32::GRAY,
                        };
                        ui.colored_label(color, &self.message);
                    }
                });
            });
            ui.separator();
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.current_tab, Tab::Setup, "1. Setup");
                ui.selectable_value(&mut self.current_tab, Tab::Data, "2. Data");
                ui.selectable_value(&mut self.current_tab, Tab::Results, "3. Results");
                ui.selectable_value(&mut self.current_tab, Tab::Pdf, "4. PDF");
                if ui.selectable_value(&mut self.current_tab, Tab::Archive, "Archive").clicked() {
                    self.refresh_archive();
                }
            });
        });

        if self.confirm_clear {
            egui::Window::new("Clear archive")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ctx, |ui| {
                    ui.label("Delete every saved report and cached PDF?");
                    ui.horizontal(|ui| {
                        if ui.button("Delete all").clicked() {
                            let result = self.storage().and_then(|s| s.clear());
                            self.report_result(result, |n| format!("Removed {} reports", n));
                            self.confirm_clear = false;
                            self.refresh_archive();
                        }
                        if ui.button("Cancel").clicked() {
                            self.confirm_clear = false;
                        }
                    });
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().id_salt("main_scroll").show(ui, |ui| match self.current_tab {
                Tab::Setup => self.show_setup(ui),
                Tab::Data => self.show_data(ui),
                Tab::Results => self.show_results(ui),
                Tab::Pdf => self.show_pdf(ui),
                Tab::Archive => self.show_archive(ui),
            });
        });
    }
}

/// Run the GUI application
pub fn run_gui(db_path: PathBuf, config: Config) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 800.0])
            .with_min_inner_size([800.0, 600.0]),
        vsync: true,
        ..Default::default()
    };

    eframe::run_native(
        "Curve Report",
        options,
        Box::new(move |cc| Ok(Box::new(CurveReportApp::new(cc, db_path, &config)))),
    )
}
