//! PDF rendering of a tolerance test report

use chrono::Local;
use log::info;
use printpdf::*;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::classify::{StatusRow, ValueStatus};
use crate::config::ReportSettings;
use crate::diagnosis::{Finding, Severity};
use crate::error::ReportError;
use crate::report::{Report, ReportRecord};
use crate::units::{format_value, Analyte};

/// PDF document dimensions (A4)
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
/// Space kept free at the bottom of every page for the footer
const FOOTER_MM: f32 = 18.0;

/// Colors
const COLOR_RED: Color = Color::Rgb(Rgb { r: 0.8, g: 0.2, b: 0.2, icc_profile: None });
const COLOR_GREEN: Color = Color::Rgb(Rgb { r: 0.2, g: 0.6, b: 0.3, icc_profile: None });
const COLOR_ORANGE: Color = Color::Rgb(Rgb { r: 0.85, g: 0.5, b: 0.1, icc_profile: None });
const COLOR_BLUE: Color = Color::Rgb(Rgb { r: 0.2, g: 0.4, b: 0.75, icc_profile: None });
const COLOR_BLACK: Color = Color::Rgb(Rgb { r: 0.0, g: 0.0, b: 0.0, icc_profile: None });
const COLOR_GRAY: Color = Color::Rgb(Rgb { r: 0.5, g: 0.5, b: 0.5, icc_profile: None });
const COLOR_LIGHT_GRAY: Color = Color::Rgb(Rgb { r: 0.92, g: 0.92, b: 0.92, icc_profile: None });

fn color_tuple(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb { r, g, b, icc_profile: None })
}

fn severity_colors(severity: Severity) -> (Color, Color) {
    match severity {
        Severity::Normal => (COLOR_GREEN, color_tuple(0.9, 0.97, 0.9)),
        Severity::Warning => (COLOR_ORANGE, color_tuple(1.0, 0.95, 0.86)),
        Severity::Danger => (COLOR_RED, color_tuple(1.0, 0.9, 0.9)),
    }
}

fn status_color(status: Option<ValueStatus>) -> Color {
    match status {
        Some(ValueStatus::Within) => COLOR_GREEN,
        Some(ValueStatus::Below) => COLOR_BLUE,
        Some(ValueStatus::Above) => COLOR_RED,
        None => COLOR_GRAY,
    }
}

/// Render the report and write it to `path`
pub fn export_to_pdf<P: AsRef<Path>>(
    path: P,
    record: &ReportRecord,
    report: &Report,
    settings: &ReportSettings,
) -> Result<Vec<u8>, ReportError> {
    let bytes = render_pdf(record, report, settings)?;
    let mut file = File::create(path.as_ref())?;
    file.write_all(&bytes)?;
    info!("Wrote PDF report to {}", path.as_ref().display());
    Ok(bytes)
}

/// Render the report into PDF bytes
pub fn render_pdf(record: &ReportRecord, report: &Report, settings: &ReportSettings) -> Result<Vec<u8>, ReportError> {
    let mut layout = PageLayout::new();

    build_header(&mut layout, record, settings);
    build_patient_block(&mut layout, record);
    build_exam_bar(&mut layout, record);

    let config = &record.config;
    if config.curve.has_glycemia() {
        build_table(&mut layout, Analyte::Glycemia, config.glyc_unit.label(), &report.glycemic_rows);
    }
    if config.curve.has_insulin() {
        build_table(&mut layout, Analyte::Insulin, config.ins_unit.label(), &report.insulin_rows);
    }

    if !record.methodology.trim().is_empty() {
        layout.paragraph("Methodology: ", &record.methodology, 8.0);
    }

    if settings.include_charts {
        if report.glycemic_rows.iter().any(|r| r.value.is_some()) {
            build_chart(&mut layout, Analyte::Glycemia, config.glyc_unit.label(), &report.glycemic_rows);
        }
        if report.insulin_rows.iter().any(|r| r.value.is_some()) {
            build_chart(&mut layout, Analyte::Insulin, config.ins_unit.label(), &report.insulin_rows);
        }
    }

    if settings.include_interpretation && !report.findings.is_empty() {
        build_interpretation(&mut layout, &report.findings);
        if !report.sources.is_empty() {
            build_sources(&mut layout, &report.sources);
        }
    }

    if !record.notes.trim().is_empty() {
        layout.paragraph("Notes: ", &record.notes, 8.0);
    }

    let title = if settings.pdf_title.trim().is_empty() { "Report" } else { settings.pdf_title.as_str() };
    let mut doc = PdfDocument::new(title);
    let pages = layout.finish();
    let total = pages.len();
    let generated = Local::now().format("%d/%m/%Y %H:%M").to_string();

    let pages: Vec<PdfPage> = pages
        .into_iter()
        .enumerate()
        .map(|(idx, mut ops)| {
            ops.extend(footer_ops(&generated, idx + 1, total));
            PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops)
        })
        .collect();
    doc.with_pages(pages);

    let mut warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if bytes.is_empty() {
        return Err(ReportError::Pdf("empty document".to_string()));
    }
    Ok(bytes)
}

/// Top-down page cursor that breaks onto a new page when space runs out
struct PageLayout {
    pages: Vec<Vec<Op>>,
    ops: Vec<Op>,
    y: f32,
}

impl PageLayout {
    fn new() -> Self {
        Self { pages: Vec::new(), ops: Vec::new(), y: PAGE_HEIGHT_MM - MARGIN_MM }
    }

    /// Make room for a block of `height` mm, starting a page if needed
    fn reserve(&mut self, height: f32) {
        if self.y - height < MARGIN_MM + FOOTER_MM && !self.ops.is_empty() {
            self.pages.push(std::mem::take(&mut self.ops));
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
    }

    fn extend(&mut self, ops: Vec<Op>) {
        self.ops.extend(ops);
    }

    fn section_title(&mut self, title: &str) {
        self.reserve(12.0);
        self.y -= 6.0;
        self.extend(text_ops(title, 10.0, MARGIN_MM, self.y, BuiltinFont::HelveticaBold, COLOR_BLUE));
        self.y -= 2.0;
        self.extend(line_ops(MARGIN_MM, self.y, PAGE_WIDTH_MM - MARGIN_MM, self.y, COLOR_BLUE, 0.5));
        self.y -= 4.0;
    }

    /// Bold label followed by wrapped text
    fn paragraph(&mut self, label: &str, text: &str, size: f32) {
        let lines = wrap_text(&format!("{}{}", label, text.trim()), chars_per_line(size, CONTENT_WIDTH_MM));
        let line_height = size * 0.45;
        self.reserve(4.0 + line_height * lines.len() as f32);
        self.y -= 4.0;
        for (idx, line) in lines.iter().enumerate() {
            self.y -= line_height;
            if idx == 0 {
                let rest = line.strip_prefix(label).unwrap_or(line);
                self.extend(text_ops(label, size, MARGIN_MM, self.y, BuiltinFont::HelveticaBold, COLOR_BLACK));
                let offset = label.chars().count() as f32 * char_width_mm(size) * 1.1;
                self.extend(text_ops(rest, size, MARGIN_MM + offset, self.y, BuiltinFont::Helvetica, COLOR_BLACK));
            } else {
                self.extend(text_ops(line, size, MARGIN_MM, self.y, BuiltinFont::Helvetica, COLOR_BLACK));
            }
        }
    }

    fn finish(mut self) -> Vec<Vec<Op>> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.pages.push(self.ops);
        }
        self.pages
    }
}

fn build_header(layout: &mut PageLayout, record: &ReportRecord, settings: &ReportSettings) {
    let title = if settings.pdf_title.trim().is_empty() {
        "GLUCOSE TOLERANCE TEST REPORT"
    } else {
        settings.pdf_title.trim()
    };
    layout.y -= 6.0;
    layout.extend(text_ops(title, 15.0, MARGIN_MM, layout.y, BuiltinFont::HelveticaBold, COLOR_BLACK));
    layout.y -= 6.0;
    layout.extend(text_ops(
        &record.config.preset_name,
        9.0,
        MARGIN_MM,
        layout.y,
        BuiltinFont::Helvetica,
        COLOR_GRAY,
    ));
    layout.y -= 3.0;
    layout.extend(line_ops(MARGIN_MM, layout.y, PAGE_WIDTH_MM - MARGIN_MM, layout.y, COLOR_BLACK, 0.8));
}

fn build_patient_block(layout: &mut PageLayout, record: &ReportRecord) {
    let p = &record.patient;
    let rows = [
        (("Surname", p.surname.as_str()), ("Name", p.name.as_str())),
        (("Date of birth", p.birth_date.as_str()), ("Sex", p.sex.label())),
        (("Fiscal code", p.fiscal_code.as_str()), ("Exam date", p.exam_date.as_str())),
        (("Physician", p.physician.as_str()), ("Accession no.", p.accession.as_str())),
    ];

    let block_height = rows.len() as f32 * 5.0 + 4.0;
    layout.reserve(block_height + 4.0);
    layout.y -= 4.0;
    layout.extend(rect_fill_ops(MARGIN_MM, layout.y - block_height, CONTENT_WIDTH_MM, block_height, COLOR_LIGHT_GRAY));
    layout.y -= 2.0;

    let half = CONTENT_WIDTH_MM / 2.0;
    for ((left_label, left), (right_label, right)) in rows {
        layout.y -= 5.0;
        for (x, label, value) in [(MARGIN_MM + 2.0, left_label, left), (MARGIN_MM + half, right_label, right)] {
            layout.extend(text_ops(&format!("{}:", label), 8.0, x, layout.y, BuiltinFont::HelveticaBold, COLOR_GRAY));
            let shown = if value.trim().is_empty() { "-" } else { value.trim() };
            layout.extend(text_ops(shown, 9.0, x + 26.0, layout.y, BuiltinFont::Helvetica, COLOR_BLACK));
        }
    }
    layout.y -= 2.0;
}

fn build_exam_bar(layout: &mut PageLayout, record: &ReportRecord) {
    let config = &record.config;
    let criteria = if config.curve.is_pregnant {
        "Criteria: pregnancy (IADPSG / ADA 2026)"
    } else {
        "Criteria: ADA 2026 / IDF 2024"
    };
    let text = format!(
        "Test: {}   |   Load: {} g oral glucose   |   {}",
        config.preset_name, config.glucose_load, criteria
    );

    layout.reserve(10.0);
    layout.y -= 9.0;
    layout.extend(rect_fill_ops(MARGIN_MM, layout.y - 2.0, CONTENT_WIDTH_MM, 7.0, color_tuple(0.88, 0.92, 0.98)));
    layout.extend(text_ops(&text, 8.5, MARGIN_MM + 2.0, layout.y, BuiltinFont::Helvetica, COLOR_BLACK));
    layout.y -= 2.0;
}

fn build_table(layout: &mut PageLayout, analyte: Analyte, unit: &str, rows: &[StatusRow]) {
    let row_height = 5.5;
    layout.section_title(analyte.curve_title());
    layout.reserve(row_height * (rows.len() + 1) as f32);

    let col_x = [MARGIN_MM + 2.0, MARGIN_MM + 40.0, MARGIN_MM + 70.0, MARGIN_MM + 95.0, MARGIN_MM + 140.0];

    layout.extend(rect_fill_ops(MARGIN_MM, layout.y - row_height + 1.5, CONTENT_WIDTH_MM, row_height, COLOR_LIGHT_GRAY));
    layout.y -= row_height - 2.0;
    for (x, header) in col_x.iter().zip(["Time", "Value", "Unit", "Reference interval", "Status"]) {
        layout.extend(text_ops(header, 8.0, *x, layout.y, BuiltinFont::HelveticaBold, COLOR_BLACK));
    }
    layout.y -= 2.0;

    for (idx, row) in rows.iter().enumerate() {
        layout.reserve(row_height);
        layout.y -= row_height;
        if idx % 2 == 1 {
            layout.extend(rect_fill_ops(
                MARGIN_MM,
                layout.y - 1.5,
                CONTENT_WIDTH_MM,
                row_height,
                color_tuple(0.97, 0.97, 0.97),
            ));
        }

        let value = row.value.map(format_value).unwrap_or_else(|| "-".to_string());
        let range = row.range.map(|r| r.format(unit)).unwrap_or_else(|| "-".to_string());
        let status = row.status.map(|s| s.label()).unwrap_or("-");
        let color = status_color(row.status);

        layout.extend(text_ops(&row.time.label(), 8.5, col_x[0], layout.y, BuiltinFont::Helvetica, COLOR_BLACK));
        layout.extend(text_ops(&value, 8.5, col_x[1], layout.y, BuiltinFont::HelveticaBold, color.clone()));
        layout.extend(text_ops(unit, 8.5, col_x[2], layout.y, BuiltinFont::Helvetica, COLOR_GRAY));
        layout.extend(text_ops(&range, 8.5, col_x[3], layout.y, BuiltinFont::Helvetica, COLOR_BLACK));
        layout.extend(text_ops(status, 8.5, col_x[4], layout.y, BuiltinFont::HelveticaBold, color));
    }
    layout.y -= 2.0;
    layout.extend(line_ops(MARGIN_MM, layout.y, PAGE_WIDTH_MM - MARGIN_MM, layout.y, COLOR_GRAY, 0.3));
}

/// Line chart of the measured curve over its reference band
fn build_chart(layout: &mut PageLayout, analyte: Analyte, unit: &str, rows: &[StatusRow]) {
    let chart_height = 55.0;
    layout.reserve(chart_height + 30.0);
    layout.section_title(&format!("{} ({})", analyte.curve_title(), unit));

    let chart_x = MARGIN_MM + 12.0;
    let chart_width = CONTENT_WIDTH_MM - 16.0;
    let chart_y = layout.y - chart_height - 2.0;

    let (x_min, x_max) = match (rows.first(), rows.last()) {
        (Some(first), Some(last)) => (first.time.minutes() as f32, last.time.minutes() as f32),
        _ => return,
    };
    let x_span = (x_max - x_min).max(1.0);

    let top = rows
        .iter()
        .flat_map(|r| [r.value.unwrap_or(0.0), r.range.map(|g| g.max).unwrap_or(0.0)])
        .fold(0.0_f64, f64::max) as f32;
    let y_max = nice_ceiling(top * 1.1);
    let y_min = 0.0_f32;
    let y_range = (y_max - y_min).max(1.0);

    let to_x = |minutes: u16| chart_x + (minutes as f32 - x_min) / x_span * chart_width;
    let to_y = |value: f32| chart_y + ((value - y_min) / y_range * chart_height).clamp(0.0, chart_height);

    layout.extend(rect_stroke_ops(chart_x, chart_y, chart_width, chart_height, COLOR_GRAY, 0.4));

    // Y-axis grid
    for step in 0..=4 {
        let value = y_min + y_range * step as f32 / 4.0;
        let y_pos = to_y(value);
        layout.extend(line_ops(chart_x, y_pos, chart_x + chart_width, y_pos, color_tuple(0.85, 0.85, 0.85), 0.2));
        layout.extend(text_ops(
            &format_value(value as f64),
            6.5,
            MARGIN_MM,
            y_pos - 1.0,
            BuiltinFont::Helvetica,
            COLOR_GRAY,
        ));
    }

    // Reference band
    let band: Vec<(u16, f32, f32)> = rows
        .iter()
        .filter_map(|r| r.range.map(|g| (r.time.minutes(), g.min as f32, g.max as f32)))
        .collect();
    if band.len() >= 2 {
        let mut points: Vec<(f32, f32)> = band.iter().map(|(t, _, max)| (to_x(*t), to_y(*max))).collect();
        points.extend(band.iter().rev().map(|(t, min, _)| (to_x(*t), to_y(*min))));
        layout.extend(polygon_fill_ops(&points, color_tuple(0.85, 0.95, 0.85)));
    }

    // X-axis labels
    for row in rows {
        let x = to_x(row.time.minutes());
        layout.extend(text_ops(&row.time.label(), 6.5, x - 3.0, chart_y - 4.0, BuiltinFont::Helvetica, COLOR_GRAY));
    }

    // Measured curve
    let measured: Vec<(f32, f32, Option<ValueStatus>)> = rows
        .iter()
        .filter_map(|r| r.value.map(|v| (to_x(r.time.minutes()), to_y(v as f32), r.status)))
        .collect();
    for pair in measured.windows(2) {
        layout.extend(line_ops(pair[0].0, pair[0].1, pair[1].0, pair[1].1, COLOR_BLUE, 1.0));
    }
    for (x, y, status) in &measured {
        layout.extend(point_ops(*x, *y, 1.2, status_color(*status)));
    }

    layout.y = chart_y - 8.0;
}

fn build_interpretation(layout: &mut PageLayout, findings: &[Finding]) {
    layout.section_title("INTERPRETATION");
    let size = 8.0;
    let line_height = 3.6;
    let max_chars = chars_per_line(size, CONTENT_WIDTH_MM - 8.0);

    for finding in findings {
        let text = format!("{}: {}", finding.severity.prefix(), finding.message);
        let lines = wrap_text(&text, max_chars);
        let box_height = lines.len() as f32 * line_height + 3.0;
        layout.reserve(box_height + 2.0);

        let (accent, fill) = severity_colors(finding.severity);
        let top = layout.y - 1.0;
        layout.extend(rect_fill_ops(MARGIN_MM, top - box_height, CONTENT_WIDTH_MM, box_height, fill));
        layout.extend(rect_fill_ops(MARGIN_MM, top - box_height, 1.2, box_height, accent.clone()));

        layout.y = top - 1.0;
        for (idx, line) in lines.iter().enumerate() {
            layout.y -= line_height;
            let (font, color) = if idx == 0 {
                (BuiltinFont::HelveticaBold, accent.clone())
            } else {
                (BuiltinFont::Helvetica, COLOR_BLACK)
            };
            layout.extend(text_ops(line, size, MARGIN_MM + 4.0, layout.y + 0.8, font, color));
        }
        layout.y = top - box_height - 1.5;
    }
}

fn build_sources(layout: &mut PageLayout, sources: &[&str]) {
    let size = 6.5;
    let max_chars = chars_per_line(size, CONTENT_WIDTH_MM);
    layout.reserve(8.0);
    layout.y -= 4.0;
    layout.extend(text_ops("Sources:", 7.0, MARGIN_MM, layout.y, BuiltinFont::HelveticaBold, COLOR_GRAY));
    for source in sources {
        for line in wrap_text(&format!("- {}", source), max_chars) {
            layout.reserve(3.0);
            layout.y -= 3.0;
            layout.extend(text_ops(&line, size, MARGIN_MM, layout.y, BuiltinFont::Helvetica, COLOR_GRAY));
        }
    }
}

fn footer_ops(generated: &str, page: usize, total: usize) -> Vec<Op> {
    let mut ops = Vec::new();
    let y = MARGIN_MM;
    ops.extend(line_ops(MARGIN_MM, y + 6.0, PAGE_WIDTH_MM - MARGIN_MM, y + 6.0, COLOR_LIGHT_GRAY, 0.5));
    ops.extend(text_ops(
        &format!("Generated on {}", generated),
        7.0,
        MARGIN_MM,
        y + 2.0,
        BuiltinFont::Helvetica,
        COLOR_GRAY,
    ));
    ops.extend(text_ops(
        "This report supports, and does not replace, the physician's clinical evaluation.",
        6.5,
        MARGIN_MM,
        y - 2.0,
        BuiltinFont::HelveticaOblique,
        COLOR_GRAY,
    ));
    ops.extend(text_ops(
        &format!("Page {} of {}", page, total),
        7.0,
        PAGE_WIDTH_MM - MARGIN_MM - 20.0,
        y + 2.0,
        BuiltinFont::Helvetica,
        COLOR_GRAY,
    ));
    ops
}

/// Approximate Helvetica glyph width in mm
fn char_width_mm(size: f32) -> f32 {
    size * 0.5 * 0.3528
}

fn chars_per_line(size: f32, width_mm: f32) -> usize {
    ((width_mm / char_width_mm(size)) as usize).max(10)
}

/// Greedy word wrap on character count
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = current.chars().count() + word.chars().count() + usize::from(!current.is_empty());
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Builtin fonts are WinAnsi encoded; map the symbols they lack
fn pdf_safe(text: &str) -> String {
    text.replace('≥', ">=")
        .replace('≤', "<=")
        .replace('×', "x")
        .replace('↑', "")
        .replace('↓', "")
}

// Helper to create text operations
fn text_ops(text: &str, size: f32, x: f32, y: f32, font: BuiltinFont, color: Color) -> Vec<Op> {
    vec![
        Op::SetFillColor { col: color },
        Op::StartTextSection,
        Op::SetFontSizeBuiltinFont { size: Pt(size), font },
        Op::SetTextCursor { pos: Point::new(Mm(x), Mm(y)) },
        Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(pdf_safe(text))],
            font,
        },
        Op::EndTextSection,
    ]
}

fn line_ops(x1: f32, y1: f32, x2: f32, y2: f32, color: Color, width: f32) -> Vec<Op> {
    vec![
        Op::SetOutlineColor { col: color },
        Op::SetOutlineThickness { pt: Pt(width) },
        Op::DrawLine {
            line: Line {
                points: vec![
                    LinePoint { p: Point::new(Mm(x1), Mm(y1)), bezier: false },
                    LinePoint { p: Point::new(Mm(x2), Mm(y2)), bezier: false },
                ],
                is_closed: false,
            },
        },
    ]
}

fn polygon_fill_ops(points: &[(f32, f32)], color: Color) -> Vec<Op> {
    vec![
        Op::SetFillColor { col: color },
        Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing {
                    points: points
                        .iter()
                        .map(|(x, y)| LinePoint { p: Point::new(Mm(*x), Mm(*y)), bezier: false })
                        .collect(),
                }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        },
    ]
}

fn rect_fill_ops(x: f32, y: f32, width: f32, height: f32, color: Color) -> Vec<Op> {
    polygon_fill_ops(&[(x, y), (x + width, y), (x + width, y + height), (x, y + height)], color)
}

fn rect_stroke_ops(x: f32, y: f32, width: f32, height: f32, color: Color, stroke_width: f32) -> Vec<Op> {
    vec![
        Op::SetOutlineColor { col: color },
        Op::SetOutlineThickness { pt: Pt(stroke_width) },
        Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing {
                    points: vec![
                        LinePoint { p: Point::new(Mm(x), Mm(y)), bezier: false },
                        LinePoint { p: Point::new(Mm(x + width), Mm(y)), bezier: false },
                        LinePoint { p: Point::new(Mm(x + width), Mm(y + height)), bezier: false },
                        LinePoint { p: Point::new(Mm(x), Mm(y + height)), bezier: false },
                    ],
                }],
                mode: PaintMode::Stroke,
                winding_order: WindingOrder::NonZero,
            },
        },
    ]
}

fn point_ops(x: f32, y: f32, radius: f32, color: Color) -> Vec<Op> {
    rect_fill_ops(x - radius, y - radius, radius * 2.0, radius * 2.0, color)
}

/// Round up to a readable axis maximum
fn nice_ceiling(value: f32) -> f32 {
    let step = if value > 200.0 { 50.0 } else if value > 50.0 { 25.0 } else { 5.0 };
    ((value / step).ceil() * step).max(step)
}
