use crate::{
    error::{ApiError, Result},
    models::{AnalysisReport, ContentCategory, MetricsSnapshot},
    services::analytics,
};
use chrono::{DateTime, Utc};
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};
use std::{io::Write, path::PathBuf, sync::Arc};
use tokio::{io::AsyncWriteExt, sync::Mutex};
use tracing::{error, info, warn};

pub const CSV_HEADER: [&str; 9] = [
    "timestamp",
    "url",
    "impressions",
    "clicks",
    "ctr",
    "conversions",
    "engagement",
    "shares",
    "comments",
];
pub const LOG_FILE: &str = "analytics_log.csv";

#[derive(Debug)]
pub struct Download {
    pub filename: String,
    pub body: Vec<u8>,
}

/// Writes exports under one directory. CSV appends are serialized so rows
/// from concurrent requests never interleave.
pub struct Exporter {
    dir: PathBuf,
    log_lock: Mutex<()>,
}

impl Exporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            log_lock: Mutex::new(()),
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    /// Appends one row to the export log and returns header + that row.
    pub async fn export_csv(&self, report: &AnalysisReport) -> Result<Download> {
        let now = Utc::now();
        let row = csv_row(report, now);
        let line = encode_csv(None, &row)?;
        let download = encode_csv(Some(&CSV_HEADER), &row)?;

        let _guard = self.log_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            error!(dir = %self.dir.display(), error = %e, "exports directory unavailable");
            ApiError::Export(format!("exports directory unavailable: {}", e))
        })?;

        let path = self.log_path();
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        if file.metadata().await?.len() == 0 {
            file.write_all(&encode_csv(Some(&CSV_HEADER), &[])?).await?;
        }
        file.write_all(&line).await?;
        file.flush().await?;

        info!(url = %report.url, log = %path.display(), "csv export appended");
        Ok(Download {
            filename: format!("analytics_{}.csv", now.timestamp_millis()),
            body: download,
        })
    }

    /// Renders the PDF through a temporary file that is removed on every path.
    pub async fn export_pdf(&self, report: Arc<AnalysisReport>) -> Result<Download> {
        let dir = self.dir.clone();
        let body = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
            std::fs::create_dir_all(&dir)
                .map_err(|e| ApiError::Export(format!("exports directory unavailable: {}", e)))?;
            let rendered = match render_report(&report) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, "full report layout failed, falling back to basic metrics");
                    render_basic(&report)?
                }
            };

            let mut temp = tempfile::Builder::new()
                .prefix("report_")
                .suffix(".pdf")
                .tempfile_in(&dir)?;
            temp.write_all(&rendered)?;
            temp.flush()?;

            let bytes = std::fs::read(temp.path())?;
            temp.close()?;
            Ok(bytes)
        })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

        Ok(Download {
            filename: format!("report_{}.pdf", Utc::now().timestamp_millis()),
            body,
        })
    }
}

pub fn csv_row(report: &AnalysisReport, at: DateTime<Utc>) -> Vec<String> {
    let m = &report.metrics;
    let engagement = analytics::engagement(m);
    vec![
        at.to_rfc3339(),
        report.url.clone(),
        m.impressions.to_string(),
        m.clicks.to_string(),
        format!("{:.2}", m.ctr),
        m.conversions.to_string(),
        engagement.engagement.to_string(),
        engagement.shares.to_string(),
        engagement.comments.to_string(),
    ]
}

fn encode_csv(header: Option<&[&str]>, row: &[String]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if let Some(header) = header {
        writer
            .write_record(header)
            .map_err(|e| ApiError::Export(e.to_string()))?;
    }
    if !row.is_empty() {
        writer
            .write_record(row)
            .map_err(|e| ApiError::Export(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| ApiError::Export(e.to_string()))
}

// ============================================================================
// PDF report
// ============================================================================

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 20.0;
const TOP_Y: f32 = 275.0;
const BOTTOM_Y: f32 = 20.0;
const WRAP_COLUMNS: usize = 90;

pub fn render_report(report: &AnalysisReport) -> Result<Vec<u8>> {
    build_report_document(report)?
        .save_to_bytes()
        .map_err(render_err)
}

/// Single page with the raw numbers only.
pub fn render_basic(report: &AnalysisReport) -> Result<Vec<u8>> {
    build_basic_document(report)?
        .save_to_bytes()
        .map_err(render_err)
}

fn render_err(e: impl std::fmt::Display) -> ApiError {
    ApiError::Render(e.to_string())
}

struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl<'a> PageCursor<'a> {
    fn start(doc: &'a PdfDocumentReference, layer: PdfLayerReference) -> Result<Self> {
        Ok(Self {
            doc,
            layer,
            y: TOP_Y,
            regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(render_err)?,
            bold: doc
                .add_builtin_font(BuiltinFont::HelveticaBold)
                .map_err(render_err)?,
        })
    }

    fn line(&mut self, text: &str, size: f32, bold: bool) {
        if self.y < BOTTOM_Y {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP_Y;
        }
        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(pdf_safe(text), size, Mm(MARGIN_LEFT), Mm(self.y), font);
        // ~0.5mm per point of font size
        self.y -= size * 0.5;
    }

    fn heading(&mut self, text: &str) {
        self.gap(4.0);
        self.line(text, 14.0, true);
    }

    fn paragraph(&mut self, text: &str) {
        for line in wrap(text, WRAP_COLUMNS) {
            self.line(&line, 10.0, false);
        }
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }
}

fn build_report_document(report: &AnalysisReport) -> Result<PdfDocumentReference> {
    let (doc, page, layer) = PdfDocument::new(
        "Advertising Analytics Report",
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    {
        let layer = doc.get_page(page).get_layer(layer);
        let mut cursor = PageCursor::start(&doc, layer)?;

        cursor.line("Advertising Analytics Report", 20.0, true);
        cursor.gap(2.0);
        cursor.paragraph(&format!("URL: {}", report.url));
        if !report.title().is_empty() {
            cursor.paragraph(&format!("Page: {}", report.title()));
        }
        cursor.paragraph(&format!(
            "Generated: {}",
            report.generated_at.format("%Y-%m-%d %H:%M UTC")
        ));

        cursor.heading("Metrics");
        for (label, value) in metric_lines(&report.metrics) {
            cursor.line(&format!("{}: {}", label, value), 11.0, false);
        }
        cursor.line(&format!("Content category: {}", report.category), 11.0, false);
        cursor.line(
            &format!("Quality score: {:.2}", report.quality.value()),
            11.0,
            false,
        );
        if let Some(social) = &report.social {
            cursor.line(
                &format!(
                    "{} views: {}, likes: {}, comments: {}",
                    social.platform.as_str(),
                    social.views,
                    social.likes,
                    social.comments
                ),
                11.0,
                false,
            );
        }

        cursor.heading("Analysis");
        cursor.paragraph(&report.analysis);

        cursor.heading("Recommendations");
        for rec in recommendations(&report.metrics, report.category) {
            cursor.paragraph(&format!("- {}", rec));
        }
    }
    Ok(doc)
}

fn build_basic_document(report: &AnalysisReport) -> Result<PdfDocumentReference> {
    let (doc, page, layer) = PdfDocument::new(
        "Advertising Analytics Report",
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    {
        let layer = doc.get_page(page).get_layer(layer);
        let mut cursor = PageCursor::start(&doc, layer)?;
        cursor.line("Analytics Report (basic metrics only)", 16.0, true);
        cursor.gap(2.0);
        for (label, value) in metric_lines(&report.metrics) {
            cursor.line(&format!("{}: {}", label, value), 11.0, false);
        }
    }
    Ok(doc)
}

fn metric_lines(m: &MetricsSnapshot) -> Vec<(&'static str, String)> {
    vec![
        ("Impressions", m.impressions.to_string()),
        ("Clicks", m.clicks.to_string()),
        ("CTR", format!("{:.2}%", m.ctr)),
        ("Conversions", m.conversions.to_string()),
        ("Conversion rate", format!("{:.2}%", m.conversion_rate)),
        ("Engagement rate", format!("{:.2}%", m.engagement_rate)),
    ]
}

pub fn recommendations(metrics: &MetricsSnapshot, category: ContentCategory) -> Vec<String> {
    let mut recs = Vec::new();

    if metrics.ctr < 2.0 {
        recs.push(format!(
            "Click-through rate is below 2% ({:.2}%): test stronger headlines and clearer calls to action.",
            metrics.ctr
        ));
    } else {
        recs.push(format!(
            "CTR of {:.2}% is healthy: shift budget toward the best performing placements.",
            metrics.ctr
        ));
    }

    if metrics.conversion_rate < 1.0 {
        recs.push(
            "Conversion rate is low: tighten landing page relevance and shorten the sign-up path."
                .to_string(),
        );
    } else {
        recs.push("Conversions are on track: retarget engaged visitors to lift volume.".to_string());
    }

    if metrics.impressions < 10_000 {
        recs.push(
            "Reach is limited: broaden targeting or raise budget to collect more data.".to_string(),
        );
    }

    recs.push(
        match category {
            ContentCategory::Ecommerce => {
                "Surface product reviews and price comparisons to strengthen purchase intent."
            }
            ContentCategory::Social => {
                "Post on a steady schedule and reply to comments to keep engagement up."
            }
            ContentCategory::Blog => {
                "Add in-article ad slots and related-content links to monetize long reads."
            }
            ContentCategory::General => {
                "Clarify the page's primary offer so campaigns can target a specific audience."
            }
        }
        .to_string(),
    );

    recs
}

/// Builtin PDF fonts only cover a Latin subset.
fn pdf_safe(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '•' => '-',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => ' ',
        })
        .collect()
}

fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        let mut current = String::new();
        for word in raw.split_whitespace() {
            if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > columns {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    lines
}
