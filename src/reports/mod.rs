//! Report assemblers.
//!
//! Each submodule owns one serde-deserialisable data struct and a pure
//! mapping from it onto PDF [`Block`]s or a [`Workbook`]. Missing fields
//! deserialise to empty strings and lists, and every field has a rendering.
//! [`ReportGenerator`] ties the mappings to asset resolution, layout and
//! file naming.

pub mod action_plan;
pub mod business_card;
pub mod cash_report;
pub mod checklist;
pub mod contract;
pub mod hygiene;
pub mod kpi_dashboard;
pub mod monthly;
pub mod monthly_workbook;
pub mod proposal;
pub mod status;
pub mod stock_count;
pub mod visit_note;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use log::info;

use crate::assets::{AssetResolver, Fetch};
use crate::builder::DocumentBuilder;
use crate::color::Rgb;
use crate::config::{BrandConfig, EngineConfig, Palette};
use crate::filename::report_filename;
use crate::layout::FooterSpec;
use crate::model::{Block, BulletList, FreeTextBox, NumberedList, SectionHeader};
use crate::qr::ContactCard;
use crate::workbook::Workbook;
use crate::Result;

pub const PDF_MIME: &str = "application/pdf";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A finished artifact ready to be downloaded or written to disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

impl GeneratedFile {
    /// Writes the file into `directory` under its generated name.
    pub fn write_into(&self, directory: impl AsRef<Path>) -> Result<PathBuf> {
        let path = directory.as_ref().join(&self.filename);
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Brand, palette and report date shared by the assemblers.
#[derive(Clone, Copy, Debug)]
pub struct ReportContext<'a> {
    pub brand: &'a BrandConfig,
    pub palette: &'a Palette,
    pub date: NaiveDate,
}

impl<'a> ReportContext<'a> {
    pub fn new(config: &'a EngineConfig, date: NaiveDate) -> Self {
        Self {
            brand: &config.brand,
            palette: &config.palette,
            date,
        }
    }

    /// Report date as `dd.mm.yyyy`.
    pub fn date_label(&self) -> String {
        self.date.format("%d.%m.%Y").to_string()
    }
}

/// `2024-05-01` becomes `01.05.2024`; anything else is kept as typed.
pub fn display_date(value: &str) -> String {
    let value = value.trim();
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => date.format("%d.%m.%Y").to_string(),
        Err(_) => value.to_owned(),
    }
}

/// The text, or `-` when blank.
pub(crate) fn or_dash(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_owned()
    } else {
        value.trim().to_owned()
    }
}

fn non_blank(items: &[String]) -> Vec<&str> {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Section header plus bullets, or nothing when the list is empty.
pub(crate) fn bullet_section(label: &str, items: &[String], marker: Rgb) -> Vec<Block> {
    let items = non_blank(items);
    if items.is_empty() {
        return Vec::new();
    }
    vec![
        SectionHeader::new(label).with_accent(marker).into(),
        BulletList::new(items).with_marker(marker).into(),
    ]
}

/// Section header plus a numbered list, or nothing when the list is empty.
pub(crate) fn numbered_section(label: &str, items: &[String], marker: Rgb) -> Vec<Block> {
    let items = non_blank(items);
    if items.is_empty() {
        return Vec::new();
    }
    vec![
        SectionHeader::new(label).with_accent(marker).into(),
        NumberedList::new(items).with_marker(marker).into(),
    ]
}

/// Section header plus a text box, or nothing when the text is blank.
pub(crate) fn text_section(label: &str, body: &str, accent: Rgb) -> Vec<Block> {
    if body.trim().is_empty() {
        return Vec::new();
    }
    vec![
        SectionHeader::new(label).with_accent(accent).into(),
        FreeTextBox::new(body.trim()).with_accent(accent).into(),
    ]
}

/// Renders reports into [`GeneratedFile`]s.
///
/// A generator is cheap to keep around; every call builds its own resolver,
/// layout engine and workbook.
pub struct ReportGenerator {
    config: EngineConfig,
    fetcher: Arc<dyn Fetch>,
}

impl ReportGenerator {
    /// Generator fetching remote assets over HTTP.
    #[cfg(feature = "http")]
    pub fn new(config: EngineConfig) -> Self {
        let fetcher = Arc::new(crate::assets::HttpFetcher::new(&config.assets));
        Self::with_fetcher(config, fetcher)
    }

    pub fn with_fetcher(config: EngineConfig, fetcher: Arc<dyn Fetch>) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn resolver(&self) -> AssetResolver {
        AssetResolver::new(self.fetcher.clone(), &self.config.assets)
    }

    fn render_pdf(
        &self,
        report_type: &str,
        entity: &str,
        title: &str,
        blocks: Vec<Block>,
        resolver: &mut AssetResolver,
        date: NaiveDate,
    ) -> Result<GeneratedFile> {
        let footer = FooterSpec::from_brand(&self.config.brand);
        self.render_pdf_with_footer(report_type, entity, title, blocks, resolver, date, footer)
    }

    #[allow(clippy::too_many_arguments)]
    fn render_pdf_with_footer(
        &self,
        report_type: &str,
        entity: &str,
        title: &str,
        blocks: Vec<Block>,
        resolver: &mut AssetResolver,
        date: NaiveDate,
        footer: FooterSpec,
    ) -> Result<GeneratedFile> {
        let fonts = resolver.resolve_fonts();
        let ascii_only = !fonts.is_unicode();
        let title = fonts.prepare(title).into_owned();
        let mut builder = DocumentBuilder::new(&self.config)
            .with_fonts(fonts)
            .with_title(title)
            .with_footer(footer);
        builder.extend(blocks);
        let rendered = builder.render()?;
        let filename = report_filename(report_type, entity, date, "pdf", ascii_only);
        info!(
            "Generated {} ({} page(s), {} bytes)",
            filename,
            rendered.layout.page_count(),
            rendered.bytes.len()
        );
        Ok(GeneratedFile {
            filename,
            bytes: rendered.bytes,
            mime: PDF_MIME,
        })
    }

    fn write_xlsx(
        &self,
        report_type: &str,
        entity: &str,
        workbook: &Workbook,
        date: NaiveDate,
    ) -> Result<GeneratedFile> {
        let bytes = crate::workbook::build_workbook(workbook)?;
        let filename = report_filename(report_type, entity, date, "xlsx", true);
        info!(
            "Generated {} ({} sheet(s), {} bytes)",
            filename,
            workbook.sheets().len(),
            bytes.len()
        );
        Ok(GeneratedFile {
            filename,
            bytes,
            mime: XLSX_MIME,
        })
    }

    /// Status summary PDF with an optional photo appendix.
    pub fn status_summary(&self, data: &status::StatusReport, date: NaiveDate) -> Result<GeneratedFile> {
        let mut resolver = self.resolver();
        let urls: Vec<&str> = data.photos.iter().map(|photo| photo.url.as_str()).collect();
        let photos = resolver.resolve_images_and_fonts(&urls);
        let context = ReportContext::new(&self.config, date);
        let blocks = status::blocks(data, &context, photos);
        self.render_pdf(
            status::REPORT_TYPE,
            &data.business_name,
            &format!("{} - {}", status::TITLE, data.business_name),
            blocks,
            &mut resolver,
            date,
        )
    }

    pub fn monthly_performance(&self, data: &monthly::MonthlyReport, date: NaiveDate) -> Result<GeneratedFile> {
        let mut resolver = self.resolver();
        let context = ReportContext::new(&self.config, date);
        let blocks = monthly::blocks(data, &context);
        self.render_pdf(
            monthly::REPORT_TYPE,
            &data.business_name,
            &format!("{} - {}", monthly::TITLE, data.business_name),
            blocks,
            &mut resolver,
            date,
        )
    }

    /// Weekly revenue workbook for the same monthly data.
    pub fn monthly_workbook(&self, data: &monthly::MonthlyReport, date: NaiveDate) -> Result<GeneratedFile> {
        let context = ReportContext::new(&self.config, date);
        let workbook = monthly_workbook::workbook(data, &context)?;
        self.write_xlsx(monthly_workbook::REPORT_TYPE, &data.business_name, &workbook, date)
    }

    pub fn proposal(&self, data: &proposal::Proposal, date: NaiveDate) -> Result<GeneratedFile> {
        let mut resolver = self.resolver();
        let context = ReportContext::new(&self.config, date);
        let blocks = proposal::blocks(data, &context);
        let entity = if data.client_business.trim().is_empty() {
            &data.client_name
        } else {
            &data.client_business
        };
        self.render_pdf(
            proposal::REPORT_TYPE,
            entity,
            &format!("{} {}", proposal::TITLE, data.proposal_number),
            blocks,
            &mut resolver,
            date,
        )
    }

    /// Business card with a branded vCard QR code.
    pub fn business_card(&self, data: &ContactCard, date: NaiveDate) -> Result<GeneratedFile> {
        let mut resolver = self.resolver();
        let photo = if data.photo_url.trim().is_empty() {
            None
        } else {
            resolver.resolve_images_and_fonts(&[data.photo_url.as_str()]).pop()
        };
        let context = ReportContext::new(&self.config, date);
        let blocks = business_card::blocks(data, &context, photo)?;
        self.render_pdf(
            business_card::REPORT_TYPE,
            &data.name,
            &format!("{} - {}", business_card::TITLE, data.name),
            blocks,
            &mut resolver,
            date,
        )
    }

    pub fn visit_note(&self, data: &visit_note::VisitNote, date: NaiveDate) -> Result<GeneratedFile> {
        let mut resolver = self.resolver();
        let context = ReportContext::new(&self.config, date);
        let blocks = visit_note::blocks(data, &context);
        self.render_pdf(
            visit_note::REPORT_TYPE,
            &data.business_name,
            &format!("{} - {}", visit_note::TITLE, data.business_name),
            blocks,
            &mut resolver,
            date,
        )
    }

    /// Consulting service agreement; its footer carries the contract notice.
    pub fn service_contract(&self, data: &contract::Contract, date: NaiveDate) -> Result<GeneratedFile> {
        let mut resolver = self.resolver();
        let context = ReportContext::new(&self.config, date);
        let blocks = contract::service_blocks(data, &context);
        let footer = FooterSpec {
            notice: contract::SERVICE_NOTICE.to_owned(),
            ..FooterSpec::from_brand(&self.config.brand)
        };
        self.render_pdf_with_footer(
            contract::SERVICE_REPORT_TYPE,
            data.entity(),
            &format!("{} {}", contract::SERVICE_TITLE, data.contract_number),
            blocks,
            &mut resolver,
            date,
            footer,
        )
    }

    /// Mutual non-disclosure agreement.
    pub fn nda(&self, data: &contract::Contract, date: NaiveDate) -> Result<GeneratedFile> {
        let mut resolver = self.resolver();
        let context = ReportContext::new(&self.config, date);
        let blocks = contract::nda_blocks(data, &context);
        let footer = FooterSpec {
            notice: contract::NDA_NOTICE.to_owned(),
            ..FooterSpec::from_brand(&self.config.brand)
        };
        self.render_pdf_with_footer(
            contract::NDA_REPORT_TYPE,
            data.entity(),
            &format!("{} - {}", contract::NDA_TITLE, data.entity()),
            blocks,
            &mut resolver,
            date,
            footer,
        )
    }

    pub fn action_plan(&self, data: &action_plan::ActionPlan, date: NaiveDate) -> Result<GeneratedFile> {
        let context = ReportContext::new(&self.config, date);
        let workbook = action_plan::workbook(data, &context)?;
        self.write_xlsx(action_plan::REPORT_TYPE, &data.business_name, &workbook, date)
    }

    /// Checklist workbook; item photos are fetched concurrently and embedded.
    pub fn checklist(&self, data: &checklist::Checklist, date: NaiveDate) -> Result<GeneratedFile> {
        let mut resolver = self.resolver();
        let urls = data.photo_urls();
        let photos = resolver.resolve_images(&urls);
        let context = ReportContext::new(&self.config, date);
        let workbook = checklist::workbook(data, &context, &urls, photos)?;
        self.write_xlsx(checklist::REPORT_TYPE, &data.business_name, &workbook, date)
    }

    pub fn kpi_dashboard(&self, data: &kpi_dashboard::KpiDashboard, date: NaiveDate) -> Result<GeneratedFile> {
        let context = ReportContext::new(&self.config, date);
        let workbook = kpi_dashboard::workbook(data, &context)?;
        self.write_xlsx(kpi_dashboard::REPORT_TYPE, &data.business_name, &workbook, date)
    }

    /// Daily cash reconciliation with its monthly summary sheet.
    pub fn cash_report(&self, data: &cash_report::CashReport, date: NaiveDate) -> Result<GeneratedFile> {
        let context = ReportContext::new(&self.config, date);
        let workbook = cash_report::workbook(data, &context)?;
        self.write_xlsx(cash_report::REPORT_TYPE, &data.business_name, &workbook, date)
    }

    pub fn stock_count(&self, data: &stock_count::StockCount, date: NaiveDate) -> Result<GeneratedFile> {
        let context = ReportContext::new(&self.config, date);
        let workbook = stock_count::workbook(data, &context)?;
        self.write_xlsx(stock_count::REPORT_TYPE, &data.business_name, &workbook, date)
    }

    pub fn hygiene_workbook(&self, data: &hygiene::HygieneCheck, date: NaiveDate) -> Result<GeneratedFile> {
        let context = ReportContext::new(&self.config, date);
        let workbook = hygiene::workbook(data, &context)?;
        self.write_xlsx(hygiene::REPORT_TYPE, &data.business_name, &workbook, date)
    }

    /// Printable hygiene checklist; the same data as [`Self::hygiene_workbook`].
    pub fn hygiene_checklist(&self, data: &hygiene::HygieneCheck, date: NaiveDate) -> Result<GeneratedFile> {
        let mut resolver = self.resolver();
        let context = ReportContext::new(&self.config, date);
        let blocks = hygiene::blocks(data, &context);
        self.render_pdf(
            hygiene::REPORT_TYPE,
            &data.business_name,
            &format!("{} - {}", hygiene::TITLE, data.business_name),
            blocks,
            &mut resolver,
            date,
        )
    }
}
