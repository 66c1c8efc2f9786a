//! Data structures describing the logical content of a PDF report.
//!
//! A report is a flat stream of [`Block`] values. Blocks are immutable inputs
//! computed by the report assemblers; colours left unset fall back to the
//! configured [`crate::config::Palette`] when the block is rendered.

use crate::assets::ImageAsset;
use crate::color::Rgb;

/// Horizontal placement of text inside its box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Full-width banner opening a report.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TitleBar {
    title: String,
    subtitle: Option<String>,
    meta: Vec<String>,
}

impl TitleBar {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        let subtitle = subtitle.into();
        self.subtitle = if subtitle.trim().is_empty() {
            None
        } else {
            Some(subtitle)
        };
        self
    }

    /// Adds a small line under the subtitle, e.g. `Cafe Noir | 2024-05-01`.
    pub fn with_meta(mut self, line: impl Into<String>) -> Self {
        let line = line.into();
        if !line.trim().is_empty() {
            self.meta.push(line);
        }
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    pub fn meta(&self) -> &[String] {
        &self.meta
    }
}

/// A labelled value inside an [`InfoGrid`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InfoEntry {
    pub label: String,
    pub value: String,
}

impl InfoEntry {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Shaded box of label/value pairs laid out in columns.
#[derive(Clone, Debug, PartialEq)]
pub struct InfoGrid {
    heading: Option<String>,
    columns: usize,
    entries: Vec<InfoEntry>,
    fill: Option<Rgb>,
}

impl Default for InfoGrid {
    fn default() -> Self {
        Self {
            heading: None,
            columns: 2,
            entries: Vec::new(),
            fill: None,
        }
    }
}

impl InfoGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }

    /// Number of columns, at least one.
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns.max(1);
        self
    }

    pub fn with_fill(mut self, fill: Rgb) -> Self {
        self.fill = Some(fill);
        self
    }

    /// Appends an entry; an empty value is shown as `-`.
    pub fn entry(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        let value = if value.trim().is_empty() {
            "-".to_owned()
        } else {
            value
        };
        self.entries.push(InfoEntry::new(label, value));
        self
    }

    pub fn heading(&self) -> Option<&str> {
        self.heading.as_deref()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn entries(&self) -> &[InfoEntry] {
        &self.entries
    }

    pub fn fill(&self) -> Option<Rgb> {
        self.fill
    }
}

/// Accent tag followed by a bold heading.
#[derive(Clone, Debug, PartialEq)]
pub struct SectionHeader {
    label: String,
    accent: Option<Rgb>,
}

impl SectionHeader {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            accent: None,
        }
    }

    pub fn with_accent(mut self, accent: Rgb) -> Self {
        self.accent = Some(accent);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn accent(&self) -> Option<Rgb> {
        self.accent
    }
}

/// Items whose text is blank are dropped on construction.
fn non_blank(items: impl IntoIterator<Item = impl Into<String>>) -> Vec<String> {
    items
        .into_iter()
        .map(Into::into)
        .filter(|item: &String| !item.trim().is_empty())
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BulletList {
    items: Vec<String>,
    marker: Option<Rgb>,
}

impl BulletList {
    pub fn new(items: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            items: non_blank(items),
            marker: None,
        }
    }

    pub fn with_marker(mut self, color: Rgb) -> Self {
        self.marker = Some(color);
        self
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn marker(&self) -> Option<Rgb> {
        self.marker
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NumberedList {
    items: Vec<String>,
    marker: Option<Rgb>,
}

impl NumberedList {
    pub fn new(items: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            items: non_blank(items),
            marker: None,
        }
    }

    pub fn with_marker(mut self, color: Rgb) -> Self {
        self.marker = Some(color);
        self
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn marker(&self) -> Option<Rgb> {
        self.marker
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Column width: fixed millimetres, or a share of what fixed columns leave over.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColumnWidth {
    Fixed(f64),
    Flex(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub label: String,
    pub width: ColumnWidth,
    pub alignment: HorizontalAlignment,
}

impl Column {
    pub fn new(label: impl Into<String>, width: ColumnWidth) -> Self {
        Self {
            label: label.into(),
            width,
            alignment: HorizontalAlignment::Left,
        }
    }

    pub fn flex(label: impl Into<String>, weight: f64) -> Self {
        Self::new(label, ColumnWidth::Flex(weight))
    }

    pub fn fixed(label: impl Into<String>, width_mm: f64) -> Self {
        Self::new(label, ColumnWidth::Fixed(width_mm))
    }

    pub fn aligned(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }
}

/// Overrides applied to one table cell.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CellStyle {
    pub fill: Option<Rgb>,
    pub text: Option<Rgb>,
    pub bold: Option<bool>,
}

impl CellStyle {
    pub fn text(color: Rgb) -> Self {
        Self {
            text: Some(color),
            ..Self::default()
        }
    }

    pub fn fill(color: Rgb) -> Self {
        Self {
            fill: Some(color),
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = Some(true);
        self
    }

    pub fn with_fill(mut self, color: Rgb) -> Self {
        self.fill = Some(color);
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RowSelector {
    #[default]
    Any,
    Index(usize),
    /// The final data row, typically a totals row.
    Last,
}

/// Predicate over a cell's text.
#[derive(Clone, Debug, PartialEq)]
pub enum ValuePredicate {
    Any,
    Equals(String),
    OneOf(Vec<String>),
    Contains(String),
    /// Numeric value (after stripping `%`, currency suffixes and grouping) at least the threshold.
    AtLeast(f64),
    Below(f64),
}

impl ValuePredicate {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            ValuePredicate::Any => true,
            ValuePredicate::Equals(expected) => value.trim() == expected,
            ValuePredicate::OneOf(options) => options.iter().any(|option| option == value.trim()),
            ValuePredicate::Contains(needle) => value.contains(needle.as_str()),
            ValuePredicate::AtLeast(threshold) => {
                parse_number(value).map_or(false, |number| number >= *threshold)
            }
            ValuePredicate::Below(threshold) => {
                parse_number(value).map_or(false, |number| number < *threshold)
            }
        }
    }
}

/// Lenient number parsing for display strings such as `%28,5`, `12.000 ₺` or `4.5`.
pub fn parse_number(value: &str) -> Option<f64> {
    let cleaned: String = value
        .chars()
        .filter(|ch| ch.is_ascii_digit() || matches!(ch, '.' | ',' | '-'))
        .collect();
    if cleaned.is_empty() || !cleaned.chars().any(|ch| ch.is_ascii_digit()) {
        return None;
    }
    let normalized = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(_)) => cleaned.replace(',', "."),
        (Some(dot), None)
            if cleaned.matches('.').count() > 1
                || (cleaned.len() - dot == 4 && !cleaned.trim_start_matches('-').starts_with('0')) =>
        {
            cleaned.replace('.', "")
        }
        _ => cleaned,
    };
    normalized.parse().ok()
}

/// Pure style rule keyed by a cell's row, column and value.
#[derive(Clone, Debug, PartialEq)]
pub struct CellRule {
    pub column: Option<usize>,
    pub row: RowSelector,
    pub predicate: ValuePredicate,
    pub style: CellStyle,
}

impl CellRule {
    /// Rule applying `style` to cells of `column` whose value satisfies `predicate`.
    pub fn column(column: usize, predicate: ValuePredicate, style: CellStyle) -> Self {
        Self {
            column: Some(column),
            row: RowSelector::Any,
            predicate,
            style,
        }
    }

    /// Rule styling a whole row.
    pub fn row(row: RowSelector, style: CellStyle) -> Self {
        Self {
            column: None,
            row,
            predicate: ValuePredicate::Any,
            style,
        }
    }

    fn applies(&self, row: usize, row_count: usize, column: usize, value: &str) -> bool {
        let row_matches = match self.row {
            RowSelector::Any => true,
            RowSelector::Index(index) => index == row,
            RowSelector::Last => row + 1 == row_count,
        };
        row_matches && self.column.map_or(true, |c| c == column) && self.predicate.matches(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableStyle {
    /// Header background; the palette's primary colour when unset.
    pub header_fill: Option<Rgb>,
    pub header_text: Rgb,
    /// Fill for odd data rows; the palette's light background when unset.
    pub zebra: Option<Rgb>,
    pub striped: bool,
    pub border: Option<Rgb>,
    pub font_size: u8,
    pub header_font_size: u8,
    pub padding: f64,
    pub show_header: bool,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            header_fill: None,
            header_text: Rgb::WHITE,
            zebra: None,
            striped: true,
            border: Some(Rgb::from_hex(0xE5E7EB)),
            font_size: 8,
            header_font_size: 8,
            padding: 2.0,
            show_header: true,
        }
    }
}

/// Columns, rows and styling of a table that may continue across pages.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
    style: TableStyle,
    rules: Vec<CellRule>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    /// Appends a row; missing trailing cells are treated as empty strings.
    pub fn row<S: Into<String>>(mut self, cells: impl IntoIterator<Item = S>) -> Self {
        self.push_row(cells);
        self
    }

    pub fn push_row<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_rule(mut self, rule: CellRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn style(&self) -> &TableStyle {
        &self.style
    }

    /// First rule matching the cell, if any.
    pub fn cell_style(&self, row: usize, column: usize) -> Option<&CellStyle> {
        let value = self.rows.get(row)?.get(column)?;
        self.rules
            .iter()
            .find(|rule| rule.applies(row, self.rows.len(), column, value))
            .map(|rule| &rule.style)
    }
}

/// One cell of an [`ImageGrid`].
#[derive(Clone, Debug)]
pub struct GridImage {
    pub image: ImageAsset,
    pub caption: String,
}

impl GridImage {
    pub fn new(image: ImageAsset, caption: impl Into<String>) -> Self {
        Self {
            image,
            caption: caption.into(),
        }
    }
}

/// Two-column grid of fixed-size image cells with captions.
#[derive(Clone, Debug)]
pub struct ImageGrid {
    images: Vec<GridImage>,
    cell_height: f64,
    placeholder_label: String,
}

impl ImageGrid {
    pub const COLUMNS: usize = 2;

    pub fn new(images: Vec<GridImage>) -> Self {
        Self {
            images,
            cell_height: 60.0,
            placeholder_label: "Görsel yüklenemedi".to_owned(),
        }
    }

    pub fn with_cell_height(mut self, height_mm: f64) -> Self {
        self.cell_height = height_mm;
        self
    }

    pub fn with_placeholder_label(mut self, label: impl Into<String>) -> Self {
        self.placeholder_label = label.into();
        self
    }

    pub fn images(&self) -> &[GridImage] {
        &self.images
    }

    pub fn cell_height(&self) -> f64 {
        self.cell_height
    }

    pub fn placeholder_label(&self) -> &str {
        &self.placeholder_label
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Shaded paragraph box with an optional heading.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FreeTextBox {
    title: Option<String>,
    body: String,
    accent: Option<Rgb>,
    fill: Option<Rgb>,
}

impl FreeTextBox {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_accent(mut self, accent: Rgb) -> Self {
        self.accent = Some(accent);
        self
    }

    pub fn with_fill(mut self, fill: Rgb) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn accent(&self) -> Option<Rgb> {
        self.accent
    }

    pub fn fill(&self) -> Option<Rgb> {
        self.fill
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SignatureParty {
    pub role: String,
    pub name: String,
}

/// Side-by-side signature boxes.
#[derive(Clone, Debug, PartialEq)]
pub struct SignatureBlock {
    parties: Vec<SignatureParty>,
    caption: String,
}

impl SignatureBlock {
    pub fn new() -> Self {
        Self {
            parties: Vec::new(),
            caption: "İmza / Kaşe".to_owned(),
        }
    }

    pub fn party(mut self, role: impl Into<String>, name: impl Into<String>) -> Self {
        self.parties.push(SignatureParty {
            role: role.into(),
            name: name.into(),
        });
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    pub fn parties(&self) -> &[SignatureParty] {
        &self.parties
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }
}

impl Default for SignatureBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// Qualitative band of a 0–10 score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreBand {
    Strong,
    Good,
    Fair,
    Weak,
}

impl ScoreBand {
    pub fn of(score: f64) -> Self {
        if score >= 8.0 {
            ScoreBand::Strong
        } else if score >= 6.0 {
            ScoreBand::Good
        } else if score >= 4.0 {
            ScoreBand::Fair
        } else {
            ScoreBand::Weak
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreEntry {
    pub label: String,
    pub score: f64,
}

/// Overall score disc with one bar per category.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoreSummary {
    overall: u32,
    caption: String,
    entries: Vec<ScoreEntry>,
}

impl ScoreSummary {
    /// `overall` is on a 0–100 scale, entries on 0–10.
    pub fn new(overall: u32, caption: impl Into<String>) -> Self {
        Self {
            overall: overall.min(100),
            caption: caption.into(),
            entries: Vec::new(),
        }
    }

    pub fn entry(mut self, label: impl Into<String>, score: f64) -> Self {
        self.entries.push(ScoreEntry {
            label: label.into(),
            score: score.clamp(0.0, 10.0),
        });
        self
    }

    pub fn overall(&self) -> u32 {
        self.overall
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }
}

/// One renderable unit of a report.
#[derive(Clone, Debug)]
pub enum Block {
    TitleBar(TitleBar),
    InfoGrid(InfoGrid),
    SectionHeader(SectionHeader),
    BulletList(BulletList),
    NumberedList(NumberedList),
    Table(Table),
    ImageGrid(ImageGrid),
    FreeTextBox(FreeTextBox),
    SignatureBlock(SignatureBlock),
    ScoreSummary(ScoreSummary),
    /// Vertical gap in millimetres.
    Spacer(f64),
    /// Starts a new page unless the current one is still empty.
    PageBreak,
}

impl Block {
    pub fn kind(&self) -> &'static str {
        match self {
            Block::TitleBar(_) => "title bar",
            Block::InfoGrid(_) => "info grid",
            Block::SectionHeader(_) => "section header",
            Block::BulletList(_) => "bullet list",
            Block::NumberedList(_) => "numbered list",
            Block::Table(_) => "table",
            Block::ImageGrid(_) => "image grid",
            Block::FreeTextBox(_) => "free text box",
            Block::SignatureBlock(_) => "signature block",
            Block::ScoreSummary(_) => "score summary",
            Block::Spacer(_) => "spacer",
            Block::PageBreak => "page break",
        }
    }

    /// Whether the block paginates itself row, item or line wise.
    pub fn is_splittable(&self) -> bool {
        matches!(
            self,
            Block::Table(_) | Block::ImageGrid(_) | Block::BulletList(_) | Block::NumberedList(_) | Block::FreeTextBox(_)
        )
    }

    /// Space that must remain below the block on the same page, so headings
    /// are not left alone at the bottom of a page.
    pub fn keep_with_next(&self) -> f64 {
        match self {
            Block::SectionHeader(_) => 16.0,
            _ => 0.0,
        }
    }
}

macro_rules! block_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Block {
                fn from(value: $variant) -> Self {
                    Block::$variant(value)
                }
            }
        )*
    };
}

block_from!(
    TitleBar,
    InfoGrid,
    SectionHeader,
    BulletList,
    NumberedList,
    Table,
    ImageGrid,
    FreeTextBox,
    SignatureBlock,
    ScoreSummary
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_drop_blank_items() {
        let list = BulletList::new(vec!["Temiz mutfak", "  ", ""]);
        assert_eq!(list.items(), ["Temiz mutfak".to_owned()]);
        assert!(NumberedList::new(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn info_grid_marks_missing_values() {
        let grid = InfoGrid::new().with_columns(0).entry("Kapasite", " ");
        assert_eq!(grid.columns(), 1);
        assert_eq!(grid.entries()[0].value, "-");
    }

    #[test]
    fn parses_display_numbers() {
        assert_eq!(parse_number("%28,5"), Some(28.5));
        assert_eq!(parse_number("12.000 ₺"), Some(12000.0));
        assert_eq!(parse_number("1.234,50"), Some(1234.5));
        assert_eq!(parse_number("4.5"), Some(4.5));
        assert_eq!(parse_number("0.125"), Some(0.125));
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn first_matching_rule_wins() {
        let red = Rgb::from_hex(0xEF4444);
        let green = Rgb::from_hex(0x22C55E);
        let table = Table::new(vec![Column::flex("KPI", 1.0), Column::flex("Durum", 1.0)])
            .row(["COGS", "Kritik"])
            .row(["Ciro", "İyi"])
            .row(["TOPLAM", ""])
            .with_rule(CellRule::column(1, ValuePredicate::Equals("Kritik".into()), CellStyle::text(red).bold()))
            .with_rule(CellRule::column(1, ValuePredicate::Any, CellStyle::text(green)))
            .with_rule(CellRule::row(RowSelector::Last, CellStyle::fill(Rgb::BLACK)));

        assert_eq!(table.cell_style(0, 1).and_then(|style| style.text), Some(red));
        assert_eq!(table.cell_style(1, 1).and_then(|style| style.text), Some(green));
        assert_eq!(table.cell_style(1, 0), None);
        assert_eq!(table.cell_style(2, 0).and_then(|style| style.fill), Some(Rgb::BLACK));
        assert_eq!(table.cell_style(9, 0), None);
    }

    #[test]
    fn short_rows_are_padded() {
        let table = Table::new(vec![Column::flex("A", 1.0), Column::flex("B", 1.0)]).row(["only"]);
        assert_eq!(table.rows()[0], vec!["only".to_owned(), String::new()]);
    }

    #[test]
    fn score_bands() {
        assert_eq!(ScoreBand::of(9.0), ScoreBand::Strong);
        assert_eq!(ScoreBand::of(7.0), ScoreBand::Good);
        assert_eq!(ScoreBand::of(4.0), ScoreBand::Fair);
        assert_eq!(ScoreBand::of(1.0), ScoreBand::Weak);
    }

    #[test]
    fn flowing_blocks_split() {
        assert!(Block::from(Table::default()).is_splittable());
        assert!(Block::from(ImageGrid::new(Vec::new())).is_splittable());
        assert!(Block::from(FreeTextBox::new("x")).is_splittable());
        assert!(Block::from(NumberedList::new(["x"])).is_splittable());
        assert!(!Block::from(InfoGrid::new()).is_splittable());
        assert!(!Block::from(ScoreSummary::new(70, "x")).is_splittable());
        assert!(Block::from(SectionHeader::new("x")).keep_with_next() > 0.0);
    }
}
