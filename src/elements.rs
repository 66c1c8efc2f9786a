//! Measurement and rendering of the individual block types.
//!
//! Every block computes a small layout plan (wrapped lines, row heights,
//! column positions) in one place and both [`Block::measure`] and
//! [`Block::render`] derive from that plan, so a block never draws taller or
//! shorter than it measured. Tables, image grids, lists and text boxes
//! paginate themselves through the [`Flow`]; all other blocks draw at the
//! cursor and advance it by their measured height.

use crate::canvas::{DrawOp, Stroke};
use crate::color::Rgb;
use crate::config::{PageConfig, Palette};
use crate::fonts::{baseline_offset, line_height, FontSet};
use crate::layout::{Flow, LayoutError};
use crate::model::{
    Block, BulletList, ColumnWidth, FreeTextBox, GridImage, HorizontalAlignment, ImageGrid,
    InfoGrid, NumberedList, ScoreBand, ScoreSummary, SectionHeader, SignatureBlock, Table,
    TitleBar,
};
use crate::assets::ImageAsset;
use crate::text::{single_line, wrap};

const TITLE_SIZE: u8 = 18;
const SUBTITLE_SIZE: u8 = 10;
const META_SIZE: u8 = 8;
const TITLE_PAD_TOP: f64 = 7.0;
const TITLE_PAD_BOTTOM: f64 = 5.0;
const TITLE_STRIPE: f64 = 1.5;

const HEADING_SIZE: u8 = 10;
const LABEL_SIZE: u8 = 7;
const BODY_SIZE: u8 = 9;
const CAPTION_SIZE: u8 = 7;

const SECTION_SIZE: u8 = 12;
const SECTION_HEIGHT: f64 = 11.0;

const BOX_PADDING: f64 = 4.0;
const GRID_GAP: f64 = 4.0;
const GRID_ROW_GAP: f64 = 2.5;

const LIST_INDENT: f64 = 6.0;
const NUMBER_INDENT: f64 = 7.0;
const ITEM_GAP: f64 = 1.5;

const ACCENT_BAR: f64 = 1.5;

/// Rounding slack when checking whether content fits the page.
const FIT_SLACK: f64 = 0.01;

const SIGNATURE_HEIGHT: f64 = 34.0;
const SIGNATURE_GAP: f64 = 10.0;

const SCORE_RADIUS: f64 = 13.0;
const SCORE_MIN_HEIGHT: f64 = 36.0;
const SCORE_ROW: f64 = 6.0;

const IMAGE_GAP: f64 = 6.0;
const IMAGE_CAPTION_BAND: f64 = 6.0;

/// Shared inputs for measuring and drawing.
pub(crate) struct RenderContext<'a> {
    pub fonts: &'a FontSet,
    pub palette: &'a Palette,
    pub page: &'a PageConfig,
}

impl RenderContext<'_> {
    fn text(&self, x: f64, baseline: f64, text: impl Into<String>, size: u8, bold: bool, color: Rgb) -> DrawOp {
        DrawOp::Text {
            x,
            baseline,
            text: text.into(),
            size,
            bold,
            color,
        }
    }

    /// Text op for `line` aligned inside the horizontal span `x..x + width`.
    #[allow(clippy::too_many_arguments)]
    fn aligned(
        &self,
        line: &str,
        x: f64,
        width: f64,
        baseline: f64,
        size: u8,
        bold: bool,
        color: Rgb,
        alignment: HorizontalAlignment,
    ) -> DrawOp {
        let text_width = self.fonts.text_width(line, size, bold);
        let left = match alignment {
            HorizontalAlignment::Left => x,
            HorizontalAlignment::Center => x + (width - text_width) / 2.0,
            HorizontalAlignment::Right => x + width - text_width,
        };
        self.text(left, baseline, line, size, bold, color)
    }

    fn score_color(&self, score: f64) -> Rgb {
        match ScoreBand::of(score) {
            ScoreBand::Strong => self.palette.success,
            ScoreBand::Good => self.palette.accent,
            ScoreBand::Fair => self.palette.warning,
            ScoreBand::Weak => self.palette.danger,
        }
    }
}

fn rect(x: f64, y: f64, width: f64, height: f64, fill: Option<Rgb>, stroke: Option<Stroke>) -> DrawOp {
    DrawOp::Rect {
        x,
        y,
        width,
        height,
        fill,
        stroke,
    }
}

/// Draws wrapped `lines` starting with the line box at `top`.
#[allow(clippy::too_many_arguments)]
fn draw_lines(
    ctx: &RenderContext<'_>,
    flow: &mut Flow,
    lines: &[String],
    x: f64,
    width: f64,
    top: f64,
    size: u8,
    bold: bool,
    color: Rgb,
    alignment: HorizontalAlignment,
) {
    for (index, line) in lines.iter().enumerate() {
        let baseline = top + index as f64 * line_height(size) + baseline_offset(size);
        flow.draw(ctx.aligned(line, x, width, baseline, size, bold, color, alignment));
    }
}

impl Block {
    /// Height the block occupies when drawn `width` millimetres wide.
    ///
    /// For blocks that paginate themselves this is the unsplit height.
    pub(crate) fn measure(&self, ctx: &RenderContext<'_>, width: f64) -> f64 {
        match self {
            Block::TitleBar(block) => TitlePlan::new(block, ctx).height(),
            Block::InfoGrid(block) => InfoGridPlan::new(block, ctx, width).height(),
            Block::SectionHeader(_) => SECTION_HEIGHT,
            Block::BulletList(block) => ListPlan::bullets(block, ctx, width).height(),
            Block::NumberedList(block) => ListPlan::numbered(block, ctx, width).height(),
            Block::Table(block) => {
                let plan = TablePlan::new(block, ctx, width);
                plan.header_height + plan.rows.iter().map(|row| row.height).sum::<f64>()
            }
            Block::ImageGrid(block) => {
                let rows = (block.images().len() + ImageGrid::COLUMNS - 1) / ImageGrid::COLUMNS;
                if rows == 0 {
                    0.0
                } else {
                    rows as f64 * image_row_height(block) + (rows - 1) as f64 * IMAGE_GAP
                }
            }
            Block::FreeTextBox(block) => TextBoxPlan::new(block, ctx, width).height(),
            Block::SignatureBlock(block) => {
                if block.parties().is_empty() {
                    0.0
                } else {
                    SIGNATURE_HEIGHT
                }
            }
            Block::ScoreSummary(block) => score_height(block),
            Block::Spacer(height) => height.max(0.0),
            Block::PageBreak => 0.0,
        }
    }

    /// Draws the block at the flow cursor and advances the cursor past it.
    pub(crate) fn render(&self, ctx: &RenderContext<'_>, flow: &mut Flow) -> Result<(), LayoutError> {
        match self {
            Block::TitleBar(block) => render_title(block, ctx, flow),
            Block::InfoGrid(block) => render_info_grid(block, ctx, flow),
            Block::SectionHeader(block) => render_section_header(block, ctx, flow),
            Block::BulletList(block) => ListPlan::bullets(block, ctx, flow.width()).render(ctx, flow),
            Block::NumberedList(block) => ListPlan::numbered(block, ctx, flow.width()).render(ctx, flow),
            Block::Table(block) => return render_table(block, ctx, flow),
            Block::ImageGrid(block) => return render_image_grid(block, ctx, flow),
            Block::FreeTextBox(block) => return render_text_box(block, ctx, flow),
            Block::SignatureBlock(block) => render_signatures(block, ctx, flow),
            Block::ScoreSummary(block) => render_score_summary(block, ctx, flow),
            Block::Spacer(height) => {
                let gap = height.max(0.0).min(flow.remaining().max(0.0));
                flow.advance(gap);
            }
            Block::PageBreak => {}
        }
        Ok(())
    }
}

struct TitlePlan {
    title: Vec<String>,
    subtitle: Vec<String>,
    meta: Vec<String>,
}

impl TitlePlan {
    fn new(block: &TitleBar, ctx: &RenderContext<'_>) -> Self {
        let width = ctx.page.content_width();
        Self {
            title: wrap(ctx.fonts, block.title(), TITLE_SIZE, true, width),
            subtitle: block
                .subtitle()
                .map(|text| wrap(ctx.fonts, text, SUBTITLE_SIZE, false, width))
                .unwrap_or_default(),
            meta: block
                .meta()
                .iter()
                .flat_map(|line| wrap(ctx.fonts, line, META_SIZE, false, width))
                .collect(),
        }
    }

    fn subtitle_top(&self) -> f64 {
        TITLE_PAD_TOP + self.title.len() as f64 * line_height(TITLE_SIZE) + 1.0
    }

    fn meta_top(&self) -> f64 {
        self.subtitle_top() + self.subtitle.len() as f64 * line_height(SUBTITLE_SIZE) + 1.0
    }

    fn height(&self) -> f64 {
        self.meta_top() + self.meta.len() as f64 * line_height(META_SIZE) + TITLE_PAD_BOTTOM + TITLE_STRIPE
    }
}

fn render_title(block: &TitleBar, ctx: &RenderContext<'_>, flow: &mut Flow) {
    let plan = TitlePlan::new(block, ctx);
    let top = flow.cursor();
    let height = plan.height();
    // At the top of a page the bar bleeds into the top margin.
    let bar_top = if flow.at_page_top() { 0.0 } else { top };
    let page_width = ctx.page.width_mm;
    let margin = ctx.page.side_margin_mm;
    let content_width = ctx.page.content_width();

    flow.draw(rect(0.0, bar_top, page_width, top + height - TITLE_STRIPE - bar_top, Some(ctx.palette.primary), None));
    flow.draw(rect(0.0, top + height - TITLE_STRIPE, page_width, TITLE_STRIPE, Some(ctx.palette.accent), None));

    let center = HorizontalAlignment::Center;
    draw_lines(ctx, flow, &plan.title, margin, content_width, top + TITLE_PAD_TOP, TITLE_SIZE, true, Rgb::WHITE, center);
    draw_lines(ctx, flow, &plan.subtitle, margin, content_width, top + plan.subtitle_top(), SUBTITLE_SIZE, false, ctx.palette.accent, center);
    draw_lines(ctx, flow, &plan.meta, margin, content_width, top + plan.meta_top(), META_SIZE, false, ctx.palette.rule, center);
    flow.advance(height);
}

struct InfoGridPlan {
    heading: Vec<String>,
    column_width: f64,
    columns: usize,
    /// Per grid row: wrapped labels and values of each entry, and the row height.
    rows: Vec<(Vec<(String, Vec<String>)>, f64)>,
}

impl InfoGridPlan {
    fn new(block: &InfoGrid, ctx: &RenderContext<'_>, width: f64) -> Self {
        let columns = block.columns();
        let column_width =
            (width - 2.0 * BOX_PADDING - GRID_GAP * (columns as f64 - 1.0)) / columns as f64;
        let rows = block
            .entries()
            .chunks(columns)
            .map(|chunk| {
                let cells: Vec<(String, Vec<String>)> = chunk
                    .iter()
                    .map(|entry| {
                        (
                            single_line(ctx.fonts, &entry.label, LABEL_SIZE, false, column_width),
                            wrap(ctx.fonts, &entry.value, BODY_SIZE, true, column_width),
                        )
                    })
                    .collect();
                let value_lines = cells.iter().map(|(_, value)| value.len().max(1)).max().unwrap_or(1);
                let height = line_height(LABEL_SIZE) + value_lines as f64 * line_height(BODY_SIZE) + GRID_ROW_GAP;
                (cells, height)
            })
            .collect();
        Self {
            heading: block
                .heading()
                .map(|heading| vec![single_line(ctx.fonts, heading, HEADING_SIZE, true, width)])
                .unwrap_or_default(),
            column_width,
            columns,
            rows,
        }
    }

    fn heading_height(&self) -> f64 {
        if self.heading.is_empty() {
            0.0
        } else {
            line_height(HEADING_SIZE) + 1.5
        }
    }

    fn height(&self) -> f64 {
        if self.rows.is_empty() && self.heading.is_empty() {
            return 0.0;
        }
        self.heading_height() + 2.0 * BOX_PADDING + self.rows.iter().map(|(_, height)| height).sum::<f64>()
    }
}

fn render_info_grid(block: &InfoGrid, ctx: &RenderContext<'_>, flow: &mut Flow) {
    let width = flow.width();
    let plan = InfoGridPlan::new(block, ctx, width);
    let height = plan.height();
    let x = flow.left();
    let top = flow.cursor();

    draw_lines(ctx, flow, &plan.heading, x, width, top, HEADING_SIZE, true, ctx.palette.primary, HorizontalAlignment::Left);
    let box_top = top + plan.heading_height();
    if height > 0.0 {
        flow.draw(rect(x, box_top, width, height - plan.heading_height(), Some(block.fill().unwrap_or(ctx.palette.light_bg)), None));
    }

    let mut row_top = box_top + BOX_PADDING;
    for (cells, row_height) in &plan.rows {
        for (column, (label, value)) in cells.iter().enumerate() {
            let cell_x = x + BOX_PADDING + column as f64 * (plan.column_width + GRID_GAP);
            flow.draw(ctx.text(cell_x, row_top + baseline_offset(LABEL_SIZE), label.clone(), LABEL_SIZE, false, ctx.palette.text_gray));
            draw_lines(
                ctx,
                flow,
                value,
                cell_x,
                plan.column_width,
                row_top + line_height(LABEL_SIZE),
                BODY_SIZE,
                true,
                ctx.palette.text_dark,
                HorizontalAlignment::Left,
            );
        }
        debug_assert!(cells.len() <= plan.columns);
        row_top += row_height;
    }
    flow.advance(height);
}

fn render_section_header(block: &SectionHeader, ctx: &RenderContext<'_>, flow: &mut Flow) {
    let x = flow.left();
    let top = flow.cursor();
    let accent = block.accent().unwrap_or(ctx.palette.accent);
    flow.draw(rect(x, top + 1.5, 3.0, 7.0, Some(accent), None));
    let label = single_line(ctx.fonts, block.label(), SECTION_SIZE, true, flow.width() - 6.0);
    flow.draw(ctx.text(x + 6.0, top + 7.3, label, SECTION_SIZE, true, ctx.palette.primary));
    flow.advance(SECTION_HEIGHT);
}

enum Marker {
    Bullet(Rgb),
    Number(Rgb),
}

struct ListPlan {
    marker: Marker,
    items: Vec<Vec<String>>,
}

impl ListPlan {
    fn bullets(block: &BulletList, ctx: &RenderContext<'_>, width: f64) -> Self {
        Self::new(block.items(), Marker::Bullet(block.marker().unwrap_or(ctx.palette.accent)), LIST_INDENT, ctx, width)
    }

    fn numbered(block: &NumberedList, ctx: &RenderContext<'_>, width: f64) -> Self {
        Self::new(block.items(), Marker::Number(block.marker().unwrap_or(ctx.palette.primary)), NUMBER_INDENT, ctx, width)
    }

    fn new(items: &[String], marker: Marker, indent: f64, ctx: &RenderContext<'_>, width: f64) -> Self {
        Self {
            marker,
            items: items
                .iter()
                .map(|item| wrap(ctx.fonts, item, BODY_SIZE, false, width - indent))
                .collect(),
        }
    }

    fn indent(&self) -> f64 {
        match self.marker {
            Marker::Bullet(_) => LIST_INDENT,
            Marker::Number(_) => NUMBER_INDENT,
        }
    }

    fn item_height(lines: &[String]) -> f64 {
        lines.len().max(1) as f64 * line_height(BODY_SIZE) + ITEM_GAP
    }

    fn height(&self) -> f64 {
        self.items.iter().map(|lines| Self::item_height(lines)).sum()
    }

    /// Draws item by item, opening a new page for any item that does not fit.
    /// An item taller than a whole page continues line by line.
    fn render(&self, ctx: &RenderContext<'_>, flow: &mut Flow) {
        let x = flow.left();
        let width = flow.width() - self.indent();
        let line = line_height(BODY_SIZE);
        for (index, lines) in self.items.iter().enumerate() {
            let height = Self::item_height(lines);
            let needed = if height <= flow.capacity() { height } else { line };
            if needed > flow.remaining() + FIT_SLACK && !flow.page_is_blank() {
                flow.new_page();
            }
            let top = flow.cursor();
            match self.marker {
                Marker::Bullet(color) => flow.draw(DrawOp::Circle {
                    cx: x + 2.0,
                    cy: top + line / 2.0,
                    radius: 0.8,
                    fill: color,
                }),
                Marker::Number(color) => flow.draw(ctx.text(
                    x,
                    top + baseline_offset(BODY_SIZE),
                    format!("{}.", index + 1),
                    BODY_SIZE,
                    true,
                    color,
                )),
            }
            if lines.is_empty() {
                flow.advance(line);
            }
            for text in lines {
                if line > flow.remaining() + FIT_SLACK {
                    flow.new_page();
                }
                let top = flow.cursor();
                draw_lines(ctx, flow, std::slice::from_ref(text), x + self.indent(), width, top, BODY_SIZE, false, ctx.palette.text_dark, HorizontalAlignment::Left);
                flow.advance(line);
            }
            flow.advance(ITEM_GAP.min(flow.remaining().max(0.0)));
        }
    }
}

struct TextBoxPlan {
    title: Vec<String>,
    body: Vec<String>,
}

impl TextBoxPlan {
    fn inner_width(width: f64) -> f64 {
        width - 2.0 * BOX_PADDING - ACCENT_BAR
    }

    fn new(block: &FreeTextBox, ctx: &RenderContext<'_>, width: f64) -> Self {
        let inner = Self::inner_width(width);
        Self {
            title: block
                .title()
                .map(|title| wrap(ctx.fonts, title, HEADING_SIZE, true, inner))
                .unwrap_or_default(),
            body: wrap(ctx.fonts, block.body(), BODY_SIZE, false, inner),
        }
    }

    fn title_height(&self) -> f64 {
        if self.title.is_empty() {
            0.0
        } else {
            self.title.len() as f64 * line_height(HEADING_SIZE) + 1.0
        }
    }

    fn height(&self) -> f64 {
        2.0 * BOX_PADDING + self.title_height() + self.body.len() as f64 * line_height(BODY_SIZE)
    }
}

/// Draws the box, splitting its body by line when it is taller than a page.
/// Every page segment gets its own fill and accent bar; the title stays on the
/// first one.
fn render_text_box(block: &FreeTextBox, ctx: &RenderContext<'_>, flow: &mut Flow) -> Result<(), LayoutError> {
    let plan = TextBoxPlan::new(block, ctx, flow.width());
    let line = line_height(BODY_SIZE);
    let mut next = 0;
    let mut with_title = true;
    loop {
        let title_height = if with_title { plan.title_height() } else { 0.0 };
        let rest = plan.body.len() - next;
        let whole = 2.0 * BOX_PADDING + title_height + rest as f64 * line;
        let room = flow.remaining() - 2.0 * BOX_PADDING - title_height;
        let count = (((room + FIT_SLACK) / line).floor().max(0.0) as usize).min(rest);

        if whole > flow.remaining() + FIT_SLACK && !flow.page_is_blank() && (whole <= flow.capacity() || count == 0) {
            flow.new_page();
            continue;
        }
        if count == 0 && rest > 0 {
            return Err(LayoutError::BlockTooTall {
                kind: "free text box",
                height: whole,
                available: flow.capacity(),
            });
        }

        draw_text_segment(block, &plan, with_title, &plan.body[next..next + count], ctx, flow);
        next += count;
        with_title = false;
        if next >= plan.body.len() {
            return Ok(());
        }
        flow.new_page();
    }
}

fn draw_text_segment(
    block: &FreeTextBox,
    plan: &TextBoxPlan,
    with_title: bool,
    body: &[String],
    ctx: &RenderContext<'_>,
    flow: &mut Flow,
) {
    let width = flow.width();
    let x = flow.left();
    let top = flow.cursor();
    let (title, title_height) = if with_title {
        (plan.title.as_slice(), plan.title_height())
    } else {
        (&[][..], 0.0)
    };
    let height = 2.0 * BOX_PADDING + title_height + body.len() as f64 * line_height(BODY_SIZE);
    let accent = block.accent().unwrap_or(ctx.palette.accent);

    flow.draw(rect(x, top, width, height, Some(block.fill().unwrap_or(ctx.palette.cream)), None));
    flow.draw(rect(x, top, ACCENT_BAR, height, Some(accent), None));
    let text_x = x + ACCENT_BAR + BOX_PADDING;
    let inner = TextBoxPlan::inner_width(width);
    draw_lines(ctx, flow, title, text_x, inner, top + BOX_PADDING, HEADING_SIZE, true, ctx.palette.primary, HorizontalAlignment::Left);
    draw_lines(
        ctx,
        flow,
        body,
        text_x,
        inner,
        top + BOX_PADDING + title_height,
        BODY_SIZE,
        false,
        ctx.palette.text_dark,
        HorizontalAlignment::Left,
    );
    flow.advance(height);
}

fn render_signatures(block: &SignatureBlock, ctx: &RenderContext<'_>, flow: &mut Flow) {
    let parties = block.parties();
    if parties.is_empty() {
        return;
    }
    let x = flow.left();
    let top = flow.cursor();
    let count = parties.len() as f64;
    let box_width = (flow.width() - SIGNATURE_GAP * (count - 1.0)) / count;
    let inner = box_width - 8.0;
    let caption = ctx.fonts.prepare(block.caption()).into_owned();

    for (index, party) in parties.iter().enumerate() {
        let left = x + index as f64 * (box_width + SIGNATURE_GAP);
        flow.draw(rect(left, top, box_width, SIGNATURE_HEIGHT, None, Some(Stroke::new(ctx.palette.rule, 0.3))));
        let role = single_line(ctx.fonts, &party.role, BODY_SIZE, true, inner);
        let name = single_line(ctx.fonts, &party.name, BODY_SIZE, false, inner);
        flow.draw(ctx.text(left + 4.0, top + 6.0, role, BODY_SIZE, true, ctx.palette.primary));
        flow.draw(ctx.text(left + 4.0, top + 12.0, name, BODY_SIZE, false, ctx.palette.text_dark));
        flow.draw(DrawOp::Line {
            from: (left + 4.0, top + 26.0),
            to: (left + box_width - 4.0, top + 26.0),
            stroke: Stroke::new(ctx.palette.text_gray, 0.3),
        });
        flow.draw(ctx.aligned(&caption, left, box_width, top + 31.0, CAPTION_SIZE, false, ctx.palette.text_gray, HorizontalAlignment::Center));
    }
    flow.advance(SIGNATURE_HEIGHT);
}

fn score_height(block: &ScoreSummary) -> f64 {
    (block.entries().len() as f64 * SCORE_ROW + 4.0).max(SCORE_MIN_HEIGHT)
}

fn render_score_summary(block: &ScoreSummary, ctx: &RenderContext<'_>, flow: &mut Flow) {
    let x = flow.left();
    let top = flow.cursor();
    let width = flow.width();
    let overall = f64::from(block.overall()) / 10.0;
    let center = (x + 2.0 + SCORE_RADIUS, top + 2.0 + SCORE_RADIUS);

    flow.draw(DrawOp::Circle {
        cx: center.0,
        cy: center.1,
        radius: SCORE_RADIUS,
        fill: ctx.score_color(overall),
    });
    let disc_left = center.0 - SCORE_RADIUS;
    let disc_width = 2.0 * SCORE_RADIUS;
    flow.draw(ctx.aligned(&block.overall().to_string(), disc_left, disc_width, center.1 + 2.0, 16, true, Rgb::WHITE, HorizontalAlignment::Center));
    flow.draw(ctx.aligned("/ 100", disc_left, disc_width, center.1 + 7.0, CAPTION_SIZE, false, Rgb::WHITE, HorizontalAlignment::Center));
    let caption = single_line(ctx.fonts, block.caption(), CAPTION_SIZE, true, disc_width + 6.0);
    flow.draw(ctx.aligned(&caption, disc_left - 3.0, disc_width + 6.0, top + 2.0 * SCORE_RADIUS + 7.0, CAPTION_SIZE, true, ctx.score_color(overall), HorizontalAlignment::Center));

    let label_x = x + 2.0 * SCORE_RADIUS + 10.0;
    let label_width = 46.0;
    let track_x = label_x + label_width;
    let value_width = 14.0;
    let track_width = (x + width - value_width - track_x).max(10.0);
    for (index, entry) in block.entries().iter().enumerate() {
        let row_top = top + 2.0 + index as f64 * SCORE_ROW;
        let color = ctx.score_color(entry.score);
        let label = single_line(ctx.fonts, &entry.label, 8, false, label_width - 2.0);
        flow.draw(ctx.text(label_x, row_top + 3.5, label, 8, false, ctx.palette.text_dark));
        flow.draw(rect(track_x, row_top + 1.0, track_width, 3.0, Some(ctx.palette.placeholder), None));
        flow.draw(rect(track_x, row_top + 1.0, track_width * entry.score / 10.0, 3.0, Some(color), None));
        let value = format!("{}/10", format_score(entry.score));
        flow.draw(ctx.aligned(&value, track_x + track_width, value_width, row_top + 3.5, 8, true, color, HorizontalAlignment::Right));
    }
    flow.advance(score_height(block));
}

fn format_score(score: f64) -> String {
    if score.fract().abs() < f64::EPSILON {
        format!("{}", score as i64)
    } else {
        format!("{:.1}", score)
    }
}

struct TableRowPlan {
    cells: Vec<Vec<String>>,
    height: f64,
}

struct TablePlan {
    widths: Vec<f64>,
    header: Vec<Vec<String>>,
    header_height: f64,
    rows: Vec<TableRowPlan>,
}

fn column_widths(table: &Table, width: f64) -> Vec<f64> {
    let fixed: f64 = table
        .columns()
        .iter()
        .filter_map(|column| match column.width {
            ColumnWidth::Fixed(mm) => Some(mm.max(0.0)),
            ColumnWidth::Flex(_) => None,
        })
        .sum();
    let weights: f64 = table
        .columns()
        .iter()
        .filter_map(|column| match column.width {
            ColumnWidth::Flex(weight) => Some(weight.max(0.0)),
            ColumnWidth::Fixed(_) => None,
        })
        .sum();
    let leftover = (width - fixed).max(0.0);
    let widths: Vec<f64> = table
        .columns()
        .iter()
        .map(|column| match column.width {
            ColumnWidth::Fixed(mm) => mm.max(0.0),
            ColumnWidth::Flex(weight) if weights > 0.0 => leftover * weight.max(0.0) / weights,
            ColumnWidth::Flex(_) => 0.0,
        })
        .collect();
    let total: f64 = widths.iter().sum();
    if total > 0.0 && (weights <= 0.0 || total > width) {
        widths.iter().map(|w| w * width / total).collect()
    } else {
        widths
    }
}

impl TablePlan {
    fn new(table: &Table, ctx: &RenderContext<'_>, width: f64) -> Self {
        let style = table.style();
        let widths = column_widths(table, width);
        let padding = style.padding;
        let inner = |column: usize| (widths[column] - 2.0 * padding).max(1.0);

        let (header, header_height) = if style.show_header {
            let header: Vec<Vec<String>> = table
                .columns()
                .iter()
                .enumerate()
                .map(|(column, spec)| wrap(ctx.fonts, &spec.label, style.header_font_size, true, inner(column)))
                .collect();
            let lines = header.iter().map(Vec::len).max().unwrap_or(1).max(1);
            let height = lines as f64 * line_height(style.header_font_size) + 2.0 * padding;
            (header, height)
        } else {
            (Vec::new(), 0.0)
        };

        let rows = table
            .rows()
            .iter()
            .enumerate()
            .map(|(row, values)| {
                let cells: Vec<Vec<String>> = values
                    .iter()
                    .enumerate()
                    .map(|(column, value)| {
                        let bold = table.cell_style(row, column).and_then(|s| s.bold).unwrap_or(false);
                        wrap(ctx.fonts, value, style.font_size, bold, inner(column))
                    })
                    .collect();
                let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
                TableRowPlan {
                    cells,
                    height: lines as f64 * line_height(style.font_size) + 2.0 * padding,
                }
            })
            .collect();

        Self {
            widths,
            header,
            header_height,
            rows,
        }
    }

    fn draw_header(&self, table: &Table, ctx: &RenderContext<'_>, flow: &mut Flow) {
        if !table.style().show_header {
            return;
        }
        let style = table.style();
        let top = flow.cursor();
        let mut x = flow.left();
        let fill = style.header_fill.unwrap_or(ctx.palette.primary);
        flow.draw(rect(x, top, self.widths.iter().sum(), self.header_height, Some(fill), None));
        for (column, lines) in self.header.iter().enumerate() {
            let width = self.widths[column];
            let alignment = table.columns()[column].alignment;
            draw_lines(ctx, flow, lines, x + style.padding, width - 2.0 * style.padding, top + style.padding, style.header_font_size, true, style.header_text, alignment);
            x += width;
        }
        flow.advance(self.header_height);
    }

    fn draw_row(&self, table: &Table, index: usize, ctx: &RenderContext<'_>, flow: &mut Flow) {
        let style = table.style();
        let row = &self.rows[index];
        let top = flow.cursor();
        let zebra = if style.striped && index % 2 == 1 {
            Some(style.zebra.unwrap_or(ctx.palette.light_bg))
        } else {
            None
        };
        let mut x = flow.left();
        for (column, lines) in row.cells.iter().enumerate() {
            let width = self.widths[column];
            let cell_style = table.cell_style(index, column).copied().unwrap_or_default();
            let fill = cell_style.fill.or(zebra);
            let stroke = style.border.map(|color| Stroke::new(color, 0.2));
            if fill.is_some() || stroke.is_some() {
                flow.draw(rect(x, top, width, row.height, fill, stroke));
            }
            draw_lines(
                ctx,
                flow,
                lines,
                x + style.padding,
                width - 2.0 * style.padding,
                top + style.padding,
                style.font_size,
                cell_style.bold.unwrap_or(false),
                cell_style.text.unwrap_or(ctx.palette.text_dark),
                table.columns()[column].alignment,
            );
            x += width;
        }
        flow.advance(row.height);
    }
}

fn render_table(table: &Table, ctx: &RenderContext<'_>, flow: &mut Flow) -> Result<(), LayoutError> {
    let plan = TablePlan::new(table, ctx, flow.width());
    let capacity = flow.capacity();
    if let Some(tallest) = plan.rows.iter().map(|row| row.height).reduce(f64::max) {
        if plan.header_height + tallest > capacity {
            return Err(LayoutError::BlockTooTall {
                kind: "table row",
                height: plan.header_height + tallest,
                available: capacity,
            });
        }
    }

    let first = plan.rows.first().map_or(0.0, |row| row.height);
    if plan.header_height + first > flow.remaining() && !flow.page_is_blank() {
        flow.new_page();
    }
    plan.draw_header(table, ctx, flow);
    for index in 0..plan.rows.len() {
        if plan.rows[index].height > flow.remaining() {
            flow.new_page();
            plan.draw_header(table, ctx, flow);
        }
        plan.draw_row(table, index, ctx, flow);
    }
    Ok(())
}

fn image_row_height(grid: &ImageGrid) -> f64 {
    grid.cell_height() + IMAGE_CAPTION_BAND
}

fn render_image_grid(grid: &ImageGrid, ctx: &RenderContext<'_>, flow: &mut Flow) -> Result<(), LayoutError> {
    let row_height = image_row_height(grid);
    let capacity = flow.capacity();
    if !grid.is_empty() && row_height > capacity {
        return Err(LayoutError::BlockTooTall {
            kind: "image grid row",
            height: row_height,
            available: capacity,
        });
    }

    let cell_width = (flow.width() - IMAGE_GAP) / ImageGrid::COLUMNS as f64;
    for (index, row) in grid.images().chunks(ImageGrid::COLUMNS).enumerate() {
        if index > 0 {
            if flow.remaining() >= IMAGE_GAP + row_height {
                flow.advance(IMAGE_GAP);
            } else {
                flow.new_page();
            }
        } else if row_height > flow.remaining() && !flow.page_is_blank() {
            flow.new_page();
        }
        let top = flow.cursor();
        for (column, cell) in row.iter().enumerate() {
            let x = flow.left() + column as f64 * (cell_width + IMAGE_GAP);
            draw_image_cell(grid, cell, ctx, flow, x, top, cell_width);
        }
        flow.advance(row_height);
    }
    Ok(())
}

fn draw_image_cell(grid: &ImageGrid, cell: &GridImage, ctx: &RenderContext<'_>, flow: &mut Flow, x: f64, top: f64, width: f64) {
    let height = grid.cell_height();
    match &cell.image {
        ImageAsset::Ready(image) => {
            let aspect = image.aspect_ratio();
            let (draw_width, draw_height) = if width / height > aspect {
                (height * aspect, height)
            } else {
                (width, width / aspect)
            };
            flow.draw(DrawOp::Image {
                x: x + (width - draw_width) / 2.0,
                y: top + (height - draw_height) / 2.0,
                width: draw_width,
                height: draw_height,
                image: image.clone(),
            });
        }
        ImageAsset::Unavailable { .. } => {
            flow.draw(rect(x, top, width, height, Some(ctx.palette.placeholder), Some(Stroke::new(ctx.palette.rule, 0.3))));
            let label = single_line(ctx.fonts, grid.placeholder_label(), 8, false, width - 4.0);
            flow.draw(ctx.aligned(&label, x, width, top + height / 2.0 + 1.0, 8, false, ctx.palette.text_gray, HorizontalAlignment::Center));
        }
    }
    let caption = single_line(ctx.fonts, &cell.caption, CAPTION_SIZE, false, width);
    if !caption.is_empty() {
        flow.draw(ctx.aligned(&caption, x, width, top + height + 4.0, CAPTION_SIZE, false, ctx.palette.text_gray, HorizontalAlignment::Center));
    }
}
