//! Digital business card ("Kartvizit") PDF with a branded vCard QR code.

use crate::assets::ImageAsset;
use crate::model::{Block, GridImage, ImageGrid, InfoGrid, TitleBar};
use crate::qr::{render_code, vcard, CodeError, CodeStyle, ContactCard};

use super::{or_dash, ReportContext};

pub const REPORT_TYPE: &str = "Kartvizit";
pub const TITLE: &str = "Dijital Kartvizit";

const QR_CAPTION: &str = "Rehbere eklemek için okutun";

/// Blocks of the card. `photo` is the resolved portrait, if one was given.
pub fn blocks(
    data: &ContactCard,
    context: &ReportContext<'_>,
    photo: Option<ImageAsset>,
) -> Result<Vec<Block>, CodeError> {
    let code = render_code(&vcard(data), &CodeStyle::default())?;

    let mut images = vec![GridImage::new(code.to_asset(), QR_CAPTION)];
    if let Some(photo) = photo {
        images.push(GridImage::new(photo, data.name.trim()));
    }

    let title = if data.name.trim().is_empty() {
        context.brand.name.clone()
    } else {
        data.name.trim().to_owned()
    };
    Ok(vec![
        TitleBar::new(title)
            .with_subtitle(data.title.trim())
            .with_meta(data.tagline.trim())
            .into(),
        InfoGrid::new()
            .with_heading("İletişim")
            .with_columns(2)
            .entry("Telefon", or_dash(&data.phone))
            .entry("E-posta", or_dash(&data.email))
            .entry("Web", or_dash(&data.website))
            .entry("Instagram", or_dash(&data.instagram))
            .entry("Konum", or_dash(&data.location))
            .into(),
        ImageGrid::new(images)
            .with_cell_height(70.0)
            .with_placeholder_label(context.brand.unavailable_label.clone())
            .into(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use chrono::NaiveDate;

    #[test]
    fn code_is_the_first_grid_image() {
        let config = EngineConfig::default();
        let context = ReportContext::new(&config, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        let card = ContactCard {
            name: "İlhan Arslan".into(),
            phone: "+90 539 233 11 474".into(),
            website: "arslanops.com".into(),
            ..ContactCard::default()
        };
        let blocks = blocks(&card, &context, None).unwrap();
        let Some(Block::ImageGrid(grid)) = blocks.last() else {
            panic!("expected an image grid");
        };
        assert_eq!(grid.images().len(), 1);
        assert!(grid.images()[0].image.is_ready());
    }

    #[test]
    fn failed_portrait_keeps_its_cell() {
        let config = EngineConfig::default();
        let context = ReportContext::new(&config, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        let photo = ImageAsset::Unavailable {
            url: "/uploads/me.jpg".into(),
            reason: "timeout".into(),
        };
        let blocks = blocks(&ContactCard::default(), &context, Some(photo)).unwrap();
        assert!(matches!(blocks.last(), Some(Block::ImageGrid(grid)) if grid.images().len() == 2));
        assert!(matches!(blocks.first(), Some(Block::TitleBar(bar)) if bar.title() == "ArslanOps"));
    }
}
