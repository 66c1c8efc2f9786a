//! Consulting service agreement ("Hizmet Sözleşmesi") and mutual
//! non-disclosure agreement ("Gizlilik Sözleşmesi") PDFs.
//!
//! Both documents share one [`Contract`] record: the two parties, dates, the
//! fee split and the confidentiality terms. Articles are numbered in the order
//! they are pushed.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::model::{
    parse_number, Block, CellRule, CellStyle, Column, FreeTextBox, InfoGrid, SectionHeader, SignatureBlock, Table,
    TableStyle, TitleBar, ValuePredicate,
};

use super::monthly::grouped;
use super::{display_date, ReportContext};

pub const SERVICE_REPORT_TYPE: &str = "HizmetSozlesmesi";
pub const SERVICE_TITLE: &str = "Danışmanlık Hizmet Sözleşmesi";
pub const SERVICE_NOTICE: &str = "Bu sözleşme gizli olup yalnızca tarafların kullanımına mahsustur.";

pub const NDA_REPORT_TYPE: &str = "GizlilikSozlesmesi";
pub const NDA_TITLE: &str = "Gizlilik Sözleşmesi (NDA)";
pub const NDA_NOTICE: &str = "GİZLİ - Bu belge yalnızca imza sahibi tarafların kullanımına mahsustur.";

const UNSET: &str = "(Belirlenmedi)";
const DEFAULT_UPFRONT_PERCENT: f64 = 50.0;
const DEFAULT_TERM: &str = "2 yıl";
const SIGNATURE_CAPTION: &str = "İmza / Tarih / Kaşe - Mühür";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contract {
    #[serde(alias = "danisman_adi")]
    pub consultant_name: String,
    #[serde(alias = "danisman_unvan")]
    pub consultant_title: String,
    #[serde(alias = "danisman_telefon")]
    pub consultant_phone: String,
    #[serde(alias = "danisman_email")]
    pub consultant_email: String,
    #[serde(alias = "danisman_adres")]
    pub consultant_address: String,
    #[serde(alias = "danisman_vergi_dairesi")]
    pub consultant_tax_office: String,
    #[serde(alias = "danisman_vergi_no")]
    pub consultant_tax_number: String,
    #[serde(alias = "musteri_adi")]
    pub client_name: String,
    #[serde(alias = "musteri_isletme")]
    pub client_business: String,
    #[serde(alias = "musteri_telefon")]
    pub client_phone: String,
    #[serde(alias = "musteri_email")]
    pub client_email: String,
    #[serde(alias = "musteri_adres")]
    pub client_address: String,
    #[serde(alias = "musteri_vergi_dairesi")]
    pub client_tax_office: String,
    #[serde(alias = "musteri_vergi_no")]
    pub client_tax_number: String,
    #[serde(alias = "sozlesme_no")]
    pub contract_number: String,
    #[serde(alias = "sozlesme_tarihi")]
    pub contract_date: String,
    #[serde(alias = "baslangic_tarihi")]
    pub start_date: String,
    #[serde(alias = "bitis_tarihi")]
    pub end_date: String,
    #[serde(alias = "sure")]
    pub duration: String,
    #[serde(alias = "hizmet_kapsami")]
    pub scope: String,
    #[serde(alias = "toplam_ucret")]
    pub total_fee: String,
    #[serde(alias = "pesin_oran")]
    pub upfront_percent: String,
    #[serde(alias = "kalan_oran")]
    pub remaining_percent: String,
    #[serde(alias = "odeme_notu")]
    pub payment_note: String,
    #[serde(alias = "gizlilik_suresi")]
    pub confidentiality_term: String,
    #[serde(alias = "cezai_sart")]
    pub penalty: String,
}

/// Fee and its upfront / on-completion split, in currency units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeeSplit {
    pub total: f64,
    pub upfront_percent: f64,
    pub remaining_percent: f64,
    pub upfront: f64,
    pub remaining: f64,
}

impl Contract {
    /// Entity used in the file name: the client business, else the client.
    pub fn entity(&self) -> &str {
        if self.client_business.trim().is_empty() {
            &self.client_name
        } else {
            &self.client_business
        }
    }

    /// Upfront share defaults to half; the remainder covers the rest.
    pub fn percents(&self) -> (f64, f64) {
        let upfront = parse_number(&self.upfront_percent)
            .unwrap_or(DEFAULT_UPFRONT_PERCENT)
            .clamp(0.0, 100.0);
        let remaining = parse_number(&self.remaining_percent).unwrap_or(100.0 - upfront);
        (upfront, remaining)
    }

    /// `None` while no fee has been agreed.
    pub fn fee_split(&self) -> Option<FeeSplit> {
        let total = parse_number(&self.total_fee)?;
        let (upfront_percent, remaining_percent) = self.percents();
        Some(FeeSplit {
            total,
            upfront_percent,
            remaining_percent,
            upfront: (total * upfront_percent / 100.0).round(),
            remaining: (total * remaining_percent / 100.0).round(),
        })
    }

    fn date_label(&self, context: &ReportContext<'_>) -> String {
        if self.contract_date.trim().is_empty() {
            context.date_label()
        } else {
            display_date(&self.contract_date)
        }
    }

    fn term(&self) -> &str {
        if self.confidentiality_term.trim().is_empty() {
            DEFAULT_TERM
        } else {
            self.confidentiality_term.trim()
        }
    }
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.trim().is_empty() {
        placeholder.to_owned()
    } else {
        value.trim().to_owned()
    }
}

fn percent(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

/// Numbers articles as they are added.
struct Articles {
    blocks: Vec<Block>,
    next: usize,
    accent: Rgb,
    rule: Rgb,
}

impl Articles {
    fn new(context: &ReportContext<'_>) -> Self {
        Self {
            blocks: Vec::new(),
            next: 1,
            accent: context.palette.accent,
            rule: context.palette.rule,
        }
    }

    fn heading(&mut self, title: &str) {
        self.blocks
            .push(SectionHeader::new(format!("MADDE {} - {}", self.next, title)).with_accent(self.accent).into());
        self.next += 1;
    }

    fn paragraph(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !text.trim().is_empty() {
            self.blocks
                .push(FreeTextBox::new(text.trim()).with_fill(Rgb::WHITE).with_accent(self.rule).into());
        }
    }

    fn article(&mut self, title: &str, paragraphs: &[&str]) {
        self.heading(title);
        for paragraph in paragraphs {
            self.paragraph(*paragraph);
        }
    }

    fn push(&mut self, block: impl Into<Block>) {
        self.blocks.push(block.into());
    }
}

fn consultant_grid(data: &Contract, heading: &str) -> InfoGrid {
    let mut grid = InfoGrid::new()
        .with_heading(heading)
        .with_columns(2)
        .entry("Ad Soyad", or_placeholder(&data.consultant_name, "(Ad Soyad)"))
        .entry("Unvan", data.consultant_title.trim())
        .entry("Telefon", data.consultant_phone.trim())
        .entry("E-posta", data.consultant_email.trim());
    if !data.consultant_tax_office.trim().is_empty() {
        grid = grid.entry(
            "Vergi Dairesi / No",
            format!("{} - {}", data.consultant_tax_office.trim(), data.consultant_tax_number.trim()),
        );
    }
    if !data.consultant_address.trim().is_empty() {
        grid = grid.entry("Adres", data.consultant_address.trim());
    }
    grid
}

fn client_grid(data: &Contract, heading: &str, fill: Rgb) -> InfoGrid {
    let mut grid = InfoGrid::new()
        .with_heading(heading)
        .with_columns(2)
        .with_fill(fill)
        .entry("Ad Soyad", or_placeholder(&data.client_name, "(Ad Soyad)"))
        .entry("İşletme", or_placeholder(&data.client_business, "(İşletme Adı)"))
        .entry("Telefon", or_placeholder(&data.client_phone, "(Telefon)"))
        .entry("E-posta", or_placeholder(&data.client_email, "(E-posta)"));
    if !data.client_tax_office.trim().is_empty() {
        grid = grid.entry(
            "Vergi Dairesi / No",
            format!("{} - {}", data.client_tax_office.trim(), data.client_tax_number.trim()),
        );
    }
    if !data.client_address.trim().is_empty() {
        grid = grid.entry("Adres", data.client_address.trim());
    }
    grid
}

fn key_value_table(rows: Vec<[String; 2]>, label_width: f64, context: &ReportContext<'_>) -> Table {
    let mut table = Table::new(vec![Column::fixed("Kalem", label_width), Column::flex("Değer", 1.0)]).with_style(TableStyle {
        show_header: false,
        font_size: 9,
        padding: 3.0,
        zebra: Some(context.palette.light_bg),
        ..TableStyle::default()
    });
    for row in rows {
        table.push_row(row);
    }
    table.with_rule(CellRule::column(0, ValuePredicate::Any, CellStyle::text(context.palette.primary).bold()))
}

/// Rows of the payment table: total, upfront and on-completion amounts.
pub fn payment_rows(data: &Contract, context: &ReportContext<'_>) -> Vec<[String; 2]> {
    let suffix = &context.brand.currency_suffix;
    let (upfront_percent, remaining_percent) = data.percents();
    let (total, upfront, remaining) = match data.fee_split() {
        Some(split) => (
            format!("{} {}", grouped(split.total), suffix),
            format!("{} {}", grouped(split.upfront), suffix),
            format!("{} {}", grouped(split.remaining), suffix),
        ),
        None => (UNSET.to_owned(), "-".to_owned(), "-".to_owned()),
    };
    vec![
        ["Toplam Danışmanlık Ücreti".to_owned(), total],
        [
            format!("Peşin Ödeme (%{})", percent(upfront_percent)),
            format!("{} - Sözleşme imzalandığında", upfront),
        ],
        [
            format!("Kalan Ödeme (%{})", percent(remaining_percent)),
            format!("{} - Hizmet tamamlandığında", remaining),
        ],
    ]
}

fn signatures(data: &Contract, left: &str, right: &str) -> SignatureBlock {
    SignatureBlock::new()
        .party(left, or_placeholder(&data.consultant_name, "(Ad Soyad)"))
        .party(right, or_placeholder(&data.client_name, "(Ad Soyad)"))
        .with_caption(SIGNATURE_CAPTION)
}

pub fn service_blocks(data: &Contract, context: &ReportContext<'_>) -> Vec<Block> {
    let palette = context.palette;
    let mut articles = Articles::new(context);
    articles.push(
        TitleBar::new(SERVICE_TITLE)
            .with_subtitle(format!("Sözleşme No: {}", or_placeholder(&data.contract_number, "-")))
            .with_meta(format!("Tarih: {}  |  {}", data.date_label(context), context.brand.name)),
    );

    articles.heading("TARAFLAR");
    articles.push(consultant_grid(data, "DANIŞMAN (Hizmet Veren)"));
    articles.push(client_grid(data, "MÜŞTERİ (Hizmet Alan)", palette.cream));

    articles.article(
        "SÖZLEŞMENİN KONUSU",
        &["Bu sözleşme, Danışman'ın Müşteri'ye aşağıda belirtilen danışmanlık hizmetlerini vermesine ilişkin tarafların hak ve yükümlülüklerini düzenlemektedir."],
    );

    articles.heading("HİZMET KAPSAMI");
    articles.paragraph(or_placeholder(&data.scope, UNSET));

    articles.heading("SÖZLEŞME SÜRESİ");
    articles.push(key_value_table(
        vec![
            ["Başlangıç Tarihi".to_owned(), or_placeholder(&display_date(&data.start_date), UNSET)],
            ["Bitiş Tarihi".to_owned(), or_placeholder(&display_date(&data.end_date), UNSET)],
            ["Toplam Süre".to_owned(), or_placeholder(&data.duration, UNSET)],
        ],
        45.0,
        context,
    ));
    articles.paragraph("Sözleşme süresi, tarafların karşılıklı yazılı mutabakatı ile uzatılabilir. Erken fesih durumunda Fesih Koşulları maddesi hükümleri geçerlidir.");

    articles.heading("ÜCRET VE ÖDEME KOŞULLARI");
    articles.push(key_value_table(payment_rows(data, context), 55.0, context));
    articles.paragraph(data.payment_note.as_str());
    articles.paragraph("Ödemeler banka havalesi veya EFT yoluyla yapılır. Fatura, ödeme tarihinden itibaren 7 iş günü içinde kesilir. KDV (%20) ücrete dahil değildir ve ayrıca faturalandırılır.");

    articles.article(
        "TARAFLARIN YÜKÜMLÜLÜKLERİ",
        &[
            "Danışman'ın yükümlülükleri:\n- Hizmeti profesyonel standartlarda, özenle ve zamanında sunmak\n- Müşteri'nin ticari sırlarını ve gizli bilgilerini korumak\n- İlerleme raporlarını zamanında teslim etmek\n- Sözleşme kapsamındaki tüm çalışmaları bizzat veya onay alınmış ekibi ile yürütmek",
            "Müşteri'nin yükümlülükleri:\n- Hizmetin yürütülmesi için gerekli bilgi, belge ve erişimi sağlamak\n- Ödeme yükümlülüklerini zamanında yerine getirmek\n- Danışman'ın önerilerini makul sürede değerlendirmek\n- Danışman'a gerekli çalışma ortamını ve işbirliği imkânını sunmak",
        ],
    );
    articles.article(
        "FESİH KOŞULLARI",
        &[
            "Taraflardan her biri, 15 (on beş) gün önceden yazılı bildirimde bulunarak sözleşmeyi feshedebilir.",
            "Müşteri tarafından erken fesih halinde, fesih tarihine kadar verilen hizmetlerin bedeli ve yapılan masraflar Müşteri tarafından ödenir. Peşin ödenen tutar iade edilmez.",
            "Danışman tarafından erken fesih halinde, tamamlanmamış hizmetlere ait peşin alınan ücret iade edilir.",
        ],
    );
    let confidentiality = format!(
        "Taraflar, bu sözleşme kapsamında edindikleri tüm ticari, mali ve operasyonel bilgileri gizli tutmayı, üçüncü şahıslarla paylaşmamayı ve yalnızca sözleşme amacı doğrultusunda kullanmayı taahhüt eder. Bu yükümlülük sözleşmenin sona ermesinden sonra da {} süreyle geçerlidir.",
        data.term()
    );
    articles.article("GİZLİLİK", &[confidentiality.as_str()]);
    articles.article(
        "UYUŞMAZLIK ÇÖZÜMÜ",
        &["Bu sözleşmeden doğan uyuşmazlıklarda önce dostane çözüm yolu aranacaktır. Çözüme ulaşılamaması halinde İstanbul Mahkemeleri ve İcra Daireleri yetkilidir."],
    );
    articles.article(
        "GENEL HÜKÜMLER",
        &[
            "Bu sözleşme, tarafların serbest iradeleri ile tanzim edilmiş olup, imza tarihinden itibaren yürürlüğe girer.",
            "Sözleşmede yapılacak değişiklikler, tarafların yazılı mutabakatı ile geçerlilik kazanır.",
            "Bu sözleşme 2 (iki) nüsha olarak hazırlanmış ve her iki tarafça imzalanmıştır.",
        ],
    );
    articles.push(signatures(data, "DANIŞMAN", "MÜŞTERİ"));
    articles.blocks
}

pub fn nda_blocks(data: &Contract, context: &ReportContext<'_>) -> Vec<Block> {
    let palette = context.palette;
    let mut articles = Articles::new(context);
    articles.push(
        TitleBar::new(NDA_TITLE)
            .with_subtitle("Karşılıklı Gizlilik Taahhütnamesi")
            .with_meta(format!("Tarih: {}  |  {}", data.date_label(context), context.brand.name)),
    );

    articles.heading("TARAFLAR");
    articles.push(consultant_grid(data, "TARAF A (Danışman)"));
    articles.push(client_grid(data, "TARAF B (Müşteri)", palette.cream));

    articles.article(
        "AMAÇ",
        &["Bu sözleşme, tarafların danışmanlık hizmeti kapsamında birbirlerine açıklayacakları gizli bilgilerin korunmasını sağlamak amacıyla düzenlenmiştir. Her iki taraf da karşılıklı olarak gizlilik yükümlülüğü altındadır."],
    );
    articles.article(
        "GİZLİ BİLGİ TANIMI",
        &[
            "Gizli bilgi, taraflardan birinin diğerine yazılı, sözlü, elektronik veya herhangi bir yolla ilettiği aşağıdaki nitelikteki tüm bilgileri kapsar:",
            "a) Ticari sırlar, iş planları, stratejiler, mali veriler\nb) Müşteri listeleri, tedarikçi bilgileri, fiyatlandırma politikaları\nc) Operasyonel süreçler, reçeteler, formüller, üretim yöntemleri\nd) Çalışan bilgileri, maaş verileri, organizasyon yapısı\ne) BT altyapısı, yazılım bilgileri, kullanıcı verileri\nf) Danışmanlık raporları, analiz sonuçları, öneriler ve aksiyon planları\ng) Sözleşme detayları ve ticari ilişkiyle ilgili her türlü bilgi",
        ],
    );
    articles.article(
        "GİZLİLİK YÜKÜMLÜLÜKLERİ",
        &[
            "Taraflar, gizli bilgileri yalnızca sözleşme amacı doğrultusunda kullanacaktır.",
            "Gizli bilgiler, karşı tarafın yazılı izni olmaksızın üçüncü şahıslarla paylaşılmayacaktır.",
            "Taraflar, gizli bilgileri en az kendi gizli bilgilerini koruduğu ölçüde koruyacaktır.",
            "Gizli bilgilere erişim, yalnızca \"bilmesi gereken\" kişilerle sınırlı tutulacaktır.",
            "Gizli bilgilerin kopyalanması, çoğaltılması veya kaydedilmesi yalnızca iş gereği gerekli olduğunca yapılabilir.",
        ],
    );
    articles.article(
        "İSTİSNALAR",
        &["Aşağıdaki durumlar gizlilik kapsamında değildir:\na) Kamuya açık olan veya tarafın kusuru olmaksızın kamuya açık hale gelen bilgiler\nb) Alıcı tarafın gizlilik yükümlülüğü olmaksızın üçüncü bir şahıstan yasal yollarla edindiği bilgiler\nc) Alıcı tarafın bağımsız olarak geliştirdiği bilgiler\nd) Yasal zorunluluk nedeniyle ifşa edilmesi gereken bilgiler (bu durumda diğer taraf derhal bilgilendirilecektir)"],
    );
    let term = format!(
        "Bu gizlilik sözleşmesi, imza tarihinden itibaren geçerli olup, danışmanlık sözleşmesinin sona ermesinden sonra {} süre ile yürürlükte kalmaya devam eder.",
        data.term()
    );
    articles.article("SÜRE", &[term.as_str()]);
    let penalty = match parse_number(&data.penalty) {
        Some(amount) => format!("{} {}", grouped(amount), context.brand.currency_suffix),
        None => UNSET.to_owned(),
    };
    let breach = format!(
        "Gizlilik yükümlülüğünü ihlal eden taraf, diğer tarafa {} tutarında cezai şart ödemeyi kabul ve taahhüt eder.",
        penalty
    );
    articles.article(
        "İHLAL VE CEZAİ ŞART",
        &[
            breach.as_str(),
            "Cezai şartın ödenmesi, zarar gören tarafın genel hükümlere göre tazminat talep etme hakkını ortadan kaldırmaz.",
            "İhlal halinde zarar gören taraf, ihtiyati tedbir ve diğer yasal yollara başvurma hakkını saklı tutar.",
        ],
    );
    articles.article(
        "İADE YÜKÜMLÜLÜĞÜ",
        &["Sözleşmenin sona ermesi veya feshi halinde, taraflar birbirlerine ait tüm gizli bilgileri, kopyaları ve türevlerini iade edecek veya imha edecek ve bunu yazılı olarak teyit edecektir."],
    );
    articles.article(
        "UYGULANACAK HUKUK VE YETKİ",
        &["Bu sözleşme Türkiye Cumhuriyeti hukukuna tabidir. Uyuşmazlıklarda İstanbul Mahkemeleri ve İcra Daireleri yetkilidir."],
    );
    articles.push(signatures(data, "TARAF A (Danışman)", "TARAF B (Müşteri)"));
    articles.blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use chrono::NaiveDate;

    fn context(config: &EngineConfig) -> ReportContext<'_> {
        ReportContext::new(config, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
    }

    fn headings(blocks: &[Block]) -> Vec<String> {
        blocks
            .iter()
            .filter_map(|block| match block {
                Block::SectionHeader(header) => Some(header.label().to_owned()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn fee_is_split_by_the_upfront_share() {
        let data: Contract = serde_json::from_str(r#"{"toplam_ucret": "45000", "pesin_oran": "40"}"#).unwrap();
        let split = data.fee_split().unwrap();
        assert_eq!(split.upfront, 18000.0);
        assert_eq!(split.remaining, 27000.0);

        let config = EngineConfig::default();
        let rows = payment_rows(&data, &context(&config));
        assert_eq!(rows[0][1], "45.000 ₺");
        assert_eq!(rows[1][0], "Peşin Ödeme (%40)");
        assert_eq!(rows[2][1], "27.000 ₺ - Hizmet tamamlandığında");
    }

    #[test]
    fn missing_fee_reads_as_unset() {
        let config = EngineConfig::default();
        let rows = payment_rows(&Contract::default(), &context(&config));
        assert_eq!(rows[0][1], UNSET);
        assert_eq!(rows[1][0], "Peşin Ödeme (%50)");
        assert_eq!(rows[2][1], "- - Hizmet tamamlandığında");
    }

    #[test]
    fn service_agreement_numbers_ten_articles() {
        let config = EngineConfig::default();
        let blocks = service_blocks(&Contract::default(), &context(&config));
        let headings = headings(&blocks);
        assert_eq!(headings.len(), 10);
        assert_eq!(headings[0], "MADDE 1 - TARAFLAR");
        assert_eq!(headings[9], "MADDE 10 - GENEL HÜKÜMLER");
        assert!(matches!(blocks.last(), Some(Block::SignatureBlock(block)) if block.parties()[1].name == "(Ad Soyad)"));
    }

    #[test]
    fn nda_carries_term_and_penalty() {
        let data = Contract {
            penalty: "50.000".into(),
            confidentiality_term: "3 yıl".into(),
            ..Contract::default()
        };
        let config = EngineConfig::default();
        let blocks = nda_blocks(&data, &context(&config));
        assert_eq!(headings(&blocks).len(), 9);
        let bodies: Vec<&str> = blocks
            .iter()
            .filter_map(|block| match block {
                Block::FreeTextBox(text) => Some(text.body()),
                _ => None,
            })
            .collect();
        assert!(bodies.iter().any(|body| body.contains("50.000 ₺ tutarında")));
        assert!(bodies.iter().any(|body| body.contains("3 yıl süre ile")));
    }
}
