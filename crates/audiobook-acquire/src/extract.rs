use crate::attachment::resolve_attachment_id;
use crate::html::{element_text, next_sibling_named, selector, CatalogPage};
use crate::normalize::{ascii_digits, contains_label};
use audiobook_model::AudiobookRecord;
use regex::Regex;
use std::sync::LazyLock;
use Locator::{InfoBox, TagList};

/// Origin used to absolutize relative cover and download URLs.
pub const SITE_BASE: &str = "https://book.iranseda.ir/";
const PLAYER_BASE: &str = "https://player.iranseda.ir/book-player/";
const PERSIAN: &str = "فارسی";
const JOINER: &str = "، ";

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2}:\d{2}:\d{2}|\d{1,3}:\d{2})").expect("valid regex")
});
static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

const DURATION_LABELS: &[&str] = &["مدت", "مدت زمان", "زمان"];
const EPISODE_LABELS: &[&str] = &["تعداد قسمت", "تعداد قطعه", "تعداد قطعات", "تعداد قسمت‌ها"];

/// Where a labeled value may live on a catalog page.
#[derive(Debug, Clone, Copy)]
enum Locator {
    /// `.item-info dd.field` entries with a `<strong>` label.
    InfoBox,
    /// `#tags` definition list: `<dt>` label, `<dd>` of `<span>` values.
    TagList,
}

/// One step of a field's lookup chain.
#[derive(Debug, Clone, Copy)]
struct Lookup(Locator, &'static str);

const AUTHOR: &[Lookup] = &[
    Lookup(InfoBox, "نویسنده"),
    Lookup(TagList, "عنوان كتاب مرجع"),
    Lookup(TagList, "نویسنده"),
];
const TRANSLATOR: &[Lookup] = &[Lookup(TagList, "ترجمه")];
const NARRATOR: &[Lookup] = &[Lookup(TagList, "راوی")];
const DIRECTOR: &[Lookup] = &[Lookup(InfoBox, "کارگردان"), Lookup(TagList, "کارگردان")];
const PRODUCER: &[Lookup] = &[Lookup(TagList, "تهیه‌کننده")];
const SOUND_ENGINEER: &[Lookup] = &[Lookup(TagList, "صدابردار")];
const EFFECTOR: &[Lookup] = &[Lookup(TagList, "افکتور"), Lookup(TagList, "افكتور")];
const ACTORS: &[Lookup] = &[Lookup(TagList, "بازیگران")];
const GENRE: &[Lookup] = &[Lookup(TagList, "کلمه کلیدی"), Lookup(TagList, "نوع متن")];
const CATEGORY: &[Lookup] = &[Lookup(TagList, "دسته بندی ها"), Lookup(InfoBox, "دسته‌بندی")];
const COUNTRY: &[Lookup] = &[Lookup(TagList, "کشور")];

/// Extract every metadata field the catalog page carries.
///
/// Pure function of the page: the download columns and the summary are
/// left empty for the run driver to fill in.
pub fn extract_fields(page: &CatalogPage) -> AudiobookRecord {
    extract_with_attachment(page, resolve_attachment_id(page))
}

/// [`extract_fields`] with an attachment id the caller already resolved.
pub fn extract_with_attachment(page: &CatalogPage, attachment_id: Option<u64>) -> AudiobookRecord {
    let audiobook_id = public_id(&page.url);
    let (duration, episode_count) = duration_and_episodes(page);

    let player_link = match (&audiobook_id, attachment_id) {
        (Some(g), Some(attid)) => Some(player_link(g, attid)),
        _ => None,
    };

    AudiobookRecord {
        title: page
            .first_text("h1.titel")
            .or_else(|| page.first_text("h1")),
        description: description(page),
        detail: detail(page),
        language: language(page),
        country: lookup(page, COUNTRY),
        author: lookup(page, AUTHOR),
        translator: lookup(page, TRANSLATOR),
        narrator: lookup(page, NARRATOR),
        director: lookup(page, DIRECTOR),
        producer: lookup(page, PRODUCER),
        sound_engineer: lookup(page, SOUND_ENGINEER),
        effector: lookup(page, EFFECTOR),
        actors: lookup(page, ACTORS),
        genre: lookup(page, GENRE),
        category: lookup(page, CATEGORY),
        duration,
        episode_count,
        cover_image_url: cover_image(page),
        player_link,
        audiobook_id,
        ..AudiobookRecord::default()
    }
}

/// The non-empty `g` query parameter of a catalog URL.
pub fn public_id(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "g")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn player_link(public_id: &str, attachment_id: u64) -> String {
    format!("{PLAYER_BASE}?VALID=TRUE&g={public_id}&attid={attachment_id}")
}

/// Resolve `href` against the catalog origin unless it is already absolute.
pub fn absolute_url(href: &str) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }
    url::Url::parse(SITE_BASE)
        .and_then(|base| base.join(href))
        .map(|joined| joined.to_string())
        .unwrap_or_else(|_| href.to_string())
}

fn lookup(page: &CatalogPage, chain: &[Lookup]) -> Option<String> {
    chain.iter().find_map(|Lookup(locator, label)| match locator {
        InfoBox => from_info_box(page, label),
        TagList => from_tag_list(page, label),
    })
}

/// The first info-box entry whose bold label mentions `label` decides the
/// result: its link and span texts, minus the label itself.
fn from_info_box(page: &CatalogPage, label: &str) -> Option<String> {
    let strong = selector("strong");
    let values = selector("a, span");
    for dd in page.select_all(".item-info dd.field") {
        let strong_text = dd
            .select(&strong)
            .next()
            .and_then(element_text);
        let Some(strong_text) = strong_text else {
            continue;
        };
        if !contains_label(&strong_text, label) {
            continue;
        }
        let items = dd
            .select(&values)
            .filter_map(element_text)
            .filter(|text| text != label);
        return join_unique(items);
    }
    None
}

/// Tag-list entries whose `<dt>` mentions `label`; the first one with any
/// span values in its `<dd>` wins.
fn from_tag_list(page: &CatalogPage, label: &str) -> Option<String> {
    let span = selector("span");
    page.select_all("#tags dt")
        .into_iter()
        .filter(|dt| element_text(*dt).is_some_and(|text| contains_label(&text, label)))
        .filter_map(|dt| next_sibling_named(dt, "dd"))
        .find_map(|dd| {
            let values = dd
                .select(&span)
                .filter_map(element_text)
                .filter(|text| text != ",");
            join_unique(values)
        })
}

/// De-duplicate preserving first-seen order and join with a Persian comma.
fn join_unique(items: impl Iterator<Item = String>) -> Option<String> {
    let mut seen: Vec<String> = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    if seen.is_empty() {
        None
    } else {
        Some(seen.join(JOINER))
    }
}

fn description(page: &CatalogPage) -> Option<String> {
    page.first_text("#about .body-module")
        .or_else(|| page.meta("name", "description"))
        .or_else(|| page.meta("property", "og:description"))
}

fn detail(page: &CatalogPage) -> Option<String> {
    page.first_text("#review .body-module .more")
        .or_else(|| page.first_text("#review .body-module"))
        .or_else(|| {
            page.select_all("div[class]")
                .into_iter()
                .find(|div| {
                    let class = div.value().attr("class").unwrap_or_default();
                    class.contains("full") && class.contains("description")
                })
                .and_then(element_text)
        })
}

fn language(page: &CatalogPage) -> Option<String> {
    page.meta("property", "og:locale")
        .filter(|locale| locale.contains("fa"))
        .map(|_| PERSIAN.to_string())
}

fn cover_image(page: &CatalogPage) -> Option<String> {
    page.meta("property", "og:image")
        .or_else(|| {
            [".product-view .item .image img", ".cover img", "img"]
                .iter()
                .filter_map(|css| page.select_first(css))
                .find_map(|img| img.value().attr("src").map(str::to_string))
        })
        .map(|src| absolute_url(&src))
}

/// A labeled line of page text considered for duration and episode count.
struct Candidate {
    label: String,
    value: String,
}

/// Every labeled line, in scan order: info-box entries (which carry label
/// and value in one text) and then tag-list `<dt>`/`<dd>` pairs.
fn candidates(page: &CatalogPage) -> Vec<Candidate> {
    let info_box = page
        .select_all(".item-info dd.field")
        .into_iter()
        .filter_map(element_text)
        .map(|text| Candidate {
            label: text.clone(),
            value: text,
        });

    let tag_list = page.select_all("#tags dt").into_iter().filter_map(|dt| {
        let label = element_text(dt)?;
        let value = element_text(next_sibling_named(dt, "dd")?)?;
        Some(Candidate { label, value })
    });

    info_box.chain(tag_list).collect()
}

fn duration_and_episodes(page: &CatalogPage) -> (Option<String>, Option<u32>) {
    let lines = candidates(page);
    let labeled = |labels: &'static [&'static str]| {
        lines
            .iter()
            .filter(move |c| labels.iter().any(|l| contains_label(&c.label, l)))
    };

    let duration = labeled(DURATION_LABELS)
        .find_map(|c| DURATION.find(&c.value).map(|m| m.as_str().to_string()));
    let episodes = labeled(EPISODE_LABELS).find_map(|c| {
        INTEGER
            .find(&c.value)
            .and_then(|m| ascii_digits(m.as_str()).parse().ok())
    });

    (duration, episodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://book.iranseda.ir/DetailsAlbum/?VALID=TRUE&g=674800";

    fn extract(html: &str) -> AudiobookRecord {
        extract_fields(&CatalogPage::parse(html, URL))
    }

    const FULL_PAGE: &str = r#"
    <html>
      <head>
        <meta property="og:locale" content="fa_IR">
        <meta property="og:image" content="/Image/?VALID=TRUE&AttID=98765&w=300">
        <meta name="description" content="توضیح کوتاه">
      </head>
      <body>
        <h1 class="titel">بوف کور</h1>
        <div class="item-info">
          <dl>
            <dd class="field"><strong>نویسنده</strong>
              <a href="/p/1">صادق هدایت</a> <span>صادق هدایت</span>
            </dd>
            <dd class="field"><strong>کارگردان</strong> <a href="/p/2">علی محمدی</a></dd>
            <dd class="field"><strong>مدت زمان</strong> <span>2:15:30</span></dd>
            <dd class="field"><strong>تعداد قسمت</strong> <span>۱۲ قسمت</span></dd>
          </dl>
        </div>
        <div id="about"><div class="body-module"><p>داستانی   کوتاه</p></div></div>
        <div id="review"><div class="body-module">بیرونی <div class="more">متن کامل نقد</div></div></div>
        <div id="tags">
          <dl>
            <dt>ترجمه:</dt><dd><span>مترجم یک</span><span>,</span><span>مترجم دو</span></dd>
            <dt>راوی:</dt><dd><span>گوینده</span></dd>
            <dt>تهیه کننده:</dt><dd><span>تهیه‌کننده اول</span></dd>
            <dt>صدابردار:</dt><dd><span>مهندس صدا</span></dd>
            <dt>افكتور:</dt><dd><span>افکت‌گذار</span></dd>
            <dt>بازیگران:</dt><dd><span>الف</span><span>,</span><span>ب</span><span>الف</span></dd>
            <dt>نوع متن:</dt><dd><span>رمان</span></dd>
            <dt>دسته بندی ها:</dt><dd><span>ادبیات داستانی</span></dd>
            <dt>کشور:</dt><dd><span>ایران</span></dd>
          </dl>
        </div>
      </body>
    </html>
    "#;

    #[test]
    fn test_full_page() {
        let record = extract(FULL_PAGE);

        assert_eq!(record.audiobook_id.as_deref(), Some("674800"));
        assert_eq!(record.title.as_deref(), Some("بوف کور"));
        assert_eq!(record.description.as_deref(), Some("داستانی کوتاه"));
        assert_eq!(record.detail.as_deref(), Some("متن کامل نقد"));
        assert_eq!(record.language.as_deref(), Some("فارسی"));
        assert_eq!(record.country.as_deref(), Some("ایران"));
        assert_eq!(record.author.as_deref(), Some("صادق هدایت"));
        assert_eq!(record.translator.as_deref(), Some("مترجم یک، مترجم دو"));
        assert_eq!(record.narrator.as_deref(), Some("گوینده"));
        assert_eq!(record.director.as_deref(), Some("علی محمدی"));
        assert_eq!(record.producer.as_deref(), Some("تهیه‌کننده اول"));
        assert_eq!(record.sound_engineer.as_deref(), Some("مهندس صدا"));
        assert_eq!(record.effector.as_deref(), Some("افکت‌گذار"));
        assert_eq!(record.actors.as_deref(), Some("الف، ب"));
        assert_eq!(record.genre.as_deref(), Some("رمان"));
        assert_eq!(record.category.as_deref(), Some("ادبیات داستانی"));
        assert_eq!(record.duration.as_deref(), Some("2:15:30"));
        assert_eq!(record.episode_count, Some(12));
        assert_eq!(
            record.cover_image_url.as_deref(),
            Some("https://book.iranseda.ir/Image/?VALID=TRUE&AttID=98765&w=300")
        );
        assert_eq!(
            record.player_link.as_deref(),
            Some("https://player.iranseda.ir/book-player/?VALID=TRUE&g=674800&attid=98765")
        );
        assert_eq!(record.summary, None);
        assert_eq!(record.fullbook_mp3_url, None);
    }

    #[test]
    fn test_player_link_uses_supplied_attachment_id() {
        let page = CatalogPage::parse(FULL_PAGE, URL);
        let record = extract_with_attachment(&page, resolve_attachment_id(&page));
        assert_eq!(record, extract_fields(&page));

        let record = extract_with_attachment(&page, None);
        assert_eq!(record.player_link, None);
        assert_eq!(record.title.as_deref(), Some("بوف کور"));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        assert_eq!(extract(FULL_PAGE), extract(FULL_PAGE));
    }

    #[test]
    fn test_description_from_meta() {
        let html = r#"
        <html>
          <head>
            <meta name='description' content='meta description here'>
          </head>
          <body>
            <h1>عنوانی</h1>
          </body>
        </html>
        "#;
        let record = extract_fields(&CatalogPage::parse(html, "http://example.com"));
        assert_eq!(record.description.as_deref(), Some("meta description here"));
        assert_eq!(record.title.as_deref(), Some("عنوانی"));
        assert_eq!(record.audiobook_id, None);
        assert_eq!(record.player_link, None);
    }

    #[test]
    fn test_description_from_og_when_about_empty() {
        let record = extract(
            r#"<head><meta property="og:description" content=" از گراف "></head>
            <body><div id="about"><div class="body-module">  </div></div></body>"#,
        );
        assert_eq!(record.description.as_deref(), Some("از گراف"));
    }

    #[test]
    fn test_info_box_dedup_and_label_excluded() {
        let record = extract(
            r#"<div class="item-info"><dl>
              <dd class="field"><strong>نویسنده</strong>
                <span>نویسنده</span><a>ژول ورن</a><a>ژول ورن</a><span>مترجم</span>
              </dd>
            </dl></div>"#,
        );
        assert_eq!(record.author.as_deref(), Some("ژول ورن، مترجم"));
    }

    #[test]
    fn test_info_box_preferred_over_tag_list() {
        let record = extract(
            r#"<div class="item-info"><dl>
              <dd class="field"><strong>کارگردان:</strong> <a>از جعبه</a></dd>
            </dl></div>
            <div id="tags"><dl><dt>کارگردان</dt><dd><span>از برچسب</span></dd></dl></div>"#,
        );
        assert_eq!(record.director.as_deref(), Some("از جعبه"));
    }

    #[test]
    fn test_author_reference_title_alternate() {
        let record = extract(
            r#"<div id="tags"><dl>
              <dt>عنوان کتاب مرجع</dt><dd><span>شازده کوچولو</span></dd>
              <dt>نویسنده</dt><dd><span>اگزوپری</span></dd>
            </dl></div>"#,
        );
        assert_eq!(record.author.as_deref(), Some("شازده کوچولو"));
    }

    #[test]
    fn test_tag_list_skips_empty_match() {
        let record = extract(
            r#"<div id="tags"><dl>
              <dt>کشور</dt><dd><span>,</span></dd>
              <dt>کشور سازنده</dt><dd><span>فرانسه</span></dd>
            </dl></div>"#,
        );
        assert_eq!(record.country.as_deref(), Some("فرانسه"));
    }

    #[test]
    fn test_category_falls_back_to_info_box() {
        let record = extract(
            r#"<div class="item-info"><dl>
              <dd class="field"><strong>دسته‌بندی</strong><a>کودک</a><a>نوجوان</a></dd>
            </dl></div>"#,
        );
        assert_eq!(record.category.as_deref(), Some("کودک، نوجوان"));
    }

    #[test]
    fn test_duration_and_episodes_from_tag_list() {
        let record = extract(
            r#"<div id="tags"><dl>
              <dt>مدت</dt><dd><span>45:10</span></dd>
              <dt>تعداد قطعات</dt><dd><span>8</span></dd>
            </dl></div>"#,
        );
        assert_eq!(record.duration.as_deref(), Some("45:10"));
        assert_eq!(record.episode_count, Some(8));
    }

    #[test]
    fn test_first_duration_wins() {
        let record = extract(
            r#"<div class="item-info"><dl>
              <dd class="field"><strong>زمان</strong> بدون عدد</dd>
              <dd class="field"><strong>مدت</strong> 1:02:03</dd>
            </dl></div>
            <div id="tags"><dl><dt>مدت زمان</dt><dd><span>9:99:99</span></dd></dl></div>"#,
        );
        assert_eq!(record.duration.as_deref(), Some("1:02:03"));
        assert_eq!(record.episode_count, None);
    }

    #[test]
    fn test_detail_full_description_fallback() {
        let record = extract(r#"<div class="book-full-description">شرح کامل</div>"#);
        assert_eq!(record.detail.as_deref(), Some("شرح کامل"));
    }

    #[test]
    fn test_cover_fallback_chain() {
        let record = extract(
            r#"<img src="/first.jpg">
            <div class="cover"><img src="covers/c.jpg"></div>"#,
        );
        assert_eq!(
            record.cover_image_url.as_deref(),
            Some("https://book.iranseda.ir/covers/c.jpg")
        );

        let record = extract(r#"<img src="http://cdn.example/x.jpg">"#);
        assert_eq!(record.cover_image_url.as_deref(), Some("http://cdn.example/x.jpg"));
    }

    #[test]
    fn test_language_only_for_persian_locale() {
        let record = extract(r#"<head><meta property="og:locale" content="en_US"></head>"#);
        assert_eq!(record.language, None);
    }

    #[test]
    fn test_public_id() {
        assert_eq!(public_id(URL).as_deref(), Some("674800"));
        assert_eq!(public_id("https://book.iranseda.ir/DetailsAlbum/?g="), None);
        assert_eq!(public_id("https://book.iranseda.ir/DetailsAlbum/"), None);
        assert_eq!(public_id("not a url"), None);
    }

    #[test]
    fn test_empty_page_yields_empty_record() {
        let record = extract_fields(&CatalogPage::parse("", "not a url"));
        assert_eq!(record, AudiobookRecord::default());
    }
}
