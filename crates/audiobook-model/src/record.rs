use serde::{Deserialize, Serialize};

/// Column headers of the success table, in output order.
pub const RECORD_COLUMNS: [&str; 23] = [
    "AudioBook_ID",
    "Book_Title",
    "Book_Description",
    "Book_Detail",
    "Book_Summary",
    "Book_Language",
    "Book_Country",
    "Book_Author",
    "Book_Translator",
    "Book_Narrator",
    "Book_Director",
    "Book_Producer",
    "Book_SoundEngineer",
    "Book_Effector",
    "Book_Actors",
    "Book_Genre",
    "Book_Category",
    "Book_Duration",
    "Episode_Count",
    "Cover_Image_URL",
    "Player_Link",
    "FullBook_MP3_URL",
    "All_MP3s_Found",
];

/// Column headers of the error table.
pub const ERROR_COLUMNS: [&str; 2] = ["AudioBook_ID", "Error"];

/// One scraped audiobook title: a single row of the success table.
///
/// Every field is optional. `None` means the page did not carry the value
/// in any layout the extractor understands, which is an expected outcome and
/// not an error. Field order matches [`RECORD_COLUMNS`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudiobookRecord {
    /// Public identifier, from the page URL's `g` query parameter.
    #[serde(rename = "AudioBook_ID")]
    pub audiobook_id: Option<String>,
    #[serde(rename = "Book_Title")]
    pub title: Option<String>,
    #[serde(rename = "Book_Description")]
    pub description: Option<String>,
    #[serde(rename = "Book_Detail")]
    pub detail: Option<String>,
    /// Carried through unchanged from the input row.
    #[serde(rename = "Book_Summary")]
    pub summary: Option<String>,
    #[serde(rename = "Book_Language")]
    pub language: Option<String>,
    #[serde(rename = "Book_Country")]
    pub country: Option<String>,
    #[serde(rename = "Book_Author")]
    pub author: Option<String>,
    #[serde(rename = "Book_Translator")]
    pub translator: Option<String>,
    #[serde(rename = "Book_Narrator")]
    pub narrator: Option<String>,
    #[serde(rename = "Book_Director")]
    pub director: Option<String>,
    #[serde(rename = "Book_Producer")]
    pub producer: Option<String>,
    #[serde(rename = "Book_SoundEngineer")]
    pub sound_engineer: Option<String>,
    #[serde(rename = "Book_Effector")]
    pub effector: Option<String>,
    #[serde(rename = "Book_Actors")]
    pub actors: Option<String>,
    #[serde(rename = "Book_Genre")]
    pub genre: Option<String>,
    #[serde(rename = "Book_Category")]
    pub category: Option<String>,
    /// Total running time as printed on the page (e.g. "2:15:00").
    #[serde(rename = "Book_Duration")]
    pub duration: Option<String>,
    #[serde(rename = "Episode_Count")]
    pub episode_count: Option<u32>,
    #[serde(rename = "Cover_Image_URL")]
    pub cover_image_url: Option<String>,
    #[serde(rename = "Player_Link")]
    pub player_link: Option<String>,
    /// The largest MP3 asset reported by the download API.
    #[serde(rename = "FullBook_MP3_URL")]
    pub fullbook_mp3_url: Option<String>,
    /// Every MP3 asset URL, comma-joined in API order.
    #[serde(rename = "All_MP3s_Found")]
    pub all_mp3s_found: Option<String>,
}

/// A row that failed to fetch or extract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// The identifier from the input row, not from the page.
    #[serde(rename = "AudioBook_ID")]
    pub audiobook_id: Option<String>,
    #[serde(rename = "Error")]
    pub error: String,
}

impl AudiobookRecord {
    /// Short label for progress lines: the identifier, or `None` spelled out.
    pub fn display_id(&self) -> &str {
        self.audiobook_id.as_deref().unwrap_or("None")
    }
}
