pub mod attachment;
pub mod downloads;
pub mod extract;
pub mod fetch;
pub mod html;
pub mod input;
pub mod normalize;
pub mod output;
pub mod run;

pub use attachment::resolve_attachment_id;
pub use downloads::{resolve_downloads, Downloads};
pub use extract::{extract_fields, extract_with_attachment};
pub use fetch::Fetcher;
pub use html::CatalogPage;
pub use input::{load_input, InputError, LoadedInput};
pub use run::{run, scrape, RunOutcome};
