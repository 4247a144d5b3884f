pub mod cache;
pub mod model;
pub mod sequence;

pub use cache::{Clock, DEFAULT_TTL_MINUTES, SearchStateCache, SystemClock};
pub use model::{
    ContentRating, MangaStatus, PAGE_SIZE, SearchFilterSnapshot, SearchFilters, SortKey, TagMode,
};
pub use sequence::{SearchSequence, SearchTicket};
