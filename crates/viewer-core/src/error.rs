use doc_model::FeedError;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("page feed error: {0}")]
    Feed(#[from] FeedError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("page {0} appears more than once in the feed")]
    DuplicatePage(u32),
    #[error("page {missing} is missing (feed has {page_count} pages, indices must be 0..{page_count})")]
    MissingPage { missing: u32, page_count: usize },
}

pub type ViewerResult<T> = Result<T, ViewerError>;
