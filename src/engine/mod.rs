pub mod article;
pub mod filter;
pub mod ranker;
pub mod sources;
pub mod tags;
pub mod url;

pub use article::{Article, RankedArticle, RawResult, SourceTier, Tag};
pub use filter::{ArticleFilter, FilterStats};
pub use ranker::Ranker;
pub use sources::{SourceTiers, Whitelist};
