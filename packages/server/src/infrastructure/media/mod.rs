//! MediaCatalog の実装

mod static_catalog;

pub use static_catalog::StaticMediaCatalog;
