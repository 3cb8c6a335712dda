pub mod blob_store;
pub mod catalog_store;
pub mod curation;
pub mod duration;
pub mod media_catalog;
pub mod range_stream;
pub mod social_graph;
