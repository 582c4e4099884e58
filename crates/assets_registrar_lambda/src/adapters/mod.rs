pub mod catalog_search;
pub mod datazone;
pub mod dynamodb;
pub mod state_store;
