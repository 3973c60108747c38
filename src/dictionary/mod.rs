mod dictionary;

pub use dictionary::{Dictionary, SearchResult};
