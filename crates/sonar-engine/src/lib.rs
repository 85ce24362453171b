#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod aggs;
pub mod client;
pub mod index;
pub mod schema;
pub mod translate;

pub use client::EmbeddedEngine;
pub use index::SocialIndexer;
