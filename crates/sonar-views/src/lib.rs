#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod buckets;
pub mod document;
pub mod emotions;
pub mod fetch;
pub mod inflation;
pub mod leaderboard;
pub mod sectors;
pub mod service;
pub mod trust;

pub use service::Analytics;
