pub mod artists;
pub mod feed;
pub mod library;
pub mod recommendations;
pub mod releases;
