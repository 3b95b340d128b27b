pub mod article_selector;
pub mod config;
pub mod content;
pub mod error;
pub mod feed_assembler;
pub mod feed_model;
pub mod logger;
pub mod output_writer;
pub mod pipeline;
pub mod text_utils;
pub mod view;
mod test_data;
