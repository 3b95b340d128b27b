pub mod json_feed_renderer;
pub mod rss_renderer;
