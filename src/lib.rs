pub mod api;
pub mod config;
pub mod content;
pub mod editor;
pub mod fetcher;
pub mod guard;
pub mod logger;
pub mod model;
pub mod notice;
pub mod query_string;
pub mod server;
pub mod session;
pub mod text_utils;
pub mod view;
