pub mod application;
pub mod asset;
pub mod cleanup;
pub mod commands;
pub mod config;
pub mod download;
pub mod error;
pub mod http;
pub mod install;
pub mod package;
pub mod provider;
pub mod resolve;
pub mod runtime;
pub mod template;
pub mod version;
