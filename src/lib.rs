//! AI Topics - a daily AI news digest
//!
//! This crate collects articles from a registry of RSS/Atom feeds, keeps the
//! ones in the current reporting window, classifies them into a fixed set of
//! categories through a language model, selects a category-balanced subset,
//! archives it per day and renders a static HTML digest of the last week.

pub mod archive;
pub mod article;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod fetcher;
pub mod filter;
pub mod pipeline;
pub mod render;
pub mod selector;
