pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod domain;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod notify;
pub mod observer;
pub mod resources;
pub mod server;
pub mod services;
pub mod storage;
pub mod types;
