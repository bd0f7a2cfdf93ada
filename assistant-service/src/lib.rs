//! assistant-service: HTTP façade over a chat-completion model and a
//! search-grounded agent.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
