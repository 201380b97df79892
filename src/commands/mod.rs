// commands/mod.rs - Command Module Registry
// Prefix commands; plain links are handled by the message event in main.rs.

pub mod admin;          // Owner-only ceiling override and status
pub mod help;           // ^start / ^help greeting
pub mod lang;           // Per-chat language preference
