//! lobby-balancer - a lobby directory that spawns and reaps game servers
//!
//! This crate provides the core functionality for lobby-balancer, including:
//! - The lobby registry (lobbies, their endpoints and worker processes)
//! - Port allocation and worker spawning
//! - The idle reaper that reclaims empty game servers
//! - The HTTP API and a client for it
//! - Configuration management
//!
//! # Architecture
//!
//! A single [`lobby::LobbyRegistry`] owns all state behind one reader/writer
//! lock. The HTTP server (`lobby-balancer`) and the [`lobby::Reaper`] task
//! each hold a clone of the registry handle. Clients and game servers talk to
//! it over HTTP, e.g. with the `lobbyctl` tool.

pub mod client;
pub mod config;
pub mod lobby;
pub mod protocol;
pub mod server;
pub mod worker;
