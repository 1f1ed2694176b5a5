//! Discord Integration - gateway bot interface
//!
//! This crate provides the Discord interface for dicey:
//! - **Gateway** (`gateway`) - envelope loop over a pluggable transport
//! - **Slash Commands** (`commands`) - `/custom_dice start`, `/r`, etc.
//! - **Events** (`events`) - interaction routing, channel messenger seam
//! - **Components** (`components`) - button rows and answer embeds
//! - **Families** (`families`) - the dice commands themselves
//!
//! # Getting Started
//!
//! 1. Create a Discord app and bot token at https://discord.com/developers
//! 2. Invite the bot with the `applications.commands` scope
//! 3. Set env vars: `DICEY_DISCORD_TOKEN` (or `DISCORD_TOKEN`)
//!
//! # Architecture
//!
//! ```text
//! Gateway Envelopes → InteractionDispatcher → FamilyHandler → Dice Engine
//!                          ↓
//!                  Button Messages ← ChannelMessenger
//! ```
//!
//! # Key Types
//!
//! - `GatewayRunner` - envelope loop with reconnection logic
//! - `InteractionDispatcher` - routes slash commands and button clicks
//! - `CommandFamily` - one slash command with its button behavior
//! - `ChannelMessenger` - trait for the channel-side REST surface

pub mod commands;
pub mod components;
pub mod events;
pub mod families;
pub mod gateway;
