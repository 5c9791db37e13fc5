pub mod config;
pub mod npc;
pub mod property;
