//! Consumable item economy.
//!
//! `buffs` defines the closed set of toggleable modifiers and the active-flag
//! block on the player; `shop` defines the purchasable catalog, level gates,
//! and the two instant-use items.

pub mod buffs;
pub mod shop;

pub use buffs::{ActiveBuffs, BuffKind};
pub use shop::{ItemId, ShopEntry, ShopError, SkinId, SHOP_CATALOG};
