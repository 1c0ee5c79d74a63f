//! Bounded item inventory carried by the player.
//!
//! Items are plain counts; the capacity lives on [`PlayerState`] so the
//! HUD can render both without extra lookups.

use fieldquest_types::PlayerState;

/// Grant up to `count` items, bounded by the player's capacity.
///
/// Returns how many items were actually added.
pub fn grant_items(player: &mut PlayerState, count: u32) -> u32 {
    let room = player.inventory_capacity.saturating_sub(player.inventory);
    let granted = count.min(room);
    player.inventory = player.inventory.saturating_add(granted);
    granted
}

/// Remove one item. Returns `false` if the inventory was already empty.
pub const fn remove_item(player: &mut PlayerState) -> bool {
    match player.inventory.checked_sub(1) {
        Some(left) => {
            player.inventory = left;
            true
        }
        None => false,
    }
}
