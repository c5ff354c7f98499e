//! Cart and wishlist for one client session.
//!
//! Both are loaded once from [`LocalStorage`] when the session starts and every
//! mutation is written through before it returns. A mutation builds the new state,
//! persists it and only then replaces the in-memory state, so a storage failure
//! leaves the session exactly as it was. Quantities are always positive: an entry
//! that would drop to zero is removed.

use crate::{
    core::{
        pricing::{CatalogItem, find_item},
        storage::LocalStorage,
    },
    errors::{Error, Result},
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Storage key of the cart snapshot.
pub const CART_KEY: &str = "cart";
/// Storage key of the wishlist snapshot.
pub const WISHLIST_KEY: &str = "wishlist";

const QUANTITY_TOO_LARGE: &str = "Quantity is too large";

/// One resolvable cart entry with its catalog data.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine<'a> {
    /// The catalog item
    pub item: &'a CatalogItem,
    /// Quantity in the cart
    pub quantity: u32,
    /// price x quantity
    pub line_total: f64,
}

/// Cart and wishlist state backed by local storage.
#[derive(Debug)]
pub struct CartSession<S: LocalStorage> {
    storage: S,
    cart: BTreeMap<String, u32>,
    wishlist: BTreeSet<String>,
}

/// Reads a JSON snapshot, treating a missing or unreadable one as empty.
fn load_snapshot<S, T>(storage: &S, key: &str) -> T
where
    S: LocalStorage,
    T: serde::de::DeserializeOwned + Default,
{
    match storage.get(key) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring unreadable '{}' snapshot: {}", key, e);
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            warn!("Could not read '{}' from local storage: {}", key, e);
            T::default()
        }
    }
}

impl<S: LocalStorage> CartSession<S> {
    /// Starts a session from whatever the storage holds.
    pub fn load(storage: S) -> Self {
        let mut cart: BTreeMap<String, u32> = load_snapshot(&storage, CART_KEY);
        cart.retain(|_, quantity| *quantity > 0);
        let wishlist = load_snapshot(&storage, WISHLIST_KEY);
        debug!("Cart session loaded with {} line(s)", cart.len());

        Self {
            storage,
            cart,
            wishlist,
        }
    }

    /// The underlying storage.
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Current quantities keyed by item id.
    pub const fn items(&self) -> &BTreeMap<String, u32> {
        &self.cart
    }

    /// Quantity of one item, 0 when absent.
    pub fn quantity(&self, item_id: &str) -> u32 {
        self.cart.get(item_id).copied().unwrap_or(0)
    }

    /// Current wishlist.
    pub const fn wishlist(&self) -> &BTreeSet<String> {
        &self.wishlist
    }

    fn commit_cart(&mut self, cart: BTreeMap<String, u32>) -> Result<()> {
        self.storage.set(CART_KEY, &serde_json::to_string(&cart)?)?;
        self.cart = cart;
        Ok(())
    }

    fn commit_wishlist(&mut self, wishlist: BTreeSet<String>) -> Result<()> {
        self.storage.set(WISHLIST_KEY, &serde_json::to_string(&wishlist)?)?;
        self.wishlist = wishlist;
        Ok(())
    }

    /// Adds one unit of an item.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] if the quantity cannot grow any further, or the
    /// storage error if the write fails.
    pub fn add(&mut self, item_id: &str) -> Result<()> {
        let mut cart = self.cart.clone();
        let quantity = cart.entry(item_id.to_string()).or_insert(0);
        *quantity = quantity
            .checked_add(1)
            .ok_or_else(|| Error::validation(QUANTITY_TOO_LARGE))?;
        self.commit_cart(cart)
    }

    /// Removes one unit of an item; the last unit removes the entry.
    pub fn remove(&mut self, item_id: &str) -> Result<()> {
        let mut cart = self.cart.clone();
        match cart.get_mut(item_id) {
            Some(quantity) if *quantity > 1 => *quantity -= 1,
            Some(_) => {
                cart.remove(item_id);
            }
            None => return Ok(()),
        }
        self.commit_cart(cart)
    }

    /// Sets an absolute quantity; zero or negative removes the entry.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] if the quantity does not fit in a `u32`, or the
    /// storage error if the write fails.
    pub fn set_quantity(&mut self, item_id: &str, quantity: i64) -> Result<()> {
        let mut cart = self.cart.clone();
        if quantity <= 0 {
            cart.remove(item_id);
        } else {
            let quantity =
                u32::try_from(quantity).map_err(|_| Error::validation(QUANTITY_TOO_LARGE))?;
            cart.insert(item_id.to_string(), quantity);
        }
        self.commit_cart(cart)
    }

    /// Empties the cart. The wishlist is kept.
    pub fn clear(&mut self) -> Result<()> {
        self.commit_cart(BTreeMap::new())
    }

    /// Adds the item to the wishlist, or removes it if already there.
    pub fn toggle_wishlist(&mut self, item_id: &str) -> Result<()> {
        let mut wishlist = self.wishlist.clone();
        if !wishlist.remove(item_id) {
            wishlist.insert(item_id.to_string());
        }
        self.commit_wishlist(wishlist)
    }

    /// Whether the item is on the wishlist.
    pub fn is_in_wishlist(&self, item_id: &str) -> bool {
        self.wishlist.contains(item_id)
    }

    /// Sum of all quantities.
    pub fn total_item_count(&self) -> u64 {
        self.cart.values().map(|&quantity| u64::from(quantity)).sum()
    }

    /// Cart lines that resolve against the catalog. Ids the catalog no longer has are
    /// skipped.
    pub fn line_items<'a>(&self, items: &'a [CatalogItem]) -> Vec<CartLine<'a>> {
        self.cart
            .iter()
            .filter_map(|(item_id, &quantity)| {
                find_item(items, item_id).map(|item| CartLine {
                    item,
                    quantity,
                    line_total: item.price * f64::from(quantity),
                })
            })
            .collect()
    }

    /// Sum of price x quantity over resolvable entries.
    pub fn total_price(&self, items: &[CatalogItem]) -> f64 {
        self.line_items(items)
            .iter()
            .map(|line| line.line_total)
            .sum()
    }
}
