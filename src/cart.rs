//! Shopping cart owned by the client and persisted to its local storage.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    checkout::{CheckoutSettings, whatsapp_link},
    coupon::AppliedCoupon,
    local_store::{KeyValueStore, LocalStoreError, Stored, keys, load_json, save_json},
    models::Product,
    pricing::{self, CartTotals},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartEntry {
    pub product: Product,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// Transient notification for the shopper, drained by whatever renders the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartNotice {
    Added { product_name: String },
    PersistFailed,
}

/// Cart state plus the storage it is mirrored into.
///
/// Every mutation updates memory first and then writes the full list back, so the
/// persisted copy always reflects the latest completed mutation.
pub struct CartStore<S> {
    store: S,
    entries: Vec<CartEntry>,
    customer: Option<CustomerInfo>,
    notices: Vec<CartNotice>,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Loads saved state. Anything unreadable starts the cart empty.
    pub fn load(store: S) -> Self {
        let entries = match load_json::<Vec<CartEntry>, _>(&store, keys::CART) {
            Stored::Present(entries) => entries
                .into_iter()
                .filter(|entry| entry.quantity > 0)
                .collect(),
            Stored::Missing | Stored::Malformed => Vec::new(),
        };
        let customer = match load_json(&store, keys::CUSTOMER_INFO) {
            Stored::Present(info) => Some(info),
            Stored::Missing | Stored::Malformed => None,
        };

        Self {
            store,
            entries,
            customer,
            notices: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn customer_info(&self) -> Option<&CustomerInfo> {
        self.customer.as_ref()
    }

    pub fn add_to_cart(&mut self, product: Product) {
        let name = product.name.clone();
        match self.entries.iter_mut().find(|e| e.product.id == product.id) {
            Some(entry) => entry.quantity = entry.quantity.saturating_add(1),
            None => self.entries.push(CartEntry {
                product,
                quantity: 1,
            }),
        }
        self.notices.push(CartNotice::Added { product_name: name });
        self.persist_cart();
    }

    /// Drops the entry for `product_id`. Absent ids are ignored.
    pub fn remove_from_cart(&mut self, product_id: Uuid) {
        self.entries.retain(|e| e.product.id != product_id);
        self.persist_cart();
    }

    /// Sets the quantity for `product_id`; zero or less removes the entry.
    pub fn update_quantity(&mut self, product_id: Uuid, quantity: i64) {
        if quantity <= 0 {
            self.remove_from_cart(product_id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(entry) = self.entries.iter_mut().find(|e| e.product.id == product_id) {
            entry.quantity = quantity;
        }
        self.persist_cart();
    }

    /// Empties the cart. Saved customer details are kept.
    pub fn clear_cart(&mut self) {
        self.entries.clear();
        self.persist_cart();
    }

    pub fn set_customer_info(&mut self, info: CustomerInfo) {
        if let Err(err) = save_json(&self.store, keys::CUSTOMER_INFO, &info) {
            tracing::warn!(error = %err, "failed to persist customer info");
            self.notices.push(CartNotice::PersistFailed);
        }
        self.customer = Some(info);
    }

    pub fn get_cart_total(&self) -> Decimal {
        pricing::subtotal(&self.entries)
    }

    pub fn totals(&self, coupon: Option<&AppliedCoupon>) -> CartTotals {
        CartTotals::compute(&self.entries, coupon)
    }

    /// WhatsApp deep link carrying the order summary; empty when the cart is empty.
    pub fn generate_checkout_message(
        &self,
        settings: &CheckoutSettings,
        coupon: Option<&AppliedCoupon>,
    ) -> String {
        whatsapp_link(settings, &self.entries, self.customer.as_ref(), coupon).unwrap_or_default()
    }

    pub fn drain_notices(&mut self) -> Vec<CartNotice> {
        std::mem::take(&mut self.notices)
    }

    fn persist_cart(&mut self) {
        if let Err(err) = self.try_persist_cart() {
            tracing::warn!(error = %err, "failed to persist cart");
            self.notices.push(CartNotice::PersistFailed);
        }
    }

    fn try_persist_cart(&self) -> Result<(), LocalStoreError> {
        save_json(&self.store, keys::CART, &self.entries)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::product;
    use super::*;
    use crate::local_store::MemoryStore;

    #[test]
    fn adding_twice_increments_quantity() {
        let mut cart = CartStore::load(MemoryStore::new());
        let rice = product("Sona Masoori Rice (5kg)", 350);
        cart.add_to_cart(rice.clone());
        cart.add_to_cart(rice.clone());

        assert_eq!(cart.entries().len(), 1);
        assert_eq!(cart.entries()[0].quantity, 2);
        assert_eq!(
            cart.drain_notices(),
            vec![
                CartNotice::Added {
                    product_name: rice.name.clone()
                };
                2
            ]
        );
        assert!(cart.drain_notices().is_empty());
    }

    #[test]
    fn update_to_zero_behaves_like_remove() {
        let store_a = MemoryStore::new();
        let store_b = MemoryStore::new();
        let dal = product("Toor Dal (1kg)", 160);
        let oil = product("Refined Sunflower Oil (1L)", 130);

        let mut a = CartStore::load(store_a.clone());
        let mut b = CartStore::load(store_b.clone());
        for cart in [&mut a, &mut b] {
            cart.add_to_cart(dal.clone());
            cart.add_to_cart(oil.clone());
        }

        a.update_quantity(dal.id, 0);
        b.remove_from_cart(dal.id);

        assert_eq!(a.entries(), b.entries());
        assert_eq!(
            store_a.get(keys::CART).unwrap(),
            store_b.get(keys::CART).unwrap()
        );

        a.update_quantity(oil.id, -3);
        assert!(a.is_empty());
    }

    #[test]
    fn update_quantity_replaces_value() {
        let mut cart = CartStore::load(MemoryStore::new());
        let soap = product("Dove Soap (3x75g)", 140);
        cart.add_to_cart(soap.clone());
        cart.update_quantity(soap.id, 7);
        assert_eq!(cart.entries()[0].quantity, 7);
        assert_eq!(cart.get_cart_total(), Decimal::from(980));
    }

    #[test]
    fn removing_unknown_product_is_a_no_op() {
        let mut cart = CartStore::load(MemoryStore::new());
        cart.add_to_cart(product("Jaggery Block (500g)", 70));
        let before = cart.entries().to_vec();
        cart.remove_from_cart(Uuid::new_v4());
        assert_eq!(cart.entries(), before.as_slice());
    }

    #[test]
    fn add_then_remove_restores_previous_state() {
        let store = MemoryStore::new();
        let mut cart = CartStore::load(store.clone());
        cart.add_to_cart(product("Tamarind Block (250g)", 90));
        let before = cart.entries().to_vec();

        let chilli = product("Red Chilli Powder (100g)", 60);
        cart.add_to_cart(chilli.clone());
        cart.remove_from_cart(chilli.id);

        assert_eq!(cart.entries(), before.as_slice());
        let reloaded = CartStore::load(store);
        assert_eq!(reloaded.entries(), before.as_slice());
    }

    #[test]
    fn clear_keeps_customer_info() {
        let store = MemoryStore::new();
        let mut cart = CartStore::load(store.clone());
        cart.add_to_cart(product("Mixed Namkeen (400g)", 120));
        cart.set_customer_info(CustomerInfo {
            name: "Lakshmi".into(),
            phone: "9876543210".into(),
            address: "12 Temple Street".into(),
        });
        cart.clear_cart();

        assert!(cart.is_empty());
        assert!(cart.customer_info().is_some());
        let reloaded = CartStore::load(store);
        assert!(reloaded.is_empty());
        assert_eq!(reloaded.customer_info(), cart.customer_info());
    }

    #[test]
    fn corrupt_saved_cart_starts_empty() {
        let store = MemoryStore::new();
        store.set(keys::CART, "[{\"product\":").unwrap();
        store.set(keys::CUSTOMER_INFO, "null,").unwrap();
        let cart = CartStore::load(store);
        assert!(cart.is_empty());
        assert!(cart.customer_info().is_none());
    }

    #[test]
    fn empty_cart_produces_no_link() {
        let cart = CartStore::load(MemoryStore::new());
        assert_eq!(
            cart.generate_checkout_message(&CheckoutSettings::default(), None),
            ""
        );
    }
}
