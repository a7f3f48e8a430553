//! Cart item entity representing one product line in the cart.

use serde::{Deserialize, Serialize};

/// One product line in the cart.
///
/// `title`, `image_url` and `price` are carried verbatim and never
/// interpreted. `quantity` is at least 1 for every item held by a
/// [`crate::domain::CartCollection`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub title: String,
    #[serde(alias = "imageUrl")]
    pub image_url: String,
    pub price: f64,
    pub quantity: u32,
}

impl CartItem {
    /// Creates a new CartItem instance.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: f64,
        quantity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
            quantity,
        }
    }
}

/// Input data for adding a product to the cart.
///
/// Same as [`CartItem`] without a quantity: the store decides the quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCartItem {
    pub id: String,
    pub title: String,
    #[serde(alias = "imageUrl")]
    pub image_url: String,
    pub price: f64,
}

impl NewCartItem {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }

    /// Converts into a cart line carrying `quantity`.
    pub fn with_quantity(self, quantity: u32) -> CartItem {
        CartItem {
            id: self.id,
            title: self.title,
            image_url: self.image_url,
            price: self.price,
            quantity,
        }
    }
}
