//! In-memory catalog, accounts and per-user memberships.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub product_id: String,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about_product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Product {
    pub fn price(&self) -> Option<f64> {
        numeric(self.discounted_price.as_deref().or(self.actual_price.as_deref()))
    }

    pub fn rating_value(&self) -> Option<f64> {
        numeric(self.rating.as_deref())
    }

    pub fn discount(&self) -> Option<f64> {
        numeric(self.discount_percentage.as_deref())
    }

    fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [
            Some(self.product_name.as_str()),
            self.category.as_deref(),
            self.about_product.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Parse `"₹1,299"` or `"43%"` style strings into a number.
fn numeric(raw: Option<&str>) -> Option<f64> {
    let digits: String = raw?.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    digits.parse().ok()
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(skip)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewItem {
    pub product_id: Option<String>,
    pub product_name: String,
    pub category: String,
    pub discounted_price: Option<String>,
    pub actual_price: Option<String>,
    pub discount_percentage: Option<String>,
    pub rating: Option<String>,
    pub about_product: Option<String>,
    pub img_link: Option<String>,
    pub product_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemPatch {
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub discounted_price: Option<String>,
    pub actual_price: Option<String>,
    pub discount_percentage: Option<String>,
    pub rating: Option<String>,
    pub about_product: Option<String>,
    pub img_link: Option<String>,
    pub product_link: Option<String>,
}

/// Filters accepted by the search endpoint.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchFilter {
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_discount: Option<f64>,
}

impl SearchFilter {
    fn accepts(&self, product: &Product) -> bool {
        if let Some(q) = self.q.as_deref().filter(|q| !q.is_empty()) {
            if !product.matches_text(q) {
                return false;
            }
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            if product.category.as_deref() != Some(category) {
                return false;
            }
        }
        within(product.rating_value(), self.min_rating, self.max_rating)
            && within(product.price(), self.min_price, self.max_price)
            && within(product.discount(), self.min_discount, None)
    }
}

/// A bound on a missing value rejects the product.
fn within(value: Option<f64>, min: Option<f64>, max: Option<f64>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}

/// Key for anonymous wishlist and cart memberships.
pub const GUEST: &str = "guest";

#[derive(Debug)]
pub struct Store {
    products: BTreeMap<String, Product>,
    users: Vec<User>,
    wishlists: HashMap<String, BTreeSet<String>>,
    carts: HashMap<String, Vec<String>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::seeded()
    }
}

impl Store {
    pub fn empty() -> Self {
        Self {
            products: BTreeMap::new(),
            users: Vec::new(),
            wishlists: HashMap::new(),
            carts: HashMap::new(),
        }
    }

    /// A small fixed catalog and one administrator account.
    pub fn seeded() -> Self {
        let mut store = Self::empty();
        let seed = [
            ("P100", "Wireless Bluetooth Headphones", "Electronics", "1499", "2999", "50%", "4.3"),
            ("P101", "Noise Cancelling Headphones Pro", "Electronics", "7999", "9999", "20%", "4.6"),
            ("P102", "USB-C Charging Cable 2m", "Accessories", "299", "599", "50%", "4.1"),
            ("P103", "Laptop Stand Aluminium", "Accessories", "1299", "1999", "35%", "4.4"),
            ("P123", "Smart LED Desk Lamp", "Home&Kitchen", "899", "1499", "40%", "4.0"),
            ("P124", "Electric Kettle 1.5L", "Home&Kitchen", "1099", "1799", "39%", "3.9"),
            ("P125", "Mechanical Keyboard", "Electronics", "3499", "4999", "30%", "4.5"),
            ("P126", "Headphone Stand with USB Hub", "Accessories", "799", "999", "20%", "3.7"),
        ];
        for (id, name, category, price, actual, discount, rating) in seed {
            store.products.insert(
                id.to_string(),
                Product {
                    product_id: id.to_string(),
                    product_name: name.to_string(),
                    category: Some(category.to_string()),
                    discounted_price: Some(price.to_string()),
                    actual_price: Some(actual.to_string()),
                    discount_percentage: Some(discount.to_string()),
                    rating: Some(rating.to_string()),
                    rating_count: Some("1,024".to_string()),
                    about_product: Some(format!("{name} from the demo catalog.")),
                    ..Product::default()
                },
            );
        }
        store.users.push(User {
            id: 1,
            email: "admin@catalog.local".to_string(),
            name: "Administrator".to_string(),
            role: "admin".to_string(),
            password: "admin".to_string(),
        });
        store
    }

    // --- catalog ---

    pub fn search(&self, filter: &SearchFilter) -> Vec<Product> {
        self.products.values().filter(|p| filter.accepts(p)).cloned().collect()
    }

    pub fn product(&self, id: &str) -> Result<&Product, AppError> {
        self.products
            .get(id)
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))
    }

    /// Up to four other products in the same category.
    pub fn related(&self, product: &Product) -> Vec<Product> {
        self.products
            .values()
            .filter(|p| p.product_id != product.product_id && p.category == product.category)
            .take(4)
            .cloned()
            .collect()
    }

    pub fn categories(&self) -> Vec<String> {
        let set: BTreeSet<String> = self.products.values().filter_map(|p| p.category.clone()).collect();
        set.into_iter().collect()
    }

    /// Products scored by how many query words they contain, best first.
    pub fn recommend(&self, query: &str, limit: usize) -> Vec<Product> {
        let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        let mut scored: Vec<Product> = self
            .products
            .values()
            .filter_map(|p| {
                let hits = words.iter().filter(|w| p.matches_text(w)).count();
                (hits > 0).then(|| Product {
                    score: Some(hits as f64 / words.len() as f64),
                    ..p.clone()
                })
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
    }

    /// Highest rated products first.
    pub fn popular(&self, limit: usize) -> Vec<Product> {
        let mut products: Vec<Product> = self.products.values().cloned().collect();
        products.sort_by(|a, b| {
            b.rating_value()
                .partial_cmp(&a.rating_value())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        products.truncate(limit);
        products
    }

    // --- wishlist ---

    pub fn wishlist(&self, user: &str) -> Vec<Product> {
        self.wishlists
            .get(user)
            .map(|ids| ids.iter().filter_map(|id| self.products.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    pub fn add_to_wishlist(&mut self, user: &str, product_id: &str) -> Result<Product, AppError> {
        let product = self.product(product_id)?.clone();
        self.wishlists
            .entry(user.to_string())
            .or_default()
            .insert(product_id.to_string());
        Ok(product)
    }

    pub fn remove_from_wishlist(&mut self, user: &str, product_id: &str) -> Result<(), AppError> {
        let removed = self
            .wishlists
            .get_mut(user)
            .is_some_and(|ids| ids.remove(product_id));
        if removed {
            Ok(())
        } else {
            Err(AppError::NotFound("Item not found in wishlist".to_string()))
        }
    }

    pub fn in_wishlist(&self, user: &str, product_id: &str) -> bool {
        self.wishlists.get(user).is_some_and(|ids| ids.contains(product_id))
    }

    // --- cart ---

    pub fn cart(&self, user: &str) -> Vec<Product> {
        self.carts
            .get(user)
            .map(|ids| ids.iter().filter_map(|id| self.products.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    pub fn add_to_cart(&mut self, user: &str, product_id: &str) -> Result<(), AppError> {
        self.product(product_id)?;
        let cart = self.carts.entry(user.to_string()).or_default();
        if !cart.iter().any(|id| id == product_id) {
            cart.push(product_id.to_string());
        }
        Ok(())
    }

    pub fn remove_from_cart(&mut self, user: &str, product_id: &str) -> Result<(), AppError> {
        let removed = self.carts.get_mut(user).is_some_and(|cart| {
            let before = cart.len();
            cart.retain(|id| id != product_id);
            cart.len() != before
        });
        if removed {
            Ok(())
        } else {
            Err(AppError::NotFound("Item not found in cart".to_string()))
        }
    }

    // --- accounts ---

    pub fn register(&mut self, email: &str, password: &str, name: &str) -> Result<User, AppError> {
        if !email.contains('@') {
            return Err(AppError::Invalid("Invalid email address".to_string()));
        }
        if self.users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        let id = self.users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let user = User {
            id,
            email: email.to_string(),
            name: name.to_string(),
            role: "user".to_string(),
            password: password.to_string(),
        };
        self.users.push(user.clone());
        Ok(user)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<User, AppError> {
        self.users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email) && u.password == password)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))
    }

    pub fn user(&self, id: u64) -> Result<&User, AppError> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub fn rename_user(&mut self, id: u64, name: Option<String>) -> Result<User, AppError> {
        let user = self
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if let Some(name) = name {
            if name.trim().is_empty() {
                return Err(AppError::Invalid("Name cannot be empty".to_string()));
            }
            user.name = name;
        }
        Ok(user.clone())
    }

    // --- admin ---

    pub fn create_item(&mut self, input: NewItem) -> Result<Product, AppError> {
        let id = input
            .product_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        if self.products.contains_key(&id) {
            return Err(AppError::Conflict(format!("Item {id} already exists")));
        }
        let product = Product {
            product_id: id.clone(),
            product_name: input.product_name,
            category: Some(input.category),
            discounted_price: input.discounted_price,
            actual_price: input.actual_price,
            discount_percentage: input.discount_percentage,
            rating: input.rating,
            about_product: input.about_product,
            img_link: input.img_link,
            product_link: input.product_link,
            ..Product::default()
        };
        self.products.insert(id, product.clone());
        Ok(product)
    }

    pub fn update_item(&mut self, id: &str, patch: ItemPatch) -> Result<Product, AppError> {
        let product = self
            .products
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;
        if let Some(name) = patch.product_name {
            product.product_name = name;
        }
        if patch.category.is_some() {
            product.category = patch.category;
        }
        let optional = [
            (&mut product.discounted_price, patch.discounted_price),
            (&mut product.actual_price, patch.actual_price),
            (&mut product.discount_percentage, patch.discount_percentage),
            (&mut product.rating, patch.rating),
            (&mut product.about_product, patch.about_product),
            (&mut product.img_link, patch.img_link),
            (&mut product.product_link, patch.product_link),
        ];
        for (field, value) in optional {
            if value.is_some() {
                *field = value;
            }
        }
        Ok(product.clone())
    }

    pub fn delete_item(&mut self, id: &str) -> Result<(), AppError> {
        self.products
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;
        for ids in self.wishlists.values_mut() {
            ids.remove(id);
        }
        for ids in self.carts.values_mut() {
            ids.retain(|p| p != id);
        }
        Ok(())
    }
}
