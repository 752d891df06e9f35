//! Streaming product listing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentOrder {
    #[serde(default)]
    pub out_trade_no: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub create_time: String,
    #[serde(default)]
    pub show_status: i32,
    #[serde(default)]
    pub time: String,
}

/// A product card on the landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingProduct {
    pub id: u64,
    pub type_name: String,
    #[serde(default)]
    pub detail_route: String,
    #[serde(default)]
    pub is_netflix: bool,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub image_type: i32,
    #[serde(default)]
    pub thumb_img: String,
    #[serde(default)]
    pub min_price: String,
    #[serde(default)]
    pub currency_icon1: String,
    #[serde(default)]
    pub currency_icon2: String,
    #[serde(default)]
    pub currency_show_type: u32,
    #[serde(default)]
    pub vip_status: i32,
    #[serde(default)]
    pub lock_status: i32,
    #[serde(default)]
    pub rank: i32,
    #[serde(default)]
    pub recent_order: Vec<RecentOrder>,
    #[serde(default)]
    pub description: Vec<String>,
}

impl StreamingProduct {
    pub fn is_locked(&self) -> bool {
        self.lock_status != 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: u64,
    #[serde(rename = "spuList", default)]
    pub spu_list: Vec<StreamingProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyTab {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Product listing grouped by category tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProductCatalog {
    #[serde(default)]
    pub classify_tab: Vec<ClassifyTab>,
    #[serde(default)]
    pub list: Vec<ProductCategory>,
    /// Set when built-in sample data is shown instead of backend data.
    #[serde(skip)]
    pub fallback: bool,
}

impl ProductCatalog {
    /// All products across categories, highest rank first, without duplicates.
    pub fn products(&self) -> Vec<&StreamingProduct> {
        let mut products: Vec<&StreamingProduct> = Vec::new();
        for product in self.list.iter().flat_map(|c| &c.spu_list) {
            if !products.iter().any(|p| p.id == product.id) {
                products.push(product);
            }
        }
        products.sort_by(|a, b| b.rank.cmp(&a.rank));
        products
    }

    pub fn find(&self, id: u64) -> Option<&StreamingProduct> {
        self.list
            .iter()
            .flat_map(|c| &c.spu_list)
            .find(|p| p.id == id)
    }

    /// Built-in listing shown when the backend is unavailable.
    pub fn fallback() -> Self {
        Self {
            classify_tab: vec![ClassifyTab {
                id: 1,
                name: "Todos".to_string(),
                icon: None,
            }],
            list: vec![ProductCategory {
                id: 1,
                spu_list: vec![
                    sample_product(
                        1,
                        "Netflix",
                        "netflix",
                        "14.87",
                        99,
                        &[
                            "Renovar la misma cuenta de por vida",
                            "Mantenga todos sus favoritos y listas",
                            "Entrega en tiempo real",
                            "Compatible con dispositivos móviles, PC y TV",
                            "Garantía, garantía de reembolso.",
                        ],
                    ),
                    sample_product(
                        2,
                        "YouTube Premium",
                        "youtube",
                        "13.87",
                        73,
                        &[
                            "YouTube Premium sin anuncios",
                            "Acceso a YouTube Music incluido",
                            "Descargas para ver sin conexión",
                            "Reproducción en segundo plano",
                        ],
                    ),
                ],
            }],
            fallback: true,
        }
    }
}

fn sample_product(
    id: u64,
    name: &str,
    route: &str,
    min_price: &str,
    rank: i32,
    description: &[&str],
) -> StreamingProduct {
    let image = format!("assets/img/services/{route}.webp");
    StreamingProduct {
        id,
        type_name: name.to_string(),
        detail_route: route.to_string(),
        is_netflix: route == "netflix",
        image: image.clone(),
        image_type: i32::from(route == "netflix"),
        thumb_img: image,
        min_price: min_price.to_string(),
        currency_icon1: "S/.".to_string(),
        currency_icon2: "PEN(S/.)".to_string(),
        currency_show_type: 1,
        vip_status: 0,
        lock_status: 0,
        rank,
        recent_order: Vec::new(),
        description: description.iter().map(|d| d.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_listing() {
        let json = r#"{
            "classify_tab": [{"id": 1, "name": "Todos"}],
            "list": [
                {"id": 1, "spuList": [
                    {"id": 7, "type_name": "Disney+", "min_price": "9.90", "rank": 10},
                    {"id": 5, "type_name": "Netflix", "min_price": "14.87", "rank": 99, "lock_status": 1}
                ]},
                {"id": 2, "spuList": [{"id": 5, "type_name": "Netflix", "rank": 99}]}
            ]
        }"#;
        let catalog: ProductCatalog = serde_json::from_str(json).unwrap();
        assert!(!catalog.fallback);

        let products = catalog.products();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].type_name, "Netflix");
        assert!(products[0].is_locked());
        assert_eq!(catalog.find(7).unwrap().min_price, "9.90");
    }

    #[test]
    fn test_fallback_listing() {
        let catalog = ProductCatalog::fallback();
        assert!(catalog.fallback);
        let names: Vec<&str> = catalog.products().iter().map(|p| p.type_name.as_str()).collect();
        assert_eq!(names, vec!["Netflix", "YouTube Premium"]);
        assert!(catalog.find(1).unwrap().is_netflix);
    }
}
