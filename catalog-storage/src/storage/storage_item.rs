use serde::{Deserialize, Serialize};

pub type ItemId = u64;

/// Client supplied item content, everything except the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFields {
    #[serde(rename = "nombre")]
    pub name: String,

    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,

    #[serde(rename = "precio")]
    pub price: f64,
}

impl ItemFields {
    pub fn new(name: &str, price: f64) -> Self {
        ItemFields {
            name: name.to_owned(),
            description: None,
            price,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }
}

/// Storage Item
///
/// The `id` is assigned by the store and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,

    #[serde(rename = "nombre")]
    pub name: String,

    #[serde(rename = "descripcion")]
    pub description: Option<String>,

    #[serde(rename = "precio")]
    pub price: f64,
}

impl Item {
    pub fn from_fields(id: ItemId, fields: ItemFields) -> Self {
        Item {
            id,
            name: fields.name,
            description: fields.description,
            price: fields.price,
        }
    }
}
