//! Typed registration document.
//!
//! The gateway forwards any `Serialize` value; this model is a convenience
//! for callers posting goods-introduction documents. Dates travel as
//! `yyyy-MM-d` (day of month without zero padding).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Document type used when none is given.
pub const DEFAULT_DOC_TYPE: &str = "LP_INTRODUCE_GOODS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub description: Option<Description>,
    pub doc_id: String,
    pub doc_status: Option<String>,
    pub doc_type: String,
    #[serde(rename = "importRequest")]
    pub import_request: Option<bool>,
    pub owner_inn: Option<String>,
    pub participant_inn: Option<String>,
    pub producer_inn: Option<String>,
    #[serde(with = "short_date::option", default)]
    pub production_date: Option<NaiveDate>,
    pub production_type: Option<String>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(with = "short_date::option", default)]
    pub reg_date: Option<NaiveDate>,
    pub reg_number: Option<String>,
}

impl Document {
    /// Create an empty document with the default type.
    pub fn new(doc_id: impl Into<String>) -> Self {
        Self {
            description: None,
            doc_id: doc_id.into(),
            doc_status: None,
            doc_type: DEFAULT_DOC_TYPE.to_string(),
            import_request: None,
            owner_inn: None,
            participant_inn: None,
            producer_inn: None,
            production_date: None,
            production_type: None,
            products: Vec::new(),
            reg_date: None,
            reg_number: None,
        }
    }

    pub fn with_participant(mut self, inn: impl Into<String>) -> Self {
        let inn = inn.into();
        self.description = Some(Description {
            participant_inn: Some(inn.clone()),
        });
        self.participant_inn = Some(inn);
        self
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.products.push(product);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    #[serde(rename = "participantInn")]
    pub participant_inn: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub certificate_document: Option<String>,
    #[serde(with = "short_date::option", default)]
    pub certificate_document_date: Option<NaiveDate>,
    pub certificate_document_number: Option<String>,
    pub owner_inn: Option<String>,
    pub producer_inn: Option<String>,
    #[serde(with = "short_date::option", default)]
    pub production_date: Option<NaiveDate>,
    pub tnved_code: Option<String>,
    pub uit_code: Option<String>,
    pub uitu_code: Option<String>,
}

/// `yyyy-MM-d` date encoding.
pub mod short_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%-d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            raw.map(|raw| NaiveDate::parse_from_str(&raw, super::FORMAT).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
