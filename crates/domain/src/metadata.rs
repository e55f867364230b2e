//! Codec for the checkout data carried in payment-provider metadata.
//!
//! The provider only persists flat string key/value metadata with tight size
//! limits, and between session creation and payment confirmation it is the
//! only place the cart survives. Encoding therefore projects the cart onto a
//! compact, versioned schema and decoding validates it again in full: the
//! metadata comes back from a third party and is never trusted as-is.
//!
//! Layout (schema `v1`):
//!
//! | key                       | value                                      |
//! |---------------------------|--------------------------------------------|
//! | `schema`                  | `v1`                                       |
//! | `customer_name` .. `customer_country` | one customer form field each   |
//! | `total_cents`             | decimal integer                            |
//! | `line_items_chunks`       | number of `line_items_N` keys              |
//! | `line_items_0` ..         | JSON array of `{id,name,qty,price,variant}`, split every 500 chars |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::customer::Customer;
use crate::error::ValidationError;
use crate::value_objects::{LineItem, Money};

/// Flat string metadata as accepted by the payment provider.
pub type Metadata = BTreeMap<String, String>;

/// Maximum number of metadata keys per session.
pub const MAX_KEYS: usize = 50;

/// Maximum length of a metadata key, in characters.
pub const MAX_KEY_LENGTH: usize = 40;

/// Maximum length of a metadata value, in characters.
pub const MAX_VALUE_LENGTH: usize = 500;

const SCHEMA_KEY: &str = "schema";
const SCHEMA_VERSION: &str = "v1";
const TOTAL_KEY: &str = "total_cents";
const CHUNKS_KEY: &str = "line_items_chunks";
const CHUNK_PREFIX: &str = "line_items_";

const NAME_KEY: &str = "customer_name";
const EMAIL_KEY: &str = "customer_email";
const ADDRESS_KEY: &str = "customer_address";
const CITY_KEY: &str = "customer_city";
const POSTAL_CODE_KEY: &str = "customer_postal_code";
const COUNTRY_KEY: &str = "customer_country";

// schema, six customer fields, total, chunk count
const FIXED_KEYS: usize = 9;

/// Errors raised while decoding metadata returned by the provider.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A required key is absent.
    #[error("Missing metadata key: {0}")]
    MissingKey(String),

    /// The metadata was written by an unknown schema version.
    #[error("Unsupported metadata schema: {0}")]
    UnsupportedSchema(String),

    /// A key holds a value that cannot be parsed.
    #[error("Invalid metadata value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// The line items payload is not valid JSON for the schema.
    #[error("Malformed line items: {0}")]
    MalformedItems(#[from] serde_json::Error),

    /// The decoded checkout fails validation.
    #[error("Invalid checkout data: {0}")]
    Invalid(#[from] ValidationError),
}

/// Compact projection of a line item: enough to rebuild an order, no more.
#[derive(Debug, Serialize, Deserialize)]
struct EncodedLineItem {
    id: String,
    name: String,
    qty: u32,
    price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variant: Option<String>,
}

impl From<&LineItem> for EncodedLineItem {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.product_id.to_string(),
            name: item.product_name.clone(),
            qty: item.quantity,
            price: item.unit_price.cents(),
            variant: item.variant.clone(),
        }
    }
}

impl From<EncodedLineItem> for LineItem {
    fn from(item: EncodedLineItem) -> Self {
        LineItem {
            product_id: item.id.into(),
            product_name: item.name,
            variant: item.variant,
            quantity: item.qty,
            unit_price: Money::from_cents(item.price),
        }
    }
}

/// Everything needed to create an order once payment is confirmed.
///
/// Constructing one validates the checkout: a value of this type always has
/// at least one item, a complete customer, and a positive total equal to the
/// sum of its line items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutMetadata {
    pub customer: Customer,
    pub items: Vec<LineItem>,
    pub total: Money,
}

impl CheckoutMetadata {
    /// Validates a checkout request.
    ///
    /// `total` is the amount the client asked to pay; it must be positive and
    /// equal to the line items' total.
    pub fn new(
        customer: Customer,
        items: Vec<LineItem>,
        total: Money,
    ) -> Result<Self, ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::EmptyCart);
        }
        if !total.is_positive() {
            return Err(ValidationError::NonPositiveTotal(total));
        }

        for (index, item) in items.iter().enumerate() {
            validate_line_item(index, item)?;
        }

        let computed = checked_items_total(&items)?;
        if computed != total {
            return Err(ValidationError::TotalMismatch {
                submitted: total,
                computed,
            });
        }

        customer.validate()?;

        Ok(Self {
            customer: customer.normalized(),
            items,
            total,
        })
    }

    /// Encodes the checkout into provider metadata.
    ///
    /// Fails if the result would exceed the provider's metadata limits.
    pub fn encode(&self) -> Result<Metadata, ValidationError> {
        let mut metadata = Metadata::new();
        metadata.insert(SCHEMA_KEY.to_string(), SCHEMA_VERSION.to_string());

        for (key, value) in self.customer_entries() {
            if value.chars().count() > MAX_VALUE_LENGTH {
                return Err(ValidationError::MetadataTooLarge(format!(
                    "{key} exceeds {MAX_VALUE_LENGTH} characters"
                )));
            }
            metadata.insert(key.to_string(), value.to_string());
        }

        metadata.insert(TOTAL_KEY.to_string(), self.total.cents().to_string());

        let encoded: Vec<EncodedLineItem> = self.items.iter().map(EncodedLineItem::from).collect();
        let json = serde_json::to_string(&encoded)
            .map_err(|e| ValidationError::MetadataTooLarge(e.to_string()))?;
        let chunks = split_chars(&json, MAX_VALUE_LENGTH);

        if FIXED_KEYS + chunks.len() > MAX_KEYS {
            return Err(ValidationError::MetadataTooLarge(format!(
                "{} line items need {} metadata keys, limit is {MAX_KEYS}",
                self.items.len(),
                FIXED_KEYS + chunks.len()
            )));
        }

        metadata.insert(CHUNKS_KEY.to_string(), chunks.len().to_string());
        for (index, chunk) in chunks.into_iter().enumerate() {
            metadata.insert(format!("{CHUNK_PREFIX}{index}"), chunk);
        }

        debug_assert!(metadata.keys().all(|k| k.len() <= MAX_KEY_LENGTH));
        Ok(metadata)
    }

    /// Decodes and re-validates metadata returned by the provider.
    pub fn decode(metadata: &Metadata) -> Result<Self, MetadataError> {
        let schema = required(metadata, SCHEMA_KEY)?;
        if schema != SCHEMA_VERSION {
            return Err(MetadataError::UnsupportedSchema(schema.to_string()));
        }

        let customer = Customer {
            name: required(metadata, NAME_KEY)?.to_string(),
            email: required(metadata, EMAIL_KEY)?.to_string(),
            address: required(metadata, ADDRESS_KEY)?.to_string(),
            city: required(metadata, CITY_KEY)?.to_string(),
            postal_code: required(metadata, POSTAL_CODE_KEY)?.to_string(),
            country: required(metadata, COUNTRY_KEY)?.to_string(),
        };

        let total = parse_value::<i64>(metadata, TOTAL_KEY).map(Money::from_cents)?;
        let chunk_count = parse_value::<usize>(metadata, CHUNKS_KEY)?;
        if chunk_count == 0 || FIXED_KEYS + chunk_count > MAX_KEYS {
            return Err(MetadataError::InvalidValue {
                key: CHUNKS_KEY.to_string(),
                reason: format!("chunk count {chunk_count} out of range"),
            });
        }

        let mut json = String::new();
        for index in 0..chunk_count {
            json.push_str(required(metadata, &format!("{CHUNK_PREFIX}{index}"))?);
        }

        let encoded: Vec<EncodedLineItem> = serde_json::from_str(&json)?;
        let items = encoded.into_iter().map(LineItem::from).collect();

        Ok(Self::new(customer, items, total)?)
    }

    fn customer_entries(&self) -> [(&'static str, &str); 6] {
        [
            (NAME_KEY, self.customer.name.as_str()),
            (EMAIL_KEY, self.customer.email.as_str()),
            (ADDRESS_KEY, self.customer.address.as_str()),
            (CITY_KEY, self.customer.city.as_str()),
            (POSTAL_CODE_KEY, self.customer.postal_code.as_str()),
            (COUNTRY_KEY, self.customer.country.as_str()),
        ]
    }
}

fn checked_items_total(items: &[LineItem]) -> Result<Money, ValidationError> {
    items.iter().try_fold(Money::zero(), |acc, item| {
        item.checked_total_price()
            .and_then(|line| acc.checked_add(line))
            .ok_or_else(|| ValidationError::AmountOverflow(item.product_id.to_string()))
    })
}

fn validate_line_item(index: usize, item: &LineItem) -> Result<(), ValidationError> {
    if item.product_id.is_blank() {
        return Err(ValidationError::IncompleteLineItem {
            index,
            field: "product id",
        });
    }
    if item.product_name.trim().is_empty() {
        return Err(ValidationError::IncompleteLineItem {
            index,
            field: "name",
        });
    }
    if item.quantity == 0 {
        return Err(ValidationError::InvalidQuantity {
            product_id: item.product_id.to_string(),
            quantity: item.quantity,
        });
    }
    if !item.unit_price.is_positive() {
        return Err(ValidationError::InvalidPrice {
            product_id: item.product_id.to_string(),
            price: item.unit_price,
        });
    }
    Ok(())
}

fn required<'a>(metadata: &'a Metadata, key: &str) -> Result<&'a str, MetadataError> {
    metadata
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| MetadataError::MissingKey(key.to_string()))
}

fn parse_value<T>(metadata: &Metadata, key: &str) -> Result<T, MetadataError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    required(metadata, key)?
        .trim()
        .parse()
        .map_err(|e: T::Err| MetadataError::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

// Splits on char boundaries; the provider counts characters, not bytes.
fn split_chars(s: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
