//! Core types and data structures for the transaction store

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Decoded field mapping of a single record
pub type Fields = BTreeMap<String, String>;

/// Lifecycle labels a transaction can carry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Created but not settled yet
    #[default]
    Pending,
    /// Settled successfully
    Completed,
    /// Rejected by the operator or the payment provider
    Failed,
    /// Withdrawn before settlement
    Cancelled,
}

impl TransactionStatus {
    /// The label stored in the `status` field
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "failed" => Ok(TransactionStatus::Failed),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            other => Err(StoreError::Unpack(format!("unknown status '{other}'"))),
        }
    }
}

/// A record read back from (or written to) the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Full store key, prefix included
    pub key: String,
    /// Field mapping decoded to text
    pub fields: Fields,
}

impl Record {
    /// Create a record from a key and its fields
    pub fn new(key: impl Into<String>, fields: Fields) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }

    /// Look up a single field
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Names from `required` that are absent or empty in this record
    pub fn missing_fields<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| self.field(name).is_none_or(|value| value.is_empty()))
            .collect()
    }
}

/// Typed view of a generic `transaction:<id>` record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Identifier without the key prefix
    pub id: String,
    pub user_id: String,
    pub amount: BigDecimal,
    pub status: TransactionStatus,
    /// Seconds since the Unix epoch of the latest write
    pub timestamp: f64,
}

impl TransactionRecord {
    /// Fields every stored transaction must carry
    pub const REQUIRED_FIELDS: [&'static str; 4] = ["user_id", "amount", "status", "timestamp"];

    /// The field mapping written to the store
    pub fn to_fields(&self) -> Fields {
        Fields::from([
            ("user_id".to_string(), self.user_id.clone()),
            ("amount".to_string(), self.amount.to_string()),
            ("status".to_string(), self.status.to_string()),
            ("timestamp".to_string(), self.timestamp.to_string()),
        ])
    }
}

impl TryFrom<&Record> for TransactionRecord {
    type Error = StoreError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        let missing = record.missing_fields(&Self::REQUIRED_FIELDS);
        if !missing.is_empty() {
            return Err(StoreError::Unpack(format!(
                "record {} is missing {}",
                record.key,
                missing.join(", ")
            )));
        }

        // presence was checked above
        let field = |name: &str| record.field(name).unwrap_or_default();
        let id = record
            .key
            .split_once(':')
            .map(|(_, id)| id)
            .unwrap_or(&record.key)
            .to_string();
        let amount = BigDecimal::from_str(field("amount"))
            .map_err(|e| StoreError::Unpack(format!("invalid amount in {}: {e}", record.key)))?;
        let timestamp = field("timestamp")
            .parse::<f64>()
            .map_err(|e| StoreError::Unpack(format!("invalid timestamp in {}: {e}", record.key)))?;

        Ok(Self {
            id,
            user_id: field("user_id").to_string(),
            amount,
            status: field("status").parse()?,
            timestamp,
        })
    }
}

/// Payment request as stored by the mobile money integration
///
/// Every value is kept as text: msisdn and debitor numbers carry
/// leading zeros that a numeric type would drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub key: String,
    pub offer_refnum: String,
    pub offer_amount: String,
    pub transaction_id: String,
    pub transaction_amount: String,
    pub transaction_debitor: String,
    pub transaction_object_reference: String,
    pub transaction_original_transaction_reference: String,
    pub transaction_date: String,
    pub transaction_description: String,
    pub transaction_status: String,
    pub operator: String,
    pub customer_refnum: String,
    pub customer_device_id: String,
    pub customer_msisdn: String,
    pub service_type: String,
    #[serde(rename = "_is_activated")]
    pub is_activated: bool,
}

impl PaymentRequest {
    /// A completed TV subscription used to populate test databases
    pub fn fixture(key: String, transaction_id: &str) -> Self {
        Self {
            key,
            offer_refnum: "38302".to_string(),
            offer_amount: "20000".to_string(),
            transaction_id: transaction_id.to_string(),
            transaction_amount: "20000".to_string(),
            transaction_debitor: "0343500004".to_string(),
            transaction_object_reference: "642997587".to_string(),
            transaction_original_transaction_reference: uuid::Uuid::new_v4().to_string(),
            transaction_date: "2023-09-29T12:09:58.865Z".to_string(),
            transaction_description: "Decouverte 30j".to_string(),
            transaction_status: TransactionStatus::Completed.to_string(),
            operator: "telma-internet-tv".to_string(),
            customer_refnum: "101".to_string(),
            customer_device_id: "43130694183".to_string(),
            customer_msisdn: "0343500004".to_string(),
            service_type: "tv".to_string(),
            is_activated: true,
        }
    }

    /// The field mapping written to the store
    pub fn to_fields(&self) -> Fields {
        let is_activated = if self.is_activated { "1" } else { "0" };
        let pairs: [(&str, &str); 17] = [
            ("key", &self.key),
            ("offer_refnum", &self.offer_refnum),
            ("offer_amount", &self.offer_amount),
            ("transaction_id", &self.transaction_id),
            ("transaction_amount", &self.transaction_amount),
            ("transaction_debitor", &self.transaction_debitor),
            ("transaction_object_reference", &self.transaction_object_reference),
            (
                "transaction_original_transaction_reference",
                &self.transaction_original_transaction_reference,
            ),
            ("transaction_date", &self.transaction_date),
            ("transaction_description", &self.transaction_description),
            ("transaction_status", &self.transaction_status),
            ("operator", &self.operator),
            ("customer_refnum", &self.customer_refnum),
            ("customer_device_id", &self.customer_device_id),
            ("customer_msisdn", &self.customer_msisdn),
            ("service_type", &self.service_type),
            ("_is_activated", is_activated),
        ];
        pairs
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }
}

/// Errors that can occur while talking to the store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unpacking error: {0}")]
    Unpack(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while loading identifier lists
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid date '{value}' for key '{key}': {source}")]
    InvalidDate {
        key: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Result type for ingestion
pub type IngestResult<T> = Result<T, IngestError>;
