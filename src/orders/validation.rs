//! Client-side checks run before any order request is sent.

use std::path::Path;

use thiserror::Error;

use crate::config::CheckoutConfig;
use crate::orders::types::CreateOrderRequest;

/// One problem with an order request. Item positions are 1-based.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderIssue {
    #[error("service id is required")]
    MissingServiceId,
    #[error("plan id is required")]
    MissingPlanId,
    #[error("at least one item is required")]
    NoItems,
    #[error("total must be greater than 0")]
    NonPositiveTotal,
    #[error("item {0}: product id is required")]
    MissingProductId(usize),
    #[error("item {0}: product name is required")]
    MissingItemName(usize),
    #[error("item {0}: quantity must be greater than 0")]
    NonPositiveQuantity(usize),
    #[error("item {0}: price must be greater than 0")]
    NonPositivePrice(usize),
}

/// Check every rule and report all violations together.
pub fn validate_order(request: &CreateOrderRequest) -> Result<(), Vec<OrderIssue>> {
    let mut issues = Vec::new();

    if request.service_id.trim().is_empty() {
        issues.push(OrderIssue::MissingServiceId);
    }
    if request.type_plan_id == 0 {
        issues.push(OrderIssue::MissingPlanId);
    }
    if request.items.is_empty() {
        issues.push(OrderIssue::NoItems);
    }
    if !is_positive(request.total) {
        issues.push(OrderIssue::NonPositiveTotal);
    }

    for (index, item) in request.items.iter().enumerate() {
        let position = index + 1;
        if item.product_id.trim().is_empty() {
            issues.push(OrderIssue::MissingProductId(position));
        }
        if item.name.trim().is_empty() {
            issues.push(OrderIssue::MissingItemName(position));
        }
        if item.quantity == 0 {
            issues.push(OrderIssue::NonPositiveQuantity(position));
        }
        if !is_positive(item.price) {
            issues.push(OrderIssue::NonPositivePrice(position));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// False for zero, negatives and NaN.
fn is_positive(amount: f64) -> bool {
    amount > 0.0
}

/// A payment receipt image.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Receipt {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Read a receipt from disk, taking the MIME type from the extension.
    ///
    /// Type and size are checked before the file is read.
    pub fn from_path(path: &Path, config: &CheckoutConfig) -> Result<Self, ReceiptError> {
        let unreadable = |e: std::io::Error| ReceiptError::Unreadable(format!("{}: {e}", path.display()));

        let mime = mime_for_path(path);
        check_type(mime, config)?;
        let size = std::fs::metadata(path).map_err(unreadable)?.len();
        check_size(size, config)?;

        let bytes = std::fs::read(path).map_err(unreadable)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "receipt".to_string());
        let receipt = Self {
            mime: mime.to_string(),
            file_name,
            bytes,
        };
        // The file may have changed since the metadata was read.
        validate_receipt(&receipt, config)?;
        Ok(receipt)
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceiptError {
    #[error("receipt type '{0}' is not accepted; use a JPG, PNG or WEBP image")]
    UnsupportedType(String),
    #[error("receipt is {size} bytes; the limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    #[error("receipt file is empty")]
    Empty,
    #[error("receipt could not be read: {0}")]
    Unreadable(String),
}

/// Accept only allowed image types within the size limit.
pub fn validate_receipt(receipt: &Receipt, config: &CheckoutConfig) -> Result<(), ReceiptError> {
    check_type(&receipt.mime, config)?;
    check_size(receipt.size(), config)
}

fn check_type(mime: &str, config: &CheckoutConfig) -> Result<(), ReceiptError> {
    let normalized = mime.trim();
    if config.receipt_types.iter().any(|t| t.eq_ignore_ascii_case(normalized)) {
        Ok(())
    } else {
        Err(ReceiptError::UnsupportedType(mime.to_string()))
    }
}

fn check_size(size: u64, config: &CheckoutConfig) -> Result<(), ReceiptError> {
    if size == 0 {
        return Err(ReceiptError::Empty);
    }
    if size > config.max_receipt_bytes {
        return Err(ReceiptError::TooLarge {
            size,
            limit: config.max_receipt_bytes,
        });
    }
    Ok(())
}
