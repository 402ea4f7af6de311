use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ReceiptQuery {
    pub version: Option<String>,
}
