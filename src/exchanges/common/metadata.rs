//! Decoder for Metaplex `CreateMetadataAccountV3` instruction data

use borsh::BorshDeserialize;
use serde::{Serialize, Serializer};

use crate::shared::errors::DecodeError;

fn as_base58<S: Serializer>(key: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&bs58::encode(key).into_string())
}

#[derive(Debug, Clone, PartialEq, BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    #[serde(serialize_with = "as_base58")]
    pub address: [u8; 32],
    pub verified: bool,
    pub share: u8,
}

#[derive(Debug, Clone, PartialEq, BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub verified: bool,
    #[serde(serialize_with = "as_base58")]
    pub key: [u8; 32],
}

#[derive(Debug, Clone, Copy, PartialEq, BorshDeserialize, Serialize)]
pub enum UseMethod {
    Burn,
    Multiple,
    Single,
}

#[derive(Debug, Clone, PartialEq, BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Uses {
    pub use_method: UseMethod,
    pub remaining: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, BorshDeserialize, Serialize)]
pub enum CollectionDetails {
    V1 { size: u64 },
}

#[derive(Debug, Clone, PartialEq, BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataV2 {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub creators: Option<Vec<Creator>>,
    pub collection: Option<Collection>,
    pub uses: Option<Uses>,
}

#[derive(Debug, Clone, PartialEq, BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMetadataAccountArgsV3 {
    pub data: DataV2,
    pub is_mutable: bool,
    pub collection_details: Option<CollectionDetails>,
}

#[derive(Debug, Clone, PartialEq, BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataInstruction {
    pub instruction_discriminator: u8,
    pub create_metadata_account_args_v3: CreateMetadataAccountArgsV3,
}

/// Decode raw instruction bytes. Trailing bytes after the args are ignored.
pub fn decode_metadata_instruction(data: &[u8]) -> Result<MetadataInstruction, DecodeError> {
    let mut buf = data;
    Ok(MetadataInstruction::deserialize(&mut buf)?)
}

/// Decode base58 instruction data (as shown by explorers) and render it as JSON
pub fn get_metadata(encoded: &str) -> Result<String, DecodeError> {
    let bytes = bs58::decode(encoded.trim()).into_vec()?;
    let instruction = decode_metadata_instruction(&bytes)?;
    serde_json::to_string(&instruction).map_err(|e| DecodeError::Unpack(e.to_string()))
}
