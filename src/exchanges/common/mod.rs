pub mod layout;
pub mod metadata;
pub mod token_utils;

pub use layout::{anchor_discriminator, read_pod};
pub use metadata::get_metadata;
pub use token_utils::{decode_token_account, get_token_info, is_token_program, TOKEN_2022_PROGRAM, WSOL_MINT};
