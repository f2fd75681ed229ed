pub mod admin;
pub mod anuncio;
pub mod base;
pub mod busca;
pub mod contato;
pub mod imagem;
pub mod usuario;

pub use base::{Repository, is_unique_violation};
