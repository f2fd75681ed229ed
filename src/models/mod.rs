pub mod anuncio;
pub mod usuario;
