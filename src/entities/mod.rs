pub mod prelude;

pub mod admin_users;
pub mod anuncio;
pub mod busca;
pub mod contato;
pub mod imagem;
pub mod usuario;
