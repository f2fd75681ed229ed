pub use super::admin_users::Entity as AdminUsers;
pub use super::anuncio::Entity as Anuncio;
pub use super::busca::Entity as Busca;
pub use super::contato::Entity as Contato;
pub use super::imagem::Entity as Imagem;
pub use super::usuario::Entity as Usuario;
