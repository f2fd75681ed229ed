pub mod anuncio_service;
pub use anuncio_service::{AnuncioError, AnuncioService};

pub mod anuncio_service_impl;
pub use anuncio_service_impl::SeaOrmAnuncioService;

pub mod image;
pub use image::{ImageError, ImageService};

pub mod notification;
pub use notification::Notifier;

pub mod search;
pub use search::{SearchError, SearchService};

pub mod token;
pub use token::{TokenError, TokenKind, TokenService};
