//! Domain events that trigger outbound notifications.
//!
//! Each variant carries the data needed to render both the email and the
//! chat message, so the notifier never has to query the store.

use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum NotificationEvent {
    UsuarioCadastrado {
        usuario_id: i32,
        nome: String,
        email: String,
        telefone: String,
        cidade: String,
        estado: String,
    },

    AnuncioCriado {
        anuncio_id: i32,
        titulo: String,
        valor: i64,
        usuario_id: i32,
        usuario_nome: String,
        usuario_email: String,
    },

    AnuncioModerado {
        anuncio_id: i32,
        titulo: String,
        aprovado: bool,
        usuario_email: String,
    },

    ContatoRecebido {
        contato_id: i32,
        nome: String,
        contato: String,
        texto: String,
    },
}

impl NotificationEvent {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UsuarioCadastrado { .. } => "usuario_cadastrado",
            Self::AnuncioCriado { .. } => "anuncio_criado",
            Self::AnuncioModerado { .. } => "anuncio_moderado",
            Self::ContatoRecebido { .. } => "contato_recebido",
        }
    }
}
