//! Best-effort outbound notifications.
//!
//! Every event may produce an email to the affected person and a one-line
//! message to the team chat. Delivery failures are logged and dropped.

use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use crate::clients::{ChatWebhook, Email, Mailer};
use crate::config::NotificationConfig;
use crate::domain::events::NotificationEvent;
use crate::domain::format_brl;

/// Loose address check used before any email is attempted.
#[must_use]
pub fn is_valid_email(address: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid regex"));
    re.is_match(address.trim())
}

fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    webhook: Arc<dyn ChatWebhook>,
    config: NotificationConfig,
}

impl Notifier {
    #[must_use]
    pub fn new(
        mailer: Arc<dyn Mailer>,
        webhook: Arc<dyn ChatWebhook>,
        config: NotificationConfig,
    ) -> Self {
        Self {
            mailer,
            webhook,
            config,
        }
    }

    /// Sends whatever the event calls for. Never fails.
    pub async fn notify(&self, event: &NotificationEvent) {
        let kind = event.kind();

        let email = self.render_email(event);
        if self.should_email(&email) {
            match self.mailer.send(&email).await {
                Ok(()) => {
                    metrics::counter!("notifications_sent_total", "channel" => "email")
                        .increment(1);
                    info!(event = kind, to = %email.to, "Notification email sent");
                }
                Err(e) => {
                    metrics::counter!("notifications_failed_total", "channel" => "email")
                        .increment(1);
                    warn!(event = kind, error = %e, "Failed to send notification email");
                }
            }
        }

        if !self.config.webhook_url.is_empty() {
            let message = chat_message(event);
            match self.webhook.post(&message).await {
                Ok(()) => {
                    metrics::counter!("notifications_sent_total", "channel" => "webhook")
                        .increment(1);
                }
                Err(e) => {
                    metrics::counter!("notifications_failed_total", "channel" => "webhook")
                        .increment(1);
                    warn!(event = kind, error = %e, "Failed to post chat notification");
                }
            }
        }
    }

    fn should_email(&self, email: &Email) -> bool {
        self.config.send_emails && is_valid_email(&email.from) && is_valid_email(&email.to)
    }

    fn render_email(&self, event: &NotificationEvent) -> Email {
        let (to, subject, html) = match event {
            NotificationEvent::UsuarioCadastrado { nome, email, .. } => (
                email.clone(),
                "Bem vindo ao Clozer!".to_string(),
                format!(
                    "<h2>Ola, {}!</h2>\
                     <p>Seu cadastro no Clozer foi realizado com sucesso.</p>\
                     <p>Agora voce ja pode anunciar seus veiculos.</p>",
                    escape(nome)
                ),
            ),
            NotificationEvent::AnuncioCriado {
                titulo,
                valor,
                usuario_nome,
                usuario_email,
                ..
            } => (
                usuario_email.clone(),
                "Anuncio cadastrado com sucesso!".to_string(),
                format!(
                    "<h2>Ola, {}!</h2>\
                     <p>Recebemos seu anuncio <strong>{}</strong> no valor de {}.</p>\
                     <p>Ele sera publicado assim que for aprovado pela nossa equipe.</p>",
                    escape(usuario_nome),
                    escape(titulo),
                    format_brl(*valor)
                ),
            ),
            NotificationEvent::AnuncioModerado {
                titulo,
                aprovado,
                usuario_email,
                ..
            } => {
                if *aprovado {
                    (
                        usuario_email.clone(),
                        "Anuncio Aprovado".to_string(),
                        format!(
                            "<p>Seu anuncio <strong>{}</strong> foi aprovado e ja esta no ar.</p>",
                            escape(titulo)
                        ),
                    )
                } else {
                    (
                        usuario_email.clone(),
                        "Anuncio Reprovado".to_string(),
                        format!(
                            "<p>Seu anuncio <strong>{}</strong> foi reprovado.</p>",
                            escape(titulo)
                        ),
                    )
                }
            }
            NotificationEvent::ContatoRecebido { contato, texto, .. } => (
                contato.clone(),
                "Mensagem cadastrada com sucesso!".to_string(),
                format!(
                    "<p>Mensagem salva com sucesso:</p><p>{}</p>",
                    escape(texto)
                ),
            ),
        };

        Email {
            from: self.config.sender.clone(),
            to,
            subject,
            html,
        }
    }
}

/// One-line message for the team chat.
#[must_use]
pub fn chat_message(event: &NotificationEvent) -> String {
    match event {
        NotificationEvent::UsuarioCadastrado {
            usuario_id,
            nome,
            email,
            telefone,
            cidade,
            estado,
        } => format!("Usuario({usuario_id}) > {nome}: {email}, {telefone}, {cidade}-{estado}"),
        NotificationEvent::AnuncioCriado {
            anuncio_id,
            titulo,
            valor,
            usuario_id,
            usuario_nome,
            ..
        } => format!("Anuncio({anuncio_id}) > {usuario_nome}({usuario_id}): {titulo} R${valor}"),
        NotificationEvent::AnuncioModerado {
            anuncio_id,
            titulo,
            aprovado,
            ..
        } => {
            let decisao = if *aprovado { "aprovado" } else { "reprovado" };
            format!("Anuncio({anuncio_id}) {decisao}: {titulo}")
        }
        NotificationEvent::ContatoRecebido {
            contato_id,
            nome,
            contato,
            texto,
        } => format!("CONTATO({contato_id}) > {nome} - {contato}: {texto}"),
    }
}
