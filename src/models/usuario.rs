use sea_orm::Set;
use serde::Deserialize;

use crate::domain::TipoUsuario;
use crate::entities::usuario;

/// Fields accepted on signup. Anything else in the payload is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NovoUsuario {
    pub facebook_id: String,
    pub nome: String,
    pub email: String,
    pub tipo: Option<String>,
    pub cidade: String,
    pub estado: String,
    pub telefone: String,
}

impl NovoUsuario {
    /// Checks the external id and the account kind, returning the kind to store.
    pub fn validate(&self) -> Result<TipoUsuario, String> {
        let facebook_id = self.facebook_id.trim();
        if facebook_id.is_empty() {
            return Err("Informe o facebook_id do usuario".to_string());
        }
        if !facebook_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("facebook_id invalido: {facebook_id}"));
        }

        match self.tipo.as_deref().map(str::trim) {
            None | Some("") => Ok(TipoUsuario::default()),
            Some(tipo) => {
                TipoUsuario::parse(tipo).ok_or_else(|| format!("Tipo de usuario invalido: {tipo}"))
            }
        }
    }
}

/// Profile fields a user (or a moderator) may change.
///
/// Absent and blank values leave the stored value untouched. The external id
/// is deliberately not part of this struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UsuarioUpdate {
    pub nome: Option<String>,
    pub email: Option<String>,
    pub tipo: Option<String>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub telefone: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl UsuarioUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(tipo) = non_blank(self.tipo.as_ref())
            && TipoUsuario::parse(&tipo).is_none()
        {
            return Err(format!("Tipo de usuario invalido: {tipo}"));
        }
        Ok(())
    }

    pub fn apply(&self, active: &mut usuario::ActiveModel) {
        if let Some(nome) = non_blank(self.nome.as_ref()) {
            active.nome = Set(nome);
        }
        if let Some(email) = non_blank(self.email.as_ref()) {
            active.email = Set(email);
        }
        if let Some(tipo) = non_blank(self.tipo.as_ref()) {
            active.tipo = Set(tipo);
        }
        if let Some(cidade) = non_blank(self.cidade.as_ref()) {
            active.cidade = Set(cidade);
        }
        if let Some(estado) = non_blank(self.estado.as_ref()) {
            active.estado = Set(estado);
        }
        if let Some(telefone) = non_blank(self.telefone.as_ref()) {
            active.telefone = Set(telefone);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_requires_numeric_external_id() {
        let mut novo = NovoUsuario {
            facebook_id: "123456789".to_string(),
            ..Default::default()
        };
        assert_eq!(novo.validate(), Ok(TipoUsuario::PessoaFisica));

        novo.facebook_id = "abc".to_string();
        assert!(novo.validate().is_err());

        novo.facebook_id = "  ".to_string();
        assert!(novo.validate().is_err());
    }

    #[test]
    fn signup_checks_account_kind() {
        let novo = NovoUsuario {
            facebook_id: "1".to_string(),
            tipo: Some("Garagem".to_string()),
            ..Default::default()
        };
        assert_eq!(novo.validate(), Ok(TipoUsuario::Garagem));

        let novo = NovoUsuario {
            facebook_id: "1".to_string(),
            tipo: Some("Empresa".to_string()),
            ..Default::default()
        };
        assert!(novo.validate().is_err());
    }

    #[test]
    fn update_skips_blank_fields() {
        let update = UsuarioUpdate {
            nome: Some("Maria".to_string()),
            email: Some("   ".to_string()),
            ..Default::default()
        };
        let mut active = usuario::ActiveModel::default();
        update.apply(&mut active);

        assert_eq!(active.nome, Set("Maria".to_string()));
        assert!(active.email.is_not_set());
        assert!(active.facebook_id.is_not_set());
    }
}
