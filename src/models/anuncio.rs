use serde::Deserialize;
use std::collections::HashMap;

use crate::domain::build_search_text;
use crate::entities::{anuncio, imagem, usuario};

/// A listing joined with its owner and images, ordered by image id.
#[derive(Debug, Clone)]
pub struct AnuncioDetalhado {
    pub anuncio: anuncio::Model,
    pub usuario: Option<usuario::Model>,
    pub imagens: Vec<imagem::Model>,
}

/// Text fields accepted when a listing is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NovoAnuncio {
    pub titulo: String,
    pub descricao: String,
    pub valor: i64,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub ano: Option<i32>,
    pub cor: Option<String>,
    pub troca: bool,
    pub leilao: bool,
    pub cidade_veiculo: String,
    pub estado_veiculo: String,
}

/// Checkbox-style flag: only an explicit truthy value turns it on.
#[must_use]
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "on" | "sim" | "yes"
    )
}

fn blank_to_none(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_number<T: std::str::FromStr>(name: &str, value: Option<&String>) -> Result<Option<T>, String> {
    match blank_to_none(value) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("Campo {name} deve ser numerico")),
    }
}

impl NovoAnuncio {
    /// Builds the listing from multipart text fields, ignoring unknown names.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, String> {
        Ok(Self {
            titulo: blank_to_none(fields.get("titulo")).unwrap_or_default(),
            descricao: blank_to_none(fields.get("descricao")).unwrap_or_default(),
            valor: parse_number("valor", fields.get("valor"))?.unwrap_or(0),
            marca: blank_to_none(fields.get("marca")),
            modelo: blank_to_none(fields.get("modelo")),
            ano: parse_number("ano", fields.get("ano"))?,
            cor: blank_to_none(fields.get("cor")),
            troca: fields.get("troca").is_some_and(|v| parse_flag(v)),
            leilao: fields.get("leilao").is_some_and(|v| parse_flag(v)),
            cidade_veiculo: blank_to_none(fields.get("cidade_veiculo")).unwrap_or_default(),
            estado_veiculo: blank_to_none(fields.get("estado_veiculo")).unwrap_or_default(),
        })
    }

    #[must_use]
    pub fn search_text(&self) -> String {
        build_search_text(
            self.marca.as_deref(),
            self.modelo.as_deref(),
            self.ano,
            self.cor.as_deref(),
        )
    }
}

/// Listing fields an owner may change. Absent and blank values are skipped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnuncioUpdate {
    pub titulo: Option<String>,
    pub descricao: Option<String>,
    pub valor: Option<i64>,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub ano: Option<i32>,
    pub cor: Option<String>,
    pub troca: Option<bool>,
    pub leilao: Option<bool>,
    pub cidade_veiculo: Option<String>,
    pub estado_veiculo: Option<String>,
}

impl AnuncioUpdate {
    /// Applies the changes and recomputes the search text.
    pub fn apply(&self, anuncio: &mut anuncio::Model) {
        if let Some(titulo) = blank_to_none(self.titulo.as_ref()) {
            anuncio.titulo = titulo;
        }
        if let Some(descricao) = blank_to_none(self.descricao.as_ref()) {
            anuncio.descricao = descricao;
        }
        if let Some(valor) = self.valor {
            anuncio.valor = valor;
        }
        if let Some(marca) = blank_to_none(self.marca.as_ref()) {
            anuncio.marca = Some(marca);
        }
        if let Some(modelo) = blank_to_none(self.modelo.as_ref()) {
            anuncio.modelo = Some(modelo);
        }
        if let Some(ano) = self.ano {
            anuncio.ano = Some(ano);
        }
        if let Some(cor) = blank_to_none(self.cor.as_ref()) {
            anuncio.cor = Some(cor);
        }
        if let Some(troca) = self.troca {
            anuncio.troca = troca;
        }
        if let Some(leilao) = self.leilao {
            anuncio.leilao = leilao;
        }
        if let Some(cidade) = blank_to_none(self.cidade_veiculo.as_ref()) {
            anuncio.cidade_veiculo = cidade;
        }
        if let Some(estado) = blank_to_none(self.estado_veiculo.as_ref()) {
            anuncio.estado_veiculo = estado;
        }

        anuncio.query_busca = build_search_text(
            anuncio.marca.as_deref(),
            anuncio.modelo.as_deref(),
            anuncio.ano,
            anuncio.cor.as_deref(),
        );
    }
}

/// Edit form posted from the admin pages.
///
/// Numbers arrive as text and checkboxes are only present when ticked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminAnuncioForm {
    pub titulo: Option<String>,
    pub descricao: Option<String>,
    pub valor: Option<String>,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub ano: Option<String>,
    pub cor: Option<String>,
    pub troca: Option<String>,
    pub leilao: Option<String>,
    pub cidade_veiculo: Option<String>,
    pub estado_veiculo: Option<String>,
}

impl AdminAnuncioForm {
    pub fn into_update(self) -> Result<AnuncioUpdate, String> {
        Ok(AnuncioUpdate {
            valor: parse_number("valor", self.valor.as_ref())?,
            ano: parse_number("ano", self.ano.as_ref())?,
            troca: Some(self.troca.as_deref().is_some_and(parse_flag)),
            leilao: Some(self.leilao.as_deref().is_some_and(parse_flag)),
            titulo: self.titulo,
            descricao: self.descricao,
            marca: self.marca,
            modelo: self.modelo,
            cor: self.cor,
            cidade_veiculo: self.cidade_veiculo,
            estado_veiculo: self.estado_veiculo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> anuncio::Model {
        anuncio::Model {
            id: 1,
            usuario_id: 5,
            titulo: "Corolla".to_string(),
            descricao: "Completo".to_string(),
            valor: 45_000,
            marca: Some("Toyota".to_string()),
            modelo: Some("Corolla".to_string()),
            ano: Some(2015),
            cor: Some("Prata".to_string()),
            query_busca: "Toyota Corolla 2015 Prata".to_string(),
            aprovado: true,
            views: 0,
            troca: false,
            leilao: false,
            aprovado_em: None,
            criado_em: NaiveDate::from_ymd_opt(2018, 8, 29)
                .unwrap()
                .and_hms_opt(11, 0, 0)
                .unwrap(),
            cidade_veiculo: String::new(),
            estado_veiculo: String::new(),
        }
    }

    #[test]
    fn fields_are_allow_listed_and_parsed() {
        let fields: HashMap<String, String> = [
            ("titulo", "Gol"),
            ("valor", "15000"),
            ("ano", "2010"),
            ("marca", "VW"),
            ("troca", "true"),
            ("aprovado", "true"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let novo = NovoAnuncio::from_fields(&fields).unwrap();
        assert_eq!(novo.titulo, "Gol");
        assert_eq!(novo.valor, 15_000);
        assert_eq!(novo.ano, Some(2010));
        assert!(novo.troca);
        assert!(!novo.leilao);
        assert_eq!(novo.search_text(), "VW 2010");
    }

    #[test]
    fn non_numeric_price_is_rejected() {
        let fields: HashMap<String, String> =
            [("valor".to_string(), "caro".to_string())].into_iter().collect();
        assert!(NovoAnuncio::from_fields(&fields).is_err());
    }

    #[test]
    fn update_recomputes_search_text() {
        let mut anuncio = sample();
        let update = AnuncioUpdate {
            cor: Some("Preto".to_string()),
            titulo: Some(" ".to_string()),
            ..Default::default()
        };
        update.apply(&mut anuncio);

        assert_eq!(anuncio.titulo, "Corolla");
        assert_eq!(anuncio.query_busca, "Toyota Corolla 2015 Preto");
    }

    #[test]
    fn admin_form_unchecked_troca_means_false() {
        let mut anuncio = sample();
        anuncio.troca = true;

        let form = AdminAnuncioForm {
            valor: Some("50000".to_string()),
            ..Default::default()
        };
        form.into_update().unwrap().apply(&mut anuncio);

        assert!(!anuncio.troca);
        assert_eq!(anuncio.valor, 50_000);
    }

    #[test]
    fn flag_parsing() {
        assert!(parse_flag("on"));
        assert!(parse_flag("True"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }
}
