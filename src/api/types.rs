use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::format_timestamp;
use crate::entities::{contato, imagem, usuario};
use crate::models::anuncio::AnuncioDetalhado;

/// URL prefix under which image files are served.
pub const IMAGES_URL_PREFIX: &str = "images";

/// Wraps a single entity under its id, e.g. `{"7": {...}}`.
#[must_use]
pub fn keyed_by_id<T>(id: i32, value: T) -> BTreeMap<String, T> {
    BTreeMap::from([(id.to_string(), value)])
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ImagemDto {
    pub id: i32,
    pub anuncio_id: i32,
    /// Public path, `images/<usuario>/<anuncio>/imagem<n>.jpg`
    pub imagem: String,
}

impl From<&imagem::Model> for ImagemDto {
    fn from(model: &imagem::Model) -> Self {
        Self {
            id: model.id,
            anuncio_id: model.anuncio_id,
            imagem: format!("{IMAGES_URL_PREFIX}/{}", model.img_filename),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct AnuncioDto {
    pub id: i32,
    pub titulo: String,
    pub descricao: String,
    pub valor: i64,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub ano: Option<i32>,
    pub cor: Option<String>,
    pub aprovado: bool,
    pub views: i32,
    pub imagens: Vec<ImagemDto>,
    pub troca: bool,
    pub leilao: bool,
    pub cidade_veiculo: String,
    pub estado_veiculo: String,
    pub criado_em: String,
    pub aprovado_em: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usuario: Option<UsuarioDto>,
}

impl AnuncioDto {
    /// The owner is embedded without their listings, which would recurse.
    #[must_use]
    pub fn from_detalhado(detalhado: &AnuncioDetalhado, include_usuario: bool) -> Self {
        let anuncio = &detalhado.anuncio;
        Self {
            id: anuncio.id,
            titulo: anuncio.titulo.clone(),
            descricao: anuncio.descricao.clone(),
            valor: anuncio.valor,
            marca: anuncio.marca.clone(),
            modelo: anuncio.modelo.clone(),
            ano: anuncio.ano,
            cor: anuncio.cor.clone(),
            aprovado: anuncio.aprovado,
            views: anuncio.views,
            imagens: detalhado.imagens.iter().map(ImagemDto::from).collect(),
            troca: anuncio.troca,
            leilao: anuncio.leilao,
            cidade_veiculo: anuncio.cidade_veiculo.clone(),
            estado_veiculo: anuncio.estado_veiculo.clone(),
            criado_em: format_timestamp(&anuncio.criado_em),
            aprovado_em: anuncio.aprovado_em.as_ref().map(format_timestamp),
            usuario: if include_usuario {
                detalhado.usuario.as_ref().map(UsuarioDto::from)
            } else {
                None
            },
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct UsuarioDto {
    pub id: i32,
    pub facebook_id: String,
    pub nome: String,
    pub tipo: String,
    pub cidade: String,
    pub estado: String,
    pub telefone: String,
    pub email: String,
    pub views: i32,
    pub cadastrado_em: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anuncios: Option<Vec<AnuncioDto>>,
}

impl From<&usuario::Model> for UsuarioDto {
    fn from(model: &usuario::Model) -> Self {
        Self {
            id: model.id,
            facebook_id: model.facebook_id.clone(),
            nome: model.nome.clone(),
            tipo: model.tipo.clone(),
            cidade: model.cidade.clone(),
            estado: model.estado.clone(),
            telefone: model.telefone.clone(),
            email: model.email.clone(),
            views: model.views,
            cadastrado_em: format_timestamp(&model.cadastrado_em),
            anuncios: None,
        }
    }
}

impl UsuarioDto {
    #[must_use]
    pub fn with_anuncios(model: &usuario::Model, anuncios: &[AnuncioDetalhado]) -> Self {
        Self {
            anuncios: Some(
                anuncios
                    .iter()
                    .map(|a| AnuncioDto::from_detalhado(a, false))
                    .collect(),
            ),
            ..Self::from(model)
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ContatoDto {
    pub id: i32,
    pub nome: String,
    pub contato: String,
    pub texto: String,
    pub timestamp: String,
}

impl From<&contato::Model> for ContatoDto {
    fn from(model: &contato::Model) -> Self {
        Self {
            id: model.id,
            nome: model.nome.clone(),
            contato: model.contato.clone(),
            texto: model.texto.clone(),
            timestamp: format_timestamp(&model.timestamp),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnuncioResponse {
    pub anuncio: AnuncioDto,
}

#[derive(Debug, Serialize)]
pub struct AnunciosResponse {
    pub anuncios: Vec<AnuncioDto>,
}

#[derive(Debug, Serialize)]
pub struct UsuarioResponse {
    pub usuario: UsuarioDto,
}

#[derive(Debug, Serialize)]
pub struct UsuariosResponse {
    pub usuarios: Vec<UsuarioDto>,
}

#[derive(Debug, Serialize)]
pub struct ContatoResponse {
    pub contato: ContatoDto,
}

#[derive(Debug, Serialize)]
pub struct ImagemResponse {
    pub imagem: ImagemDto,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub usuario_id: i32,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub facebook_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ContatoRequest {
    pub nome: String,
    pub contato: String,
    pub texto: String,
}

/// Query string of the listing endpoint. Kept as text so bad values produce
/// the usual JSON error instead of an extractor rejection.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ListQuery {
    pub limit: Option<String>,
    pub order_by: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct BuscaQuery {
    pub query: Option<String>,
    pub limit: Option<String>,
    pub order_by: Option<String>,
}
