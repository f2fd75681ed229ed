//! Server-rendered moderation pages.
//!
//! Every user-supplied value goes through `html_escape` before it is written
//! into the markup.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use std::collections::HashMap;
use std::fmt::Write;

use crate::domain::{format_brl, format_timestamp};
use crate::entities::{busca, usuario};
use crate::models::anuncio::AnuncioDetalhado;

const STYLE: &str = "body{font-family:sans-serif;margin:2em}table{border-collapse:collapse;margin-bottom:2em}\
td,th{border:1px solid #ccc;padding:4px 8px}form.inline{display:inline}.flash{background:#ffd;padding:8px;border:1px solid #cc9}";

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"pt-BR\"><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>{STYLE}</style></head><body>{body}</body></html>",
        title = text(title),
    )
}

fn flash_block(flash: Option<&str>) -> String {
    flash.map_or_else(String::new, |msg| {
        format!("<p class=\"flash\">{}</p>", text(msg))
    })
}

fn post_button(action: &str, label: &str, hidden: Option<(&str, &str)>) -> String {
    let hidden = hidden.map_or_else(String::new, |(name, value)| {
        format!(
            "<input type=\"hidden\" name=\"{}\" value=\"{}\">",
            attr(name),
            attr(value)
        )
    });
    format!(
        "<form class=\"inline\" method=\"post\" action=\"{}\">{hidden}<button type=\"submit\">{}</button></form>",
        attr(action),
        text(label)
    )
}

fn input(name: &str, label: &str, value: &str) -> String {
    format!(
        "<p><label>{} <input type=\"text\" name=\"{}\" value=\"{}\"></label></p>",
        text(label),
        attr(name),
        attr(value)
    )
}

fn checkbox(name: &str, label: &str, checked: bool) -> String {
    format!(
        "<p><label><input type=\"checkbox\" name=\"{}\" value=\"on\"{}> {}</label></p>",
        attr(name),
        if checked { " checked" } else { "" },
        text(label)
    )
}

#[must_use]
pub fn login_page(flash: Option<&str>) -> String {
    let body = format!(
        "<h1>Clozer Admin</h1>{}\
         <form method=\"post\" action=\"/admin/login\">\
         <p><label>Usuario <input type=\"text\" name=\"username\"></label></p>\
         <p><label>Senha <input type=\"password\" name=\"password\"></label></p>\
         <button type=\"submit\">Entrar</button></form>",
        flash_block(flash)
    );
    layout("Login", &body)
}

/// Dashboard with users, listings and the search log.
#[must_use]
pub fn index_page(
    flash: Option<&str>,
    usuarios: &[usuario::Model],
    contagem: &HashMap<i32, u64>,
    anuncios: &[AnuncioDetalhado],
    buscas: &[busca::Model],
) -> String {
    let mut body = String::new();
    body.push_str("<h1>Clozer Admin</h1>");
    body.push_str(&post_button("/admin/logout", "Sair", None));
    body.push_str(&flash_block(flash));
    body.push_str(&post_button(
        "/admin/busca/atualizar",
        "Atualizar texto de busca",
        None,
    ));

    body.push_str(
        "<h2>Usuarios</h2><table><tr><th>Id</th><th>Nome</th><th>Tipo</th><th>Email</th>\
         <th>Telefone</th><th>Cidade</th><th>Anuncios</th><th>Cadastro</th><th></th></tr>",
    );
    for u in usuarios {
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}/{}</td><td>{}</td><td>{}</td>\
             <td><a href=\"/admin/usuarios/{}\">Editar</a> {}</td></tr>",
            u.id,
            text(&u.nome),
            text(&u.tipo),
            text(&u.email),
            text(&u.telefone),
            text(&u.cidade),
            text(&u.estado),
            contagem.get(&u.id).copied().unwrap_or(0),
            format_timestamp(&u.cadastrado_em),
            u.id,
            post_button(&format!("/admin/usuarios/{}/excluir", u.id), "Excluir", None),
        );
    }
    body.push_str("</table>");

    body.push_str(
        "<h2>Anuncios</h2><table><tr><th>Id</th><th>Titulo</th><th>Usuario</th><th>Valor</th>\
         <th>Veiculo</th><th>Imagens</th><th>Aprovado</th><th>Criado em</th><th></th></tr>",
    );
    for detalhado in anuncios {
        let a = &detalhado.anuncio;
        let dono = detalhado
            .usuario
            .as_ref()
            .map_or_else(|| a.usuario_id.to_string(), |u| u.nome.clone());
        let moderacao = format!("/admin/anuncios/{}/moderacao", a.id);
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td>{} {} <a href=\"/admin/anuncios/{}\">Editar</a> {}</td></tr>",
            a.id,
            text(&a.titulo),
            text(&dono),
            format_brl(a.valor),
            text(&a.query_busca),
            detalhado.imagens.len(),
            if a.aprovado { "Sim" } else { "Nao" },
            format_timestamp(&a.criado_em),
            post_button(&moderacao, "Aprovar", Some(("decisao", "aprovar"))),
            post_button(&moderacao, "Reprovar", Some(("decisao", "reprovar"))),
            a.id,
            post_button(&format!("/admin/anuncios/{}/excluir", a.id), "Excluir", None),
        );
    }
    body.push_str("</table>");

    body.push_str("<h2>Buscas recentes</h2><table><tr><th>Busca</th><th>Data</th></tr>");
    for b in buscas {
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{}</td></tr>",
            text(&b.busca),
            format_timestamp(&b.buscado_em)
        );
    }
    body.push_str("</table>");

    layout("Clozer Admin", &body)
}

#[must_use]
pub fn anuncio_form(detalhado: &AnuncioDetalhado) -> String {
    let a = &detalhado.anuncio;
    let valor = a.valor.to_string();
    let ano = a.ano.map(|v| v.to_string()).unwrap_or_default();

    let mut body = format!(
        "<h1>Anuncio {}</h1><p><a href=\"/admin\">Voltar</a></p>\
         <form method=\"post\" action=\"/admin/anuncios/{}\">",
        a.id, a.id
    );
    body.push_str(&input("titulo", "Titulo", &a.titulo));
    body.push_str(&input("descricao", "Descricao", &a.descricao));
    body.push_str(&input("valor", "Valor", &valor));
    body.push_str(&input("marca", "Marca", a.marca.as_deref().unwrap_or_default()));
    body.push_str(&input("modelo", "Modelo", a.modelo.as_deref().unwrap_or_default()));
    body.push_str(&input("ano", "Ano", &ano));
    body.push_str(&input("cor", "Cor", a.cor.as_deref().unwrap_or_default()));
    body.push_str(&input("cidade_veiculo", "Cidade", &a.cidade_veiculo));
    body.push_str(&input("estado_veiculo", "Estado", &a.estado_veiculo));
    body.push_str(&checkbox("troca", "Aceita troca", a.troca));
    body.push_str(&checkbox("leilao", "Leilao", a.leilao));
    body.push_str("<button type=\"submit\">Salvar</button></form>");

    for imagem in &detalhado.imagens {
        let _ = write!(
            body,
            "<img src=\"/images/{}\" width=\"200\" alt=\"\">",
            attr(&imagem.img_filename)
        );
    }

    layout(&format!("Anuncio {}", a.id), &body)
}

#[must_use]
pub fn usuario_form(u: &usuario::Model) -> String {
    let mut body = format!(
        "<h1>Usuario {}</h1><p><a href=\"/admin\">Voltar</a></p><p>facebook_id: {}</p>\
         <form method=\"post\" action=\"/admin/usuarios/{}\">",
        u.id,
        text(&u.facebook_id),
        u.id
    );
    body.push_str(&input("nome", "Nome", &u.nome));
    body.push_str(&input("email", "Email", &u.email));
    body.push_str(&input("tipo", "Tipo", &u.tipo));
    body.push_str(&input("cidade", "Cidade", &u.cidade));
    body.push_str(&input("estado", "Estado", &u.estado));
    body.push_str(&input("telefone", "Telefone", &u.telefone));
    body.push_str("<button type=\"submit\">Salvar</button></form>");

    layout(&format!("Usuario {}", u.id), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::anuncio;
    use chrono::NaiveDate;

    fn ts() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 8, 29)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn usuario() -> usuario::Model {
        usuario::Model {
            id: 5,
            facebook_id: "123".to_string(),
            nome: "<script>alert(1)</script>".to_string(),
            tipo: "Garagem".to_string(),
            cidade: "Recife".to_string(),
            estado: "PE".to_string(),
            telefone: "81".to_string(),
            email: "a@b.com".to_string(),
            views: 0,
            cadastrado_em: ts(),
        }
    }

    fn detalhado() -> AnuncioDetalhado {
        AnuncioDetalhado {
            anuncio: anuncio::Model {
                id: 9,
                usuario_id: 5,
                titulo: "Gol \"quadrado\"".to_string(),
                descricao: "ok".to_string(),
                valor: 45_000,
                marca: Some("VW".to_string()),
                modelo: Some("Gol".to_string()),
                ano: Some(1994),
                cor: None,
                query_busca: "VW Gol 1994".to_string(),
                aprovado: false,
                views: 0,
                troca: true,
                leilao: false,
                aprovado_em: None,
                criado_em: ts(),
                cidade_veiculo: "Recife".to_string(),
                estado_veiculo: "PE".to_string(),
            },
            usuario: Some(usuario()),
            imagens: vec![],
        }
    }

    #[test]
    fn index_escapes_user_content() {
        let html = index_page(
            Some("<b>ok</b>"),
            &[usuario()],
            &HashMap::from([(5, 2)]),
            &[detalhado()],
            &[],
        );
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&lt;b&gt;ok&lt;/b&gt;"));
        assert!(html.contains("R$ 45.000,00"));
        assert!(html.contains("/admin/anuncios/9/moderacao"));
    }

    #[test]
    fn edit_form_escapes_attributes_and_checks_flags() {
        let html = anuncio_form(&detalhado());
        assert!(html.contains("value=\"Gol &quot;quadrado&quot;\""));
        assert!(html.contains("name=\"troca\" value=\"on\" checked"));
        assert!(!html.contains("name=\"leilao\" value=\"on\" checked"));
    }

    #[test]
    fn login_page_shows_flash() {
        assert!(login_page(Some("Usuario ou senha invalidos")).contains("Usuario ou senha invalidos"));
        assert!(!login_page(None).contains("class=\"flash\""));
    }
}
