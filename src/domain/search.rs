use std::fmt;

/// Derives the denormalised search text of a listing from its vehicle fields.
///
/// Absent or blank parts are skipped; the rest are joined by single spaces in
/// the order brand, model, year, color.
#[must_use]
pub fn build_search_text(
    marca: Option<&str>,
    modelo: Option<&str>,
    ano: Option<i32>,
    cor: Option<&str>,
) -> String {
    let ano = ano.map(|a| a.to_string());
    [marca, modelo, ano.as_deref(), cor]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Converts free user input into an FTS5 expression that requires every term.
///
/// Each whitespace-separated term becomes a quoted FTS5 string (embedded quotes
/// doubled) and the terms are joined with `AND`. Returns `None` for blank input.
#[must_use]
pub fn build_match_expression(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" AND "))
    }
}

/// Allow-listed orderings for listing and search endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdemAnuncios {
    Recentes,
    Relevancia,
    Aleatorio,
    MenorPreco,
    MaiorPreco,
    MaisVistos,
}

impl OrdemAnuncios {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "recentes" | "recent" | "criado_em" => Some(Self::Recentes),
            "relevancia" | "relevance" => Some(Self::Relevancia),
            "aleatorio" | "random" => Some(Self::Aleatorio),
            "menor_preco" | "price_asc" => Some(Self::MenorPreco),
            "maior_preco" | "price_desc" => Some(Self::MaiorPreco),
            "mais_vistos" | "views" => Some(Self::MaisVistos),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recentes => "recentes",
            Self::Relevancia => "relevancia",
            Self::Aleatorio => "aleatorio",
            Self::MenorPreco => "menor_preco",
            Self::MaiorPreco => "maior_preco",
            Self::MaisVistos => "mais_vistos",
        }
    }

    /// SQL `ORDER BY` clause for the full-text query. Only static text is
    /// produced, so it is safe to splice into the statement.
    #[must_use]
    pub const fn search_order_clause(&self) -> &'static str {
        match self {
            Self::Recentes => "anuncio.criado_em DESC",
            Self::Relevancia => "bm25(anuncio_busca) ASC, anuncio.criado_em DESC",
            Self::Aleatorio => "RANDOM()",
            Self::MenorPreco => "anuncio.valor ASC",
            Self::MaiorPreco => "anuncio.valor DESC",
            Self::MaisVistos => "anuncio.views DESC",
        }
    }
}

impl fmt::Display for OrdemAnuncios {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_text_uses_all_four_fields() {
        assert_eq!(
            build_search_text(Some("Toyota"), Some("Corolla"), Some(2015), Some("Prata")),
            "Toyota Corolla 2015 Prata"
        );
    }

    #[test]
    fn search_text_skips_missing_parts() {
        assert_eq!(
            build_search_text(Some("Fiat"), None, Some(2010), Some("  ")),
            "Fiat 2010"
        );
        assert_eq!(build_search_text(None, None, None, None), "");
    }

    #[test]
    fn match_expression_and_joins_terms() {
        assert_eq!(
            build_match_expression("  Toyota Corolla ").as_deref(),
            Some("\"Toyota\" AND \"Corolla\"")
        );
        assert_eq!(
            build_match_expression("Gol").as_deref(),
            Some("\"Gol\"")
        );
    }

    #[test]
    fn match_expression_neutralises_operators() {
        assert_eq!(
            build_match_expression("a\" OR b").as_deref(),
            Some("\"a\"\"\" AND \"OR\" AND \"b\"")
        );
        assert_eq!(build_match_expression("   "), None);
    }

    #[test]
    fn order_parsing() {
        assert_eq!(OrdemAnuncios::parse("random"), Some(OrdemAnuncios::Aleatorio));
        assert_eq!(
            OrdemAnuncios::parse("MENOR_PRECO"),
            Some(OrdemAnuncios::MenorPreco)
        );
        assert_eq!(OrdemAnuncios::parse("valor; DROP TABLE anuncio"), None);
        assert_eq!(OrdemAnuncios::Relevancia.to_string(), "relevancia");
    }
}
