/// Spreadsheet hyperlink formula: `=HYPERLINK("<url>")`.
/// Double quotes inside the URL are doubled so the formula stays well-formed.
pub(crate) fn hyperlink(url: &str) -> String {
    format!("=HYPERLINK(\"{}\")", url.replace('"', "\"\""))
}

pub(crate) fn doi_link(doi: Option<&str>) -> String {
    match doi.map(str::trim) {
        Some(doi) if !doi.is_empty() => hyperlink(&format!("https://doi.org/{doi}")),
        _ => String::new(),
    }
}

pub(crate) fn pubmed_link(pmid: &str) -> String {
    hyperlink(&format!("https://www.ncbi.nlm.nih.gov/pubmed/{pmid}"))
}

/// `openurl` already ends with the `id=pmid:` parameter.
pub(crate) fn library_link(openurl: &str, pmid: &str) -> String {
    hyperlink(&format!("{openurl}{pmid}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_single_well_formed_formula() {
        let link = library_link(
            "https://i-share-rsh.primo.exlibrisgroup.com/openurl/01CARLI_RSH/01CARLI_RSH:CARLI_RSH?sid=Entrez:PubMed&id=pmid:",
            "31978945",
        );
        assert_eq!(
            link,
            "=HYPERLINK(\"https://i-share-rsh.primo.exlibrisgroup.com/openurl/01CARLI_RSH/01CARLI_RSH:CARLI_RSH?sid=Entrez:PubMed&id=pmid:31978945\")"
        );
        assert_eq!(link.matches("HYPERLINK").count(), 1);
    }

    #[test]
    fn doi_link_is_empty_without_doi() {
        assert_eq!(doi_link(None), "");
        assert_eq!(doi_link(Some("  ")), "");
        assert_eq!(
            doi_link(Some("10.1159/000505399")),
            "=HYPERLINK(\"https://doi.org/10.1159/000505399\")"
        );
    }

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(hyperlink("a\"b"), "=HYPERLINK(\"a\"\"b\")");
    }

    #[test]
    fn pubmed_link_uses_pmid() {
        assert_eq!(
            pubmed_link("123"),
            "=HYPERLINK(\"https://www.ncbi.nlm.nih.gov/pubmed/123\")"
        );
    }
}
