//! Selector queries over one fetched HTML document
//!
//! `scraper::Html` is not `Send`, so a [`Document`] is parsed, queried and
//! dropped inside a single synchronous call; the accessor only keeps the
//! source text between calls.

use jobharvest_core::port::{AccessorError, Anchor};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Attributes a static "click" can follow, in priority order
const NAVIGATION_ATTRIBUTES: [&str; 3] = ["href", "data-path", "data-href"];

pub fn parse_selector(selector: &str) -> Result<Selector, AccessorError> {
    Selector::parse(selector)
        .map_err(|e| AccessorError::InvalidSelector(format!("{}: {}", selector, e)))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

pub struct Document {
    html: Html,
    url: Url,
}

impl Document {
    pub fn parse(url: Url, source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
            url,
        }
    }

    fn first(&self, selector: &str) -> Result<Option<ElementRef<'_>>, AccessorError> {
        let selector = parse_selector(selector)?;
        Ok(self.html.select(&selector).next())
    }

    pub fn exists(&self, selector: &str) -> Result<bool, AccessorError> {
        Ok(self.first(selector)?.is_some())
    }

    pub fn text(&self, selector: &str) -> Result<Option<String>, AccessorError> {
        Ok(self.first(selector)?.map(text_of))
    }

    pub fn all_text(&self, selector: &str) -> Result<Vec<String>, AccessorError> {
        let selector = parse_selector(selector)?;
        Ok(self.html.select(&selector).map(text_of).collect())
    }

    pub fn all_text_within(&self, scope: &str, selector: &str) -> Result<Vec<String>, AccessorError> {
        let inner = parse_selector(selector)?;
        Ok(self
            .first(scope)?
            .map(|container| container.select(&inner).map(text_of).collect())
            .unwrap_or_default())
    }

    pub fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, AccessorError> {
        Ok(self
            .first(selector)?
            .and_then(|el| el.value().attr(name).map(str::to_string)))
    }

    /// Matching anchors with `href` resolved against the document URL
    pub fn anchors(&self, selector: &str) -> Result<Vec<Anchor>, AccessorError> {
        let selector = parse_selector(selector)?;
        Ok(self
            .html
            .select(&selector)
            .map(|el| Anchor {
                text: text_of(el),
                href: el
                    .value()
                    .attr("href")
                    .and_then(|href| self.url.join(href.trim()).ok())
                    .map(String::from),
            })
            .collect())
    }

    /// Where clicking the first match would navigate
    ///
    /// # Errors
    /// - AccessorError::ElementNotFound when nothing matches
    /// - AccessorError::Browser when the element has no navigation target
    pub fn click_target(&self, selector: &str) -> Result<Url, AccessorError> {
        let element = self
            .first(selector)?
            .ok_or_else(|| AccessorError::ElementNotFound(selector.to_string()))?;

        let target = NAVIGATION_ATTRIBUTES
            .iter()
            .find_map(|name| element.value().attr(name))
            .map(str::trim)
            .filter(|t| !t.is_empty() && !t.starts_with("javascript:"))
            .ok_or_else(|| {
                AccessorError::Browser(format!(
                    "{} has no navigation target (static pages cannot run scripts)",
                    selector
                ))
            })?;

        self.url
            .join(target)
            .map_err(|e| AccessorError::Browser(format!("bad target {:?}: {}", target, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <article class="box_offer"><h2><a href="/oferta/1#lc=x"> Rust Dev </a></h2></article>
          <article class="box_offer"><h2><a href="https://other.test/o/2">Go Dev</a></h2></article>
          <article class="box_offer"><h2><a>No link</a></h2></article>
          <div class="tj_fx">
            <span class="buildLink" title="Anterior" data-path="?p=1">prev</span>
            <span class="buildLink" title="Siguiente" data-path="?pubdate=1&p=3">next</span>
          </div>
          <img class="logo" alt="ACME">
          <button id="close">x</button>
        </body></html>
    "#;

    fn doc() -> Document {
        Document::parse(
            Url::parse("https://ct.test/trabajo-de-rust?pubdate=1&p=2").unwrap(),
            LISTING,
        )
    }

    #[test]
    fn test_anchors_resolve_relative_links() {
        let anchors = doc().anchors("article.box_offer h2 a").unwrap();
        assert_eq!(anchors.len(), 3);
        assert_eq!(anchors[0].text, " Rust Dev ");
        assert_eq!(anchors[0].href.as_deref(), Some("https://ct.test/oferta/1#lc=x"));
        assert_eq!(anchors[1].href.as_deref(), Some("https://other.test/o/2"));
        assert_eq!(anchors[2].href, None);
    }

    #[test]
    fn test_text_and_attribute_reads() {
        let doc = doc();
        assert_eq!(doc.text("h2 a").unwrap().as_deref(), Some(" Rust Dev "));
        assert_eq!(doc.text("h1").unwrap(), None);
        assert_eq!(doc.all_text("span.buildLink").unwrap(), vec!["prev", "next"]);
        assert_eq!(doc.attribute("img.logo", "alt").unwrap().as_deref(), Some("ACME"));
        assert!(doc.exists(r#"span.buildLink[title="Siguiente"]"#).unwrap());
    }

    #[test]
    fn test_scoped_text_reads_only_first_container() {
        let doc = Document::parse(
            Url::parse("https://ct.test/oferta/1").unwrap(),
            r#"<div class="box_resume">
                 <div class="box_border"><p class="fs16">Presencial</p><p class="fs16">Bogotá, D.C.</p></div>
                 <div class="box_border"><p class="fs16">Tiempo completo</p></div>
               </div>"#,
        );
        assert_eq!(
            doc.all_text_within("div.box_resume div.box_border", "p.fs16").unwrap(),
            vec!["Presencial", "Bogotá, D.C."]
        );
        assert!(doc.all_text_within("div.missing", "p.fs16").unwrap().is_empty());
    }

    #[test]
    fn test_click_target_follows_data_path() {
        let target = doc()
            .click_target(r#"div.tj_fx span.buildLink[title="Siguiente"]"#)
            .unwrap();
        assert_eq!(target.as_str(), "https://ct.test/trabajo-de-rust?pubdate=1&p=3");
    }

    #[test]
    fn test_click_target_errors() {
        let doc = doc();
        assert!(matches!(
            doc.click_target("a.missing"),
            Err(AccessorError::ElementNotFound(_))
        ));
        assert!(matches!(doc.click_target("#close"), Err(AccessorError::Browser(_))));
    }

    #[test]
    fn test_invalid_selector() {
        assert!(matches!(
            doc().exists("div[[["),
            Err(AccessorError::InvalidSelector(_))
        ));
    }
}
