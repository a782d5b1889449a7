//! Scripted job sites and a fresh SQLite store shared by the pipeline tests

#![allow(dead_code)]

use jobharvest_core::application::sources::{
    ComputrabajoAdapter, ComputrabajoConfig, GetManfredAdapter, GetManfredConfig,
};
use jobharvest_core::application::{CrawlConfig, CrawlOrchestrator, SourceRegistry};
use jobharvest_core::port::page_accessor::mocks::{FakePage, FakeSite};
use jobharvest_core::port::{FixedTimeProvider, SequentialIdProvider, TimeProvider};
use jobharvest_infra_sqlite::{create_pool, run_migrations, SqlitePostingStore};
use std::sync::Arc;

pub const CT_BASE: &str = "https://ct.test";
pub const CT_PAGE_1: &str = "https://ct.test/trabajo-de-rust?pubdate=1";
pub const CT_PAGE_2: &str = "https://ct.test/trabajo-de-rust?pubdate=1&p=2";
pub const GM_LISTING: &str = "https://gm.test/ofertas-empleo?onlyActive=true";

// Computrabajo markup
pub const CT_ITEM: &str = "article.box_offer h2 a";
pub const CT_NEXT: &str = r#"div.tj_fx span.buildLink[title="Siguiente"]"#;
const CT_COMPANY: &str = "div.info_company a.fs16.js-o-link";
const CT_COMPANY_FALLBACK: &str = "div.container p.fs16";
const CT_LOCATION_BOX: &str = "div.box_resume div.box_border";
const CT_LOCATION_LINE: &str = "p.fs16";
const CT_SALARY: &str = "div.mbB span.mb10";
const CT_KEYWORDS: &str = "div.pb40 p.fc_aux";
const CT_REQUIREMENTS: &str = "div.mb40 ul.mbB li";

// GetManfred markup
const GM_ITEM: &str = "div.react-reveal a";
const GM_COMPANY: &str = "div.kNbsot p strong";
const GM_SALARY: &str = "div.dToAFB span.eLoTjr";
const GM_KEYWORDS: &str = "div.jFrtk span";
const GM_REQUIREMENTS: &str = "div.kreSbq ul li";

/// One Computrabajo detail page
pub struct Offer {
    pub path: &'static str,
    pub title: &'static str,
    pub company: Option<&'static str>,
    pub company_fallback: Option<&'static str>,
    pub location: Option<&'static str>,
    pub salary: Option<&'static str>,
    pub keywords: Option<&'static str>,
    pub requirements: &'static [&'static str],
}

impl Offer {
    pub fn url(&self) -> String {
        format!("{}{}", CT_BASE, self.path)
    }

    fn page(&self) -> FakePage {
        let mut page = FakePage::new().with_text("h1", self.title);
        if let Some(company) = self.company {
            page = page.with_text(CT_COMPANY, company);
        }
        if let Some(company) = self.company_fallback {
            page = page.with_text(CT_COMPANY_FALLBACK, company);
        }
        if let Some(location) = self.location {
            page = page.with_scoped_text(CT_LOCATION_BOX, CT_LOCATION_LINE, location);
        }
        if let Some(salary) = self.salary {
            page = page.with_text(CT_SALARY, salary);
        }
        if let Some(keywords) = self.keywords {
            page = page.with_text(CT_KEYWORDS, keywords);
        }
        for line in self.requirements {
            page = page.with_text(CT_REQUIREMENTS, *line);
        }
        page
    }
}

/// Five offers on the first listing page, two new ones on the second
pub const OFFERS: [Offer; 7] = [
    Offer {
        path: "/ofertas/1",
        title: "Desarrollador Rust",
        company: Some("ACME"),
        company_fallback: None,
        location: Some("Bogotá, D.C."),
        salary: Some("3000 (mensual)"),
        keywords: Some("Palabras clave: rust, backend"),
        requirements: &["Educación mínima: Universidad", "3 años de experiencia", "Idiomas: Inglés"],
    },
    Offer {
        path: "/ofertas/2",
        title: "Desarrollador Go",
        company: Some("ACME"),
        company_fallback: None,
        location: Some("Medellín, Antioquia"),
        salary: Some("3000"),
        keywords: Some("Palabras clave: go, backend"),
        requirements: &["1 año de experiencia"],
    },
    Offer {
        path: "/ofertas/3",
        title: "Frontend React",
        company: None,
        company_fallback: Some("Umbrella"),
        location: Some("Bogotá"),
        salary: Some("2500 (Mensual)"),
        keywords: None,
        requirements: &["5 años de experiencia", "Conocimientos: React, TypeScript"],
    },
    Offer {
        path: "/ofertas/4",
        title: "Analista QA",
        company: Some("Globex"),
        company_fallback: None,
        location: Some("Cali, Valle del Cauca"),
        salary: None,
        keywords: None,
        requirements: &["Sin experiencia"],
    },
    Offer {
        path: "/ofertas/5",
        title: "Ingeniero DevOps",
        company: Some("Globex"),
        company_fallback: None,
        location: Some("Bogotá, D.C."),
        salary: Some("4000"),
        keywords: None,
        requirements: &["4 años de experiencia", "Idiomas: Inglés"],
    },
    Offer {
        path: "/ofertas/6",
        title: "Data Engineer",
        company: Some("Initech"),
        company_fallback: None,
        location: Some("Medellín"),
        salary: Some("4000 (mensual)"),
        keywords: None,
        requirements: &["2 años de experiencia"],
    },
    Offer {
        path: "/ofertas/7",
        title: "Mobile Developer",
        company: Some("Initech"),
        company_fallback: None,
        location: None,
        salary: None,
        keywords: None,
        requirements: &["10 años de experiencia"],
    },
];

/// Computrabajo listing over two pages; page two repeats "Frontend React"
/// under another link
pub fn computrabajo_site() -> FakeSite {
    let mut first = FakePage::new();
    for offer in &OFFERS[..5] {
        first = first.with_anchor(CT_ITEM, offer.title, &format!("{}#lc=ListOffers", offer.url()));
    }
    first = first.with_click_target(CT_NEXT, CT_PAGE_2);

    let second = FakePage::new()
        .with_anchor(CT_ITEM, OFFERS[5].title, &OFFERS[5].url())
        .with_anchor(CT_ITEM, "Frontend React", "https://ct.test/ofertas/99")
        .with_anchor(CT_ITEM, OFFERS[6].title, &OFFERS[6].url());

    let mut site = FakeSite::new()
        .with_page(CT_PAGE_1, first)
        .with_page(CT_PAGE_2, second);
    for offer in &OFFERS {
        site = site.with_page(&offer.url(), offer.page());
    }
    site
}

/// Adds a two-offer GetManfred listing to `site`
pub fn with_getmanfred(site: FakeSite) -> FakeSite {
    site.with_page(
        GM_LISTING,
        FakePage::new()
            .with_anchor(GM_ITEM, "Backend Engineer (Rust)", "/ofertas-empleo/10/backend-rust")
            .with_anchor(GM_ITEM, "", "/ofertas-empleo/11/platform"),
    )
    .with_page(
        "https://gm.test/ofertas-empleo/10/backend-rust",
        FakePage::new()
            .with_text("h1", "Backend Engineer (Rust)")
            .with_text(GM_COMPANY, "Manfred Labs")
            .with_text(GM_SALARY, "hasta 3000")
            .with_text(GM_KEYWORDS, "Rust")
            .with_text(GM_KEYWORDS, "PostgreSQL")
            .with_text(GM_REQUIREMENTS, "3 años de experiencia"),
    )
    .with_page(
        "https://gm.test/ofertas-empleo/11/platform",
        FakePage::new()
            .with_text("h1", "Platform Engineer")
            .with_attribute("section.gXHpR img.BQqbU", "alt", "Cloudy")
            .with_text(GM_REQUIREMENTS, "6 años de experiencia"),
    )
}

/// GetManfred listing that republishes "Desarrollador Rust" next to its own offer
pub fn with_overlapping_getmanfred(site: FakeSite) -> FakeSite {
    site.with_page(
        GM_LISTING,
        FakePage::new()
            .with_anchor(GM_ITEM, "Desarrollador Rust", "/ofertas-empleo/20/desarrollador-rust")
            .with_anchor(GM_ITEM, "Backend Engineer (Rust)", "/ofertas-empleo/10/backend-rust"),
    )
    .with_page(
        "https://gm.test/ofertas-empleo/20/desarrollador-rust",
        FakePage::new()
            .with_text("h1", "Desarrollador Rust")
            .with_text(GM_COMPANY, "ACME Remote")
            .with_text(GM_REQUIREMENTS, "3 años de experiencia"),
    )
    .with_page(
        "https://gm.test/ofertas-empleo/10/backend-rust",
        FakePage::new()
            .with_text("h1", "Backend Engineer (Rust)")
            .with_text(GM_COMPANY, "Manfred Labs"),
    )
}

pub fn registry(config: &CrawlConfig) -> SourceRegistry {
    SourceRegistry::from_configs(
        config,
        ComputrabajoConfig {
            base_url: CT_BASE.to_string(),
            keyword: "rust".to_string(),
            ..Default::default()
        },
        GetManfredConfig {
            listing_url: GM_LISTING.to_string(),
            ..Default::default()
        },
    )
    .unwrap()
}

pub fn computrabajo_only(config: &CrawlConfig) -> SourceRegistry {
    let mut registry = SourceRegistry::new();
    registry.register(Arc::new(
        ComputrabajoAdapter::new(
            ComputrabajoConfig {
                base_url: CT_BASE.to_string(),
                keyword: "rust".to_string(),
                ..Default::default()
            },
            config,
        )
        .unwrap(),
    ));
    registry
}

pub fn getmanfred_adapter(config: &CrawlConfig) -> GetManfredAdapter {
    GetManfredAdapter::new(
        GetManfredConfig {
            listing_url: GM_LISTING.to_string(),
            ..Default::default()
        },
        config,
    )
    .unwrap()
}

pub async fn memory_store(time: Arc<dyn TimeProvider>) -> Arc<SqlitePostingStore> {
    let pool = create_pool(":memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    Arc::new(SqlitePostingStore::new(pool, time))
}

/// Store on a real database file, with a pool of several connections
pub async fn file_store(dir: &tempfile::TempDir, time: Arc<dyn TimeProvider>) -> Arc<SqlitePostingStore> {
    let path = dir.path().join("jobs.db");
    let pool = create_pool(&path.to_string_lossy()).await.unwrap();
    run_migrations(&pool).await.unwrap();
    Arc::new(SqlitePostingStore::new(pool, time))
}

pub fn orchestrator(
    registry: SourceRegistry,
    site: &FakeSite,
    store: Arc<SqlitePostingStore>,
    config: CrawlConfig,
) -> CrawlOrchestrator {
    CrawlOrchestrator::new(
        registry,
        Arc::new(site.clone()),
        store,
        Arc::new(SequentialIdProvider::default()),
        Arc::new(FixedTimeProvider(1_700_000_000_000)),
        config,
    )
}
