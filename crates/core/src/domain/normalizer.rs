//! Field Normalizer
//!
//! Pure functions that turn raw, inconsistently shaped scraped text into the
//! canonical fields of a [`JobPosting`]. Nothing here touches I/O.
//!
//! [`clean_salary`] and [`city_of`] are only used by the aggregation engine;
//! storage keeps the raw salary and location.

use crate::domain::error::Result;
use crate::domain::posting::{JobPosting, RawPosting, Requirement, StringOrList};
use regex::Regex;
use std::sync::LazyLock;

pub const KEYWORDS_LABELS: [&str; 2] = ["Palabras clave:", "Keywords:"];
pub const EDUCATION_LABELS: [&str; 2] = ["Educación mínima:", "Minimum education:"];
pub const LANGUAGES_LABELS: [&str; 2] = ["Idiomas:", "Languages:"];
pub const SKILLS_LABELS: [&str; 2] = ["Conocimientos:", "Skills:"];

const NO_EXPERIENCE_LINES: [&str; 2] = ["sin experiencia", "no experience"];

/// Separator used by sites for inline lists
const LIST_SEPARATOR: &str = ", ";

static EXPERIENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:años?|years?)\s+(?:de\s+experiencia|of\s+experience)")
        .expect("experience pattern is valid")
});

/// Anything that is not a word character, whitespace, or an accented vowel / ñ
static NON_ALNUM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w\sáéíóúüñÁÉÍÓÚÜÑ]").expect("token cleanup pattern is valid")
});

static MONTHLY_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*\(\s*(?:mensual|monthly)\s*\)\s*$").expect("salary pattern is valid")
});

/// Collapse internal whitespace and trim; blank text becomes `None`
pub fn clean_text(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Remainder of `text` after `label`, if `text` starts with it (case-insensitive)
pub fn strip_label<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    let trimmed = text.trim_start();
    let head = trimmed.get(..label.len())?;
    if head.to_lowercase() == label.to_lowercase() {
        trimmed.get(label.len()..).map(str::trim)
    } else {
        None
    }
}

fn strip_any_label<'a>(text: &'a str, labels: &[&str]) -> Option<&'a str> {
    labels.iter().find_map(|label| strip_label(text, label))
}

/// Remove punctuation and symbols from one list element
pub fn clean_token(raw: &str) -> Option<String> {
    let stripped = NON_ALNUM_RE.replace_all(raw.trim(), "");
    clean_text(&stripped)
}

fn push_unique(target: &mut Vec<String>, value: String) {
    if !target.contains(&value) {
        target.push(value);
    }
}

/// Split an inline `"a, b, c"` list into cleaned, de-duplicated elements
pub fn split_list(raw: &str) -> Vec<String> {
    let mut out = Vec::new();
    for part in raw.split(LIST_SEPARATOR) {
        if let Some(token) = clean_token(part) {
            push_unique(&mut out, token);
        }
    }
    out
}

/// Canonical keyword set; a single string may carry a "keywords:" label
pub fn normalize_keywords(raw: &StringOrList) -> Vec<String> {
    match raw {
        StringOrList::One(text) => {
            let body = strip_any_label(text, &KEYWORDS_LABELS).unwrap_or(text.as_str());
            split_list(body)
        }
        StringOrList::Many(items) => {
            let mut out = Vec::new();
            for item in items {
                if let Some(token) = clean_token(item) {
                    push_unique(&mut out, token);
                }
            }
            out
        }
    }
}

/// Canonical language set: a lone string is a one-element set
pub fn normalize_languages(raw: &StringOrList) -> Vec<String> {
    let mut out = Vec::new();
    match raw {
        StringOrList::One(text) => {
            let body = strip_any_label(text, &LANGUAGES_LABELS).unwrap_or(text.as_str());
            if let Some(language) = clean_text(body) {
                out.push(language);
            }
        }
        StringOrList::Many(items) => {
            for item in items {
                if let Some(language) = clean_text(item) {
                    push_unique(&mut out, language);
                }
            }
        }
    }
    out
}

/// Canonical experience text for one requirement line, if it is one
///
/// "3 años de experiencia" is stored as "3 años"; a "no experience" line is
/// kept verbatim so the aggregation engine can recognise it.
pub fn parse_experience(line: &str) -> Option<String> {
    if let Some(caps) = EXPERIENCE_RE.captures(line) {
        return Some(format!("{} años", &caps[1]));
    }
    let text = clean_text(line)?;
    let lowered = text.to_lowercase();
    if NO_EXPERIENCE_LINES.iter().any(|phrase| lowered == *phrase) {
        return Some(text);
    }
    None
}

/// Classify requirement bullets by their label
///
/// Bullets with no recognised label are treated as free-form skills.
pub fn parse_requirements(lines: &[String]) -> Requirement {
    let mut requirement = Requirement::default();

    for line in lines {
        if let Some(rest) = strip_any_label(line, &EDUCATION_LABELS) {
            requirement.education = clean_text(rest);
        } else if let Some(rest) = strip_any_label(line, &LANGUAGES_LABELS) {
            for language in normalize_languages(&StringOrList::One(rest.to_string())) {
                push_unique(&mut requirement.languages, language);
            }
        } else if let Some(rest) = strip_any_label(line, &SKILLS_LABELS) {
            for skill in split_list(rest) {
                push_unique(&mut requirement.skills, skill);
            }
        } else if let Some(experience) = parse_experience(line) {
            requirement.experience = Some(experience);
        } else if let Some(skill) = clean_token(line) {
            push_unique(&mut requirement.skills, skill);
        }
    }

    requirement
}

/// Turn a raw record into a canonical posting
///
/// Fails only when the title is missing or blank.
pub fn normalize(raw: RawPosting) -> Result<JobPosting> {
    let title = raw.title.as_deref().and_then(clean_text).unwrap_or_default();
    let mut posting = JobPosting::new(title)?;

    posting.company = raw.company.as_deref().and_then(clean_text);
    posting.location = raw.location.as_deref().and_then(clean_text);
    posting.salary = raw.salary.as_deref().and_then(clean_text);
    posting.keywords = raw
        .keywords
        .as_ref()
        .map(normalize_keywords)
        .unwrap_or_default();

    let mut requirement = parse_requirements(&raw.requirement_lines);
    if let Some(languages) = raw.languages.as_ref() {
        for language in normalize_languages(languages) {
            push_unique(&mut requirement.languages, language);
        }
    }
    posting.requirement = requirement;

    Ok(posting)
}

/// Salary key used for grouping: drops a trailing "(monthly)" qualifier
pub fn clean_salary(raw: &str) -> Option<String> {
    let without_suffix = MONTHLY_SUFFIX_RE.replace(raw, "");
    clean_text(&without_suffix)
}

/// City part of a location ("Bogotá, D.C." -> "Bogotá")
pub fn city_of(location: &str) -> Option<String> {
    let city = location.split(',').next().unwrap_or(location);
    clean_text(city)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  Senior \n  Rust\tDev "), Some("Senior Rust Dev".to_string()));
        assert_eq!(clean_text(" \n "), None);
    }

    #[test]
    fn test_strip_label_is_case_insensitive() {
        assert_eq!(strip_label("PALABRAS CLAVE: rust", "Palabras clave:"), Some("rust"));
        assert_eq!(strip_label("Educación mínima: Universidad", "educación mínima:"), Some("Universidad"));
        assert_eq!(strip_label("rust", "Palabras clave:"), None);
    }

    #[test]
    fn test_keywords_from_labeled_string() {
        let raw = StringOrList::One("Palabras clave: desarrollador, web, react.js, web".to_string());
        assert_eq!(normalize_keywords(&raw), vec!["desarrollador", "web", "reactjs"]);
    }

    #[test]
    fn test_keywords_from_list_strip_symbols_but_keep_accents() {
        let raw = StringOrList::Many(lines(&["#Programación", "C++", "  diseño!  ", "", "C++"]));
        assert_eq!(normalize_keywords(&raw), vec!["Programación", "C", "diseño"]);
    }

    #[test]
    fn test_languages_single_string_is_one_element() {
        assert_eq!(
            normalize_languages(&StringOrList::One("English".to_string())),
            vec!["English"]
        );
    }

    #[test]
    fn test_languages_list_is_unchanged() {
        let raw = StringOrList::Many(lines(&["English", "Spanish"]));
        assert_eq!(normalize_languages(&raw), vec!["English", "Spanish"]);
    }

    #[test]
    fn test_parse_requirements_by_label() {
        let requirement = parse_requirements(&lines(&[
            "Educación mínima: Universidad",
            "3 años de experiencia",
            "Idiomas: Inglés",
            "Conocimientos: JavaScript, React, Node.js",
        ]));

        assert_eq!(requirement.education.as_deref(), Some("Universidad"));
        assert_eq!(requirement.experience.as_deref(), Some("3 años"));
        assert_eq!(requirement.languages, vec!["Inglés"]);
        assert_eq!(requirement.skills, vec!["JavaScript", "React", "Nodejs"]);
    }

    #[test]
    fn test_parse_requirements_order_independent() {
        let requirement = parse_requirements(&lines(&[
            "Conocimientos: SQL",
            "1 año de experiencia",
            "Educación mínima: Bachillerato",
        ]));
        assert_eq!(requirement.education.as_deref(), Some("Bachillerato"));
        assert_eq!(requirement.experience.as_deref(), Some("1 años"));
        assert_eq!(requirement.skills, vec!["SQL"]);
    }

    #[test]
    fn test_unlabeled_lines_become_skills() {
        let requirement = parse_requirements(&lines(&["Experiencia con Docker.", "Sin experiencia"]));
        assert_eq!(requirement.skills, vec!["Experiencia con Docker"]);
        assert_eq!(requirement.experience.as_deref(), Some("Sin experiencia"));
    }

    #[test]
    fn test_normalize_full_record() {
        let raw = RawPosting {
            title: Some("  Desarrollador Web\n".to_string()),
            company: Some(" ACME S.A.S ".to_string()),
            location: Some("Bogotá, D.C.".to_string()),
            salary: Some("$ 3.000.000,00 (Mensual)".to_string()),
            keywords: Some(StringOrList::One("Palabras clave: web, php".to_string())),
            requirement_lines: lines(&["5 años de experiencia"]),
            languages: Some(StringOrList::Many(lines(&["English"]))),
        };

        let posting = normalize(raw).unwrap();
        assert_eq!(posting.title, "Desarrollador Web");
        assert_eq!(posting.company.as_deref(), Some("ACME S.A.S"));
        // Salary and location are stored raw
        assert_eq!(posting.salary.as_deref(), Some("$ 3.000.000,00 (Mensual)"));
        assert_eq!(posting.location.as_deref(), Some("Bogotá, D.C."));
        assert_eq!(posting.keywords, vec!["web", "php"]);
        assert_eq!(posting.requirement.experience.as_deref(), Some("5 años"));
        assert_eq!(posting.requirement.languages, vec!["English"]);
    }

    #[test]
    fn test_normalize_requires_title() {
        assert!(normalize(RawPosting::default()).is_err());
        let blank = RawPosting {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(normalize(blank).is_err());
    }

    #[test]
    fn test_clean_salary_strips_monthly_suffix() {
        assert_eq!(clean_salary("3000 (monthly)"), Some("3000".to_string()));
        assert_eq!(clean_salary("3000 (Mensual)  "), Some("3000".to_string()));
        assert_eq!(clean_salary("3000"), Some("3000".to_string()));
        assert_eq!(clean_salary("3000 (negociable)"), Some("3000 (negociable)".to_string()));
        assert_eq!(clean_salary(" (mensual)"), None);
    }

    #[test]
    fn test_city_of() {
        assert_eq!(city_of("Medellín, Antioquia"), Some("Medellín".to_string()));
        assert_eq!(city_of("Remoto"), Some("Remoto".to_string()));
        assert_eq!(city_of(" , Antioquia"), None);
    }
}
