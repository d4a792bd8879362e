//! # Demo Catalogs
//!
//! The bundled curricula used when no catalog file or remote service is
//! configured. Four courses across two universities.

use crate::catalog::{Catalog, CatalogKey, CatalogRegistry};
use crate::{CourseId, PlannerError, Subject};

const UF: &str = "Universidade Federal do Exemplo";
const PRIVATE: &str = "Universidade Particular do Exemplo";

fn subject(id: &str, name: &str, period: u32, prerequisites: &[&str]) -> Subject {
    Subject::new(id, name, period).with_prerequisites(prerequisites.iter().copied())
}

fn civil_engineering_natal() -> Result<Catalog, PlannerError> {
    Catalog::new(
        CatalogKey::new(UF, "Natal", "Engenharia Civil"),
        CourseId(1),
        vec![
            subject("1", "Introdução à Engenharia", 1, &[]),
            subject("2", "Cálculo I", 1, &[]),
            subject("3", "Física I", 1, &[]),
            subject("4", "Álgebra Linear", 1, &[]),
            subject("5", "Cálculo II", 2, &["2"]),
            subject("6", "Física II", 2, &["3"]),
            subject("7", "Geometria Analítica", 2, &["4"]),
            subject("8", "Química Geral", 2, &[]),
            subject("9", "Estruturas I", 3, &["5", "6"]),
            subject("10", "Materiais de Construção", 3, &["8"]),
        ],
    )
}

fn civil_engineering_mossoro() -> Result<Catalog, PlannerError> {
    Catalog::new(
        CatalogKey::new(UF, "Mossoró", "Engenharia Civil"),
        CourseId(2),
        vec![
            subject("1", "Introdução à Engenharia", 1, &[]),
            subject("2", "Cálculo I", 1, &[]),
            subject("3", "Desenho Técnico", 1, &[]),
            subject("4", "Física I", 1, &[]),
            subject("5", "Cálculo II", 2, &["2"]),
            subject("6", "Topografia I", 2, &["3"]),
            subject("7", "Física II", 2, &["4"]),
            subject("8", "Mecânica dos Solos", 3, &["5", "7"]),
        ],
    )
}

fn law_caico() -> Result<Catalog, PlannerError> {
    Catalog::new(
        CatalogKey::new(PRIVATE, "Caicó", "Direito"),
        CourseId(3),
        vec![
            subject("1", "Introdução ao Direito", 1, &[]),
            subject("2", "Teoria do Estado", 1, &[]),
            subject("3", "Sociologia Jurídica", 1, &[]),
            subject("4", "Direito Constitucional I", 2, &["2"]),
            subject("5", "Direito Civil I", 2, &["1"]),
            subject("6", "Direito Penal I", 2, &["1"]),
            subject("7", "Direito Constitucional II", 3, &["4"]),
            subject("8", "Direito Civil II", 3, &["5"]),
        ],
    )
}

fn computing_natal() -> Result<Catalog, PlannerError> {
    Catalog::new(
        CatalogKey::new(UF, "Natal", "Computação"),
        CourseId(4),
        vec![
            subject("1", "Introdução à Computação", 1, &[]),
            subject("2", "Cálculo I", 1, &[]),
            subject("3", "Álgebra Linear", 1, &[]),
            subject("4", "Lógica Matemática", 1, &[]),
            subject("5", "Algoritmos e Estruturas de Dados", 2, &["1"]),
            subject("6", "Cálculo II", 2, &["2"]),
            subject("7", "Programação I", 2, &["1"]),
            subject("8", "Programação II", 3, &["7", "5"]),
            subject("9", "Banco de Dados I", 3, &["5"]),
        ],
    )
}

/// Build the registry of bundled catalogs.
pub fn demo_registry() -> Result<CatalogRegistry, PlannerError> {
    let mut registry = CatalogRegistry::new();
    for catalog in [
        civil_engineering_natal()?,
        civil_engineering_mossoro()?,
        law_caico()?,
        computing_natal()?,
    ] {
        registry.insert(catalog)?;
    }
    Ok(registry)
}
